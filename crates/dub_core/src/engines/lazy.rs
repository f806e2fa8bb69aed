//! Lazily-initialized engine handles.
//!
//! Model-backed engines are expensive to load. Each worker owns its own
//! handles; the loader runs on first use and its result, success or
//! failure, is kept for the rest of the worker's life so a broken engine
//! is not reloaded once per segment.

use super::types::{EngineError, EngineResult};

type Loader<T> = Box<dyn FnOnce() -> EngineResult<T> + Send>;

enum LazyState<T> {
    Pending(Loader<T>),
    Ready(T),
    Failed(String),
}

/// An engine that is loaded on first use.
pub struct LazyEngine<T> {
    name: String,
    state: LazyState<T>,
}

impl<T> LazyEngine<T> {
    /// Defer construction until the first call to [`get`](Self::get).
    pub fn new<F>(name: impl Into<String>, loader: F) -> Self
    where
        F: FnOnce() -> EngineResult<T> + Send + 'static,
    {
        Self {
            name: name.into(),
            state: LazyState::Pending(Box::new(loader)),
        }
    }

    /// Wrap an already constructed engine.
    pub fn ready(name: impl Into<String>, engine: T) -> Self {
        Self {
            name: name.into(),
            state: LazyState::Ready(engine),
        }
    }

    /// An engine that can never be loaded.
    pub fn unavailable(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            state: LazyState::Failed(reason.into()),
        }
    }

    /// Engine name for logs.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the engine has been loaded successfully.
    pub fn is_loaded(&self) -> bool {
        matches!(self.state, LazyState::Ready(_))
    }

    /// Whether the engine is known to be unusable.
    pub fn has_failed(&self) -> bool {
        matches!(self.state, LazyState::Failed(_))
    }

    /// Load on first use and return the engine.
    pub fn get(&mut self) -> EngineResult<&mut T> {
        if matches!(self.state, LazyState::Pending(_)) {
            let state = std::mem::replace(&mut self.state, LazyState::Failed(String::new()));
            if let LazyState::Pending(loader) = state {
                tracing::info!("Loading {} (lazy)", self.name);
                self.state = match loader() {
                    Ok(engine) => LazyState::Ready(engine),
                    Err(e) => {
                        tracing::warn!("Failed to load {}: {}", self.name, e);
                        LazyState::Failed(e.to_string())
                    }
                };
            }
        }

        match &mut self.state {
            LazyState::Ready(engine) => Ok(engine),
            LazyState::Failed(message) => Err(EngineError::LoadFailed {
                engine: self.name.clone(),
                message: message.clone(),
            }),
            LazyState::Pending(_) => Err(EngineError::other(format!(
                "{} loader did not run",
                self.name
            ))),
        }
    }
}

impl<T> std::fmt::Debug for LazyEngine<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = match self.state {
            LazyState::Pending(_) => "pending",
            LazyState::Ready(_) => "ready",
            LazyState::Failed(_) => "failed",
        };
        f.debug_struct("LazyEngine")
            .field("name", &self.name)
            .field("state", &state)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn loads_once_on_first_use() {
        let loads = Arc::new(AtomicUsize::new(0));
        let counter = loads.clone();
        let mut engine = LazyEngine::new("counter", move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(41u32)
        });

        assert!(!engine.is_loaded());
        *engine.get().unwrap() += 1;
        assert_eq!(*engine.get().unwrap(), 42);
        assert_eq!(loads.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn failed_load_is_remembered() {
        let loads = Arc::new(AtomicUsize::new(0));
        let counter = loads.clone();
        let mut engine: LazyEngine<u32> = LazyEngine::new("broken", move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Err(EngineError::other("model file missing"))
        });

        assert!(engine.get().is_err());
        let err = engine.get().unwrap_err();
        assert!(err.to_string().contains("model file missing"));
        assert_eq!(loads.load(Ordering::SeqCst), 1);
        assert!(engine.has_failed());
    }

    #[test]
    fn unavailable_never_loads() {
        let mut engine: LazyEngine<u32> = LazyEngine::unavailable("tts", "not configured");
        assert!(matches!(engine.get(), Err(EngineError::LoadFailed { .. })));
    }
}
