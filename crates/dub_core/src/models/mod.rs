//! Data models shared across pipeline stages.

mod enums;
pub mod language;
mod request;
mod segment;

pub use enums::{Gender, JobStage, MixPolicy, SynthesisTier, TimingMode};
pub use language::{validate_request, ValidationError, AUTO_DETECT, SUPPORTED_LANGUAGES};
pub use request::JobRequest;
pub use segment::{widened_bounds, Segment, MIN_SEGMENT_SECS};
