//! Preset voice table for the matched-voice tier.

use crate::models::language::normalize_code;
use crate::models::Gender;

/// Preset neural voices as `(language, male, female)`.
pub const VOICE_PRESETS: &[(&str, &str, &str)] = &[
    ("en", "en-US-GuyNeural", "en-US-JennyNeural"),
    ("hi", "hi-IN-MadhurNeural", "hi-IN-SwaraNeural"),
    ("te", "te-IN-MohanNeural", "te-IN-ShrutiNeural"),
    ("es", "es-ES-AlvaroNeural", "es-ES-ElviraNeural"),
    ("fr", "fr-FR-HenriNeural", "fr-FR-DeniseNeural"),
    ("de", "de-DE-ConradNeural", "de-DE-KatjaNeural"),
    ("it", "it-IT-DiegoNeural", "it-IT-ElsaNeural"),
    ("pt", "pt-BR-AntonioNeural", "pt-BR-FranciscaNeural"),
    ("pl", "pl-PL-MarekNeural", "pl-PL-ZofiaNeural"),
    ("tr", "tr-TR-AhmetNeural", "tr-TR-EmelNeural"),
    ("ru", "ru-RU-DmitryNeural", "ru-RU-SvetlanaNeural"),
    ("nl", "nl-NL-MaartenNeural", "nl-NL-ColetteNeural"),
    ("cs", "cs-CZ-AntoninNeural", "cs-CZ-VlastaNeural"),
    ("ar", "ar-SA-HamedNeural", "ar-SA-ZariyahNeural"),
    ("zh-cn", "zh-CN-YunxiNeural", "zh-CN-XiaoxiaoNeural"),
    ("ja", "ja-JP-KeitaNeural", "ja-JP-NanamiNeural"),
    ("ko", "ko-KR-InJoonNeural", "ko-KR-SunHiNeural"),
];

/// Preset voice for a language and gender, if the table has one.
pub fn preset_voice(language: &str, gender: Gender) -> Option<&'static str> {
    let code = normalize_code(language);
    VOICE_PRESETS
        .iter()
        .find(|(lang, _, _)| *lang == code)
        .map(|(_, male, female)| match gender {
            Gender::Male => *male,
            Gender::Female => *female,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SUPPORTED_LANGUAGES;

    #[test]
    fn every_supported_language_has_presets() {
        for (code, _) in SUPPORTED_LANGUAGES {
            assert!(preset_voice(code, Gender::Male).is_some(), "{code}");
            assert!(preset_voice(code, Gender::Female).is_some(), "{code}");
        }
    }

    #[test]
    fn lookup_is_case_insensitive() {
        assert_eq!(preset_voice("ZH_CN", Gender::Female), Some("zh-CN-XiaoxiaoNeural"));
        assert_eq!(preset_voice("en", Gender::Male), Some("en-US-GuyNeural"));
        assert_eq!(preset_voice("xx", Gender::Male), None);
    }
}
