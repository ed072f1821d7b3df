//! In-process statistical language detector.

use thiserror::Error;
use whatlang::Lang;

#[derive(Debug, Error)]
pub enum LegacyError {
    #[error("Legacy detector failed: {0}")]
    Failed(String),
}

/// A detector that ranks candidate languages for a text locally.
pub trait LegacyDetector: Send + Sync {
    /// Up to `limit` language codes, most likely first.
    /// An empty list means the detector declined to guess.
    fn guesses(&self, text: &str, limit: usize) -> Result<Vec<String>, LegacyError>;

    /// The single best guess, or an empty string when there is none.
    fn top_guess(&self, text: &str) -> Result<String, LegacyError> {
        Ok(self.guesses(text, 1)?.into_iter().next().unwrap_or_default())
    }
}

/// Trigram-based detector backed by whatlang.
///
/// Reports two-letter ISO 639-1 codes, so its output compares directly with
/// the detection service; languages without one keep their ISO 639-3 code.
#[derive(Debug, Default, Clone)]
pub struct StatisticalDetector;

impl StatisticalDetector {
    pub fn new() -> Self {
        Self
    }
}

impl LegacyDetector for StatisticalDetector {
    fn guesses(&self, text: &str, limit: usize) -> Result<Vec<String>, LegacyError> {
        if limit == 0 {
            return Ok(Vec::new());
        }
        Ok(whatlang::detect(text)
            .map(|info| vec![iso_639_1(info.lang()).to_string()])
            .unwrap_or_default())
    }
}

fn iso_639_1(lang: Lang) -> &'static str {
    match lang {
        Lang::Eng => "en",
        Lang::Spa => "es",
        Lang::Por => "pt",
        Lang::Fra => "fr",
        Lang::Ita => "it",
        Lang::Deu => "de",
        Lang::Nld => "nl",
        Lang::Cat => "ca",
        Lang::Ron => "ro",
        Lang::Lat => "la",
        Lang::Epo => "eo",
        Lang::Pol => "pl",
        Lang::Rus => "ru",
        Lang::Ukr => "uk",
        Lang::Ces => "cs",
        Lang::Slk => "sk",
        Lang::Hun => "hu",
        Lang::Swe => "sv",
        Lang::Dan => "da",
        Lang::Nob => "nb",
        Lang::Fin => "fi",
        Lang::Ell => "el",
        Lang::Tur => "tr",
        Lang::Ara => "ar",
        Lang::Heb => "he",
        Lang::Hin => "hi",
        Lang::Cmn => "zh",
        Lang::Jpn => "ja",
        Lang::Kor => "ko",
        other => other.code(),
    }
}
