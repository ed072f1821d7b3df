//! Language detection with the legacy detector and the detection service.
//!
//! Both detectors are independent, fallible capabilities. Their failures are
//! reported through distinct error types so the caller's [`FailurePolicy`]
//! decides whether a legacy failure sinks the document.

mod legacy;
mod service;

use std::sync::Arc;

use thiserror::Error;
use tracing::warn;

use crate::models::DetectionResult;

pub use legacy::{LegacyDetector, LegacyError, StatisticalDetector};
pub use service::{HttpLanguageService, LanguageService, ServiceError};

#[derive(Debug, Error)]
pub enum DetectionError {
    #[error("Detection service: {0}")]
    Service(#[from] ServiceError),
    #[error("Legacy detector: {0}")]
    Legacy(#[from] LegacyError),
}

/// How a legacy detector failure is handled.
///
/// A detection service failure is always fatal for the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// Any detector failure fails the document.
    #[default]
    FailFast,
    /// A legacy failure is recorded as an empty guess.
    BestEffort,
}

/// Runs the detection service and the legacy detector over the same text.
pub struct DualLanguageDetector {
    service: Arc<dyn LanguageService>,
    legacy: Arc<dyn LegacyDetector>,
    policy: FailurePolicy,
}

impl DualLanguageDetector {
    pub fn new(service: Arc<dyn LanguageService>, legacy: Arc<dyn LegacyDetector>) -> Self {
        Self {
            service,
            legacy,
            policy: FailurePolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: FailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> FailurePolicy {
        self.policy
    }

    /// Top guess of the detection service.
    pub async fn detect_new(&self, text: &str) -> Result<String, ServiceError> {
        self.service.top_language(text).await
    }

    /// Top guess of the legacy detector; empty when it declines to guess.
    pub fn detect_old(&self, text: &str) -> Result<String, LegacyError> {
        self.legacy.top_guess(text)
    }

    /// Run both detectors under the configured policy.
    pub async fn detect(&self, text: &str) -> Result<DetectionResult, DetectionError> {
        let new_detected_language = self.detect_new(text).await?;

        let old_detected_language = match (self.detect_old(text), self.policy) {
            (Ok(code), _) => code,
            (Err(e), FailurePolicy::BestEffort) => {
                warn!("Legacy detector failed, recording no guess: {}", e);
                String::new()
            }
            (Err(e), FailurePolicy::FailFast) => return Err(e.into()),
        };

        Ok(DetectionResult {
            new_detected_language,
            old_detected_language,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct FixedService(&'static str);

    #[async_trait]
    impl LanguageService for FixedService {
        async fn top_language(&self, _text: &str) -> Result<String, ServiceError> {
            Ok(self.0.to_string())
        }
    }

    struct DownService;

    #[async_trait]
    impl LanguageService for DownService {
        async fn top_language(&self, _text: &str) -> Result<String, ServiceError> {
            Err(ServiceError::Connection("refused".to_string()))
        }
    }

    struct BrokenLegacy;

    impl LegacyDetector for BrokenLegacy {
        fn guesses(&self, _text: &str, _limit: usize) -> Result<Vec<String>, LegacyError> {
            Err(LegacyError::Failed("model missing".to_string()))
        }
    }

    #[tokio::test]
    async fn test_detect_combines_both() {
        let detector = DualLanguageDetector::new(
            Arc::new(FixedService("pt")),
            Arc::new(StatisticalDetector::new()),
        );
        let result = detector
            .detect("The weather today is sunny and warm with a light breeze from the sea.")
            .await
            .unwrap();
        assert_eq!(result.new_detected_language, "pt");
        assert_eq!(result.old_detected_language, "en");
    }

    #[tokio::test]
    async fn test_empty_text_is_not_an_error() {
        let detector = DualLanguageDetector::new(
            Arc::new(FixedService("en")),
            Arc::new(StatisticalDetector::new()),
        );
        let result = detector.detect("").await.unwrap();
        assert_eq!(result.new_detected_language, "en");
        assert_eq!(result.old_detected_language, "");
    }

    #[tokio::test]
    async fn test_service_failure_is_fatal_under_any_policy() {
        for policy in [FailurePolicy::FailFast, FailurePolicy::BestEffort] {
            let detector =
                DualLanguageDetector::new(Arc::new(DownService), Arc::new(StatisticalDetector))
                    .with_policy(policy);
            assert!(matches!(
                detector.detect("texto").await,
                Err(DetectionError::Service(_))
            ));
        }
    }

    #[tokio::test]
    async fn test_legacy_failure_follows_policy() {
        let detector =
            DualLanguageDetector::new(Arc::new(FixedService("es")), Arc::new(BrokenLegacy));
        assert!(matches!(
            detector.detect("texto").await,
            Err(DetectionError::Legacy(_))
        ));

        let detector = detector.with_policy(FailurePolicy::BestEffort);
        let result = detector.detect("texto").await.unwrap();
        assert_eq!(result.new_detected_language, "es");
        assert_eq!(result.old_detected_language, "");
    }
}
