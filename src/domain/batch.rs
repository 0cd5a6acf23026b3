use serde::{Deserialize, Serialize};

/// Outcome of a single item within a batch call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchItem {
    pub value: i64,
    pub message: String,
}

/// Per-request aggregate returned from multi-item cart operations. Item
/// rejections are recorded here instead of being raised, so the caller
/// always receives a fully describable result even when every item failed.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchOutcome {
    pub success_rate: f32,
    pub successful: Vec<BatchItem>,
    pub failed: Vec<BatchItem>,
}

impl BatchOutcome {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn success(&mut self, value: i64, message: impl Into<String>) {
        self.successful.push(BatchItem {
            value,
            message: message.into(),
        });
    }

    pub fn failure(&mut self, value: i64, message: impl Into<String>) {
        self.failed.push(BatchItem {
            value,
            message: message.into(),
        });
    }

    pub fn has_failures(&self) -> bool {
        !self.failed.is_empty()
    }

    /// Computes the success rate and returns the finished outcome.
    pub fn finish(mut self) -> Self {
        let total = self.successful.len() + self.failed.len();
        self.success_rate = if total == 0 {
            0.0
        } else {
            (self.successful.len() as f32 / total as f32) * 100.0
        };
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_is_percentage_of_successful_items() {
        let mut outcome = BatchOutcome::new();
        outcome.success(1, "ok");
        outcome.success(2, "ok");
        outcome.failure(3, "nope");
        outcome.failure(4, "nope");
        let outcome = outcome.finish();
        assert!((outcome.success_rate - 50.0).abs() < f32::EPSILON);
    }

    #[test]
    fn rate_is_zero_when_every_item_failed() {
        let mut outcome = BatchOutcome::new();
        outcome.failure(1, "nope");
        let outcome = outcome.finish();
        assert_eq!(outcome.success_rate, 0.0);
        assert!(outcome.has_failures());
    }

    #[test]
    fn rate_is_hundred_on_full_success() {
        let mut outcome = BatchOutcome::new();
        outcome.success(1, "ok");
        let outcome = outcome.finish();
        assert_eq!(outcome.success_rate, 100.0);
        assert!(!outcome.has_failures());
    }
}
