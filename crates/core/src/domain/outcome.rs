// Outcome Domain Model

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Detail key the engine uses for failure messages
pub const ERROR_DETAIL_KEY: &str = "error";

/// Free-form diagnostic details attached to an outcome
pub type Details = BTreeMap<String, serde_json::Value>;

/// Health status (UNKNOWN is intentionally not modeled)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Status {
    Up,
    Down,
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Status::Up => write!(f, "UP"),
            Status::Down => write!(f, "DOWN"),
        }
    }
}

/// Terminal result of one probe execution
///
/// Fields are private: an outcome is built once through the consuming
/// `with_detail` builder and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Outcome {
    status: Status,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    details: Details,
}

impl Outcome {
    pub fn new(status: Status) -> Self {
        Self {
            status,
            details: Details::new(),
        }
    }

    pub fn up() -> Self {
        Self::new(Status::Up)
    }

    pub fn down() -> Self {
        Self::new(Status::Down)
    }

    /// DOWN outcome carrying `message` under the `error` detail
    pub fn down_with_error(message: impl Into<String>) -> Self {
        Self::down().with_detail(ERROR_DETAIL_KEY, message.into())
    }

    /// Return a copy of this outcome with one more detail entry
    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.details.insert(key.into(), value.into());
        self
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn is_up(&self) -> bool {
        self.status == Status::Up
    }

    pub fn details(&self) -> &Details {
        &self.details
    }

    pub fn detail(&self, key: &str) -> Option<&serde_json::Value> {
        self.details.get(key)
    }

    /// Failure message recorded by the engine, if any
    pub fn error_message(&self) -> Option<&str> {
        self.details.get(ERROR_DETAIL_KEY).and_then(|v| v.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_up_has_no_details() {
        let outcome = Outcome::up();
        assert!(outcome.is_up());
        assert!(outcome.details().is_empty());
        assert_eq!(outcome, Outcome::up());
    }

    #[test]
    fn test_down_with_error() {
        let outcome = Outcome::down_with_error("connection refused");
        assert_eq!(outcome.status(), Status::Down);
        assert_eq!(outcome.error_message(), Some("connection refused"));
    }

    #[test]
    fn test_with_detail_keeps_original_untouched() {
        let base = Outcome::up();
        let detailed = base.clone().with_detail("latency_ms", 12);

        assert!(base.details().is_empty());
        assert_eq!(detailed.detail("latency_ms"), Some(&serde_json::json!(12)));
    }

    #[test]
    fn test_serialized_shape() {
        let json = serde_json::to_value(Outcome::up()).unwrap();
        assert_eq!(json, serde_json::json!({ "status": "UP" }));

        let json = serde_json::to_value(Outcome::down_with_error("boom")).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "status": "DOWN", "details": { "error": "boom" } })
        );
    }
}
