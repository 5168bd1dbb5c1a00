use serde::{Deserialize, Serialize};

/// Error body returned by the identity service on non-success responses.
///
/// The service is not consistent about the key it uses, so all known
/// spellings are accepted.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ErrorBody {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub msg: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ErrorBody {
    pub fn parse(raw: &str) -> Option<Self> {
        serde_json::from_str(raw).ok()
    }

    pub fn summary(&self) -> Option<&str> {
        self.msg
            .as_deref()
            .or(self.error.as_deref())
            .or(self.message.as_deref())
    }
}

/// Short human-readable description of a raw error body.
pub fn describe_error_body(raw: &str) -> String {
    match ErrorBody::parse(raw).as_ref().and_then(ErrorBody::summary) {
        Some(summary) => summary.to_string(),
        None => raw.trim().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefers_known_keys_over_raw_body() {
        assert_eq!(
            describe_error_body(r#"{"msg":"User does not exist."}"#),
            "User does not exist."
        );
        assert_eq!(describe_error_body(r#"{"error":"boom"}"#), "boom");
        assert_eq!(describe_error_body("  plain text \n"), "plain text");
    }
}
