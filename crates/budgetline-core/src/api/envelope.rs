use serde::{Deserialize, Serialize};

use super::ApiError;

/// Uniform wrapper every backend endpoint answers with.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<String>>,
}

impl<T> ApiResponse<T> {
    /// Unwrap the payload, turning `success: false` into `ApiError::Rejected`
    pub fn into_result(self) -> Result<T, ApiError> {
        self.check()?
            .data
            .ok_or_else(|| ApiError::InvalidResponse("success reported without data".to_string()))
    }

    /// For endpoints that answer with `data: null` (deletes)
    pub fn into_unit(self) -> Result<(), ApiError> {
        self.check().map(|_| ())
    }

    fn check(self) -> Result<Self, ApiError> {
        if self.success {
            Ok(self)
        } else {
            Err(ApiError::Rejected {
                message: self
                    .message
                    .unwrap_or_else(|| "request was not successful".to_string()),
                errors: self.errors.unwrap_or_default(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_into_result() {
        let env: ApiResponse<Vec<String>> =
            serde_json::from_str(r#"{"success":true,"data":["a","b"]}"#).unwrap();
        assert_eq!(env.into_result().unwrap(), vec!["a", "b"]);
    }

    #[test]
    fn test_rejected_carries_message_and_errors() {
        let env: ApiResponse<serde_json::Value> = serde_json::from_str(
            r#"{"success":false,"message":"invalid budget","errors":["month out of range"]}"#,
        )
        .unwrap();
        match env.into_result() {
            Err(ApiError::Rejected { message, errors }) => {
                assert_eq!(message, "invalid budget");
                assert_eq!(errors, vec!["month out of range"]);
            }
            other => panic!("expected Rejected, got {:?}", other),
        }
    }

    #[test]
    fn test_success_without_data() {
        let env: ApiResponse<serde_json::Value> =
            serde_json::from_str(r#"{"success":true,"data":null}"#).unwrap();
        assert!(env.clone().into_unit().is_ok());
        assert!(matches!(env.into_result(), Err(ApiError::InvalidResponse(_))));
    }
}
