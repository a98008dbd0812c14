use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

/// `/auth/login` answers with the bare token pair, not an `ApiResponse`.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    #[serde(rename = "refreshToken")]
    pub refresh_token: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub username: String,
    pub person_name: String,
    pub password: String,
    pub email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshRequest {
    pub token: String,
}

/// Payload of a successful refresh. The refresh token is only present when
/// the backend rotates it.
#[derive(Debug, Clone, Deserialize)]
pub struct RefreshData {
    pub token: String,
    #[serde(rename = "refreshToken", default)]
    pub refresh_token: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_request_field_names() {
        let req = RegisterRequest {
            username: "ana".to_string(),
            person_name: "Ana Souza".to_string(),
            password: "secret".to_string(),
            email: "ana@example.com".to_string(),
        };
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["personName"], "Ana Souza");
        assert!(json.get("person_name").is_none());
    }

    #[test]
    fn test_refresh_data_optional_rotation() {
        let plain: RefreshData = serde_json::from_str(r#"{"token":"abc2"}"#).unwrap();
        assert_eq!(plain.refresh_token, None);

        let rotated: RefreshData =
            serde_json::from_str(r#"{"token":"abc2","refreshToken":"r2"}"#).unwrap();
        assert_eq!(rotated.refresh_token.as_deref(), Some("r2"));
    }
}
