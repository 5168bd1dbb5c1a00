use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::{TeamId, TeamSummary};

pub const LOGIN_PATH: &str = "/auth/login";
pub const REGISTER_PATH: &str = "/auth/register";
pub const FORGOT_PASSWORD_PATH: &str = "/users/forgetPassword";

/// Multipart field names of the registration request.
pub mod register_fields {
    pub const USERNAME: &str = "username";
    pub const EMAIL: &str = "email";
    pub const PASSWORD: &str = "password";
    pub const LOCATION: &str = "location";
    pub const OCCUPATION: &str = "occupation";
    pub const FAVORITE_TEAM: &str = "favoriteTeam";
    pub const PICTURE_PATH: &str = "picturePath";
    pub const PICTURE: &str = "picture";
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Login reply. Both members are optional on the wire: the service answers
/// rejected logins with a plain message object instead of an HTTP error.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoginResponse {
    #[serde(default)]
    pub user: Value,
    #[serde(default)]
    pub token: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TeamSearchEnvelope {
    #[serde(default)]
    pub response: Vec<TeamSearchEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeamSearchEntry {
    pub team: TeamRecord,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeamRecord {
    pub id: TeamId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo: Option<String>,
}

impl From<TeamRecord> for TeamSummary {
    fn from(record: TeamRecord) -> Self {
        Self {
            team_id: record.id,
            name: record.name,
            logo_url: record.logo,
        }
    }
}

/// JavaScript-style truthiness of a decoded response body.
///
/// The identity service signals "no result" with `null`, `false`, `0` or an
/// empty string rather than with a status code.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_f64().is_some_and(|n| n != 0.0 && !n.is_nan()),
        Value::String(text) => !text.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}
