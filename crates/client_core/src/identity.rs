//! HTTP client for the remote identity service.

use async_trait::async_trait;
use reqwest::{
    multipart::{Form, Part},
    Client, Response,
};
use serde_json::Value;
use shared::{
    error::describe_error_body,
    protocol::{
        is_truthy, register_fields, ForgotPasswordRequest, LoginRequest, LoginResponse,
        FORGOT_PASSWORD_PATH, LOGIN_PATH, REGISTER_PATH,
    },
};
use thiserror::Error;
use tracing::debug;

use crate::{attachment::Attachment, session::Session};

#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("identity service unreachable: {0}")]
    Transport(String),
    #[error("identity service returned status {status}: {}", describe_error_body(.body))]
    Status { status: u16, body: String },
    #[error("malformed identity service response: {0}")]
    Decode(String),
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    #[error("identity service rejected the credentials")]
    Rejected,
}

impl IdentityError {
    /// Whether the service answered at all.
    pub fn response_received(&self) -> bool {
        matches!(
            self,
            IdentityError::Status { .. } | IdentityError::Decode(_) | IdentityError::Rejected
        )
    }
}

fn transport(err: reqwest::Error) -> IdentityError {
    IdentityError::Transport(err.to_string())
}

/// Everything sent to the register endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    pub username: String,
    pub email: String,
    pub password: String,
    pub location: String,
    pub occupation: String,
    pub favorite_team: String,
    pub picture: Attachment,
}

impl Registration {
    pub fn picture_path(&self) -> &str {
        self.picture.filename()
    }

    /// Text parts of the multipart body, in wire order.
    pub fn text_fields(&self) -> [(&'static str, &str); 7] {
        [
            (register_fields::USERNAME, &self.username),
            (register_fields::EMAIL, &self.email),
            (register_fields::PASSWORD, &self.password),
            (register_fields::LOCATION, &self.location),
            (register_fields::OCCUPATION, &self.occupation),
            (register_fields::FAVORITE_TEAM, &self.favorite_team),
            (register_fields::PICTURE_PATH, self.picture_path()),
        ]
    }
}

/// Whatever the register endpoint answered, regardless of status.
#[derive(Debug, Clone, PartialEq)]
pub struct RegisterReceipt {
    pub status: u16,
    pub body: Value,
}

impl RegisterReceipt {
    /// A truthy body counts as a created account. The status code is not
    /// consulted.
    pub fn accepted(&self) -> bool {
        is_truthy(&self.body)
    }

    pub fn is_http_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[async_trait]
pub trait IdentityService: Send + Sync {
    async fn login(&self, credentials: &LoginRequest) -> Result<Session, IdentityError>;
    async fn register(&self, registration: &Registration)
        -> Result<RegisterReceipt, IdentityError>;
    async fn forgot_password(&self, email: &str) -> Result<(), IdentityError>;
}

/// Turns a decoded login body into a session. Falsy bodies and bodies without
/// a truthy user and token are rejections.
pub fn session_from_login_body(body: Value) -> Result<Session, IdentityError> {
    if !is_truthy(&body) {
        return Err(IdentityError::Rejected);
    }
    let response: LoginResponse =
        serde_json::from_value(body).map_err(|_| IdentityError::Rejected)?;
    if !is_truthy(&response.user) || !is_truthy(&response.token) {
        return Err(IdentityError::Rejected);
    }
    let token = match response.token {
        Value::String(token) => token,
        other => other.to_string(),
    };
    Ok(Session {
        user: response.user,
        token,
    })
}

fn decode_body(raw: &str) -> Result<Value, IdentityError> {
    if raw.trim().is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_str(raw).map_err(|err| IdentityError::Decode(err.to_string()))
}

pub struct HttpIdentityService {
    http: Client,
    base_url: String,
}

impl HttpIdentityService {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    async fn read_body(response: Response) -> Result<(u16, String), IdentityError> {
        let status = response.status().as_u16();
        let raw = response.text().await.map_err(transport)?;
        Ok((status, raw))
    }
}

#[async_trait]
impl IdentityService for HttpIdentityService {
    async fn login(&self, credentials: &LoginRequest) -> Result<Session, IdentityError> {
        let response = self
            .http
            .post(self.endpoint(LOGIN_PATH))
            .json(credentials)
            .send()
            .await
            .map_err(transport)?;
        let (status, raw) = Self::read_body(response).await?;
        if !(200..300).contains(&status) {
            return Err(IdentityError::Status { status, body: raw });
        }
        session_from_login_body(decode_body(&raw)?)
    }

    async fn register(
        &self,
        registration: &Registration,
    ) -> Result<RegisterReceipt, IdentityError> {
        let picture = Part::bytes(registration.picture.bytes().to_vec())
            .file_name(registration.picture.filename().to_string())
            .mime_str(registration.picture.mime_type())
            .map_err(|err| IdentityError::InvalidRequest(err.to_string()))?;
        let form = registration
            .text_fields()
            .into_iter()
            .fold(Form::new(), |form, (name, value)| {
                form.text(name, value.to_string())
            })
            .part(register_fields::PICTURE, picture);

        let response = self
            .http
            .post(self.endpoint(REGISTER_PATH))
            .multipart(form)
            .send()
            .await
            .map_err(transport)?;
        let (status, raw) = Self::read_body(response).await?;
        debug!(status, "identity: register answered");
        Ok(RegisterReceipt {
            status,
            body: decode_body(&raw)?,
        })
    }

    async fn forgot_password(&self, email: &str) -> Result<(), IdentityError> {
        let response = self
            .http
            .post(self.endpoint(FORGOT_PASSWORD_PATH))
            .json(&ForgotPasswordRequest {
                email: email.to_string(),
            })
            .send()
            .await
            .map_err(transport)?;
        let (status, raw) = Self::read_body(response).await?;
        if !(200..300).contains(&status) {
            return Err(IdentityError::Status { status, body: raw });
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "tests/identity_tests.rs"]
mod tests;
