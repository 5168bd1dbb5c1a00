//! Failure taxonomy of the form and where each kind is shown.

use std::fmt;

use thiserror::Error;

use crate::{
    form::{TransientFlag, ValidationErrors},
    identity::IdentityError,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Login,
    Register,
    ForgotPassword,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Operation::Login => "login",
            Operation::Register => "register",
            Operation::ForgotPassword => "forgot password",
        })
    }
}

/// Where a failure becomes visible.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Surface {
    /// Under the offending fields.
    Fields,
    Flag(TransientFlag),
    /// Logged only. The user sees nothing.
    LogOnly,
}

#[derive(Debug, Error)]
pub enum FormError {
    #[error("form has {} invalid field(s)", .0.len())]
    Validation(ValidationErrors),
    #[error("login rejected: {0}")]
    Credential(#[source] IdentityError),
    #[error("an email address is required to reset the password")]
    EmptyInput,
    #[error("{operation} failed: {source}")]
    SilentNetwork {
        operation: Operation,
        #[source]
        source: IdentityError,
    },
}

impl FormError {
    /// Classifies a failed identity call. Login failures are shown as wrong
    /// credentials; register and forgot-password failures are only logged.
    pub fn from_identity(operation: Operation, source: IdentityError) -> Self {
        match operation {
            Operation::Login => FormError::Credential(source),
            Operation::Register | Operation::ForgotPassword => {
                FormError::SilentNetwork { operation, source }
            }
        }
    }

    pub fn surface(&self) -> Surface {
        match self {
            FormError::Validation(_) => Surface::Fields,
            FormError::Credential(_) => Surface::Flag(TransientFlag::WrongCredentials),
            FormError::EmptyInput => Surface::Flag(TransientFlag::MissingEmail),
            FormError::SilentNetwork { .. } => Surface::LogOnly,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn login_failures_surface_as_wrong_credentials() {
        for source in [
            IdentityError::Rejected,
            IdentityError::Transport("refused".into()),
            IdentityError::Status {
                status: 400,
                body: r#"{"msg":"Invalid credentials."}"#.into(),
            },
        ] {
            let err = FormError::from_identity(Operation::Login, source);
            assert_eq!(
                err.surface(),
                Surface::Flag(TransientFlag::WrongCredentials)
            );
        }
    }

    #[test]
    fn register_and_reset_failures_are_log_only() {
        for operation in [Operation::Register, Operation::ForgotPassword] {
            let err = FormError::from_identity(operation, IdentityError::Transport("down".into()));
            assert_eq!(err.surface(), Surface::LogOnly);
            assert!(err.to_string().starts_with(&operation.to_string()));
        }
    }

    #[test]
    fn empty_email_and_validation_surfaces() {
        assert_eq!(
            FormError::EmptyInput.surface(),
            Surface::Flag(TransientFlag::MissingEmail)
        );
        assert_eq!(
            FormError::Validation(ValidationErrors::default()).surface(),
            Surface::Fields
        );
    }
}
