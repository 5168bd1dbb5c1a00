//! Form reducer.
//!
//! All state changes happen here. The controller calls
//! `update(state, event, policy)` and executes the returned effects; effect
//! results come back in as completion events.

use std::{fmt, str::FromStr};

use shared::protocol::LoginRequest;
use tracing::{debug, error, info, warn};

use crate::{
    attachment::{accept, AttachmentError, DroppedFile},
    error::{FormError, Operation, Surface},
    form::{FieldName, FormState, Mode, TransientFlag},
    identity::{IdentityError, RegisterReceipt, Registration},
    search::TeamCandidate,
    session::Session,
};

/// When the login form is cleared relative to the outcome of the request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LoginResetPolicy {
    /// Clear as soon as the service answered, successful or not. A transport
    /// failure leaves the form untouched.
    #[default]
    ClearBeforeOutcome,
    /// Clear only after a successful login.
    ClearOnSuccess,
}

impl LoginResetPolicy {
    pub fn as_str(self) -> &'static str {
        match self {
            LoginResetPolicy::ClearBeforeOutcome => "clear_before_outcome",
            LoginResetPolicy::ClearOnSuccess => "clear_on_success",
        }
    }
}

impl fmt::Display for LoginResetPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LoginResetPolicy {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "clear_before_outcome" => Ok(LoginResetPolicy::ClearBeforeOutcome),
            "clear_on_success" => Ok(LoginResetPolicy::ClearOnSuccess),
            other => Err(format!("unknown login reset policy: {other}")),
        }
    }
}

#[derive(Debug)]
pub enum FormEvent {
    SwitchMode(Mode),
    ResetForm,
    FieldChanged { field: FieldName, value: String },
    FieldBlurred(FieldName),
    SearchInputChanged(String),
    SearchCompleted {
        sequence: u64,
        results: Vec<TeamCandidate>,
    },
    TeamSelected(TeamCandidate),
    FilesDropped(Vec<DroppedFile>),
    Submit,
    ForgotPassword,
    LoginCompleted {
        generation: u64,
        result: Result<Session, IdentityError>,
    },
    RegisterCompleted {
        generation: u64,
        result: Result<RegisterReceipt, IdentityError>,
    },
    PasswordResetCompleted {
        generation: u64,
        result: Result<(), IdentityError>,
    },
    DismissFlags,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormEffect {
    SearchTeams { sequence: u64, query: String },
    Login {
        generation: u64,
        credentials: LoginRequest,
    },
    Register {
        generation: u64,
        registration: Registration,
    },
    RequestPasswordReset {
        generation: u64,
        email: String,
    },
    CommitSession(Session),
}

pub fn update(
    state: &mut FormState,
    event: FormEvent,
    policy: LoginResetPolicy,
) -> Vec<FormEffect> {
    match event {
        FormEvent::SwitchMode(target) => {
            if state.switch_mode(target) {
                debug!(mode = target.as_str(), "form: mode switched");
            }
            vec![]
        }
        FormEvent::ResetForm => {
            state.reset();
            vec![]
        }
        FormEvent::FieldChanged { field, value } => {
            handle_field_changed(state, field, value);
            vec![]
        }
        FormEvent::FieldBlurred(field) => {
            if state.schema().contains(field) {
                state.touched.insert(field);
                state.revalidate();
            }
            vec![]
        }
        FormEvent::SearchInputChanged(query) => handle_search_input(state, query),
        FormEvent::SearchCompleted { sequence, results } => {
            if !state.search.complete(sequence, results) {
                debug!(
                    sequence,
                    latest = state.search.latest_sequence(),
                    "search: discarding stale completion"
                );
            }
            vec![]
        }
        FormEvent::TeamSelected(candidate) => {
            handle_team_selected(state, &candidate);
            vec![]
        }
        FormEvent::FilesDropped(files) => {
            handle_files_dropped(state, files);
            vec![]
        }
        FormEvent::Submit => handle_submit(state),
        FormEvent::ForgotPassword => handle_forgot_password(state),
        FormEvent::LoginCompleted { generation, result } => {
            handle_login_completed(state, generation, result, policy)
        }
        FormEvent::RegisterCompleted { generation, result } => {
            handle_register_completed(state, generation, result);
            vec![]
        }
        FormEvent::PasswordResetCompleted { generation, result } => {
            handle_password_reset_completed(state, generation, result);
            vec![]
        }
        FormEvent::DismissFlags => {
            state.flags.clear();
            vec![]
        }
    }
}

// ============================================================================
// Input
// ============================================================================

fn handle_field_changed(state: &mut FormState, field: FieldName, value: String) {
    // Team and picture have dedicated events.
    if matches!(field, FieldName::FavoriteTeam | FieldName::Picture) {
        debug!(%field, "form: ignoring direct edit");
        return;
    }
    if !state.schema().contains(field) {
        debug!(%field, mode = state.mode.as_str(), "form: field not shown in this mode");
        return;
    }
    state.values.set(field, value);
    state.revalidate();
}

fn handle_search_input(state: &mut FormState, query: String) -> Vec<FormEffect> {
    if state.mode != Mode::Register {
        return vec![];
    }
    match state.search.input(query.clone()) {
        Some(sequence) => vec![FormEffect::SearchTeams { sequence, query }],
        None => vec![],
    }
}

fn handle_team_selected(state: &mut FormState, candidate: &TeamCandidate) {
    if state.mode != Mode::Register {
        return;
    }
    if !state.search.select(candidate) {
        warn!(team = %candidate.name, "search: selected team is not among the results");
        return;
    }
    state.values.set(FieldName::FavoriteTeam, candidate.name.clone());
    state.touched.insert(FieldName::FavoriteTeam);
    state.revalidate();
}

fn handle_files_dropped(state: &mut FormState, files: Vec<DroppedFile>) {
    let accepted = if state.mode == Mode::Register {
        accept(files)
    } else {
        Err(AttachmentError::WrongMode)
    };
    match accepted {
        Ok(attachment) => {
            debug!(
                filename = attachment.filename(),
                size = attachment.len(),
                "attachment: picture captured"
            );
            state.values.set_picture(attachment);
            state.attachment_rejection = None;
            state.touched.insert(FieldName::Picture);
            state.revalidate();
        }
        Err(err) => {
            warn!("attachment: drop rejected: {err}");
            state.attachment_rejection = Some(err);
        }
    }
}

// ============================================================================
// Submission
// ============================================================================

fn surface(state: &mut FormState, failure: &FormError) {
    match failure.surface() {
        Surface::Fields => {
            let schema = state.schema();
            state.touched.extend(schema.fields().iter().copied());
            debug!("form: {failure}");
        }
        Surface::Flag(flag) => {
            info!(?flag, "form: {failure}");
            state.flags.raise(flag);
        }
        Surface::LogOnly => error!("form: {failure}"),
    }
}

fn handle_submit(state: &mut FormState) -> Vec<FormEffect> {
    state.flags.clear();
    state.revalidate();
    if !state.errors.is_empty() {
        let failure = FormError::Validation(state.errors.clone());
        surface(state, &failure);
        return vec![];
    }

    let generation = state.generation();
    let effect = match state.mode {
        Mode::Login => FormEffect::Login {
            generation,
            credentials: LoginRequest {
                email: state.values.text(FieldName::Email).to_string(),
                password: state.values.text(FieldName::Password).to_string(),
            },
        },
        Mode::Register => match build_registration(state) {
            Some(registration) => FormEffect::Register {
                generation,
                registration,
            },
            None => return vec![],
        },
    };
    state.pending_submissions += 1;
    vec![effect]
}

fn build_registration(state: &FormState) -> Option<Registration> {
    let values = &state.values;
    let picture = values.picture()?.clone();
    // The committed selection wins over whatever was typed afterwards.
    let favorite_team = state
        .search
        .selection()
        .map(|team| team.name.clone())
        .unwrap_or_else(|| values.text(FieldName::FavoriteTeam).to_string());
    Some(Registration {
        username: values.text(FieldName::Username).to_string(),
        email: values.text(FieldName::Email).to_string(),
        password: values.text(FieldName::Password).to_string(),
        location: values.text(FieldName::Location).to_string(),
        occupation: values.text(FieldName::Occupation).to_string(),
        favorite_team,
        picture,
    })
}

fn handle_forgot_password(state: &mut FormState) -> Vec<FormEffect> {
    if state.mode != Mode::Login {
        debug!("form: forgot password is only offered on the login form");
        return vec![];
    }
    state.flags.clear();
    let email = state.values.text(FieldName::Email);
    if email.is_empty() {
        surface(state, &FormError::EmptyInput);
        return vec![];
    }
    vec![FormEffect::RequestPasswordReset {
        generation: state.generation(),
        email: email.to_string(),
    }]
}

fn finish_submission(state: &mut FormState) {
    state.pending_submissions = state.pending_submissions.saturating_sub(1);
}

/// Whether an answer still belongs to the form on screen. A reset or mode
/// switch since the request was issued means the user has moved on.
fn is_current(state: &FormState, generation: u64, operation: Operation) -> bool {
    if generation == state.generation() {
        return true;
    }
    debug!(
        %operation,
        generation,
        current = state.generation(),
        "form: answer arrived after the form was reset, leaving the form alone"
    );
    false
}

fn handle_login_completed(
    state: &mut FormState,
    generation: u64,
    result: Result<Session, IdentityError>,
    policy: LoginResetPolicy,
) -> Vec<FormEffect> {
    finish_submission(state);
    let current = is_current(state, generation, Operation::Login);
    match result {
        Ok(session) => {
            if current {
                state.reset();
            }
            vec![FormEffect::CommitSession(session)]
        }
        Err(err) => {
            let answered = err.response_received();
            let failure = FormError::from_identity(Operation::Login, err);
            if !current {
                info!("form: ignoring earlier login answer: {failure}");
                return vec![];
            }
            if policy == LoginResetPolicy::ClearBeforeOutcome && answered {
                state.reset();
            }
            surface(state, &failure);
            vec![]
        }
    }
}

fn handle_register_completed(
    state: &mut FormState,
    generation: u64,
    result: Result<RegisterReceipt, IdentityError>,
) {
    finish_submission(state);
    let current = is_current(state, generation, Operation::Register);
    match result {
        Ok(receipt) => {
            if !receipt.is_http_success() {
                warn!(
                    status = receipt.status,
                    "form: register answered with an error status, treating the answer as accepted"
                );
            }
            if receipt.accepted() {
                info!("form: registration accepted");
            }
            if !current {
                return;
            }
            state.reset();
            if receipt.accepted() {
                state.switch_mode(Mode::Login);
            }
        }
        Err(err) => surface(state, &FormError::from_identity(Operation::Register, err)),
    }
}

fn handle_password_reset_completed(
    state: &mut FormState,
    generation: u64,
    result: Result<(), IdentityError>,
) {
    let current = is_current(state, generation, Operation::ForgotPassword);
    if current {
        state.values.clear_field(FieldName::Email);
        if !state.touched.is_empty() {
            state.revalidate();
        }
    }
    match result {
        Ok(()) if current => state.flags.raise(TransientFlag::ForgotPasswordClicked),
        Ok(()) => info!("form: password reset link sent"),
        Err(err) => surface(state, &FormError::from_identity(Operation::ForgotPassword, err)),
    }
}

#[cfg(test)]
#[path = "tests/reducer_tests.rs"]
mod tests;
