//! Runs the form reducer and executes its effects against the identity
//! service, the team search and the session collaborators.

use std::{collections::VecDeque, path::Path, sync::Arc};

use anyhow::Result;
use tokio::{
    sync::{watch, Mutex},
    task::JoinHandle,
};
use tracing::debug;

use crate::{
    attachment::{AttachmentError, DroppedFile},
    config::Settings,
    form::{FieldName, FormState, Mode},
    identity::{HttpIdentityService, IdentityService},
    reducer::{update, FormEffect, FormEvent, LoginResetPolicy},
    search::{HttpTeamSearch, SearchProvider, TeamCandidate, TeamSearchService},
    session::{Navigator, SessionEstablisher, SessionStore},
};

pub struct FormController {
    state: Mutex<FormState>,
    snapshots: watch::Sender<FormState>,
    identity: Arc<dyn IdentityService>,
    search: SearchProvider,
    establisher: SessionEstablisher,
    login_reset_policy: LoginResetPolicy,
}

impl FormController {
    pub fn new(
        identity: Arc<dyn IdentityService>,
        teams: Arc<dyn TeamSearchService>,
        establisher: SessionEstablisher,
    ) -> Arc<Self> {
        Self::new_with_policy(identity, teams, establisher, LoginResetPolicy::default())
    }

    pub fn new_with_policy(
        identity: Arc<dyn IdentityService>,
        teams: Arc<dyn TeamSearchService>,
        establisher: SessionEstablisher,
        login_reset_policy: LoginResetPolicy,
    ) -> Arc<Self> {
        let initial = FormState::new(Mode::Login);
        let (snapshots, _) = watch::channel(initial.clone());
        Arc::new(Self {
            state: Mutex::new(initial),
            snapshots,
            identity,
            search: SearchProvider::new(teams),
            establisher,
            login_reset_policy,
        })
    }

    /// Builds a controller talking to the configured HTTP services.
    pub fn from_settings(
        settings: &Settings,
        store: Arc<dyn SessionStore>,
        navigator: Arc<dyn Navigator>,
    ) -> Result<Arc<Self>> {
        let identity = HttpIdentityService::new(settings.identity_base_url()?.as_str());
        let teams = HttpTeamSearch::new(settings.team_search_endpoint()?.as_str())
            .with_credentials(
                settings.team_search_api_key.clone(),
                Some(settings.team_search_host.clone()),
            );
        let establisher =
            SessionEstablisher::new(store, navigator).with_home_route(settings.home_route.clone());
        Ok(Self::new_with_policy(
            Arc::new(identity),
            Arc::new(teams),
            establisher,
            settings.login_reset_policy,
        ))
    }

    /// Read-only view for the renderer; updated after every transition.
    pub fn subscribe(&self) -> watch::Receiver<FormState> {
        self.snapshots.subscribe()
    }

    pub async fn snapshot(&self) -> FormState {
        self.state.lock().await.clone()
    }

    pub fn search_failures(&self) -> u64 {
        self.search.failure_count()
    }

    /// Applies `event` and runs the resulting effects until no follow-up
    /// events remain. The state lock is released while effects are awaited,
    /// so several dispatches may be in flight at once.
    pub async fn dispatch(&self, event: FormEvent) {
        let mut pending = VecDeque::from([event]);
        while let Some(event) = pending.pop_front() {
            let effects = {
                let mut state = self.state.lock().await;
                let effects = update(&mut state, event, self.login_reset_policy);
                self.snapshots.send_replace(state.clone());
                effects
            };
            for effect in effects {
                if let Some(next) = self.perform(effect).await {
                    pending.push_back(next);
                }
            }
        }
    }

    pub fn spawn_dispatch(self: &Arc<Self>, event: FormEvent) -> JoinHandle<()> {
        let controller = Arc::clone(self);
        tokio::spawn(async move { controller.dispatch(event).await })
    }

    async fn perform(&self, effect: FormEffect) -> Option<FormEvent> {
        match effect {
            FormEffect::SearchTeams { sequence, query } => {
                debug!(sequence, query = %query, "search: lookup issued");
                let results = self.search.search(&query).await;
                Some(FormEvent::SearchCompleted { sequence, results })
            }
            FormEffect::Login {
                generation,
                credentials,
            } => {
                debug!(generation, "identity: login requested");
                let result = self.identity.login(&credentials).await;
                Some(FormEvent::LoginCompleted { generation, result })
            }
            FormEffect::Register {
                generation,
                registration,
            } => {
                debug!(
                    generation,
                    picture = registration.picture_path(),
                    "identity: register requested"
                );
                let result = self.identity.register(&registration).await;
                Some(FormEvent::RegisterCompleted { generation, result })
            }
            FormEffect::RequestPasswordReset { generation, email } => {
                debug!(generation, "identity: password reset requested");
                let result = self.identity.forgot_password(&email).await;
                Some(FormEvent::PasswordResetCompleted { generation, result })
            }
            FormEffect::CommitSession(session) => {
                self.establisher.commit(session);
                None
            }
        }
    }

    pub async fn switch_mode(&self, mode: Mode) {
        self.dispatch(FormEvent::SwitchMode(mode)).await;
    }

    /// Types `value` into `field` and leaves it, as a user tabbing through
    /// the form would.
    pub async fn fill(&self, field: FieldName, value: impl Into<String>) {
        self.dispatch(FormEvent::FieldChanged {
            field,
            value: value.into(),
        })
        .await;
        self.dispatch(FormEvent::FieldBlurred(field)).await;
    }

    pub async fn search_team(&self, query: impl Into<String>) {
        self.dispatch(FormEvent::SearchInputChanged(query.into()))
            .await;
    }

    pub async fn select_team(&self, candidate: TeamCandidate) {
        self.dispatch(FormEvent::TeamSelected(candidate)).await;
    }

    pub async fn drop_files(&self, files: Vec<DroppedFile>) {
        self.dispatch(FormEvent::FilesDropped(files)).await;
    }

    pub async fn drop_path(&self, path: impl AsRef<Path>) -> Result<(), AttachmentError> {
        let file = DroppedFile::read(path).await?;
        self.drop_files(vec![file]).await;
        Ok(())
    }

    pub async fn submit(&self) {
        self.dispatch(FormEvent::Submit).await;
    }

    pub async fn forgot_password(&self) {
        self.dispatch(FormEvent::ForgotPassword).await;
    }
}

#[cfg(test)]
#[path = "tests/controller_tests.rs"]
mod tests;
