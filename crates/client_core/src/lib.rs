//! Headless login / register / forgot-password form.
//!
//! [`reducer::update`] holds every state transition; [`FormController`]
//! executes the effects it returns against the identity service, the team
//! search and the session collaborators, and publishes each new state to the
//! renderer.

pub mod attachment;
pub mod config;
pub mod controller;
pub mod error;
pub mod form;
pub mod identity;
pub mod reducer;
pub mod search;
pub mod session;
pub mod validation;

pub use attachment::{Attachment, AttachmentError, DroppedFile};
pub use config::{load_settings, Settings};
pub use controller::FormController;
pub use error::{FormError, Operation, Surface};
pub use form::{FieldName, FieldValues, FormState, Mode, TransientFlag, TransientFlags};
pub use identity::{
    HttpIdentityService, IdentityError, IdentityService, RegisterReceipt, Registration,
};
pub use reducer::{FormEffect, FormEvent, LoginResetPolicy};
pub use search::{HttpTeamSearch, SearchProvider, TeamCandidate, TeamSearchService};
pub use session::{
    InMemorySessionStore, Navigator, RecordingNavigator, Session, SessionEstablisher,
    SessionStore,
};
pub use validation::{validate, Schema};
