//! Form data model: field values, validation errors, touched set and the
//! one-shot notices shown by the renderer.

use std::{
    collections::{BTreeMap, BTreeSet},
    fmt,
};

pub use shared::domain::Mode;

use crate::{
    attachment::{Attachment, AttachmentError},
    search::SearchState,
    validation::{validate, Schema},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FieldName {
    Username,
    FavoriteTeam,
    Email,
    Password,
    Location,
    Occupation,
    Picture,
}

impl FieldName {
    pub const ALL: [FieldName; 7] = [
        FieldName::Username,
        FieldName::FavoriteTeam,
        FieldName::Email,
        FieldName::Password,
        FieldName::Location,
        FieldName::Occupation,
        FieldName::Picture,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            FieldName::Username => "username",
            FieldName::FavoriteTeam => "favoriteTeam",
            FieldName::Email => "email",
            FieldName::Password => "password",
            FieldName::Location => "location",
            FieldName::Occupation => "occupation",
            FieldName::Picture => "picture",
        }
    }
}

impl fmt::Display for FieldName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Current value of every field. Text fields default to the empty string;
/// `picture` holds the captured attachment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldValues {
    text: BTreeMap<FieldName, String>,
    picture: Option<Attachment>,
}

impl FieldValues {
    pub fn new() -> Self {
        Self::default()
    }

    /// Text value of `field`. For `picture` this is the attachment filename.
    pub fn text(&self, field: FieldName) -> &str {
        match field {
            FieldName::Picture => self.picture.as_ref().map_or("", Attachment::filename),
            _ => self.text.get(&field).map_or("", String::as_str),
        }
    }

    /// Returns `false` for `picture`, which only accepts an [`Attachment`].
    pub fn set(&mut self, field: FieldName, value: impl Into<String>) -> bool {
        if field == FieldName::Picture {
            return false;
        }
        self.text.insert(field, value.into());
        true
    }

    pub fn clear_field(&mut self, field: FieldName) {
        match field {
            FieldName::Picture => self.picture = None,
            _ => {
                self.text.remove(&field);
            }
        }
    }

    pub fn picture(&self) -> Option<&Attachment> {
        self.picture.as_ref()
    }

    pub(crate) fn set_picture(&mut self, attachment: Attachment) {
        self.picture = Some(attachment);
    }

    pub fn is_empty(&self) -> bool {
        self.picture.is_none() && self.text.values().all(String::is_empty)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors(BTreeMap<FieldName, &'static str>);

impl ValidationErrors {
    pub fn get(&self, field: FieldName) -> Option<&'static str> {
        self.0.get(&field).copied()
    }

    pub fn insert(&mut self, field: FieldName, message: &'static str) {
        self.0.insert(field, message);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn fields(&self) -> impl Iterator<Item = FieldName> + '_ {
        self.0.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (FieldName, &'static str)> + '_ {
        self.0.iter().map(|(field, message)| (*field, *message))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransientFlag {
    ForgotPasswordClicked,
    MissingEmail,
    WrongCredentials,
}

impl TransientFlag {
    pub const ALL: [TransientFlag; 3] = [
        TransientFlag::ForgotPasswordClicked,
        TransientFlag::MissingEmail,
        TransientFlag::WrongCredentials,
    ];
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransientFlags {
    pub forgot_password_clicked: bool,
    pub missing_email: bool,
    pub wrong_credentials: bool,
}

impl TransientFlags {
    pub fn raise(&mut self, flag: TransientFlag) {
        match flag {
            TransientFlag::ForgotPasswordClicked => self.forgot_password_clicked = true,
            TransientFlag::MissingEmail => self.missing_email = true,
            TransientFlag::WrongCredentials => self.wrong_credentials = true,
        }
    }

    pub fn is_raised(&self, flag: TransientFlag) -> bool {
        match flag {
            TransientFlag::ForgotPasswordClicked => self.forgot_password_clicked,
            TransientFlag::MissingEmail => self.missing_email,
            TransientFlag::WrongCredentials => self.wrong_credentials,
        }
    }

    pub fn any(&self) -> bool {
        self.forgot_password_clicked || self.missing_email || self.wrong_credentials
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

/// Everything the renderer needs to draw the form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormState {
    pub mode: Mode,
    pub values: FieldValues,
    pub errors: ValidationErrors,
    pub touched: BTreeSet<FieldName>,
    pub search: SearchState,
    pub flags: TransientFlags,
    pub attachment_rejection: Option<AttachmentError>,
    /// Submissions sent but not yet answered. Informational only.
    pub pending_submissions: u32,
    generation: u64,
}

impl FormState {
    pub fn new(mode: Mode) -> Self {
        Self {
            mode,
            ..Self::default()
        }
    }

    pub fn schema(&self) -> Schema {
        Schema::for_mode(self.mode)
    }

    /// Error for `field`, but only once the user has interacted with it.
    pub fn visible_error(&self, field: FieldName) -> Option<&'static str> {
        if self.touched.contains(&field) {
            self.errors.get(field)
        } else {
            None
        }
    }

    /// Changes mode and drops everything entered under the previous one.
    /// Returns `false` when `target` is already active.
    pub fn switch_mode(&mut self, target: Mode) -> bool {
        if self.mode == target {
            return false;
        }
        self.mode = target;
        self.reset();
        true
    }

    /// Bumped by every reset. Requests carry the generation they were issued
    /// under, and answers from an older one leave the form alone.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Clears values, errors, touched fields, the attachment and the team
    /// search. Mode and notices are kept.
    pub fn reset(&mut self) {
        self.generation += 1;
        self.values = FieldValues::default();
        self.errors = ValidationErrors::default();
        self.touched.clear();
        self.search.reset();
        self.attachment_rejection = None;
    }

    pub(crate) fn revalidate(&mut self) {
        self.errors = validate(&self.values, self.mode);
    }
}
