use std::sync::LazyLock;

use regex::Regex;

use crate::form::{FieldName, FieldValues, Mode, ValidationErrors};

pub const REQUIRED: &str = "required";
pub const INVALID_EMAIL: &str = "invalid email";

static EMAIL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9.!#$%&'*+/=?^_`{|}~-]+@[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?)+$")
        .expect("email pattern must compile")
});

const LOGIN_FIELDS: &[FieldName] = &[FieldName::Email, FieldName::Password];

const REGISTER_FIELDS: &[FieldName] = &[
    FieldName::Username,
    FieldName::FavoriteTeam,
    FieldName::Email,
    FieldName::Password,
    FieldName::Location,
    FieldName::Occupation,
    FieldName::Picture,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    Required,
    Email,
}

impl Rule {
    pub fn check(self, value: &str) -> Result<(), &'static str> {
        match self {
            Rule::Required if value.is_empty() => Err(REQUIRED),
            Rule::Email if !value.is_empty() && !EMAIL_PATTERN.is_match(value) => {
                Err(INVALID_EMAIL)
            }
            _ => Ok(()),
        }
    }
}

/// Validation schema in force for a mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Schema {
    Login,
    Register,
}

impl Schema {
    pub fn for_mode(mode: Mode) -> Self {
        match mode {
            Mode::Login => Schema::Login,
            Mode::Register => Schema::Register,
        }
    }

    /// Fields rendered and required under this schema, in display order.
    pub fn fields(self) -> &'static [FieldName] {
        match self {
            Schema::Login => LOGIN_FIELDS,
            Schema::Register => REGISTER_FIELDS,
        }
    }

    pub fn contains(self, field: FieldName) -> bool {
        self.fields().contains(&field)
    }

    pub fn rules(self, field: FieldName) -> &'static [Rule] {
        if !self.contains(field) {
            return &[];
        }
        match field {
            FieldName::Email => &[Rule::Required, Rule::Email],
            _ => &[Rule::Required],
        }
    }

    /// First failing rule for `field`.
    pub fn check_field(self, field: FieldName, value: &str) -> Result<(), &'static str> {
        self.rules(field)
            .iter()
            .try_for_each(|rule| rule.check(value))
    }
}

/// Validates `values` against the schema of `mode`. An empty result means the
/// form may be submitted. Password strength is not checked.
pub fn validate(values: &FieldValues, mode: Mode) -> ValidationErrors {
    let schema = Schema::for_mode(mode);
    let mut errors = ValidationErrors::default();
    for &field in schema.fields() {
        if let Err(message) = schema.check_field(field, values.text(field)) {
            errors.insert(field, message);
        }
    }
    errors
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attachment::{accept, DroppedFile};

    fn complete_registration() -> FieldValues {
        let mut values = FieldValues::new();
        values.set(FieldName::Username, "gunner");
        values.set(FieldName::FavoriteTeam, "Arsenal");
        values.set(FieldName::Email, "gunner@example.com");
        values.set(FieldName::Password, "x");
        values.set(FieldName::Location, "London");
        values.set(FieldName::Occupation, "Analyst");
        let picture = accept(vec![DroppedFile::new("me.png", b"png".to_vec())]).expect("accept");
        values.set_picture(picture);
        values
    }

    #[test]
    fn empty_login_requires_email_and_password() {
        let errors = validate(&FieldValues::new(), Mode::Login);
        assert_eq!(errors.len(), 2);
        assert_eq!(errors.get(FieldName::Email), Some(REQUIRED));
        assert_eq!(errors.get(FieldName::Password), Some(REQUIRED));
    }

    #[test]
    fn login_rejects_malformed_email_but_not_short_password() {
        let mut values = FieldValues::new();
        values.set(FieldName::Email, "not-an-email");
        values.set(FieldName::Password, "1");
        let errors = validate(&values, Mode::Login);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors.get(FieldName::Email), Some(INVALID_EMAIL));
    }

    #[test]
    fn login_ignores_register_only_fields() {
        let mut values = FieldValues::new();
        values.set(FieldName::Email, "a@b.io");
        values.set(FieldName::Password, "pw");
        assert!(validate(&values, Mode::Login).is_empty());
    }

    #[test]
    fn complete_registration_is_valid() {
        assert!(validate(&complete_registration(), Mode::Register).is_empty());
    }

    #[test]
    fn registration_missing_only_occupation_reports_one_error() {
        let mut values = complete_registration();
        values.clear_field(FieldName::Occupation);
        let errors = validate(&values, Mode::Register);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors.fields().collect::<Vec<_>>(), vec![FieldName::Occupation]);
        assert_eq!(errors.get(FieldName::Occupation), Some(REQUIRED));
    }

    #[test]
    fn registration_requires_picture_and_team() {
        let mut values = complete_registration();
        values.clear_field(FieldName::Picture);
        values.clear_field(FieldName::FavoriteTeam);
        let errors = validate(&values, Mode::Register);
        assert_eq!(
            errors.fields().collect::<Vec<_>>(),
            vec![FieldName::FavoriteTeam, FieldName::Picture]
        );
    }

    #[test]
    fn empty_email_reports_required_not_invalid() {
        let schema = Schema::Register;
        assert_eq!(schema.check_field(FieldName::Email, ""), Err(REQUIRED));
        assert_eq!(schema.check_field(FieldName::Email, "a@b"), Err(INVALID_EMAIL));
        assert_eq!(schema.check_field(FieldName::Email, "a.b+c@d-e.org"), Ok(()));
    }
}
