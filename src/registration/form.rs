// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 U.S. Federal Government (in countries where recognized)

//! Registration form fields and field-level validation.

use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use regex::Regex;

/// Username field.
pub const FIELD_USERNAME: &str = "username";
/// E-mail field.
pub const FIELD_EMAIL: &str = "email";
/// Given name field.
pub const FIELD_FIRST_NAME: &str = "firstName";
/// Family name field.
pub const FIELD_LAST_NAME: &str = "lastName";
/// Affiliation attribute field.
pub const FIELD_AFFILIATION: &str = "user.attributes.affiliation";
/// Rank attribute field.
pub const FIELD_RANK: &str = "user.attributes.rank";
/// Organization attribute field.
pub const FIELD_ORGANIZATION: &str = "user.attributes.organization";
/// Password field.
pub const FIELD_PASSWORD: &str = "password";
/// Password confirmation field.
pub const FIELD_PASSWORD_CONFIRM: &str = "password-confirm";
/// Present when the user declined a prompt.
pub const FIELD_CANCEL: &str = "cancel";

/// Prefix of form fields that map onto account attributes.
pub const ATTRIBUTE_FIELD_PREFIX: &str = "user.attributes.";

/// Minimum username length.
pub const MIN_USERNAME_LENGTH: usize = 3;
/// Maximum username length.
pub const MAX_USERNAME_LENGTH: usize = 22;

/// Username missing.
pub const MISSING_USERNAME: &str = "missingUsernameMessage";
/// Given name missing.
pub const MISSING_FIRST_NAME: &str = "missingFirstNameMessage";
/// Family name missing.
pub const MISSING_LAST_NAME: &str = "missingLastNameMessage";
/// Password missing.
pub const MISSING_PASSWORD: &str = "missingPasswordMessage";
/// Password confirmation does not match.
pub const INVALID_PASSWORD_CONFIRM: &str = "invalidPasswordConfirmMessage";
/// E-mail address already registered.
pub const EMAIL_EXISTS: &str = "emailExistsMessage";
/// User store unavailable.
pub const INTERNAL_SERVER_ERROR: &str = "internalServerError";

/// Username contains a disallowed character.
pub const USERNAME_CHARSET: &str =
    "Username can only contain alphanumeric, underscore, hyphen and period characters.";
/// Username does not start with a letter.
pub const USERNAME_FIRST_CHARACTER: &str = "Username must begin with a letter.";
/// Username too short or too long.
pub const USERNAME_LENGTH: &str = "Username must be between 3 to 22 characters.";
/// Affiliation missing.
pub const MISSING_AFFILIATION: &str = "Please specify your organization affiliation.";
/// Rank missing.
pub const MISSING_RANK: &str = "Please specify your rank or choose n/a.";
/// Organization missing.
pub const MISSING_ORGANIZATION: &str = "Please specify your organization.";
/// E-mail address blank or malformed.
pub const INVALID_EMAIL: &str = "Please check your email address, it seems to be invalid";
/// Certificate identity bound to another account.
pub const IDENTITY_ALREADY_REGISTERED: &str = "Sorry, this CAC seems to already be registered.";

static USERNAME_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9_.\-]+$").unwrap_or_else(|e| panic!("username pattern: {e}"))
});

static EMAIL_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r"^[a-zA-Z0-9!#$%&'*+/=?^_`{|}~-]+(?:\.[a-zA-Z0-9!#$%&'*+/=?^_`{|}~-]+)*",
        r"@(?:[a-zA-Z0-9](?:[a-zA-Z0-9-]*[a-zA-Z0-9])?\.)*",
        r"[a-zA-Z0-9](?:[a-zA-Z0-9-]*[a-zA-Z0-9])?$",
    ))
    .unwrap_or_else(|e| panic!("email pattern: {e}"))
});

/// Submitted form fields.
///
/// Only the first value of a repeated field is kept.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistrationForm {
    fields: BTreeMap<String, String>,
}

impl RegistrationForm {
    /// Create an empty form.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a form from decoded `(name, value)` pairs.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut fields = BTreeMap::new();
        for (name, value) in pairs {
            fields.entry(name.into()).or_insert_with(|| value.into());
        }
        Self { fields }
    }

    /// Field value, if submitted.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    /// Field value, empty if not submitted.
    pub fn value(&self, name: &str) -> &str {
        self.get(name).unwrap_or_default()
    }

    /// Whether a field was submitted.
    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    /// Set a field.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.fields.insert(name.into(), value.into());
    }

    /// Remove a field.
    pub fn remove(&mut self, name: &str) -> Option<String> {
        self.fields.remove(name)
    }

    /// Iterate over `(name, value)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Whether a field is missing or blank.
    pub fn is_blank(&self, name: &str) -> bool {
        is_blank(self.get(name))
    }
}

/// A validation message shown on the registration page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormMessage {
    /// Field the message belongs to (`None` for page-level messages).
    pub field: Option<String>,
    /// Message text or message key.
    pub message: String,
    /// Message parameters.
    pub parameters: Vec<String>,
}

impl FormMessage {
    /// Message attached to a field.
    pub fn field(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: Some(field.into()),
            message: message.into(),
            parameters: Vec::new(),
        }
    }

    /// Page-level message.
    pub fn global(message: impl Into<String>) -> Self {
        Self {
            field: None,
            message: message.into(),
            parameters: Vec::new(),
        }
    }

    /// Attach message parameters.
    pub fn with_parameters(mut self, parameters: Vec<String>) -> Self {
        self.parameters = parameters;
        self
    }
}

/// Whether a value is missing or whitespace only.
pub fn is_blank(value: Option<&str>) -> bool {
    value.map_or(true, |v| v.trim().is_empty())
}

/// Whether an e-mail address is syntactically valid.
pub fn is_email_valid(email: &str) -> bool {
    EMAIL_PATTERN.is_match(email)
}

/// Username rules for downstream chat accounts.
///
/// Each violated rule produces its own message. Blank usernames are
/// reported separately and yield no messages here.
pub fn validate_username(username: &str) -> Vec<FormMessage> {
    let mut errors = Vec::new();
    if username.trim().is_empty() {
        return errors;
    }

    if !USERNAME_PATTERN.is_match(username) {
        errors.push(FormMessage::field(FIELD_USERNAME, USERNAME_CHARSET));
    }

    if !username.chars().next().is_some_and(char::is_alphabetic) {
        errors.push(FormMessage::field(FIELD_USERNAME, USERNAME_FIRST_CHARACTER));
    }

    let length = username.chars().count();
    if !(MIN_USERNAME_LENGTH..=MAX_USERNAME_LENGTH).contains(&length) {
        errors.push(FormMessage::field(FIELD_USERNAME, USERNAME_LENGTH));
    }

    errors
}

/// Whether a username satisfies every rule of [`validate_username`].
pub fn is_username_valid(username: &str) -> bool {
    !username.trim().is_empty() && validate_username(username).is_empty()
}
