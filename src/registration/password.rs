// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 U.S. Federal Government (in countries where recognized)

//! Password policy seam.

use std::fmt;

use crate::config::PasswordSettings;

/// Message key for passwords below the minimum length.
pub const INVALID_PASSWORD_MIN_LENGTH: &str = "invalidPasswordMinLengthMessage";

/// Message key for passwords equal to the username.
pub const INVALID_PASSWORD_NOT_USERNAME: &str = "invalidPasswordNotUsernameMessage";

/// A rejected password, as a message key plus its parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyError {
    /// Message key.
    pub message: String,
    /// Message parameters.
    pub parameters: Vec<String>,
}

impl PolicyError {
    /// Create a policy error.
    pub fn new(message: impl Into<String>, parameters: Vec<String>) -> Self {
        Self {
            message: message.into(),
            parameters,
        }
    }
}

impl fmt::Display for PolicyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.parameters.is_empty() {
            write!(f, "{}", self.message)
        } else {
            write!(f, "{} ({})", self.message, self.parameters.join(", "))
        }
    }
}

/// Realm password policy.
///
/// `username` is the login name the password will belong to (the e-mail
/// address for realms registering by e-mail).
pub trait PasswordPolicy: Send + Sync {
    /// Check a candidate password, returning the first violated rule.
    fn validate(&self, username: &str, password: &str) -> Option<PolicyError>;
}

/// Minimum length and not-equal-to-username rules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BasicPasswordPolicy {
    min_length: usize,
    not_username: bool,
}

impl BasicPasswordPolicy {
    /// Create a policy.
    pub fn new(min_length: usize, not_username: bool) -> Self {
        Self {
            min_length,
            not_username,
        }
    }

    /// Create a policy from the `[password]` settings.
    pub fn from_settings(settings: &PasswordSettings) -> Self {
        Self::new(settings.min_length, settings.not_username)
    }
}

impl PasswordPolicy for BasicPasswordPolicy {
    fn validate(&self, username: &str, password: &str) -> Option<PolicyError> {
        if password.chars().count() < self.min_length {
            return Some(PolicyError::new(
                INVALID_PASSWORD_MIN_LENGTH,
                vec![self.min_length.to_string()],
            ));
        }

        if self.not_username && !username.is_empty() && password.eq_ignore_ascii_case(username) {
            return Some(PolicyError::new(INVALID_PASSWORD_NOT_USERNAME, Vec::new()));
        }

        None
    }
}
