// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 U.S. Federal Government (in countries where recognized)
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Error types for X.509 identity resolution and registration.
//!
//! Absence (no certificate, no policy extension, no extraction rule) is not
//! an error anywhere in this crate and is modelled as `None`. The variants
//! below cover malformed input, configuration mistakes, binding conflicts and
//! user store failures.

use thiserror::Error;

/// Result type alias using [`IdentityError`].
pub type Result<T> = std::result::Result<T, IdentityError>;

/// Errors that can occur while resolving or binding a certificate identity.
#[derive(Debug, Error)]
pub enum IdentityError {
    /// Failed to parse an X.509 certificate or one of its extensions.
    #[error("Certificate parsing error: {0}")]
    CertificateParsing(String),

    /// DER encoding/decoding error.
    #[error("DER error: {0}")]
    Der(#[from] der::Error),

    /// Invalid or inconsistent configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// An identity extraction rule could not be built from its configuration.
    #[error("Invalid identity extractor '{alias}': {reason}")]
    InvalidExtractor {
        /// Alias of the offending authenticator configuration.
        alias: String,
        /// Why the rule was rejected.
        reason: String,
    },

    /// The user store could not be reached or returned an error.
    #[error("User store error: {0}")]
    Store(String),

    /// The certificate identity is already bound to a different account.
    #[error("Certificate identity '{identity}' is already registered")]
    AlreadyRegistered {
        /// The resolved identity.
        identity: String,
    },

    /// The user store refused a second binding of the same identity.
    #[error("Identity attribute '{attribute}' value '{value}' is already bound to user {holder}")]
    DuplicateBinding {
        /// Attribute name.
        attribute: String,
        /// Attribute value.
        value: String,
        /// Account currently holding the value.
        holder: String,
    },

    /// A password could not be hashed, or a stored hash is unreadable.
    #[error("Password hashing error: {0}")]
    PasswordHash(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl IdentityError {
    /// Create a certificate parsing error with the given message.
    pub fn certificate_parsing(msg: impl Into<String>) -> Self {
        Self::CertificateParsing(msg.into())
    }

    /// Create a configuration error with the given message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an invalid extractor error.
    pub fn invalid_extractor(alias: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidExtractor {
            alias: alias.into(),
            reason: reason.into(),
        }
    }

    /// Create a user store error with the given message.
    pub fn store(msg: impl Into<String>) -> Self {
        Self::Store(msg.into())
    }

    /// Create a password hashing error with the given message.
    pub fn password_hash(msg: impl Into<String>) -> Self {
        Self::PasswordHash(msg.into())
    }

    /// Create an already-registered conflict error.
    pub fn already_registered(identity: impl Into<String>) -> Self {
        Self::AlreadyRegistered {
            identity: identity.into(),
        }
    }

    /// Create a duplicate binding error.
    pub fn duplicate_binding(
        attribute: impl Into<String>,
        value: impl Into<String>,
        holder: impl Into<String>,
    ) -> Self {
        Self::DuplicateBinding {
            attribute: attribute.into(),
            value: value.into(),
            holder: holder.into(),
        }
    }

    /// Returns true if this error came from the user store.
    pub fn is_store_failure(&self) -> bool {
        matches!(self, Self::Store(_) | Self::DuplicateBinding { .. })
    }

    /// Returns true if this error is a binding conflict.
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            Self::AlreadyRegistered { .. } | Self::DuplicateBinding { .. }
        )
    }
}
