// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 U.S. Federal Government (in countries where recognized)

//! Realm configuration structures.
//!
//! ```toml
//! [x509]
//! max_policies_to_check = 10
//! identity_attribute = "usercertificate"
//! active_identity_attribute = "activecac"
//! additional_accepted_policies = []
//!
//! [registration]
//! email_as_username = false
//! secondary_id_attribute = "mattermostid"
//!
//! [password]
//! min_length = 15
//! not_username = true
//!
//! [logging]
//! level = "info"
//! json_format = false
//!
//! [[authenticator]]
//! alias = "x509-cac"
//! [authenticator.config]
//! "x509-cert-auth.mapper-selection.user-attribute-name" = "usercertificate"
//! "x509-cert-auth.mapping-source-selection" = "Match SubjectDN using regular expression"
//! "x509-cert-auth.regular-expression" = "CN=(.*?)(?:,|$)"
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;
use std::sync::Arc;

use const_oid::ObjectIdentifier;

use crate::error::{IdentityError, Result};
use crate::identity::{IdentityExtractor, X509IdentityResolver, DEFAULT_MAX_POLICIES_TO_CHECK};
use crate::logging::LogConfig;
use crate::pki::PolicyCatalog;

/// Default account attribute holding the bound certificate identity.
pub const DEFAULT_IDENTITY_ATTRIBUTE: &str = "usercertificate";

/// Default account attribute holding the identity seen in the current session.
pub const DEFAULT_ACTIVE_IDENTITY_ATTRIBUTE: &str = "activecac";

/// Default account attribute holding the opaque secondary user identifier.
pub const DEFAULT_SECONDARY_ID_ATTRIBUTE: &str = "mattermostid";

/// Complete realm configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RealmSettings {
    /// Certificate identity settings.
    #[serde(default)]
    pub x509: X509Settings,

    /// Registration form settings.
    #[serde(default)]
    pub registration: RegistrationSettings,

    /// Built-in password policy settings.
    #[serde(default)]
    pub password: PasswordSettings,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LogConfig,

    /// X.509 authenticator configurations, in realm order.
    #[serde(default, rename = "authenticator")]
    pub authenticators: Vec<AuthenticatorConfig>,
}

impl RealmSettings {
    /// Parse configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is invalid or contains unknown fields.
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        toml::from_str(toml_str).map_err(|e| IdentityError::config(format!("Invalid TOML: {e}")))
    }

    /// Serialize configuration to a TOML string.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| IdentityError::config(format!("TOML serialize: {e}")))
    }

    /// Validate the configuration for completeness and consistency.
    ///
    /// # Errors
    ///
    /// Returns an error listing every problem found.
    pub fn validate(&self) -> Result<()> {
        let mut errors = Vec::new();

        if self.x509.max_policies_to_check == 0 {
            errors.push("x509.max_policies_to_check must be at least 1".to_string());
        }
        if self.x509.identity_attribute.trim().is_empty() {
            errors.push("x509.identity_attribute is required".to_string());
        }
        if self.x509.active_identity_attribute.trim().is_empty() {
            errors.push("x509.active_identity_attribute is required".to_string());
        }
        for oid in &self.x509.additional_accepted_policies {
            if ObjectIdentifier::from_str(oid).is_err() {
                errors.push(format!("x509.additional_accepted_policies: invalid OID '{oid}'"));
            }
        }

        if let Some(ref attr) = self.registration.secondary_id_attribute {
            if attr.trim().is_empty() {
                errors.push("registration.secondary_id_attribute must not be empty".to_string());
            }
        }

        for authenticator in &self.authenticators {
            if authenticator.alias.trim().is_empty() {
                errors.push("authenticator alias is required".to_string());
            }
            if authenticator.is_custom_attribute_mapper() {
                if let Err(e) = IdentityExtractor::from_config(authenticator) {
                    errors.push(e.to_string());
                }
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(IdentityError::config(errors.join("; ")))
        }
    }

    /// Accepted policy catalog for this realm.
    ///
    /// The shared standard catalog is returned unless additional policies are
    /// configured.
    pub fn policy_catalog(&self) -> Result<Arc<PolicyCatalog>> {
        if self.x509.additional_accepted_policies.is_empty() {
            return Ok(PolicyCatalog::standard());
        }

        let extra = self
            .x509
            .additional_accepted_policies
            .iter()
            .map(|oid| {
                ObjectIdentifier::from_str(oid)
                    .map_err(|e| IdentityError::config(format!("invalid OID '{oid}': {e}")))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Arc::new(PolicyCatalog::with_additional(extra)))
    }

    /// Identity resolver configured for this realm.
    pub fn resolver(&self) -> Result<X509IdentityResolver> {
        Ok(X509IdentityResolver::new(self.policy_catalog()?)
            .with_max_policies(self.x509.max_policies_to_check))
    }
}

/// Certificate identity settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct X509Settings {
    /// Maximum number of policy entries inspected on the leaf certificate.
    #[serde(default = "default_max_policies")]
    pub max_policies_to_check: usize,

    /// Account attribute holding the bound certificate identity.
    #[serde(default = "default_identity_attribute")]
    pub identity_attribute: String,

    /// Account attribute holding the identity seen in the current session.
    #[serde(default = "default_active_identity_attribute")]
    pub active_identity_attribute: String,

    /// Deployment-specific policy OIDs accepted in addition to the catalog.
    #[serde(default)]
    pub additional_accepted_policies: Vec<String>,
}

impl Default for X509Settings {
    fn default() -> Self {
        Self {
            max_policies_to_check: default_max_policies(),
            identity_attribute: default_identity_attribute(),
            active_identity_attribute: default_active_identity_attribute(),
            additional_accepted_policies: Vec::new(),
        }
    }
}

/// Registration form settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegistrationSettings {
    /// Use the e-mail address as the username.
    #[serde(default)]
    pub email_as_username: bool,

    /// Attribute receiving the opaque secondary user identifier
    /// (`None` disables it).
    #[serde(default = "default_secondary_id_attribute")]
    pub secondary_id_attribute: Option<String>,
}

impl Default for RegistrationSettings {
    fn default() -> Self {
        Self {
            email_as_username: false,
            secondary_id_attribute: default_secondary_id_attribute(),
        }
    }
}

/// Built-in password policy settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PasswordSettings {
    /// Minimum password length in characters.
    #[serde(default = "default_password_min_length")]
    pub min_length: usize,

    /// Reject passwords equal to the username.
    #[serde(default = "default_true")]
    pub not_username: bool,
}

impl Default for PasswordSettings {
    fn default() -> Self {
        Self {
            min_length: default_password_min_length(),
            not_username: true,
        }
    }
}

/// One authenticator configuration entry of the realm.
///
/// Keys and values are kept as the hosting identity provider stores them;
/// see [`IdentityExtractor`] for the keys that matter here.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AuthenticatorConfig {
    /// Configuration alias.
    pub alias: String,

    /// Raw configuration entries.
    #[serde(default)]
    pub config: BTreeMap<String, String>,
}

impl AuthenticatorConfig {
    /// Create an empty configuration with the given alias.
    pub fn new(alias: impl Into<String>) -> Self {
        Self {
            alias: alias.into(),
            config: BTreeMap::new(),
        }
    }

    /// Add a configuration entry.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.config.insert(key.into(), value.into());
        self
    }

    /// Get a configuration value.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.config.get(key).map(String::as_str)
    }

    /// Whether the entry names a custom identity attribute.
    pub fn is_custom_attribute_mapper(&self) -> bool {
        self.config
            .contains_key(crate::identity::extractor::CUSTOM_ATTRIBUTE_NAME)
    }
}

fn default_max_policies() -> usize {
    DEFAULT_MAX_POLICIES_TO_CHECK
}

fn default_identity_attribute() -> String {
    DEFAULT_IDENTITY_ATTRIBUTE.to_string()
}

fn default_active_identity_attribute() -> String {
    DEFAULT_ACTIVE_IDENTITY_ATTRIBUTE.to_string()
}

fn default_secondary_id_attribute() -> Option<String> {
    Some(DEFAULT_SECONDARY_ID_ATTRIBUTE.to_string())
}

fn default_password_min_length() -> usize {
    15
}

fn default_true() -> bool {
    true
}
