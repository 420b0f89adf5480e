// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 U.S. Federal Government (in countries where recognized)

//! User store seam and account model.
//!
//! The hosting identity provider owns users and sessions. This module
//! defines the narrow view the registration logic needs: attribute and
//! e-mail lookups, account persistence, the account shape and the
//! per-login session notes.
//!
//! [`InMemoryUserStore`] implements [`UserStore`] for tests and for the CLI.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::RwLock;

use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use password_hash::rand_core::OsRng;
use password_hash::SaltString;

use crate::error::{IdentityError, Result};

/// Opaque account identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UserId(String);

impl UserId {
    /// Wrap an existing identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generate a fresh random identifier.
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    /// The identifier string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for UserId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// Pending step the user must complete at next login.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RequiredAction {
    /// Verify the e-mail address.
    VerifyEmail,
    /// Enrol a one-time-password authenticator.
    ConfigureTotp,
    /// Confirm binding of the presented certificate identity.
    UpdateX509,
}

impl RequiredAction {
    /// Identifier used by the hosting identity provider.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::VerifyEmail => "VERIFY_EMAIL",
            Self::ConfigureTotp => "CONFIGURE_TOTP",
            Self::UpdateX509 => "UPDATE_X509",
        }
    }
}

impl fmt::Display for RequiredAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RequiredAction {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "VERIFY_EMAIL" => Ok(Self::VerifyEmail),
            "CONFIGURE_TOTP" => Ok(Self::ConfigureTotp),
            "UPDATE_X509" => Ok(Self::UpdateX509),
            _ => Err(format!("unknown required action '{}'", s)),
        }
    }
}

/// Argon2id password hash in PHC string form.
#[derive(Clone, PartialEq, Eq)]
pub struct PasswordCredential {
    phc: String,
}

impl PasswordCredential {
    /// Hash a new password with a random salt.
    pub fn new(password: &str) -> Result<Self> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| IdentityError::password_hash(format!("Failed to hash password: {}", e)))?;
        Ok(Self {
            phc: hash.to_string(),
        })
    }

    /// Restore a credential from a stored PHC string.
    pub fn from_phc(phc: impl Into<String>) -> Result<Self> {
        let phc = phc.into();
        PasswordHash::new(&phc)
            .map_err(|e| IdentityError::password_hash(format!("Invalid stored password hash: {}", e)))?;
        Ok(Self { phc })
    }

    /// The PHC string to persist.
    pub fn as_phc(&self) -> &str {
        &self.phc
    }

    /// Whether `password` matches this credential.
    pub fn matches(&self, password: &str) -> bool {
        match PasswordHash::new(&self.phc) {
            Ok(hash) => Argon2::default()
                .verify_password(password.as_bytes(), &hash)
                .is_ok(),
            Err(e) => {
                tracing::warn!("Unreadable password hash: {}", e);
                false
            }
        }
    }
}

impl fmt::Debug for PasswordCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PasswordCredential")
            .field("hash", &"[REDACTED]")
            .finish()
    }
}

/// A user account as seen by the registration logic.
#[derive(Debug, Clone, PartialEq)]
pub struct UserAccount {
    /// Account identifier.
    pub id: UserId,
    /// Login name.
    pub username: String,
    /// E-mail address.
    pub email: Option<String>,
    /// Given name.
    pub first_name: Option<String>,
    /// Family name.
    pub last_name: Option<String>,
    /// Whether the account may log in.
    pub enabled: bool,
    /// Multi-valued custom attributes.
    pub attributes: BTreeMap<String, Vec<String>>,
    /// Steps pending at next login.
    pub required_actions: BTreeSet<RequiredAction>,
    /// Password credential, if one was set.
    pub password: Option<PasswordCredential>,
}

impl UserAccount {
    /// Create an enabled account with a fresh identifier.
    pub fn new(username: impl Into<String>) -> Self {
        Self::with_id(UserId::generate(), username)
    }

    /// Create an enabled account with the given identifier.
    pub fn with_id(id: UserId, username: impl Into<String>) -> Self {
        Self {
            id,
            username: username.into(),
            email: None,
            first_name: None,
            last_name: None,
            enabled: true,
            attributes: BTreeMap::new(),
            required_actions: BTreeSet::new(),
            password: None,
        }
    }

    /// Set the e-mail address.
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    /// All values of an attribute.
    pub fn attribute(&self, name: &str) -> &[String] {
        self.attributes.get(name).map(Vec::as_slice).unwrap_or_default()
    }

    /// First value of an attribute.
    pub fn first_attribute(&self, name: &str) -> Option<&str> {
        self.attribute(name).first().map(String::as_str)
    }

    /// Replace an attribute with a single value.
    pub fn set_single_attribute(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.attributes.insert(name.into(), vec![value.into()]);
    }

    /// Remove an attribute.
    pub fn remove_attribute(&mut self, name: &str) {
        self.attributes.remove(name);
    }

    /// Add a pending step. Adding one twice has no effect.
    pub fn add_required_action(&mut self, action: RequiredAction) {
        self.required_actions.insert(action);
    }

    /// Remove a pending step.
    pub fn remove_required_action(&mut self, action: RequiredAction) {
        self.required_actions.remove(&action);
    }

    /// Whether a step is pending.
    pub fn has_required_action(&self, action: RequiredAction) -> bool {
        self.required_actions.contains(&action)
    }

    /// Hash and set the password credential.
    pub fn set_password(&mut self, password: &str) -> Result<()> {
        self.password = Some(PasswordCredential::new(password)?);
        Ok(())
    }
}

/// Per-login authentication session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthenticationSession {
    id: String,
    notes: HashMap<String, String>,
}

impl AuthenticationSession {
    /// Create a session with the given identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            notes: HashMap::new(),
        }
    }

    /// Session identifier, used for log correlation.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Get a note.
    pub fn note(&self, key: &str) -> Option<&str> {
        self.notes.get(key).map(String::as_str)
    }

    /// Set a note.
    pub fn set_note(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.notes.insert(key.into(), value.into());
    }

    /// Remove a note.
    pub fn remove_note(&mut self, key: &str) -> Option<String> {
        self.notes.remove(key)
    }
}

/// Lookups and persistence offered by the hosting identity provider.
pub trait UserStore: Send + Sync {
    /// Accounts holding `value` in attribute `name` (exact match).
    fn find_users_by_attribute(&self, name: &str, value: &str) -> Result<Vec<UserId>>;

    /// Account registered with the given e-mail address (case-insensitive).
    fn get_user_by_email(&self, email: &str) -> Result<Option<UserId>>;

    /// Load an account.
    fn get_user(&self, id: &UserId) -> Result<Option<UserAccount>>;

    /// Create or update an account.
    fn save_user(&self, user: &UserAccount) -> Result<()>;
}

/// Thread-safe in-memory [`UserStore`].
///
/// Attributes registered with [`with_unique_attribute`](Self::with_unique_attribute)
/// are enforced on save, so two accounts can never hold the same value even
/// when two registrations race past their lookups.
#[derive(Debug, Default)]
pub struct InMemoryUserStore {
    users: RwLock<BTreeMap<UserId, UserAccount>>,
    unique_attributes: Vec<String>,
    unreachable: AtomicBool,
}

impl InMemoryUserStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enforce uniqueness of an attribute's values across accounts.
    pub fn with_unique_attribute(mut self, name: impl Into<String>) -> Self {
        self.unique_attributes.push(name.into());
        self
    }

    /// Simulate an unreachable store; every call fails while set.
    pub fn set_unreachable(&self, unreachable: bool) {
        self.unreachable.store(unreachable, Ordering::SeqCst);
    }

    /// Number of stored accounts.
    pub fn len(&self) -> usize {
        self.users.read().map(|users| users.len()).unwrap_or(0)
    }

    /// Whether the store holds no accounts.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn check_reachable(&self) -> Result<()> {
        if self.unreachable.load(Ordering::SeqCst) {
            return Err(IdentityError::store("user store unreachable"));
        }
        Ok(())
    }

    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, BTreeMap<UserId, UserAccount>>> {
        self.check_reachable()?;
        self.users
            .read()
            .map_err(|_| IdentityError::store("user store lock poisoned"))
    }
}

impl UserStore for InMemoryUserStore {
    fn find_users_by_attribute(&self, name: &str, value: &str) -> Result<Vec<UserId>> {
        let users = self.read()?;
        Ok(users
            .values()
            .filter(|user| user.attribute(name).iter().any(|v| v == value))
            .map(|user| user.id.clone())
            .collect())
    }

    fn get_user_by_email(&self, email: &str) -> Result<Option<UserId>> {
        let users = self.read()?;
        Ok(users
            .values()
            .find(|user| {
                user.email
                    .as_deref()
                    .is_some_and(|e| e.eq_ignore_ascii_case(email))
            })
            .map(|user| user.id.clone()))
    }

    fn get_user(&self, id: &UserId) -> Result<Option<UserAccount>> {
        Ok(self.read()?.get(id).cloned())
    }

    fn save_user(&self, user: &UserAccount) -> Result<()> {
        self.check_reachable()?;
        let mut users = self
            .users
            .write()
            .map_err(|_| IdentityError::store("user store lock poisoned"))?;

        for attribute in &self.unique_attributes {
            for value in user.attribute(attribute) {
                if let Some(holder) = users
                    .values()
                    .find(|other| other.id != user.id && other.attribute(attribute).contains(value))
                {
                    return Err(IdentityError::duplicate_binding(
                        attribute,
                        value,
                        holder.id.as_str(),
                    ));
                }
            }
        }

        users.insert(user.id.clone(), user.clone());
        Ok(())
    }
}
