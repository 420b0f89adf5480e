// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 U.S. Federal Government (in countries where recognized)

//! Per-realm runtime context shared by the registration flow and the
//! confirm-identity required action.

use std::fmt;
use std::sync::Arc;

use crate::config::RealmSettings;
use crate::error::Result;
use crate::identity::{ResolvedIdentity, X509IdentityResolver};
use crate::pki::CertificateChain;
use crate::registration::password::{BasicPasswordPolicy, PasswordPolicy};
use crate::store::{AuthenticationSession, UserId, UserStore};

/// Realm settings together with the services they configure.
#[derive(Clone)]
pub struct Realm {
    settings: RealmSettings,
    resolver: X509IdentityResolver,
    store: Arc<dyn UserStore>,
    password_policy: Arc<dyn PasswordPolicy>,
}

impl Realm {
    /// Build a realm from its settings and user store.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured policy catalog cannot be built.
    pub fn new(settings: RealmSettings, store: Arc<dyn UserStore>) -> Result<Self> {
        let resolver = settings.resolver()?;
        let password_policy = Arc::new(BasicPasswordPolicy::from_settings(&settings.password));
        Ok(Self {
            settings,
            resolver,
            store,
            password_policy,
        })
    }

    /// Replace the password policy.
    pub fn with_password_policy(mut self, policy: Arc<dyn PasswordPolicy>) -> Self {
        self.password_policy = policy;
        self
    }

    /// Realm settings.
    pub fn settings(&self) -> &RealmSettings {
        &self.settings
    }

    /// Identity resolver.
    pub fn resolver(&self) -> &X509IdentityResolver {
        &self.resolver
    }

    /// User store.
    pub fn store(&self) -> &dyn UserStore {
        self.store.as_ref()
    }

    /// Password policy.
    pub fn password_policy(&self) -> &dyn PasswordPolicy {
        self.password_policy.as_ref()
    }

    /// Account attribute holding the bound certificate identity.
    pub fn identity_attribute(&self) -> &str {
        &self.settings.x509.identity_attribute
    }

    /// Resolve the identity of a client chain with the realm's rules.
    pub fn resolve_identity(
        &self,
        chain: &CertificateChain,
        session: &AuthenticationSession,
    ) -> Option<ResolvedIdentity> {
        self.resolver
            .resolve(chain, &self.settings.authenticators, session.id())
    }

    /// Accounts currently holding an identity. Always queries the store.
    pub fn identity_holders(&self, identity: &ResolvedIdentity) -> Result<Vec<UserId>> {
        self.store
            .find_users_by_attribute(self.identity_attribute(), identity.as_str())
    }
}

impl fmt::Debug for Realm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Realm")
            .field("settings", &self.settings)
            .field("resolver", &self.resolver)
            .finish_non_exhaustive()
    }
}
