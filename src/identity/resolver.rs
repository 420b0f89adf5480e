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

//! Certificate identity resolution.

use std::fmt;
use std::sync::Arc;

use const_oid::ObjectIdentifier;
use x509_cert::Certificate;

use crate::config::AuthenticatorConfig;
use crate::pki::{policy_id, CertificateChain, PolicyCatalog};

use super::extractor::IdentityExtractor;

/// Number of policy slots inspected unless configured otherwise.
pub const DEFAULT_MAX_POLICIES_TO_CHECK: usize = 10;

/// Identity string derived from a client certificate.
///
/// Never empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResolvedIdentity(String);

impl ResolvedIdentity {
    /// Wrap a non-empty identity string.
    pub fn new(value: impl Into<String>) -> Option<Self> {
        let value = value.into();
        if value.is_empty() {
            None
        } else {
            Some(Self(value))
        }
    }

    /// The identity string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume into the identity string.
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for ResolvedIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ResolvedIdentity {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Accepted policy found on a leaf certificate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PolicyMatch {
    /// 0-based position in the certificate policies extension.
    pub slot: usize,
    /// The accepted policy OID.
    pub oid: ObjectIdentifier,
}

/// Decides whether a client chain carries an acceptable identity and derives it.
///
/// Resolution succeeds only when the leaf certificate asserts an accepted
/// policy within the first `max_policies` entries and the realm has an
/// authenticator configured with a custom identity attribute. Every other
/// outcome, including malformed certificates and misconfigured rules, is
/// absence.
///
/// # Example
///
/// ```no_run
/// use usg_x509_registration::identity::X509IdentityResolver;
/// use usg_x509_registration::pki::{CertificateChain, PolicyCatalog};
///
/// # fn example(chain: &CertificateChain) {
/// let resolver = X509IdentityResolver::new(PolicyCatalog::standard());
/// match resolver.resolve(chain, &[], "session-1") {
///     Some(identity) => println!("identity: {}", identity),
///     None => println!("no certificate identity"),
/// }
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct X509IdentityResolver {
    catalog: Arc<PolicyCatalog>,
    max_policies: usize,
}

impl X509IdentityResolver {
    /// Create a resolver over the given catalog.
    pub fn new(catalog: Arc<PolicyCatalog>) -> Self {
        Self {
            catalog,
            max_policies: DEFAULT_MAX_POLICIES_TO_CHECK,
        }
    }

    /// Set how many policy slots are inspected.
    pub fn with_max_policies(mut self, max_policies: usize) -> Self {
        self.max_policies = max_policies;
        self
    }

    /// Number of policy slots inspected.
    pub fn max_policies(&self) -> usize {
        self.max_policies
    }

    /// Accepted policy catalog.
    pub fn catalog(&self) -> &PolicyCatalog {
        &self.catalog
    }

    /// Resolve the identity of a client certificate chain.
    ///
    /// `authenticators` are the realm's authenticator configurations in realm
    /// order; the first one naming a custom identity attribute supplies the
    /// extraction rule.
    pub fn resolve(
        &self,
        chain: &CertificateChain,
        authenticators: &[AuthenticatorConfig],
        session_id: &str,
    ) -> Option<ResolvedIdentity> {
        let Some(leaf) = chain.leaf() else {
            tracing::debug!(session_id, "No client certificate presented");
            return None;
        };

        let policy = self.first_accepted_policy(leaf, session_id)?;
        tracing::debug!(
            session_id,
            slot = policy.slot,
            oid = %policy.oid,
            "Accepted certificate policy"
        );

        let Some(config) = authenticators
            .iter()
            .find(|config| config.is_custom_attribute_mapper())
        else {
            tracing::debug!(session_id, "No identity extraction rule configured");
            return None;
        };

        let extractor = match IdentityExtractor::from_config(config) {
            Ok(extractor) => extractor,
            Err(e) => {
                tracing::warn!(session_id, "Unusable identity extraction rule: {}", e);
                return None;
            }
        };

        let identity = extractor.extract(chain).and_then(ResolvedIdentity::new);
        match &identity {
            Some(identity) => {
                tracing::info!(session_id, alias = extractor.alias(), "Resolved certificate identity");
                tracing::debug!(session_id, %identity, "Certificate identity value")
            }
            None => tracing::debug!(
                session_id,
                alias = extractor.alias(),
                source = %extractor.source(),
                "Extraction rule produced no identity"
            ),
        }
        identity
    }

    /// First accepted policy among the leaf's first `max_policies` entries.
    ///
    /// Inspection stops at the first empty slot. Entries past the inspected
    /// slots are never decoded. A malformed entry reached by the scan aborts
    /// it and counts as no accepted policy.
    pub fn first_accepted_policy(
        &self,
        leaf: &Certificate,
        session_id: &str,
    ) -> Option<PolicyMatch> {
        for slot in 0..self.max_policies {
            let oid = match policy_id(leaf, slot, 0) {
                Ok(Some(oid)) => oid,
                Ok(None) => break,
                Err(e) => {
                    tracing::warn!(session_id, "Certificate policy check failed: {}", e);
                    return None;
                }
            };

            tracing::trace!(session_id, slot, %oid, "Inspecting certificate policy");
            if self.catalog.is_accepted(&oid) {
                return Some(PolicyMatch { slot, oid });
            }
        }

        tracing::debug!(session_id, "No accepted certificate policy");
        None
    }
}

impl Default for X509IdentityResolver {
    fn default() -> Self {
        Self::new(PolicyCatalog::standard())
    }
}
