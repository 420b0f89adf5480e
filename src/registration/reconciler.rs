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

//! Reconciles a certificate identity with existing registrations.
//!
//! ```text
//! Start -> IdentityChecked -> { Bound | BoundToCurrent | AlreadyRegistered | NoIdentity } -> Resolved
//! ```
//!
//! The registration-state transitions are:
//!
//! | Check | Identity attribute | VERIFY_EMAIL | CONFIGURE_TOTP |
//! |-------|--------------------|--------------|----------------|
//! | `Bound` / `BoundToCurrent` | set | added | - |
//! | `NoIdentity` | - | added | added |
//! | `AlreadyRegistered` | conflict error | - | - |

use crate::error::{IdentityError, Result};
use crate::identity::ResolvedIdentity;
use crate::pki::CertificateChain;
use crate::realm::Realm;
use crate::store::{AuthenticationSession, RequiredAction, UserAccount, UserId};

/// Outcome of checking a certificate identity against the user store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentityCheck {
    /// No identity could be resolved.
    NoIdentity,
    /// The identity is not bound to any account.
    Bound(ResolvedIdentity),
    /// The identity is already bound to the account being processed.
    BoundToCurrent(ResolvedIdentity),
    /// The identity is bound to other accounts.
    AlreadyRegistered {
        /// The resolved identity.
        identity: ResolvedIdentity,
        /// Accounts holding it, excluding the one being processed.
        holders: Vec<UserId>,
    },
}

impl IdentityCheck {
    /// The resolved identity, if any.
    pub fn identity(&self) -> Option<&ResolvedIdentity> {
        match self {
            Self::NoIdentity => None,
            Self::Bound(identity) | Self::BoundToCurrent(identity) => Some(identity),
            Self::AlreadyRegistered { identity, .. } => Some(identity),
        }
    }

    /// Whether the identity belongs to another account.
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::AlreadyRegistered { .. })
    }
}

/// Changes applied to an account by [`RegistrationReconciler::apply`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    /// Identity bound to the account, if any.
    pub bound_identity: Option<ResolvedIdentity>,
    /// Required actions the account now carries because of the check.
    pub required_actions: Vec<RequiredAction>,
}

impl Resolution {
    /// Whether a second factor must be enrolled.
    pub fn requires_totp(&self) -> bool {
        self.required_actions.contains(&RequiredAction::ConfigureTotp)
    }
}

/// Drives the registration-state transitions for one attempt.
#[derive(Debug, Clone, Copy)]
pub struct RegistrationReconciler<'a> {
    realm: &'a Realm,
}

impl<'a> RegistrationReconciler<'a> {
    /// Create a reconciler for a realm.
    pub fn new(realm: &'a Realm) -> Self {
        Self { realm }
    }

    /// Resolve the chain's identity and check it against the user store.
    ///
    /// `current_user` is the account being processed, if it already exists;
    /// holding the identity itself is not a conflict.
    ///
    /// # Errors
    ///
    /// Returns [`IdentityError::Store`] when the user store lookup fails.
    pub fn check(
        &self,
        chain: &CertificateChain,
        session: &AuthenticationSession,
        current_user: Option<&UserId>,
    ) -> Result<IdentityCheck> {
        let identity = self.realm.resolve_identity(chain, session);
        self.check_identity(identity.as_ref(), session, current_user)
    }

    /// Check an already-resolved identity against the user store.
    ///
    /// The store is queried on every call.
    pub fn check_identity(
        &self,
        identity: Option<&ResolvedIdentity>,
        session: &AuthenticationSession,
        current_user: Option<&UserId>,
    ) -> Result<IdentityCheck> {
        let Some(identity) = identity else {
            return Ok(IdentityCheck::NoIdentity);
        };

        let holders = self.realm.identity_holders(identity).map_err(|e| {
            tracing::error!(session_id = session.id(), "Identity lookup failed: {}", e);
            e
        })?;

        let held_by_current = current_user.is_some_and(|id| holders.contains(id));
        let others: Vec<UserId> = holders
            .into_iter()
            .filter(|holder| Some(holder) != current_user)
            .collect();

        if !others.is_empty() {
            tracing::warn!(
                session_id = session.id(),
                %identity,
                holders = others.len(),
                "Certificate identity already registered"
            );
            return Ok(IdentityCheck::AlreadyRegistered {
                identity: identity.clone(),
                holders: others,
            });
        }

        if held_by_current {
            Ok(IdentityCheck::BoundToCurrent(identity.clone()))
        } else {
            Ok(IdentityCheck::Bound(identity.clone()))
        }
    }

    /// Apply the transitions for a check to an account.
    ///
    /// Applying the same check twice leaves the account unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`IdentityError::AlreadyRegistered`] for a conflicting check.
    pub fn apply(&self, check: &IdentityCheck, user: &mut UserAccount) -> Result<Resolution> {
        match check {
            IdentityCheck::NoIdentity => {
                user.add_required_action(RequiredAction::VerifyEmail);
                user.add_required_action(RequiredAction::ConfigureTotp);
                Ok(Resolution {
                    bound_identity: None,
                    required_actions: vec![RequiredAction::VerifyEmail, RequiredAction::ConfigureTotp],
                })
            }
            IdentityCheck::Bound(identity) | IdentityCheck::BoundToCurrent(identity) => {
                user.set_single_attribute(self.realm.identity_attribute(), identity.as_str());
                user.add_required_action(RequiredAction::VerifyEmail);
                Ok(Resolution {
                    bound_identity: Some(identity.clone()),
                    required_actions: vec![RequiredAction::VerifyEmail],
                })
            }
            IdentityCheck::AlreadyRegistered { identity, .. } => {
                Err(IdentityError::already_registered(identity.as_str()))
            }
        }
    }

    /// Check and apply in one step for an account.
    pub fn reconcile(
        &self,
        chain: &CertificateChain,
        session: &AuthenticationSession,
        user: &mut UserAccount,
    ) -> Result<Resolution> {
        let check = self.check(chain, session, Some(&user.id))?;
        self.apply(&check, user)
    }
}
