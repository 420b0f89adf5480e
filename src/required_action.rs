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

//! One-time "confirm X.509 identity" required action.
//!
//! Users who already have an account and log in with a certificate whose
//! identity is not bound anywhere are asked once per session whether to bind
//! it. Declining sets the `IGNORE_X509` session note so the prompt is not
//! repeated in that session.

use crate::error::{IdentityError, Result};
use crate::pki::CertificateChain;
use crate::realm::Realm;
use crate::registration::form::FIELD_CANCEL;
use crate::registration::{IdentityCheck, RegistrationForm, RegistrationReconciler};
use crate::store::{AuthenticationSession, RequiredAction, UserAccount};

/// Session note suppressing the prompt for the rest of the session.
pub const IGNORE_X509_NOTE: &str = "IGNORE_X509";

/// Everything a required action sees for one login.
#[derive(Debug)]
pub struct RequiredActionContext<'a> {
    /// Realm.
    pub realm: &'a Realm,
    /// Authentication session.
    pub session: &'a mut AuthenticationSession,
    /// Client certificate chain.
    pub chain: &'a CertificateChain,
    /// Authenticated account.
    pub user: &'a mut UserAccount,
}

/// Data rendered on the confirmation page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct X509ConfirmPage {
    /// Account username.
    pub username: String,
    /// Identity that would be bound.
    pub subject_dn: Option<String>,
    /// Whether the account is enabled.
    pub is_user_enabled: bool,
}

/// A pending step run after authentication.
pub trait RequiredActionProvider: Send + Sync {
    /// Provider identifier, also the required action name.
    fn id(&self) -> &'static str;

    /// Text shown to administrators.
    fn display_text(&self) -> &'static str;

    /// Whether the action is removed once completed.
    fn is_one_time(&self) -> bool;

    /// Decide whether the action applies to this login.
    fn evaluate_triggers(&self, ctx: &mut RequiredActionContext<'_>) -> Result<()>;

    /// Build the prompt.
    fn challenge(&self, ctx: &RequiredActionContext<'_>) -> X509ConfirmPage;

    /// Handle the submitted prompt.
    fn process_action(
        &self,
        ctx: &mut RequiredActionContext<'_>,
        form: &RegistrationForm,
    ) -> Result<()>;
}

/// Binds the presented certificate identity to an existing account.
#[derive(Debug, Clone, Copy, Default)]
pub struct UpdateX509;

impl UpdateX509 {
    /// Provider identifier.
    pub const PROVIDER_ID: &'static str = "UPDATE_X509";
}

impl RequiredActionProvider for UpdateX509 {
    fn id(&self) -> &'static str {
        Self::PROVIDER_ID
    }

    fn display_text(&self) -> &'static str {
        "Update X509"
    }

    fn is_one_time(&self) -> bool {
        true
    }

    fn evaluate_triggers(&self, ctx: &mut RequiredActionContext<'_>) -> Result<()> {
        if ctx.session.note(IGNORE_X509_NOTE) == Some("true") {
            return Ok(());
        }

        let Some(identity) = ctx.realm.resolve_identity(ctx.chain, ctx.session) else {
            return Ok(());
        };

        let unbound = ctx.realm.identity_holders(&identity)?.is_empty();

        let active_attribute = &ctx.realm.settings().x509.active_identity_attribute;
        ctx.user
            .set_single_attribute(active_attribute.as_str(), identity.as_str());

        if unbound {
            tracing::info!(
                session_id = ctx.session.id(),
                user_id = %ctx.user.id,
                "Certificate identity not bound, requesting confirmation"
            );
            ctx.user.add_required_action(RequiredAction::UpdateX509);
        }

        ctx.realm.store().save_user(ctx.user)
    }

    fn challenge(&self, ctx: &RequiredActionContext<'_>) -> X509ConfirmPage {
        X509ConfirmPage {
            username: ctx.user.username.clone(),
            subject_dn: ctx
                .realm
                .resolve_identity(ctx.chain, ctx.session)
                .map(|identity| identity.into_inner()),
            is_user_enabled: true,
        }
    }

    fn process_action(
        &self,
        ctx: &mut RequiredActionContext<'_>,
        form: &RegistrationForm,
    ) -> Result<()> {
        if form.contains(FIELD_CANCEL) {
            tracing::info!(session_id = ctx.session.id(), "Certificate binding declined");
            ctx.session.set_note(IGNORE_X509_NOTE, "true");
            ctx.user.remove_required_action(RequiredAction::UpdateX509);
            return ctx.realm.store().save_user(ctx.user);
        }

        let reconciler = RegistrationReconciler::new(ctx.realm);
        let identity = ctx.realm.resolve_identity(ctx.chain, ctx.session);
        match reconciler.check_identity(identity.as_ref(), ctx.session, Some(&ctx.user.id))? {
            IdentityCheck::NoIdentity => {}
            IdentityCheck::Bound(identity) | IdentityCheck::BoundToCurrent(identity) => {
                ctx.user
                    .set_single_attribute(ctx.realm.identity_attribute(), identity.as_str());
                tracing::info!(
                    session_id = ctx.session.id(),
                    user_id = %ctx.user.id,
                    %identity,
                    "Bound certificate identity"
                );
            }
            IdentityCheck::AlreadyRegistered { identity, .. } => {
                return Err(IdentityError::already_registered(identity.into_inner()));
            }
        }

        ctx.user.remove_required_action(RequiredAction::UpdateX509);
        ctx.realm.store().save_user(ctx.user)
    }
}
