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

//! Registration form flow.
//!
//! A flow runs a list of [`FormAction`]s over one submitted form. Every
//! action validates; their messages are merged so the user sees all
//! problems at once. Only when no action rejects the form is the account
//! created and each action's `success` applied to it.

use std::collections::BTreeMap;
use std::fmt;

use crate::error::Result;
use crate::identity::ResolvedIdentity;
use crate::pki::CertificateChain;
use crate::realm::Realm;
use crate::store::{AuthenticationSession, UserAccount};

use super::form::{
    FormMessage, RegistrationForm, ATTRIBUTE_FIELD_PREFIX, FIELD_EMAIL, FIELD_FIRST_NAME,
    FIELD_LAST_NAME, FIELD_USERNAME,
};
use super::validation::RegistrationValidation;
use super::x509_password::RegistrationX509Password;

/// Event category reported for a rejected registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventError {
    /// Generic invalid registration.
    InvalidRegistration,
    /// The e-mail address belongs to another account.
    EmailInUse,
}

impl EventError {
    /// Event error code.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidRegistration => "invalid_registration",
            Self::EmailInUse => "email_in_use",
        }
    }
}

impl fmt::Display for EventError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A rejected form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationFailure {
    /// Event category.
    pub event_error: EventError,
    /// Messages to display.
    pub errors: Vec<FormMessage>,
    /// Form values to echo back, with sensitive or rejected fields removed.
    pub form: RegistrationForm,
}

impl ValidationFailure {
    /// Messages attached to a field.
    pub fn field_errors<'a>(&'a self, field: &'a str) -> impl Iterator<Item = &'a FormMessage> + 'a {
        self.errors
            .iter()
            .filter(move |m| m.field.as_deref() == Some(field))
    }

    /// Page-level messages.
    pub fn global_errors(&self) -> impl Iterator<Item = &FormMessage> {
        self.errors.iter().filter(|m| m.field.is_none())
    }

    /// Whether any message carries the given text or key.
    pub fn has_message(&self, message: &str) -> bool {
        self.errors.iter().any(|m| m.message == message)
    }
}

/// Attributes exposed to the registration page template.
pub type PageAttributes = BTreeMap<String, String>;

/// Everything a form action sees for one submission.
#[derive(Debug)]
pub struct FormContext<'a> {
    realm: &'a Realm,
    session: &'a AuthenticationSession,
    chain: &'a CertificateChain,
    form: &'a RegistrationForm,
    identity: Option<ResolvedIdentity>,
}

impl<'a> FormContext<'a> {
    /// Create a context, resolving the chain's identity once.
    pub fn new(
        realm: &'a Realm,
        session: &'a AuthenticationSession,
        chain: &'a CertificateChain,
        form: &'a RegistrationForm,
    ) -> Self {
        let identity = realm.resolve_identity(chain, session);
        Self {
            realm,
            session,
            chain,
            form,
            identity,
        }
    }

    /// Realm.
    pub fn realm(&self) -> &'a Realm {
        self.realm
    }

    /// Authentication session.
    pub fn session(&self) -> &'a AuthenticationSession {
        self.session
    }

    /// Client certificate chain.
    pub fn chain(&self) -> &'a CertificateChain {
        self.chain
    }

    /// Submitted form.
    pub fn form(&self) -> &'a RegistrationForm {
        self.form
    }

    /// Resolved certificate identity.
    pub fn identity(&self) -> Option<&ResolvedIdentity> {
        self.identity.as_ref()
    }

    /// Login name a password belongs to.
    pub fn policy_username(&self) -> &'a str {
        if self.realm.settings().registration.email_as_username {
            self.form.value(FIELD_EMAIL)
        } else {
            self.form.value(FIELD_USERNAME)
        }
    }
}

/// One step of the registration form.
pub trait FormAction: Send + Sync {
    /// Provider identifier.
    fn id(&self) -> &'static str;

    /// Name shown in the admin console.
    fn display_type(&self) -> &'static str;

    /// Validate the submitted form.
    fn validate(&self, ctx: &FormContext<'_>) -> std::result::Result<(), ValidationFailure>;

    /// Apply the action to the new account after the form validated.
    fn success(&self, ctx: &FormContext<'_>, user: &mut UserAccount) -> Result<()>;

    /// Add template attributes to the registration page.
    fn build_page(&self, ctx: &FormContext<'_>, page: &mut PageAttributes);
}

/// Outcome of a registration attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum RegistrationOutcome {
    /// The account was created.
    Registered(UserAccount),
    /// The form was rejected.
    Rejected(ValidationFailure),
}

/// Ordered list of form actions.
pub struct RegistrationFlow {
    actions: Vec<Box<dyn FormAction>>,
}

impl RegistrationFlow {
    /// A flow without actions.
    pub fn new() -> Self {
        Self {
            actions: Vec::new(),
        }
    }

    /// The certificate-aware registration flow: identity validation followed
    /// by the password step.
    pub fn standard() -> Self {
        Self::new()
            .with_action(RegistrationValidation)
            .with_action(RegistrationX509Password)
    }

    /// Append an action.
    pub fn with_action(mut self, action: impl FormAction + 'static) -> Self {
        self.actions.push(Box::new(action));
        self
    }

    /// Identifiers of the configured actions, in order.
    pub fn action_ids(&self) -> Vec<&'static str> {
        self.actions.iter().map(|a| a.id()).collect()
    }

    /// Template attributes for the registration page.
    pub fn build_page(&self, ctx: &FormContext<'_>) -> PageAttributes {
        let mut page = PageAttributes::new();
        for action in &self.actions {
            action.build_page(ctx, &mut page);
        }
        page
    }

    /// Validate the form with every action.
    ///
    /// Messages from all actions are merged in action order. The event
    /// category of the first rejecting action is reported, and a field
    /// removed from the echoed form by any action stays removed.
    pub fn validate(&self, ctx: &FormContext<'_>) -> std::result::Result<(), ValidationFailure> {
        let mut merged: Option<ValidationFailure> = None;

        for action in &self.actions {
            let Err(failure) = action.validate(ctx) else {
                continue;
            };
            tracing::debug!(
                session_id = ctx.session().id(),
                action = action.id(),
                errors = failure.errors.len(),
                "Registration form rejected"
            );

            match merged.as_mut() {
                None => merged = Some(failure),
                Some(merged) => {
                    merged.errors.extend(failure.errors);
                    let dropped: Vec<String> = merged
                        .form
                        .iter()
                        .filter(|(name, _)| !failure.form.contains(name))
                        .map(|(name, _)| name.to_string())
                        .collect();
                    for name in dropped {
                        merged.form.remove(&name);
                    }
                }
            }
        }

        match merged {
            Some(failure) => Err(failure),
            None => Ok(()),
        }
    }

    /// Validate the form and, if accepted, create and persist the account.
    ///
    /// # Errors
    ///
    /// A rejected form is an `Ok(Rejected)` outcome. Errors are returned for
    /// failures after validation, such as the identity being bound by a
    /// concurrent registration or the user store refusing the account.
    pub fn register(&self, ctx: &FormContext<'_>) -> Result<RegistrationOutcome> {
        if let Err(failure) = self.validate(ctx) {
            return Ok(RegistrationOutcome::Rejected(failure));
        }

        let mut user = new_account(ctx);
        for action in &self.actions {
            action.success(ctx, &mut user)?;
        }

        ctx.realm().store().save_user(&user)?;
        tracing::info!(
            session_id = ctx.session().id(),
            user_id = %user.id,
            username = %user.username,
            certificate = ctx.identity().is_some(),
            "Registered user"
        );

        Ok(RegistrationOutcome::Registered(user))
    }
}

impl Default for RegistrationFlow {
    fn default() -> Self {
        Self::standard()
    }
}

impl fmt::Debug for RegistrationFlow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegistrationFlow")
            .field("actions", &self.action_ids())
            .finish()
    }
}

/// Account populated from the validated form.
fn new_account(ctx: &FormContext<'_>) -> UserAccount {
    let form = ctx.form();
    let email = form.value(FIELD_EMAIL).trim();
    let username = if ctx.realm().settings().registration.email_as_username {
        email
    } else {
        form.value(FIELD_USERNAME).trim()
    };

    let mut user = UserAccount::new(username);
    user.email = Some(email.to_string()).filter(|e| !e.is_empty());
    user.first_name = form.get(FIELD_FIRST_NAME).map(|v| v.trim().to_string());
    user.last_name = form.get(FIELD_LAST_NAME).map(|v| v.trim().to_string());

    for (name, value) in form.iter() {
        if let Some(attribute) = name.strip_prefix(ATTRIBUTE_FIELD_PREFIX) {
            if !attribute.is_empty() && !value.trim().is_empty() {
                user.set_single_attribute(attribute, value.trim());
            }
        }
    }

    user
}
