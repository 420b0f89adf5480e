// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 U.S. Federal Government (in countries where recognized)

//! Password step that becomes optional when a certificate identity is present.

use crate::error::Result;
use crate::store::{RequiredAction, UserAccount};

use super::flow::{EventError, FormAction, FormContext, PageAttributes, ValidationFailure};
use super::form::{
    FormMessage, FIELD_PASSWORD, FIELD_PASSWORD_CONFIRM, INVALID_PASSWORD_CONFIRM,
    MISSING_PASSWORD,
};

/// Page attribute set when a password must be chosen.
pub const PASSWORD_REQUIRED_ATTRIBUTE: &str = "passwordRequired";

/// Registration password step.
///
/// Without a certificate identity the password is mandatory. With one, the
/// user may leave both password fields empty; anything entered is still
/// checked.
#[derive(Debug, Clone, Copy, Default)]
pub struct RegistrationX509Password;

impl RegistrationX509Password {
    /// Provider identifier.
    pub const PROVIDER_ID: &'static str = "registration-x509-password-action";

    /// Help text shown in the admin console.
    pub const HELP_TEXT: &'static str =
        "Disables password registration if CAC authentication is possible.";
}

impl FormAction for RegistrationX509Password {
    fn id(&self) -> &'static str {
        Self::PROVIDER_ID
    }

    fn display_type(&self) -> &'static str {
        "UDS X509 Password Validation"
    }

    fn validate(&self, ctx: &FormContext<'_>) -> std::result::Result<(), ValidationFailure> {
        let form = ctx.form();
        let password = form.get(FIELD_PASSWORD);
        let confirm = form.get(FIELD_PASSWORD_CONFIRM);
        let mut errors = Vec::new();

        if ctx.identity().is_none() {
            if form.is_blank(FIELD_PASSWORD) {
                errors.push(FormMessage::field(FIELD_PASSWORD, MISSING_PASSWORD));
            } else if password != confirm {
                errors.push(FormMessage::field(FIELD_PASSWORD_CONFIRM, INVALID_PASSWORD_CONFIRM));
            }
        } else {
            if password.unwrap_or_default().is_empty() && confirm.unwrap_or_default().is_empty() {
                return Ok(());
            }
            if password.unwrap_or_default() != confirm.unwrap_or_default() {
                errors.push(FormMessage::field(FIELD_PASSWORD_CONFIRM, INVALID_PASSWORD_CONFIRM));
            }
        }

        if let Some(password) = password {
            if let Some(err) = ctx
                .realm()
                .password_policy()
                .validate(ctx.policy_username(), password)
            {
                errors.push(FormMessage::field(FIELD_PASSWORD, err.message).with_parameters(err.parameters));
            }
        }

        if errors.is_empty() {
            return Ok(());
        }

        let mut echoed = form.clone();
        echoed.remove(FIELD_PASSWORD);
        echoed.remove(FIELD_PASSWORD_CONFIRM);
        Err(ValidationFailure {
            event_error: EventError::InvalidRegistration,
            errors,
            form: echoed,
        })
    }

    fn success(&self, ctx: &FormContext<'_>, user: &mut UserAccount) -> Result<()> {
        let password = ctx.form().value(FIELD_PASSWORD);
        if ctx.identity().is_none() || !password.is_empty() {
            user.set_password(password)?;
            user.add_required_action(RequiredAction::ConfigureTotp);
        }
        Ok(())
    }

    fn build_page(&self, ctx: &FormContext<'_>, page: &mut PageAttributes) {
        if ctx.identity().is_none() {
            page.insert(PASSWORD_REQUIRED_ATTRIBUTE.to_string(), "true".to_string());
        }
    }
}
