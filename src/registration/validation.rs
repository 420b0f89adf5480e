// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 U.S. Federal Government (in countries where recognized)

//! Identity-aware registration form validation.

use chrono::{DateTime, Local, TimeZone};

use crate::error::Result;
use crate::store::UserAccount;

use super::flow::{EventError, FormAction, FormContext, PageAttributes, ValidationFailure};
use super::form::{
    is_email_valid, validate_username, FormMessage, EMAIL_EXISTS, FIELD_AFFILIATION, FIELD_EMAIL,
    FIELD_FIRST_NAME, FIELD_LAST_NAME, FIELD_ORGANIZATION, FIELD_RANK, FIELD_USERNAME,
    IDENTITY_ALREADY_REGISTERED, INTERNAL_SERVER_ERROR, INVALID_EMAIL, MISSING_AFFILIATION,
    MISSING_FIRST_NAME, MISSING_LAST_NAME, MISSING_ORGANIZATION, MISSING_RANK, MISSING_USERNAME,
};
use super::reconciler::{IdentityCheck, RegistrationReconciler};

/// Page attribute carrying the resolved certificate identity.
pub const CAC_IDENTITY_ATTRIBUTE: &str = "cacIdentity";

/// Validates profile fields and the certificate identity, and binds the
/// identity on success.
#[derive(Debug, Clone, Copy, Default)]
pub struct RegistrationValidation;

impl RegistrationValidation {
    /// Provider identifier.
    pub const PROVIDER_ID: &'static str = "registration-validation-action";
}

impl FormAction for RegistrationValidation {
    fn id(&self) -> &'static str {
        Self::PROVIDER_ID
    }

    fn display_type(&self) -> &'static str {
        "UDS Registration Validation"
    }

    fn validate(&self, ctx: &FormContext<'_>) -> std::result::Result<(), ValidationFailure> {
        let form = ctx.form();
        let mut echoed = form.clone();
        let mut errors = Vec::new();
        let mut event_error = EventError::InvalidRegistration;

        if form.is_blank(FIELD_USERNAME) {
            errors.push(FormMessage::field(FIELD_USERNAME, MISSING_USERNAME));
        }
        errors.extend(validate_username(form.value(FIELD_USERNAME)));

        let required = [
            (FIELD_FIRST_NAME, MISSING_FIRST_NAME),
            (FIELD_LAST_NAME, MISSING_LAST_NAME),
            (FIELD_AFFILIATION, MISSING_AFFILIATION),
            (FIELD_RANK, MISSING_RANK),
            (FIELD_ORGANIZATION, MISSING_ORGANIZATION),
        ];
        for (field, message) in required {
            if form.is_blank(field) {
                errors.push(FormMessage::field(field, message));
            }
        }

        let reconciler = RegistrationReconciler::new(ctx.realm());
        match reconciler.check_identity(ctx.identity(), ctx.session(), None) {
            Ok(IdentityCheck::AlreadyRegistered { .. }) => {
                errors.push(FormMessage::global(IDENTITY_ALREADY_REGISTERED));
            }
            Ok(_) => {}
            Err(_) => errors.push(FormMessage::global(INTERNAL_SERVER_ERROR)),
        }

        let email = form.value(FIELD_EMAIL).trim();
        if email.is_empty() || !is_email_valid(email) {
            errors.push(FormMessage::field(FIELD_EMAIL, INVALID_EMAIL));
        }

        if !email.is_empty() {
            match ctx.realm().store().get_user_by_email(email) {
                Ok(Some(_)) => {
                    event_error = EventError::EmailInUse;
                    echoed.remove(FIELD_EMAIL);
                    errors.push(FormMessage::field(FIELD_EMAIL, EMAIL_EXISTS));
                }
                Ok(None) => {}
                Err(e) => {
                    tracing::error!(session_id = ctx.session().id(), "E-mail lookup failed: {}", e);
                    errors.push(FormMessage::global(INTERNAL_SERVER_ERROR));
                }
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ValidationFailure {
                event_error,
                errors,
                form: echoed,
            })
        }
    }

    fn success(&self, ctx: &FormContext<'_>, user: &mut UserAccount) -> Result<()> {
        if let Some(attribute) = &ctx.realm().settings().registration.secondary_id_attribute {
            let id = secondary_user_id(&Local::now(), ctx.form().value(FIELD_EMAIL));
            user.set_single_attribute(attribute.as_str(), id);
        }

        // re-checked: the identity may have been bound since validation
        let reconciler = RegistrationReconciler::new(ctx.realm());
        let check = reconciler.check_identity(ctx.identity(), ctx.session(), Some(&user.id))?;
        reconciler.apply(&check, user)?;
        Ok(())
    }

    fn build_page(&self, ctx: &FormContext<'_>, page: &mut PageAttributes) {
        if let Some(identity) = ctx.identity() {
            page.insert(CAC_IDENTITY_ATTRIBUTE.to_string(), identity.to_string());
        }
    }
}

/// Opaque secondary user identifier for downstream chat accounts.
///
/// The timestamp rendered as two-digit year, day of year, hour, minute,
/// second and millisecond (all but the year unpadded), followed by the sum
/// of the e-mail's ASCII bytes with non-ASCII characters counted as `?`.
pub fn secondary_user_id<Tz>(now: &DateTime<Tz>, email: &str) -> String
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    let email_total: u64 = email
        .chars()
        .map(|c| if c.is_ascii() { u64::from(c as u8) } else { u64::from(b'?') })
        .sum();

    format!(
        "{}{}{}",
        now.format("%y%-j%-H%-M%-S"),
        now.timestamp_subsec_millis(),
        email_total
    )
}
