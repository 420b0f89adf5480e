// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 U.S. Federal Government (in countries where recognized)

//! Certificate-aware self-registration.
//!
//! # Overview
//!
//! - [`RegistrationReconciler`]: checks a certificate identity against the
//!   user store and applies the resulting attribute and required-action
//!   changes
//! - [`RegistrationFlow`]: runs the form actions over a submitted form
//! - [`RegistrationValidation`]: profile fields, username rules, e-mail
//!   uniqueness and certificate conflicts
//! - [`RegistrationX509Password`]: password step, optional with a certificate
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use usg_x509_registration::config::RealmSettings;
//! use usg_x509_registration::pki::CertificateChain;
//! use usg_x509_registration::realm::Realm;
//! use usg_x509_registration::registration::{FormContext, RegistrationFlow, RegistrationForm, RegistrationOutcome};
//! use usg_x509_registration::store::{AuthenticationSession, InMemoryUserStore};
//!
//! # fn example(chain: CertificateChain, fields: Vec<(String, String)>) -> usg_x509_registration::Result<()> {
//! let realm = Realm::new(RealmSettings::default(), Arc::new(InMemoryUserStore::new()))?;
//! let session = AuthenticationSession::new("session-1");
//! let form = RegistrationForm::from_pairs(fields);
//! let ctx = FormContext::new(&realm, &session, &chain, &form);
//!
//! match RegistrationFlow::standard().register(&ctx)? {
//!     RegistrationOutcome::Registered(user) => println!("created {}", user.username),
//!     RegistrationOutcome::Rejected(failure) => println!("{} errors", failure.errors.len()),
//! }
//! # Ok(())
//! # }
//! ```

pub mod flow;
pub mod form;
pub mod password;
mod reconciler;
mod validation;
mod x509_password;

pub use flow::{
    EventError, FormAction, FormContext, PageAttributes, RegistrationFlow, RegistrationOutcome,
    ValidationFailure,
};
pub use form::{is_email_valid, is_username_valid, validate_username, FormMessage, RegistrationForm};
pub use password::{BasicPasswordPolicy, PasswordPolicy, PolicyError};
pub use reconciler::{IdentityCheck, RegistrationReconciler, Resolution};
pub use validation::{secondary_user_id, RegistrationValidation, CAC_IDENTITY_ATTRIBUTE};
pub use x509_password::{RegistrationX509Password, PASSWORD_REQUIRED_ATTRIBUTE};
