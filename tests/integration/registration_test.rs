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

//! Integration tests for certificate-aware self-registration

use crate::integration::{
    cac_settings, password_form, profile_form, realm, CacBuilder, DEFAULT_CN,
    DOD_MEDIUM_HARDWARE, GOOD_PASSWORD, UNLISTED_POLICY,
};
use usg_x509_registration::pki::CertificateChain;
use usg_x509_registration::registration::form::{
    EMAIL_EXISTS, FIELD_EMAIL, FIELD_PASSWORD, FIELD_PASSWORD_CONFIRM, IDENTITY_ALREADY_REGISTERED,
    INTERNAL_SERVER_ERROR, INVALID_PASSWORD_CONFIRM, USERNAME_LENGTH,
};
use usg_x509_registration::registration::{
    EventError, FormContext, IdentityCheck, RegistrationFlow, RegistrationOutcome,
    RegistrationReconciler, CAC_IDENTITY_ATTRIBUTE, PASSWORD_REQUIRED_ATTRIBUTE,
};
use usg_x509_registration::store::{AuthenticationSession, RequiredAction, UserAccount, UserStore};
use usg_x509_registration::IdentityError;

fn registered(outcome: RegistrationOutcome) -> UserAccount {
    match outcome {
        RegistrationOutcome::Registered(user) => user,
        RegistrationOutcome::Rejected(failure) => panic!("registration rejected: {:?}", failure.errors),
    }
}

fn bound_account(id: &str, identity: &str) -> UserAccount {
    let mut user = UserAccount::new(id).with_email(format!("{id}@example.mil"));
    user.set_single_attribute("usercertificate", identity);
    user
}

#[test]
fn test_register_without_certificate_requires_totp() {
    let (store, realm) = realm(cac_settings());
    let session = AuthenticationSession::new("s1");
    let chain = CertificateChain::empty();
    let form = password_form("jdoe", "jdoe@example.mil", GOOD_PASSWORD);
    let ctx = FormContext::new(&realm, &session, &chain, &form);

    let user = registered(RegistrationFlow::standard().register(&ctx).unwrap());

    assert_eq!(user.username, "jdoe");
    assert_eq!(user.email.as_deref(), Some("jdoe@example.mil"));
    assert!(user.attribute("usercertificate").is_empty());
    assert!(user.has_required_action(RequiredAction::ConfigureTotp));
    assert!(user.has_required_action(RequiredAction::VerifyEmail));
    assert!(user.password.as_ref().is_some_and(|p| p.matches(GOOD_PASSWORD)));
    assert_eq!(user.first_attribute("affiliation"), Some("US Army"));
    assert!(store.get_user(&user.id).unwrap().is_some());
}

#[test]
fn test_register_with_certificate_binds_identity() {
    let (store, realm) = realm(cac_settings());
    let session = AuthenticationSession::new("s1");
    let chain = CacBuilder::default().policy(DOD_MEDIUM_HARDWARE).chain();
    let form = profile_form("jdoe", "jdoe@example.mil");
    let ctx = FormContext::new(&realm, &session, &chain, &form);

    let user = registered(RegistrationFlow::standard().register(&ctx).unwrap());

    assert_eq!(user.first_attribute("usercertificate"), Some(DEFAULT_CN));
    assert!(user.has_required_action(RequiredAction::VerifyEmail));
    assert!(!user.has_required_action(RequiredAction::ConfigureTotp));
    assert!(user.password.is_none());

    let holders = store
        .find_users_by_attribute("usercertificate", DEFAULT_CN)
        .unwrap();
    assert_eq!(holders, vec![user.id.clone()]);
}

#[test]
fn test_register_with_certificate_and_password() {
    let (_store, realm) = realm(cac_settings());
    let session = AuthenticationSession::new("s1");
    let chain = CacBuilder::default().policy(DOD_MEDIUM_HARDWARE).chain();
    let form = password_form("jdoe", "jdoe@example.mil", GOOD_PASSWORD);
    let ctx = FormContext::new(&realm, &session, &chain, &form);

    let user = registered(RegistrationFlow::standard().register(&ctx).unwrap());

    assert_eq!(user.first_attribute("usercertificate"), Some(DEFAULT_CN));
    assert!(user.password.is_some());
    assert!(user.has_required_action(RequiredAction::ConfigureTotp));
}

#[test]
fn test_certificate_without_accepted_policy_registers_as_password_user() {
    let (_store, realm) = realm(cac_settings());
    let session = AuthenticationSession::new("s1");
    let chain = CacBuilder::default().policy(UNLISTED_POLICY).chain();

    let form = profile_form("jdoe", "jdoe@example.mil");
    let ctx = FormContext::new(&realm, &session, &chain, &form);
    assert!(ctx.identity().is_none());

    let failure = RegistrationFlow::standard().validate(&ctx).unwrap_err();
    assert_eq!(failure.field_errors(FIELD_PASSWORD).count(), 1);
}

#[test]
fn test_identity_already_registered() {
    let (store, realm) = realm(cac_settings());
    let existing = bound_account("alice", DEFAULT_CN);
    store.save_user(&existing).unwrap();

    let session = AuthenticationSession::new("s1");
    let chain = CacBuilder::default().policy(DOD_MEDIUM_HARDWARE).chain();
    let form = profile_form("jdoe", "jdoe@example.mil");
    let ctx = FormContext::new(&realm, &session, &chain, &form);

    let outcome = RegistrationFlow::standard().register(&ctx).unwrap();
    let RegistrationOutcome::Rejected(failure) = outcome else {
        panic!("expected rejection");
    };
    assert_eq!(failure.event_error, EventError::InvalidRegistration);
    assert!(failure
        .global_errors()
        .any(|e| e.message == IDENTITY_ALREADY_REGISTERED));
    assert_eq!(store.len(), 1);

    let check = RegistrationReconciler::new(&realm)
        .check(&chain, &session, None)
        .unwrap();
    assert!(matches!(check, IdentityCheck::AlreadyRegistered { ref holders, .. } if holders == &vec![existing.id.clone()]));
}

#[test]
fn test_errors_accumulate() {
    let (_store, realm) = realm(cac_settings());
    let session = AuthenticationSession::new("s1");
    let chain = CertificateChain::empty();
    let mut form = profile_form("ab", "jdoe@example.mil");
    form.set(FIELD_PASSWORD, GOOD_PASSWORD);
    form.set(FIELD_PASSWORD_CONFIRM, "something-else-entirely");
    let ctx = FormContext::new(&realm, &session, &chain, &form);

    let failure = RegistrationFlow::standard().validate(&ctx).unwrap_err();
    assert!(failure.errors.len() >= 2);
    assert!(failure.has_message(USERNAME_LENGTH));
    assert!(failure.has_message(INVALID_PASSWORD_CONFIRM));

    // passwords are never echoed back
    assert!(!failure.form.contains(FIELD_PASSWORD));
    assert!(!failure.form.contains(FIELD_PASSWORD_CONFIRM));
    assert_eq!(failure.form.get(FIELD_EMAIL), Some("jdoe@example.mil"));
}

#[test]
fn test_email_in_use() {
    let (store, realm) = realm(cac_settings());
    store
        .save_user(&UserAccount::new("alice").with_email("JDOE@example.mil"))
        .unwrap();

    let session = AuthenticationSession::new("s1");
    let chain = CertificateChain::empty();
    let form = password_form("jdoe", "jdoe@example.mil", GOOD_PASSWORD);
    let ctx = FormContext::new(&realm, &session, &chain, &form);

    let failure = RegistrationFlow::standard().validate(&ctx).unwrap_err();
    assert_eq!(failure.event_error, EventError::EmailInUse);
    assert!(failure.field_errors(FIELD_EMAIL).any(|e| e.message == EMAIL_EXISTS));
    assert!(!failure.form.contains(FIELD_EMAIL));
}

#[test]
fn test_unreachable_store_rejects_registration() {
    let (store, realm) = realm(cac_settings());
    store.set_unreachable(true);

    let session = AuthenticationSession::new("s1");
    let chain = CacBuilder::default().policy(DOD_MEDIUM_HARDWARE).chain();
    let form = profile_form("jdoe", "jdoe@example.mil");
    let ctx = FormContext::new(&realm, &session, &chain, &form);

    let outcome = RegistrationFlow::standard().register(&ctx).unwrap();
    let RegistrationOutcome::Rejected(failure) = outcome else {
        panic!("expected rejection");
    };
    assert!(failure.has_message(INTERNAL_SERVER_ERROR));

    store.set_unreachable(false);
    assert!(store.is_empty());
}

#[test]
fn test_reconcile_is_idempotent() {
    let (_store, realm) = realm(cac_settings());
    let session = AuthenticationSession::new("s1");
    let chain = CacBuilder::default().policy(DOD_MEDIUM_HARDWARE).chain();
    let reconciler = RegistrationReconciler::new(&realm);

    let mut user = UserAccount::new("jdoe");
    let first = reconciler.reconcile(&chain, &session, &mut user).unwrap();
    let snapshot = user.clone();
    let second = reconciler.reconcile(&chain, &session, &mut user).unwrap();

    assert_eq!(first, second);
    assert_eq!(user, snapshot);
    assert!(!second.requires_totp());
}

#[test]
fn test_concurrent_registrations_bind_identity_once() {
    let (store, realm) = realm(cac_settings());
    let chain = CacBuilder::default().policy(DOD_MEDIUM_HARDWARE).chain();
    let flow = RegistrationFlow::standard();

    let results: Vec<_> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..4)
            .map(|i| {
                let (realm, chain, flow) = (&realm, &chain, &flow);
                scope.spawn(move || {
                    let session = AuthenticationSession::new(format!("s{i}"));
                    let form = profile_form(&format!("user{i}"), &format!("user{i}@example.mil"));
                    let ctx = FormContext::new(realm, &session, chain, &form);
                    flow.register(&ctx)
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    let registered = results
        .iter()
        .filter(|r| matches!(r, Ok(RegistrationOutcome::Registered(_))))
        .count();
    assert_eq!(registered, 1);

    for result in &results {
        match result {
            Ok(RegistrationOutcome::Registered(_)) => {}
            Ok(RegistrationOutcome::Rejected(failure)) => {
                assert!(failure.has_message(IDENTITY_ALREADY_REGISTERED))
            }
            Err(e) => assert!(matches!(
                e,
                IdentityError::AlreadyRegistered { .. } | IdentityError::DuplicateBinding { .. }
            )),
        }
    }

    assert_eq!(
        store
            .find_users_by_attribute("usercertificate", DEFAULT_CN)
            .unwrap()
            .len(),
        1
    );
}

#[test]
fn test_page_attributes() {
    let (_store, realm) = realm(cac_settings());
    let session = AuthenticationSession::new("s1");
    let form = profile_form("jdoe", "jdoe@example.mil");
    let flow = RegistrationFlow::standard();

    let chain = CacBuilder::default().policy(DOD_MEDIUM_HARDWARE).chain();
    let page = flow.build_page(&FormContext::new(&realm, &session, &chain, &form));
    assert_eq!(page.get(CAC_IDENTITY_ATTRIBUTE).map(String::as_str), Some(DEFAULT_CN));
    assert!(!page.contains_key(PASSWORD_REQUIRED_ATTRIBUTE));

    let chain = CertificateChain::empty();
    let page = flow.build_page(&FormContext::new(&realm, &session, &chain, &form));
    assert!(!page.contains_key(CAC_IDENTITY_ATTRIBUTE));
    assert_eq!(page.get(PASSWORD_REQUIRED_ATTRIBUTE).map(String::as_str), Some("true"));
}

#[test]
fn test_secondary_identifier_assigned() {
    let (_store, realm) = realm(cac_settings());
    let session = AuthenticationSession::new("s1");
    let chain = CacBuilder::default().policy(DOD_MEDIUM_HARDWARE).chain();
    let form = profile_form("jdoe", "jdoe@example.mil");
    let ctx = FormContext::new(&realm, &session, &chain, &form);

    let user = registered(RegistrationFlow::standard().register(&ctx).unwrap());
    let id = user.first_attribute("mattermostid").unwrap();
    assert!(!id.is_empty());
    assert!(id.chars().all(|c| c.is_ascii_digit()));
}

#[test]
fn test_email_as_username() {
    let mut settings = cac_settings();
    settings.registration.email_as_username = true;
    let (_store, realm) = realm(settings);
    let session = AuthenticationSession::new("s1");
    let chain = CacBuilder::default().policy(DOD_MEDIUM_HARDWARE).chain();
    let form = profile_form("jdoe", "jdoe@example.mil");
    let ctx = FormContext::new(&realm, &session, &chain, &form);

    let user = registered(RegistrationFlow::standard().register(&ctx).unwrap());
    assert_eq!(user.username, "jdoe@example.mil");
}
