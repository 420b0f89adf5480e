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

//! Integration tests for the confirm-identity required action

use crate::integration::{cac_settings, realm, CacBuilder, DEFAULT_CN, DOD_MEDIUM_HARDWARE};
use usg_x509_registration::pki::CertificateChain;
use usg_x509_registration::registration::form::FIELD_CANCEL;
use usg_x509_registration::registration::RegistrationForm;
use usg_x509_registration::required_action::{
    RequiredActionContext, RequiredActionProvider, UpdateX509, IGNORE_X509_NOTE,
};
use usg_x509_registration::store::{AuthenticationSession, RequiredAction, UserAccount, UserStore};
use usg_x509_registration::IdentityError;

fn existing_user(store: &dyn UserStore, username: &str) -> UserAccount {
    let user = UserAccount::new(username).with_email(format!("{username}@example.mil"));
    store.save_user(&user).unwrap();
    user
}

#[test]
fn test_unbound_identity_is_confirmed() {
    let (store, realm) = realm(cac_settings());
    let chain = CacBuilder::default().policy(DOD_MEDIUM_HARDWARE).chain();
    let mut session = AuthenticationSession::new("s1");
    let mut user = existing_user(&*store, "jdoe");

    let mut ctx = RequiredActionContext {
        realm: &realm,
        session: &mut session,
        chain: &chain,
        user: &mut user,
    };

    UpdateX509.evaluate_triggers(&mut ctx).unwrap();
    assert!(ctx.user.has_required_action(RequiredAction::UpdateX509));
    assert_eq!(ctx.user.first_attribute("activecac"), Some(DEFAULT_CN));
    assert!(ctx.user.attribute("usercertificate").is_empty());

    let page = UpdateX509.challenge(&ctx);
    assert_eq!(page.username, "jdoe");
    assert_eq!(page.subject_dn.as_deref(), Some(DEFAULT_CN));
    assert!(page.is_user_enabled);

    UpdateX509
        .process_action(&mut ctx, &RegistrationForm::new())
        .unwrap();
    assert!(!ctx.user.has_required_action(RequiredAction::UpdateX509));
    assert_eq!(ctx.user.first_attribute("usercertificate"), Some(DEFAULT_CN));

    let stored = store.get_user(&user.id).unwrap().unwrap();
    assert_eq!(stored.first_attribute("usercertificate"), Some(DEFAULT_CN));
    assert!(stored.required_actions.is_empty());
}

#[test]
fn test_identity_bound_elsewhere_does_not_prompt() {
    let (store, realm) = realm(cac_settings());
    let mut other = UserAccount::new("alice");
    other.set_single_attribute("usercertificate", DEFAULT_CN);
    store.save_user(&other).unwrap();

    let chain = CacBuilder::default().policy(DOD_MEDIUM_HARDWARE).chain();
    let mut session = AuthenticationSession::new("s1");
    let mut user = existing_user(&*store, "jdoe");
    let mut ctx = RequiredActionContext {
        realm: &realm,
        session: &mut session,
        chain: &chain,
        user: &mut user,
    };

    UpdateX509.evaluate_triggers(&mut ctx).unwrap();
    assert!(!ctx.user.has_required_action(RequiredAction::UpdateX509));
    assert_eq!(ctx.user.first_attribute("activecac"), Some(DEFAULT_CN));
}

#[test]
fn test_cancel_suppresses_prompt_for_session() {
    let (store, realm) = realm(cac_settings());
    let chain = CacBuilder::default().policy(DOD_MEDIUM_HARDWARE).chain();
    let mut session = AuthenticationSession::new("s1");
    let mut user = existing_user(&*store, "jdoe");
    let mut ctx = RequiredActionContext {
        realm: &realm,
        session: &mut session,
        chain: &chain,
        user: &mut user,
    };

    UpdateX509.evaluate_triggers(&mut ctx).unwrap();
    assert!(ctx.user.has_required_action(RequiredAction::UpdateX509));

    let cancel = RegistrationForm::from_pairs([(FIELD_CANCEL, "")]);
    UpdateX509.process_action(&mut ctx, &cancel).unwrap();
    assert_eq!(ctx.session.note(IGNORE_X509_NOTE), Some("true"));
    assert!(!ctx.user.has_required_action(RequiredAction::UpdateX509));
    assert!(ctx.user.attribute("usercertificate").is_empty());

    UpdateX509.evaluate_triggers(&mut ctx).unwrap();
    assert!(!ctx.user.has_required_action(RequiredAction::UpdateX509));

    // a new session prompts again
    let mut next_session = AuthenticationSession::new("s2");
    let mut ctx = RequiredActionContext {
        realm: &realm,
        session: &mut next_session,
        chain: &chain,
        user: &mut user,
    };
    UpdateX509.evaluate_triggers(&mut ctx).unwrap();
    assert!(ctx.user.has_required_action(RequiredAction::UpdateX509));
}

#[test]
fn test_confirm_after_concurrent_binding_fails() {
    let (store, realm) = realm(cac_settings());
    let chain = CacBuilder::default().policy(DOD_MEDIUM_HARDWARE).chain();
    let mut session = AuthenticationSession::new("s1");
    let mut user = existing_user(&*store, "jdoe");
    let mut ctx = RequiredActionContext {
        realm: &realm,
        session: &mut session,
        chain: &chain,
        user: &mut user,
    };

    UpdateX509.evaluate_triggers(&mut ctx).unwrap();
    assert!(ctx.user.has_required_action(RequiredAction::UpdateX509));

    let mut other = UserAccount::new("alice");
    other.set_single_attribute("usercertificate", DEFAULT_CN);
    store.save_user(&other).unwrap();

    let err = UpdateX509
        .process_action(&mut ctx, &RegistrationForm::new())
        .unwrap_err();
    assert!(matches!(err, IdentityError::AlreadyRegistered { .. }));
    assert!(ctx.user.has_required_action(RequiredAction::UpdateX509));
    assert!(ctx.user.attribute("usercertificate").is_empty());
}

#[test]
fn test_no_certificate_leaves_account_untouched() {
    let (store, realm) = realm(cac_settings());
    let chain = CertificateChain::empty();
    let mut session = AuthenticationSession::new("s1");
    let mut user = existing_user(&*store, "jdoe");
    let before = user.clone();
    let mut ctx = RequiredActionContext {
        realm: &realm,
        session: &mut session,
        chain: &chain,
        user: &mut user,
    };

    UpdateX509.evaluate_triggers(&mut ctx).unwrap();
    assert_eq!(*ctx.user, before);
}

#[test]
fn test_store_failure_leaves_account_untouched() {
    let (store, realm) = realm(cac_settings());
    let chain = CacBuilder::default().policy(DOD_MEDIUM_HARDWARE).chain();
    let mut session = AuthenticationSession::new("s1");
    let mut user = existing_user(&*store, "jdoe");
    let before = user.clone();
    store.set_unreachable(true);

    let mut ctx = RequiredActionContext {
        realm: &realm,
        session: &mut session,
        chain: &chain,
        user: &mut user,
    };

    let err = UpdateX509.evaluate_triggers(&mut ctx).unwrap_err();
    assert!(err.is_store_failure());
    assert_eq!(user, before);
    assert!(user.first_attribute("activecac").is_none());
}
