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

//! Integration tests for certificate identity resolution

use crate::integration::{
    cac_authenticator, cac_settings, policy_information, tlv, CacBuilder, DEFAULT_CN,
    DOD_MEDIUM_HARDWARE, DOD_PIV_AUTH, UNLISTED_POLICY,
};
use usg_x509_registration::config::ConfigLoader;
use usg_x509_registration::pki::CertificateChain;

#[test]
fn test_accepted_policy_resolves_identity() {
    let settings = cac_settings();
    let resolver = settings.resolver().unwrap();
    let chain = CacBuilder::default().policy(DOD_MEDIUM_HARDWARE).chain();

    let identity = resolver.resolve(&chain, &settings.authenticators, "s1");
    assert_eq!(identity.as_ref().map(|i| i.as_str()), Some(DEFAULT_CN));
}

#[test]
fn test_lowest_accepted_slot_wins() {
    let settings = cac_settings();
    let resolver = settings.resolver().unwrap();
    let chain = CacBuilder::default()
        .policy(UNLISTED_POLICY)
        .policy(DOD_PIV_AUTH)
        .policy(DOD_MEDIUM_HARDWARE)
        .chain();

    let policy = resolver
        .first_accepted_policy(chain.leaf().unwrap(), "s1")
        .unwrap();
    assert_eq!(policy.slot, 1);
    assert_eq!(policy.oid.to_string(), DOD_PIV_AUTH);
}

#[test]
fn test_no_accepted_policy() {
    let settings = cac_settings();
    let resolver = settings.resolver().unwrap();

    let unlisted = CacBuilder::default().policy(UNLISTED_POLICY).chain();
    assert!(resolver.resolve(&unlisted, &settings.authenticators, "s1").is_none());

    let without_extension = CacBuilder::default().chain();
    assert!(resolver
        .resolve(&without_extension, &settings.authenticators, "s1")
        .is_none());
}

#[test]
fn test_malformed_policies_extension_is_not_accepted() {
    let settings = cac_settings();
    let resolver = settings.resolver().unwrap();

    // SEQUENCE { INTEGER 5 } instead of SEQUENCE OF PolicyInformation
    let malformed = tlv(0x30, &[0x02, 0x01, 0x05]);
    let chain = CacBuilder::default().raw_policies_extension(malformed).chain();

    assert!(resolver.resolve(&chain, &settings.authenticators, "s1").is_none());
}

#[test]
fn test_malformed_entry_after_accepted_slot() {
    let settings = cac_settings();
    let resolver = settings.resolver().unwrap();

    // SEQUENCE { SEQUENCE { accepted OID }, SEQUENCE { INTEGER 1 } }
    let extension = tlv(
        0x30,
        &[policy_information(DOD_MEDIUM_HARDWARE), tlv(0x30, &[0x02, 0x01, 0x01])].concat(),
    );
    let chain = CacBuilder::default().raw_policies_extension(extension).chain();
    let leaf = chain.leaf().unwrap();

    assert_eq!(
        usg_x509_registration::pki::policy_id(leaf, 0, 0)
            .unwrap()
            .map(|oid| oid.to_string())
            .as_deref(),
        Some(DOD_MEDIUM_HARDWARE)
    );
    assert!(usg_x509_registration::pki::policy_id(leaf, 1, 0).is_err());
    assert_eq!(
        resolver
            .resolve(&chain, &settings.authenticators, "s1")
            .unwrap()
            .as_str(),
        DEFAULT_CN
    );
}

#[test]
fn test_malformed_entry_beyond_inspected_slots() {
    let settings = cac_settings();
    let resolver = settings.resolver().unwrap();
    assert_eq!(settings.x509.max_policies_to_check, 10);

    let mut entries = vec![policy_information(DOD_MEDIUM_HARDWARE)];
    entries.extend((0..11).map(|i| policy_information(&format!("1.2.3.4.{}", i))));
    entries.push(tlv(0x30, &[0x02, 0x01, 0x01]));
    let extension = tlv(0x30, &entries.concat());
    let chain = CacBuilder::default().raw_policies_extension(extension).chain();

    assert_eq!(
        resolver
            .resolve(&chain, &settings.authenticators, "s1")
            .unwrap()
            .as_str(),
        DEFAULT_CN
    );
}

#[test]
fn test_malformed_entry_before_accepted_slot_aborts() {
    let settings = cac_settings();
    let resolver = settings.resolver().unwrap();

    let extension = tlv(
        0x30,
        &[tlv(0x30, &[0x02, 0x01, 0x01]), policy_information(DOD_MEDIUM_HARDWARE)].concat(),
    );
    let chain = CacBuilder::default().raw_policies_extension(extension).chain();

    assert!(resolver.resolve(&chain, &settings.authenticators, "s1").is_none());
}

#[test]
fn test_resolve_is_repeatable() {
    let settings = cac_settings();
    let resolver = settings.resolver().unwrap();
    let chain = CacBuilder::default()
        .policy(UNLISTED_POLICY)
        .policy(DOD_PIV_AUTH)
        .chain();

    let first = resolver.resolve(&chain, &settings.authenticators, "s1");
    let second = resolver.resolve(&chain, &settings.authenticators, "s2");
    assert!(first.is_some());
    assert_eq!(first, second);
}

#[test]
fn test_policy_beyond_inspected_slots_is_ignored() {
    let chain = CacBuilder::default()
        .policy(UNLISTED_POLICY)
        .policy("1.2.3.4.6")
        .policy(DOD_MEDIUM_HARDWARE)
        .chain();

    let mut settings = cac_settings();
    settings.x509.max_policies_to_check = 2;
    let resolver = settings.resolver().unwrap();
    assert!(resolver.resolve(&chain, &settings.authenticators, "s1").is_none());

    settings.x509.max_policies_to_check = 3;
    let resolver = settings.resolver().unwrap();
    assert!(resolver.resolve(&chain, &settings.authenticators, "s1").is_some());
}

#[test]
fn test_no_authenticator_rule() {
    let settings = cac_settings();
    let resolver = settings.resolver().unwrap();
    let chain = CacBuilder::default().policy(DOD_MEDIUM_HARDWARE).chain();

    assert!(resolver.resolve(&chain, &[], "s1").is_none());
}

#[test]
fn test_first_custom_attribute_rule_is_used() {
    let settings = cac_settings();
    let resolver = settings.resolver().unwrap();
    let chain = CacBuilder::default()
        .policy(DOD_MEDIUM_HARDWARE)
        .email("john.doe@example.mil")
        .chain();

    let unrelated = usg_x509_registration::AuthenticatorConfig::new("otp").with("otp.length", "6");
    let email_rule = usg_x509_registration::AuthenticatorConfig::new("email")
        .with(
            usg_x509_registration::identity::extractor::CUSTOM_ATTRIBUTE_NAME,
            "usercertificate",
        )
        .with(
            usg_x509_registration::identity::extractor::MAPPING_SOURCE,
            "Subject's Alternative Name E-mail",
        );

    let identity = resolver.resolve(&chain, &[unrelated, email_rule, cac_authenticator()], "s1");
    assert_eq!(identity.unwrap().as_str(), "john.doe@example.mil");
}

#[test]
fn test_empty_chain() {
    let settings = cac_settings();
    let resolver = settings.resolver().unwrap();
    assert!(resolver
        .resolve(&CertificateChain::empty(), &settings.authenticators, "s1")
        .is_none());
}

#[test]
fn test_only_leaf_policies_count() {
    let settings = cac_settings();
    let resolver = settings.resolver().unwrap();
    let leaf = CacBuilder::default().der();
    let issuer = CacBuilder::new("DOD ID CA-70").policy(DOD_MEDIUM_HARDWARE).der();
    let chain = CertificateChain::from_der(&[leaf, issuer]).unwrap();

    assert!(resolver.resolve(&chain, &settings.authenticators, "s1").is_none());
}

#[test]
fn test_additional_accepted_policy() {
    let chain = CacBuilder::default().policy(UNLISTED_POLICY).chain();

    let mut settings = cac_settings();
    settings.x509.additional_accepted_policies = vec![UNLISTED_POLICY.to_string()];
    let resolver = settings.resolver().unwrap();

    assert!(resolver.catalog().is_accepted_str(DOD_MEDIUM_HARDWARE));
    assert_eq!(
        resolver
            .resolve(&chain, &settings.authenticators, "s1")
            .unwrap()
            .as_str(),
        DEFAULT_CN
    );
}

#[test]
fn test_pem_chain_resolves() {
    let settings = cac_settings();
    let resolver = settings.resolver().unwrap();
    let pem = CacBuilder::default().policy(DOD_MEDIUM_HARDWARE).pem();
    let chain = CertificateChain::from_pem(pem).unwrap();

    assert_eq!(chain.len(), 1);
    assert!(resolver.resolve(&chain, &settings.authenticators, "s1").is_some());
}

#[test]
fn test_resolve_with_toml_configuration() {
    let toml = r#"
[x509]
max_policies_to_check = 4

[[authenticator]]
alias = "x509-cac"
[authenticator.config]
"x509-cert-auth.mapper-selection.user-attribute-name" = "usercertificate"
"x509-cert-auth.mapping-source-selection" = "Subject's Common Name"
"#;
    let settings = ConfigLoader::new().load_from_str(toml).unwrap();
    assert_eq!(settings.x509.max_policies_to_check, 4);

    let resolver = settings.resolver().unwrap();
    let chain = CacBuilder::default().policy(DOD_PIV_AUTH).chain();
    assert_eq!(
        resolver
            .resolve(&chain, &settings.authenticators, "s1")
            .unwrap()
            .as_str(),
        DEFAULT_CN
    );
}
