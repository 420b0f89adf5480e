// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 U.S. Federal Government (in countries where recognized)

//! Integration test utilities and helpers
//!
//! Certificate issuance with rcgen, realm construction and registration form
//! fixtures shared by the integration tests.

use std::sync::Arc;

use const_oid::ObjectIdentifier;
use der::Encode;
use rcgen::{CertificateParams, CustomExtension, DistinguishedName, DnType, KeyPair, SanType};
use usg_x509_registration::config::{AuthenticatorConfig, RealmSettings};
use usg_x509_registration::identity::extractor::{
    CUSTOM_ATTRIBUTE_NAME, MAPPING_SOURCE, REGULAR_EXPRESSION,
};
use usg_x509_registration::pki::CertificateChain;
use usg_x509_registration::realm::Realm;
use usg_x509_registration::registration::form::{
    FIELD_AFFILIATION, FIELD_EMAIL, FIELD_FIRST_NAME, FIELD_LAST_NAME, FIELD_ORGANIZATION,
    FIELD_PASSWORD, FIELD_PASSWORD_CONFIRM, FIELD_RANK, FIELD_USERNAME,
};
use usg_x509_registration::registration::RegistrationForm;
use usg_x509_registration::store::InMemoryUserStore;

mod registration_test;
mod resolver_test;
mod update_x509_test;

/// id-US-dod-mediumhardware
pub const DOD_MEDIUM_HARDWARE: &str = "2.16.840.1.101.2.1.11.9";
/// id-US-dod-PIV-Auth
pub const DOD_PIV_AUTH: &str = "2.16.840.1.101.2.1.11.10";
/// A policy no catalog entry lists
pub const UNLISTED_POLICY: &str = "1.2.3.4.5";

/// Common Name used by [`CacBuilder::default`]
pub const DEFAULT_CN: &str = "DOE.JOHN.Q.1234567890";

/// A password long enough for the default policy
pub const GOOD_PASSWORD: &str = "correct-horse-battery";

/// Certificate policies extension OID arcs for rcgen
const CERTIFICATE_POLICIES: &[u64] = &[2, 5, 29, 32];

/// Builder for throwaway CAC-like leaf certificates
pub struct CacBuilder {
    common_name: String,
    email: Option<String>,
    policies: Vec<String>,
    raw_policies: Option<Vec<u8>>,
}

impl Default for CacBuilder {
    fn default() -> Self {
        Self::new(DEFAULT_CN)
    }
}

impl CacBuilder {
    pub fn new(common_name: &str) -> Self {
        Self {
            common_name: common_name.to_string(),
            email: None,
            policies: Vec::new(),
            raw_policies: None,
        }
    }

    pub fn policy(mut self, oid: &str) -> Self {
        self.policies.push(oid.to_string());
        self
    }

    pub fn email(mut self, email: &str) -> Self {
        self.email = Some(email.to_string());
        self
    }

    /// Use raw bytes as the certificate policies extension value
    pub fn raw_policies_extension(mut self, der: Vec<u8>) -> Self {
        self.raw_policies = Some(der);
        self
    }

    fn params(&self) -> CertificateParams {
        let mut params = CertificateParams::default();
        params.distinguished_name = DistinguishedName::new();
        params.distinguished_name.push(DnType::CountryName, "US");
        params.distinguished_name.push(DnType::OrganizationName, "U.S. Government");
        params.distinguished_name.push(DnType::OrganizationalUnitName, "DoD");
        params.distinguished_name.push(DnType::CommonName, self.common_name.as_str());

        if let Some(email) = &self.email {
            params.subject_alt_names = vec![SanType::Rfc822Name(email.as_str().try_into().unwrap())];
        }

        let policies = match &self.raw_policies {
            Some(der) => Some(der.clone()),
            None if self.policies.is_empty() => None,
            None => Some(certificate_policies(&self.policies)),
        };
        if let Some(der) = policies {
            params
                .custom_extensions
                .push(CustomExtension::from_oid_content(CERTIFICATE_POLICIES, der));
        }

        params
    }

    pub fn der(&self) -> Vec<u8> {
        let key_pair = KeyPair::generate().unwrap();
        let cert = self.params().self_signed(&key_pair).unwrap();
        cert.der().to_vec()
    }

    pub fn pem(&self) -> String {
        let key_pair = KeyPair::generate().unwrap();
        self.params().self_signed(&key_pair).unwrap().pem()
    }

    pub fn chain(&self) -> CertificateChain {
        CertificateChain::from_der(&[self.der()]).unwrap()
    }
}

/// Encode a minimal DER tag-length-value
pub fn tlv(tag: u8, content: &[u8]) -> Vec<u8> {
    let mut out = vec![tag];
    let len = content.len();
    if len < 0x80 {
        out.push(len as u8);
    } else if len <= 0xff {
        out.extend_from_slice(&[0x81, len as u8]);
    } else {
        out.extend_from_slice(&[0x82, (len >> 8) as u8, len as u8]);
    }
    out.extend_from_slice(content);
    out
}

/// One `PolicyInformation` entry without qualifiers
pub fn policy_information(oid: &str) -> Vec<u8> {
    let oid = ObjectIdentifier::new(oid).unwrap().to_der().unwrap();
    tlv(0x30, &oid)
}

/// `SEQUENCE OF PolicyInformation` without qualifiers
pub fn certificate_policies(oids: &[String]) -> Vec<u8> {
    let entries: Vec<u8> = oids.iter().flat_map(|oid| policy_information(oid)).collect();
    tlv(0x30, &entries)
}

/// Authenticator rule taking the identity from the subject CN
pub fn cac_authenticator() -> AuthenticatorConfig {
    AuthenticatorConfig::new("x509-cac")
        .with(CUSTOM_ATTRIBUTE_NAME, "usercertificate")
        .with(MAPPING_SOURCE, "Match SubjectDN using regular expression")
        .with(REGULAR_EXPRESSION, "CN=(.*?)(?:,|$)")
}

/// Default settings with the CN authenticator rule
pub fn cac_settings() -> RealmSettings {
    let mut settings = RealmSettings::default();
    settings.authenticators.push(cac_authenticator());
    settings
}

/// Realm over a fresh store that enforces unique identity bindings
pub fn realm(settings: RealmSettings) -> (Arc<InMemoryUserStore>, Realm) {
    let store = Arc::new(InMemoryUserStore::new().with_unique_attribute("usercertificate"));
    let realm = Realm::new(settings, store.clone()).unwrap();
    (store, realm)
}

/// A form with every profile field filled in
pub fn profile_form(username: &str, email: &str) -> RegistrationForm {
    RegistrationForm::from_pairs([
        (FIELD_USERNAME, username),
        (FIELD_EMAIL, email),
        (FIELD_FIRST_NAME, "John"),
        (FIELD_LAST_NAME, "Doe"),
        (FIELD_AFFILIATION, "US Army"),
        (FIELD_RANK, "O-3"),
        (FIELD_ORGANIZATION, "192d Cyberspace Control Squadron"),
    ])
}

/// [`profile_form`] plus a matching password pair
pub fn password_form(username: &str, email: &str, password: &str) -> RegistrationForm {
    let mut form = profile_form(username, email);
    form.set(FIELD_PASSWORD, password);
    form.set(FIELD_PASSWORD_CONFIRM, password);
    form
}

#[cfg(test)]
mod tests {
    use super::*;
    use usg_x509_registration::pki::policy_ids;

    #[test]
    fn test_builder_encodes_policies_in_order() {
        let chain = CacBuilder::default()
            .policy(UNLISTED_POLICY)
            .policy(DOD_MEDIUM_HARDWARE)
            .chain();
        let oids: Vec<String> = policy_ids(chain.leaf().unwrap())
            .iter()
            .map(ToString::to_string)
            .collect();
        assert_eq!(oids, vec![UNLISTED_POLICY, DOD_MEDIUM_HARDWARE]);
    }

    #[test]
    fn test_builder_without_policies() {
        let chain = CacBuilder::default().chain();
        assert!(policy_ids(chain.leaf().unwrap()).is_empty());
    }
}
