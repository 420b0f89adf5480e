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

//! Identity extraction rules.
//!
//! An [`IdentityExtractor`] turns a client certificate chain into the string
//! stored on the account. It is built from an authenticator configuration
//! entry using the same keys as the hosting identity provider:
//!
//! | Key | Meaning |
//! |-----|---------|
//! | `x509-cert-auth.mapper-selection.user-attribute-name` | Marks the entry as a custom identity attribute rule |
//! | `x509-cert-auth.mapping-source-selection` | Which part of the certificate to use |
//! | `x509-cert-auth.regular-expression` | Pattern applied to DN sources |
//! | `x509-cert-auth.serialnumber-hex-enabled` | Render serial numbers as hex |

use std::fmt;
use std::str::FromStr;

use const_oid::ObjectIdentifier;
use der::{Decode, Encode, EncodePem};
use regex::{Regex, RegexBuilder};
use sha2::{Digest, Sha256};
use x509_cert::ext::pkix::name::GeneralName;
use x509_cert::ext::pkix::SubjectAltName;
use x509_cert::Certificate;

use crate::config::AuthenticatorConfig;
use crate::error::{IdentityError, Result};
use crate::pki::name::{self, EMAIL_ADDRESS};
use crate::pki::CertificateChain;

/// Presence of this key selects the custom identity attribute strategy.
pub const CUSTOM_ATTRIBUTE_NAME: &str = "x509-cert-auth.mapper-selection.user-attribute-name";

/// Extraction source key.
pub const MAPPING_SOURCE: &str = "x509-cert-auth.mapping-source-selection";

/// Regular expression key for DN sources.
pub const REGULAR_EXPRESSION: &str = "x509-cert-auth.regular-expression";

/// Serial number rendering key.
pub const SERIAL_NUMBER_HEX: &str = "x509-cert-auth.serialnumber-hex-enabled";

/// Pattern used when a DN source has no configured expression.
pub const DEFAULT_REGULAR_EXPRESSION: &str = "(.*?)(?:$)";

/// Microsoft User Principal Name otherName type.
pub const UPN_OID: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.3.6.1.4.1.311.20.2.3");

const SUBJECT_ALT_NAME_OID: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.29.17");

/// Part of the certificate an identity is taken from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum IdentitySource {
    /// Regular expression over the subject DN.
    #[default]
    SubjectDn,
    /// Regular expression over the issuer DN.
    IssuerDn,
    /// emailAddress attribute of the subject DN.
    SubjectEmail,
    /// First rfc822Name of the subject alternative names.
    SubjectAltNameEmail,
    /// User Principal Name otherName of the subject alternative names.
    SubjectAltNameUpn,
    /// Common Name of the subject DN.
    SubjectCommonName,
    /// Certificate serial number.
    SerialNumber,
    /// Serial number and issuer DN, joined by `##`.
    SerialNumberAndIssuerDn,
    /// SHA-256 of the DER encoding, lowercase hex.
    Sha256Thumbprint,
    /// The whole certificate, PEM encoded.
    PemCertificate,
}

impl IdentitySource {
    /// All sources, in display order.
    pub const ALL: [IdentitySource; 10] = [
        Self::SubjectDn,
        Self::IssuerDn,
        Self::SubjectEmail,
        Self::SubjectAltNameEmail,
        Self::SubjectAltNameUpn,
        Self::SubjectCommonName,
        Self::SerialNumber,
        Self::SerialNumberAndIssuerDn,
        Self::Sha256Thumbprint,
        Self::PemCertificate,
    ];

    /// Label used by the hosting identity provider's admin console.
    pub fn label(&self) -> &'static str {
        match self {
            Self::SubjectDn => "Match SubjectDN using regular expression",
            Self::IssuerDn => "Match IssuerDN using regular expression",
            Self::SubjectEmail => "Subject's e-mail",
            Self::SubjectAltNameEmail => "Subject's Alternative Name E-mail",
            Self::SubjectAltNameUpn => "Subject's Alternative Name otherName (UPN)",
            Self::SubjectCommonName => "Subject's Common Name",
            Self::SerialNumber => "Certificate Serial Number",
            Self::SerialNumberAndIssuerDn => "Certificate Serial Number and IssuerDN",
            Self::Sha256Thumbprint => "SHA-256 Thumbprint",
            Self::PemCertificate => "Full Certificate in PEM format",
        }
    }

    /// Short configuration key.
    pub fn key(&self) -> &'static str {
        match self {
            Self::SubjectDn => "subject_dn",
            Self::IssuerDn => "issuer_dn",
            Self::SubjectEmail => "subject_email",
            Self::SubjectAltNameEmail => "san_email",
            Self::SubjectAltNameUpn => "san_upn",
            Self::SubjectCommonName => "subject_cn",
            Self::SerialNumber => "serial_number",
            Self::SerialNumberAndIssuerDn => "serial_number_issuer_dn",
            Self::Sha256Thumbprint => "sha256_thumbprint",
            Self::PemCertificate => "pem_certificate",
        }
    }

    /// Whether the source is matched with a regular expression.
    pub fn uses_pattern(&self) -> bool {
        matches!(self, Self::SubjectDn | Self::IssuerDn)
    }
}

impl fmt::Display for IdentitySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for IdentitySource {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let s = s.trim();
        Self::ALL
            .into_iter()
            .find(|source| source.label().eq_ignore_ascii_case(s) || source.key() == s)
            .ok_or_else(|| format!("unknown mapping source '{}'", s))
    }
}

/// A compiled identity extraction rule.
#[derive(Debug, Clone)]
pub struct IdentityExtractor {
    alias: String,
    source: IdentitySource,
    pattern: Option<Regex>,
    serial_hex: bool,
}

impl IdentityExtractor {
    /// Build a rule from an authenticator configuration entry.
    ///
    /// # Errors
    ///
    /// Returns [`IdentityError::InvalidExtractor`] for an unknown source, a
    /// pattern that does not compile or one without exactly one capture group.
    pub fn from_config(config: &AuthenticatorConfig) -> Result<Self> {
        let alias = config.alias.as_str();

        let source = match config.get(MAPPING_SOURCE) {
            Some(value) => value
                .parse::<IdentitySource>()
                .map_err(|e| IdentityError::invalid_extractor(alias, e))?,
            None => IdentitySource::default(),
        };

        let pattern = if source.uses_pattern() {
            let expression = config
                .get(REGULAR_EXPRESSION)
                .filter(|s| !s.trim().is_empty())
                .unwrap_or(DEFAULT_REGULAR_EXPRESSION);
            Some(compile_pattern(alias, expression)?)
        } else {
            None
        };

        let serial_hex = config
            .get(SERIAL_NUMBER_HEX)
            .map(|v| v.trim().eq_ignore_ascii_case("true"))
            .unwrap_or(false);

        Ok(Self {
            alias: alias.to_string(),
            source,
            pattern,
            serial_hex,
        })
    }

    /// Alias of the configuration entry this rule came from.
    pub fn alias(&self) -> &str {
        &self.alias
    }

    /// Extraction source.
    pub fn source(&self) -> IdentitySource {
        self.source
    }

    /// Derive the identity string from the leaf certificate.
    ///
    /// Returns `None` for an empty chain, a source the certificate does not
    /// carry, a pattern that does not match, or an empty result.
    pub fn extract(&self, chain: &CertificateChain) -> Option<String> {
        let cert = chain.leaf()?;
        let tbs = &cert.tbs_certificate;

        let value = match self.source {
            IdentitySource::SubjectDn => self.capture(&name::format_dn(&tbs.subject)),
            IdentitySource::IssuerDn => self.capture(&name::format_dn(&tbs.issuer)),
            IdentitySource::SubjectEmail => name::attribute_value(&tbs.subject, &EMAIL_ADDRESS),
            IdentitySource::SubjectAltNameEmail => san_email(&subject_alt_names(cert)),
            IdentitySource::SubjectAltNameUpn => san_upn(&subject_alt_names(cert)),
            IdentitySource::SubjectCommonName => name::common_name(&tbs.subject),
            IdentitySource::SerialNumber => Some(self.serial(cert)),
            IdentitySource::SerialNumberAndIssuerDn => Some(format!(
                "{}##{}",
                self.serial(cert),
                name::format_dn(&tbs.issuer)
            )),
            IdentitySource::Sha256Thumbprint => thumbprint(cert),
            IdentitySource::PemCertificate => cert.to_pem(der::pem::LineEnding::LF).ok(),
        };

        value.filter(|v| !v.is_empty())
    }

    fn capture(&self, haystack: &str) -> Option<String> {
        let pattern = self.pattern.as_ref()?;
        let captures = pattern.captures(haystack)?;
        captures.get(1).map(|m| m.as_str().to_string())
    }

    fn serial(&self, cert: &Certificate) -> String {
        let bytes = cert.tbs_certificate.serial_number.as_bytes();
        if self.serial_hex {
            serial_to_hex(bytes)
        } else {
            serial_to_decimal(bytes)
        }
    }
}

fn compile_pattern(alias: &str, expression: &str) -> Result<Regex> {
    let regex = RegexBuilder::new(expression)
        .case_insensitive(true)
        .dot_matches_new_line(true)
        .build()
        .map_err(|e| IdentityError::invalid_extractor(alias, format!("invalid regular expression: {}", e)))?;

    // group 0 is the whole match
    if regex.captures_len() != 2 {
        return Err(IdentityError::invalid_extractor(
            alias,
            format!(
                "regular expression '{}' must have exactly one capture group",
                expression
            ),
        ));
    }

    Ok(regex)
}

fn subject_alt_names(cert: &Certificate) -> Vec<GeneralName> {
    let Some(ext) = cert
        .tbs_certificate
        .extensions
        .as_ref()
        .and_then(|exts| exts.iter().find(|ext| ext.extn_id == SUBJECT_ALT_NAME_OID))
    else {
        return Vec::new();
    };

    match SubjectAltName::from_der(ext.extn_value.as_bytes()) {
        Ok(san) => san.0,
        Err(e) => {
            tracing::warn!("Ignoring subject alternative names: {}", e);
            Vec::new()
        }
    }
}

fn san_email(names: &[GeneralName]) -> Option<String> {
    names.iter().find_map(|name| match name {
        GeneralName::Rfc822Name(email) => Some(email.to_string()),
        _ => None,
    })
}

fn san_upn(names: &[GeneralName]) -> Option<String> {
    names.iter().find_map(|name| match name {
        GeneralName::OtherName(other) if other.type_id == UPN_OID => {
            std::str::from_utf8(other.value.value()).ok().map(str::to_string)
        }
        _ => None,
    })
}

fn thumbprint(cert: &Certificate) -> Option<String> {
    let der = cert.to_der().ok()?;
    Some(hex::encode(Sha256::digest(&der)))
}

/// Big-endian unsigned bytes as a decimal string.
fn serial_to_decimal(bytes: &[u8]) -> String {
    // little-endian base-10 digits
    let mut digits: Vec<u8> = vec![0];

    for &byte in bytes {
        let mut carry = u32::from(byte);
        for digit in digits.iter_mut() {
            let value = u32::from(*digit) * 256 + carry;
            *digit = (value % 10) as u8;
            carry = value / 10;
        }
        while carry > 0 {
            digits.push((carry % 10) as u8);
            carry /= 10;
        }
    }

    while digits.len() > 1 && digits.last() == Some(&0) {
        digits.pop();
    }

    digits.iter().rev().map(|d| char::from(b'0' + d)).collect()
}

/// Big-endian unsigned bytes as lowercase hex without leading zeros.
fn serial_to_hex(bytes: &[u8]) -> String {
    let encoded = hex::encode(bytes);
    let trimmed = encoded.trim_start_matches('0');
    if trimmed.is_empty() {
        "0".to_string()
    } else {
        trimmed.to_string()
    }
}
