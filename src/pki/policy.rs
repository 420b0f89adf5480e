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

//! Certificate Policies extension parsing.
//!
//! ```text
//! certificatePolicies ::= SEQUENCE SIZE (1..MAX) OF PolicyInformation
//!
//! PolicyInformation ::= SEQUENCE {
//!     policyIdentifier   CertPolicyId,
//!     policyQualifiers   SEQUENCE SIZE (1..MAX) OF PolicyQualifierInfo OPTIONAL }
//!
//! CertPolicyId ::= OBJECT IDENTIFIER
//! ```
//!
//! Qualifiers are skipped without being interpreted, so certificates with
//! unusual CPS/user-notice qualifiers still yield their policy OIDs.
//!
//! # Example
//!
//! ```no_run
//! use usg_x509_registration::pki::extract_policy_id;
//! # use x509_cert::Certificate;
//!
//! # fn example(cert: &Certificate) {
//! // first identifier of the first policy entry
//! if let Some(oid) = extract_policy_id(cert, 0, 0) {
//!     println!("policy: {}", oid);
//! }
//! # }
//! ```

use crate::error::{IdentityError, Result};
use const_oid::ObjectIdentifier;
use der::asn1::AnyRef;
use der::{Decode, Encode, Reader, SliceReader, Tag, Tagged};
use x509_cert::Certificate;

/// Certificate policies extension OID (2.5.29.32)
pub const CERTIFICATE_POLICIES_OID: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("2.5.29.32");

/// Get the policy OID at a given position of the certificate policies extension.
///
/// `policy_slot` selects the `PolicyInformation` entry and `identifier_slot`
/// the identifier within it, both 0-based. An entry carries exactly one
/// identifier, so only `identifier_slot == 0` can match.
///
/// Only the requested entry is decoded. Entries after it are not read, and
/// entries before it are only framed, so a malformed entry is an error for
/// its own slot alone.
///
/// Returns `Ok(None)` when the certificate has no policies extension or
/// either slot is out of range, and an error when the extension framing or
/// the requested entry is not valid DER.
pub fn policy_id(
    cert: &Certificate,
    policy_slot: usize,
    identifier_slot: usize,
) -> Result<Option<ObjectIdentifier>> {
    let Some(value) = policies_extension_value(cert) else {
        return Ok(None);
    };

    let entry = policy_entry(value, policy_slot).map_err(|e| {
        IdentityError::certificate_parsing(format!("Invalid certificate policies extension: {}", e))
    })?;
    let Some(entry) = entry else {
        return Ok(None);
    };

    let policy = PolicyInformation::from_entry(entry).map_err(|e| {
        IdentityError::certificate_parsing(format!(
            "Invalid certificate policy at slot {}: {}",
            policy_slot, e
        ))
    })?;

    Ok(policy.identifiers().get(identifier_slot).copied())
}

/// Tolerant form of [`policy_id`].
///
/// Malformed extensions are logged and treated as absent.
pub fn extract_policy_id(
    cert: &Certificate,
    policy_slot: usize,
    identifier_slot: usize,
) -> Option<ObjectIdentifier> {
    match policy_id(cert, policy_slot, identifier_slot) {
        Ok(oid) => oid,
        Err(e) => {
            tracing::warn!("Ignoring certificate policies: {}", e);
            None
        }
    }
}

/// All policy OIDs of a certificate, in encoded order.
///
/// Malformed entries are logged and skipped. Returns an empty list when the
/// extension is absent or its framing is malformed.
pub fn policy_ids(cert: &Certificate) -> Vec<ObjectIdentifier> {
    let Some(value) = policies_extension_value(cert) else {
        return Vec::new();
    };

    let entries = match policy_entries(value) {
        Ok(entries) => entries,
        Err(e) => {
            tracing::warn!("Ignoring certificate policies: {}", e);
            return Vec::new();
        }
    };

    entries
        .into_iter()
        .enumerate()
        .filter_map(|(slot, entry)| match PolicyInformation::from_entry(entry) {
            Ok(policy) => Some(policy.policy_identifier),
            Err(e) => {
                tracing::warn!(slot, "Ignoring certificate policy: {}", e);
                None
            }
        })
        .collect()
}

/// Raw DER of the certificate policies extension, if present.
fn policies_extension_value(cert: &Certificate) -> Option<&[u8]> {
    cert.tbs_certificate
        .extensions
        .as_ref()?
        .iter()
        .find(|ext| ext.extn_id == CERTIFICATE_POLICIES_OID)
        .map(|ext| ext.extn_value.as_bytes())
}

/// Contents of the outer `SEQUENCE OF` carried in the extension value.
fn policies_sequence(bytes: &[u8]) -> der::Result<SliceReader<'_>> {
    let outer = AnyRef::from_der(bytes)?;
    outer.tag().assert_eq(Tag::Sequence)?;
    SliceReader::new(outer.value())
}

/// The undecoded entry at `policy_slot`, reading no further than that entry.
pub(crate) fn policy_entry(bytes: &[u8], policy_slot: usize) -> der::Result<Option<AnyRef<'_>>> {
    let mut reader = policies_sequence(bytes)?;

    let mut slot = 0;
    while !reader.is_finished() {
        let entry = AnyRef::decode(&mut reader)?;
        if slot == policy_slot {
            return Ok(Some(entry));
        }
        slot += 1;
    }
    Ok(None)
}

/// Every undecoded entry of the extension value.
pub(crate) fn policy_entries(bytes: &[u8]) -> der::Result<Vec<AnyRef<'_>>> {
    let mut reader = policies_sequence(bytes)?;

    let mut entries = Vec::new();
    while !reader.is_finished() {
        entries.push(AnyRef::decode(&mut reader)?);
    }
    Ok(entries)
}

/// PolicyInformation structure from RFC 5280
#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) struct PolicyInformation {
    policy_identifier: ObjectIdentifier,
    // policy_qualifiers omitted - we only need the OID
}

impl PolicyInformation {
    /// Decode one entry previously framed by [`policy_entry`].
    fn from_entry(entry: AnyRef<'_>) -> der::Result<Self> {
        Self::from_der(&entry.to_der()?)
    }

    fn identifiers(&self) -> &[ObjectIdentifier] {
        std::slice::from_ref(&self.policy_identifier)
    }
}

impl<'a> Decode<'a> for PolicyInformation {
    fn decode<R: Reader<'a>>(reader: &mut R) -> der::Result<Self> {
        reader.sequence(|r| {
            let policy_identifier = ObjectIdentifier::decode(r)?;
            // Skip any remaining content (policy qualifiers)
            while !r.is_finished() {
                let _ = r.decode::<der::asn1::Any>()?;
            }
            Ok(Self { policy_identifier })
        })
    }
}
