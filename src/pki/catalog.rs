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

//! Accepted certificate policy catalog.
//!
//! A client certificate is only usable as an identity when its leaf carries a
//! certificate policy OID that maps to an acceptable assurance level. The
//! catalog below lists the medium-hardware, high and PIV/PIV-I policies of the
//! DoD PKI, ECA, the Federal PKI bridge members and the commercial
//! non-federal issuers cross-certified with it.
//!
//! # Example
//!
//! ```
//! use usg_x509_registration::pki::PolicyCatalog;
//!
//! let catalog = PolicyCatalog::standard();
//! assert!(catalog.is_accepted_str("2.16.840.1.101.2.1.11.9"));
//! assert!(!catalog.is_accepted_str("1.2.3.4"));
//! ```
//!
//! # References
//!
//! - [DoD X.509 Certificate Policy](https://dl.dod.cyber.mil/wp-content/uploads/pki-pke/pdf/Unclass-DoD_X.509_Certificate_Policy_v10.7_Jun_3_21.pdf)
//! - [FPKI Certificate Policy OIDs](https://www.idmanagement.gov/docs/fpki-x509-cert-policy-common.pdf)

use const_oid::ObjectIdentifier;
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;

/// PKI that publishes an accepted policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PolicyIssuer {
    /// U.S. Department of Defense PKI
    Dod,
    /// External Certification Authority program
    Eca,
    /// Federal PKI common policy (also asserted by the SSP providers)
    FederalPki,
    /// Department of State PKI
    DepartmentOfState,
    /// U.S. Treasury SSP
    Treasury,
    /// Boeing PKI
    Boeing,
    /// Carillon Federal Services
    Carillon,
    /// CertiPath bridge
    CertiPath,
    /// Entrust non-federal issuer
    EntrustNfi,
    /// Exostar
    Exostar,
    /// IdenTrust NFI
    IdenTrust,
    /// Lockheed Martin PKI
    LockheedMartin,
    /// Netherlands Ministry of Defence
    NlMod,
    /// Northrop Grumman PKI
    NorthropGrumman,
    /// ORC non-federal issuer
    OrcNfi,
    /// Raytheon PKI
    Raytheon,
    /// Symantec non-federal issuer
    SymantecNfi,
    /// TSCP bridge
    Tscp,
    /// Verizon Business non-federal issuer
    VerizonNfi,
    /// Australian Defence Organisation
    AustralianDefence,
    /// Deployment-specific policy added through configuration
    Custom,
}

impl PolicyIssuer {
    /// Human-readable issuer name.
    pub fn description(&self) -> &'static str {
        match self {
            Self::Dod => "DoD PKI",
            Self::Eca => "ECA",
            Self::FederalPki => "Federal PKI",
            Self::DepartmentOfState => "Department of State PKI",
            Self::Treasury => "U.S. Treasury SSP",
            Self::Boeing => "Boeing PKI",
            Self::Carillon => "Carillon Federal Services PKI",
            Self::CertiPath => "CertiPath Bridge",
            Self::EntrustNfi => "Entrust Non-Federal Issuer",
            Self::Exostar => "Exostar PKI",
            Self::IdenTrust => "IdenTrust NFI",
            Self::LockheedMartin => "Lockheed Martin PKI",
            Self::NlMod => "NL MoD PKI",
            Self::NorthropGrumman => "Northrop Grumman PKI",
            Self::OrcNfi => "ORC NFI",
            Self::Raytheon => "Raytheon PKI",
            Self::SymantecNfi => "Symantec NFI",
            Self::Tscp => "TSCP Bridge",
            Self::VerizonNfi => "Verizon Business NFI",
            Self::AustralianDefence => "Australian Defence Organisation PKI",
            Self::Custom => "Custom",
        }
    }
}

impl std::fmt::Display for PolicyIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.description())
    }
}

/// A single accepted policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AcceptedPolicy {
    /// Policy OID
    pub oid: ObjectIdentifier,
    /// Symbolic policy name as published by the issuer
    pub name: &'static str,
    /// Issuing PKI
    pub issuer: PolicyIssuer,
}

impl AcceptedPolicy {
    const fn new(oid: &'static str, name: &'static str, issuer: PolicyIssuer) -> Self {
        Self {
            oid: ObjectIdentifier::new_unwrap(oid),
            name,
            issuer,
        }
    }
}

/// Policies accepted for identity binding, one entry per OID.
pub const ACCEPTED_POLICIES: &[AcceptedPolicy] = &[
    AcceptedPolicy::new("2.16.840.1.101.2.1.11.5", "id-US-dod-medium", PolicyIssuer::Dod),
    AcceptedPolicy::new("2.16.840.1.101.2.1.11.9", "id-US-dod-mediumhardware", PolicyIssuer::Dod),
    AcceptedPolicy::new("2.16.840.1.101.2.1.11.10", "id-US-dod-PIV-Auth", PolicyIssuer::Dod),
    AcceptedPolicy::new("2.16.840.1.101.2.1.11.18", "id-US-dod-medium-2048", PolicyIssuer::Dod),
    AcceptedPolicy::new("2.16.840.1.101.2.1.11.19", "id-US-dod-mediumHardware-2048", PolicyIssuer::Dod),
    AcceptedPolicy::new("2.16.840.1.101.2.1.11.20", "id-US-dod-PIV-Auth-2048", PolicyIssuer::Dod),
    AcceptedPolicy::new("2.16.840.1.101.2.1.11.31", "id-US-dod-peerInterop", PolicyIssuer::Dod),
    AcceptedPolicy::new("2.16.840.1.101.2.1.11.36", "id-US-dod-mediumNPE-112", PolicyIssuer::Dod),
    AcceptedPolicy::new("2.16.840.1.101.2.1.11.37", "id-US-dod-mediumNPE-128", PolicyIssuer::Dod),
    AcceptedPolicy::new("2.16.840.1.101.2.1.11.38", "id-US-dod-mediumNPE-192", PolicyIssuer::Dod),
    AcceptedPolicy::new("2.16.840.1.101.2.1.11.39", "id-US-dod-medium-112", PolicyIssuer::Dod),
    AcceptedPolicy::new("2.16.840.1.101.2.1.11.40", "id-US-dod-medium-128", PolicyIssuer::Dod),
    AcceptedPolicy::new("2.16.840.1.101.2.1.11.41", "id-US-dod-medium-192", PolicyIssuer::Dod),
    AcceptedPolicy::new("2.16.840.1.101.2.1.11.42", "id-US-dod-mediumHardware-112", PolicyIssuer::Dod),
    AcceptedPolicy::new("2.16.840.1.101.2.1.11.43", "id-US-dod-mediumHardware-128", PolicyIssuer::Dod),
    AcceptedPolicy::new("2.16.840.1.101.2.1.11.44", "id-US-dod-mediumHardware-192", PolicyIssuer::Dod),
    AcceptedPolicy::new("2.16.840.1.101.2.1.11.59", "id-US-dod-admin", PolicyIssuer::Dod),
    AcceptedPolicy::new("2.16.840.1.101.2.1.11.60", "id-US-dod-internalNPE-112", PolicyIssuer::Dod),
    AcceptedPolicy::new("2.16.840.1.101.2.1.11.61", "id-US-dod-internalNPE-128", PolicyIssuer::Dod),
    AcceptedPolicy::new("2.16.840.1.101.2.1.11.62", "id-US-dod-internalNPE-192", PolicyIssuer::Dod),
    AcceptedPolicy::new("2.16.840.1.101.3.2.1.12.1", "id-eca-medium", PolicyIssuer::Eca),
    AcceptedPolicy::new("2.16.840.1.101.3.2.1.12.2", "id-eca-medium-hardware", PolicyIssuer::Eca),
    AcceptedPolicy::new("2.16.840.1.101.3.2.1.12.3", "id-eca-medium-token", PolicyIssuer::Eca),
    AcceptedPolicy::new("2.16.840.1.101.3.2.1.12.4", "id-eca-medium-sha256", PolicyIssuer::Eca),
    AcceptedPolicy::new("2.16.840.1.101.3.2.1.12.5", "id-eca-medium-token-sha256", PolicyIssuer::Eca),
    AcceptedPolicy::new("2.16.840.1.101.3.2.1.12.6", "id-eca-medium-hardware-pivi", PolicyIssuer::Eca),
    AcceptedPolicy::new("2.16.840.1.101.3.2.1.12.8", "id-eca-contentsigning-pivi", PolicyIssuer::Eca),
    AcceptedPolicy::new("2.16.840.1.101.3.2.1.12.9", "id-eca-medium-device-sha256", PolicyIssuer::Eca),
    AcceptedPolicy::new("2.16.840.1.101.3.2.1.12.10", "id-eca-medium-hardware-sha256", PolicyIssuer::Eca),
    AcceptedPolicy::new("2.16.840.1.101.3.2.1.3.4", "id-fpki-certpcy-highAssurance", PolicyIssuer::FederalPki),
    AcceptedPolicy::new("2.16.840.1.101.3.2.1.3.7", "id-fpki-common-hardware", PolicyIssuer::FederalPki),
    AcceptedPolicy::new("2.16.840.1.101.3.2.1.3.12", "id-fpki-certpcy-mediumHardware", PolicyIssuer::FederalPki),
    AcceptedPolicy::new("2.16.840.1.101.3.2.1.3.13", "id-fpki-common-authentication", PolicyIssuer::FederalPki),
    AcceptedPolicy::new("2.16.840.1.101.3.2.1.3.16", "id-fpki-common-High", PolicyIssuer::FederalPki),
    AcceptedPolicy::new("2.16.840.1.101.3.2.1.3.18", "id-fpki-certpcy-pivi-hardware", PolicyIssuer::FederalPki),
    AcceptedPolicy::new("2.16.840.1.101.3.2.1.3.20", "id-fpki-certpcy-pivi-contentSigning", PolicyIssuer::FederalPki),
    AcceptedPolicy::new("2.16.840.1.101.3.2.1.3.36", "id-fpki-common-devicesHardware", PolicyIssuer::FederalPki),
    AcceptedPolicy::new("2.16.840.1.101.3.2.1.3.38", "id-fpki-certpcy-mediumDeviceHardware", PolicyIssuer::FederalPki),
    AcceptedPolicy::new("2.16.840.1.101.3.2.1.3.39", "id-fpki-common-piv-contentSigning", PolicyIssuer::FederalPki),
    AcceptedPolicy::new("2.16.840.1.101.3.2.1.3.24", "id-fpki-SHA1-hardware", PolicyIssuer::FederalPki),
    AcceptedPolicy::new("2.16.840.1.101.3.2.1.6.4", "state-high", PolicyIssuer::DepartmentOfState),
    AcceptedPolicy::new("2.16.840.1.101.3.2.1.6.12", "state-medHW", PolicyIssuer::DepartmentOfState),
    AcceptedPolicy::new("2.16.840.1.101.3.2.1.5.4", "id-treasury-certpcy-mediumhardware", PolicyIssuer::Treasury),
    AcceptedPolicy::new("2.16.840.1.101.3.2.1.5.5", "id-treasury-certpcy-high", PolicyIssuer::Treasury),
    AcceptedPolicy::new("1.3.6.1.4.1.73.15.3.1.5", "id-Boeing-mediumHardware-SHA-1", PolicyIssuer::Boeing),
    AcceptedPolicy::new("1.3.6.1.4.1.73.15.3.1.12", "id-Boeing-mediumHardware-SHA256", PolicyIssuer::Boeing),
    AcceptedPolicy::new("1.3.6.1.4.1.73.15.3.1.16", "id-Boeing-mediumHardware-contentSigning-SHA1", PolicyIssuer::Boeing),
    AcceptedPolicy::new("1.3.6.1.4.1.73.15.3.1.17", "id-Boeing-mediumHardware-contentSigning-SHA256", PolicyIssuer::Boeing),
    AcceptedPolicy::new("1.3.6.1.4.1.45606.3.1.12", "id-carillon_mediumHardware-256", PolicyIssuer::Carillon),
    AcceptedPolicy::new("1.3.6.1.4.1.45606.3.1.20", "id-carillon_AIVHardware", PolicyIssuer::Carillon),
    AcceptedPolicy::new("1.3.6.1.4.1.45606.3.1.22", "id-carillon_AIVContentSigning", PolicyIssuer::Carillon),
    AcceptedPolicy::new("1.3.6.1.4.1.24019.1.1.1.2", "id-certipath-mediumHardware", PolicyIssuer::CertiPath),
    AcceptedPolicy::new("1.3.6.1.4.1.24019.1.1.1.3", "id-certipath-highHardware", PolicyIssuer::CertiPath),
    AcceptedPolicy::new("1.3.6.1.4.1.24019.1.1.1.7", "id-IceCAP-hardware", PolicyIssuer::CertiPath),
    AcceptedPolicy::new("1.3.6.1.4.1.24019.1.1.1.9", "id-IceCAP-contentSigning", PolicyIssuer::CertiPath),
    AcceptedPolicy::new("1.3.6.1.4.1.24019.1.1.1.18", "id-certipath-variant-mediumHardware", PolicyIssuer::CertiPath),
    AcceptedPolicy::new("1.3.6.1.4.1.24019.1.1.1.19", "id-certipath-variant-highHardware", PolicyIssuer::CertiPath),
    AcceptedPolicy::new("2.16.840.1.114027.200.3.10.7.2", "id-emspki-nfssp-medium-hardware", PolicyIssuer::EntrustNfi),
    AcceptedPolicy::new("2.16.840.1.114027.200.3.10.7.4", "id-emspki-nfssp-mediumauthentication", PolicyIssuer::EntrustNfi),
    AcceptedPolicy::new("2.16.840.1.114027.200.3.10.7.6", "id-emspki-nfssp-pivi-hardware", PolicyIssuer::EntrustNfi),
    AcceptedPolicy::new("2.16.840.1.114027.200.3.10.7.9", "id-emspki-nfssp-pivi-contentsigning", PolicyIssuer::EntrustNfi),
    AcceptedPolicy::new("2.16.840.1.114027.200.3.10.7.13", "id-emspki-nfssp-pivi-cardAuth", PolicyIssuer::EntrustNfi),
    AcceptedPolicy::new("2.16.840.1.114027.200.3.10.7.16", "id-emspki-nfssp-medium-devicesHW", PolicyIssuer::EntrustNfi),
    AcceptedPolicy::new("1.3.6.1.4.1.13948.1.1.1.6", "id-exostar-mediumHardware-sha2", PolicyIssuer::Exostar),
    AcceptedPolicy::new("2.16.840.1.113839.0.100.12.1", "id-igc-MediumHardware-SigningCertificate", PolicyIssuer::IdenTrust),
    AcceptedPolicy::new("2.16.840.1.113839.0.100.12.2", "id-igc-MediumHardware-EncryptionCertificate", PolicyIssuer::IdenTrust),
    AcceptedPolicy::new("2.16.840.1.113839.0.100.18.0", "id-igc-pivi-hardware-identity", PolicyIssuer::IdenTrust),
    AcceptedPolicy::new("2.16.840.1.113839.0.100.18.1", "id-igc-pivi-hardware-signing", PolicyIssuer::IdenTrust),
    AcceptedPolicy::new("2.16.840.1.113839.0.100.18.2", "id-igc-pivi-hardware-encryption", PolicyIssuer::IdenTrust),
    AcceptedPolicy::new("2.16.840.1.113839.0.100.20.1", "id-igc-pivi-contentSigning", PolicyIssuer::IdenTrust),
    AcceptedPolicy::new("1.3.6.1.4.1.103.100.1.1.3.3", "id-Lockheed-Martin-mediumAssuranceHardware-sha256", PolicyIssuer::LockheedMartin),
    AcceptedPolicy::new("2.16.528.1.1003.1.2.5.1", "NL MoD Authenticity", PolicyIssuer::NlMod),
    AcceptedPolicy::new("2.16.528.1.1003.1.2.5.2", "NL MoD Irrefutability/signature", PolicyIssuer::NlMod),
    AcceptedPolicy::new("2.16.528.1.1003.1.2.5.3", "NL MoD Confidentiality", PolicyIssuer::NlMod),
    AcceptedPolicy::new("1.3.6.1.4.1.16334.509.2.6", "Northrop Grumman Enterprise Medium Assurance-Hardware", PolicyIssuer::NorthropGrumman),
    AcceptedPolicy::new("1.3.6.1.4.1.16334.509.2.8", "Northrop Grumman Medium Assurance-256 Hardware Token", PolicyIssuer::NorthropGrumman),
    AcceptedPolicy::new("1.3.6.1.4.1.16334.509.2.9", "Northrop Grumman PIV-I Assurance-256 Hardware Token", PolicyIssuer::NorthropGrumman),
    AcceptedPolicy::new("1.3.6.1.4.1.16334.509.2.11", "Northrop Grumman PIV-I Assurance-256 Content Signing", PolicyIssuer::NorthropGrumman),
    AcceptedPolicy::new("1.3.6.1.4.1.3922.1.1.1.12", "id-orc-nfissp-mediumhardware", PolicyIssuer::OrcNfi),
    AcceptedPolicy::new("1.3.6.1.4.1.3922.1.1.1.18", "id-orc-nfissp-pivi-hardware", PolicyIssuer::OrcNfi),
    AcceptedPolicy::new("1.3.6.1.4.1.3922.1.1.1.20", "id-orc-nfissp-pivi-contentSigning", PolicyIssuer::OrcNfi),
    AcceptedPolicy::new("1.3.6.1.4.1.3922.1.1.1.38", "id-orc-nfissp-mediumDevicesHardware", PolicyIssuer::OrcNfi),
    AcceptedPolicy::new("1.3.6.1.4.1.1569.10.1.1", "id-raytheon-SHA1-high", PolicyIssuer::Raytheon),
    AcceptedPolicy::new("1.3.6.1.4.1.1569.10.1.2", "id-raytheon-SHA1-mediumHardware", PolicyIssuer::Raytheon),
    AcceptedPolicy::new("1.3.6.1.4.1.1569.10.1.12", "id-raytheon-SHA256-mediumHardware", PolicyIssuer::Raytheon),
    AcceptedPolicy::new("2.16.840.1.113733.1.7.23.3.1.7", "Non-Federal SSP MediumHardware", PolicyIssuer::SymantecNfi),
    AcceptedPolicy::new("2.16.840.1.113733.1.7.23.3.1.18", "Non-Federal SSP PIV-I Hardware", PolicyIssuer::SymantecNfi),
    AcceptedPolicy::new("2.16.840.1.113733.1.7.23.3.1.20", "Non-Federal SSP PIV-I contentSigning", PolicyIssuer::SymantecNfi),
    AcceptedPolicy::new("2.16.840.1.113733.1.7.23.3.1.36", "Non-Federal SSP mediumDevicesHardware", PolicyIssuer::SymantecNfi),
    AcceptedPolicy::new("1.3.6.1.4.1.38099.1.1.1.2", "id-tscp-MediumHardware", PolicyIssuer::Tscp),
    AcceptedPolicy::new("1.3.6.1.4.1.38099.1.1.1.5", "id-tscp-PIVI", PolicyIssuer::Tscp),
    AcceptedPolicy::new("1.3.6.1.4.1.38099.1.1.1.7", "id-tscp-PIVI-ContentSigning", PolicyIssuer::Tscp),
    AcceptedPolicy::new("1.3.6.1.4.1.23337.1.1.8", "id-Cybertrust-Hardware", PolicyIssuer::VerizonNfi),
    AcceptedPolicy::new("1.3.6.1.4.1.23337.1.1.10", "id-Cybertrust-Authentication", PolicyIssuer::VerizonNfi),
    AcceptedPolicy::new("1.3.6.1.4.1.23337.1.1.11", "Id-Cybertrust-contentSigner", PolicyIssuer::VerizonNfi),
    AcceptedPolicy::new("1.2.36.1.334.1.2.1.2", "ADO Individual Medium Assurance", PolicyIssuer::AustralianDefence),
    AcceptedPolicy::new("1.2.36.1.334.1.2.2.2", "ADO Resource Medium Assurance", PolicyIssuer::AustralianDefence),
];

static STANDARD: Lazy<Arc<PolicyCatalog>> =
    Lazy::new(|| Arc::new(PolicyCatalog::from_entries(ACCEPTED_POLICIES.iter().copied())));

/// Immutable set of accepted certificate policy OIDs.
///
/// Built once and shared; lookups are plain hash-set membership and need no
/// synchronization.
#[derive(Debug, Clone, Default)]
pub struct PolicyCatalog {
    entries: HashMap<ObjectIdentifier, AcceptedPolicy>,
}

impl PolicyCatalog {
    /// The process-wide catalog of [`ACCEPTED_POLICIES`].
    pub fn standard() -> Arc<PolicyCatalog> {
        Arc::clone(&STANDARD)
    }

    /// Build a catalog from explicit entries. Later duplicates are ignored.
    pub fn from_entries(entries: impl IntoIterator<Item = AcceptedPolicy>) -> Self {
        let mut map = HashMap::new();
        for entry in entries {
            map.entry(entry.oid).or_insert(entry);
        }
        Self { entries: map }
    }

    /// Build a catalog containing only the given OIDs.
    pub fn from_oids(oids: impl IntoIterator<Item = ObjectIdentifier>) -> Self {
        Self::from_entries(oids.into_iter().map(custom_entry))
    }

    /// The standard catalog extended with additional OIDs.
    pub fn with_additional(oids: impl IntoIterator<Item = ObjectIdentifier>) -> Self {
        Self::from_entries(
            ACCEPTED_POLICIES
                .iter()
                .copied()
                .chain(oids.into_iter().map(custom_entry)),
        )
    }

    /// Check whether a policy OID is accepted.
    pub fn is_accepted(&self, oid: &ObjectIdentifier) -> bool {
        self.entries.contains_key(oid)
    }

    /// Check whether a dotted-decimal policy OID is accepted.
    ///
    /// Text that is not a valid OID is never accepted.
    pub fn is_accepted_str(&self, oid: &str) -> bool {
        ObjectIdentifier::from_str(oid)
            .map(|oid| self.is_accepted(&oid))
            .unwrap_or(false)
    }

    /// Catalog entry for an OID.
    pub fn entry(&self, oid: &ObjectIdentifier) -> Option<&AcceptedPolicy> {
        self.entries.get(oid)
    }

    /// Number of distinct accepted OIDs.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the catalog is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over all entries (unordered).
    pub fn iter(&self) -> impl Iterator<Item = &AcceptedPolicy> {
        self.entries.values()
    }
}

fn custom_entry(oid: ObjectIdentifier) -> AcceptedPolicy {
    AcceptedPolicy {
        oid,
        name: "custom",
        issuer: PolicyIssuer::Custom,
    }
}
