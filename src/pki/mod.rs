// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 U.S. Federal Government (in countries where recognized)

//! Certificate-level building blocks.
//!
//! # Overview
//!
//! - [`PolicyCatalog`]: the accepted assurance-level policy OIDs
//! - [`policy_id`] / [`extract_policy_id`]: positional access to the
//!   certificate policies extension (2.5.29.32)
//! - [`CertificateChain`]: the client chain, leaf first
//! - [`name`]: Distinguished Name formatting and attribute lookup
//!
//! ## Certificate Policies
//!
//! DoD certificates assert one or more policy OIDs under the arc
//! **2.16.840.1.101.2.1.11**; Federal PKI and bridge members use their own
//! arcs. DoD CACs typically carry one or two policies, so positional access
//! with a small bound covers real certificates.

pub mod catalog;
pub mod chain;
pub mod name;
pub mod policy;

pub use catalog::{AcceptedPolicy, PolicyCatalog, PolicyIssuer, ACCEPTED_POLICIES};
pub use chain::CertificateChain;
pub use policy::{extract_policy_id, policy_id, policy_ids, CERTIFICATE_POLICIES_OID};
