// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 U.S. Federal Government (in countries where recognized)

//! Certificate identity derivation.
//!
//! - [`X509IdentityResolver`]: accepted-policy gate plus rule selection
//! - [`IdentityExtractor`]: one configured extraction rule
//! - [`ResolvedIdentity`]: the resulting non-empty identity string

pub mod extractor;
mod resolver;

pub use extractor::{IdentityExtractor, IdentitySource};
pub use resolver::{
    PolicyMatch, ResolvedIdentity, X509IdentityResolver, DEFAULT_MAX_POLICIES_TO_CHECK,
};
