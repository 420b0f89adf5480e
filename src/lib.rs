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

//! # usg-x509-registration
//!
//! X.509/CAC certificate identity for identity-provider registration flows.
//!
//! Given the client certificate chain of a request, this library decides
//! whether the leaf certificate carries an accepted assurance-level policy,
//! derives a stable identity string from it using the realm's configured
//! extraction rule, and reconciles that identity with existing accounts to
//! pick the registration steps a user must complete.
//!
//! ## Features
//!
//! - **Policy catalog** of DoD, ECA, Federal PKI and bridge assurance OIDs
//! - **Identity extraction** from subject/issuer DN, e-mail, UPN, serial
//!   number, thumbprint or the full certificate
//! - **Registration form actions** with accumulated field validation
//! - **Confirm-identity required action** for existing accounts
//! - **TOML realm configuration** and `tracing` based logging
//!
//! ## Quick Start
//!
//! ```no_run
//! use usg_x509_registration::config::ConfigLoader;
//! use usg_x509_registration::pki::CertificateChain;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let settings = ConfigLoader::new().load()?;
//!     let resolver = settings.resolver()?;
//!
//!     let chain = CertificateChain::from_pem(std::fs::read("client.pem")?)?;
//!     match resolver.resolve(&chain, &settings.authenticators, "session-1") {
//!         Some(identity) => println!("{}", identity),
//!         None => println!("no certificate identity"),
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Registration
//!
//! ```no_run
//! use std::sync::Arc;
//! use usg_x509_registration::config::RealmSettings;
//! use usg_x509_registration::pki::CertificateChain;
//! use usg_x509_registration::realm::Realm;
//! use usg_x509_registration::registration::{FormContext, RegistrationFlow, RegistrationForm};
//! use usg_x509_registration::store::{AuthenticationSession, InMemoryUserStore};
//!
//! # fn example(chain: CertificateChain) -> usg_x509_registration::Result<()> {
//! let store = Arc::new(InMemoryUserStore::new().with_unique_attribute("usercertificate"));
//! let realm = Realm::new(RealmSettings::default(), store)?;
//! let session = AuthenticationSession::new("session-1");
//! let form = RegistrationForm::from_pairs([
//!     ("username", "jdoe"),
//!     ("email", "jdoe@example.mil"),
//! ]);
//!
//! let ctx = FormContext::new(&realm, &session, &chain, &form);
//! let outcome = RegistrationFlow::standard().register(&ctx)?;
//! # let _ = outcome;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod config;
pub mod error;
pub mod identity;
pub mod logging;
pub mod pki;
pub mod realm;
pub mod registration;
pub mod required_action;
pub mod store;

pub use config::{AuthenticatorConfig, ConfigLoader, RealmSettings};
pub use error::{IdentityError, Result};
pub use identity::{IdentityExtractor, IdentitySource, ResolvedIdentity, X509IdentityResolver};
pub use pki::{CertificateChain, PolicyCatalog};
pub use realm::Realm;
pub use registration::{RegistrationFlow, RegistrationReconciler};
pub use required_action::{RequiredActionProvider, UpdateX509};
pub use store::{InMemoryUserStore, RequiredAction, UserAccount, UserStore};

// Re-export x509-cert types that appear in the public API
pub use x509_cert::Certificate;

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
