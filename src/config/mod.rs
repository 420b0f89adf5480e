// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 U.S. Federal Government (in countries where recognized)

//! Realm configuration.
//!
//! Settings are read from a TOML file located by [`ConfigLoader`]. Every
//! section has defaults, so an empty file (or no file at all) yields a
//! working configuration with the standard policy catalog and no identity
//! extraction rule.

mod loader;
mod realm;

pub use loader::{ConfigLoader, CONFIG_ENV_VAR};
pub use realm::{
    AuthenticatorConfig, PasswordSettings, RealmSettings, RegistrationSettings, X509Settings,
    DEFAULT_ACTIVE_IDENTITY_ATTRIBUTE, DEFAULT_IDENTITY_ATTRIBUTE, DEFAULT_SECONDARY_ID_ATTRIBUTE,
};
