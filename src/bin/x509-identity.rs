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

//! X.509 Identity Command-Line Tool
//!
//! Inspect client certificates the way the registration flow sees them.
//!
//! # Usage
//!
//! ```text
//! x509-identity [OPTIONS] <COMMAND>
//!
//! Commands:
//!   catalog         List accepted certificate policies
//!   inspect         Show subject, issuer and policies of a certificate
//!   resolve         Resolve the registration identity of a certificate chain
//!   check-username  Check a username against the registration rules
//!   config          Print the effective realm configuration
//!
//! Options:
//!   -c, --config <PATH>   Path to configuration file
//!   -v, --verbose         Enable verbose output
//!   -h, --help            Print help
//!   -V, --version         Print version
//! ```
//!
//! # Examples
//!
//! ```bash
//! # Which identity would this CAC register as?
//! x509-identity resolve --config realm.toml client-chain.pem
//!
//! # Is the leaf policy accepted?
//! x509-identity inspect client.pem
//! ```

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use usg_x509_registration::config::{ConfigLoader, RealmSettings};
use usg_x509_registration::logging::{self, LogConfig, LogLevel};
use usg_x509_registration::pki::{name, policy_ids, CertificateChain, PolicyCatalog};
use usg_x509_registration::registration::validate_username;
use usg_x509_registration::{IdentityError, Result};

/// X.509 Identity Command-Line Tool
#[derive(Parser)]
#[command(name = "x509-identity")]
#[command(author = "U.S. Federal Government")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Certificate identity resolution for CAC/PIV registration", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List accepted certificate policies
    Catalog {
        /// Only list policies whose issuer contains this text
        #[arg(long, value_name = "ISSUER")]
        issuer: Option<String>,
    },

    /// Show subject, issuer and policies of a certificate
    Inspect {
        /// PEM file (first certificate is used)
        #[arg(value_name = "PEM")]
        path: PathBuf,
    },

    /// Resolve the registration identity of a certificate chain
    Resolve {
        /// PEM file with the chain, leaf first
        #[arg(value_name = "PEM")]
        path: PathBuf,
    },

    /// Check a username against the registration rules
    CheckUsername {
        /// Username to check
        username: String,
    },

    /// Print the effective realm configuration
    Config,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = if cli.verbose {
        LogLevel::Debug
    } else {
        LogLevel::Warn
    };
    if let Err(e) = logging::init(&LogConfig::default().with_level(level)) {
        eprintln!("{}", e);
    }

    match run_command(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run_command(cli: Cli) -> Result<ExitCode> {
    match cli.command {
        Commands::Catalog { issuer } => cmd_catalog(cli.config.as_deref(), issuer.as_deref()),
        Commands::Inspect { path } => cmd_inspect(cli.config.as_deref(), &path),
        Commands::Resolve { path } => cmd_resolve(cli.config.as_deref(), &path),
        Commands::CheckUsername { username } => Ok(cmd_check_username(&username)),
        Commands::Config => cmd_config(cli.config.as_deref()),
    }
}

fn load_settings(path: Option<&Path>) -> Result<RealmSettings> {
    let loader = match path {
        Some(path) => ConfigLoader::new().with_path(path),
        None => ConfigLoader::new(),
    };
    loader.load()
}

fn load_chain(path: &Path) -> Result<CertificateChain> {
    let pem = std::fs::read(path)?;
    let chain = CertificateChain::from_pem(pem)?;
    if chain.is_empty() {
        return Err(IdentityError::certificate_parsing(format!(
            "no certificate in {}",
            path.display()
        )));
    }
    Ok(chain)
}

fn cmd_catalog(config: Option<&Path>, issuer: Option<&str>) -> Result<ExitCode> {
    let catalog = match config {
        Some(_) => load_settings(config)?.policy_catalog()?,
        None => PolicyCatalog::standard(),
    };

    let filter = issuer.map(str::to_lowercase);
    let mut entries: Vec<_> = catalog
        .iter()
        .filter(|entry| {
            filter.as_deref().map_or(true, |f| {
                entry.issuer.description().to_lowercase().contains(f)
            })
        })
        .collect();
    entries.sort_by_key(|entry| (entry.issuer.description(), entry.oid.to_string()));

    for entry in &entries {
        println!("{:<34} {:<48} {}", entry.oid.to_string(), entry.name, entry.issuer);
    }
    println!();
    println!("{} accepted policies", entries.len());

    Ok(ExitCode::SUCCESS)
}

fn cmd_inspect(config: Option<&Path>, path: &Path) -> Result<ExitCode> {
    let settings = load_settings(config)?;
    let catalog = settings.policy_catalog()?;
    let chain = load_chain(path)?;
    let Some(leaf) = chain.leaf() else {
        return Ok(ExitCode::FAILURE);
    };
    let tbs = &leaf.tbs_certificate;

    println!("Certificate:");
    println!("  Subject: {}", name::format_dn(&tbs.subject));
    println!("  Issuer:  {}", name::format_dn(&tbs.issuer));
    println!("  Serial:  {}", hex::encode(tbs.serial_number.as_bytes()));
    println!("  Chain:   {} certificate(s)", chain.len());

    let policies = policy_ids(leaf);
    println!();
    println!("Policies:");
    if policies.is_empty() {
        println!("  (none)");
    }
    for (slot, oid) in policies.iter().enumerate() {
        let verdict = match catalog.entry(oid) {
            Some(entry) => format!("accepted ({}, {})", entry.name, entry.issuer),
            None => "not accepted".to_string(),
        };
        let marker = if slot < settings.x509.max_policies_to_check {
            ""
        } else {
            " [beyond inspected slots]"
        };
        println!("  [{}] {} {}{}", slot, oid, verdict, marker);
    }

    Ok(ExitCode::SUCCESS)
}

fn cmd_resolve(config: Option<&Path>, path: &Path) -> Result<ExitCode> {
    let settings = load_settings(config)?;
    let resolver = settings.resolver()?;
    let chain = load_chain(path)?;

    match resolver.resolve(&chain, &settings.authenticators, "cli") {
        Some(identity) => {
            println!("{}", identity);
            Ok(ExitCode::SUCCESS)
        }
        None => {
            eprintln!("No certificate identity");
            Ok(ExitCode::FAILURE)
        }
    }
}

fn cmd_check_username(username: &str) -> ExitCode {
    if username.trim().is_empty() {
        println!("Username is required.");
        return ExitCode::FAILURE;
    }

    let errors = validate_username(username);
    if errors.is_empty() {
        println!("'{}' is a valid username", username);
        return ExitCode::SUCCESS;
    }

    for error in errors {
        println!("{}", error.message);
    }
    ExitCode::FAILURE
}

fn cmd_config(config: Option<&Path>) -> Result<ExitCode> {
    let settings = load_settings(config)?;
    print!("{}", settings.to_toml()?);
    Ok(ExitCode::SUCCESS)
}
