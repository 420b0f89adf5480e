// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 U.S. Federal Government (in countries where recognized)

//! Client certificate chain as handed over by the TLS termination layer.

use crate::error::{IdentityError, Result};
use der::{Decode, DecodePem};
use x509_cert::Certificate;

/// Ordered client certificate chain.
///
/// Index 0 is the leaf (end-entity) certificate presented by the client; the
/// remaining certificates are its issuers. Chain-of-trust, signature and
/// revocation checks are the TLS layer's job and have already happened by the
/// time a chain reaches this crate.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CertificateChain {
    certs: Vec<Certificate>,
}

impl CertificateChain {
    /// Create a chain from already-parsed certificates (leaf first).
    pub fn new(certs: Vec<Certificate>) -> Self {
        Self { certs }
    }

    /// An empty chain, for requests without a client certificate.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Parse a chain from DER-encoded certificates (leaf first).
    pub fn from_der<T: AsRef<[u8]>>(certs: &[T]) -> Result<Self> {
        let certs = certs
            .iter()
            .enumerate()
            .map(|(i, der)| {
                Certificate::from_der(der.as_ref()).map_err(|e| {
                    IdentityError::certificate_parsing(format!("certificate {}: {}", i, e))
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { certs })
    }

    /// Parse a chain from concatenated PEM blocks (leaf first).
    pub fn from_pem(pem: impl AsRef<[u8]>) -> Result<Self> {
        let pem = pem.as_ref();
        if pem.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self::empty());
        }
        let certs = Certificate::load_pem_chain(pem)
            .map_err(|e| IdentityError::certificate_parsing(format!("PEM chain: {}", e)))?;
        Ok(Self { certs })
    }

    /// Parse a single PEM certificate as a one-element chain.
    pub fn from_single_pem(pem: impl AsRef<[u8]>) -> Result<Self> {
        let cert = Certificate::from_pem(pem.as_ref())
            .map_err(|e| IdentityError::certificate_parsing(format!("PEM certificate: {}", e)))?;
        Ok(Self { certs: vec![cert] })
    }

    /// The leaf certificate, if any.
    pub fn leaf(&self) -> Option<&Certificate> {
        self.certs.first()
    }

    /// Issuer certificates following the leaf.
    pub fn issuers(&self) -> &[Certificate] {
        self.certs.get(1..).unwrap_or_default()
    }

    /// Whether the chain contains no certificates.
    pub fn is_empty(&self) -> bool {
        self.certs.is_empty()
    }

    /// Number of certificates in the chain.
    pub fn len(&self) -> usize {
        self.certs.len()
    }

    /// Iterate over the chain, leaf first.
    pub fn iter(&self) -> impl Iterator<Item = &Certificate> {
        self.certs.iter()
    }

    /// All certificates, leaf first.
    pub fn as_slice(&self) -> &[Certificate] {
        &self.certs
    }
}

impl From<Vec<Certificate>> for CertificateChain {
    fn from(certs: Vec<Certificate>) -> Self {
        Self::new(certs)
    }
}
