// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 U.S. Federal Government (in countries where recognized)

//! Distinguished Name helpers.

use const_oid::db::rfc4519;
use const_oid::ObjectIdentifier;
use x509_cert::name::Name;

/// emailAddress (PKCS#9)
pub const EMAIL_ADDRESS: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.113549.1.9.1");

const SHORT_NAMES: &[(ObjectIdentifier, &str)] = &[
    (rfc4519::CN, "CN"),
    (EMAIL_ADDRESS, "E"),
    (rfc4519::OU, "OU"),
    (rfc4519::O, "O"),
    (rfc4519::L, "L"),
    (rfc4519::ST, "ST"),
    (rfc4519::C, "C"),
    (rfc4519::DC, "DC"),
    (rfc4519::UID, "UID"),
    (rfc4519::SERIAL_NUMBER, "SERIALNUMBER"),
];

/// Format a Distinguished Name for display and pattern matching.
///
/// RDNs are rendered most specific first (`CN=..., OU=..., O=..., C=US`),
/// which is the form identity mapping rules are written against. Attribute
/// types without a short name are rendered as dotted OIDs.
pub fn format_dn(name: &Name) -> String {
    let mut components = Vec::new();

    for rdn in name.0.iter() {
        for atv in rdn.0.iter() {
            let key = short_name(&atv.oid)
                .map(str::to_string)
                .unwrap_or_else(|| atv.oid.to_string());
            let value = String::from_utf8_lossy(atv.value.value());
            components.push(format!("{}={}", key, value));
        }
    }

    components.reverse();
    components.join(", ")
}

/// First value of an attribute type in a Distinguished Name.
///
/// Only string-valued attributes are returned; values that are not valid
/// UTF-8 are skipped.
pub fn attribute_value(name: &Name, oid: &ObjectIdentifier) -> Option<String> {
    name.0
        .iter()
        .flat_map(|rdn| rdn.0.iter())
        .filter(|atv| atv.oid == *oid)
        .find_map(|atv| std::str::from_utf8(atv.value.value()).ok().map(str::to_string))
}

/// Common Name of a Distinguished Name.
pub fn common_name(name: &Name) -> Option<String> {
    attribute_value(name, &rfc4519::CN)
}

fn short_name(oid: &ObjectIdentifier) -> Option<&'static str> {
    SHORT_NAMES
        .iter()
        .find(|(known, _)| known == oid)
        .map(|(_, short)| *short)
}
