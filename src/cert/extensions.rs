use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use const_oid::AssociatedOid;
use der::{
    Decode, Encode,
    asn1::{Ia5String, OctetString},
    oid::ObjectIdentifier,
};
use x509_cert::ext::pkix::name::GeneralName;

use super::params::ExtensionParam;
use crate::error::{MkcertError, Result};

/// Trait for converting to and from X.509 extensions.
///
/// This trait provides methods to encode and decode X.509 extension values.
///
/// # Example
/// ```
/// use mkcert::cert::extensions::{SanEntry, SubjectAltName, ToAndFromX509Extension};
/// let san = SubjectAltName { entries: vec![SanEntry::classify("example.com").unwrap()] };
/// let encoded = san.to_x509_extension_value().unwrap();
/// let decoded = SubjectAltName::from_x509_extension_value(&encoded).unwrap();
/// assert_eq!(san, decoded);
/// ```
pub trait ToAndFromX509Extension {
    /// The Object Identifier (OID) for the extension.
    const OID: ObjectIdentifier;

    /// Encodes the extension into a DER-encoded byte vector.
    fn to_x509_extension_value(&self) -> Result<Vec<u8>>;

    /// Decodes the extension from a DER-encoded byte slice.
    fn from_x509_extension_value(extension: &[u8]) -> Result<Self>
    where
        Self: Sized;
}

/// Whether a Subject Alternative Name entry is a host name or an address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SanKind {
    Domain,
    Ip,
}

/// One identity covered by a leaf certificate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SanEntry {
    /// A dNSName, kept exactly as the caller wrote it.
    Domain(String),
    /// An iPAddress, encoded as 4 or 16 octets.
    Ip(IpAddr),
}

impl SanEntry {
    /// Classifies an identity as an IP literal or a domain name.
    ///
    /// Anything the strict `IpAddr` parser accepts (dotted-quad IPv4 or any
    /// RFC 4291 IPv6 text form) becomes an `Ip` entry; everything else is a
    /// `Domain`. Numeric-looking names such as `1.2.3` or `10.0.0.1.nip.io`
    /// stay domains.
    pub fn classify(identity: &str) -> Result<Self> {
        if identity.trim().is_empty() {
            return Err(MkcertError::InvalidInput(
                "domain or IP address must not be empty".to_string(),
            ));
        }

        if let Ok(ip) = identity.parse::<IpAddr>() {
            return Ok(SanEntry::Ip(ip));
        }

        if identity.chars().any(char::is_whitespace) {
            return Err(MkcertError::InvalidInput(format!(
                "domain {identity:?} must not contain whitespace"
            )));
        }
        if !identity.is_ascii() {
            return Err(MkcertError::InvalidInput(format!(
                "domain {identity:?} must be ASCII (use its punycode form)"
            )));
        }
        Ok(SanEntry::Domain(identity.to_owned()))
    }

    pub fn kind(&self) -> SanKind {
        match self {
            SanEntry::Domain(_) => SanKind::Domain,
            SanEntry::Ip(_) => SanKind::Ip,
        }
    }

    fn to_general_name(&self) -> Result<GeneralName> {
        match self {
            SanEntry::Domain(domain) => Ia5String::new(domain)
                .map(GeneralName::DnsName)
                .map_err(|e| MkcertError::InvalidInput(e.to_string())),
            SanEntry::Ip(IpAddr::V4(ip)) => {
                Ok(GeneralName::IpAddress(OctetString::new(ip.octets().to_vec())?))
            }
            SanEntry::Ip(IpAddr::V6(ip)) => {
                Ok(GeneralName::IpAddress(OctetString::new(ip.octets().to_vec())?))
            }
        }
    }

    fn from_general_name(name: &GeneralName) -> Result<Self> {
        match name {
            GeneralName::DnsName(dns) => Ok(SanEntry::Domain(dns.to_string())),
            GeneralName::IpAddress(octets) => {
                let bytes = octets.as_bytes();
                if let Ok(v4) = <[u8; 4]>::try_from(bytes) {
                    Ok(SanEntry::Ip(IpAddr::V4(Ipv4Addr::from(v4))))
                } else if let Ok(v6) = <[u8; 16]>::try_from(bytes) {
                    Ok(SanEntry::Ip(IpAddr::V6(Ipv6Addr::from(v6))))
                } else {
                    Err(MkcertError::ParseError(format!(
                        "iPAddress entry has {} octets",
                        bytes.len()
                    )))
                }
            }
            _ => Err(MkcertError::ParseError(
                "Unsupported general name type".to_string(),
            )),
        }
    }
}

/// Represents the Subject Alternative Name (SAN) extension.
///
/// # Fields
/// * `entries` - Identities in the order the caller listed them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubjectAltName {
    pub entries: Vec<SanEntry>,
}

impl SubjectAltName {
    /// Classifies every identity independently, keeping the input order.
    pub fn from_identities<S: AsRef<str>>(identities: &[S]) -> Result<Self> {
        let entries = identities
            .iter()
            .map(|identity| SanEntry::classify(identity.as_ref()))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { entries })
    }
}

impl ToAndFromX509Extension for SubjectAltName {
    const OID: ObjectIdentifier = x509_cert::ext::pkix::SubjectAltName::OID;

    fn to_x509_extension_value(&self) -> Result<Vec<u8>> {
        let san = x509_cert::ext::pkix::SubjectAltName(
            self.entries
                .iter()
                .map(SanEntry::to_general_name)
                .collect::<Result<Vec<_>>>()?,
        );

        Ok(san.to_der()?)
    }

    fn from_x509_extension_value(extension: &[u8]) -> Result<Self> {
        let san = x509_cert::ext::pkix::SubjectAltName::from_der(extension)
            .map_err(|e| MkcertError::ParseError(e.to_string()))?;
        let entries = san
            .0
            .iter()
            .map(SanEntry::from_general_name)
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { entries })
    }
}

/// Represents the Basic Constraints extension.
///
/// # Fields
/// * `is_ca` - Indicates if the certificate is a CA.
/// * `max_path_length` - The maximum number of intermediate CAs allowed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BasicConstraints {
    pub is_ca: bool,
    pub max_path_length: Option<u8>,
}

impl ToAndFromX509Extension for BasicConstraints {
    const OID: ObjectIdentifier = x509_cert::ext::pkix::BasicConstraints::OID;

    fn to_x509_extension_value(&self) -> Result<Vec<u8>> {
        let bc = x509_cert::ext::pkix::BasicConstraints {
            ca: self.is_ca,
            path_len_constraint: self.max_path_length,
        };

        Ok(bc.to_der()?)
    }

    fn from_x509_extension_value(der_bytes: &[u8]) -> Result<Self> {
        let bc = x509_cert::ext::pkix::BasicConstraints::from_der(der_bytes)
            .map_err(|e| MkcertError::ParseError(e.to_string()))?;
        Ok(Self {
            is_ca: bc.ca,
            max_path_length: bc.path_len_constraint,
        })
    }
}

pub use der::flagset::FlagSet;
use x509_cert::ext::pkix::KeyUsage as X509KeyUsage;
pub use x509_cert::ext::pkix::KeyUsages;

/// Represents the Key Usage extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyUsage(pub FlagSet<KeyUsages>);

impl ToAndFromX509Extension for KeyUsage {
    const OID: ObjectIdentifier = <X509KeyUsage as AssociatedOid>::OID;

    fn to_x509_extension_value(&self) -> Result<Vec<u8>> {
        let ku = X509KeyUsage::from(self.0);
        Ok(ku.to_der()?)
    }

    fn from_x509_extension_value(extension: &[u8]) -> Result<Self> {
        let ku = X509KeyUsage::from_der(extension)
            .map_err(|e| MkcertError::ParseError(e.to_string()))?;
        Ok(Self(ku.0))
    }
}

/// Represents the Extended Key Usage extension.
///
/// Only the TLS purposes are modelled; other purposes found while decoding
/// are ignored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExtendedKeyUsage {
    pub server_auth: bool,
    pub client_auth: bool,
}

impl ToAndFromX509Extension for ExtendedKeyUsage {
    const OID: ObjectIdentifier = x509_cert::ext::pkix::ExtendedKeyUsage::OID;

    fn to_x509_extension_value(&self) -> Result<Vec<u8>> {
        let mut oids = Vec::new();
        if self.server_auth {
            oids.push(const_oid::db::rfc5912::ID_KP_SERVER_AUTH);
        }
        if self.client_auth {
            oids.push(const_oid::db::rfc5912::ID_KP_CLIENT_AUTH);
        }
        let eku = x509_cert::ext::pkix::ExtendedKeyUsage(oids);
        Ok(eku.to_der()?)
    }

    fn from_x509_extension_value(extension: &[u8]) -> Result<Self> {
        let eku = x509_cert::ext::pkix::ExtendedKeyUsage::from_der(extension)
            .map_err(|e| MkcertError::ParseError(e.to_string()))?;
        Ok(Self {
            server_auth: eku.0.contains(&const_oid::db::rfc5912::ID_KP_SERVER_AUTH),
            client_auth: eku.0.contains(&const_oid::db::rfc5912::ID_KP_CLIENT_AUTH),
        })
    }
}

/// A certificate extension together with its criticality.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extension {
    BasicConstraints { is_ca: bool, critical: bool },
    KeyUsage { flags: FlagSet<KeyUsages>, critical: bool },
    ExtendedKeyUsage(ExtendedKeyUsage),
    SubjectAltName(SubjectAltName),
}

impl Extension {
    pub fn critical(&self) -> bool {
        match self {
            Extension::BasicConstraints { critical, .. } | Extension::KeyUsage { critical, .. } => {
                *critical
            }
            Extension::ExtendedKeyUsage(_) | Extension::SubjectAltName(_) => false,
        }
    }

    /// Encodes the extension for inclusion in a certificate.
    pub fn to_param(&self) -> Result<ExtensionParam> {
        let critical = self.critical();
        match self {
            Extension::BasicConstraints { is_ca, .. } => ExtensionParam::from_extension(
                &BasicConstraints {
                    is_ca: *is_ca,
                    max_path_length: None,
                },
                critical,
            ),
            Extension::KeyUsage { flags, .. } => {
                ExtensionParam::from_extension(&KeyUsage(*flags), critical)
            }
            Extension::ExtendedKeyUsage(eku) => ExtensionParam::from_extension(eku, critical),
            Extension::SubjectAltName(san) => ExtensionParam::from_extension(san, critical),
        }
    }

    /// Decodes a certificate extension, returning `None` for extensions this
    /// crate does not issue.
    pub fn from_param(param: &ExtensionParam) -> Result<Option<Self>> {
        let extension = if param.oid == BasicConstraints::OID {
            let bc: BasicConstraints = param.to_extension()?;
            Extension::BasicConstraints {
                is_ca: bc.is_ca,
                critical: param.critical,
            }
        } else if param.oid == KeyUsage::OID {
            let ku: KeyUsage = param.to_extension()?;
            Extension::KeyUsage {
                flags: ku.0,
                critical: param.critical,
            }
        } else if param.oid == ExtendedKeyUsage::OID {
            Extension::ExtendedKeyUsage(param.to_extension()?)
        } else if param.oid == SubjectAltName::OID {
            Extension::SubjectAltName(param.to_extension()?)
        } else {
            return Ok(None);
        };
        Ok(Some(extension))
    }
}

/// Extensions for a root certificate authority.
///
/// The key may only sign certificates: no digitalSignature or
/// keyEncipherment bit is set.
pub fn ca_extensions() -> Vec<Extension> {
    vec![
        Extension::BasicConstraints {
            is_ca: true,
            critical: true,
        },
        Extension::KeyUsage {
            flags: KeyUsages::KeyCertSign.into(),
            critical: true,
        },
    ]
}

/// Extensions for a TLS leaf certificate covering `domains`.
pub fn leaf_extensions<S: AsRef<str>>(domains: &[S]) -> Result<Vec<Extension>> {
    let san = SubjectAltName::from_identities(domains)?;
    tracing::debug!(entries = ?san.entries, "classified subject alternative names");

    Ok(vec![
        Extension::BasicConstraints {
            is_ca: false,
            critical: true,
        },
        Extension::KeyUsage {
            flags: KeyUsages::DigitalSignature | KeyUsages::KeyEncipherment,
            critical: true,
        },
        Extension::ExtendedKeyUsage(ExtendedKeyUsage {
            server_auth: true,
            client_auth: true,
        }),
        Extension::SubjectAltName(san),
    ])
}
