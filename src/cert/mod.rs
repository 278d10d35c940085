pub mod extensions;
pub mod params;

use der::asn1::Any;
use der::{Decode, DecodePem, Encode, EncodePem, Tag};
use extensions::{Extension, SanEntry};
use params::{DistinguishedName, Validity};
use x509_cert::certificate::CertificateInner;
use x509_cert::name::Name;
use x509_cert::spki::AlgorithmIdentifierOwned;

use crate::error::{MkcertError, Result};
use crate::key::{KeyPair, PublicKey};
use crate::tbs_certificate::TbsCertificate;

/// Represents the supported signature algorithms for certificates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignatureAlgorithm {
    /// SHA-256 with RSA encryption (RSASSA-PKCS1-v1_5).
    Sha256WithRSA,
}

impl From<SignatureAlgorithm> for AlgorithmIdentifierOwned {
    /// Converts a `SignatureAlgorithm` into an `AlgorithmIdentifierOwned`.
    ///
    /// RFC 4055 requires explicit NULL parameters for the PKCS#1 v1.5 family.
    fn from(value: SignatureAlgorithm) -> Self {
        match value {
            SignatureAlgorithm::Sha256WithRSA => AlgorithmIdentifierOwned {
                oid: const_oid::db::rfc5912::SHA_256_WITH_RSA_ENCRYPTION,
                parameters: Any::new(Tag::Null, Vec::<u8>::new()).ok(),
            },
        }
    }
}

impl TryFrom<&AlgorithmIdentifierOwned> for SignatureAlgorithm {
    type Error = MkcertError;

    fn try_from(value: &AlgorithmIdentifierOwned) -> Result<Self> {
        match value.oid {
            const_oid::db::rfc5912::SHA_256_WITH_RSA_ENCRYPTION => {
                Ok(SignatureAlgorithm::Sha256WithRSA)
            }
            other => Err(MkcertError::ParseError(format!(
                "Unsupported signature algorithm {other}"
            ))),
        }
    }
}

/// Represents an X.509 certificate.
#[derive(Debug, Clone)]
pub struct Certificate {
    /// The inner representation of the certificate.
    pub inner: CertificateInner,
}

impl Certificate {
    /// Encodes the certificate into DER format.
    pub fn to_der(&self) -> Result<Vec<u8>> {
        self.inner
            .to_der()
            .map_err(|e| MkcertError::EncodingError(e.to_string()))
    }

    /// Encodes the certificate into PEM format.
    pub fn to_pem(&self) -> Result<String> {
        self.inner
            .to_pem(pkcs8::LineEnding::LF)
            .map_err(|e| MkcertError::EncodingError(e.to_string()))
    }

    pub fn from_der(der: &[u8]) -> Result<Self> {
        let inner = CertificateInner::from_der(der)
            .map_err(|e| MkcertError::ParseError(format!("certificate: {e}")))?;
        Ok(Self { inner })
    }

    /// Parses a single `CERTIFICATE` PEM block.
    pub fn from_pem(pem: &str) -> Result<Self> {
        let inner = CertificateInner::from_pem(pem.trim())
            .map_err(|e| MkcertError::ParseError(format!("certificate: {e}")))?;
        Ok(Self { inner })
    }

    /// Extracts the to-be-signed fields into a `TbsCertificate`.
    pub fn tbs(&self) -> Result<TbsCertificate> {
        TbsCertificate::from_tbs_certificate_inner(&self.inner.tbs_certificate)
    }

    pub fn subject(&self) -> Result<DistinguishedName> {
        DistinguishedName::from_x509_name(&self.inner.tbs_certificate.subject)
    }

    /// The subject exactly as encoded, including attributes
    /// `DistinguishedName` does not model.
    pub fn subject_name(&self) -> &Name {
        &self.inner.tbs_certificate.subject
    }

    pub fn issuer(&self) -> Result<DistinguishedName> {
        DistinguishedName::from_x509_name(&self.inner.tbs_certificate.issuer)
    }

    /// Serial number as minimal big-endian bytes.
    pub fn serial_number(&self) -> Result<Vec<u8>> {
        Ok(self.tbs()?.serial_number)
    }

    pub fn validity(&self) -> Result<Validity> {
        Validity::from_x509_validity(&self.inner.tbs_certificate.validity)
    }

    pub fn public_key(&self) -> Result<PublicKey> {
        PublicKey::from_x509spki(&self.inner.tbs_certificate.subject_public_key_info)
    }

    /// Decodes the extensions this crate issues, in certificate order.
    pub fn extensions(&self) -> Result<Vec<Extension>> {
        let mut decoded = Vec::new();
        for param in self.tbs()?.extensions {
            if let Some(extension) = Extension::from_param(&param)? {
                decoded.push(extension);
            }
        }
        Ok(decoded)
    }

    /// Whether BasicConstraints marks this certificate as a CA.
    pub fn is_ca(&self) -> Result<bool> {
        Ok(self
            .extensions()?
            .iter()
            .any(|ext| matches!(ext, Extension::BasicConstraints { is_ca: true, .. })))
    }

    pub fn subject_alt_names(&self) -> Result<Vec<SanEntry>> {
        Ok(self
            .extensions()?
            .into_iter()
            .find_map(|ext| match ext {
                Extension::SubjectAltName(san) => Some(san.entries),
                _ => None,
            })
            .unwrap_or_default())
    }

    /// Checks that this certificate's signature was made by `issuer_key`.
    pub fn verify_signature(&self, issuer_key: &PublicKey) -> Result<()> {
        SignatureAlgorithm::try_from(&self.inner.signature_algorithm)?;
        let tbs_der = self.inner.tbs_certificate.to_der()?;
        issuer_key.verify(&tbs_der, self.inner.signature.raw_bytes())
    }

    /// Checks that `issuer` names and signed this certificate.
    pub fn verify_issued_by(&self, issuer: &Certificate) -> Result<()> {
        if self.inner.tbs_certificate.issuer != issuer.inner.tbs_certificate.subject {
            return Err(MkcertError::SigningError(
                "issuer name does not match the CA subject".to_string(),
            ));
        }
        self.verify_signature(&issuer.public_key()?)
    }
}

/// PEM text of a private key and its certificate, as handed to and
/// received from file I/O.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertificatePem {
    pub private_key: String,
    pub certificate: String,
}

/// A certificate together with the private key for its public key.
#[derive(Debug, Clone)]
pub struct CertifiedKey {
    pub cert: Certificate,
    pub key: KeyPair,
}

impl CertifiedKey {
    /// Parses a PEM key and certificate, checking that they belong together.
    pub fn from_pem(pem: &CertificatePem) -> Result<Self> {
        let key = KeyPair::from_pem(&pem.private_key)?;
        let cert = Certificate::from_pem(&pem.certificate)?;
        if &cert.public_key()? != key.public_key() {
            return Err(MkcertError::SigningError(
                "private key does not match the certificate's public key".to_string(),
            ));
        }
        Ok(Self { cert, key })
    }

    pub fn to_pem(&self) -> Result<CertificatePem> {
        Ok(CertificatePem {
            private_key: self.key.to_pem()?,
            certificate: self.cert.to_pem()?,
        })
    }
}
