//! Issuing a development CA and the TLS certificates it signs.
//!
//! Every call is independent: a fresh key pair and serial number are drawn,
//! and the result is returned whole or not at all.

use bon::Builder;
use rand_core::{CryptoRngCore, OsRng};

use crate::cert::extensions::{ca_extensions, leaf_extensions};
use crate::cert::params::{Validity, build_ca_subject, build_leaf_subject};
use crate::cert::{CertificatePem, CertifiedKey};
use crate::error::{MkcertError, Result};
use crate::issuer::{CertificationRequest, sign};
use crate::key::{DEFAULT_RSA_BITS, KeyPair};
use crate::serial::SerialNumberPolicy;

/// Parameters for a root certificate authority.
///
/// # Fields
/// * `organization` - Common name and organization of the CA.
/// * `country_code` - Two-letter country code.
/// * `state` - State or province.
/// * `locality` - City or locality.
/// * `validity_days` - Lifetime of the CA certificate.
/// * `key_bits` - RSA modulus size.
/// * `serial_policy` - Serial number width.
#[derive(Clone, Debug, Builder)]
pub struct CaParams {
    #[builder(into, default = String::from("Test CA"))]
    pub organization: String,
    #[builder(into, default = String::from("US"))]
    pub country_code: String,
    #[builder(into, default = String::from("California"))]
    pub state: String,
    #[builder(into, default = String::from("San Francisco"))]
    pub locality: String,
    #[builder(default = 365)]
    pub validity_days: i64,
    #[builder(default = DEFAULT_RSA_BITS)]
    pub key_bits: usize,
    #[builder(default)]
    pub serial_policy: SerialNumberPolicy,
}

impl Default for CaParams {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// Parameters for a TLS leaf certificate.
///
/// `domains` lists host names and IP literals; the first one becomes the
/// common name and all of them go into the Subject Alternative Name.
#[derive(Clone, Debug, Builder)]
pub struct LeafParams {
    pub domains: Vec<String>,
    #[builder(default = 365)]
    pub validity_days: i64,
    #[builder(into)]
    pub organization: Option<String>,
    #[builder(into)]
    pub email: Option<String>,
    #[builder(default = DEFAULT_RSA_BITS)]
    pub key_bits: usize,
    #[builder(default)]
    pub serial_policy: SerialNumberPolicy,
}

/// Creates a self-signed CA using the operating system's random source.
pub fn create_ca(params: &CaParams) -> Result<CertificatePem> {
    create_ca_with_rng(&mut OsRng, params)
}

pub fn create_ca_with_rng<R: CryptoRngCore + ?Sized>(
    rng: &mut R,
    params: &CaParams,
) -> Result<CertificatePem> {
    issue_ca(rng, params)?.to_pem()
}

/// Creates a leaf certificate signed by `ca`, using the operating system's
/// random source.
pub fn create_cert(params: &LeafParams, ca: &CertificatePem) -> Result<CertificatePem> {
    create_cert_with_rng(&mut OsRng, params, ca)
}

/// Creates a leaf certificate signed by the CA given as PEM text.
///
/// # Errors
/// * `ParseError` - the CA key or certificate cannot be parsed.
/// * `SigningError` - the CA key does not belong to the CA certificate.
/// * `InvalidInput` - the CA certificate is not a CA, or the parameters are invalid.
pub fn create_cert_with_rng<R: CryptoRngCore + ?Sized>(
    rng: &mut R,
    params: &LeafParams,
    ca: &CertificatePem,
) -> Result<CertificatePem> {
    let ca = CertifiedKey::from_pem(ca)?;
    issue_leaf(rng, params, &ca)?.to_pem()
}

/// Issues a self-signed CA certificate and returns it with its key.
pub fn issue_ca<R: CryptoRngCore + ?Sized>(rng: &mut R, params: &CaParams) -> Result<CertifiedKey> {
    let subject = build_ca_subject(
        &params.organization,
        &params.country_code,
        &params.state,
        &params.locality,
    )?;
    // Reject a bad window before paying for key generation.
    Validity::for_days(params.validity_days)?;

    let key = KeyPair::generate(rng, params.key_bits)?;
    let request = CertificationRequest::builder()
        .issuer(subject.as_x509_name()?)
        .subject(subject)
        .extensions(ca_extensions())
        .validity_days(params.validity_days)
        .serial_policy(params.serial_policy)
        .build();

    let ca = sign(rng, &request, key, None)?;
    tracing::info!(
        subject = %request.subject,
        validity_days = params.validity_days,
        "created certificate authority"
    );
    Ok(ca)
}

/// Issues a TLS leaf certificate signed by `ca`.
pub fn issue_leaf<R: CryptoRngCore + ?Sized>(
    rng: &mut R,
    params: &LeafParams,
    ca: &CertifiedKey,
) -> Result<CertifiedKey> {
    if !ca.cert.is_ca()? {
        return Err(MkcertError::InvalidInput(
            "issuer certificate is not a certificate authority".to_string(),
        ));
    }

    let subject = build_leaf_subject(
        &params.domains,
        params.organization.as_deref(),
        params.email.as_deref(),
    )?;
    let extensions = leaf_extensions(&params.domains)?;
    Validity::for_days(params.validity_days)?;

    let key = KeyPair::generate(rng, params.key_bits)?;
    let request = CertificationRequest::builder()
        .subject(subject)
        .issuer(ca.cert.subject_name().clone())
        .extensions(extensions)
        .validity_days(params.validity_days)
        .serial_policy(params.serial_policy)
        .build();

    let leaf = sign(rng, &request, key, Some(&ca.key))?;
    tracing::info!(
        subject = %request.subject,
        issuer = %request.issuer,
        domains = ?params.domains,
        validity_days = params.validity_days,
        "created certificate"
    );
    Ok(leaf)
}
