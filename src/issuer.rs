use bon::Builder;
use der::Encode;
use der::asn1::BitString;
use rand_core::CryptoRngCore;
use x509_cert::certificate::CertificateInner;
use x509_cert::name::Name;

use crate::cert::extensions::Extension;
use crate::cert::params::{DistinguishedName, ExtensionParam, Validity};
use crate::cert::{Certificate, CertifiedKey, SignatureAlgorithm};
use crate::error::{MkcertError, Result};
use crate::key::{KeyPair, PublicKey};
use crate::serial::SerialNumberPolicy;
use crate::tbs_certificate::TbsCertificate;

/// Everything that goes into a certificate apart from key material.
///
/// # Fields
/// * `subject` - The distinguished name of the certificate subject.
/// * `issuer` - The signer's name as encoded in its certificate; the encoding of `subject`
///   when self-signing.
/// * `extensions` - Extensions, written in this order.
/// * `validity_days` - Length of the validity window, starting at issuance.
/// * `serial_policy` - How the random serial number is drawn.
#[derive(Clone, Debug, Builder)]
pub struct CertificationRequest {
    pub subject: DistinguishedName,
    pub issuer: Name,
    #[builder(default)]
    pub extensions: Vec<Extension>,
    pub validity_days: i64,
    #[builder(default)]
    pub serial_policy: SerialNumberPolicy,
}

/// Builds and signs a certificate for `subject_key`.
///
/// When `signing_key` is `None` the certificate is self-signed with
/// `subject_key`; otherwise it is signed with the supplied issuer key. The
/// result always carries `subject_key`, never the key that signed it.
///
/// # Errors
/// * `InvalidInput` - `validity_days` is not positive.
/// * `ValidityError` - the validity window cannot be encoded.
/// * `SigningError` - the signature could not be produced.
pub fn sign<R: CryptoRngCore + ?Sized>(
    rng: &mut R,
    request: &CertificationRequest,
    subject_key: KeyPair,
    signing_key: Option<&KeyPair>,
) -> Result<CertifiedKey> {
    let validity = Validity::for_days(request.validity_days)?;
    let extensions = request
        .extensions
        .iter()
        .map(Extension::to_param)
        .collect::<Result<Vec<ExtensionParam>>>()?;
    let serial_number = request.serial_policy.allocate(rng);

    let tbs_cert = TbsCertificate {
        serial_number,
        signature_algorithm: SignatureAlgorithm::Sha256WithRSA,
        issuer: request.issuer.clone(),
        validity,
        subject: request.subject.as_x509_name()?,
        subject_public_key: PublicKey::from_key_pair(&subject_key),
        extensions,
    };
    let tbs_cert_inner = tbs_cert.to_tbs_certificate_inner()?;

    let signer = signing_key.unwrap_or(&subject_key);
    let signature = signer.sign_data(&tbs_cert_inner.to_der()?)?;

    let cert_inner = CertificateInner {
        tbs_certificate: tbs_cert_inner,
        signature_algorithm: SignatureAlgorithm::Sha256WithRSA.into(),
        signature: BitString::from_bytes(&signature)
            .map_err(|e| MkcertError::SigningError(e.to_string()))?,
    };

    tracing::debug!(
        subject = %request.subject,
        issuer = %request.issuer,
        self_signed = signing_key.is_none(),
        serial = %hex_serial(&tbs_cert.serial_number),
        not_after = %tbs_cert.validity.not_after,
        "signed certificate"
    );

    Ok(CertifiedKey {
        cert: Certificate { inner: cert_inner },
        key: subject_key,
    })
}

fn hex_serial(serial: &[u8]) -> String {
    serial.iter().map(|b| format!("{b:02x}")).collect()
}
