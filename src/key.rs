use std::fmt;

use der::Encode;
use rand_core::CryptoRngCore;
use rsa::pkcs1::{DecodeRsaPrivateKey, EncodeRsaPrivateKey};
use rsa::pkcs1v15::{Signature, SigningKey, VerifyingKey};
use rsa::pkcs8::{DecodePrivateKey, DecodePublicKey, LineEnding};
use rsa::signature::{SignatureEncoding, Signer, Verifier};
use rsa::traits::PublicKeyParts;
use rsa::{RsaPrivateKey, RsaPublicKey};
use sha2::Sha256;
use x509_cert::spki::SubjectPublicKeyInfoOwned;

use crate::error::{MkcertError, Result};

/// Smallest modulus accepted for generated keys.
pub const MIN_RSA_BITS: usize = 2048;

/// Modulus size used when the caller does not pick one.
pub const DEFAULT_RSA_BITS: usize = 2048;

/// An RSA key pair owned by the caller.
///
/// The pair is produced in one step by [`KeyPair::generate`] or
/// [`KeyPair::from_pem`] and never changes afterwards.
#[derive(Clone)]
pub struct KeyPair {
    private: Box<RsaPrivateKey>,
    public: PublicKey,
}

impl KeyPair {
    /// Generate an RSA key pair with the specified number of bits.
    ///
    /// # Arguments
    /// * `rng` - A cryptographically secure random source.
    /// * `bits` - The modulus size, at least [`MIN_RSA_BITS`].
    pub fn generate<R: CryptoRngCore + ?Sized>(rng: &mut R, bits: usize) -> Result<Self> {
        if bits < MIN_RSA_BITS {
            return Err(MkcertError::InvalidInput(format!(
                "RSA keys must be at least {MIN_RSA_BITS} bits, got {bits}"
            )));
        }

        tracing::debug!(bits, "generating RSA key pair");
        let private = RsaPrivateKey::new(rng, bits)?;
        Ok(Self::from_private(private))
    }

    fn from_private(private: RsaPrivateKey) -> Self {
        let public = PublicKey(RsaPublicKey::from(&private));
        KeyPair {
            private: Box::new(private),
            public,
        }
    }

    /// Import a private key from PEM, either PKCS#1 (`RSA PRIVATE KEY`) or
    /// PKCS#8 (`PRIVATE KEY`).
    pub fn from_pem(pem: &str) -> Result<Self> {
        let private = match RsaPrivateKey::from_pkcs1_pem(pem) {
            Ok(private) => private,
            Err(_) => RsaPrivateKey::from_pkcs8_pem(pem)
                .map_err(|e| MkcertError::ParseError(format!("RSA private key: {e}")))?,
        };
        private
            .validate()
            .map_err(|e| MkcertError::ParseError(format!("RSA private key: {e}")))?;
        Ok(Self::from_private(private))
    }

    /// Export the private key as PKCS#1 PEM.
    pub fn to_pem(&self) -> Result<String> {
        let pem = self
            .private
            .to_pkcs1_pem(LineEnding::LF)
            .map_err(|e| MkcertError::EncodingError(e.to_string()))?;
        Ok(pem.as_str().to_owned())
    }

    pub fn public_key(&self) -> &PublicKey {
        &self.public
    }

    pub fn bits(&self) -> usize {
        self.public.bits()
    }

    /// Sign `data` with RSASSA-PKCS1-v1_5 over a SHA-256 digest.
    pub fn sign_data(&self, data: &[u8]) -> Result<Vec<u8>> {
        let signing_key = SigningKey::<Sha256>::new((*self.private).clone());
        let signature = signing_key
            .try_sign(data)
            .map_err(|e| MkcertError::SigningError(e.to_string()))?;
        Ok(signature.to_vec())
    }
}

impl fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyPair")
            .field("bits", &self.bits())
            .finish_non_exhaustive()
    }
}

/// The public half of an RSA key pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicKey(pub RsaPublicKey);

impl PublicKey {
    pub fn from_key_pair(key_pair: &KeyPair) -> Self {
        key_pair.public.clone()
    }

    /// Read an RSA public key out of a certificate's SubjectPublicKeyInfo.
    pub fn from_x509spki(spki: &SubjectPublicKeyInfoOwned) -> Result<Self> {
        let der = spki.to_der()?;
        let public = RsaPublicKey::from_public_key_der(&der)
            .map_err(|e| MkcertError::ParseError(format!("RSA public key: {e}")))?;
        Ok(PublicKey(public))
    }

    pub fn as_spki(&self) -> Result<SubjectPublicKeyInfoOwned> {
        SubjectPublicKeyInfoOwned::from_key(self.0.clone())
            .map_err(|e| MkcertError::EncodingError(e.to_string()))
    }

    pub fn bits(&self) -> usize {
        self.0.size() * 8
    }

    /// Check an RSASSA-PKCS1-v1_5 / SHA-256 signature over `data`.
    pub fn verify(&self, data: &[u8], signature: &[u8]) -> Result<()> {
        let verifying_key = VerifyingKey::<Sha256>::new(self.0.clone());
        let signature = Signature::try_from(signature)
            .map_err(|e| MkcertError::SigningError(e.to_string()))?;
        verifying_key
            .verify(data, &signature)
            .map_err(|e| MkcertError::SigningError(e.to_string()))
    }
}
