//! Certificate chain files for TLS servers.
//!
//! A server presents its own certificate first, followed by the issuing CA,
//! so the chain is written in exactly that order.

use crate::cert::Certificate;
use crate::error::{MkcertError, Result};

const CERTIFICATE_LABEL: &str = "CERTIFICATE";

/// Concatenates a leaf and its CA certificate into one PEM chain.
///
/// The leaf comes first and each block ends with a single newline.
///
/// # Errors
/// `ParseError` when either input is not a `CERTIFICATE` PEM block.
pub fn assemble_chain(leaf_pem: &str, ca_pem: &str) -> Result<String> {
    check_certificate_block("leaf", leaf_pem)?;
    check_certificate_block("CA", ca_pem)?;
    Ok(format!("{}\n{}\n", leaf_pem.trim_end(), ca_pem.trim_end()))
}

/// Parses every certificate in a PEM bundle, preserving order.
pub fn split_chain(chain_pem: &str) -> Result<Vec<Certificate>> {
    let blocks = pem::parse_many(chain_pem)?;
    if blocks.is_empty() {
        return Err(MkcertError::ParseError(
            "no PEM blocks in certificate chain".to_string(),
        ));
    }

    blocks
        .iter()
        .map(|block| {
            if block.tag() != CERTIFICATE_LABEL {
                return Err(MkcertError::ParseError(format!(
                    "expected {CERTIFICATE_LABEL} block, found {}",
                    block.tag()
                )));
            }
            Certificate::from_der(block.contents())
        })
        .collect()
}

fn check_certificate_block(role: &str, pem_text: &str) -> Result<()> {
    let block = pem::parse(pem_text)
        .map_err(|e| MkcertError::ParseError(format!("{role} certificate: {e}")))?;
    if block.tag() != CERTIFICATE_LABEL {
        return Err(MkcertError::ParseError(format!(
            "{role} certificate: expected {CERTIFICATE_LABEL} block, found {}",
            block.tag()
        )));
    }
    Ok(())
}
