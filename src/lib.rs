//! # mkcert - Development Certificate Authority in Pure Rust
//!
//! mkcert issues a self-signed root Certificate Authority and TLS leaf
//! certificates chained to it, for development and test environments. It is
//! built entirely on RustCrypto crates: no OpenSSL or ring at runtime.
//!
//! ## What gets issued
//!
//! - **CA certificates**: subject `CN=<org>, C, ST, L, O=<org>`, self-signed,
//!   BasicConstraints `cA=true` (critical) and KeyUsage `keyCertSign` (critical).
//! - **Leaf certificates**: subject `CN=<first domain>[, O][, emailAddress]`,
//!   BasicConstraints `cA=false`, KeyUsage `digitalSignature | keyEncipherment`,
//!   ExtendedKeyUsage `serverAuth, clientAuth`, and a Subject Alternative Name
//!   listing every domain (IP literals as `iPAddress`, everything else as `dNSName`).
//! - **Keys**: RSA, 2048 bits by default. Signatures use SHA-256 with RSA.
//! - **Serials**: random, 128 bits wide by default.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use mkcert::authority::{CaParams, LeafParams, create_ca, create_cert};
//! use mkcert::chain::assemble_chain;
//!
//! # fn main() -> Result<(), mkcert::error::MkcertError> {
//! let ca = create_ca(
//!     &CaParams::builder()
//!         .organization("Test CA")
//!         .country_code("NP")
//!         .state("Bagmati")
//!         .locality("Kathmandu")
//!         .build(),
//! )?;
//!
//! let server = create_cert(
//!     &LeafParams::builder()
//!         .domains(vec!["localhost".to_string(), "127.0.0.1".to_string()])
//!         .build(),
//!     &ca,
//! )?;
//!
//! // Serve this together with `server.private_key`.
//! let chain = assemble_chain(&server.certificate, &ca.certificate)?;
//! println!("{chain}");
//! # Ok(())
//! # }
//! ```
//!
//! ## Deterministic randomness
//!
//! Every operation that draws randomness has a `*_with_rng` form taking any
//! `rand_core::CryptoRngCore`, so tests can pass a seeded generator.
//!
//! ## Error Handling
//!
//! ```rust
//! use mkcert::{authority::{CaParams, create_ca}, error::MkcertError};
//!
//! let params = CaParams::builder().validity_days(0).build();
//! match create_ca(&params) {
//!     Err(MkcertError::InvalidInput(msg)) => println!("Invalid input: {}", msg),
//!     Err(e) => println!("Other error: {}", e),
//!     Ok(_) => unreachable!(),
//! }
//! ```
//!
//! ## Module Organization
//!
//! - [`authority`]: `create_ca` / `create_cert` and their parameters
//! - [`key`]: RSA key generation, import/export and signing
//! - [`cert`]: certificate values, distinguished names, extensions
//! - [`issuer`]: building and signing a certificate
//! - [`serial`]: random serial number allocation
//! - [`chain`]: PEM chain files for TLS servers
//! - [`error`]: error types
//! - [`tbs_certificate`]: low-level certificate structure

pub mod authority;
pub mod cert;
pub mod chain;
pub mod error;
pub mod issuer;
pub mod key;
pub mod serial;
pub mod tbs_certificate;

pub use authority::{CaParams, LeafParams, create_ca, create_cert};
pub use cert::CertificatePem;
pub use chain::assemble_chain;
pub use error::MkcertError;
