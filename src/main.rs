use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use mkcert::authority::{CaParams, LeafParams, create_ca, create_cert};
use mkcert::cert::CertificatePem;
use mkcert::chain::assemble_chain;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "mkcert", version)]
#[command(about = "Create a development CA and TLS certificates signed by it", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create a new certificate authority
    CreateCa(CreateCaArgs),
    /// Create a certificate signed by an existing certificate authority
    #[command(alias = "create-certificate")]
    CreateCert(CreateCertArgs),
}

#[derive(Args, Debug)]
struct CreateCaArgs {
    /// Organization name
    #[arg(long, default_value = "Test CA")]
    organization: String,
    /// Country code
    #[arg(long, default_value = "US")]
    country_code: String,
    /// State name
    #[arg(long, default_value = "California")]
    state: String,
    /// Locality address
    #[arg(long, default_value = "San Francisco")]
    locality: String,
    /// Validity in days
    #[arg(long, default_value_t = 365, allow_negative_numbers = true)]
    validity: i64,
    /// Output key file
    #[arg(long, value_name = "FILE", default_value = "ca.key")]
    key: PathBuf,
    /// Output certificate file
    #[arg(long, value_name = "FILE", default_value = "ca.crt")]
    cert: PathBuf,
}

#[derive(Args, Debug)]
struct CreateCertArgs {
    /// CA private key file
    #[arg(long, value_name = "FILE", default_value = "ca.key")]
    ca_key: PathBuf,
    /// CA certificate file
    #[arg(long, value_name = "FILE", default_value = "ca.crt")]
    ca_cert: PathBuf,
    /// Validity in days
    #[arg(long, default_value_t = 365, allow_negative_numbers = true)]
    validity: i64,
    /// Output key file
    #[arg(long, value_name = "FILE", default_value = "cert.key")]
    key: PathBuf,
    /// Output certificate file (leaf followed by the CA)
    #[arg(long, value_name = "FILE", default_value = "cert.crt")]
    cert: PathBuf,
    /// Optional organization name
    #[arg(long)]
    organization: Option<String>,
    /// Optional email address
    #[arg(long)]
    email: Option<String>,
    /// Domains or IP addresses
    #[arg(long = "domain", num_args = 1.., default_values = ["localhost", "127.0.0.1"])]
    domains: Vec<String>,
}

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();

    match Cli::parse().command {
        Command::CreateCa(args) => run_create_ca(args),
        Command::CreateCert(args) => run_create_cert(args),
    }
}

fn run_create_ca(args: CreateCaArgs) -> Result<()> {
    let params = CaParams::builder()
        .organization(args.organization)
        .country_code(args.country_code)
        .state(args.state)
        .locality(args.locality)
        .validity_days(args.validity)
        .build();
    let ca = create_ca(&params).context("failed to create certificate authority")?;

    write_file(&args.key, &ca.private_key)?;
    println!("CA Private Key: {}", args.key.display());
    write_file(&args.cert, &ca.certificate)?;
    println!("CA Certificate: {}", args.cert.display());
    Ok(())
}

fn run_create_cert(args: CreateCertArgs) -> Result<()> {
    let (Ok(private_key), Ok(certificate)) = (
        fs::read_to_string(&args.ca_key),
        fs::read_to_string(&args.ca_cert),
    ) else {
        eprintln!("Unable to find CA key or certificate.");
        eprintln!("Please run `mkcert create-ca` to create a new certificate authority.");
        bail!(
            "missing {} or {}",
            args.ca_key.display(),
            args.ca_cert.display()
        );
    };
    let ca = CertificatePem {
        private_key,
        certificate,
    };

    let params = LeafParams::builder()
        .domains(args.domains)
        .validity_days(args.validity)
        .maybe_organization(args.organization)
        .maybe_email(args.email)
        .build();
    let cert = create_cert(&params, &ca).context("failed to create certificate")?;
    let chain = assemble_chain(&cert.certificate, &ca.certificate)?;

    write_file(&args.key, &cert.private_key)?;
    println!("Private Key: {}", args.key.display());
    write_file(&args.cert, &chain)?;
    println!("Certificate: {}", args.cert.display());
    Ok(())
}

fn write_file(path: &Path, contents: &str) -> Result<()> {
    fs::write(path, contents).with_context(|| format!("failed to write {}", path.display()))
}
