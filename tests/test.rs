mod util;

use std::net::{IpAddr, Ipv4Addr};

use mkcert::authority::{LeafParams, create_ca_with_rng, create_cert_with_rng};
use mkcert::cert::extensions::{Extension, SanEntry, SanKind};
use mkcert::cert::params::AttributeType;
use mkcert::cert::{Certificate, CertifiedKey};
use mkcert::chain::{assemble_chain, split_chain};
use mkcert::error::{MkcertError, Result};
use mkcert::key::KeyPair;

/// A CA names itself as issuer and its signature checks out against the
/// public key it carries.
#[test]
fn ca_is_self_issued_and_self_signed() -> Result<()> {
    let mut rng = util::rng(1);
    let ca = util::generate_ca(&mut rng);

    let cert = Certificate::from_pem(&ca.certificate)?;
    assert_eq!(cert.subject()?, cert.issuer()?);
    cert.verify_signature(&cert.public_key()?)?;

    let key = KeyPair::from_pem(&ca.private_key)?;
    assert_eq!(&cert.public_key()?, key.public_key());
    Ok(())
}

/// A leaf names the CA subject as issuer and verifies against the CA key.
#[test]
fn leaf_is_issued_by_ca() -> Result<()> {
    let mut rng = util::rng(2);
    let ca = util::generate_ca(&mut rng);
    let leaf = util::generate_leaf(&mut rng, &ca, &["localhost"]);

    let ca = CertifiedKey::from_pem(&ca)?;
    let leaf = CertifiedKey::from_pem(&leaf)?;

    assert_eq!(leaf.cert.issuer()?, ca.cert.subject()?);
    leaf.cert.verify_signature(ca.key.public_key())?;
    leaf.cert.verify_issued_by(&ca.cert)?;
    assert_ne!(leaf.key.public_key(), ca.key.public_key());
    Ok(())
}

#[test]
fn leaf_subject_carries_optional_organization_and_email() -> Result<()> {
    let mut rng = util::rng(3);
    let ca = util::generate_ca(&mut rng);
    let params = LeafParams::builder()
        .domains(vec!["127.0.0.1".to_string(), "localhost".to_string()])
        .organization("Test Cert")
        .email("abc@example.com")
        .build();

    let leaf = create_cert_with_rng(&mut rng, &params, &ca)?;
    let subject = Certificate::from_pem(&leaf.certificate)?.subject()?;
    assert_eq!(
        subject.to_string(),
        "CN=127.0.0.1,O=Test Cert,emailAddress=abc@example.com"
    );
    assert_eq!(subject.get(AttributeType::EmailAddress), Some("abc@example.com"));
    Ok(())
}

#[test]
fn san_entries_are_classified_in_order() -> Result<()> {
    let mut rng = util::rng(4);
    let ca = util::generate_ca(&mut rng);
    let leaf = util::generate_leaf(&mut rng, &ca, &["127.0.0.1", "example.com", "::1"]);

    let names = Certificate::from_pem(&leaf.certificate)?.subject_alt_names()?;
    let kinds: Vec<_> = names.iter().map(SanEntry::kind).collect();
    assert_eq!(kinds, vec![SanKind::Ip, SanKind::Domain, SanKind::Ip]);
    assert_eq!(names[1], SanEntry::Domain("example.com".to_string()));
    Ok(())
}

#[test]
fn one_day_validity_and_rejected_non_positive_validity() -> Result<()> {
    let mut rng = util::rng(5);
    let ca = util::generate_ca(&mut rng);

    let params = LeafParams::builder()
        .domains(vec!["localhost".to_string()])
        .validity_days(1)
        .build();
    let leaf = create_cert_with_rng(&mut rng, &params, &ca)?;
    let validity = Certificate::from_pem(&leaf.certificate)?.validity()?;
    assert_eq!(validity.not_after - validity.not_before, time::Duration::days(1));

    for days in [0, -1] {
        let params = LeafParams::builder()
            .domains(vec!["localhost".to_string()])
            .validity_days(days)
            .build();
        let err = create_cert_with_rng(&mut rng, &params, &ca).unwrap_err();
        assert!(matches!(err, MkcertError::InvalidInput(_)));
    }
    Ok(())
}

/// Two CAs with the same parameters share structure but not identity.
#[test]
fn independent_cas_differ_in_serial_and_key() -> Result<()> {
    let mut rng = util::rng(6);
    let first = create_ca_with_rng(&mut rng, &util::test_ca_params())?;
    let second = create_ca_with_rng(&mut rng, &util::test_ca_params())?;

    let first = CertifiedKey::from_pem(&first)?;
    let second = CertifiedKey::from_pem(&second)?;

    assert_ne!(first.cert.serial_number()?, second.cert.serial_number()?);
    assert_ne!(first.key.public_key(), second.key.public_key());
    assert_eq!(first.cert.subject()?, second.cert.subject()?);
    assert_eq!(first.cert.extensions()?, second.cert.extensions()?);
    Ok(())
}

#[test]
fn end_to_end_nepal_ca_and_localhost_leaf() -> Result<()> {
    let mut rng = util::rng(7);
    let ca = util::generate_ca(&mut rng);

    let ca_cert = Certificate::from_pem(&ca.certificate)?;
    assert_eq!(
        ca_cert.subject()?.to_string(),
        "CN=Test CA,C=NP,ST=Bagmati,L=Kathmandu,O=Test CA"
    );
    let validity = ca_cert.validity()?;
    assert_eq!((validity.not_after - validity.not_before).whole_days(), 365);
    assert!(matches!(
        ca_cert.extensions()?.first(),
        Some(Extension::BasicConstraints {
            is_ca: true,
            critical: true
        })
    ));

    let leaf = util::generate_leaf(&mut rng, &ca, &["127.0.0.1", "localhost"]);
    let leaf_cert = Certificate::from_pem(&leaf.certificate)?;
    assert_eq!(
        leaf_cert.subject_alt_names()?,
        vec![
            SanEntry::Ip(IpAddr::V4(Ipv4Addr::LOCALHOST)),
            SanEntry::Domain("localhost".to_string()),
        ]
    );
    assert!(!leaf_cert.is_ca()?);

    let chain = assemble_chain(&leaf.certificate, &ca.certificate)?;
    let certs = split_chain(&chain)?;
    assert_eq!(certs.len(), 2);
    certs[0].verify_issued_by(&certs[1])?;
    certs[1].verify_issued_by(&certs[1])?;
    Ok(())
}

#[test]
fn leaf_from_another_ca_does_not_verify() -> Result<()> {
    let mut rng = util::rng(8);
    let ca = util::generate_ca(&mut rng);
    let other_ca = util::generate_ca(&mut rng);
    let leaf = util::generate_leaf(&mut rng, &other_ca, &["localhost"]);

    let ca_cert = Certificate::from_pem(&ca.certificate)?;
    let leaf_cert = Certificate::from_pem(&leaf.certificate)?;
    // Same subject DN, different key.
    assert_eq!(leaf_cert.issuer()?, ca_cert.subject()?);
    assert!(matches!(
        leaf_cert.verify_issued_by(&ca_cert),
        Err(MkcertError::SigningError(_))
    ));
    Ok(())
}
