mod util;

use mkcert::authority::{LeafParams, create_cert_with_rng};
use mkcert::cert::CertificatePem;
use mkcert::chain::assemble_chain;
use openssl::asn1::Asn1Time;
use openssl::bn::BigNum;
use openssl::hash::MessageDigest;
use openssl::nid::Nid;
use openssl::pkey::PKey;
use openssl::rsa::Rsa;
use openssl::stack::Stack;
use openssl::x509::extension::{BasicConstraints, KeyUsage};
use openssl::x509::store::X509StoreBuilder;
use openssl::x509::{X509, X509NameBuilder, X509StoreContext};
use regex::Regex;

/// Verifies the first certificate of `chain_pem` against a store that trusts
/// only `ca_pem`.
fn verify_chain(chain_pem: &str, ca_pem: &str) -> (bool, String) {
    let certs = X509::stack_from_pem(chain_pem.as_bytes()).expect("Failed to parse chain");
    let ca = X509::from_pem(ca_pem.as_bytes()).expect("Failed to parse CA");

    let mut builder = X509StoreBuilder::new().unwrap();
    builder.add_cert(ca).unwrap();
    let store = builder.build();

    let mut untrusted = Stack::new().unwrap();
    for cert in certs.iter().skip(1) {
        untrusted.push(cert.clone()).unwrap();
    }

    let mut ctx = X509StoreContext::new().unwrap();
    ctx.init(&store, &certs[0], &untrusted, |c| {
        let ok = c.verify_cert()?;
        Ok((ok, c.error().to_string()))
    })
    .unwrap()
}

#[test]
fn test_openssl_validates_chain_for_any_domain_list() {
    let mut rng = util::rng(100);
    let ca = util::generate_ca(&mut rng);

    let domain_lists: [&[&str]; 4] = [
        &["localhost"],
        &["127.0.0.1"],
        &["::1", "localhost", "127.0.0.1"],
        &["app.test", "api.app.test", "10.1.2.3"],
    ];
    for domains in domain_lists {
        let leaf = util::generate_leaf(&mut rng, &ca, domains);
        let chain = assemble_chain(&leaf.certificate, &ca.certificate).unwrap();
        let (ok, reason) = verify_chain(&chain, &ca.certificate);
        assert!(ok, "chain for {domains:?} rejected: {reason}");
    }
}

#[test]
fn test_openssl_rejects_leaf_from_untrusted_ca() {
    let mut rng = util::rng(101);
    let trusted = util::generate_ca(&mut rng);
    let untrusted = util::generate_ca(&mut rng);
    let leaf = util::generate_leaf(&mut rng, &untrusted, &["localhost"]);

    let (ok, _) = verify_chain(&leaf.certificate, &trusted.certificate);
    assert!(!ok);
}

#[test]
fn test_openssl_crate_reads_ca_fields() {
    let mut rng = util::rng(102);
    let ca = util::generate_ca(&mut rng);
    let x509 = X509::from_pem(ca.certificate.as_bytes()).expect("Failed to parse PEM");

    assert_eq!(x509.version(), 2, "X509 version should be 3 (0-based index)");
    assert_eq!(
        x509.signature_algorithm().object().nid(),
        Nid::SHA256WITHRSAENCRYPTION
    );

    let country = x509
        .subject_name()
        .entries_by_nid(Nid::COUNTRYNAME)
        .next()
        .unwrap()
        .data()
        .as_utf8()
        .unwrap();
    assert_eq!(country.to_string(), "NP");

    let diff = x509.not_before().diff(x509.not_after()).unwrap();
    assert_eq!((diff.days, diff.secs), (365, 0));

    let serial = x509.serial_number().to_bn().unwrap();
    assert!(!serial.is_negative());
    assert!(serial.num_bits() > 64);

    let text = String::from_utf8(x509.to_text().unwrap()).unwrap();
    assert!(Regex::new(r"Basic Constraints: critical\s+CA:TRUE").unwrap().is_match(&text));
    assert!(Regex::new(r"Key Usage: critical\s+Certificate Sign\n").unwrap().is_match(&text));

    let key = PKey::private_key_from_pem(ca.private_key.as_bytes()).unwrap();
    assert!(x509.public_key().unwrap().public_eq(&key));
    assert!(x509.verify(&key).unwrap());
}

#[test]
fn test_openssl_crate_reads_leaf_san() {
    let mut rng = util::rng(103);
    let ca = util::generate_ca(&mut rng);
    let leaf = util::generate_leaf(&mut rng, &ca, &["127.0.0.1", "localhost"]);
    let x509 = X509::from_pem(leaf.certificate.as_bytes()).unwrap();

    let names = x509.subject_alt_names().expect("missing SAN");
    let ips: Vec<_> = names.iter().filter_map(|n| n.ipaddress()).collect();
    let dns: Vec<_> = names.iter().filter_map(|n| n.dnsname()).collect();
    assert_eq!(ips, vec![&[127u8, 0, 0, 1][..]]);
    assert_eq!(dns, vec!["localhost"]);

    let text = String::from_utf8(x509.to_text().unwrap()).unwrap();
    assert!(Regex::new(r"Basic Constraints: critical\s+CA:FALSE").unwrap().is_match(&text));
    assert!(text.contains("TLS Web Server Authentication, TLS Web Client Authentication"));

    let issuer = x509
        .issuer_name()
        .entries_by_nid(Nid::COMMONNAME)
        .next()
        .unwrap()
        .data()
        .as_utf8()
        .unwrap();
    assert_eq!(issuer.to_string(), "Test CA", "Issuer CN mismatch");
}

/// A CA produced by another tool, with subject attributes this crate never
/// writes itself.
fn openssl_ca_with_domain_components() -> CertificatePem {
    let rsa = Rsa::generate(2048).unwrap();
    let key = PKey::from_rsa(rsa).unwrap();

    let mut name = X509NameBuilder::new().unwrap();
    name.append_entry_by_text("DC", "test").unwrap();
    name.append_entry_by_text("DC", "example").unwrap();
    name.append_entry_by_text("CN", "Foreign CA").unwrap();
    let name = name.build();

    let mut builder = X509::builder().unwrap();
    builder.set_version(2).unwrap();
    let serial = BigNum::from_u32(4242).unwrap().to_asn1_integer().unwrap();
    builder.set_serial_number(&serial).unwrap();
    builder.set_subject_name(&name).unwrap();
    builder.set_issuer_name(&name).unwrap();
    builder.set_pubkey(&key).unwrap();
    builder.set_not_before(&Asn1Time::days_from_now(0).unwrap()).unwrap();
    builder.set_not_after(&Asn1Time::days_from_now(30).unwrap()).unwrap();
    builder
        .append_extension(BasicConstraints::new().critical().ca().build().unwrap())
        .unwrap();
    builder
        .append_extension(KeyUsage::new().critical().key_cert_sign().crl_sign().build().unwrap())
        .unwrap();
    builder.sign(&key, MessageDigest::sha256()).unwrap();

    CertificatePem {
        private_key: String::from_utf8(key.rsa().unwrap().private_key_to_pem().unwrap()).unwrap(),
        certificate: String::from_utf8(builder.build().to_pem().unwrap()).unwrap(),
    }
}

#[test]
fn test_issuer_copies_foreign_ca_subject_verbatim() {
    let mut rng = util::rng(104);
    let ca = openssl_ca_with_domain_components();
    let params = LeafParams::builder()
        .domains(vec!["localhost".to_string()])
        .build();

    let leaf = create_cert_with_rng(&mut rng, &params, &ca).unwrap();

    let ca_x509 = X509::from_pem(ca.certificate.as_bytes()).unwrap();
    let leaf_x509 = X509::from_pem(leaf.certificate.as_bytes()).unwrap();
    assert_eq!(
        leaf_x509.issuer_name().to_der().unwrap(),
        ca_x509.subject_name().to_der().unwrap()
    );

    let chain = assemble_chain(&leaf.certificate, &ca.certificate).unwrap();
    let (ok, reason) = verify_chain(&chain, &ca.certificate);
    assert!(ok, "chain rejected: {reason}");
}
