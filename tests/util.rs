use mkcert::authority::{CaParams, LeafParams, create_ca_with_rng, create_cert_with_rng};
use mkcert::cert::CertificatePem;
use rand::SeedableRng;
use rand::rngs::StdRng;

pub fn rng(seed: u64) -> StdRng {
    StdRng::seed_from_u64(seed)
}

pub fn test_ca_params() -> CaParams {
    CaParams::builder()
        .organization("Test CA")
        .country_code("NP")
        .state("Bagmati")
        .locality("Kathmandu")
        .validity_days(365)
        .build()
}

pub fn generate_ca(rng: &mut StdRng) -> CertificatePem {
    create_ca_with_rng(rng, &test_ca_params()).expect("CA issuance failed")
}

pub fn generate_leaf(rng: &mut StdRng, ca: &CertificatePem, domains: &[&str]) -> CertificatePem {
    let params = LeafParams::builder()
        .domains(domains.iter().map(|d| d.to_string()).collect())
        .validity_days(365)
        .build();
    create_cert_with_rng(rng, &params, ca).expect("leaf issuance failed")
}
