use std::fmt;
use std::sync::LazyLock;

use const_oid::ObjectIdentifier;
use der::asn1::{Any, GeneralizedTime, Ia5StringRef, PrintableStringRef, SetOfVec, UtcTime};
use der::{DateTime, Tag, Tagged};
use regex::Regex;
use time::{Duration, OffsetDateTime, UtcOffset};
use x509_cert::attr::AttributeTypeAndValue;
use x509_cert::name::{Name, RdnSequence, RelativeDistinguishedName};
use x509_cert::time::Time;

use super::extensions::ToAndFromX509Extension;
use crate::error::{MkcertError, Result};

static COUNTRY_CODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z]{2}$").expect("country code pattern is valid"));

/// Attribute types that may appear in a distinguished name.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AttributeType {
    CommonName,
    CountryName,
    StateOrProvinceName,
    LocalityName,
    OrganizationName,
    OrganizationalUnitName,
    EmailAddress,
}

impl AttributeType {
    pub const fn oid(self) -> ObjectIdentifier {
        match self {
            AttributeType::CommonName => ObjectIdentifier::new_unwrap("2.5.4.3"),
            AttributeType::CountryName => ObjectIdentifier::new_unwrap("2.5.4.6"),
            AttributeType::LocalityName => ObjectIdentifier::new_unwrap("2.5.4.7"),
            AttributeType::StateOrProvinceName => ObjectIdentifier::new_unwrap("2.5.4.8"),
            AttributeType::OrganizationName => ObjectIdentifier::new_unwrap("2.5.4.10"),
            AttributeType::OrganizationalUnitName => ObjectIdentifier::new_unwrap("2.5.4.11"),
            AttributeType::EmailAddress => ObjectIdentifier::new_unwrap("1.2.840.113549.1.9.1"),
        }
    }

    fn from_oid(oid: ObjectIdentifier) -> Option<Self> {
        [
            AttributeType::CommonName,
            AttributeType::CountryName,
            AttributeType::StateOrProvinceName,
            AttributeType::LocalityName,
            AttributeType::OrganizationName,
            AttributeType::OrganizationalUnitName,
            AttributeType::EmailAddress,
        ]
        .into_iter()
        .find(|attr| attr.oid() == oid)
    }

    /// Short name used in RFC 4514 string renderings.
    pub fn short_name(self) -> &'static str {
        match self {
            AttributeType::CommonName => "CN",
            AttributeType::CountryName => "C",
            AttributeType::StateOrProvinceName => "ST",
            AttributeType::LocalityName => "L",
            AttributeType::OrganizationName => "O",
            AttributeType::OrganizationalUnitName => "OU",
            AttributeType::EmailAddress => "emailAddress",
        }
    }

    fn default_tag(self) -> Tag {
        match self {
            AttributeType::CountryName => Tag::PrintableString,
            AttributeType::EmailAddress => Tag::Ia5String,
            _ => Tag::Utf8String,
        }
    }
}

/// A single (type, value) pair of a distinguished name.
///
/// The ASN.1 string tag is carried along so that a name read from a
/// certificate encodes back to the same bytes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NameAttribute {
    pub attribute_type: AttributeType,
    pub value: String,
    tag: Tag,
}

impl NameAttribute {
    /// Creates an attribute using the string type X.509 expects for `attribute_type`.
    pub fn new(attribute_type: AttributeType, value: impl Into<String>) -> Result<Self> {
        let value = value.into();
        if value.is_empty() {
            return Err(MkcertError::InvalidInput(format!(
                "{} must not be empty",
                attribute_type.short_name()
            )));
        }

        let tag = attribute_type.default_tag();
        let representable = match tag {
            Tag::PrintableString => PrintableStringRef::new(&value).is_ok(),
            Tag::Ia5String => Ia5StringRef::new(&value).is_ok(),
            _ => true,
        };
        if !representable {
            return Err(MkcertError::InvalidInput(format!(
                "{} value {value:?} is not a valid {tag}",
                attribute_type.short_name()
            )));
        }

        Ok(Self {
            attribute_type,
            value,
            tag,
        })
    }

    fn to_x509_attribute(&self) -> Result<AttributeTypeAndValue> {
        Ok(AttributeTypeAndValue {
            oid: self.attribute_type.oid(),
            value: Any::new(self.tag, self.value.as_bytes())?,
        })
    }

    fn from_x509_attribute(atv: &AttributeTypeAndValue) -> Result<Self> {
        let attribute_type = AttributeType::from_oid(atv.oid).ok_or_else(|| {
            MkcertError::ParseError(format!("unsupported name attribute {}", atv.oid))
        })?;

        let tag = atv.value.tag();
        if !matches!(
            tag,
            Tag::Utf8String | Tag::PrintableString | Tag::Ia5String
        ) {
            return Err(MkcertError::ParseError(format!(
                "name attribute {} has unsupported string type {tag}",
                attribute_type.short_name()
            )));
        }

        let value = std::str::from_utf8(atv.value.value())
            .map_err(|e| MkcertError::ParseError(e.to_string()))?
            .to_owned();

        Ok(Self {
            attribute_type,
            value,
            tag,
        })
    }
}

/// An ordered distinguished name.
///
/// Order is significant: attributes are encoded one per RDN in exactly the
/// order they were added.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DistinguishedName {
    attributes: Vec<NameAttribute>,
}

impl DistinguishedName {
    pub fn new(attributes: Vec<NameAttribute>) -> Self {
        Self { attributes }
    }

    pub fn attributes(&self) -> &[NameAttribute] {
        &self.attributes
    }

    /// Returns the first value of the given attribute type.
    pub fn get(&self, attribute_type: AttributeType) -> Option<&str> {
        self.attributes
            .iter()
            .find(|attr| attr.attribute_type == attribute_type)
            .map(|attr| attr.value.as_str())
    }

    pub fn common_name(&self) -> Option<&str> {
        self.get(AttributeType::CommonName)
    }

    /// Converts the distinguished name to an X.509-compatible format.
    pub fn as_x509_name(&self) -> Result<Name> {
        let rdns = self
            .attributes
            .iter()
            .map(|attr| {
                let set = SetOfVec::try_from(vec![attr.to_x509_attribute()?])?;
                Ok(RelativeDistinguishedName(set))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(RdnSequence(rdns))
    }

    /// Creates a `DistinguishedName` from an X.509 name.
    ///
    /// Multi-valued RDNs and non-string attribute values are rejected, since
    /// they could not be written back unchanged.
    pub fn from_x509_name(name: &Name) -> Result<Self> {
        let attributes = name
            .0
            .iter()
            .map(|rdn| match rdn.0.as_slice() {
                [atv] => NameAttribute::from_x509_attribute(atv),
                _ => Err(MkcertError::ParseError(
                    "multi-valued RDNs are not supported".to_string(),
                )),
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { attributes })
    }
}

impl fmt::Display for DistinguishedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, attr) in self.attributes.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{}={}", attr.attribute_type.short_name(), attr.value)?;
        }
        Ok(())
    }
}

/// Builds the subject of a certificate authority.
///
/// The attribute order is fixed: CN, C, ST, L, O, with the organization
/// doubling as the common name.
///
/// # Arguments
/// * `organization` - Used for both commonName and organizationName.
/// * `country_code` - Two ASCII letters, stored upper-cased.
/// * `state` - stateOrProvinceName.
/// * `locality` - localityName.
pub fn build_ca_subject(
    organization: &str,
    country_code: &str,
    state: &str,
    locality: &str,
) -> Result<DistinguishedName> {
    if !COUNTRY_CODE.is_match(country_code) {
        return Err(MkcertError::InvalidInput(format!(
            "country code must be two letters, got {country_code:?}"
        )));
    }

    Ok(DistinguishedName::new(vec![
        NameAttribute::new(AttributeType::CommonName, organization)?,
        NameAttribute::new(AttributeType::CountryName, country_code.to_ascii_uppercase())?,
        NameAttribute::new(AttributeType::StateOrProvinceName, state)?,
        NameAttribute::new(AttributeType::LocalityName, locality)?,
        NameAttribute::new(AttributeType::OrganizationName, organization)?,
    ]))
}

/// Builds the subject of a leaf certificate.
///
/// The first domain becomes the common name, followed by the optional
/// organization and email address.
pub fn build_leaf_subject<S: AsRef<str>>(
    domains: &[S],
    organization: Option<&str>,
    email: Option<&str>,
) -> Result<DistinguishedName> {
    let first = domains.first().ok_or_else(|| {
        MkcertError::InvalidInput("at least one domain or IP address is required".to_string())
    })?;

    let mut attributes = vec![NameAttribute::new(
        AttributeType::CommonName,
        first.as_ref(),
    )?];
    if let Some(organization) = organization {
        attributes.push(NameAttribute::new(
            AttributeType::OrganizationName,
            organization,
        )?);
    }
    if let Some(email) = email {
        attributes.push(NameAttribute::new(AttributeType::EmailAddress, email)?);
    }

    Ok(DistinguishedName::new(attributes))
}

/// Certificate validity period.
///
/// Both bounds are UTC with whole-second precision, matching what the
/// certificate can encode.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Validity {
    pub not_before: OffsetDateTime,
    pub not_after: OffsetDateTime,
}

impl Validity {
    /// Creates a validity period starting now for the given number of days.
    pub fn for_days(days: i64) -> Result<Self> {
        Self::starting_at(OffsetDateTime::now_utc(), days)
    }

    /// Creates a validity period of `days` days starting at `start`.
    ///
    /// # Errors
    /// `InvalidInput` when `days` is not positive, `ValidityError` when the
    /// end of the window overflows.
    pub fn starting_at(start: OffsetDateTime, days: i64) -> Result<Self> {
        if days <= 0 {
            return Err(MkcertError::InvalidInput(format!(
                "validity must be a positive number of days, got {days}"
            )));
        }

        let not_before = start
            .to_offset(UtcOffset::UTC)
            .replace_nanosecond(0)
            .map_err(|e| MkcertError::ValidityError(e.to_string()))?;
        let not_after = days
            .checked_mul(86_400)
            .map(Duration::seconds)
            .and_then(|length| not_before.checked_add(length))
            .ok_or_else(|| {
                MkcertError::ValidityError(format!("{days} days past {not_before} overflows"))
            })?;

        Ok(Self {
            not_before,
            not_after,
        })
    }

    /// Converts to the X.509 representation, using UTCTime before 2050 and
    /// GeneralizedTime afterwards.
    pub fn as_x509_validity(&self) -> Result<x509_cert::time::Validity> {
        if self.not_after <= self.not_before {
            return Err(MkcertError::ValidityError(
                "notAfter must be later than notBefore".to_string(),
            ));
        }
        Ok(x509_cert::time::Validity {
            not_before: to_x509_time(self.not_before)?,
            not_after: to_x509_time(self.not_after)?,
        })
    }

    pub fn from_x509_validity(validity: &x509_cert::time::Validity) -> Result<Self> {
        Ok(Self {
            not_before: from_x509_time(&validity.not_before)?,
            not_after: from_x509_time(&validity.not_after)?,
        })
    }
}

fn to_x509_time(instant: OffsetDateTime) -> Result<Time> {
    let seconds = u64::try_from(instant.unix_timestamp())
        .map_err(|_| MkcertError::ValidityError(format!("{instant} is before 1970")))?;
    let date_time = DateTime::from_unix_duration(std::time::Duration::from_secs(seconds))
        .map_err(|e| MkcertError::ValidityError(format!("{instant}: {e}")))?;

    if date_time.year() < 2050 {
        let utc = UtcTime::from_date_time(date_time)
            .map_err(|e| MkcertError::ValidityError(format!("{instant}: {e}")))?;
        Ok(Time::UtcTime(utc))
    } else {
        Ok(Time::GeneralTime(GeneralizedTime::from_date_time(date_time)))
    }
}

fn from_x509_time(time: &Time) -> Result<OffsetDateTime> {
    let seconds = i64::try_from(time.to_unix_duration().as_secs())
        .map_err(|e| MkcertError::ParseError(e.to_string()))?;
    OffsetDateTime::from_unix_timestamp(seconds).map_err(|e| MkcertError::ParseError(e.to_string()))
}

/// Represents an encoded X.509 extension.
///
/// # Fields
/// * `oid` - The object identifier of the extension.
/// * `critical` - Indicates if the extension is critical.
/// * `value` - The DER-encoded value of the extension.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExtensionParam {
    pub oid: ObjectIdentifier,
    pub critical: bool,
    /// DER-encoded extension value
    pub value: Vec<u8>,
}

impl ExtensionParam {
    /// Creates an `ExtensionParam` from a specific extension.
    pub fn from_extension<E: ToAndFromX509Extension>(extension: &E, critical: bool) -> Result<Self> {
        Ok(Self {
            oid: E::OID,
            critical,
            value: extension.to_x509_extension_value()?,
        })
    }

    /// Decodes an `ExtensionParam` into a specific extension.
    pub fn to_extension<E: ToAndFromX509Extension>(&self) -> Result<E> {
        E::from_x509_extension_value(&self.value)
    }
}
