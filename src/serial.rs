//! Random certificate serial numbers.

use rand_core::CryptoRngCore;
use x509_cert::serial_number::SerialNumber;

use crate::error::{MkcertError, Result};

/// How wide a freshly allocated serial number is.
///
/// RFC 5280 caps serials at 20 octets including the sign bit, so the widest
/// usable value is 159 bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SerialNumberPolicy {
    bits: u32,
}

impl SerialNumberPolicy {
    pub const MIN_BITS: u32 = 64;
    pub const MAX_BITS: u32 = 159;

    pub fn new(bits: u32) -> Result<Self> {
        if !(Self::MIN_BITS..=Self::MAX_BITS).contains(&bits) {
            return Err(MkcertError::InvalidInput(format!(
                "serial numbers must be {}-{} bits wide, got {bits}",
                Self::MIN_BITS,
                Self::MAX_BITS
            )));
        }
        Ok(Self { bits })
    }

    pub fn bits(&self) -> u32 {
        self.bits
    }

    /// Draws a positive serial of exactly `bits` bits.
    ///
    /// The most significant bit of the configured width is always set, so the
    /// value is never zero and its minimal big-endian encoding always has the
    /// same length.
    pub fn allocate<R: CryptoRngCore + ?Sized>(&self, rng: &mut R) -> Vec<u8> {
        let len = self.bits.div_ceil(8) as usize;
        let mut bytes = vec![0u8; len];
        rng.fill_bytes(&mut bytes);

        let top_bits = self.bits - 8 * (len as u32 - 1);
        bytes[0] &= (0xffu16 >> (8 - top_bits)) as u8;
        bytes[0] |= 1 << (top_bits - 1);
        bytes
    }

    pub fn allocate_x509<R: CryptoRngCore + ?Sized>(&self, rng: &mut R) -> Result<SerialNumber> {
        let bytes = self.allocate(rng);
        SerialNumber::new(&bytes).map_err(|e| MkcertError::EncodingError(e.to_string()))
    }
}

impl Default for SerialNumberPolicy {
    fn default() -> Self {
        Self { bits: 128 }
    }
}
