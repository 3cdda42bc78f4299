use crate::Generator;
use hoplink_core::ShortCode;
use sha2::{Digest, Sha256};

/// Digits first, then lowercase, then uppercase. The digit order matters:
/// codes are read back as base62 remainders, so reordering the alphabet
/// would change every generated code.
const BASE62_ALPHABET: &[u8; 62] =
    b"0123456789abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";

pub const DEFAULT_CODE_LENGTH: usize = 7;

/// Derives fixed-length base62 codes from a SHA-256 digest.
///
/// The digest of `long_url` concatenated with the decimal form of the
/// attempt counter is read as one big unsigned integer and repeatedly
/// divided by 62; each remainder maps to an alphabet character, least
/// significant digit first. The digest is fixed-size, so the division
/// loop is bounded by the code length.
#[derive(Debug, Clone)]
pub struct HashGenerator {
    length: usize,
}

impl HashGenerator {
    /// Creates a generator emitting codes of the default length (7).
    pub fn new() -> Self {
        Self::with_length(DEFAULT_CODE_LENGTH)
    }

    /// Creates a generator emitting codes of the given length.
    pub fn with_length(length: usize) -> Self {
        Self { length }
    }

    /// The length of every code this generator emits.
    pub fn length(&self) -> usize {
        self.length
    }
}

impl Default for HashGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl Generator for HashGenerator {
    fn generate(&self, long_url: &str, attempt: u32) -> ShortCode {
        let mut hasher = Sha256::new();
        hasher.update(long_url.as_bytes());
        hasher.update(attempt.to_string().as_bytes());
        let mut digest: [u8; 32] = hasher.finalize().into();

        let mut code = String::with_capacity(self.length);
        for _ in 0..self.length {
            let remainder = div_rem_62(&mut digest);
            code.push(BASE62_ALPHABET[remainder as usize] as char);
        }

        ShortCode::new_unchecked(code)
    }
}

/// Divides the big-endian integer in `digits` by 62 in place and
/// returns the remainder.
fn div_rem_62(digits: &mut [u8; 32]) -> u8 {
    let mut remainder: u32 = 0;
    for byte in digits.iter_mut() {
        let acc = remainder * 256 + u32::from(*byte);
        *byte = (acc / 62) as u8;
        remainder = acc % 62;
    }
    remainder as u8
}
