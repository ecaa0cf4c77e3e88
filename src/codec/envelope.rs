//! Ciphertext envelope format
//!
//! An envelope is `hex(iv) ":" hex(ciphertext)`. It carries everything needed
//! to decrypt except the master key, so no side table is needed for IVs.

use crate::{Error, Result};
use std::fmt;
use std::str::FromStr;

/// Separator between the IV and ciphertext segments
pub const ENVELOPE_SEPARATOR: char = ':';

/// Initialization vector length in bytes (one AES block)
pub const IV_LEN: usize = 16;

/// Parsed form of a ciphertext envelope
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    iv: [u8; IV_LEN],
    ciphertext: Vec<u8>,
}

impl Envelope {
    pub fn new(iv: [u8; IV_LEN], ciphertext: Vec<u8>) -> Self {
        Self { iv, ciphertext }
    }

    pub fn iv(&self) -> &[u8; IV_LEN] {
        &self.iv
    }

    pub fn ciphertext(&self) -> &[u8] {
        &self.ciphertext
    }
}

impl fmt::Display for Envelope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}{}",
            hex::encode(self.iv),
            ENVELOPE_SEPARATOR,
            hex::encode(&self.ciphertext)
        )
    }
}

impl FromStr for Envelope {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let mut segments = s.split(ENVELOPE_SEPARATOR);
        let (iv_hex, ciphertext_hex) = match (segments.next(), segments.next(), segments.next()) {
            (Some(iv), Some(ct), None) if !iv.is_empty() && !ct.is_empty() => (iv, ct),
            _ => {
                return Err(Error::Decryption(
                    "Envelope must be in the format 'IV:Ciphertext'".to_string(),
                ))
            }
        };

        let iv_bytes = hex::decode(iv_hex)
            .map_err(|e| Error::Decryption(format!("Invalid IV hex: {}", e)))?;
        let iv: [u8; IV_LEN] = iv_bytes.as_slice().try_into().map_err(|_| {
            Error::Decryption(format!(
                "IV must be {} bytes, got {}",
                IV_LEN,
                iv_bytes.len()
            ))
        })?;

        let ciphertext = hex::decode(ciphertext_hex)
            .map_err(|e| Error::Decryption(format!("Invalid ciphertext hex: {}", e)))?;

        Ok(Self { iv, ciphertext })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const IV_HEX: &str = "000102030405060708090a0b0c0d0e0f";

    #[test]
    fn test_display_is_lowercase_hex_pair() {
        let envelope = Envelope::new([0xAB; IV_LEN], vec![0xCD; 16]);
        let encoded = envelope.to_string();

        let (iv, ct) = encoded.split_once(ENVELOPE_SEPARATOR).unwrap();
        assert_eq!(iv, "ab".repeat(16));
        assert_eq!(ct, "cd".repeat(16));
        assert_eq!(encoded.parse::<Envelope>().unwrap(), envelope);
    }

    #[test]
    fn test_parse_accepts_uppercase_hex() {
        let parsed: Envelope = format!("{}:{}", IV_HEX.to_uppercase(), "FF".repeat(16))
            .parse()
            .unwrap();
        assert_eq!(parsed.iv()[15], 0x0f);
        assert_eq!(parsed.ciphertext(), &[0xFF; 16][..]);
    }

    #[test]
    fn test_parse_rejects_malformed_envelopes() {
        let ct = "00".repeat(16);
        let cases = vec![
            String::new(),
            IV_HEX.to_string(),
            format!("{}{}", IV_HEX, ct),
            format!(":{}", ct),
            format!("{}:", IV_HEX),
            format!("{}:{}:{}", IV_HEX, ct, ct),
            format!("zz{}:{}", &IV_HEX[2..], ct),
            format!("{}:{}x", IV_HEX, ct),
            format!("{}:{}", &IV_HEX[..30], ct),
            format!("{}00:{}", IV_HEX, ct),
        ];

        for case in cases {
            let result = case.parse::<Envelope>();
            assert!(
                matches!(result, Err(Error::Decryption(_))),
                "accepted malformed envelope {:?}",
                case
            );
        }
    }
}
