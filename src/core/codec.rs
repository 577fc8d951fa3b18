use crate::utils::error::{EchoError, Result};
use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig, STANDARD};
use base64::Engine;

/// Standard alphabet, padding required, non-zero trailing bits accepted.
const DECODER: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_allow_trailing_bits(true),
);

/// Decodes standard (padded) base64.
///
/// ASCII whitespace anywhere in the input is ignored so line-wrapped
/// payloads decode the same as single-line ones.
pub fn decode_base64(input: &str) -> Result<Vec<u8>> {
    let compact: String = input
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .collect();

    DECODER
        .decode(compact.as_bytes())
        .map_err(|e| EchoError::InvalidBase64 {
            message: format!("Invalid base64 encoding: {}", e),
        })
}

pub fn encode_base64(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

/// Lowercase hex, two digits per byte.
pub fn to_hex(bytes: &[u8]) -> String {
    hex::encode(bytes)
}
