//! Reversible transform between natural identifiers and index keys.
//!
//! Azure AI Search keys may only contain letters, digits, `_`, `-` and `=`.
//! Natural ids (usually URLs) are stored as URL-safe base64 of their UTF-8
//! bytes. Encoding always emits `=` padding. Decoding accepts keys without
//! padding, but padding that is present must be complete.

use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig};
use base64::engine::DecodePaddingMode;
use base64::Engine as _;

use crate::error::{Error, Result};

const KEY_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new()
        .with_encode_padding(true)
        .with_decode_padding_mode(DecodePaddingMode::RequireCanonical),
);

const UNPADDED_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new()
        .with_encode_padding(false)
        .with_decode_padding_mode(DecodePaddingMode::RequireNone),
);

/// Encode a natural id into a storage-safe key. `None` encodes to `""`.
pub fn encode_id(id: Option<&str>) -> String {
    match id {
        Some(id) => KEY_ENGINE.encode(id.as_bytes()),
        None => String::new(),
    }
}

/// Recover the natural id from a storage key. `None` decodes to `""`.
pub fn decode_id(encoded: Option<&str>) -> Result<String> {
    let Some(encoded) = encoded else { return Ok(String::new()) };
    let engine = if encoded.contains('=') { &KEY_ENGINE } else { &UNPADDED_ENGINE };
    let bytes = engine
        .decode(encoded.as_bytes())
        .map_err(|e| Error::Decoding(format!("'{encoded}': {e}")))?;
    String::from_utf8(bytes).map_err(|e| Error::Decoding(format!("'{encoded}' is not UTF-8: {e}")))
}
