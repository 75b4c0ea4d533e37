//! Inline image payloads: self-contained `data:image/...;base64,...` strings.
//!
//! Screen captures and bulk imports arrive as data URLs; remote fetches are
//! converted into the same [`InlineImage`] form so the decode stage never
//! cares where the bytes came from.

use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig, STANDARD};
use base64::engine::DecodePaddingMode;
use base64::Engine as _;
use once_cell::sync::Lazy;
use regex::Regex;

/// Prefix that marks a source string as an inline image payload.
pub const INLINE_IMAGE_PREFIX: &str = "data:image";

/// MIME type used when a fetch response carries no `Content-Type`.
pub const FALLBACK_MIME: &str = "application/octet-stream";

/// Decoder that accepts payloads with or without trailing `=` padding.
const LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

static DATA_URL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?s)^data:(?P<mime>[A-Za-z0-9!#$&^_.+-]+/[A-Za-z0-9!#$&^_.+-]+)?(?P<params>(?:;[^;,]*)*?)(?P<b64>;base64)?,(?P<data>.*)$",
    )
    .unwrap()
});

/// Returns `true` when `source` carries its image bytes inline.
pub fn is_inline_payload(source: &str) -> bool {
    source.starts_with(INLINE_IMAGE_PREFIX)
}

/// Decoded image bytes plus the MIME type they were labelled with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineImage {
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl InlineImage {
    pub fn new(mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            mime_type: mime_type.into(),
            bytes,
        }
    }

    /// Parse a base64 data URL.
    ///
    /// Only base64 payloads are accepted; percent-encoded data URLs are not
    /// produced by any capture path and are reported as malformed.
    pub fn parse(data_url: &str) -> Result<Self, String> {
        let caps = DATA_URL
            .captures(data_url)
            .ok_or_else(|| "not a data URL".to_string())?;

        if caps.name("b64").is_none() {
            return Err("only base64-encoded data URLs are supported".to_string());
        }

        let mime = caps
            .name("mime")
            .map(|m| m.as_str().to_ascii_lowercase())
            .unwrap_or_else(|| FALLBACK_MIME.to_string());

        // Pasted payloads sometimes contain line breaks from terminal wrapping.
        let data: String = caps["data"].chars().filter(|c| !c.is_whitespace()).collect();
        let bytes = LENIENT
            .decode(data.as_bytes())
            .map_err(|e| format!("invalid base64: {e}"))?;

        Ok(Self::new(mime, bytes))
    }

    /// Encode as a base64 data URL.
    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, STANDARD.encode(&self.bytes))
    }
}
