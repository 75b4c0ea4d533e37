//! Image decoding: resolved bytes → `DynamicImage` with intrinsic size.
//!
//! Decoding large scans is CPU-bound, so it runs on the blocking pool via
//! `spawn_blocking`; the compile loop awaits it and stays responsive.
//! The format is sniffed from the bytes, not trusted from the MIME label.

use crate::error::PageError;
use crate::payload::InlineImage;
use image::DynamicImage;
use tracing::debug;

/// A decoded page image.
#[derive(Debug, Clone)]
pub struct DecodedImage {
    pub image: DynamicImage,
    pub width: u32,
    pub height: u32,
}

/// Decode `inline` and measure its pixel dimensions.
pub async fn decode_image(
    inline: InlineImage,
    page_num: usize,
    label: &str,
) -> Result<DecodedImage, PageError> {
    let result = tokio::task::spawn_blocking(move || decode_blocking(&inline))
        .await
        .map_err(|e| format!("decode task panicked: {e}"))
        .and_then(|r| r);

    match result {
        Ok(image) => {
            let (width, height) = (image.width(), image.height());
            debug!("Page {}: decoded {}x{} px", page_num, width, height);
            Ok(DecodedImage {
                image,
                width,
                height,
            })
        }
        Err(detail) => Err(PageError::DecodeFailed {
            page: page_num,
            label: label.to_string(),
            detail,
        }),
    }
}

fn decode_blocking(inline: &InlineImage) -> Result<DynamicImage, String> {
    let image = image::load_from_memory(&inline.bytes)
        .map_err(|e| format!("{} ({} bytes): {e}", inline.mime_type, inline.bytes.len()))?;
    if image.width() == 0 || image.height() == 0 {
        return Err("image has zero width or height".to_string());
    }
    Ok(image)
}
