//! Page geometry: one PDF unit per source pixel.
//!
//! Every rendered page takes its size from its own image, so a document can
//! mix portrait scans, landscape spreads and odd-sized screenshots. Only
//! placeholder pages use a fixed default size.

use serde::{Deserialize, Serialize};

/// A4 portrait in PDF points.
pub const A4_PORTRAIT: (f32, f32) = (595.28, 841.89);

/// US Letter portrait in PDF points.
pub const LETTER_PORTRAIT: (f32, f32) = (612.0, 792.0);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    Portrait,
    Landscape,
}

/// Size and orientation of one output page.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageGeometry {
    pub width: f32,
    pub height: f32,
    pub orientation: Orientation,
}

impl PageGeometry {
    /// Geometry for an image of `width` × `height` pixels.
    ///
    /// Landscape iff strictly wider than tall; square images are portrait.
    pub fn for_image(width: u32, height: u32) -> Self {
        let orientation = if width > height {
            Orientation::Landscape
        } else {
            Orientation::Portrait
        };
        Self {
            width: width as f32,
            height: height as f32,
            orientation,
        }
    }

    /// Default-sized page used in place of an entry that failed.
    pub fn placeholder((width, height): (f32, f32)) -> Self {
        let orientation = if width > height {
            Orientation::Landscape
        } else {
            Orientation::Portrait
        };
        Self {
            width,
            height,
            orientation,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wide_image_is_landscape() {
        let g = PageGeometry::for_image(1600, 900);
        assert_eq!(g.orientation, Orientation::Landscape);
        assert_eq!((g.width, g.height), (1600.0, 900.0));
    }

    #[test]
    fn tall_and_square_images_are_portrait() {
        assert_eq!(
            PageGeometry::for_image(800, 1200).orientation,
            Orientation::Portrait
        );
        assert_eq!(
            PageGeometry::for_image(500, 500).orientation,
            Orientation::Portrait
        );
    }

    #[test]
    fn placeholder_defaults_to_a4_portrait() {
        let g = PageGeometry::placeholder(A4_PORTRAIT);
        assert_eq!(g.orientation, Orientation::Portrait);
        assert_eq!(g.width, 595.28);
    }
}
