//! PDF assembly on top of `lopdf`.
//!
//! [`PdfAssembler`] mirrors the small drawing surface the compiler needs:
//! start empty, begin a page of a given geometry, draw an image filling it,
//! draw marker text, and finish into bytes. Pages are built one at a time;
//! beginning a new page seals the previous one.
//!
//! ## Coordinates
//!
//! Callers use top-left page coordinates. PDF's origin is bottom-left, so
//! text positions are flipped against the page height here.

use crate::error::PagebindError;
use crate::pipeline::layout::PageGeometry;
use image::DynamicImage;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream};
use tracing::debug;

const FONT_RESOURCE: &str = "F1";

struct PendingPage {
    geometry: PageGeometry,
    operations: Vec<Operation>,
    xobjects: Dictionary,
    uses_font: bool,
}

/// Incrementally builds a multi-page PDF.
pub struct PdfAssembler {
    doc: Document,
    pages_id: ObjectId,
    font_id: Option<ObjectId>,
    kids: Vec<Object>,
    current: Option<PendingPage>,
    image_counter: usize,
}

impl Default for PdfAssembler {
    fn default() -> Self {
        Self::new()
    }
}

impl PdfAssembler {
    /// Start a document with zero pages.
    pub fn new() -> Self {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        Self {
            doc,
            pages_id,
            font_id: None,
            kids: Vec::new(),
            current: None,
            image_counter: 0,
        }
    }

    /// Pages begun so far, including the one being drawn.
    pub fn page_count(&self) -> usize {
        self.kids.len() + usize::from(self.current.is_some())
    }

    /// Seal the current page (if any) and begin a new one.
    pub fn add_page(&mut self, geometry: PageGeometry) -> Result<(), PagebindError> {
        self.seal_current()?;
        self.current = Some(PendingPage {
            geometry,
            operations: Vec::new(),
            xobjects: Dictionary::new(),
            uses_font: false,
        });
        Ok(())
    }

    /// Draw `image` over the whole current page, no margin.
    pub fn draw_image_full(&mut self, image: &DynamicImage) -> Result<(), PagebindError> {
        self.current_page()?;
        let image_id = self.embed_image(image);
        self.image_counter += 1;
        let name = format!("Im{}", self.image_counter);

        let page = self.current_page()?;
        let (w, h) = (page.geometry.width, page.geometry.height);
        page.xobjects.set(name.as_str(), Object::Reference(image_id));
        page.operations.extend([
            Operation::new("q", vec![]),
            Operation::new(
                "cm",
                vec![
                    Object::Real(w),
                    Object::Integer(0),
                    Object::Integer(0),
                    Object::Real(h),
                    Object::Integer(0),
                    Object::Integer(0),
                ],
            ),
            Operation::new("Do", vec![Object::Name(name.into_bytes())]),
            Operation::new("Q", vec![]),
        ]);
        Ok(())
    }

    /// Draw `text` with its baseline at (`x`, `y`) from the top-left corner.
    pub fn draw_text(
        &mut self,
        text: &str,
        x: f32,
        y: f32,
        font_size: f32,
    ) -> Result<(), PagebindError> {
        let page = self.current_page()?;
        let baseline = page.geometry.height - y;
        page.uses_font = true;
        page.operations.extend([
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec![FONT_RESOURCE.into(), Object::Real(font_size)]),
            Operation::new("Td", vec![Object::Real(x), Object::Real(baseline)]),
            Operation::new("Tj", vec![Object::string_literal(text)]),
            Operation::new("ET", vec![]),
        ]);
        Ok(())
    }

    /// Seal the last page and serialise the document.
    pub fn finish(mut self) -> Result<Vec<u8>, PagebindError> {
        self.seal_current()?;

        let kids = std::mem::take(&mut self.kids);
        let count = kids.len() as i64;
        self.doc.objects.insert(
            self.pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count,
            }),
        );

        let catalog_id = self.doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => self.pages_id,
        });
        self.doc.trailer.set("Root", catalog_id);
        self.doc.compress();

        let mut buf = Vec::new();
        self.doc
            .save_to(&mut buf)
            .map_err(|e| PagebindError::PdfAssembly(e.to_string()))?;
        debug!("Serialised PDF: {} pages, {} bytes", count, buf.len());
        Ok(buf)
    }

    fn current_page(&mut self) -> Result<&mut PendingPage, PagebindError> {
        self.current
            .as_mut()
            .ok_or_else(|| PagebindError::PdfAssembly("no page has been added yet".into()))
    }

    fn font_id(&mut self) -> ObjectId {
        if let Some(id) = self.font_id {
            return id;
        }
        let id = self.doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
            "Encoding" => "WinAnsiEncoding",
        });
        self.font_id = Some(id);
        id
    }

    /// Embed `image` as an RGB XObject, with an SMask when it has transparency.
    fn embed_image(&mut self, image: &DynamicImage) -> ObjectId {
        let rgba = image.to_rgba8();
        let (w, h) = rgba.dimensions();

        let mut rgb = Vec::with_capacity((w as usize) * (h as usize) * 3);
        let mut alpha = Vec::with_capacity((w as usize) * (h as usize));
        for px in rgba.pixels() {
            rgb.extend_from_slice(&px.0[..3]);
            alpha.push(px.0[3]);
        }

        let mut img_dict = dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => w as i64,
            "Height" => h as i64,
            "ColorSpace" => "DeviceRGB",
            "BitsPerComponent" => 8,
        };

        if alpha.iter().any(|&a| a < 255) {
            let smask = Stream::new(
                dictionary! {
                    "Type" => "XObject",
                    "Subtype" => "Image",
                    "Width" => w as i64,
                    "Height" => h as i64,
                    "ColorSpace" => "DeviceGray",
                    "BitsPerComponent" => 8,
                },
                alpha,
            );
            let smask_id = self.doc.add_object(smask);
            img_dict.set("SMask", Object::Reference(smask_id));
        }

        self.doc.add_object(Stream::new(img_dict, rgb))
    }

    fn seal_current(&mut self) -> Result<(), PagebindError> {
        let Some(page) = self.current.take() else {
            return Ok(());
        };

        let content = Content {
            operations: page.operations,
        };
        let content_id = self
            .doc
            .add_object(Stream::new(Dictionary::new(), content.encode()?));

        let mut resources = dictionary! {
            "XObject" => page.xobjects,
        };
        if page.uses_font {
            let font_id = self.font_id();
            resources.set(
                "Font",
                dictionary! {
                    FONT_RESOURCE => font_id,
                },
            );
        }

        let page_id = self.doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => self.pages_id,
            "MediaBox" => vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Real(page.geometry.width),
                Object::Real(page.geometry.height),
            ],
            "Contents" => content_id,
            "Resources" => resources,
        });
        self.kids.push(Object::Reference(page_id));
        Ok(())
    }
}
