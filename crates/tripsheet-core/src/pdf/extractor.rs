//! Page access over a loaded lopdf document.

use image::{DynamicImage, ImageBuffer, Rgba};
use lopdf::content::Content;
use lopdf::{Dictionary, Document, Object, ObjectId};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use tracing::{debug, trace};

use super::content::{interpret, PageContent};
use super::font::{resolve, FontMetrics};
use super::grid::{lines_tables, text_tables};
use super::layout::{layout_text, plain_text, text_lines};
use super::{DocumentTableMode, PageSource, Result, Table, TableMode};
use crate::error::PdfError;

/// An opened PDF. Owns the parsed document and the bytes it came from.
pub struct PdfDocument {
    document: Document,
    raw_data: Vec<u8>,
    pages: BTreeMap<u32, ObjectId>,
}

impl PdfDocument {
    /// Parse a document from memory.
    ///
    /// Documents encrypted with an empty user password are decrypted;
    /// any other encryption is an error, as is a document without pages.
    pub fn load(data: &[u8]) -> Result<Self> {
        let mut document = Document::load_mem(data).map_err(|e| PdfError::Parse(e.to_string()))?;

        let raw_data = if document.is_encrypted() {
            if document.decrypt("").is_err() {
                return Err(PdfError::Encrypted);
            }
            debug!("Decrypted PDF with empty password");

            // The alternate decoder reads bytes, so keep the decrypted form.
            let mut decrypted = Vec::new();
            document
                .save_to(&mut decrypted)
                .map_err(|e| PdfError::Parse(format!("Failed to save decrypted PDF: {}", e)))?;
            decrypted
        } else {
            data.to_vec()
        };

        let pages = document.get_pages();
        if pages.is_empty() {
            return Err(PdfError::NoPages);
        }

        debug!("Loaded PDF with {} pages", pages.len());
        Ok(Self {
            document,
            raw_data,
            pages,
        })
    }

    /// Read and parse a document from disk.
    pub fn open(path: impl AsRef<Path>) -> crate::Result<Self> {
        let data = std::fs::read(path.as_ref())?;
        Ok(Self::load(&data)?)
    }

    /// Bytes of the (decrypted) document.
    pub fn raw_data(&self) -> &[u8] {
        &self.raw_data
    }

    fn page_id(&self, page: u32) -> Result<ObjectId> {
        self.pages.get(&page).copied().ok_or(PdfError::InvalidPage(page))
    }

    /// Positioned text and ruling segments of a page.
    pub fn page_content(&self, page: u32) -> Result<PageContent> {
        let page_id = self.page_id(page)?;
        let bytes = self
            .document
            .get_page_content(page_id)
            .map_err(|e| PdfError::TextExtraction(e.to_string()))?;
        let content = Content::decode(&bytes).map_err(|e| PdfError::TextExtraction(e.to_string()))?;

        let fonts = self.page_fonts(page_id);
        trace!("Page {}: {} operators, {} fonts", page, content.operations.len(), fonts.len());
        Ok(interpret(&content.operations, &fonts))
    }

    fn page_fonts(&self, page_id: ObjectId) -> HashMap<Vec<u8>, FontMetrics> {
        let doc = &self.document;
        let Some(resources) = get_page_resources(doc, page_id) else {
            return HashMap::new();
        };
        let Some(Ok(fonts)) = resources
            .get(b"Font")
            .ok()
            .and_then(|o| resolve(doc, o))
            .map(Object::as_dict)
        else {
            return HashMap::new();
        };

        fonts
            .iter()
            .filter_map(|(name, obj)| {
                let dict = resolve(doc, obj)?.as_dict().ok()?;
                Some((name.clone(), FontMetrics::load(doc, dict)))
            })
            .collect()
    }

    /// Image XObjects drawn by a page.
    pub fn page_images(&self, page: u32) -> Result<Vec<DynamicImage>> {
        let doc = &self.document;
        let page_id = self.page_id(page)?;

        let mut images = Vec::new();
        if let Some(resources) = get_page_resources(doc, page_id) {
            if let Ok(xobjects) = resources.get(b"XObject") {
                if let Ok((_, Object::Dictionary(xobj_dict))) = doc.dereference(xobjects) {
                    for (_name, obj_ref) in xobj_dict.iter() {
                        if let Ok((_, obj)) = doc.dereference(obj_ref) {
                            if let Some(img) = try_extract_image(doc, obj) {
                                images.push(img);
                            }
                        }
                    }
                }
            }
        }

        debug!("Extracted {} images from page {}", images.len(), page);
        Ok(images)
    }
}

impl PageSource for PdfDocument {
    fn page_count(&self) -> u32 {
        self.pages.len() as u32
    }

    fn extract_tables(&self, page: u32, mode: TableMode) -> Result<Vec<Table>> {
        let content = self.page_content(page)?;
        let lines = text_lines(&content.chunks);
        let tables = match mode {
            TableMode::Lines => lines_tables(&content.segments, &lines),
            TableMode::Text => text_tables(&lines),
        };
        trace!("Page {}: {} tables in {:?} mode", page, tables.len(), mode);
        Ok(tables)
    }

    fn extract_text(&self, page: u32, layout: bool) -> Result<String> {
        let content = self.page_content(page)?;
        let lines = text_lines(&content.chunks);
        Ok(if layout { layout_text(&lines) } else { plain_text(&lines) })
    }

    fn render_page(&self, page: u32, dpi: u32) -> Result<Vec<DynamicImage>> {
        // Embedded scans are used at their own resolution.
        trace!("Rendering page {} (requested {} dpi)", page, dpi);
        self.page_images(page)
    }

    #[cfg(feature = "alt-tables")]
    fn document_tables(&self, mode: DocumentTableMode) -> Result<Vec<Table>> {
        use super::grid::split_text_tables;

        let text = pdf_extract::extract_text_from_mem(&self.raw_data)
            .map_err(|e| PdfError::TextExtraction(e.to_string()))?;
        Ok(split_text_tables(&text, mode))
    }

    #[cfg(not(feature = "alt-tables"))]
    fn document_tables(&self, _mode: DocumentTableMode) -> Result<Vec<Table>> {
        Ok(Vec::new())
    }
}

fn try_extract_image(doc: &Document, obj: &Object) -> Option<DynamicImage> {
    let Object::Stream(stream) = obj else {
        return None;
    };
    let dict = &stream.dict;

    if dict.get(b"Subtype").ok()?.as_name().ok()? != b"Image" {
        return None;
    }

    let width = dict.get(b"Width").ok()?.as_i64().ok()? as u32;
    let height = dict.get(b"Height").ok()?.as_i64().ok()? as u32;
    trace!("Found image object: {}x{}", width, height);

    if let Ok(filter) = dict.get(b"Filter") {
        let filter_name = match filter {
            Object::Name(name) => Some(name.as_slice()),
            Object::Array(arr) => arr.first().and_then(|o| o.as_name().ok()),
            _ => None,
        };

        match filter_name {
            Some(b"DCTDecode") => {
                return image::load_from_memory_with_format(&stream.content, image::ImageFormat::Jpeg)
                    .ok();
            }
            Some(b"JPXDecode") | Some(b"CCITTFaxDecode") | Some(b"JBIG2Decode") => {
                trace!("Unsupported image filter");
                return None;
            }
            _ => {}
        }
    }

    let data = stream
        .decompressed_content()
        .unwrap_or_else(|_| stream.content.clone());

    let color_space = dict
        .get(b"ColorSpace")
        .ok()
        .and_then(|o| match o {
            Object::Name(name) => Some(name.as_slice()),
            Object::Array(arr) => arr.first().and_then(|o| o.as_name().ok()),
            Object::Reference(r) => doc.get_object(*r).ok().and_then(|o| o.as_name().ok()),
            _ => None,
        })
        .unwrap_or(b"DeviceRGB");

    let bits = dict
        .get(b"BitsPerComponent")
        .ok()
        .and_then(|o| o.as_i64().ok())
        .unwrap_or(8);

    image_from_samples(&data, width, height, color_space, bits)
}

/// Build an RGBA image from raw 8-bit RGB or gray samples.
fn image_from_samples(
    data: &[u8],
    width: u32,
    height: u32,
    color_space: &[u8],
    bits_per_component: i64,
) -> Option<DynamicImage> {
    if bits_per_component != 8 {
        trace!("Unsupported bits per component: {}", bits_per_component);
        return None;
    }

    let pixels = (width as usize).checked_mul(height as usize)?;
    let rgba: Vec<u8> = match color_space {
        b"DeviceRGB" | b"RGB" if data.len() >= pixels * 3 => data[..pixels * 3]
            .chunks_exact(3)
            .flat_map(|p| [p[0], p[1], p[2], 255])
            .collect(),
        b"DeviceGray" | b"G" if data.len() >= pixels => data[..pixels]
            .iter()
            .flat_map(|&g| [g, g, g, 255])
            .collect(),
        _ => {
            trace!(
                "Could not decode image: {} bytes, colorspace {:?}",
                data.len(),
                String::from_utf8_lossy(color_space)
            );
            return None;
        }
    };

    ImageBuffer::<Rgba<u8>, _>::from_raw(width, height, rgba).map(DynamicImage::ImageRgba8)
}

/// Resources of a page, inherited from the page tree when the page has none.
fn get_page_resources(doc: &Document, node_id: ObjectId) -> Option<&Dictionary> {
    let Object::Dictionary(dict) = doc.get_object(node_id).ok()? else {
        return None;
    };

    if let Ok(resources) = dict.get(b"Resources") {
        if let Ok((_, Object::Dictionary(res_dict))) = doc.dereference(resources) {
            return Some(res_dict);
        }
    }

    match dict.get(b"Parent") {
        Ok(Object::Reference(parent_id)) => get_page_resources(doc, *parent_id),
        _ => None,
    }
}
