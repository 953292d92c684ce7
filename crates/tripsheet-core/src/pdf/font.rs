//! Glyph metrics and text decoding for page fonts.

use lazy_static::lazy_static;
use lopdf::{Dictionary, Document, Object};
use regex::Regex;
use std::collections::HashMap;
use tracing::trace;

/// Width used for glyphs of fonts without a `Widths` array, in 1/1000 em.
pub const ESTIMATED_WIDTH: f32 = 500.0;

lazy_static! {
    static ref BFCHAR_SECTION: Regex = Regex::new(r"(?s)beginbfchar(.*?)endbfchar").unwrap();
    static ref BFRANGE_SECTION: Regex = Regex::new(r"(?s)beginbfrange(.*?)endbfrange").unwrap();
    static ref BFCHAR_ENTRY: Regex =
        Regex::new(r"<([0-9A-Fa-f]+)>\s*<([0-9A-Fa-f]*)>").unwrap();
    static ref BFRANGE_ENTRY: Regex =
        Regex::new(r"<([0-9A-Fa-f]+)>\s*<([0-9A-Fa-f]+)>\s*(<[0-9A-Fa-f]*>|\[[^\]]*\])").unwrap();
    static ref HEX_STRING: Regex = Regex::new(r"<([0-9A-Fa-f]*)>").unwrap();
}

/// What the interpreter needs to know about one font resource.
#[derive(Debug, Clone, PartialEq)]
pub struct FontMetrics {
    /// Composite font: codes are two bytes wide.
    pub two_byte: bool,
    pub first_char: u32,
    /// Simple-font widths from `FirstChar` on, in 1/1000 em.
    pub widths: Vec<f32>,
    /// Composite-font widths by CID.
    pub cid_widths: HashMap<u32, f32>,
    /// Width of codes not covered above.
    pub default_width: f32,
    pub to_unicode: HashMap<u32, String>,
}

impl Default for FontMetrics {
    fn default() -> Self {
        Self {
            two_byte: false,
            first_char: 0,
            widths: Vec::new(),
            cid_widths: HashMap::new(),
            default_width: ESTIMATED_WIDTH,
            to_unicode: HashMap::new(),
        }
    }
}

impl FontMetrics {
    /// Read metrics from a font dictionary. Missing or malformed entries fall
    /// back to estimates rather than failing the page.
    pub fn load(doc: &Document, font: &Dictionary) -> Self {
        let mut metrics = Self::default();

        let subtype = font.get(b"Subtype").ok().and_then(|o| o.as_name().ok());
        if subtype == Some(b"Type0".as_slice()) {
            metrics.two_byte = true;
            metrics.default_width = 1000.0;
            if let Some(descendant) = descendant_font(doc, font) {
                if let Some(dw) = descendant.get(b"DW").ok().and_then(number) {
                    metrics.default_width = dw;
                }
                if let Some(w) = descendant.get(b"W").ok().and_then(|o| resolve(doc, o)) {
                    if let Ok(items) = w.as_array() {
                        metrics.cid_widths = parse_cid_widths(doc, items);
                    }
                }
            }
        } else {
            metrics.first_char = font
                .get(b"FirstChar")
                .ok()
                .and_then(|o| o.as_i64().ok())
                .unwrap_or(0)
                .max(0) as u32;
            if let Some(Ok(widths)) = font
                .get(b"Widths")
                .ok()
                .and_then(|o| resolve(doc, o))
                .map(Object::as_array)
            {
                metrics.widths = widths
                    .iter()
                    .map(|w| resolve(doc, w).and_then(number).unwrap_or(0.0))
                    .collect();
            }
            let missing = font
                .get(b"FontDescriptor")
                .ok()
                .and_then(|o| resolve(doc, o))
                .and_then(|o| o.as_dict().ok())
                .and_then(|d| d.get(b"MissingWidth").ok())
                .and_then(number);
            if let Some(missing) = missing {
                metrics.default_width = missing;
            }
        }

        if let Some(Object::Stream(stream)) =
            font.get(b"ToUnicode").ok().and_then(|o| resolve(doc, o))
        {
            let data = stream
                .decompressed_content()
                .unwrap_or_else(|_| stream.content.clone());
            metrics.to_unicode = parse_to_unicode(&String::from_utf8_lossy(&data));
            trace!("ToUnicode map with {} entries", metrics.to_unicode.len());
        }

        metrics
    }

    /// Advance width of a code, in 1/1000 em.
    pub fn glyph_width(&self, code: u32) -> f32 {
        if self.two_byte {
            return self.cid_widths.get(&code).copied().unwrap_or(self.default_width);
        }
        if self.widths.is_empty() {
            return self.default_width;
        }
        code.checked_sub(self.first_char)
            .and_then(|i| self.widths.get(i as usize))
            .copied()
            .unwrap_or(self.default_width)
    }

    /// Split a string operand into codes and their text.
    pub fn decode(&self, bytes: &[u8]) -> Vec<(u32, String)> {
        if !self.two_byte && bytes.starts_with(&[0xFE, 0xFF]) {
            let units: Vec<u16> = bytes[2..]
                .chunks(2)
                .map(|pair| u16::from_be_bytes([pair[0], pair.get(1).copied().unwrap_or(0)]))
                .collect();
            return char::decode_utf16(units)
                .map(|c| {
                    let c = c.unwrap_or(char::REPLACEMENT_CHARACTER);
                    (c as u32, c.to_string())
                })
                .collect();
        }

        let codes: Vec<u32> = if self.two_byte {
            bytes
                .chunks(2)
                .map(|pair| match pair {
                    [hi, lo] => u32::from(*hi) << 8 | u32::from(*lo),
                    [single] => u32::from(*single),
                    _ => 0,
                })
                .collect()
        } else {
            bytes.iter().map(|b| u32::from(*b)).collect()
        };

        codes
            .into_iter()
            .map(|code| {
                let text = match self.to_unicode.get(&code) {
                    Some(mapped) => mapped.clone(),
                    None => char::from_u32(code).map(String::from).unwrap_or_default(),
                };
                (code, text)
            })
            .collect()
    }
}

/// Parse the `bfchar` and `bfrange` sections of a ToUnicode CMap.
pub fn parse_to_unicode(cmap: &str) -> HashMap<u32, String> {
    let mut map = HashMap::new();

    for section in BFCHAR_SECTION.captures_iter(cmap) {
        for entry in BFCHAR_ENTRY.captures_iter(&section[1]) {
            if let Some(code) = hex_code(&entry[1]) {
                map.insert(code, utf16_hex(&entry[2]));
            }
        }
    }

    for section in BFRANGE_SECTION.captures_iter(cmap) {
        for entry in BFRANGE_ENTRY.captures_iter(&section[1]) {
            let (Some(low), Some(high)) = (hex_code(&entry[1]), hex_code(&entry[2])) else {
                continue;
            };
            if high < low || high - low > 0xFFFF {
                continue;
            }
            let target = &entry[3];
            if target.starts_with('[') {
                for (code, dst) in (low..=high).zip(HEX_STRING.captures_iter(target)) {
                    map.insert(code, utf16_hex(&dst[1]));
                }
            } else {
                let mut units = utf16_units(target.trim_matches(|c| c == '<' || c == '>'));
                for code in low..=high {
                    map.insert(code, String::from_utf16_lossy(&units));
                    if let Some(last) = units.last_mut() {
                        *last = last.wrapping_add(1);
                    }
                }
            }
        }
    }

    map
}

fn descendant_font<'a>(doc: &'a Document, font: &'a Dictionary) -> Option<&'a Dictionary> {
    let descendants = resolve(doc, font.get(b"DescendantFonts").ok()?)?;
    let first = descendants.as_array().ok()?.first()?;
    resolve(doc, first)?.as_dict().ok()
}

/// `W` array: `c [w1 w2 ...]` or `c_first c_last w`.
fn parse_cid_widths(doc: &Document, items: &[Object]) -> HashMap<u32, f32> {
    let mut widths = HashMap::new();
    let mut i = 0;
    while i < items.len() {
        let Some(first) = number(&items[i]) else { break };
        let first = first as u32;
        match items.get(i + 1).and_then(|o| resolve(doc, o)) {
            Some(Object::Array(list)) => {
                for (offset, w) in list.iter().enumerate() {
                    let Some(cid) = u32::try_from(offset).ok().and_then(|o| first.checked_add(o)) else {
                        break;
                    };
                    if let Some(w) = number(w) {
                        widths.insert(cid, w);
                    }
                }
                i += 2;
            }
            Some(last) => {
                let (Some(last), Some(w)) = (number(last), items.get(i + 2).and_then(number)) else {
                    break;
                };
                for cid in first..=(last as u32).min(first.saturating_add(0xFFFF)) {
                    widths.insert(cid, w);
                }
                i += 3;
            }
            None => break,
        }
    }
    widths
}

pub(crate) fn resolve<'a>(doc: &'a Document, obj: &'a Object) -> Option<&'a Object> {
    doc.dereference(obj).ok().map(|(_, o)| o)
}

pub(crate) fn number(obj: &Object) -> Option<f32> {
    match obj {
        Object::Integer(i) => Some(*i as f32),
        Object::Real(r) => Some(*r as f32),
        _ => None,
    }
}

fn hex_code(hex: &str) -> Option<u32> {
    u32::from_str_radix(hex, 16).ok()
}

fn utf16_units(hex: &str) -> Vec<u16> {
    hex.as_bytes()
        .chunks(4)
        .filter_map(|unit| std::str::from_utf8(unit).ok())
        .filter_map(|unit| u16::from_str_radix(unit, 16).ok())
        .collect()
}

fn utf16_hex(hex: &str) -> String {
    String::from_utf16_lossy(&utf16_units(hex))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const CMAP: &str = "/CIDInit /ProcSet findresource begin\n\
        2 beginbfchar\n<0003> <0020>\n<0011> <00D1>\nendbfchar\n\
        1 beginbfrange\n<0024> <0026> <0041>\nendbfrange\n\
        1 beginbfrange\n<0030> <0031> [<0061> <0062>]\nendbfrange\nend";

    #[test]
    fn test_parse_to_unicode() {
        let map = parse_to_unicode(CMAP);
        assert_eq!(map.get(&0x03).map(String::as_str), Some(" "));
        assert_eq!(map.get(&0x11).map(String::as_str), Some("Ñ"));
        assert_eq!(map.get(&0x24).map(String::as_str), Some("A"));
        assert_eq!(map.get(&0x26).map(String::as_str), Some("C"));
        assert_eq!(map.get(&0x31).map(String::as_str), Some("b"));
        assert_eq!(map.len(), 7);
    }

    #[test]
    fn test_decode_simple_font_as_latin1() {
        let font = FontMetrics::default();
        let decoded: String = font.decode(b"Pe\xf1a").into_iter().map(|(_, t)| t).collect();
        assert_eq!(decoded, "Peña");
    }

    #[test]
    fn test_decode_two_byte_font_with_map() {
        let font = FontMetrics {
            two_byte: true,
            to_unicode: parse_to_unicode(CMAP),
            ..Default::default()
        };
        let decoded: Vec<(u32, String)> = font.decode(&[0x00, 0x24, 0x00, 0x03, 0x00, 0x25]);
        let text: String = decoded.iter().map(|(_, t)| t.as_str()).collect();
        assert_eq!(text, "A B");
        assert_eq!(decoded[0].0, 0x24);
    }

    #[test]
    fn test_decode_utf16_bom() {
        let font = FontMetrics::default();
        let decoded: String = font
            .decode(&[0xFE, 0xFF, 0x00, 0x4F, 0x00, 0x4B])
            .into_iter()
            .map(|(_, t)| t)
            .collect();
        assert_eq!(decoded, "OK");
    }

    #[test]
    fn test_glyph_width_lookup() {
        let font = FontMetrics {
            first_char: 32,
            widths: vec![250.0, 333.0],
            default_width: 0.0,
            ..Default::default()
        };
        assert_eq!(font.glyph_width(32), 250.0);
        assert_eq!(font.glyph_width(33), 333.0);
        assert_eq!(font.glyph_width(40), 0.0);
        assert_eq!(font.glyph_width(10), 0.0);
        assert_eq!(FontMetrics::default().glyph_width(65), ESTIMATED_WIDTH);
    }

    #[test]
    fn test_cid_widths() {
        let doc = Document::new();
        let items = vec![
            Object::Integer(1),
            Object::Array(vec![Object::Integer(500), Object::Integer(600)]),
            Object::Integer(10),
            Object::Integer(12),
            Object::Integer(700),
        ];
        let widths = parse_cid_widths(&doc, &items);
        assert_eq!(widths.get(&2), Some(&600.0));
        assert_eq!(widths.get(&11), Some(&700.0));
        assert_eq!(widths.len(), 5);
    }

    #[test]
    fn test_cid_widths_near_code_ceiling() {
        let doc = Document::new();
        let ranged = vec![
            Object::Integer(4_294_967_000),
            Object::Integer(4_294_967_100),
            Object::Integer(500),
        ];
        let widths = parse_cid_widths(&doc, &ranged);
        assert!(!widths.is_empty());
        assert!(widths.values().all(|w| *w == 500.0));

        let listed = vec![
            Object::Integer(i64::MAX),
            Object::Array(vec![Object::Integer(1), Object::Integer(2), Object::Integer(3)]),
        ];
        let widths = parse_cid_widths(&doc, &listed);
        assert_eq!(widths.len(), 1);
        assert_eq!(widths.get(&u32::MAX), Some(&1.0));
    }
}
