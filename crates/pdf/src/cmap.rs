//! `/ToUnicode` CMaps: font character codes to Unicode text.
//!
//! Only the parts that carry text are read: `codespacerange` for the code
//! width, `bfchar` for single codes and `bfrange` in both its sequential and
//! array forms. Destinations are UTF-16BE hex strings, so surrogate pairs and
//! ligatures (`<00660069>` for "fi") come out as multi-char strings.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;

/// `<src> <dst>` pairs in `bfchar` and `codespacerange` sections.
static PAIR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<([0-9A-Fa-f]+)>\s*<([0-9A-Fa-f]*)>").unwrap());

/// `<start> <end> <dst>` or `<start> <end> [<dst> ...]`.
static RANGE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"<([0-9A-Fa-f]+)>\s*<([0-9A-Fa-f]+)>\s*(?:<([0-9A-Fa-f]*)>|\[([^\]]*)\])").unwrap()
});

static HEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"<([0-9A-Fa-f]*)>").unwrap());

/// Largest `bfrange` span expanded; wider ranges are malformed.
const MAX_RANGE: u32 = 0xFFFF;

/// A parsed `/ToUnicode` map.
#[derive(Debug, Clone, PartialEq)]
pub struct ToUnicode {
    /// Bytes per character code, 1 to 4.
    code_len: usize,
    map: HashMap<u32, String>,
}

impl ToUnicode {
    /// Parse a decompressed CMap stream. `None` when it maps no codes.
    pub fn parse(data: &[u8]) -> Option<Self> {
        let content = String::from_utf8_lossy(data);

        let mut code_len = 0;
        for section in sections(&content, "begincodespacerange", "endcodespacerange") {
            for caps in PAIR.captures_iter(section) {
                code_len = code_len.max(byte_len(&caps[1]));
            }
        }

        let mut map = HashMap::new();
        let mut widest = 0;

        for section in sections(&content, "beginbfchar", "endbfchar") {
            for caps in PAIR.captures_iter(section) {
                if let (Some(code), Some(text)) = (hex_code(&caps[1]), hex_text(&caps[2])) {
                    widest = widest.max(byte_len(&caps[1]));
                    map.insert(code, text);
                }
            }
        }

        for section in sections(&content, "beginbfrange", "endbfrange") {
            for caps in RANGE.captures_iter(section) {
                let (Some(start), Some(end)) = (hex_code(&caps[1]), hex_code(&caps[2])) else {
                    continue;
                };
                if end < start || end - start > MAX_RANGE {
                    log::warn!("ToUnicode: skipping bfrange <{}> <{}>", &caps[1], &caps[2]);
                    continue;
                }
                widest = widest.max(byte_len(&caps[1]));

                if let Some(dst) = caps.get(3) {
                    let Some(units) = hex_units(dst.as_str()) else {
                        continue;
                    };
                    // The last code unit increments across the range.
                    for (offset, code) in (start..=end).enumerate() {
                        let mut units = units.clone();
                        if let Some(last) = units.last_mut() {
                            *last = last.wrapping_add(offset as u16);
                        }
                        map.insert(code, String::from_utf16_lossy(&units));
                    }
                } else if let Some(array) = caps.get(4) {
                    for (code, dst) in (start..=end).zip(HEX.captures_iter(array.as_str())) {
                        if let Some(text) = hex_text(&dst[1]) {
                            map.insert(code, text);
                        }
                    }
                }
            }
        }

        if map.is_empty() {
            return None;
        }
        let code_len = if code_len == 0 { widest } else { code_len };
        log::trace!("ToUnicode: {} codes, {} bytes each", map.len(), code_len);
        Some(Self {
            code_len: code_len.clamp(1, 4),
            map,
        })
    }

    /// Text for a shown string. Unmapped codes are dropped.
    pub fn decode(&self, bytes: &[u8]) -> String {
        bytes
            .chunks(self.code_len)
            .filter_map(|chunk| self.map.get(&code_of(chunk)))
            .map(String::as_str)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

/// Bodies between each `begin` marker and the following `end` marker.
fn sections<'a>(content: &'a str, begin: &str, end: &str) -> Vec<&'a str> {
    let mut found = Vec::new();
    let mut rest = content;
    while let Some(start) = rest.find(begin) {
        let after = &rest[start + begin.len()..];
        let Some(stop) = after.find(end) else {
            break;
        };
        found.push(&after[..stop]);
        rest = &after[stop + end.len()..];
    }
    found
}

fn byte_len(hex: &str) -> usize {
    hex.len().div_ceil(2)
}

fn code_of(bytes: &[u8]) -> u32 {
    bytes.iter().fold(0, |acc, &b| (acc << 8) | u32::from(b))
}

fn hex_code(hex: &str) -> Option<u32> {
    if hex.len() > 8 {
        return None;
    }
    u32::from_str_radix(hex, 16).ok()
}

/// Hex digits as UTF-16BE code units; an odd digit count is left-padded.
fn hex_units(hex: &str) -> Option<Vec<u16>> {
    if hex.is_empty() {
        return None;
    }
    let padded = match hex.len() % 4 {
        0 => hex.to_string(),
        rem => format!("{}{}", "0".repeat(4 - rem), hex),
    };
    (0..padded.len())
        .step_by(4)
        .map(|i| u16::from_str_radix(&padded[i..i + 4], 16).ok())
        .collect()
}

fn hex_text(hex: &str) -> Option<String> {
    hex_units(hex).map(|units| String::from_utf16_lossy(&units))
}
