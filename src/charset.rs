//! Character sets SQL Server character data may arrive in.
//!
//! Legacy collations use DOS/OEM code pages that are not part of the WHATWG
//! encoding standard, and ISO-8859-1 has to stay distinct from windows-1252
//! there. Everything else is resolved through `encoding_rs`.

use std::borrow::Cow;
use std::fmt;

use encoding_rs::Encoding;
use oem_cp::code_table::DECODING_TABLE_CP_MAP;

const LATIN1_LABELS: [&str; 9] = [
    "iso-8859-1",
    "iso8859-1",
    "iso_8859-1",
    "iso88591",
    "latin1",
    "l1",
    "cp819",
    "ibm819",
    "csisolatin1",
];

const OEM_PREFIXES: [&str; 4] = ["cp", "ibm", "oem", "dos"];

/// A resolved source character set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CharacterSet {
    /// Any encoding known to `encoding_rs`.
    Encoding(&'static Encoding),
    /// ISO-8859-1, where every byte is the code point of the same value.
    Latin1,
    /// A DOS/OEM code page such as 437 or 850.
    Oem(u16),
}

impl CharacterSet {
    /// Resolves a charset name the way a connection would report it,
    /// e.g. `CP850`, `ISO-8859-1` or `windows-1252`.
    pub fn for_label(label: &str) -> Option<CharacterSet> {
        let normalized = label.trim().to_ascii_lowercase();
        if LATIN1_LABELS.contains(&normalized.as_str()) {
            return Some(CharacterSet::Latin1);
        }
        if let Some(code_page) = oem_code_page(&normalized) {
            return Some(CharacterSet::Oem(code_page));
        }
        Encoding::for_label(normalized.as_bytes()).map(CharacterSet::Encoding)
    }

    /// Decodes `bytes` to UTF-8. The flag is set when malformed or
    /// unmapped input was replaced.
    pub fn decode<'a>(&self, bytes: &'a [u8]) -> (Cow<'a, str>, bool) {
        match self {
            CharacterSet::Encoding(encoding) => encoding.decode_without_bom_handling(bytes),
            CharacterSet::Latin1 => (bytes.iter().map(|&b| char::from(b)).collect(), false),
            CharacterSet::Oem(code_page) => match DECODING_TABLE_CP_MAP.get(code_page) {
                Some(table) => match table.decode_string_checked(bytes) {
                    Some(text) => (Cow::Owned(text), false),
                    None => (Cow::Owned(table.decode_string_lossy(bytes)), true),
                },
                None => (String::from_utf8_lossy(bytes), true),
            },
        }
    }
}

impl fmt::Display for CharacterSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CharacterSet::Encoding(encoding) => f.write_str(encoding.name()),
            CharacterSet::Latin1 => f.write_str("ISO-8859-1"),
            CharacterSet::Oem(code_page) => write!(f, "CP{code_page}"),
        }
    }
}

fn oem_code_page(label: &str) -> Option<u16> {
    let digits = OEM_PREFIXES
        .iter()
        .find_map(|prefix| label.strip_prefix(prefix))
        .unwrap_or(label)
        .trim_start_matches(&['-', '_'][..]);
    let code_page: u16 = digits.parse().ok()?;
    DECODING_TABLE_CP_MAP
        .get(&code_page)
        .is_some()
        .then_some(code_page)
}
