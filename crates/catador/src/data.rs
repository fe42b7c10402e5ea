//! Test-data factory.
//!
//! Entity names in the application accept a wide range of inputs; the
//! factory produces one value per character class so a flow can be driven
//! across the whole range, plus the standard invalid inputs and unique
//! names for re-runnable flows.

use uuid::Uuid;

/// Character classes the application's name fields are exercised with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StringKind {
    /// ASCII letters
    Alpha,
    /// ASCII digits
    Numeric,
    /// ASCII letters and digits
    Alphanumeric,
    /// Accented Latin-1 letters
    Latin1,
    /// Mixed multi-byte text
    Utf8,
    /// CJK ideographs
    Cjk,
    /// A name wrapped in markup
    Html,
}

impl StringKind {
    /// All classes, in a fixed order
    pub const ALL: [Self; 7] = [
        Self::Alpha,
        Self::Numeric,
        Self::Alphanumeric,
        Self::Latin1,
        Self::Utf8,
        Self::Cjk,
        Self::Html,
    ];
}

const ALPHA: &[char] = &[
    'a', 'b', 'c', 'd', 'e', 'f', 'g', 'h', 'i', 'j', 'k', 'm', 'n', 'p', 'q', 'r', 's', 't',
    'u', 'v', 'w', 'x', 'y', 'z', 'A', 'B', 'C', 'D', 'E', 'F', 'G', 'H', 'K', 'M', 'N', 'P',
];
const NUMERIC: &[char] = &['0', '1', '2', '3', '4', '5', '6', '7', '8', '9'];
const LATIN1: &[char] = &[
    'à', 'á', 'â', 'ã', 'ä', 'å', 'è', 'é', 'ê', 'ë', 'ì', 'í', 'î', 'ï', 'ñ', 'ò', 'ó', 'ô',
    'õ', 'ö', 'ù', 'ú', 'û', 'ü', 'ç', 'ý',
];
const CJK: &[char] = &[
    '字', '体', '试', '验', '内', '容', '服', '务', '器', '管', '理', '部', '署', '订', '阅',
    '产', '品',
];

fn random_bytes(count: usize) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(count + 16);
    while bytes.len() < count {
        bytes.extend_from_slice(Uuid::new_v4().as_bytes());
    }
    bytes.truncate(count);
    bytes
}

fn from_alphabet(alphabet: &[char], len: usize) -> String {
    random_bytes(len)
        .into_iter()
        .map(|b| alphabet[b as usize % alphabet.len()])
        .collect()
}

/// Generate a value of the given class and length.
///
/// For [`StringKind::Html`] the length applies to the text inside the tag.
#[must_use]
pub fn generate(kind: StringKind, len: usize) -> String {
    match kind {
        StringKind::Alpha => from_alphabet(ALPHA, len),
        StringKind::Numeric => from_alphabet(NUMERIC, len),
        StringKind::Alphanumeric => {
            let mixed: Vec<char> = ALPHA.iter().chain(NUMERIC).copied().collect();
            from_alphabet(&mixed, len)
        }
        StringKind::Latin1 => from_alphabet(LATIN1, len),
        StringKind::Cjk => from_alphabet(CJK, len),
        StringKind::Utf8 => {
            let mixed: Vec<char> = ALPHA.iter().chain(LATIN1).chain(CJK).copied().collect();
            from_alphabet(&mixed, len)
        }
        StringKind::Html => format!("<b>{}</b>", from_alphabet(ALPHA, len)),
    }
}

/// One valid name per character class
#[must_use]
pub fn valid_names(len: usize) -> Vec<String> {
    StringKind::ALL.iter().map(|&k| generate(k, len)).collect()
}

/// The standard invalid name inputs: empty, whitespace-only, over-length
#[must_use]
pub fn invalid_names() -> Vec<String> {
    vec![
        String::new(),
        "   ".to_string(),
        "\t".to_string(),
        generate(StringKind::Alpha, 256),
    ]
}

/// A unique name for re-runnable flows, `prefix-xxxxxxxx`
#[must_use]
pub fn unique_name(prefix: &str) -> String {
    let id = Uuid::new_v4().simple().to_string();
    format!("{prefix}-{}", &id[..8])
}
