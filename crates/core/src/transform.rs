use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

const WINDOWS_RESERVED_NAMES: &[&str] = &[
    "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7", "COM8",
    "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Transform {
    Upper,
    Lower,
    Title,
    StripDiacritics,
    Windows,
    Mac,
    Camel,
    Pascal,
}

impl Transform {
    pub const ALL: [Self; 8] = [
        Self::Upper,
        Self::Lower,
        Self::Title,
        Self::StripDiacritics,
        Self::Windows,
        Self::Mac,
        Self::Camel,
        Self::Pascal,
    ];

    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == name)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Upper => "up",
            Self::Lower => "lw",
            Self::Title => "ti",
            Self::StripDiacritics => "di",
            Self::Windows => "win",
            Self::Mac => "mac",
            Self::Camel => "cc",
            Self::Pascal => "pc",
        }
    }

    pub fn apply(self, input: &str) -> String {
        match self {
            Self::Upper => input.to_uppercase(),
            Self::Lower => input.to_lowercase(),
            Self::Title => title_case(input),
            Self::StripDiacritics => strip_diacritics(input),
            Self::Windows => windows_safe(input),
            Self::Mac => input.chars().filter(|&ch| ch != ':').collect(),
            Self::Camel => join_words(input, false),
            Self::Pascal => join_words(input, true),
        }
    }
}

fn title_case(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut word_start = true;
    for ch in input.chars() {
        if ch.is_alphanumeric() {
            if word_start {
                out.extend(ch.to_uppercase());
            } else {
                out.extend(ch.to_lowercase());
            }
            word_start = false;
        } else {
            out.push(ch);
            word_start = true;
        }
    }
    out
}

fn strip_diacritics(input: &str) -> String {
    input
        .nfd()
        .filter(|&ch| !is_combining_mark(ch))
        .nfc()
        .collect()
}

fn windows_safe(input: &str) -> String {
    let out: String = input.chars().filter(|&ch| !is_disallowed_char(ch)).collect();
    let mut out = out.trim_end_matches([' ', '.']).to_string();
    if is_windows_reserved(&out) {
        out.push_str("_file");
    }
    out
}

fn join_words(input: &str, capitalize_first: bool) -> String {
    let mut out = String::with_capacity(input.len());
    for (i, word) in split_words(input).iter().enumerate() {
        let mut chars = word.chars();
        let Some(first) = chars.next() else {
            continue;
        };
        if i > 0 || capitalize_first {
            out.extend(first.to_uppercase());
        } else {
            out.extend(first.to_lowercase());
        }
        out.extend(chars.flat_map(char::to_lowercase));
    }
    out
}

fn split_words(input: &str) -> Vec<String> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut prev_lower = false;
    for ch in input.chars() {
        if !ch.is_alphanumeric() {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            prev_lower = false;
            continue;
        }
        if ch.is_uppercase() && prev_lower && !current.is_empty() {
            words.push(std::mem::take(&mut current));
        }
        prev_lower = ch.is_lowercase() || ch.is_numeric();
        current.push(ch);
    }
    if !current.is_empty() {
        words.push(current);
    }
    words
}

fn is_disallowed_char(ch: char) -> bool {
    matches!(ch, '\\' | '/' | ':' | '*' | '?' | '"' | '<' | '>' | '|') || ch.is_control()
}

fn is_windows_reserved(value: &str) -> bool {
    let stem = value
        .split('.')
        .next()
        .unwrap_or(value)
        .to_ascii_uppercase();
    WINDOWS_RESERVED_NAMES
        .iter()
        .any(|reserved| reserved == &stem)
}
