//! Output file naming.

use chrono::NaiveDate;
use unicode_normalization::UnicodeNormalization;

/// Turn a slide title into a file-name fragment.
///
/// Keeps ASCII letters and digits, Hangul, and whitespace; lowercases; joins
/// the remaining words with hyphens. Returns `None` when nothing survives.
pub fn safe_title(title: &str) -> Option<String> {
    let kept: String = title
        .nfc()
        .filter(|&c| c.is_ascii_alphanumeric() || is_hangul(c) || c.is_whitespace())
        .collect();
    let joined = kept
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
        .to_lowercase();
    (!joined.is_empty()).then_some(joined)
}

fn is_hangul(c: char) -> bool {
    matches!(c,
        '\u{AC00}'..='\u{D7A3}'     // syllables
        | '\u{1100}'..='\u{11FF}'   // jamo
        | '\u{3130}'..='\u{318F}')  // compatibility jamo
}

/// Name of the file for one slide of an image export.
///
/// `{base or "slide"}-{safe title or 1-based index}.{extension}`
pub fn slide_file_name(base: Option<&str>, title: Option<&str>, index: usize, extension: &str) -> String {
    let base = base.unwrap_or("slide");
    let suffix = title
        .and_then(safe_title)
        .unwrap_or_else(|| (index + 1).to_string());
    format!("{}-{}.{}", base, suffix, extension)
}

/// Name of a single-file artifact.
///
/// A custom name gets `.{extension}` appended unless it already ends with it;
/// otherwise `presentation-{YYYY-MM-DD}.{extension}`.
pub fn document_file_name(custom: Option<&str>, extension: &str, date: NaiveDate) -> String {
    match custom {
        Some(name) => {
            let suffix = format!(".{}", extension);
            if name.to_lowercase().ends_with(&suffix) {
                name.to_string()
            } else {
                format!("{}{}", name, suffix)
            }
        }
        None => format!("presentation-{}.{}", date.format("%Y-%m-%d"), extension),
    }
}
