//! Text normalization for scraped content. Cleaning strips service
//! artifacts and collapses whitespace without touching semantic content.

use std::sync::OnceLock;

use regex::Regex;

/// Literal junk sequences the maps pages leak into extracted text.
const ARTIFACTS: [&str; 2] = ["Óóä", "¬†"];

fn whitespace_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s+").unwrap())
}

/// Remove artifacts and private-use glyphs, collapse internal whitespace,
/// trim the ends.
pub fn clean_text(text: &str) -> String {
    let mut out = text.to_string();
    for artifact in ARTIFACTS {
        out = out.replace(artifact, "");
    }
    // Icon fonts render as private-use codepoints.
    out.retain(|c| !('\u{e000}'..='\u{f8ff}').contains(&c));
    whitespace_re().replace_all(&out, " ").trim().to_string()
}

/// Turn the raw pipe-separated attribute list into a comma-separated one,
/// dropping leading non-alphanumeric prefixes (icon leftovers) per item.
pub fn clean_attributes(text: &str) -> String {
    clean_text(text)
        .split('|')
        .filter_map(|item| {
            let cleaned = item
                .trim_start_matches(|c: char| !c.is_alphanumeric())
                .trim();
            if cleaned.is_empty() {
                None
            } else {
                Some(cleaned.to_string())
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
}

/// Anonymize a reviewer display name: lowercased, trimmed, md5, first ten
/// hex characters. Empty names collapse to "anonymous".
pub fn anonymize_author(author: &str) -> String {
    let normalized = author.trim().to_lowercase();
    if normalized.is_empty() {
        return "anonymous".to_string();
    }
    let digest = md5::compute(normalized.as_bytes());
    format!("{:x}", digest)[..10].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn whitespace_collapses() {
        assert_eq!(clean_text("  a\n\n b\t c  "), "a b c");
    }

    #[test]
    fn artifacts_removed() {
        assert_eq!(clean_text("bagusÓóä sekali¬†"), "bagus sekali");
        assert_eq!(clean_text("\u{e5ca} Ramah anak"), "Ramah anak");
    }

    #[test]
    fn attributes_become_comma_list() {
        assert_eq!(
            clean_attributes("\u{e5ca} Ramah anak | · Parkir |  "),
            "Ramah anak, Parkir"
        );
        assert_eq!(clean_attributes(""), "");
    }

    #[test]
    fn anonymization_is_stable_and_case_insensitive() {
        let a = anonymize_author("Budi Santoso");
        let b = anonymize_author("  budi santoso ");
        assert_eq!(a, b);
        assert_eq!(a.len(), 10);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(anonymize_author("   "), "anonymous");
    }
}
