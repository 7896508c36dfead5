//! Field extraction from rendered maps pages.
//!
//! spider.cloud returns the place page as markdown; everything here is
//! line-oriented pulls over that text. Extraction is best-effort: a field
//! the page does not expose becomes empty/None rather than an error, the
//! only hard failure is a page with no recognizable place heading.

use std::sync::OnceLock;

use chrono::Utc;
use regex::Regex;

use crate::error::DriverError;
use crate::model::{PlaceRecord, PlaceSeed, RawReview};

fn rating_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(\d)[.,](\d)\s*\(").unwrap())
}

fn review_count_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"([\d.,]+)\s+(?:ulasan|reviews)").unwrap())
}

fn coords_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"!3d(-?\d+\.?\d*)!4d(-?\d+\.?\d*)").unwrap())
}

fn coords_at_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"@(-?\d+\.\d+),(-?\d+\.\d+)").unwrap())
}

fn place_link_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"https://www\.google\.com/maps/place/[^\s\)\]]+").unwrap()
    })
}

fn stars_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // Star glyph runs or a "4/5" style marker.
    RE.get_or_init(|| Regex::new(r"^(?:(★{1,5})☆*|(\d)/5)$").unwrap())
}

fn relative_time_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)(yang lalu|lalu|ago|baru saja|just now)").unwrap()
    })
}

/// Candidate place URLs found on a search-results page, in page order.
/// The caller's tie-break for ambiguous queries is "first result".
pub fn search_hits(markdown: &str) -> Vec<String> {
    let mut seen = Vec::new();
    for m in place_link_re().find_iter(markdown) {
        let url = m.as_str().to_string();
        if !seen.contains(&url) {
            seen.push(url);
        }
    }
    seen
}

/// Coordinates embedded in a maps place URL (`!3d<lat>!4d<lng>` or
/// the `@lat,lng` viewport form).
pub fn coords_from_url(url: &str) -> (Option<f64>, Option<f64>) {
    let caps = coords_re()
        .captures(url)
        .or_else(|| coords_at_re().captures(url));
    match caps {
        Some(c) => (c[1].parse().ok(), c[2].parse().ok()),
        None => (None, None),
    }
}

/// Build a `PlaceRecord` from the rendered place page. The record keeps the
/// seed's id and name; everything else comes from the page.
pub fn place_from_markdown(
    seed: &PlaceSeed,
    url: &str,
    markdown: &str,
) -> Result<PlaceRecord, DriverError> {
    let lines: Vec<&str> = markdown.lines().map(str::trim).collect();

    let heading = lines
        .iter()
        .find(|l| l.starts_with("# "))
        .map(|l| l.trim_start_matches("# ").trim().to_string());
    if heading.is_none() {
        return Err(DriverError::Malformed("no place heading".into()));
    }

    // Rating "4,6 (" with Indonesian comma decimals.
    let rating = rating_re().captures(markdown).and_then(|c| {
        format!("{}.{}", &c[1], &c[2]).parse::<f64>().ok()
    });

    let review_count = review_count_re().captures(markdown).and_then(|c| {
        let digits: String = c[1].chars().filter(|ch| ch.is_ascii_digit()).collect();
        digits.parse::<u32>().ok()
    });

    // Category is the short standalone line right after the rating line.
    let rating_line = lines
        .iter()
        .position(|l| rating_re().is_match(l))
        .unwrap_or(0);
    let category = lines
        .iter()
        .skip(rating_line + 1)
        .find(|l| !l.is_empty() && l.len() <= 40 && !l.contains('('))
        .map(|l| l.to_string())
        .unwrap_or_default();

    // Address: first line that looks like an Indonesian street address or
    // mentions the seed's locality.
    let locality = seed.locality.to_lowercase();
    let address = lines
        .iter()
        .find(|l| {
            let low = l.to_lowercase();
            low.starts_with("jl.")
                || low.starts_with("jalan ")
                || (!locality.is_empty() && low.contains(&locality) && l.contains(','))
        })
        .map(|l| l.to_string())
        .unwrap_or_default();

    let (description, attributes) = about_section(&lines);
    let (latitude, longitude) = coords_from_url(url);

    Ok(PlaceRecord {
        id: seed.id.clone(),
        // Keep the seed's name; the page heading can carry extra decoration.
        name: seed.name.clone(),
        address,
        latitude,
        longitude,
        category,
        description,
        attributes,
        rating,
        review_count,
        maps_url: url.to_string(),
        scraped_at: Utc::now(),
    })
}

/// Description paragraph and attribute bullets from the About/Tentang block.
/// Attributes are joined pipe-separated, the raw form the processor's
/// `clean_attributes` expects.
fn about_section(lines: &[&str]) -> (String, String) {
    let start = match lines.iter().position(|l| {
        let l = l.trim_start_matches('#').trim();
        l == "Tentang" || l == "About"
    }) {
        Some(i) => i + 1,
        None => return (String::new(), String::new()),
    };

    let mut description = String::new();
    let mut attributes = Vec::new();
    for line in lines.iter().skip(start) {
        if line.starts_with('#') {
            break;
        }
        if let Some(item) = line.strip_prefix("- ") {
            attributes.push(item.trim().to_string());
        } else if description.is_empty() && !line.is_empty() {
            description = line.to_string();
        }
    }
    (description, attributes.join(" | "))
}

/// Review cards from the rendered reviews tab.
///
/// Cards render as: author line, a star-glyph line, a relative timestamp,
/// then the review text until the next blank line. Empty-text reviews are
/// dropped here, and `max` is a hard bound on collected cards regardless of
/// how much content the page loaded.
pub fn reviews_from_markdown(markdown: &str, max: usize) -> Vec<RawReview> {
    let lines: Vec<&str> = markdown.lines().map(str::trim).collect();
    let mut reviews = Vec::new();

    let mut i = 0;
    while i < lines.len() && reviews.len() < max {
        let Some(caps) = stars_re().captures(lines[i]) else {
            i += 1;
            continue;
        };
        let rating = caps
            .get(1)
            .map(|m| m.as_str().chars().count() as u8)
            .or_else(|| caps.get(2).and_then(|m| m.as_str().parse().ok()))
            .unwrap_or(0);

        let author = lines[..i]
            .iter()
            .rev()
            .find(|l| !l.is_empty())
            .map(|l| l.to_string())
            .unwrap_or_else(|| "Anonymous".to_string());

        let mut j = i + 1;
        let mut relative_time = String::new();
        if j < lines.len() && relative_time_re().is_match(lines[j]) {
            relative_time = lines[j].to_string();
            j += 1;
        }

        let mut text_lines = Vec::new();
        while j < lines.len() && !lines[j].is_empty() && !stars_re().is_match(lines[j]) {
            text_lines.push(lines[j]);
            j += 1;
        }
        let text = text_lines.join(" ");

        if !text.trim().is_empty() {
            reviews.push(RawReview {
                author,
                rating,
                text,
                relative_time,
            });
        }
        i = j.max(i + 1);
    }

    reviews
}
