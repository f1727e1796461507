//! URL slug generation for job postings.

use rand::Rng;

const BASE_MAX_LEN: usize = 60;
const SUFFIX_LEN: usize = 5;
const SUFFIX_CHARSET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

/// Build the slug for a newly created job posting.
///
/// Joins title, company and country slug (empty parts dropped), lowercases,
/// collapses every run of non-alphanumeric characters to a single hyphen,
/// strips edge hyphens, truncates the base to 60 characters and appends a
/// 5-character random suffix so duplicate titles stay unique.
///
/// Generated once at creation and immutable thereafter: regenerating would
/// break stable URLs.
pub fn generate_slug(title: &str, company: &str, country_slug: Option<&str>) -> String {
    let base = [title, company, country_slug.unwrap_or("")]
        .iter()
        .filter(|part| !part.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join(" ");

    let mut slug = String::with_capacity(base.len());
    let mut pending_hyphen = false;
    for ch in base.to_lowercase().chars() {
        if ch.is_ascii_alphanumeric() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            slug.push(ch);
            pending_hyphen = false;
        } else {
            pending_hyphen = true;
        }
    }

    // The base is pure ASCII at this point, so byte truncation is safe.
    slug.truncate(BASE_MAX_LEN);
    while slug.ends_with('-') {
        slug.pop();
    }

    let mut rng = rand::thread_rng();
    let suffix: String = (0..SUFFIX_LEN)
        .map(|_| SUFFIX_CHARSET[rng.gen_range(0..SUFFIX_CHARSET.len())] as char)
        .collect();

    if slug.is_empty() {
        suffix
    } else {
        format!("{slug}-{suffix}")
    }
}
