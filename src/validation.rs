//! Reference validation for video and script URLs.
//!
//! These predicates never fail with an error: anything that does not parse, or
//! does not carry a recognized script suffix, is simply rejected and the caller
//! decides how to report it.

use url::Url;

/// File suffixes accepted for script references
pub const SCRIPT_SUFFIXES: &[&str] = &[".funscript", ".csv"];

fn parse(reference: &str) -> Option<Url> {
    Url::parse(reference).ok()
}

/// True when `reference` is a well-formed absolute URL.
pub fn is_valid_video_reference(reference: &str) -> bool {
    parse(reference).is_some()
}

/// True when `reference` is a well-formed absolute URL whose path ends in one
/// of [`SCRIPT_SUFFIXES`].
pub fn is_valid_script_reference(reference: &str) -> bool {
    parse(reference)
        .map(|url| {
            SCRIPT_SUFFIXES
                .iter()
                .any(|suffix| url.path().ends_with(suffix))
        })
        .unwrap_or(false)
}

/// True when `reference` is a well-formed absolute URL.
pub fn is_valid_support_url(reference: &str) -> bool {
    parse(reference).is_some()
}
