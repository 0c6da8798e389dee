//! Version comparison using semver.
//!
//! Registry data is full of versions written loosely (`v1.2.3`, `=1.2.3`,
//! surrounding whitespace), so parsing strips those before handing the
//! string to [`semver::Version::parse`].

use semver::Version;
use std::cmp::Ordering;

/// Parse a version string, tolerating a leading `=`/`v` and whitespace.
#[must_use]
pub fn parse_loose(input: &str) -> Option<Version> {
    let trimmed = input.trim().trim_start_matches('=').trim_start();
    let trimmed = trimmed
        .strip_prefix('v')
        .or_else(|| trimmed.strip_prefix('V'))
        .unwrap_or(trimmed);
    Version::parse(trimmed).ok()
}

/// Whether `input` is a usable semantic version.
#[must_use]
pub fn is_valid(input: &str) -> bool {
    parse_loose(input).is_some()
}

/// Compare two version strings. `None` if either does not parse.
#[must_use]
pub fn compare(a: &str, b: &str) -> Option<Ordering> {
    Some(parse_loose(a)?.cmp(&parse_loose(b)?))
}

/// `a <= b`. `None` if either does not parse.
#[must_use]
pub fn lte(a: &str, b: &str) -> Option<bool> {
    compare(a, b).map(Ordering::is_le)
}

/// Sort version strings ascending, dropping the ones that do not parse.
#[must_use]
pub fn sort<'a, I>(versions: I) -> Vec<&'a str>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut parsed: Vec<(Version, &str)> = versions
        .into_iter()
        .filter_map(|v| parse_loose(v).map(|parsed| (parsed, v)))
        .collect();
    parsed.sort_by(|a, b| a.0.cmp(&b.0));
    parsed.into_iter().map(|(_, v)| v).collect()
}

/// Highest valid version in the list, as written.
#[must_use]
pub fn highest<'a, I>(versions: I) -> Option<&'a str>
where
    I: IntoIterator<Item = &'a str>,
{
    sort(versions).pop()
}
