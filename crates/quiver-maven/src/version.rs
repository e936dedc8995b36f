//! Maven version ordering
//!
//! Versions are split on `.` and `-`. Segments that are both numeric compare
//! as numbers, anything else compares lexically. When every shared leading
//! segment is equal the version with more segments wins, so `1.0-SNAPSHOT`
//! sorts above `1.0` and `1.0.1` above `1.0`.

use std::cmp::Ordering;

/// Compare two version strings, newest is greater
#[must_use]
pub fn compare(a: &str, b: &str) -> Ordering {
    let mut left = segments(a);
    let mut right = segments(b);

    loop {
        match (left.next(), right.next()) {
            (Some(l), Some(r)) => match compare_segment(l, r) {
                Ordering::Equal => {}
                unequal => return unequal,
            },
            (Some(_), None) => return Ordering::Greater,
            (None, Some(_)) => return Ordering::Less,
            (None, None) => return Ordering::Equal,
        }
    }
}

/// Sort versions newest first
pub fn sort_descending<S: AsRef<str>>(versions: &mut [S]) {
    versions.sort_by(|a, b| compare(b.as_ref(), a.as_ref()));
}

/// Newest version not marked as a snapshot
pub fn latest_release<S: AsRef<str>>(versions: &[S]) -> Option<&str> {
    versions
        .iter()
        .map(AsRef::as_ref)
        .filter(|v| !is_snapshot(v))
        .max_by(|a, b| compare(a, b))
}

/// Newest version overall
pub fn latest<S: AsRef<str>>(versions: &[S]) -> Option<&str> {
    versions
        .iter()
        .map(AsRef::as_ref)
        .max_by(|a, b| compare(a, b))
}

#[must_use]
pub fn is_snapshot(version: &str) -> bool {
    version.contains("SNAPSHOT")
}

fn segments(version: &str) -> impl Iterator<Item = &str> {
    version.split(['.', '-']).filter(|s| !s.is_empty())
}

fn compare_segment(a: &str, b: &str) -> Ordering {
    let numeric = |s: &str| !s.is_empty() && s.bytes().all(|c| c.is_ascii_digit());

    if numeric(a) && numeric(b) {
        // Arbitrary length: strip leading zeros, then longer is larger
        let a = a.trim_start_matches('0');
        let b = b.trim_start_matches('0');
        return a.len().cmp(&b.len()).then_with(|| a.cmp(b));
    }

    a.cmp(b)
}
