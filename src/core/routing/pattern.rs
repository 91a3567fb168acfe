//! Route pattern grammar
//!
//! One grammar covers every allow-list entry:
//! - literal segments match themselves (`/doctor/schedule`)
//! - `:name` matches exactly one non-empty segment (`/client/doctors/:id`)
//! - a trailing `*` matches the base path and anything below it
//!   (`/admin/*` matches `/admin`, `/admin/users`, `/admin/users/3`)
//!
//! Patterns without `*` match the whole path and nothing longer.

/// A parsed allow-list entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoutePattern<'a> {
    raw: &'a str,
}

impl<'a> RoutePattern<'a> {
    pub const fn new(raw: &'a str) -> Self {
        Self { raw }
    }

    pub fn as_str(&self) -> &'a str {
        self.raw
    }

    fn segments(&self) -> (Vec<&'a str>, bool) {
        let mut segments: Vec<&'a str> = split_segments(self.raw).collect();
        let wildcard = segments.last() == Some(&"*");
        if wildcard {
            segments.pop();
        }
        (segments, wildcard)
    }

    /// Whether `path` (already normalized) matches this pattern
    pub fn matches(&self, path: &str) -> bool {
        let (pattern, wildcard) = self.segments();
        let path: Vec<&str> = split_segments(path).collect();

        if path.len() < pattern.len() || (!wildcard && path.len() != pattern.len()) {
            return false;
        }

        pattern
            .iter()
            .zip(&path)
            .all(|(expected, actual)| match expected.strip_prefix(':') {
                Some(_) => !actual.is_empty(),
                None => expected == actual,
            })
    }
}

fn split_segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|s| !s.is_empty())
}

/// Canonical form of a requested path: query and fragment dropped, empty
/// segments collapsed, no trailing slash, always rooted.
pub fn normalize_path(path: &str) -> String {
    let path = path.split(['?', '#']).next().unwrap_or_default();
    let joined = split_segments(path).collect::<Vec<_>>().join("/");
    format!("/{}", joined)
}
