//! Optional per-field filters for paste search.

use super::paste::Paste;

/// Filter applied to one text field.
///
/// `Any` matches every value. `Contains` matches values that contain the
/// pattern anywhere, ignoring case; inside the pattern `%` matches any run of
/// characters and `_` matches exactly one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TextFilter {
    #[default]
    Any,
    Contains(String),
}

impl TextFilter {
    /// Build a filter from an optional caller value.
    ///
    /// Missing and blank values are unconstrained.
    pub fn from_option(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some(pattern) if !pattern.is_empty() => Self::Contains(pattern.to_lowercase()),
            _ => Self::Any,
        }
    }

    /// `true` when this filter constrains nothing.
    pub fn is_any(&self) -> bool {
        matches!(self, Self::Any)
    }

    /// Test `value` against the filter.
    pub fn matches(&self, value: &str) -> bool {
        match self {
            Self::Any => true,
            Self::Contains(pattern) => like_contains(&value.to_lowercase(), pattern),
        }
    }
}

/// Title, author and language filters combined with AND.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchFilter {
    pub title: TextFilter,
    pub author: TextFilter,
    pub language: TextFilter,
}

impl SearchFilter {
    /// Build a filter from optional caller values; `None` or blank means
    /// "match anything" for that field.
    pub fn new(title: Option<&str>, author: Option<&str>, language: Option<&str>) -> Self {
        Self {
            title: TextFilter::from_option(title),
            author: TextFilter::from_option(author),
            language: TextFilter::from_option(language),
        }
    }

    /// `true` when no field is constrained.
    pub fn is_unconstrained(&self) -> bool {
        self.title.is_any() && self.author.is_any() && self.language.is_any()
    }

    /// Test a paste against every field filter.
    pub fn matches(&self, paste: &Paste) -> bool {
        self.title.matches(&paste.title)
            && self.author.matches(&paste.author)
            && self.language.matches(&paste.language)
    }
}

/// Match `pattern` anywhere inside `haystack` (`%pattern%` semantics).
fn like_contains(haystack: &str, pattern: &str) -> bool {
    let text: Vec<char> = haystack.chars().collect();
    let pattern: Vec<char> = std::iter::once('%')
        .chain(pattern.chars())
        .chain(std::iter::once('%'))
        .collect();

    // Greedy wildcard match with single-point backtracking on the last `%`.
    let (mut t, mut p) = (0usize, 0usize);
    let mut backtrack: Option<(usize, usize)> = None;
    while t < text.len() {
        match pattern.get(p) {
            Some('%') => {
                backtrack = Some((p, t));
                p += 1;
            }
            Some('_') => {
                t += 1;
                p += 1;
            }
            Some(&c) if c == text[t] => {
                t += 1;
                p += 1;
            }
            _ => match backtrack {
                Some((star_p, star_t)) => {
                    p = star_p + 1;
                    t = star_t + 1;
                    backtrack = Some((star_p, star_t + 1));
                }
                None => return false,
            },
        }
    }
    pattern[p..].iter().all(|&c| c == '%')
}
