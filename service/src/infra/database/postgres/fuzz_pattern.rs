//! [`FuzzPattern`] definition.

use derive_more::Display;
use itertools::Itertools as _;
use postgres_types::{FromSql, ToSql};

/// Lowercased `SIMILAR TO` pattern matching any word of a search input.
#[derive(Clone, Debug, Display, Eq, FromSql, PartialEq, ToSql)]
#[postgres(transparent)]
pub struct FuzzPattern(String);

impl FuzzPattern {
    /// Characters having a special meaning in a `SIMILAR TO` pattern.
    const SPECIAL: &'static [char] = &[
        '\\', '%', '_', '|', '*', '+', '?', '{', '}', '(', ')', '[', ']',
    ];

    /// Creates a new [`FuzzPattern`] out of the given `input`.
    #[must_use]
    pub fn new(input: &str) -> Self {
        Self(format!(
            "({})",
            input.split_whitespace().format_with("|", |word, f| {
                f(&format_args!("%{}%", Self::escape(word)))
            }),
        ))
    }

    /// Lowercases the provided `word` and escapes its special characters.
    fn escape(word: &str) -> String {
        word.to_lowercase()
            .chars()
            .flat_map(|c| {
                Self::SPECIAL
                    .contains(&c)
                    .then_some('\\')
                    .into_iter()
                    .chain([c])
            })
            .collect()
    }
}

#[cfg(test)]
mod spec {
    use super::FuzzPattern;

    #[test]
    fn matches_any_word() {
        assert_eq!(
            FuzzPattern::new("  Acme   Corp ").to_string(),
            "(%acme%|%corp%)",
        );
    }

    #[test]
    fn escapes_special_characters() {
        assert_eq!(
            FuzzPattern::new("50%_off (a|b)").to_string(),
            r"(%50\%\_off%|%\(a\|b\)%)",
        );
    }
}
