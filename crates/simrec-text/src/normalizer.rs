//! Raw item text to token-normalized text.

use std::sync::LazyLock;

use regex::Regex;

use crate::lemma::Lemmatizer;
use crate::stopwords::StopWords;

static CURRENCY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$(\d+)").expect("currency pattern is valid"));

static OUNCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\boz\b").expect("ounce pattern is valid"));

static DEFAULT_NORMALIZER: LazyLock<TextNormalizer> = LazyLock::new(TextNormalizer::english);

/// Deterministic text normalizer.
///
/// Holds only immutable tables, so one instance can be shared freely across
/// threads and calls.
#[derive(Debug, Clone)]
pub struct TextNormalizer {
    stopwords: StopWords,
    lemmatizer: Lemmatizer,
}

impl TextNormalizer {
    pub fn new(stopwords: StopWords, lemmatizer: Lemmatizer) -> Self {
        Self {
            stopwords,
            lemmatizer,
        }
    }

    /// Normalizer with the English stopword and lemma tables.
    pub fn english() -> Self {
        Self::new(StopWords::english(), Lemmatizer::english())
    }

    /// Normalize `text`.
    ///
    /// Lowercases, rewrites `$<digits>` to `dollar <digits>`, replaces every
    /// character other than ASCII letters, digits, whitespace and `.` with a
    /// space, rewrites the standalone token `oz` to `ounce`, drops stopwords,
    /// lemmatizes the rest and joins with single spaces.
    pub fn normalize(&self, text: &str) -> String {
        let lowered = text.to_lowercase();
        // Must run before the strip below, which removes `$`.
        let priced = CURRENCY.replace_all(&lowered, "dollar ${1}");
        let stripped: String = priced
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c.is_whitespace() || c == '.' {
                    c
                } else {
                    ' '
                }
            })
            .collect();
        let units = OUNCE.replace_all(&stripped, "ounce");

        units
            .split_whitespace()
            .filter(|token| !self.stopwords.contains(token))
            .map(|token| {
                let lemma = self.lemmatizer.lemmatize(token);
                // A lemma the earlier steps would rewrite or drop is not applied.
                if self.stopwords.contains(&lemma) || OUNCE.is_match(&lemma) {
                    token.to_string()
                } else {
                    lemma.into_owned()
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl Default for TextNormalizer {
    fn default() -> Self {
        Self::english()
    }
}

/// Normalize with the shared English normalizer.
pub fn normalize(text: &str) -> String {
    DEFAULT_NORMALIZER.normalize(text)
}

/// Split normalized text into vocabulary terms.
///
/// Terms are maximal runs of two or more ASCII alphanumeric characters;
/// periods and whitespace separate terms and single characters are dropped.
pub fn terms(normalized: &str) -> impl Iterator<Item = &str> {
    normalized
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|term| term.len() >= 2)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_empty_input() {
        assert_eq!(normalize(""), "");
        assert_eq!(normalize("   \t\n"), "");
    }

    #[test]
    fn test_lowercase_and_stopwords() {
        assert_eq!(normalize("The Red Hammer"), "red hammer");
        assert_eq!(normalize("a hammer for the garden"), "hammer garden");
    }

    #[test]
    fn test_strip_keeps_periods() {
        assert_eq!(normalize("Steel-head (2.5 lb)!"), "steel head 2.5 lb");
    }

    #[test]
    fn test_ounce_rewrite() {
        assert_eq!(normalize("12 oz bottle"), "12 ounce bottle");
        assert_eq!(normalize("OZ"), "ounce");
        // Only the standalone token
        assert_eq!(normalize("ozone 12oz"), "ozone 12oz");
    }

    #[test]
    fn test_currency_rewrite() {
        assert_eq!(normalize("starting at $25"), "starting dollar 25");
        assert_eq!(normalize("$5 off"), "dollar 5");
    }

    #[test]
    fn test_lemmatizes_plurals() {
        assert_eq!(normalize("Vintage Watches and Knives"), "vintage watch knife");
    }

    #[test]
    fn test_unknown_tokens_pass_through() {
        assert_eq!(normalize("xyzzy qwerty"), "xyzzy qwerty");
    }

    #[test]
    fn test_lemma_never_becomes_stopword() {
        // "ands" would otherwise lemmatize to the stopword "and"
        assert_eq!(normalize("ands"), "ands");
        assert_eq!(normalize(&normalize("ands")), "ands");
        // "ozes" would otherwise lemmatize to the unit token "oz"
        assert_eq!(normalize("ozes"), "ozes");
    }

    #[test]
    fn test_deterministic_across_instances() {
        let a = TextNormalizer::english();
        let b = TextNormalizer::english();
        let text = "Antique Brass Compasses, set of 3 @ $40";
        assert_eq!(a.normalize(text), b.normalize(text));
        assert_eq!(a.normalize(text), normalize(text));
    }

    #[test]
    fn test_terms() {
        let collected: Vec<_> = terms("12 ounce bottle 2.5 lb x").collect();
        assert_eq!(collected, vec!["12", "ounce", "bottle", "lb"]);
    }

    proptest! {
        #[test]
        fn prop_normalize_is_idempotent(text in "\\PC{0,64}") {
            let once = normalize(&text);
            prop_assert_eq!(normalize(&once), once);
        }

        #[test]
        fn prop_normalize_is_idempotent_on_catalog_like_text(
            text in "[A-Za-z0-9 $.,'-]{0,80}"
        ) {
            let once = normalize(&text);
            prop_assert_eq!(normalize(&once), once);
        }
    }
}
