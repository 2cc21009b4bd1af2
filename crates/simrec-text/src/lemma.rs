//! Noun lemmatization (plural to singular).
//!
//! A static irregular table is consulted first, then ordered suffix rules.
//! Every lemma this module produces maps to itself, so applying
//! `Lemmatizer::lemmatize` twice never changes the first result.

use std::borrow::Cow;
use std::collections::{HashMap, HashSet};

/// Irregular plural forms and their singular lemma.
pub const IRREGULAR_PLURALS: &[(&str, &str)] = &[
    ("men", "man"),
    ("women", "woman"),
    ("children", "child"),
    ("feet", "foot"),
    ("teeth", "tooth"),
    ("geese", "goose"),
    ("mice", "mouse"),
    ("oxen", "ox"),
    ("knives", "knife"),
    ("wives", "wife"),
    ("lives", "life"),
    ("leaves", "leaf"),
    ("halves", "half"),
    ("shelves", "shelf"),
    ("wolves", "wolf"),
    ("loaves", "loaf"),
    ("calves", "calf"),
    ("thieves", "thief"),
    ("indices", "index"),
    ("matrices", "matrix"),
    ("vertices", "vertex"),
    ("criteria", "criterion"),
    ("phenomena", "phenomenon"),
    ("cacti", "cactus"),
    ("fungi", "fungus"),
    ("buses", "bus"),
    ("lenses", "lens"),
];

/// Words that end like plurals but are their own lemma.
pub const INVARIANT_WORDS: &[&str] = &[
    "series",
    "species",
    "news",
    "lens",
    "physics",
    "mathematics",
    "electronics",
    "pants",
    "jeans",
    "shorts",
    "scissors",
    "pliers",
    "tongs",
    "tweezers",
    "binoculars",
    "headphones",
    "earphones",
    "clothes",
    "goods",
];

/// Words shorter than this are never suffix-stripped.
const MIN_STRIP_LEN: usize = 4;

/// Rule-based noun lemmatizer backed by static tables.
#[derive(Debug, Clone)]
pub struct Lemmatizer {
    irregular: HashMap<&'static str, &'static str>,
    invariant: HashSet<&'static str>,
}

impl Lemmatizer {
    /// Lemmatizer over the built-in English tables.
    pub fn english() -> Self {
        Self {
            irregular: IRREGULAR_PLURALS.iter().copied().collect(),
            invariant: INVARIANT_WORDS.iter().copied().collect(),
        }
    }

    /// Reduce `token` to its lemma. Tokens with no applicable entry or
    /// rule are returned unchanged.
    pub fn lemmatize<'a>(&self, token: &'a str) -> Cow<'a, str> {
        if let Some(lemma) = self.irregular.get(token) {
            return Cow::Borrowed(*lemma);
        }
        if self.invariant.contains(token) || token.len() < MIN_STRIP_LEN {
            return Cow::Borrowed(token);
        }

        match strip_plural(token) {
            // "mens" must not become "men", which is itself a plural
            Some(stem) if !self.irregular.contains_key(stem.as_str()) => Cow::Owned(stem),
            _ => Cow::Borrowed(token),
        }
    }
}

/// Ordered suffix rules. `None` when no rule applies.
fn strip_plural(token: &str) -> Option<String> {
    if token.ends_with("sses") {
        // dresses -> dress
        return Some(token[..token.len() - 2].to_string());
    }
    if token.ends_with("ies") && token.len() > MIN_STRIP_LEN {
        // batteries -> battery
        return Some(format!("{}y", &token[..token.len() - 3]));
    }
    if ["xes", "ches", "shes", "zes"]
        .iter()
        .any(|suffix| token.ends_with(suffix))
    {
        // boxes -> box, watches -> watch
        return Some(token[..token.len() - 2].to_string());
    }
    if ["ss", "us", "is"].iter().any(|suffix| token.ends_with(suffix)) {
        return None;
    }
    token.strip_suffix('s').map(str::to_string)
}

impl Default for Lemmatizer {
    fn default() -> Self {
        Self::english()
    }
}
