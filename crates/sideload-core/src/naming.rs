//! Module: naming
//! Responsibility: derive bucket keys from entity type names and relation names.
//! Does not own: serializer lookup (see `registry`).
//!
//! Inflection only covers the regular English rules plus short irregular and
//! `-s` singular tables; other `-ses` plurals singularize to `-se`.
//! Input is expected in snake_case; only the last `_` segment inflects.

use convert_case::{Case, Casing};

///
/// Constants
///

const IRREGULAR: &[(&str, &str)] = &[
    ("child", "children"),
    ("foot", "feet"),
    ("goose", "geese"),
    ("man", "men"),
    ("mouse", "mice"),
    ("ox", "oxen"),
    ("person", "people"),
    ("tooth", "teeth"),
    ("woman", "women"),
];

const UNCOUNTABLE: &[&str] = &[
    "equipment",
    "fish",
    "information",
    "metadata",
    "news",
    "series",
    "sheep",
    "species",
];

const SIBILANT_SUFFIXES: &[&str] = &["s", "x", "z", "ch", "sh"];

// Singulars ending in a single `s`, whose plural `-ses` is otherwise
// indistinguishable from `-se` + `s` (`buses` vs `houses`). Matched exactly.
const SINGLE_S_SINGULARS: &[&str] = &[
    "alias", "bonus", "bus", "campus", "census", "status", "virus",
];

/// Convert a type name such as `BlogPost` into `blog_post`.
#[must_use]
pub fn snake_case(type_name: &str) -> String {
    type_name.to_case(Case::Snake)
}

/// Pluralize one snake_case word (`author` -> `authors`, `blog_entry` -> `blog_entries`).
#[must_use]
pub fn pluralize(word: &str) -> String {
    inflect_last_segment(word, pluralize_segment)
}

/// Singularize one snake_case word (`authors` -> `author`, `people` -> `person`).
#[must_use]
pub fn singularize(word: &str) -> String {
    inflect_last_segment(word, singularize_segment)
}

/// Root document key for a serializer's entity type (`Post` -> `posts`).
#[must_use]
pub fn root_key(type_name: &str) -> String {
    pluralize(&snake_case(type_name))
}

// Split off the last `_` segment, inflect it, and reassemble.
fn inflect_last_segment(word: &str, inflect: fn(&str) -> String) -> String {
    match word.rsplit_once('_') {
        Some((head, last)) if !last.is_empty() => format!("{head}_{}", inflect(last)),
        _ => inflect(word),
    }
}

fn pluralize_segment(word: &str) -> String {
    if word.is_empty() || UNCOUNTABLE.contains(&word) {
        return word.to_string();
    }
    if let Some((_, plural)) = IRREGULAR.iter().find(|(singular, _)| *singular == word) {
        return (*plural).to_string();
    }
    if IRREGULAR.iter().any(|(_, plural)| *plural == word) {
        return word.to_string();
    }

    if let Some(stem) = word.strip_suffix('y')
        && ends_with_consonant(stem)
    {
        return format!("{stem}ies");
    }
    if SIBILANT_SUFFIXES.iter().any(|suffix| word.ends_with(suffix)) {
        return format!("{word}es");
    }

    format!("{word}s")
}

fn singularize_segment(word: &str) -> String {
    if word.is_empty() || UNCOUNTABLE.contains(&word) {
        return word.to_string();
    }
    if let Some((singular, _)) = IRREGULAR.iter().find(|(_, plural)| *plural == word) {
        return (*singular).to_string();
    }

    if let Some(stem) = word.strip_suffix("ies")
        && ends_with_consonant(stem)
    {
        return format!("{stem}y");
    }
    if SINGLE_S_SINGULARS.contains(&word) {
        return word.to_string();
    }
    if let Some(stem) = word.strip_suffix("es")
        && SINGLE_S_SINGULARS.contains(&stem)
    {
        return stem.to_string();
    }
    for suffix in ["sses", "xes", "zes", "ches", "shes"] {
        if word.ends_with(suffix) {
            return word[..word.len() - 2].to_string();
        }
    }
    if let Some(stem) = word.strip_suffix('s')
        && !stem.ends_with('s')
        && !stem.is_empty()
    {
        return stem.to_string();
    }

    word.to_string()
}

fn ends_with_consonant(stem: &str) -> bool {
    stem.chars()
        .last()
        .is_some_and(|c| c.is_ascii_alphabetic() && !"aeiou".contains(c))
}
