//! Module: includes
//! Responsibility: parse, canonicalize, and combine dotted relation include paths.
//! Does not own: relation traversal (see `serialize`) or whitelist policy
//! (injected through `IncludeExpansion`).
//!
//! Invariants:
//! - Tokens sharing a relation name at one level are merged into one entry.
//! - The canonical rendering lists every complete root-to-leaf path once,
//!   sorted lexicographically and joined with `,`.
//! - Equality and ordering compare canonical renderings only.


use crate::{DEFAULT_INCLUDE_PARAM, model::serializer::SerializerDescriptor};
use derive_more::{Deref, IntoIterator};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::{
    cmp::Ordering,
    collections::{BTreeSet, HashMap},
    convert::Infallible,
    fmt::{self, Display},
    hash::BuildHasher,
    ops::BitAnd,
    str::FromStr,
};

///
/// Constants
///

const PATH_SEPARATOR: char = ',';
const SEGMENT_SEPARATOR: char = '.';

///
/// IncludeToken
///
/// One requested relation: either a bare leaf, or a relation plus the
/// sub-paths requested beneath it.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum IncludeToken {
    Relation(String),
    Nested(String, Vec<Self>),
}

impl IncludeToken {
    #[must_use]
    pub fn relation(name: impl Into<String>) -> Self {
        Self::Relation(name.into())
    }

    /// Build a nested token; an empty child list collapses to a bare leaf.
    #[must_use]
    pub fn nested<I, T>(name: impl Into<String>, children: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Self>,
    {
        let mut merged = Vec::new();
        for child in children {
            merge_token(&mut merged, child.into());
        }

        if merged.is_empty() {
            Self::Relation(name.into())
        } else {
            Self::Nested(name.into(), merged)
        }
    }

    /// Relation name at this level.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Relation(name) | Self::Nested(name, _) => name,
        }
    }

    /// Sub-paths requested beneath this relation (empty for a leaf).
    #[must_use]
    pub fn children(&self) -> &[Self] {
        match self {
            Self::Relation(_) => &[],
            Self::Nested(_, children) => children,
        }
    }

    // Build the token chain for one dotted path (`a.b.c`).
    fn from_segments(segments: &[&str]) -> Option<Self> {
        let (first, rest) = segments.split_first()?;

        Some(match Self::from_segments(rest) {
            Some(child) => Self::Nested((*first).to_string(), vec![child]),
            None => Self::Relation((*first).to_string()),
        })
    }

    // Push every complete root-to-leaf path under this token.
    fn collect_paths(&self, prefix: &mut Vec<String>, out: &mut BTreeSet<String>) {
        prefix.push(self.name().to_string());
        match self {
            Self::Relation(_) => {
                out.insert(prefix.join("."));
            }
            Self::Nested(_, children) => {
                for child in children {
                    child.collect_paths(prefix, out);
                }
            }
        }
        prefix.pop();
    }
}

impl From<&str> for IncludeToken {
    fn from(name: &str) -> Self {
        Self::relation(name)
    }
}

impl From<String> for IncludeToken {
    fn from(name: String) -> Self {
        Self::Relation(name)
    }
}

// Merge one token into a level, combining entries that share a name.
fn merge_token(level: &mut Vec<IncludeToken>, token: IncludeToken) {
    let Some(existing) = level.iter_mut().find(|t| t.name() == token.name()) else {
        level.push(token);
        return;
    };

    match token {
        IncludeToken::Relation(_) => {}
        IncludeToken::Nested(name, incoming) => match existing {
            IncludeToken::Relation(_) => *existing = IncludeToken::Nested(name, incoming),
            IncludeToken::Nested(_, children) => {
                for child in incoming {
                    merge_token(children, child);
                }
            }
        },
    }
}

///
/// IncludeExpansion
///
/// Collaborator used by [`RelationIncludes::for_query`] to widen or restrict
/// the requested relations for one serializer (e.g. an eager-load whitelist).
///

pub trait IncludeExpansion {
    fn expand(
        &self,
        includes: &RelationIncludes,
        serializer: &SerializerDescriptor,
    ) -> Vec<IncludeToken>;
}

impl<F> IncludeExpansion for F
where
    F: Fn(&RelationIncludes, &SerializerDescriptor) -> Vec<IncludeToken>,
{
    fn expand(
        &self,
        includes: &RelationIncludes,
        serializer: &SerializerDescriptor,
    ) -> Vec<IncludeToken> {
        self(includes, serializer)
    }
}

///
/// RelationIncludes
///
/// Ordered, set-like collection of include tokens parsed from strings such
/// as `"tags,images.comments,reviews.author"`.
///

#[derive(Clone, Debug, Default, Deref, IntoIterator)]
pub struct RelationIncludes {
    #[deref]
    #[into_iterator(owned, ref)]
    includes: Vec<IncludeToken>,
}

impl RelationIncludes {
    /// Build from tokens, merging any that share a relation name.
    pub fn new<I, T>(tokens: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<IncludeToken>,
    {
        let mut includes = Self::default();
        includes.include(tokens);
        includes
    }

    /// Parse a comma-separated list of dotted paths. Blank input yields an
    /// empty set; empty segments are ignored.
    #[must_use]
    pub fn parse(input: &str) -> Self {
        let mut includes = Self::default();

        for path in input.split(PATH_SEPARATOR) {
            let segments: Vec<&str> = path
                .split(SEGMENT_SEPARATOR)
                .map(str::trim)
                .filter(|segment| !segment.is_empty())
                .collect();

            if let Some(token) = IncludeToken::from_segments(&segments) {
                merge_token(&mut includes.includes, token);
            }
        }

        includes
    }

    /// Read the `include` request parameter; absent or blank means none.
    #[must_use]
    pub fn from_params<S: BuildHasher>(params: &HashMap<String, String, S>) -> Self {
        Self::from_param(params, DEFAULT_INCLUDE_PARAM)
    }

    /// Read include paths from a named request parameter.
    #[must_use]
    pub fn from_param<S: BuildHasher>(params: &HashMap<String, String, S>, key: &str) -> Self {
        params
            .get(key)
            .map_or_else(Self::default, |raw| Self::parse(raw))
    }

    /// Add tokens in place (union) and return `self` for chaining.
    pub fn include<I, T>(&mut self, tokens: I) -> &mut Self
    where
        I: IntoIterator<Item = T>,
        T: Into<IncludeToken>,
    {
        for token in tokens {
            merge_token(&mut self.includes, token.into());
        }
        self
    }

    /// Whether `name` is requested at the top level (bare or nested).
    #[must_use]
    pub fn includes_relation(&self, name: &str) -> bool {
        self.find(name).is_some()
    }

    /// Top-level token for `name`, if requested.
    #[must_use]
    pub fn find(&self, name: &str) -> Option<&IncludeToken> {
        self.includes.iter().find(|token| token.name() == name)
    }

    /// Sub-paths requested beneath `name`; `None` for a bare leaf or an
    /// absent relation.
    #[must_use]
    pub fn nested_includes_for(&self, name: &str) -> Option<Self> {
        match self.find(name)? {
            IncludeToken::Relation(_) => None,
            IncludeToken::Nested(_, children) => Some(Self {
                includes: children.clone(),
            }),
        }
    }

    /// Every complete root-to-leaf dotted path, sorted and de-duplicated.
    #[must_use]
    pub fn paths(&self) -> Vec<String> {
        let mut out = BTreeSet::new();
        let mut prefix = Vec::new();
        for token in &self.includes {
            token.collect_paths(&mut prefix, &mut out);
        }

        out.into_iter().collect()
    }

    /// Resolve these paths through an expansion collaborator for one serializer.
    #[must_use]
    pub fn for_query(
        &self,
        serializer: &SerializerDescriptor,
        expansion: &dyn IncludeExpansion,
    ) -> Self {
        Self::new(expansion.expand(self, serializer))
    }
}

impl Display for RelationIncludes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.paths().join(","))
    }
}

impl FromStr for RelationIncludes {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

impl From<&str> for RelationIncludes {
    fn from(s: &str) -> Self {
        Self::parse(s)
    }
}

impl<T: Into<IncludeToken>> FromIterator<T> for RelationIncludes {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self::new(iter)
    }
}

// Intersection is path-level on the canonical strings: two paths intersect
// only if their entire dotted rendering matches.
impl BitAnd for &RelationIncludes {
    type Output = RelationIncludes;

    fn bitand(self, other: Self) -> RelationIncludes {
        let theirs: BTreeSet<String> = other.paths().into_iter().collect();
        let shared: Vec<String> = self
            .paths()
            .into_iter()
            .filter(|path| theirs.contains(path))
            .collect();

        RelationIncludes::parse(&shared.join(","))
    }
}

impl BitAnd for RelationIncludes {
    type Output = Self;

    fn bitand(self, other: Self) -> Self {
        &self & &other
    }
}

impl PartialEq for RelationIncludes {
    fn eq(&self, other: &Self) -> bool {
        self.paths() == other.paths()
    }
}

impl Eq for RelationIncludes {}

impl PartialOrd for RelationIncludes {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for RelationIncludes {
    fn cmp(&self, other: &Self) -> Ordering {
        self.to_string().cmp(&other.to_string())
    }
}

impl Serialize for RelationIncludes {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for RelationIncludes {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Self::parse(&raw))
    }
}
