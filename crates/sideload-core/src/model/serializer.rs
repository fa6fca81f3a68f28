use crate::{
    model::entity::Entity,
    naming::{root_key, singularize},
};
use serde_json::Value;

///
/// Constants
///

/// Suffix appended to an entity type name to form its serializer name.
pub const SERIALIZER_SUFFIX: &str = "Serializer";

///
/// SerializerDescriptor
///
/// Immutable per-type exposure list, built once at definition time.
/// The engine only ever reads these lists; declaration order is output order.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct SerializerDescriptor {
    /// Entity type name this serializer handles (`Post`).
    pub type_name: &'static str,
    /// Attribute names, emitted in this order.
    pub attributes: &'static [&'static str],
    pub has_ones: &'static [&'static str],
    pub has_manys: &'static [&'static str],
}

impl SerializerDescriptor {
    /// Start a descriptor that exposes nothing but the entity id.
    #[must_use]
    pub const fn new(type_name: &'static str) -> Self {
        Self {
            type_name,
            attributes: &[],
            has_ones: &[],
            has_manys: &[],
        }
    }

    #[must_use]
    pub const fn attributes(self, attributes: &'static [&'static str]) -> Self {
        Self { attributes, ..self }
    }

    #[must_use]
    pub const fn has_one(self, has_ones: &'static [&'static str]) -> Self {
        Self { has_ones, ..self }
    }

    #[must_use]
    pub const fn has_many(self, has_manys: &'static [&'static str]) -> Self {
        Self { has_manys, ..self }
    }

    /// Conventional serializer name (`Post` -> `PostSerializer`).
    #[must_use]
    pub fn serializer_name(&self) -> String {
        format!("{}{SERIALIZER_SUFFIX}", self.type_name)
    }

    /// Plural document key for primary resources (`posts`).
    #[must_use]
    pub fn root_key(&self) -> String {
        root_key(self.type_name)
    }

    /// Singular type label reported in `meta.type` (`post`).
    #[must_use]
    pub fn type_key(&self) -> String {
        singularize(&self.root_key())
    }
}

///
/// Serializer
///
/// Polymorphic serializer registered per entity type.
///

pub trait Serializer {
    fn descriptor(&self) -> &SerializerDescriptor;

    /// Serializer-level attribute override.
    ///
    /// Returning `Some` replaces reading the attribute from the entity;
    /// `None` falls through to `Entity::field`.
    fn attribute(&self, _entity: &dyn Entity, _name: &str) -> Option<Value> {
        None
    }
}

impl Serializer for SerializerDescriptor {
    fn descriptor(&self) -> &SerializerDescriptor {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BLOG_POST: SerializerDescriptor = SerializerDescriptor::new("BlogPost")
        .attributes(&["title", "body"])
        .has_one(&["author"])
        .has_many(&["comments"]);

    #[test]
    fn descriptor_derives_names_from_type_name() {
        assert_eq!(BLOG_POST.serializer_name(), "BlogPostSerializer");
        assert_eq!(BLOG_POST.root_key(), "blog_posts");
        assert_eq!(BLOG_POST.type_key(), "blog_post");
    }

    #[test]
    fn descriptor_builders_keep_declaration_order() {
        assert_eq!(BLOG_POST.attributes, &["title", "body"]);
        assert_eq!(BLOG_POST.has_ones, &["author"]);
        assert_eq!(BLOG_POST.has_manys, &["comments"]);
        assert!(SerializerDescriptor::new("Tag").attributes.is_empty());
    }
}
