//! Runtime data model.
//!
//! In general:
//! - `entity` describes *what is serialized* (ids, fields, relations)
//! - `serializer` describes *how a type is exposed* (immutable descriptors)
//!
//! The engine reads both through these traits only; it never inspects
//! concrete entity types.

pub mod entity;
pub mod id;
pub mod serializer;
