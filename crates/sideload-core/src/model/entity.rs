use crate::model::id::Id;
use serde_json::Value;
use std::rc::Rc;

///
/// EntityHandle
///
/// Shared handle to a related entity. Relation accessors hand these out so
/// cyclic graphs can be expressed without borrowing from the parent.
///

pub type EntityHandle = Rc<dyn Entity>;

///
/// FieldPresence
///
/// Result of reading a named field from an entity. This distinguishes an
/// accessor the entity does not expose from one whose value is `null`.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum FieldPresence {
    /// Field exists and has a value (including `Value::Null`).
    Present(Value),
    /// Entity exposes no accessor with this name.
    Missing,
}

///
/// RelationPresence
///
/// Result of materializing a named relation from an entity.
///

#[derive(Clone, Debug)]
pub enum RelationPresence<T> {
    Present(T),
    Missing,
}

///
/// Entity
///
/// Runtime view of one domain object as seen by the serializer.
///
/// ## Semantics
/// - `type_name` drives serializer dispatch (`Post` -> `PostSerializer`)
/// - `field` serves attributes and foreign-key shaped `<relation>_id` fields
/// - a nil has-many relation is reported as `Present(vec![])`
/// - `Missing` means the accessor does not exist, which the engine reports
///   as an error when a descriptor asks for it
///

pub trait Entity {
    /// Runtime type name used for serializer dispatch.
    fn type_name(&self) -> &str;

    fn id(&self) -> Id;

    fn field(&self, _name: &str) -> FieldPresence {
        FieldPresence::Missing
    }

    fn related_one(&self, _name: &str) -> RelationPresence<Option<EntityHandle>> {
        RelationPresence::Missing
    }

    fn related_many(&self, _name: &str) -> RelationPresence<Vec<EntityHandle>> {
        RelationPresence::Missing
    }
}

impl std::fmt::Debug for dyn Entity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}({})", self.type_name(), self.id())
    }
}
