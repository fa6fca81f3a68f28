use crate::{
    model::{
        entity::{Entity, EntityHandle, FieldPresence, RelationPresence},
        id::Id,
        serializer::{Serializer, SerializerDescriptor},
    },
    registry::SerializerRegistry,
};
use serde_json::{Value, json};
use std::{
    cell::RefCell,
    collections::HashMap,
    rc::{Rc, Weak},
};

type NodeKey = (&'static str, Id);

///
/// Node
///
/// Table-driven test entity. Relations are stored as `(type, id)` keys and
/// resolved through the owning [`Graph`], so cycles need no `Rc` loops.
///

pub struct Node {
    type_name: &'static str,
    id: Id,
    fields: Vec<(String, Value)>,
    one: Vec<(String, Option<NodeKey>)>,
    many: Vec<(String, Vec<NodeKey>)>,
    graph: Weak<Graph>,
}

impl Node {
    pub fn new(type_name: &'static str, id: impl Into<Id>) -> Self {
        Self {
            type_name,
            id: id.into(),
            fields: Vec::new(),
            one: Vec::new(),
            many: Vec::new(),
            graph: Weak::new(),
        }
    }

    pub fn field(mut self, name: &str, value: Value) -> Self {
        self.fields.push((name.to_string(), value));
        self
    }

    pub fn one(mut self, name: &str, target: Option<(&'static str, Id)>) -> Self {
        self.one.push((name.to_string(), target));
        self
    }

    pub fn many<I>(mut self, name: &str, targets: I) -> Self
    where
        I: IntoIterator<Item = (&'static str, Id)>,
    {
        self.many
            .push((name.to_string(), targets.into_iter().collect()));
        self
    }

    fn lookup(&self, key: &NodeKey) -> Option<EntityHandle> {
        self.graph.upgrade()?.get(key.0, &key.1)
    }
}

impl Entity for Node {
    fn type_name(&self) -> &str {
        self.type_name
    }

    fn id(&self) -> Id {
        self.id.clone()
    }

    fn field(&self, name: &str) -> FieldPresence {
        self.fields
            .iter()
            .find(|(field, _)| field == name)
            .map_or(FieldPresence::Missing, |(_, value)| {
                FieldPresence::Present(value.clone())
            })
    }

    fn related_one(&self, name: &str) -> RelationPresence<Option<EntityHandle>> {
        match self.one.iter().find(|(relation, _)| relation == name) {
            Some((_, target)) => {
                RelationPresence::Present(target.as_ref().and_then(|key| self.lookup(key)))
            }
            None => RelationPresence::Missing,
        }
    }

    fn related_many(&self, name: &str) -> RelationPresence<Vec<EntityHandle>> {
        match self.many.iter().find(|(relation, _)| relation == name) {
            Some((_, targets)) => {
                RelationPresence::Present(targets.iter().filter_map(|k| self.lookup(k)).collect())
            }
            None => RelationPresence::Missing,
        }
    }
}

///
/// Graph
///
/// Arena that owns every fixture node.
///

#[derive(Default)]
pub struct Graph {
    nodes: RefCell<HashMap<NodeKey, EntityHandle>>,
}

impl Graph {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    pub fn add(self: &Rc<Self>, mut node: Node) -> EntityHandle {
        node.graph = Rc::downgrade(self);
        let key = (node.type_name, node.id.clone());
        let handle: EntityHandle = Rc::new(node);
        self.nodes.borrow_mut().insert(key, Rc::clone(&handle));

        handle
    }

    pub fn get(&self, type_name: &'static str, id: &Id) -> Option<EntityHandle> {
        self.nodes
            .borrow()
            .get(&(type_name, id.clone()))
            .cloned()
    }

    pub fn expect(&self, type_name: &'static str, id: impl Into<Id>) -> EntityHandle {
        self.get(type_name, &id.into())
            .expect("fixture node should exist")
    }
}

///
/// ComputedSerializer
///
/// Descriptor plus a serializer-level attribute override.
///

pub struct ComputedSerializer {
    pub descriptor: SerializerDescriptor,
    pub compute: fn(&dyn Entity, &str) -> Option<Value>,
}

impl Serializer for ComputedSerializer {
    fn descriptor(&self) -> &SerializerDescriptor {
        &self.descriptor
    }

    fn attribute(&self, entity: &dyn Entity, name: &str) -> Option<Value> {
        (self.compute)(entity, name)
    }
}

///
/// Blog fixture
///

pub const POST: SerializerDescriptor = SerializerDescriptor::new("Post")
    .attributes(&["title"])
    .has_one(&["author"])
    .has_many(&["comments", "tags"]);

pub const AUTHOR: SerializerDescriptor = SerializerDescriptor::new("Author")
    .attributes(&["name"])
    .has_many(&["posts"]);

pub const COMMENT: SerializerDescriptor = SerializerDescriptor::new("Comment")
    .attributes(&["body"])
    .has_one(&["author"]);

pub const TAG: SerializerDescriptor = SerializerDescriptor::new("Tag").attributes(&["label"]);

pub fn blog_registry() -> SerializerRegistry {
    let mut registry = SerializerRegistry::new();
    for descriptor in [POST, AUTHOR, COMMENT, TAG] {
        registry
            .register(descriptor)
            .expect("blog serializer registration should succeed");
    }

    registry
}

/// Two posts by author 5; author 5 lists both posts (a cycle through
/// `author.posts`). Comment 10 is by author 6 and exposes no `author_id`.
pub fn blog_graph() -> Rc<Graph> {
    let graph = Graph::new();

    graph.add(
        Node::new("Post", 1)
            .field("title", json!("First"))
            .field("author_id", json!(5))
            .one("author", Some(("Author", Id::from(5))))
            .many("comments", [("Comment", Id::from(10)), ("Comment", Id::from(11))])
            .many("tags", []),
    );
    graph.add(
        Node::new("Post", 2)
            .field("title", json!("Second"))
            .field("author_id", json!(5))
            .one("author", Some(("Author", Id::from(5))))
            .many("comments", [("Comment", Id::from(12))])
            .many("tags", [("Tag", Id::from("t1"))]),
    );
    graph.add(
        Node::new("Author", 5)
            .field("name", json!("Ada"))
            .many("posts", [("Post", Id::from(1)), ("Post", Id::from(2))]),
    );
    graph.add(
        Node::new("Author", 6)
            .field("name", json!("Grace"))
            .many("posts", []),
    );
    graph.add(
        Node::new("Comment", 10)
            .field("body", json!("a"))
            .one("author", Some(("Author", Id::from(6)))),
    );
    graph.add(
        Node::new("Comment", 11)
            .field("body", json!("b"))
            .one("author", None),
    );
    graph.add(
        Node::new("Comment", 12)
            .field("body", json!("c"))
            .one("author", Some(("Author", Id::from(5)))),
    );
    graph.add(Node::new("Tag", "t1").field("label", json!("rust")));

    graph
}
