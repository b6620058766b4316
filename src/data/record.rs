use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

/// Record keys owned by the record itself. Attributes and tags may not shadow them.
pub const RESERVED_KEYS: [&str; 5] = ["type", "pos", "created", "address", "node_refs"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementType {
    Node,
    Way,
}

impl ElementType {
    pub fn from_tag(tag: &str) -> Option<ElementType> {
        match tag {
            "node" => Some(ElementType::Node),
            "way" => Some(ElementType::Way),
            _ => None,
        }
    }
}

/// When a sub-record is written out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttachPolicy {
    Always,
    IfNonEmpty,
}

impl AttachPolicy {
    fn attaches(self, is_empty: bool) -> bool {
        match self {
            AttachPolicy::Always => true,
            AttachPolicy::IfNonEmpty => !is_empty,
        }
    }
}

// `created` is attached even when empty while `address` and `node_refs` are not.
// The two policies are kept apart on purpose so the asymmetry stays visible.
pub const CREATED_POLICY: AttachPolicy = AttachPolicy::Always;
pub const ADDRESS_POLICY: AttachPolicy = AttachPolicy::IfNonEmpty;
pub const NODE_REFS_POLICY: AttachPolicy = AttachPolicy::IfNonEmpty;

/// A top-level record value: either a plain string or a namespace of `prefix:suffix` tags.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Field {
    Scalar(String),
    Namespace(BTreeMap<String, String>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub element_type: ElementType,
    pub pos: Option<[f64; 2]>,
    pub created: BTreeMap<String, String>,
    pub fields: BTreeMap<String, Field>,
    pub address: BTreeMap<String, String>,
    pub node_refs: Vec<String>,
}

impl Record {
    pub fn new(element_type: ElementType) -> Record {
        Record {
            element_type,
            pos: None,
            created: BTreeMap::new(),
            fields: BTreeMap::new(),
            address: BTreeMap::new(),
            node_refs: Vec::new(),
        }
    }

    /// Sets a top-level string field. If `key` already names a namespace the value
    /// is filed inside it under `key`, same as a scalar that gets demoted later.
    pub fn set_scalar(&mut self, key: &str, value: &str) {
        match self.fields.entry(key.to_string()) {
            Entry::Vacant(entry) => {
                entry.insert(Field::Scalar(value.to_string()));
            },
            Entry::Occupied(mut entry) => match entry.get_mut() {
                Field::Scalar(existing) => *existing = value.to_string(),
                Field::Namespace(namespace) => {
                    namespace.insert(key.to_string(), value.to_string());
                },
            },
        }
    }

    /// Adds `prefix:subkey = value`. A scalar already stored under `prefix` is
    /// demoted into the namespace under its own prefix name.
    pub fn set_namespaced(&mut self, prefix: &str, subkey: &str, value: &str) {
        match self.fields.entry(prefix.to_string()) {
            Entry::Vacant(entry) => {
                let mut namespace = BTreeMap::new();
                namespace.insert(subkey.to_string(), value.to_string());
                entry.insert(Field::Namespace(namespace));
            },
            Entry::Occupied(mut entry) => {
                let field = entry.get_mut();
                if let Field::Scalar(scalar) = field {
                    let mut namespace = BTreeMap::new();
                    namespace.insert(prefix.to_string(), std::mem::take(scalar));
                    *field = Field::Namespace(namespace);
                }
                if let Field::Namespace(namespace) = field {
                    namespace.insert(subkey.to_string(), value.to_string());
                }
            },
        }
    }

    pub fn field(&self, key: &str) -> Option<&Field> {
        self.fields.get(key)
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("type", &self.element_type)?;
        for (key, value) in &self.fields {
            map.serialize_entry(key, value)?;
        }
        if let Some(pos) = &self.pos {
            map.serialize_entry("pos", pos)?;
        }
        if CREATED_POLICY.attaches(self.created.is_empty()) {
            map.serialize_entry("created", &self.created)?;
        }
        if NODE_REFS_POLICY.attaches(self.node_refs.is_empty()) {
            map.serialize_entry("node_refs", &self.node_refs)?;
        }
        if ADDRESS_POLICY.attaches(self.address.is_empty()) {
            map.serialize_entry("address", &self.address)?;
        }
        map.end()
    }
}
