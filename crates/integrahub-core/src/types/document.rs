//! Host-framework documents as seen from the integration layer.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Tagged reference to a document of any type: `{doctype, name}`.
///
/// The referenced schema varies by doctype, so the reference is resolved
/// through a [`DocumentRegistry`](crate::traits::DocumentRegistry) rather
/// than a foreign key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DocRef {
    /// The document type tag.
    pub doctype: String,
    /// The document identifier within its type.
    pub name: String,
}

impl DocRef {
    /// Creates a new reference.
    pub fn new(doctype: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            doctype: doctype.into(),
            name: name.into(),
        }
    }

    /// Builds a reference from two optional halves; both must be non-empty.
    pub fn from_parts(doctype: Option<&str>, name: Option<&str>) -> Option<Self> {
        match (doctype, name) {
            (Some(d), Some(n)) if !d.is_empty() && !n.is_empty() => Some(Self::new(d, n)),
            _ => None,
        }
    }
}

impl fmt::Display for DocRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.doctype, self.name)
    }
}

/// A document snapshot handed over by a lifecycle hook.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// The document type.
    pub doctype: String,
    /// The document name.
    pub name: String,
    /// All other field values.
    #[serde(default)]
    pub fields: Map<String, Value>,
}

impl Document {
    /// Creates an empty document.
    pub fn new(doctype: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            doctype: doctype.into(),
            name: name.into(),
            fields: Map::new(),
        }
    }

    /// Sets a field, builder style.
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    /// The tagged reference for this document.
    pub fn doc_ref(&self) -> DocRef {
        DocRef::new(self.doctype.clone(), self.name.clone())
    }

    /// Flattens the document into a single JSON object.
    pub fn to_json(&self) -> Value {
        let mut object = self.fields.clone();
        object.insert("doctype".to_string(), Value::String(self.doctype.clone()));
        object.insert("name".to_string(), Value::String(self.name.clone()));
        Value::Object(object)
    }
}
