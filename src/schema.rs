//! In-memory model of a parsed JSON Schema document.
//!
//! A [`Schema`] tree is produced once by [`parse`](crate::parse) and never
//! mutated afterwards. Property and definition maps carry no ordering;
//! anything that iterates them for output sorts the keys first.

use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::ops::Deref;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Container keyword used by draft 2019-09 and later.
pub const DEFS_KEYWORD: &str = "$defs";

/// Container keyword used by draft-04 through draft-07.
pub const DEFINITIONS_KEYWORD: &str = "definitions";

/// JSON kind of a value, used for literal discrimination and error messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JsonKind {
    Null,
    Boolean,
    Number,
    String,
    Array,
    Object,
}

impl JsonKind {
    /// Returns the kind of `value`.
    pub fn of(value: &Value) -> Self {
        match value {
            Value::Null => JsonKind::Null,
            Value::Bool(_) => JsonKind::Boolean,
            Value::Number(_) => JsonKind::Number,
            Value::String(_) => JsonKind::String,
            Value::Array(_) => JsonKind::Array,
            Value::Object(_) => JsonKind::Object,
        }
    }

    /// Returns the JSON type name for error messages.
    pub fn as_str(&self) -> &'static str {
        match self {
            JsonKind::Null => "null",
            JsonKind::Boolean => "boolean",
            JsonKind::Number => "number",
            JsonKind::String => "string",
            JsonKind::Array => "array",
            JsonKind::Object => "object",
        }
    }
}

impl fmt::Display for JsonKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An uninterpreted literal from `default`, `const` or `enum`.
///
/// The payload is kept exactly as parsed; [`Literal::kind`] exposes which
/// JSON kind it holds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Literal(Value);

impl Literal {
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    pub fn kind(&self) -> JsonKind {
        JsonKind::of(&self.0)
    }

    pub fn value(&self) -> &Value {
        &self.0
    }

    /// Returns the payload if this literal is a string.
    pub fn as_str(&self) -> Option<&str> {
        self.0.as_str()
    }

    pub fn into_value(self) -> Value {
        self.0
    }
}

impl From<Value> for Literal {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The `type` keyword: a single type name or an ordered list of them.
///
/// The first entry is authoritative; later entries are hints
/// (typically `"null"` for nullable values).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TypeSet(Vec<String>);

impl TypeSet {
    pub fn single(name: impl Into<String>) -> Self {
        Self(vec![name.into()])
    }

    /// The first declared type, or `""` when no type was declared.
    pub fn primary(&self) -> &str {
        self.0.first().map(String::as_str).unwrap_or("")
    }

    /// True when more than one type was declared.
    pub fn is_multiple(&self) -> bool {
        self.0.len() > 1
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.iter().any(|t| t == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl From<Vec<String>> for TypeSet {
    fn from(types: Vec<String>) -> Self {
        Self(types)
    }
}

/// One JSON Schema node.
#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    /// The `$schema` meta-schema URI.
    pub schema_dialect: Option<String>,
    /// Draft-04 `id`.
    pub id04: String,
    /// Draft-06+ `$id`.
    pub id06: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub types: TypeSet,
    pub properties: HashMap<String, Field>,
    pub required: BTreeSet<String>,
    pub items: Option<Box<Schema>>,
    /// Entries from `$defs` and `definitions`, keyed by local name.
    pub defs: HashMap<String, Schema>,
    /// `definitions` entries whose name is also declared under `$defs`.
    /// Not visible through `defs`, but still addressable by pointer.
    pub shadowed_defs: HashMap<String, Schema>,
    /// JSON pointer from the document root to this node, e.g. `#/$defs/temperature`.
    pub path_element: String,
    pub additional_properties: bool,
    /// Set when `additionalProperties` is a schema rather than a boolean.
    pub additional_schema: Option<Box<Schema>>,
    pub one_of: Vec<Schema>,
    pub all_of: Vec<Schema>,
    pub any_of: Vec<Schema>,
    /// The `$ref` pointer; empty when the node is not a reference.
    pub reference: String,
    pub default: Option<Literal>,
    pub const_value: Option<Literal>,
    pub enum_values: Vec<Literal>,
    pub format: Option<String>,
}

impl Default for Schema {
    fn default() -> Self {
        Self {
            schema_dialect: None,
            id04: String::new(),
            id06: String::new(),
            title: None,
            description: None,
            types: TypeSet::default(),
            properties: HashMap::new(),
            required: BTreeSet::new(),
            items: None,
            defs: HashMap::new(),
            shadowed_defs: HashMap::new(),
            path_element: "#".to_string(),
            additional_properties: true,
            additional_schema: None,
            one_of: Vec::new(),
            all_of: Vec::new(),
            any_of: Vec::new(),
            reference: String::new(),
            default: None,
            const_value: None,
            enum_values: Vec::new(),
            format: None,
        }
    }
}

impl Schema {
    /// The schema identifier: `$id` if set, else `id`, else `""`.
    pub fn id(&self) -> &str {
        if !self.id06.is_empty() {
            &self.id06
        } else {
            &self.id04
        }
    }

    pub fn is_reference(&self) -> bool {
        !self.reference.is_empty()
    }

    /// Returns the property keys in lexicographic order.
    pub fn sorted_property_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.properties.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Returns the definition keys in lexicographic order.
    pub fn sorted_def_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.defs.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Returns every definition declared on this node, `defs` first, each
    /// group sorted by name.
    pub fn definitions(&self) -> Vec<(&str, &Schema)> {
        let mut shadowed: Vec<&str> = self.shadowed_defs.keys().map(String::as_str).collect();
        shadowed.sort_unstable();

        let mut result: Vec<(&str, &Schema)> = self
            .sorted_def_names()
            .into_iter()
            .map(|name| (name, &self.defs[name]))
            .collect();
        result.extend(shadowed.into_iter().map(|name| (name, &self.shadowed_defs[name])));
        result
    }

    /// Calls `visit` for this node and every nested schema, depth-first.
    pub fn walk<'a>(&'a self, visit: &mut dyn FnMut(&'a Schema)) {
        visit(self);
        for name in self.sorted_property_names() {
            self.properties[name].schema.walk(visit);
        }
        if let Some(items) = &self.items {
            items.walk(visit);
        }
        for (_, def) in self.definitions() {
            def.walk(visit);
        }
        if let Some(additional) = &self.additional_schema {
            additional.walk(visit);
        }
        for branch in self.all_of.iter().chain(&self.one_of).chain(&self.any_of) {
            branch.walk(visit);
        }
    }
}

/// A named schema found in its parent's `properties`.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    /// The property key as written in the document.
    pub json_name: String,
    /// Whether the parent lists this property in `required`.
    pub required: bool,
    pub schema: Schema,
}

impl Field {
    /// Returns the primary declared type and whether more than one was declared.
    ///
    /// A pure `$ref` field has no inline type and yields `("", false)`.
    pub fn field_type(&self) -> (&str, bool) {
        if self.schema.is_reference() {
            return ("", false);
        }
        (self.schema.types.primary(), self.schema.types.is_multiple())
    }
}

impl Deref for Field {
    type Target = Schema;

    fn deref(&self) -> &Schema {
        &self.schema
    }
}
