//! Schema parsing - turns JSON Schema text into a [`Schema`] tree.
//!
//! Dialect differences are normalised here: `id`/`$id` land in separate
//! fields, `definitions` and `$defs` both fill [`Schema::defs`], and `type`
//! always becomes a [`TypeSet`]. References are recorded but not followed;
//! that is the generator's job, so forward references need no special care.

use std::collections::{BTreeSet, HashMap};

use serde_json::{Map, Value};
use url::Url;

use crate::error::ParseError;
use crate::schema::{
    Field, JsonKind, Literal, Schema, TypeSet, DEFINITIONS_KEYWORD, DEFS_KEYWORD,
};

/// Options for schema parsing.
#[derive(Debug, Clone, Default)]
pub struct ParseOptions {
    /// Reject documents whose root has no `$schema` key.
    /// Off by default: many published schemas omit it.
    pub schema_key_required: bool,
}

impl ParseOptions {
    /// Set whether a root `$schema` key is mandatory.
    pub fn schema_key_required(mut self, required: bool) -> Self {
        self.schema_key_required = required;
        self
    }
}

/// Parse a schema document.
///
/// `base` identifies where the text came from. It becomes the root `$id`
/// when the document declares none, and relative root identifiers are
/// resolved against it.
///
/// # Errors
///
/// Returns `ParseError::InvalidJson` for malformed text and
/// `ParseError::InvalidKeyword` when a keyword holds the wrong kind of value.
pub fn parse(text: &str, base: &Url) -> Result<Schema, ParseError> {
    parse_with_options(text, base, &ParseOptions::default())
}

/// Parse a schema document with explicit options.
pub fn parse_with_options(
    text: &str,
    base: &Url,
    options: &ParseOptions,
) -> Result<Schema, ParseError> {
    let value: Value =
        serde_json::from_str(text).map_err(|source| ParseError::InvalidJson { source })?;
    parse_value(&value, base, options)
}

/// Parse an already-decoded JSON value as a schema document.
pub fn parse_value(value: &Value, base: &Url, options: &ParseOptions) -> Result<Schema, ParseError> {
    let mut schema = parse_node(value, "#", "#")?;

    if options.schema_key_required && schema.schema_dialect.is_none() {
        return Err(ParseError::MissingSchemaKey {
            base: base.to_string(),
        });
    }

    if schema.id().is_empty() {
        schema.id06 = base.to_string();
    } else {
        let absolute = base
            .join(schema.id())
            .map_err(|source| ParseError::InvalidId {
                id: schema.id().to_string(),
                base: base.to_string(),
                source,
            })?
            .to_string();
        if schema.id06.is_empty() {
            schema.id04 = absolute;
        } else {
            schema.id06 = absolute;
        }
    }

    Ok(schema)
}

// --- Internal implementation ---

fn parse_node(value: &Value, path: &str, keyword: &str) -> Result<Schema, ParseError> {
    let map = match value {
        Value::Object(map) => map,
        // `true` accepts anything, `false` nothing; both carry no structure.
        Value::Bool(allowed) => {
            return Ok(Schema {
                path_element: path.to_string(),
                additional_properties: *allowed,
                ..Schema::default()
            })
        }
        other => return Err(invalid_keyword(path, keyword, "object or boolean", other)),
    };

    let mut schema = Schema {
        path_element: path.to_string(),
        ..Schema::default()
    };
    let mut definitions = HashMap::new();

    for (key, value) in map {
        let child_path = child_path(path, key);

        match key.as_str() {
            "$schema" => schema.schema_dialect = Some(expect_string(value, path, key)?),
            "$id" => schema.id06 = expect_string(value, path, key)?,
            // Only a string `id` is an identifier; anything else is an unknown keyword.
            "id" => {
                if let Value::String(id) = value {
                    schema.id04 = id.clone();
                }
            }
            "title" => schema.title = Some(expect_string(value, path, key)?),
            "description" => schema.description = Some(expect_string(value, path, key)?),
            "format" => schema.format = Some(expect_string(value, path, key)?),
            "$ref" => schema.reference = expect_string(value, path, key)?,
            "type" => schema.types = parse_types(value, path)?,
            "properties" => schema.properties = parse_properties(value, &child_path)?,
            "required" => schema.required = parse_required(value, path)?,
            "items" => schema.items = parse_items(value, &child_path)?,
            "$defs" => schema.defs = parse_defs(value, &child_path, DEFS_KEYWORD)?,
            "definitions" => {
                definitions = parse_defs(value, &child_path, DEFINITIONS_KEYWORD)?;
            }
            "additionalProperties" => match value {
                Value::Bool(allowed) => schema.additional_properties = *allowed,
                Value::Object(_) => {
                    schema.additional_schema =
                        Some(Box::new(parse_node(value, &child_path, key)?));
                }
                other => {
                    return Err(invalid_keyword(path, key, "boolean or object", other));
                }
            },
            "allOf" => schema.all_of = parse_composition(value, &child_path, key)?,
            "oneOf" => schema.one_of = parse_composition(value, &child_path, key)?,
            "anyOf" => schema.any_of = parse_composition(value, &child_path, key)?,
            "default" => schema.default = Some(Literal::from(value.clone())),
            "const" => schema.const_value = Some(Literal::from(value.clone())),
            "enum" => {
                let values = value
                    .as_array()
                    .ok_or_else(|| invalid_keyword(path, key, "array", value))?;
                schema.enum_values = values.iter().cloned().map(Literal::from).collect();
            }
            _ => {}
        }
    }

    // `$defs` wins the name; the `definitions` entry stays reachable by pointer.
    for (name, def) in definitions {
        if schema.defs.contains_key(&name) {
            schema.shadowed_defs.insert(name, def);
        } else {
            schema.defs.insert(name, def);
        }
    }

    // A reference is the whole truth about a node's shape.
    if schema.is_reference() {
        schema.types = TypeSet::default();
    }

    for (name, field) in schema.properties.iter_mut() {
        field.required = schema.required.contains(name);
    }

    Ok(schema)
}

fn parse_types(value: &Value, path: &str) -> Result<TypeSet, ParseError> {
    match value {
        Value::String(name) => Ok(TypeSet::single(name.clone())),
        Value::Array(names) => {
            let types = names
                .iter()
                .map(|name| {
                    name.as_str()
                        .map(String::from)
                        .ok_or_else(|| invalid_keyword(path, "type", "string", name))
                })
                .collect::<Result<Vec<_>, _>>()?;
            Ok(TypeSet::from(types))
        }
        other => Err(invalid_keyword(path, "type", "string or array", other)),
    }
}

fn parse_properties(value: &Value, path: &str) -> Result<HashMap<String, Field>, ParseError> {
    let props = expect_object(value, path, "properties")?;

    let mut result = HashMap::with_capacity(props.len());
    for (name, prop) in props {
        let schema = parse_node(prop, &child_path(path, name), name)?;
        result.insert(
            name.clone(),
            Field {
                json_name: name.clone(),
                required: false,
                schema,
            },
        );
    }
    Ok(result)
}

fn parse_required(value: &Value, path: &str) -> Result<BTreeSet<String>, ParseError> {
    match value {
        Value::Array(names) => names
            .iter()
            .map(|name| {
                name.as_str()
                    .map(String::from)
                    .ok_or_else(|| invalid_keyword(path, "required", "string", name))
            })
            .collect(),
        // Draft-03 boolean `required` has no meaning at the object level.
        Value::Bool(_) => Ok(BTreeSet::new()),
        other => Err(invalid_keyword(path, "required", "array", other)),
    }
}

fn parse_items(value: &Value, path: &str) -> Result<Option<Box<Schema>>, ParseError> {
    match value {
        // Tuple form: the first position decides the element type.
        Value::Array(items) => match items.first() {
            Some(first) => Ok(Some(Box::new(parse_node(first, &child_path(path, "0"), "items")?))),
            None => Ok(None),
        },
        _ => Ok(Some(Box::new(parse_node(value, path, "items")?))),
    }
}

fn parse_defs(
    value: &Value,
    path: &str,
    keyword: &str,
) -> Result<HashMap<String, Schema>, ParseError> {
    let defs = expect_object(value, path, keyword)?;

    let mut result = HashMap::with_capacity(defs.len());
    for (name, def) in defs {
        result.insert(name.clone(), parse_node(def, &child_path(path, name), name)?);
    }
    Ok(result)
}

fn parse_composition(value: &Value, path: &str, keyword: &str) -> Result<Vec<Schema>, ParseError> {
    let Some(arr) = value.as_array() else {
        return Err(invalid_keyword(path, keyword, "array", value));
    };

    arr.iter()
        .enumerate()
        .map(|(i, item)| parse_node(item, &child_path(path, &i.to_string()), keyword))
        .collect()
}

/// Append a JSON Pointer segment, escaping `~` and `/` (RFC 6901).
pub(crate) fn child_path(path: &str, segment: &str) -> String {
    format!("{}/{}", path, segment.replace('~', "~0").replace('/', "~1"))
}

fn expect_string(value: &Value, path: &str, keyword: &str) -> Result<String, ParseError> {
    value
        .as_str()
        .map(String::from)
        .ok_or_else(|| invalid_keyword(path, keyword, "string", value))
}

fn expect_object<'a>(
    value: &'a Value,
    path: &str,
    keyword: &str,
) -> Result<&'a Map<String, Value>, ParseError> {
    value
        .as_object()
        .ok_or_else(|| invalid_keyword(path, keyword, "object", value))
}

fn invalid_keyword(path: &str, keyword: &str, expected: &'static str, actual: &Value) -> ParseError {
    ParseError::InvalidKeyword {
        path: path.to_string(),
        keyword: keyword.to_string(),
        expected,
        actual: JsonKind::of(actual).as_str(),
    }
}
