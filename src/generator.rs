//! Type generation - resolves schema trees into named structs and aliases.
//!
//! Every root registered in the [`Registry`] is processed in order. Nodes are
//! keyed by (document, JSON pointer), so a definition reached through several
//! `$ref`s is generated once. Object schemas become structs; an inline object
//! whose fields match an existing struct reuses it instead of producing a
//! duplicate.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use serde::Serialize;

use crate::error::GenerateError;
use crate::naming::{disambiguate, identifier, last_pointer_segment, type_name};
use crate::registry::{NodeIndex, Registry};
use crate::schema::{Literal, Schema, TypeSet, DEFINITIONS_KEYWORD, DEFS_KEYWORD};

/// Target type for values whose shape is unconstrained.
pub const OPEN_TYPE: &str = "interface{}";

/// A generated record type.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Struct {
    /// Identifier of the schema the struct was generated from.
    pub id: String,
    pub name: String,
    pub description: String,
    /// Fields keyed by generated field name.
    pub fields: BTreeMap<String, StructField>,
    /// The source schema set `additionalProperties: false`.
    pub closed: bool,
}

/// A struct field with its target type already resolved.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StructField {
    pub name: String,
    /// The property key as written in the schema.
    pub json_name: String,
    pub type_name: String,
    pub required: bool,
    pub description: String,
    pub default: Option<Literal>,
}

/// A named type that only renames another type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Alias {
    pub name: String,
    pub type_name: String,
}

/// A root schema that generated successfully.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RootSchema {
    pub id: String,
    pub type_name: String,
}

/// Everything produced by one generation run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Graph {
    pub structs: BTreeMap<String, Struct>,
    pub aliases: BTreeMap<String, Alias>,
    /// Roots in the order they were processed.
    pub roots: Vec<RootSchema>,
}

/// A root that failed to generate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RootError {
    /// Identifier of the failed root.
    pub root: String,
    pub error: GenerateError,
}

/// Result of a generation run: the graph of every root that succeeded, plus
/// the errors of those that did not.
#[derive(Debug, Clone)]
pub struct Generation {
    pub graph: Graph,
    pub errors: Vec<RootError>,
}

impl Generation {
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }

    /// Return the graph, or the first root error if any root failed.
    pub fn into_result(self) -> Result<Graph, GenerateError> {
        match self.errors.into_iter().next() {
            Some(failure) => Err(failure.error),
            None => Ok(self.graph),
        }
    }
}

/// Resolves registered root schemas into a [`Graph`].
pub struct Generator<'a> {
    registry: &'a Registry,
    index: NodeIndex<'a>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Origin {
    Root,
    Definition,
    Inline,
}

type NodeKey = (usize, String);

/// Structural identity of a struct: (json name, type, required) per field.
type Shape = Vec<(String, String, bool)>;

/// Mutable state for one generation run.
#[derive(Debug, Clone, Default)]
struct Context {
    graph: Graph,
    /// Target type of every node resolved so far.
    resolved: HashMap<NodeKey, String>,
    /// Nodes being resolved, with the struct name reserved for them if any.
    in_progress: HashMap<NodeKey, Option<String>>,
    /// Struct nodes whose reserved name was handed out before completion.
    self_referenced: HashSet<NodeKey>,
    /// Names claimed up front for object definitions.
    assigned: HashMap<NodeKey, String>,
    /// Struct name generated for each node.
    owners: HashMap<NodeKey, String>,
    /// Every struct or alias name in use or reserved.
    names: HashSet<String>,
    shapes: HashMap<Shape, String>,
}

impl<'a> Generator<'a> {
    pub fn new(registry: &'a Registry) -> Self {
        Self {
            registry,
            index: NodeIndex::build(registry),
        }
    }

    /// Generate types for every root in the registry.
    ///
    /// A root that fails leaves no trace in the graph; later roots are
    /// still processed.
    pub fn generate(&self) -> Generation {
        let mut ctx = Context::default();
        let mut errors = Vec::new();

        for &doc in self.registry.roots() {
            let root = self.registry.document(doc);
            let checkpoint = ctx.clone();

            match self.process_root(&mut ctx, doc) {
                Ok(type_name) => ctx.graph.roots.push(RootSchema {
                    id: root.id().to_string(),
                    type_name,
                }),
                Err(error) => {
                    tracing::warn!(root = root.id(), %error, "root schema failed");
                    ctx = checkpoint;
                    errors.push(RootError {
                        root: root.id().to_string(),
                        error,
                    });
                }
            }
        }

        Generation {
            graph: ctx.graph,
            errors,
        }
    }

    fn process_root(&self, ctx: &mut Context, doc: usize) -> Result<String, GenerateError> {
        let root = self.registry.document(doc);

        let mut definitions = Vec::new();
        root.walk(&mut |node| definitions.extend(node.definitions()));

        // Object definitions claim their names before inline schemas can.
        for &(key_name, def) in &definitions {
            let key = node_key(doc, def);
            let is_struct = !def.properties.is_empty() || !def.all_of.is_empty();
            if !is_struct || ctx.assigned.contains_key(&key) || ctx.resolved.contains_key(&key) {
                continue;
            }
            let name = reserve_name(ctx, &type_name(def, key_name)?);
            ctx.assigned.insert(key, name);
        }

        let root_type = self.process(ctx, doc, root, "Root", Origin::Root)?;

        for &(key_name, def) in &definitions {
            self.process(ctx, doc, def, key_name, Origin::Definition)?;
        }

        let own_struct = ctx
            .owners
            .get(&node_key(doc, root))
            .map(String::as_str)
            .map(pointer_to);
        let named = own_struct.as_deref() == Some(root_type.as_str())
            || ctx.graph.aliases.contains_key(&root_type);
        if !named {
            let name = reserve_name(ctx, &type_name(root, "Root")?);
            ctx.graph.aliases.insert(
                name.clone(),
                Alias {
                    name,
                    type_name: root_type.clone(),
                },
            );
        }

        Ok(root_type)
    }

    /// Resolve `node` to a target type, generating structs as needed.
    fn process(
        &self,
        ctx: &mut Context,
        doc: usize,
        node: &'a Schema,
        hint: &str,
        origin: Origin,
    ) -> Result<String, GenerateError> {
        let key = node_key(doc, node);
        if let Some(resolved) = ctx.resolved.get(&key) {
            return Ok(resolved.clone());
        }
        if ctx.in_progress.contains_key(&key) {
            return self.reenter(ctx, doc, node);
        }

        ctx.in_progress.insert(key.clone(), None);
        let result = self.process_node(ctx, doc, node, hint, origin);
        ctx.in_progress.remove(&key);

        // An assigned name the node did not end up using is free again.
        if let Some(name) = ctx.assigned.get(&key) {
            if !ctx.owners.contains_key(&key) {
                ctx.names.remove(name);
            }
        }

        let type_name = result?;
        ctx.resolved.insert(key, type_name.clone());
        Ok(type_name)
    }

    /// Handle a node reached again while it is still being resolved.
    ///
    /// Recursion through a struct is fine: the struct's name is already
    /// reserved. Anything else would never terminate.
    fn reenter(&self, ctx: &mut Context, doc: usize, node: &'a Schema) -> Result<String, GenerateError> {
        let mut visited = HashSet::new();
        let (mut current_doc, mut current) = (doc, node);

        loop {
            let key = node_key(current_doc, current);
            if let Some(resolved) = ctx.resolved.get(&key) {
                return Ok(resolved.clone());
            }
            if let Some(Some(name)) = ctx.in_progress.get(&key) {
                let type_name = pointer_to(name);
                ctx.self_referenced.insert(key);
                return Ok(type_name);
            }
            if !current.is_reference() || !visited.insert(key) {
                break;
            }
            match self.index.resolve(current_doc, &current.reference) {
                Some(target) => {
                    current_doc = target.document;
                    current = target.schema;
                }
                None => break,
            }
        }

        Err(GenerateError::CyclicReference {
            reference: if node.is_reference() {
                node.reference.clone()
            } else {
                node.path_element.clone()
            },
            document: self.document_name(doc),
        })
    }

    fn process_node(
        &self,
        ctx: &mut Context,
        doc: usize,
        node: &'a Schema,
        hint: &str,
        origin: Origin,
    ) -> Result<String, GenerateError> {
        if node.is_reference() {
            return self.process_reference(ctx, doc, node);
        }

        if !node.all_of.is_empty() {
            let mut parts = Vec::new();
            self.collect_all_of(doc, node, &mut parts, &mut HashSet::new())?;
            return self.process_merged(ctx, doc, node, &parts, hint, origin);
        }

        let types = infer_types(node);
        if types.is_empty() {
            let branches: Vec<&'a Schema> = node.one_of.iter().chain(&node.any_of).collect();
            return self.process_variants(ctx, doc, node, &branches, hint);
        }

        let parts = [(doc, node)];
        self.process_types(ctx, doc, node, &parts, &types, hint, origin)
    }

    #[allow(clippy::too_many_arguments)]
    fn process_types(
        &self,
        ctx: &mut Context,
        doc: usize,
        node: &'a Schema,
        parts: &[(usize, &'a Schema)],
        types: &TypeSet,
        hint: &str,
        origin: Origin,
    ) -> Result<String, GenerateError> {
        let concrete: Vec<&str> = types.iter().filter(|t| *t != "null").collect();

        match concrete.as_slice() {
            [] => Ok(OPEN_TYPE.to_string()),
            [single] => self.process_type(ctx, doc, node, parts, single, hint, origin),
            many => {
                // Object and array members still get their types generated.
                for member in many {
                    if matches!(*member, "object" | "array") {
                        let member_hint = format!("{}_{}", hint, member);
                        self.process_type(ctx, doc, node, parts, member, &member_hint, origin)?;
                    }
                }
                Ok(OPEN_TYPE.to_string())
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn process_type(
        &self,
        ctx: &mut Context,
        doc: usize,
        node: &'a Schema,
        parts: &[(usize, &'a Schema)],
        schema_type: &str,
        hint: &str,
        origin: Origin,
    ) -> Result<String, GenerateError> {
        match schema_type {
            "object" => self.process_object(ctx, doc, node, parts, hint, origin),
            "array" => self.process_array(ctx, parts, hint),
            other => match primitive_type(other) {
                Some(primitive) => Ok(primitive.to_string()),
                None => {
                    tracing::warn!(
                        schema_type = other,
                        path = %node.path_element,
                        "unknown type, using open value"
                    );
                    Ok(OPEN_TYPE.to_string())
                }
            },
        }
    }

    fn process_reference(
        &self,
        ctx: &mut Context,
        doc: usize,
        node: &'a Schema,
    ) -> Result<String, GenerateError> {
        let target = self.index.resolve(doc, &node.reference).ok_or_else(|| {
            GenerateError::UnresolvedReference {
                reference: node.reference.clone(),
                document: self.document_name(doc),
            }
        })?;
        tracing::trace!(reference = %node.reference, target = %target.schema.path_element, "resolved reference");

        let path = target.schema.path_element.as_str();
        let origin = if path == "#" || is_definition_path(path) {
            Origin::Definition
        } else {
            Origin::Inline
        };
        let hint = if path == "#" {
            "Root".to_string()
        } else {
            last_pointer_segment(path)
        };

        self.process(ctx, target.document, target.schema, &hint, origin)
    }

    fn process_array(
        &self,
        ctx: &mut Context,
        parts: &[(usize, &'a Schema)],
        hint: &str,
    ) -> Result<String, GenerateError> {
        let items = parts
            .iter()
            .find_map(|&(doc, part)| part.items.as_deref().map(|items| (doc, items)));

        match items {
            Some((doc, items)) => {
                let item_hint = format!("{}Items", hint);
                let item_type = self.process(ctx, doc, items, &item_hint, Origin::Inline)?;
                Ok(format!("[]{}", item_type))
            }
            None => Ok(format!("[]{}", OPEN_TYPE)),
        }
    }

    fn process_object(
        &self,
        ctx: &mut Context,
        doc: usize,
        node: &'a Schema,
        parts: &[(usize, &'a Schema)],
        hint: &str,
        origin: Origin,
    ) -> Result<String, GenerateError> {
        let has_properties = parts.iter().any(|(_, part)| !part.properties.is_empty());
        let closed = parts.iter().any(|(_, part)| !part.additional_properties);

        if !has_properties {
            let additional = parts.iter().find_map(|&(doc, part)| {
                part.additional_schema.as_deref().map(|schema| (doc, schema))
            });
            if let Some((ap_doc, ap)) = additional {
                let value_hint = format!("{}Value", hint);
                let value_type = self.process(ctx, ap_doc, ap, &value_hint, Origin::Inline)?;
                return Ok(format!("map[string]{}", value_type));
            }
            if !closed {
                return Ok(format!("map[string]{}", OPEN_TYPE));
            }
        }

        let key = node_key(doc, node);
        let name = match ctx.assigned.get(&key) {
            Some(name) => name.clone(),
            None => {
                let candidate = type_name(node, hint)?;
                let name = reserve_name(ctx, &candidate);
                if name != candidate {
                    tracing::debug!(%candidate, %name, "renamed struct to avoid collision");
                }
                name
            }
        };
        ctx.in_progress.insert(key.clone(), Some(name.clone()));

        let fields = match self.collect_fields(ctx, &name, parts) {
            Ok(fields) => fields,
            Err(error) => {
                if !ctx.assigned.contains_key(&key) {
                    ctx.names.remove(&name);
                }
                return Err(error);
            }
        };

        let shape: Shape = fields
            .values()
            .map(|f| (f.json_name.clone(), f.type_name.clone(), f.required))
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        if origin == Origin::Inline && !ctx.self_referenced.contains(&key) {
            if let Some(existing) = ctx.shapes.get(&shape) {
                tracing::debug!(%name, %existing, "reusing structurally identical struct");
                let existing = existing.clone();
                if !ctx.assigned.contains_key(&key) {
                    ctx.names.remove(&name);
                }
                return Ok(pointer_to(&existing));
            }
        }

        let description = parts
            .iter()
            .find_map(|(_, part)| part.description.clone())
            .unwrap_or_default();

        tracing::debug!(%name, fields = fields.len(), "created struct");
        ctx.shapes.entry(shape).or_insert_with(|| name.clone());
        ctx.owners.insert(key, name.clone());
        ctx.graph.structs.insert(
            name.clone(),
            Struct {
                id: node.id().to_string(),
                name: name.clone(),
                description,
                fields,
                closed,
            },
        );

        Ok(pointer_to(&name))
    }

    /// Resolve the properties of every part into fields of struct `name`.
    fn collect_fields(
        &self,
        ctx: &mut Context,
        name: &str,
        parts: &[(usize, &'a Schema)],
    ) -> Result<BTreeMap<String, StructField>, GenerateError> {
        let mut fields: BTreeMap<String, StructField> = BTreeMap::new();
        let mut by_json_name: HashMap<String, String> = HashMap::new();

        for &(part_doc, part) in parts {
            for json_name in part.sorted_property_names() {
                let property = &part.properties[json_name];
                let field_type =
                    self.process(ctx, part_doc, &property.schema, json_name, Origin::Inline)?;
                let required = parts.iter().any(|(_, p)| p.required.contains(json_name));

                if let Some(field_name) = by_json_name.get(json_name) {
                    let existing = &fields[field_name];
                    if existing.type_name != field_type {
                        return Err(GenerateError::MergeConflict {
                            name: name.to_string(),
                            property: json_name.to_string(),
                            existing: existing.type_name.clone(),
                            incoming: field_type,
                        });
                    }
                    continue;
                }

                if !is_tag_safe(json_name) {
                    return Err(GenerateError::InvalidTagName {
                        name: json_name.to_string(),
                        path: property.path_element.clone(),
                    });
                }
                let base = identifier(json_name, &property.path_element)?;
                let field_name = disambiguate(&base, |n| fields.contains_key(n));
                by_json_name.insert(json_name.to_string(), field_name.clone());
                fields.insert(
                    field_name.clone(),
                    StructField {
                        name: field_name,
                        json_name: json_name.to_string(),
                        type_name: field_type,
                        required,
                        description: property.description.clone().unwrap_or_default(),
                        default: property.default.clone(),
                    },
                );
            }
        }

        Ok(fields)
    }

    /// Resolve an `allOf` node by merging its branches into one schema.
    fn process_merged(
        &self,
        ctx: &mut Context,
        doc: usize,
        node: &'a Schema,
        parts: &[(usize, &'a Schema)],
        hint: &str,
        origin: Origin,
    ) -> Result<String, GenerateError> {
        let mut declared: Option<String> = None;
        for (_, part) in parts {
            let primary = infer_types(part)
                .iter()
                .find(|t| *t != "null")
                .map(str::to_string);
            let Some(primary) = primary else {
                continue;
            };
            match &declared {
                None => declared = Some(primary),
                Some(existing) if *existing != primary => {
                    return Err(GenerateError::MergeConflict {
                        name: type_name(node, hint).unwrap_or_else(|_| hint.to_string()),
                        property: "type".to_string(),
                        existing: existing.clone(),
                        incoming: primary,
                    });
                }
                Some(_) => {}
            }
        }

        match declared {
            Some(schema_type) => {
                self.process_type(ctx, doc, node, parts, &schema_type, hint, origin)
            }
            None => Ok(OPEN_TYPE.to_string()),
        }
    }

    /// Flatten `node` and its `allOf` branches, following references.
    fn collect_all_of(
        &self,
        doc: usize,
        node: &'a Schema,
        parts: &mut Vec<(usize, &'a Schema)>,
        visiting: &mut HashSet<NodeKey>,
    ) -> Result<(), GenerateError> {
        if !visiting.insert(node_key(doc, node)) {
            return Err(GenerateError::CyclicReference {
                reference: node.path_element.clone(),
                document: self.document_name(doc),
            });
        }

        parts.push((doc, node));
        for branch in &node.all_of {
            let (branch_doc, branch) = self.follow_references(doc, branch)?;
            self.collect_all_of(branch_doc, branch, parts, visiting)?;
        }
        Ok(())
    }

    /// Resolve `$ref` chains until reaching a node with its own shape.
    fn follow_references(
        &self,
        doc: usize,
        node: &'a Schema,
    ) -> Result<(usize, &'a Schema), GenerateError> {
        let mut visited = HashSet::new();
        let (mut doc, mut node) = (doc, node);

        while node.is_reference() {
            if !visited.insert(node_key(doc, node)) {
                return Err(GenerateError::CyclicReference {
                    reference: node.reference.clone(),
                    document: self.document_name(doc),
                });
            }
            let target = self.index.resolve(doc, &node.reference).ok_or_else(|| {
                GenerateError::UnresolvedReference {
                    reference: node.reference.clone(),
                    document: self.document_name(doc),
                }
            })?;
            doc = target.document;
            node = target.schema;
        }
        Ok((doc, node))
    }

    /// Resolve a `oneOf`/`anyOf` node that has no type of its own.
    ///
    /// Branches of both keywords are taken together. All-scalar branches collapse into a multi-type; anything else becomes
    /// an open placeholder alias, with the branches still generated.
    fn process_variants(
        &self,
        ctx: &mut Context,
        doc: usize,
        node: &'a Schema,
        branches: &[&'a Schema],
        hint: &str,
    ) -> Result<String, GenerateError> {
        let branches: Vec<&'a Schema> = branches.iter().copied().filter(|b| has_shape(b)).collect();
        if branches.is_empty() {
            return Ok(OPEN_TYPE.to_string());
        }

        let mut scalar_types = Vec::new();
        for &branch in &branches {
            let (_, target) = self.follow_references(doc, branch)?;
            let types = infer_types(target);
            let scalar = target.all_of.is_empty()
                && !types.is_empty()
                && types.iter().all(|t| primitive_type(t).is_some());
            if !scalar {
                scalar_types.clear();
                break;
            }
            for t in types.iter() {
                if !scalar_types.contains(&t.to_string()) {
                    scalar_types.push(t.to_string());
                }
            }
        }

        if !scalar_types.is_empty() {
            let types = TypeSet::from(scalar_types);
            return self.process_types(ctx, doc, node, &[(doc, node)], &types, hint, Origin::Inline);
        }

        let placeholder = type_name(node, hint)?;
        for (i, &branch) in branches.iter().enumerate() {
            let branch_hint = format!("{}Option{}", placeholder, i);
            self.process(ctx, doc, branch, &branch_hint, Origin::Inline)?;
        }

        let name = reserve_name(ctx, &placeholder);
        tracing::debug!(%name, branches = branches.len(), "created variant placeholder");
        ctx.graph.aliases.insert(
            name.clone(),
            Alias {
                name: name.clone(),
                type_name: OPEN_TYPE.to_string(),
            },
        );
        Ok(name)
    }

    fn document_name(&self, doc: usize) -> String {
        match self.registry.document_url(doc) {
            Some(url) => url.to_string(),
            None => self.registry.document(doc).id().to_string(),
        }
    }
}

/// Map a scalar JSON Schema type to its target type.
pub fn primitive_type(schema_type: &str) -> Option<&'static str> {
    match schema_type {
        "boolean" => Some("bool"),
        "integer" => Some("int"),
        "number" => Some("float64"),
        "string" => Some("string"),
        "null" => Some(OPEN_TYPE),
        _ => None,
    }
}

/// Declared types, or the type implied by `properties`/`items` when absent.
fn infer_types(schema: &Schema) -> TypeSet {
    if !schema.types.is_empty() {
        schema.types.clone()
    } else if !schema.properties.is_empty() || schema.additional_schema.is_some() {
        TypeSet::single("object")
    } else if schema.items.is_some() {
        TypeSet::single("array")
    } else {
        TypeSet::default()
    }
}

/// False for combinator branches that only add constraints.
fn has_shape(schema: &Schema) -> bool {
    schema.is_reference()
        || !infer_types(schema).is_empty()
        || !schema.all_of.is_empty()
        || !schema.one_of.is_empty()
        || !schema.any_of.is_empty()
}

/// Backticks close the tag literal and a comma starts the tag options.
fn is_tag_safe(json_name: &str) -> bool {
    !json_name.chars().any(|c| c == '`' || c == ',' || c.is_control())
}

fn is_definition_path(path: &str) -> bool {
    let parent = path.rsplitn(2, '/').nth(1).unwrap_or("");
    parent.ends_with(&format!("/{}", DEFS_KEYWORD))
        || parent.ends_with(&format!("/{}", DEFINITIONS_KEYWORD))
}

fn node_key(doc: usize, node: &Schema) -> NodeKey {
    (doc, node.path_element.clone())
}

fn pointer_to(name: &str) -> String {
    format!("*{}", name)
}

fn reserve_name(ctx: &mut Context, candidate: &str) -> String {
    let name = disambiguate(candidate, |n| ctx.names.contains(n));
    ctx.names.insert(name.clone());
    name
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;
    use url::Url;

    fn generate(text: &str) -> Generation {
        let mut registry = Registry::new();
        registry
            .add_root(parse(text, &Url::parse("file:///schemas/test.json").unwrap()).unwrap())
            .unwrap();
        Generator::new(&registry).generate()
    }

    fn graph(text: &str) -> Graph {
        generate(text).into_result().unwrap()
    }

    #[test]
    fn titled_root_becomes_struct() {
        let graph = graph(
            r#"{
                "$schema": "http://json-schema.org/schema#",
                "title": "root",
                "properties": { "name": { "type": "string" } }
            }"#,
        );
        assert_eq!(graph.structs.len(), 1);
        let root = &graph.structs["Root"];
        let name = &root.fields["Name"];
        assert_eq!(name.json_name, "name");
        assert_eq!(name.type_name, "string");
        assert!(!name.required);
        assert!(graph.aliases.is_empty());
        assert_eq!(graph.roots[0].type_name, "*Root");
    }

    #[test]
    fn scalar_mapping() {
        let graph = graph(
            r#"{
                "properties": {
                    "b": { "type": "boolean" },
                    "i": { "type": "integer" },
                    "n": { "type": "number" },
                    "s": { "type": "string" },
                    "any": {},
                    "nullable": { "type": ["string", "null"] },
                    "multi": { "type": ["integer", "string"] }
                },
                "required": ["i"]
            }"#,
        );
        let fields = &graph.structs["Root"].fields;
        assert_eq!(fields["B"].type_name, "bool");
        assert_eq!(fields["I"].type_name, "int");
        assert!(fields["I"].required);
        assert_eq!(fields["N"].type_name, "float64");
        assert_eq!(fields["S"].type_name, "string");
        assert_eq!(fields["Any"].type_name, OPEN_TYPE);
        assert_eq!(fields["Nullable"].type_name, "string");
        assert_eq!(fields["Multi"].type_name, OPEN_TYPE);
    }

    #[test]
    fn nested_objects_and_arrays() {
        let graph = graph(
            r#"{
                "title": "Order",
                "properties": {
                    "lines": {
                        "type": "array",
                        "items": {
                            "type": "object",
                            "properties": { "sku": { "type": "string" } }
                        }
                    },
                    "tags": { "type": "array", "items": { "type": "string" } },
                    "anything": { "type": "array" }
                }
            }"#,
        );
        let order = &graph.structs["Order"];
        assert_eq!(order.fields["Lines"].type_name, "[]*LinesItems");
        assert_eq!(order.fields["Tags"].type_name, "[]string");
        assert_eq!(order.fields["Anything"].type_name, "[]interface{}");
        assert!(graph.structs.contains_key("LinesItems"));
    }

    #[test]
    fn root_array_gets_alias() {
        let graph = graph(r#"{ "type": "array", "items": { "type": "integer" } }"#);
        assert_eq!(graph.aliases["Root"].type_name, "[]int");
    }

    #[test]
    fn same_name_in_both_definition_containers() {
        let graph = graph(
            r##"{
                "$defs": { "a": { "type": "integer" } },
                "definitions": {
                    "a": { "type": "object", "properties": { "s": { "type": "string" } } }
                },
                "properties": {
                    "modern": { "$ref": "#/$defs/a" },
                    "legacy": { "$ref": "#/definitions/a" }
                }
            }"##,
        );
        let root = &graph.structs["Root"];
        assert_eq!(root.fields["Modern"].type_name, "int");
        assert_eq!(root.fields["Legacy"].type_name, "*A");
        assert!(graph.structs["A"].fields.contains_key("S"));
    }

    #[test]
    fn references_resolve_to_definitions() {
        let graph = graph(
            r##"{
                "$defs": {
                    "address": {
                        "type": "object",
                        "properties": { "street": { "type": "string" } }
                    },
                    "temperature": { "type": "number" }
                },
                "properties": {
                    "home": { "$ref": "#/$defs/address" },
                    "temp": { "$ref": "#/$defs/temperature" }
                }
            }"##,
        );
        let root = &graph.structs["Root"];
        assert_eq!(root.fields["Home"].type_name, "*Address");
        assert_eq!(root.fields["Temp"].type_name, "float64");
        assert_eq!(graph.structs.len(), 2);
    }

    #[test]
    fn definitions_win_names_over_inline_schemas() {
        let graph = graph(
            r##"{
                "properties": {
                    "address": {
                        "type": "object",
                        "properties": { "line": { "type": "string" } }
                    }
                },
                "definitions": {
                    "address": {
                        "type": "object",
                        "properties": { "street": { "type": "string" } }
                    }
                }
            }"##,
        );
        assert!(graph.structs["Address"].fields.contains_key("Street"));
        assert!(graph.structs["Address2"].fields.contains_key("Line"));
        assert_eq!(graph.structs["Root"].fields["Address"].type_name, "*Address2");
    }

    #[test]
    fn identical_inline_objects_are_shared() {
        let graph = graph(
            r#"{
                "properties": {
                    "billing": {
                        "type": "object",
                        "properties": { "city": { "type": "string" } }
                    },
                    "shipping": {
                        "type": "object",
                        "properties": { "city": { "type": "string" } }
                    }
                }
            }"#,
        );
        let root = &graph.structs["Root"];
        assert_eq!(root.fields["Billing"].type_name, "*Billing");
        assert_eq!(root.fields["Shipping"].type_name, "*Billing");
        assert!(!graph.structs.contains_key("Shipping"));
        assert_eq!(graph.structs.len(), 2);
    }

    #[test]
    fn same_title_different_shape_gets_suffix() {
        let graph = graph(
            r#"{
                "properties": {
                    "a": { "title": "Item", "properties": { "x": { "type": "string" } } },
                    "b": { "title": "Item", "properties": { "y": { "type": "string" } } }
                }
            }"#,
        );
        let root = &graph.structs["Root"];
        assert_eq!(root.fields["A"].type_name, "*Item");
        assert_eq!(root.fields["B"].type_name, "*Item2");
    }

    #[test]
    fn recursive_definition() {
        let graph = graph(
            r##"{
                "$ref": "#/definitions/node",
                "definitions": {
                    "node": {
                        "type": "object",
                        "properties": {
                            "value": { "type": "string" },
                            "children": { "type": "array", "items": { "$ref": "#/definitions/node" } },
                            "parent": { "$ref": "#/definitions/node" }
                        }
                    }
                }
            }"##,
        );
        let node = &graph.structs["Node"];
        assert_eq!(node.fields["Children"].type_name, "[]*Node");
        assert_eq!(node.fields["Parent"].type_name, "*Node");
        assert_eq!(graph.aliases["Root"].type_name, "*Node");
    }

    #[test]
    fn reference_cycle_is_rejected() {
        let generation = generate(
            r##"{
                "properties": { "a": { "$ref": "#/definitions/a" } },
                "definitions": {
                    "a": { "$ref": "#/definitions/b" },
                    "b": { "$ref": "#/definitions/a" }
                }
            }"##,
        );
        assert!(matches!(
            generation.into_result(),
            Err(GenerateError::CyclicReference { .. })
        ));
    }

    #[test]
    fn unresolved_reference_names_pointer() {
        let result = generate(r##"{ "properties": { "a": { "$ref": "#/$defs/missing" } } }"##)
            .into_result();
        assert_eq!(
            result,
            Err(GenerateError::UnresolvedReference {
                reference: "#/$defs/missing".into(),
                document: "file:///schemas/test.json".into(),
            })
        );
    }

    #[test]
    fn all_of_merges_fields() {
        let graph = graph(
            r##"{
                "definitions": {
                    "named": {
                        "properties": { "name": { "type": "string" } },
                        "required": ["name"]
                    }
                },
                "properties": {
                    "pet": {
                        "allOf": [
                            { "$ref": "#/definitions/named" },
                            { "properties": { "legs": { "type": "integer" } } }
                        ]
                    }
                }
            }"##,
        );
        let pet = &graph.structs["Pet"];
        assert_eq!(pet.fields["Name"].type_name, "string");
        assert!(pet.fields["Name"].required);
        assert_eq!(pet.fields["Legs"].type_name, "int");
    }

    #[test]
    fn all_of_conflict_is_reported() {
        let result = generate(
            r#"{
                "properties": {
                    "pet": {
                        "allOf": [
                            { "properties": { "legs": { "type": "integer" } } },
                            { "properties": { "legs": { "type": "string" } } }
                        ]
                    }
                }
            }"#,
        )
        .into_result();
        assert_eq!(
            result,
            Err(GenerateError::MergeConflict {
                name: "Pet".into(),
                property: "legs".into(),
                existing: "int".into(),
                incoming: "string".into(),
            })
        );
    }

    #[test]
    fn all_of_self_inclusion_is_cyclic() {
        let result = generate(
            r##"{
                "definitions": { "a": { "allOf": [{ "$ref": "#/definitions/a" }] } },
                "properties": { "x": { "$ref": "#/definitions/a" } }
            }"##,
        )
        .into_result();
        assert!(matches!(result, Err(GenerateError::CyclicReference { .. })));
    }

    #[test]
    fn scalar_one_of_is_a_type_union() {
        let graph = graph(
            r#"{
                "properties": {
                    "id": { "oneOf": [{ "type": "string" }, { "type": "null" }] },
                    "either": { "anyOf": [{ "type": "string" }, { "type": "integer" }] }
                }
            }"#,
        );
        let root = &graph.structs["Root"];
        assert_eq!(root.fields["Id"].type_name, "string");
        assert_eq!(root.fields["Either"].type_name, OPEN_TYPE);
    }

    #[test]
    fn one_of_and_any_of_are_combined() {
        let graph = graph(
            r#"{
                "properties": {
                    "nullable": {
                        "oneOf": [{ "type": "string" }],
                        "anyOf": [{ "type": "null" }]
                    },
                    "mixed": {
                        "oneOf": [{ "type": "string" }],
                        "anyOf": [{ "type": "integer" }]
                    },
                    "shaped": {
                        "oneOf": [{ "type": "string" }],
                        "anyOf": [{ "title": "Box", "properties": { "w": { "type": "number" } } }]
                    }
                }
            }"#,
        );
        let root = &graph.structs["Root"];
        assert_eq!(root.fields["Nullable"].type_name, "string");
        assert_eq!(root.fields["Mixed"].type_name, OPEN_TYPE);
        assert_eq!(root.fields["Shaped"].type_name, "Shaped");
        assert_eq!(graph.aliases["Shaped"].type_name, OPEN_TYPE);
        assert!(graph.structs.contains_key("Box"));
    }

    #[test]
    fn object_one_of_becomes_placeholder() {
        let graph = graph(
            r#"{
                "properties": {
                    "payment": {
                        "oneOf": [
                            { "title": "Card", "properties": { "number": { "type": "string" } } },
                            { "title": "Bank", "properties": { "iban": { "type": "string" } } }
                        ]
                    }
                }
            }"#,
        );
        assert_eq!(graph.structs["Root"].fields["Payment"].type_name, "Payment");
        assert_eq!(graph.aliases["Payment"].type_name, OPEN_TYPE);
        assert!(graph.structs.contains_key("Card"));
        assert!(graph.structs.contains_key("Bank"));
    }

    #[test]
    fn constraint_only_branches_are_ignored() {
        let graph = graph(
            r#"{
                "properties": {
                    "sensor": {
                        "type": "object",
                        "properties": { "metrics": { "type": "string" } },
                        "oneOf": [{ "required": ["metrics"] }, { "required": ["metrics"] }],
                        "additionalProperties": false
                    }
                }
            }"#,
        );
        let sensor = &graph.structs["Sensor"];
        assert!(sensor.closed);
        assert_eq!(sensor.fields["Metrics"].type_name, "string");
    }

    #[test]
    fn map_shaped_objects() {
        let graph = graph(
            r#"{
                "properties": {
                    "labels": { "type": "object", "additionalProperties": { "type": "string" } },
                    "extra": { "type": "object" },
                    "nothing": { "type": "object", "additionalProperties": false }
                }
            }"#,
        );
        let root = &graph.structs["Root"];
        assert_eq!(root.fields["Labels"].type_name, "map[string]string");
        assert_eq!(root.fields["Extra"].type_name, "map[string]interface{}");
        assert_eq!(root.fields["Nothing"].type_name, "*Nothing");
        assert!(graph.structs["Nothing"].fields.is_empty());
    }

    #[test]
    fn json_names_that_break_tags_are_errors() {
        for name in ["a`b", "a,b", "a\\nb"] {
            let text = format!(r#"{{ "properties": {{ "{}": {{ "type": "string" }} }} }}"#, name);
            let result = generate(&text).into_result();
            assert!(
                matches!(result, Err(GenerateError::InvalidTagName { ref path, .. }) if path.starts_with("#/properties/")),
                "{}: {:?}",
                name,
                result
            );
        }

        let graph = graph(r#"{ "properties": { "say \"hi\"": { "type": "string" } } }"#);
        assert_eq!(graph.structs["Root"].fields["SayHi"].json_name, "say \"hi\"");
    }

    #[test]
    fn unsanitizable_field_name_is_an_error() {
        let result = generate(r#"{ "properties": { "@@": { "type": "string" } } }"#).into_result();
        assert!(matches!(
            result,
            Err(GenerateError::InvalidName { name, .. }) if name == "@@"
        ));
    }

    #[test]
    fn failed_root_does_not_block_others() {
        let base = Url::parse("file:///schemas/").unwrap();
        let mut registry = Registry::new();
        registry.add_root(
            parse(
                r##"{ "$id": "bad.json", "properties": { "a": { "$ref": "#/nope" } } }"##,
                &base,
            )
            .unwrap(),
        )
        .unwrap();
        registry.add_root(
            parse(
                r#"{ "$id": "good.json", "title": "Good", "properties": { "a": { "type": "string" } } }"#,
                &base,
            )
            .unwrap(),
        )
        .unwrap();

        let generation = Generator::new(&registry).generate();
        assert_eq!(generation.errors.len(), 1);
        assert_eq!(generation.errors[0].root, "file:///schemas/bad.json");
        assert!(generation.graph.structs.contains_key("Good"));
        assert!(!generation.graph.structs.contains_key("Root"));
        assert_eq!(generation.graph.roots.len(), 1);
    }

    #[test]
    fn generation_is_repeatable() {
        let text = r#"{
            "properties": {
                "z": { "properties": { "a": { "type": "string" } } },
                "y": { "properties": { "b": { "type": "string" } } },
                "x": { "properties": { "a": { "type": "string" } } }
            }
        }"#;
        assert_eq!(graph(text), graph(text));
        assert_eq!(graph(text).structs["Root"].fields["Z"].type_name, "*X");
    }
}
