//! Document registry - every schema document available to one generation run.
//!
//! Root documents are the ones types are generated for. Further documents
//! can be registered so that cross-file `$ref`s have something to land on;
//! [`load_references`](crate::load_references) fills those in.

use std::collections::{BTreeSet, HashMap};

use url::Url;

use crate::error::RegistryError;
use crate::schema::Schema;

/// Parsed documents keyed by their absolute URL.
#[derive(Debug, Default)]
pub struct Registry {
    documents: Vec<Document>,
    roots: Vec<usize>,
    by_url: HashMap<String, usize>,
}

#[derive(Debug)]
struct Document {
    url: Option<Url>,
    schema: Schema,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a document to generate types for.
    ///
    /// Roots are processed in the order they are added.
    ///
    /// # Errors
    ///
    /// Returns `RegistryError::DuplicateDocument` if another document with
    /// the same URL is already registered.
    pub fn add_root(&mut self, schema: Schema) -> Result<usize, RegistryError> {
        let index = self.add_document(schema)?;
        if !self.roots.contains(&index) {
            self.roots.push(index);
        }
        Ok(index)
    }

    /// Register a document that is only a reference target.
    ///
    /// Registering an identical document under the same URL again returns
    /// the existing index.
    ///
    /// # Errors
    ///
    /// Returns `RegistryError::DuplicateDocument` if a different document
    /// already claims the URL.
    pub fn add_document(&mut self, schema: Schema) -> Result<usize, RegistryError> {
        let url = document_url(&schema);
        if let Some(key) = url.as_ref().map(Url::to_string) {
            if let Some(&existing) = self.by_url.get(&key) {
                if self.documents[existing].schema != schema {
                    return Err(RegistryError::DuplicateDocument { url: key });
                }
                return Ok(existing);
            }
            self.by_url.insert(key, self.documents.len());
        }
        self.documents.push(Document { url, schema });
        Ok(self.documents.len() - 1)
    }

    /// True if a document with this URL (fragment ignored) is registered.
    pub fn contains(&self, url: &Url) -> bool {
        self.by_url.contains_key(without_fragment(url).as_str())
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn document(&self, index: usize) -> &Schema {
        &self.documents[index].schema
    }

    pub(crate) fn document_url(&self, index: usize) -> Option<&Url> {
        self.documents[index].url.as_ref()
    }

    /// Indices of root documents, in registration order.
    pub fn roots(&self) -> &[usize] {
        &self.roots
    }

    /// URLs of documents referenced by `$ref` but not registered yet.
    ///
    /// Returned sorted and without fragments.
    pub fn missing_documents(&self) -> Vec<Url> {
        let index = NodeIndex::build(self);
        let mut missing = BTreeSet::new();

        for (doc, document) in self.documents.iter().enumerate() {
            let Some(base) = &document.url else {
                continue;
            };
            document.schema.walk(&mut |node| {
                if !node.is_reference() || is_local_pointer(&node.reference) {
                    return;
                }
                if index.resolve(doc, &node.reference).is_some() {
                    return;
                }
                if let Ok(target) = base.join(&node.reference) {
                    let target = without_fragment(&target);
                    if !self.by_url.contains_key(target.as_str()) {
                        missing.insert(target.to_string());
                    }
                }
            });
        }

        missing
            .into_iter()
            .filter_map(|url| Url::parse(&url).ok())
            .collect()
    }
}

/// A schema node found by reference resolution.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Target<'a> {
    pub document: usize,
    pub schema: &'a Schema,
}

/// Lookup table from (document, JSON pointer) and embedded `$id` to nodes.
///
/// Built once per generation run; borrows the registry's trees.
#[derive(Debug)]
pub(crate) struct NodeIndex<'a> {
    registry: &'a Registry,
    nodes: Vec<HashMap<&'a str, &'a Schema>>,
    anchors: HashMap<String, Target<'a>>,
}

impl<'a> NodeIndex<'a> {
    pub fn build(registry: &'a Registry) -> Self {
        let mut nodes = Vec::with_capacity(registry.documents.len());
        let mut anchors = HashMap::new();

        for (doc, document) in registry.documents.iter().enumerate() {
            let root_path = document.schema.path_element.as_str();
            let mut paths = HashMap::new();
            document.schema.walk(&mut |node| {
                paths.insert(node.path_element.as_str(), node);

                if node.path_element == root_path || node.id().is_empty() {
                    return;
                }
                let Some(base) = &document.url else {
                    return;
                };
                if let Ok(url) = base.join(node.id()) {
                    anchors.entry(url.to_string()).or_insert(Target {
                        document: doc,
                        schema: node,
                    });
                }
            });
            nodes.push(paths);
        }

        Self {
            registry,
            nodes,
            anchors,
        }
    }

    /// Resolve `reference` as written inside document `doc`.
    pub fn resolve(&self, doc: usize, reference: &str) -> Option<Target<'a>> {
        if is_local_pointer(reference) {
            return self.pointer(doc, reference);
        }

        let base = self.registry.document_url(doc)?;
        let url = base.join(reference).ok()?;
        tracing::trace!(reference, resolved = %url, "resolving external reference");

        if let Some(target) = self.anchors.get(url.as_str()) {
            return Some(*target);
        }

        let fragment = url.fragment().unwrap_or("");
        let document_url = without_fragment(&url);

        if let Some(&other) = self.registry.by_url.get(document_url.as_str()) {
            return self.pointer(other, &format!("#{}", fragment));
        }

        // A pointer relative to a sub-schema that carries its own `$id`.
        let anchor = self.anchors.get(document_url.as_str())?;
        if fragment.is_empty() {
            return Some(*anchor);
        }
        let path = format!("{}{}", anchor.schema.path_element, fragment);
        self.pointer(anchor.document, &path)
    }

    fn pointer(&self, doc: usize, pointer: &str) -> Option<Target<'a>> {
        let pointer = match pointer.trim_end_matches('/') {
            "" => "#",
            p => p,
        };
        self.nodes[doc].get(pointer).map(|&schema| Target {
            document: doc,
            schema,
        })
    }
}

/// True for `#` and `#/...` references into the owning document.
fn is_local_pointer(reference: &str) -> bool {
    reference == "#" || reference.starts_with("#/")
}

fn document_url(schema: &Schema) -> Option<Url> {
    Url::parse(schema.id()).ok().map(|url| without_fragment(&url))
}

fn without_fragment(url: &Url) -> Url {
    let mut url = url.clone();
    url.set_fragment(None);
    url
}
