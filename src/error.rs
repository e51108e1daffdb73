//! Error types for schema parsing, type generation and output.

use std::path::PathBuf;
use thiserror::Error;

/// Errors while turning schema text into a [`Schema`](crate::Schema) tree.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("invalid JSON: {source}")]
    InvalidJson {
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid \"{keyword}\" at {path}: expected {expected}, got {actual}")]
    InvalidKeyword {
        path: String,
        keyword: String,
        expected: &'static str,
        actual: &'static str,
    },

    #[error("invalid $id \"{id}\" for document {base}: {source}")]
    InvalidId {
        id: String,
        base: String,
        #[source]
        source: url::ParseError,
    },

    #[error("JSON schema must have a $schema key: {base}")]
    MissingSchemaKey { base: String },
}

impl ParseError {
    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        2
    }
}

/// Errors while resolving a root schema into structs and aliases.
///
/// Any of these aborts the affected root only.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenerateError {
    #[error("reference \"{reference}\" not found in {document}")]
    UnresolvedReference { reference: String, document: String },

    #[error("cyclic reference \"{reference}\" in {document}")]
    CyclicReference { reference: String, document: String },

    #[error("cannot merge allOf into {name}: property \"{property}\" is {existing}, got {incoming}")]
    MergeConflict {
        name: String,
        property: String,
        existing: String,
        incoming: String,
    },

    #[error("cannot derive a type name from \"{name}\" at {path}")]
    InvalidName { name: String, path: String },

    #[error("property name \"{name}\" at {path} cannot be used as a json tag")]
    InvalidTagName { name: String, path: String },
}

impl GenerateError {
    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        2
    }
}

/// Errors while registering documents for a generation run.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("document {url} is already registered with different content")]
    DuplicateDocument { url: String },
}

impl RegistryError {
    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        2
    }
}

/// Errors while writing generated declarations.
#[derive(Debug, Error)]
pub enum WriteError {
    #[error("failed to write output: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
}

impl WriteError {
    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        3
    }
}

/// Errors while fetching schema documents.
#[derive(Debug, Error)]
pub enum LoadError {
    // IO errors (exit code 3)
    #[error("file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("cannot read {path}: {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[cfg(feature = "remote")]
    #[error("failed to fetch {url}: {source}")]
    NetworkError {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("unsupported URL scheme \"{scheme}\": {url}")]
    UnsupportedScheme { scheme: String, url: String },

    #[error("cannot convert {path} to a URL")]
    InvalidPath { path: PathBuf },

    // Schema errors (exit code 2)
    #[error("invalid schema source \"{source_name}\": {source}")]
    InvalidSource {
        source_name: String,
        #[source]
        source: url::ParseError,
    },

    #[error("{url}: {source}")]
    Parse {
        url: String,
        #[source]
        source: ParseError,
    },
}

impl LoadError {
    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            LoadError::InvalidSource { .. } => 2,
            LoadError::Parse { source, .. } => source.exit_code(),
            _ => 3,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_error_exit_codes() {
        let err = LoadError::FileNotFound {
            path: PathBuf::from("schema.json"),
        };
        assert_eq!(err.exit_code(), 3);

        let err = LoadError::UnsupportedScheme {
            scheme: "ftp".into(),
            url: "ftp://example.com/a.json".into(),
        };
        assert_eq!(err.exit_code(), 3);

        let err = LoadError::Parse {
            url: "file:///a.json".into(),
            source: ParseError::MissingSchemaKey {
                base: "file:///a.json".into(),
            },
        };
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn duplicate_document_display() {
        let err = RegistryError::DuplicateDocument {
            url: "http://example.com/s.json".into(),
        };
        assert_eq!(err.exit_code(), 2);
        assert_eq!(
            err.to_string(),
            "document http://example.com/s.json is already registered with different content"
        );
    }

    #[test]
    fn write_error_from_io() {
        let err: WriteError = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "closed").into();
        assert_eq!(err.exit_code(), 3);
        assert!(err.to_string().contains("closed"));
    }

    #[test]
    fn generate_error_display() {
        let err = GenerateError::MergeConflict {
            name: "Address".into(),
            property: "zip".into(),
            existing: "string".into(),
            incoming: "int".into(),
        };
        assert_eq!(
            err.to_string(),
            "cannot merge allOf into Address: property \"zip\" is string, got int"
        );

        let err = GenerateError::UnresolvedReference {
            reference: "#/$defs/missing".into(),
            document: "file:///schema.json".into(),
        };
        assert_eq!(
            err.to_string(),
            "reference \"#/$defs/missing\" not found in file:///schema.json"
        );
    }
}
