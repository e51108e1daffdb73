//! JSON Schema to Go code generator
//!
//! Turns JSON Schema documents into Go struct and type declarations in three
//! stages: [`parse`] builds a [`Schema`] tree, a [`Generator`] resolves
//! references and combinators into a [`Graph`] of named types, and
//! [`output`] writes that graph as Go source.
//!
//! # Example
//!
//! ```
//! use schema_generate::{output, parse, Generator, OutputOptions, Registry};
//! use url::Url;
//!
//! let base = Url::parse("file:///schemas/person.json").unwrap();
//! let schema = parse(
//!     r#"{
//!         "title": "Person",
//!         "properties": {
//!             "name": { "type": "string" },
//!             "age": { "type": "integer" }
//!         },
//!         "required": ["name"]
//!     }"#,
//!     &base,
//! )
//! .unwrap();
//!
//! let mut registry = Registry::new();
//! registry.add_root(schema).unwrap();
//! let graph = Generator::new(&registry).generate().into_result().unwrap();
//!
//! let mut buf = Vec::new();
//! output(&mut buf, &graph, &OutputOptions::new("models")).unwrap();
//! let code = String::from_utf8(buf).unwrap();
//!
//! assert!(code.contains("type Person struct {"));
//! assert!(code.contains("  Name string `json:\"name\"`"));
//! assert!(code.contains("  Age int `json:\"age,omitempty\"`"));
//! ```
//!
//! # Type mapping
//!
//! | JSON Schema | Go |
//! |-------------|----|
//! | `boolean` | `bool` |
//! | `integer` | `int` |
//! | `number` | `float64` |
//! | `string` | `string` |
//! | `array` | `[]T` |
//! | `object` with properties | `*Name` (generated struct) |
//! | `object` with schema `additionalProperties` | `map[string]T` |
//! | no type, several types | `interface{}` |

mod error;
mod generator;
mod loader;
mod naming;
mod output;
mod parser;
mod registry;
mod schema;

pub use error::{GenerateError, LoadError, ParseError, RegistryError, WriteError};
pub use generator::{
    primitive_type, Alias, Generation, Generator, Graph, RootError, RootSchema, Struct,
    StructField, OPEN_TYPE,
};
pub use loader::{
    base_url_for_path, is_url, load_references, load_url, read_schema, read_schema_with_options,
};
pub use naming::go_name;
pub use output::{clean_package_name, output, OutputOptions};
pub use parser::{parse, parse_value, parse_with_options, ParseOptions};
pub use registry::Registry;
pub use schema::{Field, JsonKind, Literal, Schema, TypeSet, DEFINITIONS_KEYWORD, DEFS_KEYWORD};
