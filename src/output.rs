//! Go source emitter for a resolved [`Graph`].

use std::io::Write;

use crate::error::WriteError;
use crate::generator::{Graph, Struct, StructField};

/// Options for [`output`].
#[derive(Debug, Clone)]
pub struct OutputOptions {
    /// Package label; cleaned before it is written.
    pub package: String,
    /// Emit optional scalar fields as pointers.
    pub pointer_primitives: bool,
}

impl Default for OutputOptions {
    fn default() -> Self {
        Self::new("main")
    }
}

impl OutputOptions {
    pub fn new(package: impl Into<String>) -> Self {
        Self {
            package: package.into(),
            pointer_primitives: false,
        }
    }

    pub fn pointer_primitives(mut self, pointer_primitives: bool) -> Self {
        self.pointer_primitives = pointer_primitives;
        self
    }
}

/// Write `graph` as Go declarations to `w`.
///
/// Aliases come before structs, each sorted by name, so the same graph
/// always produces the same bytes.
pub fn output<W: Write>(w: &mut W, graph: &Graph, options: &OutputOptions) -> Result<(), WriteError> {
    let package = clean_package_name(&options.package);

    writeln!(w, "// Code generated by schema-generate. DO NOT EDIT.")?;
    writeln!(w)?;
    writeln!(
        w,
        "// Package {} contains the structs and types as defined by this schema.",
        package
    )?;
    writeln!(w, "package {}", package)?;

    let ids: Vec<(usize, &str)> = graph
        .roots
        .iter()
        .enumerate()
        .filter_map(|(index, root)| {
            let (_, last) = root.id.rsplit_once('/')?;
            Some((index, last))
        })
        .collect();
    if !ids.is_empty() {
        writeln!(w, "\nconst (")?;
        for (index, last) in ids {
            writeln!(w, "    SchemaID{} = \"{}\"", index, escape_quoted(last))?;
        }
        writeln!(w, "\n)")?;
    }

    for alias in graph.aliases.values() {
        writeln!(w)?;
        writeln!(w, "// {}", alias.name)?;
        writeln!(w, "type {} {}", alias.name, alias.type_name)?;
    }

    for s in graph.structs.values() {
        write_struct(w, s, options)?;
    }

    w.flush()?;
    Ok(())
}

fn write_struct<W: Write>(w: &mut W, s: &Struct, options: &OutputOptions) -> Result<(), WriteError> {
    writeln!(w)?;
    writeln!(w, "// {} {}", s.name, s.description.replace('\n', "\n// "))?;
    writeln!(w, "type {} struct {{", s.name)?;

    for field in s.fields.values() {
        if !field.description.is_empty() {
            writeln!(w, "\n  // {}", field.description.replace('\n', "\n  // "))?;
        }
        writeln!(
            w,
            "  {} {} `json:\"{}{}\"`",
            field.name,
            field_type(field, options.pointer_primitives),
            escape_quoted(&field.json_name),
            if field.required { "" } else { ",omitempty" }
        )?;
    }

    writeln!(w, "}}")?;
    Ok(())
}

fn field_type(field: &StructField, pointer_primitives: bool) -> String {
    let scalar = matches!(field.type_name.as_str(), "bool" | "int" | "string" | "float64");
    if pointer_primitives && !field.required && scalar {
        format!("*{}", field.type_name)
    } else {
        field.type_name.clone()
    }
}

/// Escape `\` and `"` for a Go interpreted string literal.
fn escape_quoted(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '\\' | '"') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Strip `.`, `_` and `-` from a package label.
pub fn clean_package_name(package: &str) -> String {
    package.chars().filter(|c| !matches!(c, '.' | '_' | '-')).collect()
}
