//! Emits the synthesized context header and initializer source.

use std::io::Write;

use itertools::Itertools;

use crate::discover::GlobalSet;
use crate::plan::CONTEXT_NAME;
use crate::source::SourceSet;
use crate::Result;

/// Filename announced for the generated aggregate declaration.
pub const CONTEXT_HEADER: &str = "__context__.h";
/// Filename announced for the generated initializer routine.
pub const CONTEXT_SOURCE: &str = "__context__.c";

/// Writes the aggregate declaration, one field per distinct global variable
/// name, in lexicographic field order.
pub fn write_header(out: &mut dyn Write, globals: &GlobalSet) -> Result<()> {
    writeln!(out, "/* {CONTEXT_HEADER} */")?;
    writeln!(
        out,
        "/* One field per file-scope variable name; equally named variables"
    )?;
    writeln!(out, " * from different translation units share a field. */")?;
    writeln!(out, "struct {CONTEXT_NAME}")?;
    writeln!(out, "{{")?;
    let fields = globals
        .variables
        .values()
        .map(|variable| format!("    {} {};", variable.type_name, variable.name))
        .join("\n");
    if !fields.is_empty() {
        writeln!(out, "{fields}")?;
    }
    writeln!(out, "}};")?;
    Ok(())
}

/// Writes the initializer routine.  Each field is assigned the literal
/// source text of its original initializer, or `0` when the declaration
/// carried none.
pub fn write_initializer(
    out: &mut dyn Write,
    globals: &GlobalSet,
    sources: &SourceSet,
) -> Result<()> {
    writeln!(out, "/* {CONTEXT_SOURCE} */")?;
    writeln!(
        out,
        "void __init{CONTEXT_NAME}(struct {CONTEXT_NAME} *{CONTEXT_NAME})"
    )?;
    writeln!(out, "{{")?;
    let assignments = globals
        .variables
        .values()
        .map(|variable| {
            let value = variable
                .initializer
                .as_ref()
                .and_then(|extent| sources.snippet(extent))
                .unwrap_or("0");
            format!("    {CONTEXT_NAME}->{} = {};", variable.name, value)
        })
        .join("\n");
    if !assignments.is_empty() {
        writeln!(out, "{assignments}")?;
    }
    writeln!(out, "}}")?;
    Ok(())
}
