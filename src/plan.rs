//! Edit planning.
//!
//! Turns the discovery tables into a flat list of text edits and hands the
//! list to [`EditSet::normalize`].  Five rules:
//!
//! * every function with an explicit first parameter has the context
//!   parameter spliced in front of it;
//! * every function without parameters has its signature rewritten up to
//!   the body, or whole for a bodyless declaration;
//! * every use of a global variable becomes a field access through the
//!   context pointer;
//! * every call gains the context as leading argument, planned as a pure
//!   insertion just past the opening parenthesis so call edits stay
//!   disjoint from the reference and parameter edits their extents
//!   enclose;
//! * every global variable declaration is deleted.
//!
//! Constructs whose source text cannot be recovered from the cache are
//! skipped with a warning rather than rewritten blindly.

use fnv::FnvHashSet;
use log::{debug, warn};

use crate::discover::{GlobalFunction, GlobalSet};
use crate::edit::{EditSet, TextEdit};
use crate::source::SourceSet;
use crate::Result;

/// Name of the synthesized aggregate and of the pointer parameter threaded
/// through every function.
pub const CONTEXT_NAME: &str = "__context__";

/// Plans all edits for the discovered facts, then orders and deduplicates
/// the list.
pub fn plan_edits(edits: &mut EditSet, globals: &GlobalSet, sources: &SourceSet) -> Result<()> {
    plan_functions(edits, globals, sources);
    plan_references(edits, globals);
    plan_calls(edits, globals, sources);
    plan_removals(edits, globals);
    edits.normalize()
}

/// Rewrites function signatures to accept `struct __context__ *` first.
fn plan_functions(edits: &mut EditSet, globals: &GlobalSet, sources: &SourceSet) {
    for function in &globals.functions {
        match &function.first_param {
            Some(param) => {
                let original = match sources.snippet(param) {
                    Some(text) => text,
                    None => {
                        warn!("skipping parameter rewrite for {}", function.name);
                        continue;
                    }
                };
                edits.push(TextEdit::new(
                    param.file.clone(),
                    param.start,
                    param.end - param.start,
                    format!("struct {CONTEXT_NAME} *{CONTEXT_NAME}, {original}"),
                ));
            }
            None => plan_parameterless_function(edits, function),
        }
    }
}

fn plan_parameterless_function(edits: &mut EditSet, function: &GlobalFunction) {
    let signature = format!(
        "{} {}(struct {CONTEXT_NAME} *{CONTEXT_NAME})",
        function.result_type, function.name
    );
    match &function.body {
        Some(body) if body.file == function.extent.file && body.start >= function.extent.start => {
            // Replace everything up to the body, leaving the braces alone.
            edits.push(TextEdit::new(
                function.extent.file.clone(),
                function.extent.start,
                body.start - function.extent.start,
                format!("{signature}\n"),
            ));
        }
        Some(_) => warn!("skipping signature rewrite for {}", function.name),
        // A pure declaration is replaced whole.
        None => edits.push(TextEdit::new(
            function.extent.file.clone(),
            function.extent.start,
            function.extent.len(),
            signature,
        )),
    }
}

/// Rewrites every recorded use of a global into a context field access.
fn plan_references(edits: &mut EditSet, globals: &GlobalSet) {
    for reference in &globals.references {
        edits.push(TextEdit::new(
            reference.extent.file.clone(),
            reference.extent.start,
            reference.extent.len(),
            format!("{CONTEXT_NAME}->{}", reference.target),
        ));
    }
}

/// Threads the context into every call of a discovered function.
///
/// Calls whose callee was never discovered (library functions declared in
/// system headers, calls through expressions) keep their argument list;
/// their signatures are not rewritten, so a context argument would not
/// type-check against them.
fn plan_calls(edits: &mut EditSet, globals: &GlobalSet, sources: &SourceSet) {
    let rewritten: FnvHashSet<&str> = globals
        .functions
        .iter()
        .map(|function| function.name.as_str())
        .collect();
    for call in &globals.calls {
        let known = call
            .callee
            .as_deref()
            .map_or(false, |callee| rewritten.contains(callee));
        if !known {
            debug!(
                "skipping call at {}:{}: callee is not a rewritten function",
                call.extent.file, call.extent.start
            );
            continue;
        }
        let text = match sources.snippet(&call.extent) {
            Some(text) => text,
            None => {
                warn!(
                    "skipping call at {}:{}: no source text",
                    call.extent.file, call.extent.start
                );
                continue;
            }
        };
        let paren = match text.find('(') {
            Some(paren) => paren,
            None => {
                warn!(
                    "skipping call at {}:{}: no opening parenthesis",
                    call.extent.file, call.extent.start
                );
                continue;
            }
        };
        let argument = if call.argument_count > 0 {
            format!("{CONTEXT_NAME},")
        } else {
            CONTEXT_NAME.to_owned()
        };
        edits.push(TextEdit::new(
            call.extent.file.clone(),
            call.extent.start + paren + 1,
            0,
            argument,
        ));
    }
}

/// Deletes every declaration site of every global variable.
fn plan_removals(edits: &mut EditSet, globals: &GlobalSet) {
    for variable in globals.variables.values() {
        for extent in &variable.extents {
            edits.push(TextEdit::new(
                extent.file.clone(),
                extent.start,
                extent.len(),
                "",
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::discover::{CallExpression, GlobalReference, GlobalVariable};
    use crate::source::Extent;

    use super::*;

    fn sources_with(name: &str, text: &str) -> SourceSet {
        let mut sources = SourceSet::new();
        sources.insert(name, text);
        sources
    }

    fn extent_of(text: &str, needle: &str, file: &str) -> Extent {
        let start = text.find(needle).unwrap();
        Extent::new(file, start, start + needle.len())
    }

    fn function(name: &str, result_type: &str, extent: Extent) -> GlobalFunction {
        GlobalFunction {
            name: name.to_owned(),
            result_type: result_type.to_owned(),
            extent,
            first_param: None,
            body: None,
        }
    }

    #[test]
    fn explicit_first_parameter_gains_context_prefix() {
        let text = "void f(int x)\n{\n}\n";
        let sources = sources_with("a.c", text);
        let mut globals = GlobalSet::new();
        let mut f = function("f", "void", extent_of(text, "void f(int x)\n{\n}", "a.c"));
        f.first_param = Some(extent_of(text, "int x", "a.c"));
        f.body = Some(extent_of(text, "{\n}", "a.c"));
        globals.functions.push(f);

        let mut edits = EditSet::new();
        plan_edits(&mut edits, &globals, &sources).unwrap();

        let edit = edits.iter().next().unwrap();
        assert_eq!(edit.start, 7);
        assert_eq!(edit.length, 5);
        assert_eq!(edit.replacement, "struct __context__ *__context__, int x");
    }

    #[test]
    fn parameterless_function_signature_is_rewritten_up_to_body() {
        let text = "int f(void)\n{\n\treturn 0;\n}\n";
        let sources = sources_with("a.c", text);
        let mut globals = GlobalSet::new();
        let mut f = function("f", "int", extent_of(text, "int f(void)\n{\n\treturn 0;\n}", "a.c"));
        f.body = Some(extent_of(text, "{\n\treturn 0;\n}", "a.c"));
        globals.functions.push(f);

        let mut edits = EditSet::new();
        plan_edits(&mut edits, &globals, &sources).unwrap();

        let edit = edits.iter().next().unwrap();
        assert_eq!(edit.start, 0);
        assert_eq!(edit.length, text.find('{').unwrap());
        assert_eq!(edit.replacement, "int f(struct __context__ *__context__)\n");
    }

    #[test]
    fn bodyless_declaration_is_replaced_whole() {
        let text = "void f(void);\n";
        let sources = sources_with("a.c", text);
        let mut globals = GlobalSet::new();
        globals
            .functions
            .push(function("f", "void", extent_of(text, "void f(void)", "a.c")));

        let mut edits = EditSet::new();
        plan_edits(&mut edits, &globals, &sources).unwrap();

        let edit = edits.iter().next().unwrap();
        assert_eq!(edit.length, "void f(void)".len());
        assert_eq!(edit.replacement, "void f(struct __context__ *__context__)");
    }

    #[test]
    fn reference_becomes_field_access() {
        let mut globals = GlobalSet::new();
        globals.references.push(GlobalReference {
            extent: Extent::new("a.c", 10, 11),
            target: "g".to_owned(),
        });

        let mut edits = EditSet::new();
        plan_references(&mut edits, &globals);

        let edit = edits.iter().next().unwrap();
        assert_eq!((edit.start, edit.length), (10, 1));
        assert_eq!(edit.replacement, "__context__->g");
    }

    #[test]
    fn call_with_arguments_inserts_context_and_comma() {
        let text = "f(3);";
        let sources = sources_with("a.c", text);
        let mut globals = GlobalSet::new();
        globals
            .functions
            .push(function("f", "void", Extent::new("f.c", 0, 12)));
        globals.calls.push(CallExpression {
            extent: extent_of(text, "f(3)", "a.c"),
            argument_count: 1,
            callee: Some("f".to_owned()),
        });

        let mut edits = EditSet::new();
        plan_calls(&mut edits, &globals, &sources);

        let edit = edits.iter().next().unwrap();
        assert_eq!((edit.start, edit.length), (2, 0));
        assert_eq!(edit.replacement, "__context__,");
    }

    #[test]
    fn call_without_arguments_inserts_context_only() {
        let text = "f();";
        let sources = sources_with("a.c", text);
        let mut globals = GlobalSet::new();
        globals
            .functions
            .push(function("f", "void", Extent::new("f.c", 0, 12)));
        globals.calls.push(CallExpression {
            extent: extent_of(text, "f()", "a.c"),
            argument_count: 0,
            callee: Some("f".to_owned()),
        });

        let mut edits = EditSet::new();
        plan_calls(&mut edits, &globals, &sources);

        assert_eq!(edits.iter().next().unwrap().replacement, "__context__");
    }

    #[test]
    fn call_to_an_undiscovered_function_is_left_alone() {
        let text = "printf(\"hi\");\nhandlers[0]();";
        let sources = sources_with("a.c", text);
        let mut globals = GlobalSet::new();
        // No record for printf: its declaration lives in a system header.
        globals.calls.push(CallExpression {
            extent: extent_of(text, "printf(\"hi\")", "a.c"),
            argument_count: 1,
            callee: Some("printf".to_owned()),
        });
        // An indirect call has no resolvable callee at all.
        globals.calls.push(CallExpression {
            extent: extent_of(text, "handlers[0]()", "a.c"),
            argument_count: 0,
            callee: None,
        });

        let mut edits = EditSet::new();
        plan_calls(&mut edits, &globals, &sources);
        assert!(edits.is_empty());
    }

    #[test]
    fn call_without_parenthesis_is_skipped() {
        let text = "DISPATCH;";
        let sources = sources_with("a.c", text);
        let mut globals = GlobalSet::new();
        globals
            .functions
            .push(function("DISPATCH", "void", Extent::new("d.c", 0, 16)));
        globals.calls.push(CallExpression {
            extent: extent_of(text, "DISPATCH", "a.c"),
            argument_count: 0,
            callee: Some("DISPATCH".to_owned()),
        });

        let mut edits = EditSet::new();
        plan_calls(&mut edits, &globals, &sources);
        assert!(edits.is_empty());
    }

    #[test]
    fn variable_declaration_is_deleted() {
        let text = "int g = 7;\n";
        let mut globals = GlobalSet::new();
        globals.variables.insert(
            "g".to_owned(),
            GlobalVariable {
                name: "g".to_owned(),
                type_name: "int".to_owned(),
                extents: vec![extent_of(text, "int g = 7", "a.c")],
                initializer: Some(extent_of(text, "7", "a.c")),
            },
        );

        let mut edits = EditSet::new();
        plan_removals(&mut edits, &globals);

        let edit = edits.iter().next().unwrap();
        assert_eq!((edit.start, edit.length), (0, 9));
        assert_eq!(edit.replacement, "");
    }
}
