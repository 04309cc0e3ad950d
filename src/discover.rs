//! Semantic discovery over parsed translation units.
//!
//! One recursive depth-first walk per unit populates four fact tables:
//! global functions, global variables, references to global variables and
//! call expressions.  The tables accumulate across all input units; equally
//! named file-scope variables from different units collapse into one
//! logical global.
//!
//! The walk keeps two pieces of walk-local state, the currently open
//! function and the currently open variable.  The parser emits children
//! contiguously with their parent, so a running pointer updated on entry to
//! the enclosing construct is enough to associate parameters, bodies and
//! initializers with their owner without a second pass.  The state lives in
//! a stack-local record, never in the process, so a `Transform` can be
//! driven repeatedly from one process.

use std::collections::BTreeMap;

use clang::{Entity, EntityKind, EntityVisitResult, TranslationUnit};
use log::debug;

use crate::parse;
use crate::source::{Extent, SourceSet};
use crate::Result;

/// A function definition or declaration at file scope.
#[derive(Debug, Clone)]
pub struct GlobalFunction {
    pub name: String,
    /// Spelling of the result type, used when the whole signature is
    /// rewritten.
    pub result_type: String,
    pub extent: Extent,
    /// Extent of the first parameter declaration, if the function has one.
    pub first_param: Option<Extent>,
    /// Extent of the compound statement forming the body, if present.
    pub body: Option<Extent>,
}

/// A file-scope variable.  There is exactly one record per distinct display
/// name; every declaration site contributes an extent, and the spelling of
/// the last declaration seen wins.
#[derive(Debug, Clone)]
pub struct GlobalVariable {
    pub name: String,
    /// Spelling of the variable's type, emitted as the context field type.
    pub type_name: String,
    /// Every declaration site of this name, across all units.
    pub extents: Vec<Extent>,
    /// Extent of the initializer expression, when one is syntactically
    /// present on a declaration.
    pub initializer: Option<Extent>,
}

/// One use site of a global variable.
#[derive(Debug, Clone)]
pub struct GlobalReference {
    pub extent: Extent,
    /// Display name of the referenced variable.
    pub target: String,
}

/// One call expression.
#[derive(Debug, Clone)]
pub struct CallExpression {
    pub extent: Extent,
    pub argument_count: usize,
    /// Name of the called declaration, when the callee resolves to one.
    pub callee: Option<String>,
}

/// The four discovery tables, accumulated across all input units.
#[derive(Debug, Default)]
pub struct GlobalSet {
    pub functions: Vec<GlobalFunction>,
    /// Keyed by display name; iteration order is lexicographic, which fixes
    /// the field order of the emitted context.
    pub variables: BTreeMap<String, GlobalVariable>,
    pub references: Vec<GlobalReference>,
    pub calls: Vec<CallExpression>,
}

impl GlobalSet {
    pub fn new() -> GlobalSet {
        GlobalSet::default()
    }
}

/// Walk-local discovery state.
struct Walk<'tu> {
    /// The most recently entered function and its index in the table.
    current_function: Option<(Entity<'tu>, usize)>,
    /// The most recently entered file-scope variable and its table key.
    current_variable: Option<(Entity<'tu>, String)>,
}

/// Runs the discovery walk for one translation unit, appending to the
/// tables in `globals` and loading every referenced file into `sources`.
pub fn discover(
    globals: &mut GlobalSet,
    sources: &mut SourceSet,
    unit: &TranslationUnit,
) -> Result<()> {
    let mut walk = Walk {
        current_function: None,
        current_variable: None,
    };
    let mut failure = None;

    unit.get_entity().visit_children(|entity, parent| {
        match visit(globals, sources, &mut walk, entity, parent) {
            Ok(()) => EntityVisitResult::Recurse,
            Err(error) => {
                failure = Some(error);
                EntityVisitResult::Break
            }
        }
    });

    match failure {
        Some(error) => Err(error),
        None => Ok(()),
    }
}

fn visit<'tu>(
    globals: &mut GlobalSet,
    sources: &mut SourceSet,
    walk: &mut Walk<'tu>,
    entity: Entity<'tu>,
    parent: Entity<'tu>,
) -> Result<()> {
    match entity.get_kind() {
        EntityKind::FunctionDecl => {
            let name = match entity.get_name() {
                Some(name) => name,
                None => return Ok(()),
            };
            if let Some(extent) = parse::extent_of(&entity, sources)? {
                let result_type = entity
                    .get_result_type()
                    .map(|ty| ty.get_display_name())
                    .unwrap_or_default();
                globals.functions.push(GlobalFunction {
                    name,
                    result_type,
                    extent,
                    first_param: None,
                    body: None,
                });
                walk.current_function = Some((entity, globals.functions.len() - 1));
                walk.current_variable = None;
            }
        }
        EntityKind::ParmDecl => {
            if let Some((decl, index)) = walk.current_function {
                // Only the first parameter of the open function is kept.
                if parent == decl && globals.functions[index].first_param.is_none() {
                    globals.functions[index].first_param = parse::extent_of(&entity, sources)?;
                }
            }
        }
        EntityKind::CompoundStmt => {
            if let Some((decl, index)) = walk.current_function {
                if parent == decl {
                    globals.functions[index].body = parse::extent_of(&entity, sources)?;
                }
            }
        }
        EntityKind::CallExpr => {
            if let Some(extent) = parse::extent_of(&entity, sources)? {
                let argument_count = entity.get_arguments().map_or(0, |arguments| arguments.len());
                let callee = entity.get_reference().and_then(|target| target.get_name());
                globals.calls.push(CallExpression {
                    extent,
                    argument_count,
                    callee,
                });
            }
        }
        EntityKind::DeclRefExpr => {
            if let Some(target) = entity.get_reference() {
                if target.get_kind() == EntityKind::VarDecl && at_file_scope(&target) {
                    if let Some(name) = target.get_display_name() {
                        // The use site is only rewritten when the target's
                        // own declaration is, otherwise the rewrite would
                        // name a context field that never gets emitted.
                        if parse::extent_of(&target, sources)?.is_some() {
                            if let Some(extent) = parse::extent_of(&entity, sources)? {
                                globals.references.push(GlobalReference {
                                    extent,
                                    target: name,
                                });
                            }
                        } else {
                            debug!(
                                "skipping reference to {:?}: declaration is outside the rewrite",
                                name
                            );
                        }
                    }
                }
            }
        }
        EntityKind::VarDecl => {
            if parent.get_kind() == EntityKind::TranslationUnit {
                let name = match entity.get_display_name() {
                    Some(name) => name,
                    None => return Ok(()),
                };
                if let Some(extent) = parse::extent_of(&entity, sources)? {
                    let type_name = entity
                        .get_type()
                        .map(|ty| ty.get_display_name())
                        .unwrap_or_default();
                    if let Some(record) = globals.variables.get_mut(&name) {
                        // Equally named declarations collapse into one
                        // logical global; the latest spelling wins and a
                        // previously captured initializer is kept.
                        record.extents.push(extent);
                        record.type_name = type_name;
                    } else {
                        globals.variables.insert(
                            name.clone(),
                            GlobalVariable {
                                name: name.clone(),
                                type_name,
                                extents: vec![extent],
                                initializer: None,
                            },
                        );
                    }
                    walk.current_variable = Some((entity, name));
                } else {
                    debug!("skipping file-scope variable {:?}", name);
                }
            }
        }
        _ => {}
    }

    // A direct child of the open variable declaration is its initializer.
    // Later direct children overwrite earlier ones, which resolves the type
    // reference child of declarations like `struct s x = {0};` in favor of
    // the init list.
    if let Some((decl, name)) = &walk.current_variable {
        if parent == *decl {
            if let Some(extent) = parse::extent_of(&entity, sources)? {
                if let Some(record) = globals.variables.get_mut(name) {
                    record.initializer = Some(extent);
                }
            }
        }
    }

    Ok(())
}

fn at_file_scope(entity: &Entity) -> bool {
    entity
        .get_semantic_parent()
        .map_or(false, |parent| parent.get_kind() == EntityKind::TranslationUnit)
}
