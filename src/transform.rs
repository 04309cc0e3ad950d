//! Main API entry point for running the rewrite.
//!
//! A variable of type `Transform` represents one transformation run.  You
//! construct a `Transform` object, feed it translation units with `load`,
//! then request results which are computed on demand.  `load` may be called
//! several times; the discovery tables accumulate, which is how a multi-file
//! program becomes a single context.
//!
//! ## On ownership of parser handles
//!
//! The parser index and translation unit handles exist only inside `load`.
//! Everything later passes need (names, type spellings, byte ranges) is
//! copied into owned records while the handles are alive, so no analysis
//! result borrows from the parser.  Strings yielded by cursors die at
//! parser teardown; a retained borrow would be a use-after-free, which the
//! owned records rule out.
//!
//! ## On determinism
//!
//! Discovery order mirrors the parser's depth-first traversal.  The only
//! deliberate reorderings are the planner's sort of the edit list and the
//! lexicographic field order of the context aggregate, so a given set of
//! inputs produces byte-identical output on every run.  Rewritten files
//! appear in first-load order, which is the command line order followed by
//! included files as they are first mentioned by a cursor.

use std::io::Write;

use log::info;

use crate::apply;
use crate::discover::{self, GlobalSet};
use crate::edit::EditSet;
use crate::emit;
use crate::parse::{self, ParseSession};
use crate::plan;
use crate::source::SourceSet;
use crate::Result;

/// Options that stay constant for the lifetime of the run.
#[derive(Debug, Default)]
pub struct TransformOptions {
    /// Arguments handed to the C parser verbatim for every translation
    /// unit.  The tool itself does not interpret them.
    pub parser_options: Vec<String>,
}

/// One transformation run: the source cache, the accumulated discovery
/// tables and the lazily planned edit list.
pub struct Transform {
    options: TransformOptions,
    sources: SourceSet,
    globals: GlobalSet,
    edits: Option<EditSet>,
}

impl Transform {
    pub fn new(options: TransformOptions) -> Transform {
        Transform {
            options,
            sources: SourceSet::new(),
            globals: GlobalSet::new(),
            edits: None,
        }
    }

    /// Parses every named file and folds its facts into the discovery
    /// tables.  Any previously planned edits are invalidated.
    ///
    /// Input files are cached up front so that an input containing nothing
    /// of interest still appears, unchanged, in the output.
    pub fn load(&mut self, filenames: &[String]) -> Result<()> {
        let session = ParseSession::new()?;
        let index = session.index();
        for filename in filenames {
            self.sources.load(filename)?;
            let unit = parse::parse_unit(&index, filename, &self.options.parser_options)?;
            discover::discover(&mut self.globals, &mut self.sources, &unit)?;
        }
        self.edits = None;

        info!("number of global functions: {}", self.globals.functions.len());
        info!("number of global variables: {}", self.globals.variables.len());
        info!("number of references: {}", self.globals.references.len());
        Ok(())
    }

    /// The discovery tables accumulated so far.
    pub fn globals(&self) -> &GlobalSet {
        &self.globals
    }

    /// The source cache accumulated so far.
    pub fn sources(&self) -> &SourceSet {
        &self.sources
    }

    /// Plans, orders and deduplicates the edit list.  The result is cached
    /// until the next `load`.
    pub fn edits_result(&mut self) -> Result<&EditSet> {
        if self.edits.is_none() {
            let mut edits = EditSet::new();
            plan::plan_edits(&mut edits, &self.globals, &self.sources)?;
            self.edits = Some(edits);
        }
        Ok(self.edits.as_ref().unwrap())
    }

    /// Writes the complete output: every rewritten file in first-load
    /// order, then the context header, then the initializer source.
    pub fn write_output(&mut self, out: &mut dyn Write) -> Result<()> {
        self.edits_result()?;
        let edits = self.edits.as_ref().unwrap();
        apply::write_rewritten(out, edits, &self.sources)?;
        emit::write_header(out, &self.globals)?;
        emit::write_initializer(out, &self.globals, &self.sources)?;
        Ok(())
    }
}

/// Rewrites `filenames` in one pass and writes the result to `out`.
pub fn transform(filenames: &[String], parser_options: &[String], out: &mut dyn Write) -> Result<()> {
    let mut run = Transform::new(TransformOptions {
        parser_options: parser_options.to_vec(),
    });
    run.load(filenames)?;
    run.write_output(out)
}
