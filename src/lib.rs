//! Rewrites C translation units so that file-scope variables live in a
//! single aggregate record, "the context", passed to every function.
//!
//! The transformation discovers every file-scope variable, every function,
//! every reference to such a variable and every call expression across the
//! input translation units, then plans a set of text edits against the raw
//! source bytes and applies them.  The rewritten files are emitted on the
//! output stream together with a generated header declaring
//! `struct __context__` and a generated source file containing
//! `__init__context__`, a routine that replays the original initializers as
//! assignments into a passed-in context.
//!
//! The public entry point is [`Transform`]; the [`transform`] convenience
//! function covers the common one-shot case.  The individual passes live in
//! their own modules and can be driven separately, which is how most of the
//! test suite exercises them:
//!
//! * [`source`] caches raw file contents and defines [`source::Extent`],
//!   the half-open byte range all later passes speak in.
//! * [`parse`] adapts libclang; it is the only module that touches parser
//!   handles directly.
//! * [`discover`] walks each translation unit once and fills the fact
//!   tables in [`discover::GlobalSet`].
//! * [`plan`] converts the facts into [`edit::TextEdit`]s.
//! * [`edit`] orders and deduplicates the edit list.
//! * [`apply`] splices the edits into the cached sources.
//! * [`emit`] writes the synthesized context header and initializer.

pub mod apply;
pub mod discover;
pub mod edit;
pub mod emit;
pub mod parse;
pub mod plan;
pub mod source;
pub mod transform;

pub use crate::transform::{transform, Transform, TransformOptions};

use thiserror::Error;

/// Errors that abort a transformation run.
///
/// There is no per-file recovery and no partial output; every variant is
/// fatal to the run that produced it.
#[derive(Debug, Error)]
pub enum Error {
    /// A source file could not be opened or read.
    #[error("cannot read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// libclang could not be loaded or is already in use in this process.
    #[error("cannot initialize libclang: {0}")]
    Clang(String),
    /// The parser failed to build a translation unit.
    #[error("cannot parse {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: clang::SourceError,
    },
    /// Two planned edits overlap within one file.  This indicates a bug in
    /// the planner, not bad input.
    #[error("overlapping edits in {file} at offset {start} (length {length})")]
    OverlappingEdits {
        file: String,
        start: usize,
        length: usize,
    },
    /// An edit range extends past the end of its file.
    #[error("edit out of bounds in {file} at offset {start} (length {length})")]
    EditOutOfBounds {
        file: String,
        start: usize,
        length: usize,
    },
    /// The output stream rejected a write.
    #[error("cannot write output: {0}")]
    Write(#[from] std::io::Error),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;
