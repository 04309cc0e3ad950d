//! Thin adapter over libclang.
//!
//! This is the only module that talks to the parser directly.  It owns the
//! library handle and index, turns parse failures into [`Error::Parse`] and
//! maps cursor ranges onto [`Extent`]s against the source cache.  Entities
//! are borrowed handles into a translation unit; every string the rest of
//! the crate keeps (names, type spellings) is copied out of the entity at
//! capture time, before the unit is disposed.  The `clang` binding returns
//! owned `String`s from its accessors, so the copy happens by construction.

use clang::{Clang, Entity, Index, TranslationUnit};
use log::debug;

use crate::source::{Extent, SourceSet};
use crate::{Error, Result};

/// Owns the libclang handle for one transformation run.
///
/// libclang allows a single live instance per process; the session must
/// outlive every translation unit and entity derived from it.
pub struct ParseSession {
    clang: Clang,
}

impl ParseSession {
    pub fn new() -> Result<ParseSession> {
        let clang = Clang::new().map_err(Error::Clang)?;
        Ok(ParseSession { clang })
    }

    /// A parser index with declarations from precompiled headers excluded
    /// and diagnostics printed to stderr.
    pub fn index(&self) -> Index {
        Index::new(&self.clang, true, true)
    }
}

/// Parses one translation unit, passing `options` to the parser verbatim.
/// Failure to parse is fatal.
pub fn parse_unit<'i>(
    index: &'i Index,
    filename: &str,
    options: &[String],
) -> Result<TranslationUnit<'i>> {
    index
        .parser(filename)
        .arguments(options)
        .parse()
        .map_err(|source| Error::Parse {
            path: filename.to_owned(),
            source,
        })
}

/// Resolves an entity's extent to a byte range in a cached file.
///
/// Returns `None` for entities the rewrite must leave alone: ranges inside
/// system headers, ranges whose file cannot be determined (macro expansion
/// artifacts) and ranges straddling a file boundary.  The named file is
/// loaded into the cache as a side effect; an unreadable file is fatal.
pub fn extent_of(entity: &Entity, sources: &mut SourceSet) -> Result<Option<Extent>> {
    let range = match entity.get_range() {
        Some(range) => range,
        None => return Ok(None),
    };
    if range.get_start().is_in_system_header() {
        return Ok(None);
    }

    let start = range.get_start().get_file_location();
    let end = range.get_end().get_file_location();
    let (start_file, end_file) = match (start.file, end.file) {
        (Some(start_file), Some(end_file)) => (start_file, end_file),
        _ => {
            debug!("skipping {:?}: extent has no file", entity.get_name());
            return Ok(None);
        }
    };
    if start_file != end_file {
        debug!(
            "skipping {:?}: extent straddles a file boundary",
            entity.get_name()
        );
        return Ok(None);
    }

    let name = start_file.get_path().to_string_lossy().into_owned();
    sources.load(&name)?;
    Ok(Some(Extent::new(
        name,
        start.offset as usize,
        end.offset as usize,
    )))
}
