//! Applies a normalized edit list to the cached sources.

use std::io::Write;

use crate::edit::EditSet;
use crate::source::SourceSet;
use crate::{Error, Result};

/// Writes every cached file, rewritten, in first-load order.
///
/// Each file is preceded by a `/* <filename> */` provenance line.  Edits are
/// spliced in the normalized descending-offset order, so earlier splices
/// never shift the ranges of later ones.  Files without edits are emitted
/// unchanged.
pub fn write_rewritten(
    out: &mut dyn Write,
    edits: &EditSet,
    sources: &SourceSet,
) -> Result<()> {
    for name in sources.names() {
        let mut buffer = sources
            .text(name)
            .expect("cached name without cached text")
            .to_owned();
        for edit in edits.for_file(name) {
            if buffer.get(edit.start..edit.end()).is_none() {
                return Err(Error::EditOutOfBounds {
                    file: edit.file.clone(),
                    start: edit.start,
                    length: edit.length,
                });
            }
            buffer.replace_range(edit.start..edit.end(), &edit.replacement);
        }
        writeln!(out, "/* {name} */")?;
        out.write_all(buffer.as_bytes())?;
        if !buffer.ends_with('\n') {
            out.write_all(b"\n")?;
        }
    }
    Ok(())
}
