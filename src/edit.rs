//! The text edit list and its ordering discipline.
//!
//! A [`TextEdit`] is a splice specification: replace the bytes
//! `[start, start + length)` of a named file with a replacement string.  The
//! planner emits edits in discovery order; [`EditSet::normalize`] then sorts
//! them by filename and, within a file, by descending start offset, so that
//! applying an edit never shifts the offsets of edits that have not been
//! applied yet.  At equal start the longer edit sorts first, which makes a
//! zero-length insertion at an edited range's first byte land after the
//! replacement, outside the replaced text.
//!
//! After sorting, duplicates that agree on file, start and length collapse
//! to one edit; the replacement text is not part of that equality.  The same
//! construct discovered through two translation units (a shared header)
//! produces exactly such duplicates.

use crate::{Error, Result};

/// Replace the bytes `[start, start + length)` of `file` with `replacement`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextEdit {
    pub file: String,
    pub start: usize,
    pub length: usize,
    pub replacement: String,
}

impl TextEdit {
    pub fn new(file: impl Into<String>, start: usize, length: usize, replacement: impl Into<String>) -> TextEdit {
        TextEdit {
            file: file.into(),
            start,
            length,
            replacement: replacement.into(),
        }
    }

    /// Exclusive end offset of the replaced range.
    pub fn end(&self) -> usize {
        self.start + self.length
    }

    fn contains(&self, other: &TextEdit) -> bool {
        self.file == other.file && self.start <= other.start && other.end() <= self.end()
    }
}

/// The flat edit list produced by the planner.
#[derive(Debug, Default)]
pub struct EditSet {
    edits: Vec<TextEdit>,
}

impl EditSet {
    pub fn new() -> EditSet {
        EditSet::default()
    }

    pub fn push(&mut self, edit: TextEdit) {
        self.edits.push(edit);
    }

    pub fn len(&self) -> usize {
        self.edits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edits.is_empty()
    }

    /// All edits, in the current list order.
    pub fn iter(&self) -> impl Iterator<Item = &TextEdit> {
        self.edits.iter()
    }

    /// The edits targeting one file, in list order.  After
    /// [`normalize`](EditSet::normalize) this is descending application
    /// order.
    pub fn for_file<'a>(&'a self, file: &'a str) -> impl Iterator<Item = &'a TextEdit> {
        self.edits.iter().filter(move |edit| edit.file == file)
    }

    /// Sorts, deduplicates and verifies the edit list.
    ///
    /// Edits wholly contained in a pure deletion are dropped; the parser
    /// reports multi-declarator statements like `int a, b;` as one extent
    /// per declarator, all anchored at the type token, and only the widest
    /// deletion survives here.  Any overlap that remains after that is a
    /// planner bug and aborts the run.
    pub fn normalize(&mut self) -> Result<()> {
        self.edits.sort_by(|a, b| {
            a.file
                .cmp(&b.file)
                .then(b.start.cmp(&a.start))
                .then(b.length.cmp(&a.length))
        });
        self.edits
            .dedup_by(|a, b| a.file == b.file && a.start == b.start && a.length == b.length);

        self.drop_contained_in_deletions();

        // Descending start order within each file: every consecutive pair
        // either touches or is disjoint, otherwise the ranges overlap.
        for pair in self.edits.windows(2) {
            let (current, next) = (&pair[0], &pair[1]);
            if current.file == next.file && next.end() > current.start {
                return Err(Error::OverlappingEdits {
                    file: next.file.clone(),
                    start: next.start,
                    length: next.length,
                });
            }
        }
        Ok(())
    }

    fn drop_contained_in_deletions(&mut self) {
        let deletions: Vec<TextEdit> = self
            .edits
            .iter()
            .filter(|edit| edit.replacement.is_empty() && edit.length > 0)
            .cloned()
            .collect();
        self.edits.retain(|edit| {
            !deletions.iter().any(|deletion| {
                // An insertion at a deletion's boundary is outside the
                // deleted bytes and must survive.
                let inside = if edit.length == 0 {
                    deletion.file == edit.file
                        && deletion.start < edit.start
                        && edit.start < deletion.end()
                } else {
                    deletion.contains(edit)
                };
                inside && (deletion.start, deletion.length) != (edit.start, edit.length)
            })
        });
    }
}
