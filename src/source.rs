//! Source file cache.
//!
//! Every file mentioned by a cursor extent is read once, whole, and kept for
//! the duration of the run.  Files are keyed by the filename string exactly
//! as the parser reports it; the parser returns stable strings for a given
//! file, so a filename is a reliable key.  The cache also remembers the
//! order in which files were first seen, and the output stage emits
//! rewritten files in that order.

use std::fs;

use fnv::FnvHashMap;

use crate::{Error, Result};

/// A half-open `[start, end)` byte range inside a named source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extent {
    pub file: String,
    pub start: usize,
    pub end: usize,
}

impl Extent {
    pub fn new(file: impl Into<String>, start: usize, end: usize) -> Extent {
        Extent {
            file: file.into(),
            start,
            end,
        }
    }

    /// Length of the range in bytes.
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// One cached source file.
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub name: String,
    pub text: String,
}

/// The process-wide cache of raw source contents.
#[derive(Debug, Default)]
pub struct SourceSet {
    files: FnvHashMap<String, SourceFile>,
    order: Vec<String>,
}

impl SourceSet {
    pub fn new() -> SourceSet {
        SourceSet::default()
    }

    /// Reads `name` into the cache if it is not already present and returns
    /// the cached entry.  Rereading a cached file is a no-op.  An unreadable
    /// file is fatal.
    pub fn load(&mut self, name: &str) -> Result<&SourceFile> {
        if !self.files.contains_key(name) {
            let text = fs::read_to_string(name).map_err(|source| Error::Io {
                path: name.to_owned(),
                source,
            })?;
            self.order.push(name.to_owned());
            self.files.insert(
                name.to_owned(),
                SourceFile {
                    name: name.to_owned(),
                    text,
                },
            );
        }
        Ok(&self.files[name])
    }

    /// Places an in-memory buffer in the cache under an arbitrary name.
    ///
    /// This is the filesystem-free entry used by tests that drive the
    /// planner, applier and emitter directly.
    pub fn insert(&mut self, name: &str, text: &str) {
        if !self.files.contains_key(name) {
            self.order.push(name.to_owned());
        }
        self.files.insert(
            name.to_owned(),
            SourceFile {
                name: name.to_owned(),
                text: text.to_owned(),
            },
        );
    }

    pub fn get(&self, name: &str) -> Option<&SourceFile> {
        self.files.get(name)
    }

    /// The raw text of a cached file.
    pub fn text(&self, name: &str) -> Option<&str> {
        self.files.get(name).map(|file| file.text.as_str())
    }

    /// The literal source text covered by an extent, or `None` if the file
    /// is not cached or the range does not fall on valid boundaries.
    pub fn snippet(&self, extent: &Extent) -> Option<&str> {
        self.text(&extent.file)?.get(extent.start..extent.end)
    }

    /// Cached filenames in first-load order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}
