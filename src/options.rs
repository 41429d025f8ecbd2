//! Reader-wide configuration, consumed (not owned) by the host pipeline.
//!
//! Mirrors the shape of the teacher's `api::ProcessArgs`: a small, pure,
//! serializable options struct that the CLI and any embedding host construct
//! and pass in, with no global or thread-local state.

use std::collections::HashSet;
use std::path::PathBuf;

/// Reader extension flags recognized by this crate (see spec.md §6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Extension {
    RawTex,
    LatexMacros,
    Smart,
    LiterateHaskell,
}

impl Extension {
    fn from_str(s: &str) -> Option<Self> {
        match s {
            "raw_tex" => Some(Extension::RawTex),
            "latex_macros" => Some(Extension::LatexMacros),
            "smart" => Some(Extension::Smart),
            "literate_haskell" => Some(Extension::LiterateHaskell),
            _ => None,
        }
    }
}

/// A set of enabled extensions. Defaults to `latex_macros` + `smart`, the
/// combination pandoc's own LaTeX reader treats as its practical default.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extensions(HashSet<Extension>);

impl Default for Extensions {
    fn default() -> Self {
        let mut set = HashSet::new();
        set.insert(Extension::LatexMacros);
        set.insert(Extension::Smart);
        Extensions(set)
    }
}

impl Extensions {
    pub fn none() -> Self {
        Extensions(HashSet::new())
    }

    pub fn enabled(&self, ext: Extension) -> bool {
        self.0.contains(&ext)
    }

    pub fn enable(&mut self, ext: Extension) {
        self.0.insert(ext);
    }

    /// Parse a comma-separated list such as `"raw_tex,smart"`. Unknown names
    /// are silently ignored, matching extension-flag evaluation being a
    /// read-only predicate per spec.md §1.
    pub fn parse_list(s: &str) -> Self {
        let mut set = HashSet::new();
        for name in s.split(',') {
            let name = name.trim();
            if let Some(ext) = Extension::from_str(name) {
                set.insert(ext);
            }
        }
        Extensions(set)
    }
}

/// Options threaded into every parse, cloned into sub-parse state snapshots.
#[derive(Debug, Clone)]
pub struct ReaderOptions {
    pub extensions: Extensions,
    pub default_image_extension: String,
    pub input_sources: Vec<PathBuf>,
    pub resource_path: Vec<PathBuf>,
}

impl Default for ReaderOptions {
    fn default() -> Self {
        Self {
            extensions: Extensions::default(),
            default_image_extension: String::new(),
            input_sources: Vec::new(),
            resource_path: vec![PathBuf::from(".")],
        }
    }
}
