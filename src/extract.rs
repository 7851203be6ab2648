//! Extraction Scanner
//!
//! Finds inline sub-component blocks in a component source:
//!
//! ```text
//! {#component Card}
//!   <div class="card"><slot /></div>
//! {/component}
//! ```
//!
//! Blocks live at depth 0 only. A second opening marker before the current
//! block is closed is refused outright instead of being matched by accident.
//! Removed blocks are replaced with nothing, so positions after a block shift;
//! each spec keeps the byte span it was removed from.

use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;
use std::collections::HashSet;
use std::ops::Range;
use std::path::{Path, PathBuf};

use crate::error::{ComposeError, Result};

lazy_static! {
    static ref MARKER_RE: Regex = Regex::new(
        r"(?P<open>\{#component(?:\s+(?P<name>[^\s}]*))?\s*\})|(?P<close>\{/component\s*\})"
    )
    .unwrap();

    /// Upper-camel identifier accepted as a sub-component name
    static ref NAME_RE: Regex = Regex::new(r"^[A-Z][A-Za-z0-9]*$").unwrap();
}

// ═══════════════════════════════════════════════════════════════════════════════
// TYPES
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubcomponentSpec {
    pub name: String,
    pub body: String,
    /// Parent filename with `__<name>` inserted before the extension.
    pub synthetic_filename: PathBuf,
    /// Byte range of the whole block in the original source.
    pub span: Range<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Extraction {
    pub source: String,
    pub specs: Vec<SubcomponentSpec>,
}

impl Extraction {
    pub fn names(&self) -> Vec<&str> {
        self.specs.iter().map(|s| s.name.as_str()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }
}

struct OpenBlock<'a> {
    name: &'a str,
    start: usize,
    body_start: usize,
}

// ═══════════════════════════════════════════════════════════════════════════════
// SCANNER
// ═══════════════════════════════════════════════════════════════════════════════

pub fn is_valid_subcomponent_name(name: &str) -> bool {
    NAME_RE.is_match(name)
}

/// `src/App.svelte` + `Card` -> `src/App__Card.svelte`
pub fn synthetic_filename(parent: &Path, name: &str) -> PathBuf {
    match (parent.file_stem(), parent.extension()) {
        (Some(stem), Some(ext)) => parent.with_file_name(format!(
            "{}__{}.{}",
            stem.to_string_lossy(),
            name,
            ext.to_string_lossy()
        )),
        _ => PathBuf::from(format!("{}__{}", parent.display(), name)),
    }
}

/// Split `source` into the parent source and its sub-component specs, in
/// order of appearance.
pub fn extract_subcomponents(source: &str, filename: &Path) -> Result<Extraction> {
    let file = filename.display().to_string();
    let mut cleaned = String::with_capacity(source.len());
    let mut specs: Vec<SubcomponentSpec> = Vec::new();
    let mut seen = HashSet::new();
    let mut cursor = 0;
    let mut open: Option<OpenBlock> = None;

    for caps in MARKER_RE.captures_iter(source) {
        if let Some(marker) = caps.name("open") {
            let name = caps.name("name").map_or("", |m| m.as_str());
            if let Some(outer) = &open {
                return Err(ComposeError::NestedBlock {
                    file,
                    outer: outer.name.to_string(),
                    inner: name.to_string(),
                });
            }
            if !is_valid_subcomponent_name(name) {
                return Err(ComposeError::InvalidName {
                    file,
                    name: name.to_string(),
                });
            }
            open = Some(OpenBlock {
                name,
                start: marker.start(),
                body_start: marker.end(),
            });
        } else if let Some(marker) = caps.name("close") {
            let Some(block) = open.take() else {
                return Err(ComposeError::UnmatchedClose {
                    file,
                    offset: marker.start(),
                });
            };
            if !seen.insert(block.name) {
                return Err(ComposeError::DuplicateName {
                    file,
                    name: block.name.to_string(),
                });
            }

            cleaned.push_str(&source[cursor..block.start]);
            cursor = marker.end();

            specs.push(SubcomponentSpec {
                name: block.name.to_string(),
                body: source[block.body_start..marker.start()].to_string(),
                synthetic_filename: synthetic_filename(filename, block.name),
                span: block.start..marker.end(),
            });
        }
    }

    if let Some(block) = open {
        return Err(ComposeError::UnterminatedBlock {
            file,
            name: block.name.to_string(),
        });
    }

    cleaned.push_str(&source[cursor..]);

    if !specs.is_empty() {
        log::debug!(
            "{}: extracted {} sub-component(s): {}",
            file,
            specs.len(),
            specs
                .iter()
                .map(|s| s.name.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        );
    }

    Ok(Extraction {
        source: cleaned,
        specs,
    })
}
