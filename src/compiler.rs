//! Compiler Contract for the Compose Pipeline
//!
//! The component compiler itself lives outside this crate. This module pins
//! down the shape of what the pipeline hands to it and what it gets back.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::future::Future;
use std::path::PathBuf;
use thiserror::Error;

// ═══════════════════════════════════════════════════════════════════════════════
// DIAGNOSTICS
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Position {
    pub line: u32,
    pub column: u32,
    #[serde(default)]
    pub character: u32,
}

/// A compiler-emitted warning. Only `code` and `message` are interpreted by
/// the pipeline; everything else is carried through untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagnostic {
    pub code: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<Position>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<Position>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frame: Option<String>,
}

impl Diagnostic {
    pub fn new(code: &str, message: &str) -> Self {
        Self {
            code: code.to_string(),
            message: message.to_string(),
            filename: None,
            start: None,
            end: None,
            frame: None,
        }
    }

    pub fn with_filename(mut self, filename: &str) -> Self {
        self.filename = Some(filename.to_string());
        self
    }
}

/// A failed compile or preprocess call.
#[derive(Debug, Clone, Error, Serialize, Deserialize)]
#[error("{message}")]
#[serde(rename_all = "camelCase")]
pub struct CompileError {
    pub message: String,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub filename: Option<String>,
    #[serde(default)]
    pub start: Option<Position>,
}

impl CompileError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code: None,
            filename: None,
            start: None,
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// COMPILE INPUT / OUTPUT
// ═══════════════════════════════════════════════════════════════════════════════

/// Options forwarded to the compiler. `filename` and `sourcemap` are set per
/// call; every other key comes verbatim from `compilerOptions`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompileOptions {
    pub filename: PathBuf,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sourcemap: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl CompileOptions {
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.extra.get(key)
    }

    /// Whether the compiler has been asked to inline its own styles.
    pub fn inlines_css(&self) -> bool {
        is_truthy(self.extra.get("css"))
    }

    /// Copy of these options aimed at another file, without an input map.
    pub fn for_file(&self, filename: PathBuf) -> Self {
        Self {
            filename,
            sourcemap: None,
            extra: self.extra.clone(),
        }
    }
}

/// JavaScript-style truthiness for loosely typed option values.
pub(crate) fn is_truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().map_or(false, |f| f != 0.0),
        Some(Value::String(s)) => !s.is_empty(),
        Some(_) => true,
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Css {
    pub code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub map: Option<Value>,
}

impl Css {
    pub fn is_empty(&self) -> bool {
        self.code.trim().is_empty()
    }
}

/// One compiler call's output. The linker produces a new value from the
/// parent's module; it never edits one in place.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompiledModule {
    pub code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub map: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub css: Option<Css>,
    #[serde(default)]
    pub warnings: Vec<Diagnostic>,
}

impl CompiledModule {
    pub fn css_code(&self) -> Option<&str> {
        self.css
            .as_ref()
            .filter(|css| !css.is_empty())
            .map(|css| css.code.as_str())
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// PREPROCESSING
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone)]
pub struct PreprocessContext {
    pub filename: PathBuf,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Preprocessed {
    pub code: String,
    #[serde(default)]
    pub map: Option<Value>,
    #[serde(default)]
    pub dependencies: Vec<PathBuf>,
}

impl Preprocessed {
    pub fn passthrough(source: &str) -> Self {
        Self {
            code: source.to_string(),
            map: None,
            dependencies: Vec::new(),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// COMPILER TRAIT
// ═══════════════════════════════════════════════════════════════════════════════

/// The external component compiler.
///
/// `compile` is synchronous and CPU-bound, and may be called from several
/// threads at once for the sub-components of one unit. `preprocess` is the
/// only suspension point in a transform.
pub trait ComponentCompiler: Send + Sync {
    fn compile(&self, source: &str, options: &CompileOptions)
        -> Result<CompiledModule, CompileError>;

    fn preprocess(
        &self,
        source: &str,
        _config: &Value,
        _context: &PreprocessContext,
    ) -> impl Future<Output = Result<Preprocessed, CompileError>> + Send {
        let processed = Preprocessed::passthrough(source);
        async move { Ok(processed) }
    }
}
