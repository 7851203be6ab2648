use thiserror::Error;

use crate::compiler::CompileError;
use crate::contract::ContractViolation;
use crate::resolve::ResolveError;

// ═══════════════════════════════════════════════════════════════════════════════
// ERROR CODES
// ═══════════════════════════════════════════════════════════════════════════════

pub const ERR_INVALID_NAME: &str = "COMPOSE-001";
pub const ERR_NESTED_BLOCK: &str = "COMPOSE-002";
pub const ERR_UNTERMINATED_BLOCK: &str = "COMPOSE-003";
pub const ERR_DUPLICATE_NAME: &str = "COMPOSE-004";
pub const ERR_UNMATCHED_CLOSE: &str = "COMPOSE-005";
pub const ERR_PARENT_COMPILE: &str = "COMPOSE-010";
pub const ERR_PREPROCESS: &str = "COMPOSE-011";
pub const ERR_OUTPUT_CONTRACT: &str = "COMPOSE-020";
pub const ERR_RESOLVE: &str = "COMPOSE-030";
pub const ERR_OPTIONS: &str = "COMPOSE-040";

// ═══════════════════════════════════════════════════════════════════════════════
// COMPOSE ERROR
// ═══════════════════════════════════════════════════════════════════════════════

/// A unit-aborting failure. Every variant that concerns a source unit names
/// its file so the host can attribute the build failure.
#[derive(Debug, Error)]
pub enum ComposeError {
    #[error("{file}: invalid sub-component name \"{name}\", expected an upper-camel identifier such as \"Card\"")]
    InvalidName { file: String, name: String },

    #[error("{file}: sub-component \"{inner}\" is declared inside \"{outer}\"; sub-components cannot be nested")]
    NestedBlock {
        file: String,
        outer: String,
        inner: String,
    },

    #[error("{file}: sub-component \"{name}\" is never closed")]
    UnterminatedBlock { file: String, name: String },

    #[error("{file}: sub-component \"{name}\" is declared more than once")]
    DuplicateName { file: String, name: String },

    #[error("{file}: closing sub-component marker at offset {offset} has no opening marker")]
    UnmatchedClose { file: String, offset: usize },

    #[error("{file}: {source}")]
    ParentCompile {
        file: String,
        #[source]
        source: CompileError,
    },

    #[error("{file}: preprocessing failed: {source}")]
    Preprocess {
        file: String,
        #[source]
        source: CompileError,
    },

    #[error("{file}: compiler output does not match the expected shape: {source}")]
    Contract {
        file: String,
        #[source]
        source: ContractViolation,
    },

    #[error("failed to resolve \"{specifier}\": {source}")]
    Resolve {
        specifier: String,
        #[source]
        source: ResolveError,
    },

    #[error("invalid plugin options: {0}")]
    Options(#[from] serde_json::Error),

    #[error("invalid filter pattern \"{pattern}\": {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

impl ComposeError {
    pub fn code(&self) -> &'static str {
        match self {
            ComposeError::InvalidName { .. } => ERR_INVALID_NAME,
            ComposeError::NestedBlock { .. } => ERR_NESTED_BLOCK,
            ComposeError::UnterminatedBlock { .. } => ERR_UNTERMINATED_BLOCK,
            ComposeError::DuplicateName { .. } => ERR_DUPLICATE_NAME,
            ComposeError::UnmatchedClose { .. } => ERR_UNMATCHED_CLOSE,
            ComposeError::ParentCompile { .. } => ERR_PARENT_COMPILE,
            ComposeError::Preprocess { .. } => ERR_PREPROCESS,
            ComposeError::Contract { .. } => ERR_OUTPUT_CONTRACT,
            ComposeError::Resolve { .. } => ERR_RESOLVE,
            ComposeError::Options(_) | ComposeError::InvalidPattern { .. } => ERR_OPTIONS,
        }
    }

    /// The source unit this error aborted, when there is one.
    pub fn file(&self) -> Option<&str> {
        match self {
            ComposeError::InvalidName { file, .. }
            | ComposeError::NestedBlock { file, .. }
            | ComposeError::UnterminatedBlock { file, .. }
            | ComposeError::DuplicateName { file, .. }
            | ComposeError::UnmatchedClose { file, .. }
            | ComposeError::ParentCompile { file, .. }
            | ComposeError::Preprocess { file, .. }
            | ComposeError::Contract { file, .. } => Some(file),
            ComposeError::Resolve { .. }
            | ComposeError::Options(_)
            | ComposeError::InvalidPattern { .. } => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, ComposeError>;
