//! # Compose Native
//!
//! Build-time transform that lets one component file declare nested
//! sub-components inline and still load as a single generated module.
//!
//! ```text
//! <Card title="Hi" />
//!
//! {#component Card}
//!   <div class="card">{title}</div>
//! {/component}
//! ```
//!
//! ## Pipeline Invariants
//!
//! 1. **Extraction**: blocks are found at depth 0 only. Names are upper-camel
//!    identifiers, unique per file. Anything else aborts the unit.
//!
//! 2. **Compilation**: the parent and each block are compiled separately.
//!    A block compiles as `<Parent>__<Name>.<ext>` so its diagnostics are
//!    attributable. Parent failure aborts the unit; block failure does not.
//!
//! 3. **Reconciliation**: `missing-declaration` warnings for block names are
//!    dropped; every other warning is delivered unchanged.
//!
//! 4. **Splicing**: each block's body is wrapped in an initializer assigned to
//!    `<Parent>.<Name>`, placed right before the parent's default export.
//!    Runtime imports are never bound twice. `= new <Name>({` becomes
//!    `= new <Parent>.<Name>({`. Output that does not fit the expected shape
//!    is rejected rather than patched.
//!
//! 5. **Styles**: with `emitCss`, styles move to a virtual `<file>.css`
//!    module held in the build-scoped cache.
//!
//! ## Known Limitation
//!
//! Removing blocks and splicing do not adjust source maps. Positions after a
//! removed block are reported against the cleaned source.

#[cfg(feature = "napi")]
mod bridge;

pub mod compiler;
pub mod contract;
pub mod diagnostics;
pub mod error;
pub mod extract;
pub mod filter;
pub mod options;
pub mod orchestrate;
pub mod plugin;
pub mod reconcile;
pub mod resolve;
pub mod splice;
pub mod styles;

#[cfg(test)]
mod test_support;



pub use compiler::{
    CompileError, CompileOptions, CompiledModule, ComponentCompiler, Css, Diagnostic, Position,
    PreprocessContext, Preprocessed,
};
pub use contract::{ContractViolation, OutputContract};
pub use error::{ComposeError, Result};
pub use extract::{extract_subcomponents, Extraction, SubcomponentSpec};
pub use options::PluginOptions;
pub use plugin::{BuildContext, ComposePlugin, TransformOutput};
pub use reconcile::WarningHandler;
pub use resolve::{ManifestLocator, NodeModulesLocator, PackageManifest, ResolveError};
pub use splice::{splice_subcomponents, ChildModule};
pub use styles::{VirtualAsset, VirtualAssetCache};

#[cfg(feature = "napi")]
pub use bridge::*;
