//! Resolution Bridge
//!
//! Resolves bare imports such as `import Button from "ui-kit"` to the component
//! entry a package declares in its manifest (`"svelte": "src/index.svelte"`).
//! Relative, absolute and virtual (`\0`-prefixed) specifiers are never handled
//! here.

use serde_json::Value;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::diagnostics::ExportDenials;
use crate::error::{ComposeError, Result};

pub const DEFAULT_MANIFEST_FIELD: &str = "svelte";

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("cannot find package \"{0}\"")]
    NotFound(String),

    #[error("package \"{0}\" does not export its package.json")]
    ExportNotPermitted(String),

    #[error(transparent)]
    Io(#[from] io::Error),

    #[error("invalid manifest {path}: {source}")]
    Manifest {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone)]
pub struct PackageManifest {
    /// Directory holding `package.json`.
    pub dir: PathBuf,
    pub json: Value,
}

/// Finds the manifest of `package` as seen from `from_dir`.
pub trait ManifestLocator: Send + Sync {
    fn locate(&self, package: &str, from_dir: &Path) -> std::result::Result<PackageManifest, ResolveError>;
}

/// Node-style lookup through `node_modules` in every ancestor directory.
#[derive(Debug, Default, Clone, Copy)]
pub struct NodeModulesLocator;

impl ManifestLocator for NodeModulesLocator {
    fn locate(&self, package: &str, from_dir: &Path) -> std::result::Result<PackageManifest, ResolveError> {
        for dir in from_dir.ancestors() {
            let package_dir = dir.join("node_modules").join(package);
            let path = package_dir.join("package.json");
            if !path.is_file() {
                continue;
            }

            let data = fs::read_to_string(&path)?;
            let json: Value =
                serde_json::from_str(&data).map_err(|source| ResolveError::Manifest { path, source })?;
            if !exposes_manifest(&json) {
                return Err(ResolveError::ExportNotPermitted(package.to_string()));
            }
            return Ok(PackageManifest {
                dir: package_dir,
                json,
            });
        }
        Err(ResolveError::NotFound(package.to_string()))
    }
}

/// Whether a manifest's `exports` map lets `<package>/package.json` through.
fn exposes_manifest(manifest: &Value) -> bool {
    match manifest.get("exports") {
        None | Some(Value::Null) => true,
        Some(Value::Object(map)) => {
            map.keys().any(|k| k.starts_with('.'))
                && (map.contains_key("./package.json")
                    || map.contains_key("./*")
                    || map.contains_key("./"))
        }
        Some(_) => false,
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// SPECIFIERS
// ═══════════════════════════════════════════════════════════════════════════════

pub fn is_bare_specifier(specifier: &str) -> bool {
    !specifier.is_empty()
        && !specifier.starts_with('.')
        && !specifier.starts_with('\0')
        && !specifier.starts_with('/')
        && !Path::new(specifier).is_absolute()
}

/// Split a bare specifier into its package name and whether a subpath
/// follows it: `@scope/pkg/Button.svelte` -> `("@scope/pkg", true)`.
pub fn split_package_name(specifier: &str) -> (String, bool) {
    let mut parts = specifier.split('/');
    let mut name = parts.next().unwrap_or_default().to_string();
    if name.starts_with('@') {
        if let Some(scoped) = parts.next() {
            name.push('/');
            name.push_str(scoped);
        }
    }
    (name, parts.next().is_some())
}

/// Resolve `specifier` to the entry named by `manifest_field` in its
/// package's manifest. A missing package gives `None`; a hidden manifest is
/// recorded in `denials` and gives `None`; anything else is fatal.
pub fn resolve_package_entry(
    specifier: &str,
    importer: &Path,
    locator: &dyn ManifestLocator,
    manifest_field: &str,
    denials: &ExportDenials,
) -> Result<Option<PathBuf>> {
    if !is_bare_specifier(specifier) {
        return Ok(None);
    }

    let (package, has_subpath) = split_package_name(specifier);
    let from_dir = importer.parent().unwrap_or_else(|| Path::new("."));

    let manifest = match locator.locate(&package, from_dir) {
        Ok(manifest) => manifest,
        Err(ResolveError::NotFound(_)) => return Ok(None),
        Err(ResolveError::ExportNotPermitted(package)) => {
            denials.record(&package);
            return Ok(None);
        }
        Err(source) => {
            return Err(ComposeError::Resolve {
                specifier: specifier.to_string(),
                source,
            })
        }
    };

    if has_subpath {
        return Ok(None);
    }

    let entry = manifest
        .json
        .get(manifest_field)
        .and_then(Value::as_str)
        .map(|entry| manifest.dir.join(entry));
    if let Some(entry) = &entry {
        log::debug!("resolved {} -> {}", specifier, entry.display());
    }
    Ok(entry)
}
