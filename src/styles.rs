//! Virtual Style Assets
//!
//! Compiled styles are moved out of the generated module into a virtual
//! `.css` module next to the source file. The module imports it, and the
//! bundler loads it back from the build-scoped cache.

use dashmap::DashMap;
use serde_json::Value;
use std::path::Path;

use crate::compiler::{CompiledModule, Css};

pub const CSS_EXTENSION: &str = "css";

#[derive(Debug, Clone, PartialEq)]
pub struct VirtualAsset {
    pub key: String,
    pub content: Css,
}

/// Build-scoped store of virtual style assets, keyed by asset path. Keys are
/// derived from source paths, so concurrent units never write the same key.
#[derive(Debug, Default)]
pub struct VirtualAssetCache {
    entries: DashMap<String, Css>,
}

impl VirtualAssetCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last write for a key wins.
    pub fn insert(&self, asset: VirtualAsset) {
        self.entries.insert(asset.key, asset.content);
    }

    pub fn get(&self, key: &str) -> Option<Css> {
        self.entries.get(key).map(|entry| entry.value().clone())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// `src/App.svelte` -> `src/App.css`
pub fn css_asset_path(id: &str) -> String {
    let path = Path::new(id);
    if path.extension().is_some() {
        path.with_extension(CSS_EXTENSION).to_string_lossy().into_owned()
    } else {
        format!("{}.{}", id, CSS_EXTENSION)
    }
}

/// Parent styles followed by each spliced child's styles, skipping blanks.
/// The parent's map survives only when nothing was appended to it.
pub fn merge_css<'a>(
    parent: Option<&'a Css>,
    children: impl IntoIterator<Item = &'a Css>,
) -> Option<Css> {
    let parent = parent.filter(|css| !css.is_empty());
    let children: Vec<&Css> = children.into_iter().filter(|css| !css.is_empty()).collect();

    match (parent, children.is_empty()) {
        (None, true) => None,
        (Some(css), true) => Some(css.clone()),
        (parent, false) => {
            let code = parent
                .into_iter()
                .chain(children)
                .map(|css| css.code.trim_end())
                .collect::<Vec<_>>()
                .join("\n");
            Some(Css { code, map: None })
        }
    }
}

/// Store `css` under the unit's asset path and make `module` import it.
pub fn emit_css_asset(
    id: &str,
    mut module: CompiledModule,
    css: Css,
    cache: &VirtualAssetCache,
) -> CompiledModule {
    let key = css_asset_path(id);
    module.code.push_str(&format!("\nimport {};\n", Value::String(key.clone())));
    log::debug!("{}: cached {} bytes of styles at {}", id, css.code.len(), key);
    cache.insert(VirtualAsset { key, content: css });
    module
}
