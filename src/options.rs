//! Plugin Options
//!
//! Options arrive as the JSON object a bundler config would hold:
//!
//! ```json
//! {
//!   "compilerOptions": { "dev": true },
//!   "emitCss": true,
//!   "preprocess": { "typescript": {} },
//!   "include": "src/**",
//!   "exclude": ["**/vendor/**"],
//!   "extensions": [".svelte"]
//! }
//! ```

use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::Path;

use crate::compiler::{is_truthy, CompileOptions};
use crate::error::Result;

pub const PREFIX: &str = "[compose-native]";
pub const DEFAULT_EXTENSION: &str = ".svelte";

/// Recognized keys that only make sense to a JavaScript host.
const HOST_ONLY_OPTIONS: &[&str] = &["onwarn"];

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

impl From<OneOrMany> for Vec<String> {
    fn from(value: OneOrMany) -> Self {
        match value {
            OneOrMany::One(s) => vec![s],
            OneOrMany::Many(v) => v,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_extensions() -> Vec<String> {
    vec![DEFAULT_EXTENSION.to_string()]
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawOptions {
    #[serde(default)]
    compiler_options: Option<Map<String, Value>>,
    #[serde(default = "default_true")]
    emit_css: bool,
    #[serde(default)]
    preprocess: Option<Value>,
    #[serde(default)]
    include: Option<OneOrMany>,
    #[serde(default)]
    exclude: Option<OneOrMany>,
    #[serde(default = "default_extensions")]
    extensions: Vec<String>,
    #[serde(flatten)]
    unknown: BTreeMap<String, Value>,
}

#[derive(Debug, Clone)]
pub struct PluginOptions {
    pub compiler_options: Map<String, Value>,
    pub emit_css: bool,
    pub preprocess: Option<Value>,
    pub include: Vec<String>,
    pub exclude: Vec<String>,
    pub extensions: Vec<String>,
    warnings: Vec<String>,
}

impl Default for PluginOptions {
    fn default() -> Self {
        Self {
            compiler_options: Map::new(),
            emit_css: true,
            preprocess: None,
            include: Vec::new(),
            exclude: Vec::new(),
            extensions: default_extensions(),
            warnings: Vec::new(),
        }
    }
}

impl PluginOptions {
    /// Parse options, warning once for every unknown key and for a `css`
    /// compiler option that `emitCss` overrides.
    pub fn from_value(value: Value) -> Result<Self> {
        let raw: RawOptions = serde_json::from_value(value)?;
        let mut warnings = Vec::new();

        for key in raw.unknown.keys() {
            if HOST_ONLY_OPTIONS.contains(&key.as_str()) {
                continue;
            }
            warnings.push(format!(
                "{PREFIX} Unknown \"{key}\" option. Please use \"compilerOptions\" for any compiler configuration."
            ));
        }

        let mut compiler_options = raw.compiler_options.unwrap_or_default();
        if raw.emit_css {
            if is_truthy(compiler_options.get("css")) {
                warnings.push(format!(
                    "{PREFIX} Forcing \"compilerOptions.css\": false because \"emitCss\" was truthy."
                ));
            }
            compiler_options.insert("css".into(), Value::Bool(false));
        }

        for warning in &warnings {
            log::warn!("{}", warning);
        }

        Ok(Self {
            compiler_options,
            emit_css: raw.emit_css,
            preprocess: raw.preprocess,
            include: raw.include.map(Vec::from).unwrap_or_default(),
            exclude: raw.exclude.map(Vec::from).unwrap_or_default(),
            extensions: raw.extensions,
            warnings,
        })
    }

    /// Configuration warnings raised while parsing.
    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    pub fn handles_extension(&self, path: &Path) -> bool {
        let Some(ext) = path.extension() else {
            return false;
        };
        let ext = format!(".{}", ext.to_string_lossy());
        self.extensions.iter().any(|e| *e == ext)
    }

    /// Compiler options for one unit: `format` is always `esm`, and `css` is
    /// off whenever styles are emitted as assets.
    pub fn compile_options(&self, filename: &Path) -> CompileOptions {
        let mut extra = self.compiler_options.clone();
        extra.insert("format".into(), Value::String("esm".into()));
        if self.emit_css {
            extra.insert("css".into(), Value::Bool(false));
        }
        CompileOptions {
            filename: filename.to_path_buf(),
            sourcemap: None,
            extra,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_defaults() {
        let options = PluginOptions::from_value(json!({})).unwrap();
        assert!(options.emit_css);
        assert_eq!(options.extensions, vec![".svelte"]);
        assert!(options.preprocess.is_none());
        assert!(options.warnings().is_empty());
    }

    #[test]
    fn test_unknown_keys_warn_once_each() {
        let options = PluginOptions::from_value(json!({
            "dev": true,
            "hydratable": true,
            "onwarn": null
        }))
        .unwrap();
        assert_eq!(options.warnings().len(), 2);
        assert!(options.warnings()[0].contains("Unknown \"dev\" option"));
        assert!(options.warnings()[1].contains("Unknown \"hydratable\" option"));
    }

    #[test]
    fn test_css_is_forced_off_with_warning() {
        let options = PluginOptions::from_value(json!({
            "compilerOptions": { "css": true, "dev": true }
        }))
        .unwrap();
        assert_eq!(options.warnings().len(), 1);
        assert!(options.warnings()[0].contains("Forcing \"compilerOptions.css\": false"));

        let compile = options.compile_options(Path::new("App.svelte"));
        assert_eq!(compile.get("css"), Some(&json!(false)));
        assert_eq!(compile.get("format"), Some(&json!("esm")));
        assert_eq!(compile.get("dev"), Some(&json!(true)));
    }

    #[test]
    fn test_css_left_alone_without_emit_css() {
        let options = PluginOptions::from_value(json!({
            "emitCss": false,
            "compilerOptions": { "css": true }
        }))
        .unwrap();
        assert!(options.warnings().is_empty());
        let compile = options.compile_options(Path::new("App.svelte"));
        assert_eq!(compile.get("css"), Some(&json!(true)));
        assert!(compile.inlines_css());
    }

    #[test]
    fn test_filters_accept_string_or_list() {
        let options = PluginOptions::from_value(json!({
            "include": "src/**",
            "exclude": ["a/**", "b/**"]
        }))
        .unwrap();
        assert_eq!(options.include, vec!["src/**"]);
        assert_eq!(options.exclude, vec!["a/**", "b/**"]);
    }

    #[test]
    fn test_extension_check() {
        let options = PluginOptions::from_value(json!({"extensions": [".svelte", ".svx"]})).unwrap();
        assert!(options.handles_extension(Path::new("a/App.svelte")));
        assert!(options.handles_extension(Path::new("a/Post.svx")));
        assert!(!options.handles_extension(Path::new("a/main.js")));
        assert!(!options.handles_extension(Path::new("a/Makefile")));
    }

    #[test]
    fn test_wrong_type_is_an_error() {
        assert!(PluginOptions::from_value(json!({"emitCss": "yes"})).is_err());
    }
}
