//! Deterministic stand-in for the component compiler.
//!
//! Emits modules shaped like the real compiler's output: one runtime import,
//! user imports, a `create_fragment`, a component class named after the file
//! and a default export. `<Name />` tags become `= new Name({ ... })` sites and
//! undeclared ones produce `missing-declaration` warnings. `<style>` content is
//! returned as CSS. A source containing `{#error}` fails to compile.

use lazy_static::lazy_static;
use regex::Regex;
use serde_json::Value;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::compiler::{
    CompileError, CompileOptions, CompiledModule, ComponentCompiler, Css, Diagnostic,
    PreprocessContext, Preprocessed,
};
use crate::reconcile::{CSS_UNUSED_SELECTOR, MISSING_DECLARATION};

lazy_static! {
    static ref COMPONENT_TAG_RE: Regex = Regex::new(r"<([A-Z][A-Za-z0-9]*)[\s/>]").unwrap();
    static ref ELEMENT_TAG_RE: Regex = Regex::new(r"<([a-z][a-z0-9]*)[\s/>]").unwrap();
    static ref STYLE_RE: Regex = Regex::new(r"(?s)<style[^>]*>(.*?)</style>").unwrap();
    static ref SCRIPT_IMPORT_RE: Regex =
        Regex::new(r#"import\s+([A-Za-z_$][\w$]*)\s+from\s+["']([^"']+)["'];?"#).unwrap();
}

#[derive(Debug, Default)]
pub struct StubCompiler {
    compiled: Mutex<Vec<PathBuf>>,
    /// Class name to emit instead of the file-derived one.
    symbol_override: Option<String>,
}

impl StubCompiler {
    /// A compiler that ignores the filename when naming components, to
    /// break the naming convention on purpose.
    pub fn with_symbol(symbol: &str) -> Self {
        Self {
            compiled: Mutex::default(),
            symbol_override: Some(symbol.to_string()),
        }
    }

    pub fn compiled_files(&self) -> Vec<PathBuf> {
        self.compiled.lock().map(|files| files.clone()).unwrap_or_default()
    }
}

pub fn component_name(filename: &Path) -> String {
    let stem = filename
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "Component".to_string());
    let mut chars = stem.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => "Component".to_string(),
    }
}

fn push_unique(list: &mut Vec<String>, value: &str) {
    if !list.iter().any(|v| v == value) {
        list.push(value.to_string());
    }
}

impl ComponentCompiler for StubCompiler {
    fn compile(
        &self,
        source: &str,
        options: &CompileOptions,
    ) -> Result<CompiledModule, CompileError> {
        if let Ok(mut files) = self.compiled.lock() {
            files.push(options.filename.clone());
        }
        let filename = options.filename.display().to_string();

        if source.contains("{#error}") {
            let mut err = CompileError::new("Unexpected block {#error}");
            err.filename = Some(filename);
            return Err(err);
        }

        let name = self
            .symbol_override
            .clone()
            .unwrap_or_else(|| component_name(&options.filename));

        let markup = STYLE_RE.replace_all(source, "");
        let user_imports: Vec<(String, String)> = SCRIPT_IMPORT_RE
            .captures_iter(source)
            .map(|caps| (caps[1].to_string(), caps[2].to_string()))
            .collect();

        let mut components = Vec::new();
        for caps in COMPONENT_TAG_RE.captures_iter(&markup) {
            push_unique(&mut components, &caps[1]);
        }
        let mut elements = Vec::new();
        for caps in ELEMENT_TAG_RE.captures_iter(&markup) {
            if &caps[1] != "script" {
                push_unique(&mut elements, &caps[1]);
            }
        }

        let mut runtime = vec![
            "SvelteComponent".to_string(),
            "init".to_string(),
            "safe_not_equal".to_string(),
        ];
        if !elements.is_empty() {
            push_unique(&mut runtime, "element");
            push_unique(&mut runtime, "insert");
        }
        if !components.is_empty() {
            push_unique(&mut runtime, "create_component");
            push_unique(&mut runtime, "mount_component");
        }
        if source.contains("on:click") {
            push_unique(&mut runtime, "listen");
        }

        let mut code = String::from("/* generated by stub compiler */\n");
        code.push_str(&format!(
            "import {{\n\t{}\n}} from \"svelte/internal\";\n",
            runtime.join(",\n\t")
        ));
        for (local, from) in &user_imports {
            code.push_str(&format!("import {} from \"{}\";\n", local, from));
        }

        code.push_str("\nfunction create_fragment(ctx) {\n");
        for (i, tag) in elements.iter().enumerate() {
            code.push_str(&format!("\tconst {}{} = element(\"{}\");\n", tag, i, tag));
        }
        for (i, component) in components.iter().enumerate() {
            code.push_str(&format!("\tlet c{};\n", i));
            code.push_str(&format!("\tc{} = new {}({{ props: {{}} }});\n", i, component));
        }
        code.push_str("\treturn {\n\t\tm(target, anchor) {\n");
        for (i, tag) in elements.iter().enumerate() {
            code.push_str(&format!("\t\t\tinsert(target, {}{}, anchor);\n", tag, i));
        }
        for i in 0..components.len() {
            code.push_str(&format!("\t\t\tmount_component(c{}, target, anchor);\n", i));
        }
        code.push_str("\t\t}\n\t};\n}\n\n");

        code.push_str(&format!(
            "class {name} extends SvelteComponent {{\n\tconstructor(options) {{\n\t\tsuper();\n\t\tinit(this, options, null, create_fragment, safe_not_equal, {{}});\n\t}}\n}}\n\nexport default {name};\n"
        ));

        let mut warnings = Vec::new();
        for component in &components {
            if !user_imports.iter().any(|(local, _)| local == component) {
                warnings.push(
                    Diagnostic::new(MISSING_DECLARATION, &format!("'{}' is not defined", component))
                        .with_filename(&filename),
                );
            }
        }

        let css = STYLE_RE
            .captures(source)
            .map(|caps| caps[1].trim().to_string())
            .filter(|code| !code.is_empty())
            .map(|code| {
                if code.contains(".unused") {
                    warnings.push(
                        Diagnostic::new(CSS_UNUSED_SELECTOR, "Unused CSS selector \".unused\"")
                            .with_filename(&filename),
                    );
                }
                Css { code, map: None }
            });

        Ok(CompiledModule {
            code,
            map: Some(serde_json::json!({ "version": 3, "mappings": "" })),
            css,
            warnings,
        })
    }

    /// `{"replace": [from, to], "dependencies": [...]}`
    fn preprocess(
        &self,
        source: &str,
        config: &Value,
        _context: &PreprocessContext,
    ) -> impl Future<Output = Result<Preprocessed, CompileError>> + Send {
        let result = match config.get("fail") {
            Some(Value::Bool(true)) => Err(CompileError::new("preprocessor exploded")),
            _ => {
                let mut code = source.to_string();
                if let Some([Value::String(from), Value::String(to)]) =
                    config.get("replace").and_then(Value::as_array).map(Vec::as_slice)
                {
                    code = code.replace(from.as_str(), to);
                }
                let dependencies = config
                    .get("dependencies")
                    .and_then(Value::as_array)
                    .map(|deps| {
                        deps.iter()
                            .filter_map(Value::as_str)
                            .map(PathBuf::from)
                            .collect()
                    })
                    .unwrap_or_default();
                Ok(Preprocessed {
                    code,
                    map: Some(serde_json::json!({ "version": 3, "sources": ["preprocessed"] })),
                    dependencies,
                })
            }
        };
        async move { result }
    }
}
