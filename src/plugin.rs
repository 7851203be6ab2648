//! Plugin Surface
//!
//! The hooks a bundler calls: `build_start`, `resolve_id`, `load`, `transform`
//! and `finalize`. Per-unit state lives inside one `transform` call; the only
//! shared state is the [`BuildContext`], which is replaced at every build start.

use serde::Serialize;
use serde_json::Value;
use std::path::{Path, PathBuf};

use crate::compiler::{ComponentCompiler, Css, Diagnostic, PreprocessContext};
use crate::contract::OutputContract;
use crate::diagnostics::ExportDenials;
use crate::error::{ComposeError, Result};
use crate::extract::extract_subcomponents;
use crate::filter::PathFilter;
use crate::options::PluginOptions;
use crate::orchestrate::compile_unit;
use crate::reconcile::{deliver_warnings, reconcile_warnings, WarningHandler, SUBCOMPONENT_COMPILE_FAILED};
use crate::resolve::{resolve_package_entry, ManifestLocator, NodeModulesLocator, DEFAULT_MANIFEST_FIELD};
use crate::splice::splice_subcomponents;
use crate::styles::{emit_css_asset, merge_css, VirtualAssetCache};

/// State shared by every unit of one build.
#[derive(Debug, Default)]
pub struct BuildContext {
    pub assets: VirtualAssetCache,
    pub denials: ExportDenials,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransformOutput {
    pub code: String,
    pub map: Option<Value>,
    /// Files the host should watch, as reported by preprocessing.
    pub dependencies: Vec<PathBuf>,
    /// Warnings that reached the host channel.
    pub warnings: Vec<Diagnostic>,
}

pub struct ComposePlugin<C, L = NodeModulesLocator> {
    options: PluginOptions,
    compiler: C,
    locator: L,
    contract: OutputContract,
    manifest_field: String,
    filter: PathFilter,
    warning_handler: Option<Box<dyn WarningHandler>>,
    build: BuildContext,
}

impl<C: ComponentCompiler> ComposePlugin<C> {
    pub fn new(options: PluginOptions, compiler: C) -> Result<Self> {
        let filter = PathFilter::new(&options.include, &options.exclude)?;
        Ok(Self {
            options,
            compiler,
            locator: NodeModulesLocator,
            contract: OutputContract::default(),
            manifest_field: DEFAULT_MANIFEST_FIELD.to_string(),
            filter,
            warning_handler: None,
            build: BuildContext::default(),
        })
    }
}

impl<C: ComponentCompiler, L: ManifestLocator> ComposePlugin<C, L> {
    pub fn with_locator<M: ManifestLocator>(self, locator: M) -> ComposePlugin<C, M> {
        ComposePlugin {
            options: self.options,
            compiler: self.compiler,
            locator,
            contract: self.contract,
            manifest_field: self.manifest_field,
            filter: self.filter,
            warning_handler: self.warning_handler,
            build: self.build,
        }
    }

    pub fn with_contract(mut self, contract: OutputContract) -> Self {
        self.contract = contract;
        self
    }

    pub fn with_manifest_field(mut self, field: &str) -> Self {
        self.manifest_field = field.to_string();
        self
    }

    pub fn with_warning_handler(mut self, handler: impl WarningHandler + 'static) -> Self {
        self.warning_handler = Some(Box::new(handler));
        self
    }

    pub fn options(&self) -> &PluginOptions {
        &self.options
    }

    pub fn compiler(&self) -> &C {
        &self.compiler
    }

    pub fn build(&self) -> &BuildContext {
        &self.build
    }

    /// Drop everything the previous build cached.
    pub fn build_start(&mut self) {
        self.build = BuildContext::default();
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // RESOLVE / LOAD
    // ═══════════════════════════════════════════════════════════════════════════

    pub fn resolve_id(&self, specifier: &str, importer: Option<&Path>) -> Result<Option<String>> {
        if self.build.assets.contains(specifier) {
            return Ok(Some(specifier.to_string()));
        }
        let Some(importer) = importer else {
            return Ok(None);
        };
        let resolved = resolve_package_entry(
            specifier,
            importer,
            &self.locator,
            &self.manifest_field,
            &self.build.denials,
        )?;
        Ok(resolved.map(|path| path.to_string_lossy().into_owned()))
    }

    pub fn load(&self, id: &str) -> Option<Css> {
        self.build.assets.get(id)
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // TRANSFORM
    // ═══════════════════════════════════════════════════════════════════════════

    /// Compile one component source. Returns `None` for ids this plugin does
    /// not handle.
    pub async fn transform(&self, code: &str, id: &str) -> Result<Option<TransformOutput>> {
        let path = Path::new(id);
        if !self.filter.matches(id) || !self.options.handles_extension(path) {
            return Ok(None);
        }

        let mut dependencies = Vec::new();
        let mut input_map = None;
        let source = match &self.options.preprocess {
            Some(config) => {
                let context = PreprocessContext {
                    filename: path.to_path_buf(),
                };
                let processed = self
                    .compiler
                    .preprocess(code, config, &context)
                    .await
                    .map_err(|source| ComposeError::Preprocess {
                        file: id.to_string(),
                        source,
                    })?;
                dependencies = processed.dependencies;
                input_map = processed.map;
                processed.code
            }
            None => code.to_string(),
        };

        let extraction = extract_subcomponents(&source, path)?;
        let names: Vec<String> = extraction.specs.iter().map(|s| s.name.clone()).collect();

        let mut compile_options = self.options.compile_options(path);
        compile_options.sourcemap = input_map;
        let unit = compile_unit(&self.compiler, extraction, &compile_options)?;

        let name_refs: Vec<&str> = names.iter().map(String::as_str).collect();
        let mut warnings = reconcile_warnings(unit.parent.warnings.clone(), &name_refs);
        for child in &unit.children {
            let synthetic = child.spec.synthetic_filename.display().to_string();
            match &child.outcome {
                // Siblings are spliced into the same module, so references
                // between sub-components resolve too.
                Ok(module) => warnings.extend(
                    reconcile_warnings(module.warnings.clone(), &name_refs)
                        .into_iter()
                        .map(|mut w| {
                            w.filename.get_or_insert_with(|| synthetic.clone());
                            w
                        }),
                ),
                Err(e) => warnings.push(
                    Diagnostic::new(
                        SUBCOMPONENT_COMPILE_FAILED,
                        &format!("sub-component \"{}\" failed to compile: {}", child.spec.name, e),
                    )
                    .with_filename(&synthetic),
                ),
            }
        }

        let children = unit.compiled_children();
        let mut module = splice_subcomponents(&unit.parent, &children, &self.contract).map_err(
            |source| ComposeError::Contract {
                file: id.to_string(),
                source,
            },
        )?;

        if self.options.emit_css {
            let child_css = children.iter().filter_map(|c| c.module.css.as_ref());
            if let Some(css) = merge_css(unit.parent.css.as_ref(), child_css) {
                module = emit_css_asset(id, module, css, &self.build.assets);
            }
        }

        let warnings = deliver_warnings(
            warnings,
            !self.options.emit_css,
            self.warning_handler.as_deref(),
        );

        Ok(Some(TransformOutput {
            code: module.code,
            map: module.map,
            dependencies,
            warnings,
        }))
    }

    /// End of build: report packages whose manifest could not be read. Never
    /// fails the build.
    pub fn finalize(&self) -> Option<String> {
        self.build.denials.report(&self.manifest_field)
    }
}
