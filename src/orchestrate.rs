//! Dual Compilation
//!
//! One compile for the parent, one per sub-component. A parent failure aborts
//! the unit; a sub-component failure is kept next to its spec and the unit
//! carries on without it.

use rayon::prelude::*;

use crate::compiler::{CompileError, CompileOptions, CompiledModule, ComponentCompiler};
use crate::error::{ComposeError, Result};
use crate::extract::{Extraction, SubcomponentSpec};
use crate::options::PREFIX;
use crate::splice::ChildModule;

#[derive(Debug)]
pub struct ChildCompilation {
    pub spec: SubcomponentSpec,
    pub outcome: std::result::Result<CompiledModule, CompileError>,
}

#[derive(Debug)]
pub struct UnitCompilation {
    pub parent: CompiledModule,
    /// In source order.
    pub children: Vec<ChildCompilation>,
}

impl UnitCompilation {
    /// Children that compiled, ready for the linker.
    pub fn compiled_children(&self) -> Vec<ChildModule<'_>> {
        self.children
            .iter()
            .filter_map(|child| {
                child.outcome.as_ref().ok().map(|module| ChildModule {
                    name: &child.spec.name,
                    module,
                })
            })
            .collect()
    }

    pub fn failures(&self) -> impl Iterator<Item = (&SubcomponentSpec, &CompileError)> {
        self.children
            .iter()
            .filter_map(|child| child.outcome.as_ref().err().map(|e| (&child.spec, e)))
    }
}

pub fn compile_unit<C: ComponentCompiler>(
    compiler: &C,
    extraction: Extraction,
    options: &CompileOptions,
) -> Result<UnitCompilation> {
    let parent = compiler
        .compile(&extraction.source, options)
        .map_err(|source| ComposeError::ParentCompile {
            file: options.filename.display().to_string(),
            source,
        })?;

    let children = extraction
        .specs
        .into_par_iter()
        .map(|spec| {
            let child_options = options.for_file(spec.synthetic_filename.clone());
            let outcome = compiler.compile(&spec.body, &child_options);
            if let Err(e) = &outcome {
                log::warn!(
                    "{} sub-component {} in {} failed to compile and will be left out: {}",
                    PREFIX,
                    spec.name,
                    options.filename.display(),
                    e
                );
            }
            ChildCompilation { spec, outcome }
        })
        .collect();

    Ok(UnitCompilation { parent, children })
}
