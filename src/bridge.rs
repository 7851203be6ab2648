//! Native entry points for a JavaScript bundler plugin that owns the real
//! compiler and hands the text transformations to this crate.

use napi_derive::napi;
use std::path::Path;

use crate::compiler::{CompiledModule, Diagnostic};
use crate::contract::{OutputContract, DEFAULT_RUNTIME_MODULE};
use crate::extract::extract_subcomponents;
use crate::reconcile::reconcile_warnings;
use crate::splice::{splice_subcomponents, ChildModule};

#[napi(object)]
pub struct SubcomponentJs {
    pub name: String,
    pub body: String,
    pub synthetic_filename: String,
}

#[napi(object)]
pub struct ExtractionJs {
    pub code: String,
    pub subcomponents: Vec<SubcomponentJs>,
}

#[napi(object)]
pub struct ChildModuleJs {
    pub name: String,
    pub code: String,
}

#[napi]
pub fn compose_bridge() -> String {
    "Compose Native Bridge Connected".to_string()
}

#[napi]
pub fn extract_subcomponents_native(source: String, filename: String) -> napi::Result<ExtractionJs> {
    let extraction = extract_subcomponents(&source, Path::new(&filename))
        .map_err(|e| napi::Error::from_reason(e.to_string()))?;

    Ok(ExtractionJs {
        code: extraction.source,
        subcomponents: extraction
            .specs
            .into_iter()
            .map(|spec| SubcomponentJs {
                name: spec.name,
                body: spec.body,
                synthetic_filename: spec.synthetic_filename.to_string_lossy().into_owned(),
            })
            .collect(),
    })
}

#[napi]
pub fn splice_subcomponents_native(
    parent_code: String,
    children: Vec<ChildModuleJs>,
    runtime_module: Option<String>,
) -> napi::Result<String> {
    let contract = OutputContract::new(runtime_module.as_deref().unwrap_or(DEFAULT_RUNTIME_MODULE));
    let parent = CompiledModule {
        code: parent_code,
        ..Default::default()
    };
    let modules: Vec<CompiledModule> = children
        .iter()
        .map(|child| CompiledModule {
            code: child.code.clone(),
            ..Default::default()
        })
        .collect();
    let linked: Vec<ChildModule> = children
        .iter()
        .zip(&modules)
        .map(|(child, module)| ChildModule {
            name: &child.name,
            module,
        })
        .collect();

    splice_subcomponents(&parent, &linked, &contract)
        .map(|module| module.code)
        .map_err(|e| napi::Error::from_reason(e.to_string()))
}

#[napi]
pub fn reconcile_warnings_native(
    warnings: serde_json::Value,
    names: Vec<String>,
) -> napi::Result<serde_json::Value> {
    let warnings: Vec<Diagnostic> = serde_json::from_value(warnings)
        .map_err(|e| napi::Error::from_reason(format!("Invalid warnings: {}", e)))?;
    let names: Vec<&str> = names.iter().map(String::as_str).collect();
    serde_json::to_value(reconcile_warnings(warnings, &names))
        .map_err(|e| napi::Error::from_reason(e.to_string()))
}
