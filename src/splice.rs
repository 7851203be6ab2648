//! Code Splicing Linker
//!
//! Merges each compiled sub-component into its parent's generated module. The
//! result is laid out as:
//!
//! ```text
//! import { ... } from "svelte/internal";          // parent, untouched
//! ...parent body...
//! /* compose: sub-components begin */
//! import Icon from "./Icon.svelte";               // hoisted child imports
//! // App.Card
//! import { listen } from "svelte/internal";       // only names App lacks
//! App.Card = (() => {
//! ...child body...
//! 	return App__Card;
//! })();
//! /* compose: sub-components end */
//!
//! export default App;
//! ```
//!
//! and every `= new Card({` in the merged code becomes `= new App.Card({`.

use lazy_static::lazy_static;
use regex::{Captures, Regex};
use std::collections::{HashMap, HashSet};

use crate::compiler::CompiledModule;
use crate::contract::{
    contains_word, generated_symbol, verify_module_syntax, ContractViolation, ImportBinding, OutputContract,
    StaticImport,
};

pub const INJECTED_BEGIN: &str = "/* compose: sub-components begin */";
pub const INJECTED_END: &str = "/* compose: sub-components end */";

lazy_static! {
    static ref INSTANTIATION_RE: Regex = Regex::new(
        r"(?P<prefix>=\s*new\s+)(?P<name>[A-Za-z_$][A-Za-z0-9_$]*)(?P<suffix>\s*\(\s*\{)"
    )
    .unwrap();

    static ref STATIC_IMPORT_RE: Regex = Regex::new(
        r#"(?m)^[ \t]*import(?:\s+[^;'"]*?\s+from)?\s*["'][^"']+["'][ \t]*;?[ \t]*\r?\n?"#
    )
    .unwrap();
}

/// A successfully compiled sub-component, ready to be spliced.
#[derive(Debug, Clone, Copy)]
pub struct ChildModule<'a> {
    pub name: &'a str,
    pub module: &'a CompiledModule,
}

/// Splice `children` into `parent`, in the given order.
///
/// Only `code` changes; the map, styles and warnings of the parent are carried
/// over as they are.
pub fn splice_subcomponents(
    parent: &CompiledModule,
    children: &[ChildModule],
    contract: &OutputContract,
) -> Result<CompiledModule, ContractViolation> {
    if children.is_empty() {
        return Ok(parent.clone());
    }

    let code = parent.code.as_str();
    let parent_import = contract.runtime_import(code)?;
    let export = contract.default_export(code)?;
    if parent_import.range.end > export.range.start {
        return Err(ContractViolation::MisorderedModule);
    }

    let binding = export.binding.as_str();
    let mut linker = Linker {
        contract,
        binding,
        parent_code: code,
        bound: HashMap::new(),
        hoisted: Vec::new(),
    };
    let parent_imports = std::iter::once(&code[parent_import.range.clone()])
        .chain(STATIC_IMPORT_RE.find_iter(code).map(|m| m.as_str()));
    for statement in parent_imports {
        if let Some(import) = StaticImport::parse(statement) {
            linker.bind_all(&import);
        }
    }

    let mut blocks = Vec::with_capacity(children.len());
    for child in children {
        let block = linker
            .wrap_child(child)
            .map_err(|violation| violation.in_child(child.name))?;
        blocks.push(block);
    }

    let mut injected = String::new();
    injected.push_str(INJECTED_BEGIN);
    injected.push('\n');
    for statement in &linker.hoisted {
        injected.push_str(statement);
        injected.push('\n');
    }
    injected.push_str(&blocks.join("\n\n"));
    injected.push('\n');
    injected.push_str(INJECTED_END);
    injected.push_str("\n\n");

    let mut spliced = String::with_capacity(code.len() + injected.len());
    spliced.push_str(&code[..export.range.start]);
    spliced.push_str(&injected);
    spliced.push_str(&code[export.range.start..]);

    let names: HashSet<&str> = children.iter().map(|c| c.name).collect();
    let spliced = rewrite_instantiations(&spliced, binding, &names);

    verify_module_syntax(&spliced)?;

    log::debug!(
        "spliced {} sub-component(s) into {} ({} -> {} bytes)",
        children.len(),
        binding,
        code.len(),
        spliced.len()
    );

    Ok(CompiledModule {
        code: spliced,
        ..parent.clone()
    })
}

struct Linker<'a> {
    contract: &'a OutputContract,
    binding: &'a str,
    parent_code: &'a str,
    /// Module-scope import bindings so far: local name -> (source, imported).
    bound: HashMap<String, (String, String)>,
    hoisted: Vec<String>,
}

impl Linker<'_> {
    fn bind_all(&mut self, import: &StaticImport) {
        for binding in &import.bindings {
            self.bound
                .entry(binding.local.clone())
                .or_insert_with(|| (import.source.clone(), binding.imported.clone()));
        }
    }

    /// Bindings of `import` that are not bound yet. A local name already bound
    /// to something else is a conflict.
    fn unbound(&mut self, import: &StaticImport) -> Result<Vec<ImportBinding>, ContractViolation> {
        let mut fresh = Vec::new();
        for binding in &import.bindings {
            match self.bound.get(&binding.local).cloned() {
                Some((source, imported)) if source == import.source && imported == binding.imported => {}
                Some(_) => return Err(ContractViolation::DuplicateImportBinding(binding.local.clone())),
                None => {
                    self.bound.insert(
                        binding.local.clone(),
                        (import.source.clone(), binding.imported.clone()),
                    );
                    fresh.push(binding.clone());
                }
            }
        }
        Ok(fresh)
    }

    fn wrap_child(&mut self, child: &ChildModule) -> Result<String, ContractViolation> {
        let code = child.module.code.as_str();
        let import = self.contract.runtime_import(code)?;
        let export = self.contract.default_export(code)?;
        if import.range.end > export.range.start {
            return Err(ContractViolation::MisorderedModule);
        }

        let symbol = generated_symbol(self.binding, child.name);
        if export.binding != symbol {
            return Err(ContractViolation::MissingGeneratedSymbol(symbol));
        }

        let (statements, body) = split_static_imports(&code[import.range.end..export.range.start]);
        if !contains_word(&body, &symbol) {
            return Err(ContractViolation::MissingGeneratedSymbol(symbol));
        }

        for statement in statements {
            match StaticImport::parse(&statement) {
                Some(parsed) if !parsed.bindings.is_empty() => {
                    let fresh = self.unbound(&parsed)?;
                    if !fresh.is_empty() {
                        self.hoisted.push(
                            StaticImport {
                                source: parsed.source,
                                bindings: fresh,
                            }
                            .render(),
                        );
                    }
                }
                _ => {
                    if !self.parent_code.contains(&statement) && !self.hoisted.contains(&statement) {
                        self.hoisted.push(statement);
                    }
                }
            }
        }

        let runtime = StaticImport::parse(&code[import.range.clone()]).unwrap_or_else(|| StaticImport {
            source: self.contract.runtime_module().to_string(),
            bindings: import
                .identifiers
                .iter()
                .map(|identifier| ImportBinding::new(identifier, identifier))
                .collect(),
        });
        let extra = self.unbound(&runtime)?;

        let mut block = format!("// {}.{}\n", self.binding, child.name);
        if !extra.is_empty() {
            let statement = StaticImport {
                source: runtime.source,
                bindings: extra,
            };
            block.push_str(&statement.render());
            block.push('\n');
        }
        block.push_str(&format!(
            "{}.{} = (() => {{\n{}\n\treturn {};\n}})();",
            self.binding,
            child.name,
            body.trim_matches(|c| c == '\n' || c == '\r'),
            symbol
        ));
        Ok(block)
    }
}

/// Pull top-level static import statements out of a child body.
fn split_static_imports(body: &str) -> (Vec<String>, String) {
    let statements = STATIC_IMPORT_RE
        .find_iter(body)
        .map(|m| m.as_str().trim().to_string())
        .collect();
    let rest = STATIC_IMPORT_RE.replace_all(body, "").into_owned();
    (statements, rest)
}

/// `= new Card({` -> `= new App.Card({` for every name in `names`.
/// Textual: a match inside a string literal is rewritten too.
pub fn rewrite_instantiations(code: &str, binding: &str, names: &HashSet<&str>) -> String {
    INSTANTIATION_RE
        .replace_all(code, |caps: &Captures| {
            if names.contains(&caps["name"]) {
                format!(
                    "{}{}.{}{}",
                    &caps["prefix"], binding, &caps["name"], &caps["suffix"]
                )
            } else {
                caps[0].to_string()
            }
        })
        .into_owned()
}
