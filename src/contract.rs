//! Output Contract
//!
//! The linker works on the compiler's generated JavaScript as text. It relies
//! on a small number of structural facts about that output, all of which are
//! checked here and reported as a [`ContractViolation`] when they do not hold:
//!
//! 1. Exactly one named import from the runtime support module.
//! 2. A default export whose expression is a plain identifier.
//! 3. A sub-component compiled as `<Parent>__<Name>.ext` declares the symbol
//!    `<Parent>__<Name>`.
//! 4. No name is bound at module scope by two different imports.
//! 5. The spliced module still parses as an ES module.

use lazy_static::lazy_static;
use oxc_allocator::Allocator;
use oxc_parser::Parser;
use oxc_span::SourceType;
use regex::Regex;
use std::ops::Range;
use thiserror::Error;

pub const DEFAULT_RUNTIME_MODULE: &str = "svelte/internal";

lazy_static! {
    static ref NAMED_IMPORT_RE: Regex = Regex::new(
        r#"(?m)^[ \t]*import\s*\{(?P<names>[^}]*)\}\s*from\s*["'](?P<module>[^"']+)["'][ \t]*;?"#
    )
    .unwrap();

    static ref DEFAULT_EXPORT_RE: Regex =
        Regex::new(r"(?m)^[ \t]*export\s+default\s+(?P<expr>[^;\n]+);?").unwrap();

    static ref IDENT_RE: Regex = Regex::new(r"^[A-Za-z_$][A-Za-z0-9_$]*$").unwrap();

    static ref IMPORT_PARTS_RE: Regex = Regex::new(
        r#"(?s)^\s*import\s*(?:(?P<clause>[^;'"]*?)\s*from\s*)?["'](?P<source>[^"']+)["']"#
    )
    .unwrap();
}

// ═══════════════════════════════════════════════════════════════════════════════
// VIOLATIONS
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContractViolation {
    #[error("no import from \"{module}\" found")]
    MissingRuntimeImport { module: String },

    #[error("expected a single import from \"{module}\", found {count}")]
    MultipleRuntimeImports { module: String, count: usize },

    #[error("no default export found")]
    MissingDefaultExport,

    #[error("default export `{0}` is not a plain identifier")]
    InvalidExportBinding(String),

    #[error("the import from the runtime module comes after the default export")]
    MisorderedModule,

    #[error("expected the generated symbol `{0}`")]
    MissingGeneratedSymbol(String),

    #[error("`{0}` is already imported from another module")]
    DuplicateImportBinding(String),

    #[error("sub-component \"{name}\": {source}")]
    Child {
        name: String,
        #[source]
        source: Box<ContractViolation>,
    },

    #[error("spliced module is not valid JavaScript: {0}")]
    UnparsableOutput(String),
}

impl ContractViolation {
    pub fn in_child(self, name: &str) -> Self {
        ContractViolation::Child {
            name: name.to_string(),
            source: Box::new(self),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// LOCATED STATEMENTS
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeImport {
    /// Statement bytes, without the trailing newline.
    pub range: Range<usize>,
    /// Local binding names, in statement order.
    pub identifiers: Vec<String>,
}

impl RuntimeImport {
    pub fn binds(&self, identifier: &str) -> bool {
        self.identifiers.iter().any(|i| i == identifier)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefaultExport {
    pub range: Range<usize>,
    pub binding: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputContract {
    runtime_module: String,
}

impl Default for OutputContract {
    fn default() -> Self {
        Self::new(DEFAULT_RUNTIME_MODULE)
    }
}

impl OutputContract {
    pub fn new(runtime_module: &str) -> Self {
        Self {
            runtime_module: runtime_module.to_string(),
        }
    }

    pub fn runtime_module(&self) -> &str {
        &self.runtime_module
    }

    /// Locate the single named import from the runtime module.
    pub fn runtime_import(&self, code: &str) -> Result<RuntimeImport, ContractViolation> {
        let mut found = NAMED_IMPORT_RE
            .captures_iter(code)
            .filter(|caps| &caps["module"] == self.runtime_module);

        let Some(caps) = found.next() else {
            return Err(ContractViolation::MissingRuntimeImport {
                module: self.runtime_module.clone(),
            });
        };
        let extra = found.count();
        if extra > 0 {
            return Err(ContractViolation::MultipleRuntimeImports {
                module: self.runtime_module.clone(),
                count: extra + 1,
            });
        }

        let range = caps.get(0).map_or(0..0, |m| m.range());
        Ok(RuntimeImport {
            range,
            identifiers: parse_import_names(&caps["names"]),
        })
    }

    /// Locate the last default export and its binding.
    pub fn default_export(&self, code: &str) -> Result<DefaultExport, ContractViolation> {
        let caps = DEFAULT_EXPORT_RE
            .captures_iter(code)
            .last()
            .ok_or(ContractViolation::MissingDefaultExport)?;

        let binding = caps["expr"].trim().to_string();
        if !IDENT_RE.is_match(&binding) {
            return Err(ContractViolation::InvalidExportBinding(binding));
        }

        Ok(DefaultExport {
            range: caps.get(0).map_or(0..0, |m| m.range()),
            binding,
        })
    }

}

// ═══════════════════════════════════════════════════════════════════════════════
// STATIC IMPORTS
// ═══════════════════════════════════════════════════════════════════════════════

/// One local name introduced by an import. `imported` is `default` for a
/// default import and `*` for a namespace import.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportBinding {
    pub imported: String,
    pub local: String,
}

impl ImportBinding {
    pub fn new(imported: &str, local: &str) -> Self {
        Self {
            imported: imported.to_string(),
            local: local.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticImport {
    pub source: String,
    pub bindings: Vec<ImportBinding>,
}

impl StaticImport {
    /// `import A, { b as c } from "m";` -> source `m`, bindings `A`, `c`.
    /// A side-effect import has no bindings.
    pub fn parse(statement: &str) -> Option<Self> {
        let caps = IMPORT_PARTS_RE.captures(statement)?;
        let clause = caps.name("clause").map_or("", |m| m.as_str());
        Some(Self {
            source: caps["source"].to_string(),
            bindings: parse_import_clause(clause),
        })
    }

    pub fn render(&self) -> String {
        let mut default = None;
        let mut namespace = None;
        let mut named = Vec::new();
        for binding in &self.bindings {
            match binding.imported.as_str() {
                "default" => default = Some(binding.local.as_str()),
                "*" => namespace = Some(format!("* as {}", binding.local)),
                imported if imported == binding.local => named.push(binding.local.clone()),
                imported => named.push(format!("{} as {}", imported, binding.local)),
            }
        }

        let mut parts: Vec<String> = default.map(str::to_string).into_iter().collect();
        parts.extend(namespace);
        if !named.is_empty() {
            parts.push(format!("{{ {} }}", named.join(", ")));
        }

        if parts.is_empty() {
            format!("import \"{}\";", self.source)
        } else {
            format!("import {} from \"{}\";", parts.join(", "), self.source)
        }
    }
}

fn parse_import_clause(clause: &str) -> Vec<ImportBinding> {
    let mut bindings = Vec::new();
    let mut rest = clause.trim();

    if !rest.is_empty() && !rest.starts_with('{') && !rest.starts_with('*') {
        let (default, tail) = rest.split_once(',').unwrap_or((rest, ""));
        bindings.push(ImportBinding::new("default", default.trim()));
        rest = tail.trim();
    }

    if let Some(namespace) = rest.strip_prefix('*') {
        let namespace = namespace.trim();
        let local = namespace.strip_prefix("as").unwrap_or(namespace).trim();
        bindings.push(ImportBinding::new("*", local));
    } else if let Some(named) = rest.strip_prefix('{').and_then(|r| r.trim_end().strip_suffix('}')) {
        for specifier in named.split(',') {
            let specifier = specifier.trim();
            if specifier.is_empty() {
                continue;
            }
            let (imported, local) = specifier
                .split_once(" as ")
                .map_or((specifier, specifier), |(imported, local)| (imported.trim(), local.trim()));
            bindings.push(ImportBinding::new(imported, local));
        }
    }
    bindings
}

/// `a, b as c,\n d` -> `["a", "c", "d"]`
fn parse_import_names(names: &str) -> Vec<String> {
    let mut identifiers: Vec<String> = Vec::new();
    for specifier in names.split(',') {
        let specifier = specifier.trim();
        if specifier.is_empty() {
            continue;
        }
        let local = specifier
            .rsplit_once(" as ")
            .map_or(specifier, |(_, local)| local)
            .trim();
        if !identifiers.iter().any(|i| i == local) {
            identifiers.push(local.to_string());
        }
    }
    identifiers
}

/// Symbol the compiler generates for a sub-component file `<parent>__<name>`.
pub fn generated_symbol(parent_binding: &str, name: &str) -> String {
    format!("{}__{}", parent_binding, name)
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '$'
}

/// Whether `word` occurs in `code` delimited by non-identifier characters.
pub fn contains_word(code: &str, word: &str) -> bool {
    if word.is_empty() {
        return false;
    }
    code.match_indices(word).any(|(at, _)| {
        let before = code[..at].chars().next_back();
        let after = code[at + word.len()..].chars().next();
        !before.is_some_and(is_ident_char) && !after.is_some_and(is_ident_char)
    })
}

/// Parse `code` as an ES module and report every syntax error.
pub fn verify_module_syntax(code: &str) -> Result<(), ContractViolation> {
    let allocator = Allocator::default();
    let ret = Parser::new(&allocator, code, SourceType::mjs()).parse();
    if ret.panicked || !ret.errors.is_empty() {
        let detail = ret
            .errors
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("; ");
        return Err(ContractViolation::UnparsableOutput(detail));
    }
    Ok(())
}
