//! Diagnostic Reconciler
//!
//! The parent is compiled without its sub-components, so the compiler reports
//! every `<Card />` it cannot see a declaration for. Those warnings are false
//! positives once `Card` is spliced back in and are dropped here.

use lazy_static::lazy_static;
use regex::Regex;

use crate::compiler::Diagnostic;

pub const MISSING_DECLARATION: &str = "missing-declaration";
pub const CSS_UNUSED_SELECTOR: &str = "css-unused-selector";
pub const SUBCOMPONENT_COMPILE_FAILED: &str = "subcomponent-compile-failed";

lazy_static! {
    static ref UNDECLARED_RE: Regex = Regex::new(r"^'([^']+)' is not defined").unwrap();
}

/// Identifier named by an undeclared-reference warning.
pub fn undeclared_name(diagnostic: &Diagnostic) -> Option<&str> {
    if diagnostic.code != MISSING_DECLARATION {
        return None;
    }
    UNDECLARED_RE
        .captures(&diagnostic.message)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Drop undeclared-reference warnings for sub-component names. Everything
/// else, positions included, is left as it was.
pub fn reconcile_warnings(warnings: Vec<Diagnostic>, names: &[&str]) -> Vec<Diagnostic> {
    warnings
        .into_iter()
        .filter(|warning| !undeclared_name(warning).is_some_and(|name| names.contains(&name)))
        .collect()
}

// ═══════════════════════════════════════════════════════════════════════════════
// DELIVERY
// ═══════════════════════════════════════════════════════════════════════════════

/// Caller-supplied warning hook. `forward` hands a warning on to the host's
/// own channel; a handler that never calls it swallows the warning.
pub trait WarningHandler: Send + Sync {
    fn handle(&self, warning: Diagnostic, forward: &mut dyn FnMut(Diagnostic));
}

impl<F> WarningHandler for F
where
    F: Fn(Diagnostic, &mut dyn FnMut(Diagnostic)) + Send + Sync,
{
    fn handle(&self, warning: Diagnostic, forward: &mut dyn FnMut(Diagnostic)) {
        self(warning, forward)
    }
}

/// Route warnings through `handler` (or straight to the host) and return what
/// reached the host. Unused-selector warnings are dropped first when style
/// emission is off for the build.
pub fn deliver_warnings(
    warnings: Vec<Diagnostic>,
    styles_disabled: bool,
    handler: Option<&dyn WarningHandler>,
) -> Vec<Diagnostic> {
    let mut delivered = Vec::new();
    for warning in warnings {
        if styles_disabled && warning.code == CSS_UNUSED_SELECTOR {
            continue;
        }
        match handler {
            Some(handler) => handler.handle(warning, &mut |w: Diagnostic| delivered.push(w)),
            None => delivered.push(warning),
        }
    }

    for warning in &delivered {
        match &warning.filename {
            Some(file) => log::warn!("{}: ({}) {}", file, warning.code, warning.message),
            None => log::warn!("({}) {}", warning.code, warning.message),
        }
    }
    delivered
}
