use regex::Regex;

use crate::error::{ComposeError, Result};

/// Include/exclude filtering of module ids by glob.
///
/// `**` spans directories, `*` and `?` stay inside one path segment. A
/// relative pattern may match at any directory depth, so `src/**/*.svelte`
/// also matches `/home/me/app/src/lib/Card.svelte`.
#[derive(Debug, Clone, Default)]
pub struct PathFilter {
    include: Vec<Regex>,
    exclude: Vec<Regex>,
}

impl PathFilter {
    pub fn new(include: &[String], exclude: &[String]) -> Result<Self> {
        Ok(Self {
            include: compile_globs(include)?,
            exclude: compile_globs(exclude)?,
        })
    }

    pub fn matches(&self, id: &str) -> bool {
        if id.contains('\0') {
            return false;
        }
        let id = id.replace('\\', "/");
        if !self.include.is_empty() && !self.include.iter().any(|re| re.is_match(&id)) {
            return false;
        }
        !self.exclude.iter().any(|re| re.is_match(&id))
    }
}

fn compile_globs(patterns: &[String]) -> Result<Vec<Regex>> {
    patterns
        .iter()
        .map(|pattern| {
            Regex::new(&glob_to_regex(pattern)).map_err(|source| ComposeError::InvalidPattern {
                pattern: pattern.clone(),
                source,
            })
        })
        .collect()
}

fn glob_to_regex(glob: &str) -> String {
    let glob = glob.replace('\\', "/");
    let mut out = String::from("^");
    if !glob.starts_with('/') && !glob.starts_with("**") {
        out.push_str("(?:.*/)?");
    }

    let mut chars = glob.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '*' if chars.peek() == Some(&'*') => {
                chars.next();
                if chars.peek() == Some(&'/') {
                    chars.next();
                    out.push_str("(?:.*/)?");
                } else {
                    out.push_str(".*");
                }
            }
            '*' => out.push_str("[^/]*"),
            '?' => out.push_str("[^/]"),
            c => out.push_str(&regex::escape(&c.to_string())),
        }
    }
    out.push('$');
    out
}
