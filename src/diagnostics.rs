//! Build-wide tally of packages whose manifest could not be read because
//! their `exports` map hides it. Reported once when the build is finalized.

use dashmap::DashSet;

use crate::options::PREFIX;

#[derive(Debug, Default)]
pub struct ExportDenials {
    packages: DashSet<String>,
}

impl ExportDenials {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, package: &str) {
        self.packages.insert(package.to_string());
    }

    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }

    /// Recorded package names, sorted.
    pub fn packages(&self) -> Vec<String> {
        let mut packages: Vec<String> = self.packages.iter().map(|p| p.key().clone()).collect();
        packages.sort();
        packages
    }

    pub fn summary(&self, manifest_field: &str) -> Option<String> {
        if self.is_empty() {
            return None;
        }
        let mut text = format!(
            "{} The following packages did not export their `package.json` file so we could not check the \"{}\" field. If you had difficulties importing components from a package, then please contact the author and ask them to export the package.json file.\n",
            PREFIX, manifest_field
        );
        for package in self.packages() {
            text.push_str(&format!("- {}\n", package));
        }
        Some(text)
    }

    /// Log the summary, if there is anything to say, and return it.
    pub fn report(&self, manifest_field: &str) -> Option<String> {
        let summary = self.summary(manifest_field)?;
        log::warn!("{}", summary);
        Some(summary)
    }
}
