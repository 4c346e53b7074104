use regex::Regex;
use std::path::Path;

use crate::error::ConfigError;

/// Exclusion rules for one root: root-specific patterns plus the global ones.
///
/// Files are matched on their root-relative name (`/` separated). Directories
/// are matched on their base name and on their root-relative name, so both
/// `^node_modules$` and `^photos/cache$` style rules work.
#[derive(Debug, Clone, Default)]
pub struct PathMatcher {
    patterns: Vec<Regex>,
}

impl PathMatcher {
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> Result<Self, ConfigError> {
        let patterns = patterns
            .iter()
            .map(|pattern| {
                Regex::new(pattern.as_ref()).map_err(|source| ConfigError::InvalidPattern {
                    pattern: pattern.as_ref().to_string(),
                    source,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { patterns })
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    pub fn patterns(&self) -> impl Iterator<Item = &str> {
        self.patterns.iter().map(Regex::as_str)
    }

    pub fn should_exclude_dir(&self, relative_name: &str) -> bool {
        let base_name = Path::new(relative_name)
            .file_name()
            .map(|name| name.to_string_lossy())
            .unwrap_or_default();
        self.patterns
            .iter()
            .any(|pattern| pattern.is_match(&base_name) || pattern.is_match(relative_name))
    }

    pub fn should_exclude_file(&self, relative_name: &str) -> bool {
        self.patterns
            .iter()
            .any(|pattern| pattern.is_match(relative_name))
    }
}
