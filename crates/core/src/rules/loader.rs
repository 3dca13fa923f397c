use crate::error::{ColligoError, Result};
use crate::rules::parser::ConfigParser;
use crate::rules::tables::RuleTables;
use std::path::{Path, PathBuf};
use tracing::debug;

/// File name looked up in the user configuration directory.
pub const RULES_FILE_NAME: &str = "rules.txt";

/// Loads operator rule files and layers them over the compiled-in tables.
#[derive(Debug, Clone, Default)]
pub struct ConfigLoader {
    /// Explicit rules file; must exist when set
    path: Option<PathBuf>,
    /// Skip the compiled-in tables
    skip_predefined: bool,
}

impl ConfigLoader {
    /// Create a loader that reads the default rules file if present
    pub fn new() -> Self {
        Self::default()
    }

    /// Use an explicit rules file
    pub fn with_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.path = Some(path.as_ref().to_path_buf());
        self
    }

    /// Only use rules from the file
    pub fn without_predefined(mut self) -> Self {
        self.skip_predefined = true;
        self
    }

    /// Default rules file (`<config dir>/colligo/rules.txt`)
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("colligo").join(RULES_FILE_NAME))
    }

    /// Load the rule tables.
    ///
    /// File entries come first, so they shadow compiled-in entries for the
    /// same domain.
    pub fn load(&self) -> Result<RuleTables> {
        let mut tables = match &self.path {
            Some(path) => {
                if !path.exists() {
                    return Err(ColligoError::FileNotFound(path.clone()));
                }
                ConfigParser::parse_file(path)?
            }
            None => match Self::default_path() {
                Some(path) if path.exists() => {
                    debug!(path = %path.display(), "Loading rules file");
                    ConfigParser::parse_file(&path)?
                }
                _ => RuleTables::new(),
            },
        };

        if !self.skip_predefined {
            tables.merge(RuleTables::predefined());
        }

        Ok(tables)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_load_explicit_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("rules.txt");
        fs::write(&path, "scraper(npr.org): article\n").unwrap();

        let tables = ConfigLoader::new().with_path(&path).load().unwrap();

        assert_eq!(tables.scraper_rule("www.npr.org"), Some("article"));
        assert_eq!(tables.scraper_rule("lemonde.fr"), Some("article"));
    }

    #[test]
    fn test_load_without_predefined() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("rules.txt");
        fs::write(&path, "rewrite(example.org): nl2br\n").unwrap();

        let tables = ConfigLoader::new().with_path(&path).without_predefined().load().unwrap();

        assert_eq!(tables.rewrite_len(), 1);
        assert_eq!(tables.scraper_len(), 0);
    }

    #[test]
    fn test_missing_explicit_file() {
        let result = ConfigLoader::new().with_path("/nonexistent/rules.txt").load();
        assert!(matches!(result, Err(ColligoError::FileNotFound(_))));
    }

    #[test]
    fn test_default_path_file_name() {
        if let Some(path) = ConfigLoader::default_path() {
            assert!(path.ends_with("colligo/rules.txt"));
        }
    }
}
