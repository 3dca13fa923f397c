use crate::error::{ColligoError, Result};
use crate::rules::directives::parse_directive;
use crate::rules::tables::RuleTables;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Rules file parser
#[derive(Debug)]
pub struct ConfigParser;

impl ConfigParser {
    /// Parse a rules file
    pub fn parse_file<P: AsRef<Path>>(path: P) -> Result<RuleTables> {
        let file = std::fs::File::open(&path).map_err(|e| {
            ColligoError::RuleConfigError(format!("Cannot open file {}: {}", path.as_ref().display(), e))
        })?;

        Self::parse_reader(BufReader::new(file))
    }

    /// Parse rules from a reader
    pub fn parse_reader<R: BufRead>(reader: R) -> Result<RuleTables> {
        let mut tables = RuleTables::new();

        for (index, line) in reader.lines().enumerate() {
            let line = line
                .map_err(|e| ColligoError::RuleConfigError(format!("Read error at line {}: {}", index + 1, e)))?;
            Self::parse_line(&mut tables, &line, index + 1)?;
        }

        Ok(tables)
    }

    /// Parse rules from a string
    pub fn parse_str(content: &str) -> Result<RuleTables> {
        let mut tables = RuleTables::new();

        for (index, line) in content.lines().enumerate() {
            Self::parse_line(&mut tables, line, index + 1)?;
        }

        Ok(tables)
    }

    fn parse_line(tables: &mut RuleTables, line: &str, line_number: usize) -> Result<()> {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            return Ok(());
        }

        let directive = parse_directive(line)
            .map_err(|e| ColligoError::RuleConfigError(format!("Parse error at line {}: {}", line_number, e)))?;
        tables.add_directive(directive);
        Ok(())
    }
}
