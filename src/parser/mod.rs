//! TypeScript source parsing.
//!
//! The parser understands the declaration subset of TypeScript that carries
//! endpoint and model information: decorated classes, interfaces, type aliases,
//! enums and namespaces, together with their JSDoc comments. Function and method
//! bodies are skipped.

pub mod ast;
pub mod jsdoc;
pub mod lexer;
mod ts;

use crate::error::{GenerateError, Result};
use log::{debug, warn};
use std::fs;
use std::path::{Path, PathBuf};

pub use ts::SyntaxError;

/// Parser for TypeScript source files.
///
/// # Example
///
/// ```no_run
/// use openapi_from_decorators::parser::AstParser;
/// use std::path::Path;
///
/// let parsed = AstParser::parse_file(Path::new("src/users.controller.ts")).unwrap();
/// println!("Parsed {} declarations", parsed.syntax_tree.statements.len());
/// ```
pub struct AstParser;

/// A successfully parsed TypeScript file with its syntax tree.
#[derive(Debug, Clone)]
pub struct ParsedFile {
    /// Path to the source file
    pub path: PathBuf,
    /// The parsed declarations
    pub syntax_tree: ast::SourceFile,
}

impl AstParser {
    /// Parses a single TypeScript source file.
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the `.ts` file to parse
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The file cannot be read
    /// - The file contains a syntax error inside a declaration
    pub fn parse_file(path: &Path) -> Result<ParsedFile> {
        debug!("Parsing file: {}", path.display());

        let content = fs::read_to_string(path)?;
        let parsed = Self::parse_source(path, &content)?;

        debug!(
            "Successfully parsed file: {} ({} declarations)",
            path.display(),
            parsed.syntax_tree.statements.len()
        );
        Ok(parsed)
    }

    /// Parses source text that is already in memory.
    ///
    /// `path` is only used to label the result and error messages.
    pub fn parse_source(path: &Path, source: &str) -> Result<ParsedFile> {
        let syntax_tree = ts::parse_source(source).map_err(|e| GenerateError::Parse {
            file: path.to_path_buf(),
            line: e.line,
            message: e.message,
        })?;

        Ok(ParsedFile {
            path: path.to_path_buf(),
            syntax_tree,
        })
    }

    /// Parses multiple TypeScript files, returning one result per input path.
    ///
    /// Failures are logged but do not stop the remaining files from being parsed;
    /// callers decide whether a single failure aborts the run.
    pub fn parse_files(paths: &[PathBuf]) -> Vec<Result<ParsedFile>> {
        debug!("Parsing {} files", paths.len());

        let results: Vec<Result<ParsedFile>> = paths
            .iter()
            .map(|path| match Self::parse_file(path) {
                Ok(parsed) => Ok(parsed),
                Err(e) => {
                    warn!("Failed to parse {}: {}", path.display(), e);
                    Err(e)
                }
            })
            .collect();

        let success_count = results.iter().filter(|r| r.is_ok()).count();
        debug!(
            "Parsing complete: {} succeeded, {} failed",
            success_count,
            results.len() - success_count
        );

        results
    }
}
