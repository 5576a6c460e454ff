use crate::annotations::{Dialect, DialectSelection};
use crate::parser::ParsedFile;
use log::{debug, warn};
use std::collections::BTreeSet;

/// Detects which decorator dialects a project imports.
///
/// The `DialectDetector` looks at the `import ... from '<module>'` statements of
/// every parsed file and matches the module names against each dialect's
/// packages:
/// - NestJS (`@nestjs/common`, `@nestjs/swagger`)
/// - routing-controllers (`routing-controllers`)
///
/// Detection is diagnostic only. Which dialects are used for matching is always
/// decided by the configuration.
pub struct DialectDetector;

/// Result of dialect detection.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DetectionResult {
    /// Detected dialects, in registry order
    pub dialects: Vec<Dialect>,
}

impl DialectDetector {
    /// Detects the dialects imported by the provided files.
    ///
    /// # Arguments
    ///
    /// * `parsed_files` - Parsed TypeScript files to inspect
    ///
    /// # Example
    ///
    /// ```
    /// use openapi_from_decorators::detector::DialectDetector;
    /// use openapi_from_decorators::parser::AstParser;
    /// use std::path::Path;
    ///
    /// let parsed = AstParser::parse_source(
    ///     Path::new("app.ts"),
    ///     "import { Controller } from '@nestjs/common';",
    /// )
    /// .unwrap();
    /// let result = DialectDetector::detect(&[parsed]);
    /// assert_eq!(result.dialects.len(), 1);
    /// ```
    pub fn detect(parsed_files: &[ParsedFile]) -> DetectionResult {
        debug!("Detecting decorator dialects in {} files", parsed_files.len());

        let mut detected = BTreeSet::new();
        for parsed_file in parsed_files {
            for module in &parsed_file.syntax_tree.imports {
                for dialect in Dialect::ALL {
                    if dialect.modules().iter().any(|m| imports_module(module, m)) {
                        detected.insert(dialect);
                    }
                }
            }
        }

        let dialects: Vec<Dialect> = detected.into_iter().collect();
        debug!("Detected dialects: {:?}", dialects);
        DetectionResult { dialects }
    }
}

/// `@nestjs/common` also matches deep imports such as `@nestjs/common/decorators`.
fn imports_module(import: &str, module: &str) -> bool {
    import == module
        || import
            .strip_prefix(module)
            .is_some_and(|rest| rest.starts_with('/'))
}

impl DetectionResult {
    /// Detected dialects the selection leaves inactive.
    pub fn inactive(&self, selection: &DialectSelection) -> Vec<Dialect> {
        self.dialects
            .iter()
            .copied()
            .filter(|dialect| !selection.is_active(*dialect))
            .collect()
    }

    /// Warns once per imported dialect that the configuration does not enable.
    pub fn warn_inactive(&self, selection: &DialectSelection) {
        for dialect in self.inactive(selection) {
            warn!(
                "Sources import {} decorators but the '{}' dialect is not enabled; its decorators are ignored",
                dialect, dialect
            );
        }
    }
}
