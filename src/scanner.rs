use crate::error::{GenerateError, Result};
use glob::Pattern;
use log::{debug, warn};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Source file discovery from entry glob patterns.
///
/// Each entry pattern is expanded relative to the root directory. Matched files
/// are taken as they are; matched directories are walked for `.ts` files,
/// skipping `node_modules`, hidden directories and declaration files (`.d.ts`).
/// The result is deduplicated, sorted and filtered by the ignore and allow
/// patterns.
///
/// # Example
///
/// ```no_run
/// use openapi_from_decorators::scanner::FileScanner;
/// use std::path::PathBuf;
///
/// let scanner = FileScanner::new(PathBuf::from("./my-api"), vec!["src/**/*.controller.ts".into()]);
/// let result = scanner.scan().unwrap();
/// println!("Found {} source files", result.source_files.len());
/// ```
pub struct FileScanner {
    root_path: PathBuf,
    entry_patterns: Vec<String>,
    ignore: Vec<String>,
    allow: Vec<String>,
}

/// Result of a scan.
pub struct ScanResult {
    /// Source files in path order, without duplicates
    pub source_files: Vec<PathBuf>,
    /// Warning messages for any issues encountered (e.g., unreadable directories)
    pub warnings: Vec<String>,
}

impl FileScanner {
    /// Creates a scanner for the given root directory and entry patterns.
    ///
    /// # Arguments
    ///
    /// * `root_path` - Directory that relative patterns are resolved against
    /// * `entry_patterns` - Glob patterns naming files or directories to analyze
    pub fn new(root_path: PathBuf, entry_patterns: Vec<String>) -> Self {
        Self {
            root_path,
            entry_patterns,
            ignore: Vec::new(),
            allow: Vec::new(),
        }
    }

    /// Sets the ignore and allow filters.
    ///
    /// A file matching an ignore pattern is dropped unless it also matches an
    /// allow pattern.
    pub fn with_filters(mut self, ignore: Vec<String>, allow: Vec<String>) -> Self {
        self.ignore = ignore;
        self.allow = allow;
        self
    }

    /// Expands the entry patterns and collects the source files.
    ///
    /// # Errors
    ///
    /// Returns an error if an entry, ignore or allow pattern is not a valid glob.
    pub fn scan(&self) -> Result<ScanResult> {
        let ignore = compile_patterns(&self.ignore)?;
        let allow = compile_patterns(&self.allow)?;

        let mut source_files = Vec::new();
        let mut warnings = Vec::new();
        let mut seen = HashSet::new();

        for entry_pattern in &self.entry_patterns {
            let full_pattern = self.root_path.join(entry_pattern);
            let full_pattern = full_pattern.to_string_lossy();
            debug!("Expanding entry pattern: {}", full_pattern);

            let paths = glob::glob(&full_pattern).map_err(|e| GenerateError::Glob {
                pattern: entry_pattern.clone(),
                message: e.to_string(),
            })?;

            let mut matched = 0usize;
            for path in paths {
                match path {
                    Ok(path) => {
                        for file in self.expand(&path, &mut warnings) {
                            matched += 1;
                            if !self.is_filtered_out(&file, &ignore, &allow)
                                && seen.insert(file.clone())
                            {
                                source_files.push(file);
                            }
                        }
                    }
                    Err(e) => {
                        let warning = format!("Failed to access path: {}", e);
                        warn!("{}", warning);
                        warnings.push(warning);
                    }
                }
            }

            if matched == 0 {
                let warning = format!("Entry pattern '{}' matched no source files", entry_pattern);
                warn!("{}", warning);
                warnings.push(warning);
            }
        }

        source_files.sort();
        debug!("Discovered {} source files", source_files.len());
        Ok(ScanResult {
            source_files,
            warnings,
        })
    }

    /// A matched file itself, or the `.ts` files below a matched directory.
    fn expand(&self, path: &Path, warnings: &mut Vec<String>) -> Vec<PathBuf> {
        if path.is_file() {
            return vec![path.to_path_buf()];
        }

        let mut files = Vec::new();
        for entry in WalkDir::new(path)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| {
                // Don't filter the matched directory itself
                if e.path() == path {
                    return true;
                }
                let file_name = e.file_name().to_string_lossy();
                !file_name.starts_with('.') && file_name != "node_modules"
            })
        {
            match entry {
                Ok(entry) => {
                    let entry_path = entry.path();
                    if entry_path.is_file() && is_source_file(entry_path) {
                        files.push(entry_path.to_path_buf());
                    }
                }
                Err(e) => {
                    let warning = format!("Failed to access path: {}", e);
                    warn!("{}", warning);
                    warnings.push(warning);
                }
            }
        }
        files
    }

    fn is_filtered_out(&self, file: &Path, ignore: &[Pattern], allow: &[Pattern]) -> bool {
        let relative = file.strip_prefix(&self.root_path).unwrap_or(file);
        let matches = |patterns: &[Pattern]| {
            patterns
                .iter()
                .any(|p| p.matches_path(relative) || p.matches_path(file))
        };

        if matches(ignore) {
            if matches(allow) {
                debug!("Allowing ignored file: {}", file.display());
                return false;
            }
            debug!("Ignoring file: {}", file.display());
            return true;
        }
        false
    }
}

fn is_source_file(path: &Path) -> bool {
    let name = path.file_name().and_then(|n| n.to_str()).unwrap_or_default();
    name.ends_with(".ts") && !name.ends_with(".d.ts")
}

fn compile_patterns(patterns: &[String]) -> Result<Vec<Pattern>> {
    patterns
        .iter()
        .map(|pattern| {
            Pattern::new(pattern).map_err(|e| GenerateError::Glob {
                pattern: pattern.clone(),
                message: e.to_string(),
            })
        })
        .collect()
}
