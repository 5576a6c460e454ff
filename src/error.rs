use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for the library
pub type Result<T> = std::result::Result<T, GenerateError>;

/// Errors raised while building endpoint metadata.
///
/// Every variant aborts the generation run; there is no per-endpoint
/// skip-and-continue mode. Errors raised below the method level are wrapped in
/// [`GenerateError::Context`] so the final message names the controller, method
/// and parameter that triggered them.
#[derive(Debug, Error)]
pub enum GenerateError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("parse error in {file}:{line}: {message}")]
    Parse {
        file: PathBuf,
        line: usize,
        message: String,
    },

    #[error("invalid glob pattern '{pattern}': {message}")]
    Glob { pattern: String, message: String },

    #[error("configuration error: {0}")]
    Config(String),

    #[error("unknown decorator dialect '{0}'")]
    UnknownDialect(String),

    #[error("multiple declarations found for '{name}': {}", .locations.join(", "))]
    AmbiguousDeclaration {
        name: String,
        locations: Vec<String>,
    },

    #[error("reference type name '{name}' is produced by both {first} and {second}")]
    DuplicateReferenceName {
        name: String,
        first: String,
        second: String,
    },

    #[error("only one HTTP verb decorator is allowed on '{method}', found: {}", .verbs.join(", "))]
    AmbiguousHttpVerb { method: String, verbs: Vec<String> },

    #[error("unsupported type shape: {0}")]
    UnsupportedType(String),

    #[error("only string-keyed index signatures are supported, found '[{0}]'")]
    UnsupportedIndexSignature(String),

    #[error("unable to resolve type '{0}': no matching declaration found")]
    UnresolvableType(String),

    #[error("only one body parameter is allowed per method")]
    MultipleBodyParameters,

    #[error("body and form parameters can not be combined in one method")]
    BodyAndFormParameters,

    #[error("parameter '{parameter}' of kind {kind} can't support '{verb}' method")]
    UnsupportedVerbForParameter {
        parameter: String,
        kind: String,
        verb: String,
    },

    #[error("can't match path parameter '{parameter}' in path '{path}'")]
    PathParameterMismatch { parameter: String, path: String },

    #[error("parameter '{parameter}' is a {kind} and must have a simple type, found {found}")]
    InvalidSimpleParameterType {
        parameter: String,
        kind: String,
        found: String,
    },

    #[error("query parameter '{parameter}' can not be of type {found}")]
    InvalidQueryParameterType { parameter: String, found: String },

    #[error("circular reference to '{0}' was never completed")]
    UnfinishedReference(String),

    #[error("{context}: {source}")]
    Context {
        context: String,
        #[source]
        source: Box<GenerateError>,
    },
}

impl GenerateError {
    /// Wraps the error with a human-readable location prefix.
    pub fn with_context(self, context: impl Into<String>) -> Self {
        GenerateError::Context {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Returns the innermost error, skipping all context layers.
    pub fn root(&self) -> &GenerateError {
        match self {
            GenerateError::Context { source, .. } => source.root(),
            other => other,
        }
    }
}

/// Extension for attaching location context to fallible results.
pub trait ResultExt<T> {
    fn context_with<F, S>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> S,
        S: Into<String>;
}

impl<T> ResultExt<T> for Result<T> {
    fn context_with<F, S>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> S,
        S: Into<String>,
    {
        self.map_err(|e| e.with_context(f()))
    }
}

impl From<serde_json::Error> for GenerateError {
    fn from(err: serde_json::Error) -> Self {
        GenerateError::Config(format!("JSON error: {}", err))
    }
}

impl From<serde_yaml::Error> for GenerateError {
    fn from(err: serde_yaml::Error) -> Self {
        GenerateError::Config(format!("YAML error: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_prefixes_message() {
        let err = GenerateError::MultipleBodyParameters
            .with_context("parameter 'b'")
            .with_context("UserController.create");

        assert_eq!(
            err.to_string(),
            "UserController.create: parameter 'b': only one body parameter is allowed per method"
        );
        assert!(matches!(err.root(), GenerateError::MultipleBodyParameters));
    }

    #[test]
    fn test_ambiguous_declaration_lists_locations() {
        let err = GenerateError::AmbiguousDeclaration {
            name: "User".to_string(),
            locations: vec!["a.ts:3".to_string(), "b.ts:10".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "multiple declarations found for 'User': a.ts:3, b.ts:10"
        );
    }
}
