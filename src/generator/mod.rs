//! Endpoint metadata generation.
//!
//! [`MetadataGenerator`] drives one run: it discovers and parses the source
//! files, indexes their declarations, turns every eligible controller class
//! into [`Controller`] metadata and finally drains the resolution context into
//! the reference table.

pub mod controller;
pub mod method;
pub mod parameter;

pub use controller::ControllerGenerator;
pub use method::MethodGenerator;
pub use parameter::ParameterGenerator;

use crate::annotations::{
    AnnotationMatcher, ArgumentValue, Decorated, EffectiveMapping, MappingCache, PropertyKey, Role,
};
use crate::config::Config;
use crate::detector::DialectDetector;
use crate::error::Result;
use crate::metadata::{Controller, Metadata, Response, Security};
use crate::parser::ast::Expr;
use crate::parser::{AstParser, ParsedFile};
use crate::resolver::{DeclarationIndex, ResolutionContext, TypeResolver};
use crate::scanner::FileScanner;
use log::{debug, info, warn};

/// Runs the whole pipeline for one configuration.
///
/// # Example
///
/// ```no_run
/// use openapi_from_decorators::config::Config;
/// use openapi_from_decorators::generator::MetadataGenerator;
/// use std::path::Path;
///
/// let config = Config::load(Path::new("api.config.yaml")).unwrap();
/// let metadata = MetadataGenerator::new(config).generate().unwrap();
/// println!("Found {} controllers", metadata.controllers.len());
/// ```
pub struct MetadataGenerator {
    config: Config,
    mappings: MappingCache,
}

impl MetadataGenerator {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            mappings: MappingCache::new(),
        }
    }

    /// Discovers, parses and analyzes the configured sources.
    ///
    /// # Errors
    ///
    /// Any error aborts the run: invalid decorator configuration, bad glob
    /// patterns, unreadable or unparsable files, and every resolution or
    /// validation failure raised while building controllers.
    pub fn generate(&mut self) -> Result<Metadata> {
        let mapping_config = self.config.decorators.mapping_config()?;
        let mapping = self.mappings.get(&mapping_config);

        let scan = FileScanner::new(
            self.config.source_root(),
            self.config.metadata.entry_file.to_vec(),
        )
        .with_filters(
            self.config.metadata.ignore.clone(),
            self.config.metadata.allow.clone(),
        )
        .scan()?;
        for warning in &scan.warnings {
            warn!("{}", warning);
        }
        info!("Analyzing {} source files", scan.source_files.len());

        let files = AstParser::parse_files(&scan.source_files)
            .into_iter()
            .collect::<Result<Vec<_>>>()?;

        DialectDetector::detect(&files).warn_inactive(&mapping_config.dialects);
        generate_metadata(&files, &mapping)
    }
}

/// Builds metadata from already parsed files.
///
/// Controllers come out in file order and, within a file, in declaration order.
pub fn generate_metadata(files: &[ParsedFile], mapping: &EffectiveMapping) -> Result<Metadata> {
    let index = DeclarationIndex::build(files);
    let matcher = AnnotationMatcher::new(mapping);
    let resolver = TypeResolver::new(&index, &matcher);
    let mut context = ResolutionContext::new();

    let mut controllers: Vec<Controller> = Vec::new();
    for entry in index.classes() {
        let generator = ControllerGenerator::new(*entry, &matcher, &resolver);
        if generator.is_valid() {
            controllers.push(generator.generate(&mut context)?);
        } else {
            debug!("Skipping class {}", entry.class.name);
        }
    }

    let reference_types = context.finish()?;
    info!(
        "Generated {} controllers and {} reference types",
        controllers.len(),
        reference_types.len()
    );
    Ok(Metadata {
        controllers,
        reference_types,
    })
}

/// Strips leading and trailing slashes.
pub fn trim_path(path: &str) -> String {
    path.trim_matches('/').to_string()
}

/// Values of a list role (tags, produces, consumes) over all its instances,
/// without duplicates.
fn role_strings<N: Decorated + ?Sized>(matcher: &AnnotationMatcher<'_>, node: &N, role: Role) -> Vec<String> {
    let mut values: Vec<String> = Vec::new();
    if let Some(found) = matcher.find(node, role) {
        for value in found.all_strings(PropertyKey::Values) {
            if !values.contains(&value) {
                values.push(value);
            }
        }
    }
    values
}

/// Security requirements; an explicit no-security marker gives an empty list.
///
/// Accepts both `@Security('name', ['scope'])` and
/// `@Security({ name: ['scope'] })`.
fn security<N: Decorated + ?Sized>(matcher: &AnnotationMatcher<'_>, node: &N) -> Option<Vec<Security>> {
    if matcher.has(node, Role::NoSecurity) {
        return Some(Vec::new());
    }
    let found = matcher.find(node, Role::Security)?;

    let mut requirements = Vec::new();
    for instance in found.instances.iter().copied() {
        match found.value_of(instance, PropertyKey::Name) {
            Some(ArgumentValue::Expr(Expr::Object(entries))) => {
                let requirement: Security = entries
                    .iter()
                    .map(|(scheme, scopes)| {
                        let scopes = match scopes {
                            Expr::Array(items) => items
                                .iter()
                                .filter_map(|item| item.as_str().map(str::to_string))
                                .collect(),
                            _ => Vec::new(),
                        };
                        (scheme.clone(), scopes)
                    })
                    .collect();
                requirements.push(requirement);
            }
            _ => {
                if let Some(scheme) = found.string_of(instance, PropertyKey::Name) {
                    let mut requirement = Security::new();
                    requirement.insert(scheme, found.strings_of(instance, PropertyKey::Scopes));
                    requirements.push(requirement);
                }
            }
        }
    }
    Some(requirements)
}

/// Explicit response declarations, one per decorator instance.
fn responses<N: Decorated + ?Sized>(
    matcher: &AnnotationMatcher<'_>,
    resolver: &TypeResolver<'_>,
    node: &N,
    context: &mut ResolutionContext,
) -> Result<Vec<Response>> {
    let Some(found) = matcher.find(node, Role::Response) else {
        return Ok(Vec::new());
    };

    let mut responses = Vec::new();
    for instance in found.instances.iter().copied() {
        let schema = found
            .type_of(instance, PropertyKey::Type)
            .map(|node| resolver.resolve(&node, context))
            .transpose()?;
        let headers = found
            .type_of(instance, PropertyKey::Headers)
            .map(|node| resolver.resolve(&node, context))
            .transpose()?;
        responses.push(Response {
            status: found
                .string_of(instance, PropertyKey::Status)
                .unwrap_or_else(|| "default".to_string()),
            description: found
                .string_of(instance, PropertyKey::Description)
                .unwrap_or_default(),
            schema,
            examples: found
                .json_of(instance, PropertyKey::Example)
                .map(|example| vec![example]),
            headers,
        });
    }
    Ok(responses)
}
