//! Endpoint metadata from decorated TypeScript controllers.
//!
//! This library statically analyzes TypeScript sources that describe HTTP
//! endpoints through decorators (classes as controllers, methods as operations,
//! parameters as request inputs) and derives a language-agnostic metadata
//! model: paths, verbs, parameters and fully resolved request and response
//! types. An OpenAPI emitter renders that model into a document.
//!
//! # Supported Decorator Dialects
//!
//! - **Built-in**: `@Route`, `@Get`, `@Query`, `@Body`, `@Response`, ...
//! - **NestJS**: `@Controller`, `@ApiTags`, `@Param`, `@ApiResponse`, ...
//! - **routing-controllers**: `@JsonController`, `@QueryParam`, `@HttpCode`, ...
//!
//! # Architecture
//!
//! 1. [`config`] - Loads the JSON or YAML generation settings
//! 2. [`scanner`] - Expands entry globs into the set of source files
//! 3. [`parser`] - Parses TypeScript declarations into a syntax tree
//! 4. [`annotations`] - Maps semantic roles to the decorators of each dialect
//! 5. [`resolver`] - Resolves type expressions into canonical types
//! 6. [`generator`] - Builds controller, method and parameter metadata
//! 7. [`serializer`] - Serializes the metadata to YAML or JSON
//!
//! # Example Usage
//!
//! ```
//! use openapi_from_decorators::annotations::{build_effective_mapping, MappingConfig};
//! use openapi_from_decorators::generator::generate_metadata;
//! use openapi_from_decorators::parser::AstParser;
//! use std::path::Path;
//!
//! let source = r#"
//!     @Route('hello')
//!     export class HelloController {
//!         @Get()
//!         public async greet(): Promise<string> { return 'hi'; }
//!     }
//! "#;
//! let parsed = AstParser::parse_source(Path::new("hello.ts"), source).unwrap();
//! let mapping = build_effective_mapping(&MappingConfig::default());
//!
//! let metadata = generate_metadata(&[parsed], &mapping).unwrap();
//! assert_eq!(metadata.controllers[0].path, "hello");
//! assert_eq!(metadata.controllers[0].methods[0].responses[0].status, "200");
//! ```
//!
//! # Command-Line Interface
//!
//! For command-line usage, see the [`cli`] module.

pub mod annotations;
pub mod cli;
pub mod config;
pub mod detector;
pub mod error;
pub mod generator;
pub mod metadata;
pub mod parser;
pub mod resolver;
pub mod scanner;
pub mod serializer;
