//! Decorator dialects and the mapping from semantic roles to decorators.
//!
//! Generators never look at decorator names directly. They ask an
//! [`AnnotationMatcher`] whether a node carries a [`Role`] and read its values
//! by [`PropertyKey`]; which decorators express a role is decided once per run by
//! [`build_effective_mapping`].

pub mod mapping;
pub mod matcher;
pub mod registry;

pub use mapping::{
    build_effective_mapping, DialectSelection, EffectiveMapping, MappingCache, MappingConfig,
    RoleInclusion,
};
pub use matcher::{AnnotationMatch, AnnotationMatcher, ArgumentValue, Decorated};
pub use registry::{Dialect, ExtractionRule, PropertyKey, Representation, Role};
