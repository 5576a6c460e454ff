use crate::annotations::{AnnotationMatch, AnnotationMatcher, ArgumentValue, PropertyKey, Role};
use crate::error::{GenerateError, Result};
use crate::metadata::{HttpVerb, Parameter, ParameterLocation, ReferenceShape, Type, TypeKind};
use crate::parser::ast::{Expr, MethodDecl, ParameterDecl};
use crate::resolver::{substitute, ResolutionContext, Scope, TypeResolver};
use log::{debug, warn};

/// Parameter roles in probing order; the first one present classifies the
/// parameter.
const PARAMETER_ROLES: [Role; 10] = [
    Role::Context,
    Role::GenericParam,
    Role::Query,
    Role::FormField,
    Role::Body,
    Role::Header,
    Role::Cookie,
    Role::Path,
    Role::UploadedFile,
    Role::UploadedFiles,
];

/// Builds the [`Parameter`] metadata of one method parameter.
pub struct ParameterGenerator<'a> {
    parameter: &'a ParameterDecl,
    method: &'a MethodDecl,
    verb: HttpVerb,
    /// Controller and method path joined, used to check path parameters
    path: &'a str,
    scope: &'a Scope,
    matcher: &'a AnnotationMatcher<'a>,
    resolver: &'a TypeResolver<'a>,
}

impl<'a> ParameterGenerator<'a> {
    pub fn new(
        parameter: &'a ParameterDecl,
        method: &'a MethodDecl,
        verb: HttpVerb,
        path: &'a str,
        scope: &'a Scope,
        matcher: &'a AnnotationMatcher<'a>,
        resolver: &'a TypeResolver<'a>,
    ) -> Self {
        Self {
            parameter,
            method,
            verb,
            path,
            scope,
            matcher,
            resolver,
        }
    }

    /// Classifies and builds the parameter.
    ///
    /// A parameter without any parameter role is a body parameter.
    ///
    /// # Errors
    ///
    /// Fails when the role does not fit the method's verb, a path parameter is
    /// missing from the path, a header, cookie or query parameter has an
    /// unsuitable type, or the type cannot be resolved.
    pub fn generate(&self, context: &mut ResolutionContext) -> Result<Parameter> {
        let matched = PARAMETER_ROLES.iter().find_map(|role| {
            self.matcher
                .find(self.parameter, *role)
                .map(|found| (*role, found))
        });
        let (role, found) = match matched {
            Some((role, found)) => (role, Some(found)),
            None => (Role::Body, None),
        };
        debug!(
            "Parameter '{}' of {} classified as {}",
            self.parameter.name, self.method.name, role
        );

        let name = self.name(found.as_ref());
        match role {
            Role::Context => Ok(Parameter {
                required: !self.parameter.optional,
                ..self.build(name, ParameterLocation::Context, Type::any())
            }),
            Role::GenericParam => {
                let ty = self.resolve_type(context)?;
                Ok(self.build(name, ParameterLocation::Param, ty))
            }
            Role::Query => self.query(name, found.as_ref(), context),
            Role::FormField => {
                self.check_body_verb("form")?;
                let ty = self.resolve_type(context)?;
                Ok(self.build(name, ParameterLocation::FormData, ty))
            }
            Role::Header | Role::Cookie => {
                let ty = self.resolve_type(context)?;
                let kind = if role == Role::Header { "header" } else { "cookie" };
                if !is_simple(&ty, context) {
                    return Err(GenerateError::InvalidSimpleParameterType {
                        parameter: name,
                        kind: kind.to_string(),
                        found: ty.to_string(),
                    });
                }
                let location = if role == Role::Header {
                    ParameterLocation::Header
                } else {
                    ParameterLocation::Cookie
                };
                Ok(self.build(name, location, ty))
            }
            Role::Path => {
                if !appears_in_path(self.path, &name) {
                    return Err(GenerateError::PathParameterMismatch {
                        parameter: name,
                        path: self.path.to_string(),
                    });
                }
                let ty = self.resolve_type(context)?;
                Ok(self.build(name, ParameterLocation::Path, ty))
            }
            Role::UploadedFile => {
                self.check_body_verb("file")?;
                Ok(self.build(name, ParameterLocation::FormData, Type::new(TypeKind::File)))
            }
            Role::UploadedFiles => {
                self.check_body_verb("file")?;
                Ok(self.build(
                    name,
                    ParameterLocation::FormData,
                    Type::array(Type::new(TypeKind::File)),
                ))
            }
            _ => {
                self.check_body_verb("body")?;
                let ty = self.resolve_type(context)?;
                Ok(self.build(name, ParameterLocation::Body, ty))
            }
        }
    }

    /// The name given by the role's decorator, or the source identifier.
    fn name(&self, found: Option<&AnnotationMatch<'a>>) -> String {
        found
            .and_then(|m| m.string(PropertyKey::Name))
            .unwrap_or_else(|| self.parameter.name.clone())
    }

    fn resolve_type(&self, context: &mut ResolutionContext) -> Result<Type> {
        let hints = self.resolver.decorator_hints(self.parameter);
        match &self.parameter.type_node {
            Some(node) => self
                .resolver
                .resolve_with(&substitute(node, self.scope), hints, context),
            None => {
                warn!(
                    "Parameter '{}' of {} has no type annotation, using object",
                    self.parameter.name, self.method.name
                );
                Ok(Type::object())
            }
        }
    }

    fn check_body_verb(&self, kind: &str) -> Result<()> {
        if self.verb.supports_body() {
            return Ok(());
        }
        Err(GenerateError::UnsupportedVerbForParameter {
            parameter: self.parameter.name.clone(),
            kind: kind.to_string(),
            verb: self.verb.to_string(),
        })
    }

    fn query(
        &self,
        name: String,
        found: Option<&AnnotationMatch<'a>>,
        context: &mut ResolutionContext,
    ) -> Result<Parameter> {
        let ty = self.resolve_type(context)?;
        if let Some(invalid) = invalid_query_type(&ty) {
            return Err(GenerateError::InvalidQueryParameterType {
                parameter: name,
                found: invalid.to_string(),
            });
        }

        let allow_empty_value = found
            .and_then(|m| match m.value(PropertyKey::Options) {
                Some(ArgumentValue::Expr(options)) => options.field("allowEmptyValue"),
                _ => None,
            })
            .and_then(|value| match value {
                Expr::Bool(flag) => Some(*flag),
                _ => None,
            });

        let is_array = matches!(ty.kind, TypeKind::Array { .. });
        let validators = self
            .parameter
            .type_node
            .as_ref()
            .map(|node| self.resolver.alias_validators(node))
            .unwrap_or_default();

        Ok(Parameter {
            collection_format: is_array.then(|| "multi".to_string()),
            allow_empty_value,
            min_items: validators.get("minItems").map(|v| v.value.clone()),
            max_items: validators.get("maxItems").map(|v| v.value.clone()),
            ..self.build(name, ParameterLocation::Query, ty)
        })
    }

    fn build(&self, name: String, location: ParameterLocation, ty: Type) -> Parameter {
        let default = self.parameter.initializer.as_ref().map(Expr::to_json);
        let required = !self.parameter.optional && default.is_none() && !ty.nullable;
        Parameter {
            parameter_name: self.parameter.name.clone(),
            name,
            location,
            required,
            ty,
            description: self
                .method
                .doc
                .as_ref()
                .and_then(|doc| doc.param(&self.parameter.name))
                .map(str::to_string),
            default,
            collection_format: None,
            allow_empty_value: None,
            min_items: None,
            max_items: None,
        }
    }
}

/// Types a header or cookie can carry.
fn is_simple(ty: &Type, context: &ResolutionContext) -> bool {
    match &ty.kind {
        TypeKind::String
        | TypeKind::Boolean
        | TypeKind::Integer
        | TypeKind::Long
        | TypeKind::Float
        | TypeKind::Double
        | TypeKind::Date
        | TypeKind::Datetime
        | TypeKind::Byte
        | TypeKind::Enum { .. }
        | TypeKind::RefEnum { .. } => true,
        TypeKind::RefAlias { ref_name } => context.reference(ref_name).is_some_and(|reference| {
            matches!(&reference.shape, ReferenceShape::RefAlias { aliased_type, .. } if is_simple(aliased_type, context))
        }),
        _ => false,
    }
}

/// Whether `name` appears in `path` as `{name}` or as a `:name` that is not
/// the prefix of a longer identifier (`:id?`, `:id(\d+)` and `:id.json` all
/// name `id`).
fn appears_in_path(path: &str, name: &str) -> bool {
    if path.contains(&format!("{{{}}}", name)) {
        return true;
    }
    let colon = format!(":{}", name);
    path.match_indices(&colon).any(|(start, _)| {
        path[start + colon.len()..]
            .chars()
            .next()
            .map_or(true, |next| !(next.is_ascii_alphanumeric() || next == '_' || next == '$'))
    })
}

/// The part of a query parameter type that can not travel in a query string.
fn invalid_query_type(ty: &Type) -> Option<&Type> {
    match &ty.kind {
        TypeKind::Void
        | TypeKind::File
        | TypeKind::Binary
        | TypeKind::Buffer
        | TypeKind::Union { .. }
        | TypeKind::Intersection { .. } => Some(ty),
        TypeKind::Array { element_type } => invalid_query_type(element_type),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_colon_parameter_with_suffix_appears_in_path() {
        assert!(appears_in_path("items/:id", "id"));
        assert!(appears_in_path("items/:id?", "id"));
        assert!(appears_in_path("files/:slug(\\d+)", "slug"));
        assert!(appears_in_path("reports/:id.json", "id"));
        assert!(appears_in_path("a/:from-:to", "from"));
        assert!(appears_in_path("a/:from-:to", "to"));
    }

    #[test]
    fn test_braced_parameter_appears_in_path() {
        assert!(appears_in_path("orgs/{orgId}/users", "orgId"));
        assert!(appears_in_path("files/{name}.json", "name"));
        assert!(!appears_in_path("orgs/{orgIdentifier}", "orgId"));
    }

    #[test]
    fn test_longer_identifier_does_not_match() {
        assert!(!appears_in_path("items/:idx", "id"));
        assert!(!appears_in_path("items/:id_2", "id"));
        assert!(!appears_in_path("items/:id$", "id"));
        assert!(!appears_in_path("items/id", "id"));
        assert!(appears_in_path("items/:idx/:id", "id"));
    }
}
