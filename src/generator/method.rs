use super::parameter::ParameterGenerator;
use super::{responses, role_strings, security, trim_path};
use crate::annotations::{AnnotationMatch, AnnotationMatcher, PropertyKey, Role};
use crate::error::{GenerateError, Result, ResultExt};
use crate::metadata::{HttpVerb, Method, Parameter, ParameterLocation, Response, Type};
use crate::parser::ast::{Keyword, MethodDecl, TypeNode};
use crate::resolver::{substitute, ResolutionContext, Scope, TypeResolver};
use log::{debug, warn};
use serde_json::Value;

/// Builds the [`Method`] metadata of one controller method.
pub struct MethodGenerator<'a> {
    method: &'a MethodDecl,
    controller_name: &'a str,
    controller_path: &'a str,
    matcher: &'a AnnotationMatcher<'a>,
    resolver: &'a TypeResolver<'a>,
}

impl<'a> MethodGenerator<'a> {
    pub fn new(
        method: &'a MethodDecl,
        controller_name: &'a str,
        controller_path: &'a str,
        matcher: &'a AnnotationMatcher<'a>,
        resolver: &'a TypeResolver<'a>,
    ) -> Self {
        Self {
            method,
            controller_name,
            controller_path,
            matcher,
            resolver,
        }
    }

    /// The method's HTTP verb with its decorator, `None` when the method is not
    /// an endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`GenerateError::AmbiguousHttpVerb`] when several verb
    /// decorators are present.
    pub fn verb(&self) -> Result<Option<(HttpVerb, AnnotationMatch<'a>)>> {
        let mut found: Vec<(HttpVerb, AnnotationMatch<'a>)> = Role::VERBS
            .iter()
            .filter_map(|role| {
                let verb = role.verb()?;
                self.matcher.find(self.method, *role).map(|m| (verb, m))
            })
            .collect();

        match found.len() {
            0 => Ok(None),
            1 => Ok(found.pop()),
            _ => Err(GenerateError::AmbiguousHttpVerb {
                method: self.method.name.clone(),
                verbs: found
                    .iter()
                    .map(|(_, m)| m.representation.name.clone())
                    .collect(),
            }),
        }
    }

    /// Builds the endpoint, or `None` for methods without a verb decorator.
    ///
    /// Errors are prefixed with `Controller.method`.
    pub fn generate(&self, context: &mut ResolutionContext) -> Result<Option<Method>> {
        self.build(context)
            .context_with(|| format!("{}.{}", self.controller_name, self.method.name))
    }

    fn build(&self, context: &mut ResolutionContext) -> Result<Option<Method>> {
        let Some((verb, verb_match)) = self.verb()? else {
            debug!("{}.{} has no HTTP verb", self.controller_name, self.method.name);
            return Ok(None);
        };

        let path = verb_match
            .string(PropertyKey::Path)
            .map(|p| trim_path(&p))
            .unwrap_or_default();
        let full_path = join_paths(self.controller_path, &path);
        debug!("Generating {} /{}", verb, full_path);

        // Method type parameters stand for their constraint.
        let scope: Scope = self
            .method
            .type_parameters
            .iter()
            .map(|p| {
                let bound = p
                    .constraint
                    .clone()
                    .unwrap_or(TypeNode::Keyword(Keyword::Unknown));
                (p.name.clone(), bound)
            })
            .collect();

        let ty = self.return_type(&scope, context)?;
        let parameters = self.parameters(verb, &full_path, &scope, context)?;
        let responses = self.responses(&ty, context)?;

        let doc = self.method.doc.as_ref();
        let summary = self
            .matcher
            .find(self.method, Role::Summary)
            .and_then(|m| m.string(PropertyKey::Summary))
            .or_else(|| doc.and_then(|d| d.tag("summary")).map(str::to_string));
        let description = self
            .matcher
            .find(self.method, Role::Description)
            .and_then(|m| m.string(PropertyKey::Description))
            .or_else(|| doc.and_then(|d| d.description.clone()));

        Ok(Some(Method {
            name: self.method.name.clone(),
            http_verb: verb,
            path,
            description,
            summary,
            parameters,
            responses,
            tags: role_strings(self.matcher, self.method, Role::Tags),
            consumes: role_strings(self.matcher, self.method, Role::Consumes),
            produces: role_strings(self.matcher, self.method, Role::Produces),
            security: security(self.matcher, self.method),
            deprecated: self.matcher.has(self.method, Role::Deprecated)
                || doc.is_some_and(|d| d.has_tag("deprecated")),
            is_hidden: self.matcher.has(self.method, Role::Hidden),
            operation_id: self
                .matcher
                .find(self.method, Role::OperationId)
                .and_then(|m| m.string(PropertyKey::OperationId)),
            ty,
        }))
    }

    /// The declared return type, `Promise` unwrapped. Without an annotation the
    /// body decides: no value-returning `return` means `void`.
    fn return_type(&self, scope: &Scope, context: &mut ResolutionContext) -> Result<Type> {
        match &self.method.return_type {
            Some(node) => self.resolver.resolve(&substitute(node, scope), context),
            None if !self.method.returns_value => Ok(Type::void()),
            None => {
                warn!(
                    "{}.{} has no return type annotation, using object",
                    self.controller_name, self.method.name
                );
                Ok(Type::object())
            }
        }
    }

    fn parameters(
        &self,
        verb: HttpVerb,
        full_path: &str,
        scope: &Scope,
        context: &mut ResolutionContext,
    ) -> Result<Vec<Parameter>> {
        let mut parameters = Vec::new();
        for declaration in &self.method.parameters {
            let parameter = ParameterGenerator::new(
                declaration,
                self.method,
                verb,
                full_path,
                scope,
                self.matcher,
                self.resolver,
            )
            .generate(context)
            .context_with(|| format!("parameter '{}'", declaration.name))?;
            parameters.push(parameter);
        }

        let count = |location: ParameterLocation| {
            parameters
                .iter()
                .filter(|p| p.location == location)
                .count()
        };
        let bodies = count(ParameterLocation::Body);
        if bodies > 1 {
            return Err(GenerateError::MultipleBodyParameters);
        }
        if bodies > 0 && count(ParameterLocation::FormData) > 0 {
            return Err(GenerateError::BodyAndFormParameters);
        }
        Ok(parameters)
    }

    /// Explicit responses plus the success response. An explicit response with
    /// the success status wins; it only gains the method's examples when it has
    /// none.
    fn responses(&self, ty: &Type, context: &mut ResolutionContext) -> Result<Vec<Response>> {
        let mut responses = responses(self.matcher, self.resolver, self.method, context)?;

        let success = self.matcher.find(self.method, Role::SuccessResponse);
        let status = success
            .as_ref()
            .and_then(|m| m.string(PropertyKey::Status))
            .unwrap_or_else(|| (if ty.is_void() { "204" } else { "200" }).to_string());
        let description = success
            .as_ref()
            .and_then(|m| m.string(PropertyKey::Description))
            .unwrap_or_else(|| (if ty.is_void() { "No content" } else { "Ok" }).to_string());

        let examples: Vec<Value> = self
            .matcher
            .find(self.method, Role::Example)
            .map(|m| {
                m.instances
                    .iter()
                    .copied()
                    .filter_map(|instance| m.json_of(instance, PropertyKey::Example))
                    .collect()
            })
            .unwrap_or_default();
        let examples = (!examples.is_empty()).then_some(examples);

        match responses.iter_mut().find(|r| r.status == status) {
            Some(existing) => {
                if existing.examples.is_none() {
                    existing.examples = examples;
                }
            }
            None => responses.push(Response {
                status,
                description,
                schema: (!ty.is_void()).then(|| ty.clone()),
                examples,
                headers: None,
            }),
        }
        Ok(responses)
    }
}

/// Joins controller and method paths without empty segments.
fn join_paths(controller: &str, method: &str) -> String {
    [trim_path(controller), trim_path(method)]
        .into_iter()
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("/")
}
