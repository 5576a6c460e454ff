//! Resolution of TypeScript type expressions into canonical [`Type`]s.
//!
//! Named declarations become entries of the reference table kept in a
//! [`ResolutionContext`]; the returned types only hold handles to them. A type
//! that refers to itself while it is being resolved gets its handle right away
//! and a deferred check that the table holds it by the end of the run.

mod context;
pub mod declarations;

pub use context::{Deferred, ResolutionContext};
pub use declarations::{
    bind_type_parameters, substitute, ClassEntry, Declaration, DeclarationIndex, Located, Member,
    Scope,
};

use crate::annotations::{AnnotationMatcher, Decorated, Role};
use crate::error::{GenerateError, Result};
use crate::metadata::{
    Property, ReferenceShape, ReferenceType, Type, TypeKind, Validator, Validators,
};
use crate::parser::ast::*;
use crate::parser::jsdoc::JsDoc;
use declarations::{literal_index_signatures, literal_members};
use log::{debug, warn};
use serde_json::Value;

/// Precision of a `number`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumberFormat {
    Integer,
    Long,
    Float,
    Double,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateFormat {
    Date,
    DateTime,
}

/// Format refinements found next to a type expression, from documentation tags
/// or precision decorators.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Hints {
    pub number: Option<NumberFormat>,
    pub date: Option<DateFormat>,
}

impl Hints {
    /// Reads `@isInt`, `@isLong`, `@isFloat`, `@isDouble`, `@isDate` and
    /// `@isDateTime`.
    pub fn from_doc(doc: Option<&JsDoc>) -> Hints {
        let Some(doc) = doc else {
            return Hints::default();
        };
        let number = [
            ("isInt", NumberFormat::Integer),
            ("isLong", NumberFormat::Long),
            ("isFloat", NumberFormat::Float),
            ("isDouble", NumberFormat::Double),
        ]
        .into_iter()
        .find(|(tag, _)| doc.has_tag(tag))
        .map(|(_, format)| format);
        let date = if doc.has_tag("isDate") {
            Some(DateFormat::Date)
        } else if doc.has_tag("isDateTime") {
            Some(DateFormat::DateTime)
        } else {
            None
        };
        Hints { number, date }
    }

    /// Fills unset refinements from `other`.
    pub fn or(self, other: Hints) -> Hints {
        Hints {
            number: self.number.or(other.number),
            date: self.date.or(other.date),
        }
    }
}

const VALIDATOR_TAGS: [&str; 10] = [
    "minimum",
    "maximum",
    "minLength",
    "maxLength",
    "pattern",
    "minItems",
    "maxItems",
    "uniqueItems",
    "minDate",
    "maxDate",
];

/// Validation constraints declared by documentation tags.
///
/// `@minLength 3 name is too short` gives the value `3` and the error message
/// `name is too short`.
pub fn validators(doc: Option<&JsDoc>) -> Validators {
    let mut validators = Validators::new();
    let Some(doc) = doc else {
        return validators;
    };
    for tag in doc.tags.iter().filter(|t| VALIDATOR_TAGS.contains(&t.name.as_str())) {
        let text = tag.text.trim();
        let (value, message) = if tag.name == "uniqueItems" {
            (Value::Bool(true), text)
        } else {
            let (value, message) = text.split_once(char::is_whitespace).unwrap_or((text, ""));
            let value = match tag.name.as_str() {
                "pattern" | "minDate" | "maxDate" => Value::String(value.to_string()),
                _ => number_to_json(value),
            };
            (value, message.trim())
        };
        validators.insert(
            tag.name.clone(),
            Validator {
                value,
                error_msg: (!message.is_empty()).then(|| message.to_string()),
            },
        );
    }
    validators
}

/// Reads a tag value as JSON, keeping it as a string when it is not valid JSON.
pub fn json_or_string(text: &str) -> Value {
    serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_string()))
}

fn description(doc: Option<&JsDoc>) -> Option<String> {
    doc.and_then(|d| d.description.clone())
}

fn tag_value(doc: Option<&JsDoc>, name: &str) -> Option<Value> {
    doc.and_then(|d| d.tag(name))
        .filter(|text| !text.is_empty())
        .map(json_or_string)
}

fn is_deprecated(doc: Option<&JsDoc>) -> bool {
    doc.is_some_and(|d| d.has_tag("deprecated"))
}

/// The type-name fragment a type argument contributes to a generic
/// instantiation's reference name (`Box<string>` is `BoxString`).
pub fn name_fragment(node: &TypeNode) -> String {
    match node {
        TypeNode::Keyword(keyword) => capitalize(keyword.as_str()),
        TypeNode::Literal(LiteralType::String(text)) => capitalize(&sanitize(text)),
        TypeNode::Literal(LiteralType::Number(text)) => sanitize(&text.replace('-', "Minus")),
        TypeNode::Literal(LiteralType::Boolean(value)) => capitalize(&value.to_string()),
        TypeNode::Reference {
            name,
            type_arguments,
        } => {
            let mut fragment = sanitize(name);
            for argument in type_arguments {
                fragment.push_str(&name_fragment(argument));
            }
            fragment
        }
        TypeNode::Array(element) => format!("{}Array", name_fragment(element)),
        TypeNode::Tuple(elements) => format!("{}Tuple", join_fragments(elements, "")),
        TypeNode::Union(members) => join_fragments(members, "Or"),
        TypeNode::Intersection(members) => join_fragments(members, "And"),
        TypeNode::TypeLiteral(_) => "Object".to_string(),
        TypeNode::Unsupported(text) => capitalize(&sanitize(text)),
    }
}

fn join_fragments(nodes: &[TypeNode], separator: &str) -> String {
    nodes
        .iter()
        .map(name_fragment)
        .collect::<Vec<_>>()
        .join(separator)
}

fn sanitize(text: &str) -> String {
    text.chars()
        .filter(|c| c.is_alphanumeric() || *c == '_')
        .collect()
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn reference_name(qualified_name: &str, parameters: &[TypeParameter], scope: &Scope) -> String {
    let mut name = qualified_name.to_string();
    for parameter in parameters {
        if let Some(bound) = scope.get(&parameter.name) {
            name.push_str(&name_fragment(bound));
        }
    }
    name
}

/// `'a' | 'b'` or a single literal, optionally with `null` / `undefined`.
fn is_literal_union(node: &TypeNode) -> bool {
    match node {
        TypeNode::Literal(_) => true,
        TypeNode::Union(members) => {
            members.iter().any(|m| matches!(m, TypeNode::Literal(_)))
                && members.iter().all(|m| {
                    matches!(
                        m,
                        TypeNode::Literal(_)
                            | TypeNode::Keyword(Keyword::Null | Keyword::Undefined)
                    )
                })
        }
        _ => false,
    }
}

fn literal_value(literal: &LiteralType) -> Value {
    match literal {
        LiteralType::String(text) => Value::String(text.clone()),
        LiteralType::Number(text) => number_to_json(text),
        LiteralType::Boolean(value) => Value::Bool(*value),
    }
}

/// Enum members with their values; members without an initializer count up
/// from the previous numeric value.
fn enum_values(declaration: &EnumDecl) -> Vec<(String, Value)> {
    let mut next = Some(0i64);
    declaration
        .members
        .iter()
        .map(|member| {
            let value = match &member.initializer {
                Some(expr) => expr.to_json(),
                None => next
                    .map(Value::from)
                    .unwrap_or_else(|| Value::String(member.name.clone())),
            };
            next = value.as_i64().map(|n| n + 1);
            (member.name.clone(), value)
        })
        .collect()
}

/// Reference types that may be in progress at once. A generic that
/// instantiates itself with a growing argument (`interface W<T> { next: W<T[]> }`)
/// yields a new name at every level and would otherwise never terminate.
const MAX_REFERENCE_DEPTH: usize = 32;

fn begin_reference(ref_name: &str, context: &mut ResolutionContext) -> Result<()> {
    if context.depth() >= MAX_REFERENCE_DEPTH {
        return Err(GenerateError::UnsupportedType(format!(
            "{} nests reference types more than {} levels deep",
            ref_name, MAX_REFERENCE_DEPTH
        )));
    }
    context.begin(ref_name);
    Ok(())
}

fn push_unique<T: PartialEq>(items: &mut Vec<T>, item: T) {
    if !items.contains(&item) {
        items.push(item);
    }
}

/// Inherited members: a later parent replaces an earlier one.
fn merge_inherited(properties: &mut Vec<Property>, inherited: Property) {
    match properties.iter_mut().find(|p| p.name == inherited.name) {
        Some(existing) => *existing = inherited,
        None => properties.push(inherited),
    }
}

/// Own members win over inherited ones but keep the inherited description
/// when they have none.
fn merge_own(properties: &mut Vec<Property>, mut own: Property) {
    match properties.iter_mut().find(|p| p.name == own.name) {
        Some(existing) => {
            if own.description.is_none() {
                own.description = existing.description.take();
            }
            *existing = own;
        }
        None => properties.push(own),
    }
}

/// Properties and additional properties of an object-like type.
pub type ObjectShape = (Vec<Property>, Option<Box<Type>>);

/// Resolves type expressions against the declarations of one program.
///
/// # Example
///
/// ```
/// use openapi_from_decorators::annotations::{build_effective_mapping, AnnotationMatcher, MappingConfig};
/// use openapi_from_decorators::parser::{ast::TypeNode, AstParser};
/// use openapi_from_decorators::resolver::{DeclarationIndex, ResolutionContext, TypeResolver};
/// use std::path::Path;
///
/// let file = AstParser::parse_source(Path::new("user.ts"), "interface User { id: string }").unwrap();
/// let files = vec![file];
/// let index = DeclarationIndex::build(&files);
/// let mapping = build_effective_mapping(&MappingConfig::default());
/// let matcher = AnnotationMatcher::new(&mapping);
/// let resolver = TypeResolver::new(&index, &matcher);
///
/// let mut context = ResolutionContext::new();
/// let ty = resolver.resolve(&TypeNode::reference("User"), &mut context).unwrap();
/// assert_eq!(ty.ref_name(), Some("User"));
/// ```
pub struct TypeResolver<'a> {
    index: &'a DeclarationIndex<'a>,
    matcher: &'a AnnotationMatcher<'a>,
}

impl<'a> TypeResolver<'a> {
    pub fn new(index: &'a DeclarationIndex<'a>, matcher: &'a AnnotationMatcher<'a>) -> Self {
        Self { index, matcher }
    }

    /// Resolves a type expression without format refinements.
    ///
    /// # Errors
    ///
    /// Fails for unsupported shapes, unknown or ambiguous names, non-string
    /// index signatures and duplicate reference names.
    pub fn resolve(&self, node: &TypeNode, context: &mut ResolutionContext) -> Result<Type> {
        self.resolve_with(node, Hints::default(), context)
    }

    /// Resolves a type expression; `hints` refine `number` and `Date`.
    pub fn resolve_with(
        &self,
        node: &TypeNode,
        hints: Hints,
        context: &mut ResolutionContext,
    ) -> Result<Type> {
        match node {
            TypeNode::Keyword(keyword) => keyword_type(*keyword, hints),
            TypeNode::Literal(literal) => Ok(Type::enumeration(vec![literal_value(literal)])),
            TypeNode::Array(element) => Ok(Type::array(self.resolve_with(element, hints, context)?)),
            TypeNode::Tuple(elements) => self.tuple(elements, hints, context),
            TypeNode::Intersection(members) => self.intersection(members, context),
            TypeNode::TypeLiteral(members) => self.type_literal(members, context),
            TypeNode::Union(members) => self.union(members, hints, context),
            TypeNode::Reference {
                name,
                type_arguments,
            } => self.reference(name, type_arguments, hints, context),
            TypeNode::Unsupported(text) => Err(GenerateError::UnsupportedType(text.clone())),
        }
    }

    /// Precision refinements carried by decorators on a node.
    pub fn decorator_hints<N: Decorated + ?Sized>(&self, node: &N) -> Hints {
        let number = [
            (Role::IsInt, NumberFormat::Integer),
            (Role::IsLong, NumberFormat::Long),
            (Role::IsFloat, NumberFormat::Float),
            (Role::IsDouble, NumberFormat::Double),
        ]
        .into_iter()
        .find(|(role, _)| self.matcher.has(node, *role))
        .map(|(_, format)| format);
        Hints { number, date: None }
    }

    /// Validators documented on the type alias a node refers to.
    pub fn alias_validators(&self, node: &TypeNode) -> Validators {
        if let TypeNode::Reference { name, .. } = node {
            if let [located] = self.index.find(name).as_slice() {
                if let Declaration::Alias(alias) = located.declaration {
                    return validators(alias.doc.as_ref());
                }
            }
        }
        Validators::new()
    }

    /// Properties and additional properties of an object-like type.
    ///
    /// Intersections are flattened member by member; a later member's property
    /// replaces an earlier one with the same name.
    pub fn object_shape(&self, ty: &Type, context: &ResolutionContext) -> Result<ObjectShape> {
        match &ty.kind {
            TypeKind::NestedObjectLiteral {
                properties,
                additional_properties,
            } => Ok((properties.clone(), additional_properties.clone())),
            TypeKind::RefObject { ref_name } | TypeKind::RefAlias { ref_name } => {
                let reference = context.reference(ref_name).ok_or_else(|| {
                    GenerateError::UnsupportedType(format!(
                        "'{}' is used before its declaration is complete",
                        ref_name
                    ))
                })?;
                match &reference.shape {
                    ReferenceShape::RefObject {
                        properties,
                        additional_properties,
                    } => Ok((properties.clone(), additional_properties.clone())),
                    ReferenceShape::RefAlias { aliased_type, .. } => {
                        self.object_shape(aliased_type, context)
                    }
                    ReferenceShape::RefEnum { .. } => Err(GenerateError::UnsupportedType(
                        format!("enum '{}' has no properties", ref_name),
                    )),
                }
            }
            TypeKind::Intersection { types } => {
                let mut properties = Vec::new();
                let mut additional = None;
                for member in types {
                    let (member_properties, member_additional) =
                        self.object_shape(member, context)?;
                    for property in member_properties {
                        merge_inherited(&mut properties, property);
                    }
                    if member_additional.is_some() {
                        additional = member_additional;
                    }
                }
                Ok((properties, additional))
            }
            _ => Err(GenerateError::UnsupportedType(format!(
                "{} has no properties",
                ty
            ))),
        }
    }

    fn tuple(
        &self,
        elements: &[TypeNode],
        hints: Hints,
        context: &mut ResolutionContext,
    ) -> Result<Type> {
        let mut types = Vec::new();
        for element in elements {
            push_unique(&mut types, self.resolve_with(element, hints, context)?);
        }
        Ok(match types.len() {
            0 => Type::array(Type::object()),
            1 => Type::array(types.remove(0)),
            _ => Type::array(Type::new(TypeKind::Union { types })),
        })
    }

    fn intersection(&self, members: &[TypeNode], context: &mut ResolutionContext) -> Result<Type> {
        let mut types = Vec::new();
        for member in members {
            let ty = self.resolve(member, context)?;
            match ty.kind {
                TypeKind::Intersection { types: nested } if !ty.nullable => types.extend(nested),
                _ => types.push(ty),
            }
        }
        if types.len() == 1 {
            return Ok(types.remove(0));
        }
        Ok(Type::new(TypeKind::Intersection { types }))
    }

    fn type_literal(&self, members: &[TypeMember], context: &mut ResolutionContext) -> Result<Type> {
        let scope = Scope::new();
        let mut properties = Vec::new();
        for member in literal_members(members) {
            if let Some(property) = self.property(&member, &scope, context)? {
                properties.push(property);
            }
        }
        let mut additional_properties = None;
        for index in literal_index_signatures(members) {
            additional_properties = Some(Box::new(self.index_signature(index, &scope, context)?));
        }
        Ok(Type::new(TypeKind::NestedObjectLiteral {
            properties,
            additional_properties,
        }))
    }

    fn union(
        &self,
        members: &[TypeNode],
        hints: Hints,
        context: &mut ResolutionContext,
    ) -> Result<Type> {
        let mut nullable = false;
        let mut branches: Vec<Type> = Vec::new();
        for member in members {
            let mut ty = self.resolve_with(member, hints, context)?;
            if ty.is_null_sentinel() {
                nullable = true;
                continue;
            }
            nullable |= ty.nullable;
            ty.nullable = false;
            push_unique(&mut branches, ty);
        }

        let ty = match branches.len() {
            0 => return Ok(Type::null_sentinel()),
            1 => branches.remove(0),
            _ => {
                if let Some(members) = enum_union_members(&branches, context) {
                    Type::enumeration(members)
                } else if let Some(array) = single_or_array(&branches) {
                    array
                } else {
                    debug!(
                        "Union of {} falls back to object",
                        branches
                            .iter()
                            .map(|t| t.to_string())
                            .collect::<Vec<_>>()
                            .join(", ")
                    );
                    Type::object()
                }
            }
        };
        Ok(if nullable { ty.into_nullable() } else { ty })
    }

    fn reference(
        &self,
        name: &str,
        arguments: &[TypeNode],
        hints: Hints,
        context: &mut ResolutionContext,
    ) -> Result<Type> {
        match self.index.find(name).as_slice() {
            [] => {}
            [located] => return self.declaration(located, arguments, context),
            many => {
                return Err(GenerateError::AmbiguousDeclaration {
                    name: name.to_string(),
                    locations: many.iter().map(|l| l.location()).collect(),
                })
            }
        }

        if let Some(member) = self.enum_member(name) {
            return Ok(member);
        }
        self.builtin(name, arguments, hints, context)
    }

    /// `Color.Red` as a one-member enum.
    fn enum_member(&self, name: &str) -> Option<Type> {
        let (owner, member) = name.rsplit_once('.')?;
        match self.index.find(owner).as_slice() {
            [located] => match located.declaration {
                Declaration::Enum(declaration) => enum_values(declaration)
                    .into_iter()
                    .find(|(member_name, _)| member_name == member)
                    .map(|(_, value)| Type::enumeration(vec![value])),
                _ => None,
            },
            _ => None,
        }
    }

    fn builtin(
        &self,
        name: &str,
        arguments: &[TypeNode],
        hints: Hints,
        context: &mut ResolutionContext,
    ) -> Result<Type> {
        let kind = match (name, arguments) {
            ("Promise" | "PromiseLike", [inner]) => {
                return self.resolve_with(inner, hints, context)
            }
            ("Array" | "ReadonlyArray" | "Set", [element]) => {
                return Ok(Type::array(self.resolve_with(element, hints, context)?))
            }
            ("Date", []) => match hints.date {
                Some(DateFormat::Date) => TypeKind::Date,
                _ => TypeKind::Datetime,
            },
            ("Buffer" | "ArrayBuffer" | "Uint8Array", _) => TypeKind::Buffer,
            ("Readable" | "ReadableStream" | "Blob", _) => TypeKind::Binary,
            ("File" | "Express.Multer.File", []) => TypeKind::File,
            ("Object", []) => TypeKind::Object,
            ("Record", [key, value]) => return self.record(key, value, context),
            ("Partial" | "Required" | "Readonly", [target]) => {
                let (mut properties, additional_properties) =
                    self.object_shape(&self.resolve(target, context)?, context)?;
                match name {
                    "Partial" => properties.iter_mut().for_each(|p| p.required = false),
                    "Required" => properties.iter_mut().for_each(|p| p.required = true),
                    _ => {}
                }
                TypeKind::NestedObjectLiteral {
                    properties,
                    additional_properties,
                }
            }
            ("Pick" | "Omit", [target, keys]) => {
                let (properties, additional_properties) =
                    self.object_shape(&self.resolve(target, context)?, context)?;
                let keys = match self.resolve(keys, context)?.kind {
                    TypeKind::Enum { members } => members
                        .iter()
                        .filter_map(|m| m.as_str().map(str::to_string))
                        .collect::<Vec<_>>(),
                    _ => {
                        return Err(GenerateError::UnsupportedType(format!(
                            "{}<{}, {}>",
                            name, target, keys
                        )))
                    }
                };
                let keep = name == "Pick";
                TypeKind::NestedObjectLiteral {
                    properties: properties
                        .into_iter()
                        .filter(|p| keys.contains(&p.name) == keep)
                        .collect(),
                    additional_properties: if keep { None } else { additional_properties },
                }
            }
            _ => return Err(GenerateError::UnresolvableType(name.to_string())),
        };
        Ok(Type::new(kind))
    }

    /// `Record<'a' | 'b', V>` lists its keys; any other key type allows
    /// arbitrary keys.
    fn record(
        &self,
        key: &TypeNode,
        value: &TypeNode,
        context: &mut ResolutionContext,
    ) -> Result<Type> {
        let value = self.resolve(value, context)?;
        let kind = match self.resolve(key, context)?.kind {
            TypeKind::Enum { members } => TypeKind::NestedObjectLiteral {
                properties: members
                    .iter()
                    .map(|member| {
                        let name = match member {
                            Value::String(text) => text.clone(),
                            other => other.to_string(),
                        };
                        Property::new(name, value.clone(), true)
                    })
                    .collect(),
                additional_properties: None,
            },
            _ => TypeKind::NestedObjectLiteral {
                properties: Vec::new(),
                additional_properties: Some(Box::new(value)),
            },
        };
        Ok(Type::new(kind))
    }

    fn declaration(
        &self,
        located: &Located<'a>,
        arguments: &[TypeNode],
        context: &mut ResolutionContext,
    ) -> Result<Type> {
        match located.declaration {
            Declaration::Enum(declaration) => self.enum_reference(located, declaration, context),
            Declaration::Alias(alias) => self.alias(located, alias, arguments, context),
            Declaration::Class(_) | Declaration::Interface(_) => {
                self.object_reference(located, arguments, context)
            }
        }
    }

    fn enum_reference(
        &self,
        located: &Located<'a>,
        declaration: &EnumDecl,
        context: &mut ResolutionContext,
    ) -> Result<Type> {
        let ref_name = located.qualified_name.clone();
        context.claim(&ref_name, &located.location())?;
        if let Some(existing) = context.reference(&ref_name) {
            return Ok(existing.handle());
        }

        let values = enum_values(declaration);
        let members: Vec<Value> = values.iter().map(|(_, value)| value.clone()).collect();
        let one_to_one = members
            .iter()
            .enumerate()
            .all(|(position, value)| !members[..position].contains(value));
        let doc = declaration.doc.as_ref();

        let reference = context.complete(ReferenceType {
            ref_name,
            description: description(doc),
            deprecated: is_deprecated(doc),
            example: tag_value(doc, "example"),
            shape: ReferenceShape::RefEnum {
                member_names: one_to_one
                    .then(|| values.into_iter().map(|(name, _)| name).collect()),
                members,
            },
        });
        Ok(reference.handle())
    }

    fn alias(
        &self,
        located: &Located<'a>,
        alias: &TypeAliasDecl,
        arguments: &[TypeNode],
        context: &mut ResolutionContext,
    ) -> Result<Type> {
        let scope = bind_type_parameters(&alias.type_parameters, arguments);
        let body = substitute(&alias.type_node, &scope);
        let doc = alias.doc.as_ref();
        let hints = Hints::from_doc(doc);

        if is_literal_union(&body) {
            return self.resolve_with(&body, hints, context);
        }

        let ref_name = reference_name(&located.qualified_name, &alias.type_parameters, &scope);
        context.claim(&ref_name, &located.location())?;
        let handle = Type::new(TypeKind::RefAlias {
            ref_name: ref_name.clone(),
        });
        if context.reference(&ref_name).is_some() {
            return Ok(handle);
        }
        if context.is_in_progress(&ref_name) {
            context.defer(Deferred::ForwardReference { ref_name });
            return Ok(handle);
        }

        begin_reference(&ref_name, context)?;
        let aliased_type = match self.resolve_with(&body, hints, context) {
            Ok(ty) => ty,
            Err(e) => {
                context.abandon(&ref_name);
                return Err(e);
            }
        };
        context.complete(ReferenceType {
            ref_name,
            description: description(doc),
            deprecated: is_deprecated(doc),
            example: tag_value(doc, "example"),
            shape: ReferenceShape::RefAlias {
                aliased_type: Box::new(aliased_type),
                format: doc.and_then(|d| d.tag("format")).map(str::to_string),
                validators: validators(doc),
                default: tag_value(doc, "default"),
            },
        });
        Ok(handle)
    }

    fn object_reference(
        &self,
        located: &Located<'a>,
        arguments: &[TypeNode],
        context: &mut ResolutionContext,
    ) -> Result<Type> {
        let declaration = located.declaration;
        let scope = bind_type_parameters(declaration.type_parameters(), arguments);
        let ref_name = reference_name(&located.qualified_name, declaration.type_parameters(), &scope);
        context.claim(&ref_name, &located.location())?;

        let handle = Type::new(TypeKind::RefObject {
            ref_name: ref_name.clone(),
        });
        if context.reference(&ref_name).is_some() {
            return Ok(handle);
        }
        if context.is_in_progress(&ref_name) {
            debug!("Circular reference to {}", ref_name);
            context.defer(Deferred::ForwardReference { ref_name });
            return Ok(handle);
        }

        begin_reference(&ref_name, context)?;
        let mut chain = Vec::new();
        let (properties, additional_properties) =
            match self.structural_shape(located, &scope, &mut chain, context) {
                Ok(shape) => shape,
                Err(e) => {
                    context.abandon(&ref_name);
                    return Err(e);
                }
            };

        let doc = declaration.doc();
        let deprecated = is_deprecated(doc)
            || matches!(declaration, Declaration::Class(class) if self.matcher.has(class, Role::Deprecated));
        context.complete(ReferenceType {
            ref_name,
            description: description(doc),
            deprecated,
            example: tag_value(doc, "example"),
            shape: ReferenceShape::RefObject {
                properties,
                additional_properties,
            },
        });
        Ok(handle)
    }

    /// Members of a class, interface or object literal alias, inherited ones
    /// first.
    fn structural_shape(
        &self,
        located: &Located<'a>,
        scope: &Scope,
        chain: &mut Vec<String>,
        context: &mut ResolutionContext,
    ) -> Result<ObjectShape> {
        let declaration = located.declaration;
        chain.push(located.qualified_name.clone());

        let mut properties = Vec::new();
        let mut additional_properties = None;
        for parent in declaration.heritage() {
            let parent = substitute(parent, scope);
            let (inherited, inherited_additional) = self.inherited_shape(&parent, chain, context)?;
            for property in inherited {
                merge_inherited(&mut properties, property);
            }
            if inherited_additional.is_some() {
                additional_properties = inherited_additional;
            }
        }

        for member in declaration.members() {
            if let Some(property) = self.property(&member, scope, context)? {
                merge_own(&mut properties, property);
            }
        }
        for index in declaration.index_signatures() {
            additional_properties = Some(Box::new(self.index_signature(index, scope, context)?));
        }

        chain.pop();
        Ok((properties, additional_properties))
    }

    fn inherited_shape(
        &self,
        parent: &TypeNode,
        chain: &mut Vec<String>,
        context: &mut ResolutionContext,
    ) -> Result<ObjectShape> {
        let TypeNode::Reference {
            name,
            type_arguments,
        } = parent
        else {
            return Err(GenerateError::UnsupportedType(parent.to_string()));
        };

        match self.index.find(name).as_slice() {
            [located] if located.declaration.is_structural() => {
                if chain.contains(&located.qualified_name) {
                    return Err(GenerateError::UnsupportedType(format!(
                        "circular inheritance {} -> {}",
                        chain.join(" -> "),
                        located.qualified_name
                    )));
                }
                let scope = bind_type_parameters(located.declaration.type_parameters(), type_arguments);
                self.structural_shape(located, &scope, chain, context)
            }
            [_, _, ..] => Err(GenerateError::AmbiguousDeclaration {
                name: name.clone(),
                locations: self.index.find(name).iter().map(|l| l.location()).collect(),
            }),
            _ => {
                let ty = self.resolve(parent, context)?;
                self.object_shape(&ty, context)
            }
        }
    }

    fn index_signature(
        &self,
        index: &IndexSignature,
        scope: &Scope,
        context: &mut ResolutionContext,
    ) -> Result<Type> {
        if index.key_type != TypeNode::Keyword(Keyword::String) {
            return Err(GenerateError::UnsupportedIndexSignature(format!(
                "{}: {}",
                index.key_name, index.key_type
            )));
        }
        self.resolve(&substitute(&index.value_type, scope), context)
    }

    /// A member as a property; `None` for members documented `@ignore`.
    fn property(
        &self,
        member: &Member<'_>,
        scope: &Scope,
        context: &mut ResolutionContext,
    ) -> Result<Option<Property>> {
        let doc = member.doc;
        if doc.is_some_and(|d| d.has_tag("ignore")) {
            debug!("Ignoring property {}", member.name);
            return Ok(None);
        }

        let hints = Hints::from_doc(doc).or(self.decorator_hints(member));
        let ty = match (member.type_node, member.initializer) {
            (Some(node), _) => self
                .resolve_with(&substitute(node, scope), hints, context)
                .map_err(|e| e.with_context(format!("property '{}'", member.name)))?,
            (None, Some(initializer)) => initializer_type(initializer, hints),
            (None, None) => {
                warn!("Property '{}' has no type annotation, using object", member.name);
                Type::object()
            }
        };

        let default = match member.initializer {
            Some(Expr::Raw(_) | Expr::Path(_)) | None => tag_value(doc, "default"),
            Some(initializer) => Some(initializer.to_json()),
        };

        let mut property = Property::new(
            member.name,
            ty,
            !member.optional && member.initializer.is_none(),
        );
        property.description = description(doc);
        property.default = default;
        property.format = doc
            .and_then(|d| d.tag("format"))
            .filter(|f| !f.is_empty())
            .map(str::to_string);
        property.example = tag_value(doc, "example");
        property.validators = validators(doc);
        property.deprecated = is_deprecated(doc) || self.matcher.has(member, Role::Deprecated);
        Ok(Some(property))
    }
}

fn keyword_type(keyword: Keyword, hints: Hints) -> Result<Type> {
    Ok(match keyword {
        Keyword::String => Type::string(),
        Keyword::Number => Type::new(match hints.number.unwrap_or(NumberFormat::Double) {
            NumberFormat::Integer => TypeKind::Integer,
            NumberFormat::Long => TypeKind::Long,
            NumberFormat::Float => TypeKind::Float,
            NumberFormat::Double => TypeKind::Double,
        }),
        Keyword::Boolean => Type::new(TypeKind::Boolean),
        Keyword::BigInt => Type::new(TypeKind::Long),
        Keyword::Void => Type::void(),
        Keyword::Null | Keyword::Undefined => Type::null_sentinel(),
        Keyword::Any | Keyword::Unknown | Keyword::Object => Type::object(),
        Keyword::Never | Keyword::Symbol => {
            return Err(GenerateError::UnsupportedType(keyword.as_str().to_string()))
        }
    })
}

/// Type of an unannotated property, read off its initializer.
fn initializer_type(initializer: &Expr, hints: Hints) -> Type {
    match initializer {
        Expr::String(_) => Type::string(),
        Expr::Number(_) => keyword_type(Keyword::Number, hints).unwrap_or_else(|_| Type::object()),
        Expr::Bool(_) => Type::new(TypeKind::Boolean),
        Expr::Array(_) => Type::array(Type::object()),
        _ => Type::object(),
    }
}

/// Members of a union whose branches are all enums, in order and without
/// duplicates.
fn enum_union_members(branches: &[Type], context: &ResolutionContext) -> Option<Vec<Value>> {
    let mut members = Vec::new();
    for branch in branches {
        match &branch.kind {
            TypeKind::Enum { members: values } => {
                values.iter().cloned().for_each(|v| push_unique(&mut members, v))
            }
            TypeKind::RefEnum { ref_name } => match &context.reference(ref_name)?.shape {
                ReferenceShape::RefEnum { members: values, .. } => {
                    values.iter().cloned().for_each(|v| push_unique(&mut members, v))
                }
                _ => return None,
            },
            _ => return None,
        }
    }
    Some(members)
}

/// `T | T[]` as the array type.
fn single_or_array(branches: &[Type]) -> Option<Type> {
    let [first, second] = branches else {
        return None;
    };
    [(first, second), (second, first)]
        .into_iter()
        .find_map(|(array, single)| match &array.kind {
            TypeKind::Array { element_type } if element_type.as_ref() == single => {
                Some(array.clone())
            }
            _ => None,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotations::{build_effective_mapping, EffectiveMapping, MappingConfig};
    use crate::parser::{AstParser, ParsedFile};
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::path::Path;
    use std::rc::Rc;

    struct Program {
        files: Vec<ParsedFile>,
        mapping: EffectiveMapping,
    }

    impl Program {
        fn new(sources: &[(&str, &str)]) -> Self {
            Program {
                files: sources
                    .iter()
                    .map(|(name, source)| AstParser::parse_source(Path::new(name), source).unwrap())
                    .collect(),
                mapping: build_effective_mapping(&MappingConfig::default()),
            }
        }

        fn single(source: &str) -> Self {
            Program::new(&[("models.ts", source)])
        }

        fn resolve(&self, type_text: &str, context: &mut ResolutionContext) -> Result<Type> {
            let index = DeclarationIndex::build(&self.files);
            let matcher = AnnotationMatcher::new(&self.mapping);
            let resolver = TypeResolver::new(&index, &matcher);
            resolver.resolve(&type_node(type_text), context)
        }
    }

    fn type_node(text: &str) -> TypeNode {
        let source = format!("type Subject = {};", text);
        let parsed = AstParser::parse_source(Path::new("subject.ts"), &source).unwrap();
        match parsed.syntax_tree.statements.into_iter().next() {
            Some(Statement::TypeAlias(alias)) => alias.type_node,
            other => panic!("expected alias, got {:?}", other),
        }
    }

    fn ref_object(name: &str) -> Type {
        Type::new(TypeKind::RefObject {
            ref_name: name.to_string(),
        })
    }

    fn properties(context: &ResolutionContext, name: &str) -> Vec<Property> {
        context.reference(name).unwrap().properties().to_vec()
    }

    #[test]
    fn test_keywords_and_precision() {
        let program = Program::single(
            r#"
            /** @isInt */
            type Id = number;
            "#,
        );
        let mut context = ResolutionContext::new();

        assert_eq!(program.resolve("number", &mut context).unwrap().kind, TypeKind::Double);
        assert_eq!(program.resolve("bigint", &mut context).unwrap().kind, TypeKind::Long);
        assert_eq!(program.resolve("any", &mut context).unwrap(), Type::object());
        assert_eq!(program.resolve("null", &mut context).unwrap(), Type::null_sentinel());

        let id = program.resolve("Id", &mut context).unwrap();
        assert_eq!(id.ref_name(), Some("Id"));
        match &context.reference("Id").unwrap().shape {
            ReferenceShape::RefAlias { aliased_type, .. } => {
                assert_eq!(aliased_type.kind, TypeKind::Integer)
            }
            other => panic!("expected alias, got {:?}", other),
        }

        assert!(matches!(
            program.resolve("never", &mut context),
            Err(GenerateError::UnsupportedType(text)) if text == "never"
        ));
    }

    #[test]
    fn test_resolving_twice_returns_cached_reference() {
        let program = Program::single("interface User { id: string; name?: string }");
        let mut context = ResolutionContext::new();

        let first = program.resolve("User", &mut context).unwrap();
        let cached = context.reference("User").unwrap();
        let second = program.resolve("User", &mut context).unwrap();

        assert_eq!(first, second);
        assert!(Rc::ptr_eq(&cached, &context.reference("User").unwrap()));
        assert!(context.deferred().is_empty());
    }

    #[test]
    fn test_self_reference_terminates() {
        let program = Program::single("interface Node { value: string; next?: Node }");
        let mut context = ResolutionContext::new();

        assert_eq!(program.resolve("Node", &mut context).unwrap(), ref_object("Node"));
        assert_eq!(
            context.deferred(),
            &[Deferred::ForwardReference {
                ref_name: "Node".to_string()
            }]
        );

        let table = context.finish().unwrap();
        let next = &table["Node"].properties()[1];
        assert_eq!(next.name, "next");
        assert!(!next.required);
        assert_eq!(next.ty, ref_object("Node"));
    }

    #[test]
    fn test_mutual_reference_terminates() {
        let program = Program::single(
            r#"
            interface Author { name: string; books: Book[] }
            interface Book { title: string; author?: Author }
            "#,
        );
        let mut context = ResolutionContext::new();
        program.resolve("Author", &mut context).unwrap();

        let table = context.finish().unwrap();
        assert_eq!(
            table["Book"].properties()[1].ty,
            ref_object("Author")
        );
        assert_eq!(
            table["Author"].properties()[1].ty,
            Type::array(ref_object("Book"))
        );
    }

    #[test]
    fn test_generic_instantiations_are_distinct() {
        let program = Program::single("interface Box<T> { value: T; items: T[] }");
        let mut context = ResolutionContext::new();

        let strings = program.resolve("Box<string>", &mut context).unwrap();
        let numbers = program.resolve("Box<number>", &mut context).unwrap();
        assert_eq!(strings.ref_name(), Some("BoxString"));
        assert_eq!(numbers.ref_name(), Some("BoxNumber"));

        assert_eq!(properties(&context, "BoxString")[0].ty, Type::string());
        assert_eq!(
            properties(&context, "BoxNumber")[1].ty,
            Type::array(Type::new(TypeKind::Double))
        );
    }

    #[test]
    fn test_generic_defaults_and_nested_arguments() {
        let program = Program::single(
            r#"
            interface Page<T = string> { items: T[]; total: number }
            interface User { id: string }
            "#,
        );
        let mut context = ResolutionContext::new();

        assert_eq!(
            program.resolve("Page", &mut context).unwrap().ref_name(),
            Some("PageString")
        );
        assert_eq!(
            program.resolve("Page<User[]>", &mut context).unwrap().ref_name(),
            Some("PageUserArray")
        );
        assert_eq!(
            properties(&context, "PageUserArray")[0].ty,
            Type::array(Type::array(ref_object("User")))
        );
    }

    #[test]
    fn test_union_with_null_is_nullable_branch() {
        let program = Program::single("interface User { id: string }");
        let mut context = ResolutionContext::new();

        assert_eq!(
            program.resolve("string | null", &mut context).unwrap(),
            Type::string().into_nullable()
        );
        assert_eq!(
            program.resolve("User | undefined | null", &mut context).unwrap(),
            ref_object("User").into_nullable()
        );
        assert_eq!(
            program.resolve("string | number", &mut context).unwrap(),
            Type::object()
        );
        assert_eq!(
            program.resolve("User | User[]", &mut context).unwrap(),
            Type::array(ref_object("User"))
        );
    }

    #[test]
    fn test_literal_union_flattens_to_enum() {
        let program = Program::single(
            r#"
            type Status = 'on' | 'off';
            enum Color { Red = 'RED', Green = 'GREEN' }
            "#,
        );
        let mut context = ResolutionContext::new();

        assert_eq!(
            program.resolve("'a' | 'b' | 'a'", &mut context).unwrap(),
            Type::enumeration(vec![json!("a"), json!("b")])
        );
        assert_eq!(
            program.resolve("Status | 'idle'", &mut context).unwrap(),
            Type::enumeration(vec![json!("on"), json!("off"), json!("idle")])
        );
        assert_eq!(
            program.resolve("1 | 2 | null", &mut context).unwrap(),
            Type::enumeration(vec![json!(1), json!(2)]).into_nullable()
        );
        assert!(context.reference("Status").is_none());

        assert_eq!(
            program.resolve("Color | 'BLUE'", &mut context).unwrap(),
            Type::enumeration(vec![json!("RED"), json!("GREEN"), json!("BLUE")])
        );
    }

    #[test]
    fn test_enum_declarations_and_members() {
        let program = Program::single(
            r#"
            /** Log level */
            enum Level { Low, High = 5, Max }
            enum Dup { A = 1, B = 1 }
            "#,
        );
        let mut context = ResolutionContext::new();

        let level = program.resolve("Level", &mut context).unwrap();
        assert_eq!(
            level,
            Type::new(TypeKind::RefEnum {
                ref_name: "Level".to_string()
            })
        );
        let reference = context.reference("Level").unwrap();
        assert_eq!(reference.description.as_deref(), Some("Log level"));
        assert_eq!(
            reference.shape,
            ReferenceShape::RefEnum {
                members: vec![json!(0), json!(5), json!(6)],
                member_names: Some(vec!["Low".into(), "High".into(), "Max".into()]),
            }
        );

        program.resolve("Dup", &mut context).unwrap();
        assert!(matches!(
            &context.reference("Dup").unwrap().shape,
            ReferenceShape::RefEnum { member_names: None, .. }
        ));

        assert_eq!(
            program.resolve("Level.High", &mut context).unwrap(),
            Type::enumeration(vec![json!(5)])
        );
    }

    #[test]
    fn test_heritage_merges_inherited_then_own() {
        let program = Program::single(
            r#"
            interface Base {
                /** The identifier */
                id: string;
                name: string;
            }
            interface Audited<T> { createdBy: T }
            interface User extends Base, Audited<number> {
                id: string;
                email?: string;
            }
            "#,
        );
        let mut context = ResolutionContext::new();
        program.resolve("User", &mut context).unwrap();

        let user = properties(&context, "User");
        let names: Vec<&str> = user.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["id", "name", "createdBy", "email"]);
        assert_eq!(user[0].description.as_deref(), Some("The identifier"));
        assert_eq!(user[2].ty.kind, TypeKind::Double);
        assert!(context.reference("Base").is_none());
    }

    #[test]
    fn test_self_expanding_generic_is_error() {
        let program = Program::single(
            r#"
            interface Wrap<T> { value: T; next: Wrap<T[]> }
            type Grow<T> = { next?: Grow<T[]> };
            "#,
        );

        let mut context = ResolutionContext::new();
        let err = program.resolve("Wrap<string>", &mut context).unwrap_err();
        assert!(matches!(
            err.root(),
            GenerateError::UnsupportedType(text) if text.contains("levels deep")
        ));
        assert!(err.to_string().starts_with("property 'next': "));
        assert_eq!(context.depth(), 0);
        assert!(context.reference("WrapString").is_none());

        let mut context = ResolutionContext::new();
        let err = program.resolve("Grow<number>", &mut context).unwrap_err();
        assert!(matches!(err.root(), GenerateError::UnsupportedType(_)));
        assert_eq!(context.depth(), 0);
    }

    #[test]
    fn test_nested_generic_below_depth_limit() {
        let program = Program::single(
            r#"
            interface Box<T> { value: T }
            interface Page<T> { items: Box<Box<Box<T>>>[] }
            "#,
        );
        let mut context = ResolutionContext::new();
        let page = program.resolve("Page<string>", &mut context).unwrap();
        assert_eq!(page.ref_name(), Some("PageString"));
        assert!(context.reference("BoxBoxBoxString").is_some());
        assert_eq!(context.depth(), 0);
    }

    #[test]
    fn test_heritage_cycle_is_error() {
        let program = Program::single(
            r#"
            interface A extends B { a: string }
            interface B extends A { b: string }
            "#,
        );
        let mut context = ResolutionContext::new();
        let err = program.resolve("A", &mut context).unwrap_err();
        assert!(matches!(err, GenerateError::UnsupportedType(text) if text.contains("circular inheritance")));
        assert!(!context.is_in_progress("A"));
    }

    #[test]
    fn test_class_members() {
        let program = Program::single(
            r#"
            @Deprecated()
            export class Account {
                id: string;
                private secret: string;
                protected internal: string;
                static count = 0;
                retries = 3;
                label?: string;
                constructor(public owner: string, private token: string) {}
            }
            "#,
        );
        let mut context = ResolutionContext::new();
        program.resolve("Account", &mut context).unwrap();

        let account = context.reference("Account").unwrap();
        assert!(account.deprecated);
        let props = account.properties();
        let names: Vec<&str> = props.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["id", "retries", "label", "owner"]);
        assert!(props[0].required);
        assert!(!props[1].required);
        assert_eq!(props[1].default, Some(json!(3)));
        assert_eq!(props[1].ty.kind, TypeKind::Double);
        assert!(!props[2].required);
        assert!(props[3].required);
    }

    #[test]
    fn test_property_documentation() {
        let program = Program::single(
            r#"
            interface Signup {
                /**
                 * Login name
                 * @minLength 3 too short
                 * @pattern ^[a-z]+$
                 * @example "jane"
                 */
                login: string;
                /**
                 * @isInt
                 * @minimum 0
                 */
                age: number;
                /** @ignore */
                internal: string;
                /**
                 * @deprecated
                 * @default 10
                 * @format int32
                 */
                legacy: number;
            }
            "#,
        );
        let mut context = ResolutionContext::new();
        program.resolve("Signup", &mut context).unwrap();

        let props = properties(&context, "Signup");
        assert_eq!(props.len(), 3);

        let login = &props[0];
        assert_eq!(login.description.as_deref(), Some("Login name"));
        assert_eq!(login.example, Some(json!("jane")));
        assert_eq!(
            login.validators["minLength"],
            Validator {
                value: json!(3),
                error_msg: Some("too short".to_string())
            }
        );
        assert_eq!(login.validators["pattern"].value, json!("^[a-z]+$"));

        assert_eq!(props[1].ty.kind, TypeKind::Integer);
        assert_eq!(props[1].validators["minimum"].value, json!(0));

        assert!(props[2].deprecated);
        assert_eq!(props[2].default, Some(json!(10)));
        assert_eq!(props[2].format.as_deref(), Some("int32"));
    }

    #[test]
    fn test_index_signatures() {
        let program = Program::single(
            r#"
            interface Scores { [player: string]: number }
            interface ByIndex { [index: number]: string }
            "#,
        );
        let mut context = ResolutionContext::new();

        program.resolve("Scores", &mut context).unwrap();
        assert_eq!(
            context.reference("Scores").unwrap().shape,
            ReferenceShape::RefObject {
                properties: vec![],
                additional_properties: Some(Box::new(Type::new(TypeKind::Double))),
            }
        );

        let err = program.resolve("ByIndex", &mut context).unwrap_err();
        assert!(matches!(
            err,
            GenerateError::UnsupportedIndexSignature(text) if text == "index: number"
        ));
    }

    #[test]
    fn test_builtin_wrappers() {
        let program = Program::single("interface User { id: string; name?: string }");
        let mut context = ResolutionContext::new();

        assert_eq!(
            program.resolve("Promise<string[]>", &mut context).unwrap(),
            Type::array(Type::string())
        );
        assert_eq!(
            program.resolve("Date", &mut context).unwrap().kind,
            TypeKind::Datetime
        );
        assert_eq!(
            program.resolve("Buffer", &mut context).unwrap().kind,
            TypeKind::Buffer
        );
        assert_eq!(
            program.resolve("Record<string, number>", &mut context).unwrap(),
            Type::new(TypeKind::NestedObjectLiteral {
                properties: vec![],
                additional_properties: Some(Box::new(Type::new(TypeKind::Double))),
            })
        );

        let partial = program.resolve("Partial<User>", &mut context).unwrap();
        match partial.kind {
            TypeKind::NestedObjectLiteral { properties, .. } => {
                assert!(properties.iter().all(|p| !p.required))
            }
            other => panic!("expected literal, got {:?}", other),
        }

        let picked = program.resolve("Pick<User, 'id'>", &mut context).unwrap();
        assert_eq!(
            picked,
            Type::new(TypeKind::NestedObjectLiteral {
                properties: vec![Property::new("id", Type::string(), true)],
                additional_properties: None,
            })
        );
        let omitted = program.resolve("Omit<User, 'id'>", &mut context).unwrap();
        match omitted.kind {
            TypeKind::NestedObjectLiteral { properties, .. } => {
                assert_eq!(properties[0].name, "name")
            }
            other => panic!("expected literal, got {:?}", other),
        }
    }

    #[test]
    fn test_user_declaration_shadows_builtin() {
        let program = Program::single("interface File { name: string }");
        let mut context = ResolutionContext::new();
        assert_eq!(program.resolve("File", &mut context).unwrap(), ref_object("File"));
    }

    #[test]
    fn test_tuples_and_intersections() {
        let program = Program::single(
            r#"
            interface A { a: string }
            interface B { b: number; a: number }
            "#,
        );
        let mut context = ResolutionContext::new();

        assert_eq!(
            program.resolve("[string, string]", &mut context).unwrap(),
            Type::array(Type::string())
        );
        assert_eq!(
            program.resolve("[string, boolean]", &mut context).unwrap(),
            Type::array(Type::new(TypeKind::Union {
                types: vec![Type::string(), Type::new(TypeKind::Boolean)]
            }))
        );

        let both = program.resolve("A & B & { c: string }", &mut context).unwrap();
        let TypeKind::Intersection { types } = &both.kind else {
            panic!("expected intersection, got {:?}", both);
        };
        assert_eq!(types.len(), 3);

        let index = DeclarationIndex::build(&program.files);
        let matcher = AnnotationMatcher::new(&program.mapping);
        let resolver = TypeResolver::new(&index, &matcher);
        let (merged, _) = resolver.object_shape(&both, &context).unwrap();
        let names: Vec<&str> = merged.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
        assert_eq!(merged[0].ty.kind, TypeKind::Double);
    }

    #[test]
    fn test_unresolvable_and_ambiguous_names() {
        let program = Program::new(&[
            ("a.ts", "export interface User { id: string }"),
            ("b.ts", "\nexport interface User { id: number }"),
        ]);
        let mut context = ResolutionContext::new();

        assert!(matches!(
            program.resolve("Missing", &mut context),
            Err(GenerateError::UnresolvableType(name)) if name == "Missing"
        ));
        match program.resolve("User", &mut context) {
            Err(GenerateError::AmbiguousDeclaration { name, locations }) => {
                assert_eq!(name, "User");
                assert_eq!(locations, vec!["a.ts:1", "b.ts:2"]);
            }
            other => panic!("expected ambiguity, got {:?}", other),
        }
    }

    #[test]
    fn test_unsupported_shapes_carry_their_text() {
        let program = Program::single("interface User { id: string }");
        let mut context = ResolutionContext::new();
        assert!(matches!(
            program.resolve("keyof User", &mut context),
            Err(GenerateError::UnsupportedType(text)) if text == "keyof User"
        ));
    }

    #[test]
    fn test_namespace_members_share_one_reference() {
        let program = Program::single(
            "export namespace Api { export interface Item { id: string } }",
        );
        let mut context = ResolutionContext::new();

        assert_eq!(
            program.resolve("Item", &mut context).unwrap(),
            ref_object("Api.Item")
        );
        assert_eq!(
            program.resolve("Api.Item", &mut context).unwrap(),
            ref_object("Api.Item")
        );
    }

    #[test]
    fn test_generated_name_colliding_with_declaration() {
        let program = Program::single(
            r#"
            interface Box<T> { value: T }
            interface BoxString { other: number }
            "#,
        );
        let mut context = ResolutionContext::new();
        program.resolve("Box<string>", &mut context).unwrap();

        assert!(matches!(
            program.resolve("BoxString", &mut context),
            Err(GenerateError::DuplicateReferenceName { name, .. }) if name == "BoxString"
        ));
    }

    #[test]
    fn test_validators_from_doc() {
        let doc = JsDoc::parse(" @maxItems 5\n @uniqueItems no duplicates\n @minDate 2020-01-01");
        let validators = validators(Some(&doc));
        assert_eq!(validators["maxItems"].value, json!(5));
        assert_eq!(validators["uniqueItems"].value, json!(true));
        assert_eq!(
            validators["uniqueItems"].error_msg.as_deref(),
            Some("no duplicates")
        );
        assert_eq!(validators["minDate"].value, json!("2020-01-01"));
    }
}
