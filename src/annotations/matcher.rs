//! Reading semantic roles off decorated declarations.

use super::mapping::EffectiveMapping;
use super::registry::{Pick, PropertyKey, Representation, Role, Slot};
use crate::parser::ast::{
    ClassDecl, Decorator, Expr, MethodDecl, ParameterDecl, PropertyDecl, TypeNode,
};
use serde_json::Value;

/// A syntax node that can carry decorators.
pub trait Decorated {
    fn decorators(&self) -> &[Decorator];
}

impl Decorated for ClassDecl {
    fn decorators(&self) -> &[Decorator] {
        &self.decorators
    }
}

impl Decorated for MethodDecl {
    fn decorators(&self) -> &[Decorator] {
        &self.decorators
    }
}

impl Decorated for ParameterDecl {
    fn decorators(&self) -> &[Decorator] {
        &self.decorators
    }
}

impl Decorated for PropertyDecl {
    fn decorators(&self) -> &[Decorator] {
        &self.decorators
    }
}

/// Arguments selected by an extraction rule.
#[derive(Debug, Clone, PartialEq)]
pub enum ArgumentValue<'a> {
    Expr(&'a Expr),
    Exprs(Vec<&'a Expr>),
    Type(&'a TypeNode),
    Types(Vec<&'a TypeNode>),
}

/// Representation found on a node, with every decorator instance of it.
#[derive(Debug, Clone)]
pub struct AnnotationMatch<'a> {
    pub representation: &'a Representation,
    pub instances: Vec<&'a Decorator>,
}

impl<'a> AnnotationMatch<'a> {
    /// Reads a property from one decorator instance.
    ///
    /// Returns `None` when the rule points past the available arguments.
    pub fn value_of(&self, instance: &'a Decorator, key: PropertyKey) -> Option<ArgumentValue<'a>> {
        let rule = self.representation.rule(key);
        let value = match (rule.slot, rule.pick) {
            (Slot::Value, Pick::One(position)) => {
                ArgumentValue::Expr(instance.arguments.get(position)?)
            }
            (Slot::Value, Pick::All) => {
                if instance.arguments.is_empty() {
                    return None;
                }
                ArgumentValue::Exprs(instance.arguments.iter().collect())
            }
            (Slot::Type, Pick::One(position)) => {
                ArgumentValue::Type(instance.type_arguments.get(position)?)
            }
            (Slot::Type, Pick::All) => {
                if instance.type_arguments.is_empty() {
                    return None;
                }
                ArgumentValue::Types(instance.type_arguments.iter().collect())
            }
        };

        match (&rule.field, value) {
            (Some(field), ArgumentValue::Expr(expr @ Expr::Object(_))) => {
                expr.field(field).map(ArgumentValue::Expr)
            }
            (_, value) => Some(value),
        }
    }

    /// Reads a property from the first instance.
    pub fn value(&self, key: PropertyKey) -> Option<ArgumentValue<'a>> {
        self.value_of(self.instances.first().copied()?, key)
    }

    /// A property as a string; numbers are accepted as their text.
    pub fn string_of(&self, instance: &'a Decorator, key: PropertyKey) -> Option<String> {
        match self.value_of(instance, key)? {
            ArgumentValue::Expr(expr) => expr_string(expr),
            ArgumentValue::Exprs(exprs) => exprs.first().and_then(|e| expr_string(e)),
            _ => None,
        }
    }

    pub fn string(&self, key: PropertyKey) -> Option<String> {
        self.string_of(self.instances.first().copied()?, key)
    }

    /// A property as a list of strings, flattening array literals.
    pub fn strings_of(&self, instance: &'a Decorator, key: PropertyKey) -> Vec<String> {
        let exprs = match self.value_of(instance, key) {
            Some(ArgumentValue::Expr(expr)) => vec![expr],
            Some(ArgumentValue::Exprs(exprs)) => exprs,
            _ => Vec::new(),
        };
        let mut strings = Vec::new();
        for expr in exprs {
            match expr {
                Expr::Array(items) => strings.extend(items.iter().filter_map(expr_string)),
                other => strings.extend(expr_string(other)),
            }
        }
        strings
    }

    /// A property across every instance, in order.
    pub fn all_strings(&self, key: PropertyKey) -> Vec<String> {
        self.instances
            .iter()
            .copied()
            .flat_map(|instance| self.strings_of(instance, key))
            .collect()
    }

    /// A property as a type expression; identifiers passed as values are read as
    /// type references.
    pub fn type_of(&self, instance: &'a Decorator, key: PropertyKey) -> Option<TypeNode> {
        match self.value_of(instance, key)? {
            ArgumentValue::Type(node) => Some(node.clone()),
            ArgumentValue::Types(nodes) => nodes.first().map(|n| (*n).clone()),
            ArgumentValue::Expr(expr) => expr.as_type_reference(),
            ArgumentValue::Exprs(exprs) => exprs.first().and_then(|e| e.as_type_reference()),
        }
    }

    /// A property as JSON.
    pub fn json_of(&self, instance: &'a Decorator, key: PropertyKey) -> Option<Value> {
        match self.value_of(instance, key)? {
            ArgumentValue::Expr(expr) => Some(expr.to_json()),
            ArgumentValue::Exprs(exprs) => {
                Some(Value::Array(exprs.iter().map(|e| e.to_json()).collect()))
            }
            _ => None,
        }
    }
}

fn expr_string(expr: &Expr) -> Option<String> {
    match expr {
        Expr::String(s) => Some(s.clone()),
        Expr::Number(n) => Some(n.clone()),
        _ => None,
    }
}

fn matches_name(decorator: &Decorator, name: &str) -> bool {
    decorator.name == name || decorator.simple_name() == name
}

/// Looks up roles on nodes through an [`EffectiveMapping`].
pub struct AnnotationMatcher<'m> {
    mapping: &'m EffectiveMapping,
}

impl<'m> AnnotationMatcher<'m> {
    pub fn new(mapping: &'m EffectiveMapping) -> Self {
        AnnotationMatcher { mapping }
    }

    /// Finds the first representation of `role`, in mapping order, that has at
    /// least one instance on the node.
    pub fn find<'a, N>(&self, node: &'a N, role: Role) -> Option<AnnotationMatch<'a>>
    where
        N: Decorated + ?Sized,
        'm: 'a,
    {
        self.mapping
            .representations(role)
            .iter()
            .find_map(|representation| {
                let instances: Vec<&Decorator> = node
                    .decorators()
                    .iter()
                    .filter(|d| matches_name(d, &representation.name))
                    .collect();
                (!instances.is_empty()).then_some(AnnotationMatch {
                    representation,
                    instances,
                })
            })
    }

    pub fn has<N: Decorated + ?Sized>(&self, node: &N, role: Role) -> bool {
        self.find(node, role).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotations::mapping::{build_effective_mapping, DialectSelection, MappingConfig};
    use crate::annotations::registry::Dialect;
    use crate::parser::ast::Statement;
    use crate::parser::AstParser;
    use std::path::Path;

    fn class(source: &str) -> ClassDecl {
        let parsed = AstParser::parse_source(Path::new("test.ts"), source).unwrap();
        match parsed.syntax_tree.statements.into_iter().next() {
            Some(Statement::Class(class)) => class,
            other => panic!("expected class, got {:?}", other),
        }
    }

    #[test]
    fn test_find_reads_positional_values() {
        let mapping = build_effective_mapping(&MappingConfig::default());
        let matcher = AnnotationMatcher::new(&mapping);
        let decl = class(
            r#"
            @Route('users')
            @Tags('a', 'b')
            @Tags('c')
            class C {}
            "#,
        );

        let route = matcher.find(&decl, Role::ClassPath).unwrap();
        assert_eq!(route.string(PropertyKey::Path), Some("users".to_string()));

        let tags = matcher.find(&decl, Role::Tags).unwrap();
        assert_eq!(tags.instances.len(), 2);
        assert_eq!(tags.all_strings(PropertyKey::Values), vec!["a", "b", "c"]);

        assert!(matcher.find(&decl, Role::Hidden).is_none());
    }

    #[test]
    fn test_position_beyond_arguments_is_absent() {
        let mapping = build_effective_mapping(&MappingConfig::default());
        let matcher = AnnotationMatcher::new(&mapping);
        let decl = class("@Route() class C {}");

        let route = matcher.find(&decl, Role::ClassPath).unwrap();
        assert_eq!(route.value(PropertyKey::Path), None);
    }

    #[test]
    fn test_type_and_field_extraction() {
        let mapping = build_effective_mapping(&MappingConfig {
            dialects: DialectSelection::One(Dialect::Nestjs),
            ..MappingConfig::default()
        });
        let matcher = AnnotationMatcher::new(&mapping);
        let decl = class(
            r#"
            @Controller({ path: 'cats' })
            @Response<ErrorBody>(404, 'Missing')
            @ApiResponse({ status: 201, description: 'Created', type: [Cat] })
            class C {}
            "#,
        );

        let path = matcher.find(&decl, Role::ClassPath).unwrap();
        assert_eq!(path.string(PropertyKey::Path), Some("cats".to_string()));

        let response = matcher.find(&decl, Role::Response).unwrap();
        assert_eq!(response.representation.name, "Response");
        assert_eq!(
            response.type_of(response.instances[0], PropertyKey::Type),
            Some(TypeNode::reference("ErrorBody"))
        );
        assert_eq!(response.string(PropertyKey::Status), Some("404".to_string()));
    }

    #[test]
    fn test_first_representation_in_mapping_order_wins() {
        let mapping = build_effective_mapping(&MappingConfig {
            dialects: DialectSelection::One(Dialect::Nestjs),
            ..MappingConfig::default()
        });
        let matcher = AnnotationMatcher::new(&mapping);
        let decl = class(
            "@ApiResponse({ status: 201, description: 'Created', type: [Cat] }) class C {}",
        );

        let response = matcher.find(&decl, Role::Response).unwrap();
        assert_eq!(response.representation.name, "ApiResponse");
        assert_eq!(response.string(PropertyKey::Status), Some("201".to_string()));
        assert_eq!(
            response.type_of(response.instances[0], PropertyKey::Type),
            Some(TypeNode::Array(Box::new(TypeNode::reference("Cat"))))
        );
    }

    #[test]
    fn test_qualified_decorator_names() {
        let mapping = build_effective_mapping(&MappingConfig::default());
        let matcher = AnnotationMatcher::new(&mapping);
        let decl = class("@tsoa.Route('x') @Hidden() class C {}");

        assert!(matcher.has(&decl, Role::ClassPath));
        assert!(matcher.has(&decl, Role::Hidden));
        assert!(!matcher.has(&decl, Role::Deprecated));
    }
}
