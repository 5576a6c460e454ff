//! Syntax tree for the declaration subset of TypeScript.
//!
//! Only declarations that can carry endpoint or model information are kept;
//! everything else in a source file is skipped by the parser.

use super::jsdoc::JsDoc;
use std::fmt;

/// A parsed source file: its top-level declarations in source order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SourceFile {
    pub statements: Vec<Statement>,
    /// Module specifiers of all `import` statements
    pub imports: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    Class(ClassDecl),
    Interface(InterfaceDecl),
    TypeAlias(TypeAliasDecl),
    Enum(EnumDecl),
    Namespace(NamespaceDecl),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Decorator {
    /// Callee name, dotted for member access (`Api.Get`)
    pub name: String,
    pub arguments: Vec<Expr>,
    pub type_arguments: Vec<TypeNode>,
    pub line: usize,
}

impl Decorator {
    /// The last segment of the callee name.
    pub fn simple_name(&self) -> &str {
        self.name.rsplit('.').next().unwrap_or(&self.name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Visibility {
    #[default]
    Public,
    Protected,
    Private,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TypeParameter {
    pub name: String,
    pub constraint: Option<TypeNode>,
    pub default: Option<TypeNode>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClassDecl {
    pub name: String,
    pub decorators: Vec<Decorator>,
    pub type_parameters: Vec<TypeParameter>,
    pub extends: Option<TypeNode>,
    pub implements: Vec<TypeNode>,
    pub members: Vec<ClassMember>,
    pub doc: Option<JsDoc>,
    pub line: usize,
    pub is_abstract: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ClassMember {
    Property(PropertyDecl),
    Method(MethodDecl),
    Constructor(Vec<ParameterDecl>),
    IndexSignature(IndexSignature),
}

#[derive(Debug, Clone, PartialEq)]
pub struct PropertyDecl {
    pub name: String,
    pub decorators: Vec<Decorator>,
    pub type_node: Option<TypeNode>,
    pub optional: bool,
    pub readonly: bool,
    pub is_static: bool,
    pub visibility: Visibility,
    pub initializer: Option<Expr>,
    pub doc: Option<JsDoc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MethodDecl {
    pub name: String,
    pub decorators: Vec<Decorator>,
    pub type_parameters: Vec<TypeParameter>,
    pub parameters: Vec<ParameterDecl>,
    pub return_type: Option<TypeNode>,
    pub is_static: bool,
    pub is_async: bool,
    pub visibility: Visibility,
    /// Whether the body contains a `return` with a value
    pub returns_value: bool,
    pub doc: Option<JsDoc>,
    pub line: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParameterDecl {
    pub name: String,
    pub decorators: Vec<Decorator>,
    pub type_node: Option<TypeNode>,
    pub optional: bool,
    pub rest: bool,
    pub initializer: Option<Expr>,
    /// Set for constructor parameter properties (`constructor(public id: string)`)
    pub property_visibility: Option<Visibility>,
    pub readonly: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IndexSignature {
    pub key_name: String,
    pub key_type: TypeNode,
    pub value_type: TypeNode,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InterfaceDecl {
    pub name: String,
    pub type_parameters: Vec<TypeParameter>,
    pub extends: Vec<TypeNode>,
    pub members: Vec<TypeMember>,
    pub doc: Option<JsDoc>,
    pub line: usize,
}

/// Member of an interface body or an object type literal.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeMember {
    Property(PropertySignature),
    Method(String),
    Index(IndexSignature),
}

#[derive(Debug, Clone, PartialEq)]
pub struct PropertySignature {
    pub name: String,
    pub type_node: Option<TypeNode>,
    pub optional: bool,
    pub readonly: bool,
    pub doc: Option<JsDoc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TypeAliasDecl {
    pub name: String,
    pub type_parameters: Vec<TypeParameter>,
    pub type_node: TypeNode,
    pub doc: Option<JsDoc>,
    pub line: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnumDecl {
    pub name: String,
    pub members: Vec<EnumMember>,
    pub is_const: bool,
    pub doc: Option<JsDoc>,
    pub line: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnumMember {
    pub name: String,
    pub initializer: Option<Expr>,
    pub doc: Option<JsDoc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NamespaceDecl {
    pub name: String,
    pub statements: Vec<Statement>,
    pub line: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keyword {
    String,
    Number,
    Boolean,
    BigInt,
    Void,
    Any,
    Unknown,
    Object,
    Null,
    Undefined,
    Never,
    Symbol,
}

impl Keyword {
    pub fn from_ident(ident: &str) -> Option<Keyword> {
        Some(match ident {
            "string" => Keyword::String,
            "number" => Keyword::Number,
            "boolean" => Keyword::Boolean,
            "bigint" => Keyword::BigInt,
            "void" => Keyword::Void,
            "any" => Keyword::Any,
            "unknown" => Keyword::Unknown,
            "object" => Keyword::Object,
            "null" => Keyword::Null,
            "undefined" => Keyword::Undefined,
            "never" => Keyword::Never,
            "symbol" => Keyword::Symbol,
            _ => return None,
        })
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Keyword::String => "string",
            Keyword::Number => "number",
            Keyword::Boolean => "boolean",
            Keyword::BigInt => "bigint",
            Keyword::Void => "void",
            Keyword::Any => "any",
            Keyword::Unknown => "unknown",
            Keyword::Object => "object",
            Keyword::Null => "null",
            Keyword::Undefined => "undefined",
            Keyword::Never => "never",
            Keyword::Symbol => "symbol",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum LiteralType {
    String(String),
    /// Numeric literal text, sign included
    Number(String),
    Boolean(bool),
}

/// A type expression.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeNode {
    Keyword(Keyword),
    Literal(LiteralType),
    Reference {
        name: String,
        type_arguments: Vec<TypeNode>,
    },
    Array(Box<TypeNode>),
    Tuple(Vec<TypeNode>),
    Union(Vec<TypeNode>),
    Intersection(Vec<TypeNode>),
    TypeLiteral(Vec<TypeMember>),
    /// Any shape the parser accepts but does not model; carries the source text
    Unsupported(String),
}

impl TypeNode {
    pub fn reference(name: impl Into<String>) -> TypeNode {
        TypeNode::Reference {
            name: name.into(),
            type_arguments: Vec::new(),
        }
    }
}

impl fmt::Display for TypeNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeNode::Keyword(keyword) => write!(f, "{}", keyword.as_str()),
            TypeNode::Literal(LiteralType::String(s)) => write!(f, "'{}'", s),
            TypeNode::Literal(LiteralType::Number(n)) => write!(f, "{}", n),
            TypeNode::Literal(LiteralType::Boolean(b)) => write!(f, "{}", b),
            TypeNode::Reference {
                name,
                type_arguments,
            } => {
                write!(f, "{}", name)?;
                if !type_arguments.is_empty() {
                    write!(f, "<{}>", join(type_arguments, ", "))?;
                }
                Ok(())
            }
            TypeNode::Array(element) => match element.as_ref() {
                TypeNode::Union(_) | TypeNode::Intersection(_) => write!(f, "({})[]", element),
                _ => write!(f, "{}[]", element),
            },
            TypeNode::Tuple(elements) => write!(f, "[{}]", join(elements, ", ")),
            TypeNode::Union(members) => write!(f, "{}", join(members, " | ")),
            TypeNode::Intersection(members) => write!(f, "{}", join(members, " & ")),
            TypeNode::TypeLiteral(members) => {
                write!(f, "{{ ")?;
                for member in members {
                    match member {
                        TypeMember::Property(p) => {
                            let optional = if p.optional { "?" } else { "" };
                            match &p.type_node {
                                Some(t) => write!(f, "{}{}: {}; ", p.name, optional, t)?,
                                None => write!(f, "{}{}; ", p.name, optional)?,
                            }
                        }
                        TypeMember::Method(name) => write!(f, "{}(); ", name)?,
                        TypeMember::Index(index) => write!(
                            f,
                            "[{}: {}]: {}; ",
                            index.key_name, index.key_type, index.value_type
                        )?,
                    }
                }
                write!(f, "}}")
            }
            TypeNode::Unsupported(text) => write!(f, "{}", text),
        }
    }
}

fn join(nodes: &[TypeNode], separator: &str) -> String {
    nodes
        .iter()
        .map(|n| n.to_string())
        .collect::<Vec<_>>()
        .join(separator)
}

/// Literal expression found in decorator arguments, initializers and enum members.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    String(String),
    /// Numeric literal text, sign included
    Number(String),
    Bool(bool),
    Null,
    Undefined,
    Array(Vec<Expr>),
    Object(Vec<(String, Expr)>),
    /// Identifier or member path (`User`, `HttpStatus.OK`)
    Path(String),
    /// Any other expression; carries the source text
    Raw(String),
}

impl Expr {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Expr::String(s) => Some(s),
            _ => None,
        }
    }

    /// Reads a property of an object literal.
    pub fn field(&self, key: &str) -> Option<&Expr> {
        match self {
            Expr::Object(entries) => entries.iter().find(|(k, _)| k == key).map(|(_, v)| v),
            _ => None,
        }
    }

    /// Converts the expression into a JSON value.
    ///
    /// Paths and raw expressions have no JSON form and become their source text.
    pub fn to_json(&self) -> serde_json::Value {
        use serde_json::Value;
        match self {
            Expr::String(s) => Value::String(s.clone()),
            Expr::Number(n) => number_to_json(n),
            Expr::Bool(b) => Value::Bool(*b),
            Expr::Null | Expr::Undefined => Value::Null,
            Expr::Array(items) => Value::Array(items.iter().map(Expr::to_json).collect()),
            Expr::Object(entries) => Value::Object(
                entries
                    .iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect(),
            ),
            Expr::Path(text) | Expr::Raw(text) => Value::String(text.clone()),
        }
    }

    /// Interprets an identifier passed as a value (`type: User`) as a type reference.
    pub fn as_type_reference(&self) -> Option<TypeNode> {
        match self {
            Expr::Path(name) => Some(match name.as_str() {
                "String" => TypeNode::Keyword(Keyword::String),
                "Number" => TypeNode::Keyword(Keyword::Number),
                "Boolean" => TypeNode::Keyword(Keyword::Boolean),
                _ => TypeNode::reference(name.clone()),
            }),
            Expr::Array(items) if items.len() == 1 => items[0]
                .as_type_reference()
                .map(|t| TypeNode::Array(Box::new(t))),
            _ => None,
        }
    }
}

/// Parses numeric literal text into a JSON number, preferring integers.
pub fn number_to_json(text: &str) -> serde_json::Value {
    let parsed = if let Some(hex) = text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        i64::from_str_radix(hex, 16).ok().map(serde_json::Value::from)
    } else if let Ok(int) = text.parse::<i64>() {
        Some(serde_json::Value::from(int))
    } else {
        text.parse::<f64>()
            .ok()
            .and_then(serde_json::Number::from_f64)
            .map(serde_json::Value::Number)
    };
    parsed.unwrap_or_else(|| serde_json::Value::String(text.to_string()))
}
