//! Index of the named declarations of a program.

use crate::annotations::Decorated;
use crate::parser::ast::*;
use crate::parser::jsdoc::JsDoc;
use crate::parser::ParsedFile;
use log::debug;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;

/// A named type declaration.
#[derive(Debug, Clone, Copy)]
pub enum Declaration<'a> {
    Class(&'a ClassDecl),
    Interface(&'a InterfaceDecl),
    Alias(&'a TypeAliasDecl),
    Enum(&'a EnumDecl),
}

/// A property-like member of a class, interface or object literal alias.
#[derive(Debug, Clone, Copy)]
pub struct Member<'a> {
    pub name: &'a str,
    pub type_node: Option<&'a TypeNode>,
    pub optional: bool,
    pub initializer: Option<&'a Expr>,
    pub doc: Option<&'a JsDoc>,
    pub decorators: &'a [Decorator],
}

impl Decorated for Member<'_> {
    fn decorators(&self) -> &[Decorator] {
        self.decorators
    }
}

impl<'a> Declaration<'a> {
    pub fn name(&self) -> &'a str {
        match self {
            Declaration::Class(d) => &d.name,
            Declaration::Interface(d) => &d.name,
            Declaration::Alias(d) => &d.name,
            Declaration::Enum(d) => &d.name,
        }
    }

    pub fn line(&self) -> usize {
        match self {
            Declaration::Class(d) => d.line,
            Declaration::Interface(d) => d.line,
            Declaration::Alias(d) => d.line,
            Declaration::Enum(d) => d.line,
        }
    }

    pub fn doc(&self) -> Option<&'a JsDoc> {
        match self {
            Declaration::Class(d) => d.doc.as_ref(),
            Declaration::Interface(d) => d.doc.as_ref(),
            Declaration::Alias(d) => d.doc.as_ref(),
            Declaration::Enum(d) => d.doc.as_ref(),
        }
    }

    pub fn type_parameters(&self) -> &'a [TypeParameter] {
        match self {
            Declaration::Class(d) => &d.type_parameters,
            Declaration::Interface(d) => &d.type_parameters,
            Declaration::Alias(d) => &d.type_parameters,
            Declaration::Enum(_) => &[],
        }
    }

    /// Whether the declaration describes an object shape with members.
    pub fn is_structural(&self) -> bool {
        match self {
            Declaration::Class(_) | Declaration::Interface(_) => true,
            Declaration::Alias(alias) => matches!(alias.type_node, TypeNode::TypeLiteral(_)),
            Declaration::Enum(_) => false,
        }
    }

    /// Types this declaration inherits members from.
    pub fn heritage(&self) -> Vec<&'a TypeNode> {
        match self {
            Declaration::Class(class) => class
                .extends
                .iter()
                .chain(class.implements.iter())
                .collect(),
            Declaration::Interface(interface) => interface.extends.iter().collect(),
            Declaration::Alias(_) | Declaration::Enum(_) => Vec::new(),
        }
    }

    /// Own public instance members, in declaration order.
    pub fn members(&self) -> Vec<Member<'a>> {
        match self {
            Declaration::Class(class) => {
                let mut members = Vec::new();
                for member in &class.members {
                    match member {
                        ClassMember::Property(p)
                            if !p.is_static && p.visibility == Visibility::Public =>
                        {
                            members.push(Member {
                                name: &p.name,
                                type_node: p.type_node.as_ref(),
                                optional: p.optional,
                                initializer: p.initializer.as_ref(),
                                doc: p.doc.as_ref(),
                                decorators: &p.decorators,
                            })
                        }
                        ClassMember::Constructor(parameters) => {
                            members.extend(
                                parameters
                                    .iter()
                                    .filter(|p| p.property_visibility == Some(Visibility::Public))
                                    .map(|p| Member {
                                        name: &p.name,
                                        type_node: p.type_node.as_ref(),
                                        optional: p.optional,
                                        initializer: p.initializer.as_ref(),
                                        doc: None,
                                        decorators: &p.decorators,
                                    }),
                            )
                        }
                        _ => {}
                    }
                }
                members
            }
            Declaration::Interface(interface) => literal_members(&interface.members),
            Declaration::Alias(alias) => match &alias.type_node {
                TypeNode::TypeLiteral(members) => literal_members(members),
                _ => Vec::new(),
            },
            Declaration::Enum(_) => Vec::new(),
        }
    }

    pub fn index_signatures(&self) -> Vec<&'a IndexSignature> {
        match self {
            Declaration::Class(class) => class
                .members
                .iter()
                .filter_map(|m| match m {
                    ClassMember::IndexSignature(index) => Some(index),
                    _ => None,
                })
                .collect(),
            Declaration::Interface(interface) => literal_index_signatures(&interface.members),
            Declaration::Alias(alias) => match &alias.type_node {
                TypeNode::TypeLiteral(members) => literal_index_signatures(members),
                _ => Vec::new(),
            },
            Declaration::Enum(_) => Vec::new(),
        }
    }
}

pub fn literal_members(members: &[TypeMember]) -> Vec<Member<'_>> {
    members
        .iter()
        .filter_map(|m| match m {
            TypeMember::Property(p) => Some(Member {
                name: &p.name,
                type_node: p.type_node.as_ref(),
                optional: p.optional,
                initializer: None,
                doc: p.doc.as_ref(),
                decorators: &[],
            }),
            _ => None,
        })
        .collect()
}

pub fn literal_index_signatures(members: &[TypeMember]) -> Vec<&IndexSignature> {
    members
        .iter()
        .filter_map(|m| match m {
            TypeMember::Index(index) => Some(index),
            _ => None,
        })
        .collect()
}

/// A declaration with the file it was found in.
#[derive(Debug, Clone)]
pub struct Located<'a> {
    pub declaration: Declaration<'a>,
    /// Name including the enclosing namespace, if any
    pub qualified_name: String,
    pub file: &'a Path,
}

impl Located<'_> {
    /// `file:line`, used in error messages and duplicate detection.
    pub fn location(&self) -> String {
        format!("{}:{}", self.file.display(), self.declaration.line())
    }
}

/// A class declaration eligible for controller generation.
#[derive(Debug, Clone, Copy)]
pub struct ClassEntry<'a> {
    pub class: &'a ClassDecl,
    pub file: &'a Path,
}

/// All named declarations of a program, looked up by name.
///
/// Declarations directly inside a namespace are visible both by their plain
/// name and by `Namespace.Name`; deeper nesting is only visible qualified.
#[derive(Debug, Default)]
pub struct DeclarationIndex<'a> {
    declarations: Vec<Located<'a>>,
    by_name: HashMap<String, Vec<usize>>,
    classes: Vec<ClassEntry<'a>>,
}

impl<'a> DeclarationIndex<'a> {
    pub fn build(files: &'a [ParsedFile]) -> Self {
        let mut index = DeclarationIndex::default();
        for file in files {
            index.add_statements(&file.syntax_tree.statements, &file.path, None, 0);
        }
        debug!(
            "Indexed {} declarations ({} classes)",
            index.declarations.len(),
            index.classes.len()
        );
        index
    }

    fn add_statements(
        &mut self,
        statements: &'a [Statement],
        file: &'a Path,
        namespace: Option<&str>,
        depth: usize,
    ) {
        for statement in statements {
            let declaration = match statement {
                Statement::Class(class) => {
                    if depth <= 1 {
                        self.classes.push(ClassEntry { class, file });
                    }
                    Declaration::Class(class)
                }
                Statement::Interface(interface) => Declaration::Interface(interface),
                Statement::TypeAlias(alias) => Declaration::Alias(alias),
                Statement::Enum(enumeration) => Declaration::Enum(enumeration),
                Statement::Namespace(namespace_decl) => {
                    let qualified = match namespace {
                        Some(outer) => format!("{}.{}", outer, namespace_decl.name),
                        None => namespace_decl.name.clone(),
                    };
                    self.add_statements(&namespace_decl.statements, file, Some(&qualified), depth + 1);
                    continue;
                }
            };

            let name = declaration.name();
            let qualified_name = match namespace {
                Some(outer) => format!("{}.{}", outer, name),
                None => name.to_string(),
            };

            let position = self.declarations.len();
            if depth <= 1 {
                self.by_name.entry(name.to_string()).or_default().push(position);
            }
            if qualified_name != name {
                self.by_name
                    .entry(qualified_name.clone())
                    .or_default()
                    .push(position);
            }
            self.declarations.push(Located {
                declaration,
                qualified_name,
                file,
            });
        }
    }

    /// Every declaration visible under `name`.
    pub fn find(&self, name: &str) -> Vec<&Located<'a>> {
        self.by_name
            .get(name)
            .map(|positions| positions.iter().map(|p| &self.declarations[*p]).collect())
            .unwrap_or_default()
    }

    /// Class declarations in file and source order.
    pub fn classes(&self) -> &[ClassEntry<'a>] {
        &self.classes
    }
}

/// Type parameter name to the type it stands for.
pub type Scope = BTreeMap<String, TypeNode>;

/// Binds declared type parameters to arguments, falling back to defaults and
/// then to `unknown`.
pub fn bind_type_parameters(parameters: &[TypeParameter], arguments: &[TypeNode]) -> Scope {
    let mut scope = Scope::new();
    for (position, parameter) in parameters.iter().enumerate() {
        let bound = arguments
            .get(position)
            .cloned()
            .or_else(|| parameter.default.as_ref().map(|d| substitute(d, &scope)))
            .unwrap_or(TypeNode::Keyword(Keyword::Unknown));
        scope.insert(parameter.name.clone(), bound);
    }
    scope
}

/// Replaces references to type parameters in `node` with their bindings.
pub fn substitute(node: &TypeNode, scope: &Scope) -> TypeNode {
    if scope.is_empty() {
        return node.clone();
    }
    match node {
        TypeNode::Reference {
            name,
            type_arguments,
        } => {
            if type_arguments.is_empty() {
                if let Some(bound) = scope.get(name) {
                    return bound.clone();
                }
            }
            TypeNode::Reference {
                name: name.clone(),
                type_arguments: type_arguments.iter().map(|a| substitute(a, scope)).collect(),
            }
        }
        TypeNode::Array(element) => TypeNode::Array(Box::new(substitute(element, scope))),
        TypeNode::Tuple(elements) => {
            TypeNode::Tuple(elements.iter().map(|e| substitute(e, scope)).collect())
        }
        TypeNode::Union(members) => {
            TypeNode::Union(members.iter().map(|m| substitute(m, scope)).collect())
        }
        TypeNode::Intersection(members) => {
            TypeNode::Intersection(members.iter().map(|m| substitute(m, scope)).collect())
        }
        TypeNode::TypeLiteral(members) => TypeNode::TypeLiteral(
            members
                .iter()
                .map(|member| match member {
                    TypeMember::Property(p) => TypeMember::Property(PropertySignature {
                        type_node: p.type_node.as_ref().map(|t| substitute(t, scope)),
                        ..p.clone()
                    }),
                    TypeMember::Index(index) => TypeMember::Index(IndexSignature {
                        key_name: index.key_name.clone(),
                        key_type: substitute(&index.key_type, scope),
                        value_type: substitute(&index.value_type, scope),
                    }),
                    other => other.clone(),
                })
                .collect(),
        ),
        TypeNode::Keyword(_) | TypeNode::Literal(_) | TypeNode::Unsupported(_) => node.clone(),
    }
}
