//! Canonical, dialect-independent endpoint metadata.
//!
//! This is the model handed to a document emitter: controllers with their
//! methods and parameters, plus a table of named reference types. Canonical types
//! point at named types through handles (`refName`), so a shape is stored once
//! in [`Metadata::reference_types`] no matter how often it is used.

use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

fn is_false(value: &bool) -> bool {
    !*value
}

/// A resolved type.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Type {
    #[serde(flatten)]
    pub kind: TypeKind,
    /// Set when the source type was `T | null` or `T | undefined`
    #[serde(skip_serializing_if = "is_false")]
    pub nullable: bool,
}

/// The shape of a [`Type`], tagged by `typeName` when serialized.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "typeName", rename_all = "camelCase")]
pub enum TypeKind {
    Void,
    String,
    Boolean,
    Integer,
    Long,
    Float,
    Double,
    Date,
    Datetime,
    Buffer,
    Byte,
    Binary,
    Any,
    Object,
    File,
    #[serde(rename_all = "camelCase")]
    Array { element_type: Box<Type> },
    Enum { members: Vec<Value> },
    Union { types: Vec<Type> },
    Intersection { types: Vec<Type> },
    #[serde(rename_all = "camelCase")]
    NestedObjectLiteral {
        properties: Vec<Property>,
        #[serde(skip_serializing_if = "Option::is_none")]
        additional_properties: Option<Box<Type>>,
    },
    #[serde(rename_all = "camelCase")]
    RefObject { ref_name: String },
    #[serde(rename_all = "camelCase")]
    RefEnum { ref_name: String },
    #[serde(rename_all = "camelCase")]
    RefAlias { ref_name: String },
}

impl Type {
    pub fn new(kind: TypeKind) -> Type {
        Type {
            kind,
            nullable: false,
        }
    }

    pub fn void() -> Type {
        Type::new(TypeKind::Void)
    }

    pub fn string() -> Type {
        Type::new(TypeKind::String)
    }

    pub fn object() -> Type {
        Type::new(TypeKind::Object)
    }

    pub fn any() -> Type {
        Type::new(TypeKind::Any)
    }

    pub fn array(element: Type) -> Type {
        Type::new(TypeKind::Array {
            element_type: Box::new(element),
        })
    }

    pub fn enumeration(members: Vec<Value>) -> Type {
        Type::new(TypeKind::Enum { members })
    }

    /// The `[null]` enum standing for `null` / `undefined` inside unions.
    pub fn null_sentinel() -> Type {
        Type::enumeration(vec![Value::Null])
    }

    pub fn into_nullable(mut self) -> Type {
        self.nullable = true;
        self
    }

    pub fn is_void(&self) -> bool {
        matches!(self.kind, TypeKind::Void)
    }

    pub fn is_null_sentinel(&self) -> bool {
        matches!(&self.kind, TypeKind::Enum { members } if members.len() == 1 && members[0].is_null())
    }

    /// The referenced name, for the three handle variants.
    pub fn ref_name(&self) -> Option<&str> {
        match &self.kind {
            TypeKind::RefObject { ref_name }
            | TypeKind::RefEnum { ref_name }
            | TypeKind::RefAlias { ref_name } => Some(ref_name),
            _ => None,
        }
    }
}

impl TypeKind {
    /// The serialized `typeName` tag.
    pub fn name(&self) -> &'static str {
        match self {
            TypeKind::Void => "void",
            TypeKind::String => "string",
            TypeKind::Boolean => "boolean",
            TypeKind::Integer => "integer",
            TypeKind::Long => "long",
            TypeKind::Float => "float",
            TypeKind::Double => "double",
            TypeKind::Date => "date",
            TypeKind::Datetime => "datetime",
            TypeKind::Buffer => "buffer",
            TypeKind::Byte => "byte",
            TypeKind::Binary => "binary",
            TypeKind::Any => "any",
            TypeKind::Object => "object",
            TypeKind::File => "file",
            TypeKind::Array { .. } => "array",
            TypeKind::Enum { .. } => "enum",
            TypeKind::Union { .. } => "union",
            TypeKind::Intersection { .. } => "intersection",
            TypeKind::NestedObjectLiteral { .. } => "nestedObjectLiteral",
            TypeKind::RefObject { .. } => "refObject",
            TypeKind::RefEnum { .. } => "refEnum",
            TypeKind::RefAlias { .. } => "refAlias",
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.kind, self.ref_name()) {
            (_, Some(name)) => write!(f, "{} '{}'", self.kind.name(), name),
            (TypeKind::Array { element_type }, _) => write!(f, "array of {}", element_type),
            (kind, _) => write!(f, "{}", kind.name()),
        }
    }
}

/// A single validation constraint from documentation tags.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Validator {
    pub value: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_msg: Option<String>,
}

pub type Validators = BTreeMap<String, Validator>;

/// A member of an object type.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Property {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: Type,
    pub required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub example: Option<Value>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub validators: Validators,
    #[serde(skip_serializing_if = "is_false")]
    pub deprecated: bool,
}

impl Property {
    pub fn new(name: impl Into<String>, ty: Type, required: bool) -> Property {
        Property {
            name: name.into(),
            ty,
            required,
            description: None,
            default: None,
            format: None,
            example: None,
            validators: Validators::new(),
            deprecated: false,
        }
    }
}

/// A named type stored once in the reference table.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReferenceType {
    pub ref_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "is_false")]
    pub deprecated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub example: Option<Value>,
    #[serde(flatten)]
    pub shape: ReferenceShape,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "typeName", rename_all = "camelCase")]
pub enum ReferenceShape {
    #[serde(rename_all = "camelCase")]
    RefObject {
        properties: Vec<Property>,
        #[serde(skip_serializing_if = "Option::is_none")]
        additional_properties: Option<Box<Type>>,
    },
    #[serde(rename_all = "camelCase")]
    RefEnum {
        members: Vec<Value>,
        #[serde(skip_serializing_if = "Option::is_none")]
        member_names: Option<Vec<String>>,
    },
    #[serde(rename_all = "camelCase")]
    RefAlias {
        aliased_type: Box<Type>,
        #[serde(skip_serializing_if = "Option::is_none")]
        format: Option<String>,
        #[serde(skip_serializing_if = "BTreeMap::is_empty")]
        validators: Validators,
        #[serde(skip_serializing_if = "Option::is_none")]
        default: Option<Value>,
    },
}

impl ReferenceType {
    /// A handle pointing at this reference type.
    pub fn handle(&self) -> Type {
        let ref_name = self.ref_name.clone();
        Type::new(match self.shape {
            ReferenceShape::RefObject { .. } => TypeKind::RefObject { ref_name },
            ReferenceShape::RefEnum { .. } => TypeKind::RefEnum { ref_name },
            ReferenceShape::RefAlias { .. } => TypeKind::RefAlias { ref_name },
        })
    }

    /// Object properties, empty for enums and aliases.
    pub fn properties(&self) -> &[Property] {
        match &self.shape {
            ReferenceShape::RefObject { properties, .. } => properties,
            _ => &[],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HttpVerb {
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Head,
    Options,
}

impl HttpVerb {
    pub fn as_str(self) -> &'static str {
        match self {
            HttpVerb::Get => "get",
            HttpVerb::Post => "post",
            HttpVerb::Put => "put",
            HttpVerb::Patch => "patch",
            HttpVerb::Delete => "delete",
            HttpVerb::Head => "head",
            HttpVerb::Options => "options",
        }
    }

    /// Verbs whose requests may carry a body, form fields or files.
    pub fn supports_body(self) -> bool {
        matches!(
            self,
            HttpVerb::Get | HttpVerb::Post | HttpVerb::Put | HttpVerb::Patch | HttpVerb::Delete
        )
    }
}

impl fmt::Display for HttpVerb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a parameter is carried in the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ParameterLocation {
    Query,
    Path,
    Header,
    Cookie,
    Body,
    FormData,
    /// Framework-injected value (request, response, session)
    Context,
    /// Generic parameter bag, such as all path params as one object
    Param,
}

impl ParameterLocation {
    pub fn as_str(self) -> &'static str {
        match self {
            ParameterLocation::Query => "query",
            ParameterLocation::Path => "path",
            ParameterLocation::Header => "header",
            ParameterLocation::Cookie => "cookie",
            ParameterLocation::Body => "body",
            ParameterLocation::FormData => "formData",
            ParameterLocation::Context => "context",
            ParameterLocation::Param => "param",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Parameter {
    /// Identifier of the parameter in source
    pub parameter_name: String,
    /// Name on the wire
    pub name: String,
    #[serde(rename = "in")]
    pub location: ParameterLocation,
    pub required: bool,
    #[serde(rename = "type")]
    pub ty: Type,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub collection_format: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allow_empty_value: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_items: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_items: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Response {
    pub status: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema: Option<Type>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub examples: Option<Vec<Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub headers: Option<Type>,
}

/// Security requirement: scheme name to required scopes.
pub type Security = BTreeMap<String, Vec<String>>;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Method {
    pub name: String,
    pub http_verb: HttpVerb,
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    pub parameters: Vec<Parameter>,
    pub responses: Vec<Response>,
    pub tags: Vec<String>,
    pub consumes: Vec<String>,
    pub produces: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub security: Option<Vec<Security>>,
    #[serde(skip_serializing_if = "is_false")]
    pub deprecated: bool,
    pub is_hidden: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operation_id: Option<String>,
    /// Success response body type
    #[serde(rename = "type")]
    pub ty: Type,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Controller {
    pub name: String,
    /// Source file the controller was declared in
    pub location: String,
    pub path: String,
    pub methods: Vec<Method>,
    pub consumes: Vec<String>,
    pub produces: Vec<String>,
    pub tags: Vec<String>,
    pub responses: Vec<Response>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub security: Option<Vec<Security>>,
}

/// Result of a generation run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Metadata {
    pub controllers: Vec<Controller>,
    pub reference_types: BTreeMap<String, ReferenceType>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_type_serializes_with_type_name_tag() {
        let ty = Type::array(Type::new(TypeKind::RefObject {
            ref_name: "User".to_string(),
        }))
        .into_nullable();

        assert_eq!(
            serde_json::to_value(&ty).unwrap(),
            json!({
                "typeName": "array",
                "elementType": { "typeName": "refObject", "refName": "User" },
                "nullable": true
            })
        );
    }

    #[test]
    fn test_nested_literal_omits_absent_fields() {
        let ty = Type::new(TypeKind::NestedObjectLiteral {
            properties: vec![Property::new("id", Type::string(), true)],
            additional_properties: None,
        });
        assert_eq!(
            serde_json::to_value(&ty).unwrap(),
            json!({
                "typeName": "nestedObjectLiteral",
                "properties": [
                    { "name": "id", "type": { "typeName": "string" }, "required": true }
                ]
            })
        );
    }

    #[test]
    fn test_reference_type_serialization_and_handle() {
        let reference = ReferenceType {
            ref_name: "Color".to_string(),
            description: Some("Palette".to_string()),
            deprecated: false,
            example: None,
            shape: ReferenceShape::RefEnum {
                members: vec![json!("RED"), json!(2)],
                member_names: Some(vec!["Red".to_string(), "Two".to_string()]),
            },
        };

        assert_eq!(
            serde_json::to_value(&reference).unwrap(),
            json!({
                "refName": "Color",
                "description": "Palette",
                "typeName": "refEnum",
                "members": ["RED", 2],
                "memberNames": ["Red", "Two"]
            })
        );
        assert_eq!(
            reference.handle(),
            Type::new(TypeKind::RefEnum {
                ref_name: "Color".to_string()
            })
        );
        assert!(reference.properties().is_empty());
    }

    #[test]
    fn test_parameter_location_serializes_as_in() {
        let parameter = Parameter {
            parameter_name: "file".to_string(),
            name: "upload".to_string(),
            location: ParameterLocation::FormData,
            required: true,
            ty: Type::new(TypeKind::File),
            description: None,
            default: None,
            collection_format: None,
            allow_empty_value: None,
            min_items: None,
            max_items: None,
        };
        let value = serde_json::to_value(&parameter).unwrap();
        assert_eq!(value["in"], json!("formData"));
        assert_eq!(value["parameterName"], json!("file"));
        assert_eq!(value["type"], json!({ "typeName": "file" }));
    }

    #[test]
    fn test_null_sentinel() {
        assert!(Type::null_sentinel().is_null_sentinel());
        assert!(!Type::enumeration(vec![json!("a")]).is_null_sentinel());
        assert_eq!(HttpVerb::Delete.to_string(), "delete");
        assert!(!HttpVerb::Head.supports_body());
    }
}
