//! Declarative decorator tables.
//!
//! Each dialect maps semantic [`Role`]s to the concrete decorator names that
//! express them, together with the rules for reading values out of their
//! arguments. The built-in table can be used without any third-party dialect.

use crate::metadata::HttpVerb;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A capability the generator needs expressed in source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Role {
    ClassPath,
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Head,
    Options,
    Tags,
    Security,
    NoSecurity,
    Hidden,
    Deprecated,
    OperationId,
    Summary,
    Description,
    Produces,
    Consumes,
    Response,
    SuccessResponse,
    Example,
    Context,
    GenericParam,
    Query,
    FormField,
    Body,
    Header,
    Cookie,
    Path,
    UploadedFile,
    UploadedFiles,
    IsInt,
    IsLong,
    IsFloat,
    IsDouble,
}

impl Role {
    pub const ALL: [Role; 35] = [
        Role::ClassPath,
        Role::Get,
        Role::Post,
        Role::Put,
        Role::Patch,
        Role::Delete,
        Role::Head,
        Role::Options,
        Role::Tags,
        Role::Security,
        Role::NoSecurity,
        Role::Hidden,
        Role::Deprecated,
        Role::OperationId,
        Role::Summary,
        Role::Description,
        Role::Produces,
        Role::Consumes,
        Role::Response,
        Role::SuccessResponse,
        Role::Example,
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
        Role::IsInt,
        Role::IsLong,
        Role::IsFloat,
        Role::IsDouble,
    ];

    pub const VERBS: [Role; 7] = [
        Role::Get,
        Role::Post,
        Role::Put,
        Role::Patch,
        Role::Delete,
        Role::Head,
        Role::Options,
    ];

    pub fn verb(self) -> Option<HttpVerb> {
        Some(match self {
            Role::Get => HttpVerb::Get,
            Role::Post => HttpVerb::Post,
            Role::Put => HttpVerb::Put,
            Role::Patch => HttpVerb::Patch,
            Role::Delete => HttpVerb::Delete,
            Role::Head => HttpVerb::Head,
            Role::Options => HttpVerb::Options,
            _ => return None,
        })
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// A named value a role's decorator can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PropertyKey {
    Path,
    Name,
    Status,
    Description,
    Example,
    Values,
    Type,
    Scopes,
    Options,
    Summary,
    OperationId,
    Headers,
}

/// Which argument list a rule reads from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Slot {
    /// `@Dec(value0, value1)`
    Value,
    /// `@Dec<Type0, Type1>()`
    Type,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Pick {
    One(usize),
    All,
}

/// How to read one property out of a decorator's arguments.
///
/// When `field` is set and the selected argument is an object literal, the named
/// field of that object is read instead; any other argument is used as is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawRule")]
pub struct ExtractionRule {
    pub slot: Slot,
    pub pick: Pick,
    pub field: Option<String>,
}

/// Configuration form: `{ "slot": "type", "position": 1 }`, `{ "all": true }`.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawRule {
    #[serde(default = "default_slot")]
    slot: Slot,
    #[serde(default)]
    position: usize,
    #[serde(default)]
    all: bool,
    field: Option<String>,
}

fn default_slot() -> Slot {
    Slot::Value
}

impl From<RawRule> for ExtractionRule {
    fn from(raw: RawRule) -> Self {
        ExtractionRule {
            slot: raw.slot,
            pick: if raw.all {
                Pick::All
            } else {
                Pick::One(raw.position)
            },
            field: raw.field,
        }
    }
}

impl Default for ExtractionRule {
    fn default() -> Self {
        ExtractionRule::value(0)
    }
}

impl ExtractionRule {
    pub fn value(position: usize) -> Self {
        ExtractionRule {
            slot: Slot::Value,
            pick: Pick::One(position),
            field: None,
        }
    }

    pub fn all_values() -> Self {
        ExtractionRule {
            slot: Slot::Value,
            pick: Pick::All,
            field: None,
        }
    }

    pub fn type_argument(position: usize) -> Self {
        ExtractionRule {
            slot: Slot::Type,
            pick: Pick::One(position),
            field: None,
        }
    }

    pub fn field(position: usize, field: &str) -> Self {
        ExtractionRule {
            slot: Slot::Value,
            pick: Pick::One(position),
            field: Some(field.to_string()),
        }
    }
}

/// One concrete decorator implementing a role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Representation {
    /// Decorator name, matched against the full or the last dotted segment
    pub name: String,
    #[serde(default)]
    pub properties: BTreeMap<PropertyKey, ExtractionRule>,
}

impl Representation {
    pub fn new(name: &str) -> Self {
        Representation {
            name: name.to_string(),
            properties: BTreeMap::new(),
        }
    }

    pub fn with(mut self, key: PropertyKey, rule: ExtractionRule) -> Self {
        self.properties.insert(key, rule);
        self
    }

    /// The extraction rule for a property; unspecified properties read the
    /// first value argument.
    pub fn rule(&self, key: PropertyKey) -> ExtractionRule {
        self.properties.get(&key).cloned().unwrap_or_default()
    }
}

/// Role to representations, in lookup order.
pub type DialectTable = BTreeMap<Role, Vec<Representation>>;

/// A third-party decorator convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Dialect {
    #[serde(rename = "nestjs")]
    Nestjs,
    #[serde(rename = "routing-controllers")]
    RoutingControllers,
}

impl Dialect {
    pub const ALL: [Dialect; 2] = [Dialect::Nestjs, Dialect::RoutingControllers];

    pub fn name(self) -> &'static str {
        match self {
            Dialect::Nestjs => "nestjs",
            Dialect::RoutingControllers => "routing-controllers",
        }
    }

    pub fn from_name(name: &str) -> Option<Dialect> {
        Dialect::ALL.into_iter().find(|d| d.name() == name)
    }

    /// Modules whose import signals that the dialect is in use.
    pub fn modules(self) -> &'static [&'static str] {
        match self {
            Dialect::Nestjs => &["@nestjs/common", "@nestjs/swagger"],
            Dialect::RoutingControllers => &["routing-controllers"],
        }
    }

    pub fn table(self) -> &'static DialectTable {
        match self {
            Dialect::Nestjs => &NESTJS,
            Dialect::RoutingControllers => &ROUTING_CONTROLLERS,
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The built-in table.
pub fn builtin() -> &'static DialectTable {
    &BUILTIN
}

/// Representations a table declares for a role; empty when unsupported.
pub fn lookup(table: &DialectTable, role: Role) -> &[Representation] {
    table.get(&role).map(Vec::as_slice).unwrap_or(&[])
}

fn named(names: &[&str]) -> Vec<Representation> {
    names.iter().map(|name| Representation::new(name)).collect()
}

fn with_key(names: &[&str], key: PropertyKey, rule: ExtractionRule) -> Vec<Representation> {
    names
        .iter()
        .map(|name| Representation::new(name).with(key, rule.clone()))
        .collect()
}

fn verbs(table: &mut DialectTable, roles: &[Role]) {
    for role in roles {
        let name = role.to_string();
        table.insert(
            *role,
            with_key(&[name.as_str()], PropertyKey::Path, ExtractionRule::value(0)),
        );
    }
}

fn named_parameter(names: &[&str]) -> Vec<Representation> {
    with_key(names, PropertyKey::Name, ExtractionRule::value(0))
}

static BUILTIN: Lazy<DialectTable> = Lazy::new(|| {
    use PropertyKey::*;

    let mut table = DialectTable::new();
    table.insert(
        Role::ClassPath,
        with_key(&["Route"], Path, ExtractionRule::value(0)),
    );
    verbs(&mut table, &Role::VERBS);
    table.insert(
        Role::Tags,
        with_key(&["Tags"], Values, ExtractionRule::all_values()),
    );
    table.insert(
        Role::Security,
        vec![Representation::new("Security")
            .with(Name, ExtractionRule::value(0))
            .with(Scopes, ExtractionRule::value(1))],
    );
    table.insert(Role::NoSecurity, named(&["NoSecurity"]));
    table.insert(Role::Hidden, named(&["Hidden"]));
    table.insert(Role::Deprecated, named(&["Deprecated"]));
    table.insert(
        Role::OperationId,
        with_key(&["OperationId"], OperationId, ExtractionRule::value(0)),
    );
    table.insert(
        Role::Produces,
        with_key(&["Produces"], Values, ExtractionRule::all_values()),
    );
    table.insert(
        Role::Consumes,
        with_key(&["Consumes"], Values, ExtractionRule::all_values()),
    );
    table.insert(
        Role::Response,
        vec![Representation::new("Response")
            .with(Status, ExtractionRule::value(0))
            .with(Description, ExtractionRule::value(1))
            .with(Example, ExtractionRule::value(2))
            .with(Type, ExtractionRule::type_argument(0))
            .with(Headers, ExtractionRule::type_argument(1))],
    );
    table.insert(
        Role::SuccessResponse,
        vec![Representation::new("SuccessResponse")
            .with(Status, ExtractionRule::value(0))
            .with(Description, ExtractionRule::value(1))],
    );
    table.insert(
        Role::Example,
        vec![Representation::new("Example")
            .with(Example, ExtractionRule::value(0))
            .with(Type, ExtractionRule::type_argument(0))],
    );
    table.insert(Role::Context, named(&["Request", "Inject"]));
    table.insert(
        Role::Query,
        vec![Representation::new("Query")
            .with(Name, ExtractionRule::value(0))
            .with(Options, ExtractionRule::value(1))],
    );
    table.insert(Role::FormField, named_parameter(&["FormField"]));
    table.insert(Role::Body, named(&["Body"]));
    table.insert(Role::Header, named_parameter(&["Header"]));
    table.insert(Role::Cookie, named_parameter(&["Cookie"]));
    table.insert(Role::Path, named_parameter(&["Path"]));
    table.insert(Role::UploadedFile, named_parameter(&["UploadedFile"]));
    table.insert(Role::UploadedFiles, named_parameter(&["UploadedFiles"]));
    table.insert(Role::IsInt, named(&["IsInt"]));
    table.insert(Role::IsLong, named(&["IsLong"]));
    table.insert(Role::IsFloat, named(&["IsFloat"]));
    table.insert(Role::IsDouble, named(&["IsDouble"]));
    table
});

static NESTJS: Lazy<DialectTable> = Lazy::new(|| {
    use PropertyKey::*;

    let mut table = DialectTable::new();
    table.insert(
        Role::ClassPath,
        with_key(&["Controller"], Path, ExtractionRule::field(0, "path")),
    );
    verbs(&mut table, &Role::VERBS);
    table.insert(
        Role::Tags,
        with_key(&["ApiTags"], Values, ExtractionRule::all_values()),
    );
    table.insert(
        Role::Security,
        vec![Representation::new("ApiSecurity")
            .with(Name, ExtractionRule::value(0))
            .with(Scopes, ExtractionRule::value(1))],
    );
    table.insert(
        Role::Hidden,
        named(&["ApiExcludeController", "ApiExcludeEndpoint"]),
    );
    table.insert(
        Role::OperationId,
        with_key(&["ApiOperation"], OperationId, ExtractionRule::field(0, "operationId")),
    );
    table.insert(
        Role::Summary,
        with_key(&["ApiOperation"], Summary, ExtractionRule::field(0, "summary")),
    );
    table.insert(
        Role::Description,
        with_key(&["ApiOperation"], Description, ExtractionRule::field(0, "description")),
    );
    table.insert(
        Role::Produces,
        with_key(&["ApiProduces"], Values, ExtractionRule::all_values()),
    );
    table.insert(
        Role::Consumes,
        with_key(&["ApiConsumes"], Values, ExtractionRule::all_values()),
    );
    table.insert(
        Role::Response,
        vec![Representation::new("ApiResponse")
            .with(Status, ExtractionRule::field(0, "status"))
            .with(Description, ExtractionRule::field(0, "description"))
            .with(Example, ExtractionRule::field(0, "example"))
            .with(Type, ExtractionRule::field(0, "type"))],
    );
    table.insert(
        Role::SuccessResponse,
        with_key(&["HttpCode"], Status, ExtractionRule::value(0)),
    );
    table.insert(
        Role::Context,
        named(&["Req", "Request", "Res", "Response", "Next", "Session", "Ip"]),
    );
    table.insert(Role::Query, named_parameter(&["Query"]));
    table.insert(Role::Body, named(&["Body"]));
    table.insert(Role::Header, named_parameter(&["Headers"]));
    table.insert(Role::Path, named_parameter(&["Param"]));
    table.insert(Role::UploadedFile, named_parameter(&["UploadedFile"]));
    table.insert(Role::UploadedFiles, named_parameter(&["UploadedFiles"]));
    table
});

static ROUTING_CONTROLLERS: Lazy<DialectTable> = Lazy::new(|| {
    use PropertyKey::*;

    let mut table = DialectTable::new();
    table.insert(
        Role::ClassPath,
        with_key(&["JsonController", "Controller"], Path, ExtractionRule::value(0)),
    );
    verbs(
        &mut table,
        &[Role::Get, Role::Post, Role::Put, Role::Patch, Role::Delete, Role::Head],
    );
    table.insert(
        Role::SuccessResponse,
        with_key(&["HttpCode"], Status, ExtractionRule::value(0)),
    );
    table.insert(
        Role::Context,
        named(&["Req", "Res", "Ctx", "Session", "State"]),
    );
    table.insert(Role::GenericParam, named(&["Params"]));
    table.insert(
        Role::Query,
        vec![
            Representation::new("QueryParam")
                .with(Name, ExtractionRule::value(0))
                .with(Options, ExtractionRule::value(1)),
            Representation::new("QueryParams"),
        ],
    );
    table.insert(Role::Body, named(&["Body"]));
    table.insert(Role::Header, named_parameter(&["HeaderParam"]));
    table.insert(Role::Cookie, named_parameter(&["CookieParam"]));
    table.insert(Role::Path, named_parameter(&["Param"]));
    table.insert(Role::UploadedFile, named_parameter(&["UploadedFile"]));
    table.insert(Role::UploadedFiles, named_parameter(&["UploadedFiles"]));
    table
});
