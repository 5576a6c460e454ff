use openapi_from_decorators::{
    config::Config,
    error::GenerateError,
    generator::MetadataGenerator,
    metadata::{HttpVerb, Metadata, ParameterLocation, ReferenceShape, Type, TypeKind},
    serializer::{serialize_json, serialize_yaml},
};
use pretty_assertions::assert_eq;
use serde_json::json;
use tempfile::TempDir;

/// Helper function to create a temporary test project
fn create_test_project(files: Vec<(&str, &str)>) -> TempDir {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");

    for (path, content) in files {
        let file_path = temp_dir.path().join(path);
        if let Some(parent) = file_path.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create parent directories");
        }
        std::fs::write(&file_path, content).expect("Failed to write test file");
    }

    temp_dir
}

/// Writes `config` next to the sources and runs a full generation.
fn generate(temp_dir: &TempDir, config: &str) -> Result<Metadata, GenerateError> {
    let config_path = temp_dir.path().join("api.json");
    std::fs::write(&config_path, config).expect("Failed to write config");
    let config = Config::load(&config_path)?;
    MetadataGenerator::new(config).generate()
}

fn ref_object(name: &str) -> Type {
    Type::new(TypeKind::RefObject {
        ref_name: name.to_string(),
    })
}

fn users_project() -> TempDir {
    create_test_project(vec![
        ("src/models.ts", include_str!("fixtures/models.ts")),
        ("src/users_controller.ts", include_str!("fixtures/users_controller.ts")),
    ])
}

const BUILTIN_CONFIG: &str = r#"{ "metadata": { "entryFile": "src/**/*.ts" } }"#;

#[test]
fn test_builtin_end_to_end_generation() {
    let temp_dir = users_project();
    let metadata = generate(&temp_dir, BUILTIN_CONFIG).expect("Generation failed");

    // The hidden controller is excluded
    assert_eq!(metadata.controllers.len(), 1);
    let controller = &metadata.controllers[0];
    assert_eq!(controller.name, "UsersController");
    assert_eq!(controller.path, "users");
    assert!(controller.location.ends_with("users_controller.ts"));
    assert_eq!(controller.tags, vec!["users"]);
    assert_eq!(
        controller.security.as_ref().unwrap()[0]["jwt"],
        vec!["users:read"]
    );
    assert_eq!(controller.responses[0].status, "500");
    assert_eq!(controller.responses[0].schema, Some(ref_object("ErrorBody")));

    let names: Vec<_> = controller.methods.iter().map(|m| m.name.as_str()).collect();
    assert_eq!(names, vec!["list", "get", "name", "age", "create", "remove"]);
}

#[test]
fn test_builtin_methods_and_parameters() {
    let temp_dir = users_project();
    let metadata = generate(&temp_dir, BUILTIN_CONFIG).expect("Generation failed");
    let methods = &metadata.controllers[0].methods;

    let list = &methods[0];
    assert_eq!(list.http_verb, HttpVerb::Get);
    assert_eq!(list.path, "");
    assert_eq!(list.summary.as_deref(), Some("List users"));
    assert_eq!(list.description.as_deref(), Some("Lists users page by page."));
    assert_eq!(list.ty, ref_object("PageUser"));
    let limit = &list.parameters[0];
    assert_eq!(limit.location, ParameterLocation::Query);
    assert_eq!(limit.default, Some(json!(20)));
    assert!(!limit.required);
    assert_eq!(limit.description.as_deref(), Some("Page size"));
    assert!(!list.parameters[1].required);

    let get = &methods[1];
    assert_eq!(get.path, "{userId}");
    assert_eq!(get.parameters[0].location, ParameterLocation::Path);
    assert_eq!(get.parameters[0].ty.ref_name(), Some("UserId"));
    assert_eq!(get.parameters[1].name, "x-trace");
    assert_eq!(get.parameters[1].location, ParameterLocation::Header);
    let statuses: Vec<_> = get.responses.iter().map(|r| r.status.as_str()).collect();
    assert_eq!(statuses, vec!["404", "200"]);
    assert_eq!(get.responses[1].schema, Some(ref_object("User")));

    let create = &methods[4];
    assert_eq!(create.http_verb, HttpVerb::Post);
    assert!(create.ty.is_void());
    assert_eq!(create.parameters[0].location, ParameterLocation::Body);
    assert_eq!(create.parameters[0].ty, ref_object("CreateUser"));
    assert_eq!(create.responses.len(), 1);
    assert_eq!(create.responses[0].status, "201");
    assert_eq!(create.responses[0].description, "Created");
    assert_eq!(create.responses[0].schema, None);

    let remove = &methods[5];
    assert_eq!(remove.http_verb, HttpVerb::Delete);
    assert!(remove.ty.is_void());
    assert_eq!(remove.responses[0].status, "204");
}

#[test]
fn test_builtin_reference_types() {
    let temp_dir = users_project();
    let metadata = generate(&temp_dir, BUILTIN_CONFIG).expect("Generation failed");
    let types = &metadata.reference_types;

    let names: Vec<_> = types.keys().map(String::as_str).collect();
    assert_eq!(
        names,
        vec![
            "BoxNumber",
            "BoxString",
            "CreateUser",
            "ErrorBody",
            "PageUser",
            "Role",
            "User",
            "UserId"
        ]
    );

    let user = &types["User"];
    assert_eq!(user.description.as_deref(), Some("A registered user."));
    let property = |name: &str| {
        user.properties()
            .iter()
            .find(|p| p.name == name)
            .unwrap_or_else(|| panic!("missing property {}", name))
    };
    assert_eq!(property("id").ty.kind, TypeKind::Integer);
    assert_eq!(property("email").ty, Type::string().into_nullable());
    assert!(!property("email").required);
    assert_eq!(property("role").ty.ref_name(), Some("Role"));
    assert_eq!(
        property("status").ty,
        Type::enumeration(vec![json!("active"), json!("disabled")])
    );
    assert_eq!(property("manager").ty, ref_object("User"));
    assert_eq!(
        property("manager").description.as_deref(),
        Some("The user's manager, if any.")
    );
    assert_eq!(property("tags").ty, Type::array(Type::string()));
    assert_eq!(property("createdAt").ty.kind, TypeKind::Datetime);

    match &types["Role"].shape {
        ReferenceShape::RefEnum {
            members,
            member_names,
        } => {
            assert_eq!(members, &vec![json!("admin"), json!("member")]);
            assert_eq!(
                member_names.as_deref(),
                Some(&["Admin".to_string(), "Member".to_string()][..])
            );
        }
        other => panic!("expected enum, got {:?}", other),
    }

    let page = &types["PageUser"];
    assert_eq!(page.properties()[0].ty, Type::array(ref_object("User")));
    assert_eq!(page.properties()[1].ty.kind, TypeKind::Integer);
    assert_eq!(page.properties()[1].validators["minimum"].value, json!(0));

    assert_eq!(types["BoxString"].properties()[0].ty, Type::string());
    assert_eq!(types["BoxNumber"].properties()[0].ty.kind, TypeKind::Double);
}

#[test]
fn test_serialized_output() {
    let temp_dir = users_project();
    let metadata = generate(&temp_dir, BUILTIN_CONFIG).expect("Generation failed");

    let json = serialize_json(&metadata).expect("Failed to serialize to JSON");
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["controllers"][0]["methods"][0]["httpVerb"], "get");
    assert_eq!(
        value["controllers"][0]["methods"][0]["type"],
        json!({ "typeName": "refObject", "refName": "PageUser" })
    );
    assert_eq!(value["referenceTypes"]["User"]["typeName"], "refObject");

    let yaml = serialize_yaml(&metadata).expect("Failed to serialize to YAML");
    assert!(yaml.contains("refName: User"));
}

#[test]
fn test_minimal_endpoint() {
    let temp_dir = create_test_project(vec![(
        "src/hello.ts",
        r#"
        @Route('mypath')
        export class HelloController {
            @Get()
            public hello(): string {
                return 'hello';
            }
        }
        "#,
    )]);
    let metadata = generate(&temp_dir, BUILTIN_CONFIG).unwrap();
    let value = serde_json::to_value(&metadata.controllers[0]).unwrap();

    assert_eq!(value["path"], "mypath");
    assert_eq!(value["methods"][0]["httpVerb"], "get");
    assert_eq!(value["methods"][0]["path"], "");
    assert_eq!(
        value["methods"][0]["responses"],
        json!([{ "status": "200", "description": "Ok", "schema": { "typeName": "string" } }])
    );
    assert!(metadata.reference_types.is_empty());
}

#[test]
fn test_nestjs_end_to_end_generation() {
    let temp_dir = create_test_project(vec![(
        "src/cats.controller.ts",
        include_str!("fixtures/cats_nestjs.ts"),
    )]);
    let metadata = generate(
        &temp_dir,
        r#"{ "metadata": { "entryFile": "src/**/*.ts" }, "decorators": { "dialects": "nestjs" } }"#,
    )
    .unwrap();

    let controller = &metadata.controllers[0];
    assert_eq!(controller.name, "CatsController");
    assert_eq!(controller.path, "cats");
    assert_eq!(controller.tags, vec!["cats"]);

    let find_one = &controller.methods[0];
    assert_eq!(find_one.path, ":id");
    assert_eq!(find_one.parameters[0].location, ParameterLocation::Path);
    assert_eq!(find_one.ty, ref_object("Cat"));

    let create = &controller.methods[1];
    assert_eq!(create.parameters[0].location, ParameterLocation::Body);
    let statuses: Vec<_> = create.responses.iter().map(|r| r.status.as_str()).collect();
    assert_eq!(statuses, vec!["400", "201"]);
    assert_eq!(create.responses[0].description, "Invalid cat");
    assert_eq!(create.responses[0].schema, Some(ref_object("Cat")));

    let cat = &metadata.reference_types["Cat"];
    let required: Vec<_> = cat
        .properties()
        .iter()
        .map(|p| (p.name.as_str(), p.required))
        .collect();
    assert_eq!(required, vec![("name", true), ("age", true), ("breed", false)]);
}

#[test]
fn test_inactive_dialect_is_ignored() {
    let temp_dir = create_test_project(vec![(
        "src/cats.controller.ts",
        include_str!("fixtures/cats_nestjs.ts"),
    )]);
    let metadata = generate(&temp_dir, BUILTIN_CONFIG).unwrap();

    assert!(metadata.controllers.is_empty());
}

#[test]
fn test_multi_dialect_union() {
    let temp_dir = create_test_project(vec![
        ("src/cats.controller.ts", include_str!("fixtures/cats_nestjs.ts")),
        ("src/orders.controller.ts", include_str!("fixtures/orders_routing.ts")),
    ]);
    let metadata = generate(
        &temp_dir,
        r#"{
            "metadata": { "entryFile": "src/**/*.ts" },
            "decorators": { "dialects": ["nestjs", "routing-controllers"] }
        }"#,
    )
    .unwrap();

    let names: Vec<_> = metadata.controllers.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["CatsController", "OrdersController"]);

    let orders = &metadata.controllers[1];
    assert_eq!(orders.path, "orders");
    assert_eq!(orders.methods[0].path, ":id");
    assert_eq!(orders.methods[1].path, "");
    assert_eq!(orders.methods[1].parameters[0].name, "sku");
    assert_eq!(orders.methods[1].ty, Type::array(ref_object("Order")));

    // Mutually recursive types are completed
    let line = &metadata.reference_types["OrderLine"];
    assert_eq!(line.properties()[2].ty, ref_object("Order"));
    let order = &metadata.reference_types["Order"];
    assert_eq!(order.properties()[1].ty, Type::array(ref_object("OrderLine")));
}

#[test]
fn test_override_replaces_class_path_decorators() {
    let temp_dir = create_test_project(vec![(
        "src/api.ts",
        r#"
        @Route('old')
        export class Legacy {
            @Get() ping(): string { return ''; }
        }

        @ApiRoot('new')
        export class Current {
            @Get() ping(): string { return ''; }
        }
        "#,
    )]);
    let metadata = generate(
        &temp_dir,
        r#"{
            "metadata": { "entryFile": "src/*.ts" },
            "decorators": { "override": { "ClassPath": [{ "name": "ApiRoot" }] } }
        }"#,
    )
    .unwrap();

    assert_eq!(metadata.controllers.len(), 1);
    assert_eq!(metadata.controllers[0].name, "Current");
    assert_eq!(metadata.controllers[0].path, "new");
}

#[test]
fn test_ignore_and_allow_filters() {
    let temp_dir = create_test_project(vec![
        ("src/a.ts", "@Route('a') export class A { @Get() go(): void {} }"),
        ("src/legacy/b.ts", "@Route('b') export class B { @Get() go(): void {} }"),
        ("src/legacy/c.ts", "@Route('c') export class C { @Get() go(): void {} }"),
    ]);
    let metadata = generate(
        &temp_dir,
        r#"{
            "metadata": {
                "entryFile": "src/**/*.ts",
                "ignore": ["**/legacy/**"],
                "allow": ["**/legacy/c.ts"]
            }
        }"#,
    )
    .unwrap();

    let names: Vec<_> = metadata.controllers.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["A", "C"]);
}

#[test]
fn test_body_exclusivity_is_fatal() {
    let temp_dir = create_test_project(vec![(
        "src/upload.ts",
        r#"
        @Route('upload')
        export class UploadController {
            @Post()
            public upload(@Body() meta: string, @FormField() title: string): void {}
        }
        "#,
    )]);
    let err = generate(&temp_dir, BUILTIN_CONFIG).unwrap_err();

    assert!(matches!(err.root(), GenerateError::BodyAndFormParameters));
    assert!(err.to_string().starts_with("UploadController.upload: "));
}

#[test]
fn test_path_parameter_mismatch_is_fatal() {
    let temp_dir = create_test_project(vec![(
        "src/users.ts",
        r#"
        @Route('users')
        export class UsersController {
            @Get('/:id')
            public one(@Path() userId: string): string { return userId; }
        }
        "#,
    )]);
    let err = generate(&temp_dir, BUILTIN_CONFIG).unwrap_err();

    assert_eq!(
        err.to_string(),
        "UsersController.one: parameter 'userId': can't match path parameter 'userId' in path 'users/:id'"
    );
}

#[test]
fn test_parse_errors_abort_the_run() {
    let temp_dir = create_test_project(vec![(
        "src/broken.ts",
        "@Route('x') export class Broken { @Get() go(: void {} }",
    )]);
    let err = generate(&temp_dir, BUILTIN_CONFIG).unwrap_err();

    assert!(matches!(err, GenerateError::Parse { line: 1, .. }));
}
