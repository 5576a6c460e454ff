use super::method::MethodGenerator;
use super::{responses, role_strings, security, trim_path};
use crate::annotations::{AnnotationMatcher, PropertyKey, Role};
use crate::error::{Result, ResultExt};
use crate::metadata::{Controller, Method};
use crate::parser::ast::ClassMember;
use crate::resolver::{ClassEntry, ResolutionContext, TypeResolver};
use log::debug;
use std::collections::HashSet;

/// Builds the [`Controller`] metadata of one class.
pub struct ControllerGenerator<'a> {
    entry: ClassEntry<'a>,
    matcher: &'a AnnotationMatcher<'a>,
    resolver: &'a TypeResolver<'a>,
}

impl<'a> ControllerGenerator<'a> {
    pub fn new(
        entry: ClassEntry<'a>,
        matcher: &'a AnnotationMatcher<'a>,
        resolver: &'a TypeResolver<'a>,
    ) -> Self {
        Self {
            entry,
            matcher,
            resolver,
        }
    }

    /// A class is a controller when it carries a class path, even an empty one,
    /// and is not hidden.
    pub fn is_valid(&self) -> bool {
        self.matcher.has(self.entry.class, Role::ClassPath)
            && !self.matcher.has(self.entry.class, Role::Hidden)
    }

    /// Builds the controller with its endpoint methods in declaration order.
    ///
    /// When several methods share a name only the first is kept.
    ///
    /// # Errors
    ///
    /// Propagates the first method, parameter or resolution error, prefixed
    /// with the controller and method names.
    pub fn generate(&self, context: &mut ResolutionContext) -> Result<Controller> {
        let class = self.entry.class;
        let path = self
            .matcher
            .find(class, Role::ClassPath)
            .and_then(|m| m.string(PropertyKey::Path))
            .map(|p| trim_path(&p))
            .unwrap_or_default();
        debug!("Generating controller {} at /{}", class.name, path);

        let mut seen = HashSet::new();
        let mut methods: Vec<Method> = Vec::new();
        for member in &class.members {
            let ClassMember::Method(method) = member else {
                continue;
            };
            if !seen.insert(method.name.as_str()) {
                debug!(
                    "Dropping duplicate method {}.{} at line {}",
                    class.name, method.name, method.line
                );
                continue;
            }
            let generator =
                MethodGenerator::new(method, &class.name, &path, self.matcher, self.resolver);
            if let Some(method) = generator.generate(context)? {
                methods.push(method);
            }
        }

        let responses = responses(self.matcher, self.resolver, class, context)
            .context_with(|| class.name.clone())?;

        Ok(Controller {
            name: class.name.clone(),
            location: self.entry.file.display().to_string(),
            path,
            methods,
            consumes: role_strings(self.matcher, class, Role::Consumes),
            produces: role_strings(self.matcher, class, Role::Produces),
            tags: role_strings(self.matcher, class, Role::Tags),
            responses,
            security: security(self.matcher, class),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotations::{build_effective_mapping, MappingConfig};
    use crate::metadata::{HttpVerb, Type};
    use crate::parser::AstParser;
    use crate::resolver::DeclarationIndex;
    use pretty_assertions::assert_eq;
    use std::path::Path;

    fn generate_all(source: &str) -> Result<Vec<Controller>> {
        let files = vec![AstParser::parse_source(Path::new("src/api.ts"), source).unwrap()];
        let mapping = build_effective_mapping(&MappingConfig::default());
        let index = DeclarationIndex::build(&files);
        let matcher = AnnotationMatcher::new(&mapping);
        let resolver = TypeResolver::new(&index, &matcher);
        let mut context = ResolutionContext::new();

        let mut controllers = Vec::new();
        for entry in index.classes() {
            let generator = ControllerGenerator::new(*entry, &matcher, &resolver);
            if generator.is_valid() {
                controllers.push(generator.generate(&mut context)?);
            }
        }
        Ok(controllers)
    }

    #[test]
    fn test_eligibility() {
        let controllers = generate_all(
            r#"
            @Route('')
            class Root {}

            @Route('secret')
            @Hidden()
            class Secret {}

            class Plain {}
            "#,
        )
        .unwrap();

        assert_eq!(controllers.len(), 1);
        assert_eq!(controllers[0].name, "Root");
        assert_eq!(controllers[0].path, "");
        assert_eq!(controllers[0].location, "src/api.ts");
    }

    #[test]
    fn test_class_level_roles() {
        let controllers = generate_all(
            r#"
            @Route('/users/')
            @Tags('users')
            @Produces('application/json')
            @Security('jwt', ['admin'])
            @Response(500, 'Server error')
            class UserController {
                @Get('{id}')
                public get(@Path() id: string): string { return id; }

                public helper(): void {}
            }
            "#,
        )
        .unwrap();

        let controller = &controllers[0];
        assert_eq!(controller.path, "users");
        assert_eq!(controller.tags, vec!["users"]);
        assert_eq!(controller.produces, vec!["application/json"]);
        assert!(controller.consumes.is_empty());
        assert_eq!(controller.security.as_ref().unwrap()[0]["jwt"], vec!["admin"]);
        assert_eq!(controller.responses[0].status, "500");

        assert_eq!(controller.methods.len(), 1);
        assert_eq!(controller.methods[0].http_verb, HttpVerb::Get);
        assert_eq!(controller.methods[0].path, "{id}");
    }

    #[test]
    fn test_duplicate_method_names_keep_first() {
        let controllers = generate_all(
            r#"
            @Route('items')
            class Items {
                @Get()
                list(): string { return ''; }

                @Post()
                list(): number { return 1; }
            }
            "#,
        )
        .unwrap();

        let methods = &controllers[0].methods;
        assert_eq!(methods.len(), 1);
        assert_eq!(methods[0].http_verb, HttpVerb::Get);
        assert_eq!(methods[0].ty, Type::string());
    }

    #[test]
    fn test_method_errors_name_controller_and_method() {
        let err = generate_all(
            r#"
            @Route('items')
            class Items {
                @Get(':id')
                one(@Path() other: string): void {}
            }
            "#,
        )
        .unwrap_err();

        assert_eq!(
            err.to_string(),
            "Items.one: parameter 'other': can't match path parameter 'other' in path 'items/:id'"
        );
    }

    #[test]
    fn test_optional_and_pattern_path_parameters() {
        let controllers = generate_all(
            r#"
            @Route('items')
            class Items {
                @Get(':id?')
                one(@Path() id: string): void {}

                @Get(':slug(\\d+)/:format.json')
                bySlug(@Path() slug: string, @Path() format: string): void {}
            }
            "#,
        )
        .unwrap();

        let methods = &controllers[0].methods;
        assert_eq!(methods.len(), 2);
        assert_eq!(methods[0].path, ":id?");
        assert_eq!(methods[0].parameters[0].name, "id");
        let names: Vec<_> = methods[1].parameters.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["slug", "format"]);
    }

    #[test]
    fn test_path_parameter_prefix_of_longer_name_is_rejected() {
        let err = generate_all(
            r#"
            @Route('items')
            class Items {
                @Get(':idx')
                one(@Path() id: string): void {}
            }
            "#,
        )
        .unwrap_err();

        assert_eq!(
            err.to_string(),
            "Items.one: parameter 'id': can't match path parameter 'id' in path 'items/:idx'"
        );
    }
}
