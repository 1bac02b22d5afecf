use super::parameter::ParameterGenerator;
use crate::annotations::{decorators_of_kind, verb_decorators, AnnotationKind};
use crate::ast::{Decorator, Expr, Keyword, MethodDecl, TypeNode};
use crate::error::{bail_generate, GenerateMetadataError, Result};
use crate::initializer;
use crate::metadata::{HttpMethod, Method, Parameter, ParameterLocation, Response, Security, Type};
use crate::type_resolver::{infer_type_node, ResolveContext, TypeResolver};
use log::debug;
use serde_json::Value;

/// Classifies one controller method.
///
/// A method is routable only when it carries exactly one verb decorator;
/// [`MethodGenerator::is_valid`] is false for every other method.
pub struct MethodGenerator<'a> {
    controller: &'a str,
    method: &'a MethodDecl,
    route: Option<(HttpMethod, String)>,
}

impl<'a> MethodGenerator<'a> {
    pub fn new(controller: &'a str, method: &'a MethodDecl) -> Result<Self> {
        let verbs = verb_decorators(&method.decorators);
        if verbs.len() > 1 {
            let found: Vec<&str> = verbs.iter().map(|(_, d)| d.name.as_str()).collect();
            bail_generate!(
                "Only one path decorator in '{}.{}' method, Found: {}",
                controller,
                method.name,
                found.join(", ")
            );
        }

        let route = verbs
            .first()
            .map(|(verb, decorator)| (*verb, decorator.text_argument(0).unwrap_or_default()));

        Ok(Self {
            controller,
            method,
            route,
        })
    }

    pub fn is_valid(&self) -> bool {
        self.route.is_some()
    }

    pub fn generate(
        &self,
        resolver: &mut TypeResolver,
        controller_tags: &[String],
        controller_security: &[Security],
    ) -> Result<Method> {
        let Some((verb, path)) = &self.route else {
            bail_generate!("This isn't a valid controller method.");
        };
        debug!(
            "Generating {} {} for {}.{}",
            verb.as_str(),
            path,
            self.controller,
            self.method.name
        );

        let return_node = self.return_type_node().map_err(|e| self.located(e))?;
        let return_type = resolver
            .resolve(&return_node, ResolveContext::default())
            .map_err(|e| self.located(e))?;

        let mut responses = self.responses(resolver).map_err(|e| self.located(e))?;
        responses.push(self.success_response(&return_type)?);

        let doc = self.method.doc.as_ref();
        Ok(Method {
            name: self.method.name.clone(),
            method: *verb,
            path: path.clone(),
            parameters: self.parameters(resolver, *verb, path)?,
            responses,
            return_type,
            security: self.security(controller_security)?,
            tags: self.tags(controller_tags)?,
            is_hidden: self.is_hidden()?,
            deprecated: doc.map_or(false, |d| d.has_tag("deprecated")),
            description: doc.and_then(|d| d.description.clone()),
            summary: doc.and_then(|d| d.tag_comment("summary")).map(str::to_string),
        })
    }

    fn location(&self) -> String {
        format!("{}.{}", self.controller, self.method.name)
    }

    fn located(&self, error: GenerateMetadataError) -> GenerateMetadataError {
        error.in_method(self.controller, &self.method.name)
    }

    /// At most one decorator of `kind`.
    fn single(&self, kind: AnnotationKind, label: &str) -> Result<Option<&'a Decorator>> {
        let found = decorators_of_kind(&self.method.decorators, kind);
        if found.len() > 1 {
            bail_generate!(
                "Only one {} decorator allowed in '{}' method.",
                label,
                self.location()
            );
        }
        Ok(found.first().copied())
    }

    /// Declared return type, else the type of the body's `return` values.
    fn return_type_node(&self) -> Result<TypeNode> {
        if let Some(node) = &self.method.return_type {
            return Ok(node.clone());
        }

        let mut inferred: Vec<TypeNode> = Vec::new();
        for value in &self.method.returns {
            let node = match value {
                None | Some(Expr::Undefined) => TypeNode::Keyword(Keyword::Undefined),
                Some(
                    expr @ (Expr::String(_)
                    | Expr::Number(_)
                    | Expr::Bool(_)
                    | Expr::Array(_)
                    | Expr::New { .. }),
                ) => infer_type_node(expr),
                Some(Expr::Object(_)) => TypeNode::Keyword(Keyword::Object),
                Some(other) => bail_generate!(
                    "Unable to infer the return type from '{}'; add an explicit return type annotation",
                    other.describe()
                ),
            };
            if !inferred.contains(&node) {
                inferred.push(node);
            }
        }

        let values: Vec<TypeNode> = inferred
            .iter()
            .filter(|n| **n != TypeNode::Keyword(Keyword::Undefined))
            .cloned()
            .collect();
        Ok(match values.len() {
            0 => TypeNode::Keyword(Keyword::Void),
            1 if inferred.len() == 1 => inferred.remove(0),
            _ => TypeNode::Union(inferred),
        })
    }

    fn parameters(
        &self,
        resolver: &mut TypeResolver,
        verb: HttpMethod,
        path: &str,
    ) -> Result<Vec<Parameter>> {
        let parameters = self
            .method
            .parameters
            .iter()
            .map(|p| {
                ParameterGenerator::new(p, verb, path, self.method.doc.as_ref())
                    .generate(resolver)
                    .map_err(|e| self.located(e))
            })
            .collect::<Result<Vec<_>>>()?;

        let bodies = parameters
            .iter()
            .filter(|p| p.location == ParameterLocation::Body)
            .count();
        let body_props = parameters
            .iter()
            .filter(|p| p.location == ParameterLocation::BodyProp)
            .count();
        if bodies > 1 {
            bail_generate!(
                "Only one body parameter allowed in '{}' method.",
                self.location()
            );
        }
        if bodies > 0 && body_props > 0 {
            bail_generate!(
                "Choose either during @Body or @BodyProp in '{}' method.",
                self.location()
            );
        }
        Ok(parameters)
    }

    /// Declared `@Response` entries, in declaration order.
    fn responses(&self, resolver: &mut TypeResolver) -> Result<Vec<Response>> {
        decorators_of_kind(&self.method.decorators, AnnotationKind::Response)
            .into_iter()
            .map(|decorator| {
                Ok(Response {
                    name: non_empty_text(decorator, 0).unwrap_or_else(|| "200".to_string()),
                    description: non_empty_text(decorator, 1).unwrap_or_default(),
                    schema: decorator
                        .type_arguments
                        .first()
                        .map(|t| resolver.resolve(t, ResolveContext::default()))
                        .transpose()?,
                    examples: decorator.argument(2).map(example_value).transpose()?,
                })
            })
            .collect()
    }

    /// `@SuccessResponse` when present, else 200/Ok (204/No content for
    /// `void`) carrying the `@Example` value.
    fn success_response(&self, return_type: &Type) -> Result<Response> {
        if let Some(decorator) = self.single(AnnotationKind::SuccessResponse, "SuccessResponse")? {
            return Ok(Response {
                name: non_empty_text(decorator, 0).unwrap_or_else(|| "200".to_string()),
                description: non_empty_text(decorator, 1).unwrap_or_default(),
                schema: Some(return_type.clone()),
                examples: None,
            });
        }

        let examples = match self.single(AnnotationKind::Example, "Example")? {
            Some(decorator) => match decorator.argument(0) {
                Some(argument) => Some(example_value(argument).map_err(|e| self.located(e))?),
                None => None,
            },
            None => None,
        };
        let is_void = *return_type == Type::Void;
        Ok(Response {
            name: if is_void { "204" } else { "200" }.to_string(),
            description: if is_void { "No content" } else { "Ok" }.to_string(),
            schema: Some(return_type.clone()),
            examples,
        })
    }

    /// Explicit tags followed by the controller's, or the controller's alone.
    fn tags(&self, controller_tags: &[String]) -> Result<Vec<String>> {
        let Some(decorator) = self.single(AnnotationKind::Tags, "Tags")? else {
            return Ok(controller_tags.to_vec());
        };
        let mut tags: Vec<String> = decorator
            .arguments
            .iter()
            .filter_map(Expr::literal_text)
            .collect();
        tags.extend(controller_tags.iter().cloned());
        Ok(tags)
    }

    fn security(&self, controller_security: &[Security]) -> Result<Vec<Security>> {
        let decorators = decorators_of_kind(&self.method.decorators, AnnotationKind::Security);
        if decorators.is_empty() {
            return Ok(controller_security.to_vec());
        }
        decorators
            .into_iter()
            .map(|d| security_requirement(d).map_err(|e| self.located(e)))
            .collect()
    }

    fn is_hidden(&self) -> Result<bool> {
        Ok(self.single(AnnotationKind::Hidden, "Hidden")?.is_some())
    }
}

/// One requirement from `@Security(name, scopes?)`.
pub fn security_requirement(decorator: &Decorator) -> Result<Security> {
    let Some(name) = decorator.text_argument(0) else {
        bail_generate!("@Security requires a security scheme name");
    };
    let scopes = match decorator.argument(1) {
        Some(Expr::Array(items)) => Some(items.iter().filter_map(Expr::literal_text).collect()),
        Some(Expr::String(scope)) => Some(vec![scope.clone()]),
        Some(other) => bail_generate!(
            "@Security('{}') scopes must be an array of strings, found '{}'",
            name,
            other.describe()
        ),
        None => None,
    };
    Ok(Security { name, scopes })
}

fn non_empty_text(decorator: &Decorator, index: usize) -> Option<String> {
    decorator.text_argument(index).filter(|text| !text.is_empty())
}

fn example_value(argument: &Expr) -> Result<Value> {
    Ok(initializer::evaluate(argument)?.unwrap_or(Value::Null))
}

/// Joins the controller base path and a method path with a single `/`.
pub fn join_path(base: &str, path: &str) -> String {
    let base = base.trim_matches('/');
    let path = path.trim_matches('/');
    match (base.is_empty(), path.is_empty()) {
        (true, _) => path.to_string(),
        (false, true) => base.to_string(),
        (false, false) => format!("{}/{}", base, path),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{ClassDecl, Declaration};
    use crate::program::Program;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    const SOURCE: &str = r#"
        export interface TestModel { id: string; }
        export interface ErrorResponse { message: string; }

        @Route('Controller')
        export class TestController {
            /**
             * Returns the model.
             * @summary Normal status code
             * @deprecated
             */
            @Get('normalStatusCode')
            @Response<ErrorResponse>('400', 'Bad request', { message: 'bad' })
            @Response('default')
            @Example<TestModel>({ id: 'abc' })
            @Tags('models')
            public async normalStatusCode(): Promise<TestModel> {
                return Promise.resolve({ id: 'abc' });
            }

            @Delete('{id}')
            @SuccessResponse('202', 'Accepted')
            @Example<TestModel>({ id: 'ignored' })
            public async remove(id: string): Promise<void> {}

            @Get('noContent')
            public noContent() {
                return;
            }

            @Get('inferred')
            @Security('tsoa_auth', ['write:pets', 'read:pets'])
            @Security('api_key')
            public inferred() {
                if (Math.random() > 0.5) {
                    return 'text';
                }
                return;
            }

            @Get('ambiguous')
            @Post('ambiguous')
            public ambiguous(): string { return ''; }

            @Post('twoBodies')
            public twoBodies(@Body() a: TestModel, @Body() b: TestModel): void {}

            @Post('mixedBody')
            public mixedBody(@Body() a: TestModel, @BodyProp() b: string): void {}

            @Get('duplicateTags')
            @Tags('a')
            @Tags('b')
            public duplicateTags(): void {}

            @Get('wrapped/{id}')
            public wrapped(@Query() model: TestModel): void {}

            @Post('duplicateSuccess')
            @SuccessResponse('201')
            @SuccessResponse('202')
            public duplicateSuccess(): void {}

            @Get('duplicateExample')
            @Example<TestModel>({ id: 'a' })
            @Example<TestModel>({ id: 'b' })
            public duplicateExample(): TestModel { return { id: 'a' }; }

            @Get('duplicateHidden')
            @Hidden()
            @Hidden()
            public duplicateHidden(): void {}

            @Get('scoped')
            public scoped(tenant: string): void {}

            public helper(): void {}
        }
    "#;

    fn program() -> Program {
        Program::from_sources(&[("testController.ts", SOURCE)]).unwrap()
    }

    fn class(program: &Program) -> &ClassDecl {
        program
            .units()
            .iter()
            .flat_map(|u| &u.declarations)
            .find_map(|d| match d {
                Declaration::Class(c) => Some(c),
                _ => None,
            })
            .unwrap()
    }

    fn generate(program: &Program, name: &str) -> Result<Method> {
        let class = class(program);
        let method = class.methods.iter().find(|m| m.name == name).unwrap();
        let mut resolver = TypeResolver::new(program);
        let generator = MethodGenerator::new(&class.name, method)?;
        generator.generate(
            &mut resolver,
            &["controller".to_string()],
            &[Security {
                name: "default_auth".to_string(),
                scopes: None,
            }],
        )
    }

    #[test]
    fn test_normal_status_code_method() {
        let program = program();

        let method = generate(&program, "normalStatusCode").unwrap();

        assert_eq!(method.method, HttpMethod::Get);
        assert_eq!(method.path, "normalStatusCode");
        assert_eq!(
            method.return_type,
            Type::RefObject {
                ref_name: "TestModel".to_string()
            }
        );
        assert_eq!(method.tags, vec!["models".to_string(), "controller".to_string()]);
        assert_eq!(method.security[0].name, "default_auth");
        assert!(method.deprecated);
        assert_eq!(method.summary.as_deref(), Some("Normal status code"));
        assert_eq!(method.description.as_deref(), Some("Returns the model."));

        let names: Vec<&str> = method.responses.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["400", "default", "200"]);
        assert_eq!(method.responses[0].examples, Some(json!({ "message": "bad" })));
        assert_eq!(
            method.responses[0].schema,
            Some(Type::RefObject {
                ref_name: "ErrorResponse".to_string()
            })
        );
        assert_eq!(method.responses[1].schema, None);
        let success = &method.responses[2];
        assert_eq!(success.description, "Ok");
        assert_eq!(success.examples, Some(json!({ "id": "abc" })));
    }

    #[test]
    fn test_success_response_and_void() {
        let program = program();

        let remove = generate(&program, "remove").unwrap();
        let success = remove.responses.last().unwrap();
        assert_eq!(success.name, "202");
        assert_eq!(success.description, "Accepted");
        assert_eq!(success.examples, None);
        assert_eq!(remove.return_type, Type::Void);

        let no_content = generate(&program, "noContent").unwrap();
        let success = no_content.responses.last().unwrap();
        assert_eq!(success.name, "204");
        assert_eq!(success.description, "No content");
    }

    #[test]
    fn test_inferred_return_type_and_security_order() {
        let program = program();

        let method = generate(&program, "inferred").unwrap();

        assert_eq!(method.return_type, Type::String);
        assert_eq!(
            method.security,
            vec![
                Security {
                    name: "tsoa_auth".to_string(),
                    scopes: Some(vec!["write:pets".to_string(), "read:pets".to_string()]),
                },
                Security {
                    name: "api_key".to_string(),
                    scopes: None,
                },
            ]
        );
        assert_eq!(method.tags, vec!["controller".to_string()]);
    }

    #[test]
    fn test_classification_errors() {
        let program = program();
        let class = class(&program);

        let ambiguous = class.methods.iter().find(|m| m.name == "ambiguous").unwrap();
        let err = MethodGenerator::new("TestController", ambiguous)
            .err()
            .unwrap();
        assert_eq!(
            err.message(),
            "Only one path decorator in 'TestController.ambiguous' method, Found: Get, Post"
        );

        assert_eq!(
            generate(&program, "twoBodies").unwrap_err().message(),
            "Only one body parameter allowed in 'TestController.twoBodies' method."
        );
        assert_eq!(
            generate(&program, "mixedBody").unwrap_err().message(),
            "Choose either during @Body or @BodyProp in 'TestController.mixedBody' method."
        );
        assert_eq!(
            generate(&program, "duplicateTags").unwrap_err().message(),
            "Only one Tags decorator allowed in 'TestController.duplicateTags' method."
        );
        assert_eq!(
            generate(&program, "wrapped").unwrap_err().message(),
            "@Query('model') Can't support 'refObject' type. \n in 'TestController.wrapped'"
        );
        assert_eq!(
            generate(&program, "duplicateSuccess").unwrap_err().message(),
            "Only one SuccessResponse decorator allowed in 'TestController.duplicateSuccess' method."
        );
        assert_eq!(
            generate(&program, "duplicateExample").unwrap_err().message(),
            "Only one Example decorator allowed in 'TestController.duplicateExample' method."
        );
        assert_eq!(
            generate(&program, "duplicateHidden").unwrap_err().message(),
            "Only one Hidden decorator allowed in 'TestController.duplicateHidden' method."
        );
    }

    #[test]
    fn test_path_parameters_match_the_method_path_only() {
        let program = program();

        let err = generate(&program, "scoped").unwrap_err();

        assert_eq!(
            err.message(),
            "@Path('tenant') Can't match in URL: 'scoped'. \n in 'TestController.scoped'"
        );
    }

    #[test]
    fn test_non_routable_method() {
        let program = program();
        let class = class(&program);
        let helper = class.methods.iter().find(|m| m.name == "helper").unwrap();

        let generator = MethodGenerator::new("TestController", helper).unwrap();

        assert!(!generator.is_valid());
    }

    #[test]
    fn test_join_path() {
        assert_eq!(join_path("users", "{id}"), "users/{id}");
        assert_eq!(join_path("/users/", ""), "users");
        assert_eq!(join_path("", "/health"), "health");
    }
}
