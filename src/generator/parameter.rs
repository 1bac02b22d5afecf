use crate::annotations::ParameterBinding;
use crate::ast::{Keyword, ParamDecl, TypeNode};
use crate::error::{bail_generate, Result};
use crate::initializer::{self, literal_value};
use crate::jsdoc::JsDoc;
use crate::metadata::{HttpMethod, Parameter, ParameterLocation, Type};
use crate::type_resolver::{infer_type_node, FormatHints, ResolveContext, TypeResolver};
use crate::validators::parameter_validators;
use log::debug;
use serde_json::Value;

/// Classifies one method parameter.
///
/// The binding comes from the highest-priority parameter decorator; a
/// parameter without one is bound to the path. Descriptions, validators and
/// format hints are read from the method's JSDoc, addressed by parameter name.
pub struct ParameterGenerator<'a> {
    parameter: &'a ParamDecl,
    method: HttpMethod,
    path: &'a str,
    method_doc: Option<&'a JsDoc>,
}

impl<'a> ParameterGenerator<'a> {
    pub fn new(
        parameter: &'a ParamDecl,
        method: HttpMethod,
        path: &'a str,
        method_doc: Option<&'a JsDoc>,
    ) -> Self {
        Self {
            parameter,
            method,
            path,
            method_doc,
        }
    }

    pub fn generate(&self, resolver: &mut TypeResolver) -> Result<Parameter> {
        let Some(name) = self.parameter.name.as_deref() else {
            bail_generate!("Destructured parameters are not supported; bind each value to a named parameter");
        };

        let selected = ParameterBinding::select(&self.parameter.decorators);
        let binding = selected.map(|(b, _)| b).unwrap_or(ParameterBinding::Path);
        let wire_name = selected
            .and_then(|(_, decorator)| decorator.text_argument(0))
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| name.to_string());
        debug!("Parameter {} bound as {:?}", name, binding);

        let type_node = self.type_node();
        let hints = self.hints(name);

        let parameter = match binding {
            ParameterBinding::Request => Parameter {
                location: ParameterLocation::Request,
                name: name.to_string(),
                parameter_name: name.to_string(),
                required: self.is_required(),
                parameter_type: Type::Object,
                default: None,
                validators: parameter_validators(self.method_doc, name)?,
                description: self.description(name),
            },
            ParameterBinding::Body | ParameterBinding::BodyProp => {
                let ty = resolver.resolve(&type_node, ResolveContext::with_hints(hints))?;
                if !self.method.accepts_body() {
                    bail_generate!(
                        "@{}('{}') Can't support in {} method.",
                        binding.decorator_name(),
                        name,
                        self.method.as_str().to_uppercase()
                    );
                }
                let is_body = binding == ParameterBinding::Body;
                Parameter {
                    location: binding.location(),
                    name: if is_body {
                        name.to_string()
                    } else {
                        wire_name
                    },
                    parameter_name: name.to_string(),
                    required: self.is_required(),
                    default: if is_body {
                        None
                    } else {
                        self.default_value(&type_node, &ty)?
                    },
                    parameter_type: ty,
                    validators: parameter_validators(self.method_doc, name)?,
                    description: self.description(name),
                }
            }
            ParameterBinding::Header | ParameterBinding::Query | ParameterBinding::Path => {
                let ctx = ResolveContext::with_hints(hints).inline_enums();
                let ty = resolver.resolve(&type_node, ctx)?;
                self.validate_wire_type(binding, name, &ty)?;

                if binding == ParameterBinding::Path && !self.path.contains(&format!("{{{}}}", wire_name))
                {
                    bail_generate!("@Path('{}') Can't match in URL: '{}'.", name, self.path);
                }

                Parameter {
                    location: binding.location(),
                    name: wire_name,
                    parameter_name: name.to_string(),
                    required: binding == ParameterBinding::Path || self.is_required(),
                    default: self.default_value(&type_node, &ty)?,
                    parameter_type: ty,
                    validators: parameter_validators(self.method_doc, name)?,
                    description: self.description(name),
                }
            }
        };
        Ok(parameter)
    }

    /// Declared type, else the type implied by the initializer, else `any`.
    fn type_node(&self) -> TypeNode {
        match (&self.parameter.type_node, &self.parameter.initializer) {
            (Some(node), _) => node.clone(),
            (None, Some(initializer)) => infer_type_node(initializer),
            (None, None) => TypeNode::Keyword(Keyword::Any),
        }
    }

    fn hints(&self, name: &str) -> FormatHints {
        self.method_doc
            .map(|doc| FormatHints::from_tags(&doc.parameter_tags(name)))
            .unwrap_or_default()
    }

    fn is_required(&self) -> bool {
        !self.parameter.optional && self.parameter.initializer.is_none()
    }

    fn description(&self, name: &str) -> Option<String> {
        self.method_doc.and_then(|doc| doc.param_description(name))
    }

    /// Initializer value coerced against the resolved type. A literal type
    /// without an initializer defaults to that literal.
    fn default_value(&self, type_node: &TypeNode, ty: &Type) -> Result<Option<Value>> {
        if let Some(initializer) = &self.parameter.initializer {
            return initializer::default_value(initializer, ty);
        }
        Ok(match type_node {
            TypeNode::Literal(literal) => Some(literal_value(literal)),
            _ => None,
        })
    }

    fn validate_wire_type(&self, binding: ParameterBinding, name: &str, ty: &Type) -> Result<()> {
        let decorator = binding.decorator_name();
        match (binding, ty) {
            (ParameterBinding::Query, Type::Array { element_type }) => {
                if !element_type.is_wire_safe() {
                    bail_generate!(
                        "@{}('{}') Can't support array '{}' type.",
                        decorator,
                        name,
                        element_type.data_type()
                    );
                }
            }
            _ => {
                if !ty.is_wire_safe() {
                    bail_generate!(
                        "@{}('{}') Can't support '{}' type.",
                        decorator,
                        name,
                        ty.data_type()
                    );
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{ClassDecl, Declaration, MethodDecl};
    use crate::program::Program;
    use serde_json::json;

    const SOURCE: &str = r#"
        export interface User { id: string; }
        export enum Role { Admin = 'admin', Guest = 'guest' }

        @Route('users')
        export class UserController {
            /**
             * @param id The user id
             * @isInt id
             * @minimum id 1
             */
            @Get('{id}')
            public getUser(
                id: number,
                @Query('page_size') pageSize = 10,
                @Query() role?: Role,
                @Header('x-trace') trace: string,
                @Query() ids: string[],
                @Request() request: any,
                @Query() mode: 'fast',
            ) {}

            @Get('list')
            public badBody(@Body() user: User) {}

            @Get('list')
            public badQuery(@Query() user: User) {}

            @Get('list')
            public badArray(@Query() users: User[]) {}

            @Get('list')
            public unmatched(userId: string) {}

            @Get('list')
            public nullable(@Query() q: string | null, @Query() r?: string) {}

            @Post()
            public create(@BodyProp('full_name') name: string, @Body() user: User, { a }: any) {}
        }
    "#;

    fn method<'p>(program: &'p Program, name: &str) -> &'p MethodDecl {
        let class: &ClassDecl = program
            .units()
            .iter()
            .flat_map(|u| &u.declarations)
            .find_map(|d| match d {
                Declaration::Class(c) => Some(c),
                _ => None,
            })
            .unwrap();
        class.methods.iter().find(|m| m.name == name).unwrap()
    }

    fn generate(program: &Program, method_name: &str, index: usize, verb: HttpMethod, path: &str) -> Result<Parameter> {
        let method = method(program, method_name);
        let mut resolver = TypeResolver::new(program);
        ParameterGenerator::new(&method.parameters[index], verb, path, method.doc.as_ref())
            .generate(&mut resolver)
    }

    fn program() -> Program {
        Program::from_sources(&[("userController.ts", SOURCE)]).unwrap()
    }

    #[test]
    fn test_unannotated_parameter_binds_to_path() {
        let program = program();

        let parameter = generate(&program, "getUser", 0, HttpMethod::Get, "{id}").unwrap();

        assert_eq!(parameter.location, ParameterLocation::Path);
        assert_eq!(parameter.name, "id");
        assert!(parameter.required);
        assert_eq!(parameter.parameter_type, Type::Integer);
        assert_eq!(parameter.description.as_deref(), Some("The user id"));
        assert_eq!(parameter.validators["minimum"].value, Some(json!(1)));
    }

    #[test]
    fn test_query_with_wire_name_and_default() {
        let program = program();

        let parameter = generate(&program, "getUser", 1, HttpMethod::Get, "{id}").unwrap();

        assert_eq!(parameter.location, ParameterLocation::Query);
        assert_eq!(parameter.name, "page_size");
        assert_eq!(parameter.parameter_name, "pageSize");
        assert!(!parameter.required);
        assert_eq!(parameter.parameter_type, Type::Double);
        assert_eq!(parameter.default, Some(json!(10)));
    }

    #[test]
    fn test_query_enum_is_inlined() {
        let program = program();

        let parameter = generate(&program, "getUser", 2, HttpMethod::Get, "{id}").unwrap();

        assert!(!parameter.required);
        assert_eq!(
            parameter.parameter_type,
            Type::Enum {
                enums: vec![json!("admin"), json!("guest")]
            }
        );
    }

    #[test]
    fn test_header_query_array_request_and_literal() {
        let program = program();

        let header = generate(&program, "getUser", 3, HttpMethod::Get, "{id}").unwrap();
        assert_eq!(header.location, ParameterLocation::Header);
        assert_eq!(header.name, "x-trace");

        let ids = generate(&program, "getUser", 4, HttpMethod::Get, "{id}").unwrap();
        assert_eq!(ids.parameter_type, Type::array(Type::String));

        let request = generate(&program, "getUser", 5, HttpMethod::Get, "{id}").unwrap();
        assert_eq!(request.location, ParameterLocation::Request);
        assert_eq!(request.parameter_type, Type::Object);

        let mode = generate(&program, "getUser", 6, HttpMethod::Get, "{id}").unwrap();
        assert_eq!(mode.parameter_type, Type::String);
        assert_eq!(mode.default, Some(json!("fast")));
    }

    #[test]
    fn test_body_rejected_for_get() {
        let program = program();

        let err = generate(&program, "badBody", 0, HttpMethod::Get, "list").unwrap_err();

        assert_eq!(err.message(), "@Body('user') Can't support in GET method.");
    }

    #[test]
    fn test_query_type_validation() {
        let program = program();

        let err = generate(&program, "badQuery", 0, HttpMethod::Get, "list").unwrap_err();
        assert_eq!(err.message(), "@Query('user') Can't support 'refObject' type.");

        let err = generate(&program, "badArray", 0, HttpMethod::Get, "list").unwrap_err();
        assert_eq!(
            err.message(),
            "@Query('users') Can't support array 'refObject' type."
        );
    }

    #[test]
    fn test_path_placeholder_must_exist() {
        let program = program();

        let err = generate(&program, "unmatched", 0, HttpMethod::Get, "list").unwrap_err();

        assert_eq!(
            err.message(),
            "@Path('userId') Can't match in URL: 'list'."
        );
    }

    #[test]
    fn test_null_union_does_not_make_parameter_optional() {
        let program = program();

        let q = generate(&program, "nullable", 0, HttpMethod::Get, "list").unwrap();
        assert_eq!(q.parameter_type, Type::String);
        assert!(q.required);

        let r = generate(&program, "nullable", 1, HttpMethod::Get, "list").unwrap();
        assert!(!r.required);
    }

    #[test]
    fn test_body_prop_and_destructuring() {
        let program = program();

        let body_prop = generate(&program, "create", 0, HttpMethod::Post, "").unwrap();
        assert_eq!(body_prop.location, ParameterLocation::BodyProp);
        assert_eq!(body_prop.name, "full_name");

        let body = generate(&program, "create", 1, HttpMethod::Post, "").unwrap();
        assert_eq!(body.location, ParameterLocation::Body);
        assert_eq!(
            body.parameter_type,
            Type::RefObject {
                ref_name: "User".to_string()
            }
        );

        assert!(generate(&program, "create", 2, HttpMethod::Post, "").is_err());
    }
}
