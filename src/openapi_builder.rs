use crate::generator::method::join_path;
use crate::metadata::{
    Controller, EnumDefinition, HttpMethod, Metadata, Method, ObjectDefinition, Parameter,
    ParameterLocation, ReferenceType, Response, Security, Type, Validators,
};
use indexmap::IndexMap;
use log::debug;
use serde::{Deserialize, Serialize};
use serde_json::Value;

const JSON_MEDIA_TYPE: &str = "application/json";

/// OpenAPI builder - writes an OpenAPI 3.0 document from generated metadata
pub struct OpenApiBuilder {
    /// API information
    info: Info,
    /// Path items keyed by `/controller/method` path
    paths: IndexMap<String, PathItem>,
    /// Component schemas keyed by reference name
    schemas: IndexMap<String, Schema>,
}

/// OpenAPI Info object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Info {
    pub title: String,
    pub version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// OpenAPI Path Item object
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PathItem {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub get: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub post: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub put: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delete: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patch: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub head: Option<Operation>,
}

impl PathItem {
    fn slot(&mut self, method: HttpMethod) -> &mut Option<Operation> {
        match method {
            HttpMethod::Get => &mut self.get,
            HttpMethod::Post => &mut self.post,
            HttpMethod::Put => &mut self.put,
            HttpMethod::Delete => &mut self.delete,
            HttpMethod::Patch => &mut self.patch,
            HttpMethod::Options => &mut self.options,
            HttpMethod::Head => &mut self.head,
        }
    }

    pub fn operation(&self, method: HttpMethod) -> Option<&Operation> {
        match method {
            HttpMethod::Get => self.get.as_ref(),
            HttpMethod::Post => self.post.as_ref(),
            HttpMethod::Put => self.put.as_ref(),
            HttpMethod::Delete => self.delete.as_ref(),
            HttpMethod::Patch => self.patch.as_ref(),
            HttpMethod::Options => self.options.as_ref(),
            HttpMethod::Head => self.head.as_ref(),
        }
    }
}

/// OpenAPI Operation object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Operation {
    pub operation_id: String,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "std::ops::Not::not", default)]
    pub deprecated: bool,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub parameters: Vec<OperationParameter>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_body: Option<RequestBody>,
    pub responses: IndexMap<String, ApiResponse>,
    /// Alternatives; each entry maps one scheme to its required scopes
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub security: Vec<IndexMap<String, Vec<String>>>,
}

/// OpenAPI Parameter object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationParameter {
    pub name: String,
    #[serde(rename = "in")]
    pub location: String,
    pub required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub schema: Schema,
}

/// OpenAPI Request Body object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestBody {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub required: bool,
    pub content: IndexMap<String, MediaType>,
}

/// OpenAPI Media Type object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaType {
    pub schema: Schema,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub example: Option<Value>,
}

/// OpenAPI Response object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse {
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<IndexMap<String, MediaType>>,
}

/// OpenAPI Schema object, limited to the keywords metadata can express
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Schema {
    #[serde(rename = "$ref", skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub schema_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<Schema>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub properties: Option<IndexMap<String, Schema>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub additional_properties: Option<Box<Schema>>,
    #[serde(rename = "enum", skip_serializing_if = "Option::is_none")]
    pub enum_values: Option<Vec<Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minimum: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maximum: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_length: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_length: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_items: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_items: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unique_items: Option<bool>,
}

impl Schema {
    fn typed(schema_type: &str, format: Option<&str>) -> Self {
        Schema {
            schema_type: Some(schema_type.to_string()),
            format: format.map(str::to_string),
            ..Default::default()
        }
    }

    fn reference(ref_name: &str) -> Self {
        Schema {
            reference: Some(format!("#/components/schemas/{}", ref_name)),
            ..Default::default()
        }
    }

    /// Schema for a metadata type. `any` maps to the empty schema.
    pub fn from_type(ty: &Type) -> Self {
        match ty {
            Type::String => Schema::typed("string", None),
            Type::Double => Schema::typed("number", Some("double")),
            Type::Float => Schema::typed("number", Some("float")),
            Type::Integer => Schema::typed("integer", Some("int32")),
            Type::Long => Schema::typed("integer", Some("int64")),
            Type::Boolean => Schema::typed("boolean", None),
            Type::Date => Schema::typed("string", Some("date")),
            Type::Datetime => Schema::typed("string", Some("date-time")),
            Type::Buffer => Schema::typed("string", Some("byte")),
            Type::Object => Schema::typed("object", None),
            Type::Void | Type::Any => Schema::default(),
            Type::Array { element_type } => Schema {
                items: Some(Box::new(Schema::from_type(element_type))),
                ..Schema::typed("array", None)
            },
            Type::Enum { enums } => enum_schema(enums),
            Type::RefObject { ref_name } | Type::RefEnum { ref_name } => {
                Schema::reference(ref_name)
            }
        }
    }

    /// Copies validator keywords OpenAPI understands onto the schema.
    pub fn apply_validators(&mut self, validators: &Validators) {
        for (name, validator) in validators {
            let value = validator.value.clone();
            match name.as_str() {
                "minimum" => self.minimum = value,
                "maximum" => self.maximum = value,
                "minLength" => self.min_length = value,
                "maxLength" => self.max_length = value,
                "minItems" => self.min_items = value,
                "maxItems" => self.max_items = value,
                "uniqueItems" => self.unique_items = Some(true),
                "pattern" => {
                    self.pattern = value.and_then(|v| v.as_str().map(str::to_string));
                }
                other => debug!("Validator '{}' has no schema keyword", other),
            }
        }
    }
}

/// Enum schema typed by its members: all strings, all numbers, or untyped.
fn enum_schema(enums: &[Value]) -> Schema {
    let schema_type = if enums.iter().all(Value::is_string) {
        Some("string".to_string())
    } else if enums.iter().all(Value::is_number) {
        Some("number".to_string())
    } else {
        None
    };
    Schema {
        schema_type,
        enum_values: Some(enums.to_vec()),
        ..Default::default()
    }
}

/// Complete OpenAPI document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpenApiDocument {
    pub openapi: String,
    pub info: Info,
    pub paths: IndexMap<String, PathItem>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub components: Option<Components>,
}

/// OpenAPI Components object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Components {
    pub schemas: IndexMap<String, Schema>,
}

impl OpenApiBuilder {
    /// Create a new OpenApiBuilder with default info
    pub fn new() -> Self {
        debug!("Initializing OpenApiBuilder");
        Self {
            info: Info {
                title: "Generated API".to_string(),
                version: "1.0.0".to_string(),
                description: None,
            },
            paths: IndexMap::new(),
            schemas: IndexMap::new(),
        }
    }

    /// Set custom info for the API
    pub fn with_info(mut self, title: String, version: String, description: Option<String>) -> Self {
        self.info = Info {
            title,
            version,
            description,
        };
        self
    }

    /// Add every controller and referenced type of `metadata`
    pub fn add_metadata(&mut self, metadata: &Metadata) {
        for controller in &metadata.controllers {
            self.add_controller(controller);
        }
        for (name, reference) in &metadata.reference_type_map {
            self.schemas.insert(name.clone(), reference_schema(reference));
        }
    }

    /// Add the visible routes of one controller
    pub fn add_controller(&mut self, controller: &Controller) {
        for method in &controller.methods {
            if method.is_hidden {
                debug!("Omitting hidden route {}.{}", controller.name, method.name);
                continue;
            }
            let path = format!("/{}", join_path(&controller.path, &method.path));
            debug!("Adding route: {} {}", method.method.as_str().to_uppercase(), path);

            let slot = self.paths.entry(path.clone()).or_default().slot(method.method);
            if slot.is_some() {
                debug!("Replacing earlier operation for {} {}", method.method.as_str(), path);
            }
            *slot = Some(operation(method));
        }
    }

    /// Build the final OpenAPI document
    pub fn build(self) -> OpenApiDocument {
        debug!("Building final OpenAPI document");
        let components = if self.schemas.is_empty() {
            None
        } else {
            Some(Components {
                schemas: self.schemas,
            })
        };

        OpenApiDocument {
            openapi: "3.0.0".to_string(),
            info: self.info,
            paths: self.paths,
            components,
        }
    }
}

impl Default for OpenApiBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn operation(method: &Method) -> Operation {
    let parameters = method
        .parameters
        .iter()
        .filter_map(operation_parameter)
        .collect();

    Operation {
        operation_id: method.name.clone(),
        tags: method.tags.clone(),
        summary: method.summary.clone(),
        description: method.description.clone(),
        deprecated: method.deprecated,
        parameters,
        request_body: request_body(&method.parameters),
        responses: method
            .responses
            .iter()
            .map(|r| (r.name.clone(), api_response(r)))
            .collect(),
        security: method.security.iter().map(security_requirement).collect(),
    }
}

fn operation_parameter(parameter: &Parameter) -> Option<OperationParameter> {
    let location = match parameter.location {
        ParameterLocation::Path => "path",
        ParameterLocation::Query => "query",
        ParameterLocation::Header => "header",
        _ => return None,
    };
    Some(OperationParameter {
        name: parameter.name.clone(),
        location: location.to_string(),
        required: parameter.required,
        description: parameter.description.clone(),
        schema: parameter_schema(parameter),
    })
}

fn parameter_schema(parameter: &Parameter) -> Schema {
    let mut schema = Schema::from_type(&parameter.parameter_type);
    schema.default = parameter.default.clone();
    schema.apply_validators(&parameter.validators);
    schema
}

/// A `body` parameter is the request body; otherwise `body-prop` parameters
/// are gathered into one object.
fn request_body(parameters: &[Parameter]) -> Option<RequestBody> {
    if let Some(body) = parameters
        .iter()
        .find(|p| p.location == ParameterLocation::Body)
    {
        return Some(RequestBody {
            description: body.description.clone(),
            required: body.required,
            content: json_content(parameter_schema(body), None),
        });
    }

    let props: Vec<&Parameter> = parameters
        .iter()
        .filter(|p| p.location == ParameterLocation::BodyProp)
        .collect();
    if props.is_empty() {
        return None;
    }

    let required: Vec<String> = props
        .iter()
        .filter(|p| p.required)
        .map(|p| p.name.clone())
        .collect();
    let mut properties = IndexMap::new();
    for prop in &props {
        let mut schema = parameter_schema(prop);
        schema.description = prop.description.clone();
        properties.insert(prop.name.clone(), schema);
    }
    let schema = Schema {
        properties: Some(properties),
        required: (!required.is_empty()).then_some(required.clone()),
        ..Schema::typed("object", None)
    };

    Some(RequestBody {
        description: None,
        required: !required.is_empty(),
        content: json_content(schema, None),
    })
}

fn api_response(response: &Response) -> ApiResponse {
    let content = match &response.schema {
        None | Some(Type::Void) => None,
        Some(ty) => Some(json_content(Schema::from_type(ty), response.examples.clone())),
    };
    ApiResponse {
        description: response.description.clone(),
        content,
    }
}

fn json_content(schema: Schema, example: Option<Value>) -> IndexMap<String, MediaType> {
    let mut content = IndexMap::new();
    content.insert(JSON_MEDIA_TYPE.to_string(), MediaType { schema, example });
    content
}

fn security_requirement(security: &Security) -> IndexMap<String, Vec<String>> {
    let mut requirement = IndexMap::new();
    requirement.insert(
        security.name.clone(),
        security.scopes.clone().unwrap_or_default(),
    );
    requirement
}

fn reference_schema(reference: &ReferenceType) -> Schema {
    match reference {
        ReferenceType::RefObject(object) => object_schema(object),
        ReferenceType::RefEnum(enumeration) => enum_definition_schema(enumeration),
    }
}

fn object_schema(object: &ObjectDefinition) -> Schema {
    let mut properties = IndexMap::new();
    let mut required = Vec::new();
    for property in &object.properties {
        let mut schema = Schema::from_type(&property.property_type);
        if schema.reference.is_none() {
            schema.description = property.description.clone();
        }
        schema.default = property.default.clone();
        schema.apply_validators(&property.validators);
        if property.required {
            required.push(property.name.clone());
        }
        properties.insert(property.name.clone(), schema);
    }

    Schema {
        description: object.description.clone(),
        properties: Some(properties),
        required: (!required.is_empty()).then_some(required),
        additional_properties: object
            .additional_properties
            .as_ref()
            .map(|ty| Box::new(Schema::from_type(ty))),
        ..Schema::typed("object", None)
    }
}

fn enum_definition_schema(enumeration: &EnumDefinition) -> Schema {
    Schema {
        description: enumeration.description.clone(),
        ..enum_schema(&enumeration.enums)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::{Property, Validator};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn parameter(location: ParameterLocation, name: &str, ty: Type, required: bool) -> Parameter {
        Parameter {
            location,
            name: name.to_string(),
            parameter_name: name.to_string(),
            required,
            parameter_type: ty,
            default: None,
            validators: Validators::new(),
            description: None,
        }
    }

    fn method(name: &str, verb: HttpMethod, path: &str) -> Method {
        Method {
            name: name.to_string(),
            method: verb,
            path: path.to_string(),
            parameters: Vec::new(),
            responses: vec![Response {
                name: "200".to_string(),
                description: "Ok".to_string(),
                schema: Some(Type::RefObject {
                    ref_name: "User".to_string(),
                }),
                examples: None,
            }],
            return_type: Type::RefObject {
                ref_name: "User".to_string(),
            },
            security: Vec::new(),
            tags: Vec::new(),
            is_hidden: false,
            deprecated: false,
            description: None,
            summary: None,
        }
    }

    fn metadata(methods: Vec<Method>) -> Metadata {
        let mut reference_type_map = IndexMap::new();
        reference_type_map.insert(
            "User".to_string(),
            ReferenceType::RefObject(ObjectDefinition {
                ref_name: "User".to_string(),
                description: Some("A user".to_string()),
                properties: vec![
                    Property {
                        name: "id".to_string(),
                        property_type: Type::Integer,
                        required: true,
                        description: Some("Identifier".to_string()),
                        default: None,
                        validators: Validators::from([(
                            "minimum".to_string(),
                            Validator {
                                value: Some(json!(1)),
                                error_msg: None,
                            },
                        )]),
                    },
                    Property {
                        name: "nickname".to_string(),
                        property_type: Type::String,
                        required: false,
                        description: None,
                        default: Some(json!("anon")),
                        validators: Validators::new(),
                    },
                ],
                additional_properties: None,
            }),
        );
        Metadata {
            controllers: vec![Controller {
                name: "UserController".to_string(),
                location: "userController.ts".to_string(),
                path: "users".to_string(),
                methods,
            }],
            reference_type_map,
        }
    }

    fn build(metadata: &Metadata) -> OpenApiDocument {
        let mut builder = OpenApiBuilder::new();
        builder.add_metadata(metadata);
        builder.build()
    }

    #[test]
    fn test_new_builder() {
        let document = OpenApiBuilder::new().build();

        assert_eq!(document.openapi, "3.0.0");
        assert_eq!(document.info.title, "Generated API");
        assert!(document.paths.is_empty());
        assert!(document.components.is_none());
    }

    #[test]
    fn test_with_info() {
        let document = OpenApiBuilder::new()
            .with_info("My API".to_string(), "2.0.0".to_string(), Some("Users".to_string()))
            .build();

        assert_eq!(document.info.title, "My API");
        assert_eq!(document.info.version, "2.0.0");
        assert_eq!(document.info.description.as_deref(), Some("Users"));
    }

    #[test]
    fn test_route_with_path_parameter_and_security() {
        let mut get = method("getUser", HttpMethod::Get, "{id}");
        get.parameters = vec![
            parameter(ParameterLocation::Path, "id", Type::Integer, true),
            parameter(ParameterLocation::Request, "request", Type::Object, true),
        ];
        get.tags = vec!["users".to_string()];
        get.security = vec![
            Security {
                name: "tsoa_auth".to_string(),
                scopes: Some(vec!["read".to_string()]),
            },
            Security {
                name: "api_key".to_string(),
                scopes: None,
            },
        ];
        get.deprecated = true;

        let document = build(&metadata(vec![get]));

        let operation = document.paths["/users/{id}"].operation(HttpMethod::Get).unwrap();
        assert_eq!(operation.operation_id, "getUser");
        assert_eq!(operation.tags, vec!["users".to_string()]);
        assert!(operation.deprecated);
        assert_eq!(operation.parameters.len(), 1);
        assert_eq!(operation.parameters[0].location, "path");
        assert_eq!(operation.parameters[0].schema.format.as_deref(), Some("int32"));
        assert_eq!(operation.security[0]["tsoa_auth"], vec!["read".to_string()]);
        assert!(operation.security[1]["api_key"].is_empty());
        assert_eq!(
            operation.responses["200"].content.as_ref().unwrap()[JSON_MEDIA_TYPE]
                .schema
                .reference
                .as_deref(),
            Some("#/components/schemas/User")
        );
    }

    #[test]
    fn test_body_props_become_one_object() {
        let mut create = method("create", HttpMethod::Post, "");
        create.parameters = vec![
            parameter(ParameterLocation::BodyProp, "name", Type::String, true),
            parameter(ParameterLocation::BodyProp, "age", Type::Double, false),
        ];

        let document = build(&metadata(vec![create]));

        let body = document.paths["/users"]
            .post
            .as_ref()
            .unwrap()
            .request_body
            .as_ref()
            .unwrap();
        let schema = &body.content[JSON_MEDIA_TYPE].schema;
        assert!(body.required);
        assert_eq!(schema.schema_type.as_deref(), Some("object"));
        assert_eq!(schema.required, Some(vec!["name".to_string()]));
        let properties = schema.properties.as_ref().unwrap();
        assert_eq!(properties.keys().collect::<Vec<_>>(), vec!["name", "age"]);
    }

    #[test]
    fn test_hidden_methods_and_void_responses() {
        let mut hidden = method("secret", HttpMethod::Get, "secret");
        hidden.is_hidden = true;
        let mut remove = method("remove", HttpMethod::Delete, "{id}");
        remove.responses = vec![Response {
            name: "204".to_string(),
            description: "No content".to_string(),
            schema: Some(Type::Void),
            examples: None,
        }];

        let document = build(&metadata(vec![hidden, remove]));

        assert!(!document.paths.contains_key("/users/secret"));
        let response = &document.paths["/users/{id}"].delete.as_ref().unwrap().responses["204"];
        assert_eq!(response.description, "No content");
        assert!(response.content.is_none());
    }

    #[test]
    fn test_component_schemas() {
        let document = build(&metadata(Vec::new()));

        let schemas = document.components.unwrap().schemas;
        let user = serde_json::to_value(&schemas["User"]).unwrap();
        assert_eq!(
            user,
            json!({
                "type": "object",
                "description": "A user",
                "properties": {
                    "id": {
                        "type": "integer",
                        "format": "int32",
                        "description": "Identifier",
                        "minimum": 1
                    },
                    "nickname": { "type": "string", "default": "anon" }
                },
                "required": ["id"]
            })
        );
    }

    #[test]
    fn test_schema_from_type() {
        let schema = Schema::from_type(&Type::array(Type::Datetime));
        assert_eq!(
            serde_json::to_value(&schema).unwrap(),
            json!({ "type": "array", "items": { "type": "string", "format": "date-time" } })
        );

        let schema = Schema::from_type(&Type::Enum {
            enums: vec![json!(0), json!(1)],
        });
        assert_eq!(schema.schema_type.as_deref(), Some("number"));

        assert_eq!(Schema::from_type(&Type::Any), Schema::default());
    }
}
