//! The metadata document: the only contract between the generator and its
//! consumers.
//!
//! Everything serializes in camelCase; [`Type`] and [`ReferenceType`] are
//! internally tagged by `dataType`.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A normalized type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "dataType", rename_all = "camelCase")]
pub enum Type {
    String,
    Double,
    Float,
    Integer,
    Long,
    Boolean,
    Date,
    Datetime,
    Buffer,
    Void,
    Object,
    Any,
    Array {
        #[serde(rename = "elementType")]
        element_type: Box<Type>,
    },
    /// Inline enum with ordered literal values
    Enum { enums: Vec<Value> },
    RefObject {
        #[serde(rename = "refName")]
        ref_name: String,
    },
    RefEnum {
        #[serde(rename = "refName")]
        ref_name: String,
    },
}

impl Type {
    pub fn array(element: Type) -> Self {
        Type::Array {
            element_type: Box::new(element),
        }
    }

    /// The `dataType` tag.
    pub fn data_type(&self) -> &'static str {
        match self {
            Type::String => "string",
            Type::Double => "double",
            Type::Float => "float",
            Type::Integer => "integer",
            Type::Long => "long",
            Type::Boolean => "boolean",
            Type::Date => "date",
            Type::Datetime => "datetime",
            Type::Buffer => "buffer",
            Type::Void => "void",
            Type::Object => "object",
            Type::Any => "any",
            Type::Array { .. } => "array",
            Type::Enum { .. } => "enum",
            Type::RefObject { .. } => "refObject",
            Type::RefEnum { .. } => "refEnum",
        }
    }

    /// Types that can travel in a path segment, query string or header.
    pub fn is_wire_safe(&self) -> bool {
        matches!(
            self,
            Type::String
                | Type::Integer
                | Type::Long
                | Type::Float
                | Type::Double
                | Type::Date
                | Type::Datetime
                | Type::Buffer
                | Type::Boolean
                | Type::Enum { .. }
                | Type::Any
        )
    }

    pub fn ref_name(&self) -> Option<&str> {
        match self {
            Type::RefObject { ref_name } | Type::RefEnum { ref_name } => Some(ref_name),
            _ => None,
        }
    }
}

/// A named entry of the reference table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "dataType", rename_all = "camelCase")]
pub enum ReferenceType {
    RefObject(ObjectDefinition),
    RefEnum(EnumDefinition),
}

impl ReferenceType {
    pub fn ref_name(&self) -> &str {
        match self {
            ReferenceType::RefObject(o) => &o.ref_name,
            ReferenceType::RefEnum(e) => &e.ref_name,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectDefinition {
    pub ref_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub properties: Vec<Property>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additional_properties: Option<Type>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnumDefinition {
    pub ref_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub enums: Vec<Value>,
}

/// Validator keyword (`minLength`, `isInt`, ...) to its settings, in declaration order.
pub type Validators = IndexMap<String, Validator>;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Validator {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_msg: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Property {
    pub name: String,
    #[serde(rename = "type")]
    pub property_type: Type,
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    #[serde(default)]
    pub validators: Validators,
}

/// Where a parameter is read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ParameterLocation {
    #[serde(rename = "query")]
    Query,
    #[serde(rename = "header")]
    Header,
    #[serde(rename = "path")]
    Path,
    #[serde(rename = "formData")]
    FormData,
    #[serde(rename = "body")]
    Body,
    #[serde(rename = "body-prop")]
    BodyProp,
    #[serde(rename = "request")]
    Request,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Parameter {
    #[serde(rename = "in")]
    pub location: ParameterLocation,
    /// Wire name
    pub name: String,
    /// Name of the parameter in source
    pub parameter_name: String,
    pub required: bool,
    #[serde(rename = "type")]
    pub parameter_type: Type,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    #[serde(default)]
    pub validators: Validators,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
    Options,
    Head,
    Patch,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "get",
            HttpMethod::Post => "post",
            HttpMethod::Put => "put",
            HttpMethod::Delete => "delete",
            HttpMethod::Options => "options",
            HttpMethod::Head => "head",
            HttpMethod::Patch => "patch",
        }
    }

    /// Methods that may carry a request body.
    pub fn accepts_body(&self) -> bool {
        matches!(self, HttpMethod::Post | HttpMethod::Put | HttpMethod::Patch)
    }
}

/// One security requirement. Requirements on a method are alternatives; the
/// scopes inside one requirement are all needed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Security {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scopes: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub name: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<Type>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub examples: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Method {
    pub name: String,
    pub method: HttpMethod,
    pub path: String,
    pub parameters: Vec<Parameter>,
    pub responses: Vec<Response>,
    #[serde(rename = "type")]
    pub return_type: Type,
    pub security: Vec<Security>,
    pub tags: Vec<String>,
    pub is_hidden: bool,
    pub deprecated: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Controller {
    pub name: String,
    /// Path of the source unit declaring the controller
    pub location: String,
    pub path: String,
    pub methods: Vec<Method>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metadata {
    pub controllers: Vec<Controller>,
    pub reference_type_map: IndexMap<String, ReferenceType>,
}
