//! Owned declaration model lowered from the TypeScript syntax tree.
//!
//! The analysis never looks at tree-sitter nodes directly: [`crate::parser`]
//! lowers each source unit into these types once, and every classifier and the
//! type resolver work on them. Only the subset of TypeScript that matters for
//! API metadata is represented; everything else is kept as an `Unsupported` /
//! `Other` node carrying its syntax kind and source text so errors can name it.

use crate::jsdoc::JsDoc;
use std::collections::HashMap;
use std::path::PathBuf;

/// One parsed `.ts` / `.tsx` file.
#[derive(Debug, Clone)]
pub struct SourceUnit {
    pub path: PathBuf,
    /// Relative module specifiers from `import ... from` and `export ... from`
    pub imports: Vec<String>,
    pub declarations: Vec<Declaration>,
}

/// A top-level declaration relevant to metadata generation.
#[derive(Debug, Clone)]
pub enum Declaration {
    Class(ClassDecl),
    Interface(InterfaceDecl),
    TypeAlias(TypeAliasDecl),
    Enum(EnumDecl),
}

impl Declaration {
    pub fn name(&self) -> &str {
        match self {
            Declaration::Class(c) => &c.name,
            Declaration::Interface(i) => &i.name,
            Declaration::TypeAlias(t) => &t.name,
            Declaration::Enum(e) => &e.name,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ClassDecl {
    pub name: String,
    pub doc: Option<JsDoc>,
    pub decorators: Vec<Decorator>,
    pub type_parameters: Vec<TypeParameter>,
    /// Base class from the `extends` clause
    pub extends: Option<TypeNode>,
    pub methods: Vec<MethodDecl>,
    /// Public instance fields followed by public constructor parameter properties
    pub properties: Vec<PropertyDecl>,
}

#[derive(Debug, Clone)]
pub struct MethodDecl {
    pub name: String,
    pub doc: Option<JsDoc>,
    pub decorators: Vec<Decorator>,
    pub parameters: Vec<ParamDecl>,
    pub return_type: Option<TypeNode>,
    /// Value of every `return` statement in the body; `None` for a bare `return;`
    pub returns: Vec<Option<Expr>>,
}

#[derive(Debug, Clone)]
pub struct ParamDecl {
    /// `None` for destructuring patterns
    pub name: Option<String>,
    pub decorators: Vec<Decorator>,
    pub type_node: Option<TypeNode>,
    pub optional: bool,
    pub initializer: Option<Expr>,
    pub accessibility: Option<String>,
    pub is_readonly: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PropertyDecl {
    pub name: String,
    pub doc: Option<JsDoc>,
    pub type_node: Option<TypeNode>,
    pub optional: bool,
    pub initializer: Option<Expr>,
}

#[derive(Debug, Clone)]
pub struct InterfaceDecl {
    pub name: String,
    pub doc: Option<JsDoc>,
    pub type_parameters: Vec<TypeParameter>,
    pub extends: Vec<TypeNode>,
    pub properties: Vec<PropertyDecl>,
    pub index_signature: Option<TypeNode>,
}

#[derive(Debug, Clone)]
pub struct TypeAliasDecl {
    pub name: String,
    pub doc: Option<JsDoc>,
    pub type_parameters: Vec<TypeParameter>,
    pub value: TypeNode,
}

#[derive(Debug, Clone)]
pub struct EnumDecl {
    pub name: String,
    pub doc: Option<JsDoc>,
    pub members: Vec<EnumMember>,
}

#[derive(Debug, Clone)]
pub struct EnumMember {
    pub name: String,
    pub initializer: Option<Expr>,
}

#[derive(Debug, Clone)]
pub struct TypeParameter {
    pub name: String,
    pub default: Option<TypeNode>,
}

/// A decorator application such as `@Response<ErrorModel>('400', 'Bad')`.
#[derive(Debug, Clone)]
pub struct Decorator {
    /// Last segment of the decorator expression (`tsoa.Get` -> `Get`)
    pub name: String,
    pub type_arguments: Vec<TypeNode>,
    pub arguments: Vec<Expr>,
}

impl Decorator {
    pub fn argument(&self, index: usize) -> Option<&Expr> {
        self.arguments.get(index)
    }

    /// Textual value of a string or numeric literal argument.
    pub fn text_argument(&self, index: usize) -> Option<String> {
        self.argument(index).and_then(Expr::literal_text)
    }
}

/// TypeScript keyword types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keyword {
    String,
    Number,
    Boolean,
    BigInt,
    Any,
    Unknown,
    Void,
    Object,
    Never,
    Symbol,
    Null,
    Undefined,
}

impl Keyword {
    pub fn from_text(text: &str) -> Option<Self> {
        let keyword = match text {
            "string" => Keyword::String,
            "number" => Keyword::Number,
            "boolean" => Keyword::Boolean,
            "bigint" => Keyword::BigInt,
            "any" => Keyword::Any,
            "unknown" => Keyword::Unknown,
            "void" => Keyword::Void,
            "object" => Keyword::Object,
            "never" => Keyword::Never,
            "symbol" => Keyword::Symbol,
            "null" => Keyword::Null,
            "undefined" => Keyword::Undefined,
            _ => return None,
        };
        Some(keyword)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Keyword::String => "string",
            Keyword::Number => "number",
            Keyword::Boolean => "boolean",
            Keyword::BigInt => "bigint",
            Keyword::Any => "any",
            Keyword::Unknown => "unknown",
            Keyword::Void => "void",
            Keyword::Object => "object",
            Keyword::Never => "never",
            Keyword::Symbol => "symbol",
            Keyword::Null => "null",
            Keyword::Undefined => "undefined",
        }
    }
}

/// Literal used in literal types (`'a' | 'b'`).
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    String(String),
    Number(f64),
    Boolean(bool),
}

/// A type annotation.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeNode {
    Keyword(Keyword),
    /// Named type, possibly qualified (`express.Request`) and generic
    Reference {
        name: String,
        type_arguments: Vec<TypeNode>,
    },
    Array(Box<TypeNode>),
    Union(Vec<TypeNode>),
    Intersection(Vec<TypeNode>),
    Literal(Literal),
    /// Anonymous `{ ... }` type
    ObjectLiteral {
        properties: Vec<PropertyDecl>,
        index_signature: Option<Box<TypeNode>>,
    },
    Unsupported {
        kind: String,
        text: String,
    },
}

impl TypeNode {
    pub fn reference(name: impl Into<String>) -> Self {
        TypeNode::Reference {
            name: name.into(),
            type_arguments: Vec::new(),
        }
    }

    /// Replaces references to type parameters with their bound arguments.
    pub fn substitute(&self, bindings: &HashMap<String, TypeNode>) -> TypeNode {
        if bindings.is_empty() {
            return self.clone();
        }
        match self {
            TypeNode::Reference {
                name,
                type_arguments,
            } => {
                if type_arguments.is_empty() {
                    if let Some(bound) = bindings.get(name) {
                        return bound.clone();
                    }
                }
                TypeNode::Reference {
                    name: name.clone(),
                    type_arguments: type_arguments
                        .iter()
                        .map(|t| t.substitute(bindings))
                        .collect(),
                }
            }
            TypeNode::Array(element) => TypeNode::Array(Box::new(element.substitute(bindings))),
            TypeNode::Union(members) => {
                TypeNode::Union(members.iter().map(|t| t.substitute(bindings)).collect())
            }
            TypeNode::Intersection(members) => {
                TypeNode::Intersection(members.iter().map(|t| t.substitute(bindings)).collect())
            }
            TypeNode::ObjectLiteral {
                properties,
                index_signature,
            } => TypeNode::ObjectLiteral {
                properties: properties
                    .iter()
                    .map(|p| PropertyDecl {
                        type_node: p.type_node.as_ref().map(|t| t.substitute(bindings)),
                        ..p.clone()
                    })
                    .collect(),
                index_signature: index_signature
                    .as_ref()
                    .map(|t| Box::new(t.substitute(bindings))),
            },
            other => other.clone(),
        }
    }

    /// Name fragment used to key generic instantiations in the reference table.
    pub fn name_fragment(&self) -> String {
        match self {
            TypeNode::Keyword(k) => k.as_str().to_string(),
            TypeNode::Reference {
                name,
                type_arguments,
            } => {
                let mut fragment = last_segment(name).to_string();
                for argument in type_arguments {
                    fragment.push_str(&argument.name_fragment());
                }
                fragment
            }
            TypeNode::Array(element) => format!("{}Array", element.name_fragment()),
            TypeNode::Union(members) => members
                .iter()
                .map(TypeNode::name_fragment)
                .collect::<Vec<_>>()
                .join("Or"),
            TypeNode::Intersection(members) => members
                .iter()
                .map(TypeNode::name_fragment)
                .collect::<Vec<_>>()
                .join("And"),
            TypeNode::Literal(Literal::String(s)) => s.clone(),
            TypeNode::Literal(Literal::Number(n)) => n.to_string(),
            TypeNode::Literal(Literal::Boolean(b)) => b.to_string(),
            TypeNode::ObjectLiteral { .. } => "object".to_string(),
            TypeNode::Unsupported { kind, .. } => kind.clone(),
        }
    }
}

/// Last `.`-separated segment of a possibly qualified name.
pub fn last_segment(name: &str) -> &str {
    name.rsplit('.').next().unwrap_or(name)
}

/// A statically inspectable expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    String(String),
    Number(f64),
    Bool(bool),
    Null,
    Undefined,
    Array(Vec<Expr>),
    Object(Vec<(String, Expr)>),
    New {
        constructor: String,
        arguments: Vec<Expr>,
    },
    Identifier(String),
    Other {
        kind: String,
        text: String,
    },
}

impl Expr {
    /// Text of a string or numeric literal, the way decorator arguments are read.
    pub fn literal_text(&self) -> Option<String> {
        match self {
            Expr::String(s) => Some(s.clone()),
            Expr::Number(n) => Some(format_number(*n)),
            _ => None,
        }
    }

    /// Source-like rendering used in error messages.
    pub fn describe(&self) -> String {
        match self {
            Expr::String(s) => format!("'{}'", s),
            Expr::Number(n) => format_number(*n),
            Expr::Bool(b) => b.to_string(),
            Expr::Null => "null".to_string(),
            Expr::Undefined => "undefined".to_string(),
            Expr::Array(_) => "[...]".to_string(),
            Expr::Object(_) => "{...}".to_string(),
            Expr::New { constructor, .. } => format!("new {}(...)", constructor),
            Expr::Identifier(name) => name.clone(),
            Expr::Other { text, .. } => text.clone(),
        }
    }
}

/// Formats a number the way JavaScript prints it (`404`, not `404.0`).
pub fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}
