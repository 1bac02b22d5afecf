use crate::ast::{
    last_segment, ClassDecl, Declaration, Decorator, EnumDecl, EnumMember, Expr, InterfaceDecl,
    Keyword, Literal, MethodDecl, ParamDecl, PropertyDecl, SourceUnit, TypeAliasDecl, TypeNode,
    TypeParameter,
};
use crate::jsdoc::JsDoc;
use anyhow::{bail, Context, Result};
use log::debug;
use std::fs;
use std::path::Path;
use tree_sitter::{Language, Node, Parser};

/// TypeScript parser built on tree-sitter.
///
/// The `AstParser` parses a source file with the TypeScript (or TSX) grammar and
/// lowers the concrete syntax tree into the owned declaration model of
/// [`crate::ast`]. Only top-level classes, interfaces, type aliases and enums are
/// kept, together with the relative module specifiers the file imports.
///
/// # Example
///
/// ```no_run
/// use openapi_from_decorators::parser::AstParser;
/// use std::path::Path;
///
/// let unit = AstParser::parse_file(Path::new("src/controllers/userController.ts")).unwrap();
/// println!("Parsed {} declarations", unit.declarations.len());
/// ```
pub struct AstParser;

impl AstParser {
    /// Parses a single TypeScript source file.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The file cannot be read
    /// - The file contains invalid TypeScript syntax
    pub fn parse_file(path: &Path) -> Result<SourceUnit> {
        debug!("Parsing file: {}", path.display());

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read file: {}", path.display()))?;

        let unit = Self::parse_source(path, &content)?;

        debug!(
            "Successfully parsed file: {} ({} declarations)",
            path.display(),
            unit.declarations.len()
        );
        Ok(unit)
    }

    /// Parses source text that belongs to `path`. The extension selects the
    /// TSX grammar for `.tsx` files.
    pub fn parse_source(path: &Path, source: &str) -> Result<SourceUnit> {
        let is_tsx = path.extension().and_then(|e| e.to_str()) == Some("tsx");
        let language: Language = if is_tsx {
            tree_sitter_typescript::LANGUAGE_TSX.into()
        } else {
            tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into()
        };

        let mut parser = Parser::new();
        parser
            .set_language(&language)
            .context("Failed to set tree-sitter TypeScript language")?;

        let tree = parser
            .parse(source, None)
            .with_context(|| format!("Failed to parse source file: {}", path.display()))?;

        let root = tree.root_node();
        if root.has_error() {
            let (line, column) = first_error_position(root).unwrap_or((0, 0));
            bail!(
                "Failed to parse TypeScript syntax in file: {} (line {}, column {})",
                path.display(),
                line,
                column
            );
        }

        Ok(Lowering { source }.lower_program(path, root))
    }
}

/// 1-based position of the first error or missing node.
fn first_error_position(node: Node) -> Option<(usize, usize)> {
    if node.is_error() || node.is_missing() {
        let position = node.start_position();
        return Some((position.row + 1, position.column + 1));
    }
    let mut cursor = node.walk();
    let children: Vec<Node> = node.children(&mut cursor).collect();
    children.into_iter().find_map(first_error_position)
}

fn is_declaration_kind(kind: &str) -> bool {
    matches!(
        kind,
        "class_declaration"
            | "abstract_class_declaration"
            | "interface_declaration"
            | "type_alias_declaration"
            | "enum_declaration"
    )
}

fn is_function_like(kind: &str) -> bool {
    matches!(
        kind,
        "function_declaration"
            | "function_expression"
            | "function"
            | "arrow_function"
            | "generator_function_declaration"
            | "generator_function"
            | "method_definition"
            | "class_declaration"
            | "class"
    )
}

/// Lowers tree-sitter nodes of one source text into [`crate::ast`] values.
struct Lowering<'a> {
    source: &'a str,
}

impl<'a> Lowering<'a> {
    fn text(&self, node: Node) -> &'a str {
        &self.source[node.byte_range()]
    }

    fn named_children<'t>(&self, node: Node<'t>) -> Vec<Node<'t>> {
        let mut cursor = node.walk();
        node.named_children(&mut cursor)
            .filter(|child| child.kind() != "comment")
            .collect()
    }

    fn has_token(&self, node: Node, token: &str) -> bool {
        let mut cursor = node.walk();
        let found = node
            .children(&mut cursor)
            .any(|child| !child.is_named() && child.kind() == token);
        found
    }

    fn child_of_kind<'t>(&self, node: Node<'t>, kind: &str) -> Option<Node<'t>> {
        let mut cursor = node.walk();
        let found = node.named_children(&mut cursor).find(|c| c.kind() == kind);
        found
    }

    /// Field lookup with a fallback to the first named child of `kind`.
    fn field_or_kind<'t>(&self, node: Node<'t>, field: &str, kind: &str) -> Option<Node<'t>> {
        node.child_by_field_name(field)
            .or_else(|| self.child_of_kind(node, kind))
    }

    /// JSDoc block directly preceding `node`, skipping decorators and plain comments.
    fn leading_doc(&self, node: Node) -> Option<JsDoc> {
        let mut current = node.prev_named_sibling();
        while let Some(sibling) = current {
            match sibling.kind() {
                "decorator" => current = sibling.prev_named_sibling(),
                "comment" => {
                    if let Some(doc) = JsDoc::parse(self.text(sibling)) {
                        return Some(doc);
                    }
                    current = sibling.prev_named_sibling();
                }
                _ => return None,
            }
        }
        None
    }

    fn lower_program(&self, path: &Path, root: Node) -> SourceUnit {
        let mut unit = SourceUnit {
            path: path.to_path_buf(),
            imports: Vec::new(),
            declarations: Vec::new(),
        };

        for statement in self.named_children(root) {
            match statement.kind() {
                "import_statement" => self.push_import(statement, &mut unit.imports),
                "export_statement" => {
                    self.push_import(statement, &mut unit.imports);
                    let decorators = self.decorators_of(statement);
                    for child in self.named_children(statement) {
                        if is_declaration_kind(child.kind()) {
                            if let Some(decl) = self.lower_declaration(child, &decorators, statement)
                            {
                                unit.declarations.push(decl);
                            }
                        }
                    }
                }
                "ambient_declaration" => {
                    for child in self.named_children(statement) {
                        if is_declaration_kind(child.kind()) {
                            if let Some(decl) = self.lower_declaration(child, &[], statement) {
                                unit.declarations.push(decl);
                            }
                        }
                    }
                }
                kind if is_declaration_kind(kind) => {
                    if let Some(decl) = self.lower_declaration(statement, &[], statement) {
                        unit.declarations.push(decl);
                    }
                }
                _ => {}
            }
        }

        unit
    }

    fn push_import(&self, statement: Node, imports: &mut Vec<String>) {
        if let Some(source) = statement.child_by_field_name("source") {
            let specifier = string_content(self.text(source));
            if specifier.starts_with('.') {
                imports.push(specifier);
            }
        }
    }

    fn lower_declaration(
        &self,
        node: Node,
        outer_decorators: &[Decorator],
        doc_anchor: Node,
    ) -> Option<Declaration> {
        let name = self.text(node.child_by_field_name("name")?).to_string();
        let doc = self.leading_doc(doc_anchor);

        let declaration = match node.kind() {
            "class_declaration" | "abstract_class_declaration" => {
                Declaration::Class(self.lower_class(node, name, doc, outer_decorators))
            }
            "interface_declaration" => {
                let (properties, index_signature) = node
                    .child_by_field_name("body")
                    .map(|body| self.lower_object_members(body))
                    .unwrap_or_default();
                let extends = self
                    .child_of_kind(node, "extends_type_clause")
                    .map(|clause| {
                        self.named_children(clause)
                            .into_iter()
                            .map(|t| self.lower_type(t))
                            .collect()
                    })
                    .unwrap_or_default();
                Declaration::Interface(InterfaceDecl {
                    name,
                    doc,
                    type_parameters: self.lower_type_parameters(node),
                    extends,
                    properties,
                    index_signature,
                })
            }
            "type_alias_declaration" => Declaration::TypeAlias(TypeAliasDecl {
                name,
                doc,
                type_parameters: self.lower_type_parameters(node),
                value: node
                    .child_by_field_name("value")
                    .map(|v| self.lower_type(v))
                    .unwrap_or(TypeNode::Keyword(Keyword::Any)),
            }),
            "enum_declaration" => Declaration::Enum(EnumDecl {
                name,
                doc,
                members: node
                    .child_by_field_name("body")
                    .map(|body| self.lower_enum_members(body))
                    .unwrap_or_default(),
            }),
            _ => return None,
        };
        Some(declaration)
    }

    fn lower_class(
        &self,
        node: Node,
        name: String,
        doc: Option<JsDoc>,
        outer_decorators: &[Decorator],
    ) -> ClassDecl {
        let mut decorators = outer_decorators.to_vec();
        decorators.extend(self.decorators_of(node));

        let extends = self
            .child_of_kind(node, "class_heritage")
            .and_then(|heritage| self.child_of_kind(heritage, "extends_clause"))
            .and_then(|clause| {
                let value = clause
                    .child_by_field_name("value")
                    .or_else(|| self.named_children(clause).into_iter().next())?;
                let type_arguments = clause
                    .child_by_field_name("type_arguments")
                    .map(|args| self.lower_type_arguments(args))
                    .unwrap_or_default();
                Some(TypeNode::Reference {
                    name: self.text(value).to_string(),
                    type_arguments,
                })
            });

        let mut class = ClassDecl {
            name,
            doc,
            decorators,
            type_parameters: self.lower_type_parameters(node),
            extends,
            methods: Vec::new(),
            properties: Vec::new(),
        };

        if let Some(body) = node.child_by_field_name("body") {
            self.lower_class_body(body, &mut class);
        }
        class
    }

    fn lower_class_body(&self, body: Node, class: &mut ClassDecl) {
        let mut pending_decorators: Vec<Decorator> = Vec::new();
        let mut constructor_properties = Vec::new();

        let mut cursor = body.walk();
        let members: Vec<Node> = body.named_children(&mut cursor).collect();
        for member in members {
            match member.kind() {
                "decorator" => {
                    if let Some(decorator) = self.lower_decorator(member) {
                        pending_decorators.push(decorator);
                    }
                }
                "method_definition" => {
                    let mut decorators = std::mem::take(&mut pending_decorators);
                    decorators.extend(self.decorators_of(member));
                    let Some(name_node) = member.child_by_field_name("name") else {
                        continue;
                    };
                    let name = self.text(name_node);
                    if name == "constructor" {
                        constructor_properties.extend(self.parameter_properties(member));
                        continue;
                    }
                    if self.has_token(member, "get")
                        || self.has_token(member, "set")
                        || self.has_token(member, "static")
                    {
                        continue;
                    }
                    class.methods.push(self.lower_method(member, name, decorators));
                }
                "public_field_definition" => {
                    pending_decorators.clear();
                    if let Some(property) = self.lower_field(member) {
                        class.properties.push(property);
                    }
                }
                "comment" => {}
                _ => pending_decorators.clear(),
            }
        }

        class.properties.extend(constructor_properties);
    }

    fn lower_method(&self, node: Node, name: &str, decorators: Vec<Decorator>) -> MethodDecl {
        let parameters = node
            .child_by_field_name("parameters")
            .map(|params| {
                self.named_children(params)
                    .into_iter()
                    .filter(|p| matches!(p.kind(), "required_parameter" | "optional_parameter"))
                    .filter_map(|p| self.lower_parameter(p))
                    .collect()
            })
            .unwrap_or_default();

        let mut returns = Vec::new();
        if let Some(body) = node.child_by_field_name("body") {
            self.collect_returns(body, &mut returns);
        }

        MethodDecl {
            name: name.to_string(),
            doc: self.leading_doc(node),
            decorators,
            parameters,
            return_type: node
                .child_by_field_name("return_type")
                .map(|t| self.lower_type(t)),
            returns,
        }
    }

    /// Lowers a formal parameter. `this` parameters only exist for the type
    /// checker and are dropped.
    fn lower_parameter(&self, node: Node) -> Option<ParamDecl> {
        let pattern = node
            .child_by_field_name("pattern")
            .or_else(|| self.named_children(node).into_iter().find(|c| {
                matches!(
                    c.kind(),
                    "identifier" | "object_pattern" | "array_pattern" | "rest_pattern" | "this"
                )
            }))?;
        if pattern.kind() == "this" {
            return None;
        }

        let name = (pattern.kind() == "identifier").then(|| self.text(pattern).to_string());

        Some(ParamDecl {
            name,
            decorators: self.decorators_of(node),
            type_node: self
                .field_or_kind(node, "type", "type_annotation")
                .map(|t| self.lower_type(t)),
            optional: node.kind() == "optional_parameter",
            initializer: node
                .child_by_field_name("value")
                .map(|v| self.lower_expr(v)),
            accessibility: self
                .child_of_kind(node, "accessibility_modifier")
                .map(|m| self.text(m).to_string()),
            is_readonly: self.has_token(node, "readonly"),
        })
    }

    /// Constructor parameters declared `public` or `readonly` become properties.
    fn parameter_properties(&self, constructor: Node) -> Vec<PropertyDecl> {
        let Some(params) = constructor.child_by_field_name("parameters") else {
            return Vec::new();
        };
        self.named_children(params)
            .into_iter()
            .filter_map(|p| self.lower_parameter(p))
            .filter(|p| match p.accessibility.as_deref() {
                Some(access) => access == "public",
                None => p.is_readonly,
            })
            .filter_map(|p| {
                Some(PropertyDecl {
                    name: p.name?,
                    doc: None,
                    type_node: p.type_node,
                    optional: p.optional,
                    initializer: p.initializer,
                })
            })
            .collect()
    }

    /// Public, non-static class field.
    fn lower_field(&self, node: Node) -> Option<PropertyDecl> {
        if self.has_token(node, "static") {
            return None;
        }
        if let Some(modifier) = self.child_of_kind(node, "accessibility_modifier") {
            if self.text(modifier) != "public" {
                return None;
            }
        }
        let name_node = node.child_by_field_name("name")?;
        if !matches!(name_node.kind(), "property_identifier" | "string") {
            return None;
        }

        Some(PropertyDecl {
            name: string_content(self.text(name_node)),
            doc: self.leading_doc(node),
            type_node: self
                .field_or_kind(node, "type", "type_annotation")
                .map(|t| self.lower_type(t)),
            optional: self.has_token(node, "?"),
            initializer: node
                .child_by_field_name("value")
                .map(|v| self.lower_expr(v)),
        })
    }

    /// Members of an interface body or object type literal.
    fn lower_object_members(&self, body: Node) -> (Vec<PropertyDecl>, Option<TypeNode>) {
        let mut properties = Vec::new();
        let mut index_signature = None;

        for member in self.named_children(body) {
            match member.kind() {
                "property_signature" => {
                    let Some(name_node) = member.child_by_field_name("name") else {
                        continue;
                    };
                    properties.push(PropertyDecl {
                        name: string_content(self.text(name_node)),
                        doc: self.leading_doc(member),
                        type_node: self
                            .field_or_kind(member, "type", "type_annotation")
                            .map(|t| self.lower_type(t)),
                        optional: self.has_token(member, "?"),
                        initializer: None,
                    });
                }
                "index_signature" => {
                    let mut cursor = member.walk();
                    let annotation = member
                        .named_children(&mut cursor)
                        .filter(|c| c.kind() == "type_annotation")
                        .last();
                    index_signature = annotation.map(|t| self.lower_type(t));
                }
                _ => {}
            }
        }

        (properties, index_signature)
    }

    fn lower_enum_members(&self, body: Node) -> Vec<EnumMember> {
        self.named_children(body)
            .into_iter()
            .filter_map(|member| match member.kind() {
                "property_identifier" | "string" => Some(EnumMember {
                    name: string_content(self.text(member)),
                    initializer: None,
                }),
                "enum_assignment" => {
                    let children = self.named_children(member);
                    let name_node = member
                        .child_by_field_name("name")
                        .or_else(|| children.first().copied())?;
                    let value = member
                        .child_by_field_name("value")
                        .or_else(|| children.last().copied())?;
                    Some(EnumMember {
                        name: string_content(self.text(name_node)),
                        initializer: Some(self.lower_expr(value)),
                    })
                }
                _ => None,
            })
            .collect()
    }

    fn lower_type_parameters(&self, node: Node) -> Vec<TypeParameter> {
        let Some(params) = node.child_by_field_name("type_parameters") else {
            return Vec::new();
        };
        self.named_children(params)
            .into_iter()
            .filter(|p| p.kind() == "type_parameter")
            .filter_map(|p| {
                let name_node = p
                    .child_by_field_name("name")
                    .or_else(|| self.named_children(p).into_iter().next())?;
                Some(TypeParameter {
                    name: self.text(name_node).to_string(),
                    default: p.child_by_field_name("value").map(|v| self.lower_type(v)),
                })
            })
            .collect()
    }

    fn lower_type_arguments(&self, node: Node) -> Vec<TypeNode> {
        self.named_children(node)
            .into_iter()
            .map(|t| self.lower_type(t))
            .collect()
    }

    fn decorators_of(&self, node: Node) -> Vec<Decorator> {
        let mut cursor = node.walk();
        let decorator_nodes: Vec<Node> = node
            .named_children(&mut cursor)
            .filter(|c| c.kind() == "decorator")
            .collect();
        decorator_nodes
            .into_iter()
            .filter_map(|d| self.lower_decorator(d))
            .collect()
    }

    fn lower_decorator(&self, node: Node) -> Option<Decorator> {
        let expression = self.named_children(node).into_iter().next()?;
        match expression.kind() {
            "call_expression" => {
                let function = expression.child_by_field_name("function")?;
                let type_arguments = self
                    .field_or_kind(expression, "type_arguments", "type_arguments")
                    .map(|args| self.lower_type_arguments(args))
                    .unwrap_or_default();
                let arguments = expression
                    .child_by_field_name("arguments")
                    .map(|args| {
                        self.named_children(args)
                            .into_iter()
                            .map(|a| self.lower_expr(a))
                            .collect()
                    })
                    .unwrap_or_default();
                Some(Decorator {
                    name: last_segment(self.text(function)).to_string(),
                    type_arguments,
                    arguments,
                })
            }
            _ => Some(Decorator {
                name: last_segment(self.text(expression)).to_string(),
                type_arguments: Vec::new(),
                arguments: Vec::new(),
            }),
        }
    }

    fn lower_type(&self, node: Node) -> TypeNode {
        match node.kind() {
            "type_annotation" | "parenthesized_type" | "readonly_type" | "default_type" => {
                match self.named_children(node).into_iter().next() {
                    Some(inner) => self.lower_type(inner),
                    None => self.unsupported_type(node),
                }
            }
            "predefined_type" => match Keyword::from_text(self.text(node)) {
                Some(keyword) => TypeNode::Keyword(keyword),
                None => self.unsupported_type(node),
            },
            "type_identifier" | "nested_type_identifier" | "identifier" => {
                let name = self.text(node);
                match name {
                    "undefined" => TypeNode::Keyword(Keyword::Undefined),
                    "null" => TypeNode::Keyword(Keyword::Null),
                    _ => TypeNode::reference(name),
                }
            }
            "generic_type" => {
                let Some(name) = node.child_by_field_name("name") else {
                    return self.unsupported_type(node);
                };
                TypeNode::Reference {
                    name: self.text(name).to_string(),
                    type_arguments: self
                        .field_or_kind(node, "type_arguments", "type_arguments")
                        .map(|args| self.lower_type_arguments(args))
                        .unwrap_or_default(),
                }
            }
            "array_type" => match self.named_children(node).into_iter().next() {
                Some(element) => TypeNode::Array(Box::new(self.lower_type(element))),
                None => self.unsupported_type(node),
            },
            "union_type" => TypeNode::Union(self.flatten_type_list(node, "union_type")),
            "intersection_type" => {
                TypeNode::Intersection(self.flatten_type_list(node, "intersection_type"))
            }
            "literal_type" => match self.named_children(node).into_iter().next() {
                Some(literal) => self.lower_literal_type(literal, node),
                None => self.unsupported_type(node),
            },
            "object_type" => {
                let (properties, index_signature) = self.lower_object_members(node);
                TypeNode::ObjectLiteral {
                    properties,
                    index_signature: index_signature.map(Box::new),
                }
            }
            _ => self.unsupported_type(node),
        }
    }

    fn flatten_type_list(&self, node: Node, kind: &str) -> Vec<TypeNode> {
        let mut members = Vec::new();
        for child in self.named_children(node) {
            if child.kind() == kind {
                members.extend(self.flatten_type_list(child, kind));
            } else {
                members.push(self.lower_type(child));
            }
        }
        members
    }

    fn lower_literal_type(&self, literal: Node, parent: Node) -> TypeNode {
        match self.lower_expr(literal) {
            Expr::String(s) => TypeNode::Literal(Literal::String(s)),
            Expr::Number(n) => TypeNode::Literal(Literal::Number(n)),
            Expr::Bool(b) => TypeNode::Literal(Literal::Boolean(b)),
            Expr::Null => TypeNode::Keyword(Keyword::Null),
            Expr::Undefined => TypeNode::Keyword(Keyword::Undefined),
            _ => self.unsupported_type(parent),
        }
    }

    fn unsupported_type(&self, node: Node) -> TypeNode {
        TypeNode::Unsupported {
            kind: node.kind().to_string(),
            text: self.text(node).to_string(),
        }
    }

    fn lower_expr(&self, node: Node) -> Expr {
        match node.kind() {
            "string" => Expr::String(string_content(self.text(node))),
            "template_string" => {
                if self.child_of_kind(node, "template_substitution").is_some() {
                    self.other_expr(node)
                } else {
                    let text = self.text(node);
                    Expr::String(unescape(text.trim_matches('`')))
                }
            }
            "number" => match parse_number(self.text(node)) {
                Some(n) => Expr::Number(n),
                None => self.other_expr(node),
            },
            "true" => Expr::Bool(true),
            "false" => Expr::Bool(false),
            "null" => Expr::Null,
            "undefined" => Expr::Undefined,
            "identifier" => match self.text(node) {
                "undefined" => Expr::Undefined,
                name => Expr::Identifier(name.to_string()),
            },
            "unary_expression" => {
                let operator = node.child_by_field_name("operator").map(|o| self.text(o));
                let argument = node
                    .child_by_field_name("argument")
                    .map(|a| self.lower_expr(a));
                match (operator, argument) {
                    (Some("-"), Some(Expr::Number(n))) => Expr::Number(-n),
                    (Some("+"), Some(Expr::Number(n))) => Expr::Number(n),
                    _ => self.other_expr(node),
                }
            }
            "array" => Expr::Array(
                self.named_children(node)
                    .into_iter()
                    .map(|e| self.lower_expr(e))
                    .collect(),
            ),
            "object" => {
                let mut entries = Vec::new();
                for entry in self.named_children(node) {
                    if entry.kind() != "pair" {
                        return self.other_expr(node);
                    }
                    let (Some(key), Some(value)) = (
                        entry.child_by_field_name("key"),
                        entry.child_by_field_name("value"),
                    ) else {
                        return self.other_expr(node);
                    };
                    if !matches!(key.kind(), "property_identifier" | "string" | "number") {
                        return self.other_expr(node);
                    }
                    entries.push((string_content(self.text(key)), self.lower_expr(value)));
                }
                Expr::Object(entries)
            }
            "new_expression" => {
                let Some(constructor) = node.child_by_field_name("constructor") else {
                    return self.other_expr(node);
                };
                Expr::New {
                    constructor: self.text(constructor).to_string(),
                    arguments: node
                        .child_by_field_name("arguments")
                        .map(|args| {
                            self.named_children(args)
                                .into_iter()
                                .map(|a| self.lower_expr(a))
                                .collect()
                        })
                        .unwrap_or_default(),
                }
            }
            "parenthesized_expression" | "as_expression" | "satisfies_expression"
            | "non_null_expression" => match self.named_children(node).into_iter().next() {
                Some(inner) => self.lower_expr(inner),
                None => self.other_expr(node),
            },
            _ => self.other_expr(node),
        }
    }

    fn other_expr(&self, node: Node) -> Expr {
        Expr::Other {
            kind: node.kind().to_string(),
            text: self.text(node).to_string(),
        }
    }

    /// Values of `return` statements, not descending into nested functions.
    fn collect_returns(&self, node: Node, out: &mut Vec<Option<Expr>>) {
        for child in self.named_children(node) {
            match child.kind() {
                "return_statement" => {
                    let value = self
                        .named_children(child)
                        .into_iter()
                        .next()
                        .map(|e| self.lower_expr(e));
                    out.push(value);
                }
                kind if is_function_like(kind) => {}
                _ => self.collect_returns(child, out),
            }
        }
    }
}

/// Content of a quoted string literal (or the text itself when unquoted).
fn string_content(text: &str) -> String {
    let bytes = text.as_bytes();
    if bytes.len() >= 2 {
        let first = bytes[0];
        let last = bytes[bytes.len() - 1];
        if (first == b'\'' || first == b'"') && first == last {
            return unescape(&text[1..text.len() - 1]);
        }
    }
    text.to_string()
}

fn unescape(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            result.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => result.push('\n'),
            Some('t') => result.push('\t'),
            Some('r') => result.push('\r'),
            Some('0') => result.push('\0'),
            Some('u') => {
                let hex: String = chars.by_ref().take(4).collect();
                match u32::from_str_radix(&hex, 16).ok().and_then(char::from_u32) {
                    Some(decoded) => result.push(decoded),
                    None => {
                        result.push_str("\\u");
                        result.push_str(&hex);
                    }
                }
            }
            Some(other) => result.push(other),
            None => result.push('\\'),
        }
    }
    result
}

fn parse_number(text: &str) -> Option<f64> {
    let cleaned = text.replace('_', "");
    let lower = cleaned.to_ascii_lowercase();
    if let Some(hex) = lower.strip_prefix("0x") {
        return i64::from_str_radix(hex, 16).ok().map(|n| n as f64);
    }
    if let Some(bin) = lower.strip_prefix("0b") {
        return i64::from_str_radix(bin, 2).ok().map(|n| n as f64);
    }
    if let Some(oct) = lower.strip_prefix("0o") {
        return i64::from_str_radix(oct, 8).ok().map(|n| n as f64);
    }
    cleaned.parse::<f64>().ok()
}
