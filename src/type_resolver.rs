use crate::ast::{
    last_segment, ClassDecl, Declaration, EnumDecl, Expr, InterfaceDecl, Keyword, Literal,
    PropertyDecl, TypeAliasDecl, TypeNode, TypeParameter,
};
use crate::error::{bail_generate, Result};
use crate::initializer::{self, literal_value};
use crate::jsdoc::{JsDoc, JsDocTag};
use crate::metadata::{EnumDefinition, ObjectDefinition, Property, ReferenceType, Type};
use crate::program::Program;
use crate::reference_table::{merge_inherited, DeferredResolver, ReferenceTable};
use crate::validators::property_validators;
use indexmap::IndexMap;
use log::{debug, info};
use serde_json::Value;
use std::collections::{HashMap, VecDeque};

/// Numeric format requested with `@isInt`, `@isLong`, `@isFloat` or `@isDouble`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumberFormat {
    Int,
    Long,
    Float,
    Double,
}

/// Date format requested with `@isDate` or `@isDateTime`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateFormat {
    Date,
    DateTime,
}

/// Format hints carried by the JSDoc of the annotated site.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FormatHints {
    pub number: Option<NumberFormat>,
    pub date: Option<DateFormat>,
}

impl FormatHints {
    pub fn from_tags(tags: &[JsDocTag]) -> Self {
        let mut hints = FormatHints::default();
        for tag in tags {
            match tag.name.as_str() {
                "isInt" => hints.number = Some(NumberFormat::Int),
                "isLong" => hints.number = Some(NumberFormat::Long),
                "isFloat" => hints.number = Some(NumberFormat::Float),
                "isDouble" => hints.number = Some(NumberFormat::Double),
                "isDate" => hints.date = Some(DateFormat::Date),
                "isDateTime" => hints.date = Some(DateFormat::DateTime),
                _ => {}
            }
        }
        hints
    }

    pub fn from_doc(doc: Option<&JsDoc>) -> Self {
        doc.map(|d| Self::from_tags(&d.tags)).unwrap_or_default()
    }

    fn number_type(&self) -> Type {
        match self.number {
            Some(NumberFormat::Int) => Type::Integer,
            Some(NumberFormat::Long) => Type::Long,
            Some(NumberFormat::Float) => Type::Float,
            Some(NumberFormat::Double) | None => Type::Double,
        }
    }

    fn date_type(&self) -> Type {
        match self.date {
            Some(DateFormat::Date) => Type::Date,
            Some(DateFormat::DateTime) | None => Type::Datetime,
        }
    }
}

/// Per-site resolution settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolveContext {
    pub hints: FormatHints,
    /// Register named enums in the reference table instead of inlining them
    pub extract_enum: bool,
}

impl Default for ResolveContext {
    fn default() -> Self {
        Self {
            hints: FormatHints::default(),
            extract_enum: true,
        }
    }
}

impl ResolveContext {
    pub fn with_hints(hints: FormatHints) -> Self {
        Self {
            hints,
            extract_enum: true,
        }
    }

    pub fn inline_enums(self) -> Self {
        Self {
            extract_enum: false,
            ..self
        }
    }
}

/// Type resolver - turns type annotations into normalized [`Type`]s.
///
/// Named object and enum types are registered into the reference table that the
/// resolver owns for the duration of one generation run. Object types are
/// reserved as placeholders before their properties are resolved; references
/// that hit a placeholder, and inheritance from a base that is still a
/// placeholder, are queued as [`DeferredResolver`]s and run by [`finish`].
///
/// [`finish`]: TypeResolver::finish
pub struct TypeResolver<'p> {
    program: &'p Program,
    table: ReferenceTable,
    deferred: VecDeque<DeferredResolver>,
    /// Reference names of the object types currently being built
    building: Vec<String>,
}

impl<'p> TypeResolver<'p> {
    pub fn new(program: &'p Program) -> Self {
        debug!(
            "Initializing TypeResolver with {} source units",
            program.units().len()
        );
        Self {
            program,
            table: ReferenceTable::new(),
            deferred: VecDeque::new(),
            building: Vec::new(),
        }
    }

    pub fn table(&self) -> &ReferenceTable {
        &self.table
    }

    pub fn deferred(&self) -> impl Iterator<Item = &DeferredResolver> {
        self.deferred.iter()
    }

    /// Resolves a type annotation.
    pub fn resolve(&mut self, node: &TypeNode, ctx: ResolveContext) -> Result<Type> {
        match node {
            TypeNode::Keyword(keyword) => Self::resolve_keyword(*keyword, ctx),
            TypeNode::Array(element) => Ok(Type::array(self.resolve(element, ctx)?)),
            TypeNode::Union(members) => self.resolve_union(members, ctx),
            TypeNode::Intersection(_) => {
                bail_generate!("Intersection types are not supported: {}", describe(node))
            }
            TypeNode::Literal(literal) => Ok(if ctx.extract_enum {
                Type::Enum {
                    enums: vec![literal_value(literal)],
                }
            } else {
                literal_primitive(literal)
            }),
            TypeNode::ObjectLiteral { .. } => Ok(Type::Object),
            TypeNode::Unsupported { kind, text } => {
                bail_generate!("Unknown type: {} ('{}')", kind, text)
            }
            TypeNode::Reference {
                name,
                type_arguments,
            } => self.resolve_reference(name, type_arguments, ctx),
        }
    }

    /// Runs every deferred resolver in FIFO order and returns the finished table.
    pub fn finish(self) -> Result<IndexMap<String, ReferenceType>> {
        let TypeResolver {
            mut table,
            mut deferred,
            ..
        } = self;

        info!("Running {} deferred resolvers", deferred.len());
        while let Some(resolver) = deferred.pop_front() {
            resolver.run(&mut table)?;
        }
        table.finalize()
    }

    fn resolve_keyword(keyword: Keyword, ctx: ResolveContext) -> Result<Type> {
        let ty = match keyword {
            Keyword::String => Type::String,
            Keyword::Number => ctx.hints.number_type(),
            Keyword::Boolean => Type::Boolean,
            Keyword::BigInt => Type::Long,
            Keyword::Any | Keyword::Unknown => Type::Any,
            Keyword::Void => Type::Void,
            Keyword::Object => Type::Object,
            Keyword::Never | Keyword::Symbol | Keyword::Null | Keyword::Undefined => {
                bail_generate!("Unknown type: {}", keyword.as_str())
            }
        };
        Ok(ty)
    }

    fn resolve_union(&mut self, members: &[TypeNode], ctx: ResolveContext) -> Result<Type> {
        let remaining: Vec<&TypeNode> = members.iter().filter(|m| !is_nullish(m)).collect();

        match remaining.as_slice() {
            [] => bail_generate!(
                "Unknown type: union of only null/undefined ({})",
                describe(&TypeNode::Union(members.to_vec()))
            ),
            [single] => self.resolve(single, ctx),
            _ => {
                let literals: Option<Vec<Value>> = remaining
                    .iter()
                    .map(|m| match m {
                        TypeNode::Literal(literal) => Some(literal_value(literal)),
                        _ => None,
                    })
                    .collect();
                Ok(match literals {
                    Some(enums) => Type::Enum { enums },
                    None => Type::Object,
                })
            }
        }
    }

    fn resolve_reference(
        &mut self,
        name: &str,
        type_arguments: &[TypeNode],
        ctx: ResolveContext,
    ) -> Result<Type> {
        match (last_segment(name), type_arguments) {
            ("String", []) => return Ok(Type::String),
            ("Number", []) => return Ok(ctx.hints.number_type()),
            ("Boolean", []) => return Ok(Type::Boolean),
            ("Date", []) => return Ok(ctx.hints.date_type()),
            ("Buffer", []) => return Ok(Type::Buffer),
            ("Object", []) => return Ok(Type::Object),
            ("Array" | "ReadonlyArray", [element]) => {
                return Ok(Type::array(self.resolve(element, ctx)?))
            }
            ("Promise", [inner]) => return self.resolve(inner, ctx),
            _ => {}
        }

        let declaration = self.find_declaration(name)?;
        match declaration {
            Declaration::Enum(decl) => self.resolve_enum(decl, ctx),
            Declaration::TypeAlias(decl) => self.resolve_alias(decl, type_arguments, ctx),
            Declaration::Interface(_) | Declaration::Class(_) => {
                self.resolve_model(declaration, type_arguments)
            }
        }
    }

    fn find_declaration(&self, name: &str) -> Result<&'p Declaration> {
        let program: &'p Program = self.program;
        let matches = program.find_declarations(name);
        match matches.as_slice() {
            [] => bail_generate!("No matching model found for referenced type {}.", name),
            [(unit, declaration)] => {
                debug!("Found {} in {}", name, unit.path.display());
                Ok(*declaration)
            }
            _ => bail_generate!(
                "Multiple matching models found for referenced type {}; please make model names unique.",
                name
            ),
        }
    }

    fn resolve_enum(&mut self, decl: &EnumDecl, ctx: ResolveContext) -> Result<Type> {
        let enums = enum_values(decl)?;
        if !ctx.extract_enum {
            return Ok(Type::Enum { enums });
        }

        if !self.table.contains(&decl.name) {
            debug!("Registering enum {}", decl.name);
            self.table.fill(ReferenceType::RefEnum(EnumDefinition {
                ref_name: decl.name.clone(),
                description: description_of(decl.doc.as_ref()),
                enums,
            }));
        }
        Ok(Type::RefEnum {
            ref_name: decl.name.clone(),
        })
    }

    fn resolve_alias(
        &mut self,
        decl: &TypeAliasDecl,
        type_arguments: &[TypeNode],
        ctx: ResolveContext,
    ) -> Result<Type> {
        let (bindings, arguments) =
            bind_type_arguments(&decl.name, &decl.type_parameters, type_arguments)?;
        let value = decl.value.substitute(&bindings);

        match &value {
            TypeNode::ObjectLiteral {
                properties,
                index_signature,
            } => {
                let ref_name = reference_name(&decl.name, &arguments);
                self.build_reference(ref_name, |resolver, ref_name| {
                    Ok(ObjectDefinition {
                        ref_name: ref_name.to_string(),
                        description: description_of(decl.doc.as_ref()),
                        properties: resolver.resolve_properties(properties, false)?,
                        additional_properties: index_signature
                            .as_deref()
                            .map(|t| resolver.resolve(t, ResolveContext::default()))
                            .transpose()?,
                    })
                })
            }
            _ => self.resolve(&value, ctx),
        }
    }

    fn resolve_model(
        &mut self,
        declaration: &'p Declaration,
        type_arguments: &[TypeNode],
    ) -> Result<Type> {
        match declaration {
            Declaration::Interface(decl) => {
                let (bindings, arguments) =
                    bind_type_arguments(&decl.name, &decl.type_parameters, type_arguments)?;
                let ref_name = reference_name(&decl.name, &arguments);
                self.build_reference(ref_name, |resolver, ref_name| {
                    resolver.build_interface(decl, ref_name, &bindings)
                })
            }
            Declaration::Class(decl) => {
                let (bindings, arguments) =
                    bind_type_arguments(&decl.name, &decl.type_parameters, type_arguments)?;
                let ref_name = reference_name(&decl.name, &arguments);
                self.build_reference(ref_name, |resolver, ref_name| {
                    resolver.build_class(decl, ref_name, &bindings)
                })
            }
            other => bail_generate!("'{}' is not an object type", other.name()),
        }
    }

    /// Returns the handle for `ref_name`, building the entry first if it is new.
    fn build_reference<F>(&mut self, ref_name: String, build: F) -> Result<Type>
    where
        F: FnOnce(&mut Self, &str) -> Result<ObjectDefinition>,
    {
        if self.table.contains(&ref_name) {
            if self.table.is_pending(&ref_name) {
                let referrer = self.building.last().cloned().unwrap_or_default();
                debug!("Deferring reference {} from {}", ref_name, referrer);
                self.deferred.push_back(DeferredResolver::Link {
                    ref_name: ref_name.clone(),
                    referrer,
                });
            }
            return Ok(Type::RefObject { ref_name });
        }

        debug!("Resolving model {}", ref_name);
        self.table.reserve(&ref_name);
        self.building.push(ref_name.clone());
        let built = build(self, &ref_name);
        self.building.pop();

        self.table.fill(ReferenceType::RefObject(built?));
        Ok(Type::RefObject { ref_name })
    }

    fn build_interface(
        &mut self,
        decl: &InterfaceDecl,
        ref_name: &str,
        bindings: &HashMap<String, TypeNode>,
    ) -> Result<ObjectDefinition> {
        let properties: Vec<PropertyDecl> = decl
            .properties
            .iter()
            .map(|p| substitute_property(p, bindings))
            .collect();

        let mut definition = ObjectDefinition {
            ref_name: ref_name.to_string(),
            description: description_of(decl.doc.as_ref()),
            properties: self.resolve_properties(&properties, false)?,
            additional_properties: decl
                .index_signature
                .as_ref()
                .map(|t| self.resolve(&t.substitute(bindings), ResolveContext::default()))
                .transpose()?,
        };

        for base in &decl.extends {
            self.inherit(&base.substitute(bindings), &mut definition)?;
        }
        Ok(definition)
    }

    fn build_class(
        &mut self,
        decl: &ClassDecl,
        ref_name: &str,
        bindings: &HashMap<String, TypeNode>,
    ) -> Result<ObjectDefinition> {
        let properties: Vec<PropertyDecl> = decl
            .properties
            .iter()
            .map(|p| substitute_property(p, bindings))
            .collect();

        let mut definition = ObjectDefinition {
            ref_name: ref_name.to_string(),
            description: description_of(decl.doc.as_ref()),
            properties: self.resolve_properties(&properties, true)?,
            additional_properties: None,
        };

        if let Some(base) = &decl.extends {
            self.inherit(&base.substitute(bindings), &mut definition)?;
        }
        Ok(definition)
    }

    /// Copies the base's properties into `definition`, or defers the copy when
    /// the base is still being built or still waiting on its own bases.
    fn inherit(&mut self, base: &TypeNode, definition: &mut ObjectDefinition) -> Result<()> {
        match self.resolve(base, ResolveContext::default())? {
            Type::RefObject { ref_name } => {
                if !self.table.is_complete(&ref_name) {
                    self.table.await_inheritance(&definition.ref_name);
                    self.deferred.push_back(DeferredResolver::InheritProperties {
                        target: definition.ref_name.clone(),
                        base: ref_name,
                    });
                } else if let Some(base_definition) = self.table.object(&ref_name) {
                    merge_inherited(definition, base_definition);
                }
                Ok(())
            }
            other => bail_generate!(
                "'{}' cannot extend '{}' type",
                definition.ref_name,
                other.data_type()
            ),
        }
    }

    /// Resolves declared properties. Class fields with an initializer are optional.
    fn resolve_properties(
        &mut self,
        properties: &[PropertyDecl],
        initializer_makes_optional: bool,
    ) -> Result<Vec<Property>> {
        properties
            .iter()
            .map(|p| self.resolve_property(p, initializer_makes_optional))
            .collect()
    }

    fn resolve_property(
        &mut self,
        property: &PropertyDecl,
        initializer_makes_optional: bool,
    ) -> Result<Property> {
        let doc = property.doc.as_ref();
        let ctx = ResolveContext::with_hints(FormatHints::from_doc(doc));

        let type_node = match &property.type_node {
            Some(node) => node.clone(),
            None => property
                .initializer
                .as_ref()
                .map(infer_type_node)
                .unwrap_or(TypeNode::Keyword(Keyword::Any)),
        };
        let property_type = self.resolve(&type_node, ctx)?;

        let has_initializer = property.initializer.is_some() && initializer_makes_optional;
        let required = !property.optional && !has_initializer;

        Ok(Property {
            name: property.name.clone(),
            default: property_default(property, &property_type),
            property_type,
            required,
            description: description_of(doc),
            validators: property_validators(doc)?,
        })
    }
}

/// Binds a declaration's type parameters, filling missing arguments from defaults.
fn bind_type_arguments(
    name: &str,
    parameters: &[TypeParameter],
    arguments: &[TypeNode],
) -> Result<(HashMap<String, TypeNode>, Vec<TypeNode>)> {
    if arguments.len() > parameters.len() {
        bail_generate!(
            "Type '{}' expects {} type arguments, found {}",
            name,
            parameters.len(),
            arguments.len()
        );
    }

    let mut bindings = HashMap::new();
    let mut effective = Vec::with_capacity(parameters.len());
    for (index, parameter) in parameters.iter().enumerate() {
        let Some(argument) = arguments.get(index).or(parameter.default.as_ref()) else {
            bail_generate!(
                "Missing type argument for '{}' in '{}'",
                parameter.name,
                name
            );
        };
        bindings.insert(parameter.name.clone(), argument.clone());
        effective.push(argument.clone());
    }
    Ok((bindings, effective))
}

/// Reference table key of a (possibly generic) declaration.
fn reference_name(name: &str, arguments: &[TypeNode]) -> String {
    let mut ref_name = last_segment(name).to_string();
    for argument in arguments {
        ref_name.push_str(&argument.name_fragment());
    }
    ref_name
}

fn substitute_property(property: &PropertyDecl, bindings: &HashMap<String, TypeNode>) -> PropertyDecl {
    PropertyDecl {
        type_node: property.type_node.as_ref().map(|t| t.substitute(bindings)),
        ..property.clone()
    }
}

/// Member values of an enum, following TypeScript auto-increment rules.
fn enum_values(decl: &EnumDecl) -> Result<Vec<Value>> {
    let mut next = 0.0;
    let mut values = Vec::with_capacity(decl.members.len());
    for member in &decl.members {
        match &member.initializer {
            None => {
                values.push(initializer::json_number(next));
                next += 1.0;
            }
            Some(Expr::Number(n)) => {
                values.push(initializer::json_number(*n));
                next = n + 1.0;
            }
            Some(Expr::String(s)) => values.push(Value::String(s.clone())),
            Some(other) => bail_generate!(
                "Enum member {}.{} = {} is not statically evaluable",
                decl.name,
                member.name,
                other.describe()
            ),
        }
    }
    Ok(values)
}

/// `@default` JSDoc value, else the statically evaluated initializer.
fn property_default(property: &PropertyDecl, ty: &Type) -> Option<Value> {
    let doc_default = property
        .doc
        .as_ref()
        .and_then(|d| d.tag_comment("default"))
        .map(|text| serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_string())));
    if doc_default.is_some() {
        return doc_default;
    }

    let initializer = property.initializer.as_ref()?;
    match initializer::default_value(initializer, ty) {
        Ok(value) => value,
        Err(e) => {
            debug!("No default for property {}: {}", property.name, e);
            None
        }
    }
}

/// Type annotation implied by a literal initializer.
pub fn infer_type_node(expr: &Expr) -> TypeNode {
    match expr {
        Expr::String(_) => TypeNode::Keyword(Keyword::String),
        Expr::Number(_) => TypeNode::Keyword(Keyword::Number),
        Expr::Bool(_) => TypeNode::Keyword(Keyword::Boolean),
        Expr::Array(items) => TypeNode::Array(Box::new(
            items
                .first()
                .map(infer_type_node)
                .unwrap_or(TypeNode::Keyword(Keyword::Any)),
        )),
        Expr::New { constructor, .. } => TypeNode::reference(constructor.clone()),
        _ => TypeNode::Keyword(Keyword::Any),
    }
}

fn is_nullish(node: &TypeNode) -> bool {
    matches!(
        node,
        TypeNode::Keyword(Keyword::Null) | TypeNode::Keyword(Keyword::Undefined)
    )
}

fn literal_primitive(literal: &Literal) -> Type {
    match literal {
        Literal::String(_) => Type::String,
        Literal::Number(_) => Type::Double,
        Literal::Boolean(_) => Type::Boolean,
    }
}

fn description_of(doc: Option<&JsDoc>) -> Option<String> {
    doc.and_then(|d| d.description.clone())
}

fn describe(node: &TypeNode) -> String {
    match node {
        TypeNode::Unsupported { text, .. } => text.clone(),
        TypeNode::Union(members) => members.iter().map(describe).collect::<Vec<_>>().join(" | "),
        TypeNode::Intersection(members) => {
            members.iter().map(describe).collect::<Vec<_>>().join(" & ")
        }
        TypeNode::Keyword(k) => k.as_str().to_string(),
        TypeNode::Reference { name, type_arguments } if type_arguments.is_empty() => name.clone(),
        TypeNode::Reference { name, type_arguments } => format!(
            "{}<{}>",
            name,
            type_arguments.iter().map(describe).collect::<Vec<_>>().join(", ")
        ),
        TypeNode::Array(element) => format!("{}[]", describe(element)),
        TypeNode::Literal(Literal::String(s)) => format!("'{}'", s),
        TypeNode::Literal(literal) => literal_value(literal).to_string(),
        TypeNode::ObjectLiteral { .. } => "{...}".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    const MODELS: &str = r#"
        /** A test model */
        export interface TestModel {
            /** @isInt */
            id: number;
            name?: string;
            createdAt: Date;
            status: Status;
            tags: string[];
            nullable: string | null;
        }

        export enum Status { Active = 'active', Inactive = 'inactive' }

        export enum Priority { Low, Medium = 5, High }

        export interface Node {
            value: string;
            children: Node[];
            parent?: Node;
        }

        export interface GenericModel<T = string> {
            result: T;
            items: T[];
        }

        export class BaseEntity {
            public id: string;
            public version = 1;
        }

        export class Account extends BaseEntity {
            public owner: string;
            constructor(public readonly region: string) { super(); }
        }

        export type Color = 'red' | 'green';
        export type Point = { x: number; y: number };
        export type Identifier = string;
        export type Both = TestModel & Node;

        export interface Dictionary { [key: string]: number; }
    "#;

    fn program() -> Program {
        Program::from_sources(&[("models.ts", MODELS)]).unwrap()
    }

    fn reference(name: &str) -> TypeNode {
        TypeNode::reference(name)
    }

    fn generic(name: &str, arguments: Vec<TypeNode>) -> TypeNode {
        TypeNode::Reference {
            name: name.to_string(),
            type_arguments: arguments,
        }
    }

    #[test]
    fn test_resolve_primitives_with_hints() {
        let program = program();
        let mut resolver = TypeResolver::new(&program);
        let ctx = ResolveContext::default();

        assert_eq!(
            resolver.resolve(&TypeNode::Keyword(Keyword::Number), ctx).unwrap(),
            Type::Double
        );
        let int_ctx = ResolveContext::with_hints(FormatHints {
            number: Some(NumberFormat::Int),
            date: Some(DateFormat::Date),
        });
        assert_eq!(
            resolver
                .resolve(&TypeNode::Array(Box::new(TypeNode::Keyword(Keyword::Number))), int_ctx)
                .unwrap(),
            Type::array(Type::Integer)
        );
        assert_eq!(resolver.resolve(&reference("Date"), int_ctx).unwrap(), Type::Date);
        assert_eq!(resolver.resolve(&reference("Date"), ctx).unwrap(), Type::Datetime);
        assert_eq!(resolver.resolve(&reference("Buffer"), ctx).unwrap(), Type::Buffer);
        assert_eq!(
            resolver
                .resolve(&generic("Promise", vec![TypeNode::Keyword(Keyword::Void)]), ctx)
                .unwrap(),
            Type::Void
        );
        assert_eq!(
            resolver.resolve(&TypeNode::Keyword(Keyword::Unknown), ctx).unwrap(),
            Type::Any
        );
    }

    #[test]
    fn test_resolve_interface_registers_reference() {
        let program = program();
        let mut resolver = TypeResolver::new(&program);

        let ty = resolver
            .resolve(&reference("TestModel"), ResolveContext::default())
            .unwrap();
        assert_eq!(
            ty,
            Type::RefObject {
                ref_name: "TestModel".to_string()
            }
        );

        let table = resolver.finish().unwrap();
        let keys: Vec<&str> = table.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["TestModel", "Status"]);

        let ReferenceType::RefObject(model) = &table["TestModel"] else {
            panic!("expected object");
        };
        assert_eq!(model.description.as_deref(), Some("A test model"));
        let summary: Vec<(&str, &str, bool)> = model
            .properties
            .iter()
            .map(|p| (p.name.as_str(), p.property_type.data_type(), p.required))
            .collect();
        assert_eq!(
            summary,
            vec![
                ("id", "integer", true),
                ("name", "string", false),
                ("createdAt", "datetime", true),
                ("status", "refEnum", true),
                ("tags", "array", true),
                ("nullable", "string", true),
            ]
        );
        assert!(model.properties[0].validators.contains_key("isInt"));

        assert_eq!(
            table["Status"],
            ReferenceType::RefEnum(EnumDefinition {
                ref_name: "Status".to_string(),
                description: None,
                enums: vec![json!("active"), json!("inactive")],
            })
        );
    }

    #[test]
    fn test_enum_auto_increment_and_inline() {
        let program = program();
        let mut resolver = TypeResolver::new(&program);

        let inline = resolver
            .resolve(&reference("Priority"), ResolveContext::default().inline_enums())
            .unwrap();

        assert_eq!(
            inline,
            Type::Enum {
                enums: vec![json!(0), json!(5), json!(6)]
            }
        );
        assert!(resolver.table().is_empty());
    }

    #[test]
    fn test_circular_model_defers_link() {
        let program = program();
        let mut resolver = TypeResolver::new(&program);

        resolver
            .resolve(&reference("Node"), ResolveContext::default())
            .unwrap();

        let deferred: Vec<&DeferredResolver> = resolver.deferred().collect();
        assert_eq!(deferred.len(), 2);
        assert_eq!(
            deferred[0],
            &DeferredResolver::Link {
                ref_name: "Node".to_string(),
                referrer: "Node".to_string(),
            }
        );

        let table = resolver.finish().unwrap();
        let ReferenceType::RefObject(node) = &table["Node"] else {
            panic!("expected object");
        };
        assert_eq!(
            node.properties[1].property_type,
            Type::array(Type::RefObject {
                ref_name: "Node".to_string()
            })
        );
    }

    #[test]
    fn test_generic_instantiations_are_keyed_by_arguments() {
        let program = program();
        let mut resolver = TypeResolver::new(&program);
        let ctx = ResolveContext::default();

        let with_model = resolver
            .resolve(&generic("GenericModel", vec![reference("TestModel")]), ctx)
            .unwrap();
        let with_array = resolver
            .resolve(
                &generic(
                    "GenericModel",
                    vec![TypeNode::Array(Box::new(TypeNode::Keyword(Keyword::String)))],
                ),
                ctx,
            )
            .unwrap();
        let defaulted = resolver.resolve(&reference("GenericModel"), ctx).unwrap();

        assert_eq!(with_model.ref_name(), Some("GenericModelTestModel"));
        assert_eq!(with_array.ref_name(), Some("GenericModelstringArray"));
        assert_eq!(defaulted.ref_name(), Some("GenericModelstring"));

        let table = resolver.finish().unwrap();
        let ReferenceType::RefObject(model) = &table["GenericModelTestModel"] else {
            panic!("expected object");
        };
        assert_eq!(
            model.properties[0].property_type,
            Type::RefObject {
                ref_name: "TestModel".to_string()
            }
        );
    }

    #[test]
    fn test_class_inheritance_and_parameter_properties() {
        let program = program();
        let mut resolver = TypeResolver::new(&program);

        resolver
            .resolve(&reference("Account"), ResolveContext::default())
            .unwrap();
        let table = resolver.finish().unwrap();

        let ReferenceType::RefObject(account) = &table["Account"] else {
            panic!("expected object");
        };
        let names: Vec<(&str, bool)> = account
            .properties
            .iter()
            .map(|p| (p.name.as_str(), p.required))
            .collect();
        assert_eq!(
            names,
            vec![("owner", true), ("region", true), ("id", true), ("version", false)]
        );
        assert_eq!(account.properties[3].default, Some(json!(1)));
    }

    #[test]
    fn test_inheritance_through_a_base_still_inheriting() {
        let program = Program::from_sources(&[(
            "chain.ts",
            r#"
            export interface A { a: string; d?: D; }
            export interface B extends A { b: string; }
            export interface D extends B { dd: string; }
            "#,
        )])
        .unwrap();
        let mut resolver = TypeResolver::new(&program);

        resolver.resolve(&reference("A"), ResolveContext::default()).unwrap();
        let table = resolver.finish().unwrap();

        let names = |name: &str| -> Vec<String> {
            let ReferenceType::RefObject(object) = &table[name] else {
                panic!("expected object");
            };
            object.properties.iter().map(|p| p.name.clone()).collect()
        };
        assert_eq!(names("B"), vec!["b", "a", "d"]);
        assert_eq!(names("D"), vec!["dd", "b", "a", "d"]);
    }

    #[test]
    fn test_type_aliases() {
        let program = program();
        let mut resolver = TypeResolver::new(&program);
        let ctx = ResolveContext::default();

        assert_eq!(
            resolver.resolve(&reference("Color"), ctx).unwrap(),
            Type::Enum {
                enums: vec![json!("red"), json!("green")]
            }
        );
        assert_eq!(
            resolver.resolve(&reference("Identifier"), ctx).unwrap(),
            Type::String
        );
        assert_eq!(
            resolver.resolve(&reference("Point"), ctx).unwrap(),
            Type::RefObject {
                ref_name: "Point".to_string()
            }
        );

        let err = resolver.resolve(&reference("Both"), ctx).unwrap_err();
        assert!(err.message().starts_with("Intersection types are not supported"));
    }

    #[test]
    fn test_index_signature_becomes_additional_properties() {
        let program = program();
        let mut resolver = TypeResolver::new(&program);

        resolver
            .resolve(&reference("Dictionary"), ResolveContext::default())
            .unwrap();
        let table = resolver.finish().unwrap();

        let ReferenceType::RefObject(dictionary) = &table["Dictionary"] else {
            panic!("expected object");
        };
        assert!(dictionary.properties.is_empty());
        assert_eq!(dictionary.additional_properties, Some(Type::Double));
    }

    #[test]
    fn test_unions() {
        let program = program();
        let mut resolver = TypeResolver::new(&program);
        let ctx = ResolveContext::default();

        let mixed = TypeNode::Union(vec![
            TypeNode::Keyword(Keyword::String),
            TypeNode::Keyword(Keyword::Number),
        ]);
        assert_eq!(resolver.resolve(&mixed, ctx).unwrap(), Type::Object);

        let only_null = TypeNode::Union(vec![TypeNode::Keyword(Keyword::Null)]);
        assert!(resolver.resolve(&only_null, ctx).is_err());

        let literal = TypeNode::Literal(Literal::String("fixed".into()));
        assert_eq!(
            resolver.resolve(&literal, ctx).unwrap(),
            Type::Enum {
                enums: vec![json!("fixed")]
            }
        );
        assert_eq!(
            resolver.resolve(&literal, ctx.inline_enums()).unwrap(),
            Type::String
        );
    }

    #[test]
    fn test_resolution_errors() {
        let program = Program::from_sources(&[
            ("a.ts", "export interface Dup { a: string; }"),
            ("b.ts", "export interface Dup { b: string; }"),
        ])
        .unwrap();
        let mut resolver = TypeResolver::new(&program);
        let ctx = ResolveContext::default();

        assert_eq!(
            resolver.resolve(&reference("Missing"), ctx).unwrap_err().message(),
            "No matching model found for referenced type Missing."
        );
        assert_eq!(
            resolver.resolve(&reference("Dup"), ctx).unwrap_err().message(),
            "Multiple matching models found for referenced type Dup; please make model names unique."
        );
        assert_eq!(
            resolver
                .resolve(&TypeNode::Keyword(Keyword::Never), ctx)
                .unwrap_err()
                .message(),
            "Unknown type: never"
        );
        let tuple = TypeNode::Unsupported {
            kind: "tuple_type".into(),
            text: "[string, number]".into(),
        };
        assert_eq!(
            resolver.resolve(&tuple, ctx).unwrap_err().message(),
            "Unknown type: tuple_type ('[string, number]')"
        );
    }
}
