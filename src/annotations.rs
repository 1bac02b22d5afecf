//! Decorator vocabulary.
//!
//! Decorator names are classified once into a closed set of kinds; the
//! classifiers never compare raw strings. HTTP verbs and parameter bindings
//! match case-insensitively, everything else matches exactly.

use crate::ast::Decorator;
use crate::metadata::{HttpMethod, ParameterLocation};

/// Where a method parameter is bound from, in priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParameterBinding {
    Request,
    Body,
    BodyProp,
    Header,
    Query,
    Path,
}

impl ParameterBinding {
    pub const PRIORITY: [ParameterBinding; 6] = [
        ParameterBinding::Request,
        ParameterBinding::Body,
        ParameterBinding::BodyProp,
        ParameterBinding::Header,
        ParameterBinding::Query,
        ParameterBinding::Path,
    ];

    /// Decorator name as written in source.
    pub fn decorator_name(&self) -> &'static str {
        match self {
            ParameterBinding::Request => "Request",
            ParameterBinding::Body => "Body",
            ParameterBinding::BodyProp => "BodyProp",
            ParameterBinding::Header => "Header",
            ParameterBinding::Query => "Query",
            ParameterBinding::Path => "Path",
        }
    }

    pub fn location(&self) -> ParameterLocation {
        match self {
            ParameterBinding::Request => ParameterLocation::Request,
            ParameterBinding::Body => ParameterLocation::Body,
            ParameterBinding::BodyProp => ParameterLocation::BodyProp,
            ParameterBinding::Header => ParameterLocation::Header,
            ParameterBinding::Query => ParameterLocation::Query,
            ParameterBinding::Path => ParameterLocation::Path,
        }
    }

    fn from_name(name: &str) -> Option<Self> {
        Self::PRIORITY
            .into_iter()
            .find(|binding| binding.decorator_name().eq_ignore_ascii_case(name))
    }

    /// Highest-priority binding among a parameter's decorators.
    pub fn select(decorators: &[Decorator]) -> Option<(ParameterBinding, &Decorator)> {
        Self::PRIORITY.into_iter().find_map(|binding| {
            decorators
                .iter()
                .find(|d| Self::from_name(&d.name) == Some(binding))
                .map(|d| (binding, d))
        })
    }
}

/// Every decorator the generator understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnnotationKind {
    Route,
    Verb(HttpMethod),
    Parameter(ParameterBinding),
    Response,
    SuccessResponse,
    Example,
    Tags,
    Security,
    Hidden,
}

impl AnnotationKind {
    pub fn classify(name: &str) -> Option<Self> {
        let kind = match name {
            "Route" => AnnotationKind::Route,
            "Response" => AnnotationKind::Response,
            "SuccessResponse" => AnnotationKind::SuccessResponse,
            "Example" => AnnotationKind::Example,
            "Tags" => AnnotationKind::Tags,
            "Security" => AnnotationKind::Security,
            "Hidden" => AnnotationKind::Hidden,
            _ => {
                if let Some(verb) = verb_from_name(name) {
                    AnnotationKind::Verb(verb)
                } else {
                    AnnotationKind::Parameter(ParameterBinding::from_name(name)?)
                }
            }
        };
        Some(kind)
    }

    pub fn of(decorator: &Decorator) -> Option<Self> {
        Self::classify(&decorator.name)
    }
}

fn verb_from_name(name: &str) -> Option<HttpMethod> {
    [
        ("get", HttpMethod::Get),
        ("post", HttpMethod::Post),
        ("put", HttpMethod::Put),
        ("patch", HttpMethod::Patch),
        ("delete", HttpMethod::Delete),
    ]
    .into_iter()
    .find(|(verb, _)| verb.eq_ignore_ascii_case(name))
    .map(|(_, method)| method)
}

/// Decorators of exactly `kind`, in declaration order.
pub fn decorators_of_kind(decorators: &[Decorator], kind: AnnotationKind) -> Vec<&Decorator> {
    decorators
        .iter()
        .filter(|d| AnnotationKind::of(d) == Some(kind))
        .collect()
}

/// Routing verbs found on a method, with the decorator that declared each.
pub fn verb_decorators(decorators: &[Decorator]) -> Vec<(HttpMethod, &Decorator)> {
    decorators
        .iter()
        .filter_map(|d| match AnnotationKind::of(d) {
            Some(AnnotationKind::Verb(method)) => Some((method, d)),
            _ => None,
        })
        .collect()
}
