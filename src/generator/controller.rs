use super::method::{security_requirement, MethodGenerator};
use crate::annotations::{decorators_of_kind, AnnotationKind};
use crate::ast::{ClassDecl, Decorator, Expr};
use crate::error::{bail_generate, GenerateMetadataError, Result};
use crate::metadata::{Controller, Security};
use crate::type_resolver::TypeResolver;
use log::debug;
use std::path::Path;

/// Classifies a class. Only classes decorated with `@Route` are controllers.
pub struct ControllerGenerator<'a> {
    class: &'a ClassDecl,
    location: &'a Path,
    route: Option<&'a Decorator>,
}

impl<'a> ControllerGenerator<'a> {
    pub fn new(class: &'a ClassDecl, location: &'a Path) -> Result<Self> {
        let routes = decorators_of_kind(&class.decorators, AnnotationKind::Route);
        if routes.len() > 1 {
            bail_generate!(
                "Only one Route decorator allowed in '{}' class.",
                class.name
            );
        }
        Ok(Self {
            class,
            location,
            route: routes.first().copied(),
        })
    }

    pub fn is_valid(&self) -> bool {
        self.route.is_some()
    }

    pub fn generate(&self, resolver: &mut TypeResolver) -> Result<Controller> {
        let path = self
            .route
            .and_then(|route| route.text_argument(0))
            .unwrap_or_default();
        let tags = self.tags()?;
        let security = self.security()?;
        debug!(
            "Generating controller {} at '{}' ({} methods declared)",
            self.class.name,
            path,
            self.class.methods.len()
        );

        let mut methods = Vec::new();
        for method in &self.class.methods {
            let generator = MethodGenerator::new(&self.class.name, method)?;
            if !generator.is_valid() {
                debug!("Skipping non-routable method {}.{}", self.class.name, method.name);
                continue;
            }
            methods.push(generator.generate(resolver, &tags, &security)?);
        }

        Ok(Controller {
            name: self.class.name.clone(),
            location: self.location.display().to_string(),
            path,
            methods,
        })
    }

    fn tags(&self) -> Result<Vec<String>> {
        let decorators = decorators_of_kind(&self.class.decorators, AnnotationKind::Tags);
        if decorators.len() > 1 {
            bail_generate!(
                "Only one Tags decorator allowed in '{}' class.",
                self.class.name
            );
        }
        Ok(decorators
            .first()
            .map(|d| d.arguments.iter().filter_map(Expr::literal_text).collect())
            .unwrap_or_default())
    }

    fn security(&self) -> Result<Vec<Security>> {
        decorators_of_kind(&self.class.decorators, AnnotationKind::Security)
            .into_iter()
            .map(|d| {
                security_requirement(d).map_err(|e| {
                    GenerateMetadataError::new(format!(
                        "{} \n in '{}' class",
                        e.message(),
                        self.class.name
                    ))
                })
            })
            .collect()
    }
}
