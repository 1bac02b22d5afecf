//! Metadata generation.
//!
//! [`MetadataGenerator`] walks every class of every loaded source unit, hands
//! controllers to [`ControllerGenerator`], which delegates to
//! [`MethodGenerator`] and [`ParameterGenerator`]. All of them share the
//! generator's [`TypeResolver`], which owns the reference table and the
//! deferred-resolver queue for the run.
//!
//! # Example
//!
//! ```no_run
//! use openapi_from_decorators::generator::MetadataGenerator;
//! use openapi_from_decorators::program::{Program, ProgramOptions};
//! use std::path::Path;
//!
//! let program = Program::load(Path::new("src/server.ts"), &ProgramOptions::default()).unwrap();
//! let metadata = MetadataGenerator::new(&program).generate().unwrap();
//! println!("{} controllers", metadata.controllers.len());
//! ```

pub mod controller;
pub mod method;
pub mod parameter;

pub use controller::ControllerGenerator;
pub use method::MethodGenerator;
pub use parameter::ParameterGenerator;

use crate::ast::Declaration;
use crate::error::Result;
use crate::metadata::Metadata;
use crate::program::{Program, ProgramOptions};
use crate::type_resolver::TypeResolver;
use log::info;
use std::path::Path;

/// Produces the [`Metadata`] document for one program.
///
/// A generator is consumed by [`generate`](MetadataGenerator::generate); each
/// run starts from an empty reference table.
pub struct MetadataGenerator<'p> {
    program: &'p Program,
    resolver: TypeResolver<'p>,
}

impl<'p> MetadataGenerator<'p> {
    pub fn new(program: &'p Program) -> Self {
        Self {
            program,
            resolver: TypeResolver::new(program),
        }
    }

    pub fn generate(mut self) -> Result<Metadata> {
        let program = self.program;
        let mut controllers = Vec::new();

        for unit in program.units() {
            for declaration in &unit.declarations {
                let Declaration::Class(class) = declaration else {
                    continue;
                };
                let generator = ControllerGenerator::new(class, &unit.path)?;
                if generator.is_valid() {
                    controllers.push(generator.generate(&mut self.resolver)?);
                }
            }
        }

        info!(
            "Generated {} controllers with {} routes",
            controllers.len(),
            controllers.iter().map(|c| c.methods.len()).sum::<usize>()
        );

        let reference_type_map = self.resolver.finish()?;
        info!("Resolved {} referenced types", reference_type_map.len());

        Ok(Metadata {
            controllers,
            reference_type_map,
        })
    }
}

/// Loads the program at `entry` and generates its metadata.
pub fn generate_metadata(entry: &Path, options: &ProgramOptions) -> anyhow::Result<Metadata> {
    let program = Program::load(entry, options)?;
    Ok(MetadataGenerator::new(&program).generate()?)
}
