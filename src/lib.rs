//! Static API metadata from decorated TypeScript controllers.
//!
//! Classes decorated with `@Route` are controllers; their methods decorated
//! with an HTTP verb are routes. The crate reads the sources without running
//! them and produces a [`metadata::Metadata`] document: every controller with
//! its routes, parameters, responses and security, plus a table of every named
//! model and enum the routes reference. An OpenAPI 3.0 document can be written
//! from that metadata.
//!
//! # Architecture
//!
//! 1. [`scanner`] - Finds TypeScript sources under a directory
//! 2. [`parser`] - Parses sources with tree-sitter and lowers them to [`ast`]
//! 3. [`program`] - Loads an entry point and its imports, indexes declarations
//! 4. [`annotations`] - Classifies decorators by name
//! 5. [`type_resolver`] - Normalizes type annotations and fills the
//!    [`reference_table`]
//! 6. [`generator`] - Classifies controllers, methods and parameters
//! 7. [`openapi_builder`] - Writes an OpenAPI document from metadata
//! 8. [`serializer`] - Serializes documents to YAML or JSON
//!
//! # Example Usage
//!
//! ```no_run
//! use openapi_from_decorators::{
//!     generator::MetadataGenerator,
//!     openapi_builder::OpenApiBuilder,
//!     program::{Program, ProgramOptions},
//!     serializer::serialize_yaml,
//! };
//! use std::path::Path;
//!
//! let program = Program::load(Path::new("./src/server.ts"), &ProgramOptions::default()).unwrap();
//! let metadata = MetadataGenerator::new(&program).generate().unwrap();
//!
//! let mut builder = OpenApiBuilder::new();
//! builder.add_metadata(&metadata);
//! println!("{}", serialize_yaml(&builder.build()).unwrap());
//! ```
//!
//! # Command-Line Interface
//!
//! For command-line usage, see the [`cli`] module.

pub mod annotations;
pub mod ast;
pub mod cli;
pub mod config;
pub mod error;
pub mod generator;
pub mod initializer;
pub mod jsdoc;
pub mod metadata;
pub mod openapi_builder;
pub mod parser;
pub mod program;
pub mod reference_table;
pub mod scanner;
pub mod serializer;
pub mod type_resolver;
pub mod validators;
