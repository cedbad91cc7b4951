#![warn(unused_imports)]
#![warn(unused_must_use)]

//! The semantic front end of Flowquery: name resolution, dependency graph
//! construction and type inference over an already-parsed query file.

pub mod ast;
pub mod dependency_graph;
pub mod errors;
pub mod features;
pub mod graphviz;
pub mod name_resolution;
pub mod types;

mod driver;

pub use driver::Compilation;
pub use errors::{DiagnosticsContext, SemanticError, Span};
pub use features::{UnstableFeatures, UnstableFeaturesError};
