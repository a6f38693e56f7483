//! # ts2typebox
//!
//! Turn TypeScript interfaces and type aliases into [TypeBox] schema code,
//! including declarations that refer to themselves or to each other.
//!
//! TypeBox schemas are plain values built bottom-up, so a schema cannot name
//! one that is defined later. Declarations without dependencies are emitted
//! as they are; every other declaration is split into a template
//! parameterized over its dependencies and a `Type.Recursive` usage that
//! wires the templates together (see [`recursive`]).
//!
//! ```no_run
//! use ts2typebox::{config::Settings, pipeline};
//!
//! let src = "export interface Category { providers?: (string | Provider)[] }\n\
//!            export interface Provider { categories: (string | Category)[] }";
//! let module = pipeline::generate(src, &Settings::default()).unwrap();
//! println!("{module}");
//! ```
//!
//! ## Layout
//!
//! - [`parser`] — source text (via tree-sitter) → [`ir::Declaration`]s
//! - [`rewrite`] — optional per-declaration field rewrites
//! - [`graph`] — dependency graph, classification, emission order
//! - [`codegen`] — one declaration → one TypeBox fragment
//! - [`recursive`] — template/usage synthesis with a per-run cache
//! - [`assemble`] — final block layout
//! - [`pipeline`] — one complete run
//!
//! [TypeBox]: https://github.com/sinclairzx81/typebox
pub mod assemble;
pub mod cli;
pub mod codegen;
pub mod config;
pub mod error;
pub mod graph;
pub mod ir;
pub mod parser;
pub mod pipeline;
pub mod recursive;
pub mod rewrite;

pub use error::{Error, Result};
