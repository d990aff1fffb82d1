//! annotator: build-time marker scanner and dispatch-table generator for C++ components.
//!
//! Markers such as `//@Component`, `///@RestController` and `///@GetMapping("/x")`
//! are located line by line, bound to the class or method below them,
//! validated, resolved into routes and rendered as dispatch entries. Once a file
//! is generated its markers are rewritten into an inert `/*...*/` form.

pub mod config;
pub mod diagnostics;
pub mod discover;
pub mod error;
pub mod model;
pub mod pipeline;
pub mod render;
pub mod report;
pub mod resolve;
pub mod rewrite;
pub mod scanner;
pub mod validate;

pub use error::{Error, Result};
