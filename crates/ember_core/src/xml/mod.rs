//! Markup (XML subset) support for Ember.
//!
//! This module parses the engine's markup files (model descriptions, shader
//! programs, scene setup) into a tree of [`XmlNode`]s.
//!
//! ## Supported Features
//!
//! - Nested elements with `key="value"` attributes
//! - Self-closing elements
//! - Raw text content in leaf elements
//!
//! ## Not Supported
//!
//! - Comments, CDATA sections and processing instructions
//! - Entity references (`&amp;` and friends are kept verbatim)
//! - Namespaces and schema validation
//! - Text mixed with child elements
//!
//! # Example
//!
//! ```ignore
//! use ember_core::xml::XmlParser;
//!
//! let parser = XmlParser::from_file("assets/scene.xml")?;
//! for node in parser.top_node().descendants() {
//!     println!("{} <{}>", node.path(), node.name());
//! }
//! ```

mod config;
mod error;
mod loader;
mod node;
mod parser;

pub use config::*;
pub use error::*;
pub use loader::*;
pub use node::*;
pub use parser::*;
