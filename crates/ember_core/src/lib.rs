//! Ember Core - markup loading for the Ember engine.
//!
//! This crate provides:
//!
//! - **Markup tree**: `XmlNode`, a name/attribute/data/children tree
//! - **Markup parsing**: `XmlParser`, a hand-written parser for the engine's
//!   XML subset, with structural error reporting
//!
//! # Example
//!
//! ```ignore
//! use ember_core::xml::load_xml;
//!
//! let shader = load_xml("assets/shaders/basic.xml")?;
//! let vertex = shader.child("vertex").map(|n| n.data());
//! ```

pub mod xml;

// Re-export commonly used types
pub use xml::{load_xml, XmlError, XmlNode, XmlParser};
