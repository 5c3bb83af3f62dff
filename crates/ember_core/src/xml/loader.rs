//! High-level markup file loading.
//!
//! Reading a file is kept apart from parsing: [`read_markup_file`] turns a
//! path into text (or an [`XmlError::Io`]), and the parser only ever sees the
//! text plus a display path for its error messages.

use std::path::Path;

use super::config::ParserConfig;
use super::error::{ParseResult, XmlError};
use super::node::XmlNode;
use super::parser::XmlParser;

/// Read the whole file at `path` into a string.
pub fn read_markup_file<P: AsRef<Path>>(path: P) -> ParseResult<String> {
    let path = path.as_ref();
    std::fs::read_to_string(path).map_err(|source| XmlError::Io {
        path: path.display().to_string(),
        source,
    })
}

/// Load a markup file and return its root node.
///
/// # Example
///
/// ```ignore
/// use ember_core::xml::load_xml;
///
/// let model = load_xml("assets/models/crate.xml")?;
/// println!("<{}> with {} children", model.name(), model.children().len());
/// ```
pub fn load_xml<P: AsRef<Path>>(path: P) -> ParseResult<XmlNode> {
    load_xml_with_config(path, &ParserConfig::default())
}

pub fn load_xml_with_config<P: AsRef<Path>>(path: P, config: &ParserConfig) -> ParseResult<XmlNode> {
    let parser = XmlParser::from_file_with_config(path, config)?;
    log::info!(
        "Loaded {}: <{}> with {} children",
        parser.file_path(),
        parser.top_node().name(),
        parser.top_node().children().len()
    );
    Ok(parser.into_top_node())
}
