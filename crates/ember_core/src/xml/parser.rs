//! Markup file parser.
//!
//! This module turns a markup document into a tree of [`XmlNode`]s. The
//! parser is hand-written: every step is a bracket search followed by a look
//! at the text between the brackets.
//!
//! # Supported Syntax
//!
//! - `<name attr="value" other='value'>...</name>`
//! - `<name attr="value"/>` (self-closing)
//! - Raw text between a header and its trailer (leaf nodes only)
//!
//! Comments, CDATA, processing instructions and entity references are not
//! recognised. They end up as text or produce a structural error.

use std::path::Path;

use super::config::{DuplicateAttributes, ParserConfig};
use super::error::{MalformedKind, ParseResult, XmlError};
use super::loader::read_markup_file;
use super::node::{NodePath, XmlNode};

/// A parsed markup document.
///
/// Construction either yields a complete tree or fails with an
/// [`XmlError`]; there is no partially parsed state.
#[derive(Debug)]
pub struct XmlParser {
    file_path: String,
    top_node: XmlNode,
}

impl XmlParser {
    /// Read and parse the file at `path`.
    pub fn from_file<P: AsRef<Path>>(path: P) -> ParseResult<Self> {
        Self::from_file_with_config(path, &ParserConfig::default())
    }

    pub fn from_file_with_config<P: AsRef<Path>>(path: P, config: &ParserConfig) -> ParseResult<Self> {
        let path = path.as_ref();
        let text = read_markup_file(path)?;
        Self::parse_str_with_config(&text, path.to_string_lossy().as_ref(), config)
    }

    /// Parse already loaded text. `file_path` is only used in error messages.
    pub fn parse_str(text: &str, file_path: &str) -> ParseResult<Self> {
        Self::parse_str_with_config(text, file_path, &ParserConfig::default())
    }

    pub fn parse_str_with_config(text: &str, file_path: &str, config: &ParserConfig) -> ParseResult<Self> {
        let top_node = Cursor::new(text, file_path, config).parse_document()?;
        Ok(Self {
            file_path: file_path.to_string(),
            top_node,
        })
    }

    /// The document's root node.
    pub fn top_node(&self) -> &XmlNode {
        &self.top_node
    }

    pub fn file_path(&self) -> &str {
        &self.file_path
    }

    /// Take ownership of the root node, dropping the parser.
    pub fn into_top_node(self) -> XmlNode {
        self.top_node
    }
}

/// What a bracket pair turned out to be when a node header was expected.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum HeaderSignal {
    /// A trailer: there is no node here, the enclosing node ends.
    Absent,
    /// `<name .../>`: a complete leaf.
    SelfClosing,
    /// `<name ...>`: data or children follow, then a trailer.
    Open,
}

/// Buffer plus read position, threaded through every parsing step.
struct Cursor<'a> {
    text: &'a str,
    file_path: &'a str,
    config: &'a ParserConfig,
    index: usize,
}

impl<'a> Cursor<'a> {
    fn new(text: &'a str, file_path: &'a str, config: &'a ParserConfig) -> Self {
        Self {
            text,
            file_path,
            config,
            index: 0,
        }
    }

    fn error(&self, offset: usize, kind: MalformedKind) -> XmlError {
        XmlError::malformed(self.file_path, self.text, offset, kind)
    }

    fn parse_document(&mut self) -> ParseResult<XmlNode> {
        let first = match self.find_open_bracket(0) {
            Some(first) => first,
            None => return Err(self.error(0, MalformedKind::EmptyDocument)),
        };
        if let Some(offset) = first_non_blank(&self.text[..first]) {
            return Err(self.error(offset, MalformedKind::ContentOutsideRoot));
        }

        self.index = first;
        let root = match self.construct_node(first, NodePath::root())? {
            Some(root) => root,
            None => {
                let close = self.find_close_bracket(first)?;
                let name = self.text[first + 2..close].trim().to_string();
                return Err(self.error(first, MalformedKind::UnexpectedTrailer { name }));
            }
        };

        if let Some(offset) = first_non_blank(&self.text[self.index..]) {
            return Err(self.error(self.index + offset, MalformedKind::ContentOutsideRoot));
        }

        log::debug!(
            "Parsed {}: root <{}> with {} nodes",
            self.file_path,
            root.name(),
            root.descendants().count()
        );
        Ok(root)
    }

    /// Build the node whose header starts at the open bracket `open`, along
    /// with its whole subtree. Leaves the cursor just past the node's
    /// trailer (or past the header for self-closing nodes).
    ///
    /// Returns `None` if the next bracket pair is a trailer; the cursor then
    /// stays on that trailer.
    fn construct_node(&mut self, open: usize, path: NodePath) -> ParseResult<Option<XmlNode>> {
        let close = self.find_close_bracket(open)?;
        let depth = path.depth();
        let mut node = XmlNode::with_path(path);

        // A trailer here means the enclosing node ends
        let signal = self.set_node_header_info(open, close, &mut node)?;
        if signal == HeaderSignal::Absent {
            return Ok(None);
        }
        if depth > self.config.max_depth {
            return Err(self.error(
                open,
                MalformedKind::DepthExceeded {
                    limit: self.config.max_depth,
                },
            ));
        }
        if signal == HeaderSignal::SelfClosing {
            return Ok(Some(node));
        }

        // Text followed directly by a trailer is this node's data
        let mut next = self.next_bracket_within(&node)?;
        if self.is_trailer_at(next) {
            self.set_node_data(&mut node)?;
        } else {
            // Otherwise children follow until a trailer shows up
            loop {
                if let Some(offset) = first_non_blank(&self.text[self.index..next]) {
                    return Err(self.error(
                        self.index + offset,
                        MalformedKind::MixedContent {
                            name: node.name().to_string(),
                        },
                    ));
                }
                self.index = next;

                let child_path = node.path().child(node.children().len());
                match self.construct_node(next, child_path)? {
                    Some(child) => node.append_child(child),
                    None => break,
                }
                next = self.next_bracket_within(&node)?;
            }
        }

        // Check the trailer name and step past it
        let trailer_end = self.find_node_trailer_end(&node)?;
        self.index = trailer_end + 1;
        Ok(Some(node))
    }

    /// Fill in the name and attributes from the bracket pair `open..=close`.
    fn set_node_header_info(&mut self, open: usize, close: usize, node: &mut XmlNode) -> ParseResult<HeaderSignal> {
        let text = self.text;
        let tag = &text[open + 1..close];

        if tag.starts_with('/') {
            self.index = open;
            return Ok(HeaderSignal::Absent);
        }

        let (body, signal) = match tag.trim_end().strip_suffix('/') {
            Some(body) => (body, HeaderSignal::SelfClosing),
            None => (tag, HeaderSignal::Open),
        };
        let body_start = open + 1;

        let name_start = body.len() - body.trim_start().len();
        let name_end = body[name_start..]
            .find(|c: char| c.is_whitespace())
            .map(|i| name_start + i)
            .unwrap_or(body.len());
        let name = &body[name_start..name_end];

        if name.is_empty() {
            return Err(self.error(body_start, MalformedKind::MissingName));
        }
        if name.contains(['=', '"', '\'', '/']) {
            return Err(self.error(
                body_start + name_start,
                MalformedKind::InvalidName {
                    name: name.to_string(),
                },
            ));
        }
        node.set_name(name);

        self.parse_attributes(&body[name_end..], body_start + name_end, node)?;

        self.index = close + 1;
        Ok(signal)
    }

    /// Parse `key="value"` pairs. `base` is the byte offset of `attrs` in the
    /// document.
    fn parse_attributes(&self, attrs: &str, base: usize, node: &mut XmlNode) -> ParseResult<()> {
        let mut pos = 0;

        loop {
            // Skip separators between attributes
            pos = skip_blank(attrs, pos);
            if pos == attrs.len() {
                return Ok(());
            }

            // Key runs up to whitespace or '='
            let key_start = pos;
            pos = attrs[pos..]
                .find(|c: char| c.is_whitespace() || c == '=')
                .map_or(attrs.len(), |i| pos + i);
            let key = &attrs[key_start..pos];
            if key.is_empty() {
                return Err(self.invalid_attribute(base + key_start, "attribute has no name".to_string()));
            }
            if key.contains(['"', '\'']) {
                return Err(self.invalid_attribute(base + key_start, format!("unexpected quote in '{}'", key)));
            }

            pos = skip_blank(attrs, pos);
            if !attrs[pos..].starts_with('=') {
                return Err(self.invalid_attribute(base + key_start, format!("attribute '{}' has no value", key)));
            }
            pos = skip_blank(attrs, pos + 1);

            // Value sits between matching single or double quotes
            let quote = match attrs[pos..].chars().next() {
                Some(q @ ('"' | '\'')) => q,
                _ => {
                    return Err(self.invalid_attribute(base + pos, format!("value of '{}' is not quoted", key)));
                }
            };
            let value_start = pos + 1;
            let value_end = match attrs[value_start..].find(quote) {
                Some(i) => value_start + i,
                None => {
                    return Err(self.invalid_attribute(base + pos, format!("value of '{}' is not terminated", key)));
                }
            };
            pos = value_end + 1;
            if matches!(attrs[pos..].chars().next(), Some(c) if !c.is_whitespace()) {
                return Err(self.invalid_attribute(base + pos, format!("missing whitespace after '{}'", key)));
            }

            self.insert_attribute(node, key, &attrs[value_start..value_end], base + key_start)?;
        }
    }

    fn insert_attribute(&self, node: &mut XmlNode, key: &str, value: &str, offset: usize) -> ParseResult<()> {
        if !node.has_attribute(key) {
            node.set_attribute(key, value);
            return Ok(());
        }

        match self.config.duplicate_attributes {
            DuplicateAttributes::LastWins => {
                log::warn!(
                    "{}: duplicate attribute '{}' on <{}>, keeping the last value",
                    self.file_path,
                    key,
                    node.name()
                );
                node.set_attribute(key, value);
                Ok(())
            }
            DuplicateAttributes::FirstWins => {
                log::warn!(
                    "{}: duplicate attribute '{}' on <{}>, keeping the first value",
                    self.file_path,
                    key,
                    node.name()
                );
                Ok(())
            }
            DuplicateAttributes::Reject => Err(self.error(
                offset,
                MalformedKind::DuplicateAttribute {
                    key: key.to_string(),
                },
            )),
        }
    }

    fn invalid_attribute(&self, offset: usize, detail: String) -> XmlError {
        self.error(offset, MalformedKind::InvalidAttribute { detail })
    }

    /// Copy the text between the cursor and the next open bracket into the
    /// node. Leaves the cursor on that bracket.
    fn set_node_data(&mut self, node: &mut XmlNode) -> ParseResult<()> {
        let end = self.next_bracket_within(node)?;
        node.set_data(&self.text[self.index..end]);
        self.index = end;
        Ok(())
    }

    /// Returns the index of the closing bracket of `node`'s trailer, which
    /// must be the next bracket pair after the cursor.
    fn find_node_trailer_end(&self, node: &XmlNode) -> ParseResult<usize> {
        let open = self.next_bracket_within(node)?;
        let close = self.find_close_bracket(open)?;

        let found = match self.text[open + 1..close].strip_prefix('/') {
            Some(found) => found.trim(),
            None => {
                return Err(self.error(
                    open,
                    MalformedKind::TrailerNotFound {
                        name: node.name().to_string(),
                    },
                ));
            }
        };
        if found != node.name() {
            return Err(self.error(
                open,
                MalformedKind::TrailerMismatch {
                    expected: node.name().to_string(),
                    found: found.to_string(),
                },
            ));
        }
        Ok(close)
    }

    /// Next open bracket after the cursor while `node` is still open.
    fn next_bracket_within(&self, node: &XmlNode) -> ParseResult<usize> {
        self.find_open_bracket(self.index).ok_or_else(|| {
            self.error(
                self.text.len(),
                MalformedKind::TrailerNotFound {
                    name: node.name().to_string(),
                },
            )
        })
    }

    fn is_trailer_at(&self, open: usize) -> bool {
        self.text.as_bytes().get(open + 1) == Some(&b'/')
    }

    /// Index of the first `<` at or after `from`.
    fn find_open_bracket(&self, from: usize) -> Option<usize> {
        self.text.get(from..).and_then(|rest| rest.find('<')).map(|i| from + i)
    }

    /// Index of the `>` closing the tag opened at `open`. Brackets inside
    /// quoted attribute values are skipped.
    fn find_close_bracket(&self, open: usize) -> ParseResult<usize> {
        let mut quote = None;
        for (i, &b) in self.text.as_bytes().iter().enumerate().skip(open + 1) {
            match quote {
                Some(q) if b == q => quote = None,
                Some(_) => {}
                None => match b {
                    b'"' | b'\'' => quote = Some(b),
                    b'>' => return Ok(i),
                    b'<' => return Err(self.error(i, MalformedKind::UnexpectedOpenBracket)),
                    _ => {}
                },
            }
        }
        Err(self.error(self.text.len(), MalformedKind::BracketNotFound))
    }
}

fn first_non_blank(text: &str) -> Option<usize> {
    text.char_indices().find(|(_, c)| !c.is_whitespace()).map(|(i, _)| i)
}

/// Offset of the first non-whitespace character at or after `from`.
fn skip_blank(text: &str, from: usize) -> usize {
    first_non_blank(&text[from..]).map_or(text.len(), |i| from + i)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> XmlNode {
        XmlParser::parse_str(text, "test.xml").unwrap().into_top_node()
    }

    fn parse_err(text: &str) -> MalformedKind {
        let err = XmlParser::parse_str(text, "test.xml").unwrap_err();
        err.kind().cloned().expect("expected a structural error")
    }

    #[test]
    fn test_parse_child_with_attribute_and_data() {
        let root = parse(r#"<root><child attr="1">hello</child></root>"#);
        assert_eq!(root.name(), "root");
        assert_eq!(root.data(), "");
        assert_eq!(root.children().len(), 1);

        let child = &root.children()[0];
        assert_eq!(child.name(), "child");
        assert_eq!(child.attribute("attr"), Some("1"));
        assert_eq!(child.data(), "hello");
        assert!(child.children().is_empty());
    }

    #[test]
    fn test_self_closing_child() {
        let root = parse("<a><b/></a>");
        assert_eq!(root.name(), "a");
        assert_eq!(root.children().len(), 1);

        let b = &root.children()[0];
        assert_eq!(b.name(), "b");
        assert!(b.children().is_empty());
        assert_eq!(b.data(), "");
    }

    #[test]
    fn test_self_closing_with_attributes() {
        let root = parse(r#"<light type="point" power='2.5' />"#);
        assert_eq!(root.name(), "light");
        assert_eq!(root.attribute("type"), Some("point"));
        assert_eq!(root.attribute_as::<f32>("power"), Some(2.5));
        assert!(root.is_leaf());
        assert_eq!(root.data(), "");
    }

    #[test]
    fn test_mismatched_trailer() {
        assert_eq!(
            parse_err("<a><b></a>"),
            MalformedKind::TrailerMismatch {
                expected: "b".into(),
                found: "a".into(),
            }
        );
    }

    #[test]
    fn test_unterminated_node() {
        assert_eq!(parse_err("<a>"), MalformedKind::TrailerNotFound { name: "a".into() });
        assert_eq!(parse_err("<a>some text"), MalformedKind::TrailerNotFound { name: "a".into() });
    }

    #[test]
    fn test_attributes_without_content() {
        let root = parse(r#"<root x="1" y="2"></root>"#);
        assert_eq!(root.name(), "root");
        assert!(root.children().is_empty());
        assert_eq!(root.data(), "");
        assert_eq!(root.attributes().len(), 2);
        assert_eq!(root.attribute("x"), Some("1"));
        assert_eq!(root.attribute("y"), Some("2"));
    }

    #[test]
    fn test_document_order_traversal() {
        let root = parse(
            "<scene><model><mesh/><texture/></model><light/><camera><target/></camera></scene>",
        );
        let names: Vec<&str> = root.descendants().map(XmlNode::name).collect();
        assert_eq!(
            names,
            vec!["scene", "model", "mesh", "texture", "light", "camera", "target"]
        );
    }

    #[test]
    fn test_whitespace_between_children_ignored() {
        let root = parse(
            r#"
<model name="crate">
    <mesh>crate.obj</mesh>
    <texture slot="diffuse">crate.png</texture>
</model>
"#,
        );
        assert_eq!(root.attribute("name"), Some("crate"));
        assert_eq!(root.data(), "");
        assert_eq!(root.children().len(), 2);
        assert_eq!(root.children()[0].data(), "crate.obj");
        assert_eq!(root.child("texture").map(XmlNode::data), Some("crate.png"));
    }

    #[test]
    fn test_data_is_raw() {
        let root = parse("<shader>\n  void main() { gl_Position = vec4(0.0); }\n</shader>");
        assert_eq!(root.data(), "\n  void main() { gl_Position = vec4(0.0); }\n");

        let root = parse("<title>Привет, мир</title>");
        assert_eq!(root.data(), "Привет, мир");
    }

    #[test]
    fn test_data_and_children_exclusive() {
        let root = parse(
            r#"<scene>
                <model><mesh file="a.obj"/><name>A</name></model>
                <empty></empty>
                <blank> </blank>
            </scene>"#,
        );
        for node in root.descendants() {
            assert!(node.data().is_empty() || node.children().is_empty(), "<{}>", node.name());
        }
        assert_eq!(root.child("blank").map(XmlNode::data), Some(" "));
    }

    #[test]
    fn test_brackets_inside_quoted_values() {
        let root = parse(r#"<rule expr="x > 1 && y < 2" label='say "hi"'/>"#);
        assert_eq!(root.attribute("expr"), Some("x > 1 && y < 2"));
        assert_eq!(root.attribute("label"), Some(r#"say "hi""#));
    }

    #[test]
    fn test_unclosed_open_bracket() {
        assert_eq!(parse_err("<a"), MalformedKind::BracketNotFound);
        assert_eq!(parse_err("<a><b</a>"), MalformedKind::UnexpectedOpenBracket);
        assert_eq!(parse_err(r#"<a b="1></a>"#), MalformedKind::BracketNotFound);
    }

    #[test]
    fn test_mixed_content_rejected() {
        assert_eq!(parse_err("<a>text<b/></a>"), MalformedKind::MixedContent { name: "a".into() });
        assert_eq!(parse_err("<a><b/>tail</a>"), MalformedKind::MixedContent { name: "a".into() });
    }

    #[test]
    fn test_content_outside_root() {
        assert_eq!(parse_err("<a/><b/>"), MalformedKind::ContentOutsideRoot);
        assert_eq!(parse_err("junk<a/>"), MalformedKind::ContentOutsideRoot);
        assert_eq!(parse_err("<a></a>junk"), MalformedKind::ContentOutsideRoot);
        assert_eq!(parse("  \n<a/>\n\n").name(), "a");
    }

    #[test]
    fn test_empty_document() {
        assert_eq!(parse_err(""), MalformedKind::EmptyDocument);
        assert_eq!(parse_err("just text"), MalformedKind::EmptyDocument);
    }

    #[test]
    fn test_stray_trailer_as_root() {
        assert_eq!(parse_err("</a>"), MalformedKind::UnexpectedTrailer { name: "a".into() });
    }

    #[test]
    fn test_missing_or_invalid_name() {
        assert_eq!(parse_err("<></>"), MalformedKind::MissingName);
        assert_eq!(parse_err("< />"), MalformedKind::MissingName);
        assert_eq!(
            parse_err(r#"<a="1"/>"#),
            MalformedKind::InvalidName { name: r#"a="1""#.into() }
        );
    }

    #[test]
    fn test_invalid_attributes() {
        for text in [
            "<a b></a>",
            "<a b=1></a>",
            r#"<a b="1"c="2"/>"#,
            r#"<a ="1"/>"#,
            r#"<a b'c'="1"/>"#,
        ] {
            assert!(
                matches!(parse_err(text), MalformedKind::InvalidAttribute { .. }),
                "{}",
                text
            );
        }
    }

    #[test]
    fn test_attribute_spacing_around_equals() {
        let root = parse(r#"<a  b = "1"   c="2" />"#);
        assert_eq!(root.attribute("b"), Some("1"));
        assert_eq!(root.attribute("c"), Some("2"));
    }

    #[test]
    fn test_unicode_whitespace_separates_attributes() {
        let root = parse("<a\u{a0}b=\"1\"/>");
        assert_eq!(root.name(), "a");
        assert_eq!(root.attribute("b"), Some("1"));
        assert_eq!(root.attributes().len(), 1);

        let root = parse("<a b=\"1\"\u{a0}c=\"2\"\u{2003}d\u{2003}=\u{2003}'3'\u{a0}/>");
        assert_eq!(root.attribute("b"), Some("1"));
        assert_eq!(root.attribute("c"), Some("2"));
        assert_eq!(root.attribute("d"), Some("3"));
    }

    #[test]
    fn test_duplicate_attribute_policies() {
        let text = r#"<a k="1" k="2"/>"#;

        let root = parse(text);
        assert_eq!(root.attribute("k"), Some("2"));

        let config = ParserConfig::default().with_duplicate_attributes(DuplicateAttributes::FirstWins);
        let parser = XmlParser::parse_str_with_config(text, "test.xml", &config).unwrap();
        assert_eq!(parser.top_node().attribute("k"), Some("1"));

        let config = ParserConfig::default().with_duplicate_attributes(DuplicateAttributes::Reject);
        let err = XmlParser::parse_str_with_config(text, "test.xml", &config).unwrap_err();
        assert_eq!(err.kind(), Some(&MalformedKind::DuplicateAttribute { key: "k".into() }));
        assert_eq!(err.offset(), Some(9));
    }

    #[test]
    fn test_depth_limit() {
        let config = ParserConfig::default().with_max_depth(2);

        let ok = XmlParser::parse_str_with_config("<a><b><c/></b></a>", "test.xml", &config);
        assert!(ok.is_ok());

        let err = XmlParser::parse_str_with_config("<a><b><c><d/></c></b></a>", "test.xml", &config).unwrap_err();
        assert_eq!(err.kind(), Some(&MalformedKind::DepthExceeded { limit: 2 }));
    }

    #[test]
    fn test_trailer_where_child_expected_is_absent_node() {
        let root = parse("<root><a/><b/></root>");
        let names: Vec<&str> = root.children().iter().map(XmlNode::name).collect();
        assert_eq!(names, vec!["a", "b"]);

        let root = parse("<root>\n</root>");
        assert!(root.children().is_empty());
        assert_eq!(root.data(), "\n");

        let root = parse("<root><a></a ></root>");
        assert_eq!(root.children().len(), 1);
        assert_eq!(root.children()[0].data(), "");
    }

    #[test]
    fn test_parent_back_reference() {
        let parser = XmlParser::parse_str("<scene><model><mesh/></model></scene>", "scene.xml").unwrap();
        let scene = parser.top_node();
        let mesh = &scene.children()[0].children()[0];

        assert!(scene.parent().is_none());
        assert_eq!(mesh.path().indices(), &[0, 0]);
        assert_eq!(scene.parent_of(mesh).map(XmlNode::name), Some("model"));
        assert_eq!(parser.file_path(), "scene.xml");
    }

    #[test]
    fn test_error_location() {
        let err = XmlParser::parse_str("<a>\n  <b>\n</a>", "scene.xml").unwrap_err();
        match err {
            XmlError::Malformed {
                path,
                offset,
                line,
                column,
                ..
            } => {
                assert_eq!(path, "scene.xml");
                assert_eq!(offset, 10);
                assert_eq!((line, column), (3, 1));
            }
            other => panic!("Expected structural error, got {:?}", other),
        }
    }

    #[test]
    fn test_serialize_tree() {
        let root = parse(r#"<root><child attr="1">hello</child></root>"#);
        let json = serde_json::to_value(&root).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "name": "root",
                "children": [
                    { "name": "child", "attributes": { "attr": "1" }, "data": "hello" }
                ]
            })
        );
    }

    #[test]
    fn test_parse_on_threads() {
        let handles: Vec<_> = (0..4)
            .map(|i| {
                std::thread::spawn(move || {
                    let text = format!(r#"<doc id="{}"><item>{}</item></doc>"#, i, i * 10);
                    XmlParser::parse_str(&text, "thread.xml").map(XmlParser::into_top_node)
                })
            })
            .collect();

        for (i, handle) in handles.into_iter().enumerate() {
            let root = handle.join().unwrap().unwrap();
            assert_eq!(root.attribute_as::<usize>("id"), Some(i));
            assert_eq!(root.children()[0].data(), (i * 10).to_string());
        }
    }
}
