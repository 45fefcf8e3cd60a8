//! Minimal XML tree used to hold the registry document.
//!
//! The registry only needs element names, attributes, text and child
//! elements, so this module keeps the whole document in memory as a tree of
//! [`Element`]s. Comments, processing instructions and the XML declaration
//! are dropped on parse; the serializer always writes a UTF-8 declaration and
//! indents nested elements with two spaces.
//!
//! Whitespace-only text inside an element that has child elements is treated
//! as formatting and discarded, so a document survives any number of
//! parse/serialize cycles unchanged.

use std::borrow::Cow;
use std::io::{BufRead, Read, Write};

use quick_xml::escape::{escape, partial_escape, resolve_predefined_entity};
use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;

use crate::error::TreeError;

const DECLARATION: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="no"?>"#;
const INDENT: &str = "  ";

/// An XML element with its attributes, text content and child elements.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Element {
    /// Element name.
    pub tag: String,
    /// Attributes in document order.
    pub attrs: Vec<(String, String)>,
    /// Text content (concatenation of all text directly inside the element).
    pub text: String,
    /// Child elements in document order.
    pub children: Vec<Element>,
}

impl Element {
    /// Create an empty element.
    #[must_use]
    pub fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_owned(),
            ..Default::default()
        }
    }

    /// Set text content (builder).
    #[must_use]
    pub fn with_text(mut self, text: &str) -> Self {
        text.clone_into(&mut self.text);
        self
    }

    /// Set children (builder).
    #[must_use]
    pub fn with_children(mut self, children: Vec<Element>) -> Self {
        self.children = children;
        self
    }

    /// Text content of this element.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Replace the text content of this element.
    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
    }

    /// Child elements of this element.
    pub fn children(&self) -> &[Element] {
        &self.children
    }

    /// Whether the element has at least one child element.
    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }

    /// First child element named `tag`.
    pub fn child(&self, tag: &str) -> Option<&Element> {
        self.children.iter().find(|child| child.tag == tag)
    }

    /// First child element named `tag`, mutably.
    pub fn child_mut(&mut self, tag: &str) -> Option<&mut Element> {
        self.children.iter_mut().find(|child| child.tag == tag)
    }

    /// All child elements named `tag`.
    pub fn children_named<'a>(&'a self, tag: &'a str) -> impl Iterator<Item = &'a Element> {
        self.children.iter().filter(move |child| child.tag == tag)
    }

    /// First child element named `tag`, appending an empty one if missing.
    pub fn get_or_create_child(&mut self, tag: &str) -> &mut Element {
        let index = if let Some(index) = self.children.iter().position(|child| child.tag == tag) {
            index
        } else {
            self.children.push(Element::new(tag));
            self.children.len() - 1
        };
        &mut self.children[index]
    }

    /// Drop formatting whitespace once the element is fully parsed.
    fn finish(&mut self) {
        if self.has_children() {
            let trimmed = self.text.trim();
            if trimmed.len() != self.text.len() {
                self.text = trimmed.to_owned();
            }
        }
    }
}

/// An in-memory XML document with at most one root element.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct XmlDocument {
    root: Option<Element>,
}

impl XmlDocument {
    /// Create a document without a root element.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Read the whole `input` and parse it.
    ///
    /// # Errors
    ///
    /// Returns an error if reading fails or the content is not well-formed.
    pub fn read_from(mut input: impl Read) -> Result<Self, TreeError> {
        let mut bytes = Vec::new();
        input.read_to_end(&mut bytes)?;
        Self::parse(&bytes)
    }

    /// Parse a document.
    ///
    /// Empty or whitespace-only input yields a document without a root.
    ///
    /// # Errors
    ///
    /// Returns an error for unbalanced or mismatched tags, several root
    /// elements, text outside the root element, unknown entities, or input
    /// that contains no element at all.
    pub fn parse(input: &[u8]) -> Result<Self, TreeError> {
        if input.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self::new());
        }

        let mut reader = Reader::from_reader(input);
        reader.config_mut().trim_text(false);

        let mut parser = TreeBuilder::default();
        let mut buf = Vec::new();

        loop {
            match reader.read_event_into(&mut buf)? {
                Event::Start(e) => {
                    let element = start_element(&reader, &e)?;
                    parser.open(element)?;
                }
                Event::Empty(e) => {
                    let element = start_element(&reader, &e)?;
                    parser.attach(element)?;
                }
                Event::End(_) => parser.close()?,
                Event::Text(e) => {
                    let text = reader.decoder().decode(&e)?;
                    parser.append_text(&text)?;
                }
                Event::GeneralRef(e) => {
                    let entity = reader.decoder().decode(&e)?;
                    let text = decode_entity(&entity)?;
                    parser.append_text(&text)?;
                }
                Event::CData(e) => {
                    let text = reader.decoder().decode(&e)?;
                    parser.append_text(&text)?;
                }
                Event::Eof => break,
                Event::Comment(_) | Event::Decl(_) | Event::PI(_) | Event::DocType(_) => {}
            }
            buf.clear();
        }

        parser.finish()
    }

    /// The root element, if any.
    pub fn root(&self) -> Option<&Element> {
        self.root.as_ref()
    }

    /// The root element, mutably.
    pub fn root_mut(&mut self) -> Option<&mut Element> {
        self.root.as_mut()
    }

    /// The root element, creating one named `tag` if the document is empty.
    ///
    /// An existing root is returned whatever its name.
    pub fn get_or_create_root(&mut self, tag: &str) -> &mut Element {
        self.root.get_or_insert_with(|| Element::new(tag))
    }

    /// Walk `path` below the root, creating every missing element.
    pub fn get_or_create(&mut self, root: &str, path: &[&str]) -> &mut Element {
        let mut node = self.get_or_create_root(root);
        for tag in path {
            node = node.get_or_create_child(tag);
        }
        node
    }

    /// Serialize the document to an indented UTF-8 string.
    pub fn serialize(&self) -> String {
        let mut out = String::with_capacity(1024);
        out.push_str(DECLARATION);
        out.push('\n');
        if let Some(root) = &self.root {
            serialize_node(root, 0, &mut out);
        }
        out
    }

    /// Serialize the document into `output`.
    ///
    /// # Errors
    ///
    /// Returns an error if writing to `output` fails.
    pub fn write_to(&self, mut output: impl Write) -> Result<(), TreeError> {
        output.write_all(self.serialize().as_bytes())?;
        output.flush()?;
        Ok(())
    }
}

/// Stack of open elements while reading events.
#[derive(Default)]
struct TreeBuilder {
    open: Vec<Element>,
    root: Option<Element>,
}

impl TreeBuilder {
    fn open(&mut self, element: Element) -> Result<(), TreeError> {
        if self.open.is_empty() && self.root.is_some() {
            return Err(multiple_roots(&element));
        }
        self.open.push(element);
        Ok(())
    }

    fn close(&mut self) -> Result<(), TreeError> {
        let mut element = self
            .open
            .pop()
            .ok_or_else(|| TreeError::Malformed("closing tag without opening tag".to_owned()))?;
        element.finish();
        self.attach(element)
    }

    fn attach(&mut self, element: Element) -> Result<(), TreeError> {
        if let Some(parent) = self.open.last_mut() {
            parent.children.push(element);
        } else if self.root.is_some() {
            return Err(multiple_roots(&element));
        } else {
            self.root = Some(element);
        }
        Ok(())
    }

    fn append_text(&mut self, text: &str) -> Result<(), TreeError> {
        if let Some(current) = self.open.last_mut() {
            current.text.push_str(text);
        } else if !text.trim().is_empty() {
            return Err(TreeError::Malformed(
                "text content outside of the root element".to_owned(),
            ));
        }
        Ok(())
    }

    fn finish(self) -> Result<XmlDocument, TreeError> {
        if let Some(unclosed) = self.open.last() {
            return Err(TreeError::Malformed(format!(
                "unclosed element <{}>",
                unclosed.tag
            )));
        }
        match self.root {
            Some(root) => Ok(XmlDocument { root: Some(root) }),
            None => Err(TreeError::Malformed("no root element".to_owned())),
        }
    }
}

fn multiple_roots(element: &Element) -> TreeError {
    TreeError::Malformed(format!(
        "element <{}> found after the root element",
        element.tag
    ))
}

fn start_element<R: BufRead>(reader: &Reader<R>, e: &BytesStart) -> Result<Element, TreeError> {
    let tag = reader.decoder().decode(e.name().as_ref())?.into_owned();
    let mut attrs = Vec::new();
    for attr in e.attributes() {
        let attr = attr?;
        let key = reader.decoder().decode(attr.key.as_ref())?.into_owned();
        let value = attr.unescape_value().map_or_else(
            |_| String::from_utf8_lossy(&attr.value).into_owned(),
            Cow::into_owned,
        );
        attrs.push((key, value));
    }
    Ok(Element {
        tag,
        attrs,
        ..Default::default()
    })
}

/// Decode an entity reference (the part between `&` and `;`).
fn decode_entity(entity: &str) -> Result<Cow<'static, str>, TreeError> {
    if let Some(value) = resolve_predefined_entity(entity) {
        return Ok(Cow::Borrowed(value));
    }

    let code = if let Some(hex) = entity
        .strip_prefix("#x")
        .or_else(|| entity.strip_prefix("#X"))
    {
        u32::from_str_radix(hex, 16).ok()
    } else if let Some(decimal) = entity.strip_prefix('#') {
        decimal.parse::<u32>().ok()
    } else {
        None
    };

    code.and_then(char::from_u32)
        .map(|c| Cow::Owned(c.to_string()))
        .ok_or_else(|| TreeError::Malformed(format!("unknown entity &{entity};")))
}

fn serialize_node(node: &Element, depth: usize, out: &mut String) {
    let indent = INDENT.repeat(depth);
    out.push_str(&indent);
    out.push('<');
    out.push_str(&node.tag);
    for (key, value) in &node.attrs {
        out.push(' ');
        out.push_str(key);
        out.push_str("=\"");
        out.push_str(&escape(value.as_str()));
        out.push('"');
    }

    if node.children.is_empty() && node.text.is_empty() {
        out.push_str("/>\n");
        return;
    }

    out.push('>');
    out.push_str(&partial_escape(node.text.as_str()));

    if node.children.is_empty() {
        out.push_str("</");
        out.push_str(&node.tag);
        out.push_str(">\n");
        return;
    }

    out.push('\n');
    for child in &node.children {
        serialize_node(child, depth + 1, out);
    }
    out.push_str(&indent);
    out.push_str("</");
    out.push_str(&node.tag);
    out.push_str(">\n");
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_nested_elements() {
        let doc = XmlDocument::parse(b"<a><b>one</b><c><d>two</d></c></a>").unwrap();

        let root = doc.root().unwrap();
        assert_eq!(root.tag, "a");
        assert_eq!(root.children.len(), 2);
        assert_eq!(root.child("b").unwrap().text(), "one");
        assert_eq!(root.child("c").unwrap().child("d").unwrap().text(), "two");
    }

    #[test]
    fn test_parse_empty_input_has_no_root() {
        assert_eq!(XmlDocument::parse(b"").unwrap(), XmlDocument::new());
        assert_eq!(XmlDocument::parse(b"  \n\t").unwrap(), XmlDocument::new());
    }

    #[test]
    fn test_parse_entities() {
        let doc = XmlDocument::parse(b"<a>Tom &amp; Jerry &#60;&#x3e;</a>").unwrap();
        assert_eq!(doc.root().unwrap().text(), "Tom & Jerry <>");
    }

    #[test]
    fn test_parse_keeps_attributes() {
        let doc = XmlDocument::parse(br#"<a version="2" mode="x&amp;y"/>"#).unwrap();
        assert_eq!(
            doc.root().unwrap().attrs,
            vec![
                ("version".to_owned(), "2".to_owned()),
                ("mode".to_owned(), "x&y".to_owned())
            ]
        );
    }

    #[test]
    fn test_parse_drops_formatting_whitespace() {
        let doc = XmlDocument::parse(b"<?xml version=\"1.0\"?>\n<a>\n  <b> padded </b>\n</a>\n")
            .unwrap();
        let root = doc.root().unwrap();
        assert_eq!(root.text(), "");
        assert_eq!(root.child("b").unwrap().text(), " padded ");
    }

    #[test]
    fn test_parse_rejects_unclosed_element() {
        let err = XmlDocument::parse(b"<a><b></b>").unwrap_err();
        assert!(matches!(err, TreeError::Malformed(_)), "got {err:?}");
    }

    #[test]
    fn test_parse_rejects_mismatched_end_tag() {
        assert!(XmlDocument::parse(b"<a><b></c></a>").is_err());
    }

    #[test]
    fn test_parse_rejects_text_only_input() {
        let err = XmlDocument::parse(b"not xml at all").unwrap_err();
        assert!(matches!(err, TreeError::Malformed(_)), "got {err:?}");
    }

    #[test]
    fn test_parse_rejects_second_root() {
        let err = XmlDocument::parse(b"<a/><b/>").unwrap_err();
        assert!(matches!(err, TreeError::Malformed(_)), "got {err:?}");
    }

    #[test]
    fn test_get_or_create_builds_missing_path() {
        let mut doc = XmlDocument::new();
        doc.get_or_create("a", &["b", "c"]).set_text("leaf");
        doc.get_or_create("a", &["b", "c"]);

        let root = doc.root().unwrap();
        assert_eq!(root.children.len(), 1);
        assert_eq!(root.child("b").unwrap().children.len(), 1);
        assert_eq!(root.child("b").unwrap().child("c").unwrap().text(), "leaf");
    }

    #[test]
    fn test_serialize_indents_and_escapes() {
        let mut doc = XmlDocument::new();
        let root = doc.get_or_create_root("a");
        root.children.push(Element::new("b").with_text("x < y & z"));
        root.children.push(Element::new("empty"));

        assert_eq!(
            doc.serialize(),
            "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"no\"?>\n\
             <a>\n  <b>x &lt; y &amp; z</b>\n  <empty/>\n</a>\n"
        );
    }

    #[test]
    fn test_serialize_then_parse_is_stable() {
        let source = b"<a x=\"1\"><b>one</b><c><d>two &amp; three</d></c><e/></a>";
        let doc = XmlDocument::parse(source).unwrap();
        let first = doc.serialize();
        let reparsed = XmlDocument::parse(first.as_bytes()).unwrap();

        assert_eq!(reparsed, doc);
        assert_eq!(reparsed.serialize(), first);
    }
}
