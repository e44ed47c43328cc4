//! Generic XML element tree
//!
//! Dialect parsers do not talk to the tokenizer directly. The input is
//! first turned into an [`XmlElement`] tree, and each dialect translates
//! that tree into the document model.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::error::{Result, XliffError};
use crate::writer::{escape_attr, escape_text};

/// An element with its attributes and ordered children
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlElement {
    /// Qualified name as written (`trans-unit`, `mq:history`)
    pub name: String,
    /// Attributes in document order
    pub attributes: Vec<(String, String)>,
    /// Child nodes in document order
    pub children: Vec<XmlNode>,
    /// Byte offset of the start tag in the input
    pub offset: usize,
}

/// A child node
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum XmlNode {
    /// A nested element
    Element(XmlElement),
    /// Character data, entities resolved
    Text(String),
}

impl XmlElement {
    /// Create an element with no attributes or children
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            children: Vec::new(),
            offset: 0,
        }
    }

    /// Name without a namespace prefix
    pub fn local_name(&self) -> &str {
        self.name.rsplit(':').next().unwrap_or(&self.name)
    }

    /// Namespace prefix, if the name has one
    pub fn prefix(&self) -> Option<&str> {
        self.name.split_once(':').map(|(prefix, _)| prefix)
    }

    /// Value of an attribute by qualified name
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Child elements, skipping text
    pub fn elements(&self) -> impl Iterator<Item = &XmlElement> {
        self.children.iter().filter_map(|child| match child {
            XmlNode::Element(element) => Some(element),
            XmlNode::Text(_) => None,
        })
    }

    /// Serialize the element and its subtree back to markup
    pub fn to_xml(&self) -> String {
        let mut out = String::new();
        self.write_xml(&mut out);
        out
    }

    fn write_xml(&self, out: &mut String) {
        out.push('<');
        out.push_str(&self.name);
        for (key, value) in &self.attributes {
            out.push(' ');
            out.push_str(key);
            out.push_str("=\"");
            out.push_str(&escape_attr(value));
            out.push('"');
        }
        if self.children.is_empty() {
            out.push_str("/>");
            return;
        }
        out.push('>');
        for child in &self.children {
            match child {
                XmlNode::Element(element) => element.write_xml(out),
                XmlNode::Text(text) => out.push_str(&escape_text(text)),
            }
        }
        out.push_str("</");
        out.push_str(&self.name);
        out.push('>');
    }
}

/// Parse text into an element tree rooted at the document element
///
/// Whitespace is kept as text nodes; trimming is the caller's choice.
/// Comments, processing instructions and the XML declaration are skipped.
pub fn parse_xml(text: &str) -> Result<XmlElement> {
    if text.trim().is_empty() {
        return Err(XliffError::EmptyInput);
    }
    let mut reader = Reader::from_str(text);
    reader.config_mut().trim_text(false);

    let mut stack: Vec<XmlElement> = Vec::new();
    let mut root: Option<XmlElement> = None;

    loop {
        let offset = reader.buffer_position() as usize;
        let event = match reader.read_event() {
            Ok(event) => event,
            Err(err) => {
                return Err(XliffError::Syntax {
                    offset: reader.buffer_position() as usize,
                    message: err.to_string(),
                })
            }
        };

        match event {
            Event::Start(ref e) => {
                if root.is_some() {
                    return Err(XliffError::Syntax {
                        offset,
                        message: "content after the root element".to_string(),
                    });
                }
                stack.push(start_element(e, offset)?);
            }
            Event::Empty(ref e) => {
                let element = start_element(e, offset)?;
                attach(&mut stack, &mut root, element, offset)?;
            }
            Event::End(_) => {
                let element = stack.pop().ok_or_else(|| XliffError::Syntax {
                    offset,
                    message: "closing tag without a matching opening tag".to_string(),
                })?;
                attach(&mut stack, &mut root, element, offset)?;
            }
            Event::Text(ref e) => {
                let value = e.unescape().map_err(|err| XliffError::Syntax {
                    offset,
                    message: err.to_string(),
                })?;
                push_text(&mut stack, &value, offset)?;
            }
            Event::CData(e) => {
                let value = String::from_utf8_lossy(&e.into_inner()).into_owned();
                push_text(&mut stack, &value, offset)?;
            }
            Event::Eof => break,
            // Declarations, comments, processing instructions and doctypes
            _ => {}
        }
    }

    if let Some(open) = stack.pop() {
        return Err(XliffError::UnclosedElement {
            name: open.name,
            offset: open.offset,
        });
    }

    root.ok_or(XliffError::NoRootElement)
}

fn start_element(e: &BytesStart<'_>, offset: usize) -> Result<XmlElement> {
    let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
    let mut attributes = Vec::new();
    for attr in e.attributes() {
        let attr = attr.map_err(|err| XliffError::Syntax {
            offset,
            message: err.to_string(),
        })?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr
            .unescape_value()
            .map_err(|err| XliffError::Syntax {
                offset,
                message: err.to_string(),
            })?
            .into_owned();
        attributes.push((key, value));
    }
    Ok(XmlElement {
        name,
        attributes,
        children: Vec::new(),
        offset,
    })
}

fn attach(
    stack: &mut [XmlElement],
    root: &mut Option<XmlElement>,
    element: XmlElement,
    offset: usize,
) -> Result<()> {
    if let Some(parent) = stack.last_mut() {
        parent.children.push(XmlNode::Element(element));
        return Ok(());
    }
    if root.is_some() {
        return Err(XliffError::Syntax {
            offset,
            message: "more than one root element".to_string(),
        });
    }
    *root = Some(element);
    Ok(())
}

fn push_text(stack: &mut [XmlElement], value: &str, offset: usize) -> Result<()> {
    match stack.last_mut() {
        Some(parent) => {
            if let Some(XmlNode::Text(last)) = parent.children.last_mut() {
                last.push_str(value);
            } else if !value.is_empty() {
                parent.children.push(XmlNode::Text(value.to_string()));
            }
            Ok(())
        }
        None if value.trim().is_empty() => Ok(()),
        None => Err(XliffError::Syntax {
            offset,
            message: "text outside the root element".to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_tree() {
        let root = parse_xml(
            r#"<?xml version="1.0"?><xliff version="1.2"><file original="a"><body/></file></xliff>"#,
        )
        .unwrap();
        assert_eq!(root.name, "xliff");
        assert_eq!(root.attr("version"), Some("1.2"));
        let file = root.elements().next().unwrap();
        assert_eq!(file.attr("original"), Some("a"));
        assert_eq!(file.elements().next().unwrap().name, "body");
    }

    #[test]
    fn test_entities_and_cdata() {
        let root = parse_xml("<source>a &amp; b<![CDATA[ <c> ]]></source>").unwrap();
        assert_eq!(root.children, vec![XmlNode::Text("a & b <c> ".to_string())]);
    }

    #[test]
    fn test_mixed_content_order() {
        let root = parse_xml(r#"<source>Click <g id="1">here</g> now</source>"#).unwrap();
        assert_eq!(root.children.len(), 3);
        assert!(matches!(&root.children[1], XmlNode::Element(e) if e.name == "g"));
    }

    #[test]
    fn test_unclosed_element() {
        let err = parse_xml("<xliff><file>").unwrap_err();
        assert!(matches!(
            err,
            XliffError::UnclosedElement { .. } | XliffError::Syntax { .. }
        ));
    }

    #[test]
    fn test_mismatched_end_tag() {
        assert!(parse_xml("<a><b></a></b>").is_err());
    }

    #[test]
    fn test_no_root() {
        assert!(matches!(
            parse_xml("<?xml version=\"1.0\"?>"),
            Err(XliffError::NoRootElement)
        ));
        assert!(matches!(parse_xml(" \n\t"), Err(XliffError::EmptyInput)));
    }

    #[test]
    fn test_prefixed_names() {
        let root = parse_xml(r#"<mq:history xmlns:mq="MQXliff" mq:by="x"/>"#).unwrap();
        assert_eq!(root.local_name(), "history");
        assert_eq!(root.prefix(), Some("mq"));
        assert_eq!(root.attr("mq:by"), Some("x"));
    }

    #[test]
    fn test_to_xml_escapes() {
        let root = parse_xml(r#"<a k="x &quot;y&quot;">1 &lt; 2<b/></a>"#).unwrap();
        assert_eq!(root.to_xml(), r#"<a k="x &quot;y&quot;">1 &lt; 2<b/></a>"#);
    }
}
