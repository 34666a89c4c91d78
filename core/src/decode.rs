//! Response decoding: JSON, XML, or the body untouched.
//!
//! # Design
//! XML is folded into the same `serde_json::Value` tree JSON produces, so a
//! caller gets one structured type regardless of wire format. The folding
//! follows the usual "XML as hash" conventions:
//!
//! - the root element is the single top-level key,
//! - dashes in element and attribute names become underscores,
//! - attributes become keys next to child elements,
//! - repeated sibling elements collapse into an array,
//! - `type="integer" | "float" | "decimal" | "boolean" | "array"` typecast
//!   the element's content, and `nil="true"` or an empty element is null,
//! - text that sits beside children or attributes lands under `__content__`.

use quick_xml::events::attributes::AttrError;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use serde_json::{Map, Number, Value};

use crate::error::{BoxError, Error, Result};
use crate::format::Format;

/// Key used for text content of an element that also has children or
/// attributes.
pub const CONTENT_KEY: &str = "__content__";

/// A decoded response body.
#[derive(Debug, Clone, PartialEq)]
pub enum Parsed {
    /// Body decoded under `xml` or `json`.
    Structured(Value),
    /// No format resolved; the body exactly as received.
    Raw(String),
}

impl Parsed {
    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Parsed::Structured(value) => Some(value),
            Parsed::Raw(_) => None,
        }
    }

    pub fn as_raw(&self) -> Option<&str> {
        match self {
            Parsed::Raw(body) => Some(body),
            Parsed::Structured(_) => None,
        }
    }

    pub fn into_value(self) -> Option<Value> {
        match self {
            Parsed::Structured(value) => Some(value),
            Parsed::Raw(_) => None,
        }
    }
}

/// Decode `body` under `format`. `None` returns the body unchanged.
///
/// A blank body decodes to `null` under either structured format.
pub fn decode(body: String, format: Option<Format>) -> Result<Parsed> {
    let Some(format) = format else {
        return Ok(Parsed::Raw(body));
    };
    if body.trim().is_empty() {
        return Ok(Parsed::Structured(Value::Null));
    }

    let parsed = match format {
        Format::Json => serde_json::from_str::<Value>(&body).map_err(BoxError::from),
        Format::Xml => xml_to_value(&body).map_err(BoxError::from),
    };
    match parsed {
        Ok(value) => Ok(Parsed::Structured(value)),
        Err(source) => Err(Error::Decode { format, body, source }),
    }
}

/// Errors raised while folding an XML document into a value.
#[derive(Debug, thiserror::Error)]
pub enum XmlError {
    #[error("xml parse: {0}")]
    Syntax(#[from] quick_xml::Error),
    #[error("xml attribute: {0}")]
    Attribute(#[from] AttrError),
    #[error("{0}")]
    Structure(&'static str),
}

/// One open element while the document is being read.
#[derive(Default)]
struct Node {
    name: String,
    attributes: Map<String, Value>,
    children: Vec<(String, Value)>,
    text: String,
    type_hint: Option<String>,
    nil: bool,
}

impl Node {
    fn open(start: &BytesStart<'_>) -> Result<Self, XmlError> {
        let mut node = Node {
            name: key_name(start.name().as_ref()),
            ..Node::default()
        };
        for attr in start.attributes() {
            let attr = attr?;
            let key = key_name(attr.key.as_ref());
            let value = attr.unescape_value()?.into_owned();
            match key.as_str() {
                "type" => node.type_hint = Some(value),
                "nil" => node.nil = value == "true",
                _ => {
                    node.attributes.insert(key, Value::String(value));
                }
            }
        }
        Ok(node)
    }

    fn close(self) -> (String, Value) {
        let Node {
            name,
            attributes,
            children,
            text,
            type_hint,
            nil,
        } = self;

        if nil {
            return (name, Value::Null);
        }
        if type_hint.as_deref() == Some("array") {
            let items = children.into_iter().map(|(_, value)| value).collect();
            return (name, Value::Array(items));
        }
        let text = text.trim();
        if children.is_empty() && attributes.is_empty() {
            return (name, typecast(text, type_hint.as_deref()));
        }

        let mut object = attributes;
        for (key, value) in children {
            insert_grouped(&mut object, key, value);
        }
        if !text.is_empty() {
            object.insert(CONTENT_KEY.to_string(), Value::String(text.to_string()));
        }
        (name, Value::Object(object))
    }
}

/// Insert `value` under `key`, turning repeated keys into an array.
fn insert_grouped(object: &mut Map<String, Value>, key: String, value: Value) {
    match object.get_mut(&key) {
        Some(Value::Array(items)) => items.push(value),
        Some(existing) => {
            let first = existing.take();
            *existing = Value::Array(vec![first, value]);
        }
        None => {
            object.insert(key, value);
        }
    }
}

fn typecast(text: &str, type_hint: Option<&str>) -> Value {
    if text.is_empty() {
        return match type_hint {
            Some("string") => Value::String(String::new()),
            _ => Value::Null,
        };
    }
    let typed = match type_hint {
        Some("integer") => text.parse::<i64>().ok().map(Value::from),
        Some("float" | "decimal") => text.parse::<f64>().ok().and_then(Number::from_f64).map(Value::Number),
        Some("boolean") => Some(Value::Bool(text == "true" || text == "1")),
        _ => None,
    };
    typed.unwrap_or_else(|| Value::String(text.to_string()))
}

fn key_name(raw: &[u8]) -> String {
    String::from_utf8_lossy(raw).replace('-', "_")
}

fn xml_to_value(xml: &str) -> Result<Value, XmlError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut stack: Vec<Node> = Vec::new();
    let mut root: Option<(String, Value)> = None;

    loop {
        match reader.read_event()? {
            Event::Start(start) => stack.push(Node::open(&start)?),
            Event::Empty(start) => {
                let closed = Node::open(&start)?.close();
                attach(&mut stack, &mut root, closed)?;
            }
            Event::End(_) => {
                let node = stack.pop().ok_or(XmlError::Structure("unexpected closing tag"))?;
                attach(&mut stack, &mut root, node.close())?;
            }
            Event::Text(text) => {
                if let Some(node) = stack.last_mut() {
                    node.text.push_str(&text.unescape()?);
                }
            }
            Event::CData(cdata) => {
                if let Some(node) = stack.last_mut() {
                    node.text.push_str(&String::from_utf8_lossy(&cdata));
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !stack.is_empty() {
        return Err(XmlError::Structure("document ended inside an open element"));
    }
    let (name, value) = root.ok_or(XmlError::Structure("document has no root element"))?;
    let mut doc = Map::new();
    doc.insert(name, value);
    Ok(Value::Object(doc))
}

fn attach(
    stack: &mut [Node],
    root: &mut Option<(String, Value)>,
    closed: (String, Value),
) -> Result<(), XmlError> {
    match stack.last_mut() {
        Some(parent) => parent.children.push(closed),
        None if root.is_none() => *root = Some(closed),
        None => return Err(XmlError::Structure("document has more than one root element")),
    }
    Ok(())
}
