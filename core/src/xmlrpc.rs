//! XML-RPC request encoding and response decoding.
//!
//! Values map onto JSON the obvious way: `struct` to object, `array` to
//! list, `nil` to null, `base64` to its decoded text. A fault response
//! decodes to its `{faultCode, faultString}` struct rather than an error,
//! so the caller sees what the server said.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use quick_xml::escape::escape;
use quick_xml::events::Event;
use quick_xml::Reader;
use serde_json::{Map, Number, Value};

use crate::parser::{ParseError, ResponseParser};

const FORMAT: &str = "xmlrpc";

/// Deepest `<value>` nesting a document may have.
pub const MAX_DEPTH: usize = 128;

/// Element nesting allowed while reading: three elements per value level
/// (`value`, `array`, `data` or `value`, `struct`, `member`) plus the envelope.
const MAX_ELEMENT_DEPTH: usize = 3 * MAX_DEPTH + 8;

/// Decodes `methodResponse` (and `methodCall`) documents.
#[derive(Debug, Clone, Copy, Default)]
pub struct XmlRpcParser;

impl ResponseParser for XmlRpcParser {
    fn parse(&self, body: &str) -> Result<Value, ParseError> {
        decode(body)
    }
}

/// Encode a `methodCall` document.
///
/// A list payload becomes one param per element, any other non-null
/// payload a single param.
pub fn encode_method_call(method: &str, params: &Value) -> String {
    let mut xml = String::from("<?xml version=\"1.0\" encoding=\"utf-8\"?>\n<methodCall>");
    xml.push_str("<methodName>");
    xml.push_str(&escape(method));
    xml.push_str("</methodName><params>");
    let params: Vec<&Value> = match params {
        Value::Null => Vec::new(),
        Value::Array(items) => items.iter().collect(),
        other => vec![other],
    };
    for param in params {
        xml.push_str("<param>");
        encode_value(param, &mut xml);
        xml.push_str("</param>");
    }
    xml.push_str("</params></methodCall>\n");
    xml
}

fn encode_value(value: &Value, xml: &mut String) {
    xml.push_str("<value>");
    match value {
        Value::Null => xml.push_str("<nil/>"),
        Value::Bool(b) => {
            xml.push_str(if *b { "<boolean>1</boolean>" } else { "<boolean>0</boolean>" })
        }
        Value::Number(n) => match n.as_i64().and_then(|n| i32::try_from(n).ok()) {
            Some(int) => xml.push_str(&format!("<int>{int}</int>")),
            None => xml.push_str(&format!("<double>{n}</double>")),
        },
        Value::String(s) => {
            xml.push_str("<string>");
            xml.push_str(&escape(s.as_str()));
            xml.push_str("</string>");
        }
        Value::Array(items) => {
            xml.push_str("<array><data>");
            for item in items {
                encode_value(item, xml);
            }
            xml.push_str("</data></array>");
        }
        Value::Object(map) => {
            xml.push_str("<struct>");
            for (name, item) in map {
                xml.push_str("<member><name>");
                xml.push_str(&escape(name.as_str()));
                xml.push_str("</name>");
                encode_value(item, xml);
                xml.push_str("</member>");
            }
            xml.push_str("</struct>");
        }
    }
    xml.push_str("</value>");
}

/// Decode a `methodResponse` or `methodCall` document.
///
/// A single response param decodes to its value; several decode to a
/// list. A `methodCall` always decodes to the list of its params.
pub fn decode(xml: &str) -> Result<Value, ParseError> {
    let root = read_tree(xml)?;
    match root.name.as_str() {
        "methodResponse" => {
            if let Some(fault) = root.child("fault") {
                let value = fault
                    .child("value")
                    .ok_or_else(|| malformed("fault without value"))?;
                return decode_value(value, 0);
            }
            let mut params = decode_params(&root)?;
            Ok(match params.len() {
                0 => Value::Null,
                1 => params.remove(0),
                _ => Value::Array(params),
            })
        }
        "methodCall" => Ok(Value::Array(decode_params(&root)?)),
        other => Err(malformed(format!("unexpected root element <{other}>"))),
    }
}

fn decode_params(parent: &Node) -> Result<Vec<Value>, ParseError> {
    let Some(params) = parent.child("params") else {
        return Ok(Vec::new());
    };
    params
        .children_named("param")
        .map(|param| {
            param
                .child("value")
                .ok_or_else(|| malformed("param without value"))
                .and_then(|value| decode_value(value, 0))
        })
        .collect()
}

fn decode_value(value: &Node, depth: usize) -> Result<Value, ParseError> {
    if depth >= MAX_DEPTH {
        return Err(too_deep());
    }
    // <value>text</value> without a type element is a string.
    let Some(typed) = value.children.first() else {
        return Ok(Value::String(value.text.clone()));
    };
    let text = typed.text.trim();
    match typed.name.as_str() {
        "i4" | "int" | "i8" => text
            .parse::<i64>()
            .map(Value::from)
            .map_err(|_| malformed(format!("bad integer {text:?}"))),
        "boolean" => match text {
            "1" => Ok(Value::Bool(true)),
            "0" => Ok(Value::Bool(false)),
            other => Err(malformed(format!("bad boolean {other:?}"))),
        },
        "double" => text
            .parse::<f64>()
            .ok()
            .and_then(Number::from_f64)
            .map(Value::Number)
            .ok_or_else(|| malformed(format!("bad double {text:?}"))),
        "string" => Ok(Value::String(typed.text.clone())),
        "dateTime.iso8601" => Ok(Value::String(text.to_string())),
        "base64" => {
            let compact: String = text.split_whitespace().collect();
            STANDARD
                .decode(compact)
                .map(|bytes| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
                .map_err(|e| malformed(format!("bad base64: {e}")))
        }
        "nil" => Ok(Value::Null),
        "array" => {
            let Some(data) = typed.child("data") else {
                return Ok(Value::Array(Vec::new()));
            };
            data.children_named("value")
                .map(|item| decode_value(item, depth + 1))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array)
        }
        "struct" => {
            let mut map = Map::new();
            for member in typed.children_named("member") {
                let name = member
                    .child("name")
                    .ok_or_else(|| malformed("member without name"))?;
                let value = member
                    .child("value")
                    .ok_or_else(|| malformed("member without value"))?;
                map.insert(name.text.clone(), decode_value(value, depth + 1)?);
            }
            Ok(Value::Object(map))
        }
        other => Err(malformed(format!("unknown value type <{other}>"))),
    }
}

fn malformed(message: impl Into<String>) -> ParseError {
    ParseError::new(FORMAT, message)
}

fn too_deep() -> ParseError {
    malformed("nesting too deep")
}

/// Element tree: name, child elements and concatenated text.
#[derive(Debug, Default)]
struct Node {
    name: String,
    children: Vec<Node>,
    text: String,
}

impl Node {
    fn child(&self, name: &str) -> Option<&Node> {
        self.children.iter().find(|c| c.name == name)
    }

    fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Node> + 'a {
        self.children.iter().filter(move |c| c.name == name)
    }
}

fn read_tree(xml: &str) -> Result<Node, ParseError> {
    let mut reader = Reader::from_str(xml);
    let mut stack: Vec<Node> = Vec::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(start)) => {
                if stack.len() >= MAX_ELEMENT_DEPTH {
                    return Err(too_deep());
                }
                stack.push(Node {
                    name: String::from_utf8_lossy(start.name().as_ref()).into_owned(),
                    ..Node::default()
                });
            }
            Ok(Event::Empty(empty)) => {
                let node = Node {
                    name: String::from_utf8_lossy(empty.name().as_ref()).into_owned(),
                    ..Node::default()
                };
                match stack.last_mut() {
                    Some(parent) => parent.children.push(node),
                    None => return Ok(node),
                }
            }
            Ok(Event::Text(text)) => {
                if let Some(node) = stack.last_mut() {
                    let unescaped = text.unescape().map_err(|e| malformed(e.to_string()))?;
                    node.text.push_str(&unescaped);
                }
            }
            Ok(Event::CData(cdata)) => {
                if let Some(node) = stack.last_mut() {
                    node.text.push_str(&String::from_utf8_lossy(&cdata.into_inner()));
                }
            }
            Ok(Event::End(_)) => {
                let node = stack.pop().ok_or_else(|| malformed("unbalanced end tag"))?;
                match stack.last_mut() {
                    Some(parent) => parent.children.push(node),
                    None => return Ok(node),
                }
            }
            Ok(Event::Eof) => return Err(malformed("unexpected end of document")),
            Ok(_) => {}
            Err(e) => return Err(malformed(e.to_string())),
        }
    }
}
