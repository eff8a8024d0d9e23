//! SOAP envelope encoding and decoding.
//!
//! Requests are written from a [`Record`]: objects become nested elements,
//! arrays become repeated elements of the same name and scalars become text.
//! Responses are read back into a generic element tree and converted into
//! JSON values the same way in reverse.

use crate::error::AxlError;
use crate::types::Record;
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use serde_json::{Map, Value};
use std::io::Cursor;

const SOAP_ENV_NS: &str = "http://schemas.xmlsoap.org/soap/envelope/";

fn xml_err(e: impl std::fmt::Display) -> AxlError {
    AxlError::Xml(e.to_string())
}

/// AXL namespace for a schema version, e.g. `http://www.cisco.com/AXL/API/11.5`.
pub fn axl_namespace(schema_version: &str) -> String {
    format!("http://www.cisco.com/AXL/API/{}", schema_version)
}

/// Build a request envelope for `operation`.
///
/// When `wrapper` is set the record is nested inside that element, which is
/// how add operations carry the new object.
pub fn request_envelope(
    namespace: &str,
    operation: &str,
    wrapper: Option<&str>,
    body: &Record,
) -> Result<String, AxlError> {
    let mut writer = Writer::new(Cursor::new(Vec::new()));

    let mut envelope = BytesStart::new("soapenv:Envelope");
    envelope.push_attribute(("xmlns:soapenv", SOAP_ENV_NS));
    envelope.push_attribute(("xmlns:ns", namespace));
    writer
        .write_event(Event::Start(envelope))
        .map_err(xml_err)?;
    writer
        .write_event(Event::Empty(BytesStart::new("soapenv:Header")))
        .map_err(xml_err)?;
    writer
        .write_event(Event::Start(BytesStart::new("soapenv:Body")))
        .map_err(xml_err)?;

    let op_element = format!("ns:{}", operation);
    writer
        .write_event(Event::Start(BytesStart::new(op_element.as_str())))
        .map_err(xml_err)?;

    if let Some(wrapper) = wrapper {
        writer
            .write_event(Event::Start(BytesStart::new(wrapper)))
            .map_err(xml_err)?;
        write_fields(&mut writer, body)?;
        writer
            .write_event(Event::End(BytesEnd::new(wrapper)))
            .map_err(xml_err)?;
    } else {
        write_fields(&mut writer, body)?;
    }

    writer
        .write_event(Event::End(BytesEnd::new(op_element.as_str())))
        .map_err(xml_err)?;
    writer
        .write_event(Event::End(BytesEnd::new("soapenv:Body")))
        .map_err(xml_err)?;
    writer
        .write_event(Event::End(BytesEnd::new("soapenv:Envelope")))
        .map_err(xml_err)?;

    String::from_utf8(writer.into_inner().into_inner()).map_err(xml_err)
}

fn write_fields(writer: &mut Writer<Cursor<Vec<u8>>>, fields: &Record) -> Result<(), AxlError> {
    for (name, value) in fields {
        write_field(writer, name, value)?;
    }
    Ok(())
}

fn write_field(
    writer: &mut Writer<Cursor<Vec<u8>>>,
    name: &str,
    value: &Value,
) -> Result<(), AxlError> {
    match value {
        Value::Array(items) => {
            for item in items {
                write_field(writer, name, item)?;
            }
        }
        Value::Object(children) => {
            writer
                .write_event(Event::Start(BytesStart::new(name)))
                .map_err(xml_err)?;
            write_fields(writer, children)?;
            writer
                .write_event(Event::End(BytesEnd::new(name)))
                .map_err(xml_err)?;
        }
        Value::Null => {
            writer
                .write_event(Event::Empty(BytesStart::new(name)))
                .map_err(xml_err)?;
        }
        scalar => {
            let text = match scalar {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            writer
                .write_event(Event::Start(BytesStart::new(name)))
                .map_err(xml_err)?;
            writer
                .write_event(Event::Text(BytesText::new(&text)))
                .map_err(xml_err)?;
            writer
                .write_event(Event::End(BytesEnd::new(name)))
                .map_err(xml_err)?;
        }
    }
    Ok(())
}

/// Generic element tree used to decode responses.
#[derive(Debug, Default)]
struct Element {
    name: String,
    attributes: Vec<(String, String)>,
    children: Vec<Element>,
    text: String,
}

impl Element {
    fn from_start(start: &BytesStart<'_>) -> Result<Self, AxlError> {
        let name = String::from_utf8_lossy(start.local_name().as_ref()).into_owned();
        let mut attributes = Vec::new();
        for attr in start.attributes() {
            let attr = attr.map_err(xml_err)?;
            if attr.key.as_ref().starts_with(b"xmlns") {
                continue;
            }
            let key = String::from_utf8_lossy(attr.key.local_name().as_ref()).into_owned();
            let value = attr.unescape_value().map_err(xml_err)?.into_owned();
            attributes.push((key, value));
        }
        Ok(Self {
            name,
            attributes,
            ..Default::default()
        })
    }

    /// Depth-first search by local name.
    fn find(&self, name: &str) -> Option<&Element> {
        if self.name == name {
            return Some(self);
        }
        self.children.iter().find_map(|c| c.find(name))
    }

    fn to_value(&self) -> Value {
        if self.children.is_empty() {
            if self.text.is_empty() && !self.attributes.is_empty() {
                return Value::Object(
                    self.attributes
                        .iter()
                        .map(|(k, v)| (k.clone(), Value::String(v.clone())))
                        .collect(),
                );
            }
            return Value::String(self.text.clone());
        }

        let mut map = Map::new();
        for (k, v) in &self.attributes {
            map.insert(k.clone(), Value::String(v.clone()));
        }
        for child in &self.children {
            insert_repeated(&mut map, &child.name, child.to_value());
        }
        Value::Object(map)
    }
}

fn insert_repeated(map: &mut Map<String, Value>, key: &str, value: Value) {
    match map.get_mut(key) {
        Some(Value::Array(items)) => items.push(value),
        Some(existing) => {
            let previous = existing.take();
            *existing = Value::Array(vec![previous, value]);
        }
        None => {
            map.insert(key.to_string(), value);
        }
    }
}

fn attach(stack: &mut [Element], element: Element) -> Result<(), AxlError> {
    stack
        .last_mut()
        .ok_or_else(|| AxlError::Xml("unbalanced closing tag".into()))?
        .children
        .push(element);
    Ok(())
}

fn parse_document(xml: &str) -> Result<Element, AxlError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut stack = vec![Element {
        name: "#document".into(),
        ..Default::default()
    }];

    loop {
        match reader.read_event().map_err(xml_err)? {
            Event::Start(e) => stack.push(Element::from_start(&e)?),
            Event::Empty(e) => {
                let element = Element::from_start(&e)?;
                attach(&mut stack, element)?;
            }
            Event::Text(e) => {
                let text = e.unescape().map_err(xml_err)?;
                if let Some(top) = stack.last_mut() {
                    top.text.push_str(&text);
                }
            }
            Event::CData(e) => {
                let text = String::from_utf8_lossy(&e.into_inner()).into_owned();
                if let Some(top) = stack.last_mut() {
                    top.text.push_str(&text);
                }
            }
            Event::End(_) => {
                if stack.len() < 2 {
                    return Err(AxlError::Xml("unbalanced closing tag".into()));
                }
                let element = stack.pop().ok_or_else(|| AxlError::Xml("empty stack".into()))?;
                attach(&mut stack, element)?;
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if stack.len() != 1 {
        return Err(AxlError::Xml("document ended inside an element".into()));
    }
    stack
        .pop()
        .ok_or_else(|| AxlError::Xml("empty document".into()))
}

/// Decode a response envelope.
///
/// Returns the content of the `<return>` element, or the SOAP fault as
/// [`AxlError::Fault`].
pub fn parse_response(xml: &str) -> Result<Value, AxlError> {
    let document = parse_document(xml)?;

    if let Some(fault) = document.find("Fault") {
        let code = fault
            .find("axlcode")
            .and_then(|c| c.text.trim().parse::<u32>().ok());
        let message = fault
            .find("faultstring")
            .map(|f| f.text.clone())
            .filter(|m| !m.is_empty())
            .or_else(|| fault.find("axlmessage").map(|m| m.text.clone()))
            .unwrap_or_else(|| "Unknown fault".into());
        return Err(AxlError::Fault { code, message });
    }

    document
        .find("return")
        .map(Element::to_value)
        .ok_or_else(|| AxlError::UnexpectedResponse("missing <return> element".into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::record;
    use serde_json::json;

    #[test]
    fn test_request_envelope_nests_and_repeats() {
        let body = record([
            ("pattern", json!("5551212")),
            (
                "lines",
                json!({ "line": [{ "index": 1 }, { "index": 2 }] }),
            ),
            ("description", json!("Jane & Joe")),
            ("voiceMailProfileName", Value::Null),
        ]);

        let xml = request_envelope(&axl_namespace("11.5"), "addPhone", Some("phone"), &body)
            .unwrap();

        assert!(xml.contains("xmlns:ns=\"http://www.cisco.com/AXL/API/11.5\""));
        assert!(xml.contains("<ns:addPhone><phone><pattern>5551212</pattern>"));
        assert!(xml.contains("<lines><line><index>1</index></line><line><index>2</index></line></lines>"));
        assert!(xml.contains("<description>Jane &amp; Joe</description>"));
        assert!(xml.contains("<voiceMailProfileName/>"));
        assert!(xml.ends_with("</phone></ns:addPhone></soapenv:Body></soapenv:Envelope>"));
    }

    #[test]
    fn test_request_envelope_without_wrapper() {
        let body = record([("name", "CSFJDOE")]);
        let xml = request_envelope(&axl_namespace("11.5"), "getPhone", None, &body).unwrap();
        assert!(xml.contains("<ns:getPhone><name>CSFJDOE</name></ns:getPhone>"));
    }

    #[test]
    fn test_parse_get_response() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
<soapenv:Envelope xmlns:soapenv="http://schemas.xmlsoap.org/soap/envelope/">
  <soapenv:Body>
    <ns:getLineResponse xmlns:ns="http://www.cisco.com/AXL/API/11.5">
      <return>
        <line uuid="{ABC}">
          <pattern>5551212</pattern>
          <routePartitionName uuid="{DEF}">Internal PAR</routePartitionName>
          <associatedDevices>
            <device>CSFJDOE</device>
            <device>BOTJDOE</device>
          </associatedDevices>
        </line>
      </return>
    </ns:getLineResponse>
  </soapenv:Body>
</soapenv:Envelope>"#;

        let value = parse_response(xml).unwrap();
        let line = &value["line"];
        assert_eq!(line["uuid"], "{ABC}");
        assert_eq!(line["pattern"], "5551212");
        assert_eq!(line["routePartitionName"], "Internal PAR");
        assert_eq!(line["associatedDevices"]["device"], json!(["CSFJDOE", "BOTJDOE"]));
    }

    #[test]
    fn test_parse_add_response() {
        let xml = r#"<soapenv:Envelope xmlns:soapenv="http://schemas.xmlsoap.org/soap/envelope/">
<soapenv:Body><ns:addLineResponse xmlns:ns="http://www.cisco.com/AXL/API/11.5">
<return>{0F1E2D3C-0000-1111-2222-333344445555}</return>
</ns:addLineResponse></soapenv:Body></soapenv:Envelope>"#;

        let value = parse_response(xml).unwrap();
        assert_eq!(value, json!("{0F1E2D3C-0000-1111-2222-333344445555}"));
    }

    #[test]
    fn test_parse_fault() {
        let xml = r#"<soapenv:Envelope xmlns:soapenv="http://schemas.xmlsoap.org/soap/envelope/">
<soapenv:Body><soapenv:Fault>
<faultcode>soapenv:Client</faultcode>
<faultstring>Item not valid: The specified Line was not found</faultstring>
<detail><axlError><axlcode>5007</axlcode><axlmessage>Item not valid</axlmessage>
<request>getLine</request></axlError></detail>
</soapenv:Fault></soapenv:Body></soapenv:Envelope>"#;

        let err = parse_response(xml).unwrap_err();
        assert!(err.is_not_found());
        match err {
            AxlError::Fault { code, message } => {
                assert_eq!(code, Some(5007));
                assert_eq!(message, "Item not valid: The specified Line was not found");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_parse_missing_return() {
        let xml = r#"<soapenv:Envelope xmlns:soapenv="http://schemas.xmlsoap.org/soap/envelope/">
<soapenv:Body><ns:getLineResponse xmlns:ns="urn:x"/></soapenv:Body></soapenv:Envelope>"#;
        assert!(matches!(
            parse_response(xml),
            Err(AxlError::UnexpectedResponse(_))
        ));
    }

    #[test]
    fn test_parse_malformed() {
        assert!(matches!(
            parse_response("<a><b></a>"),
            Err(AxlError::Xml(_))
        ));
    }
}
