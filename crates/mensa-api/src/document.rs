// XML feed parsing
//
// The feed is a Delphi-style data packet: one <ROW> element per meal under
// DATAPACKET/ROWDATA, with every field stored as an attribute. Values are
// always strings; there is no typed schema.
use std::collections::BTreeMap;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use tracing::debug;

use crate::feed::FeedError;

/// One feed row: attribute name -> attribute value
pub type RawRow = BTreeMap<String, String>;

/// The parsed upstream document
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeedDocument {
    pub rows: Vec<RawRow>,
}

const ROW_PATH: [&str; 3] = ["DATAPACKET", "ROWDATA", "ROW"];

/// Parse a feed body into its rows.
///
/// Malformed XML is an error. A well-formed document without the
/// DATAPACKET/ROWDATA/ROW path just has no rows.
pub fn parse_document(xml: &str) -> crate::Result<FeedDocument> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut path: Vec<String> = Vec::new();
    let mut rows = Vec::new();
    let mut saw_root = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                saw_root = true;
                path.push(element_name(&e));
                if is_row(&path) {
                    rows.push(read_row(&e)?);
                }
            }
            Ok(Event::Empty(e)) => {
                saw_root = true;
                path.push(element_name(&e));
                if is_row(&path) {
                    rows.push(read_row(&e)?);
                }
                path.pop();
            }
            Ok(Event::End(_)) => {
                path.pop();
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => {
                return Err(FeedError::Xml(format!(
                    "at position {}: {}",
                    reader.buffer_position(),
                    e
                )))
            }
        }
    }

    if !saw_root {
        return Err(FeedError::Xml("document has no root element".into()));
    }
    if let Some(open) = path.last() {
        return Err(FeedError::Xml(format!("unclosed element <{}>", open)));
    }

    debug!("Found {} rows in feed document", rows.len());
    Ok(FeedDocument { rows })
}

fn element_name(e: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(e.name().as_ref()).into_owned()
}

fn is_row(path: &[String]) -> bool {
    path.len() == ROW_PATH.len() && path.iter().zip(ROW_PATH).all(|(a, b)| a == b)
}

fn read_row(e: &BytesStart<'_>) -> crate::Result<RawRow> {
    let mut row = RawRow::new();
    for attr in e.attributes() {
        let attr = attr.map_err(|e| FeedError::Xml(e.to_string()))?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr
            .unescape_value()
            .map_err(|e| FeedError::Xml(e.to_string()))?
            .into_owned();
        row.insert(key, value);
    }
    Ok(row)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_rows_in_order() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
<DATAPACKET Version="2.0">
  <METADATA>
    <FIELDS>
      <FIELD attrname="MENSA" fieldtype="string"/>
    </FIELDS>
  </METADATA>
  <ROWDATA>
    <ROW MENSA="Hauptmensa" BESCHREIBUNG="Spaghetti"/>
    <ROW MENSA="Contine" BESCHREIBUNG="Curry"/>
    <ROW MENSA="Mensa Garbsen" BESCHREIBUNG="Pizza"></ROW>
  </ROWDATA>
</DATAPACKET>"#;

        let doc = parse_document(xml).unwrap();
        let names: Vec<&str> = doc.rows.iter().map(|r| r["BESCHREIBUNG"].as_str()).collect();
        assert_eq!(names, vec!["Spaghetti", "Curry", "Pizza"]);
        // FIELD elements are metadata, not rows
        assert!(doc.rows.iter().all(|r| !r.contains_key("attrname")));
    }

    #[test]
    fn test_attribute_values_are_unescaped() {
        let xml = r#"<DATAPACKET><ROWDATA><ROW BESCHREIBUNG="Kartoffeln &amp; Quark" NAEHRWERTE="Eiweiß=3,1 g"/></ROWDATA></DATAPACKET>"#;

        let doc = parse_document(xml).unwrap();
        assert_eq!(doc.rows[0]["BESCHREIBUNG"], "Kartoffeln & Quark");
        assert_eq!(doc.rows[0]["NAEHRWERTE"], "Eiweiß=3,1 g");
    }

    #[test]
    fn test_missing_row_path_yields_no_rows() {
        let doc = parse_document("<DATAPACKET><METADATA/></DATAPACKET>").unwrap();
        assert!(doc.rows.is_empty());

        let doc = parse_document("<SPEISEPLAN><ROWDATA><ROW MENSA=\"x\"/></ROWDATA></SPEISEPLAN>").unwrap();
        assert!(doc.rows.is_empty());
    }

    #[test]
    fn test_nested_rows_are_not_rows() {
        let xml = "<DATAPACKET><ROWDATA><ROW A=\"1\"><ROW A=\"2\"/></ROW></ROWDATA></DATAPACKET>";
        let doc = parse_document(xml).unwrap();
        assert_eq!(doc.rows.len(), 1);
        assert_eq!(doc.rows[0]["A"], "1");
    }

    #[test]
    fn test_mismatched_tags_fail() {
        let err = parse_document("<DATAPACKET><ROWDATA></DATAPACKET>").unwrap_err();
        assert!(err.is_parse());
    }

    #[test]
    fn test_unclosed_document_fails() {
        let err = parse_document("<DATAPACKET><ROWDATA><ROW A=\"1\"/>").unwrap_err();
        assert!(err.is_parse());
    }

    #[test]
    fn test_plain_text_fails() {
        let err = parse_document("Service temporarily unavailable").unwrap_err();
        assert!(err.is_parse());
    }
}
