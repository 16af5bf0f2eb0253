//! Compound-object descriptors (`dmGetCompoundObjectInfo`).
//!
//! A descriptor lists the child pages of a record as `<page>` elements, each
//! with a `<pageptr>` and a `<pagetitle>`. Monograph descriptors nest pages
//! inside `<node>` hierarchies; those are flattened in document order.

use std::collections::{HashMap, HashSet};

use quick_xml::events::Event;
use quick_xml::reader::Reader;

use crate::metadata::MetadataError;

/// One child page entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DescriptorPage {
    /// Catalog pointer of the page.
    pub pointer: String,
    /// Page title, empty when the descriptor has none.
    pub title: String,
}

/// Parsed compound-object descriptor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompoundDescriptor {
    /// The descriptor's `type` (`Document`, `Monograph`, ...).
    pub kind: Option<String>,
    /// Pages in catalog order, first occurrence of each pointer only.
    pub pages: Vec<DescriptorPage>,
}

impl CompoundDescriptor {
    /// Parses descriptor markup.
    ///
    /// # Errors
    ///
    /// Returns [`MetadataError::Malformed`] when the markup cannot be read.
    pub fn parse(markup: &str) -> Result<Self, MetadataError> {
        let mut reader = Reader::from_str(markup);
        reader.config_mut().trim_text(true);

        let mut descriptor = Self::default();
        let mut seen = HashSet::new();
        let mut open: Vec<Vec<u8>> = Vec::new();
        let mut page: Option<DescriptorPage> = None;

        loop {
            match reader.read_event().map_err(MetadataError::malformed)? {
                Event::Start(start) => {
                    let name = start.local_name().as_ref().to_vec();
                    if name == b"page" {
                        page = Some(DescriptorPage {
                            pointer: String::new(),
                            title: String::new(),
                        });
                    }
                    open.push(name);
                }
                Event::Text(text) => {
                    let text = text.unescape().map_err(MetadataError::malformed)?;
                    match (open.last().map(Vec::as_slice), page.as_mut()) {
                        (Some(b"pageptr"), Some(entry)) => entry.pointer.push_str(&text),
                        (Some(b"pagetitle"), Some(entry)) => entry.title.push_str(&text),
                        (Some(b"type"), _) if open.len() == 2 => {
                            descriptor.kind = Some(text.into_owned());
                        }
                        _ => {}
                    }
                }
                Event::End(_) => {
                    if open.pop().as_deref() == Some(b"page".as_slice())
                        && let Some(entry) = page.take()
                        && !entry.pointer.is_empty()
                        && seen.insert(entry.pointer.clone())
                    {
                        descriptor.pages.push(entry);
                    }
                }
                Event::Eof => break,
                _ => {}
            }
        }

        if !open.is_empty() {
            return Err(MetadataError::malformed("descriptor ends inside an open element"));
        }
        Ok(descriptor)
    }

    /// Page pointers in catalog order.
    #[must_use]
    pub fn pointers(&self) -> Vec<String> {
        self.pages.iter().map(|page| page.pointer.clone()).collect()
    }

    /// Map from page pointer to page title.
    #[must_use]
    pub fn title_map(&self) -> HashMap<String, String> {
        self.pages
            .iter()
            .map(|page| (page.pointer.clone(), page.title.clone()))
            .collect()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const DOCUMENT: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<cpd>
  <type>Document</type>
  <page><pagetitle>Page 1</pagetitle><pagefile>101.jp2</pagefile><pageptr>101</pageptr></page>
  <page><pagetitle>Page 2</pagetitle><pagefile>102.jp2</pagefile><pageptr>102</pageptr></page>
</cpd>"#;

    const MONOGRAPH: &str = r"<cpd>
  <type>Monograph</type>
  <node>
    <nodetitle>Volume</nodetitle>
    <page><pagetitle>Cover</pagetitle><pageptr>200</pageptr></page>
    <node>
      <nodetitle>Chapter 1</nodetitle>
      <page><pagetitle>Page 1</pagetitle><pageptr>201</pageptr></page>
      <page><pagetitle>Page 1 again</pagetitle><pageptr>201</pageptr></page>
    </node>
  </node>
</cpd>";

    #[test]
    fn test_parse_document_descriptor() {
        let descriptor = CompoundDescriptor::parse(DOCUMENT).unwrap();
        assert_eq!(descriptor.kind.as_deref(), Some("Document"));
        assert_eq!(descriptor.pointers(), vec!["101", "102"]);
        assert_eq!(descriptor.title_map().get("102").map(String::as_str), Some("Page 2"));
    }

    #[test]
    fn test_parse_flattens_monograph_and_dedups_pointers() {
        let descriptor = CompoundDescriptor::parse(MONOGRAPH).unwrap();
        assert_eq!(descriptor.kind.as_deref(), Some("Monograph"));
        assert_eq!(descriptor.pointers(), vec!["200", "201"]);
        assert_eq!(descriptor.title_map().get("201").map(String::as_str), Some("Page 1"));
    }

    #[test]
    fn test_parse_page_without_title() {
        let descriptor = CompoundDescriptor::parse("<cpd><page><pageptr>5</pageptr></page></cpd>").unwrap();
        assert_eq!(descriptor.pages, vec![DescriptorPage {
            pointer: "5".to_string(),
            title: String::new(),
        }]);
        assert_eq!(descriptor.kind, None);
    }

    #[test]
    fn test_parse_rejects_truncated_markup() {
        assert!(CompoundDescriptor::parse("<cpd><page><pageptr>5</pageptr>").is_err());
    }
}
