//! Markup reading and normalization helpers built on `quick-xml`.
//!
//! Elements are matched by local name, so `mods:dateIssued` and `dateIssued`
//! are the same element for every lookup in this crate.

use quick_xml::events::{BytesDecl, Event};
use quick_xml::reader::Reader;
use quick_xml::writer::Writer;

use super::MetadataError;

/// Text content and attributes of one matched element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementText {
    /// Concatenated, unescaped text of the element and its descendants.
    pub text: String,
    /// Attributes as `(local name, unescaped value)` pairs.
    pub attributes: Vec<(String, String)>,
}

impl ElementText {
    /// Returns the value of the attribute with the given local name.
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }
}

/// Collects every element whose local name is `local_name`, in document order.
///
/// # Errors
///
/// Returns [`MetadataError::Malformed`] when the markup cannot be read.
pub fn element_texts(markup: &str, local_name: &str) -> Result<Vec<ElementText>, MetadataError> {
    let mut reader = Reader::from_str(markup);
    reader.config_mut().trim_text(true);

    let wanted = local_name.as_bytes();
    let mut found = Vec::new();
    // Depth of the open element and the entry being filled while inside a match.
    let mut depth = 0usize;
    let mut current: Option<(usize, ElementText)> = None;

    loop {
        match reader.read_event().map_err(MetadataError::malformed)? {
            Event::Start(start) => {
                depth += 1;
                if current.is_none() && start.local_name().as_ref() == wanted {
                    let attributes = read_attributes(&start)?;
                    current = Some((
                        depth,
                        ElementText {
                            text: String::new(),
                            attributes,
                        },
                    ));
                }
            }
            Event::Empty(empty) => {
                if current.is_none() && empty.local_name().as_ref() == wanted {
                    found.push(ElementText {
                        text: String::new(),
                        attributes: read_attributes(&empty)?,
                    });
                }
            }
            Event::Text(text) => {
                if let Some((_, entry)) = current.as_mut() {
                    let unescaped = text.unescape().map_err(MetadataError::malformed)?;
                    entry.text.push_str(&unescaped);
                }
            }
            Event::CData(cdata) => {
                if let Some((_, entry)) = current.as_mut() {
                    entry.text.push_str(&String::from_utf8_lossy(&cdata.into_inner()));
                }
            }
            Event::End(_) => {
                if current.as_ref().is_some_and(|(open_depth, _)| *open_depth == depth)
                    && let Some((_, entry)) = current.take()
                {
                    found.push(entry);
                }
                depth = depth.saturating_sub(1);
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(found)
}

fn read_attributes(
    element: &quick_xml::events::BytesStart<'_>,
) -> Result<Vec<(String, String)>, MetadataError> {
    element
        .attributes()
        .map(|attribute| {
            let attribute = attribute.map_err(MetadataError::malformed)?;
            let key = String::from_utf8_lossy(attribute.key.local_name().as_ref()).into_owned();
            let value = attribute
                .unescape_value()
                .map_err(MetadataError::malformed)?
                .into_owned();
            Ok((key, value))
        })
        .collect()
}

/// Re-serializes markup with two-space indentation and an XML declaration.
///
/// An existing declaration is kept as-is; otherwise
/// `<?xml version="1.0" encoding="UTF-8"?>` is prepended.
///
/// # Errors
///
/// Returns [`MetadataError::Malformed`] when the markup is not well-formed or
/// has no root element.
pub fn normalize_markup(markup: &str) -> Result<String, MetadataError> {
    let mut reader = Reader::from_str(markup);
    reader.config_mut().trim_text(true);
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);

    let mut wrote_declaration = false;
    let mut saw_root = false;
    let mut depth = 0usize;

    loop {
        let event = reader.read_event().map_err(MetadataError::malformed)?;
        match &event {
            Event::Eof => break,
            Event::Decl(_) => wrote_declaration = true,
            Event::Start(_) | Event::Empty(_) => {
                if !wrote_declaration {
                    writer
                        .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
                        .map_err(MetadataError::malformed)?;
                    wrote_declaration = true;
                }
                saw_root = true;
                if matches!(event, Event::Start(_)) {
                    depth += 1;
                }
            }
            Event::End(_) => depth = depth.saturating_sub(1),
            _ => {}
        }
        writer.write_event(event).map_err(MetadataError::malformed)?;
    }

    if !saw_root {
        return Err(MetadataError::malformed("document has no root element"));
    }
    if depth != 0 {
        return Err(MetadataError::malformed("document ends inside an open element"));
    }

    let mut normalized =
        String::from_utf8(writer.into_inner()).map_err(MetadataError::malformed)?;
    normalized.push('\n');
    Ok(normalized)
}
