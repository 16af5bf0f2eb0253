//! Minimal MODS rendering from CONTENTdm item info.

use std::fmt::Write as _;

use quick_xml::escape::escape;

use super::{MetadataError, MetadataParser, MetadataParserSettings};
use crate::catalog::ItemInfo;

const MODS_OPEN: &str = r#"<mods xmlns="http://www.loc.gov/mods/v3" xmlns:xlink="http://www.w3.org/1999/xlink">"#;

/// Renders record and page MODS from item info.
#[derive(Debug, Clone, Default)]
pub struct CdmToMods {
    alias: String,
    migrated_from_base_url: Option<String>,
}

impl CdmToMods {
    /// Registry constructor.
    #[must_use]
    pub fn boxed(settings: &MetadataParserSettings) -> Box<dyn MetadataParser> {
        Box::new(Self::new(settings))
    }

    /// Creates a renderer from settings.
    #[must_use]
    pub fn new(settings: &MetadataParserSettings) -> Self {
        Self {
            alias: settings.alias.trim_matches('/').to_string(),
            migrated_from_base_url: settings
                .migrated_from_base_url
                .as_deref()
                .map(|base| base.trim_end_matches('/').to_string())
                .filter(|base| !base.is_empty()),
        }
    }

    /// Link back to the record's page in the catalog's public interface.
    fn migrated_from_url(&self, record_key: &str) -> Option<String> {
        self.migrated_from_base_url
            .as_ref()
            .map(|base| format!("{base}/cdm/ref/collection/{}/id/{record_key}", self.alias))
    }
}

impl MetadataParser for CdmToMods {
    fn record_markup(&self, record_key: &str, info: &ItemInfo) -> Result<String, MetadataError> {
        let mut markup = String::from(MODS_OPEN);
        if let Some(title) = info.title.as_deref().filter(|t| !t.trim().is_empty()) {
            let _ = write!(markup, "<titleInfo><title>{}</title></titleInfo>", escape(title.trim()));
        }
        if let Some(date) = info.date.as_deref().filter(|d| !d.trim().is_empty()) {
            let _ = write!(
                markup,
                r#"<originInfo><dateIssued keyDate="yes">{}</dateIssued></originInfo>"#,
                escape(date.trim())
            );
        }
        let _ = write!(markup, r#"<identifier type="local">{}</identifier>"#, escape(record_key));
        if let Some(url) = self.migrated_from_url(record_key) {
            let _ = write!(markup, r#"<identifier type="uri" invalid="yes">{}</identifier>"#, escape(&url));
        }
        markup.push_str("</mods>");
        Ok(markup)
    }

    fn page_markup(&self, pointer: &str, title: &str) -> Result<String, MetadataError> {
        let mut markup = String::from(MODS_OPEN);
        let _ = write!(markup, "<titleInfo><title>{}</title></titleInfo>", escape(title));
        let _ = write!(markup, r#"<identifier type="local">{}</identifier>"#, escape(pointer));
        markup.push_str("</mods>");
        Ok(markup)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::metadata::xml::element_texts;

    fn renderer(base: Option<&str>) -> CdmToMods {
        CdmToMods::new(&MetadataParserSettings {
            alias: "/nwp".to_string(),
            migrated_from_base_url: base.map(ToString::to_string),
        })
    }

    fn info(title: &str, date: &str) -> ItemInfo {
        ItemInfo {
            title: Some(title.to_string()),
            date: Some(date.to_string()),
            ..ItemInfo::default()
        }
    }

    #[test]
    fn test_record_markup_carries_key_date() {
        let markup = renderer(None)
            .record_markup("100", &info("The Daily", "July 13, 1988"))
            .unwrap();
        let dates = element_texts(&markup, "dateIssued").unwrap();
        assert_eq!(dates.len(), 1);
        assert_eq!(dates[0].text, "July 13, 1988");
        assert_eq!(dates[0].attribute("keyDate"), Some("yes"));
        assert!(!markup.contains("invalid=\"yes\""));
    }

    #[test]
    fn test_record_markup_escapes_text() {
        let markup = renderer(None)
            .record_markup("100", &info("Town & <Country>", "1988"))
            .unwrap();
        assert!(markup.contains("Town &amp; &lt;Country&gt;"), "got: {markup}");
        assert_eq!(element_texts(&markup, "title").unwrap()[0].text, "Town & <Country>");
    }

    #[test]
    fn test_record_markup_migrated_from_url() {
        let markup = renderer(Some("https://cdm.example.org/"))
            .record_markup("100", &ItemInfo::default())
            .unwrap();
        let identifiers = element_texts(&markup, "identifier").unwrap();
        let uri = identifiers
            .iter()
            .find(|id| id.attribute("type") == Some("uri"))
            .unwrap();
        assert_eq!(uri.text, "https://cdm.example.org/cdm/ref/collection/nwp/id/100");
        assert_eq!(uri.attribute("invalid"), Some("yes"));
    }

    #[test]
    fn test_record_markup_without_date_has_no_date_element() {
        let markup = renderer(None).record_markup("100", &ItemInfo::default()).unwrap();
        assert!(element_texts(&markup, "dateIssued").unwrap().is_empty());
    }

    #[test]
    fn test_page_markup() {
        let markup = renderer(None).page_markup("101", "Page 1").unwrap();
        assert_eq!(element_texts(&markup, "title").unwrap()[0].text, "Page 1");
        assert_eq!(element_texts(&markup, "identifier").unwrap()[0].text, "101");
    }
}
