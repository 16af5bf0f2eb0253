//! Item info, the per-object field set returned by `dmGetItemInfo`.
//!
//! CONTENTdm answers with a flat JSON object keyed by field nickname. Empty
//! fields come back as `{}` rather than `""`, so only string values are kept.
//! Collection-specific nicknames are mapped onto named fields here and nowhere
//! else.

use std::collections::BTreeMap;

use serde_json::Value;

/// Status code CONTENTdm uses for "no such item".
pub const NOT_FOUND_CODE: &str = "-2";

/// OCR nicknames tried after the configured one.
pub const DEFAULT_OCR_NICKNAMES: [&str; 2] = ["full", "fullte"];

/// Which source nicknames feed the named [`ItemInfo`] fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldNicknames {
    /// Nickname of the title field.
    pub title: String,
    /// Nickname of the date field.
    pub date: String,
    /// OCR nicknames in lookup order; the first present one wins.
    pub ocr: Vec<String>,
}

impl Default for FieldNicknames {
    fn default() -> Self {
        Self {
            title: "title".to_string(),
            date: "date".to_string(),
            ocr: DEFAULT_OCR_NICKNAMES.iter().map(ToString::to_string).collect(),
        }
    }
}

impl FieldNicknames {
    /// Puts `nickname` in front of the default OCR lookup order.
    #[must_use]
    pub fn with_preferred_ocr(mut self, nickname: impl Into<String>) -> Self {
        let nickname = nickname.into();
        self.ocr.retain(|existing| *existing != nickname);
        self.ocr.insert(0, nickname);
        self
    }
}

/// Parsed item info for one record or page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemInfo {
    /// Catalog record number of the item.
    pub dmrecord: Option<String>,
    /// Title field.
    pub title: Option<String>,
    /// Date field.
    pub date: Option<String>,
    /// Page label (`3`, `Front cover`, ...).
    pub page: Option<String>,
    /// Remote filename of the attached file.
    pub find: Option<String>,
    /// Page text from the first OCR nickname present.
    pub ocr_text: Option<String>,
}

/// Outcome of an item-info lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemLookup {
    /// The catalog returned the item.
    Found(ItemInfo),
    /// The catalog reported the item as missing.
    NotFound,
}

impl ItemInfo {
    /// Maps a `dmGetItemInfo` response onto named fields.
    ///
    /// Returns `None` when `value` is not a JSON object.
    #[must_use]
    pub fn from_json(value: &Value, nicknames: &FieldNicknames) -> Option<ItemLookup> {
        let object = value.as_object()?;
        let fields: BTreeMap<String, String> = object
            .iter()
            .filter_map(|(key, value)| value.as_str().map(|text| (key.clone(), text.to_string())))
            .collect();

        if fields.get("code").map(String::as_str) == Some(NOT_FOUND_CODE) {
            return Some(ItemLookup::NotFound);
        }

        let field = |name: &str| fields.get(name).cloned();
        let ocr_text = nicknames.ocr.iter().find_map(|nickname| field(nickname));

        Some(ItemLookup::Found(Self {
            dmrecord: field("dmrecord"),
            title: field(&nicknames.title),
            date: field(&nicknames.date),
            page: field("page"),
            find: field("find"),
            ocr_text,
        }))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    fn found(value: &Value, nicknames: &FieldNicknames) -> ItemInfo {
        match ItemInfo::from_json(value, nicknames).unwrap() {
            ItemLookup::Found(info) => info,
            ItemLookup::NotFound => panic!("expected item to be found"),
        }
    }

    #[test]
    fn test_from_json_maps_named_fields() {
        let value = json!({
            "dmrecord": "101",
            "title": "The Daily, July 13, 1988",
            "date": "1988-07-13",
            "page": "3",
            "find": "101.jp2",
            "full": "Headline text",
        });
        let info = found(&value, &FieldNicknames::default());
        assert_eq!(info.dmrecord.as_deref(), Some("101"));
        assert_eq!(info.title.as_deref(), Some("The Daily, July 13, 1988"));
        assert_eq!(info.date.as_deref(), Some("1988-07-13"));
        assert_eq!(info.page.as_deref(), Some("3"));
        assert_eq!(info.ocr_text.as_deref(), Some("Headline text"));
        assert_eq!(info.find.as_deref(), Some("101.jp2"));
    }

    #[test]
    fn test_from_json_treats_empty_objects_as_absent() {
        let value = json!({"dmrecord": "7", "title": {}, "full": {}, "fullte": "fallback text"});
        let info = found(&value, &FieldNicknames::default());
        assert_eq!(info.title, None);
        assert_eq!(info.ocr_text.as_deref(), Some("fallback text"));
    }

    #[test]
    fn test_from_json_not_found_code() {
        let value = json!({"code": "-2", "message": "Requested item not found"});
        assert_eq!(
            ItemInfo::from_json(&value, &FieldNicknames::default()),
            Some(ItemLookup::NotFound)
        );
    }

    #[test]
    fn test_from_json_rejects_non_object() {
        assert_eq!(ItemInfo::from_json(&json!(["a"]), &FieldNicknames::default()), None);
    }

    #[test]
    fn test_preferred_ocr_nickname_wins() {
        let nicknames = FieldNicknames::default().with_preferred_ocr("transc");
        assert_eq!(nicknames.ocr, vec!["transc", "full", "fullte"]);
        let value = json!({"full": "generic", "transc": "specific"});
        assert_eq!(found(&value, &nicknames).ocr_text.as_deref(), Some("specific"));
    }

    #[test]
    fn test_preferred_ocr_nickname_not_duplicated() {
        let nicknames = FieldNicknames::default().with_preferred_ocr("fullte");
        assert_eq!(nicknames.ocr, vec!["fullte", "full"]);
    }
}
