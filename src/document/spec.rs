//! Request model for `POST /generate_docx`.
//!
//! Top-level keys keep the camelCase names plugin clients already send;
//! block-level keys are snake_case. Lengths are inches, spacing and font
//! sizes are points.

use serde::Deserialize;
use serde_json::Value;

use crate::coerce::{deserialize_flag, deserialize_text};

use super::format::{FontFormat, ParagraphFormat, Underline};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentSpec {
    #[serde(flatten)]
    pub defaults: PageDefaults,
    #[serde(default, deserialize_with = "deserialize_flag")]
    pub enable_core_properties: bool,
    #[serde(default)]
    pub core_properties_title: Option<String>,
    #[serde(default)]
    pub core_properties_author: Option<String>,
    #[serde(default)]
    pub core_properties_created: Option<String>,
    #[serde(default, deserialize_with = "deserialize_flag")]
    pub odd_and_even_pages_header_footer: bool,
    #[serde(default)]
    pub sections: Vec<SectionSpec>,
    #[serde(default)]
    pub content: Vec<ContentBlock>,
}

/// Document-wide page geometry. Absent values take the US Letter defaults
/// in [`super::layout::PageGeometry::from_defaults`].
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageDefaults {
    pub default_page_width: Option<f64>,
    pub default_page_height: Option<f64>,
    pub default_left_margin: Option<f64>,
    pub default_right_margin: Option<f64>,
    pub default_top_margin: Option<f64>,
    pub default_bottom_margin: Option<f64>,
    pub default_gutter: Option<f64>,
    pub default_header_distance: Option<f64>,
    pub default_footer_distance: Option<f64>,
    pub default_orientation: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SectionSpec {
    pub start_type: Option<String>,
    pub orientation: Option<String>,
    pub page_width: Option<f64>,
    pub page_height: Option<f64>,
    pub left_margin: Option<f64>,
    pub right_margin: Option<f64>,
    pub top_margin: Option<f64>,
    pub bottom_margin: Option<f64>,
    pub gutter: Option<f64>,
    pub header_distance: Option<f64>,
    pub footer_distance: Option<f64>,
    pub headers: Option<HeaderFooterSpec>,
    pub footers: Option<HeaderFooterSpec>,
}

/// Header or footer text per page type. `paragraph_format` and `font` at
/// this level apply to every variant that does not carry its own.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct HeaderFooterSpec {
    #[serde(alias = "DEFAULT", alias = "PRIMARY")]
    pub default: Option<HeaderFooterText>,
    #[serde(alias = "FIRST")]
    pub first: Option<HeaderFooterText>,
    #[serde(alias = "EVEN")]
    pub even: Option<HeaderFooterText>,
    pub paragraph_format: Option<ParagraphFormat>,
    pub font: Option<FontFormat>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum HeaderFooterText {
    Plain(String),
    Styled {
        text: String,
        #[serde(default)]
        paragraph_format: Option<ParagraphFormat>,
        #[serde(default)]
        font: Option<FontFormat>,
    },
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    Heading(HeadingBlock),
    Paragraph(ParagraphBlock),
    Table(TableBlock),
    Image(ImageBlock),
    List(ListBlock),
    PageBreak,
    #[serde(other)]
    Unsupported,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct HeadingBlock {
    #[serde(deserialize_with = "deserialize_text")]
    pub text: String,
    pub level: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ParagraphBlock {
    #[serde(deserialize_with = "deserialize_text")]
    pub text: String,
    pub style: Option<String>,
    pub paragraph_format: Option<ParagraphFormat>,
    pub runs: Vec<RunSpec>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RunSpec {
    #[serde(deserialize_with = "deserialize_text")]
    pub text: String,
    pub bold: Option<bool>,
    pub italic: Option<bool>,
    pub underline: Option<Underline>,
    pub font: Option<FontFormat>,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct TableBlock {
    pub rows: usize,
    pub cols: usize,
    pub style: Option<String>,
    pub alignment: Option<String>,
    pub table_direction: Option<String>,
    pub autofit: Option<bool>,
    pub vertical_alignment: Option<String>,
    pub data: Vec<Vec<Value>>,
}

impl Default for TableBlock {
    fn default() -> Self {
        TableBlock {
            rows: 1,
            cols: 1,
            style: None,
            alignment: None,
            table_direction: None,
            autofit: None,
            vertical_alignment: None,
            data: Vec::new(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ImageBlock {
    pub url: Option<String>,
    pub width: Option<f64>,
    pub height: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ListBlock {
    pub items: Vec<Value>,
    pub style: Option<String>,
    pub numbering_style: Option<String>,
}

/// Text of a table cell or list item: strings verbatim, null as empty,
/// everything else in its JSON form.
pub fn plain_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parses_blocks_in_order() {
        let spec: DocumentSpec = serde_json::from_value(json!({
            "defaultPageWidth": 8.27,
            "enableCoreProperties": "true",
            "oddAndEvenPagesHeaderFooter": false,
            "content": [
                {"type": "heading", "text": "Intro", "level": 2},
                {"type": "paragraph", "text": "Hello"},
                {"type": "table", "data": [["a"]]},
                {"type": "page_break"},
                {"type": "hologram"}
            ]
        }))
        .unwrap();

        assert_eq!(spec.defaults.default_page_width, Some(8.27));
        assert!(spec.enable_core_properties);
        assert!(!spec.odd_and_even_pages_header_footer);
        assert_eq!(spec.content.len(), 5);
        assert!(matches!(&spec.content[0], ContentBlock::Heading(h) if h.level == Some(2)));
        assert!(matches!(&spec.content[2], ContentBlock::Table(t) if t.rows == 1 && t.cols == 1));
        assert!(matches!(spec.content[3], ContentBlock::PageBreak));
        assert!(matches!(spec.content[4], ContentBlock::Unsupported));
    }

    #[test]
    fn test_header_variants() {
        let spec: SectionSpec = serde_json::from_value(json!({
            "headers": {
                "DEFAULT": "Company",
                "FIRST": {"text": "Cover", "font": {"size": 14}},
                "paragraph_format": {"alignment": "CENTER"}
            }
        }))
        .unwrap();
        let headers = spec.headers.unwrap();
        assert!(matches!(headers.default, Some(HeaderFooterText::Plain(ref t)) if t == "Company"));
        assert!(matches!(headers.first, Some(HeaderFooterText::Styled { ref text, .. }) if text == "Cover"));
        assert!(headers.even.is_none());
        assert_eq!(
            headers.paragraph_format.unwrap().alignment.as_deref(),
            Some("CENTER")
        );
    }

    #[test]
    fn test_null_text_reads_as_empty() {
        let spec: DocumentSpec = serde_json::from_value(json!({
            "content": [
                {"type": "heading", "text": null},
                {"type": "paragraph", "text": null, "runs": [{"text": null, "bold": true}, {"text": 7}]}
            ]
        }))
        .unwrap();

        assert!(matches!(&spec.content[0], ContentBlock::Heading(h) if h.text.is_empty()));
        let ContentBlock::Paragraph(paragraph) = &spec.content[1] else {
            panic!("expected a paragraph, got {:?}", spec.content[1]);
        };
        assert!(paragraph.text.is_empty());
        assert_eq!(paragraph.runs[0].text, "");
        assert_eq!(paragraph.runs[1].text, "7");

        let err = serde_json::from_value::<DocumentSpec>(json!({
            "content": [{"type": "paragraph", "text": ["a"]}]
        }));
        assert!(err.is_err());
    }

    #[test]
    fn test_plain_text() {
        assert_eq!(plain_text(&json!("a")), "a");
        assert_eq!(plain_text(&json!(3)), "3");
        assert_eq!(plain_text(&json!(null)), "");
        assert_eq!(plain_text(&json!(true)), "true");
    }
}
