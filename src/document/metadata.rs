use std::io::{Cursor, Read, Write};

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use super::Warnings;
use super::spec::DocumentSpec;

const CORE_PART: &str = "docProps/core.xml";

/// Title, author and creation date written to `docProps/core.xml`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CoreProperties {
    pub title: Option<String>,
    pub creator: Option<String>,
    pub created: Option<DateTime<Utc>>,
}

impl CoreProperties {
    /// `None` unless `enableCoreProperties` is on.
    pub fn from_spec(spec: &DocumentSpec, warnings: &mut Warnings) -> Option<CoreProperties> {
        if !spec.enable_core_properties {
            return None;
        }
        let created = spec.core_properties_created.as_deref().and_then(|raw| {
            let parsed = parse_timestamp(raw);
            if parsed.is_none() {
                warnings.push("corePropertiesCreated", format!("invalid date '{raw}' ignored"));
            }
            parsed
        });
        Some(CoreProperties {
            title: spec.core_properties_title.clone(),
            creator: spec.core_properties_author.clone(),
            created,
        })
    }

    pub fn to_xml(&self, modified: DateTime<Utc>) -> String {
        let mut xml = String::from(concat!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
            r#"<cp:coreProperties xmlns:cp="http://schemas.openxmlformats.org/package/2006/metadata/core-properties""#,
            r#" xmlns:dc="http://purl.org/dc/elements/1.1/" xmlns:dcterms="http://purl.org/dc/terms/""#,
            r#" xmlns:dcmitype="http://purl.org/dc/dcmitype/" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance">"#,
        ));
        if let Some(title) = &self.title {
            xml.push_str(&format!("<dc:title>{}</dc:title>", escape(title)));
        }
        if let Some(creator) = &self.creator {
            xml.push_str(&format!("<dc:creator>{}</dc:creator>", escape(creator)));
        }
        let created = self.created.unwrap_or(modified);
        xml.push_str(&format!(
            r#"<dcterms:created xsi:type="dcterms:W3CDTF">{}</dcterms:created>"#,
            w3cdtf(created)
        ));
        xml.push_str(&format!(
            r#"<dcterms:modified xsi:type="dcterms:W3CDTF">{}</dcterms:modified>"#,
            w3cdtf(modified)
        ));
        xml.push_str("</cp:coreProperties>");
        xml
    }
}

/// Accepts RFC 3339, a naive `YYYY-MM-DDTHH:MM:SS` (taken as UTC) or a bare date.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

fn w3cdtf(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Secs, true)
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c => out.push(c),
        }
    }
    out
}

/// Re-packs `packed` with a fresh core-properties part. Every other entry is
/// copied over without recompression.
pub fn stamp(packed: &[u8], props: &CoreProperties) -> zip::result::ZipResult<Vec<u8>> {
    let mut archive = ZipArchive::new(Cursor::new(packed))?;
    let mut writer = ZipWriter::new(Cursor::new(Vec::with_capacity(packed.len())));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    for idx in 0..archive.len() {
        let entry = archive.by_index_raw(idx)?;
        if entry.name() == CORE_PART {
            continue;
        }
        writer.raw_copy_file(entry)?;
    }
    writer.start_file(CORE_PART, options)?;
    writer.write_all(props.to_xml(Utc::now()).as_bytes())?;

    Ok(writer.finish()?.into_inner())
}

/// Reads one part back out of a packed document.
pub fn read_part(packed: &[u8], name: &str) -> zip::result::ZipResult<String> {
    let mut archive = ZipArchive::new(Cursor::new(packed))?;
    let mut part = archive.by_name(name)?;
    let mut xml = String::new();
    part.read_to_string(&mut xml)?;
    Ok(xml)
}
