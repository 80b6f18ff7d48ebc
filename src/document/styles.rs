//! Built-in style catalogue.
//!
//! `docx-rs` starts from an empty style sheet, so every document gets the
//! paragraph and table styles clients commonly name. Lookups accept either
//! the display name (`Heading 1`) or the style id (`Heading1`).

use docx_rs::{
    AbstractNumbering, Docx, IndentLevel, Level, LevelJc, LevelText, NumberFormat, Numbering,
    NumberingId, Paragraph, SpecialIndentType, Start, Style, StyleType,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StyleKind {
    Paragraph,
    Table,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListKind {
    Bullet,
    Number,
}

impl ListKind {
    fn numbering_id(self) -> usize {
        match self {
            ListKind::Bullet => BULLET_NUMBERING,
            ListKind::Number => DECIMAL_NUMBERING,
        }
    }
}

#[derive(Debug)]
pub struct StyleDef {
    pub id: &'static str,
    pub name: &'static str,
    pub kind: StyleKind,
    pub size_pt: Option<f64>,
    pub bold: bool,
    pub italic: bool,
    pub color: Option<&'static str>,
    pub list: Option<(ListKind, usize)>,
}

const fn paragraph(id: &'static str, name: &'static str) -> StyleDef {
    StyleDef {
        id,
        name,
        kind: StyleKind::Paragraph,
        size_pt: None,
        bold: false,
        italic: false,
        color: None,
        list: None,
    }
}

const fn heading(id: &'static str, name: &'static str, size_pt: f64, italic: bool) -> StyleDef {
    StyleDef {
        size_pt: Some(size_pt),
        bold: true,
        italic,
        color: Some("2F5496"),
        ..paragraph(id, name)
    }
}

const fn list(id: &'static str, name: &'static str, kind: ListKind, level: usize) -> StyleDef {
    StyleDef {
        list: Some((kind, level)),
        ..paragraph(id, name)
    }
}

const fn table(id: &'static str, name: &'static str) -> StyleDef {
    StyleDef {
        kind: StyleKind::Table,
        ..paragraph(id, name)
    }
}

pub const DEFAULT_STYLE: &str = "Normal";
pub const DEFAULT_LIST_STYLE: &str = "List Bullet";

const BULLET_NUMBERING: usize = 1;
const DECIMAL_NUMBERING: usize = 2;

pub static CATALOG: &[StyleDef] = &[
    paragraph("Normal", "Normal"),
    StyleDef {
        size_pt: Some(28.0),
        ..paragraph("Title", "Title")
    },
    StyleDef {
        size_pt: Some(15.0),
        italic: true,
        color: Some("5A5A5A"),
        ..paragraph("Subtitle", "Subtitle")
    },
    heading("Heading1", "Heading 1", 16.0, false),
    heading("Heading2", "Heading 2", 13.0, false),
    heading("Heading3", "Heading 3", 12.0, false),
    heading("Heading4", "Heading 4", 11.0, true),
    heading("Heading5", "Heading 5", 11.0, false),
    heading("Heading6", "Heading 6", 11.0, true),
    heading("Heading7", "Heading 7", 11.0, true),
    heading("Heading8", "Heading 8", 10.0, false),
    heading("Heading9", "Heading 9", 10.0, true),
    StyleDef {
        italic: true,
        ..paragraph("Quote", "Quote")
    },
    StyleDef {
        bold: true,
        italic: true,
        color: Some("2F5496"),
        ..paragraph("IntenseQuote", "Intense Quote")
    },
    StyleDef {
        size_pt: Some(9.0),
        italic: true,
        ..paragraph("Caption", "Caption")
    },
    paragraph("NoSpacing", "No Spacing"),
    paragraph("ListParagraph", "List Paragraph"),
    list("ListBullet", "List Bullet", ListKind::Bullet, 0),
    list("ListBullet2", "List Bullet 2", ListKind::Bullet, 1),
    list("ListBullet3", "List Bullet 3", ListKind::Bullet, 2),
    list("ListNumber", "List Number", ListKind::Number, 0),
    list("ListNumber2", "List Number 2", ListKind::Number, 1),
    list("ListNumber3", "List Number 3", ListKind::Number, 2),
    table("TableGrid", "Table Grid"),
    table("LightShading", "Light Shading"),
    table("LightList", "Light List"),
    table("LightGrid", "Light Grid"),
    table("MediumShading1", "Medium Shading 1"),
];

pub fn find(name: &str, kind: StyleKind) -> Option<&'static StyleDef> {
    let name = name.trim();
    CATALOG.iter().filter(|s| s.kind == kind).find(|s| {
        s.name.eq_ignore_ascii_case(name) || s.id.eq_ignore_ascii_case(name)
    })
}

/// Style used for a heading of `level` (0 is the document title).
pub fn heading_style(level: i64) -> Option<&'static StyleDef> {
    match level {
        0 => find("Title", StyleKind::Paragraph),
        1..=9 => find(&format!("Heading{level}"), StyleKind::Paragraph),
        _ => None,
    }
}

impl StyleDef {
    pub fn is_default(&self) -> bool {
        self.id == DEFAULT_STYLE
    }

    /// Applies the style (and list numbering, if any) to `paragraph`.
    pub fn apply(&self, paragraph: Paragraph) -> Paragraph {
        if self.is_default() {
            return paragraph;
        }
        let paragraph = paragraph.style(self.id);
        match self.list {
            Some((kind, level)) => {
                paragraph.numbering(NumberingId::new(kind.numbering_id()), IndentLevel::new(level))
            }
            None => paragraph,
        }
    }

    fn to_style(&self) -> Style {
        let style_type = match self.kind {
            StyleKind::Paragraph => StyleType::Paragraph,
            StyleKind::Table => StyleType::Table,
        };
        let mut style = Style::new(self.id, style_type).name(self.name);
        if let Some(points) = self.size_pt {
            style = style.size(super::format::points_to_half_points(points));
        }
        if self.bold {
            style = style.bold();
        }
        if self.italic {
            style = style.italic();
        }
        if let Some(color) = self.color {
            style = style.color(color);
        }
        style
    }
}

/// Adds the catalogue styles and the bullet/decimal numbering definitions.
pub fn register(mut docx: Docx) -> Docx {
    for def in CATALOG.iter().filter(|s| !s.is_default()) {
        docx = docx.add_style(def.to_style());
    }

    let mut bullets = AbstractNumbering::new(BULLET_NUMBERING);
    let mut decimals = AbstractNumbering::new(DECIMAL_NUMBERING);
    for level in 0..3usize {
        let left = 720 * (level as i32 + 1);
        bullets = bullets.add_level(
            Level::new(
                level,
                Start::new(1),
                NumberFormat::new("bullet"),
                LevelText::new(["\u{2022}", "\u{25E6}", "\u{25AA}"][level]),
                LevelJc::new("left"),
            )
            .indent(Some(left), Some(SpecialIndentType::Hanging(360)), None, None),
        );
        decimals = decimals.add_level(
            Level::new(
                level,
                Start::new(1),
                NumberFormat::new(["decimal", "lowerLetter", "lowerRoman"][level]),
                LevelText::new(&format!("%{}.", level + 1)),
                LevelJc::new("left"),
            )
            .indent(Some(left), Some(SpecialIndentType::Hanging(360)), None, None),
        );
    }

    docx.add_abstract_numbering(bullets)
        .add_abstract_numbering(decimals)
        .add_numbering(Numbering::new(BULLET_NUMBERING, BULLET_NUMBERING))
        .add_numbering(Numbering::new(DECIMAL_NUMBERING, DECIMAL_NUMBERING))
}
