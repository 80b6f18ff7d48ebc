//! Paragraph and font options.
//!
//! Each recognised option is a named field; anything else lands in
//! `unknown` and is reported rather than guessed at. Enumerated options take
//! the upper-case names plugin clients already use (`CENTER`, `AT_LEAST`,
//! `DOTS`, ...).

use std::collections::BTreeMap;

use docx_rs::{
    AlignmentType, LineSpacing, LineSpacingType, Paragraph, Run, RunFonts, SpecialIndentType, Tab,
    TabLeaderType, TabValueType,
};
use serde::Deserialize;
use serde_json::Value;

use super::Warnings;

pub const TWIPS_PER_INCH: f64 = 1440.0;
pub const TWIPS_PER_POINT: f64 = 20.0;
pub const EMU_PER_INCH: f64 = 914_400.0;

/// Single line spacing in 240ths of a line.
const LINE: f64 = 240.0;

pub fn inches_to_twips(inches: f64) -> i32 {
    (inches * TWIPS_PER_INCH).round() as i32
}

pub fn points_to_twips(points: f64) -> u32 {
    (points * TWIPS_PER_POINT).round().max(0.0) as u32
}

pub fn points_to_half_points(points: f64) -> usize {
    (points * 2.0).round().max(0.0) as usize
}

pub fn inches_to_emu(inches: f64) -> u32 {
    (inches * EMU_PER_INCH).round().max(0.0) as u32
}

#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct ParagraphFormat {
    pub alignment: Option<String>,
    pub line_spacing: Option<f64>,
    pub line_spacing_rule: Option<String>,
    pub first_line_indent: Option<f64>,
    pub left_indent: Option<f64>,
    pub right_indent: Option<f64>,
    pub space_before: Option<f64>,
    pub space_after: Option<f64>,
    pub keep_together: Option<bool>,
    pub keep_with_next: Option<bool>,
    pub page_break_before: Option<bool>,
    pub widow_control: Option<bool>,
    pub tab_stops: Vec<TabStop>,
    #[serde(flatten)]
    pub unknown: BTreeMap<String, Value>,
}

#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct TabStop {
    pub position: f64,
    pub alignment: Option<String>,
    pub leader: Option<String>,
}

#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct FontFormat {
    pub name: Option<String>,
    pub size: Option<f64>,
    pub color: Option<Value>,
    pub bold: Option<bool>,
    pub italic: Option<bool>,
    pub underline: Option<Underline>,
    pub strike: Option<bool>,
    pub hidden: Option<bool>,
    pub highlight_color: Option<String>,
    #[serde(flatten)]
    pub unknown: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Underline {
    Flag(bool),
    Named(String),
}

impl ParagraphFormat {
    pub fn apply(&self, mut paragraph: Paragraph, warnings: &mut Warnings, at: &str) -> Paragraph {
        if let Some(name) = &self.alignment {
            let alignment = alignment_type(name).unwrap_or_else(|| {
                warnings.push(at, format!("unknown alignment '{name}', using LEFT"));
                AlignmentType::Left
            });
            paragraph = paragraph.align(alignment);
        }

        if self.left_indent.is_some() || self.right_indent.is_some() || self.first_line_indent.is_some() {
            let special = self.first_line_indent.map(|inches| {
                let twips = inches_to_twips(inches);
                if twips < 0 {
                    SpecialIndentType::Hanging(-twips)
                } else {
                    SpecialIndentType::FirstLine(twips)
                }
            });
            paragraph = paragraph.indent(
                self.left_indent.map(inches_to_twips),
                special,
                self.right_indent.map(inches_to_twips),
                None,
            );
        }

        let line = self.resolve_line_spacing(warnings, at);
        if line.is_some() || self.space_before.is_some() || self.space_after.is_some() {
            let mut spacing = LineSpacing::new();
            if let Some(points) = self.space_before {
                spacing = spacing.before(points_to_twips(points));
            }
            if let Some(points) = self.space_after {
                spacing = spacing.after(points_to_twips(points));
            }
            if let Some((value, rule)) = line {
                spacing = spacing.line(value).line_rule(rule);
            }
            paragraph = paragraph.line_spacing(spacing);
        }

        if let Some(v) = self.keep_together {
            paragraph = paragraph.keep_lines(v);
        }
        if let Some(v) = self.keep_with_next {
            paragraph = paragraph.keep_next(v);
        }
        if let Some(v) = self.page_break_before {
            paragraph = paragraph.page_break_before(v);
        }
        if let Some(v) = self.widow_control {
            paragraph = paragraph.widow_control(v);
        }

        for stop in &self.tab_stops {
            paragraph = paragraph.add_tab(stop.to_tab(warnings, at));
        }

        for key in self.unknown.keys() {
            warnings.push(at, format!("unsupported paragraph format option '{key}' ignored"));
        }
        paragraph
    }

    /// `(line, rule)` for `w:spacing`, where `line` is in 240ths of a line for
    /// the auto rule and in twips otherwise.
    fn resolve_line_spacing(&self, warnings: &mut Warnings, at: &str) -> Option<(i32, LineSpacingType)> {
        let multiple = |lines: f64| ((lines * LINE).round() as i32, LineSpacingType::Auto);
        let Some(rule) = &self.line_spacing_rule else {
            return self.line_spacing.map(multiple);
        };

        match rule.trim().to_ascii_uppercase().as_str() {
            "SINGLE" => Some(multiple(1.0)),
            "ONE_POINT_FIVE" => Some(multiple(1.5)),
            "DOUBLE" => Some(multiple(2.0)),
            "MULTIPLE" => Some(multiple(self.line_spacing.unwrap_or(1.0))),
            "AT_LEAST" | "EXACTLY" => {
                let Some(points) = self.line_spacing else {
                    warnings.push(at, format!("line_spacing_rule {rule} needs a line_spacing value in points"));
                    return None;
                };
                let kind = if rule.eq_ignore_ascii_case("EXACTLY") {
                    LineSpacingType::Exact
                } else {
                    LineSpacingType::AtLeast
                };
                Some((points_to_twips(points) as i32, kind))
            }
            _ => {
                warnings.push(at, format!("unknown line_spacing_rule '{rule}', using SINGLE"));
                Some(multiple(1.0))
            }
        }
    }
}

impl TabStop {
    fn to_tab(&self, warnings: &mut Warnings, at: &str) -> Tab {
        let alignment = match &self.alignment {
            Some(name) => tab_alignment(name).unwrap_or_else(|| {
                warnings.push(at, format!("unknown tab alignment '{name}', using LEFT"));
                TabValueType::Left
            }),
            None => TabValueType::Left,
        };
        let leader = match &self.leader {
            Some(name) => tab_leader(name).unwrap_or_else(|| {
                warnings.push(at, format!("unknown tab leader '{name}', using SPACES"));
                TabLeaderType::None
            }),
            None => TabLeaderType::None,
        };
        Tab::new()
            .val(alignment)
            .leader(leader)
            .pos(inches_to_twips(self.position).max(0) as usize)
    }
}

impl FontFormat {
    pub fn apply(&self, mut run: Run, warnings: &mut Warnings, at: &str) -> Run {
        if let Some(name) = &self.name {
            run = run.fonts(RunFonts::new().ascii(name).hi_ansi(name).east_asia(name).cs(name));
        }
        if let Some(points) = self.size {
            run = run.size(points_to_half_points(points));
        }
        if let Some(color) = &self.color {
            match parse_color(color) {
                Some(hex) => run = run.color(&hex),
                None => warnings.push(at, format!("Invalid color format: {color}. Skipping.")),
            }
        }
        if self.bold == Some(true) {
            run = run.bold();
        }
        if self.italic == Some(true) {
            run = run.italic();
        }
        if let Some(underline) = &self.underline {
            run = apply_underline(run, underline, warnings, at);
        }
        if self.strike == Some(true) {
            run = run.strike();
        }
        if self.hidden == Some(true) {
            run = run.vanish();
        }
        if let Some(name) = &self.highlight_color {
            match highlight(name) {
                Some(value) => run = run.highlight(value),
                None => warnings.push(at, format!("unknown highlight color '{name}' ignored")),
            }
        }
        for key in self.unknown.keys() {
            warnings.push(at, format!("unsupported font option '{key}' ignored"));
        }
        run
    }
}

pub fn apply_underline(run: Run, underline: &Underline, warnings: &mut Warnings, at: &str) -> Run {
    match underline {
        Underline::Flag(true) => run.underline("single"),
        Underline::Flag(false) => run,
        Underline::Named(name) => match underline_value(name) {
            Some("none") => run,
            Some(value) => run.underline(value),
            None => {
                warnings.push(at, format!("unknown underline '{name}' ignored"));
                run
            }
        },
    }
}

/// `#RRGGBB` to the bare upper-case hex `w:color` expects.
pub fn parse_color(value: &Value) -> Option<String> {
    let hex = value.as_str()?.trim().strip_prefix('#')?;
    if hex.len() == 6 && hex.chars().all(|c| c.is_ascii_hexdigit()) {
        Some(hex.to_ascii_uppercase())
    } else {
        None
    }
}

pub fn alignment_type(name: &str) -> Option<AlignmentType> {
    let alignment = match name.trim().to_ascii_uppercase().as_str() {
        "LEFT" => AlignmentType::Left,
        "CENTER" => AlignmentType::Center,
        "RIGHT" => AlignmentType::Right,
        "JUSTIFY" | "JUSTIFY_LOW" | "JUSTIFY_MED" | "JUSTIFY_HI" | "THAI_JUSTIFY" => AlignmentType::Both,
        "DISTRIBUTE" => AlignmentType::Distribute,
        _ => return None,
    };
    Some(alignment)
}

fn tab_alignment(name: &str) -> Option<TabValueType> {
    let value = match name.trim().to_ascii_uppercase().as_str() {
        "LEFT" => TabValueType::Left,
        "CENTER" => TabValueType::Center,
        "RIGHT" => TabValueType::Right,
        "DECIMAL" => TabValueType::Decimal,
        "BAR" => TabValueType::Bar,
        "CLEAR" => TabValueType::Clear,
        _ => return None,
    };
    Some(value)
}

fn tab_leader(name: &str) -> Option<TabLeaderType> {
    let leader = match name.trim().to_ascii_uppercase().as_str() {
        "SPACES" => TabLeaderType::None,
        "DOTS" => TabLeaderType::Dot,
        "DASHES" => TabLeaderType::Hyphen,
        "LINES" => TabLeaderType::Underscore,
        "HEAVY" => TabLeaderType::Heavy,
        "MIDDLE_DOT" => TabLeaderType::MiddleDot,
        _ => return None,
    };
    Some(leader)
}

fn underline_value(name: &str) -> Option<&'static str> {
    let value = match name.trim().to_ascii_uppercase().as_str() {
        "NONE" => "none",
        "SINGLE" => "single",
        "WORDS" => "words",
        "DOUBLE" => "double",
        "DOTTED" => "dotted",
        "THICK" => "thick",
        "DASH" => "dash",
        "DOT_DASH" => "dotDash",
        "DOT_DOT_DASH" => "dotDotDash",
        "WAVY" => "wave",
        "DOTTED_HEAVY" => "dottedHeavy",
        "DASH_HEAVY" => "dashedHeavy",
        "DOT_DASH_HEAVY" => "dashDotHeavy",
        "DOT_DOT_DASH_HEAVY" => "dashDotDotHeavy",
        "WAVY_HEAVY" => "wavyHeavy",
        "DASH_LONG" => "dashLong",
        "WAVY_DOUBLE" => "wavyDouble",
        "DASH_LONG_HEAVY" => "dashLongHeavy",
        _ => return None,
    };
    Some(value)
}

fn highlight(name: &str) -> Option<&'static str> {
    let value = match name.trim().to_ascii_uppercase().as_str() {
        "YELLOW" => "yellow",
        "BRIGHT_GREEN" => "green",
        "TURQUOISE" => "cyan",
        "PINK" => "magenta",
        "BLUE" => "blue",
        "RED" => "red",
        "DARK_BLUE" => "darkBlue",
        "TEAL" => "darkCyan",
        "GREEN" => "darkGreen",
        "VIOLET" => "darkMagenta",
        "DARK_RED" => "darkRed",
        "DARK_YELLOW" => "darkYellow",
        "GRAY_50" => "darkGray",
        "GRAY_25" => "lightGray",
        "BLACK" => "black",
        "WHITE" => "white",
        _ => return None,
    };
    Some(value)
}
