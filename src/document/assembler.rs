use std::io::Cursor;
use std::panic::{self, AssertUnwindSafe};

use docx_rs::{
    BreakType, Docx, Paragraph, Pic, Run, Table, TableAlignmentType, TableCell, TableLayoutType,
    TableRow, VAlignType,
};

use super::format::{apply_underline, inches_to_emu};
use super::images::FetchedImages;
use super::layout::Layout;
use super::metadata::{self, CoreProperties};
use super::spec::{
    ContentBlock, DocumentSpec, HeadingBlock, ImageBlock, ListBlock, ParagraphBlock, RunSpec,
    TableBlock, plain_text,
};
use super::styles::{self, DEFAULT_LIST_STYLE, StyleKind};
use super::{AssemblyError, Warning, Warnings};

const DEFAULT_IMAGE_WIDTH: f64 = 3.0;
const DEFAULT_IMAGE_HEIGHT: f64 = 2.0;

/// A finished document model plus the soft failures met while building it.
#[derive(Debug)]
pub struct Assembly {
    pub docx: Docx,
    pub warnings: Vec<Warning>,
    pub core: Option<CoreProperties>,
}

impl Assembly {
    /// Serializes the document, stamping core properties when requested.
    pub fn pack(self) -> Result<Vec<u8>, AssemblyError> {
        let mut buf = Cursor::new(Vec::new());
        self.docx
            .build()
            .pack(&mut buf)
            .map_err(|e| AssemblyError::Serialize(e.to_string()))?;
        let packed = buf.into_inner();

        match &self.core {
            Some(props) => {
                metadata::stamp(&packed, props).map_err(|e| AssemblyError::Serialize(e.to_string()))
            }
            None => Ok(packed),
        }
    }

    pub fn warning_messages(&self) -> Vec<String> {
        self.warnings.iter().map(ToString::to_string).collect()
    }
}

/// Builds the document model for `spec`. `images` holds the pre-fetched
/// bytes for every image block, keyed by block index.
pub fn assemble(spec: &DocumentSpec, images: &FetchedImages) -> Result<Assembly, AssemblyError> {
    let mut warnings = Warnings::default();
    let mut docx = styles::register(Docx::new());

    let core = CoreProperties::from_spec(spec, &mut warnings);
    let layout = Layout::build(&spec.defaults, &spec.sections, &mut warnings);
    docx = layout.apply(docx, spec.odd_and_even_pages_header_footer, &mut warnings);
    let content_width = layout.body().geometry.content_width_twips();

    for (idx, block) in spec.content.iter().enumerate() {
        let at = format!("content[{idx}]");
        docx = match block {
            ContentBlock::Heading(heading) => add_heading(docx, heading)?,
            ContentBlock::Paragraph(paragraph) => add_paragraph(docx, paragraph, &mut warnings, &at),
            ContentBlock::Table(table) => add_table(docx, table, content_width, &mut warnings, &at),
            ContentBlock::Image(image) => add_image(docx, image, images.get(&idx), &mut warnings, &at),
            ContentBlock::List(list) => add_list(docx, list, &mut warnings, &at),
            ContentBlock::PageBreak => {
                docx.add_paragraph(Paragraph::new().add_run(Run::new().add_break(BreakType::Page)))
            }
            ContentBlock::Unsupported => {
                warnings.push(&at, "unsupported block type ignored");
                docx
            }
        };
    }

    log::info!(
        "assembled document with {} blocks and {} warnings",
        spec.content.len(),
        warnings.iter().count()
    );
    Ok(Assembly {
        docx,
        warnings: warnings.into_vec(),
        core,
    })
}

fn text_paragraph(text: &str) -> Paragraph {
    let paragraph = Paragraph::new();
    if text.is_empty() {
        paragraph
    } else {
        paragraph.add_run(Run::new().add_text(text))
    }
}

fn add_heading(docx: Docx, heading: &HeadingBlock) -> Result<Docx, AssemblyError> {
    let level = heading.level.unwrap_or(1);
    let style = styles::heading_style(level).ok_or(AssemblyError::HeadingLevel(level))?;
    Ok(docx.add_paragraph(style.apply(text_paragraph(&heading.text))))
}

fn add_paragraph(docx: Docx, block: &ParagraphBlock, warnings: &mut Warnings, at: &str) -> Docx {
    let mut paragraph = text_paragraph(&block.text);

    if let Some(name) = &block.style {
        match styles::find(name, StyleKind::Paragraph) {
            Some(style) => paragraph = style.apply(paragraph),
            None => warnings.push(at, format!("Style '{name}' not found. Using default style.")),
        }
    }
    if let Some(format) = &block.paragraph_format {
        paragraph = format.apply(paragraph, warnings, at);
    }
    for (i, spec) in block.runs.iter().enumerate() {
        paragraph = paragraph.add_run(build_run(spec, warnings, &format!("{at}.runs[{i}]")));
    }
    docx.add_paragraph(paragraph)
}

/// Font options first, then the run-level flags, which take precedence.
fn build_run(spec: &RunSpec, warnings: &mut Warnings, at: &str) -> Run {
    let mut run = Run::new().add_text(&spec.text);
    if let Some(font) = &spec.font {
        run = font.apply(run, warnings, at);
    }
    if spec.bold == Some(true) {
        run = run.bold();
    }
    if spec.italic == Some(true) {
        run = run.italic();
    }
    if let Some(underline) = &spec.underline {
        run = apply_underline(run, underline, warnings, at);
    }
    run
}

fn add_table(docx: Docx, block: &TableBlock, content_width: i32, warnings: &mut Warnings, at: &str) -> Docx {
    if block.rows == 0 || block.cols == 0 {
        warnings.push(at, format!("table of {}x{} has no cells, skipped", block.rows, block.cols));
        return docx;
    }

    let v_align = block.vertical_alignment.as_deref().map(|name| {
        match name.trim().to_ascii_uppercase().as_str() {
            "TOP" => VAlignType::Top,
            "CENTER" => VAlignType::Center,
            "BOTTOM" => VAlignType::Bottom,
            _ => {
                warnings.push(at, format!("unknown vertical_alignment '{name}', using TOP"));
                VAlignType::Top
            }
        }
    });

    let overflow = block
        .data
        .iter()
        .enumerate()
        .map(|(r, row)| if r < block.rows { row.len().saturating_sub(block.cols) } else { row.len() })
        .sum::<usize>();
    if overflow > 0 {
        warnings.push(
            at,
            format!("{overflow} cell value(s) outside the {}x{} grid skipped", block.rows, block.cols),
        );
    }

    let rows = (0..block.rows)
        .map(|r| {
            let cells = (0..block.cols)
                .map(|c| {
                    let text = block
                        .data
                        .get(r)
                        .and_then(|row| row.get(c))
                        .map(plain_text)
                        .unwrap_or_default();
                    let cell = TableCell::new().add_paragraph(text_paragraph(&text));
                    match &v_align {
                        Some(align) => cell.vertical_align(align.clone()),
                        None => cell,
                    }
                })
                .collect();
            TableRow::new(cells)
        })
        .collect();

    let col_width = (content_width.max(0) as usize) / block.cols;
    let mut table = Table::new(rows).set_grid(vec![col_width; block.cols]);

    if let Some(name) = &block.style {
        match styles::find(name, StyleKind::Table) {
            Some(style) => table = table.style(style.id),
            None => warnings.push(at, format!("Style '{name}' not found. Using default style.")),
        }
    }
    if let Some(name) = &block.alignment {
        let alignment = match name.trim().to_ascii_uppercase().as_str() {
            "LEFT" => TableAlignmentType::Left,
            "CENTER" => TableAlignmentType::Center,
            "RIGHT" => TableAlignmentType::Right,
            _ => {
                warnings.push(at, format!("unknown table alignment '{name}', using LEFT"));
                TableAlignmentType::Left
            }
        };
        table = table.align(alignment);
    }
    if let Some(direction) = &block.table_direction {
        match direction.trim().to_ascii_uppercase().as_str() {
            "LTR" => {}
            "RTL" => warnings.push(at, "table_direction RTL is not supported, using LTR"),
            _ => warnings.push(at, format!("unknown table_direction '{direction}', using LTR")),
        }
    }
    match block.autofit {
        Some(true) => table = table.layout(TableLayoutType::Autofit),
        Some(false) => table = table.layout(TableLayoutType::Fixed),
        None => {}
    }

    docx.add_table(table)
}

fn add_image(
    docx: Docx,
    block: &ImageBlock,
    fetched: Option<&Result<Vec<u8>, String>>,
    warnings: &mut Warnings,
    at: &str,
) -> Docx {
    let bytes = match fetched {
        Some(Ok(bytes)) => bytes,
        Some(Err(reason)) => {
            warnings.push(at, format!("Error adding image: {reason}"));
            return docx;
        }
        None => {
            warnings.push(at, "image block has no url, skipped");
            return docx;
        }
    };

    // The decoder panics on bytes it cannot read.
    let Ok(pic) = panic::catch_unwind(AssertUnwindSafe(|| Pic::new(bytes))) else {
        warnings.push(at, "Error adding image: unrecognised image data");
        return docx;
    };
    let width = inches_to_emu(block.width.unwrap_or(DEFAULT_IMAGE_WIDTH));
    let height = inches_to_emu(block.height.unwrap_or(DEFAULT_IMAGE_HEIGHT));
    docx.add_paragraph(Paragraph::new().add_run(Run::new().add_image(pic.size(width, height))))
}

fn add_list(mut docx: Docx, block: &ListBlock, warnings: &mut Warnings, at: &str) -> Docx {
    let requested = block.numbering_style.as_deref().or(block.style.as_deref());
    let style = match requested {
        Some(name) => styles::find(name, StyleKind::Paragraph).or_else(|| {
            warnings.push(at, format!("Style '{name}' not found. Using {DEFAULT_LIST_STYLE}."));
            None
        }),
        None => None,
    }
    .or_else(|| styles::find(DEFAULT_LIST_STYLE, StyleKind::Paragraph));

    for item in &block.items {
        let paragraph = text_paragraph(&plain_text(item));
        docx = docx.add_paragraph(match style {
            Some(style) => style.apply(paragraph),
            None => paragraph,
        });
    }
    docx
}
