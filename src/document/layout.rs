use docx_rs::{
    Docx, Footer, Header, PageMargin, PageOrientationType, PageSize, Paragraph, Run, Section,
};

use super::Warnings;
use super::format::{FontFormat, ParagraphFormat, inches_to_twips};
use super::spec::{HeaderFooterSpec, HeaderFooterText, PageDefaults, SectionSpec};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    Portrait,
    Landscape,
}

/// Page size and margins in inches.
#[derive(Debug, Clone, PartialEq)]
pub struct PageGeometry {
    pub width: f64,
    pub height: f64,
    pub left: f64,
    pub right: f64,
    pub top: f64,
    pub bottom: f64,
    pub gutter: f64,
    pub header_distance: f64,
    pub footer_distance: f64,
    pub orientation: Orientation,
}

impl PageGeometry {
    pub fn from_defaults(defaults: &PageDefaults, warnings: &mut Warnings) -> Self {
        PageGeometry {
            width: defaults.default_page_width.unwrap_or(8.5),
            height: defaults.default_page_height.unwrap_or(11.0),
            left: defaults.default_left_margin.unwrap_or(1.0),
            right: defaults.default_right_margin.unwrap_or(1.0),
            top: defaults.default_top_margin.unwrap_or(1.0),
            bottom: defaults.default_bottom_margin.unwrap_or(1.0),
            gutter: defaults.default_gutter.unwrap_or(0.0),
            header_distance: defaults.default_header_distance.unwrap_or(0.5),
            footer_distance: defaults.default_footer_distance.unwrap_or(0.5),
            orientation: orientation(defaults.default_orientation.as_deref(), Orientation::Portrait, warnings, "document"),
        }
    }

    /// A section's geometry: its own values over the document defaults.
    fn for_section(base: &PageGeometry, section: &SectionSpec, warnings: &mut Warnings, at: &str) -> Self {
        PageGeometry {
            width: section.page_width.unwrap_or(base.width),
            height: section.page_height.unwrap_or(base.height),
            left: section.left_margin.unwrap_or(base.left),
            right: section.right_margin.unwrap_or(base.right),
            top: section.top_margin.unwrap_or(base.top),
            bottom: section.bottom_margin.unwrap_or(base.bottom),
            gutter: section.gutter.unwrap_or(base.gutter),
            header_distance: section.header_distance.unwrap_or(base.header_distance),
            footer_distance: section.footer_distance.unwrap_or(base.footer_distance),
            orientation: orientation(section.orientation.as_deref(), base.orientation, warnings, at),
        }
    }

    /// Width available to body content, in twips.
    pub fn content_width_twips(&self) -> i32 {
        let (width, _) = self.oriented_size();
        inches_to_twips(width - self.left - self.right - self.gutter).max(inches_to_twips(1.0))
    }

    /// Landscape pages are wider than tall whichever way round the size was given.
    fn oriented_size(&self) -> (f64, f64) {
        match self.orientation {
            Orientation::Landscape if self.width < self.height => (self.height, self.width),
            _ => (self.width, self.height),
        }
    }

    /// Oriented page size in twips.
    fn size_twips(&self) -> (u32, u32) {
        let (width, height) = self.oriented_size();
        (
            inches_to_twips(width).max(1) as u32,
            inches_to_twips(height).max(1) as u32,
        )
    }

    fn margin(&self) -> PageMargin {
        PageMargin::new()
            .top(inches_to_twips(self.top))
            .bottom(inches_to_twips(self.bottom))
            .left(inches_to_twips(self.left))
            .right(inches_to_twips(self.right))
            .header(inches_to_twips(self.header_distance))
            .footer(inches_to_twips(self.footer_distance))
            .gutter(inches_to_twips(self.gutter))
    }

    fn orient(&self) -> PageOrientationType {
        match self.orientation {
            Orientation::Portrait => PageOrientationType::Portrait,
            Orientation::Landscape => PageOrientationType::Landscape,
        }
    }
}

fn orientation(name: Option<&str>, fallback: Orientation, warnings: &mut Warnings, at: &str) -> Orientation {
    let Some(name) = name else {
        return fallback;
    };
    match name.trim().to_ascii_uppercase().as_str() {
        "PORTRAIT" => Orientation::Portrait,
        "LANDSCAPE" => Orientation::Landscape,
        _ => {
            warnings.push(at, format!("unknown orientation '{name}', using PORTRAIT"));
            Orientation::Portrait
        }
    }
}

/// One resolved header or footer paragraph.
#[derive(Debug, Clone)]
pub struct Slot {
    pub text: String,
    pub paragraph_format: Option<ParagraphFormat>,
    pub font: Option<FontFormat>,
}

impl Slot {
    fn resolve(text: &HeaderFooterText, shared: &HeaderFooterSpec) -> Slot {
        match text {
            HeaderFooterText::Plain(text) => Slot {
                text: text.clone(),
                paragraph_format: shared.paragraph_format.clone(),
                font: shared.font.clone(),
            },
            HeaderFooterText::Styled {
                text,
                paragraph_format,
                font,
            } => Slot {
                text: text.clone(),
                paragraph_format: paragraph_format.clone().or_else(|| shared.paragraph_format.clone()),
                font: font.clone().or_else(|| shared.font.clone()),
            },
        }
    }

    fn paragraph(&self, warnings: &mut Warnings, at: &str) -> Paragraph {
        let mut run = Run::new().add_text(&self.text);
        if let Some(font) = &self.font {
            run = font.apply(run, warnings, at);
        }
        let paragraph = Paragraph::new().add_run(run);
        match &self.paragraph_format {
            Some(format) => format.apply(paragraph, warnings, at),
            None => paragraph,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Variant {
    Default,
    First,
    Even,
}

impl Variant {
    fn key(self) -> &'static str {
        match self {
            Variant::Default => "default",
            Variant::First => "first",
            Variant::Even => "even",
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Slots {
    pub default: Option<Slot>,
    pub first: Option<Slot>,
    pub even: Option<Slot>,
}

impl Slots {
    fn from_spec(spec: Option<&HeaderFooterSpec>) -> Slots {
        let Some(spec) = spec else {
            return Slots::default();
        };
        let resolve = |text: &Option<HeaderFooterText>| text.as_ref().map(|text| Slot::resolve(text, spec));
        Slots {
            default: resolve(&spec.default),
            first: resolve(&spec.first),
            even: resolve(&spec.even),
        }
    }

    fn iter(&self) -> impl Iterator<Item = (Variant, &Slot)> {
        [
            (Variant::Default, &self.default),
            (Variant::First, &self.first),
            (Variant::Even, &self.even),
        ]
        .into_iter()
        .filter_map(|(variant, slot)| slot.as_ref().map(|slot| (variant, slot)))
    }
}

/// Something a section's page setup and header/footer parts can be hung on:
/// a standalone [`Section`] or the body section owned by the [`Docx`].
trait SectionTarget: Sized {
    fn with_geometry(self, geometry: &PageGeometry) -> Self;
    fn with_header(self, variant: Variant, header: Header) -> Self;
    fn with_footer(self, variant: Variant, footer: Footer) -> Self;
}

impl SectionTarget for Docx {
    fn with_geometry(self, geometry: &PageGeometry) -> Self {
        let (width, height) = geometry.size_twips();
        self.page_size(width, height)
            .page_margin(geometry.margin())
            .page_orient(geometry.orient())
    }

    fn with_header(self, variant: Variant, header: Header) -> Self {
        match variant {
            Variant::Default => self.header(header),
            Variant::First => self.first_header(header),
            Variant::Even => self.even_header(header),
        }
    }

    fn with_footer(self, variant: Variant, footer: Footer) -> Self {
        match variant {
            Variant::Default => self.footer(footer),
            Variant::First => self.first_footer(footer),
            Variant::Even => self.even_footer(footer),
        }
    }
}

impl SectionTarget for Section {
    fn with_geometry(self, geometry: &PageGeometry) -> Self {
        let (width, height) = geometry.size_twips();
        self.page_size(PageSize::new().size(width, height))
            .page_margin(geometry.margin())
            .page_orient(geometry.orient())
    }

    fn with_header(self, variant: Variant, header: Header) -> Self {
        match variant {
            Variant::Default => self.header(header),
            Variant::First => self.first_header(header),
            Variant::Even => self.even_header(header),
        }
    }

    fn with_footer(self, variant: Variant, footer: Footer) -> Self {
        match variant {
            Variant::Default => self.footer(footer),
            Variant::First => self.first_footer(footer),
            Variant::Even => self.even_footer(footer),
        }
    }
}

/// Page setup and header/footer variants of one document section.
#[derive(Debug, Clone)]
pub struct SectionLayout {
    pub geometry: PageGeometry,
    pub headers: Slots,
    pub footers: Slots,
}

impl SectionLayout {
    /// Hangs this section's setup on `target`. `at` prefixes warning locations.
    fn apply_to<T: SectionTarget>(&self, mut target: T, odd_and_even: bool, warnings: &mut Warnings, at: &str) -> T {
        target = target.with_geometry(&self.geometry);

        for (variant, slot) in self.headers.iter() {
            let at = format!("{at}headers.{}", variant.key());
            if variant == Variant::Even && !odd_and_even {
                warnings.push(&at, "even-page variant ignored because oddAndEvenPagesHeaderFooter is off");
                continue;
            }
            target = target.with_header(variant, Header::new().add_paragraph(slot.paragraph(warnings, &at)));
        }
        for (variant, slot) in self.footers.iter() {
            let at = format!("{at}footers.{}", variant.key());
            if variant == Variant::Even && !odd_and_even {
                warnings.push(&at, "even-page variant ignored because oddAndEvenPagesHeaderFooter is off");
                continue;
            }
            target = target.with_footer(variant, Footer::new().add_paragraph(slot.paragraph(warnings, &at)));
        }
        target
    }
}

/// The document's sections in order. Leading sections are emitted as
/// standalone `w:sectPr` breaks ahead of the content; the body section is
/// the last one and holds all content blocks.
#[derive(Debug, Clone)]
pub struct Layout {
    leading: Vec<SectionLayout>,
    body: SectionLayout,
}

impl Layout {
    pub fn build(defaults: &PageDefaults, sections: &[SectionSpec], warnings: &mut Warnings) -> Layout {
        let base = PageGeometry::from_defaults(defaults, warnings);
        let mut resolved: Vec<SectionLayout> = sections
            .iter()
            .enumerate()
            .map(|(idx, section)| SectionLayout {
                geometry: PageGeometry::for_section(&base, section, warnings, &format!("sections[{idx}]")),
                headers: Slots::from_spec(section.headers.as_ref()),
                footers: Slots::from_spec(section.footers.as_ref()),
            })
            .collect();

        let body = resolved.pop().unwrap_or(SectionLayout {
            geometry: base,
            headers: Slots::default(),
            footers: Slots::default(),
        });
        Layout { leading: resolved, body }
    }

    /// The section that holds the content.
    pub fn body(&self) -> &SectionLayout {
        &self.body
    }

    pub fn apply(&self, mut docx: Docx, odd_and_even: bool, warnings: &mut Warnings) -> Docx {
        if odd_and_even {
            docx.settings = docx.settings.even_and_odd_headers();
        }

        if !self.leading.is_empty() {
            log::info!("emitting {} sections", self.leading.len() + 1);
        }
        for (idx, section) in self.leading.iter().enumerate() {
            let at = format!("sections[{idx}].");
            docx = docx.add_section(section.apply_to(Section::new(), odd_and_even, warnings, &at));
        }
        let at = format!("sections[{}].", self.leading.len());
        self.body.apply_to(docx, odd_and_even, warnings, &at)
    }
}
