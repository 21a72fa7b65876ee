use chrono::NaiveDateTime;
use printpdf::path::{PaintMode, WindingOrder};
use printpdf::{
    BuiltinFont, Color, IndirectFontRef, Line, Mm, PdfDocument, PdfLayerReference, Point,
    Polygon, Rgb,
};
use thiserror::Error;

use crate::models::StudentRecord;
use crate::scoring;

const PAGE_WIDTH: f32 = 210.0;
const PAGE_HEIGHT: f32 = 297.0;
const MARGIN: f32 = 10.0;
const CELL_PADDING: f32 = 1.0;
const LINE_HEIGHT: f32 = 10.0;
const FULL_WIDTH: f32 = 200.0;
const COLUMN_WIDTHS: [f32; 2] = [60.0, 130.0];
const BORDER_WIDTH_PT: f32 = 0.567;

const NAVY: (u8, u8, u8) = (12, 18, 40);
const GOLD: (u8, u8, u8) = (245, 164, 37);
const WHITE: (u8, u8, u8) = (255, 255, 255);
const BLACK: (u8, u8, u8) = (0, 0, 0);

const FACULTY: &str = "John Doe";
const COORDINATOR: &str = "Elia";
const FOOTER_LINES: [&str; 3] = [
    "(92-21) 36630102-3",
    "infoexample@aptechnn.com",
    "SD-1 BLOCK A NORTH NAZIMABAD KARACHI-PAKISTAN",
];

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("field {field} contains {character:?}, which the report font cannot encode")]
    Unencodable { field: &'static str, character: char },

    #[error("failed to assemble PDF: {0}")]
    Pdf(String),
}

/// Renders the one-page appraisal for `record`. `generated_at` drives the
/// month heading; callers pass the local wall clock.
pub fn build_report(
    record: &StudentRecord,
    generated_at: NaiveDateTime,
) -> Result<Vec<u8>, ReportError> {
    ensure_encodable("name", &record.name)?;
    ensure_encodable("student_id", &record.student_id)?;
    ensure_encodable("email", &record.email)?;

    let (doc, page, layer) = PdfDocument::new(
        "Student Appraisal Report",
        Mm(PAGE_WIDTH),
        Mm(PAGE_HEIGHT),
        "Report",
    );
    let fonts = Fonts {
        regular: doc.add_builtin_font(BuiltinFont::Helvetica).map_err(pdf_error)?,
        bold: doc
            .add_builtin_font(BuiltinFont::HelveticaBold)
            .map_err(pdf_error)?,
        italic: doc
            .add_builtin_font(BuiltinFont::HelveticaOblique)
            .map_err(pdf_error)?,
    };
    let mut canvas = Canvas::new(doc.get_page(page).get_layer(layer), fonts);

    canvas.fill_page(NAVY);

    canvas.set_font(Style::Bold, 20.0);
    canvas.set_text_color(GOLD);
    canvas.cell(FULL_WIDTH, "STUDENT APPRAISAL REPORT", false, true, Align::Center);

    canvas.set_font(Style::Regular, 12.0);
    canvas.set_text_color(WHITE);
    canvas.cell(FULL_WIDTH, &month_heading(generated_at), false, true, Align::Center);
    canvas.ln(10.0);

    canvas.set_font(Style::Bold, 18.0);
    canvas.set_text_color(GOLD);
    canvas.cell(FULL_WIDTH, "Student Details:", false, true, Align::Left);
    canvas.ln(5.0);

    canvas.set_font(Style::Bold, 14.0);
    canvas.cell(COLUMN_WIDTHS[0], "Field", true, false, Align::Center);
    canvas.cell(COLUMN_WIDTHS[1], "Details", true, true, Align::Center);

    canvas.set_font(Style::Regular, 12.0);
    canvas.set_text_color(WHITE);
    for (label, value) in detail_rows(record) {
        canvas.cell(COLUMN_WIDTHS[0], label, true, false, Align::Center);
        canvas.cell(COLUMN_WIDTHS[1], &value, true, true, Align::Center);
    }
    canvas.ln(5.0);

    canvas.set_font(Style::BoldUnderline, 12.0);
    canvas.cell(
        FULL_WIDTH,
        &format!("Remarks: {}", record.remarks()),
        false,
        true,
        Align::Left,
    );
    canvas.cell(
        FULL_WIDTH,
        &format!("Confidence: {}%", display_number(record.probability)),
        false,
        true,
        Align::Left,
    );
    canvas.ln(10.0);

    canvas.set_font(Style::Italic, 11.0);
    for line in FOOTER_LINES {
        canvas.cell(FULL_WIDTH, line, false, true, Align::Left);
    }
    drop(canvas);

    doc.save_to_bytes().map_err(pdf_error)
}

/// Percentage shown in the table, recomputed from the stored inputs.
pub fn overall_percentage(record: &StudentRecord) -> f64 {
    scoring::round2(scoring::weighted_percentage(
        record.attendance,
        record.homework_completion,
        record.test_scores,
    ))
}

pub fn detail_rows(record: &StudentRecord) -> Vec<(&'static str, String)> {
    vec![
        ("Student Name", record.name.clone()),
        ("Enrollment", format!("Student {}", record.student_id)),
        ("Email", record.email.clone()),
        ("Attendance", format!("{}%", display_number(record.attendance))),
        (
            "Homework Completion",
            format!("{}%", display_number(record.homework_completion)),
        ),
        ("Test Scores", display_number(record.test_scores)),
        (
            "Overall Percentage",
            format!("{}%", display_number(overall_percentage(record))),
        ),
        ("Faculty", FACULTY.to_string()),
        ("Coordinator", COORDINATOR.to_string()),
    ]
}

pub fn month_heading(generated_at: NaiveDateTime) -> String {
    generated_at
        .format("MONTH OF %B %Y")
        .to_string()
        .to_uppercase()
}

/// Download name, unique per student and second.
pub fn report_filename(student_id: &str, generated_at: NaiveDateTime) -> String {
    let safe_id: String = student_id
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect();

    format!(
        "report_{}_{}.pdf",
        safe_id,
        generated_at.format("%Y%m%d%H%M%S")
    )
}

/// Float display used throughout the report. Whole numbers keep one decimal
/// (80 -> "80.0"), magnitudes from 1e16 up or below 1e-4 switch to a signed
/// two-digit exponent (1e+16, 1.5e-05), everything else uses the shortest
/// round-trip form.
pub fn display_number(value: f64) -> String {
    if value.is_nan() {
        return "nan".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "inf" } else { "-inf" }.to_string();
    }

    let magnitude = value.abs();
    if magnitude >= 1e16 || (magnitude != 0.0 && magnitude < 1e-4) {
        let formatted = format!("{value:e}");
        let (mantissa, exponent) = formatted.split_once('e').unwrap_or((formatted.as_str(), "0"));
        let exponent: i32 = exponent.parse().unwrap_or(0);
        let sign = if exponent < 0 { '-' } else { '+' };
        return format!("{mantissa}e{sign}{:02}", exponent.abs());
    }

    if value.fract() == 0.0 {
        format!("{value:.1}")
    } else {
        value.to_string()
    }
}

fn ensure_encodable(field: &'static str, text: &str) -> Result<(), ReportError> {
    match text.chars().find(|c| !winansi_encodable(*c)) {
        Some(character) => Err(ReportError::Unencodable { field, character }),
        None => Ok(()),
    }
}

fn winansi_encodable(c: char) -> bool {
    const CP1252_EXTRAS: &str = "€‚ƒ„…†‡ˆ‰Š‹ŒŽ‘’“”•–—˜™š›œžŸ";

    matches!(c, ' '..='~' | '\u{A0}'..='\u{FF}') || CP1252_EXTRAS.contains(c)
}

fn pdf_error(err: printpdf::Error) -> ReportError {
    ReportError::Pdf(err.to_string())
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Style {
    Regular,
    Bold,
    BoldUnderline,
    Italic,
}

#[derive(Debug, Clone, Copy)]
enum Align {
    Left,
    Center,
}

struct Fonts {
    regular: IndirectFontRef,
    bold: IndirectFontRef,
    italic: IndirectFontRef,
}

/// Top-down cursor over a single page, measured in millimetres from the
/// upper-left corner the way form layouts are usually described.
struct Canvas {
    layer: PdfLayerReference,
    fonts: Fonts,
    x: f32,
    y: f32,
    style: Style,
    size_pt: f32,
    text_color: (u8, u8, u8),
}

impl Canvas {
    fn new(layer: PdfLayerReference, fonts: Fonts) -> Self {
        layer.set_outline_color(rgb(BLACK));
        layer.set_outline_thickness(BORDER_WIDTH_PT);

        Canvas {
            layer,
            fonts,
            x: MARGIN,
            y: MARGIN,
            style: Style::Regular,
            size_pt: 12.0,
            text_color: BLACK,
        }
    }

    fn set_font(&mut self, style: Style, size_pt: f32) {
        self.style = style;
        self.size_pt = size_pt;
    }

    fn set_text_color(&mut self, color: (u8, u8, u8)) {
        self.text_color = color;
    }

    fn fill_page(&self, color: (u8, u8, u8)) {
        self.fill_rect(0.0, 0.0, PAGE_WIDTH, PAGE_HEIGHT, color);
    }

    fn ln(&mut self, height: f32) {
        self.x = MARGIN;
        self.y += height;
    }

    /// Prints `text` in a `width` x 10mm cell and advances the cursor, either
    /// to the right or to the start of the next line.
    fn cell(&mut self, width: f32, text: &str, border: bool, newline: bool, align: Align) {
        if border {
            self.stroke_rect(self.x, self.y, width, LINE_HEIGHT);
        }

        if !text.is_empty() {
            let font_size_mm = pt_to_mm(self.size_pt);
            let text_width = text_width_mm(text, self.style, self.size_pt);
            let offset = match align {
                Align::Left => CELL_PADDING,
                Align::Center => (width - text_width) / 2.0,
            };
            let text_x = self.x + offset;
            let baseline = self.y + 0.5 * LINE_HEIGHT + 0.3 * font_size_mm;

            self.layer.set_fill_color(rgb(self.text_color));
            self.layer.use_text(
                text,
                self.size_pt,
                Mm(text_x),
                Mm(PAGE_HEIGHT - baseline),
                self.font(),
            );

            if self.style == Style::BoldUnderline {
                let underline_top = baseline + 0.1 * font_size_mm;
                let thickness = 0.05 * font_size_mm;
                self.fill_rect(text_x, underline_top, text_width, thickness, self.text_color);
            }
        }

        if newline {
            self.ln(LINE_HEIGHT);
        } else {
            self.x += width;
        }
    }

    fn font(&self) -> &IndirectFontRef {
        match self.style {
            Style::Regular => &self.fonts.regular,
            Style::Bold | Style::BoldUnderline => &self.fonts.bold,
            Style::Italic => &self.fonts.italic,
        }
    }

    fn fill_rect(&self, x: f32, y: f32, width: f32, height: f32, color: (u8, u8, u8)) {
        self.layer.set_fill_color(rgb(color));
        self.layer.add_polygon(Polygon {
            rings: vec![rect_points(x, y, width, height)],
            mode: PaintMode::Fill,
            winding_order: WindingOrder::NonZero,
        });
    }

    fn stroke_rect(&self, x: f32, y: f32, width: f32, height: f32) {
        self.layer.add_line(Line {
            points: rect_points(x, y, width, height),
            is_closed: true,
        });
    }
}

fn rect_points(x: f32, y: f32, width: f32, height: f32) -> Vec<(Point, bool)> {
    let top = PAGE_HEIGHT - y;
    let bottom = PAGE_HEIGHT - (y + height);

    vec![
        (Point::new(Mm(x), Mm(top)), false),
        (Point::new(Mm(x + width), Mm(top)), false),
        (Point::new(Mm(x + width), Mm(bottom)), false),
        (Point::new(Mm(x), Mm(bottom)), false),
    ]
}

fn rgb((r, g, b): (u8, u8, u8)) -> Color {
    Color::Rgb(Rgb::new(
        f32::from(r) / 255.0,
        f32::from(g) / 255.0,
        f32::from(b) / 255.0,
        None,
    ))
}

fn pt_to_mm(pt: f32) -> f32 {
    pt * 25.4 / 72.0
}

fn text_width_mm(text: &str, style: Style, size_pt: f32) -> f32 {
    let units: u32 = text.chars().map(|c| glyph_width(c, style)).sum();
    pt_to_mm(units as f32 * size_pt / 1000.0)
}

/// Helvetica advance widths in 1/1000 em for printable ASCII. The oblique
/// face shares the regular metrics.
fn glyph_width(c: char, style: Style) -> u32 {
    const REGULAR: [u16; 95] = [
        278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, 556, 556,
        556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556, 1015, 667, 667, 722,
        722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778, 667, 778, 722, 667, 611, 722,
        667, 944, 667, 667, 611, 278, 278, 278, 469, 556, 333, 556, 556, 500, 556, 556, 278, 556,
        556, 222, 222, 500, 222, 833, 556, 556, 556, 556, 333, 500, 278, 556, 500, 722, 500, 500,
        500, 334, 260, 334, 584,
    ];
    const BOLD: [u16; 95] = [
        278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278, 556, 556,
        556, 556, 556, 556, 556, 556, 556, 556, 333, 333, 584, 584, 584, 611, 975, 722, 722, 722,
        722, 667, 611, 778, 722, 278, 556, 722, 611, 833, 722, 778, 667, 778, 722, 667, 611, 722,
        667, 944, 667, 667, 611, 333, 278, 333, 584, 556, 333, 556, 611, 556, 611, 556, 333, 611,
        611, 278, 278, 556, 278, 889, 611, 611, 611, 611, 389, 556, 333, 611, 556, 778, 556, 556,
        500, 389, 280, 389, 584,
    ];

    let table = match style {
        Style::Bold | Style::BoldUnderline => &BOLD,
        Style::Regular | Style::Italic => &REGULAR,
    };

    match c {
        ' '..='~' => u32::from(table[c as usize - 0x20]),
        _ => 556,
    }
}
