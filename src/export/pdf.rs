//! Line-per-row PDF rendering of the last generated recipe.
//!
//! The layout is intentionally naive: input is split on `\n` and each line
//! becomes one fixed-height text row, with a static bold header repeated on
//! every page. No wrapping, no markdown rendering, no truncation of lines
//! wider than the page. Overflow starts a new page.

use anyhow::Result;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};

// A4 in points.
const PAGE_WIDTH: i64 = 595;
const PAGE_HEIGHT: i64 = 842;

const LEFT_MARGIN: i64 = 28;
const HEADER_Y: i64 = 800;
const BODY_START_Y: i64 = 772;
const BOTTOM_MARGIN: i64 = 43;
const LINE_HEIGHT: i64 = 28;
const FONT_SIZE: i64 = 12;

/// Rows that fit between the header and the bottom margin.
const ROWS_PER_PAGE: usize = (((BODY_START_Y - BOTTOM_MARGIN) / LINE_HEIGHT) + 1) as usize;

/// Render `text` into a complete PDF document with `title` as the page header.
pub fn render_pdf(text: &str, title: &str) -> Result<Vec<u8>> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let body_font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });
    let header_font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica-Bold",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => body_font_id,
            "F2" => header_font_id,
        },
    });

    let lines: Vec<&str> = text.split('\n').collect();
    let mut kids: Vec<Object> = Vec::new();

    for page_lines in lines.chunks(ROWS_PER_PAGE) {
        let content = page_content(title, page_lines);
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode()?));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(page_id.into());
    }

    let page_count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => page_count,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), PAGE_WIDTH.into(), PAGE_HEIGHT.into()],
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut out = Vec::new();
    doc.save_to(&mut out)?;
    Ok(out)
}

fn page_content(title: &str, lines: &[&str]) -> Content {
    let mut operations = vec![
        Operation::new("BT", vec![]),
        Operation::new("Tf", vec!["F2".into(), FONT_SIZE.into()]),
        Operation::new("Td", vec![header_x(title).into(), HEADER_Y.into()]),
        Operation::new("Tj", vec![Object::string_literal(title)]),
        Operation::new("ET", vec![]),
    ];

    let mut y = BODY_START_Y;
    for line in lines {
        operations.extend([
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec!["F1".into(), FONT_SIZE.into()]),
            Operation::new("Td", vec![LEFT_MARGIN.into(), y.into()]),
            Operation::new("Tj", vec![Object::string_literal(*line)]),
            Operation::new("ET", vec![]),
        ]);
        y -= LINE_HEIGHT;
    }

    Content { operations }
}

/// Approximate horizontal centering: average Helvetica-Bold glyph width at
/// 12pt is close to 6.7 points. Good enough for a short static header.
fn header_x(title: &str) -> f32 {
    let width = title.len() as f32 * 6.7;
    let x = (PAGE_WIDTH as f32 - width) / 2.0;
    x.max(LEFT_MARGIN as f32)
}
