//! In-memory PDF fixtures for unit tests.

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};

/// Page contents used by [`sample_pdf`]: a filled rectangle and a line of
/// visible Helvetica text.
pub(crate) fn page_operations(label: &str) -> Vec<Operation> {
    vec![
        Operation::new("q", vec![]),
        Operation::new("rg", vec![Object::Real(0.8), Object::Real(0.8), Object::Real(0.8)]),
        Operation::new("re", vec![10.into(), 10.into(), 50.into(), 20.into()]),
        Operation::new("f", vec![]),
        Operation::new("Q", vec![]),
        Operation::new("BT", vec![]),
        Operation::new("Tf", vec!["F1".into(), 12.into()]),
        Operation::new("Td", vec![20.into(), 40.into()]),
        Operation::new("Tj", vec![Object::string_literal(label)]),
        Operation::new("ET", vec![]),
    ]
}

/// Build a PDF whose pages have the given `(width, height)` MediaBoxes.
pub(crate) fn sample_document(sizes: &[(f64, f64)]) -> Document {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });

    let mut kids = Vec::new();
    for (i, (width, height)) in sizes.iter().enumerate() {
        let content = Content {
            operations: page_operations(&format!("page {}", i + 1)),
        };
        let content_id = doc.add_object(Stream::new(
            dictionary! {},
            content.encode().unwrap_or_default(),
        ));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![0.into(), 0.into(), Object::Real(*width as f32), Object::Real(*height as f32)],
            "Contents" => content_id,
            "Resources" => resources_id,
        });
        kids.push(page_id.into());
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc
}

/// Serialized form of [`sample_document`].
pub(crate) fn sample_pdf(sizes: &[(f64, f64)]) -> Vec<u8> {
    let mut doc = sample_document(sizes);
    let mut buffer = Vec::new();
    doc.save_to(&mut buffer).unwrap();
    buffer
}
