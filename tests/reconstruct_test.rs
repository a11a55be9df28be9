//! End-to-end tests: scanned PDF + OCR result files → searchable PDF.

use std::fs;
use std::path::{Path, PathBuf};

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};
use searchable_pdf::{
    make_searchable, Error, PageSource, PdfSource, ReconstructOptions, SearchablePdf,
};

/// A PDF with one page per `(width, height)`, each with a little visible
/// content so the template is not empty.
fn scan_pdf(sizes: &[(f64, f64)]) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let mut kids = Vec::new();
    for (width, height) in sizes {
        let content = Content {
            operations: vec![
                Operation::new("q", vec![]),
                Operation::new("re", vec![5.into(), 5.into(), 40.into(), 20.into()]),
                Operation::new("f", vec![]),
                Operation::new("Q", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![0.into(), 0.into(), Object::Real(*width as f32), Object::Real(*height as f32)],
            "Contents" => content_id,
            "Resources" => dictionary! {},
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

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer).unwrap();
    buffer
}

/// OCR response JSON for one page holding the given words, each as
/// `(text, [x0, y0, x1, y1])`.
fn page_response(page: u32, words: &[(&str, [f32; 4])]) -> serde_json::Value {
    let words: Vec<serde_json::Value> = words
        .iter()
        .map(|(text, [x0, y0, x1, y1])| {
            let symbols: Vec<serde_json::Value> = text
                .chars()
                .map(|c| serde_json::json!({ "text": c.to_string() }))
                .collect();
            serde_json::json!({
                "symbols": symbols,
                "boundingBox": { "normalizedVertices": [
                    { "x": x0, "y": y0 },
                    { "x": x1, "y": y0 },
                    { "x": x1, "y": y1 },
                    { "x": x0, "y": y1 },
                ]},
            })
        })
        .collect();

    serde_json::json!({
        "fullTextAnnotation": {
            "pages": [{ "blocks": [{ "paragraphs": [{ "words": words }] }] }],
            "text": "",
        },
        "context": { "pageNumber": page },
    })
}

fn write_shard(dir: &Path, name: &str, responses: Vec<serde_json::Value>) -> PathBuf {
    let path = dir.join(name);
    let body = serde_json::json!({ "responses": responses });
    fs::write(&path, serde_json::to_vec(&body).unwrap()).unwrap();
    path
}

struct Workspace {
    dir: tempfile::TempDir,
    source: PathBuf,
    ocr: PathBuf,
    output: PathBuf,
}

fn workspace(sizes: &[(f64, f64)]) -> Workspace {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("scan.pdf");
    fs::write(&source, scan_pdf(sizes)).unwrap();
    let ocr = dir.path().join("ocr");
    fs::create_dir(&ocr).unwrap();
    let output = dir.path().join("searchable.pdf");
    Workspace {
        dir,
        source,
        ocr,
        output,
    }
}

fn page_operations(doc: &Document, page: u32) -> Vec<Operation> {
    let pages = doc.get_pages();
    let page_id = pages[&page];
    let content = doc.get_page_content(page_id).unwrap();
    Content::decode(&content).unwrap().operations
}

fn shown_strings(operations: &[Operation]) -> Vec<Vec<u8>> {
    operations
        .iter()
        .filter(|op| op.operator == "Tj")
        .filter_map(|op| match op.operands.first() {
            Some(Object::String(bytes, _)) => Some(bytes.clone()),
            _ => None,
        })
        .collect()
}

#[test]
fn test_round_trip_single_word() {
    let ws = workspace(&[(200.0, 100.0)]);
    write_shard(
        &ws.ocr,
        "output-1-to-1.json",
        vec![page_response(1, &[("Hello", [0.1, 0.2, 0.3, 0.4])])],
    );

    let report = make_searchable(
        &ws.source,
        &[&ws.ocr],
        &ws.output,
        &ReconstructOptions::default(),
    )
    .unwrap();

    assert_eq!(report.pages, 1);
    assert_eq!(report.words, 1);
    assert!(report.is_complete());

    let doc = Document::load(&ws.output).unwrap();
    let ops = page_operations(&doc, 1);
    assert_eq!(shown_strings(&ops), vec![b"Hello".to_vec()]);

    // Invisible rendering and the word's origin in PDF space
    let tr = ops.iter().find(|op| op.operator == "Tr").unwrap();
    assert_eq!(tr.operands[0].as_i64().unwrap(), 3);
    let tm = ops.iter().find(|op| op.operator == "Tm").unwrap();
    assert!((tm.operands[4].as_float().unwrap() - 20.0).abs() < 1e-3);
    assert!((tm.operands[5].as_float().unwrap() - 60.0).abs() < 1e-3);
    let tf = ops.iter().find(|op| op.operator == "Tf").unwrap();
    assert!((tf.operands[1].as_float().unwrap() - 20.0).abs() < 1e-3);
}

#[test]
fn test_output_preserves_page_sizes() {
    let sizes = [(612.0, 792.0), (842.0, 595.0), (300.0, 300.0)];
    let ws = workspace(&sizes);
    write_shard(&ws.ocr, "output-1-to-3.json", vec![]);

    SearchablePdf::new()
        .convert(&ws.source, &[&ws.ocr], &ws.output)
        .unwrap();

    let out = PdfSource::open(&ws.output).unwrap();
    assert_eq!(out.page_count(), 3);
    for (i, size) in sizes.iter().enumerate() {
        let geometry = out.page_geometry(i as u32 + 1).unwrap();
        assert_eq!(geometry.dimensions(), *size);
    }
}

#[test]
fn test_template_drawn_as_form_xobject() {
    let ws = workspace(&[(200.0, 100.0)]);
    write_shard(
        &ws.ocr,
        "output-1-to-1.json",
        vec![page_response(1, &[("scan", [0.0, 0.0, 0.5, 0.5])])],
    );

    make_searchable(&ws.source, &[&ws.ocr], &ws.output, &ReconstructOptions::default()).unwrap();

    let doc = Document::load(&ws.output).unwrap();
    let ops = page_operations(&doc, 1);
    let draw = ops.iter().find(|op| op.operator == "Do").unwrap();
    let name = draw.operands[0].as_name().unwrap().to_vec();

    let page_id = doc.get_pages()[&1];
    let page = doc.get_dictionary(page_id).unwrap();
    let resources = page.get(b"Resources").unwrap().as_dict().unwrap();
    let xobjects = resources.get(b"XObject").unwrap().as_dict().unwrap();
    let form_id = xobjects.get(&name).unwrap().as_reference().unwrap();
    let form = doc.get_object(form_id).unwrap().as_stream().unwrap();

    assert_eq!(form.dict.get(b"Subtype").unwrap().as_name().unwrap(), b"Form");
    let bbox = form.dict.get(b"BBox").unwrap().as_array().unwrap();
    assert!((bbox[2].as_float().unwrap() - 200.0).abs() < 1e-3);
    assert!((bbox[3].as_float().unwrap() - 100.0).abs() < 1e-3);
}

#[test]
fn test_missing_pages_are_reported_not_fatal() {
    let ws = workspace(&[(200.0, 100.0), (200.0, 100.0), (200.0, 100.0)]);
    write_shard(
        &ws.ocr,
        "output-1-to-1.json",
        vec![page_response(1, &[("one", [0.1, 0.1, 0.2, 0.2])])],
    );
    write_shard(
        &ws.ocr,
        "output-3-to-3.json",
        vec![page_response(3, &[("three", [0.1, 0.1, 0.2, 0.2])])],
    );

    let report =
        make_searchable(&ws.source, &[&ws.ocr], &ws.output, &ReconstructOptions::default())
            .unwrap();

    assert_eq!(report.pages, 3);
    assert_eq!(report.missing_pages, vec![2]);
    assert!(!report.is_complete());

    let doc = Document::load(&ws.output).unwrap();
    assert!(shown_strings(&page_operations(&doc, 2)).is_empty());
    assert_eq!(shown_strings(&page_operations(&doc, 3)), vec![b"three".to_vec()]);
}

#[test]
fn test_malformed_word_leaves_no_output() {
    let ws = workspace(&[(200.0, 100.0), (200.0, 100.0)]);
    let mut broken = page_response(2, &[("bad", [0.1, 0.1, 0.2, 0.2])]);
    broken["fullTextAnnotation"]["pages"][0]["blocks"][0]["paragraphs"][0]["words"][0]
        ["boundingBox"]["normalizedVertices"] = serde_json::json!([]);
    write_shard(
        &ws.ocr,
        "output-1-to-2.json",
        vec![page_response(1, &[("ok", [0.1, 0.1, 0.2, 0.2])]), broken],
    );

    let result = make_searchable(&ws.source, &[&ws.ocr], &ws.output, &ReconstructOptions::default());

    assert!(matches!(result, Err(Error::EmptyPolygon { page: 2 })));
    assert!(!ws.output.exists());
    // No temporary files left behind either
    let leftovers: Vec<_> = fs::read_dir(ws.dir.path())
        .unwrap()
        .map(|e| e.unwrap().file_name())
        .filter(|name| name != "scan.pdf" && name != "ocr")
        .collect();
    assert!(leftovers.is_empty(), "unexpected files: {:?}", leftovers);
}

#[test]
fn test_failed_run_keeps_previous_output() {
    let ws = workspace(&[(200.0, 100.0)]);
    fs::write(&ws.output, b"previous").unwrap();
    write_shard(
        &ws.ocr,
        "output-1-to-5.json",
        vec![page_response(5, &[("late", [0.1, 0.1, 0.2, 0.2])])],
    );

    let result = make_searchable(&ws.source, &[&ws.ocr], &ws.output, &ReconstructOptions::default());

    assert!(matches!(
        result,
        Err(Error::PageCountMismatch {
            annotated: 5,
            pages: 1
        })
    ));
    assert_eq!(fs::read(&ws.output).unwrap(), b"previous");
}

#[test]
fn test_lenient_pages_ignores_extra_results() {
    let ws = workspace(&[(200.0, 100.0)]);
    write_shard(
        &ws.ocr,
        "output-1-to-2.json",
        vec![
            page_response(1, &[("kept", [0.1, 0.1, 0.2, 0.2])]),
            page_response(2, &[("dropped", [0.1, 0.1, 0.2, 0.2])]),
        ],
    );

    let options = ReconstructOptions::new().lenient_pages();
    let report = make_searchable(&ws.source, &[&ws.ocr], &ws.output, &options).unwrap();

    assert_eq!(report.pages, 1);
    assert_eq!(report.ignored_pages, vec![2]);
    assert_eq!(report.words, 1);
}

#[test]
fn test_reprocessing_output_is_stable() {
    let ws = workspace(&[(200.0, 100.0), (300.0, 400.0)]);
    write_shard(
        &ws.ocr,
        "output-1-to-2.json",
        vec![
            page_response(1, &[("alpha", [0.1, 0.1, 0.4, 0.2])]),
            page_response(2, &[("beta", [0.5, 0.5, 0.9, 0.6])]),
        ],
    );

    let options = ReconstructOptions::default();
    let first = make_searchable(&ws.source, &[&ws.ocr], &ws.output, &options).unwrap();

    let second_output = ws.dir.path().join("twice.pdf");
    let second = make_searchable(&ws.output, &[&ws.ocr], &second_output, &options).unwrap();

    assert_eq!(first, second);
    let once = PdfSource::open(&ws.output).unwrap();
    let twice = PdfSource::open(&second_output).unwrap();
    for page in 1..=2 {
        assert_eq!(
            once.page_geometry(page).unwrap().dimensions(),
            twice.page_geometry(page).unwrap().dimensions()
        );
    }
}

#[test]
fn test_visible_text_mode() {
    let ws = workspace(&[(200.0, 100.0)]);
    write_shard(
        &ws.ocr,
        "output-1-to-1.json",
        vec![page_response(1, &[("seen", [0.1, 0.1, 0.3, 0.3])])],
    );

    let options = ReconstructOptions::new().visible_text();
    make_searchable(&ws.source, &[&ws.ocr], &ws.output, &options).unwrap();

    let doc = Document::load(&ws.output).unwrap();
    let ops = page_operations(&doc, 1);
    let tr = ops.iter().find(|op| op.operator == "Tr").unwrap();
    assert_eq!(tr.operands[0].as_i64().unwrap(), 0);
}

#[test]
fn test_non_pdf_source_rejected() {
    let ws = workspace(&[(200.0, 100.0)]);
    fs::write(&ws.source, b"GIF89a not a pdf").unwrap();
    write_shard(&ws.ocr, "output-1-to-1.json", vec![]);

    let result = make_searchable(&ws.source, &[&ws.ocr], &ws.output, &ReconstructOptions::default());
    assert!(matches!(result, Err(Error::UnknownFormat)));
    assert!(!ws.output.exists());
}

#[test]
fn test_corrupt_page_content_is_fatal() {
    let ws = workspace(&[(200.0, 100.0)]);
    let mut doc = Document::load_mem(&scan_pdf(&[(200.0, 100.0)])).unwrap();
    let page_id = doc.get_pages()[&1];
    let garbage = doc.add_object(Stream::new(
        dictionary! { "Filter" => "FlateDecode" },
        b"this is not zlib data at all".to_vec(),
    ));
    doc.get_object_mut(page_id)
        .unwrap()
        .as_dict_mut()
        .unwrap()
        .set("Contents", garbage);
    doc.save(&ws.source).unwrap();
    write_shard(
        &ws.ocr,
        "output-1-to-1.json",
        vec![page_response(1, &[("lost", [0.1, 0.1, 0.2, 0.2])])],
    );

    let result = make_searchable(&ws.source, &[&ws.ocr], &ws.output, &ReconstructOptions::default());

    assert!(matches!(result, Err(Error::UnreadablePage { page: 1, .. })));
    assert!(!ws.output.exists());
}

#[test]
fn test_failed_ocr_page_is_reported() {
    let ws = workspace(&[(200.0, 100.0), (200.0, 100.0)]);
    write_shard(
        &ws.ocr,
        "output-1-to-2.json",
        vec![
            serde_json::json!({
                "context": { "pageNumber": 1 },
                "error": { "code": 13, "message": "boom" },
            }),
            page_response(2, &[("fine", [0.1, 0.1, 0.2, 0.2])]),
        ],
    );

    let report =
        make_searchable(&ws.source, &[&ws.ocr], &ws.output, &ReconstructOptions::default())
            .unwrap();

    assert_eq!(report.failed_pages.get(&1).map(String::as_str), Some("boom"));
    assert_eq!(report.words, 1);
    assert!(!report.is_complete());
}

#[test]
fn test_rotated_page_text_follows_display() {
    let ws = workspace(&[(200.0, 100.0)]);
    let mut doc = Document::load(&ws.source).unwrap();
    let page_id = doc.get_pages()[&1];
    doc.get_object_mut(page_id)
        .unwrap()
        .as_dict_mut()
        .unwrap()
        .set("Rotate", 90);
    doc.save(&ws.source).unwrap();
    // Shown upright the page is 100pt wide and 200pt tall
    write_shard(
        &ws.ocr,
        "output-1-to-1.json",
        vec![page_response(1, &[("turn", [0.1, 0.2, 0.3, 0.4])])],
    );

    make_searchable(&ws.source, &[&ws.ocr], &ws.output, &ReconstructOptions::default()).unwrap();

    let out = Document::load(&ws.output).unwrap();
    let ops = page_operations(&out, 1);
    let tm: Vec<f32> = ops
        .iter()
        .find(|op| op.operator == "Tm")
        .unwrap()
        .operands
        .iter()
        .map(|o| o.as_float().unwrap())
        .collect();
    assert_eq!(&tm[..4], &[0.0, 1.0, -1.0, 0.0]);
    assert!((tm[4] - 80.0).abs() < 1e-3);
    assert!((tm[5] - 10.0).abs() < 1e-3);
    let tf = ops.iter().find(|op| op.operator == "Tf").unwrap();
    assert!((tf.operands[1].as_float().unwrap() - 40.0).abs() < 1e-3);
}
