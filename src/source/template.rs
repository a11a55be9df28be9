//! Captured page templates.

use std::collections::BTreeMap;

use lopdf::{Dictionary, Document, Object, ObjectId};

use crate::error::{Error, Result};
use crate::model::PageGeometry;

/// A self-contained snapshot of one source page's visual content.
///
/// Holds the decoded content stream, the page's resource dictionary and every
/// object reachable from it, keyed by their ids in the source document. The
/// writer re-homes these objects into the output and draws the content as a
/// Form XObject whose bounding box is the source MediaBox.
#[derive(Debug, Clone)]
pub struct PageTemplate {
    /// 1-based source page number
    pub page: u32,

    /// Decoded content stream bytes
    pub content: Vec<u8>,

    /// Resource dictionary; references point into `objects`
    pub resources: Dictionary,

    /// Objects reachable from `resources`, keyed by source object id
    pub objects: BTreeMap<ObjectId, Object>,

    /// Source MediaBox `[llx, lly, urx, ury]`, used as the form BBox
    pub bbox: [f64; 4],
}

impl PageTemplate {
    /// A template with no content and no resources covering `geometry`.
    pub fn blank(page: u32, geometry: &PageGeometry) -> Self {
        Self {
            page,
            content: Vec::new(),
            resources: Dictionary::new(),
            objects: BTreeMap::new(),
            bbox: geometry.media_box(),
        }
    }

    /// Whether the template draws anything.
    pub fn is_blank(&self) -> bool {
        self.content.iter().all(u8::is_ascii_whitespace)
    }
}

/// Dictionary keys that lead back up the page tree rather than into resources.
const SKIPPED_KEYS: &[&[u8]] = &[b"Parent"];

/// Collect every object reachable from `root` in `doc`, keyed by id.
///
/// A reference to an object the document does not contain makes `page`
/// unreadable.
pub(crate) fn collect_closure(
    doc: &Document,
    root: &Object,
    page: u32,
) -> Result<BTreeMap<ObjectId, Object>> {
    let mut objects = BTreeMap::new();
    let mut pending = Vec::new();
    push_references(root, &mut pending);

    while let Some(id) = pending.pop() {
        if objects.contains_key(&id) {
            continue;
        }
        let object = doc.get_object(id).map_err(|e| Error::UnreadablePage {
            page,
            reason: format!("resource object {} {} R: {}", id.0, id.1, e),
        })?;
        push_references(object, &mut pending);
        objects.insert(id, object.clone());
    }

    Ok(objects)
}

fn push_references(object: &Object, pending: &mut Vec<ObjectId>) {
    match object {
        Object::Reference(id) => pending.push(*id),
        Object::Array(items) => {
            for item in items {
                push_references(item, pending);
            }
        }
        Object::Dictionary(dict) => push_dictionary_references(dict, pending),
        Object::Stream(stream) => push_dictionary_references(&stream.dict, pending),
        _ => {}
    }
}

fn push_dictionary_references(dict: &Dictionary, pending: &mut Vec<ObjectId>) {
    for (key, value) in dict.iter() {
        if SKIPPED_KEYS.contains(&key.as_slice()) {
            continue;
        }
        push_references(value, pending);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::{dictionary, Stream};

    #[test]
    fn test_blank_template() {
        let template = PageTemplate::blank(2, &PageGeometry::new(200.0, 100.0));
        assert!(template.is_blank());
        assert_eq!(template.bbox, [0.0, 0.0, 200.0, 100.0]);
        assert_eq!(template.page, 2);
    }

    #[test]
    fn test_closure_follows_nested_references() {
        let mut doc = Document::with_version("1.5");
        let smask_id = doc.add_object(Stream::new(dictionary! {}, vec![0u8; 4]));
        let image_id = doc.add_object(Stream::new(
            dictionary! { "Subtype" => "Image", "SMask" => smask_id },
            vec![0u8; 4],
        ));
        let resources = Object::Dictionary(dictionary! {
            "XObject" => dictionary! { "Im0" => image_id },
        });

        let closure = collect_closure(&doc, &resources, 1).unwrap();
        assert_eq!(closure.len(), 2);
        assert!(closure.contains_key(&image_id));
        assert!(closure.contains_key(&smask_id));
    }

    #[test]
    fn test_closure_handles_cycles_and_parents() {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let a_id = doc.new_object_id();
        let b_id = doc.new_object_id();
        doc.objects
            .insert(a_id, Object::Dictionary(dictionary! { "Next" => b_id }));
        doc.objects.insert(
            b_id,
            Object::Dictionary(dictionary! { "Next" => a_id, "Parent" => pages_id }),
        );
        doc.objects
            .insert(pages_id, Object::Dictionary(dictionary! { "Type" => "Pages" }));

        let closure = collect_closure(&doc, &Object::Reference(a_id), 1).unwrap();
        assert_eq!(closure.len(), 2);
        assert!(!closure.contains_key(&pages_id));
    }

    #[test]
    fn test_closure_rejects_dangling_reference() {
        let mut doc = Document::with_version("1.5");
        let font_id = doc.add_object(dictionary! { "Type" => "Font" });
        let resources = Object::Dictionary(dictionary! {
            "Font" => dictionary! { "F0" => font_id, "F1" => Object::Reference((99, 0)) },
        });

        match collect_closure(&doc, &resources, 4) {
            Err(Error::UnreadablePage { page, reason }) => {
                assert_eq!(page, 4);
                assert!(reason.contains("99 0 R"));
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }
}
