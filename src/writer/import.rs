//! Re-homing source objects into the output document.

use std::collections::{BTreeMap, HashMap};

use lopdf::{Dictionary, Document, Object, ObjectId};

/// Maps source object ids to their copies in the output.
///
/// One map is shared by every page of a run, so resources that several
/// source pages reference (fonts, shared images) are copied once.
#[derive(Debug, Default)]
pub(crate) struct ObjectImporter {
    ids: HashMap<ObjectId, ObjectId>,
}

impl ObjectImporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of source objects copied so far.
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Copy `objects` into `doc`, skipping ones already imported, and
    /// return `resources` with its references rewritten to output ids.
    ///
    /// References to objects that are neither in `objects` nor imported
    /// earlier become `null`. Captured closures leave out only `/Parent`
    /// back-links, so those are the references this applies to.
    pub fn import(
        &mut self,
        doc: &mut Document,
        resources: &Dictionary,
        objects: BTreeMap<ObjectId, Object>,
    ) -> Dictionary {
        // Allocate every id first so cycles and forward references resolve
        let mut fresh = Vec::new();
        for (source_id, object) in objects {
            if !self.ids.contains_key(&source_id) {
                let target_id = doc.new_object_id();
                self.ids.insert(source_id, target_id);
                fresh.push((target_id, object));
            }
        }

        for (target_id, mut object) in fresh {
            self.rewrite(&mut object);
            doc.objects.insert(target_id, object);
        }

        let mut resources = resources.clone();
        self.rewrite_dictionary(&mut resources);
        resources
    }

    fn rewrite(&self, object: &mut Object) {
        match object {
            Object::Reference(id) => {
                *object = match self.ids.get(id) {
                    Some(target) => Object::Reference(*target),
                    None => Object::Null,
                };
            }
            Object::Array(items) => items.iter_mut().for_each(|item| self.rewrite(item)),
            Object::Dictionary(dict) => self.rewrite_dictionary(dict),
            Object::Stream(stream) => self.rewrite_dictionary(&mut stream.dict),
            _ => {}
        }
    }

    fn rewrite_dictionary(&self, dict: &mut Dictionary) {
        for (_, value) in dict.iter_mut() {
            self.rewrite(value);
        }
    }
}
