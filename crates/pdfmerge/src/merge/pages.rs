//! Page tree operations.
//!
//! Pages lifted out of their source tree lose access to attributes they
//! inherited from ancestor `Pages` nodes. [`PageCollector`] copies those
//! attributes onto each page before it is re-parented.

use crate::error::MergeError;
use lopdf::{Document, Object, ObjectId};

/// Page attributes a page may inherit from its ancestors.
pub const INHERITABLE_KEYS: [&[u8]; 4] = [b"Resources", b"MediaBox", b"CropBox", b"Rotate"];

/// Upper bound on `Parent` hops, so a cyclic tree cannot loop forever.
const MAX_TREE_DEPTH: usize = 64;

/// Collects pages from a source document and prepares them for a new tree.
#[derive(Debug, Clone, Default)]
pub struct PageCollector;

impl PageCollector {
    /// Create a new page collector.
    pub fn new() -> Self {
        Self
    }

    /// Page object ids in document order.
    pub fn page_ids(&self, doc: &Document) -> Vec<ObjectId> {
        doc.get_pages().into_values().collect()
    }

    /// Look up `key` on the ancestors of `page_id`, nearest first.
    ///
    /// The page's own dictionary is not consulted.
    pub fn inherited_attribute(
        &self,
        doc: &Document,
        page_id: ObjectId,
        key: &[u8],
    ) -> Option<Object> {
        let mut current = parent_of(doc, page_id);

        for _ in 0..MAX_TREE_DEPTH {
            let node_id = current?;
            let node = doc.get_dictionary(node_id).ok()?;
            if let Ok(value) = node.get(key) {
                return Some(value.clone());
            }
            current = node.get(b"Parent").and_then(Object::as_reference).ok();
        }

        None
    }

    /// Make `page_id` self-contained and attach it to `new_parent`.
    ///
    /// Every inheritable attribute the page doesn't define itself is copied
    /// from its nearest ancestor, then `Parent` is pointed at `new_parent`.
    ///
    /// # Errors
    ///
    /// Returns an error if `page_id` is not a dictionary in `doc`.
    pub fn detach_page(
        &self,
        doc: &mut Document,
        page_id: ObjectId,
        new_parent: ObjectId,
    ) -> Result<(), MergeError> {
        let page = doc.get_dictionary(page_id).map_err(|e| {
            MergeError::write_failed(format!("Page {page_id:?} is not a dictionary: {e}"))
        })?;

        let missing: Vec<(&[u8], Object)> = INHERITABLE_KEYS
            .iter()
            .filter(|key| !page.has(key))
            .filter_map(|&key| {
                self.inherited_attribute(doc, page_id, key)
                    .map(|value| (key, value))
            })
            .collect();

        let page = doc
            .get_object_mut(page_id)
            .and_then(Object::as_dict_mut)
            .map_err(|e| {
                MergeError::write_failed(format!("Page {page_id:?} is not a dictionary: {e}"))
            })?;

        for (key, value) in missing {
            page.set(key.to_vec(), value);
        }
        page.set("Parent", Object::Reference(new_parent));

        Ok(())
    }
}

fn parent_of(doc: &Document, id: ObjectId) -> Option<ObjectId> {
    doc.get_dictionary(id)
        .ok()?
        .get(b"Parent")
        .and_then(Object::as_reference)
        .ok()
}
