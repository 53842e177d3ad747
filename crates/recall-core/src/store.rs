//! Authoritative in-memory document collection.
//!
//! Documents keep the position of their first insertion; replacing a document
//! rewrites it in place. That order is the iteration order every downstream
//! stage relies on for tie-breaking.

use std::collections::HashMap;

use crate::types::{Document, DocumentId};

#[derive(Debug, Default, Clone)]
pub struct DocumentStore {
    docs: Vec<Document>,
    positions: HashMap<DocumentId, usize>,
    version: u64,
}

impl DocumentStore {
    pub fn new() -> Self { Self::default() }

    /// Insert or replace a document. Returns `true` if the id was not present.
    pub fn upsert(&mut self, id: impl Into<DocumentId>, text: impl Into<String>, tags: Vec<String>) -> bool {
        let doc = Document::new(id, text, tags);
        self.version += 1;
        match self.positions.get(&doc.id) {
            Some(&pos) => {
                self.docs[pos] = doc;
                false
            }
            None => {
                self.positions.insert(doc.id.clone(), self.docs.len());
                self.docs.push(doc);
                true
            }
        }
    }

    pub fn get(&self, id: &str) -> Option<&Document> {
        self.positions.get(id).map(|&pos| &self.docs[pos])
    }

    pub fn get_all(&self) -> &[Document] { &self.docs }

    pub fn len(&self) -> usize { self.docs.len() }

    pub fn is_empty(&self) -> bool { self.docs.is_empty() }

    pub fn clear(&mut self) {
        self.docs.clear();
        self.positions.clear();
        self.version += 1;
    }

    /// Monotonic counter bumped by every mutation.
    pub fn version(&self) -> u64 { self.version }
}
