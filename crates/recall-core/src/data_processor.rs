//! Knowledge-base loading.
//!
//! Two sources are supported: a JSON array of `{id, text, tags}` records and a
//! directory tree of `.txt` files (one document per file, tags taken from the
//! relative parent directories).
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::types::Document;

#[derive(Default)]
pub struct DataProcessor;

impl DataProcessor {
    pub fn new() -> Self { Self }

    /// Load a path, picking the loader from its shape: a directory is walked for
    /// `.txt` files, anything else is parsed as a JSON knowledge file.
    pub fn load(&self, path: &Path) -> Result<Vec<Document>> {
        if path.is_dir() { self.load_text_directory(path) } else { self.load_knowledge_file(path) }
    }

    /// Parse a JSON array of documents. Repeated ids follow upsert semantics:
    /// the last record wins but keeps the position of the first.
    pub fn load_knowledge_file(&self, path: &Path) -> Result<Vec<Document>> {
        let raw = self.read_file_content(path)?;
        let records: Vec<Document> = serde_json::from_str(&raw)
            .map_err(|source| Error::KnowledgeBase { path: path.to_path_buf(), source })?;
        let total = records.len();
        let docs = dedup_keep_first_position(records);
        if docs.len() < total {
            debug!(duplicates = total - docs.len(), "collapsed repeated document ids");
        }
        info!(path = %path.display(), documents = docs.len(), "loaded knowledge file");
        Ok(docs)
    }

    pub fn load_text_directory(&self, data_dir: &Path) -> Result<Vec<Document>> {
        if !data_dir.is_dir() {
            return Err(Error::NotFound(format!("directory {}", data_dir.display())));
        }
        let files = self.list_txt_files(data_dir);
        let mut records = Vec::with_capacity(files.len());
        for file_path in &files {
            let text = self.read_file_content(file_path)?;
            let text = text.trim();
            if text.is_empty() {
                debug!(path = %file_path.display(), "skipping empty file");
                continue;
            }
            records.push(Document::new(self.extract_doc_id(file_path), text, self.tags_from_path(file_path, data_dir)));
        }
        let docs = dedup_keep_first_position(records);
        info!(dir = %data_dir.display(), files = files.len(), documents = docs.len(), "loaded text directory");
        Ok(docs)
    }

    fn read_file_content(&self, file_path: &Path) -> Result<String> {
        match fs::read_to_string(file_path) {
            Ok(content) => Ok(content),
            Err(e) if e.kind() == std::io::ErrorKind::InvalidData => {
                Ok(String::from_utf8_lossy(&fs::read(file_path)?).to_string())
            }
            Err(e) => Err(e.into()),
        }
    }

    fn extract_doc_id(&self, file_path: &Path) -> String {
        file_path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| file_path.to_string_lossy().to_string())
    }

    fn tags_from_path(&self, file_path: &Path, data_dir: &Path) -> Vec<String> {
        let relative_path = file_path.strip_prefix(data_dir).unwrap_or(file_path);
        relative_path
            .parent()
            .map(|parent| parent.components().map(|c| c.as_os_str().to_string_lossy().to_string()).collect())
            .unwrap_or_default()
    }

    fn list_txt_files(&self, root: &Path) -> Vec<PathBuf> {
        let mut txt_files = Vec::new();
        for entry in walkdir::WalkDir::new(root).into_iter().filter_map(|e| e.ok()).filter(|e| e.file_type().is_file()) {
            let path = entry.path();
            if path.extension().and_then(|s| s.to_str()) == Some("txt") { txt_files.push(path.to_path_buf()); }
        }
        txt_files.sort();
        txt_files
    }
}

fn dedup_keep_first_position(records: Vec<Document>) -> Vec<Document> {
    let mut positions: HashMap<String, usize> = HashMap::new();
    let mut docs: Vec<Document> = Vec::with_capacity(records.len());
    for doc in records {
        match positions.get(&doc.id) {
            Some(&pos) => docs[pos] = doc,
            None => {
                positions.insert(doc.id.clone(), docs.len());
                docs.push(doc);
            }
        }
    }
    docs
}
