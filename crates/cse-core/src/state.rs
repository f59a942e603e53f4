// Holder for the save currently being edited.
//
// One `Mutex` serializes loads and patches. Each mutation builds the complete
// replacement (text, archive bytes, summary) from the held value and swaps it
// in only on success, so a failed upload or patch leaves the old save intact.

use std::sync::{Mutex, MutexGuard, PoisonError};

use log::info;

use crate::archive::SaveArchive;
use crate::edit::{self, FieldPatch};
use crate::error::{EditError, Result};
use crate::model::{SaveSummary, planet_size_path};
use crate::path::FieldPath;
use crate::script::ParsedDocument;

#[derive(Debug, Clone)]
pub struct LoadedSave {
    archive: SaveArchive,
    text: String,
    summary: SaveSummary,
}

impl LoadedSave {
    pub fn from_bytes(bytes: Vec<u8>, file_name: impl Into<String>) -> Result<Self> {
        let archive = SaveArchive::load(bytes, file_name)?;
        let doc = ParsedDocument::parse(archive.extract_text()?)?;
        let summary = doc.as_save_summary();
        Ok(Self {
            archive,
            text: doc.into_text(),
            summary,
        })
    }

    pub fn archive(&self) -> &SaveArchive {
        &self.archive
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn summary(&self) -> &SaveSummary {
        &self.summary
    }

    /// Fresh parse of the current text. Not cached: spans die with the next edit.
    pub fn document(&self) -> Result<ParsedDocument> {
        ParsedDocument::parse(self.text.clone())
    }

    /// The save with its gamestate replaced by `text`. `text` must still parse.
    pub fn with_text(&self, text: String) -> Result<Self> {
        let doc = ParsedDocument::parse(text)?;
        let summary = doc.as_save_summary();
        let text = doc.into_text();
        let archive = self.archive.with_gamestate(&text)?;
        Ok(Self {
            archive,
            text,
            summary,
        })
    }
}

#[derive(Debug, Default)]
pub struct SaveStore {
    current: Mutex<Option<LoadedSave>>,
}

impl SaveStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Option<LoadedSave>> {
        self.current.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Replaces the held save with `bytes`. Validation happens before the lock
    /// is taken; on error the previous save is still held.
    pub fn load(&self, bytes: Vec<u8>, file_name: &str) -> Result<SaveSummary> {
        let size = bytes.len();
        let loaded = LoadedSave::from_bytes(bytes, file_name)?;
        let summary = loaded.summary.clone();
        *self.lock() = Some(loaded);
        info!(
            "loaded {file_name} ({size} bytes, {} planets)",
            summary.planets.len()
        );
        Ok(summary)
    }

    pub fn has_save(&self) -> bool {
        self.lock().is_some()
    }

    pub fn summary(&self) -> Option<SaveSummary> {
        self.lock().as_ref().map(|s| s.summary.clone())
    }

    /// Snapshot of the held save. Later mutations do not affect it.
    pub fn snapshot(&self) -> Option<LoadedSave> {
        self.lock().clone()
    }

    pub fn get_field(&self, path: &FieldPath) -> Result<String> {
        let guard = self.lock();
        let save = guard.as_ref().ok_or(EditError::NoState)?;
        edit::get_field(&save.document()?, path)
    }

    fn modify<F>(&self, f: F) -> Result<()>
    where
        F: FnOnce(&ParsedDocument) -> Result<String>,
    {
        let mut guard = self.lock();
        let save = guard.as_ref().ok_or(EditError::NoState)?;
        let next = save.with_text(f(&save.document()?)?)?;
        *guard = Some(next);
        Ok(())
    }

    /// Typed single-field edit: `value` must fit the kind already stored.
    pub fn apply_field_patch(&self, path: &FieldPath, value: &str) -> Result<()> {
        self.modify(|doc| edit::apply_typed_patch(doc, path, value))?;
        info!("patched {path} = {value}");
        Ok(())
    }

    /// Writes `literal` verbatim, without type checks.
    pub fn apply_raw_field_patch(&self, path: &FieldPath, literal: &str) -> Result<()> {
        self.modify(|doc| edit::apply_field_patch(doc, path, literal))?;
        info!("patched {path} = {literal} (raw)");
        Ok(())
    }

    /// All patches land or none do.
    pub fn apply_field_patches(&self, patches: &[FieldPatch]) -> Result<()> {
        self.modify(|doc| edit::apply_typed_patches(doc, patches))?;
        info!("applied {} patches", patches.len());
        Ok(())
    }

    pub fn set_planet_size(&self, planet_id: &str, size: i64) -> Result<()> {
        self.modify(|doc| {
            let path = planet_size_path(doc, planet_id).ok_or_else(|| EditError::PathNotFound {
                prefix: format!("planets.{planet_id}.planet_size"),
            })?;
            edit::apply_typed_patch(doc, &path, &size.to_string())
        })?;
        info!("planet {planet_id} size set to {size}");
        Ok(())
    }

    /// Independent copy of the archive bytes plus the original file name.
    pub fn export(&self) -> Result<(Vec<u8>, String)> {
        let guard = self.lock();
        let save = guard.as_ref().ok_or(EditError::NoState)?;
        info!(
            "exporting {} ({} bytes)",
            save.archive.file_name(),
            save.archive.bytes().len()
        );
        Ok((
            save.archive.bytes().to_vec(),
            save.archive.file_name().to_string(),
        ))
    }
}
