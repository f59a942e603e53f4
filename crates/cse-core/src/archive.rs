use std::fs;
use std::io::{self, Cursor, Read, Write};
use std::path::{Path, PathBuf};

use log::{debug, info};
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::error::{EditError, Result};

pub const GAMESTATE_ENTRY: &str = "gamestate";

const MAX_SIZE_HINT: u64 = 64 << 20;

#[derive(Debug, Clone, PartialEq)]
pub struct EntryInfo {
    pub name: String,
    pub compression: CompressionMethod,
    pub size: u64,
    pub compressed_size: u64,
}

/// An uploaded save: the original zip bytes, the name it came in with, and
/// the entry table. The bytes are never modified; edits produce a new archive.
#[derive(Debug, Clone)]
pub struct SaveArchive {
    bytes: Vec<u8>,
    file_name: String,
    entries: Vec<EntryInfo>,
    gamestate: usize,
}

/// True for `gamestate` itself or any entry whose last path component is `gamestate`.
pub fn is_gamestate_name(name: &str) -> bool {
    name.rsplit('/').next() == Some(GAMESTATE_ENTRY)
}

impl SaveArchive {
    pub fn load(bytes: Vec<u8>, file_name: impl Into<String>) -> Result<Self> {
        let entries = {
            let mut zip = ZipArchive::new(Cursor::new(bytes.as_slice()))?;
            let mut entries = Vec::with_capacity(zip.len());
            for i in 0..zip.len() {
                let f = zip.by_index_raw(i)?;
                entries.push(EntryInfo {
                    name: f.name().to_string(),
                    compression: f.compression(),
                    size: f.size(),
                    compressed_size: f.compressed_size(),
                });
            }
            entries
        };
        let gamestate = entries
            .iter()
            .position(|e| is_gamestate_name(&e.name))
            .ok_or_else(|| EditError::EntryNotFound {
                entry: GAMESTATE_ENTRY.to_string(),
            })?;
        let file_name = file_name.into();
        debug!(
            "{}: {} entries, gamestate at {:?} ({} bytes)",
            file_name,
            entries.len(),
            entries[gamestate].name,
            entries[gamestate].size
        );
        Ok(Self {
            bytes,
            file_name,
            entries,
            gamestate,
        })
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn entries(&self) -> &[EntryInfo] {
        &self.entries
    }

    pub fn gamestate_entry(&self) -> &EntryInfo {
        &self.entries[self.gamestate]
    }

    fn open(&self) -> Result<ZipArchive<Cursor<&[u8]>>> {
        Ok(ZipArchive::new(Cursor::new(self.bytes.as_slice()))?)
    }

    /// Decompressed bytes of entry `index`.
    pub fn read_entry(&self, index: usize) -> Result<Vec<u8>> {
        let mut zip = self.open()?;
        let mut file = zip.by_index(index)?;
        // header sizes are untrusted; cap the preallocation
        let mut out = Vec::with_capacity(file.size().min(MAX_SIZE_HINT) as usize);
        file.read_to_end(&mut out)
            .map_err(|e| EditError::archive(format!("reading {}: {e}", self.entries[index].name)))?;
        Ok(out)
    }

    /// The gamestate entry decoded as UTF-8.
    pub fn extract_text(&self) -> Result<String> {
        let raw = self.read_entry(self.gamestate)?;
        String::from_utf8(raw).map_err(|e| {
            EditError::archive(format!(
                "{} is not valid UTF-8 (byte {})",
                self.gamestate_entry().name,
                e.utf8_error().valid_up_to()
            ))
        })
    }

    /// Builds a fresh archive in which `entry` holds `data`. Other entries are
    /// copied raw: same compressed bytes, same method, same headers. The
    /// replaced entry keeps its method (stored or deflated), timestamp and mode.
    pub fn rebuild(&self, entry: &str, data: &[u8]) -> Result<Vec<u8>> {
        let mut src = self.open()?;
        let mut out = ZipWriter::new(Cursor::new(Vec::with_capacity(self.bytes.len())));
        if !src.comment().is_empty() {
            out.set_comment(String::from_utf8_lossy(src.comment()).into_owned());
        }
        let mut replaced = false;
        for i in 0..src.len() {
            let file = src.by_index_raw(i)?;
            if file.name() != entry {
                out.raw_copy_file(file)?;
                continue;
            }
            let method = match file.compression() {
                CompressionMethod::Stored => CompressionMethod::Stored,
                _ => CompressionMethod::Deflated,
            };
            let mut options = FileOptions::default()
                .compression_method(method)
                .last_modified_time(file.last_modified())
                .large_file(data.len() as u64 >= u32::MAX as u64);
            if let Some(mode) = file.unix_mode() {
                options = options.unix_permissions(mode);
            }
            drop(file);
            out.start_file(entry, options)?;
            out.write_all(data)
                .map_err(|e| EditError::archive(format!("writing {entry}: {e}")))?;
            replaced = true;
        }
        if !replaced {
            return Err(EditError::EntryNotFound {
                entry: entry.to_string(),
            });
        }
        let bytes = out.finish()?.into_inner();
        debug!(
            "rebuilt {} with {} entries ({} bytes)",
            self.file_name,
            self.entries.len(),
            bytes.len()
        );
        Ok(bytes)
    }

    /// New archive with the gamestate entry replaced by `text`.
    pub fn with_gamestate(&self, text: &str) -> Result<SaveArchive> {
        let name = self.gamestate_entry().name.clone();
        let bytes = self.rebuild(&name, text.as_bytes())?;
        SaveArchive::load(bytes, self.file_name.clone())
    }
}

/// `empire.sav` -> `empire_edited.sav`
pub fn edited_file_name(name: &str) -> String {
    let path = Path::new(name);
    let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or(name);
    match path.extension().and_then(|s| s.to_str()) {
        Some(ext) => format!("{stem}_edited.{ext}"),
        None => format!("{stem}_edited"),
    }
}

// Copy of a save next to itself before it is overwritten (non-destructive)
pub fn backup_file(path: &Path) -> io::Result<PathBuf> {
    if !path.is_file() {
        return Err(io::Error::new(io::ErrorKind::InvalidInput, "not a file"));
    }
    let parent = path.parent().unwrap_or(Path::new("."));
    let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or("save");
    let ext = path.extension().and_then(|s| s.to_str()).unwrap_or("sav");
    let ts = chrono::Local::now().format("%Y%m%d-%H%M%S");
    let dest = parent.join(format!("{}_{}.{}.bak", stem, ts, ext));
    fs::copy(path, &dest)?;
    info!("backup written to {}", dest.display());
    Ok(dest)
}
