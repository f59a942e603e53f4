use std::path::{Path, PathBuf};

use walkdir::WalkDir;

pub fn is_save_file(p: &Path) -> bool {
    p.is_file() && p.extension().and_then(|s| s.to_str()) == Some("sav")
}

/// Every `*.sav` under `root`, recursively (save folders nest one per empire).
pub fn find_saves(root: &Path) -> Vec<PathBuf> {
    let mut out: Vec<PathBuf> = WalkDir::new(root)
        .follow_links(false)
        .into_iter()
        .flatten()
        .map(|e| e.into_path())
        .filter(|p| is_save_file(p))
        .collect();
    out.sort();
    out
}
