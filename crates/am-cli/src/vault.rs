//! Loading a vault directory into documents.

use std::path::Path;

use am_core::Document;
use anyhow::{Context, Result};
use tracing::{debug, trace};
use walkdir::{DirEntry, WalkDir};

/// Every `*.md` file under `root`, sorted by relative path.
///
/// Hidden files and directories are skipped. Document names are relative
/// paths joined with `/` on every platform. Files that are not valid UTF-8
/// are decoded lossily.
pub fn load_vault(root: &Path) -> Result<Vec<Document>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(root)
        .follow_links(false)
        .into_iter()
        .filter_entry(|entry| entry.depth() == 0 || !is_hidden(entry))
    {
        let entry = entry.context(format!("Failed to walk vault: {}", root.display()))?;
        if !entry.file_type().is_file() || !is_markdown(entry.path()) {
            continue;
        }
        let Ok(relative) = entry.path().strip_prefix(root) else {
            continue;
        };
        let name = document_name(relative);
        files.push((name, entry.into_path()));
    }
    files.sort_by(|(left, _), (right, _)| left.cmp(right));

    let mut documents = Vec::with_capacity(files.len());
    for (name, path) in files {
        let bytes = std::fs::read(&path).context(format!("Failed to read: {}", path.display()))?;
        trace!(document = %name, bytes = bytes.len(), "loaded");
        documents.push(Document::new(name, String::from_utf8_lossy(&bytes).into_owned()));
    }
    debug!(root = %root.display(), documents = documents.len(), "vault loaded");
    Ok(documents)
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.file_name().to_string_lossy().starts_with('.')
}

fn is_markdown(path: &Path) -> bool {
    path.extension()
        .and_then(|extension| extension.to_str())
        .is_some_and(|extension| extension.eq_ignore_ascii_case("md"))
}

fn document_name(relative: &Path) -> String {
    relative
        .components()
        .map(|component| component.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
