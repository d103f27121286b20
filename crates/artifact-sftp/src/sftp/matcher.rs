// ── Filename matching & local file selection ─────────────────────────────────
//
// A pattern is split on `*` into literal fragments; a name matches when
// every fragment occurs in it, in order and without overlap. There is no
// anchoring and no character classes: `a*c` matches `xaxcx`.

use crate::sftp::error::{SftpError, SftpResult};
use std::path::{Path, PathBuf};

pub const WILDCARD: char = '*';

/// `None` and `"*"` select everything.
pub fn is_match_all(pattern: Option<&str>) -> bool {
    matches!(pattern, None | Some("*"))
}

pub fn matches(pattern: &str, name: &str) -> bool {
    let mut from = 0usize;
    for fragment in pattern.split(WILDCARD).filter(|f| !f.is_empty()) {
        match name[from..].find(fragment) {
            Some(idx) => from += idx + fragment.len(),
            None => return false,
        }
    }
    true
}

/// Regular files in `dir` whose names satisfy `pattern`, sorted by name.
pub fn list_matching(dir: &Path, pattern: Option<&str>) -> SftpResult<Vec<PathBuf>> {
    let read_dir = std::fs::read_dir(dir).map_err(|e| {
        SftpError::path(format!("Cannot list local directory '{}': {}", dir.display(), e))
            .with_path(dir.display().to_string())
    })?;

    let filter = pattern.filter(|_| !is_match_all(pattern));
    let mut files = Vec::new();
    for entry in read_dir {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().to_string();
        if filter.map_or(true, |p| matches(p, &name)) {
            files.push(entry.path());
        }
    }

    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(files)
}
