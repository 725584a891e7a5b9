use crate::domain::model::CandidateFile;
use crate::utils::error::{IngestError, Result};
use std::fs;
use std::path::Path;

/// Snapshot of the eligible files in `input_folder`, sorted by path.
///
/// Only regular files with a `.csv` extension (any case) are returned; directories
/// and everything else are left alone. The directory is read exactly once.
pub fn discover_candidates(input_folder: &Path) -> Result<Vec<CandidateFile>> {
    let list_error = |source| IngestError::ListError {
        path: input_folder.to_path_buf(),
        source,
    };

    let mut paths = Vec::new();
    for entry in fs::read_dir(input_folder).map_err(list_error)? {
        let entry = entry.map_err(list_error)?;
        let path = entry.path();
        if path.is_file() {
            paths.push(path);
        }
    }
    paths.sort();

    let candidates: Vec<CandidateFile> = paths
        .iter()
        .filter_map(|p| CandidateFile::from_path(p))
        .collect();

    tracing::debug!(
        "Found {} candidate(s) among {} file(s) in {}",
        candidates.len(),
        paths.len(),
        input_folder.display()
    );

    Ok(candidates)
}
