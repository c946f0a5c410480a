//! Candidate discovery and input validation.

use crate::error::PipelineError;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tracing::debug;

/// True when `path` names a file with a `.pdf` extension (any case).
fn is_pdf_file(path: &Path) -> bool {
    path.is_file()
        && path
            .extension()
            .map(|ext| ext.eq_ignore_ascii_case("pdf"))
            .unwrap_or(false)
}

/// Validate an explicitly supplied document path and return it in
/// absolute form.
pub fn validate_input(path: &Path) -> Result<PathBuf, PipelineError> {
    if !is_pdf_file(path) {
        return Err(PipelineError::InvalidInput {
            path: path.to_path_buf(),
        });
    }
    std::fs::canonicalize(path).map_err(|_| PipelineError::InvalidInput {
        path: path.to_path_buf(),
    })
}

/// List PDF file names in `dir`, sorted lexicographically and de-duplicated
/// by name. Non-PDF entries and subdirectories are ignored.
pub fn find_pdf_candidates(dir: &Path) -> Result<Vec<String>, PipelineError> {
    let entries = std::fs::read_dir(dir).map_err(|source| PipelineError::DiscoveryFailed {
        dir: dir.to_path_buf(),
        source,
    })?;

    // BTreeSet gives the sorted, deduplicated order in one pass.
    let mut names = BTreeSet::new();
    for entry in entries.flatten() {
        let path = entry.path();
        if is_pdf_file(&path) {
            if let Some(name) = path.file_name() {
                names.insert(name.to_string_lossy().to_string());
            }
        }
    }

    let candidates: Vec<String> = names.into_iter().collect();
    debug!(dir = %dir.display(), count = candidates.len(), "discovered PDF candidates");
    Ok(candidates)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn candidates_are_sorted_and_filtered() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("zebra.pdf"), "x").unwrap();
        fs::write(tmp.path().join("alpha.pdf"), "x").unwrap();
        fs::write(tmp.path().join("UPPER.PDF"), "x").unwrap();
        fs::write(tmp.path().join("notes.txt"), "x").unwrap();
        fs::create_dir(tmp.path().join("folder.pdf")).unwrap();

        let found = find_pdf_candidates(tmp.path()).unwrap();
        assert_eq!(found, vec!["UPPER.PDF", "alpha.pdf", "zebra.pdf"]);
    }

    #[test]
    fn empty_directory_yields_empty_list() {
        let tmp = TempDir::new().unwrap();
        assert!(find_pdf_candidates(tmp.path()).unwrap().is_empty());
    }

    #[test]
    fn missing_directory_is_a_discovery_error() {
        let err = find_pdf_candidates(Path::new("/no/such/dir")).unwrap_err();
        assert!(matches!(err, PipelineError::DiscoveryFailed { .. }));
    }

    #[test]
    fn validate_rejects_missing_and_non_pdf() {
        let tmp = TempDir::new().unwrap();
        let missing = tmp.path().join("gone.pdf");
        assert!(matches!(
            validate_input(&missing),
            Err(PipelineError::InvalidInput { .. })
        ));

        let txt = tmp.path().join("notes.txt");
        fs::write(&txt, "x").unwrap();
        assert!(matches!(
            validate_input(&txt),
            Err(PipelineError::InvalidInput { .. })
        ));
    }

    #[test]
    fn validate_accepts_and_absolutises_pdf() {
        let tmp = TempDir::new().unwrap();
        let pdf = tmp.path().join("scan.pdf");
        fs::write(&pdf, "%PDF-1.4").unwrap();
        let resolved = validate_input(&pdf).unwrap();
        assert!(resolved.is_absolute());
        assert!(resolved.ends_with("scan.pdf"));
    }
}
