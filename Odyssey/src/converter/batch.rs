//! Batch texture conversion
//!
//! Finds every TPC file below a directory and converts them to PNG in
//! parallel, mirroring the source directory layout in the destination.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use rayon::prelude::*;
use tracing::warn;
use walkdir::WalkDir;

use super::tpc_to_png;
use crate::utils::extension_lower;

/// Result of a batch conversion
#[derive(Debug, Clone, Default)]
pub struct BatchConvertResult {
    pub success_count: usize,
    pub fail_count: usize,
    /// `(source, error)` for every failed file.
    pub failures: Vec<(PathBuf, String)>,
}

/// Find all `.tpc` files in a directory recursively, sorted
pub fn find_tpc_files<P: AsRef<Path>>(dir: P) -> Vec<PathBuf> {
    let mut files: Vec<_> = WalkDir::new(dir)
        .follow_links(true)
        .into_iter()
        .filter_map(std::result::Result::ok)
        .filter(|e| e.path().is_file() && extension_lower(e.path()).as_deref() == Some("tpc"))
        .map(|e| e.path().to_path_buf())
        .collect();
    files.sort();
    files
}

/// Convert TPC files to PNG in parallel
///
/// Each output lands at `dest_base` joined with the file's path relative to
/// `source_base`, with a `.png` extension. `progress` receives
/// `(done, total, relative path)` once per file, from worker threads.
pub fn batch_tpc_to_png<F>(
    files: &[PathBuf],
    source_base: &Path,
    dest_base: &Path,
    progress: F,
) -> BatchConvertResult
where
    F: Fn(usize, usize, &Path) + Send + Sync,
{
    let processed = AtomicUsize::new(0);
    let total = files.len();

    let failures: Vec<(PathBuf, String)> = files
        .par_iter()
        .filter_map(|source| {
            let relative = source.strip_prefix(source_base).unwrap_or(source.as_path());
            let destination = dest_base.join(relative).with_extension("png");

            let outcome = destination
                .parent()
                .map_or(Ok(()), std::fs::create_dir_all)
                .map_err(crate::error::Error::from)
                .and_then(|()| tpc_to_png(source, &destination));

            let done = processed.fetch_add(1, Ordering::SeqCst) + 1;
            progress(done, total, relative);

            outcome.err().map(|e| {
                warn!("Failed to convert {}: {}", source.display(), e);
                (source.clone(), e.to_string())
            })
        })
        .collect();

    BatchConvertResult {
        success_count: total - failures.len(),
        fail_count: failures.len(),
        failures,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formats::tpc::tests::tpc_bytes;

    #[test]
    fn test_batch_mirrors_layout_and_reports_failures() {
        let source = tempfile::tempdir().unwrap();
        let dest = tempfile::tempdir().unwrap();
        let red = tpc_bytes(8, 4, 4, 2, 1, &[0x00, 0xF8, 0x00, 0xF8, 0, 0, 0, 0]);

        std::fs::create_dir_all(source.path().join("sub")).unwrap();
        std::fs::write(source.path().join("a.tpc"), &red).unwrap();
        std::fs::write(source.path().join("sub/B.TPC"), &red).unwrap();
        std::fs::write(source.path().join("sub/broken.tpc"), [0u8; 16]).unwrap();
        std::fs::write(source.path().join("notes.txt"), b"skip").unwrap();

        let files = find_tpc_files(source.path());
        assert_eq!(files.len(), 3);

        let calls = AtomicUsize::new(0);
        let result = batch_tpc_to_png(&files, source.path(), dest.path(), |_, total, _| {
            assert_eq!(total, 3);
            calls.fetch_add(1, Ordering::SeqCst);
        });

        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(result.success_count, 2);
        assert_eq!(result.fail_count, 1);
        assert!(result.failures[0].0.ends_with("broken.tpc"));
        assert!(dest.path().join("a.png").is_file());
        assert!(dest.path().join("sub/B.png").is_file());
    }
}
