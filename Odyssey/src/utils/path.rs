//! Path utilities

use std::path::{Path, PathBuf};

/// Path of the MDX companion for an MDL file (same stem, `.mdx` extension).
pub fn mdx_path_for<P: AsRef<Path>>(mdl_path: P) -> PathBuf {
    let path = mdl_path.as_ref();
    let upper = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.chars().all(|c| !c.is_ascii_lowercase()));
    path.with_extension(if upper { "MDX" } else { "mdx" })
}

/// Lowercased extension of a path, if any.
pub fn extension_lower<P: AsRef<Path>>(path: P) -> Option<String> {
    path.as_ref()
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mdx_path_for() {
        assert_eq!(mdx_path_for("models/c_bantha.mdl"), PathBuf::from("models/c_bantha.mdx"));
        assert_eq!(mdx_path_for("P_BASTILAH.MDL"), PathBuf::from("P_BASTILAH.MDX"));
    }

    #[test]
    fn test_extension_lower() {
        assert_eq!(extension_lower("a/B.TPC").as_deref(), Some("tpc"));
        assert_eq!(extension_lower("noext"), None);
    }
}
