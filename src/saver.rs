//! Local filesystem layout for downloaded files.

use std::path::{Path, PathBuf};

use tokio::fs;

use crate::models::SearchResult;

/// Replace path separators and other characters that are awkward in file
/// names with underscores, collapsing runs, then trim leading and trailing
/// underscores and dots.
pub fn sanitize_component(part: &str) -> String {
    let mut out = String::with_capacity(part.len());
    let mut pending_underscore = false;
    for c in part.chars() {
        let replace = matches!(c, '/' | '\\' | '<' | '>' | ':' | '"' | '|' | '?' | '*')
            || c.is_whitespace();
        if replace {
            pending_underscore = !out.is_empty();
        } else {
            if pending_underscore {
                out.push('_');
                pending_underscore = false;
            }
            out.push(c);
        }
    }
    out.trim_matches(|c| c == '_' || c == '.').to_string()
}

/// Destination for a search result under `output_dir`.
///
/// The structured layout mirrors the repository tree:
/// `<output_dir>/<owner_name>/<in-repo directory>/<filename>`. The flat
/// layout synthesizes a unique name from the same parts so files from
/// different repositories cannot collide in a single directory.
pub fn destination_path(result: &SearchResult, output_dir: &Path, flat: bool) -> PathBuf {
    let repo_part = sanitize_component(&result.repository);
    let in_repo = Path::new(&result.path);
    let file_name = in_repo
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("unnamed");

    if flat {
        let parent_part = match in_repo.parent().and_then(Path::to_str) {
            Some("") | None => "root".to_string(),
            Some(parent) => sanitize_component(parent),
        };
        let mut name = format!(
            "{}_{}_{}",
            repo_part,
            parent_part,
            sanitize_component(file_name)
        );
        name = name.trim_matches('_').to_string();
        // Sanitization must not cost the file its extension.
        if let Some(ext) = in_repo.extension().and_then(|e| e.to_str()) {
            let suffix = format!(".{ext}");
            if !name.ends_with(&suffix) {
                name.push_str(&suffix);
            }
        }
        output_dir.join(name)
    } else {
        let parent = in_repo.parent().unwrap_or_else(|| Path::new(""));
        output_dir.join(repo_part).join(parent).join(file_name)
    }
}

/// Write resolved file bytes under `output_dir`, creating intermediate
/// directories as needed and overwriting any previous download at the same
/// destination.
pub async fn save_file(
    result: &SearchResult,
    bytes: &[u8],
    output_dir: &Path,
    flat: bool,
) -> std::io::Result<PathBuf> {
    let dest = destination_path(result, output_dir, flat);
    if let Some(dir) = dest.parent() {
        fs::create_dir_all(dir).await?;
    }
    fs::write(&dest, bytes).await?;
    Ok(dest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn result(repository: &str, path: &str) -> SearchResult {
        SearchResult {
            repository: repository.to_string(),
            path: path.to_string(),
            default_branch: Some("main".to_string()),
        }
    }

    #[test]
    fn sanitize_replaces_separators_and_reserved_chars() {
        assert_eq!(sanitize_component("octo/demo"), "octo_demo");
        assert_eq!(sanitize_component("a\\b:c*d"), "a_b_c_d");
        assert_eq!(sanitize_component("what? \"why\""), "what_why");
    }

    #[test]
    fn sanitize_collapses_runs_and_trims() {
        assert_eq!(sanitize_component("a  / b"), "a_b");
        assert_eq!(sanitize_component("__config__"), "config");
        assert_eq!(sanitize_component(".hidden."), "hidden");
    }

    #[test]
    fn structured_path_mirrors_repository_tree() {
        let dest = destination_path(
            &result("octo/demo", "deploy/base/app.yaml"),
            Path::new("/out"),
            false,
        );
        assert_eq!(dest, Path::new("/out/octo_demo/deploy/base/app.yaml"));
    }

    #[test]
    fn structured_path_handles_repo_root_files() {
        let dest = destination_path(&result("octo/demo", "Makefile"), Path::new("/out"), false);
        assert_eq!(dest, Path::new("/out/octo_demo/Makefile"));
    }

    #[test]
    fn flat_path_synthesizes_unique_name() {
        let dest = destination_path(
            &result("octo/demo", "deploy/base/app.yaml"),
            Path::new("/out"),
            true,
        );
        assert_eq!(dest, Path::new("/out/octo_demo_deploy_base_app.yaml"));
    }

    #[test]
    fn flat_path_uses_root_marker_for_top_level_files() {
        let dest = destination_path(&result("octo/demo", "app.yaml"), Path::new("/out"), true);
        assert_eq!(dest, Path::new("/out/octo_demo_root_app.yaml"));
    }

    #[test]
    fn same_filename_from_different_repos_gets_distinct_paths() {
        let a = destination_path(&result("octo/alpha", "config.yaml"), Path::new("/out"), false);
        let b = destination_path(&result("octo/beta", "config.yaml"), Path::new("/out"), false);
        assert_ne!(a, b);

        let a = destination_path(&result("octo/alpha", "config.yaml"), Path::new("/out"), true);
        let b = destination_path(&result("octo/beta", "config.yaml"), Path::new("/out"), true);
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn save_creates_directories_and_overwrites() {
        let out = TempDir::new().unwrap();
        let target = result("octo/demo", "deploy/app.yaml");

        let dest = save_file(&target, b"first", out.path(), false).await.unwrap();
        assert_eq!(std::fs::read(&dest).unwrap(), b"first");

        let dest = save_file(&target, b"second", out.path(), false).await.unwrap();
        assert_eq!(std::fs::read(&dest).unwrap(), b"second");
    }
}
