use anyhow::Result;
use ignore::WalkBuilder;
use std::path::{Path, PathBuf};

/// Discovers the Rust source files under a target path, honoring
/// gitignore rules. Every discovered file is loaded; user ignore
/// patterns are applied later by the loop collector, so that functions
/// declared in ignored files still feed the call graph.
pub struct FileWalker {
    root: PathBuf,
}

impl FileWalker {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    pub fn walk(&self) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        let walker = WalkBuilder::new(&self.root)
            .hidden(false)
            .git_ignore(true)
            .build();

        for entry in walker {
            let entry = entry?;
            let path = entry.path();

            if path.is_file() && is_rust_file(path) {
                files.push(path.to_path_buf());
            }
        }

        files.sort();
        Ok(files)
    }
}

fn is_rust_file(path: &Path) -> bool {
    path.extension().and_then(|ext| ext.to_str()) == Some("rs")
}

/// Find the Rust files to analyze under `target`, which may be a single
/// file or a directory.
pub fn find_source_files(target: &Path) -> Result<Vec<PathBuf>> {
    if target.is_file() {
        if is_rust_file(target) {
            return Ok(vec![target.to_path_buf()]);
        }
        return Ok(vec![]);
    }

    FileWalker::new(target.to_path_buf()).walk()
}
