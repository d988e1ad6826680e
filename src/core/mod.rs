use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Index of a parsed file within a [`FileSet`].
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FileId(pub u32);

/// A position in parsed source, comparable for equality.
///
/// The canonical identity of a call site is the position of its opening
/// parenthesis. Lines are 1-based and columns 0-based, following
/// proc-macro2 span locations; display formatting converts the column to
/// the 1-based convention compilers use.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SourcePos {
    pub file: FileId,
    pub line: u32,
    pub column: u32,
}

impl SourcePos {
    pub fn new(file: FileId, loc: proc_macro2::LineColumn) -> Self {
        Self {
            file,
            line: loc.line as u32,
            column: loc.column as u32,
        }
    }
}

/// Translates positions back to `(path, line, column)`.
#[derive(Clone, Debug, Default)]
pub struct FileSet {
    paths: Vec<PathBuf>,
}

impl FileSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, path: PathBuf) -> FileId {
        let id = FileId(self.paths.len() as u32);
        self.paths.push(path);
        id
    }

    pub fn path(&self, id: FileId) -> &Path {
        &self.paths[id.0 as usize]
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// Render a position as `path:line:column` with a 1-based column.
    pub fn display_pos(&self, pos: SourcePos) -> String {
        format!(
            "{}:{}:{}",
            self.path(pos.file).display(),
            pos.line,
            pos.column + 1
        )
    }
}

/// A parsed source file handed to the analysis pass.
#[derive(Clone, Debug)]
pub struct SourceFile {
    pub id: FileId,
    pub path: PathBuf,
    pub ast: syn::File,
}

/// A diagnostic emitted by the analyzer: a source position and a
/// human-readable message.
#[derive(Clone, Debug, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct Finding {
    pub position: SourcePos,
    pub message: String,
}

impl Finding {
    pub fn new(position: SourcePos, message: impl Into<String>) -> Self {
        Self {
            position,
            message: message.into(),
        }
    }
}
