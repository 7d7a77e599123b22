//! Finds the decompiled source file of a class.

use std::path::{Path, PathBuf};

/// The kinds of source files produced by the decompiler.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SourceKind {
    /// A `.java` file.
    Java,
    /// A `.kt` file.
    Kotlin,
}

impl SourceKind {
    /// All kinds, in the order they are probed.
    pub const ALL: [SourceKind; 2] = [SourceKind::Java, SourceKind::Kotlin];

    /// The file extension, without the leading dot.
    pub fn extension(self) -> &'static str {
        match self {
            SourceKind::Java => "java",
            SourceKind::Kotlin => "kt",
        }
    }

    /// Determines the kind from a file extension.
    pub fn from_extension(ext: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.extension() == ext)
    }
}

/// A source file that exists on disk.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SourceFile {
    /// Full path of the file.
    pub path: PathBuf,
    /// Which extension matched.
    pub kind: SourceKind,
}

/// Joins `root`, a slash-delimited class path and an extension.
pub(crate) fn class_file(root: &Path, class_path: &str, kind: SourceKind) -> PathBuf {
    root.join(format!("{}.{}", class_path, kind.extension()))
}

/// Looks for the source file of `class_path` below `root`.
///
/// `.java` is checked before `.kt`, so the Java file wins when both exist.
pub fn locate(root: &Path, class_path: &str) -> Option<SourceFile> {
    SourceKind::ALL.into_iter().find_map(|kind| {
        let path = class_file(root, class_path, kind);
        path.is_file().then_some(SourceFile { path, kind })
    })
}
