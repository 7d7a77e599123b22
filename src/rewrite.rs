//! Moves a source file to its original location and fixes its declarations.
//!
//! The edits are plain text substitutions, not a parse of the language. Only
//! the first class-like declaration and the first package statement are
//! touched, which is enough for decompiler output where both sit at the top.

use std::borrow::Cow;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use lazy_static::lazy_static;
use regex::{Captures, Regex};
use thiserror::Error;

use crate::locate::{class_file, SourceFile};

lazy_static! {
    static ref PACKAGE_RE: Regex = Regex::new(r"package\s+.*?;").unwrap();
}

/// An error raised while rewriting a single class.
#[derive(Debug, Error)]
pub enum RewriteError {
    /// A file system operation failed.
    #[error("{}: {source}", path.display())]
    Io {
        /// The path the operation was acting on.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: io::Error,
    },
    /// The declaration pattern for a class name could not be built.
    #[error("invalid declaration pattern: {0}")]
    Pattern(#[from] regex::Error),
}

trait IoContext<T> {
    fn at(self, path: &Path) -> Result<T, RewriteError>;
}

impl<T> IoContext<T> for io::Result<T> {
    fn at(self, path: &Path) -> Result<T, RewriteError> {
        self.map_err(|source| RewriteError::Io {
            path: path.to_owned(),
            source,
        })
    }
}

/// Returns the last segment of a slash-delimited class path.
pub fn simple_name(class_path: &str) -> &str {
    class_path.rsplit('/').next().unwrap_or(class_path)
}

/// Returns the dotted package of a slash-delimited class path.
///
/// A class without a directory part yields an empty package.
///
/// ```
/// assert_eq!(apksource::package_of("com/example/Original"), "com.example");
/// assert_eq!(apksource::package_of("Original"), "");
/// ```
pub fn package_of(class_path: &str) -> String {
    match class_path.rsplit_once('/') {
        Some((dir, _)) => dir.replace('/', "."),
        None => String::new(),
    }
}

/// Renames the first `class`, `interface` or `enum` declaration of `from`.
///
/// The name must stand on its own, so `class ab` is not a declaration of `a`.
///
/// ```
/// let text = "public final class c { c() {} }";
/// let renamed = apksource::rename_declaration(text, "c", "Original").unwrap();
/// assert_eq!(renamed, "public final class Original { c() {} }");
/// ```
pub fn rename_declaration<'t>(
    text: &'t str,
    from: &str,
    to: &str,
) -> Result<Cow<'t, str>, regex::Error> {
    let re = Regex::new(&format!(
        r"(\b(?:class|interface|enum)\s+){}\b",
        regex::escape(from)
    ))?;
    Ok(re.replacen(text, 1, |caps: &Captures<'_>| format!("{}{}", &caps[1], to)))
}

/// Replaces the first `package ...;` statement with `package <package>;`.
pub fn replace_package<'t>(text: &'t str, package: &str) -> Cow<'t, str> {
    PACKAGE_RE.replacen(text, 1, |_: &Captures<'_>| format!("package {};", package))
}

/// Moves `file` to the location of `original_path` below `root` and updates
/// its class and package declarations.
///
/// Returns the new path of the file. A failure part way through leaves the
/// file where the last successful step put it.
pub fn rewrite_class(
    file: &SourceFile,
    obfuscated_path: &str,
    original_path: &str,
    root: &Path,
) -> Result<PathBuf, RewriteError> {
    let destination = class_file(root, original_path, file.kind);
    if let Some(parent) = destination.parent() {
        fs::create_dir_all(parent).at(parent)?;
    }
    fs::rename(&file.path, &destination).at(&file.path)?;

    let content = fs::read_to_string(&destination).at(&destination)?;
    let content = rename_declaration(
        &content,
        simple_name(obfuscated_path),
        simple_name(original_path),
    )?;
    let content = replace_package(&content, &package_of(original_path));

    fs::write(&destination, content.as_bytes()).at(&destination)?;
    Ok(destination)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::locate::{locate, SourceKind};

    #[test]
    fn rename_only_first_declaration() {
        let text = "class Foo { }\nclass Foo { }";
        assert_eq!(
            rename_declaration(text, "Foo", "Bar").unwrap(),
            "class Bar { }\nclass Foo { }"
        );
    }

    #[test]
    fn rename_interface_and_enum() {
        assert_eq!(
            rename_declaration("public interface a {}", "a", "Listener").unwrap(),
            "public interface Listener {}"
        );
        assert_eq!(
            rename_declaration("enum   a { X }", "a", "Mode").unwrap(),
            "enum   Mode { X }"
        );
    }

    #[test]
    fn rename_requires_whole_word() {
        let text = "class ab { }\nclass a { }";
        assert_eq!(
            rename_declaration(text, "a", "Z").unwrap(),
            "class ab { }\nclass Z { }"
        );
        assert_eq!(
            rename_declaration("subclass a {}", "a", "Z").unwrap(),
            "subclass a {}"
        );
    }

    #[test]
    fn rename_ignores_usages() {
        let text = "import a.b.c;\nnew c();";
        assert!(matches!(
            rename_declaration(text, "c", "Original").unwrap(),
            Cow::Borrowed(_)
        ));
    }

    #[test]
    fn rename_with_dollar_is_literal() {
        assert_eq!(
            rename_declaration("class a$b {}", "a$b", "Outer$Inner").unwrap(),
            "class Outer$Inner {}"
        );
    }

    #[test]
    fn replace_first_package_only() {
        let text = "package a.b;\n// package x.y;\nclass c {}";
        assert_eq!(
            replace_package(text, "com.example"),
            "package com.example;\n// package x.y;\nclass c {}"
        );
    }

    #[test]
    fn replace_package_does_not_span_lines() {
        let text = "package\n a.b;";
        assert_eq!(replace_package(text, "x"), "package x;");
        let text = "package a.b\n;";
        assert_eq!(replace_package(text, "x"), "package a.b\n;");
    }

    #[test]
    fn names_and_packages() {
        assert_eq!(simple_name("x/y/Bar"), "Bar");
        assert_eq!(simple_name("Bar"), "Bar");
        assert_eq!(package_of("x/y/Bar"), "x.y");
    }

    #[test]
    fn rewrite_moves_and_updates() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("a/b")).unwrap();
        fs::write(
            root.join("a/b/Foo.java"),
            "package a.b;\n\nclass Foo { Foo() {} }\n",
        )
        .unwrap();

        let file = locate(root, "a/b/Foo").unwrap();
        let dest = rewrite_class(&file, "a/b/Foo", "x/y/Bar", root).unwrap();

        assert_eq!(dest, root.join("x/y/Bar.java"));
        assert!(!root.join("a/b/Foo.java").exists());
        assert_eq!(
            fs::read_to_string(dest).unwrap(),
            "package x.y;\n\nclass Bar { Foo() {} }\n"
        );
    }

    #[test]
    fn rewrite_keeps_kotlin_extension() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("a")).unwrap();
        fs::write(root.join("a/b.kt"), "package a\n\nclass b").unwrap();

        let file = locate(root, "a/b").unwrap();
        assert_eq!(file.kind, SourceKind::Kotlin);
        let dest = rewrite_class(&file, "a/b", "com/example/Widget", root).unwrap();

        assert_eq!(dest, root.join("com/example/Widget.kt"));
        assert_eq!(fs::read_to_string(dest).unwrap(), "package a\n\nclass Widget");
    }

    #[test]
    fn rewrite_reports_missing_source() {
        let dir = tempfile::tempdir().unwrap();
        let file = SourceFile {
            path: dir.path().join("gone.java"),
            kind: SourceKind::Java,
        };
        let err = rewrite_class(&file, "gone", "x/Y", dir.path()).unwrap_err();
        match err {
            RewriteError::Io { path, .. } => assert_eq!(path, dir.path().join("gone.java")),
            other => panic!("unexpected error: {other}"),
        }
    }
}
