//! Guesses library dependencies from decompiled sources and adds them to the
//! generated `app/build.gradle`.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use lazy_static::lazy_static;
use regex::Regex;
use thiserror::Error;
use walkdir::WalkDir;

use crate::locate::SourceKind;
use crate::logger::Logger;

/// The line in the generated build file that detected dependencies replace.
pub const DEPENDENCY_PLACEHOLDER: &str = "// Add auto-detected dependencies here";

/// A library that can be recognised in the sources.
#[derive(Debug)]
pub struct DependencyRule {
    /// Short name of the library.
    pub name: &'static str,
    /// Pattern searched for in source files.
    pub pattern: Regex,
    /// Lines added to the `dependencies` block.
    pub lines: &'static [&'static str],
}

lazy_static! {
    /// The built-in rules, in the order they are reported.
    ///
    /// Coroutines is added whenever Kotlin sources exist, without looking at
    /// the pattern.
    pub static ref RULES: Vec<DependencyRule> = vec![
        DependencyRule {
            name: "kotlinx-coroutines",
            pattern: Regex::new(r"kotlinx\.coroutines").unwrap(),
            lines: &["implementation 'org.jetbrains.kotlinx:kotlinx-coroutines-android:1.7.3'"],
        },
        DependencyRule {
            name: "retrofit2",
            pattern: Regex::new(r"retrofit2").unwrap(),
            lines: &["implementation 'com.squareup.retrofit2:retrofit:2.9.0'"],
        },
        DependencyRule {
            name: "room",
            pattern: Regex::new(r"androidx\.room").unwrap(),
            lines: &[
                "implementation 'androidx.room:room-runtime:2.6.1'",
                "kapt 'androidx.room:room-compiler:2.6.1'",
            ],
        },
        DependencyRule {
            name: "hilt",
            pattern: Regex::new(r"dagger\.hilt").unwrap(),
            lines: &[
                "implementation 'com.google.dagger:hilt-android:2.48'",
                "kapt 'com.google.dagger:hilt-compiler:2.48'",
            ],
        },
        DependencyRule {
            name: "glide",
            pattern: Regex::new(r"com\.bumptech\.glide").unwrap(),
            lines: &[
                "implementation 'com.github.bumptech.glide:glide:4.16.0'",
                "annotationProcessor 'com.github.bumptech.glide:compiler:4.16.0'",
            ],
        },
    ];
}

const KOTLIN_RULE: usize = 0;

/// An error injecting dependencies.
#[derive(Debug, Error)]
pub enum DepsError {
    /// Reading or writing the build file failed.
    #[error("{}: {source}", path.display())]
    Io {
        /// The build file.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: io::Error,
    },
}

/// Scans the `.java` and `.kt` files below `source_root` for known libraries.
///
/// Files that cannot be read are skipped with a warning.
pub fn detect<L: Logger>(source_root: &Path, logger: &L) -> Vec<&'static DependencyRule> {
    let mut found = vec![false; RULES.len()];
    let mut has_kotlin = false;

    for entry in WalkDir::new(source_root) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                logger.warn(format_args!("Skipping unreadable source entry: {}", err));
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let kind = match entry
            .path()
            .extension()
            .and_then(|ext| ext.to_str())
            .and_then(SourceKind::from_extension)
        {
            Some(kind) => kind,
            None => continue,
        };
        if kind == SourceKind::Kotlin && !has_kotlin {
            has_kotlin = true;
            logger.info(format_args!("Kotlin sources detected."));
        }

        let data = match fs::read(entry.path()) {
            Ok(data) => data,
            Err(err) => {
                logger.warn(format_args!(
                    "Failed to scan {}: {}",
                    entry.path().display(),
                    err
                ));
                continue;
            }
        };
        let text = String::from_utf8_lossy(&data);
        for (idx, rule) in RULES.iter().enumerate() {
            if idx != KOTLIN_RULE && !found[idx] && rule.pattern.is_match(&text) {
                logger.info(format_args!(
                    "Pattern '{}' detected for {}.",
                    rule.pattern.as_str(),
                    rule.name
                ));
                found[idx] = true;
            }
        }
    }
    found[KOTLIN_RULE] = has_kotlin;

    RULES
        .iter()
        .zip(found)
        .filter_map(|(rule, found)| found.then_some(rule))
        .collect()
}

/// Replaces the placeholder in `build_gradle` with the lines of `rules`.
///
/// Returns the number of rules injected. The file is left alone when there
/// is nothing to inject.
pub fn inject<L: Logger>(
    build_gradle: &Path,
    rules: &[&DependencyRule],
    logger: &L,
) -> Result<usize, DepsError> {
    if rules.is_empty() {
        logger.info(format_args!("No additional dependencies detected."));
        return Ok(0);
    }
    logger.info(format_args!(
        "Injecting {} detected dependencies into {}.",
        rules.len(),
        build_gradle.display()
    ));

    let lines: Vec<&str> = rules.iter().flat_map(|rule| rule.lines.iter().copied()).collect();
    let io_err = |source| DepsError::Io {
        path: build_gradle.to_owned(),
        source,
    };
    let content = fs::read_to_string(build_gradle).map_err(io_err)?;
    let content = content.replace(DEPENDENCY_PLACEHOLDER, &lines.join("\n    "));
    fs::write(build_gradle, content).map_err(io_err)?;
    Ok(rules.len())
}
