//! A line-oriented reader for Proguard/R8 mapping files.
//!
//! Only class lines are of interest here. Every other non-comment line is a
//! field or method mapping and is skipped, since members are never renamed.
//!
//! The mapping file format is described
//! [here](https://www.guardsquare.com/en/products/proguard/manual/retrace).

use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::io;
use std::path::Path;

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

lazy_static! {
    static ref CLASS_LINE_RE: Regex = Regex::new(r"^(.+?) -> (.+?):").unwrap();
}

/// A single classified line of a mapping file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MappingRecord<'s> {
    /// A line whose first non-whitespace character is `#`.
    Comment,
    /// A class line, `left -> right:` followed by anything.
    Class {
        /// The name in front of the arrow.
        left: &'s str,
        /// The name between the arrow and the colon.
        right: &'s str,
    },
    /// Any other line, assumed to map a field or method.
    Member {
        /// The trimmed line.
        line: &'s str,
    },
}

impl<'s> MappingRecord<'s> {
    /// Classifies a line from a mapping file.
    ///
    /// Returns `None` for blank lines.
    ///
    /// # Examples
    ///
    /// ```
    /// use apksource::MappingRecord;
    ///
    /// assert_eq!(
    ///     MappingRecord::parse("com.example.Original -> a.b.c:"),
    ///     Some(MappingRecord::Class {
    ///         left: "com.example.Original",
    ///         right: "a.b.c",
    ///     })
    /// );
    ///
    /// assert_eq!(MappingRecord::parse("# compiler: R8"), Some(MappingRecord::Comment));
    ///
    /// assert_eq!(
    ///     MappingRecord::parse("    1:1:void a() -> show"),
    ///     Some(MappingRecord::Member {
    ///         line: "1:1:void a() -> show"
    ///     })
    /// );
    ///
    /// assert_eq!(MappingRecord::parse("   "), None);
    /// ```
    pub fn parse(line: &'s str) -> Option<Self> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }
        if line.starts_with('#') {
            return Some(MappingRecord::Comment);
        }

        let record = match CLASS_LINE_RE.captures(line) {
            Some(caps) => match (caps.get(1), caps.get(2)) {
                (Some(left), Some(right)) => MappingRecord::Class {
                    left: left.as_str(),
                    right: right.as_str(),
                },
                _ => MappingRecord::Member { line },
            },
            None => MappingRecord::Member { line },
        };
        Some(record)
    }
}

/// An Iterator yielding [`MappingRecord`]s, created by [`MappingRecord::iter`].
#[derive(Clone)]
pub struct MappingRecordIter<'s> {
    lines: std::str::Lines<'s>,
}

impl fmt::Debug for MappingRecordIter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MappingRecordIter").finish()
    }
}

impl<'s> Iterator for MappingRecordIter<'s> {
    type Item = MappingRecord<'s>;

    fn next(&mut self) -> Option<Self::Item> {
        self.lines.by_ref().find_map(MappingRecord::parse)
    }
}

impl<'s> MappingRecord<'s> {
    /// Iterates over all non-blank lines of a mapping file.
    pub fn iter(source: &'s str) -> MappingRecordIter<'s> {
        MappingRecordIter {
            lines: source.lines(),
        }
    }
}

/// Which captured name of a class line is the obfuscated one.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaptureOrder {
    /// The name in front of the arrow is looked up on disk and replaced by the
    /// name behind it.
    ///
    /// This is how the upstream tool reads the file. It is the reverse of the
    /// `original -> obfuscated:` layout written by proguard and R8.
    #[default]
    Upstream,
    /// The name behind the arrow is looked up on disk and replaced by the name
    /// in front of it, following the `original -> obfuscated:` layout.
    Conventional,
}

/// An association between an obfuscated class and its original name.
///
/// Both paths are slash-delimited, e.g. `com/example/Original`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MappingEntry {
    /// Path of the class as it was found in the decompiled sources.
    pub obfuscated_path: String,
    /// Path the class should be moved to.
    pub original_path: String,
}

/// Converts a dotted class name to a slash-delimited path.
pub fn class_path(dotted: &str) -> String {
    dotted.replace('.', "/")
}

/// All class associations of a mapping file, in file order.
///
/// Keyed by the obfuscated path. A repeated key overwrites the earlier value
/// but keeps its position.
#[derive(Clone, Debug, Default)]
pub struct MappingTable {
    entries: Vec<MappingEntry>,
    index: HashMap<String, usize>,
    summary: MappingSummary,
}

impl MappingTable {
    /// Builds a table from the full text of a mapping file.
    ///
    /// # Examples
    ///
    /// ```
    /// use apksource::{CaptureOrder, MappingTable};
    ///
    /// let table = MappingTable::parse(
    ///     "com.example.Original -> a.b.c:\n    1:1:void a() -> show\n",
    ///     CaptureOrder::Upstream,
    /// );
    /// assert_eq!(table.len(), 1);
    /// assert_eq!(table.get("com/example/Original"), Some("a/b/c"));
    /// assert_eq!(table.summary().member_count(), 1);
    /// ```
    pub fn parse(source: &str, order: CaptureOrder) -> Self {
        let mut table = Self::default();
        for record in MappingRecord::iter(source) {
            match record {
                MappingRecord::Comment => table.summary.comment_count += 1,
                MappingRecord::Member { .. } => table.summary.member_count += 1,
                MappingRecord::Class { left, right } => {
                    table.summary.class_count += 1;
                    let (obfuscated, original) = match order {
                        CaptureOrder::Upstream => (left, right),
                        CaptureOrder::Conventional => (right, left),
                    };
                    table.insert(class_path(obfuscated), class_path(original));
                }
            }
        }
        table
    }

    /// Reads and parses a mapping file from the file system.
    ///
    /// Fails if the file cannot be read or is not valid UTF-8.
    pub fn from_path<P: AsRef<Path>>(path: P, order: CaptureOrder) -> io::Result<Self> {
        let source = fs::read_to_string(path)?;
        Ok(Self::parse(&source, order))
    }

    fn insert(&mut self, obfuscated_path: String, original_path: String) {
        match self.index.get(&obfuscated_path) {
            Some(&idx) => self.entries[idx].original_path = original_path,
            None => {
                self.index.insert(obfuscated_path.clone(), self.entries.len());
                self.entries.push(MappingEntry {
                    obfuscated_path,
                    original_path,
                });
            }
        }
    }

    /// Looks up the original path of an obfuscated class path.
    pub fn get(&self, obfuscated_path: &str) -> Option<&str> {
        self.index
            .get(obfuscated_path)
            .map(|&idx| self.entries[idx].original_path.as_str())
    }

    /// Iterates over the entries in insertion order.
    pub fn iter(&self) -> std::slice::Iter<'_, MappingEntry> {
        self.entries.iter()
    }

    /// The number of distinct obfuscated classes.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no class line was found.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Counts of the lines the table was built from.
    pub fn summary(&self) -> MappingSummary {
        self.summary
    }
}

/// Summary of a mapping file.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct MappingSummary {
    class_count: usize,
    member_count: usize,
    comment_count: usize,
}

impl MappingSummary {
    /// Returns the number of class lines, duplicates included.
    pub fn class_count(&self) -> usize {
        self.class_count
    }

    /// Returns the number of member lines, which are never applied.
    pub fn member_count(&self) -> usize {
        self.member_count
    }

    /// Returns the number of comment lines.
    pub fn comment_count(&self) -> usize {
        self.comment_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_class_with_trailing_text() {
        let parsed = MappingRecord::parse("a.b.C -> x.y:  # trailing junk");
        assert_eq!(
            parsed,
            Some(MappingRecord::Class {
                left: "a.b.C",
                right: "x.y",
            })
        );
    }

    #[test]
    fn parse_class_stops_at_first_colon() {
        let parsed = MappingRecord::parse("a.B -> c:d -> e:");
        assert_eq!(
            parsed,
            Some(MappingRecord::Class {
                left: "a.B",
                right: "c",
            })
        );
    }

    #[test]
    fn parse_indented_comment() {
        assert_eq!(
            MappingRecord::parse("   # compiler_version: 1.3.49"),
            Some(MappingRecord::Comment)
        );
    }

    #[test]
    fn parse_malformed_lines_are_members() {
        for line in [
            "androidx.activity.OnBackPressedCallback->c.a.b:",
            "androidx.activity.OnBackPressedCallback -> c.a.b",
            "    java.util.ArrayDeque mOnBackPressedCallbacks -> b",
            "    1:4:void onBackPressed():184:187 -> c",
            "-> c.a.b:",
        ] {
            assert!(
                matches!(MappingRecord::parse(line), Some(MappingRecord::Member { .. })),
                "{line}"
            );
        }
    }

    #[test]
    fn iter_skips_blank_lines() {
        let records: Vec<_> = MappingRecord::iter("\n# header\r\n\r\na -> b:\n   \n").collect();
        assert_eq!(
            records,
            vec![
                MappingRecord::Comment,
                MappingRecord::Class {
                    left: "a",
                    right: "b"
                },
            ]
        );
    }

    #[test]
    fn table_converts_dots_to_slashes() {
        let table = MappingTable::parse(
            "android.arch.core.executor.ArchTaskExecutor -> a.a.a.a.c:",
            CaptureOrder::Upstream,
        );
        assert_eq!(
            table.iter().collect::<Vec<_>>(),
            vec![&MappingEntry {
                obfuscated_path: "android/arch/core/executor/ArchTaskExecutor".into(),
                original_path: "a/a/a/a/c".into(),
            }]
        );
    }

    #[test]
    fn table_conventional_order() {
        let table = MappingTable::parse(
            "android.arch.core.executor.ArchTaskExecutor -> a.a.a.a.c:",
            CaptureOrder::Conventional,
        );
        assert_eq!(
            table.get("a/a/a/a/c"),
            Some("android/arch/core/executor/ArchTaskExecutor")
        );
    }

    #[test]
    fn table_duplicate_overwrites_in_place() {
        let table = MappingTable::parse(
            "a.A -> x.First:\nb.B -> y.Y:\na.A -> x.Second:\n",
            CaptureOrder::Upstream,
        );
        let keys: Vec<_> = table.iter().map(|e| e.obfuscated_path.as_str()).collect();
        assert_eq!(keys, vec!["a/A", "b/B"]);
        assert_eq!(table.get("a/A"), Some("x/Second"));
    }

    #[test]
    fn table_empty_for_comments_only() {
        let table = MappingTable::parse(
            "# compiler: R8\n\n# min_api: 15\n",
            CaptureOrder::Upstream,
        );
        assert!(table.is_empty());
    }

    #[test]
    fn summary_counts() {
        let table = MappingTable::parse(
            "# compiler: R8\ncom.example.A -> a:\n    int b -> c\n    void d() -> e\na -> b:\n",
            CaptureOrder::Upstream,
        );
        let summary = table.summary();
        assert_eq!(summary.class_count(), 2);
        assert_eq!(summary.member_count(), 2);
        assert_eq!(summary.comment_count(), 1);
    }
}
