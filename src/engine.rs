//! Applies a mapping table to a tree of decompiled sources.
//!
//! Every failure is reported through the [`Logger`] and then dropped: a
//! missing or unreadable mapping file ends the run early, a class whose file
//! cannot be found is skipped, and a class that fails to move or rewrite is
//! abandoned in whatever state it reached before the next one is processed.

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::config::Config;
use crate::locate::locate;
use crate::logger::{LogFacade, Logger};
use crate::mapping::{MappingEntry, MappingSummary, MappingTable};
use crate::rewrite::{rewrite_class, RewriteError};

/// How a run ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplyStatus {
    /// There was no mapping file, so nothing was done.
    MappingNotFound,
    /// The mapping file exists but could not be read.
    MappingUnreadable,
    /// The mapping file contains no class lines.
    NoMappingFound,
    /// Every entry of the table was processed.
    Completed,
}

/// The result of processing a single [`MappingEntry`].
#[derive(Debug)]
pub enum EntryOutcome {
    /// The file was moved and its declarations updated.
    Rewritten {
        /// Where the file was found.
        from: PathBuf,
        /// Where the file is now.
        to: PathBuf,
    },
    /// No source file exists for the obfuscated class.
    Skipped,
    /// Moving or rewriting the file failed.
    Failed {
        /// The source file that was being processed.
        path: PathBuf,
        /// What went wrong.
        error: RewriteError,
    },
}

/// Totals of a run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct ApplySummary {
    /// How the run ended.
    pub status: ApplyStatus,
    /// Entries whose file was moved and rewritten.
    pub rewritten: usize,
    /// Entries without a source file.
    pub skipped: usize,
    /// Entries that failed part way.
    pub failed: usize,
    /// The lines of the mapping file, once it was read.
    pub mapping: Option<MappingSummary>,
}

impl ApplySummary {
    fn new(status: ApplyStatus) -> Self {
        Self {
            status,
            rewritten: 0,
            skipped: 0,
            failed: 0,
            mapping: None,
        }
    }

    fn with_mapping(status: ApplyStatus, mapping: MappingSummary) -> Self {
        Self {
            mapping: Some(mapping),
            ..Self::new(status)
        }
    }

    fn record(&mut self, outcome: &EntryOutcome) {
        match outcome {
            EntryOutcome::Rewritten { .. } => self.rewritten += 1,
            EntryOutcome::Skipped => self.skipped += 1,
            EntryOutcome::Failed { .. } => self.failed += 1,
        }
    }
}

/// Renames obfuscated classes back to their original names.
///
/// # Examples
///
/// ```
/// use apksource::{logger::Silent, CaptureOrder, Config, Deobfuscator, MappingTable};
///
/// let dir = tempfile::tempdir().unwrap();
/// std::fs::create_dir_all(dir.path().join("a/b")).unwrap();
/// std::fs::write(dir.path().join("a/b/c.java"), "package a.b;\nclass c {}").unwrap();
///
/// let table = MappingTable::parse(
///     "com.example.Original -> a.b.c:",
///     CaptureOrder::Conventional,
/// );
/// let engine = Deobfuscator::with_logger(Config::default(), Silent);
/// let summary = engine.apply_table(&table, dir.path());
///
/// assert_eq!(summary.rewritten, 1);
/// assert_eq!(
///     std::fs::read_to_string(dir.path().join("com/example/Original.java")).unwrap(),
///     "package com.example;\nclass Original {}",
/// );
/// ```
#[derive(Clone, Debug)]
pub struct Deobfuscator<L = LogFacade> {
    config: Config,
    logger: L,
}

impl Deobfuscator {
    /// Creates a deobfuscator that logs through the [`log`] facade.
    pub fn new(config: Config) -> Self {
        Self::with_logger(config, LogFacade)
    }
}

impl<L: Logger> Deobfuscator<L> {
    /// Creates a deobfuscator that reports to `logger`.
    pub fn with_logger(config: Config, logger: L) -> Self {
        Self { config, logger }
    }

    /// Applies the mapping file from the working directory to the sources of
    /// the project in `project_dir`.
    pub fn run(&self, project_dir: &Path) -> ApplySummary {
        let mapping_file = match self.config.mapping_path() {
            Ok(path) => path,
            Err(err) => {
                self.logger.warn(format_args!(
                    "Cannot resolve the working directory: {}. Skipping deobfuscation.",
                    err
                ));
                return ApplySummary::new(ApplyStatus::MappingUnreadable);
            }
        };
        self.run_with_mapping(&mapping_file, &self.config.source_root(project_dir))
    }

    /// Applies `mapping_file` to the sources below `source_root`.
    pub fn run_with_mapping(&self, mapping_file: &Path, source_root: &Path) -> ApplySummary {
        if !mapping_file.exists() {
            self.logger.info(format_args!(
                "No {} found. Skipping class deobfuscation.",
                mapping_file.display()
            ));
            return ApplySummary::new(ApplyStatus::MappingNotFound);
        }

        self.logger.info(format_args!(
            "Found {}. Deobfuscating sources in {}...",
            mapping_file.display(),
            source_root.display()
        ));

        let table = match MappingTable::from_path(mapping_file, self.config.capture_order) {
            Ok(table) => table,
            Err(err) => {
                self.logger.warn(format_args!(
                    "Failed to read {}: {}",
                    mapping_file.display(),
                    err
                ));
                return ApplySummary::new(ApplyStatus::MappingUnreadable);
            }
        };

        let lines = table.summary();
        self.logger.info(format_args!(
            "Read {} class lines, {} member lines ignored.",
            lines.class_count(),
            lines.member_count()
        ));

        if table.is_empty() {
            self.logger.info(format_args!(
                "No valid class mapping found in {}. Skipping.",
                mapping_file.display()
            ));
            return ApplySummary::with_mapping(ApplyStatus::NoMappingFound, lines);
        }

        self.apply_table(&table, source_root)
    }

    /// Processes every entry of `table` in order.
    pub fn apply_table(&self, table: &MappingTable, source_root: &Path) -> ApplySummary {
        let mut summary = ApplySummary::with_mapping(ApplyStatus::Completed, table.summary());
        let total = table.len();

        for (idx, entry) in table.iter().enumerate() {
            self.logger.debug(format_args!(
                "[{}/{}] {} -> {}",
                idx + 1,
                total,
                entry.obfuscated_path,
                entry.original_path
            ));
            let outcome = self.apply_entry(entry, source_root);
            if let EntryOutcome::Failed { path, error } = &outcome {
                self.logger.warn(format_args!(
                    "Failed to rename/update {}: {}",
                    path.display(),
                    error
                ));
            }
            summary.record(&outcome);
        }

        self.logger.info(format_args!(
            "Class deobfuscation finished: {} renamed, {} skipped, {} failed.",
            summary.rewritten, summary.skipped, summary.failed
        ));
        summary
    }

    /// Locates and rewrites the file of a single entry.
    pub fn apply_entry(&self, entry: &MappingEntry, source_root: &Path) -> EntryOutcome {
        let Some(file) = locate(source_root, &entry.obfuscated_path) else {
            return EntryOutcome::Skipped;
        };
        match rewrite_class(
            &file,
            &entry.obfuscated_path,
            &entry.original_path,
            source_root,
        ) {
            Ok(to) => EntryOutcome::Rewritten {
                from: file.path,
                to,
            },
            Err(error) => EntryOutcome::Failed {
                path: file.path,
                error,
            },
        }
    }
}
