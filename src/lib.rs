//! This crate turns decompiled Android sources into an editable project.
//!
//! Its main job is to apply a proguard mapping file to the sources written by
//! the code decompiler. Each obfuscated class file is moved to its original
//! location and its class and package declarations are updated. It can also
//! detect common libraries in the sources and add them to the generated build
//! file.
//!
//! # Examples
//!
//! ```
//! use apksource::{CaptureOrder, MappingTable};
//!
//! let mapping = "\
//! com.example.Original -> a.b.c:
//! # comment line
//!     1:1:void a() -> show
//! ";
//! let table = MappingTable::parse(mapping, CaptureOrder::Conventional);
//!
//! assert_eq!(table.get("a/b/c"), Some("com/example/Original"));
//! ```

#![warn(missing_docs)]

mod config;
pub mod deps;
mod engine;
mod locate;
pub mod logger;
mod mapping;
mod rewrite;

pub use config::{Config, ConfigError, DEFAULT_MAPPING_FILE, DEFAULT_SOURCE_DIR};
pub use engine::{ApplyStatus, ApplySummary, Deobfuscator, EntryOutcome};
pub use locate::{locate, SourceFile, SourceKind};
pub use mapping::{
    class_path, CaptureOrder, MappingEntry, MappingRecord, MappingRecordIter, MappingSummary,
    MappingTable,
};
pub use rewrite::{
    package_of, rename_declaration, replace_package, rewrite_class, simple_name, RewriteError,
};
