use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};

use apksource::deps;
use apksource::logger::LogFacade;
use apksource::{CaptureOrder, Config, Deobfuscator};

/// apksource - turn decompiled APK sources into an editable Gradle project
#[derive(Debug, Parser)]
#[command(name = "apksource", version, about, long_about = None)]
struct Cli {
    #[command(flatten)]
    global: GlobalOptions,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Parser)]
struct GlobalOptions {
    /// Print the result as JSON.
    #[arg(long, global = true)]
    json: bool,

    /// Enable debug logging.
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Rename obfuscated classes using a proguard mapping file.
    Deobfuscate {
        /// The generated project directory.
        #[arg(value_name = "PROJECT_DIR")]
        project: PathBuf,

        /// Mapping file, relative to the working directory [default: mapping.txt].
        #[arg(short, long, value_name = "FILE")]
        mapping: Option<PathBuf>,

        /// Source root, relative to the project [default: app/src/main/java].
        #[arg(long, value_name = "DIR")]
        source_dir: Option<PathBuf>,

        /// Read class lines as `original -> obfuscated:`.
        #[arg(long)]
        conventional: bool,

        /// JSON config file.
        #[arg(long, value_name = "FILE")]
        config: Option<PathBuf>,
    },

    /// Detect libraries in the sources and add them to app/build.gradle.
    DetectDeps {
        /// The generated project directory.
        #[arg(value_name = "PROJECT_DIR")]
        project: PathBuf,

        /// Only report what was detected.
        #[arg(long)]
        no_inject: bool,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = if cli.global.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };
    env_logger::Builder::new()
        .filter_module("apksource", level)
        .parse_default_env()
        .target(env_logger::Target::Stderr)
        .format_timestamp(None)
        .format_module_path(false)
        .format_target(false)
        .init();

    match cli.command {
        Command::Deobfuscate {
            project,
            mapping,
            source_dir,
            conventional,
            config,
        } => {
            let mut config = match config {
                Some(path) => Config::from_path(&path)
                    .with_context(|| format!("loading {}", path.display()))?,
                None => Config::default(),
            };
            if let Some(mapping) = mapping {
                config.mapping_file = mapping;
            }
            if let Some(source_dir) = source_dir {
                config.source_dir = source_dir;
            }
            if conventional {
                config.capture_order = CaptureOrder::Conventional;
            }

            let summary = Deobfuscator::new(config).run(&project);
            if cli.global.json {
                println!("{}", serde_json::to_string_pretty(&summary)?);
            } else {
                if let Some(lines) = summary.mapping {
                    println!(
                        "{} class lines, {} member lines ignored",
                        lines.class_count(),
                        lines.member_count()
                    );
                }
                println!(
                    "{} renamed, {} skipped, {} failed",
                    summary.rewritten, summary.skipped, summary.failed
                );
            }
        }
        Command::DetectDeps { project, no_inject } => {
            let config = Config::default();
            let found = deps::detect(&config.source_root(&project), &LogFacade);
            let injected = if no_inject {
                0
            } else {
                let gradle = project.join("app").join("build.gradle");
                deps::inject(&gradle, &found, &LogFacade)
                    .with_context(|| format!("updating {}", gradle.display()))?
            };
            let names: Vec<&str> = found.iter().map(|rule| rule.name).collect();
            if cli.global.json {
                let report = serde_json::json!({ "detected": names, "injected": injected });
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                for name in names {
                    println!("{name}");
                }
            }
        }
    }

    Ok(())
}
