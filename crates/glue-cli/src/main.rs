// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Glue CLI
//!
//! Loads a JSON view model, mirrors it into the reference script heap, and
//! reports what each synchronization pass cost in boundary crossings.

mod viewmodel;

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use glue_app_core::config::ConfigService;
use glue_app_core::prefs::{SyncPrefs, SYNC_PREFS_KEY};
use glue_config_fs::FsConfigStore;
use glue_core::{BulkBuilder, GlueGraph, LocalSessionCache};
use glue_heap::{HeapConfig, MirrorHandle, ScriptHeap};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Mirror JSON view models into a script heap")]
struct Args {
    /// Config directory (defaults to the platform config dir)
    #[arg(long, global = true)]
    config_dir: Option<PathBuf>,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Synchronize a view model and print per-pass costs
    Sync {
        /// JSON view model
        file: PathBuf,
        /// Maximum entries per bulk-update crossing
        #[arg(long)]
        max_batch: Option<usize>,
        /// Number of passes over the same graph
        #[arg(long)]
        passes: Option<usize>,
        /// Print the root mirror as JSON after the last pass
        #[arg(long)]
        dump: bool,
    },
    /// Show or update stored preferences
    Prefs {
        #[command(subcommand)]
        action: PrefsAction,
    },
}

#[derive(Subcommand, Debug)]
enum PrefsAction {
    /// Print effective preferences
    Show,
    /// Update and persist preferences
    Save {
        /// Maximum entries per bulk-update crossing
        #[arg(long)]
        max_batch: Option<usize>,
        /// Number of passes over the same graph
        #[arg(long)]
        passes: Option<usize>,
        /// Default log filter
        #[arg(long)]
        log_filter: Option<String>,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();

    let store = match &args.config_dir {
        Some(dir) => FsConfigStore::at(dir),
        None => FsConfigStore::new(),
    }
    .context("opening config store")?;
    let config = ConfigService::new(store);
    let prefs: SyncPrefs = config
        .load_or_default(SYNC_PREFS_KEY)
        .context("loading preferences")?;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(prefs.log_filter.as_str()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match args.cmd {
        Command::Sync {
            file,
            max_batch,
            passes,
            dump,
        } => {
            let prefs = SyncPrefs {
                heap: HeapConfig {
                    max_batch: max_batch.unwrap_or(prefs.heap.max_batch),
                },
                passes: passes.unwrap_or(prefs.passes),
                ..prefs
            };
            sync(&file, &prefs, dump)
        }
        Command::Prefs { action } => match action {
            PrefsAction::Show => print_json(&serde_json::to_value(&prefs)?),
            PrefsAction::Save {
                max_batch,
                passes,
                log_filter,
            } => {
                let updated = SyncPrefs {
                    heap: HeapConfig {
                        max_batch: max_batch.unwrap_or(prefs.heap.max_batch),
                    },
                    passes: passes.unwrap_or(prefs.passes),
                    log_filter: log_filter.unwrap_or(prefs.log_filter),
                };
                config
                    .save(SYNC_PREFS_KEY, &updated)
                    .context("saving preferences")?;
                info!(?updated, "preferences saved");
                print_json(&serde_json::to_value(&updated)?)
            }
        },
    }
}

fn sync(file: &Path, prefs: &SyncPrefs, dump: bool) -> Result<()> {
    let text = std::fs::read_to_string(file)
        .with_context(|| format!("reading {}", file.display()))?;
    let doc: serde_json::Value = serde_json::from_str(&text).context("parsing view model")?;
    let mut graph: GlueGraph<MirrorHandle> =
        viewmodel::ingest(&doc).context("ingesting view model")?;
    let root = graph.root().context("view model has no root")?;
    info!(nodes = graph.len(), "view model ingested");

    let heap = ScriptHeap::new(prefs.heap);
    let mut cache = LocalSessionCache::new();
    let mut builder = BulkBuilder::new(heap.clone(), &mut cache, heap.clone());

    let mut out = std::io::stdout().lock();
    for pass in 1..=prefs.passes.max(1) {
        let report = builder
            .synchronize(&mut graph, root)
            .with_context(|| format!("synchronization pass {pass}"))?;
        let crossings = heap.take_journal().len();
        writeln!(
            out,
            "pass {pass}: visited={} objects={} arrays={} basics={} enums={} commands={} \
             property_wirings={} array_wirings={} crossings={crossings}",
            report.visited,
            report.objects,
            report.arrays,
            report.basics,
            report.enums,
            report.commands,
            report.property_wirings,
            report.array_wirings,
        )?;
    }
    drop(builder);
    if !cache.is_empty() {
        info!(cached = cache.len(), "enum values cached for later passes");
    }

    if dump {
        match graph.mirror(root) {
            Some(mirror) => {
                let rendered = serde_json::to_string_pretty(&heap.to_json(*mirror))?;
                writeln!(out, "{rendered}")?;
            }
            None => warn!("root has no mirror"),
        }
    }
    Ok(())
}

fn print_json(value: &serde_json::Value) -> Result<()> {
    let mut out = std::io::stdout().lock();
    writeln!(out, "{}", serde_json::to_string_pretty(value)?)?;
    Ok(())
}
