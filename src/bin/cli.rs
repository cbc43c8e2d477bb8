//! Exam Crawler CLI
//!
//! Local execution entry point.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use exam_crawler::{
    cancel::CancelFlag,
    error::{AppError, Result},
    models::{BatchSummary, Config},
    pipeline::{
        self, ChunkPartitioner, Collaborators, ManifestBuilder, PartitionResult, SyncOptions,
        SyncOrchestrator, SyncOutcome,
    },
    storage::{CollectionStorage, LocalStorage},
};

/// Exam Crawler - incremental exam discussion sync
#[derive(Parser, Debug)]
#[command(
    name = "exam-crawler",
    version,
    about = "Incrementally syncs exam discussions into a chunked local store"
)]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    /// Data directory (overrides paths.data_dir)
    #[arg(short, long)]
    data_dir: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Debug, Clone, Copy)]
struct ForceFlags {
    /// Discard stored links and rediscover from page 1
    #[arg(long)]
    force_rescan: bool,

    /// Rewrite every record even when unchanged
    #[arg(long)]
    force_update: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Sync one exam
    Sync {
        /// Exam code, e.g. AZ-900
        code: String,

        /// Skip the delay between questions
        #[arg(long)]
        fast: bool,

        #[command(flatten)]
        force: ForceFlags,
    },

    /// Sync every stored exam in turn
    UpdateAll {
        /// Only update this exam
        #[arg(long)]
        only: Option<String>,

        #[command(flatten)]
        force: ForceFlags,
    },

    /// Split exams into chunk files
    Chunk {
        /// Exam code; omit with --all
        code: Option<String>,

        /// Chunk every exam with at least the minimum question count
        #[arg(long, conflicts_with = "code")]
        all: bool,

        /// Questions per chunk (default: chunking.chunk_size)
        #[arg(long)]
        chunk_size: Option<usize>,

        /// Minimum questions for --all (default: chunking.min_records)
        #[arg(long)]
        min_records: Option<usize>,
    },

    /// Remove chunk files and metadata of one exam
    CleanupChunks { code: String },

    /// Rebuild manifest.json
    Manifest,

    /// Check the data directory for inconsistencies
    Validate,

    /// Check whether an exam needs another sync
    Check {
        code: String,

        /// Only inspect stored files, skip the listing estimate
        #[arg(long)]
        offline: bool,
    },

    /// Run full pipeline: Update → Chunk → Manifest
    Pipeline {
        /// Only update this exam
        #[arg(long)]
        only: Option<String>,

        #[command(flatten)]
        force: ForceFlags,
    },

    /// Move flat `{code}*.json` files into per-exam directories
    Migrate {
        /// Only migrate this exam
        #[arg(long)]
        only: Option<String>,

        /// List planned moves without touching files
        #[arg(long)]
        dry_run: bool,
    },

    /// Show configuration and store info
    Info {
        /// Also compare each exam against the live listing
        #[arg(long)]
        online: bool,
    },
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

/// Trip the cancellation flag on Ctrl-C.
fn install_ctrl_c(cancel: CancelFlag) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            log::warn!("Interrupted, stopping after the current request...");
            cancel.cancel();
        }
    });
}

fn orchestrator(
    config: &Config,
    storage: Arc<dyn CollectionStorage>,
    cancel: CancelFlag,
) -> Result<SyncOrchestrator> {
    let parts = Collaborators::from_config(config, storage)?;
    Ok(SyncOrchestrator::new(config, parts, cancel))
}

fn fail_on_batch_errors(summary: &BatchSummary) -> Result<()> {
    if summary.has_failures() {
        return Err(AppError::validation(format!(
            "{} of {} exams failed to update",
            summary.failed, summary.total_exams
        )));
    }
    Ok(())
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    log::info!("Exam Crawler starting...");

    let mut config = Config::load_or_default(&cli.config);
    if let Some(data_dir) = cli.data_dir {
        config.paths.data_dir = data_dir;
    }
    config.validate()?;

    log::info!("Data directory: {}", config.paths.data_dir.display());

    let storage: Arc<dyn CollectionStorage> = Arc::new(LocalStorage::new(&config.paths.data_dir));
    let cancel = CancelFlag::new();

    match cli.command {
        Command::Sync { code, fast, force } => {
            install_ctrl_c(cancel.clone());
            let options = SyncOptions {
                fast_mode: fast,
                force_rescan: force.force_rescan,
                force_update: force.force_update,
            };
            let report = orchestrator(&config, storage, cancel)?
                .sync(&code, options)
                .await?;

            log::info!(
                "{}: {} new, {} updated, {} unchanged",
                code,
                report.stats.new,
                report.stats.updated,
                report.stats.unchanged
            );
            match report.outcome {
                SyncOutcome::Complete => {
                    log::info!("✓ {} complete with {} questions", code, report.collection.len())
                }
                SyncOutcome::CompleteWithErrors { error, records } => {
                    log::warn!("{} stopped early with {} questions: {}", code, records, error);
                    return Err(AppError::validation(error));
                }
                SyncOutcome::Failed { error } => {
                    log::error!("{} failed: {}", code, error);
                    return Err(AppError::validation(error));
                }
            }
        }

        Command::UpdateAll { only, force } => {
            install_ctrl_c(cancel.clone());
            let options = SyncOptions {
                fast_mode: false,
                force_rescan: force.force_rescan,
                force_update: force.force_update,
            };
            let summary = pipeline::update_all(
                &orchestrator(&config, storage, cancel)?,
                config.sync.inter_collection_pause(),
                options,
                only.as_deref(),
            )
            .await?;
            fail_on_batch_errors(&summary)?;
        }

        Command::Chunk {
            code,
            all,
            chunk_size,
            min_records,
        } => {
            let chunk_size = chunk_size.unwrap_or(config.chunking.chunk_size);
            let partitioner = ChunkPartitioner::new(Arc::clone(&storage));

            if all {
                let min_records = min_records.unwrap_or(config.chunking.min_records);
                let results = partitioner.chunk_all(chunk_size, min_records).await?;
                log::info!("Chunked {} exams", results.len());
            } else {
                let code = code.ok_or_else(|| {
                    AppError::validation("Specify an exam code or --all")
                })?;
                let collection = storage
                    .load_collection(&code)
                    .await?
                    .ok_or_else(|| AppError::not_found(format!("Exam {code} not found")))?;

                if let PartitionResult::Chunked(metadata) = partitioner
                    .partition(&code, collection.records(), chunk_size)
                    .await?
                {
                    if !metadata.is_complete() {
                        return Err(AppError::storage(
                            config.paths.data_dir.join(&code),
                            format!("chunks {:?} were not written", metadata.missing_chunks()),
                        ));
                    }
                }
            }
        }

        Command::CleanupChunks { code } => {
            ChunkPartitioner::new(storage).cleanup_chunks(&code).await?;
        }

        Command::Manifest => {
            ManifestBuilder::new(storage).build().await?;
        }

        Command::Validate => {
            log::info!("Validating data directory...");
            let report = pipeline::validate_store(storage.as_ref()).await?;

            for issue in &report.issues {
                log::warn!("  {}", issue);
            }
            if !report.is_valid() {
                log::error!("Validation found {} issues", report.issues.len());
                return Err(AppError::validation(format!(
                    "{} issues in {}",
                    report.issues.len(),
                    config.paths.data_dir.display()
                )));
            }
            log::info!("✓ {} exams OK", report.collections);
        }

        Command::Check { code, offline } => {
            let check = if offline {
                pipeline::check_for_updates(storage.as_ref(), &code).await
            } else {
                let orchestrator = orchestrator(&config, Arc::clone(&storage), cancel)?;
                pipeline::check_for_updates_online(storage.as_ref(), orchestrator.crawler(), &code)
                    .await
            };
            if check.needed {
                log::info!("{} needs an update: {}", code, check.reason);
            } else {
                log::info!("{}: no update needed ({})", code, check.reason);
            }
        }

        Command::Pipeline { only, force } => {
            install_ctrl_c(cancel.clone());
            let options = SyncOptions {
                fast_mode: false,
                force_rescan: force.force_rescan,
                force_update: force.force_update,
            };
            let report = pipeline::run_pipeline(
                &orchestrator(&config, storage, cancel)?,
                &config,
                options,
                only.as_deref(),
            )
            .await?;

            log::info!(
                "Pipeline complete: {} exams, {} questions",
                report.manifest.total_exams,
                report.manifest.total_questions
            );
            fail_on_batch_errors(&report.summary)?;
        }

        Command::Migrate { only, dry_run } => {
            let local = LocalStorage::new(&config.paths.data_dir);
            let migration = local.migrate_flat_layout(only.as_deref(), dry_run).await?;
            log::info!(
                "{} {} files for {} exams ({} conflicts)",
                if dry_run { "Would move" } else { "Moved" },
                migration.moved.len(),
                migration.codes.len(),
                migration.conflicts.len()
            );
            if !dry_run && !migration.moved.is_empty() {
                ManifestBuilder::new(storage).build().await?;
            }
        }

        Command::Info { online } => {
            log::info!("Config file: {}", cli.config.display());
            log::info!("Base URL: {}", config.crawler.base_url);
            log::info!(
                "Pacing: {}-{} ms, {}s between exams",
                config.sync.delay_min_ms,
                config.sync.delay_max_ms,
                config.sync.inter_collection_pause_secs
            );

            let codes = storage.list_collections().await?;
            log::info!("Stored exams: {}", codes.len());
            let orchestrator = if online {
                Some(orchestrator(&config, Arc::clone(&storage), cancel)?)
            } else {
                None
            };
            for code in &codes {
                let check = match &orchestrator {
                    Some(o) => {
                        pipeline::check_for_updates_online(storage.as_ref(), o.crawler(), code)
                            .await
                    }
                    None => pipeline::check_for_updates(storage.as_ref(), code).await,
                };
                log::info!("  {}: {}", code, check.reason);
            }

            match storage.load_manifest().await {
                Ok(Some(manifest)) => log::info!(
                    "Manifest: {} exams, {} questions, generated {}",
                    manifest.total_exams,
                    manifest.total_questions,
                    manifest.generated
                ),
                Ok(None) => log::info!("No manifest found yet."),
                Err(e) => log::warn!("Manifest unreadable: {}", e),
            }
        }
    }

    log::info!("Done!");

    Ok(())
}
