//! nchook - macOS Notification Center を監視して webhook に中継する
//!
//! 起動順序:
//! (A) シグナルハンドラ登録（以降 SIGTERM / SIGINT は RunState を倒すだけ）
//! (B) 設定の読み込みと CLI による上書き
//! (C) 通知 DB を開き、ファイル監視を始める
//! (D) cursor を読み、DB purge を検知したら 0 に戻す
//! (E) 起動バナー
//! (F) EventLoop を組み立てて実行（終了時に最終 checkpoint と teardown）

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use nchook_core::app::reconcile_cursor;
use nchook_core::impls::{
    AppFilter, DbLocation, FsChangeNotifier, JsonCursorStore, LogReporter, SqliteRecordSource,
    WebhookSink, detect_db_path,
};
use nchook_core::ports::{CursorStore, StartupReporter, StartupSummary};
use nchook_core::{AppBuilder, HookConfig, Lifecycle, LoopReport, RunMode, RunState};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Relay Notification Center entries to a webhook
#[derive(Parser, Debug)]
#[command(name = "nchook")]
#[command(version, about, long_about = None)]
struct Args {
    /// Log the payloads that would be sent instead of calling the webhook
    #[arg(long)]
    dry_run: bool,

    /// Path to JSON configuration file (missing file means defaults)
    #[arg(short, long, default_value = "config.json")]
    config: PathBuf,

    /// Notification database path (skips auto-detection)
    #[arg(long)]
    db: Option<PathBuf>,

    /// Cursor file path
    #[arg(long)]
    state_file: Option<PathBuf>,

    /// Webhook endpoint
    #[arg(long)]
    webhook_url: Option<String>,

    /// Log level (trace, debug, info, warn, error); RUST_LOG wins when set
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn load_config(args: &Args) -> Result<HookConfig> {
    let mut config = HookConfig::load(&args.config)?;
    if let Some(db) = &args.db {
        config = config.with_db_path(db);
    }
    if let Some(state_file) = &args.state_file {
        config = config.with_state_file(state_file);
    }
    if let Some(url) = &args.webhook_url {
        config = config.with_webhook_url(url);
    }
    config.validate()?;
    Ok(config)
}

async fn run(args: Args) -> Result<LoopReport> {
    // (A)
    let lifecycle = Lifecycle::new(RunState::new());
    let _signals = lifecycle
        .install_handlers()
        .context("installing signal handlers")?;

    // (B)
    let config = load_config(&args)?;
    let mode = RunMode::from_dry_run(args.dry_run);

    // (C)
    let location = match &config.db_path {
        Some(path) => DbLocation::new(path),
        None => detect_db_path()?,
    };
    let source = Arc::new(
        SqliteRecordSource::open(&location.db)
            .with_context(|| format!("opening {}", location.db.display()))?,
    );
    let notifier = Arc::new(FsChangeNotifier::watch(&location.db)?);

    // (D)
    let cursor_store = Arc::new(JsonCursorStore::new(&config.state_file));
    let cursor = reconcile_cursor(source.as_ref(), cursor_store.load()).await;

    let sink = WebhookSink::new(
        config.webhook_url.clone(),
        config.request_timeout(),
        config.retry_policy(),
    )?;

    // (E)
    LogReporter::default().report(&StartupSummary {
        db_path: source.path().to_path_buf(),
        wal_path: location.wal.clone(),
        cursor,
        mode,
        webhook_url: sink.url().to_string(),
    });
    if mode.is_rehearsal() {
        info!("dry run: payloads are logged, the webhook is never called");
    }

    // (F)
    let event_loop = AppBuilder::new()
        .source(source)
        .notifier(notifier)
        .cursor_store(cursor_store)
        .filter(Arc::new(AppFilter::new(config.apps.iter().cloned())))
        .sink(Arc::new(sink))
        .run_state(lifecycle.run_state())
        .mode(mode)
        .poll_interval(config.poll_interval())
        .starting_at(cursor)
        .build()?;

    Ok(event_loop.run().await?)
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    init_tracing(&args.log_level);

    match run(args).await {
        Ok(report) => {
            info!(
                cursor = %report.cursor,
                delivered = report.stats.delivered,
                rehearsed = report.stats.rehearsed,
                skipped = report.stats.skipped,
                "shutdown complete"
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}
