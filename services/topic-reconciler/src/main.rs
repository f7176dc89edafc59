use std::path::PathBuf;
use std::process::ExitCode;

use shared::config::{LogFormat, Settings, CONFIG_PATH_ENV};
use shared::dto::DesiredSet;
use shared::error::AppError;
use shared::kafka::KafkaTopicAdmin;
use topic_reconciler::{Reconciler, RunStatus, TracingSink};
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, EnvFilter};

fn config_path() -> Option<PathBuf> {
    std::env::args_os()
        .nth(1)
        .or_else(|| std::env::var_os(CONFIG_PATH_ENV))
        .map(PathBuf::from)
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    match format {
        LogFormat::Json => fmt().json().with_env_filter(filter).init(),
        LogFormat::Text => fmt().with_env_filter(filter).init(),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let status = app_main().await;
    if let Some(message) = status.message() {
        eprintln!("{message}");
    }
    status.into()
}

fn prepare(settings: &Settings) -> shared::error::Result<(DesiredSet, KafkaTopicAdmin)> {
    let desired = settings.desired_set()?;
    let admin = KafkaTopicAdmin::connect(&settings.message_broker_url, settings.admin_timeout())?;
    Ok((desired, admin))
}

async fn app_main() -> RunStatus {
    let settings = match Settings::load(config_path().as_deref()) {
        Ok(settings) => settings,
        Err(e) => {
            init_tracing(LogFormat::Text);
            let e = AppError::from(e);
            error!(%e, "failed to load settings");
            return RunStatus::from_app_error(&e);
        }
    };
    init_tracing(settings.log_format);

    let (desired, admin) = match prepare(&settings) {
        Ok(prepared) => prepared,
        Err(e) => {
            error!(%e, "failed to prepare reconciliation");
            return RunStatus::from_app_error(&e);
        }
    };
    info!(
        broker = %settings.message_broker_url,
        topics = desired.len(),
        dry_run = settings.dry_run,
        "starting topic reconciliation"
    );
    let reconciler = Reconciler::new(admin, TracingSink);

    tokio::select! {
        status = execute(&reconciler, &desired, settings.dry_run) => status,
        _ = tokio::signal::ctrl_c() => {
            warn!("interrupted; topics requested so far may still be created by the broker");
            RunStatus::Cancelled
        }
    }
}

async fn execute(
    reconciler: &Reconciler<KafkaTopicAdmin, TracingSink>,
    desired: &DesiredSet,
    dry_run: bool,
) -> RunStatus {
    if !dry_run {
        return RunStatus::from_run(&reconciler.run(desired).await);
    }
    match reconciler.plan(desired).await {
        Ok(plan) => {
            let missing: Vec<&str> = plan.to_create().iter().map(|s| s.name()).collect();
            info!(
                would_create = %missing.join(", "),
                already_present = %plan.already_present().join(", "),
                "dry run, no topics created"
            );
            RunStatus::Success
        }
        Err(e) => RunStatus::Aborted(e.to_string()),
    }
}
