use clap::{CommandFactory, Parser};
use colored::*;
use tracing_subscriber::EnvFilter;

use multistream_watch::cli::Args;
use multistream_watch::config::DashboardConfig;
use multistream_watch::onboarding::{FileFlagStore, FlagStore, ONBOARDING_FLAG};
use multistream_watch::web::{self, AppState};
use multistream_watch::{DashboardSession, SessionOptions};

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("multistream_watch=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    if let Some(shell) = args.completions {
        let mut cmd = Args::command();
        clap_complete::generate(shell, &mut cmd, "multistream-watch", &mut std::io::stdout());
        return Ok(());
    }

    init_tracing();

    let mut config = DashboardConfig::load(args.config.as_deref())?;
    args.apply_to(&mut config);

    let mut flags = FileFlagStore::new(&config.storage.flag_path);
    if args.reset_onboarding {
        flags.set(ONBOARDING_FLAG, false)?;
        tracing::info!(path = %flags.path().display(), "onboarding reset");
    }
    let onboarding_completed = flags.get(ONBOARDING_FLAG).unwrap_or_else(|e| {
        tracing::warn!(error = %e, "could not read onboarding flag; showing wizard");
        false
    });

    let session = DashboardSession::new(SessionOptions {
        trial_secs: config.trial.duration_secs,
        clamp_policy: config.layout.clamp_policy,
        onboarding_completed,
    });
    let gateway = config.checkout.gateway();

    eprintln!("{}", "  MultiStream Watch".bright_magenta().bold());
    eprintln!(
        "{}",
        format!(
            "  trial {}s | checkout {} | layout clamp {:?}",
            config.trial.duration_secs,
            gateway.label(),
            config.layout.clamp_policy
        )
        .bright_black()
    );

    let state = AppState::new(session, Box::new(flags), gateway);
    web::serve(&config.server, state).await
}
