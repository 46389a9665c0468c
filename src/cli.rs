use std::path::PathBuf;

use clap::Parser;
use clap_complete::Shell;

use crate::config::DashboardConfig;

#[derive(Parser, Debug)]
#[command(name = "multistream-watch")]
#[command(version)]
#[command(about = "Watch several live streams and their chats on one dashboard")]
pub struct Args {
    /// Path to a TOML config file
    #[arg(long, short)]
    pub config: Option<PathBuf>,

    /// Port for the dashboard server (overrides config)
    #[arg(long)]
    pub port: Option<u16>,

    /// Address to bind (overrides config)
    #[arg(long)]
    pub bind: Option<String>,

    /// Upgrade instantly on checkout without calling a backend
    #[arg(long)]
    pub demo_checkout: bool,

    /// Forget that onboarding was completed and show the wizard again
    #[arg(long)]
    pub reset_onboarding: bool,

    /// Do not open a browser window on start
    #[arg(long)]
    pub no_browser: bool,

    /// Print shell completions and exit
    #[arg(long, value_enum)]
    pub completions: Option<Shell>,
}

impl Args {
    /// Apply command-line overrides on top of file and environment config.
    pub fn apply_to(&self, config: &mut DashboardConfig) {
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(bind) = &self.bind {
            config.server.bind = bind.clone();
        }
        if self.demo_checkout {
            config.checkout.demo = true;
        }
        if self.no_browser {
            config.server.open_browser = false;
        }
    }
}
