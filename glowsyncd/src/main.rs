use glowsync_api::{Error, Result};
use tracing::info;

mod commands;
mod config;
mod replay;

// Initializes the `glowsyncd` application. It determines the
// configuration and sets up the logger. It returns the configuration
// and the command to run, or `None` if the program should exit
// (because a command line option asked for a "usage" message, for
// instance.)

async fn init_app() -> Option<(config::Config, config::Cmd)> {
    let (cfg, cmd) = config::get().await?;

    // The max log level is determined by the user (either through
    // the config file or the command line.) Logs go to stderr so the
    // output of `replay` can be piped.

    let subscriber = tracing_subscriber::fmt()
        .with_max_level(cfg.get_log_level())
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("WARNING: couldn't install logger: {}", e)
    }
    Some((cfg, cmd))
}

async fn run() -> Result<()> {
    let Some((cfg, cmd)) = init_app().await else {
        return Ok(());
    };

    match cmd {
        config::Cmd::Check => commands::check(&cfg),
        config::Cmd::Extract(path) => commands::extract(&path).await,
        config::Cmd::Condition {
            label,
            temp,
            switch,
        } => commands::condition(&cfg, &label, temp, switch.as_deref()),
        config::Cmd::Replay(path) => {
            let text = tokio::fs::read_to_string(&path).await.map_err(|e| {
                Error::OperationError(format!("{}: {}", path.display(), e))
            })?;
            let steps = replay::parse_script(&text)?;

            info!("replaying {} step(s)", steps.len());
            replay::run(cfg.valid_switches()?, steps, replay::print_call).await
        }
    }
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("ERROR: {}", e);
        std::process::exit(1)
    }
}
