//! Application run modes: logger init, single prompt, TUI launch.

use std::io;

use crate::cli::Args;
use crate::core;
use crate::core::chat::{self, SendOutcome};
use crate::core::config::Config;
use crate::core::content::PreparedContent;
use crate::core::relay::{Attachment, RelayClient};
use crate::core::state::Action;

/// Initialize env_logger. In TUI mode, writes to file to avoid corrupting the display.
pub fn init_logger(args: &Args) {
    let log_level = args.log_level();
    let mut logger =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level));

    if args.launches_tui() {
        let log_path = core::paths::cache_dir().map(|d| {
            let _ = std::fs::create_dir_all(&d);
            d.join(format!("{}.log", core::app::NAME))
        });
        if let Some(path) = log_path
            && let Ok(file) = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(&path)
        {
            logger.target(env_logger::Target::Pipe(Box::new(file)));
        }
    }
    let _ = logger.try_init();
}

/// Run single prompt mode: send one message in the selected category and print the reply.
pub async fn run_single_prompt(
    args: &Args,
    config: &Config,
    prompt_arg: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let prompt = core::cli::arg_or_stdin(Some(prompt_arg.to_string()))?;
    let prompt = prompt.trim();
    if prompt.is_empty() {
        return Err("empty prompt".into());
    }

    let mut session = core::cli::open_session()?;
    if let Some(id) = &args.category {
        let category = session
            .state()
            .settings
            .category(id)
            .map(|c| c.id.clone())
            .ok_or_else(|| format!("unknown category: {} (see `categories`)", id))?;
        session.dispatch(Action::CategorySelected(category))?;
    }

    let attachments = args
        .attachments
        .iter()
        .map(|path| {
            Attachment::from_path(path)
                .map_err(|e| format!("cannot attach {}: {}", path.display(), e))
        })
        .collect::<Result<Vec<_>, _>>()?;

    let client = RelayClient::new(config)?;
    match chat::send(&mut session, &client, prompt, attachments).await? {
        SendOutcome::Replied(message) => {
            println!("{}", PreparedContent::new(&message.content).text);
            Ok(())
        }
        SendOutcome::UpgradeRequired { used, limit } => Err(format!(
            "message limit reached ({}/{}); run `plans` and `upgrade <plan>`",
            used, limit
        )
        .into()),
    }
}

/// Launch the TUI in a blocking thread. Returns on panic or IO error.
pub async fn launch_tui(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    let join_result: Result<io::Result<()>, tokio::task::JoinError> =
        tokio::task::spawn_blocking(move || crate::tui::run(config)).await;

    match join_result {
        Ok(io_result) => io_result?,
        Err(join_err) => {
            if let Ok(panic) = join_err.try_into_panic() {
                let msg = if let Some(s) = panic.downcast_ref::<&str>() {
                    s.to_string()
                } else if let Some(s) = panic.downcast_ref::<String>() {
                    s.clone()
                } else {
                    format!("{:?}", panic)
                };
                eprintln!("TUI panic: {}", msg);
            }
            return Err(
                Box::new(io::Error::other("TUI thread panicked")) as Box<dyn std::error::Error>
            );
        }
    }
    Ok(())
}
