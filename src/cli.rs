//! CLI definitions: argument parsing, subcommands, and help text.

use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand};
use clap_complete::Shell;

pub use clap_complete::generate;

const AFTER_HELP: &str = "\
EXAMPLES:
  relay-chat                          Launch interactive TUI
  relay-chat login --email a@b.c      Sign in (password read from stdin)
  relay-chat category code            Select the chat category
  relay-chat -p \"explain X\"           Single prompt, print the reply
  relay-chat -p - --attach q.sql      Read prompt from stdin, attach a file
  relay-chat plans                    List plans and upgrade options
  relay-chat upgrade pro              Open the payment page and wait for it
  relay-chat history list             List saved conversations
  relay-chat inspect < reply.json     Run a raw relay body through the pipeline
  relay-chat completions bash         Generate bash completions
";

/// Command-line arguments for the application.
#[derive(Parser)]
#[command(
    author,
    version,
    about = "Terminal chat client for a relay-hosted AI assistant",
    after_help = AFTER_HELP
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Send a single prompt then exit (without opening the TUI)
    #[arg(
        short = 'p',
        long,
        help = "Send one message and print the reply (use '-' to read from stdin)"
    )]
    pub prompt: Option<String>,

    /// Category for this prompt (also becomes the selected category)
    #[arg(short = 'c', long, requires = "prompt")]
    pub category: Option<String>,

    /// Files to attach to the prompt (sent as multipart)
    #[arg(short = 'a', long = "attach", requires = "prompt")]
    pub attachments: Vec<PathBuf>,

    /// Increase log verbosity (use multiple times for debug)
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Reduce log output (errors only)
    #[arg(short = 'q', long = "quiet", global = true)]
    pub quiet: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Sign in to your account
    Login {
        #[arg(long)]
        email: String,
        /// Password (read from stdin when omitted)
        #[arg(long)]
        password: Option<String>,
    },
    /// Create an account
    Register {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        /// Password (read from stdin when omitted)
        #[arg(long)]
        password: Option<String>,
    },
    /// Sign out and clear the current conversation
    Logout,
    /// Request a password reset link
    ResetPassword {
        #[arg(long)]
        email: String,
    },
    /// Show the signed-in user, plan, usage, and category
    Status,
    /// List chat categories
    Categories,
    /// Select the chat category
    Category {
        /// Category id (see `categories`)
        id: String,
    },
    /// List pricing plans
    Plans,
    /// Upgrade to a plan: open the payment page and wait for the result
    Upgrade {
        /// Plan id (see `plans`)
        plan: String,
        /// Print the payment URL instead of opening a browser
        #[arg(long)]
        no_open: bool,
    },
    /// Apply a transaction message posted by the payment page
    PaymentCallback {
        /// Origin the message was posted from
        #[arg(long)]
        origin: String,
        /// Plan the payment was for
        #[arg(long)]
        plan: String,
        /// Message JSON (read from stdin when omitted)
        data: Option<String>,
    },
    /// Archive the current conversation and start a new one
    New,
    /// Manage saved conversations
    History {
        #[command(subcommand)]
        subcommand: HistorySubcommand,
    },
    /// Show, set, or toggle the color theme
    Theme {
        /// light, dark, or toggle
        value: Option<String>,
    },
    /// Show, import, or reset admin settings (categories, prompts, plans)
    Settings {
        #[command(subcommand)]
        subcommand: SettingsSubcommand,
    },
    /// Run a raw relay response body through extraction, normalization, and rendering
    Inspect {
        /// Body text (read from stdin when omitted)
        body: Option<String>,
    },
    /// Show config paths and relay settings
    Config,
    /// Generate shell completion script
    Completions {
        /// Shell to generate completions for (bash, zsh, fish, powershell, elvish)
        #[arg(value_parser = clap::value_parser!(Shell))]
        shell: Shell,
    },
}

#[derive(Subcommand)]
pub enum HistorySubcommand {
    /// List saved conversations, most recent first
    List {
        /// Maximum number of conversations to show
        #[arg(short, long)]
        limit: Option<usize>,
        /// Filter by title, category, or message content
        #[arg(long)]
        query: Option<String>,
    },
    /// Print a saved conversation
    Show {
        /// List position (1 = most recent), id, or id prefix
        id: String,
    },
    /// Make a saved conversation current again
    Restore { id: String },
    /// Delete a saved conversation
    Delete { id: String },
    /// Delete the current conversation and all saved ones
    Clear,
}

#[derive(Subcommand)]
pub enum SettingsSubcommand {
    /// Print the active settings as JSON
    Show,
    /// Replace settings with a validated JSON file
    Import { path: PathBuf },
    /// Restore the built-in settings
    Reset,
}

impl Args {
    /// Log level based on -v/-q flags: error, warn, info, or debug.
    pub fn log_level(&self) -> &'static str {
        if self.quiet {
            "error"
        } else if self.verbose >= 2 {
            "debug"
        } else if self.verbose >= 1 {
            "info"
        } else {
            "warn"
        }
    }

    /// True when no subcommand and no prompt were given.
    pub fn launches_tui(&self) -> bool {
        self.command.is_none() && self.prompt.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn definition_is_consistent() {
        Args::command().debug_assert();
    }

    #[test]
    fn log_levels() {
        let args = Args::parse_from(["relay-chat", "-vv"]);
        assert_eq!(args.log_level(), "debug");
        let args = Args::parse_from(["relay-chat", "-q", "status"]);
        assert_eq!(args.log_level(), "error");
        assert!(!args.launches_tui());
        assert!(Args::parse_from(["relay-chat"]).launches_tui());
    }

    #[test]
    fn attach_requires_prompt() {
        assert!(Args::try_parse_from(["relay-chat", "--attach", "a.txt"]).is_err());
        let args =
            Args::try_parse_from(["relay-chat", "-p", "hi", "-a", "a.txt", "-a", "b.txt"]).unwrap();
        assert_eq!(args.attachments.len(), 2);
    }
}
