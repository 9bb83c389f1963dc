//! CLI-only commands: account, categories, plans, history, settings, and diagnostics.
//!
//! These run without opening the TUI and produce plain text output.

use std::io::{self, BufRead};
use std::path::Path;

use tokio_util::sync::CancellationToken;

use crate::core::auth::{self, LoginForm, RegisterForm};
use crate::core::config::{self, Config};
use crate::core::content::{self, PreparedContent, RenderedSegment};
use crate::core::history;
use crate::core::payment::{self, PaymentPoller, PollOutcome};
use crate::core::paths;
use crate::core::relay::{RelayClient, RelayResponse};
use crate::core::settings::Settings;
use crate::core::state::{Action, Session, Theme};
use crate::core::store::{FileStore, Store};

pub type CliResult = Result<(), Box<dyn std::error::Error>>;

/// Open the persisted session from the data directory.
pub fn open_session() -> Result<Session<FileStore>, Box<dyn std::error::Error>> {
    Ok(Session::open(FileStore::open_default()?)?)
}

/// Read a whole argument from stdin when it was not given on the command line.
pub fn arg_or_stdin(arg: Option<String>) -> io::Result<String> {
    match arg {
        Some(value) if value != "-" => Ok(value),
        _ => io::read_to_string(io::stdin()),
    }
}

/// Read one line (a password) from stdin when not given on the command line.
fn secret_or_stdin(arg: Option<String>, label: &str) -> Result<String, Box<dyn std::error::Error>> {
    if let Some(value) = arg {
        return Ok(value);
    }
    eprint!("{}: ", label);
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

fn require_user<S: Store>(session: &Session<S>) -> Result<crate::core::quota::User, Box<dyn std::error::Error>> {
    session
        .state()
        .user
        .clone()
        .ok_or_else(|| "not signed in (run `login` first)".into())
}

pub async fn run_login<S: Store>(
    config: &Config,
    session: &mut Session<S>,
    email: String,
    password: Option<String>,
) -> CliResult {
    let form = LoginForm {
        email,
        password: secret_or_stdin(password, "Password")?,
    };
    let client = RelayClient::new(config)?;
    let user = auth::login(&client, &form, &session.state().settings).await?;
    println!(
        "Signed in as {} <{}> ({} plan, {} messages used)",
        user.name,
        user.email,
        user.plan,
        user.usage_label()
    );
    session.dispatch(Action::SignedIn(user))?;
    Ok(())
}

pub async fn run_register<S: Store>(
    config: &Config,
    session: &mut Session<S>,
    name: String,
    email: String,
    password: Option<String>,
) -> CliResult {
    let form = RegisterForm {
        name,
        email,
        password: secret_or_stdin(password, "Password")?,
    };
    let client = RelayClient::new(config)?;
    let user = auth::register(&client, &form, &session.state().settings).await?;
    println!("Account created. Signed in as {} <{}>", user.name, user.email);
    session.dispatch(Action::SignedIn(user))?;
    Ok(())
}

pub fn run_logout<S: Store>(session: &mut Session<S>) -> CliResult {
    if session.state().user.is_none() {
        println!("Not signed in.");
        return Ok(());
    }
    session.dispatch(Action::SignedOut)?;
    println!("Signed out.");
    Ok(())
}

pub async fn run_reset_password(config: &Config, email: &str) -> CliResult {
    let client = RelayClient::new(config)?;
    println!("{}", auth::reset_password(&client, email).await?);
    Ok(())
}

pub fn run_status<S: Store>(session: &Session<S>) {
    let state = session.state();
    match &state.user {
        Some(user) => {
            println!("User:      {} <{}>", user.name, user.email);
            println!("Plan:      {}", user.plan);
            println!("Usage:     {}", user.usage_label());
            if !user.check_quota().is_allowed() {
                println!("           limit reached, run `plans` to upgrade");
            }
        }
        None => println!("User:      not signed in"),
    }
    println!(
        "Category:  {}",
        state.selected_category_name().unwrap_or("none selected")
    );
    println!("Messages:  {} in current conversation", state.transcript.len());
    println!("Saved:     {}/{}", state.saved.len(), history::MAX_SAVED);
    println!("Theme:     {}", state.theme.name());
}

pub fn run_categories<S: Store>(session: &Session<S>) {
    let state = session.state();
    let id_w = state
        .settings
        .categories
        .iter()
        .map(|c| c.id.len())
        .max()
        .unwrap_or(8)
        .max(8);
    for c in &state.settings.categories {
        let marker = if state.category.as_deref() == Some(c.id.as_str()) {
            "*"
        } else {
            " "
        };
        println!("{} {:<id_w$}  {}  {}", marker, c.id, c.name, c.description);
        for prompt in state.settings.prompts_for(&c.id) {
            println!("  {:<id_w$}    - {}", "", prompt.text);
        }
    }
}

pub fn run_category<S: Store>(session: &mut Session<S>, id: &str) -> CliResult {
    let category = session
        .state()
        .settings
        .category(id)
        .cloned()
        .ok_or_else(|| format!("unknown category: {} (see `categories`)", id))?;
    session.dispatch(Action::CategorySelected(category.id))?;
    println!("Category set to {}", category.name);
    Ok(())
}

pub fn run_plans<S: Store>(session: &Session<S>) {
    let state = session.state();
    let current = state.user.as_ref().map(|u| u.plan.as_str());
    println!("{:<3}{:<10}  {:<12}  {:>8}  {:>8}", "", "ID", "Name", "Price", "Messages");
    for plan in &state.settings.plans {
        let marker = if current.is_some_and(|p| p.eq_ignore_ascii_case(&plan.id)) {
            "*"
        } else {
            ""
        };
        println!(
            "{:<3}{:<10}  {:<12}  {:>8}  {:>8}",
            marker, plan.id, plan.name, plan.price, plan.message_limit
        );
    }
    if let Some(user) = &state.user {
        let upgrades = state.settings.upgrades_from(user.message_limit);
        if !upgrades.is_empty() {
            let ids: Vec<&str> = upgrades.iter().map(|p| p.id.as_str()).collect();
            println!("\nUpgrade with: upgrade <{}>", ids.join("|"));
        }
    }
}

/// Open the payment page for `plan_id` and poll until the payment settles, times out,
/// or Ctrl+C cancels it.
pub async fn run_upgrade<S: Store>(
    config: &Config,
    session: &mut Session<S>,
    plan_id: &str,
    no_open: bool,
) -> CliResult {
    let user = require_user(session)?;
    let plan = session
        .state()
        .settings
        .plan(plan_id)
        .cloned()
        .ok_or_else(|| format!("unknown plan: {} (see `plans`)", plan_id))?;
    if plan.message_limit <= user.message_limit {
        return Err(format!(
            "{} allows {} messages; you already have {}",
            plan.name, plan.message_limit, user.message_limit
        )
        .into());
    }

    let client = RelayClient::new(config)?;
    let payment = client.initiate_payment(&user, &plan).await?;
    println!("Payment page: {}", payment.url);
    if !no_open && let Err(e) = opener::open(&payment.url) {
        log::warn!("Could not open browser: {}", e);
    }
    println!("Waiting for payment confirmation (Ctrl+C to stop)...");

    let cancel = CancellationToken::new();
    let interrupt_watch = cancel_on_interrupt(cancel.clone());

    let transaction_id = payment.transaction_id.as_str();
    let client_ref = &client;
    let outcome = PaymentPoller::new(config.payment_poll_attempts)
        .run(config.payment_poll_interval, cancel, move || {
            client_ref.payment_status(transaction_id)
        })
        .await;
    interrupt_watch.abort();

    match outcome {
        PollOutcome::Succeeded => {
            session.dispatch(Action::PlanUpgraded(plan.clone()))?;
            println!(
                "Payment confirmed. You are now on {} ({} messages).",
                plan.name, plan.message_limit
            );
            Ok(())
        }
        PollOutcome::Failed(message) => Err(format!(
            "payment failed: {}",
            message.unwrap_or_else(|| "no reason given".to_string())
        )
        .into()),
        PollOutcome::TimedOut => Err(
            "payment not confirmed in time; run `status` later or retry `upgrade`".into(),
        ),
        PollOutcome::Cancelled => {
            println!("Stopped waiting. The payment may still complete.");
            Ok(())
        }
    }
}

/// Apply a transaction message as the payment page would post it.
pub fn run_payment_callback<S: Store>(
    config: &Config,
    session: &mut Session<S>,
    origin: &str,
    plan_id: &str,
    data: &str,
) -> CliResult {
    require_user(session)?;
    let Some(payload) = payment::accept_transaction_message(origin, data, &config.payment_origins)
    else {
        println!("Ignored: not a transaction message from an allowed origin.");
        return Ok(());
    };
    let status = payload.status();
    if status.is_success() {
        let plan = session
            .state()
            .settings
            .plan(plan_id)
            .cloned()
            .ok_or_else(|| format!("unknown plan: {}", plan_id))?;
        session.dispatch(Action::PlanUpgraded(plan.clone()))?;
        println!("Payment confirmed. You are now on {}.", plan.name);
    } else if status.is_failure() {
        println!(
            "Payment failed: {}",
            payload.message.as_deref().unwrap_or("no reason given")
        );
    } else {
        println!("Payment pending.");
    }
    Ok(())
}

pub fn run_new<S: Store>(session: &mut Session<S>) -> CliResult {
    let had_messages = !session.state().transcript.is_empty();
    session.dispatch(Action::ConversationStarted)?;
    if had_messages {
        println!("Conversation saved. Started a new one.");
    } else {
        println!("Started a new conversation.");
    }
    Ok(())
}

pub fn run_history_list<S: Store>(session: &Session<S>, limit: Option<usize>, query: Option<&str>) {
    let saved = &session.state().saved;
    let filtered = history::filter(saved, query.unwrap_or(""));
    if filtered.is_empty() {
        println!("No saved conversations.");
        return;
    }
    let take = limit.unwrap_or(filtered.len());
    for c in filtered.into_iter().take(take) {
        let position = saved
            .iter()
            .position(|s| s.id == c.id)
            .map(|i| i + 1)
            .unwrap_or(0);
        println!(
            "{}\t{}\t{}\t{}\t{}",
            position,
            &c.id[..c.id.len().min(8)],
            c.saved_at.format("%Y-%m-%d %H:%M"),
            c.category.as_deref().unwrap_or("-"),
            c.title
        );
    }
}

fn resolve_id<S: Store>(session: &Session<S>, selector: &str) -> Result<String, String> {
    history::resolve(&session.state().saved, selector)
        .map(|c| c.id.clone())
        .ok_or_else(|| format!("no saved conversation matches {:?}", selector))
}

pub fn run_history_show<S: Store>(session: &Session<S>, selector: &str) -> CliResult {
    let conversation = history::resolve(&session.state().saved, selector)
        .ok_or_else(|| format!("no saved conversation matches {:?}", selector))?;
    println!("# {}", conversation.title);
    for message in &conversation.messages {
        let label = if message.is_user { "You" } else { "Assistant" };
        println!("\n[{} {}]", label, message.timestamp.format("%H:%M"));
        if message.is_user {
            println!("{}", message.content);
        } else {
            println!("{}", PreparedContent::new(&message.content).text);
        }
    }
    Ok(())
}

pub fn run_history_restore<S: Store>(session: &mut Session<S>, selector: &str) -> CliResult {
    let id = resolve_id(session, selector)?;
    session.dispatch(Action::ConversationRestored(id))?;
    println!(
        "Restored ({} messages).",
        session.state().transcript.len()
    );
    Ok(())
}

pub fn run_history_delete<S: Store>(session: &mut Session<S>, selector: &str) -> CliResult {
    let id = resolve_id(session, selector)?;
    session.dispatch(Action::ConversationDeleted(id))?;
    println!("Deleted.");
    Ok(())
}

pub fn run_history_clear<S: Store>(session: &mut Session<S>) -> CliResult {
    session.dispatch(Action::HistoryCleared)?;
    println!("History cleared.");
    Ok(())
}

pub fn run_theme<S: Store>(session: &mut Session<S>, value: Option<&str>) -> CliResult {
    match value {
        None => {}
        Some(v) if v.eq_ignore_ascii_case("toggle") => session.dispatch(Action::ThemeToggled)?,
        Some(v) => {
            let theme =
                Theme::parse(v).ok_or_else(|| format!("unknown theme: {} (light, dark, toggle)", v))?;
            session.dispatch(Action::ThemeSet(theme))?;
        }
    }
    println!("Theme: {}", session.state().theme.name());
    Ok(())
}

pub fn run_settings_show<S: Store>(session: &Session<S>) -> CliResult {
    println!("{}", serde_json::to_string_pretty(&session.state().settings)?);
    Ok(())
}

pub fn run_settings_import<S: Store>(session: &mut Session<S>, path: &Path) -> CliResult {
    let settings = Settings::from_file(path)?;
    let summary = format!(
        "{} categories, {} prompts, {} plans",
        settings.categories.len(),
        settings.prompts.len(),
        settings.plans.len()
    );
    session.dispatch(Action::SettingsImported(settings))?;
    println!("Settings imported: {}", summary);
    Ok(())
}

pub fn run_settings_reset<S: Store>(session: &mut Session<S>) -> CliResult {
    session.dispatch(Action::SettingsReset)?;
    println!("Settings restored to defaults.");
    Ok(())
}

/// Report what the reply pipeline makes of a raw relay body.
pub fn run_inspect(body: &str) {
    let response = RelayResponse::from_body(body);
    let reply = content::extract_reply(&response);
    let prepared = PreparedContent::new(&reply.content);
    let flags = prepared.flags.names();

    println!("Shape:          {}", response.kind());
    println!(
        "Counts quota:   {}",
        if reply.counts_against_quota { "yes" } else { "no" }
    );
    println!(
        "Flags:          {}",
        if flags.is_empty() {
            "none".to_string()
        } else {
            flags.join(", ")
        }
    );
    let mut actions = Vec::new();
    if prepared.flags.offers_copy_code() {
        actions.push("copy-code");
    }
    if prepared.flags.offers_preview() {
        actions.push("preview");
    }
    println!(
        "Actions:        {}",
        if actions.is_empty() {
            "none".to_string()
        } else {
            actions.join(", ")
        }
    );
    for segment in prepared.segments() {
        match segment {
            RenderedSegment::Prose(lines) => {
                println!("--- prose ({} lines)", lines.len());
            }
            RenderedSegment::Code(block) => {
                println!("--- code ({})", block.lang.unwrap_or("untagged"));
            }
        }
    }
    println!("---\n{}", prepared.text);
}

/// Run the `config` command: display paths and relay settings.
pub fn run_config() {
    let show = |p: Option<std::path::PathBuf>| {
        p.map(|p| p.display().to_string())
            .unwrap_or_else(|| "-".to_string())
    };
    println!("Config:        {}", show(paths::config_dir()));
    println!("Cache:         {}", show(paths::cache_dir()));
    println!("Data:          {}", show(paths::data_dir()));
    match config::load() {
        Ok(c) => {
            println!("Relay base:    {}", c.webhook_base);
            println!("Timeout:       {}s", c.request_timeout.as_secs());
            println!(
                "Payment poll:  every {}s, {} attempts",
                c.payment_poll_interval.as_secs(),
                c.payment_poll_attempts
            );
            println!("Pay origins:   {}", c.payment_origins.join(", "));
        }
        Err(e) => println!("Relay base:    {}", e),
    }
}

/// Cancel `cancel` on ctrl-c. Abort the returned handle once the wait is over.
fn cancel_on_interrupt(cancel: CancellationToken) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            cancel.cancel();
        }
    })
}
