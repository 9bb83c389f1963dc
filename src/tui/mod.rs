//! TUI (Text User Interface) for chatting with the relay, managing the account and history.

mod app;
mod constants;
mod draw;
mod handlers;
mod shortcuts;
mod text;

use crossterm::event::{self, Event};
use crossterm::execute;
use std::io;
use std::sync::Arc;
use std::time::Duration;

use tokio::runtime::Runtime;

use crate::core::config::Config;
use crate::core::relay::RelayClient;
use crate::core::state::Session;
use crate::core::store::FileStore;

use app::App;
use draw::draw;
use handlers::{HandleResult, Pending};

/// Guard that restores terminal state on drop (including on panic).
struct TerminalGuard;

impl TerminalGuard {
    fn new() -> Self {
        Self
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        use crossterm::terminal::{LeaveAlternateScreen, disable_raw_mode};
        let _ = execute!(
            std::io::stdout(),
            crossterm::event::PopKeyboardEnhancementFlags
        );
        let _ = disable_raw_mode();
        let _ = execute!(std::io::stdout(), crossterm::event::DisableMouseCapture);
        let _ = execute!(std::io::stdout(), LeaveAlternateScreen);
    }
}

/// Wait briefly for the key that follows Esc (terminals send Option+key as Esc, key).
fn drain_escape_sequence(app: &mut App) -> io::Result<Option<event::KeyEvent>> {
    let step_ms = 25u64;
    let mut elapsed = 0u64;
    while elapsed < constants::ESC_SEQUENCE_DRAIN_MS {
        if event::poll(Duration::from_millis(step_ms))? {
            match event::read()? {
                Event::Key(next) => return Ok(Some(next)),
                Event::Mouse(m) => {
                    let _ = handlers::handle_mouse(m, app);
                    return Ok(None);
                }
                _ => {}
            }
        }
        elapsed += step_ms;
    }
    Ok(None)
}

/// Run the TUI loop. Relay calls run on a dedicated Tokio runtime off the UI thread.
pub fn run(config: Config) -> io::Result<()> {
    use crossterm::terminal::{Clear, ClearType, EnterAlternateScreen, enable_raw_mode};
    use ratatui::Terminal;
    use ratatui::backend::CrosstermBackend;

    // Open state and client before touching the terminal so errors print normally.
    let store = FileStore::open_default().map_err(io::Error::other)?;
    let session = Session::open(store).map_err(io::Error::other)?;
    let client = RelayClient::new(&config).map_err(io::Error::other)?;

    let _guard = TerminalGuard::new();

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    execute!(stdout, Clear(ClearType::All))?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let rt = Arc::new(
        Runtime::new().map_err(|e| io::Error::other(format!("Failed to create runtime: {}", e)))?,
    );

    let mut app = App::new(session, config.show_timestamps);
    let mut pending = Pending::default();

    execute!(io::stdout(), crossterm::event::EnableMouseCapture)?;

    // Kitty keyboard protocol: Alt+key as single event with modifier (Ghostty, WezTerm, kitty, etc.)
    let _ = execute!(
        io::stdout(),
        crossterm::event::PushKeyboardEnhancementFlags(
            crossterm::event::KeyboardEnhancementFlags::DISAMBIGUATE_ESCAPE_CODES
                | crossterm::event::KeyboardEnhancementFlags::REPORT_ALTERNATE_KEYS
        )
    );

    log::info!("TUI started");

    loop {
        handlers::poll_background(&mut app, &mut pending);

        terminal.draw(|f| draw(f, &mut app, f.area()))?;

        if !event::poll(Duration::from_millis(constants::EVENT_POLL_TIMEOUT_MS))? {
            continue;
        }
        match event::read()? {
            Event::Mouse(mouse) => {
                let _ = handlers::handle_mouse(mouse, &mut app);
            }
            Event::Key(key) => {
                let key_to_handle = if handlers::would_esc_start_meta_sequence(&key, &app, &pending)
                {
                    match drain_escape_sequence(&mut app)? {
                        Some(next) => {
                            app.escape_pending = true;
                            next
                        }
                        None => key,
                    }
                } else {
                    key
                };
                let result = handlers::handle_key(
                    key_to_handle,
                    handlers::HandleKeyContext {
                        app: &mut app,
                        config: &config,
                        client: &client,
                        pending: &mut pending,
                        rt: &rt,
                    },
                );
                if result == HandleResult::Break {
                    pending.cancel_all();
                    break;
                }
            }
            _ => {}
        }
    }

    log::info!("TUI exited");
    terminal.show_cursor()?;
    Ok(())
}
