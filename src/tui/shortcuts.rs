//! Centralized keyboard shortcuts.
//!
//! Complete reference:
//!
//! | Action         | Keys                                     |
//! |----------------|------------------------------------------|
//! | Send           | Enter                                    |
//! | Scroll         | ↑ ↓ PageUp PageDown                      |
//! | History        | Alt+H, Esc+h (Option as meta), Mac chars |
//! | Account        | Alt+A, Esc+a                             |
//! | Upgrade        | Alt+U, Esc+u                             |
//! | Category       | Ctrl+K                                   |
//! | New conv       | Ctrl+N                                   |
//! | Theme          | Ctrl+T                                   |
//! | Copy code      | Ctrl+Y                                   |
//! | Preview        | Ctrl+P                                   |
//! | Quit           | Ctrl+C                                   |
//!
//! On macOS, Option+key can send:
//! - Esc+key if terminal has "Use option as meta key" enabled
//! - A special character (˙, Ì) if Option is in normal mode

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

/// Detected shortcut.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shortcut {
    /// Saved conversations (Alt+H, Esc+h)
    History,
    /// Sign in, register, or sign out (Alt+A, Esc+a)
    Account,
    /// Plans and payment (Alt+U, Esc+u)
    Upgrade,
    /// Category picker (Ctrl+K)
    Category,
    /// New conversation (Ctrl+N)
    NewConversation,
    /// Toggle light/dark theme (Ctrl+T)
    ToggleTheme,
    /// Copy code from the last reply (Ctrl+Y)
    CopyCode,
    /// Preview HTML/visual code from the last reply (Ctrl+P)
    Preview,
    /// Quit (Ctrl+C)
    Quit,
}

/// Characters produced by Option+H on Mac (Option not configured as Meta).
const MAC_OPTION_H: &[char] = &['\u{00CC}', '\u{02D9}', '\u{0127}', '\u{0302}']; // Ì, ˙, ħ, ̂

fn is_mac_option_h(c: char) -> bool {
    MAC_OPTION_H.contains(&c)
}

impl Shortcut {
    /// Returns the shortcut if the key matches. Handles Esc+key sequence when terminal
    /// sends Option as Meta (e.g. macOS "Use option as meta key").
    pub fn match_key(key: &KeyEvent, escape_pending: bool) -> Option<Shortcut> {
        if key.kind != KeyEventKind::Press {
            return None;
        }

        if escape_pending {
            return match key.code {
                KeyCode::Char('h') => Some(Shortcut::History),
                KeyCode::Char('a') => Some(Shortcut::Account),
                KeyCode::Char('u') => Some(Shortcut::Upgrade),
                _ => None,
            };
        }

        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        let alt = key.modifiers.contains(KeyModifiers::ALT);
        match key.code {
            KeyCode::Char('c') if ctrl => Some(Shortcut::Quit),
            KeyCode::Char('n') if ctrl => Some(Shortcut::NewConversation),
            KeyCode::Char('k') if ctrl => Some(Shortcut::Category),
            KeyCode::Char('t') if ctrl => Some(Shortcut::ToggleTheme),
            KeyCode::Char('y') if ctrl => Some(Shortcut::CopyCode),
            KeyCode::Char('p') if ctrl => Some(Shortcut::Preview),
            KeyCode::Char('h') if alt => Some(Shortcut::History),
            KeyCode::Char('a') if alt => Some(Shortcut::Account),
            KeyCode::Char('u') if alt => Some(Shortcut::Upgrade),
            KeyCode::Char(c) if is_mac_option_h(c) => Some(Shortcut::History),
            _ => None,
        }
    }

    /// True if key is Escape (start of Option+key sequence on some terminals).
    pub fn is_escape(key: &KeyEvent) -> bool {
        key.kind == KeyEventKind::Press && key.code == KeyCode::Esc
    }
}

#[cfg(test)]
mod tests {
    use super::Shortcut;
    use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyEventState, KeyModifiers};

    fn key(code: KeyCode, modifiers: KeyModifiers) -> KeyEvent {
        KeyEvent {
            code,
            modifiers,
            kind: KeyEventKind::Press,
            state: KeyEventState::empty(),
        }
    }

    #[test]
    fn is_escape() {
        assert!(Shortcut::is_escape(&key(
            KeyCode::Esc,
            KeyModifiers::empty()
        )));
        assert!(!Shortcut::is_escape(&key(
            KeyCode::Char('c'),
            KeyModifiers::empty()
        )));
    }

    #[test]
    fn match_ctrl_shortcuts() {
        let cases = [
            ('c', Shortcut::Quit),
            ('n', Shortcut::NewConversation),
            ('k', Shortcut::Category),
            ('t', Shortcut::ToggleTheme),
            ('y', Shortcut::CopyCode),
            ('p', Shortcut::Preview),
        ];
        for (c, expected) in cases {
            assert_eq!(
                Shortcut::match_key(&key(KeyCode::Char(c), KeyModifiers::CONTROL), false),
                Some(expected),
                "Ctrl+{}",
                c
            );
        }
    }

    #[test]
    fn match_history_alt_h() {
        assert_eq!(
            Shortcut::match_key(&key(KeyCode::Char('h'), KeyModifiers::ALT), false),
            Some(Shortcut::History)
        );
        assert_eq!(
            Shortcut::match_key(&key(KeyCode::Char('\u{02D9}'), KeyModifiers::empty()), false),
            Some(Shortcut::History)
        );
    }

    #[test]
    fn match_escape_pending() {
        assert_eq!(
            Shortcut::match_key(&key(KeyCode::Char('a'), KeyModifiers::empty()), true),
            Some(Shortcut::Account)
        );
        assert_eq!(
            Shortcut::match_key(&key(KeyCode::Char('u'), KeyModifiers::empty()), true),
            Some(Shortcut::Upgrade)
        );
        assert_eq!(
            Shortcut::match_key(&key(KeyCode::Char('x'), KeyModifiers::empty()), true),
            None
        );
    }

    #[test]
    fn match_no_shortcut() {
        assert_eq!(
            Shortcut::match_key(&key(KeyCode::Char('k'), KeyModifiers::empty()), false),
            None
        );
    }

    #[test]
    fn match_key_release_ignored() {
        let key_release = KeyEvent {
            code: KeyCode::Char('c'),
            modifiers: KeyModifiers::CONTROL,
            kind: KeyEventKind::Release,
            state: KeyEventState::empty(),
        };
        assert_eq!(Shortcut::match_key(&key_release, false), None);
    }
}

/// Labels for the bottom bar (2 lines for readability on narrow terminals).
pub mod labels {
    use ratatui::style::Color;
    use ratatui::text::{Line, Span, Text};

    const DIM: Color = Color::DarkGray;

    pub fn bottom_bar(is_waiting: bool, offers_copy: bool, offers_preview: bool) -> Text<'static> {
        if is_waiting {
            return Text::from(Line::from(vec![
                Span::styled("Esc ", Color::Yellow),
                Span::raw("cancel"),
                Span::styled("  ↑↓ ", DIM),
                Span::raw("scroll"),
            ]));
        }
        let mut second = vec![
            Span::styled("Alt+H ", DIM),
            Span::raw("history"),
            Span::styled("  Ctrl+N ", DIM),
            Span::raw("new"),
            Span::styled("  Alt+A ", DIM),
            Span::raw("account"),
            Span::styled("  Alt+U ", DIM),
            Span::raw("upgrade"),
        ];
        if offers_copy {
            second.push(Span::styled("  Ctrl+Y ", Color::Yellow));
            second.push(Span::raw("copy code"));
        }
        if offers_preview {
            second.push(Span::styled("  Ctrl+P ", Color::Yellow));
            second.push(Span::raw("preview"));
        }
        second.push(Span::styled("  Ctrl+C ", DIM));
        second.push(Span::raw("quit"));
        Text::from(vec![
            Line::from(vec![
                Span::styled("Enter ", DIM),
                Span::raw("send"),
                Span::styled("  Tab ", DIM),
                Span::raw("suggestion"),
                Span::styled("  Ctrl+K ", DIM),
                Span::raw("category"),
                Span::styled("  Ctrl+T ", DIM),
                Span::raw("theme"),
                Span::styled("  ↑↓ ", DIM),
                Span::raw("scroll"),
            ]),
            Line::from(second),
        ])
    }
}
