#![cfg_attr(not(target_os = "windows"), allow(dead_code))]

use bangerauto_core::StopSignal;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use std::sync::Arc;
use std::sync::mpsc::Sender;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::debug;

/// Host command produced by a key press or Ctrl+C.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Toggle,
    Reload,
    Quit,
}

/// Spawn a thread that turns key presses into [`Command`]s.
///
/// - Space or Enter toggles autoplay
/// - `r` reloads the version table
/// - Esc, `q` or Ctrl+C quits
///
/// The thread exits after sending `Quit`, when the receiver is gone, or
/// once `shutdown` is triggered.
pub fn spawn_keyboard_monitor(
    commands: Sender<Command>,
    shutdown: Arc<StopSignal>,
) -> JoinHandle<()> {
    thread::spawn(move || {
        debug!("Keyboard monitor started");

        while !shutdown.is_triggered() {
            // Poll with a timeout to allow checking shutdown state
            if event::poll(Duration::from_millis(100)).unwrap_or(false)
                && let Ok(Event::Key(key_event)) = event::read()
                && let Some(command) = command_for(&key_event)
            {
                debug!("Key {:?} -> {:?}", key_event.code, command);
                if commands.send(command).is_err() || command == Command::Quit {
                    break;
                }
            }
        }

        debug!("Keyboard monitor stopped");
    })
}

/// Map a key event to a command. Key releases and repeats are ignored.
fn command_for(event: &KeyEvent) -> Option<Command> {
    if event.kind != KeyEventKind::Press {
        return None;
    }

    match event.code {
        KeyCode::Esc => Some(Command::Quit),
        KeyCode::Char('q') | KeyCode::Char('Q') => Some(Command::Quit),
        KeyCode::Char('c') if event.modifiers.contains(KeyModifiers::CONTROL) => {
            Some(Command::Quit)
        }
        KeyCode::Char(' ') | KeyCode::Enter => Some(Command::Toggle),
        KeyCode::Char('r') | KeyCode::Char('R') => Some(Command::Reload),
        _ => None,
    }
}
