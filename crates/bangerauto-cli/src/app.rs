#![cfg_attr(not(target_os = "windows"), allow(dead_code))]

use anyhow::{Context, Result};
use bangerauto_core::prelude::*;
use bangerauto_core::StopSignal;
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::input::{self, Command};

const COMMAND_POLL: Duration = Duration::from_millis(50);

/// Run the interactive host until the user quits.
pub fn run<P: ProcessProvider>(provider: P, settings: Settings) -> Result<()> {
    let source = JsonVersionFile::new(settings.versions_path.clone());
    info!("Version file: {}", source.path().display());

    let controller = AutoplayController::new(provider, settings, Box::new(source));
    let events = controller.subscribe();
    println!("{}", format_status(&controller.status()));

    let (commands, command_rx) = mpsc::channel();
    let shutdown = Arc::new(StopSignal::new());

    let ctrlc_commands = commands.clone();
    ctrlc::set_handler(move || {
        let _ = ctrlc_commands.send(Command::Quit);
    })
    .context("Failed to set Ctrl+C handler")?;

    let keyboard = input::spawn_keyboard_monitor(commands, Arc::clone(&shutdown));
    println!("Space/Enter: toggle autoplay | R: reload versions | Esc/Q: quit");

    loop {
        drain_events(&controller, &events);

        match command_rx.recv_timeout(COMMAND_POLL) {
            Ok(Command::Toggle) => controller.toggle(),
            Ok(Command::Reload) => match controller.reload_versions() {
                Ok(count) => info!("Reloaded {} game versions", count),
                Err(e) => warn!("Reload failed, keeping previous versions: {}", e),
            },
            Ok(Command::Quit) | Err(RecvTimeoutError::Disconnected) => break,
            Err(RecvTimeoutError::Timeout) => {}
        }
    }

    info!("Shutting down...");
    controller.stop();
    drain_events(&controller, &events);
    shutdown.trigger();
    if keyboard.join().is_err() {
        debug!("Keyboard monitor panicked");
    }

    Ok(())
}

fn drain_events<P: ProcessProvider>(
    controller: &AutoplayController<P>,
    events: &Receiver<StatusEvent>,
) {
    while let Ok(event) = events.try_recv() {
        match event {
            StatusEvent::Changed(snapshot) => println!("{}", format_status(&snapshot)),
            StatusEvent::UpdateCheckRequested => {
                // No remote check is wired in; release the gate right away.
                debug!("Update check requested");
                controller.update_finished();
            }
        }
    }
}

/// One status line: `[state] status | version | config`.
fn format_status(snapshot: &StatusSnapshot) -> String {
    format!(
        "[{}] {} | version: {} | {}",
        snapshot.state, snapshot.status, snapshot.version, snapshot.config
    )
}
