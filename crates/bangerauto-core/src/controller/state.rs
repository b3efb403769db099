use serde::Serialize;
use strum::{Display, IntoStaticStr};

/// Controller lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Display, IntoStaticStr)]
pub enum ControllerState {
    #[default]
    Idle,
    Scanning,
    Autoplay,
}

impl ControllerState {
    pub fn is_running(&self) -> bool {
        !matches!(self, ControllerState::Idle)
    }
}

/// User-visible status line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Display, IntoStaticStr)]
pub enum Status {
    #[default]
    #[strum(serialize = "Ready")]
    NotStarted,
    #[strum(serialize = "Game not found")]
    ProcessNotFound,
    #[strum(serialize = "Getting game version")]
    DetectingVersion,
    #[strum(serialize = "Version isn't supported")]
    UnsupportedVersion,
    #[strum(serialize = "Starting parallel scan...")]
    Scanning,
    #[strum(serialize = "Autoplay is active")]
    AutoplayActive,
    #[strum(serialize = "Addresses not found")]
    AddressesNotFound,
    #[strum(serialize = "Game was closed")]
    ProcessClosed,
    #[strum(serialize = "Stopped")]
    Idle,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        self.into()
    }
}

/// Outcome of the last version file load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Display, IntoStaticStr)]
pub enum ConfigStatus {
    #[default]
    #[strum(serialize = "Config not loaded")]
    NotLoaded,
    #[strum(serialize = "Config loaded")]
    Loaded,
    #[strum(serialize = "Config file not found")]
    FileNotFound,
    #[strum(serialize = "Config load failed")]
    LoadFailed,
}

/// Read-only projection of the controller for a presentation layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusSnapshot {
    pub state: ControllerState,
    pub status: Status,
    /// Display name of the detected game build
    pub version: String,
    pub config: ConfigStatus,
}

/// Notification pushed to subscribers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusEvent {
    Changed(StatusSnapshot),
    /// The host should run its update check and then call `update_finished`.
    UpdateCheckRequested,
}

/// Update-check gate in front of a start from `Idle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UpdateGate {
    /// No update check configured.
    #[default]
    Disabled,
    /// A check is required before the next start.
    Required,
    /// A check was requested and has not finished yet.
    Pending,
    /// The check for this start has run.
    Passed,
}

impl UpdateGate {
    pub fn new(required: bool) -> Self {
        if required {
            UpdateGate::Required
        } else {
            UpdateGate::Disabled
        }
    }

    /// Gate for the start after a stop.
    fn rearm(self) -> Self {
        match self {
            UpdateGate::Disabled => UpdateGate::Disabled,
            _ => UpdateGate::Required,
        }
    }
}

/// Command fed into the state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Input {
    Toggle,
    UpdateFinished,
    Stop,
}

/// Action the controller must perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    RequestUpdateCheck,
    StartScan,
    ResumeAutoplay,
    Stop,
    Ignore,
}

/// Result of [`transition`]: the action plus the gate to store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Step {
    pub action: Transition,
    pub gate: UpdateGate,
}

/// Pure transition function of the controller.
///
/// `resumable` is only consulted when a start is about to happen and answers
/// whether the stored addresses still belong to the running process.
pub fn transition<F>(state: ControllerState, gate: UpdateGate, input: Input, resumable: F) -> Step
where
    F: FnOnce() -> bool,
{
    let start = |gate: UpdateGate| Step {
        action: if resumable() {
            Transition::ResumeAutoplay
        } else {
            Transition::StartScan
        },
        gate,
    };
    let ignore = Step {
        action: Transition::Ignore,
        gate,
    };

    match (state, input) {
        (ControllerState::Idle, Input::Toggle) => match gate {
            UpdateGate::Required => Step {
                action: Transition::RequestUpdateCheck,
                gate: UpdateGate::Pending,
            },
            // A second toggle while the check runs does not wait for it.
            UpdateGate::Pending => start(UpdateGate::Passed),
            UpdateGate::Disabled | UpdateGate::Passed => start(gate),
        },
        (ControllerState::Idle, Input::UpdateFinished) if gate == UpdateGate::Pending => {
            start(UpdateGate::Passed)
        }
        (ControllerState::Idle, _) => ignore,
        (_, Input::Toggle | Input::Stop) => Step {
            action: Transition::Stop,
            gate: gate.rearm(),
        },
        (_, Input::UpdateFinished) => ignore,
    }
}
