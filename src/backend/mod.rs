//! Protocol primitives consumed by the focus core
//!
//! The focus core never talks to the display server directly. Everything it
//! needs (input focus assignment, take-focus messages, passive button grabs,
//! event selection, pointer release) goes through [`FocusBackend`], so the
//! same state machine drives an X11 connection, an XWayland bridge, or a
//! recording backend under test.

use crate::client::ClientId;
use crate::timestamp::Timestamp;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

/// Failures reported by the protocol layer
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BackendError {
    /// The window was destroyed between decision and application.
    /// Always benign for the focus core.
    #[error("window for {0} no longer exists")]
    WindowGone(ClientId),

    /// Any other protocol-level failure
    #[error("protocol request failed: {0}")]
    Protocol(String),
}

impl BackendError {
    pub fn is_benign(&self) -> bool {
        matches!(self, BackendError::WindowGone(_))
    }
}

/// Which pointer buttons a click-to-focus grab covers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ButtonSelection {
    /// Primary button only
    Primary,
    /// Any button
    Any,
}

/// Where server-level keyboard focus is sent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputTarget {
    /// No window; keyboard input is discarded
    None,
    /// Whatever window is under the pointer receives keyboard input
    PointerRoot,
    /// A managed client window
    Client(ClientId),
}

impl InputTarget {
    pub fn client(self) -> Option<ClientId> {
        match self {
            InputTarget::Client(id) => Some(id),
            InputTarget::None | InputTarget::PointerRoot => None,
        }
    }
}

/// Event classes the focus core needs delivered for a client window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EventSelection {
    /// FocusIn / FocusOut
    pub focus_change: bool,
    /// EnterNotify / LeaveNotify, needed for focus-follows-mouse
    pub pointer_crossing: bool,
}

/// Display-server operations the focus core depends on.
#[cfg_attr(test, mockall::automock)]
pub trait FocusBackend {
    /// Assign server-level input focus.
    fn set_input_focus(&mut self, target: InputTarget, time: Timestamp)
        -> Result<(), BackendError>;

    /// Send the take-focus protocol message to a client.
    fn send_take_focus(&mut self, client: ClientId, time: Timestamp) -> Result<(), BackendError>;

    /// Install a passive click-to-focus button grab on a client window.
    fn grab_button(&mut self, client: ClientId, buttons: ButtonSelection)
        -> Result<(), BackendError>;

    /// Remove the passive button grab from a client window.
    fn ungrab_button(&mut self, client: ClientId) -> Result<(), BackendError>;

    /// Select which events the server reports for a client window.
    fn select_events(&mut self, client: ClientId, selection: EventSelection)
        -> Result<(), BackendError>;

    /// Thaw the pointer frozen by a click grab. With `replay` the click is
    /// delivered to the client, otherwise it is swallowed.
    fn release_pointer(&mut self, time: Timestamp, replay: bool) -> Result<(), BackendError>;

    /// Observer hook invoked after every focus owner change.
    fn focus_changed(&mut self, previous: Option<ClientId>, current: Option<ClientId>);
}

/// Backend used by the replay binary: logs every request and keeps
/// the server-side focus owner for reporting.
#[derive(Debug, Default)]
pub struct LoggingBackend {
    server_focus: Option<ClientId>,
    grabbed: HashSet<ClientId>,
}

impl LoggingBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn server_focus(&self) -> Option<ClientId> {
        self.server_focus
    }

    pub fn grabbed(&self) -> Vec<ClientId> {
        let mut grabbed: Vec<ClientId> = self.grabbed.iter().copied().collect();
        grabbed.sort();
        grabbed
    }
}

impl FocusBackend for LoggingBackend {
    fn set_input_focus(
        &mut self,
        target: InputTarget,
        time: Timestamp,
    ) -> Result<(), BackendError> {
        match target {
            InputTarget::Client(client) => debug!("SetInputFocus {} @ {}", client, time),
            InputTarget::PointerRoot => debug!("SetInputFocus PointerRoot @ {}", time),
            InputTarget::None => debug!("SetInputFocus None @ {}", time),
        }
        self.server_focus = target.client();
        Ok(())
    }

    fn send_take_focus(&mut self, client: ClientId, time: Timestamp) -> Result<(), BackendError> {
        debug!("WM_TAKE_FOCUS -> {} @ {}", client, time);
        Ok(())
    }

    fn grab_button(
        &mut self,
        client: ClientId,
        buttons: ButtonSelection,
    ) -> Result<(), BackendError> {
        debug!("GrabButton {:?} on {}", buttons, client);
        self.grabbed.insert(client);
        Ok(())
    }

    fn ungrab_button(&mut self, client: ClientId) -> Result<(), BackendError> {
        debug!("UngrabButton on {}", client);
        self.grabbed.remove(&client);
        Ok(())
    }

    fn select_events(
        &mut self,
        client: ClientId,
        selection: EventSelection,
    ) -> Result<(), BackendError> {
        debug!("SelectInput {:?} on {}", selection, client);
        Ok(())
    }

    fn release_pointer(&mut self, time: Timestamp, replay: bool) -> Result<(), BackendError> {
        let mode = if replay { "ReplayPointer" } else { "AsyncPointer" };
        debug!("AllowEvents {} @ {}", mode, time);
        Ok(())
    }

    fn focus_changed(&mut self, previous: Option<ClientId>, current: Option<ClientId>) {
        info!("Focus moved {:?} -> {:?}", previous, current);
    }
}

/// A single request observed by [`RecordingBackend`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendCall {
    SetInputFocus(InputTarget, Timestamp),
    TakeFocus(ClientId, Timestamp),
    Grab(ClientId, ButtonSelection),
    Ungrab(ClientId),
    SelectEvents(ClientId, EventSelection),
    ReleasePointer(Timestamp, bool),
    FocusChanged(Option<ClientId>, Option<ClientId>),
}

/// In-memory backend that records requests, for tests and embedders that
/// want to inspect what the focus core asked for.
///
/// Windows marked with [`RecordingBackend::mark_gone`] fail every request
/// with [`BackendError::WindowGone`], simulating a destroy racing a request.
#[derive(Debug, Default)]
pub struct RecordingBackend {
    calls: Vec<BackendCall>,
    gone: HashSet<ClientId>,
    grabbed: HashSet<ClientId>,
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> &[BackendCall] {
        &self.calls
    }

    pub fn take_calls(&mut self) -> Vec<BackendCall> {
        std::mem::take(&mut self.calls)
    }

    pub fn mark_gone(&mut self, client: ClientId) {
        self.gone.insert(client);
    }

    /// Whether the server currently holds a button grab for `client`
    pub fn has_grab(&self, client: ClientId) -> bool {
        self.grabbed.contains(&client)
    }

    /// Number of grab installations requested for `client`
    pub fn grab_count(&self, client: ClientId) -> usize {
        self.calls
            .iter()
            .filter(|call| matches!(call, BackendCall::Grab(c, _) if *c == client))
            .count()
    }

    /// Most recent server-level focus assignment
    pub fn last_input_focus(&self) -> Option<(InputTarget, Timestamp)> {
        self.calls.iter().rev().find_map(|call| match call {
            BackendCall::SetInputFocus(target, time) => Some((*target, *time)),
            _ => None,
        })
    }

    fn check(&self, client: ClientId) -> Result<(), BackendError> {
        if self.gone.contains(&client) {
            Err(BackendError::WindowGone(client))
        } else {
            Ok(())
        }
    }
}

impl FocusBackend for RecordingBackend {
    fn set_input_focus(
        &mut self,
        target: InputTarget,
        time: Timestamp,
    ) -> Result<(), BackendError> {
        if let Some(client) = target.client() {
            self.check(client)?;
        }
        self.calls.push(BackendCall::SetInputFocus(target, time));
        Ok(())
    }

    fn send_take_focus(&mut self, client: ClientId, time: Timestamp) -> Result<(), BackendError> {
        self.check(client)?;
        self.calls.push(BackendCall::TakeFocus(client, time));
        Ok(())
    }

    fn grab_button(
        &mut self,
        client: ClientId,
        buttons: ButtonSelection,
    ) -> Result<(), BackendError> {
        self.check(client)?;
        self.calls.push(BackendCall::Grab(client, buttons));
        self.grabbed.insert(client);
        Ok(())
    }

    fn ungrab_button(&mut self, client: ClientId) -> Result<(), BackendError> {
        self.check(client)?;
        self.calls.push(BackendCall::Ungrab(client));
        self.grabbed.remove(&client);
        Ok(())
    }

    fn select_events(
        &mut self,
        client: ClientId,
        selection: EventSelection,
    ) -> Result<(), BackendError> {
        self.check(client)?;
        self.calls.push(BackendCall::SelectEvents(client, selection));
        Ok(())
    }

    fn release_pointer(&mut self, time: Timestamp, replay: bool) -> Result<(), BackendError> {
        self.calls.push(BackendCall::ReleasePointer(time, replay));
        Ok(())
    }

    fn focus_changed(&mut self, previous: Option<ClientId>, current: Option<ClientId>) {
        self.calls.push(BackendCall::FocusChanged(previous, current));
    }
}
