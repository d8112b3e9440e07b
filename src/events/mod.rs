//! Window manager notifications fed into the focus core
//!
//! Events are plain serde values so they can arrive over any transport: the
//! replay binary reads them as a JSON array, embedders construct them
//! directly. [`FocusManager::handle_event`] processes one event completely
//! before returning.

use crate::backend::FocusBackend;
use crate::client::{ClientHints, ClientId, ScreenId};
use crate::focus::FocusManager;
use crate::timestamp::Timestamp;
use anyhow::{Context, Result};
use log::trace;
use serde::{Deserialize, Serialize};

/// Direction of an alt-tab cycle step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CycleDirection {
    Next,
    Previous,
}

/// A single notification from the window manager.
///
/// A missing `time` is treated as [`Timestamp::CURRENT`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WmEvent {
    /// A screen came under management
    ScreenAdded {
        screen: ScreenId,
        #[serde(default)]
        workspace: u32,
        #[serde(default)]
        time: Timestamp,
    },

    /// A client window was created and mapped
    ClientCreated {
        client: ClientId,
        screen: ScreenId,
        #[serde(default)]
        hints: ClientHints,
        #[serde(default)]
        time: Timestamp,
    },

    ClientDestroyed {
        client: ClientId,
        #[serde(default)]
        time: Timestamp,
    },

    /// A previously iconified client was mapped again
    ClientMapped {
        client: ClientId,
        #[serde(default)]
        time: Timestamp,
    },

    /// A client was iconified
    ClientUnmapped {
        client: ClientId,
        #[serde(default)]
        time: Timestamp,
    },

    /// Window manager hints of a client changed
    PropertyChanged {
        client: ClientId,
        hints: ClientHints,
        #[serde(default)]
        time: Timestamp,
    },

    ButtonPress {
        client: ClientId,
        #[serde(default)]
        time: Timestamp,
    },

    PointerEnter {
        client: ClientId,
        #[serde(default)]
        time: Timestamp,
    },

    /// Focus change reported by the server
    FocusIn {
        screen: ScreenId,
        #[serde(default)]
        client: Option<ClientId>,
        #[serde(default)]
        time: Timestamp,
    },

    /// Alt-tab step
    CycleFocus {
        screen: ScreenId,
        direction: CycleDirection,
        #[serde(default)]
        time: Timestamp,
    },

    /// Pager or taskbar activation
    ActivateRequest {
        client: ClientId,
        #[serde(default)]
        time: Timestamp,
    },

    WorkspaceSwitched {
        screen: ScreenId,
        workspace: u32,
        #[serde(default)]
        time: Timestamp,
    },

    /// Runtime switch between click-to-focus and focus-follows-mouse
    PolicyChanged {
        click_to_focus: bool,
        #[serde(default)]
        raise_on_click: bool,
        #[serde(default)]
        time: Timestamp,
    },

    Shutdown {
        #[serde(default)]
        time: Timestamp,
    },
}

impl WmEvent {
    /// Event time carried by this notification
    pub fn time(&self) -> Timestamp {
        match self {
            WmEvent::ScreenAdded { time, .. }
            | WmEvent::ClientCreated { time, .. }
            | WmEvent::ClientDestroyed { time, .. }
            | WmEvent::ClientMapped { time, .. }
            | WmEvent::ClientUnmapped { time, .. }
            | WmEvent::PropertyChanged { time, .. }
            | WmEvent::ButtonPress { time, .. }
            | WmEvent::PointerEnter { time, .. }
            | WmEvent::FocusIn { time, .. }
            | WmEvent::CycleFocus { time, .. }
            | WmEvent::ActivateRequest { time, .. }
            | WmEvent::WorkspaceSwitched { time, .. }
            | WmEvent::PolicyChanged { time, .. }
            | WmEvent::Shutdown { time } => *time,
        }
    }

    pub fn is_shutdown(&self) -> bool {
        matches!(self, WmEvent::Shutdown { .. })
    }
}

/// Parse a JSON array of events
pub fn load_script(json: &str) -> Result<Vec<WmEvent>> {
    serde_json::from_str(json).context("Failed to parse event script")
}

impl<B: FocusBackend> FocusManager<B> {
    /// Process one notification to completion
    pub fn handle_event(&mut self, event: WmEvent) {
        trace!("Handling {:?}", event);
        match event {
            WmEvent::ScreenAdded { screen, workspace, time } => {
                self.note_event_time(time);
                self.add_screen(screen, workspace);
            }
            WmEvent::ClientCreated { client, screen, hints, time } => {
                self.client_created(client, screen, hints, time);
            }
            WmEvent::ClientDestroyed { client, time } => self.unmanage_client(client, time),
            WmEvent::ClientMapped { client, time } => self.set_client_visible(client, true, time),
            WmEvent::ClientUnmapped { client, time } => {
                self.set_client_visible(client, false, time);
            }
            WmEvent::PropertyChanged { client, hints, time } => {
                self.update_client_hints(client, hints, time);
            }
            WmEvent::ButtonPress { client, time } => self.button_press(client, time),
            WmEvent::PointerEnter { client, time } => self.pointer_enter(client, time),
            WmEvent::FocusIn { screen, client, time } => self.focus_in(screen, client, time),
            WmEvent::CycleFocus { screen, direction, time } => {
                self.cycle_focus(screen, direction, time);
            }
            WmEvent::ActivateRequest { client, time } => {
                self.activate(client, time);
            }
            WmEvent::WorkspaceSwitched { screen, workspace, time } => {
                self.switch_workspace(screen, workspace, time);
            }
            WmEvent::PolicyChanged { click_to_focus, raise_on_click, time } => {
                self.set_focus_policy(click_to_focus, raise_on_click, time);
            }
            WmEvent::Shutdown { time } => self.shutdown(time),
        }
    }
}
