//! Click-to-focus button grabs
//!
//! Every non-focused, grab-eligible client carries a passive button grab so a
//! click on it both focuses it and still reaches it (the pointer is replayed).
//! The focused client carries none. Grabs are handed over on every focus
//! transition by [`FocusManager::pass_grab_mouse_button`].
//!
//! A single process-wide last-ungrab record debounces a re-grab issued in the
//! same transition, while handling the same notification, that just removed
//! the grab.

use super::{FocusManager, LastUngrab};
use crate::backend::FocusBackend;
use crate::client::{ClientId, ScreenId};
use crate::timestamp::Timestamp;
use log::{debug, trace, warn};
use std::collections::HashSet;

/// Per-screen record of installed button grabs
#[derive(Debug, Clone, Default)]
pub struct GrabTable {
    installed: HashSet<ClientId>,

    /// Client whose grab was removed because it holds focus
    focus_owner: Option<ClientId>,
}

impl GrabTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_grabbed(&self, client: ClientId) -> bool {
        self.installed.contains(&client)
    }

    /// Installed grabs, sorted by client id
    pub fn installed(&self) -> Vec<ClientId> {
        let mut clients: Vec<ClientId> = self.installed.iter().copied().collect();
        clients.sort();
        clients
    }

    pub fn focus_owner(&self) -> Option<ClientId> {
        self.focus_owner
    }

    pub fn len(&self) -> usize {
        self.installed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.installed.is_empty()
    }

    fn mark_installed(&mut self, client: ClientId) {
        self.installed.insert(client);
    }

    fn mark_removed(&mut self, client: ClientId) {
        self.installed.remove(&client);
    }

    /// Drops every trace of a destroyed client
    pub(crate) fn forget(&mut self, client: ClientId) {
        self.installed.remove(&client);
        if self.focus_owner == Some(client) {
            self.focus_owner = None;
        }
    }
}

impl<B: FocusBackend> FocusManager<B> {
    /// Whether `client` should carry a click-to-focus grab right now
    pub(crate) fn grab_eligible(&self, client: ClientId) -> bool {
        self.config.focus.wants_click_grabs()
            && self.focused != Some(client)
            && self.clients.get(client).map_or(false, |c| c.is_focusable())
    }

    /// Install the click-to-focus grab on `client`.
    ///
    /// No-op when already grabbed, when the client is unknown, or when the
    /// same transition of the current notification just removed the grab.
    pub fn grab_mouse_button(&mut self, client: ClientId) {
        let Some(screen) = self.screen_of(client) else {
            debug!("Ignoring grab for unmanaged {}", client);
            return;
        };
        if self
            .screens
            .get(&screen)
            .map_or(true, |s| s.grabs.is_grabbed(client))
        {
            return;
        }

        if let Some(last) = self.last_ungrab.filter(|last| last.client == client) {
            self.last_ungrab = None;
            if last.transition == self.transition && last.serial == self.serial {
                debug!("Suppressing re-grab of {} within the same transition", client);
                return;
            }
        }

        let buttons = self.config.grab.buttons();
        match self.backend.grab_button(client, buttons) {
            Ok(()) => {
                trace!("Grabbed buttons on {}", client);
                if let Some(state) = self.screens.get_mut(&screen) {
                    state.grabs.mark_installed(client);
                }
            }
            Err(err) if err.is_benign() => debug!("Grab skipped: {}", err),
            Err(err) => warn!("Failed to grab buttons on {}: {}", client, err),
        }
    }

    /// Remove the click-to-focus grab from `client` and record the ungrab.
    pub fn ungrab_mouse_button(&mut self, client: ClientId) {
        let Some(screen) = self.screen_of(client) else {
            debug!("Ignoring ungrab for unmanaged {}", client);
            return;
        };
        let grabbed = self
            .screens
            .get(&screen)
            .map_or(false, |s| s.grabs.is_grabbed(client));

        if grabbed {
            match self.backend.ungrab_button(client) {
                Ok(()) => trace!("Ungrabbed buttons on {}", client),
                Err(err) if err.is_benign() => debug!("Ungrab skipped: {}", err),
                Err(err) => warn!("Failed to ungrab buttons on {}: {}", client, err),
            }
            if let Some(state) = self.screens.get_mut(&screen) {
                state.grabs.mark_removed(client);
            }
        }

        self.last_ungrab = Some(LastUngrab {
            client,
            time: self.event_time,
            transition: self.transition,
            serial: self.serial,
        });
    }

    /// Grab every grab-eligible client of `screen`
    pub fn grab_mouse_button_for_all(&mut self, screen: ScreenId) {
        let clients: Vec<ClientId> = self
            .clients
            .on_screen(screen)
            .iter()
            .map(|c| c.id)
            .collect();
        for client in clients {
            if self.grab_eligible(client) {
                self.grab_mouse_button(client);
            }
        }
    }

    /// Remove every grab installed on `screen`. The focus owner is kept so
    /// it regains its grab on the next transition if grabs come back.
    pub fn ungrab_mouse_button_for_all(&mut self, screen: ScreenId) {
        let installed = self
            .screens
            .get(&screen)
            .map(|s| s.grabs.installed())
            .unwrap_or_default();
        for client in installed {
            self.ungrab_mouse_button(client);
        }
    }

    /// Hand the grab over for one focus transition on `screen`: the previous
    /// owner gets its grab back, the new owner (if any) loses it.
    pub fn pass_grab_mouse_button(&mut self, screen: ScreenId, client: Option<ClientId>) {
        let previous = self
            .screens
            .get_mut(&screen)
            .and_then(|s| s.grabs.focus_owner.take());

        if let Some(prev) = previous.filter(|&p| Some(p) != client) {
            if self.grab_eligible(prev) {
                self.grab_mouse_button(prev);
            }
        }

        if let Some(id) = client {
            self.ungrab_mouse_button(id);
            if let Some(state) = self.screens.get_mut(&screen) {
                state.grabs.focus_owner = Some(id);
            }
        }
    }

    /// The most recent ungrab, if not yet consumed
    pub fn last_ungrab(&self) -> Option<(ClientId, Timestamp)> {
        self.last_ungrab.map(|last| (last.client, last.time))
    }

    pub fn clear_last_ungrab(&mut self) {
        self.last_ungrab = None;
    }
}
