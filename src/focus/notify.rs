//! Reactions to registry and input notifications
//!
//! The window manager reports client lifecycle changes and user input here.
//! Each handler runs to completion, including any focus hand-off and grab
//! update, before returning.

use super::{FocusFlags, FocusManager, SearchMask};
use crate::backend::{FocusBackend, InputTarget};
use crate::client::{Client, ClientHints, ClientId, FocusHint, ScreenId};
use crate::events::CycleDirection;
use crate::timestamp::Timestamp;
use log::{debug, info, trace, warn};

impl<B: FocusBackend> FocusManager<B> {
    /// Start tracking a client. Returns false if it was already managed.
    ///
    /// Focusable clients join the tail of their screen's ring and receive a
    /// click-to-focus grab. Focus is not assigned here; see
    /// [`FocusManager::client_created`].
    pub fn manage_client(&mut self, client: Client) -> bool {
        let id = client.id;
        let screen = client.screen;
        let focusable = client.is_focusable();

        if !self.screens.contains_key(&screen) {
            self.add_screen(screen, 0);
        }
        if !self.clients.insert(client) {
            debug!("{} is already managed", id);
            return false;
        }
        if focusable {
            if let Some(state) = self.screens.get_mut(&screen) {
                state.ring.insert(id);
            }
        }

        self.select_client_events(id);
        if self.grab_eligible(id) {
            self.grab_mouse_button(id);
        }
        debug!("Managing {} on {}", id, screen);
        true
    }

    /// A client was created and mapped for the first time
    pub fn client_created(
        &mut self,
        id: ClientId,
        screen: ScreenId,
        hints: ClientHints,
        time: Timestamp,
    ) {
        self.begin_notification(time);
        if !self.manage_client(Client::new(id, screen, hints)) {
            return;
        }
        if self.focus_new(id) {
            self.set_focus(screen, Some(id), time, FocusFlags::sort());
        }
    }

    /// A client was destroyed. Every trace of it is dropped before this
    /// returns, and focus is handed over if it was focused.
    pub fn unmanage_client(&mut self, id: ClientId, time: Timestamp) {
        self.begin_notification(time);
        let Some(client) = self.clients.get(id) else {
            debug!("Destroy of unmanaged {}", id);
            return;
        };
        let screen = client.screen;
        let parent = client.hints.transient_for;

        if let Some(state) = self.screens.get_mut(&screen) {
            state.ring.remove(id);
            state.grabs.forget(id);
            if state.focused == Some(id) {
                state.focused = None;
            }
        }
        if self.last_ungrab.map_or(false, |last| last.client == id) {
            self.last_ungrab = None;
        }
        self.clients.remove(id);

        if self.focused == Some(id) {
            self.focused = None;
            self.transition += 1;
            self.backend.focus_changed(Some(id), None);
            debug!("Focused {} destroyed, passing focus", id);
            self.pass_focus_inner(screen, Some(id), parent, None);
        }
    }

    /// A client was mapped (`visible`) or iconified
    pub fn set_client_visible(&mut self, id: ClientId, visible: bool, time: Timestamp) {
        self.begin_notification(time);
        let Some(screen) = self.screen_of(id) else {
            debug!("Visibility change of unmanaged {}", id);
            return;
        };
        if !self.clients.set_visible(id, visible) {
            return;
        }

        if visible {
            if self.grab_eligible(id) {
                self.grab_mouse_button(id);
            }
            if self.focus_new(id) {
                self.set_focus(screen, Some(id), time, FocusFlags::sort());
            }
        } else if self.focused == Some(id) {
            self.pass_focus(screen, Some(id), None);
        }
    }

    /// Hints of a client changed (protocol hints, window type, modal state,
    /// group, transience, workspace)
    pub fn update_client_hints(&mut self, id: ClientId, hints: ClientHints, time: Timestamp) {
        self.begin_notification(time);
        let Some(screen) = self.screen_of(id) else {
            debug!("Property change on unmanaged {}", id);
            return;
        };
        let modal_changed = {
            let Some(old) = self.clients.update_hints(id, hints) else {
                return;
            };
            let Some(new) = self.clients.get(id).map(|c| &c.hints) else {
                return;
            };
            old.modal != new.modal || old.group != new.group
        };

        let focusable = self.clients.get(id).map_or(false, |c| c.is_focusable());
        if let Some(state) = self.screens.get_mut(&screen) {
            if focusable {
                state.ring.insert(id);
            } else if state.ring.remove(id).is_some() {
                trace!("{} left the focus ring of {}", id, screen);
            }
        }
        if !focusable && self.is_grabbed(id) {
            self.ungrab_mouse_button(id);
        } else if self.grab_eligible(id) {
            self.grab_mouse_button(id);
        }

        let Some(focused) = self.focused else {
            return;
        };
        let Some(current) = self.clients.get(focused) else {
            return;
        };
        let lost_eligibility = focused == id
            && (!current.is_focusable() || current.hints.accepts_focus == FocusHint::Never);
        let blocked = modal_changed && self.modal_blocks(current);
        if !(lost_eligibility || blocked) {
            return;
        }

        let focused_screen = current.screen;
        let modal = current
            .group()
            .and_then(|group| self.clients.active_modal(group))
            .map(|c| c.id)
            .filter(|&m| m != focused);
        debug!("{} can no longer hold focus, passing to {:?}", focused, modal);
        self.pass_focus(focused_screen, Some(focused), modal);
    }

    /// A button press reached `id`, possibly through a click-to-focus grab.
    pub fn button_press(&mut self, id: ClientId, time: Timestamp) {
        self.begin_notification(time);
        let Some(screen) = self.screen_of(id) else {
            debug!("Button press on unmanaged {}", id);
            return;
        };
        let grabbed = self.is_grabbed(id);

        if self.config.focus.wants_click_grabs() {
            self.set_focus(screen, Some(id), time, FocusFlags::sort());
        }

        if grabbed {
            let replay = self.config.grab.replay_click;
            if let Err(err) = self.backend.release_pointer(time, replay) {
                warn!("Failed to release pointer after click on {}: {}", id, err);
            }
        }
    }

    /// The pointer entered `id` (focus-follows-mouse)
    pub fn pointer_enter(&mut self, id: ClientId, time: Timestamp) {
        self.begin_notification(time);
        if self.config.focus.click_to_focus {
            trace!("Ignoring pointer enter on {} in click-to-focus mode", id);
            return;
        }
        let Some(screen) = self.screen_of(id) else {
            return;
        };
        if self.focused != Some(id) {
            self.set_focus(screen, Some(id), time, FocusFlags::sort());
        }
    }

    /// The server reported a focus change it made on its own (for example a
    /// client that took focus through the take-focus protocol).
    pub fn focus_in(&mut self, screen: ScreenId, client: Option<ClientId>, time: Timestamp) {
        if !self.screens.contains_key(&screen) {
            debug!("FocusIn on unknown {}", screen);
            return;
        }
        self.begin_notification(time);
        let time = self.resolve_time(screen, time);
        if self.is_stale(screen, time) {
            debug!("Discarding stale FocusIn for {:?} @ {}", client, time);
            return;
        }

        match client {
            Some(id) if self.screen_of(id) != Some(screen) => {
                debug!("FocusIn for {} outside {}", id, screen);
                return;
            }
            Some(id) if !self.clients.get(id).map_or(false, |c| c.is_focusable()) => {
                debug!("Ignoring FocusIn for non-focusable {}", id);
                return;
            }
            None => {
                // Locally focused clients never own server focus
                let local = self
                    .screens
                    .get(&screen)
                    .and_then(|s| s.focused)
                    .and_then(|f| self.clients.get(f))
                    .map_or(false, |c| c.hints.accepts_focus == FocusHint::Locally);
                if local {
                    return;
                }
            }
            Some(_) => {}
        }

        if let Some(state) = self.screens.get_mut(&screen) {
            state.last_focus_time = Some(time);
        }
        self.apply_focus(screen, client, FocusFlags::sort(), false);
    }

    /// Alt-tab style cycling from the focused client of `screen`
    pub fn cycle_focus(&mut self, screen: ScreenId, direction: CycleDirection, time: Timestamp) {
        self.begin_notification(time);
        let Some(state) = self.screens.get(&screen) else {
            return;
        };
        let Some(current) = state.focused else {
            self.focus_top(screen, FocusFlags::NONE);
            return;
        };

        let target = match direction {
            CycleDirection::Next => self.next(current, FocusFlags::NONE),
            CycleDirection::Previous => self.previous(current, FocusFlags::NONE),
        };
        match target {
            Some(target) => {
                self.set_focus(screen, Some(target), time, FocusFlags::NONE);
            }
            None => debug!("Nothing to cycle to from {}", current),
        }
    }

    /// Explicit activation from a pager or taskbar
    pub fn activate(&mut self, id: ClientId, time: Timestamp) -> bool {
        self.begin_notification(time);
        let Some(screen) = self.screen_of(id) else {
            debug!("Activation of unmanaged {}", id);
            return false;
        };
        let flags = FocusFlags::sort().with_ignore_modal();
        self.set_focus(screen, Some(id), time, flags)
    }

    /// The current workspace of `screen` changed
    pub fn switch_workspace(&mut self, screen: ScreenId, workspace: u32, time: Timestamp) {
        self.begin_notification(time);
        let Some(state) = self.screens.get_mut(&screen) else {
            debug!("Workspace switch on unknown {}", screen);
            return;
        };
        if state.workspace == workspace {
            return;
        }
        info!("{} switched to workspace {}", screen, workspace);
        state.workspace = workspace;
        let focused = state.focused;

        let still_visible =
            focused.map_or(false, |f| self.select_mask(f, SearchMask::default()));
        if !still_visible {
            self.focus_top(screen, FocusFlags::NONE);
        }
    }

    /// Switch between click-to-focus and focus-follows-mouse at runtime
    pub fn set_focus_policy(
        &mut self,
        click_to_focus: bool,
        raise_on_click: bool,
        time: Timestamp,
    ) {
        self.begin_notification(time);
        let grabs_before = self.config.focus.wants_click_grabs();
        let crossing_before = self.config.focus.click_to_focus;
        self.config.focus.click_to_focus = click_to_focus;
        self.config.focus.raise_on_click = raise_on_click;
        let grabs_after = self.config.focus.wants_click_grabs();

        info!(
            "Focus policy: click_to_focus={}, raise_on_click={}",
            click_to_focus, raise_on_click
        );

        let screens: Vec<ScreenId> = self.screens.keys().copied().collect();
        if grabs_before != grabs_after {
            // A bulk re-grab is deliberate, not churn
            self.clear_last_ungrab();
            for &screen in &screens {
                if grabs_after {
                    self.grab_mouse_button_for_all(screen);
                } else {
                    self.ungrab_mouse_button_for_all(screen);
                }
            }
        }

        if crossing_before != click_to_focus {
            for screen in screens {
                let clients: Vec<ClientId> =
                    self.clients.on_screen(screen).iter().map(|c| c.id).collect();
                for client in clients {
                    self.select_client_events(client);
                }
            }
        }
    }

    /// Release everything the focus core holds on the server
    pub fn shutdown(&mut self, time: Timestamp) {
        self.begin_notification(time);
        self.clear_focus();
        let screens: Vec<ScreenId> = self.screens.keys().copied().collect();
        for screen in screens {
            self.ungrab_mouse_button_for_all(screen);
        }
        self.last_ungrab = None;
        if let Err(err) = self.backend.set_input_focus(InputTarget::None, self.event_time) {
            debug!("Final focus reset failed: {}", err);
        }
        info!("Focus core shut down");
    }
}
