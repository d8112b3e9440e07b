//! Focus arbitration core
//!
//! This module owns the single "currently focused client" reference of the
//! window manager and every transition of it:
//! - Eligibility (`accept_focus`) and new-window policy (`focus_new`)
//! - Ring traversal for successor selection (`next`, `previous`, `focus_top`)
//! - Timestamp-ordered focus assignment (`set_focus`) and state application
//!   (`update_focus`)
//! - Hand-off when a focused client goes away (`pass_focus`)
//! - Click-to-focus button grab bookkeeping (see [`grab`])
//!
//! Every operation runs to completion on the caller's thread. Embedders that
//! share the manager across threads wrap it in [`SharedFocus`].

pub mod grab;
pub mod notify;
pub mod policy;
pub mod ring;

pub use grab::GrabTable;
pub use policy::{DefaultFocusPolicy, FocusNewContext, FocusPolicy};
pub use ring::FocusRing;

use crate::backend::{EventSelection, FocusBackend, InputTarget};
use crate::client::{Client, ClientId, ClientRegistry, FocusHint, ScreenId};
use crate::config::AxiomFocusConfig;
use crate::timestamp::Timestamp;
use log::{debug, info, trace, warn};
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Options accepted by focus operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FocusFlags {
    /// Promote the target to the head of its focus ring
    pub sort: bool,
    /// Bypass modal restriction (explicit user override)
    pub ignore_modal: bool,
    /// Assign focus even if the client would normally refuse it.
    /// Never bypasses timestamp ordering.
    pub force: bool,
}

impl FocusFlags {
    pub const NONE: FocusFlags = FocusFlags {
        sort: false,
        ignore_modal: false,
        force: false,
    };

    pub const fn sort() -> Self {
        Self {
            sort: true,
            ignore_modal: false,
            force: false,
        }
    }

    pub const fn with_sort(mut self) -> Self {
        self.sort = true;
        self
    }

    pub const fn with_ignore_modal(mut self) -> Self {
        self.ignore_modal = true;
        self
    }

    pub const fn with_force(mut self) -> Self {
        self.force = true;
        self
    }
}

/// Candidate filter used when searching for a client to focus
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SearchMask {
    /// Accept iconified clients
    pub include_hidden: bool,
    /// Accept clients on workspaces other than the current one
    pub include_all_workspaces: bool,
}

/// Most recent button ungrab, used to debounce an immediate re-grab
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct LastUngrab {
    pub client: ClientId,
    pub time: Timestamp,
    /// Focus transition during which the ungrab happened
    pub transition: u64,
    /// Notification during which the ungrab happened
    pub serial: u64,
}

/// Focus state of one managed screen
#[derive(Debug, Clone)]
pub struct ScreenFocus {
    id: ScreenId,
    ring: FocusRing,
    grabs: GrabTable,
    focused: Option<ClientId>,
    last_focus_time: Option<Timestamp>,
    workspace: u32,
}

impl ScreenFocus {
    fn new(id: ScreenId, workspace: u32) -> Self {
        Self {
            id,
            ring: FocusRing::new(),
            grabs: GrabTable::new(),
            focused: None,
            last_focus_time: None,
            workspace,
        }
    }

    pub fn id(&self) -> ScreenId {
        self.id
    }

    pub fn ring(&self) -> &FocusRing {
        &self.ring
    }

    pub fn grabs(&self) -> &GrabTable {
        &self.grabs
    }

    pub fn focused(&self) -> Option<ClientId> {
        self.focused
    }

    pub fn last_focus_time(&self) -> Option<Timestamp> {
        self.last_focus_time
    }

    pub fn workspace(&self) -> u32 {
        self.workspace
    }
}

/// Serializable view of the focus state, for diagnostics
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FocusSnapshot {
    pub focused: Option<ClientId>,
    pub screens: Vec<ScreenSnapshot>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScreenSnapshot {
    pub screen: ScreenId,
    pub workspace: u32,
    pub focused: Option<ClientId>,
    pub ring: Vec<ClientId>,
    pub grabbed: Vec<ClientId>,
    pub last_focus_time: Option<Timestamp>,
}

/// The focus controller: sole mutation surface for focus and grab state
pub struct FocusManager<B: FocusBackend> {
    backend: B,
    config: AxiomFocusConfig,
    policy: Box<dyn FocusPolicy>,
    clients: ClientRegistry,
    screens: BTreeMap<ScreenId, ScreenFocus>,

    /// Process-wide focused client; always agrees with its screen's slot
    focused: Option<ClientId>,

    last_ungrab: Option<LastUngrab>,

    /// Latest event time seen, used to resolve `Timestamp::CURRENT`
    event_time: Timestamp,

    /// Incremented on every applied focus transition
    transition: u64,

    /// Incremented at the start of every notification
    serial: u64,
}

/// Focus manager shared between threads; every operation holds the lock for
/// its whole run so events stay serialized.
pub type SharedFocus<B> = Arc<Mutex<FocusManager<B>>>;

impl<B: FocusBackend> FocusManager<B> {
    /// Create a focus manager with the default new-window policy
    pub fn new(backend: B, config: AxiomFocusConfig) -> Self {
        Self::with_policy(backend, config, Box::new(DefaultFocusPolicy))
    }

    pub fn with_policy(
        backend: B,
        config: AxiomFocusConfig,
        policy: Box<dyn FocusPolicy>,
    ) -> Self {
        info!(
            "Focus core ready (click_to_focus={}, focus_new={}, prevent_focus_stealing={})",
            config.focus.click_to_focus,
            config.focus.focus_new,
            config.focus.prevent_focus_stealing
        );
        Self {
            backend,
            config,
            policy,
            clients: ClientRegistry::new(),
            screens: BTreeMap::new(),
            focused: None,
            last_ungrab: None,
            event_time: Timestamp::CURRENT,
            transition: 0,
            serial: 0,
        }
    }

    /// Wrap the manager for shared access
    pub fn into_shared(self) -> SharedFocus<B> {
        Arc::new(Mutex::new(self))
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    pub fn config(&self) -> &AxiomFocusConfig {
        &self.config
    }

    pub fn clients(&self) -> &ClientRegistry {
        &self.clients
    }

    pub fn screen(&self, screen: ScreenId) -> Option<&ScreenFocus> {
        self.screens.get(&screen)
    }

    pub fn screens(&self) -> impl Iterator<Item = &ScreenFocus> {
        self.screens.values()
    }

    /// Ring order of a screen, head first
    pub fn ring(&self, screen: ScreenId) -> Vec<ClientId> {
        self.screens
            .get(&screen)
            .map(|s| s.ring.to_vec())
            .unwrap_or_default()
    }

    /// Whether the focus core believes `client` holds a click-to-focus grab
    pub fn is_grabbed(&self, client: ClientId) -> bool {
        self.screen_of(client)
            .and_then(|screen| self.screens.get(&screen))
            .map_or(false, |s| s.grabs.is_grabbed(client))
    }

    pub fn event_time(&self) -> Timestamp {
        self.event_time
    }

    pub fn snapshot(&self) -> FocusSnapshot {
        FocusSnapshot {
            focused: self.focused,
            screens: self
                .screens
                .values()
                .map(|s| ScreenSnapshot {
                    screen: s.id,
                    workspace: s.workspace,
                    focused: s.focused,
                    ring: s.ring.to_vec(),
                    grabbed: s.grabs.installed(),
                    last_focus_time: s.last_focus_time,
                })
                .collect(),
        }
    }

    /// Register a managed screen. Re-adding a known screen is a no-op.
    pub fn add_screen(&mut self, screen: ScreenId, workspace: u32) {
        if self.screens.contains_key(&screen) {
            return;
        }
        info!("Managing {} (workspace {})", screen, workspace);
        self.screens.insert(screen, ScreenFocus::new(screen, workspace));
    }

    /// Advance the latest-event clock
    pub fn note_event_time(&mut self, time: Timestamp) {
        if time.is_current() {
            return;
        }
        self.event_time = if self.event_time.is_current() {
            time
        } else {
            self.event_time.latest(time)
        };
    }

    /// Start handling a new notification. Grab debouncing never reaches
    /// across notifications.
    pub(crate) fn begin_notification(&mut self, time: Timestamp) {
        self.serial += 1;
        self.note_event_time(time);
    }

    /// Read-only accessor for the process-wide focused client
    pub fn get_focus(&self) -> Option<ClientId> {
        self.focused
    }

    /// Protocol-eligibility predicate with default flags
    pub fn accept_focus(&self, client: ClientId) -> bool {
        self.accept_focus_with(client, FocusFlags::NONE)
    }

    /// Protocol-eligibility predicate.
    ///
    /// False for unknown clients, for window types that never take focus,
    /// for clients whose hints refuse focus, and for clients restricted by
    /// another modal client of their group (unless `ignore_modal`). `force`
    /// accepts any known client.
    pub fn accept_focus_with(&self, client: ClientId, flags: FocusFlags) -> bool {
        let Some(c) = self.clients.get(client) else {
            return false;
        };
        if flags.force {
            return true;
        }
        if !c.is_focusable() {
            trace!("{} is a {:?} window", client, c.hints.window_type);
            return false;
        }
        if !self.policy.accepts_hint(c) {
            return false;
        }
        if !flags.ignore_modal && self.modal_blocks(c) {
            trace!("{} blocked by modal restriction", client);
            return false;
        }
        true
    }

    /// Whether a modal client other than `client` restricts its group
    fn modal_blocks(&self, client: &Client) -> bool {
        client
            .group()
            .and_then(|group| self.clients.active_modal(group))
            .map_or(false, |modal| modal.id != client.id)
    }

    /// Whether `client` is a focus candidate under `mask`
    pub fn select_mask(&self, client: ClientId, mask: SearchMask) -> bool {
        let Some(c) = self.clients.get(client) else {
            return false;
        };
        let Some(screen) = self.screens.get(&c.screen) else {
            return false;
        };
        c.is_focusable()
            && (mask.include_hidden || c.visible)
            && (mask.include_all_workspaces || c.is_on_workspace(screen.workspace))
    }

    fn cycle_mask(&self) -> SearchMask {
        SearchMask {
            include_hidden: self.config.cycle.cycle_hidden,
            include_all_workspaces: self.config.cycle.cycle_workspaces,
        }
    }

    fn screen_of(&self, client: ClientId) -> Option<ScreenId> {
        self.clients.get(client).map(|c| c.screen)
    }

    /// Next eligible client after `client` in ring order, wrapping to the head
    pub fn next(&self, client: ClientId, flags: FocusFlags) -> Option<ClientId> {
        let screen = self.screens.get(&self.screen_of(client)?)?;
        let mask = self.cycle_mask();
        screen.ring.next_matching(client, |candidate| {
            self.select_mask(candidate, mask) && self.accept_focus_with(candidate, flags)
        })
    }

    /// Previous eligible client before `client` in ring order, wrapping to the tail
    pub fn previous(&self, client: ClientId, flags: FocusFlags) -> Option<ClientId> {
        let screen = self.screens.get(&self.screen_of(client)?)?;
        let mask = self.cycle_mask();
        screen.ring.previous_matching(client, |candidate| {
            self.select_mask(candidate, mask) && self.accept_focus_with(candidate, flags)
        })
    }

    /// Move `client` to the head of its screen's focus ring
    pub fn sort_ring(&mut self, client: ClientId) {
        let Some(screen) = self.screen_of(client) else {
            return;
        };
        if let Some(state) = self.screens.get_mut(&screen) {
            if !state.ring.promote(client) {
                debug!("{} is not in the focus ring of {}", client, screen);
            }
        }
    }

    /// Whether a just-mapped client should receive focus immediately
    pub fn focus_new(&self, client: ClientId) -> bool {
        let Some(c) = self.clients.get(client) else {
            return false;
        };
        let focused = self
            .focused
            .filter(|&f| f != client)
            .and_then(|f| self.clients.get(f));
        let related_to_focused = focused.map_or(false, |f| {
            c.is_transient_for(f.id)
                || (c.is_modal() && c.group().is_some() && c.group() == f.group())
        });
        let ctx = FocusNewContext {
            client: c,
            focused,
            related_to_focused,
            eligible: self.accept_focus(client) && self.select_mask(client, SearchMask::default()),
            config: &self.config.focus,
        };
        let decision = self.policy.focus_new(&ctx);
        debug!("focus_new({}) -> {}", client, decision);
        decision
    }

    /// Focus the first eligible ring member of `screen`, or leave it unfocused
    pub fn focus_top(&mut self, screen: ScreenId, flags: FocusFlags) {
        self.focus_top_excluding(screen, flags, None);
    }

    fn focus_top_excluding(
        &mut self,
        screen: ScreenId,
        flags: FocusFlags,
        exclude: Option<ClientId>,
    ) {
        let Some(state) = self.screens.get(&screen) else {
            debug!("focus_top on unknown {}", screen);
            return;
        };
        let candidates: Vec<ClientId> = state
            .ring
            .iter()
            .filter(|&c| Some(c) != exclude)
            .filter(|&c| self.select_mask(c, SearchMask::default()))
            .filter(|&c| self.accept_focus_with(c, flags))
            .collect();

        for candidate in candidates {
            if self.set_focus(screen, Some(candidate), Timestamp::CURRENT, flags) {
                return;
            }
        }

        // Only drop focus if it belongs to this screen (or is going away)
        let owns_focus = self
            .focused
            .map_or(true, |f| Some(f) == exclude || self.screen_of(f) == Some(screen));
        if owns_focus {
            debug!("No focusable client on {}", screen);
            self.set_focus(screen, None, Timestamp::CURRENT, flags);
        }
    }

    /// Hand focus over from `from` (being destroyed, unmapped or demoted).
    ///
    /// `to` is used directly when eligible; otherwise the transient parent of
    /// `from` is tried, then the top of the ring excluding `from`.
    pub fn pass_focus(&mut self, screen: ScreenId, from: Option<ClientId>, to: Option<ClientId>) {
        let parent = from
            .and_then(|f| self.clients.get(f))
            .and_then(|c| c.hints.transient_for);
        self.pass_focus_inner(screen, from, parent, to);
    }

    pub(crate) fn pass_focus_inner(
        &mut self,
        screen: ScreenId,
        from: Option<ClientId>,
        parent: Option<ClientId>,
        to: Option<ClientId>,
    ) {
        // Someone else already holds focus and nobody asked for a change
        if to.is_none() {
            if let Some(current) = self.focused {
                if Some(current) != from && self.clients.contains(current) {
                    return;
                }
            }
        }

        let flags = FocusFlags::NONE;
        for target in [to, parent].into_iter().flatten() {
            if Some(target) == from || self.screen_of(target) != Some(screen) {
                continue;
            }
            if self.select_mask(target, SearchMask::default())
                && self.accept_focus_with(target, flags)
                && self.set_focus(screen, Some(target), Timestamp::CURRENT, flags)
            {
                return;
            }
        }

        self.focus_top_excluding(screen, flags, from);
    }

    /// Resolve `Timestamp::CURRENT` against what this screen has seen
    fn resolve_time(&self, screen: ScreenId, time: Timestamp) -> Timestamp {
        if !time.is_current() {
            return time;
        }
        let last = self.screens.get(&screen).and_then(|s| s.last_focus_time);
        match last {
            Some(last) => self.event_time.latest(last),
            None => self.event_time,
        }
    }

    /// Whether `time` is older than the last focus applied on `screen`
    fn is_stale(&self, screen: ScreenId, time: Timestamp) -> bool {
        self.screens
            .get(&screen)
            .and_then(|s| s.last_focus_time)
            .map_or(false, |last| time.is_before(last))
    }

    /// Assign server-level input focus, ordered by the triggering event time.
    ///
    /// Returns false when the request was discarded: stale timestamp, unknown
    /// client, refused focus, or a window that vanished meanwhile.
    pub fn set_focus(
        &mut self,
        screen: ScreenId,
        client: Option<ClientId>,
        time: Timestamp,
        flags: FocusFlags,
    ) -> bool {
        if !self.screens.contains_key(&screen) {
            debug!("set_focus on unknown {}", screen);
            return false;
        }
        self.note_event_time(time);
        let time = self.resolve_time(screen, time);
        if self.is_stale(screen, time) {
            debug!(
                "Discarding stale focus request for {:?} on {} @ {}",
                client, screen, time
            );
            return false;
        }

        let server_target = match client {
            Some(id) => {
                let Some(c) = self.clients.get(id) else {
                    debug!("set_focus on unmanaged {}", id);
                    return false;
                };
                if c.screen != screen {
                    debug!("{} does not live on {}", id, screen);
                    return false;
                }
                if !self.accept_focus_with(id, flags) {
                    debug!("{} refuses focus", id);
                    return false;
                }
                match c.hints.accepts_focus {
                    // Keyboard follows the pointer for locally-focused clients
                    FocusHint::Locally => InputTarget::PointerRoot,
                    FocusHint::Never | FocusHint::Protocol => InputTarget::Client(id),
                }
            }
            None => InputTarget::None,
        };

        if let Err(err) = self.backend.set_input_focus(server_target, time) {
            if err.is_benign() {
                debug!("Input focus not assigned: {}", err);
            } else {
                warn!("Failed to assign input focus to {:?}: {}", server_target, err);
            }
            return false;
        }

        if let Some(state) = self.screens.get_mut(&screen) {
            state.last_focus_time = Some(time);
        }
        self.update_focus(screen, client, flags);
        true
    }

    /// Apply a focus decision: notify the client, update the focus slots and
    /// hand the click grab over.
    pub fn update_focus(&mut self, screen: ScreenId, client: Option<ClientId>, flags: FocusFlags) {
        self.apply_focus(screen, client, flags, true);
    }

    pub(crate) fn apply_focus(
        &mut self,
        screen: ScreenId,
        client: Option<ClientId>,
        flags: FocusFlags,
        notify_client: bool,
    ) {
        if let Some(id) = client {
            if self.screen_of(id) != Some(screen) {
                debug!("update_focus ignored for {} on {}", id, screen);
                return;
            }
        }
        let previous = self.focused;
        if previous == client && self.screens.get(&screen).map_or(false, |s| s.focused == client) {
            if let (true, Some(id)) = (flags.sort, client) {
                self.sort_ring(id);
            }
            return;
        }

        self.transition += 1;
        self.focused = client;

        // Focus leaving another screen
        if let Some(prev) = previous {
            if let Some(prev_screen) = self.screen_of(prev).filter(|&s| s != screen) {
                if let Some(state) = self.screens.get_mut(&prev_screen) {
                    state.focused = None;
                }
                self.pass_grab_mouse_button(prev_screen, None);
            }
        }

        if let (true, Some(id)) = (notify_client, client) {
            let wants_message = self
                .clients
                .get(id)
                .map_or(false, |c| c.hints.accepts_focus == FocusHint::Protocol);
            if wants_message {
                let time = self.resolve_time(screen, Timestamp::CURRENT);
                if let Err(err) = self.backend.send_take_focus(id, time) {
                    debug!("Take-focus message to {} failed: {}", id, err);
                }
            }
        }

        if let Some(state) = self.screens.get_mut(&screen) {
            state.focused = client;
        }

        if let (true, Some(id)) = (flags.sort, client) {
            self.sort_ring(id);
        }
        self.pass_grab_mouse_button(screen, client);
        self.backend.focus_changed(previous, client);
        debug!("Focus {:?} -> {:?} on {}", previous, client, screen);
    }

    /// Drop focus everywhere
    pub fn clear_focus(&mut self) {
        let previous = self.focused.take();
        if previous.is_some() {
            self.transition += 1;
        }
        let screens: Vec<ScreenId> = self.screens.keys().copied().collect();
        for screen in screens {
            let had_focus = self
                .screens
                .get_mut(&screen)
                .map_or(false, |s| s.focused.take().is_some());
            if had_focus {
                self.pass_grab_mouse_button(screen, None);
            }
        }
        if previous.is_some() {
            self.backend.focus_changed(previous, None);
            debug!("Focus cleared (was {:?})", previous);
        }
    }

    /// Events the focus core needs for a client under the current policy
    fn event_selection(&self) -> EventSelection {
        EventSelection {
            focus_change: true,
            pointer_crossing: !self.config.focus.click_to_focus,
        }
    }

    fn select_client_events(&mut self, client: ClientId) {
        let selection = self.event_selection();
        if let Err(err) = self.backend.select_events(client, selection) {
            if err.is_benign() {
                debug!("Event selection skipped: {}", err);
            } else {
                warn!("Failed to select events on {}: {}", client, err);
            }
        }
    }
}
