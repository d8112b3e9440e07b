//! Client window records consumed by the focus core
//!
//! Clients are owned by the window manager's registry. The focus core only
//! mirrors what it needs to arbitrate focus: identity, protocol hints and
//! window-group/transience relationships. The mirror is fed exclusively by
//! registry notifications (created, destroyed, mapped, property changed).

use crate::timestamp::Timestamp;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Opaque client handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClientId(pub u64);

/// Managed display surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScreenId(pub u32);

/// Window group shared by related windows (main window and its dialogs)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GroupId(pub u64);

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "client#{}", self.0)
    }
}

impl fmt::Display for ScreenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "screen#{}", self.0)
    }
}

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "group#{}", self.0)
    }
}

/// How a client wants to receive input focus
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FocusHint {
    /// Never accepts input focus
    Never,
    /// Accepts focus but relies on the pointer for keyboard input
    Locally,
    /// Wants server input focus plus an explicit take-focus message
    #[default]
    Protocol,
}

/// Window type classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WindowType {
    #[default]
    Normal,
    Dialog,
    Utility,
    Toolbar,
    Menu,
    Splash,
    Dock,
    Desktop,
}

impl WindowType {
    /// Splash screens, docks and the desktop never take part in focus arbitration.
    pub fn is_focusable(self) -> bool {
        !matches!(self, WindowType::Splash | WindowType::Dock | WindowType::Desktop)
    }
}

/// Window-manager hints the focus core reads from a client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientHints {
    /// Input focus model
    pub accepts_focus: FocusHint,

    /// Modal clients restrict focus within their group
    pub modal: bool,

    /// Demand-attention flag
    pub urgent: bool,

    /// Window group, if any
    pub group: Option<GroupId>,

    /// Transient-for parent, if any
    pub transient_for: Option<ClientId>,

    /// Window type classification
    pub window_type: WindowType,

    /// Workspace the client lives on (`None` = sticky)
    pub workspace: Option<u32>,

    /// Time of the last user interaction with this client.
    /// `Some(Timestamp(0))` asks not to be focused when mapped.
    pub user_time: Option<Timestamp>,
}

impl Default for ClientHints {
    fn default() -> Self {
        Self {
            accepts_focus: FocusHint::Protocol,
            modal: false,
            urgent: false,
            group: None,
            transient_for: None,
            window_type: WindowType::Normal,
            workspace: None,
            user_time: None,
        }
    }
}

/// The focus core's view of a managed client
#[derive(Debug, Clone, PartialEq)]
pub struct Client {
    pub id: ClientId,
    pub screen: ScreenId,
    pub hints: ClientHints,

    /// Mapped (true) or iconified (false)
    pub visible: bool,

    /// Creation order, used to pick the most recent modal of a group
    pub(crate) sequence: u64,
}

impl Client {
    pub fn new(id: ClientId, screen: ScreenId, hints: ClientHints) -> Self {
        Self {
            id,
            screen,
            hints,
            visible: true,
            sequence: 0,
        }
    }

    /// Whether this client belongs in a focus ring at all
    pub fn is_focusable(&self) -> bool {
        self.hints.window_type.is_focusable()
    }

    pub fn is_modal(&self) -> bool {
        self.hints.modal
    }

    pub fn is_urgent(&self) -> bool {
        self.hints.urgent
    }

    pub fn group(&self) -> Option<GroupId> {
        self.hints.group
    }

    pub fn is_transient_for(&self, other: ClientId) -> bool {
        self.hints.transient_for == Some(other)
    }

    /// Visible on `workspace`, either directly or because the client is sticky
    pub fn is_on_workspace(&self, workspace: u32) -> bool {
        self.hints.workspace.map_or(true, |ws| ws == workspace)
    }
}

/// Notification-fed mirror of the external client registry
#[derive(Debug, Default)]
pub struct ClientRegistry {
    clients: HashMap<ClientId, Client>,
    next_sequence: u64,
}

impl ClientRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a newly managed client. Returns false if the id is already known.
    pub fn insert(&mut self, mut client: Client) -> bool {
        if self.clients.contains_key(&client.id) {
            return false;
        }
        client.sequence = self.next_sequence;
        self.next_sequence += 1;
        self.clients.insert(client.id, client);
        true
    }

    pub fn remove(&mut self, id: ClientId) -> Option<Client> {
        self.clients.remove(&id)
    }

    pub fn get(&self, id: ClientId) -> Option<&Client> {
        self.clients.get(&id)
    }

    pub fn contains(&self, id: ClientId) -> bool {
        self.clients.contains_key(&id)
    }

    /// Replaces the hints of a known client, returning the previous ones.
    pub fn update_hints(&mut self, id: ClientId, hints: ClientHints) -> Option<ClientHints> {
        self.clients
            .get_mut(&id)
            .map(|client| std::mem::replace(&mut client.hints, hints))
    }

    /// Returns true if the visibility actually changed.
    pub fn set_visible(&mut self, id: ClientId, visible: bool) -> bool {
        match self.clients.get_mut(&id) {
            Some(client) if client.visible != visible => {
                client.visible = visible;
                true
            }
            _ => false,
        }
    }

    /// Clients on `screen` in creation order
    pub fn on_screen(&self, screen: ScreenId) -> Vec<&Client> {
        let mut clients: Vec<&Client> = self
            .clients
            .values()
            .filter(|c| c.screen == screen)
            .collect();
        clients.sort_by_key(|c| c.sequence);
        clients
    }

    /// The most recently managed visible modal client of `group`
    pub fn active_modal(&self, group: GroupId) -> Option<&Client> {
        self.clients
            .values()
            .filter(|c| c.is_modal() && c.visible && c.group() == Some(group))
            .max_by_key(|c| c.sequence)
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hints_in_group(group: u64, modal: bool) -> ClientHints {
        ClientHints {
            group: Some(GroupId(group)),
            modal,
            ..ClientHints::default()
        }
    }

    #[test]
    fn test_insert_rejects_duplicates() {
        let mut registry = ClientRegistry::new();
        assert!(registry.insert(Client::new(ClientId(1), ScreenId(0), ClientHints::default())));
        assert!(!registry.insert(Client::new(ClientId(1), ScreenId(0), ClientHints::default())));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_on_screen_keeps_creation_order() {
        let mut registry = ClientRegistry::new();
        for id in [5, 2, 9] {
            registry.insert(Client::new(ClientId(id), ScreenId(0), ClientHints::default()));
        }
        registry.insert(Client::new(ClientId(7), ScreenId(1), ClientHints::default()));

        let ids: Vec<ClientId> = registry.on_screen(ScreenId(0)).iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![ClientId(5), ClientId(2), ClientId(9)]);
    }

    #[test]
    fn test_active_modal_is_most_recent_visible() {
        let mut registry = ClientRegistry::new();
        registry.insert(Client::new(ClientId(1), ScreenId(0), hints_in_group(1, false)));
        registry.insert(Client::new(ClientId(2), ScreenId(0), hints_in_group(1, true)));
        registry.insert(Client::new(ClientId(3), ScreenId(0), hints_in_group(1, true)));

        assert_eq!(registry.active_modal(GroupId(1)).map(|c| c.id), Some(ClientId(3)));

        registry.set_visible(ClientId(3), false);
        assert_eq!(registry.active_modal(GroupId(1)).map(|c| c.id), Some(ClientId(2)));
        assert!(registry.active_modal(GroupId(2)).is_none());
    }

    #[test]
    fn test_sticky_client_is_on_every_workspace() {
        let sticky = Client::new(ClientId(1), ScreenId(0), ClientHints::default());
        assert!(sticky.is_on_workspace(0));
        assert!(sticky.is_on_workspace(4));

        let pinned = Client::new(
            ClientId(2),
            ScreenId(0),
            ClientHints {
                workspace: Some(1),
                ..ClientHints::default()
            },
        );
        assert!(pinned.is_on_workspace(1));
        assert!(!pinned.is_on_workspace(0));
    }

    #[test]
    fn test_dock_is_not_focusable() {
        assert!(!WindowType::Dock.is_focusable());
        assert!(!WindowType::Desktop.is_focusable());
        assert!(WindowType::Dialog.is_focusable());
    }
}
