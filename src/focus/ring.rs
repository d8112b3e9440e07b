//! Per-screen focus ring
//!
//! The ring holds every managed, focusable client of a screen exactly once,
//! most-recently-focused first. It is used to pick a successor when focus must
//! move without an explicit target (alt-tab, or replacement after a client
//! disappears). Traversal is circular and always terminates after one pass.

use crate::client::ClientId;
use std::collections::VecDeque;

/// Ordered, duplicate-free sequence of clients, head = most recently focused.
///
/// # Examples
///
/// ```
/// use axiom_focus::client::ClientId;
/// use axiom_focus::focus::FocusRing;
///
/// let mut ring = FocusRing::new();
/// ring.insert(ClientId(1));
/// ring.insert(ClientId(2));
/// ring.promote(ClientId(2));
///
/// assert_eq!(ring.head(), Some(ClientId(2)));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FocusRing {
    clients: VecDeque<ClientId>,
}

impl FocusRing {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a client at the tail. Returns false if it was already a member.
    pub fn insert(&mut self, client: ClientId) -> bool {
        if self.contains(client) {
            return false;
        }
        self.clients.push_back(client);
        true
    }

    /// Removes a client, returning its former position.
    pub fn remove(&mut self, client: ClientId) -> Option<usize> {
        let pos = self.position(client)?;
        self.clients.remove(pos);
        Some(pos)
    }

    /// Moves a client to the head of the ring.
    ///
    /// No-op if it is already the head; returns false if it is not a member.
    pub fn promote(&mut self, client: ClientId) -> bool {
        match self.position(client) {
            Some(0) => true,
            Some(pos) => {
                self.clients.remove(pos);
                self.clients.push_front(client);
                true
            }
            None => false,
        }
    }

    pub fn contains(&self, client: ClientId) -> bool {
        self.clients.contains(&client)
    }

    pub fn position(&self, client: ClientId) -> Option<usize> {
        self.clients.iter().position(|&c| c == client)
    }

    pub fn head(&self) -> Option<ClientId> {
        self.clients.front().copied()
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = ClientId> + '_ {
        self.clients.iter().copied()
    }

    pub fn to_vec(&self) -> Vec<ClientId> {
        self.clients.iter().copied().collect()
    }

    /// First member after `from` (wrapping to the head) accepted by `pred`.
    ///
    /// `from` itself is never returned. If `from` is not a member the search
    /// starts at the head. Each member is examined at most once.
    pub fn next_matching<F>(&self, from: ClientId, mut pred: F) -> Option<ClientId>
    where
        F: FnMut(ClientId) -> bool,
    {
        let len = self.clients.len();
        if len == 0 {
            return None;
        }
        let start = self.position(from).map_or(0, |pos| pos + 1);
        (0..len)
            .map(|step| self.clients[(start + step) % len])
            .find(|&candidate| candidate != from && pred(candidate))
    }

    /// Last member before `from` (wrapping to the tail) accepted by `pred`.
    ///
    /// Mirror image of [`FocusRing::next_matching`].
    pub fn previous_matching<F>(&self, from: ClientId, mut pred: F) -> Option<ClientId>
    where
        F: FnMut(ClientId) -> bool,
    {
        let len = self.clients.len();
        if len == 0 {
            return None;
        }
        let start = self.position(from).map_or(len - 1, |pos| (pos + len - 1) % len);
        (0..len)
            .map(|step| self.clients[(start + len - step) % len])
            .find(|&candidate| candidate != from && pred(candidate))
    }
}
