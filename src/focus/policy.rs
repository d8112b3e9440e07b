//! New-window focus policy
//!
//! Whether a freshly mapped client steals focus is a policy decision, not a
//! protocol one, so it sits behind [`FocusPolicy`]. The default policy follows
//! the usual window manager rules: modal restriction always wins, transient
//! dialogs of the focused window get focus, focus stealing prevention compares
//! user interaction times, and urgent windows are favored.

use crate::client::{Client, FocusHint};
use crate::config::FocusConfig;
use crate::timestamp::Timestamp;

/// Inputs to the new-window focus decision
#[derive(Debug, Clone, Copy)]
pub struct FocusNewContext<'a> {
    /// The client that was just mapped
    pub client: &'a Client,
    /// The currently focused client, if any (never `client` itself)
    pub focused: Option<&'a Client>,
    /// `client` is transient for, or a modal dialog of, the focused client
    pub related_to_focused: bool,
    /// `client` passes `accept_focus` and is visible on the current workspace
    pub eligible: bool,
    pub config: &'a FocusConfig,
}

/// Pluggable focus policy
pub trait FocusPolicy: Send {
    /// Hint-level half of the eligibility predicate
    fn accepts_hint(&self, client: &Client) -> bool {
        client.hints.accepts_focus != FocusHint::Never
    }

    /// Whether a just-mapped client should receive focus immediately
    fn focus_new(&self, ctx: &FocusNewContext<'_>) -> bool;
}

/// Configuration-driven policy used unless an embedder supplies its own
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultFocusPolicy;

impl DefaultFocusPolicy {
    /// True if mapping `client` on top of `focused` would steal focus from
    /// more recent user activity.
    fn steals_focus(client: &Client, focused: Option<&Client>) -> bool {
        match client.hints.user_time {
            // A zero user time asks not to be focused on map
            Some(Timestamp(0)) => true,
            Some(time) => focused
                .and_then(|f| f.hints.user_time)
                .map_or(false, |focused_time| time.is_before(focused_time)),
            None => false,
        }
    }
}

impl FocusPolicy for DefaultFocusPolicy {
    fn focus_new(&self, ctx: &FocusNewContext<'_>) -> bool {
        if !ctx.eligible {
            return false;
        }
        if ctx.related_to_focused {
            return true;
        }

        let urgent_override = ctx.client.is_urgent() && ctx.config.urgent_steals_focus;
        if ctx.config.prevent_focus_stealing
            && !urgent_override
            && Self::steals_focus(ctx.client, ctx.focused)
        {
            return false;
        }

        if ctx.focused.is_none() {
            return true;
        }
        ctx.config.focus_new || urgent_override
    }
}
