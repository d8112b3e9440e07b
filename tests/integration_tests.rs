//! Integration tests for the Axiom focus core
//!
//! These tests replay complete notification sequences through the public
//! event dispatch surface and check the focus owner, ring order and the
//! requests the display server would have seen.

use anyhow::Result;
use axiom_focus::backend::{BackendCall, RecordingBackend};
use axiom_focus::events::load_script;
use axiom_focus::{
    AxiomFocusConfig, ClientHints, ClientId, FocusManager, InputTarget, ScreenId, Timestamp,
    WmEvent,
};
use std::sync::Arc;
use tokio::sync::mpsc;

fn replay(config: AxiomFocusConfig, script: &str) -> Result<FocusManager<RecordingBackend>> {
    let mut manager = FocusManager::new(RecordingBackend::new(), config);
    for event in load_script(script)? {
        manager.handle_event(event);
    }
    Ok(manager)
}

#[test]
fn test_click_to_focus_session() -> Result<()> {
    let script = r#"[
        {"type": "screen_added", "screen": 0},
        {"type": "client_created", "client": 1, "screen": 0, "time": 100},
        {"type": "client_created", "client": 2, "screen": 0, "time": 200},
        {"type": "client_created", "client": 3, "screen": 0, "time": 300},
        {"type": "button_press", "client": 1, "time": 400},
        {"type": "client_destroyed", "client": 1, "time": 500}
    ]"#;
    let manager = replay(AxiomFocusConfig::default(), script)?;

    // 1 was promoted by the click, then destroyed: the new head inherits
    assert_eq!(manager.get_focus(), Some(ClientId(3)));
    assert_eq!(manager.ring(ScreenId(0)), vec![ClientId(3), ClientId(2)]);
    assert!(manager.is_grabbed(ClientId(2)));
    assert!(!manager.is_grabbed(ClientId(3)));
    assert!(manager
        .backend()
        .calls()
        .contains(&BackendCall::ReleasePointer(Timestamp(400), true)));
    Ok(())
}

#[test]
fn test_late_click_does_not_override_newer_focus() -> Result<()> {
    let script = r#"[
        {"type": "screen_added", "screen": 0},
        {"type": "client_created", "client": 1, "screen": 0, "time": 100},
        {"type": "client_created", "client": 2, "screen": 0, "time": 200},
        {"type": "activate_request", "client": 1, "time": 400},
        {"type": "button_press", "client": 2, "time": 350}
    ]"#;
    let manager = replay(AxiomFocusConfig::default(), script)?;

    assert_eq!(manager.get_focus(), Some(ClientId(1)));
    assert_eq!(
        manager.backend().last_input_focus(),
        Some((InputTarget::Client(ClientId(1)), Timestamp(400)))
    );
    Ok(())
}

#[test]
fn test_modal_dialog_session() -> Result<()> {
    let script = r#"[
        {"type": "screen_added", "screen": 0},
        {"type": "client_created", "client": 1, "screen": 0, "time": 100,
         "hints": {"group": 7}},
        {"type": "client_created", "client": 2, "screen": 0, "time": 200,
         "hints": {"group": 7, "modal": true, "transient_for": 1, "window_type": "dialog"}},
        {"type": "button_press", "client": 1, "time": 300},
        {"type": "client_destroyed", "client": 2, "time": 400},
        {"type": "button_press", "client": 1, "time": 500}
    ]"#;
    let manager = replay(AxiomFocusConfig::default(), script)?;

    // The click on 1 at 300 was refused while the dialog was up; the dialog's
    // destruction handed focus back to its parent.
    assert_eq!(manager.get_focus(), Some(ClientId(1)));
    assert_eq!(manager.ring(ScreenId(0)), vec![ClientId(1)]);
    Ok(())
}

#[test]
fn test_alt_tab_and_workspaces() -> Result<()> {
    let script = r#"[
        {"type": "screen_added", "screen": 0},
        {"type": "client_created", "client": 1, "screen": 0, "time": 100,
         "hints": {"workspace": 0}},
        {"type": "client_created", "client": 2, "screen": 0, "time": 200,
         "hints": {"workspace": 0}},
        {"type": "client_created", "client": 3, "screen": 0, "time": 300,
         "hints": {"workspace": 1}},
        {"type": "cycle_focus", "screen": 0, "direction": "next", "time": 400},
        {"type": "workspace_switched", "screen": 0, "workspace": 1, "time": 500}
    ]"#;
    let manager = replay(AxiomFocusConfig::default(), script)?;

    assert_eq!(manager.get_focus(), Some(ClientId(3)));
    assert_eq!(manager.screen(ScreenId(0)).unwrap().workspace(), 1);
    Ok(())
}

#[test]
fn test_focus_follows_mouse_session() -> Result<()> {
    let mut config = AxiomFocusConfig::default();
    config.focus.click_to_focus = false;
    config.focus.raise_on_click = false;
    config.grab.replay_click = false;

    let script = r#"[
        {"type": "screen_added", "screen": 0},
        {"type": "client_created", "client": 1, "screen": 0, "time": 100},
        {"type": "client_created", "client": 2, "screen": 0, "time": 200},
        {"type": "pointer_enter", "client": 1, "time": 300},
        {"type": "policy_changed", "click_to_focus": true, "raise_on_click": true, "time": 400}
    ]"#;
    let manager = replay(config, script)?;

    assert_eq!(manager.get_focus(), Some(ClientId(1)));
    assert!(manager.is_grabbed(ClientId(2)));
    assert!(!manager.is_grabbed(ClientId(1)));
    Ok(())
}

#[test]
fn test_shutdown_leaves_no_server_state() -> Result<()> {
    let script = r#"[
        {"type": "screen_added", "screen": 0},
        {"type": "screen_added", "screen": 1},
        {"type": "client_created", "client": 1, "screen": 0, "time": 100},
        {"type": "client_created", "client": 2, "screen": 1, "time": 200},
        {"type": "shutdown", "time": 300}
    ]"#;
    let manager = replay(AxiomFocusConfig::default(), script)?;

    assert_eq!(manager.get_focus(), None);
    assert!(!manager.backend().has_grab(ClientId(1)));
    assert!(!manager.backend().has_grab(ClientId(2)));
    assert_eq!(
        manager.backend().last_input_focus(),
        Some((InputTarget::None, Timestamp(300)))
    );
    Ok(())
}

#[test]
fn test_config_file_drives_policy() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("focus.toml");
    std::fs::write(
        &path,
        r#"
[focus]
focus_new = false
"#,
    )?;
    let config = AxiomFocusConfig::load(&path)?;
    assert!(!config.focus.focus_new);
    assert!(config.focus.click_to_focus);

    let script = r#"[
        {"type": "screen_added", "screen": 0},
        {"type": "client_created", "client": 1, "screen": 0, "time": 100},
        {"type": "client_created", "client": 2, "screen": 0, "time": 200}
    ]"#;
    let manager = replay(config, script)?;
    assert_eq!(manager.get_focus(), Some(ClientId(1)));
    Ok(())
}

#[tokio::test]
async fn test_shared_manager_fed_from_channel() -> Result<()> {
    let shared =
        FocusManager::new(RecordingBackend::new(), AxiomFocusConfig::default()).into_shared();
    let (tx, mut rx) = mpsc::channel::<WmEvent>(16);

    let producer = tokio::spawn(async move {
        let events = vec![
            WmEvent::ScreenAdded {
                screen: ScreenId(0),
                workspace: 0,
                time: Timestamp(1),
            },
            WmEvent::ClientCreated {
                client: ClientId(1),
                screen: ScreenId(0),
                hints: ClientHints::default(),
                time: Timestamp(10),
            },
            WmEvent::ClientCreated {
                client: ClientId(2),
                screen: ScreenId(0),
                hints: ClientHints::default(),
                time: Timestamp(20),
            },
            WmEvent::ClientUnmapped {
                client: ClientId(2),
                time: Timestamp(30),
            },
        ];
        for event in events {
            tx.send(event).await?;
        }
        anyhow::Ok(())
    });

    let consumer = {
        let shared = Arc::clone(&shared);
        tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                shared.lock().handle_event(event);
            }
        })
    };

    producer.await??;
    consumer.await?;

    let manager = shared.lock();
    assert_eq!(manager.get_focus(), Some(ClientId(1)));
    // Hand-off does not reorder the ring
    assert_eq!(manager.ring(ScreenId(0)), vec![ClientId(2), ClientId(1)]);
    Ok(())
}
