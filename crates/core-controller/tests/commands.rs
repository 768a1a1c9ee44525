mod common;
use common::*;

use core_bridge::{BridgeCall, MemorySurface};
use core_controller::EditorController;
use core_events::{EditorEvent, ExecuteEventArgs};
use core_state::{CommandState, CommandStatus};
use pretty_assertions::assert_eq;

#[tokio::test]
async fn execute_emits_execute_render_then_commit_pair() {
    let mut h = rendered(params("<p>a</p>")).await;
    h.ctl.execute_command("bold", None).await.unwrap();
    assert_eq!(
        h.drain(),
        vec![
            EditorEvent::Execute(ExecuteEventArgs::new("bold")),
            EditorEvent::RenderRequested,
            EditorEvent::Change("<p>a</p>".into()),
            EditorEvent::ValueChanged("<p>a</p>".into()),
        ]
    );
    assert_eq!(
        h.surface.calls(),
        vec![BridgeCall::ExecCommand {
            name: "bold".into(),
            value: None
        }]
    );
}

#[tokio::test]
async fn execute_adopts_snapshot_html() {
    let mut h = rendered(params("<p>a</p>")).await;
    h.ctl
        .execute_command("insertHTML", Some("<hr>"))
        .await
        .unwrap();
    assert_eq!(h.ctl.html(), "<p>a</p><hr>");
    assert_eq!(
        commits(&h.drain()),
        vec![("<p>a</p><hr>".into(), "<p>a</p><hr>".into())]
    );

    // The snapshot came from the surface; the next pass must not echo it back.
    h.surface.clear_calls();
    h.rebind(|p| p.with_value("<p>a</p><hr>")).await;
    h.ctl.after_render(false).await.unwrap();
    assert!(h.surface.calls().is_empty());
}

#[tokio::test]
async fn every_execution_commits_exactly_once() {
    let mut h = rendered(params("")).await;
    for name in ["bold", "italic", "bold"] {
        h.ctl.execute_command(name, None).await.unwrap();
    }
    let events = h.drain();
    let changes = events
        .iter()
        .filter(|e| matches!(e, EditorEvent::Change(_)))
        .count();
    let bindings = events
        .iter()
        .filter(|e| matches!(e, EditorEvent::ValueChanged(_)))
        .count();
    assert_eq!((changes, bindings), (3, 3));
    assert_eq!(commits(&events).len(), 3);
}

#[tokio::test]
async fn command_state_reflects_latest_response_even_when_inactive() {
    let mut h = rendered(params("<p>a</p>")).await;
    h.ctl.execute_command("bold", None).await.unwrap();
    assert!(h.ctl.command_state().is_active("bold"));

    h.surface.script(
        "bold",
        CommandState::new("<p>a</p>", [("bold", CommandStatus::inactive())]),
    );
    h.ctl.execute_command("bold", None).await.unwrap();
    assert!(!h.ctl.command_state().is_active("bold"));
    assert_eq!(h.ctl.command_state().len(), 1, "replaced wholesale");
}

#[tokio::test]
async fn failed_execution_leaves_state_and_html_untouched() {
    let mut h = rendered(params("<p>a</p>")).await;
    h.ctl.execute_command("bold", None).await.unwrap();
    h.drain();
    let before = h.ctl.command_state().clone();

    h.surface.fail_next("exec_command");
    let err = h
        .ctl
        .execute_command("insertHTML", Some("<p>lost</p>"))
        .await
        .unwrap_err();
    assert!(err.to_string().contains("injected fault"));
    assert_eq!(h.ctl.command_state(), &before);
    assert_eq!(h.ctl.html(), "<p>a</p>");
    assert!(h.drain().is_empty(), "no execute, no commit");
}

#[tokio::test]
async fn execute_without_surface_propagates() {
    let mut h = harness(params("<p>a</p>").with_visible(false));
    h.ctl.after_render(true).await.unwrap();
    assert!(h.ctl.execute_command("bold", None).await.is_err());
    assert!(h.drain().is_empty());
}

#[tokio::test]
async fn selection_save_restore_pass_through() {
    let mut h = rendered(params("")).await;
    h.ctl.save_selection().await.unwrap();
    assert!(h.surface.has_saved_selection());
    h.ctl.restore_selection().await.unwrap();
    assert!(!h.surface.has_saved_selection());
    assert_eq!(h.ops(), vec!["save_selection", "restore_selection"]);
    assert!(h.drain().is_empty());
}

#[tokio::test]
async fn saved_selection_brackets_programmatic_insert() {
    let mut h = rendered(params("<p>a</p>")).await;
    h.ctl
        .with_saved_selection(async |ctl: &mut EditorController<MemorySurface>| {
            ctl.execute_command("insertHTML", Some("<img>")).await
        })
        .await
        .unwrap();
    assert_eq!(
        h.ops(),
        vec!["save_selection", "exec_command", "restore_selection"]
    );
    assert_eq!(h.ctl.html(), "<p>a</p><img>");
}

#[tokio::test]
async fn saved_selection_is_restored_when_body_fails() {
    let mut h = rendered(params("<p>a</p>")).await;
    h.surface.fail_next("exec_command");
    let res = h
        .ctl
        .with_saved_selection(async |ctl: &mut EditorController<MemorySurface>| {
            ctl.execute_command("insertHTML", Some("<img>")).await
        })
        .await;
    assert!(res.is_err());
    assert_eq!(
        h.ops(),
        vec!["save_selection", "exec_command", "restore_selection"]
    );
    assert!(!h.surface.has_saved_selection());
}
