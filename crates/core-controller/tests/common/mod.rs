#![allow(dead_code)] // Shared across integration tests; each test binary uses a subset of helpers.

use core_bridge::{BridgeCall, MemorySurface};
use core_config::EditorParams;
use core_controller::EditorController;
use core_events::{EditorEvent, PasteHandler};
use tokio::sync::mpsc::{self, Receiver};

pub const MOUNT: &str = "editor";

pub struct Harness {
    pub ctl: EditorController<MemorySurface>,
    pub surface: MemorySurface,
    pub events: Receiver<EditorEvent>,
}

pub fn params(value: &str) -> EditorParams {
    EditorParams::new(MOUNT).with_value(value)
}

pub fn harness(params: EditorParams) -> Harness {
    let surface = MemorySurface::new();
    let (tx, events) = mpsc::channel(64);
    let ctl = EditorController::new(surface.clone(), params, tx);
    Harness {
        ctl,
        surface,
        events,
    }
}

pub fn harness_with_paste(params: EditorParams, handler: impl PasteHandler) -> Harness {
    let mut h = harness(params.clone());
    let (tx, events) = mpsc::channel(64);
    h.ctl = EditorController::new(h.surface.clone(), params, tx).with_paste_handler(handler);
    h.events = events;
    h
}

/// Harness after its first reconciliation pass, with the call log and event queue cleared.
pub async fn rendered(params: EditorParams) -> Harness {
    first_pass(harness(params)).await
}

pub async fn first_pass(mut h: Harness) -> Harness {
    h.ctl.after_render(true).await.unwrap();
    h.surface.clear_calls();
    h.drain();
    h
}

impl Harness {
    pub fn drain(&mut self) -> Vec<EditorEvent> {
        let mut out = Vec::new();
        while let Ok(ev) = self.events.try_recv() {
            out.push(ev);
        }
        out
    }

    pub fn ops(&self) -> Vec<&'static str> {
        self.surface.calls().iter().map(BridgeCall::op).collect()
    }

    /// Rebind parameters derived from the current ones.
    pub async fn rebind(&mut self, f: impl FnOnce(EditorParams) -> EditorParams) {
        let next = f(self.ctl.params().clone());
        self.ctl.set_parameters(next).await.unwrap();
    }
}

pub fn commits(events: &[EditorEvent]) -> Vec<(String, String)> {
    events
        .windows(2)
        .filter_map(|w| match (&w[0], &w[1]) {
            (EditorEvent::Change(a), EditorEvent::ValueChanged(b)) => Some((a.clone(), b.clone())),
            _ => None,
        })
        .collect()
}
