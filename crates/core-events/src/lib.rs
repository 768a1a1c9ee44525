//! Outward event types and channel helpers for the html editor controller.
//!
//! Everything the controller tells the application travels through one bounded
//! channel of [`EditorEvent`]s, except paste interception, which needs a
//! mutate-and-return answer and therefore goes through a [`PasteHandler`].

use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::mpsc::Sender;

// -------------------------------------------------------------------------------------------------
// Channel Policy
// -------------------------------------------------------------------------------------------------
// Outward events use a bounded mpsc channel sized by `EVENT_CHANNEL_CAP`. The controller awaits
// `send`, so a slow consumer applies backpressure to the controller instead of losing commits.
// A dropped receiver is not fatal: the controller keeps the document authoritative and the failure
// is counted and logged.
// -------------------------------------------------------------------------------------------------
pub const EVENT_CHANNEL_CAP: usize = 1024;

// -------------------------------------------------------------------------------------------------
// Telemetry
// -------------------------------------------------------------------------------------------------
pub static CHANNEL_SEND_FAILURES: AtomicU64 = AtomicU64::new(0);
pub static COMMITS_TOTAL: AtomicU64 = AtomicU64::new(0); // change + value-changed pairs emitted
pub static EXECUTE_TOTAL: AtomicU64 = AtomicU64::new(0);
pub static PASTE_INTERCEPTS: AtomicU64 = AtomicU64::new(0);
pub static PASTE_REWRITES: AtomicU64 = AtomicU64::new(0); // handler returned different html

/// Events surfaced to the application, in emission order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditorEvent {
    /// Generic change notification carrying the committed document.
    Change(String),
    /// Value-binding update; always follows a `Change` with the same payload.
    ValueChanged(String),
    /// A command went through the controller. Observe-only.
    Execute(ExecuteEventArgs),
    /// Controller-visible state changed (command state refresh); the host should re-render.
    RenderRequested,
}

impl EditorEvent {
    /// Stable discriminant name for logging (payloads are never logged).
    pub fn kind(&self) -> &'static str {
        match self {
            EditorEvent::Change(_) => "change",
            EditorEvent::ValueChanged(_) => "value_changed",
            EditorEvent::Execute(_) => "execute",
            EditorEvent::RenderRequested => "render_requested",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecuteEventArgs {
    pub command_name: String,
}

impl ExecuteEventArgs {
    pub fn new(command_name: impl Into<String>) -> Self {
        Self {
            command_name: command_name.into(),
        }
    }
}

/// Paste payload offered to a [`PasteHandler`]. Handlers rewrite `html` in place; whatever it
/// holds when the handler returns is what the surface inserts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasteEventArgs {
    pub html: String,
}

impl PasteEventArgs {
    pub fn new(html: impl Into<String>) -> Self {
        Self { html: html.into() }
    }
}

/// Paste interception hook. Attaching one is what opts the surface into paste interception.
///
/// Handlers receive plain data only; they cannot reach back into the controller.
#[async_trait]
pub trait PasteHandler: Send + Sync + 'static {
    async fn on_paste(&self, args: &mut PasteEventArgs);
}

/// Plain closures work as synchronous handlers.
#[async_trait]
impl<F> PasteHandler for F
where
    F: Fn(&mut PasteEventArgs) + Send + Sync + 'static,
{
    async fn on_paste(&self, args: &mut PasteEventArgs) {
        (self)(args)
    }
}

/// Send one event, counting (not propagating) a closed channel.
pub async fn emit(tx: &Sender<EditorEvent>, event: EditorEvent) {
    let kind = event.kind();
    if tx.send(event).await.is_err() {
        CHANNEL_SEND_FAILURES.fetch_add(1, Ordering::Relaxed);
        tracing::warn!(target: "editor.events", kind, "event_receiver_closed");
    } else {
        tracing::trace!(target: "editor.events", kind, "event_emitted");
    }
}

/// Emit the commit pair: `Change` then `ValueChanged`, identical payloads.
pub async fn emit_commit(tx: &Sender<EditorEvent>, html: &str) {
    emit(tx, EditorEvent::Change(html.to_owned())).await;
    emit(tx, EditorEvent::ValueChanged(html.to_owned())).await;
    COMMITS_TOTAL.fetch_add(1, Ordering::Relaxed);
    tracing::debug!(target: "editor.events", size_bytes = html.len(), "commit");
}

/// Run `handler` over `html`, returning the (possibly rewritten) payload.
pub async fn intercept_paste(handler: &dyn PasteHandler, html: String) -> String {
    PASTE_INTERCEPTS.fetch_add(1, Ordering::Relaxed);
    let before = html.len();
    let mut args = PasteEventArgs::new(html.clone());
    handler.on_paste(&mut args).await;
    if args.html != html {
        PASTE_REWRITES.fetch_add(1, Ordering::Relaxed);
    }
    tracing::debug!(
        target: "editor.events",
        size_bytes_in = before,
        size_bytes_out = args.html.len(),
        "paste_intercepted"
    );
    args.html
}
