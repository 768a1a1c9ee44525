//! Html editor controller: the host-side half of the editing surface protocol.
//!
//! The controller owns the authoritative html string and the latest
//! [`CommandState`]; the surface behind a [`SurfaceBridge`] owns caret,
//! selection and DOM. The controller keeps the two in sync:
//!
//! * parameter updates (`set_parameters`) only record edges; the following
//!   reconciliation pass (`after_render`) acts on them and clears them;
//! * surface notifications (`handle_notification` and friends) update the cached
//!   html or refresh command state, never pushing content back;
//! * commands (`execute_command`) are the single path that yields a fresh
//!   (state, html) pair and always end in a commit;
//! * commits (blur, command end) emit `Change` then `ValueChanged`.
//!
//! Value-change detection compares the new bound value against the cached html,
//! not against the previously bound value. A value that came from the surface
//! and is bound back by the host therefore never triggers a push into the
//! surface again.
//!
//! All methods take `&mut self` and await each bridge round-trip before moving
//! on, so requests from one controller reach the surface in call order.

use anyhow::Result;
use core_bridge::{CallbackHandle, SurfaceBridge, SurfaceNotification};
use core_config::EditorParams;
use core_events::{EditorEvent, PasteHandler};
use core_state::CommandState;
use std::sync::Arc;
use tokio::sync::mpsc::{Receiver, Sender};

mod command;
mod lifecycle;
mod notify;

pub use lifecycle::SurfaceLifecycle;

/// Base css class of the editor host element.
pub const CSS_CLASS: &str = "html-editor";

pub struct EditorController<B: SurfaceBridge> {
    bridge: B,
    params: EditorParams,
    html: String,
    state: CommandState,
    // Edge detectors: set by `set_parameters`, consumed by the next `after_render`.
    visible_changed: bool,
    value_changed: bool,
    surface: SurfaceLifecycle,
    disposed: bool,
    events: Sender<EditorEvent>,
    paste_handler: Option<Arc<dyn PasteHandler>>,
    callbacks: CallbackHandle,
    notifications: Receiver<SurfaceNotification>,
}

impl<B: SurfaceBridge> std::fmt::Debug for EditorController<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EditorController")
            .field("mount", &self.params.mount)
            .field("visible", &self.params.visible)
            .field("html_len", &self.html.len())
            .field("surface", &self.surface)
            .field("visible_changed", &self.visible_changed)
            .field("value_changed", &self.value_changed)
            .finish()
    }
}

impl<B: SurfaceBridge> EditorController<B> {
    /// Initial activation: the cached html starts as the bound value. No bridge call is made
    /// until the first `after_render`.
    pub fn new(bridge: B, params: EditorParams, events: Sender<EditorEvent>) -> Self {
        let (callbacks, notifications) = CallbackHandle::channel();
        tracing::debug!(
            target: "editor.lifecycle",
            mount = params.mount.id(),
            visible = params.visible,
            size_bytes = params.value.len(),
            "controller_initialized"
        );
        Self {
            bridge,
            html: params.value.clone(),
            params,
            state: CommandState::default(),
            visible_changed: false,
            value_changed: false,
            surface: SurfaceLifecycle::Unmounted,
            disposed: false,
            events,
            paste_handler: None,
            callbacks,
            notifications,
        }
    }

    /// Attach a paste handler. Must happen before the surface is created for the surface to
    /// route pastes through the controller.
    pub fn with_paste_handler(mut self, handler: impl PasteHandler) -> Self {
        self.paste_handler = Some(Arc::new(handler));
        self
    }

    /// Cached document value.
    pub fn html(&self) -> &str {
        &self.html
    }

    pub fn command_state(&self) -> &CommandState {
        &self.state
    }

    pub fn params(&self) -> &EditorParams {
        &self.params
    }

    pub fn bridge(&self) -> &B {
        &self.bridge
    }

    pub fn surface(&self) -> SurfaceLifecycle {
        self.surface
    }

    pub fn paste_intercept_requested(&self) -> bool {
        self.paste_handler.is_some()
    }

    /// Handle the surface uses to notify this controller (same one passed to `create`).
    pub fn callback_handle(&self) -> CallbackHandle {
        self.callbacks.clone()
    }

    pub fn css_class(&self) -> String {
        match self.params.css_class.as_deref() {
            Some(extra) if !extra.trim().is_empty() => format!("{CSS_CLASS} {}", extra.trim()),
            _ => CSS_CLASS.to_owned(),
        }
    }

    /// Blur is a commit point.
    pub async fn on_blur(&mut self) -> Result<()> {
        tracing::debug!(target: "editor.sync", "blur");
        self.commit().await;
        Ok(())
    }

    /// Focus refreshes command state; it never commits.
    pub async fn on_focus(&mut self) -> Result<()> {
        self.update_command_state().await
    }

    async fn commit(&self) {
        core_events::emit_commit(&self.events, &self.html).await;
    }

    async fn request_render(&self) {
        core_events::emit(&self.events, EditorEvent::RenderRequested).await;
    }
}
