//! Surface → controller notifications.
//!
//! None of these push content into the surface and none of them commit: a
//! content change only updates the cached html, a selection change only
//! refreshes command state, a paste only answers with (possibly rewritten) html.

use crate::EditorController;
use anyhow::Result;
use core_bridge::{SurfaceBridge, SurfaceNotification, UploadHeaders};
use tracing::{debug, trace};

impl<B: SurfaceBridge> EditorController<B> {
    /// Focus or caret movement on the surface.
    pub async fn on_selection_change(&mut self) -> Result<()> {
        self.update_command_state().await
    }

    /// Surface-side mutation. Adopted as the cached document; the next commit publishes it.
    pub fn on_content_change(&mut self, html: impl Into<String>) {
        self.html = html.into();
        trace!(target: "editor.notify", size_bytes = self.html.len(), "content_changed");
    }

    /// Pasted html in, html to insert out. Without a handler the input passes through.
    pub async fn on_paste(&self, html: impl Into<String>) -> String {
        let html = html.into();
        match &self.paste_handler {
            Some(handler) => core_events::intercept_paste(handler.as_ref(), html).await,
            None => html,
        }
    }

    /// Headers for the upload transport; never absent.
    pub fn upload_headers(&self) -> UploadHeaders {
        self.params.upload_headers.clone().unwrap_or_default()
    }

    pub async fn handle_notification(&mut self, notification: SurfaceNotification) -> Result<()> {
        debug!(target: "editor.notify", kind = notification.kind(), "notification");
        match notification {
            SurfaceNotification::SelectionChanged => self.on_selection_change().await?,
            SurfaceNotification::ContentChanged(html) => self.on_content_change(html),
            SurfaceNotification::Paste { html, reply } => {
                let out = self.on_paste(html).await;
                if reply.send(out).is_err() {
                    debug!(target: "editor.notify", "paste_reply_dropped");
                }
            }
            SurfaceNotification::HeadersRequested { reply } => {
                if reply.send(self.upload_headers()).is_err() {
                    debug!(target: "editor.notify", "headers_reply_dropped");
                }
            }
        }
        Ok(())
    }

    /// Handle every notification already queued, without waiting. Returns how many ran.
    pub async fn pump_notifications(&mut self) -> Result<usize> {
        let mut handled = 0;
        while let Ok(notification) = self.notifications.try_recv() {
            self.handle_notification(notification).await?;
            handled += 1;
        }
        Ok(handled)
    }

    /// Wait for the next notification and handle it.
    pub async fn process_next_notification(&mut self) -> Result<()> {
        // The controller keeps a sender alive, so the channel never reports closed.
        if let Some(notification) = self.notifications.recv().await {
            self.handle_notification(notification).await?;
        }
        Ok(())
    }
}
