//! Surface lifecycle and value push.
//!
//! `set_parameters` is the parameter-binding hook and `after_render` the
//! reconciliation pass. Surface create happens only in `after_render`, destroy
//! only in `set_parameters` (immediately when visibility drops) or `dispose`.
//! The `SurfaceLifecycle` marker follows every successful create/destroy, so a
//! burst of visibility toggles between two passes collapses to the net edge.

use crate::EditorController;
use anyhow::Result;
use core_bridge::SurfaceBridge;
use core_config::EditorParams;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceLifecycle {
    Unmounted,
    Mounted,
}

impl SurfaceLifecycle {
    pub fn is_mounted(self) -> bool {
        matches!(self, SurfaceLifecycle::Mounted)
    }
}

impl<B: SurfaceBridge> EditorController<B> {
    /// Bind a new parameter set, recording value/visibility edges for the next pass.
    ///
    /// Visibility dropping destroys a mounted surface right away; showing it again waits for
    /// `after_render`. Before the first pass nothing is mounted, so nothing is destroyed.
    pub async fn set_parameters(&mut self, params: EditorParams) -> Result<()> {
        if params.value != self.params.value {
            self.value_changed = self.html != params.value;
            debug!(
                target: "editor.sync",
                value_changed = self.value_changed,
                size_bytes = params.value.len(),
                "bound_value_updated"
            );
        }
        let visible_changed = params.visible != self.params.visible;
        self.visible_changed |= visible_changed;
        self.params = params;

        if visible_changed && !self.params.visible {
            self.destroy_surface().await?;
        }
        Ok(())
    }

    /// Reconciliation pass: act on the recorded edges, then clear them.
    pub async fn after_render(&mut self, first_render: bool) -> Result<()> {
        let push_value = std::mem::take(&mut self.value_changed);
        if push_value {
            self.html = self.params.value.clone();
        }

        let mut created = false;
        if first_render || self.visible_changed {
            self.visible_changed = false;
            if self.params.visible && !self.surface.is_mounted() {
                if let Err(err) = self.create_surface().await {
                    // Keep the edge so the next pass retries the create.
                    self.visible_changed = !self.surface.is_mounted();
                    return Err(err);
                }
                created = true;
            }
        }

        // A fresh surface was already seeded with the adopted value.
        if push_value && !created && self.params.visible && self.surface.is_mounted() {
            debug!(target: "editor.sync", size_bytes = self.html.len(), "push_value");
            self.bridge
                .set_content(&self.params.mount, &self.html)
                .await?;
        }
        Ok(())
    }

    /// Tear down on removal from the tree. Idempotent once it has succeeded.
    ///
    /// Keys off the mount marker rather than visibility, so a surface whose hide-time destroy
    /// failed is still torn down here.
    pub async fn dispose(&mut self) -> Result<()> {
        if self.disposed {
            return Ok(());
        }
        if self.surface.is_mounted() && self.bridge.is_available() {
            self.destroy_surface().await?;
        }
        self.disposed = true;
        debug!(target: "editor.lifecycle", mount = self.params.mount.id(), "disposed");
        Ok(())
    }

    async fn create_surface(&mut self) -> Result<()> {
        let mount = &self.params.mount;
        let paste_intercept = self.paste_handler.is_some();
        info!(
            target: "editor.lifecycle",
            mount = mount.id(),
            upload = self.params.upload_url.is_some(),
            paste_intercept,
            "surface_create"
        );
        self.bridge
            .create(
                mount,
                self.params.upload_url.as_deref(),
                paste_intercept,
                self.callbacks.clone(),
            )
            .await?;
        self.surface = SurfaceLifecycle::Mounted;
        self.bridge.set_content(mount, &self.html).await
    }

    async fn destroy_surface(&mut self) -> Result<()> {
        if !self.surface.is_mounted() {
            return Ok(());
        }
        info!(target: "editor.lifecycle", mount = self.params.mount.id(), "surface_destroy");
        self.bridge.destroy(&self.params.mount).await?;
        self.surface = SurfaceLifecycle::Unmounted;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lifecycle_marker() {
        assert!(SurfaceLifecycle::Mounted.is_mounted());
        assert!(!SurfaceLifecycle::Unmounted.is_mounted());
    }
}
