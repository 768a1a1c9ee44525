use crate::EditorController;
use anyhow::Result;
use core_bridge::SurfaceBridge;
use core_events::{EXECUTE_TOTAL, EditorEvent, ExecuteEventArgs};
use std::sync::atomic::Ordering;
use tracing::debug;

impl<B: SurfaceBridge> EditorController<B> {
    /// Run a named surface command and commit its result.
    ///
    /// The response replaces the command state wholesale and its html becomes the cached
    /// document before the commit. A failed round-trip leaves both untouched and emits nothing.
    pub async fn execute_command(&mut self, name: &str, value: Option<&str>) -> Result<()> {
        debug!(target: "editor.command", name, has_value = value.is_some(), "execute_command");
        let state = self
            .bridge
            .exec_command(&self.params.mount, name, value)
            .await?;
        self.state = state;
        EXECUTE_TOTAL.fetch_add(1, Ordering::Relaxed);

        core_events::emit(&self.events, EditorEvent::Execute(ExecuteEventArgs::new(name))).await;
        self.request_render().await;

        self.html = self.state.html().to_owned();
        debug!(
            target: "editor.command",
            name,
            active = self.state.is_active(name),
            size_bytes = self.html.len(),
            "command_applied"
        );
        self.commit().await;
        Ok(())
    }

    pub async fn save_selection(&mut self) -> Result<()> {
        self.bridge.save_selection(&self.params.mount).await
    }

    pub async fn restore_selection(&mut self) -> Result<()> {
        self.bridge.restore_selection(&self.params.mount).await
    }

    /// Run `f` between a selection save and restore. The restore happens even when `f` fails;
    /// `f`'s error wins over a restore error.
    pub async fn with_saved_selection<T, F>(&mut self, f: F) -> Result<T>
    where
        F: AsyncFnOnce(&mut Self) -> Result<T>,
    {
        self.save_selection().await?;
        let out = f(&mut *self).await;
        let restored = self.restore_selection().await;
        let value = out?;
        restored?;
        Ok(value)
    }

    /// Re-query the surface; the answer replaces the command state wholesale.
    pub(crate) async fn update_command_state(&mut self) -> Result<()> {
        self.state = self.bridge.query_commands(&self.params.mount).await?;
        debug!(target: "editor.command", commands = self.state.len(), "state_refreshed");
        self.request_render().await;
        Ok(())
    }
}
