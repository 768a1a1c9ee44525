//! Editing surface bridge contract.
//!
//! The surface (the script-driven engine that owns caret, selection and DOM
//! mutation) is a black box to the controller. It is reached in two directions:
//!
//! * controller → surface: the [`SurfaceBridge`] trait, one async request per
//!   operation, every response treated as the sole truth about surface state;
//! * surface → controller: [`SurfaceNotification`]s pushed through the
//!   [`CallbackHandle`] handed to the surface at creation time.
//!
//! Notifications travel over a bounded channel so the surface never holds a
//! reference into the controller. Paste and header requests carry a oneshot
//! reply; the surface awaits it before continuing (insertion or upload).

use anyhow::Result;
use async_trait::async_trait;
use core_state::CommandState;
use std::collections::HashMap;
use std::fmt;
use tokio::sync::{mpsc, oneshot};

pub mod memory;

pub use memory::{BridgeCall, MemorySurface};

pub const NOTIFICATION_CHANNEL_CAP: usize = 256;

/// Upload header name → value, consulted by the upload transport before each upload.
pub type UploadHeaders = HashMap<String, String>;

/// Identifier of the element the surface is mounted on.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MountRef(String);

impl MountRef {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn id(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MountRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Faults a bridge implementation may raise. Controllers do not match on these; they propagate.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SurfaceError {
    #[error("no surface mounted on `{0}`")]
    NotMounted(String),
    #[error("surface already mounted on `{0}`")]
    AlreadyMounted(String),
    #[error("injected fault in `{0}`")]
    Injected(&'static str),
    #[error("controller callback channel closed")]
    CallbackClosed,
}

/// Requests the controller issues against the surface. Each call is one round-trip.
#[async_trait]
pub trait SurfaceBridge: Send + Sync {
    /// Mount a surface. `paste_intercept` asks the surface to route pastes through
    /// `callbacks` before inserting.
    async fn create(
        &self,
        mount: &MountRef,
        upload_url: Option<&str>,
        paste_intercept: bool,
        callbacks: CallbackHandle,
    ) -> Result<()>;

    async fn destroy(&self, mount: &MountRef) -> Result<()>;

    async fn exec_command(
        &self,
        mount: &MountRef,
        name: &str,
        value: Option<&str>,
    ) -> Result<CommandState>;

    async fn query_commands(&self, mount: &MountRef) -> Result<CommandState>;

    async fn save_selection(&self, mount: &MountRef) -> Result<()>;

    async fn restore_selection(&self, mount: &MountRef) -> Result<()>;

    /// Replace the surface content with raw html.
    async fn set_content(&self, mount: &MountRef, html: &str) -> Result<()>;

    /// Whether the bridge can still take requests (used when tearing down).
    fn is_available(&self) -> bool {
        true
    }
}

/// Surface → controller notifications.
#[derive(Debug)]
pub enum SurfaceNotification {
    /// Focus or caret movement.
    SelectionChanged,
    /// Any surface-side mutation, user typing included.
    ContentChanged(String),
    /// Clipboard html awaiting (possibly rewritten) html back before insertion.
    Paste {
        html: String,
        reply: oneshot::Sender<String>,
    },
    /// Upload transport asking for headers.
    HeadersRequested { reply: oneshot::Sender<UploadHeaders> },
}

impl SurfaceNotification {
    pub fn kind(&self) -> &'static str {
        match self {
            SurfaceNotification::SelectionChanged => "selection_changed",
            SurfaceNotification::ContentChanged(_) => "content_changed",
            SurfaceNotification::Paste { .. } => "paste",
            SurfaceNotification::HeadersRequested { .. } => "headers_requested",
        }
    }
}

/// Handle the surface uses to call back into its controller.
#[derive(Debug, Clone)]
pub struct CallbackHandle {
    tx: mpsc::Sender<SurfaceNotification>,
}

impl CallbackHandle {
    /// New handle plus the receiving end the controller drains.
    pub fn channel() -> (Self, mpsc::Receiver<SurfaceNotification>) {
        let (tx, rx) = mpsc::channel(NOTIFICATION_CHANNEL_CAP);
        (Self { tx }, rx)
    }

    pub async fn selection_changed(&self) -> Result<()> {
        self.send(SurfaceNotification::SelectionChanged).await
    }

    pub async fn content_changed(&self, html: impl Into<String>) -> Result<()> {
        self.send(SurfaceNotification::ContentChanged(html.into()))
            .await
    }

    /// Offer pasted html and wait for the controller's answer.
    pub async fn paste(&self, html: impl Into<String>) -> Result<String> {
        let (reply, rx) = oneshot::channel();
        self.send(SurfaceNotification::Paste {
            html: html.into(),
            reply,
        })
        .await?;
        Ok(rx.await.map_err(|_| SurfaceError::CallbackClosed)?)
    }

    pub async fn headers(&self) -> Result<UploadHeaders> {
        let (reply, rx) = oneshot::channel();
        self.send(SurfaceNotification::HeadersRequested { reply })
            .await?;
        Ok(rx.await.map_err(|_| SurfaceError::CallbackClosed)?)
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    async fn send(&self, notification: SurfaceNotification) -> Result<()> {
        let kind = notification.kind();
        self.tx.send(notification).await.map_err(|_| {
            tracing::debug!(target: "bridge.callback", kind, "controller_gone");
            SurfaceError::CallbackClosed
        })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn paste_round_trips_through_reply() {
        let (handle, mut rx) = CallbackHandle::channel();
        let answer = tokio::spawn(async move {
            match rx.recv().await {
                Some(SurfaceNotification::Paste { html, reply }) => {
                    let _ = reply.send(html.to_uppercase());
                }
                other => panic!("expected paste, got {:?}", other),
            }
        });
        let out = handle.paste("<b>hi</b>").await.unwrap();
        assert_eq!(out, "<B>HI</B>");
        answer.await.unwrap();
    }

    #[tokio::test]
    async fn headers_round_trip() {
        let (handle, mut rx) = CallbackHandle::channel();
        tokio::spawn(async move {
            if let Some(SurfaceNotification::HeadersRequested { reply }) = rx.recv().await {
                let _ = reply.send(UploadHeaders::from([("X-Id".into(), "7".into())]));
            }
        });
        let headers = handle.headers().await.unwrap();
        assert_eq!(headers.get("X-Id").map(String::as_str), Some("7"));
    }

    #[tokio::test]
    async fn dropped_controller_surfaces_callback_closed() {
        let (handle, rx) = CallbackHandle::channel();
        drop(rx);
        assert!(handle.is_closed());
        let err = handle.selection_changed().await.unwrap_err();
        assert_eq!(
            err.downcast_ref::<SurfaceError>(),
            Some(&SurfaceError::CallbackClosed)
        );
    }

    #[tokio::test]
    async fn unanswered_paste_reports_closed() {
        let (handle, mut rx) = CallbackHandle::channel();
        tokio::spawn(async move {
            // Receive and drop the reply sender without answering.
            let _ = rx.recv().await;
        });
        let err = handle.paste("x").await.unwrap_err();
        assert!(err.to_string().contains("callback channel closed"));
    }

    #[test]
    fn mount_ref_displays_id() {
        let m = MountRef::new("editor-1");
        assert_eq!(m.to_string(), "editor-1");
        assert_eq!(m.id(), "editor-1");
    }
}
