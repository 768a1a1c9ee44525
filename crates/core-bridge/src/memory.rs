//! In-process surface used by tests and the demo binary.
//!
//! `MemorySurface` keeps just enough state to answer every bridge request
//! (content, active command set, mounted flag) and records each call so callers
//! can assert on the exact request sequence. It does not model a DOM; commands
//! without a value toggle their active flag, a few value commands edit content.
//!
//! Clones share state, so a test can keep one handle while the controller owns
//! another, and use the simulation helpers (`type_html`, `focus`, `paste`) to
//! play the surface side of the protocol.

use crate::{CallbackHandle, MountRef, SurfaceBridge, SurfaceError, UploadHeaders};
use anyhow::Result;
use async_trait::async_trait;
use core_state::{CommandState, CommandStatus};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, trace};

/// One recorded bridge request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BridgeCall {
    Create {
        mount: MountRef,
        upload_url: Option<String>,
        paste_intercept: bool,
    },
    Destroy {
        mount: MountRef,
    },
    ExecCommand {
        name: String,
        value: Option<String>,
    },
    QueryCommands,
    SaveSelection,
    RestoreSelection,
    SetContent {
        html: String,
    },
}

impl BridgeCall {
    pub fn op(&self) -> &'static str {
        match self {
            BridgeCall::Create { .. } => "create",
            BridgeCall::Destroy { .. } => "destroy",
            BridgeCall::ExecCommand { .. } => "exec_command",
            BridgeCall::QueryCommands => "query_commands",
            BridgeCall::SaveSelection => "save_selection",
            BridgeCall::RestoreSelection => "restore_selection",
            BridgeCall::SetContent { .. } => "set_content",
        }
    }
}

struct Mounted {
    mount: MountRef,
    callbacks: CallbackHandle,
    paste_intercept: bool,
    upload_url: Option<String>,
}

#[derive(Default)]
struct Inner {
    mounted: Option<Mounted>,
    content: String,
    active: BTreeSet<String>,
    values: BTreeMap<String, String>,
    disabled: BTreeSet<String>,
    scripted: HashMap<String, CommandState>,
    saved_selection: bool,
    fail_next: Option<&'static str>,
    calls: Vec<BridgeCall>,
}

#[derive(Clone, Default)]
pub struct MemorySurface {
    inner: Arc<Mutex<Inner>>,
    unavailable: Arc<AtomicBool>,
}

impl std::fmt::Debug for MemorySurface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.lock();
        f.debug_struct("MemorySurface")
            .field("mounted", &inner.mounted.as_ref().map(|m| m.mount.id().to_owned()))
            .field("content_len", &inner.content.len())
            .field("calls", &inner.calls.len())
            .finish()
    }
}

impl MemorySurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark commands as disabled; executing them still succeeds but reports `enabled = false`.
    pub fn with_disabled<I, S>(self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.lock()
            .disabled
            .extend(names.into_iter().map(Into::into));
        self
    }

    /// Answer the next `exec_command(name, ..)` with `state` verbatim (content adopts its html).
    pub fn script(&self, name: impl Into<String>, state: CommandState) {
        self.lock().scripted.insert(name.into(), state);
    }

    /// Make the next call of operation `op` (e.g. `"exec_command"`) fail.
    pub fn fail_next(&self, op: &'static str) {
        self.lock().fail_next = Some(op);
    }

    pub fn set_available(&self, available: bool) {
        self.unavailable.store(!available, Ordering::SeqCst);
    }

    pub fn calls(&self) -> Vec<BridgeCall> {
        self.lock().calls.clone()
    }

    pub fn count(&self, op: &str) -> usize {
        self.lock().calls.iter().filter(|c| c.op() == op).count()
    }

    pub fn clear_calls(&self) {
        self.lock().calls.clear();
    }

    pub fn content(&self) -> String {
        self.lock().content.clone()
    }

    pub fn is_mounted(&self) -> bool {
        self.lock().mounted.is_some()
    }

    pub fn paste_intercept(&self) -> Option<bool> {
        self.lock().mounted.as_ref().map(|m| m.paste_intercept)
    }

    pub fn upload_url(&self) -> Option<String> {
        self.lock()
            .mounted
            .as_ref()
            .and_then(|m| m.upload_url.clone())
    }

    pub fn has_saved_selection(&self) -> bool {
        self.lock().saved_selection
    }

    // ---------------------------------------------------------------------------------------------
    // Surface-side simulation
    // ---------------------------------------------------------------------------------------------

    /// User edit: replace content and notify the controller.
    pub async fn type_html(&self, html: impl Into<String>) -> Result<()> {
        let html = html.into();
        let callbacks = {
            let mut inner = self.lock();
            inner.content = html.clone();
            Self::callbacks(&inner)?
        };
        callbacks.content_changed(html).await
    }

    /// Focus or caret move.
    pub async fn focus(&self) -> Result<()> {
        let callbacks = Self::callbacks(&self.lock())?;
        callbacks.selection_changed().await
    }

    /// Clipboard paste. When interception was requested the controller's answer is inserted,
    /// otherwise the raw html. Returns the inserted html.
    pub async fn paste(&self, html: impl Into<String>) -> Result<String> {
        let html = html.into();
        let (callbacks, intercept) = {
            let inner = self.lock();
            let callbacks = Self::callbacks(&inner)?;
            let intercept = inner.mounted.as_ref().is_some_and(|m| m.paste_intercept);
            (callbacks, intercept)
        };
        let inserted = if intercept {
            callbacks.paste(html).await?
        } else {
            html
        };
        let content = {
            let mut inner = self.lock();
            inner.content.push_str(&inserted);
            inner.content.clone()
        };
        callbacks.content_changed(content).await?;
        Ok(inserted)
    }

    /// Upload transport asking for headers.
    pub async fn upload_headers(&self) -> Result<UploadHeaders> {
        let callbacks = Self::callbacks(&self.lock())?;
        callbacks.headers().await
    }

    fn callbacks(inner: &Inner) -> Result<CallbackHandle> {
        match &inner.mounted {
            Some(m) => Ok(m.callbacks.clone()),
            None => Err(SurfaceError::NotMounted("<none>".into()).into()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // A panicking test thread must not wedge the other handles.
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Record `call`, then apply fault injection and the mount check.
    fn begin(&self, call: BridgeCall, mount: &MountRef) -> Result<MutexGuard<'_, Inner>> {
        let op = call.op();
        trace!(target: "bridge.memory", op, mount = mount.id(), "call");
        let mut inner = self.lock();
        inner.calls.push(call);
        if inner.fail_next == Some(op) {
            inner.fail_next = None;
            debug!(target: "bridge.memory", op, "injected_fault");
            return Err(SurfaceError::Injected(op).into());
        }
        if op != "create" && inner.mounted.as_ref().is_none_or(|m| &m.mount != mount) {
            return Err(SurfaceError::NotMounted(mount.id().to_owned()).into());
        }
        Ok(inner)
    }

    fn snapshot(inner: &Inner) -> CommandState {
        let names: BTreeSet<&String> = inner
            .active
            .iter()
            .chain(inner.values.keys())
            .chain(inner.disabled.iter())
            .collect();
        CommandState::new(
            inner.content.clone(),
            names.into_iter().map(|name| {
                let status = CommandStatus {
                    active: inner.active.contains(name),
                    enabled: !inner.disabled.contains(name),
                    value: inner.values.get(name).cloned(),
                };
                (name.clone(), status)
            }),
        )
    }

    fn apply(inner: &mut Inner, name: &str, value: Option<&str>) {
        match (name, value) {
            ("insertHTML" | "insertText", Some(v)) => inner.content.push_str(v),
            ("removeFormat", _) => inner.active.clear(),
            ("selectAll", _) | ("undo", _) | ("redo", _) => {}
            (_, Some(v)) => {
                inner.values.insert(name.to_owned(), v.to_owned());
            }
            (_, None) => {
                if !inner.active.remove(name) {
                    inner.active.insert(name.to_owned());
                }
            }
        }
    }
}

#[async_trait]
impl SurfaceBridge for MemorySurface {
    async fn create(
        &self,
        mount: &MountRef,
        upload_url: Option<&str>,
        paste_intercept: bool,
        callbacks: CallbackHandle,
    ) -> Result<()> {
        let call = BridgeCall::Create {
            mount: mount.clone(),
            upload_url: upload_url.map(str::to_owned),
            paste_intercept,
        };
        let mut inner = self.begin(call, mount)?;
        if inner.mounted.is_some() {
            return Err(SurfaceError::AlreadyMounted(mount.id().to_owned()).into());
        }
        inner.mounted = Some(Mounted {
            mount: mount.clone(),
            callbacks,
            paste_intercept,
            upload_url: upload_url.map(str::to_owned),
        });
        inner.saved_selection = false;
        debug!(target: "bridge.memory", mount = mount.id(), paste_intercept, "mounted");
        Ok(())
    }

    async fn destroy(&self, mount: &MountRef) -> Result<()> {
        let mut inner = self.begin(
            BridgeCall::Destroy {
                mount: mount.clone(),
            },
            mount,
        )?;
        inner.mounted = None;
        inner.content.clear();
        inner.active.clear();
        inner.values.clear();
        debug!(target: "bridge.memory", mount = mount.id(), "unmounted");
        Ok(())
    }

    async fn exec_command(
        &self,
        mount: &MountRef,
        name: &str,
        value: Option<&str>,
    ) -> Result<CommandState> {
        let call = BridgeCall::ExecCommand {
            name: name.to_owned(),
            value: value.map(str::to_owned),
        };
        let mut inner = self.begin(call, mount)?;
        if let Some(state) = inner.scripted.remove(name) {
            inner.content = state.html().to_owned();
            return Ok(state);
        }
        Self::apply(&mut inner, name, value);
        Ok(Self::snapshot(&inner))
    }

    async fn query_commands(&self, mount: &MountRef) -> Result<CommandState> {
        let inner = self.begin(BridgeCall::QueryCommands, mount)?;
        Ok(Self::snapshot(&inner))
    }

    async fn save_selection(&self, mount: &MountRef) -> Result<()> {
        let mut inner = self.begin(BridgeCall::SaveSelection, mount)?;
        inner.saved_selection = true;
        Ok(())
    }

    async fn restore_selection(&self, mount: &MountRef) -> Result<()> {
        let mut inner = self.begin(BridgeCall::RestoreSelection, mount)?;
        inner.saved_selection = false;
        Ok(())
    }

    async fn set_content(&self, mount: &MountRef, html: &str) -> Result<()> {
        let call = BridgeCall::SetContent {
            html: html.to_owned(),
        };
        let mut inner = self.begin(call, mount)?;
        inner.content = html.to_owned();
        Ok(())
    }

    fn is_available(&self) -> bool {
        !self.unavailable.load(Ordering::SeqCst)
    }
}
