mod common;
use common::*;

use std::io::Write;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::Level;
use tracing_subscriber::fmt::MakeWriter;

#[derive(Clone)]
struct BufferWriter {
    inner: Arc<Mutex<Vec<u8>>>,
}

struct LockedWriter<'a> {
    guard: MutexGuard<'a, Vec<u8>>,
}

impl Write for LockedWriter<'_> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.guard.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for BufferWriter {
    type Writer = LockedWriter<'a>;

    fn make_writer(&'a self) -> Self::Writer {
        LockedWriter {
            guard: self.inner.lock().expect("log buffer poisoned"),
        }
    }
}

#[tokio::test(flavor = "current_thread")]
async fn lifecycle_is_logged_without_document_payload() {
    let buffer = Arc::new(Mutex::new(Vec::new()));
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(Level::TRACE)
        .with_target(true)
        .with_ansi(false)
        .without_time()
        .with_writer(BufferWriter {
            inner: buffer.clone(),
        })
        .finish();
    let _guard = tracing::subscriber::set_default(subscriber);

    let secret = "<p>confidential body</p>";
    let mut h = harness(params(secret));
    h.ctl.after_render(true).await.unwrap();
    h.ctl.execute_command("bold", None).await.unwrap();
    h.surface.type_html(secret).await.unwrap();
    h.ctl.pump_notifications().await.unwrap();
    h.ctl.on_blur().await.unwrap();
    h.ctl.dispose().await.unwrap();

    let logs = String::from_utf8(buffer.lock().unwrap().clone()).unwrap();
    assert!(logs.contains("editor.lifecycle"), "logs: {logs}");
    assert!(logs.contains("surface_create"), "logs: {logs}");
    assert!(logs.contains("surface_destroy"), "logs: {logs}");
    assert!(logs.contains("execute_command"), "logs: {logs}");
    assert!(!logs.contains("confidential"), "document html leaked into logs: {logs}");
}
