//! In-memory log capture for asserting on emitted events.
//!
//! Workers log from spawned tasks on other runtime threads, so a
//! thread-local default subscriber would miss them. The capture layer is
//! installed as the process-wide subscriber instead, which means it must be
//! installed before anything else in the test binary sets one.

use parking_lot::{const_mutex, Mutex, MutexGuard};
use std::fmt;
use std::sync::OnceLock;
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::layer::{Context, Layer, SubscriberExt};

/// One captured log event.
#[derive(Debug, Clone)]
pub struct CapturedEvent {
    pub level: Level,
    pub target: String,
    pub message: String,
}

static EVENTS: Mutex<Vec<CapturedEvent>> = const_mutex(Vec::new());
static SERIAL: Mutex<()> = const_mutex(());
static INSTALLED: OnceLock<bool> = OnceLock::new();

struct CaptureLayer;

impl<S: Subscriber> Layer<S> for CaptureLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let mut message = MessageVisitor::default();
        event.record(&mut message);
        let metadata = event.metadata();
        EVENTS.lock().push(CapturedEvent {
            level: *metadata.level(),
            target: metadata.target().to_string(),
            message: message.0,
        });
    }
}

#[derive(Default)]
struct MessageVisitor(String);

impl Visit for MessageVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            self.0 = format!("{value:?}");
        }
    }
}

/// Exclusive access to the captured events for the duration of one test.
pub struct LogCapture {
    _serial: MutexGuard<'static, ()>,
}

/// Installs the capture subscriber on first use and starts a clean session.
///
/// Sessions are serialized across the tests of one binary.
pub fn capture() -> LogCapture {
    let installed = *INSTALLED.get_or_init(|| {
        let subscriber = tracing_subscriber::registry()
            .with(LevelFilter::DEBUG)
            .with(CaptureLayer);
        tracing::subscriber::set_global_default(subscriber).is_ok()
    });
    assert!(installed, "Another global subscriber was installed first");

    let serial = SERIAL.lock();
    EVENTS.lock().clear();
    LogCapture { _serial: serial }
}

impl LogCapture {
    /// Every event captured so far in this session.
    pub fn events(&self) -> Vec<CapturedEvent> {
        EVENTS.lock().clone()
    }

    pub fn at(&self, level: Level) -> Vec<CapturedEvent> {
        self.events()
            .into_iter()
            .filter(|event| event.level == level)
            .collect()
    }

    pub fn count(&self, level: Level) -> usize {
        self.at(level).len()
    }

    /// Messages logged at `level`, in order.
    pub fn messages(&self, level: Level) -> Vec<String> {
        self.at(level).into_iter().map(|event| event.message).collect()
    }
}
