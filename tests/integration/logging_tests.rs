//! Runtime `log` records reach a `tracing-subscriber` fmt layer through
//! the `log` bridge, filtered by an `EnvFilter`, as the binary wires it.

use std::io;
use std::sync::{Arc, Mutex};

use enviroble::adapters::log_sink::LogEventSink;
use enviroble::app::events::RuntimeEvent;
use enviroble::app::ports::EventSink;
use enviroble::board::BoardModel;
use enviroble::pump::PumpState;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::MakeWriter;

/// In-memory writer shared between the subscriber and the test.
#[derive(Clone, Default)]
struct Captured(Arc<Mutex<Vec<u8>>>);

impl Captured {
    fn text(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl io::Write for Captured {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for Captured {
    type Writer = Captured;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

/// Run `emit` with a thread-local fmt subscriber and return what it wrote.
fn capture(directives: &str, emit: impl FnOnce()) -> String {
    // Global and one-shot; later calls in this process are no-ops.
    let _ = tracing_log::LogTracer::init();

    let out = Captured::default();
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(directives))
        .with_writer(out.clone())
        .with_ansi(false)
        .finish();
    tracing::subscriber::with_default(subscriber, emit);
    out.text()
}

#[test]
fn event_lines_reach_the_subscriber() {
    let text = capture("info", || {
        let mut sink = LogEventSink::new();
        sink.emit(&RuntimeEvent::Booted {
            model: BoardModel::Grow,
            characteristics: 4,
        });
        sink.emit(&RuntimeEvent::PumpChanged {
            channel: 1,
            state: PumpState::On,
        });
    });

    assert!(text.contains("BOOT | model=grow | sensor_chars=4"), "{text}");
    assert!(text.contains("PUMP | ch1 -> On"), "{text}");
    assert!(text.contains("INFO"), "{text}");
}

#[test]
fn filter_drops_records_below_its_level() {
    let text = capture("warn", || {
        let mut sink = LogEventSink::new();
        sink.emit(&RuntimeEvent::Advertising);
        sink.emit(&RuntimeEvent::InvalidWrite { handle: 42 });
    });

    assert!(!text.contains("BLE  | advertising"), "{text}");
    assert!(text.contains("ignored write to handle 42"), "{text}");
    assert!(text.contains("WARN"), "{text}");
}

#[test]
fn per_target_directive_silences_the_sink() {
    let text = capture("info,enviroble::adapters::log_sink=off", || {
        LogEventSink::new().emit(&RuntimeEvent::Disconnected);
    });
    assert!(text.is_empty(), "{text}");
}
