//! Process-level sink for listener faults
//!
//! A listener callback that panics during notification must not take
//! down the notification pass or the caller of `apply`. The panic is
//! caught per listener and routed here instead. By default faults are
//! logged via `tracing::error!`; a host can install its own sink once
//! at startup to collect them.

use std::any::Any;
use std::sync::OnceLock;

/// A panic captured from a listener callback during notification.
#[derive(Debug, Clone)]
pub struct ListenerFault {
    /// Diagnostic label of the holder whose notification pass caught
    /// the panic.
    pub holder: String,
    /// Panic message, when the payload was a string.
    pub message: String,
}

type Sink = Box<dyn Fn(&ListenerFault) + Send + Sync>;

static FAULT_SINK: OnceLock<Sink> = OnceLock::new();

/// Install the process-wide fault sink.
///
/// Returns `false` if a sink was already installed; the first sink
/// wins for the lifetime of the process.
pub fn set_fault_sink(sink: impl Fn(&ListenerFault) + Send + Sync + 'static) -> bool {
    FAULT_SINK.set(Box::new(sink)).is_ok()
}

/// Route a captured listener panic to the sink, or to the log when no
/// sink is installed.
pub(crate) fn report(holder: &str, payload: Box<dyn Any + Send>) {
    let fault = ListenerFault {
        holder: holder.to_string(),
        message: panic_message(payload.as_ref()),
    };
    match FAULT_SINK.get() {
        Some(sink) => sink(&fault),
        None => tracing::error!(
            holder = %fault.holder,
            "listener panicked during notification: {}",
            fault.message
        ),
    }
}

fn panic_message(payload: &dyn Any) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::holder::StateHolder;
    use std::sync::Mutex;

    static CAPTURED: Mutex<Vec<ListenerFault>> = Mutex::new(Vec::new());

    #[test]
    fn test_fault_sink_receives_listener_panic() {
        // First sink wins process-wide; other tests do not assert on
        // sink contents, so filtering by this holder's label keeps the
        // test independent of execution order.
        set_fault_sink(|fault| CAPTURED.lock().unwrap().push(fault.clone()));

        let holder = StateHolder::with_label("fault-sink-probe", 0i32);
        holder
            .add_listener(|_: &i32| panic!("probe went off"), false)
            .unwrap();
        holder.notify_listeners().unwrap();

        let captured = CAPTURED.lock().unwrap();
        let fault = captured
            .iter()
            .find(|f| f.holder == "fault-sink-probe")
            .expect("fault not routed to sink");
        assert_eq!(fault.message, "probe went off");
    }
}
