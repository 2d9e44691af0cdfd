use std::fmt::{Debug, Formatter};
use std::sync::Arc;

/// Line-oriented request/response log sink.
///
/// Each call receives one line; multi-line messages are split before emission.
#[derive(Clone)]
pub struct DebugLog(Arc<dyn Fn(&str) + Send + Sync>);

impl DebugLog {
    pub fn new(sink: impl Fn(&str) + Send + Sync + 'static) -> Self {
        Self(Arc::new(sink))
    }

    pub fn stdout() -> Self {
        Self::new(|line| println!("{line}"))
    }

    pub fn stderr() -> Self {
        Self::new(|line| eprintln!("{line}"))
    }

    pub fn emit(&self, message: &str) {
        for line in message.lines() {
            (self.0)(line);
        }
    }
}

impl Debug for DebugLog {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str("DebugLog(..)")
    }
}
