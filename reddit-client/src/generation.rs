use std::sync::atomic::{AtomicU64, Ordering};

/// Identifies one fetch invocation. Only the most recent ticket is current.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GenerationTicket(u64);

impl GenerationTicket {
    pub fn value(&self) -> u64 {
        self.0
    }
}

/// Counter used to discard results of superseded requests.
#[derive(Debug, Default)]
pub struct RequestGeneration {
    current: AtomicU64,
}

impl RequestGeneration {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a new generation, making every earlier ticket stale.
    pub fn begin(&self) -> GenerationTicket {
        GenerationTicket(self.current.fetch_add(1, Ordering::SeqCst) + 1)
    }

    pub fn is_current(&self, ticket: GenerationTicket) -> bool {
        self.current.load(Ordering::SeqCst) == ticket.0
    }
}
