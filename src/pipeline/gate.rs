use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{AcquireError, OwnedSemaphorePermit, Semaphore};

/// Counting gate bounding how many units download or transcode at once.
///
/// Cloning is cheap and every clone shares the same slots. The capacity is
/// fixed at construction.
#[derive(Debug, Clone)]
pub struct Gate {
    semaphore: Arc<Semaphore>,
    capacity: usize,
    /// Slots currently held
    active: Arc<AtomicUsize>,
    /// Highest number of slots ever held at the same time
    peak: Arc<AtomicUsize>,
}

impl Gate {
    /// Default number of parallel units; downloads are I/O bound but the
    /// transcodes eat CPU and RAM
    pub const DEFAULT_CAPACITY: usize = 3;

    /// Create a gate with `capacity` slots (at least one).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            semaphore: Arc::new(Semaphore::new(capacity)),
            capacity,
            active: Arc::new(AtomicUsize::new(0)),
            peak: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Wait for a free slot.
    ///
    /// The slot is returned when the permit is dropped.
    pub async fn acquire(&self) -> Result<GatePermit, AcquireError> {
        let permit = Arc::clone(&self.semaphore).acquire_owned().await?;

        let now_active = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now_active, Ordering::SeqCst);

        Ok(GatePermit {
            _permit: permit,
            active: Arc::clone(&self.active),
        })
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn active(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }

    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

impl Default for Gate {
    fn default() -> Self {
        Self::new(Self::DEFAULT_CAPACITY)
    }
}

/// One held slot of a [`Gate`]
#[derive(Debug)]
pub struct GatePermit {
    _permit: OwnedSemaphorePermit,
    active: Arc<AtomicUsize>,
}

impl GatePermit {
    /// Give the slot back
    pub fn release(self) {}
}

impl Drop for GatePermit {
    fn drop(&mut self) {
        // Runs before `_permit` is dropped, so `active` never overshoots
        self.active.fetch_sub(1, Ordering::SeqCst);
    }
}
