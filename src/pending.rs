use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// Where the current request cycle stands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestState {
    Idle,
    AwaitingReply,
    Fulfilled,
    TimedOut,
}

#[derive(Debug)]
struct Slot {
    payload: String,
    ready: bool,
    state: RequestState,
}

/// The single "latest reply" slot shared between the caller and the
/// transport's I/O thread.
///
/// `fulfill` only takes the lock long enough to swap the payload in, so the
/// I/O thread never waits on a caller.
#[derive(Debug)]
pub struct PendingReply {
    slot: Mutex<Slot>,
    ready: Condvar,
}

impl PendingReply {
    pub fn new() -> Self {
        Self {
            slot: Mutex::new(Slot {
                payload: String::new(),
                ready: false,
                state: RequestState::Idle,
            }),
            ready: Condvar::new(),
        }
    }

    /// Clear the slot and mark it not ready; call right before sending
    pub fn rearm(&self) {
        let mut slot = self.lock();
        slot.payload.clear();
        slot.ready = false;
        slot.state = RequestState::AwaitingReply;
    }

    /// Store a reply and wake the waiter. Later replies overwrite earlier ones.
    pub fn fulfill(&self, payload: String) {
        let mut slot = self.lock();
        slot.payload = payload;
        slot.ready = true;
        if slot.state == RequestState::AwaitingReply {
            slot.state = RequestState::Fulfilled;
        }
        drop(slot);
        self.ready.notify_all();
    }

    /// Block until a reply is stored or `timeout` elapses.
    /// Returns `None` on timeout.
    pub fn wait(&self, timeout: Duration) -> Option<String> {
        let guard = self.lock();
        let (mut slot, _) = self
            .ready
            .wait_timeout_while(guard, timeout, |slot| !slot.ready)
            .unwrap_or_else(PoisonError::into_inner);

        if slot.ready {
            slot.state = RequestState::Fulfilled;
            Some(slot.payload.clone())
        } else {
            slot.state = RequestState::TimedOut;
            None
        }
    }

    pub fn state(&self) -> RequestState {
        self.lock().state
    }

    fn lock(&self) -> MutexGuard<'_, Slot> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for PendingReply {
    fn default() -> Self {
        Self::new()
    }
}
