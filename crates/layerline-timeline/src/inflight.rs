//! Per-frame claims so each frame number is computed at most once at a time.
//!
//! The first requester of a frame leads and computes it; later requesters
//! wait on the leader's slot and receive the published frame directly,
//! whether or not the cache kept it. Rayon workers never park on a slot:
//! they keep running pool jobs while they wait, since the leader may need
//! the same pool to finish. A thread that already leads a frame further
//! down its stack does not wait at all.

use layerline_core::SharedFrame;
use parking_lot::{Condvar, Mutex, MutexGuard};
use std::cell::Cell;
use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;

/// How long an idle rayon worker sleeps between checks of a slot.
const WORKER_POLL: Duration = Duration::from_millis(1);

thread_local! {
    /// Claims held by the current thread.
    static LEADING: Cell<usize> = const { Cell::new(0) };
}

#[derive(Debug)]
enum State {
    Running,
    Ready(SharedFrame),
    Abandoned,
}

#[derive(Debug)]
struct Slot {
    state: Mutex<State>,
    done: Condvar,
}

/// Frame numbers currently being computed.
#[derive(Debug, Default)]
pub(crate) struct InFlight {
    pending: Mutex<HashMap<i64, Arc<Slot>>>,
}

/// Outcome of [`InFlight::claim`].
pub(crate) enum Claim<'a> {
    /// The caller computes the frame and publishes it through the guard.
    Leader(ClaimGuard<'a>),
    /// The leader finished while the caller waited.
    Shared(SharedFrame),
    /// The leader failed or was cancelled. Start over.
    Retry,
    /// The frame is in flight but this thread leads another frame below it
    /// on the stack, so waiting could never end. Compute without a claim.
    Busy,
}

impl InFlight {
    /// Claim `frame`, or wait for its current leader.
    pub(crate) fn claim(&self, frame: i64) -> Claim<'_> {
        let slot = {
            let mut pending = self.pending.lock();
            match pending.get(&frame) {
                Some(slot) => Arc::clone(slot),
                None => return Claim::Leader(self.lead(&mut pending, frame)),
            }
        };
        if LEADING.with(Cell::get) > 0 {
            return Claim::Busy;
        }
        wait(&slot)
    }

    /// Claim `frame` only if nobody is computing it.
    pub(crate) fn try_claim(&self, frame: i64) -> Option<ClaimGuard<'_>> {
        let mut pending = self.pending.lock();
        if pending.contains_key(&frame) {
            return None;
        }
        Some(self.lead(&mut pending, frame))
    }

    fn lead(&self, pending: &mut HashMap<i64, Arc<Slot>>, frame: i64) -> ClaimGuard<'_> {
        let slot = Arc::new(Slot {
            state: Mutex::new(State::Running),
            done: Condvar::new(),
        });
        pending.insert(frame, Arc::clone(&slot));
        LEADING.with(|n| n.set(n.get() + 1));
        ClaimGuard {
            owner: self,
            frame,
            slot,
            _thread: PhantomData,
        }
    }

    #[cfg(test)]
    fn is_pending(&self, frame: i64) -> bool {
        self.pending.lock().contains_key(&frame)
    }
}

fn wait(slot: &Slot) -> Claim<'static> {
    let mut state = slot.state.lock();
    loop {
        match &*state {
            State::Ready(frame) => return Claim::Shared(SharedFrame::clone(frame)),
            State::Abandoned => return Claim::Retry,
            State::Running => {}
        }
        if rayon::current_thread_index().is_none() {
            slot.done.wait(&mut state);
        } else {
            let ran = MutexGuard::unlocked(&mut state, || {
                rayon::yield_now() == Some(rayon::Yield::Executed)
            });
            if !ran {
                slot.done.wait_for(&mut state, WORKER_POLL);
            }
        }
    }
}

/// A held claim. Dropping it without [`publish`](Self::publish) tells the
/// waiters to retry.
pub(crate) struct ClaimGuard<'a> {
    owner: &'a InFlight,
    frame: i64,
    slot: Arc<Slot>,
    /// Claims are counted per thread.
    _thread: PhantomData<*const ()>,
}

impl ClaimGuard<'_> {
    /// Hand `frame` to every waiter and release the claim.
    pub(crate) fn publish(self, frame: SharedFrame) {
        *self.slot.state.lock() = State::Ready(frame);
    }
}

impl Drop for ClaimGuard<'_> {
    fn drop(&mut self) {
        self.owner.pending.lock().remove(&self.frame);
        {
            let mut state = self.slot.state.lock();
            if matches!(*state, State::Running) {
                *state = State::Abandoned;
            }
        }
        self.slot.done.notify_all();
        LEADING.with(|n| n.set(n.get().saturating_sub(1)));
    }
}
