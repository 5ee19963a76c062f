//! Timer contracts and a virtual-time adapter for headless hosts.

use std::{cell::RefCell, rc::Rc};

use crate::time::Clock;

/// Callback run once when a timer fires.
pub type TimerTask = Box<dyn FnOnce()>;

/// Opaque handle identifying a scheduled timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerHandle(pub u64);

/// Host service for fire-and-forget delayed callbacks.
pub trait TimerService {
    /// Runs `task` once after `delay_ms` milliseconds.
    fn schedule(&self, delay_ms: u64, task: TimerTask) -> TimerHandle;

    /// Cancels a timer that has not fired yet. Unknown handles are ignored.
    fn cancel(&self, handle: TimerHandle);
}

struct ScheduledTask {
    handle: TimerHandle,
    due_ms: u64,
    task: TimerTask,
}

#[derive(Default)]
struct ManualTimerState {
    now_ms: u64,
    next_handle: u64,
    queue: Vec<ScheduledTask>,
}

#[derive(Clone, Default)]
/// Virtual-time timer service and clock.
///
/// Time only moves when [`ManualTimerService::advance`] is called; due callbacks run in deadline
/// order (ties in scheduling order), each observing `now_ms()` equal to its own deadline.
pub struct ManualTimerService {
    inner: Rc<RefCell<ManualTimerState>>,
}

impl ManualTimerService {
    /// Creates a service whose clock starts at `now_ms`.
    pub fn starting_at(now_ms: u64) -> Self {
        let service = Self::default();
        service.inner.borrow_mut().now_ms = now_ms;
        service
    }

    /// Advances virtual time by `delta_ms`, running every timer that becomes due.
    ///
    /// Timers scheduled by running callbacks are honored within the same advance.
    pub fn advance(&self, delta_ms: u64) {
        let target = self.inner.borrow().now_ms.saturating_add(delta_ms);
        loop {
            let next = {
                let mut state = self.inner.borrow_mut();
                let due = state
                    .queue
                    .iter()
                    .enumerate()
                    .filter(|(_, scheduled)| scheduled.due_ms <= target)
                    .min_by_key(|(_, scheduled)| (scheduled.due_ms, scheduled.handle.0))
                    .map(|(idx, _)| idx);
                due.map(|idx| {
                    let scheduled = state.queue.remove(idx);
                    state.now_ms = state.now_ms.max(scheduled.due_ms);
                    scheduled.task
                })
            };
            match next {
                Some(task) => task(),
                None => break,
            }
        }
        self.inner.borrow_mut().now_ms = target;
    }

    /// Number of timers still waiting to fire.
    pub fn pending(&self) -> usize {
        self.inner.borrow().queue.len()
    }
}

impl Clock for ManualTimerService {
    fn now_ms(&self) -> u64 {
        self.inner.borrow().now_ms
    }
}

impl TimerService for ManualTimerService {
    fn schedule(&self, delay_ms: u64, task: TimerTask) -> TimerHandle {
        let mut state = self.inner.borrow_mut();
        state.next_handle = state.next_handle.saturating_add(1);
        let handle = TimerHandle(state.next_handle);
        let due_ms = state.now_ms.saturating_add(delay_ms);
        state.queue.push(ScheduledTask {
            handle,
            due_ms,
            task,
        });
        handle
    }

    fn cancel(&self, handle: TimerHandle) {
        self.inner
            .borrow_mut()
            .queue
            .retain(|scheduled| scheduled.handle != handle);
    }
}
