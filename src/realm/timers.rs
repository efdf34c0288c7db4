//! Guarded timer capabilities.
//!
//! `setTimeout` and `setInterval` accept only a callable first argument;
//! passing source text is the classic route around an expression screener,
//! and the guard fails closed with a `TypeError` before anything is queued.
//! Callbacks are never run inline. They sit in a host-owned queue until the
//! host drives them through
//! [`Session::run_due_timers`](crate::Session::run_due_timers), and when they
//! do run they resolve every identifier through the realm, same as the
//! expression that scheduled them.

use boa_engine::object::JsObject;
use boa_engine::{Context, JsArgs, JsNativeError, JsString, JsValue, NativeFunction};
use boa_gc::{empty_trace, Finalize, Trace};
use std::cell::RefCell;
use std::rc::Rc;
use std::time::{Duration, Instant};

const LOG_TARGET: &str = "    timers";

pub(crate) type TimerHandle = Rc<RefCell<TimerQueue>>;

struct TimerEntry {
    id: u32,
    callback: JsObject,
    due: Instant,
    every: Option<Duration>,
}

/// Pending timer callbacks for one realm, ordered by due time at drain.
#[derive(Default)]
pub(crate) struct TimerQueue {
    next_id: u32,
    entries: Vec<TimerEntry>,
}

impl TimerQueue {
    fn schedule(&mut self, callback: JsObject, delay: Duration, every: Option<Duration>) -> u32 {
        self.next_id += 1;
        let id = self.next_id;
        self.entries.push(TimerEntry {
            id,
            callback,
            due: Instant::now() + delay,
            every,
        });
        id
    }

    fn cancel(&mut self, id: u32) {
        self.entries.retain(|entry| entry.id != id);
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    /// Drains every entry due at `now`, in due order. Interval entries are
    /// rescheduled for `now + period` and so fire at most once per drain.
    pub(crate) fn take_due(&mut self, now: Instant) -> Vec<(u32, JsObject)> {
        let mut due = Vec::new();
        let mut i = 0;
        while i < self.entries.len() {
            if self.entries[i].due <= now {
                due.push(self.entries.remove(i));
            } else {
                i += 1;
            }
        }
        due.sort_by_key(|entry| (entry.due, entry.id));

        let mut drained = Vec::with_capacity(due.len());
        for TimerEntry {
            id,
            callback,
            every,
            ..
        } in due
        {
            if let Some(period) = every {
                self.entries.push(TimerEntry {
                    id,
                    callback: callback.clone(),
                    due: now + period,
                    every: Some(period),
                });
            }
            drained.push((id, callback));
        }
        drained
    }
}

#[derive(Finalize)]
struct SchedulerCapture {
    queue: TimerHandle,
    name: &'static str,
    repeating: bool,
}

// SAFETY: the queue lives behind a host-owned `Rc`, outside the collected
// heap. The `JsObject` handles stored in it are rooted clones, so there is
// nothing here for the collector to trace.
unsafe impl Trace for SchedulerCapture {
    empty_trace!();
}

#[derive(Finalize)]
struct CancelCapture {
    queue: TimerHandle,
}

// SAFETY: as for `SchedulerCapture`; the queue is host-owned.
unsafe impl Trace for CancelCapture {
    empty_trace!();
}

/// Registers `setTimeout`/`setInterval`/`clearTimeout`/`clearInterval` on the
/// context and returns the queue they feed.
pub(crate) fn install(context: &mut Context) -> TimerHandle {
    let queue: TimerHandle = Rc::new(RefCell::new(TimerQueue::default()));
    register_scheduler(context, &queue, "setTimeout", false);
    register_scheduler(context, &queue, "setInterval", true);
    register_canceller(context, &queue, "clearTimeout");
    register_canceller(context, &queue, "clearInterval");
    queue
}

fn register_scheduler(
    context: &mut Context,
    queue: &TimerHandle,
    name: &'static str,
    repeating: bool,
) {
    // SAFETY: the capture type's `Trace` impl is sound; see `SchedulerCapture`.
    let native = unsafe {
        NativeFunction::from_closure_with_captures(
            move |_this, args, captures, ctx| {
                let target = args.get_or_undefined(0);
                let callback = match target.as_object() {
                    Some(object) if object.is_callable() => object.clone(),
                    _ => {
                        return Err(JsNativeError::typ()
                            .with_message(format!(
                                "{} requires a function as its first argument",
                                captures.name
                            ))
                            .into());
                    }
                };
                let millis = args.get_or_undefined(1).to_number(ctx)?.max(0.0);
                let delay = Duration::from_millis(millis as u64);
                let every = captures.repeating.then_some(delay);
                let id = captures.queue.borrow_mut().schedule(callback, delay, every);
                log::debug!(target: LOG_TARGET, "{} queued timer {id} for {millis}ms", captures.name);
                Ok(JsValue::from(id))
            },
            SchedulerCapture {
                queue: Rc::clone(queue),
                name,
                repeating,
            },
        )
    };
    let _ = context.register_global_builtin_callable(JsString::from(name), 2, native);
}

fn register_canceller(context: &mut Context, queue: &TimerHandle, name: &'static str) {
    // SAFETY: the capture type's `Trace` impl is sound; see `CancelCapture`.
    let native = unsafe {
        NativeFunction::from_closure_with_captures(
            move |_this, args, captures, ctx| {
                let id = args.get_or_undefined(0).to_u32(ctx)?;
                captures.queue.borrow_mut().cancel(id);
                Ok(JsValue::undefined())
            },
            CancelCapture {
                queue: Rc::clone(queue),
            },
        )
    };
    let _ = context.register_global_builtin_callable(JsString::from(name), 1, native);
}
