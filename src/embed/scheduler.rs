//! Delayed callbacks behind a trait so the loader can be driven by a fake clock
//! in tests and by `window.setTimeout` in the browser.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use log::error;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::Window;

/// Identifier handed out by a `Scheduler`. Never reused within one scheduler.
pub type TimerId = u32;

pub trait Scheduler {
    /// Arm a one-shot timer. When it fires, the owner is expected to call
    /// `GameEmbedLoader::on_timer` with the returned id.
    fn schedule(&mut self, delay_ms: u32) -> TimerId;

    /// Disarm `id`. Unknown or already-fired ids are ignored.
    fn cancel(&mut self, id: TimerId);
}


type FireCallback = Rc<dyn Fn(TimerId)>;
type TimerCallback = Closure<dyn FnMut()>;

/// `setTimeout` backed scheduler. Each pending timer keeps its browser handle
/// and its closure; `cancel` clears the handle and drops the closure.
pub struct BrowserScheduler {
    window: Window,
    next_id: TimerId,
    pending: Rc<RefCell<HashMap<TimerId, (i32, TimerCallback)>>>,
    // Closure of the last timer that fired. It cannot free itself while
    // running, so the next firing drops it.
    spent: Rc<RefCell<Option<TimerCallback>>>,
    on_fire: FireCallback,
}

impl BrowserScheduler {
    pub fn new(window: Window, on_fire: impl Fn(TimerId) + 'static) -> Self {
        Self {
            window,
            next_id: 0,
            pending: Rc::new(RefCell::new(HashMap::new())),
            spent: Rc::new(RefCell::new(None)),
            on_fire: Rc::new(on_fire),
        }
    }

    /// Timers armed and neither fired nor cancelled.
    pub fn pending_count(&self) -> usize {
        self.pending.borrow().len()
    }
}

impl Scheduler for BrowserScheduler {
    fn schedule(&mut self, delay_ms: u32) -> TimerId {
        self.next_id += 1;
        let id = self.next_id;
        let pending = self.pending.clone();
        let spent = self.spent.clone();
        let on_fire = self.on_fire.clone();
        let callback: TimerCallback = Closure::once(move || {
            let fired = pending.borrow_mut().remove(&id).map(|(_, closure)| closure);
            // Replaces (and drops) the previous spent closure; this one is still on the stack.
            *spent.borrow_mut() = fired;
            on_fire(id);
        });
        match self
            .window
            .set_timeout_with_callback_and_timeout_and_arguments_0(
                callback.as_ref().unchecked_ref(),
                delay_ms.min(i32::MAX as u32) as i32,
            ) {
            Ok(handle) => {
                self.pending.borrow_mut().insert(id, (handle, callback));
            }
            Err(e) => error!("setTimeout failed for timer {id}: {e:?}"),
        }
        id
    }

    fn cancel(&mut self, id: TimerId) {
        let removed = self.pending.borrow_mut().remove(&id);
        if let Some((handle, _callback)) = removed {
            self.window.clear_timeout_with_handle(handle);
        }
    }
}
