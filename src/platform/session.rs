//! Per-session browser resources
//!
//! Everything a running session registers with the browser (key listeners,
//! interval timers, the animation-frame loop) is held by a [`SessionScope`]
//! and unregistered when the scope drops. Restarting replaces the scope, so
//! callbacks from the previous session can never fire again.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use wasm_bindgen::prelude::*;
use web_sys::{Event, EventTarget, Window};

/// DOM event listener removed on drop
pub struct EventListener {
    target: EventTarget,
    kind: &'static str,
    callback: Closure<dyn FnMut(Event)>,
}

impl EventListener {
    pub fn new(
        target: &EventTarget,
        kind: &'static str,
        handler: impl FnMut(Event) + 'static,
    ) -> Result<Self, JsValue> {
        let callback = Closure::wrap(Box::new(handler) as Box<dyn FnMut(Event)>);
        target.add_event_listener_with_callback(kind, callback.as_ref().unchecked_ref())?;
        Ok(Self {
            target: target.clone(),
            kind,
            callback,
        })
    }
}

impl Drop for EventListener {
    fn drop(&mut self) {
        let _ = self
            .target
            .remove_event_listener_with_callback(self.kind, self.callback.as_ref().unchecked_ref());
    }
}

/// `setInterval` timer cleared on drop
pub struct IntervalTimer {
    window: Window,
    handle: i32,
    _callback: Closure<dyn FnMut()>,
}

impl IntervalTimer {
    pub fn new(
        window: &Window,
        period_ms: i32,
        handler: impl FnMut() + 'static,
    ) -> Result<Self, JsValue> {
        let callback = Closure::wrap(Box::new(handler) as Box<dyn FnMut()>);
        let handle = window.set_interval_with_callback_and_timeout_and_arguments_0(
            callback.as_ref().unchecked_ref(),
            period_ms,
        )?;
        Ok(Self {
            window: window.clone(),
            handle,
            _callback: callback,
        })
    }
}

impl Drop for IntervalTimer {
    fn drop(&mut self) {
        self.window.clear_interval_with_handle(self.handle);
    }
}

/// What the frame callback wants next
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopControl {
    Continue,
    Stop,
}

struct FrameLoopInner {
    window: Window,
    handle: Cell<Option<i32>>,
    callback: RefCell<Option<Closure<dyn FnMut(f64)>>>,
}

impl FrameLoopInner {
    fn schedule(&self) {
        if let Some(callback) = self.callback.borrow().as_ref() {
            match self
                .window
                .request_animation_frame(callback.as_ref().unchecked_ref())
            {
                Ok(handle) => self.handle.set(Some(handle)),
                Err(e) => log::error!("requestAnimationFrame failed: {:?}", e),
            }
        }
    }
}

/// Self-rescheduling `requestAnimationFrame` loop
///
/// The callback holds only a weak reference to the loop, so dropping the
/// `FrameLoop` both cancels the pending frame and frees the closure.
pub struct FrameLoop {
    inner: Rc<FrameLoopInner>,
}

impl FrameLoop {
    pub fn start(window: &Window, mut step: impl FnMut(f64) -> LoopControl + 'static) -> Self {
        let inner = Rc::new(FrameLoopInner {
            window: window.clone(),
            handle: Cell::new(None),
            callback: RefCell::new(None),
        });

        let weak = Rc::downgrade(&inner);
        let callback = Closure::wrap(Box::new(move |time: f64| {
            let Some(inner) = weak.upgrade() else {
                return;
            };
            inner.handle.set(None);
            if step(time) == LoopControl::Continue {
                inner.schedule();
            } else {
                log::info!("Frame loop stopped");
            }
        }) as Box<dyn FnMut(f64)>);

        *inner.callback.borrow_mut() = Some(callback);
        inner.schedule();
        Self { inner }
    }
}

impl Drop for FrameLoop {
    fn drop(&mut self) {
        if let Some(handle) = self.inner.handle.take() {
            let _ = self.inner.window.cancel_animation_frame(handle);
        }
        self.inner.callback.borrow_mut().take();
    }
}

/// All browser registrations owned by one play session
#[derive(Default)]
pub struct SessionScope {
    listeners: Vec<EventListener>,
    intervals: Vec<IntervalTimer>,
    frame_loop: Option<FrameLoop>,
}

impl SessionScope {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a DOM listener for the lifetime of the session
    pub fn listen(
        &mut self,
        target: &EventTarget,
        kind: &'static str,
        handler: impl FnMut(Event) + 'static,
    ) -> Result<(), JsValue> {
        self.listeners.push(EventListener::new(target, kind, handler)?);
        Ok(())
    }

    /// Run `handler` every `period_ms` for the lifetime of the session
    pub fn every(
        &mut self,
        window: &Window,
        period_ms: i32,
        handler: impl FnMut() + 'static,
    ) -> Result<(), JsValue> {
        self.intervals
            .push(IntervalTimer::new(window, period_ms, handler)?);
        Ok(())
    }

    /// Start the session's animation-frame loop, replacing any previous one
    pub fn run_frames(
        &mut self,
        window: &Window,
        step: impl FnMut(f64) -> LoopControl + 'static,
    ) {
        self.frame_loop = Some(FrameLoop::start(window, step));
    }
}

impl Drop for SessionScope {
    fn drop(&mut self) {
        log::info!(
            "Releasing session scope ({} listeners, {} timers)",
            self.listeners.len(),
            self.intervals.len()
        );
    }
}
