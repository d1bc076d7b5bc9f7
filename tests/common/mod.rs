// Copyright (C) 2025 Piers Finlayson <piers@piers.rocks>
//
// MIT License

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use nfc_wlc_bridge::listener::{ChargingListener, ListenerResult};
use nfc_wlc_bridge::{EventCallback, Status, WlcEvent, WlcStack};

/// Delay before the fake stack reports a result event.
pub const EVENT_DELAY: Duration = Duration::from_millis(10);

/// How the fake stack answers the next request.
#[derive(Debug, Clone, Copy)]
pub enum Reply {
    /// Refuse synchronously with this status
    Reject(Status),
    /// Accept, then report this event from another thread.  `None` never
    /// reports anything.
    Accept(Option<WlcEvent>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Request {
    Enable,
    StartSession(i32),
    StartPowerTransfer(u16, i32),
}

type Callback = Arc<dyn Fn(WlcEvent) + Send + Sync>;

#[derive(Default)]
struct Inner {
    callback: Mutex<Option<Callback>>,
    replies: Mutex<VecDeque<Reply>>,
    requests: Mutex<Vec<Request>>,
    outstanding: AtomicUsize,
    peak: AtomicUsize,
}

/// Scripted WLC stack.  Accepts every request and reports success unless
/// told otherwise with [`MockStack::push_reply()`].
#[derive(Clone, Default)]
pub struct MockStack {
    inner: Arc<Inner>,
}

impl MockStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_reply(&self, reply: Reply) {
        self.inner.replies.lock().unwrap().push_back(reply);
    }

    pub fn requests(&self) -> Vec<Request> {
        self.inner.requests.lock().unwrap().clone()
    }

    /// Block until `count` requests have been made.
    pub fn wait_for_requests(&self, count: usize) {
        while self.inner.requests.lock().unwrap().len() < count {
            thread::sleep(Duration::from_millis(1));
        }
    }

    /// Highest number of accepted requests awaiting their result event at
    /// any one time.
    pub fn peak_outstanding(&self) -> usize {
        self.inner.peak.load(Ordering::SeqCst)
    }

    /// Deliver an event on the calling thread, as an unsolicited
    /// notification from the controller.
    pub fn emit(&self, event: WlcEvent) {
        let callback = self.inner.callback.lock().unwrap().clone();
        let callback = callback.expect("stack not enabled");
        callback(event);
    }

    pub fn register(&self, callback: EventCallback) {
        *self.inner.callback.lock().unwrap() = Some(Arc::from(callback));
    }

    pub fn handle(&self, request: Request, success: WlcEvent) -> Status {
        self.inner.requests.lock().unwrap().push(request);
        let reply = self
            .inner
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Reply::Accept(Some(success)));

        match reply {
            Reply::Reject(status) => status,
            Reply::Accept(event) => {
                let now = self.inner.outstanding.fetch_add(1, Ordering::SeqCst) + 1;
                self.inner.peak.fetch_max(now, Ordering::SeqCst);

                if let Some(event) = event {
                    let inner = Arc::clone(&self.inner);
                    thread::spawn(move || {
                        thread::sleep(EVENT_DELAY);
                        inner.outstanding.fetch_sub(1, Ordering::SeqCst);
                        let callback = inner.callback.lock().unwrap().clone();
                        if let Some(callback) = callback {
                            callback(event);
                        }
                    });
                }
                Status::OK
            }
        }
    }
}

impl WlcStack for MockStack {
    fn enable(&self, callback: EventCallback) -> Status {
        self.register(callback);
        self.handle(
            Request::Enable,
            WlcEvent::EnableResult { status: Status::OK },
        )
    }

    fn start_session(&self, mode: i32) -> Status {
        self.handle(
            Request::StartSession(mode),
            WlcEvent::StartResult { status: Status::OK },
        )
    }

    fn start_power_transfer(&self, power_adj_req: u16, wpt_time_int: i32) -> Status {
        self.handle(
            Request::StartPowerTransfer(power_adj_req, wpt_time_int),
            WlcEvent::StartWptResult { status: Status::OK },
        )
    }
}

/// Listener recording every end condition it receives.
#[derive(Default)]
pub struct Recorder {
    seen: Mutex<Vec<u8>>,
}

impl Recorder {
    pub fn seen(&self) -> Vec<u8> {
        self.seen.lock().unwrap().clone()
    }
}

impl ChargingListener for Recorder {
    fn on_charging_complete(&self, end_condition: u8) -> ListenerResult {
        self.seen.lock().unwrap().push(end_condition);
        Ok(())
    }
}

/// Listener which always panics.
pub struct Panicking;

impl ChargingListener for Panicking {
    fn on_charging_complete(&self, _: u8) -> ListenerResult {
        panic!("listener bug");
    }
}
