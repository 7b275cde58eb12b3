use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::mpsc::{self, RecvError, RecvTimeoutError, Sender, TryRecvError};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use crate::models::event::CaptureEvent;
use crate::traits::capture_handler::CaptureHandler;

/// Frames a subscriber may have queued but not yet received. Further frames
/// are discarded for that subscriber until it catches up.
pub const SUBSCRIBER_FRAME_CAPACITY: usize = 8;

/// Per-subscriber frame accounting shared by both ends of the channel.
#[derive(Default)]
struct FrameBacklog {
    queued: AtomicUsize,
    discarded: AtomicU64,
}

struct Subscriber {
    tx: Sender<CaptureEvent>,
    backlog: Arc<FrameBacklog>,
}

impl Subscriber {
    /// `false` once the receiver is gone.
    fn offer(&self, event: CaptureEvent) -> bool {
        if event.is_frame() {
            if self.backlog.queued.load(Ordering::SeqCst) >= SUBSCRIBER_FRAME_CAPACITY {
                self.backlog.discarded.fetch_add(1, Ordering::Relaxed);
                log::trace!("subscriber backlog full, discarding frame");
                return true;
            }
            self.backlog.queued.fetch_add(1, Ordering::SeqCst);
        }
        self.tx.send(event).is_ok()
    }
}

/// Receiving end of an [`EventHub`] subscription.
///
/// Lifecycle and error events are always queued. At most
/// [`SUBSCRIBER_FRAME_CAPACITY`] frames are held for a subscriber that is not
/// reading; newer frames are discarded until it catches up.
pub struct EventReceiver {
    rx: mpsc::Receiver<CaptureEvent>,
    backlog: Arc<FrameBacklog>,
}

impl EventReceiver {
    fn received(&self, event: CaptureEvent) -> CaptureEvent {
        if event.is_frame() {
            self.backlog.queued.fetch_sub(1, Ordering::SeqCst);
        }
        event
    }

    pub fn recv(&self) -> Result<CaptureEvent, RecvError> {
        self.rx.recv().map(|event| self.received(event))
    }

    pub fn try_recv(&self) -> Result<CaptureEvent, TryRecvError> {
        self.rx.try_recv().map(|event| self.received(event))
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Result<CaptureEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout).map(|event| self.received(event))
    }

    /// Blocking iterator that ends when the hub is dropped.
    pub fn iter(&self) -> impl Iterator<Item = CaptureEvent> + '_ {
        std::iter::from_fn(move || self.recv().ok())
    }

    /// Drain whatever is queued without blocking.
    pub fn try_iter(&self) -> impl Iterator<Item = CaptureEvent> + '_ {
        std::iter::from_fn(move || self.try_recv().ok())
    }

    /// Frames queued for this subscriber and not yet received.
    pub fn queued_frames(&self) -> usize {
        self.backlog.queued.load(Ordering::SeqCst)
    }

    /// Frames discarded because this subscriber's backlog was full.
    pub fn discarded_frames(&self) -> u64 {
        self.backlog.discarded.load(Ordering::Relaxed)
    }
}

/// Fan-out of capture events to channel subscribers and handlers.
///
/// Events reach every subscriber in publish order. Subscribers whose
/// receiver has been dropped are pruned on the next publish.
#[derive(Default)]
pub struct EventHub {
    subscribers: Mutex<Vec<Subscriber>>,
    handlers: Mutex<Vec<Arc<dyn CaptureHandler>>>,
}

impl EventHub {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self) -> EventReceiver {
        let (tx, rx) = mpsc::channel();
        let backlog = Arc::new(FrameBacklog::default());
        self.subscribers.lock().push(Subscriber {
            tx,
            backlog: Arc::clone(&backlog),
        });
        EventReceiver { rx, backlog }
    }

    pub fn add_handler(&self, handler: Arc<dyn CaptureHandler>) {
        self.handlers.lock().push(handler);
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.lock().len()
    }

    pub fn publish(&self, event: CaptureEvent) {
        if !event.is_frame() {
            log::debug!("capture event: {}", event.kind());
        }

        // Handlers may call back into the session; don't hold the lock.
        let handlers = self.handlers.lock().clone();
        for handler in &handlers {
            dispatch(handler.as_ref(), &event);
        }

        self.subscribers
            .lock()
            .retain(|subscriber| subscriber.offer(event.clone()));
    }
}

fn dispatch(handler: &dyn CaptureHandler, event: &CaptureEvent) {
    match event {
        CaptureEvent::Started => handler.on_start(),
        CaptureEvent::Finished => handler.on_finish(),
        CaptureEvent::Paused => handler.on_pause(),
        CaptureEvent::Resumed => handler.on_resume(),
        CaptureEvent::Error(error) => handler.on_error(error),
        CaptureEvent::Frame(frame) => handler.on_frame(frame),
    }
}
