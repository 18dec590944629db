//! Host Boundary
//!
//! The engine is embedded: the host application supplies display-refresh
//! frames and consumes batched output. [`HostBridge`] is the seam. It is
//! shared behind an `Arc` because frame requests can originate from any
//! thread that pushes an event or submits a command.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::warn;

use crate::error::EngineError;
use crate::graph::node::ViewId;
use crate::runtime::sink::FrameBatch;

/// Layout of a host view, as returned by [`HostBridge::measure`].
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LayoutRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub page_x: f64,
    pub page_y: f64,
}

impl LayoutRect {
    /// The rect reported for an unresolvable view: all fields NaN, so a
    /// caller doing arithmetic on it degrades instead of crashing.
    pub fn nan() -> Self {
        Self {
            x: f64::NAN,
            y: f64::NAN,
            width: f64::NAN,
            height: f64::NAN,
            page_x: f64::NAN,
            page_y: f64::NAN,
        }
    }
}

/// The embedding application's side of the engine.
///
/// `request_frame` must arrange for the host's display-refresh source to
/// call `Engine::on_frame` once with the current timestamp. `commit`
/// receives each tick's batched output. The capability calls are narrow
/// extension points with safe defaults.
pub trait HostBridge: Send + Sync {
    /// Request one frame callback from the display-refresh source.
    fn request_frame(&self);

    /// Receive one tick's batched prop updates and callback invocations.
    fn commit(&self, batch: FrameBatch);

    /// A queued command failed. The default logs and moves on; failures
    /// never affect other queued commands or the next tick.
    fn command_failed(&self, error: EngineError) {
        warn!(%error, "queued graph command failed");
    }

    /// Resolve a view's layout. `None` when the view is unknown.
    fn measure(&self, view: ViewId) -> Option<LayoutRect> {
        let _ = view;
        None
    }

    /// Scroll a host view.
    fn scroll_to(&self, view: ViewId, x: f64, y: f64, animated: bool) {
        let _ = (view, x, y, animated);
    }

    /// Enable or disable an externally managed gesture handler.
    fn set_external_handler_state(&self, handler: u64, active: bool) {
        let _ = (handler, active);
    }
}

/// Idempotent frame-request latch shared by everything that can wake the
/// scheduler. While a frame is posted, further arms are no-ops; the
/// scheduler clears the latch when the frame arrives.
#[derive(Clone)]
pub(crate) struct FrameWaker {
    posted: Arc<AtomicBool>,
    bridge: Arc<dyn HostBridge>,
}

impl FrameWaker {
    pub(crate) fn new(bridge: Arc<dyn HostBridge>) -> Self {
        Self {
            posted: Arc::new(AtomicBool::new(false)),
            bridge,
        }
    }

    /// Request a frame unless one is already posted.
    pub(crate) fn arm(&self) {
        if !self.posted.swap(true, Ordering::AcqRel) {
            self.bridge.request_frame();
        }
    }

    /// Mark the posted frame as consumed.
    pub(crate) fn clear(&self) {
        self.posted.store(false, Ordering::Release);
    }

    pub(crate) fn is_posted(&self) -> bool {
        self.posted.load(Ordering::Acquire)
    }
}
