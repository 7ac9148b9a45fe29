/// Repaint scheduling: a host frame scheduler plus a single-slot coalescer
use log::trace;

/// Identifies one outstanding frame request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameToken(pub u64);

/// Host hook that runs the repaint once before the next display refresh.
///
/// The repaint itself is always [`crate::session::RenderSession::frame`]; the
/// scheduler only decides when the host calls it.
pub trait FrameScheduler {
    fn request_frame(&mut self) -> FrameToken;

    fn cancel_frame(&mut self, token: FrameToken);
}

/// At most one pending repaint.
///
/// Any number of requests between two frames collapse into one. The flag is
/// cleared on the leading edge of the frame, so state changed while painting
/// schedules a fresh repaint.
#[derive(Debug, Default)]
pub struct RepaintSlot {
    pending: Option<FrameToken>,
    coalesced: u64,
}

impl RepaintSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask for a repaint. Returns `true` when the scheduler was actually called.
    pub fn request<S: FrameScheduler + ?Sized>(&mut self, scheduler: &mut S) -> bool {
        if self.pending.is_some() {
            self.coalesced += 1;
            trace!("repaint already pending ({} coalesced)", self.coalesced);
            return false;
        }
        self.pending = Some(scheduler.request_frame());
        true
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Requests absorbed by an already pending repaint since creation.
    pub fn coalesced(&self) -> u64 {
        self.coalesced
    }

    /// Clear the pending flag. Returns whether a paint should run.
    pub fn begin_frame(&mut self) -> bool {
        self.pending.take().is_some()
    }

    /// Ask the scheduler for another frame while keeping the repaint pending.
    ///
    /// Used when a frame could not run; the old token was already spent.
    pub fn rearm<S: FrameScheduler + ?Sized>(&mut self, scheduler: &mut S) {
        self.pending = Some(scheduler.request_frame());
    }

    /// Drop the pending repaint, if any, and cancel it with the host.
    pub fn cancel<S: FrameScheduler + ?Sized>(&mut self, scheduler: &mut S) {
        if let Some(token) = self.pending.take() {
            scheduler.cancel_frame(token);
        }
    }
}

/// Scheduler for hosts that drive frames themselves (tests, browser glue).
///
/// Requests queue up until the host calls [`ManualScheduler::take_due`] from
/// its own refresh callback.
#[derive(Debug, Default)]
pub struct ManualScheduler {
    next: u64,
    outstanding: Vec<FrameToken>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn outstanding(&self) -> &[FrameToken] {
        &self.outstanding
    }

    pub fn has_due(&self) -> bool {
        !self.outstanding.is_empty()
    }

    /// Consume every outstanding request. Returns `true` if there were any.
    pub fn take_due(&mut self) -> bool {
        let due = !self.outstanding.is_empty();
        self.outstanding.clear();
        due
    }
}

impl FrameScheduler for ManualScheduler {
    fn request_frame(&mut self) -> FrameToken {
        let token = FrameToken(self.next);
        self.next = self.next.wrapping_add(1);
        self.outstanding.push(token);
        token
    }

    fn cancel_frame(&mut self, token: FrameToken) {
        self.outstanding.retain(|t| *t != token);
    }
}
