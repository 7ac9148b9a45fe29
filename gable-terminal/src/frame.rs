/// Fixed-rate frame scheduler for the terminal event loop
use gable_core::{FrameScheduler, FrameToken};
use std::time::{Duration, Instant};

/// Hands out at most one frame per `interval`.
///
/// A request made right after a frame waits for the next tick; a request made
/// after an idle period is due immediately.
#[derive(Debug)]
pub struct TickScheduler {
    interval: Duration,
    next_token: u64,
    pending: Option<(FrameToken, Instant)>,
    last_frame: Option<Instant>,
}

impl TickScheduler {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            next_token: 0,
            pending: None,
            last_frame: None,
        }
    }

    /// Scheduler ticking `fps` times per second.
    pub fn with_fps(fps: u32) -> Self {
        Self::new(Duration::from_millis(1000 / u64::from(fps.max(1))))
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// How long the loop may block on input before the pending frame is due.
    pub fn time_until_due(&self, now: Instant) -> Option<Duration> {
        self.pending.map(|(_, at)| at.saturating_duration_since(now))
    }

    /// Consume the pending request if its tick has arrived.
    pub fn take_due(&mut self, now: Instant) -> bool {
        match self.pending {
            Some((_, at)) if at <= now => {
                self.pending = None;
                self.last_frame = Some(now);
                true
            }
            _ => false,
        }
    }

    fn due_at(&self, now: Instant) -> Instant {
        match self.last_frame {
            Some(last) => (last + self.interval).max(now),
            None => now,
        }
    }
}

impl FrameScheduler for TickScheduler {
    fn request_frame(&mut self) -> FrameToken {
        if let Some((token, _)) = self.pending {
            return token;
        }
        let token = FrameToken(self.next_token);
        self.next_token = self.next_token.wrapping_add(1);
        self.pending = Some((token, self.due_at(Instant::now())));
        token
    }

    fn cancel_frame(&mut self, token: FrameToken) {
        if matches!(self.pending, Some((t, _)) if t == token) {
            self.pending = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_request_is_due_now() {
        let mut scheduler = TickScheduler::with_fps(30);
        scheduler.request_frame();
        assert!(scheduler.take_due(Instant::now()));
        assert!(!scheduler.take_due(Instant::now()));
    }

    #[test]
    fn test_request_after_frame_waits_for_tick() {
        let mut scheduler = TickScheduler::new(Duration::from_secs(60));
        scheduler.request_frame();
        let start = Instant::now();
        assert!(scheduler.take_due(start));

        scheduler.request_frame();
        assert!(!scheduler.take_due(Instant::now()));
        assert!(scheduler.time_until_due(Instant::now()).unwrap() > Duration::from_secs(1));
        assert!(scheduler.take_due(start + Duration::from_secs(61)));
    }

    #[test]
    fn test_cancel() {
        let mut scheduler = TickScheduler::with_fps(30);
        let token = scheduler.request_frame();
        assert_eq!(scheduler.request_frame(), token);
        scheduler.cancel_frame(token);
        assert!(scheduler.time_until_due(Instant::now()).is_none());
        assert!(!scheduler.take_due(Instant::now()));
    }
}
