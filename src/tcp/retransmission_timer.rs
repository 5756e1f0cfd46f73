/// Monotonic countdown with exponential backoff, driven entirely by `tick`.
///
/// The timer never fires on its own; `tick` returns `true` the one time the
/// accumulated time reaches `rto`, and the caller decides what that means.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TimerState {
    Stop,
    Running,
}

#[derive(Debug)]
pub struct RetransmissionTimer {
    state: TimerState,
    initial_rto: u64,
    rto: u64,
    accumulated: u64,
}

impl RetransmissionTimer {
    pub fn new(initial_rto: u64) -> Self {
        RetransmissionTimer {
            state: TimerState::Stop,
            initial_rto,
            rto: initial_rto,
            accumulated: 0,
        }
    }

    /// Idempotent: if already running, does nothing. If stopped, starts
    /// running with a freshly reset RTO and accumulator.
    pub fn start(&mut self) {
        if self.state == TimerState::Stop {
            self.state = TimerState::Running;
            self.reset();
        }
    }

    /// Idempotent.
    pub fn stop(&mut self) {
        self.state = TimerState::Stop;
    }

    pub fn is_running(&self) -> bool {
        self.state == TimerState::Running
    }

    pub fn rto(&self) -> u64 {
        self.rto
    }

    /// Advance the accumulator by `ms`. Returns `true` iff running and the
    /// accumulated time has now reached `rto`.
    pub fn tick(&mut self, ms: u64) -> bool {
        if self.state != TimerState::Running {
            return false;
        }
        self.accumulated += ms;
        self.rto <= self.accumulated
    }

    /// Double the RTO and clear the accumulator (exponential backoff).
    pub fn handle_expired(&mut self) {
        self.rto *= 2;
        self.accumulated = 0;
    }

    /// Reset RTO back to the initial value and clear the accumulator.
    pub fn reset(&mut self) {
        self.rto = self.initial_rto;
        self.accumulated = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_does_not_fire_when_stopped() {
        let mut timer = RetransmissionTimer::new(100);
        assert!(!timer.tick(1000));
    }

    #[test]
    fn test_fires_exactly_at_rto() {
        let mut timer = RetransmissionTimer::new(100);
        timer.start();
        assert!(!timer.tick(99));
        assert!(timer.tick(1));
    }

    #[test]
    fn test_backoff_doubles_rto() {
        let mut timer = RetransmissionTimer::new(100);
        timer.start();
        assert!(timer.tick(100));
        timer.handle_expired();
        assert_eq!(timer.rto(), 200);
        assert!(!timer.tick(199));
        assert!(timer.tick(1));
    }

    #[test]
    fn test_reset_restores_initial_rto() {
        let mut timer = RetransmissionTimer::new(100);
        timer.start();
        timer.tick(100);
        timer.handle_expired();
        assert_eq!(timer.rto(), 200);
        timer.reset();
        assert_eq!(timer.rto(), 100);
    }

    #[test]
    fn test_start_idempotent_does_not_reset_running_timer() {
        let mut timer = RetransmissionTimer::new(100);
        timer.start();
        timer.tick(50);
        timer.start(); // no-op, already running
        assert!(!timer.tick(49));
        assert!(timer.tick(1));
    }

    #[test]
    fn test_stop_then_start_resets() {
        let mut timer = RetransmissionTimer::new(100);
        timer.start();
        timer.tick(50);
        timer.handle_expired();
        timer.stop();
        timer.start();
        assert_eq!(timer.rto(), 100);
        assert!(!timer.tick(99));
    }
}
