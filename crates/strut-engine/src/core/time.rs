/// Fixed timestep accumulator for the physics step.
pub struct FixedTimestep {
    dt: f32,
    accumulator: f32,
    /// Upper bound on steps per frame, so a stalled tab does not trigger a
    /// burst of catch-up steps.
    max_steps: u32,
}

impl FixedTimestep {
    pub fn new(dt: f32) -> Self {
        Self {
            dt,
            accumulator: 0.0,
            max_steps: 10,
        }
    }

    pub fn with_max_steps(mut self, max_steps: u32) -> Self {
        self.max_steps = max_steps.max(1);
        self
    }

    /// Add frame time. Returns how many fixed steps to run now.
    pub fn accumulate(&mut self, frame_dt: f32) -> u32 {
        let cap = self.dt * self.max_steps as f32;
        self.accumulator = (self.accumulator + frame_dt.max(0.0)).min(cap);
        let steps = (self.accumulator / self.dt) as u32;
        self.accumulator -= steps as f32 * self.dt;
        steps
    }

    /// Drop leftover time, e.g. when the simulation is paused.
    pub fn reset(&mut self) {
        self.accumulator = 0.0;
    }

    pub fn dt(&self) -> f32 {
        self.dt
    }
}

/// Trailing-edge debounce on a caller-supplied clock (seconds).
///
/// Each [`Debounce::request`] pushes the deadline out to `now + idle`;
/// [`Debounce::poll`] fires once when the deadline has passed.
#[derive(Debug, Clone)]
pub struct Debounce {
    idle: f64,
    deadline: Option<f64>,
}

impl Debounce {
    pub fn new(idle: f64) -> Self {
        Self {
            idle,
            deadline: None,
        }
    }

    pub fn request(&mut self, now: f64) {
        self.deadline = Some(now + self.idle);
    }

    /// True once per burst of requests, after the idle window elapsed.
    pub fn poll(&mut self, now: f64) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }

    /// Fire immediately if anything is pending.
    pub fn flush(&mut self) -> bool {
        self.deadline.take().is_some()
    }

    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_step_exact() {
        let mut ts = FixedTimestep::new(0.25);
        assert_eq!(ts.accumulate(0.25), 1);
    }

    #[test]
    fn accumulates_partial_frames() {
        let mut ts = FixedTimestep::new(1.0 / 60.0);
        assert_eq!(ts.accumulate(0.008), 0);
        assert_eq!(ts.accumulate(0.010), 1);
    }

    #[test]
    fn caps_catch_up_steps() {
        let mut ts = FixedTimestep::new(1.0 / 60.0).with_max_steps(4);
        assert_eq!(ts.accumulate(1.0), 4);
    }

    #[test]
    fn reset_drops_leftover_time() {
        let mut ts = FixedTimestep::new(0.5);
        ts.accumulate(0.4);
        ts.reset();
        assert_eq!(ts.accumulate(0.2), 0);
    }

    #[test]
    fn debounce_coalesces_requests() {
        let mut d = Debounce::new(2.0);
        d.request(0.0);
        d.request(1.5);
        assert!(!d.poll(3.0), "second request pushed the deadline out");
        assert!(d.poll(3.5));
        assert!(!d.poll(10.0), "fires once per burst");
    }

    #[test]
    fn flush_reports_pending_work() {
        let mut d = Debounce::new(2.0);
        assert!(!d.flush());
        d.request(0.0);
        assert!(d.is_pending());
        assert!(d.flush());
        assert!(!d.poll(5.0));
    }
}
