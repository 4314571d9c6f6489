#[cfg(feature = "timing")]
use std::time::{Duration, Instant};

/// A single open-or-closed timing scope. Used by the orchestrator to
/// measure modular-solve time against reconstruction time so
/// [`crate::lift_state::LiftState::advance_cadence`] can decide
/// whether to back off the reconstruction cadence.
///
/// A stack of nested scopes behind a `timing` feature, collapsing to a
/// zero-cost stub when the feature is off.
#[cfg(feature = "timing")]
pub struct TimingTree {
    name: String,
    enter_time: Instant,
    exit_time: Option<Instant>,
    children: Vec<TimingTree>,
}

#[cfg(not(feature = "timing"))]
pub struct TimingTree;

#[cfg(feature = "timing")]
impl TimingTree {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            enter_time: Instant::now(),
            exit_time: None,
            children: Vec::new(),
        }
    }

    fn is_open(&self) -> bool {
        self.exit_time.is_none()
    }

    pub fn push(&mut self, ctx: &str) {
        if let Some(last) = self.children.last_mut() {
            if last.is_open() {
                last.push(ctx);
                return;
            }
        }
        self.children.push(TimingTree::new(ctx));
    }

    pub fn pop(&mut self) {
        if let Some(last) = self.children.last_mut() {
            if last.is_open() {
                last.pop();
                return;
            }
        }
        self.exit_time = Some(Instant::now());
    }

    pub fn duration(&self) -> Duration {
        self.exit_time
            .unwrap_or_else(Instant::now)
            .duration_since(self.enter_time)
    }

    /// Total time spent in the most recently closed top-level child,
    /// used to compare "modular time" against "reconstruction time"
    /// for one round.
    pub fn last_child_duration(&self) -> Option<Duration> {
        self.children.last().map(TimingTree::duration)
    }
}

#[cfg(not(feature = "timing"))]
impl TimingTree {
    pub fn new(_name: &str) -> Self {
        Self
    }
    pub fn push(&mut self, _ctx: &str) {}
    pub fn pop(&mut self) {}
    pub fn last_child_duration(&self) -> Option<std::time::Duration> {
        None
    }
}

impl Default for TimingTree {
    fn default() -> Self {
        TimingTree::new("root")
    }
}

#[cfg(all(test, feature = "timing"))]
mod tests {
    use super::*;
    use std::thread::sleep;
    use std::time::Duration;

    #[test]
    fn nested_scopes_close_innermost_first() {
        let mut tree = TimingTree::new("root");
        tree.push("modular");
        sleep(Duration::from_millis(5));
        tree.pop();
        tree.push("reconstruct");
        sleep(Duration::from_millis(5));
        tree.pop();
        assert_eq!(tree.children.len(), 2);
        assert!(tree.children[0].duration() >= Duration::from_millis(5));
        assert!(tree.children[1].duration() >= Duration::from_millis(5));
    }
}
