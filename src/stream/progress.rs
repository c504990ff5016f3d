use super::event::StepStatus;

/// Labels of the four fixed progress phases, in order
pub const PHASE_LABELS: [&str; 4] = [
    "Analyzing your question",
    "Searching for information",
    "Generating response..",
    "Finalizing answer..",
];

/// One named progress phase and its current status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressPhase {
    /// 1-based phase number
    pub step: u32,
    /// Human-readable label
    pub label: &'static str,
    /// Current status
    pub status: StepStatus,
}

/// Status of the four progress phases of one request
///
/// Statuses only move forward. A lower step is force-completed when a
/// higher step is announced, even if it was never reported itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressTracker {
    phases: [ProgressPhase; 4],
}

impl Default for ProgressTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressTracker {
    /// All phases pending
    pub fn new() -> Self {
        let mut step = 0;
        let phases = PHASE_LABELS.map(|label| {
            step += 1;
            ProgressPhase {
                step,
                label,
                status: StepStatus::Pending,
            }
        });
        Self { phases }
    }

    /// Put every phase back to pending
    pub fn reset(&mut self) {
        for phase in &mut self.phases {
            phase.status = StepStatus::Pending;
        }
    }

    /// Apply a progress record
    ///
    /// Sets `step` to `status` and completes all lower steps. Returns
    /// whether anything changed. Updates that would move a phase backwards
    /// are ignored.
    pub fn apply(&mut self, step: u32, status: StepStatus) -> bool {
        let mut changed = false;
        for phase in &mut self.phases {
            let target = if phase.step == step {
                status
            } else if phase.step < step {
                StepStatus::Completed
            } else {
                continue;
            };
            if target > phase.status {
                phase.status = target;
                changed = true;
            }
        }
        changed
    }

    /// Complete every phase that is still active
    ///
    /// Called when the answer is final; pending phases stay pending.
    /// Returns whether anything changed.
    pub fn finish_active(&mut self) -> bool {
        let mut changed = false;
        for phase in &mut self.phases {
            if phase.status == StepStatus::Active {
                phase.status = StepStatus::Completed;
                changed = true;
            }
        }
        changed
    }

    /// The phases in order
    pub fn phases(&self) -> &[ProgressPhase] {
        &self.phases
    }

    /// Status of a 1-based step, `None` when out of range
    pub fn status(&self, step: u32) -> Option<StepStatus> {
        self.phases
            .iter()
            .find(|p| p.step == step)
            .map(|p| p.status)
    }

    /// Number of completed phases
    pub fn completed_count(&self) -> usize {
        self.phases
            .iter()
            .filter(|p| p.status == StepStatus::Completed)
            .count()
    }

    /// Completed share in `0.0..=1.0`
    pub fn fraction(&self) -> f64 {
        self.completed_count() as f64 / self.phases.len() as f64
    }

    /// True while no phase has left `pending`
    pub fn is_idle(&self) -> bool {
        self.phases.iter().all(|p| p.status == StepStatus::Pending)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use StepStatus::*;

    fn statuses(tracker: &ProgressTracker) -> Vec<StepStatus> {
        tracker.phases().iter().map(|p| p.status).collect()
    }

    #[test]
    fn test_new_is_all_pending() {
        let tracker = ProgressTracker::new();
        assert!(tracker.is_idle());
        assert_eq!(tracker.phases()[3].step, 4);
        assert_eq!(tracker.phases()[0].label, "Analyzing your question");
    }

    #[test]
    fn test_higher_step_completes_lower_ones() {
        let mut tracker = ProgressTracker::new();
        assert!(tracker.apply(3, Active));
        assert_eq!(statuses(&tracker), vec![Completed, Completed, Active, Pending]);
    }

    #[test]
    fn test_non_decreasing_sequences_complete_everything_below_latest() {
        let sequences: Vec<Vec<(u32, StepStatus)>> = vec![
            vec![(1, Active), (1, Completed), (2, Active)],
            vec![(1, Active), (2, Active), (2, Completed), (4, Active)],
            vec![(2, Completed), (3, Active), (3, Completed)],
            vec![(1, Active), (4, Pending)],
            vec![(1, Completed), (1, Completed), (3, Active), (4, Completed)],
        ];

        for sequence in sequences {
            let mut tracker = ProgressTracker::new();
            for &(step, status) in &sequence {
                tracker.apply(step, status);
            }
            let &(latest, last_status) = sequence.last().unwrap();
            for phase in tracker.phases() {
                if phase.step < latest {
                    assert_eq!(phase.status, Completed, "sequence {:?}", sequence);
                } else if phase.step > latest {
                    assert_eq!(phase.status, Pending, "sequence {:?}", sequence);
                }
            }
            assert_eq!(tracker.status(latest), Some(last_status));
        }
    }

    #[test]
    fn test_backwards_update_ignored() {
        let mut tracker = ProgressTracker::new();
        tracker.apply(2, Completed);
        assert!(!tracker.apply(2, Active));
        assert!(!tracker.apply(1, Pending));
        assert_eq!(tracker.status(2), Some(Completed));
    }

    #[test]
    fn test_repeated_step_keeps_furthest_status() {
        let mut tracker = ProgressTracker::new();
        for (step, status) in [(1, Active), (2, Completed), (2, Active), (3, Active), (3, Pending)] {
            tracker.apply(step, status);
        }
        assert_eq!(statuses(&tracker), vec![Completed, Completed, Active, Pending]);

        tracker.reset();
        assert!(tracker.apply(2, Active));
        assert_eq!(tracker.status(2), Some(Active));
    }

    #[test]
    fn test_out_of_range_steps() {
        let mut tracker = ProgressTracker::new();
        assert!(!tracker.apply(0, Active));
        assert!(tracker.is_idle());
        assert!(tracker.apply(9, Active));
        assert_eq!(tracker.completed_count(), 4);
        assert_eq!(tracker.status(9), None);
    }

    #[test]
    fn test_reset_and_fraction() {
        let mut tracker = ProgressTracker::new();
        tracker.apply(3, Active);
        assert!((tracker.fraction() - 0.5).abs() < f64::EPSILON);
        tracker.reset();
        assert!(tracker.is_idle());
        assert_eq!(tracker.fraction(), 0.0);
    }

    #[test]
    fn test_finish_active_leaves_pending_alone() {
        let mut tracker = ProgressTracker::new();
        tracker.apply(2, Active);
        assert!(tracker.finish_active());
        assert_eq!(statuses(&tracker), vec![Completed, Completed, Pending, Pending]);
        assert!(!tracker.finish_active());
    }
}
