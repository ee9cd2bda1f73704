/// DOM ids of the registration sections, in step order.
pub const STEP_SECTIONS: [&str; 5] = [
    "section-personal",
    "section-education",
    "section-program",
    "section-schedule",
    "section-placement",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepSection {
    pub step: usize,
    pub id: String,
    pub visible: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepIndicator {
    pub step: usize,
    pub active: bool,
    pub completed: bool,
}

/// Tracks which of `1..=total_steps` is showing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepNavigator {
    current_step: usize,
    total_steps: usize,
}

impl StepNavigator {
    pub fn new(total_steps: usize) -> Self {
        Self {
            current_step: 1,
            total_steps: total_steps.max(1),
        }
    }

    pub fn current_step(&self) -> usize {
        self.current_step
    }

    pub fn total_steps(&self) -> usize {
        self.total_steps
    }

    pub fn contains(&self, step: usize) -> bool {
        (1..=self.total_steps).contains(&step)
    }

    pub fn is_first(&self) -> bool {
        self.current_step == 1
    }

    pub fn is_last(&self) -> bool {
        self.current_step == self.total_steps
    }

    /// Moves to `step` when it is in range; otherwise nothing changes.
    pub fn go_to(&mut self, step: usize) -> bool {
        if !self.contains(step) {
            return false;
        }
        tracing::debug!(from = self.current_step, to = step, "step change");
        self.current_step = step;
        true
    }

    pub fn reset(&mut self) {
        self.current_step = 1;
    }

    pub fn sections(&self) -> Vec<StepSection> {
        (1..=self.total_steps)
            .map(|step| StepSection {
                step,
                id: section_id(step, self.total_steps),
                visible: step == self.current_step,
            })
            .collect()
    }

    pub fn indicators(&self) -> Vec<StepIndicator> {
        (1..=self.total_steps)
            .map(|step| StepIndicator {
                step,
                active: step == self.current_step,
                completed: step < self.current_step,
            })
            .collect()
    }

    pub fn submit_visible(&self) -> bool {
        self.is_last()
    }
}

fn section_id(step: usize, total: usize) -> String {
    if total == STEP_SECTIONS.len() {
        STEP_SECTIONS[step - 1].to_string()
    } else {
        format!("section-step-{}", step)
    }
}
