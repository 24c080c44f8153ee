use trailmark_common::{Action, TestStep};

/// Project a log into normalized steps, index-aligned with the log.
pub fn generate_steps(actions: &[Action]) -> Vec<TestStep> {
    actions
        .iter()
        .enumerate()
        .map(|(order, action)| TestStep::from_action(order, action))
        .collect()
}
