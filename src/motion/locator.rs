use crate::{foundation::core::TimeWindow, motion::segmenter::Transition};

/// Transition whose tolerance-expanded window contains `time`.
///
/// The list is ascending and disjoint, so at most one transition can match; if expanded windows
/// touch at a shared boundary the earlier transition wins.
pub fn locate(transitions: &[Transition], time: f64, tolerance: f64) -> Option<Transition> {
    transitions
        .iter()
        .find(|t| t.window().contains_with_tolerance(time, tolerance))
        .copied()
}

/// Transition with the given 1-based index.
pub fn find_by_index(transitions: &[Transition], index: u32) -> Option<Transition> {
    transitions.iter().find(|t| t.index == index).copied()
}

/// First transition whose window overlaps `window` (boundaries inclusive).
pub fn first_overlap(transitions: &[Transition], window: TimeWindow) -> Option<Transition> {
    transitions
        .iter()
        .find(|t| window.overlaps(t.window()))
        .copied()
}

#[cfg(test)]
#[path = "../../tests/unit/motion/locator.rs"]
mod tests;
