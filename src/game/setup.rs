//! Board setup before the first question: step labels and start position.

use crate::types::{Position, SETUP_STEPS};
use std::collections::BTreeMap;

/// True once every setup step carries a non-blank label and a start step was picked
pub fn ready(labels: &BTreeMap<Position, String>, start_chosen: bool) -> bool {
    all_labels_filled(labels) && start_chosen
}

pub fn all_labels_filled(labels: &BTreeMap<Position, String>) -> bool {
    SETUP_STEPS.iter().all(|step| {
        labels
            .get(step)
            .map(|l| !l.trim().is_empty())
            .unwrap_or(false)
    })
}

pub fn is_setup_step(step: Position) -> bool {
    SETUP_STEPS.contains(&step)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(entries: &[(Position, &str)]) -> BTreeMap<Position, String> {
        entries.iter().map(|(k, v)| (*k, v.to_string())).collect()
    }

    #[test]
    fn test_ready_guard() {
        assert!(!ready(&labels(&[(3, ""), (4, "x"), (5, "y")]), true));
        assert!(!ready(&labels(&[(3, "a"), (4, "b"), (5, "c")]), false));
        assert!(ready(&labels(&[(3, "a"), (4, "b"), (5, "c")]), true));
    }

    #[test]
    fn test_whitespace_and_missing_labels() {
        assert!(!all_labels_filled(&labels(&[(3, "a"), (4, "  "), (5, "c")])));
        assert!(!all_labels_filled(&labels(&[(3, "a"), (5, "c")])));
        // Labels outside the setup steps don't count
        assert!(!all_labels_filled(&labels(&[(1, "a"), (2, "b"), (6, "c")])));
    }

    #[test]
    fn test_is_setup_step() {
        assert!(is_setup_step(4));
        assert!(!is_setup_step(0));
        assert!(!is_setup_step(9));
    }
}
