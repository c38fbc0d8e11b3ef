//! Question selection without immediate repeats.

use crate::types::{Question, QuestionId};
use rand::seq::IndexedRandom;
use rand::Rng;
use std::collections::HashSet;

/// Tracks which questions of one pool have been drawn.
///
/// Draws come uniformly from the unused questions. Once the pool is exhausted
/// the used set is cleared and the draw comes from the full pool, so the last
/// question before a reset may come up again straight away.
#[derive(Debug, Clone, Default)]
pub struct QuestionPicker {
    used: HashSet<QuestionId>,
    resets: u32,
}

impl QuestionPicker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn used(&self) -> &HashSet<QuestionId> {
        &self.used
    }

    /// How many times the pool has been exhausted and reset
    pub fn resets(&self) -> u32 {
        self.resets
    }

    /// Draw the next question. Returns `None` only for an empty pool.
    pub fn draw<'a, R: Rng + ?Sized>(
        &mut self,
        pool: &'a [Question],
        rng: &mut R,
    ) -> Option<&'a Question> {
        let available: Vec<&Question> = pool
            .iter()
            .filter(|q| !self.used.contains(&q.id))
            .collect();

        let picked = match available.choose(rng) {
            Some(q) => *q,
            None => {
                let q = pool.choose(rng)?;
                self.used.clear();
                self.resets += 1;
                tracing::debug!("Question pool exhausted, starting over");
                q
            }
        };

        self.used.insert(picked.id);
        Some(picked)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn pool(n: u32) -> Vec<Question> {
        (1..=n)
            .map(|id| Question {
                id,
                prompt: format!("Q{}", id),
                options: vec!["a".into(), "b".into(), "c".into()],
                correct_index: 0,
            })
            .collect()
    }

    #[test]
    fn test_no_repeats_until_exhausted() {
        let pool = pool(8);
        let mut picker = QuestionPicker::new();
        let mut rng = StdRng::seed_from_u64(1);

        let mut seen = HashSet::new();
        for _ in 0..pool.len() {
            let q = picker.draw(&pool, &mut rng).unwrap();
            assert!(seen.insert(q.id), "question {} repeated", q.id);
        }
        assert_eq!(picker.resets(), 0);
        assert_eq!(picker.used().len(), pool.len());
    }

    #[test]
    fn test_single_reset_after_exhaustion() {
        let pool = pool(5);
        let mut picker = QuestionPicker::new();
        let mut rng = StdRng::seed_from_u64(99);

        for _ in 0..pool.len() {
            picker.draw(&pool, &mut rng).unwrap();
        }
        assert_eq!(picker.resets(), 0);

        // The next draw starts a fresh cycle
        picker.draw(&pool, &mut rng).unwrap();
        assert_eq!(picker.resets(), 1);
        assert_eq!(picker.used().len(), 1);

        // The rest of the second cycle draws without another reset
        for _ in 1..pool.len() {
            picker.draw(&pool, &mut rng).unwrap();
        }
        assert_eq!(picker.resets(), 1);
    }

    #[test]
    fn test_empty_pool() {
        let mut picker = QuestionPicker::new();
        let mut rng = StdRng::seed_from_u64(3);
        assert!(picker.draw(&[], &mut rng).is_none());
        assert_eq!(picker.resets(), 0);
    }

    #[test]
    fn test_seeded_draws_are_reproducible() {
        let pool = pool(10);
        let draw_all = |seed| {
            let mut picker = QuestionPicker::new();
            let mut rng = StdRng::seed_from_u64(seed);
            (0..10)
                .map(|_| picker.draw(&pool, &mut rng).unwrap().id)
                .collect::<Vec<_>>()
        };
        assert_eq!(draw_all(42), draw_all(42));
    }
}
