use crate::state::StateVec;
use rand::Rng;
use rand::seq::index;
use std::collections::VecDeque;

pub const MAX_MEMORY: usize = 100_000;

/// One recorded frame of experience. Immutable once created; owned by the
/// replay memory after `push`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transition {
    pub state: StateVec,
    pub action: [f32; 3],
    pub reward: f32,
    pub next_state: StateVec,
    pub done: bool,
}

/// Bounded FIFO buffer of past transitions. Insertion order is temporal
/// order; overflowing evicts the oldest entry, never a random one.
pub struct ReplayMemory {
    buffer: VecDeque<Transition>,
    capacity: usize,
}

impl ReplayMemory {
    pub fn new(capacity: usize) -> Self {
        Self {
            buffer: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, t: Transition) {
        if self.buffer.len() >= self.capacity {
            self.buffer.pop_front();
        }
        self.buffer.push_back(t);
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Everything when the buffer holds at most `batch_size` transitions,
    /// otherwise a uniform sample of exactly `batch_size` distinct ones.
    /// Never mutates the buffer.
    pub fn sample<R: Rng>(&self, batch_size: usize, rng: &mut R) -> Vec<Transition> {
        if self.buffer.len() <= batch_size {
            return self.buffer.iter().copied().collect();
        }
        index::sample(rng, self.buffer.len(), batch_size)
            .into_iter()
            .map(|i| self.buffer[i])
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    fn transition(tag: f32) -> Transition {
        Transition {
            state: [tag; 8],
            action: [1.0, 0.0, 0.0],
            reward: tag,
            next_state: [tag; 8],
            done: false,
        }
    }

    #[test]
    fn overflow_evicts_the_oldest_first() {
        let mut memory = ReplayMemory::new(5);
        for i in 0..7 {
            memory.push(transition(i as f32));
            assert!(memory.len() <= 5);
        }
        let all = memory.sample(100, &mut SmallRng::seed_from_u64(0));
        assert_eq!(all.len(), 5);
        let rewards: Vec<f32> = all.iter().map(|t| t.reward).collect();
        assert_eq!(rewards, vec![2.0, 3.0, 4.0, 5.0, 6.0]);
    }

    #[test]
    fn undersized_buffer_returns_everything() {
        let mut memory = ReplayMemory::new(100);
        for i in 0..10 {
            memory.push(transition(i as f32));
        }
        let mut rng = SmallRng::seed_from_u64(1);
        assert_eq!(memory.sample(10, &mut rng).len(), 10);
        assert_eq!(memory.sample(50, &mut rng).len(), 10);
    }

    #[test]
    fn sample_is_distinct_and_leaves_buffer_intact() {
        let mut memory = ReplayMemory::new(100);
        for i in 0..100 {
            memory.push(transition(i as f32));
        }
        let mut rng = SmallRng::seed_from_u64(2);
        let batch = memory.sample(30, &mut rng);
        assert_eq!(batch.len(), 30);
        let mut rewards: Vec<i64> = batch.iter().map(|t| t.reward as i64).collect();
        rewards.sort_unstable();
        rewards.dedup();
        assert_eq!(rewards.len(), 30);
        assert_eq!(memory.len(), 100);
    }

    #[test]
    fn full_capacity_keeps_exactly_the_most_recent() {
        let mut memory = ReplayMemory::new(MAX_MEMORY);
        for i in 0..=MAX_MEMORY {
            memory.push(transition(i as f32));
        }
        assert_eq!(memory.len(), MAX_MEMORY);
        let mut rng = SmallRng::seed_from_u64(3);
        let batch = memory.sample(MAX_MEMORY, &mut rng);
        assert_eq!(batch.len(), MAX_MEMORY);
        // transition 0 was evicted; everything sampled is from the last 100k
        assert!(batch.iter().all(|t| t.reward >= 1.0));
    }
}
