use crate::dqn::Learner;
use crate::replay::{MAX_MEMORY, ReplayMemory, Transition};
use crate::state::StateVec;
use anyhow::Result;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

pub const BATCH_SIZE: usize = 1000;

/// Number of games over which exploration decays linearly to zero.
const EXPLORATION_GAMES: u32 = 80;

/// Linear exploration schedule: starts at 80, hits zero at game 80 and
/// never re-increases.
pub fn epsilon(n_games: u32) -> u32 {
    EXPLORATION_GAMES.saturating_sub(n_games)
}

/// Session state that outlives any single episode: the game counter, the
/// best score so far, the replay memory and the learner itself.
pub struct Agent<L: Learner> {
    pub n_games: u32,
    pub record: u32,
    pub memory: ReplayMemory,
    pub learner: L,
    rng: SmallRng,
}

impl<L: Learner> Agent<L> {
    pub fn new(learner: L) -> Self {
        Self::with_rng(learner, SmallRng::from_entropy())
    }

    pub fn with_rng(learner: L, rng: SmallRng) -> Self {
        Self {
            n_games: 0,
            record: 0,
            memory: ReplayMemory::new(MAX_MEMORY),
            learner,
            rng,
        }
    }

    /// Epsilon-greedy selection. A uniform draw from [0, 200) below the
    /// current epsilon explores with a random turn; otherwise the learner's
    /// argmax wins, first index taking ties.
    pub fn select_action(&mut self, state: &StateVec) -> Result<[f32; 3]> {
        let mut action = [0.0; 3];
        if self.rng.gen_range(0..200) < epsilon(self.n_games) {
            action[self.rng.gen_range(0..3)] = 1.0;
        } else {
            let q = self.learner.predict(state)?;
            let mut best = 0;
            for i in 1..q.len() {
                if q[i] > q[best] {
                    best = i;
                }
            }
            action[best] = 1.0;
        }
        Ok(action)
    }

    /// Per-frame update on the one transition that just happened.
    pub fn train_short_memory(&mut self, t: &Transition) -> Result<()> {
        self.learner.train_step(std::slice::from_ref(t))
    }

    /// End-of-episode update on a batch replayed from memory.
    pub fn train_long_memory(&mut self) -> Result<()> {
        let batch = self.memory.sample(BATCH_SIZE, &mut self.rng);
        self.learner.train_step(&batch)
    }

    pub fn remember(&mut self, t: Transition) {
        self.memory.push(t);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    /// Learner double with canned Q-values and call accounting.
    struct StubLearner {
        q: [f32; 3],
        trained: Vec<usize>,
    }

    impl StubLearner {
        fn new(q: [f32; 3]) -> Self {
            Self { q, trained: Vec::new() }
        }
    }

    impl Learner for StubLearner {
        fn predict(&self, _state: &StateVec) -> Result<[f32; 3]> {
            Ok(self.q)
        }
        fn train_step(&mut self, batch: &[Transition]) -> Result<()> {
            self.trained.push(batch.len());
            Ok(())
        }
        fn save(&self, _path: &Path) -> Result<()> {
            Ok(())
        }
        fn load(&mut self, _path: &Path) -> Result<()> {
            Ok(())
        }
    }

    fn transition(reward: f32) -> Transition {
        Transition {
            state: [0.0; 8],
            action: [0.0, 1.0, 0.0],
            reward,
            next_state: [0.0; 8],
            done: false,
        }
    }

    #[test]
    fn epsilon_decays_linearly_and_bottoms_out() {
        assert_eq!(epsilon(0), 80);
        assert_eq!(epsilon(40), 40);
        assert_eq!(epsilon(80), 0);
        assert_eq!(epsilon(5000), 0);
        for n in 0..200 {
            assert!(epsilon(n + 1) <= epsilon(n));
        }
    }

    #[test]
    fn exploitation_picks_the_argmax() {
        let mut agent =
            Agent::with_rng(StubLearner::new([0.1, 0.7, 0.3]), SmallRng::seed_from_u64(4));
        agent.n_games = 200; // epsilon 0, always exploit
        for _ in 0..20 {
            assert_eq!(agent.select_action(&[0.0; 8]).unwrap(), [0.0, 1.0, 0.0]);
        }
    }

    #[test]
    fn argmax_ties_break_to_the_first_index() {
        let mut agent =
            Agent::with_rng(StubLearner::new([0.5, 0.5, 0.5]), SmallRng::seed_from_u64(4));
        agent.n_games = 200;
        assert_eq!(agent.select_action(&[0.0; 8]).unwrap(), [1.0, 0.0, 0.0]);
    }

    #[test]
    fn early_games_explore_sometimes() {
        let mut agent =
            Agent::with_rng(StubLearner::new([9.0, 0.0, 0.0]), SmallRng::seed_from_u64(4));
        let mut off_policy = 0;
        for _ in 0..500 {
            if agent.select_action(&[0.0; 8]).unwrap() != [1.0, 0.0, 0.0] {
                off_policy += 1;
            }
        }
        // epsilon is 80/200: a fair share of the 500 draws must deviate
        assert!(off_policy > 50, "only {off_policy} exploratory picks");
    }

    #[test]
    fn selection_always_yields_a_one_hot() {
        let mut agent =
            Agent::with_rng(StubLearner::new([0.2, 0.1, 0.4]), SmallRng::seed_from_u64(9));
        for n in [0, 40, 79, 80, 1000] {
            agent.n_games = n;
            let a = agent.select_action(&[0.0; 8]).unwrap();
            assert_eq!(a.iter().filter(|&&v| v == 1.0).count(), 1);
            assert_eq!(a.iter().filter(|&&v| v == 0.0).count(), 2);
        }
    }

    #[test]
    fn long_memory_trains_on_at_most_a_batch() {
        let mut agent = Agent::with_rng(StubLearner::new([0.0; 3]), SmallRng::seed_from_u64(1));
        for i in 0..10 {
            agent.remember(transition(i as f32));
        }
        agent.train_long_memory().unwrap();
        assert_eq!(agent.learner.trained, vec![10]);

        for i in 0..(BATCH_SIZE + 500) {
            agent.remember(transition(i as f32));
        }
        agent.train_long_memory().unwrap();
        assert_eq!(agent.learner.trained, vec![10, BATCH_SIZE]);
    }

    #[test]
    fn short_memory_trains_on_exactly_one() {
        let mut agent = Agent::with_rng(StubLearner::new([0.0; 3]), SmallRng::seed_from_u64(1));
        agent.train_short_memory(&transition(1.0)).unwrap();
        assert_eq!(agent.learner.trained, vec![1]);
    }
}
