use crate::replay::Transition;
use crate::state::{STATE_DIM, StateVec};
use anyhow::{Result, anyhow};
use candle_core as candle;
use candle::{D, DType, Device, Tensor};
use candle_nn as nn;
use candle_nn::{Module, Optimizer, VarBuilder, VarMap};
use std::path::Path;

const ACTIONS: usize = 3;
const HIDDEN: usize = 64;
const LR: f64 = 1e-3;

/// The function approximator consumed by the policy and the training loop.
/// Failures propagate unmodified; a corrupted learner must not keep
/// accumulating experience, so nothing here retries.
pub trait Learner {
    /// Per-action Q estimates for one state.
    fn predict(&self, state: &StateVec) -> Result<[f32; ACTIONS]>;
    /// One optimization update over the given transitions (a single frame or
    /// a replayed batch share this path).
    fn train_step(&mut self, batch: &[Transition]) -> Result<()>;
    fn save(&self, path: &Path) -> Result<()>;
    fn load(&mut self, path: &Path) -> Result<()>;
}

/// Two-layer MLP mapping the 8 state features to 3 Q-values.
struct LinearQNet {
    fc1: nn::Linear,
    fc2: nn::Linear,
}

impl LinearQNet {
    fn new(vb: VarBuilder) -> candle::Result<Self> {
        let fc1 = nn::linear(STATE_DIM, HIDDEN, vb.pp("fc1"))?;
        let fc2 = nn::linear(HIDDEN, ACTIONS, vb.pp("fc2"))?;
        Ok(Self { fc1, fc2 })
    }

    fn forward(&self, x: &Tensor) -> candle::Result<Tensor> {
        let h = self.fc1.forward(x)?.relu()?;
        self.fc2.forward(&h)
    }
}

/// Candle-backed Q-learner: Bellman targets against the online net, MSE on
/// the taken action, one AdamW step per call.
pub struct QTrainer {
    varmap: VarMap,
    net: LinearQNet,
    opt: nn::AdamW,
    device: Device,
    gamma: f32,
}

impl QTrainer {
    pub fn new(gamma: f32) -> Result<Self> {
        let device = preferred_device();
        let varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, DType::F32, &device);
        let net = LinearQNet::new(vb)?;
        let opt = nn::AdamW::new_lr(varmap.all_vars(), LR)?;
        Ok(Self {
            varmap,
            net,
            opt,
            device,
            gamma,
        })
    }
}

impl Learner for QTrainer {
    fn predict(&self, state: &StateVec) -> Result<[f32; ACTIONS]> {
        let s = Tensor::from_slice(state.as_slice(), (1, STATE_DIM), &self.device)?;
        let q = self.net.forward(&s)?.squeeze(0)?.to_vec1::<f32>()?;
        let mut out = [0.0; ACTIONS];
        out.copy_from_slice(&q);
        Ok(out)
    }

    fn train_step(&mut self, batch: &[Transition]) -> Result<()> {
        if batch.is_empty() {
            return Ok(());
        }
        let n = batch.len();
        let mut states = Vec::with_capacity(n * STATE_DIM);
        let mut actions = Vec::with_capacity(n);
        let mut rewards = Vec::with_capacity(n);
        let mut next_states = Vec::with_capacity(n * STATE_DIM);
        let mut not_dones = Vec::with_capacity(n);
        for t in batch {
            states.extend_from_slice(&t.state);
            let taken = t
                .action
                .iter()
                .position(|&a| a == 1.0)
                .ok_or_else(|| anyhow!("transition action {:?} is not a one-hot", t.action))?;
            actions.push(taken as i64);
            rewards.push(t.reward);
            next_states.extend_from_slice(&t.next_state);
            not_dones.push(if t.done { 0.0f32 } else { 1.0f32 });
        }

        let dev = &self.device;
        let states = Tensor::from_vec(states, (n, STATE_DIM), dev)?;
        let actions = Tensor::from_vec(actions, n, dev)?;
        let rewards = Tensor::from_vec(rewards, n, dev)?;
        let next_states = Tensor::from_vec(next_states, (n, STATE_DIM), dev)?;
        let not_dones = Tensor::from_vec(not_dones, n, dev)?;

        // Q(s, a) for the actions that were actually taken
        let q_all = self.net.forward(&states)?;
        let q_taken = q_all.gather(&actions.unsqueeze(1)?, 1)?.squeeze(1)?;

        // target: r + gamma * max_a' Q(s', a') * (1 - done)
        let next_q = self.net.forward(&next_states)?.max(D::Minus1)?;
        let discounted = next_q.affine(self.gamma as f64, 0.0)?;
        let target = rewards.add(&discounted.mul(&not_dones)?)?;

        let loss = q_taken.sub(&target.detach())?.sqr()?.mean_all()?;
        self.opt.backward_step(&loss)?;
        Ok(())
    }

    fn save(&self, path: &Path) -> Result<()> {
        self.varmap.save(path)?;
        Ok(())
    }

    fn load(&mut self, path: &Path) -> Result<()> {
        self.varmap.load(path)?;
        Ok(())
    }
}

pub fn preferred_device() -> Device {
    #[cfg(feature = "cuda")]
    if let Ok(dev) = Device::new_cuda(0) {
        return dev;
    }
    Device::Cpu
}
