//! Per-user quiz state: the command pool, the current round, and the generator.

use std::path::Path;

use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{info, instrument, warn};

use crate::core::LowLevelClient;
use crate::error::{PoolError, QuizError, RoundError};
use crate::generator::QuizGenerator;
use crate::loader;
use crate::quiz::{CommandPool, GradingResult, QuizRound, RoundPhase};

/// Snapshot of how far through the pool the user is.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Progress {
    pub remaining: usize,
    pub total: usize,
    /// `1 - remaining/total`, or 0 for an empty pool
    pub fraction: f64,
}

/// Everything one user's quiz needs. Not shared between users.
#[derive(Debug)]
pub struct Session<C: LowLevelClient> {
    pool: CommandPool,
    round: QuizRound,
    generator: QuizGenerator<C>,
    rng: StdRng,
}

impl<C: LowLevelClient> Session<C> {
    pub fn new(generator: QuizGenerator<C>) -> Self {
        Self::with_rng(generator, StdRng::from_os_rng())
    }

    /// Deterministic command selection, for tests and `--seed`.
    pub fn with_seed(generator: QuizGenerator<C>, seed: u64) -> Self {
        Self::with_rng(generator, StdRng::seed_from_u64(seed))
    }

    fn with_rng(generator: QuizGenerator<C>, rng: StdRng) -> Self {
        Self {
            pool: CommandPool::default(),
            round: QuizRound::new(),
            generator,
            rng,
        }
    }

    pub fn pool(&self) -> &CommandPool {
        &self.pool
    }

    pub fn round(&self) -> &QuizRound {
        &self.round
    }

    pub fn generator(&self) -> &QuizGenerator<C> {
        &self.generator
    }

    /// Replace the pool and drop any round in progress.
    pub fn load_commands(&mut self, commands: Vec<String>) {
        self.pool.load(commands);
        self.round.clear();
    }

    /// Load a table file. A bad file leaves the current pool and round as they were.
    pub fn load_table(&mut self, path: &Path) -> Result<usize, QuizError> {
        let commands = loader::load_commands(path)?;
        let count = commands.len();
        self.load_commands(commands);
        Ok(count)
    }

    /// Pick `n` unused commands, generate questions for them, and start the round.
    ///
    /// The pool is only consumed once generation succeeded, and the round is
    /// started in the same step; on failure neither changes.
    #[instrument(skip(self), fields(remaining = self.pool.remaining()))]
    pub async fn new_round(&mut self, n: usize) -> Result<&QuizRound, QuizError> {
        match self.round.phase() {
            RoundPhase::Unanswered | RoundPhase::PartiallyAnswered => {
                return Err(RoundError::InProgress.into());
            }
            RoundPhase::NoRound | RoundPhase::Submitted => {}
        }
        if self.pool.total() == 0 {
            return Err(PoolError::Empty.into());
        }

        let picked = self.pool.select_unused_with(n, &mut self.rng)?;
        let commands = self.pool.commands_for(&picked);
        info!(?commands, "Selected commands for new round");

        let questions = match self.generator.generate(&commands).await {
            Ok(q) => q,
            Err(e) => {
                warn!(attempts = e.attempts.len(), "Generation failed; pool left unchanged");
                return Err(e.into());
            }
        };

        self.round.start(questions, commands)?;
        self.pool.commit_used(&picked);
        Ok(&self.round)
    }

    pub fn answer(&mut self, index: usize, value: impl Into<String>) -> Result<(), QuizError> {
        Ok(self.round.set_answer(index, value)?)
    }

    pub fn submit(&mut self) -> Result<GradingResult, QuizError> {
        let result = self.round.submit()?;
        info!(score = %result, "Round submitted");
        Ok(result)
    }

    /// Leave the current round so a new one can be requested.
    pub fn next_round(&mut self) {
        self.round.clear();
    }

    /// Make every command eligible again. Only allowed once the pool is used up.
    pub fn reset_pool(&mut self) -> Result<(), QuizError> {
        if !self.pool.is_exhausted() {
            return Err(PoolError::NotExhausted {
                remaining: self.pool.remaining(),
            }
            .into());
        }
        self.pool.reset();
        self.round.clear();
        info!(total = self.pool.total(), "Command pool reset");
        Ok(())
    }

    pub fn progress(&self) -> Progress {
        Progress {
            remaining: self.pool.remaining(),
            total: self.pool.total(),
            fraction: self.pool.progress(),
        }
    }
}
