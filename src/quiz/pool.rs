//! The set of commands that have not been quizzed yet.

use std::collections::BTreeSet;

use rand::seq::index;
use rand::Rng;
use tracing::debug;

use crate::error::PoolError;

/// All loaded commands plus the indices still eligible for a round.
///
/// `available` only shrinks through `commit_used` and only grows back through
/// a full `reset`.
#[derive(Debug, Clone, Default)]
pub struct CommandPool {
    commands: Vec<String>,
    available: BTreeSet<usize>,
}

impl CommandPool {
    pub fn new(commands: Vec<String>) -> Self {
        let mut pool = Self::default();
        pool.load(commands);
        pool
    }

    /// Replace the pool contents and mark every command as unused.
    pub fn load(&mut self, commands: Vec<String>) {
        debug!(count = commands.len(), "Loading command pool");
        self.commands = commands;
        self.reset();
    }

    /// Pick `n` distinct unused indices uniformly at random using the thread RNG.
    pub fn select_unused(&self, n: usize) -> Result<Vec<usize>, PoolError> {
        self.select_unused_with(n, &mut rand::rng())
    }

    /// Pick `n` distinct unused indices with the given random source.
    ///
    /// The selection is provisional: nothing is removed until `commit_used`.
    pub fn select_unused_with<R: Rng + ?Sized>(
        &self,
        n: usize,
        rng: &mut R,
    ) -> Result<Vec<usize>, PoolError> {
        let available = self.available.len();
        if n == 0 || n > available {
            return Err(PoolError::InvalidSelection {
                requested: n,
                available,
            });
        }
        let candidates: Vec<usize> = self.available.iter().copied().collect();
        let picked = index::sample(rng, available, n)
            .into_iter()
            .map(|i| candidates[i])
            .collect();
        Ok(picked)
    }

    /// Permanently remove the given indices from the unused set.
    pub fn commit_used(&mut self, indices: &[usize]) {
        for i in indices {
            self.available.remove(i);
        }
        debug!(
            committed = indices.len(),
            remaining = self.available.len(),
            "Committed used commands"
        );
    }

    pub fn reset(&mut self) {
        self.available = (0..self.commands.len()).collect();
    }

    pub fn remaining(&self) -> usize {
        self.available.len()
    }

    pub fn total(&self) -> usize {
        self.commands.len()
    }

    /// Share of the pool already used, in `0.0..=1.0`.
    pub fn progress(&self) -> f64 {
        if self.total() == 0 {
            return 0.0;
        }
        1.0 - self.remaining() as f64 / self.total() as f64
    }

    pub fn is_exhausted(&self) -> bool {
        self.total() > 0 && self.available.is_empty()
    }

    pub fn is_available(&self, index: usize) -> bool {
        self.available.contains(&index)
    }

    pub fn command(&self, index: usize) -> Option<&str> {
        self.commands.get(index).map(String::as_str)
    }

    /// Resolve indices to command text, in the order given. Unknown indices are skipped.
    pub fn commands_for(&self, indices: &[usize]) -> Vec<String> {
        indices
            .iter()
            .filter_map(|&i| self.command(i))
            .map(str::to_string)
            .collect()
    }
}
