//! Regret matching and fixed-capacity action buffers.
//!
//! Everything here is a pure function over per-action slices. Buffers are
//! stack allocated ([`ActionVector`]) so the recursive tree walks never touch
//! the heap for per-action scratch space.

use std::ops::{Deref, DerefMut};

use crate::cfr::game::{Action, MAX_ACTIONS};

/// A fixed-capacity vector of per-action values, indexed from 0 (action 1).
#[derive(Clone, Copy)]
pub struct ActionVector {
    values: [f64; MAX_ACTIONS],
    len: usize,
}

impl ActionVector {
    /// A vector of `len` zeros.
    #[inline]
    pub fn zeros(len: usize) -> Self {
        debug_assert!(len <= MAX_ACTIONS);
        Self {
            values: [0.0; MAX_ACTIONS],
            len,
        }
    }

    /// A uniform distribution over `len` actions.
    #[inline]
    pub fn uniform(len: usize) -> Self {
        let mut vector = Self::zeros(len);
        vector.fill(1.0 / len as f64);
        vector
    }

    /// All probability on `action`.
    #[inline]
    pub fn one_hot(len: usize, action: Action) -> Self {
        let mut vector = Self::zeros(len);
        vector[action as usize - 1] = 1.0;
        vector
    }

    /// Copy from a slice.
    #[inline]
    pub fn from_slice(values: &[f64]) -> Self {
        let mut vector = Self::zeros(values.len());
        vector.copy_from_slice(values);
        vector
    }

    /// Sum of the entries.
    #[inline]
    pub fn total(&self) -> f64 {
        self.iter().sum()
    }

    /// Dot product with another slice of the same length.
    #[inline]
    pub fn dot(&self, other: &[f64]) -> f64 {
        self.iter().zip(other).map(|(a, b)| a * b).sum()
    }
}

impl Deref for ActionVector {
    type Target = [f64];

    #[inline]
    fn deref(&self) -> &[f64] {
        &self.values[..self.len]
    }
}

impl DerefMut for ActionVector {
    #[inline]
    fn deref_mut(&mut self) -> &mut [f64] {
        &mut self.values[..self.len]
    }
}

impl PartialEq for ActionVector {
    fn eq(&self, other: &Self) -> bool {
        **self == **other
    }
}

impl std::fmt::Debug for ActionVector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

/// Regret matching: each action's share of the positive regret, or uniform
/// when no action has positive regret.
pub fn regret_matched(regrets: &[f64]) -> ActionVector {
    let mut probabilities = ActionVector::zeros(regrets.len());
    let mut positive_sum = 0.0;
    for (p, &r) in probabilities.iter_mut().zip(regrets) {
        *p = r.max(0.0);
        positive_sum += *p;
    }

    if positive_sum > 0.0 {
        for p in probabilities.iter_mut() {
            *p /= positive_sum;
        }
        probabilities
    } else {
        ActionVector::uniform(regrets.len())
    }
}

/// Linear blend `(1 - epsilon) * probabilities + epsilon * uniform`.
pub fn blend_with_uniform(probabilities: &ActionVector, epsilon: f64) -> ActionVector {
    if epsilon <= 0.0 {
        return *probabilities;
    }
    let uniform = 1.0 / probabilities.len() as f64;
    let mut blended = *probabilities;
    for p in blended.iter_mut() {
        *p = (1.0 - epsilon) * *p + epsilon * uniform;
    }
    blended
}

/// Regret matching that ignores actions nobody has ever reached: actions with
/// no regret and no cumulative strategy weight are excluded and the rest
/// renormalized.
pub fn pruned_regret_matched(regrets: &[f64], cumulative_strategy: &[f64]) -> ActionVector {
    let matched = regret_matched(regrets);
    let mut pruned = matched;
    let mut remaining = 0.0;
    for (a, p) in pruned.iter_mut().enumerate() {
        if regrets[a] == 0.0 && cumulative_strategy[a] == 0.0 {
            *p = 0.0;
        }
        remaining += *p;
    }

    if remaining > 0.0 {
        for p in pruned.iter_mut() {
            *p /= remaining;
        }
        pruned
    } else {
        matched
    }
}

/// Cumulative strategy weights normalized to a distribution, uniform when empty.
pub fn average_strategy(cumulative_strategy: &[f64]) -> ActionVector {
    let total: f64 = cumulative_strategy.iter().sum();
    if total > 0.0 {
        let mut average = ActionVector::from_slice(cumulative_strategy);
        for p in average.iter_mut() {
            *p /= total;
        }
        average
    } else {
        ActionVector::uniform(cumulative_strategy.len())
    }
}

/// Pick an action given a uniform draw `u` in `[0, 1)`.
///
/// Falls back to the last action with positive probability to absorb
/// floating point error in the cumulative sum.
pub fn sample_action(probabilities: &[f64], u: f64) -> Action {
    let mut cumulative = 0.0;
    let mut last_positive = 0;
    for (i, &p) in probabilities.iter().enumerate() {
        if p <= 0.0 {
            continue;
        }
        cumulative += p;
        last_positive = i;
        if u < cumulative {
            return (i + 1) as Action;
        }
    }
    (last_positive + 1) as Action
}
