//! Candidate ordering for greedy selection
//!
//! The selector offers candidates to its accumulator in the order produced
//! here. Both orders are total: equal values are broken by the output
//! identifier, so the same input set always sorts the same way regardless of
//! how the caller ordered it.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use crate::types::UnspentOutput;

/// Order in which candidate outputs are drawn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SortingStrategy {
    /// Smallest values first ("ascent draw")
    ///
    /// Tends to consume small outputs and consolidate the wallet, at the
    /// cost of more inputs and a higher fee.
    Ascending,

    /// Largest values first ("descent draw")
    ///
    /// Uses the fewest inputs and therefore the lowest fee.
    #[default]
    Descending,
}

impl SortingStrategy {
    /// Name of this strategy
    pub fn name(&self) -> &'static str {
        match self {
            SortingStrategy::Ascending => "ascent-draw",
            SortingStrategy::Descending => "descent-draw",
        }
    }

    /// Compare two outputs under this strategy
    pub fn compare(&self, a: &UnspentOutput, b: &UnspentOutput) -> Ordering {
        let by_value = match self {
            SortingStrategy::Ascending => a.value.cmp(&b.value),
            SortingStrategy::Descending => b.value.cmp(&a.value),
        };
        by_value.then_with(|| a.identifier.cmp(&b.identifier))
    }

    /// Sort `utxos` in place
    pub fn sort(&self, utxos: &mut [UnspentOutput]) {
        utxos.sort_by(|a, b| self.compare(a, b));
    }

    /// Return a sorted copy of `utxos`
    pub fn sorted(&self, utxos: &[UnspentOutput]) -> Vec<UnspentOutput> {
        let mut sorted = utxos.to_vec();
        self.sort(&mut sorted);
        sorted
    }
}
