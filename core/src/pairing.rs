//! Balanced transfer pairs for one cycle.
//!
//! Every account must both send and receive at least once per cycle,
//! otherwise it would look dormant from one side.

use crate::{model::Account, randomizer::Randomizer};

/// One planned transfer direction. Lives only for a single cycle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransferPair<'a> {
    pub from: &'a Account,
    pub to: &'a Account,
}

impl<'a> TransferPair<'a> {
    pub fn new(from: &'a Account, to: &'a Account) -> Self {
        Self { from, to }
    }
}

/// Shuffle the accounts, then link neighbours in two rounds:
/// positions (0,1), (2,3), ... followed by (1,2), (3,4), ... wrapping
/// at the end. An odd account count gets two extra pairs so the last
/// account both sends and receives.
///
/// Fewer than two accounts yields no pairs.
pub fn generate_balanced_pairs<'a>(
    accounts: &'a [Account],
    rng: &mut dyn Randomizer,
) -> Vec<TransferPair<'a>> {
    let n = accounts.len();
    if n < 2 {
        return Vec::new();
    }

    let mut shuffled: Vec<&Account> = accounts.iter().collect();
    for i in (1..n).rev() {
        let j = rng.index_below(i + 1);
        shuffled.swap(i, j);
    }

    let mut pairs = Vec::with_capacity(n + 1);

    for i in (0..n - 1).step_by(2) {
        pairs.push(TransferPair::new(shuffled[i], shuffled[i + 1]));
    }

    for i in (1..n).step_by(2) {
        pairs.push(TransferPair::new(shuffled[i], shuffled[(i + 1) % n]));
    }

    if n % 2 == 1 {
        pairs.push(TransferPair::new(shuffled[n - 1], shuffled[0]));
        pairs.push(TransferPair::new(shuffled[n - 2], shuffled[n - 1]));
    }

    pairs
}
