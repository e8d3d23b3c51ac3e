use tracing::debug;

use crate::classifier::MovementKind;
use crate::types::Movement;

/// Largest amount difference, in cents, still treated as the same movement.
const AMOUNT_TOLERANCE_MINOR: u64 = 1;

/// Movements split by direction after reversed withdrawals were removed.
#[derive(Debug, Clone, Default)]
pub struct Reconciliation<'a> {
    pub deposits: Vec<&'a Movement>,
    /// Withdrawals that survived reconciliation, in input order.
    pub withdrawals: Vec<&'a Movement>,
    /// Game play and everything else the classifier did not recognise.
    pub other: Vec<&'a Movement>,
    /// Input indices of every cancellation record.
    pub cancellations: Vec<usize>,
    /// Input indices of withdrawals consumed by a cancellation.
    pub reversed_withdrawals: Vec<usize>,
}

impl Reconciliation<'_> {
    pub fn reversed_count(&self) -> usize {
        self.reversed_withdrawals.len()
    }
}

/// Pair each withdrawal cancellation with the withdrawal it reverses.
///
/// Cancellations are processed in input order. Each consumes the first
/// unconsumed withdrawal whose amount is within one cent, whose
/// timestamp is not later than the cancellation's, and whose reference id
/// matches when both sides carry one. Movements whose timestamps do not
/// parse can never be paired. Cancellation records never reach the
/// withdrawal set, matched or not.
///
/// `kinds[i]` must be the classification of `movements[i]`.
pub fn reconcile<'a>(movements: &'a [Movement], kinds: &[MovementKind]) -> Reconciliation<'a> {
    debug_assert_eq!(movements.len(), kinds.len());

    let mut withdrawal_indices = Vec::new();
    let mut result = Reconciliation::default();

    for (index, (movement, kind)) in movements.iter().zip(kinds).enumerate() {
        match kind {
            MovementKind::Deposit => result.deposits.push(movement),
            MovementKind::Withdrawal => withdrawal_indices.push(index),
            MovementKind::WithdrawalCancellation => result.cancellations.push(index),
            MovementKind::Other => result.other.push(movement),
        }
    }

    let mut consumed = vec![false; withdrawal_indices.len()];

    for &cancel_index in &result.cancellations {
        let cancellation = &movements[cancel_index];
        let Some(cancelled_at) = cancellation.parsed_timestamp() else {
            debug!(index = cancel_index, "cancellation without usable timestamp left unmatched");
            continue;
        };
        let amount = cancellation.volume_minor();

        let matched = withdrawal_indices
            .iter()
            .enumerate()
            .find(|&(slot, &w_index)| {
                if consumed[slot] {
                    return false;
                }
                let withdrawal = &movements[w_index];
                amounts_match(withdrawal.volume_minor(), amount)
                    && withdrawal
                        .parsed_timestamp()
                        .is_some_and(|at| at <= cancelled_at)
                    && references_compatible(withdrawal, cancellation)
            })
            .map(|(slot, &w_index)| (slot, w_index));

        match matched {
            Some((slot, w_index)) => {
                consumed[slot] = true;
                result.reversed_withdrawals.push(w_index);
            }
            None => debug!(index = cancel_index, "cancellation has no matching withdrawal"),
        }
    }

    result.withdrawals = withdrawal_indices
        .iter()
        .zip(&consumed)
        .filter(|&(_, &used)| !used)
        .map(|(&index, _)| &movements[index])
        .collect();

    debug!(
        deposits = result.deposits.len(),
        withdrawals = result.withdrawals.len(),
        cancellations = result.cancellations.len(),
        reversed = result.reversed_withdrawals.len(),
        "reconciliation complete"
    );

    result
}

fn amounts_match(a: i64, b: i64) -> bool {
    a.abs_diff(b) <= AMOUNT_TOLERANCE_MINOR
}

fn references_compatible(withdrawal: &Movement, cancellation: &Movement) -> bool {
    match (withdrawal.reference(), cancellation.reference()) {
        (Some(a), Some(b)) => a == b,
        _ => true,
    }
}
