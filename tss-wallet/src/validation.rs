//! Ownership and directionality predicates over shares.
//!
//! Every check returns a `bool`. Callers turn a failed check into the error
//! that fits the protocol step they are running.

use crate::types::{
    key_share::{KeyShare, PShare, UShare, YShare},
    party::{Direction, PartyIndex, Role},
    signing::{GShare, RShare, XShare},
    tx_request::SignatureShareRecord,
};

/// A share bound to exactly one party: the party that may use it.
pub trait OwnedShare {
    fn owner(&self) -> PartyIndex;
}

impl OwnedShare for UShare {
    fn owner(&self) -> PartyIndex {
        self.i
    }
}

impl OwnedShare for KeyShare {
    fn owner(&self) -> PartyIndex {
        self.u_share.i
    }
}

impl OwnedShare for PShare {
    fn owner(&self) -> PartyIndex {
        self.i
    }
}

impl OwnedShare for XShare {
    fn owner(&self) -> PartyIndex {
        self.i
    }
}

impl OwnedShare for GShare {
    fn owner(&self) -> PartyIndex {
        self.i
    }
}

/// A [`YShare`] belongs to its recipient.
impl OwnedShare for YShare {
    fn owner(&self) -> PartyIndex {
        self.j
    }
}

pub fn is_own_share(share: &impl OwnedShare, expected_index: PartyIndex) -> bool {
    share.owner() == expected_index
}

/// Whether `record` travels exactly from `expected_from` to `expected_to`.
///
/// Always `false` for a same-role expectation or a same-role record.
pub fn is_directed(record: &SignatureShareRecord, expected_from: Role, expected_to: Role) -> bool {
    match (
        record.direction(),
        Direction::between(expected_from, expected_to),
    ) {
        (Some(actual), Some(expected)) => actual == expected,
        _ => false,
    }
}

/// Whether `r_share` was produced by `expected_i` and addressed to
/// `expected_j`.
pub fn is_r_share_directed(
    r_share: &RShare,
    expected_i: PartyIndex,
    expected_j: PartyIndex,
) -> bool {
    expected_i != expected_j && r_share.i == expected_i && r_share.j == expected_j
}

/// Whether `y_share` was produced by `expected_i` and addressed to
/// `expected_j`.
pub fn is_y_share_directed(
    y_share: &YShare,
    expected_i: PartyIndex,
    expected_j: PartyIndex,
) -> bool {
    expected_i != expected_j && y_share.i == expected_i && y_share.j == expected_j
}
