//! Party slots, roles and the directions shares travel between them.

use crate::TssWalletError;
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use strum::{Display, EnumIter, EnumString};

/// Identifies a participant slot within the threshold scheme.
///
/// Indices are positive. They are serialized as decimal strings (`"1"`) to
/// match the wire format of the coordination service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PartyIndex(u8);

impl PartyIndex {
    pub const USER: PartyIndex = PartyIndex(1);
    pub const BACKUP: PartyIndex = PartyIndex(2);
    pub const BITGO: PartyIndex = PartyIndex(3);

    pub fn new(index: u8) -> Result<Self, TssWalletError> {
        if index == 0 {
            return Err(TssWalletError::InvalidPartyIndex(index.to_string()));
        }
        Ok(Self(index))
    }

    pub fn get(self) -> u8 {
        self.0
    }
}

impl fmt::Display for PartyIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for PartyIndex {
    type Err = TssWalletError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let index = s
            .parse::<u8>()
            .map_err(|_| TssWalletError::InvalidPartyIndex(s.to_string()))?;
        Self::new(index)
    }
}

impl TryFrom<String> for PartyIndex {
    type Error = TssWalletError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<PartyIndex> for String {
    fn from(index: PartyIndex) -> Self {
        index.to_string()
    }
}

/// The three participants of a wallet.
#[derive(
    Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumIter, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Role {
    User,
    Backup,
    Bitgo,
}

impl Role {
    /// The fixed slot of this role.
    pub const fn index(self) -> PartyIndex {
        match self {
            Role::User => PartyIndex::USER,
            Role::Backup => PartyIndex::BACKUP,
            Role::Bitgo => PartyIndex::BITGO,
        }
    }

    /// Capitalized name used in protocol error messages.
    pub const fn label(self) -> &'static str {
        match self {
            Role::User => "User",
            Role::Backup => "Backup",
            Role::Bitgo => "Bitgo",
        }
    }
}

/// A valid `(from, to)` pair between two distinct roles.
///
/// A share sent from a role to itself has no representation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    UserToBackup,
    UserToBitgo,
    BackupToUser,
    BackupToBitgo,
    BitgoToUser,
    BitgoToBackup,
}

impl Direction {
    pub fn between(from: Role, to: Role) -> Option<Self> {
        use Role::*;

        match (from, to) {
            (User, Backup) => Some(Direction::UserToBackup),
            (User, Bitgo) => Some(Direction::UserToBitgo),
            (Backup, User) => Some(Direction::BackupToUser),
            (Backup, Bitgo) => Some(Direction::BackupToBitgo),
            (Bitgo, User) => Some(Direction::BitgoToUser),
            (Bitgo, Backup) => Some(Direction::BitgoToBackup),
            (User, User) | (Backup, Backup) | (Bitgo, Bitgo) => None,
        }
    }

    pub const fn sender(self) -> Role {
        match self {
            Direction::UserToBackup | Direction::UserToBitgo => Role::User,
            Direction::BackupToUser | Direction::BackupToBitgo => Role::Backup,
            Direction::BitgoToUser | Direction::BitgoToBackup => Role::Bitgo,
        }
    }

    pub const fn recipient(self) -> Role {
        match self {
            Direction::BackupToUser | Direction::BitgoToUser => Role::User,
            Direction::UserToBackup | Direction::BitgoToBackup => Role::Backup,
            Direction::UserToBitgo | Direction::BackupToBitgo => Role::Bitgo,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}->{}", self.sender(), self.recipient())
    }
}
