//! Fixed parameters of the 2-of-3 threshold scheme.

/// Number of parties whose shares must cooperate to produce a signature.
pub const THRESHOLD: u8 = 2;
/// Number of parties holding a key share.
pub const TOTAL_SHARES: u8 = 3;

/// Key type submitted with every keychain creation request.
pub const TSS_KEY_TYPE: &str = "tss";

/// Length in bytes of an encoded scalar or compressed curve point.
pub const SHARE_COMPONENT_LENGTH: usize = 32;
