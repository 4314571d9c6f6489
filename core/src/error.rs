use thiserror::Error;

/// Failure modes surfaced by the lifter and the signature engine.
///
/// Each variant maps to one of the integer return codes a caller of
/// the multi-modular entry point expects; [`Error::to_return_code`]
/// performs that mapping so callers embedding this crate behind a C
/// ABI (as the original tool does) don't need to match on variants
/// themselves.
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("input has positive characteristic; rational lifting does not apply")]
    PositiveCharacteristic,

    #[error("prime {prime} is bad: {reason}")]
    BadPrime { prime: u64, reason: String },

    #[error("not generic enough: {0}")]
    NotGenericEnough(String),

    #[error("resource exhausted: {0}")]
    ResourceExhausted(String),
}

impl Error {
    /// Maps a variant to the integer return codes documented for the
    /// multi-modular entry point. `BadPrime` has no code of its own:
    /// it is never returned to a caller, only logged and skipped, so
    /// calling this on a `BadPrime` is a caller bug.
    pub fn to_return_code(&self) -> i32 {
        match self {
            Error::InvalidInput(_) => -3,
            Error::PositiveCharacteristic => -2,
            Error::NotGenericEnough(msg) if msg.contains("staircase") => 2,
            Error::NotGenericEnough(_) => 1,
            Error::ResourceExhausted(_) => -4,
            Error::BadPrime { .. } => {
                debug_assert!(false, "BadPrime should never reach to_return_code");
                -4
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn return_codes_match_documented_values() {
        assert_eq!(Error::InvalidInput("x".into()).to_return_code(), -3);
        assert_eq!(Error::PositiveCharacteristic.to_return_code(), -2);
        assert_eq!(Error::ResourceExhausted("full".into()).to_return_code(), -4);
        assert_eq!(
            Error::NotGenericEnough("square of a variable escaped the staircase".into())
                .to_return_code(),
            2
        );
        assert_eq!(
            Error::NotGenericEnough("leading monomial count changed".into()).to_return_code(),
            1
        );
    }
}
