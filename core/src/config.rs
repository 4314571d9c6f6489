use serde::{Deserialize, Serialize};

/// External configuration for the lifter and the signature engine.
///
/// Mirrors the documented options table: every field has a default so
/// a caller can deserialize a partial fragment (`#[serde(default)]`
/// per field plus on the struct) and still get a runnable
/// configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Initial hash-table capacity for the modular solver.
    pub ht_size: usize,
    /// Worker thread count for the apply phase; also the batch size
    /// `T` of primes drawn per round. Must be >= 1.
    pub nr_threads: usize,
    /// Cap on the number of critical pairs considered per degree step.
    /// `0` means unlimited.
    pub max_nr_pairs: usize,
    /// Elimination block length for a block monomial order. `0` means
    /// no elimination block (plain grevlex).
    pub elim_block_len: usize,
    /// Reset the hash table between degree steps.
    pub reset_ht: bool,
    /// Linear-algebra backend selector: values above 40 select the
    /// FLINT-backed modular F4, otherwise trace-based learning/
    /// application is used.
    pub la_option: u32,
    /// Use the Schreyer-ordered signature engine instead of F4.
    pub use_signatures: bool,
    /// Run a final interreduction pass on the emitted basis.
    pub reduce_gb: bool,
    /// Diagnostic verbosity, 0 (silent) upward.
    pub info_level: u32,
    /// Emit the rational basis to the configured output sink.
    pub print_gb: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            ht_size: 1 << 17,
            nr_threads: 1,
            max_nr_pairs: 0,
            elim_block_len: 0,
            reset_ht: false,
            la_option: 2,
            use_signatures: false,
            reduce_gb: true,
            info_level: 0,
            print_gb: false,
        }
    }
}

impl Config {
    /// Validates field combinations that the orchestrator otherwise
    /// would have to guard ad hoc at every call site.
    pub fn validate(&self) -> Result<(), crate::error::Error> {
        if self.nr_threads == 0 {
            return Err(crate::error::Error::InvalidInput(
                "nr_threads must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn zero_threads_is_rejected() {
        let cfg = Config {
            nr_threads: 0,
            ..Config::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn deserializes_partial_fragment() {
        let cfg: Config = serde_json::from_str(r#"{"use_signatures": true}"#).unwrap();
        assert!(cfg.use_signatures);
        assert_eq!(cfg.nr_threads, Config::default().nr_threads);
    }
}
