//! Construction options.

use crate::error::MapError;

/// Options accepted by `HybridMap::with_options` and
/// `RawHybridMap::with_options`.
///
/// `initial_capacity` is forwarded to both backing stores as a reservation
/// hint. `load_factor` is validated and otherwise unused; the backing
/// stores size themselves. `fail_fast: false` keeps the modification
/// counter running but stops iterators from reporting changes.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct MapOptions {
    pub initial_capacity: usize,
    pub load_factor: f32,
    pub fail_fast: bool,
}

impl Default for MapOptions {
    fn default() -> Self {
        Self {
            initial_capacity: 0,
            load_factor: 0.75,
            fail_fast: true,
        }
    }
}

impl MapOptions {
    pub fn with_capacity(initial_capacity: usize) -> Self {
        Self {
            initial_capacity,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), MapError> {
        // Rejects NaN as well as negatives.
        if !(self.load_factor >= 0.0) {
            log::debug!("rejecting map options: load factor {}", self.load_factor);
            return Err(MapError::InvalidLoadFactor(self.load_factor));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_valid() {
        let o = MapOptions::default();
        assert!(o.validate().is_ok());
        assert!(o.fail_fast);
        assert_eq!(MapOptions::with_capacity(8).initial_capacity, 8);
    }

    /// Invariant: negative and NaN load factors are rejected; zero and
    /// large factors are accepted and ignored.
    #[test]
    fn load_factor_checks() {
        let bad = MapOptions {
            load_factor: -0.5,
            ..MapOptions::default()
        };
        assert_eq!(bad.validate(), Err(MapError::InvalidLoadFactor(-0.5)));

        let nan = MapOptions {
            load_factor: f32::NAN,
            ..MapOptions::default()
        };
        assert!(matches!(nan.validate(), Err(MapError::InvalidLoadFactor(_))));

        for ok in [0.0, 1.0, 100.0] {
            let o = MapOptions {
                load_factor: ok,
                ..MapOptions::default()
            };
            assert!(o.validate().is_ok());
        }
    }
}
