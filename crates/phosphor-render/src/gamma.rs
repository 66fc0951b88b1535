#![forbid(unsafe_code)]

//! Coverage to intensity lookup.

/// Standard sRGB display gamma.
pub const DEFAULT_GAMMA: f32 = 2.2;

/// Precomputed `255 * (c / 255)^(1 / gamma)` for every coverage value `c`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GammaTable {
    table: [u8; 256],
}

impl GammaTable {
    #[must_use]
    pub fn new(gamma: f32) -> Self {
        let gamma = if gamma.is_finite() && gamma > 0.0 {
            gamma
        } else {
            DEFAULT_GAMMA
        };
        let exponent = 1.0 / gamma;
        let mut table = [0u8; 256];
        for (ndx, entry) in table.iter_mut().enumerate() {
            let base = ndx as f32 / 255.0;
            // Truncate, matching the classic console's table.
            *entry = (base.powf(exponent) * 255.0) as u8;
        }
        Self { table }
    }

    #[inline]
    pub fn apply(&self, coverage: u8) -> u8 {
        self.table[usize::from(coverage)]
    }
}

impl Default for GammaTable {
    fn default() -> Self {
        Self::new(DEFAULT_GAMMA)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoints_are_fixed() {
        let table = GammaTable::default();
        assert_eq!(table.apply(0), 0);
        assert_eq!(table.apply(255), 255);
    }

    #[test]
    fn gamma_brightens_midtones() {
        let table = GammaTable::default();
        assert!(table.apply(64) > 64);
        assert!(table.apply(128) > 128);
    }

    #[test]
    fn table_is_monotonic() {
        let table = GammaTable::new(2.2);
        for c in 1..=255u8 {
            assert!(table.apply(c) >= table.apply(c - 1));
        }
    }

    #[test]
    fn unit_gamma_is_near_identity() {
        let table = GammaTable::new(1.0);
        for c in [0u8, 1, 77, 128, 254, 255] {
            assert!(c.abs_diff(table.apply(c)) <= 1);
        }
    }

    #[test]
    fn invalid_gamma_falls_back_to_default() {
        assert_eq!(GammaTable::new(0.0), GammaTable::default());
        assert_eq!(GammaTable::new(f32::NAN), GammaTable::default());
    }
}
