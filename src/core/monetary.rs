/// Ledger monetary units
///
/// Amounts on the ledger are integers in the smallest unit. Human-readable
/// float amounts exist only at the I/O boundary and are converted with a
/// fixed multiplier.
///
/// ## Units
/// - **Unit**: the smallest indivisible amount
/// - **Coin**: 1,000,000,000 units
/// - **Block reward**: 50 coins initially, halving on a fixed schedule
///
/// Number of units in one coin
pub const UNIT_MULTIPLIER: u64 = 1_000_000_000;

/// Initial block reward in units (50 coins)
pub const INITIAL_BLOCK_REWARD: u64 = 50 * UNIT_MULTIPLIER;

/// Utility functions for converting between coins and units
pub mod conversions {
    /// Convert a readable coin amount to units. Negative and NaN inputs map to
    /// zero; values beyond `u64::MAX` saturate.
    ///
    /// # Examples
    /// ```
    /// use testcoin::core::monetary::conversions::coins_to_units;
    /// assert_eq!(coins_to_units(1.0, 1_000_000_000), 1_000_000_000);
    /// assert_eq!(coins_to_units(0.5, 1_000_000_000), 500_000_000);
    /// ```
    pub fn coins_to_units(coins: f64, multiplier: u64) -> u64 {
        (coins * multiplier as f64).round() as u64
    }

    /// Convert units to a readable coin amount
    ///
    /// # Examples
    /// ```
    /// use testcoin::core::monetary::conversions::units_to_coins;
    /// assert_eq!(units_to_coins(1_000_000_000, 1_000_000_000), 1.0);
    /// ```
    pub fn units_to_coins(units: u64, multiplier: u64) -> f64 {
        units as f64 / multiplier as f64
    }

    /// Format units as a human-readable string
    pub fn format_units(units: u64, multiplier: u64) -> String {
        format!("{:.9} coins", units_to_coins(units, multiplier))
    }
}

#[cfg(test)]
mod tests {
    use super::conversions::*;
    use super::*;

    #[test]
    fn test_monetary_constants() {
        assert_eq!(UNIT_MULTIPLIER, 1_000_000_000);
        assert_eq!(INITIAL_BLOCK_REWARD, 50 * UNIT_MULTIPLIER);
    }

    #[test]
    fn test_conversions() {
        assert_eq!(coins_to_units(1.0, UNIT_MULTIPLIER), UNIT_MULTIPLIER);
        assert_eq!(coins_to_units(69.69, UNIT_MULTIPLIER), 69_690_000_000);
        assert_eq!(coins_to_units(-3.0, UNIT_MULTIPLIER), 0);
        assert_eq!(units_to_coins(UNIT_MULTIPLIER / 2, UNIT_MULTIPLIER), 0.5);

        let original = 1.234_567_891;
        let back = units_to_coins(coins_to_units(original, UNIT_MULTIPLIER), UNIT_MULTIPLIER);
        assert!((original - back).abs() < 1e-9);
    }

    #[test]
    fn test_formatting() {
        assert_eq!(format_units(UNIT_MULTIPLIER, UNIT_MULTIPLIER), "1.000000000 coins");
        assert_eq!(format_units(1, UNIT_MULTIPLIER), "0.000000001 coins");
    }
}
