//! # Native Units
//!
//! Gas and native balances are denominated in the chain's own currency:
//! a major unit (ETH, NEW) made of 10^18 minor units (WEI, ISAAC). Balance
//! summaries pick whichever unit reads better. This is display only; the
//! rendered text is never parsed back into an amount.

use super::codec::{raw_to_decimal_string, Decimals, RawAmount};
use crate::config::MAJOR_UNIT_DECIMALS;

/// Which end of the native scale to render in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Unit {
    /// 10^18 minor units.
    Major,
    /// The smallest unit.
    Minor,
}

/// The names a chain gives its native units.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UnitNames {
    major: &'static str,
    minor: &'static str,
}

impl UnitNames {
    pub const fn new(major: &'static str, minor: &'static str) -> Self {
        Self { major, minor }
    }

    pub fn major(&self) -> &'static str {
        self.major
    }

    pub fn minor(&self) -> &'static str {
        self.minor
    }

    pub fn name(&self, unit: Unit) -> &'static str {
        match unit {
            Unit::Major => self.major,
            Unit::Minor => self.minor,
        }
    }
}

/// Renders `raw` (in minor units) in the requested unit, without a suffix.
pub fn render_in_unit(raw: &RawAmount, unit: Unit) -> String {
    match unit {
        Unit::Major => raw_to_decimal_string(raw, major_scale()),
        Unit::Minor => raw.to_decimal_digits(),
    }
}

/// Balance-summary rendering: up to 18 digits stay in the minor unit,
/// anything larger switches to the major unit. The unit name is appended.
///
/// ```
/// use tokencommander_protocol::amount::{render_with_unit_auto_select, RawAmount, UnitNames};
///
/// let names = UnitNames::new("ETH", "WEI");
/// assert_eq!(render_with_unit_auto_select(&RawAmount::from(21_000u64), names), "21000 WEI");
/// ```
pub fn render_with_unit_auto_select(raw: &RawAmount, names: UnitNames) -> String {
    let unit = if raw.digit_count() <= usize::from(MAJOR_UNIT_DECIMALS) {
        Unit::Minor
    } else {
        Unit::Major
    };
    format!("{} {}", render_in_unit(raw, unit), names.name(unit))
}

fn major_scale() -> Decimals {
    // MAJOR_UNIT_DECIMALS equals MAX_DECIMALS, so this is always in range.
    Decimals::MAX
}

#[cfg(test)]
mod tests {
    use super::*;

    const ETH: UnitNames = UnitNames::new("ETH", "WEI");

    #[test]
    fn eighteen_digits_stay_in_minor_unit() {
        let raw: RawAmount = "999999999999999999".parse().unwrap();
        assert_eq!(render_with_unit_auto_select(&raw, ETH), "999999999999999999 WEI");
    }

    #[test]
    fn nineteen_digits_switch_to_major_unit() {
        let raw: RawAmount = "1500000000000000000".parse().unwrap();
        assert_eq!(render_with_unit_auto_select(&raw, ETH), "1.5 ETH");
    }

    #[test]
    fn zero_renders_in_minor_unit() {
        assert_eq!(render_with_unit_auto_select(&RawAmount::zero(), ETH), "0 WEI");
    }

    #[test]
    fn explicit_major_rendering_handles_small_values() {
        assert_eq!(render_in_unit(&RawAmount::from(21_000u64), Unit::Major), "0.000000000000021");
        assert_eq!(render_in_unit(&RawAmount::from(21_000u64), Unit::Minor), "21000");
    }

    #[test]
    fn unit_names_lookup() {
        assert_eq!(ETH.name(Unit::Major), "ETH");
        assert_eq!(ETH.name(Unit::Minor), "WEI");
    }
}
