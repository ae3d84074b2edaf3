//! Replay settings: base currency, lot-selection method, rewards cost-basis
//! mode, and jurisdiction profile.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Lot-selection policy applied when a disposal consumes inventory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LotMethod {
    /// First in, first out. Oldest lots are consumed first.
    #[default]
    Fifo,
    /// Last in, first out. Newest lots are consumed first.
    Lifo,
    /// Highest in, first out. Highest remaining cost-per-unit lots first.
    Hifo,
    /// Weighted average over a rolling per-asset pool.
    AvgCost,
}

/// Cost-basis treatment of reward-family acquisitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RewardsBasisMode {
    /// Rewards enter inventory at zero cost.
    #[default]
    ZeroCost,
    /// Rewards enter inventory at their fair market value.
    FairValue,
}

/// Jurisdiction profile. May constrain the lot-method choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaxProfile {
    /// No jurisdiction-specific constraints.
    #[default]
    Generic,
    /// United States: any supported lot method.
    UnitedStates,
    /// Germany: FIFO is mandatory.
    Germany,
}

impl TaxProfile {
    /// The lot method this profile mandates, if any.
    pub fn forced_lot_method(&self) -> Option<LotMethod> {
        match self {
            TaxProfile::Germany => Some(LotMethod::Fifo),
            TaxProfile::Generic | TaxProfile::UnitedStates => None,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

impl FromStr for LotMethod {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "FIFO" => Ok(Self::Fifo),
            "LIFO" => Ok(Self::Lifo),
            "HIFO" => Ok(Self::Hifo),
            "AVG_COST" => Ok(Self::AvgCost),
            other => Err(ConfigError::InvalidValue(
                "lotMethod".to_string(),
                format!("must be FIFO, LIFO, HIFO, or AVG_COST, got {}", other),
            )),
        }
    }
}

impl fmt::Display for LotMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fifo => write!(f, "FIFO"),
            Self::Lifo => write!(f, "LIFO"),
            Self::Hifo => write!(f, "HIFO"),
            Self::AvgCost => write!(f, "AVG_COST"),
        }
    }
}

impl FromStr for RewardsBasisMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "ZERO_COST" => Ok(Self::ZeroCost),
            "FAIR_VALUE" => Ok(Self::FairValue),
            other => Err(ConfigError::InvalidValue(
                "rewardsBasisMode".to_string(),
                format!("must be ZERO_COST or FAIR_VALUE, got {}", other),
            )),
        }
    }
}

impl fmt::Display for RewardsBasisMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ZeroCost => write!(f, "ZERO_COST"),
            Self::FairValue => write!(f, "FAIR_VALUE"),
        }
    }
}

/// Caller-supplied replay settings.
///
/// All monetary amounts on events are assumed pre-converted to
/// `base_currency`; the engine never does currency conversion itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    pub base_currency: String,
    #[serde(default)]
    pub lot_method: LotMethod,
    #[serde(default)]
    pub rewards_basis: RewardsBasisMode,
    #[serde(default)]
    pub tax_profile: TaxProfile,
}

impl Settings {
    /// The lot method a replay actually runs with.
    ///
    /// Precedence: jurisdiction-forced method, then an explicit caller
    /// override, then the configured default. The constraint is applied
    /// before replay, never as a post-hoc adjustment.
    pub fn effective_lot_method(&self, overriding: Option<LotMethod>) -> LotMethod {
        if let Some(forced) = self.tax_profile.forced_lot_method() {
            return forced;
        }
        overriding.unwrap_or(self.lot_method)
    }
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            base_currency: "USD".to_string(),
            lot_method: LotMethod::default(),
            rewards_basis: RewardsBasisMode::default(),
            tax_profile: TaxProfile::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lot_method_parse_roundtrip() {
        for (s, m) in [
            ("FIFO", LotMethod::Fifo),
            ("LIFO", LotMethod::Lifo),
            ("HIFO", LotMethod::Hifo),
            ("AVG_COST", LotMethod::AvgCost),
        ] {
            assert_eq!(LotMethod::from_str(s).unwrap(), m);
            assert_eq!(m.to_string(), s);
        }
    }

    #[test]
    fn test_lot_method_invalid_value() {
        let result = LotMethod::from_str("MYSTERY");
        match result {
            Err(ConfigError::InvalidValue(k, _)) => assert_eq!(k, "lotMethod"),
            _ => panic!("Expected InvalidValue error"),
        }
    }

    #[test]
    fn test_enum_wire_format() {
        assert_eq!(
            serde_json::to_string(&LotMethod::AvgCost).unwrap(),
            "\"AVG_COST\""
        );
        assert_eq!(
            serde_json::to_string(&RewardsBasisMode::FairValue).unwrap(),
            "\"FAIR_VALUE\""
        );
        assert_eq!(
            serde_json::to_string(&TaxProfile::UnitedStates).unwrap(),
            "\"UNITED_STATES\""
        );
    }

    #[test]
    fn test_settings_defaults() {
        let settings: Settings = serde_json::from_str(r#"{"baseCurrency": "EUR"}"#).unwrap();
        assert_eq!(settings.base_currency, "EUR");
        assert_eq!(settings.lot_method, LotMethod::Fifo);
        assert_eq!(settings.rewards_basis, RewardsBasisMode::ZeroCost);
        assert_eq!(settings.tax_profile, TaxProfile::Generic);
    }

    #[test]
    fn test_effective_lot_method_precedence() {
        let mut settings = Settings {
            lot_method: LotMethod::Hifo,
            ..Settings::default()
        };
        assert_eq!(settings.effective_lot_method(None), LotMethod::Hifo);
        assert_eq!(
            settings.effective_lot_method(Some(LotMethod::Lifo)),
            LotMethod::Lifo
        );

        settings.tax_profile = TaxProfile::Germany;
        assert_eq!(
            settings.effective_lot_method(Some(LotMethod::Hifo)),
            LotMethod::Fifo
        );
    }
}
