use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use super::Address;

/// Order type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderType {
    Market,
    Limit,
    Stop,
}

impl OrderType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Market => "market",
            Self::Limit => "limit",
            Self::Stop => "stop",
        }
    }
}

impl std::fmt::Display for OrderType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for OrderType {
    type Err = &'static str;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "market" => Ok(Self::Market),
            "limit" => Ok(Self::Limit),
            "stop" => Ok(Self::Stop),
            _ => Err("invalid order type; expected market|limit|stop"),
        }
    }
}

/// Risk percentage per trade, restricted to the offered tiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskPercentage {
    Half,
    One,
    Two,
    Three,
}

impl RiskPercentage {
    pub fn from_percent_str(raw: &str) -> Option<Self> {
        match raw.trim() {
            "0.5" => Some(Self::Half),
            "1" => Some(Self::One),
            "2" => Some(Self::Two),
            "3" => Some(Self::Three),
            _ => None,
        }
    }

    /// Risk as a fraction of the trade amount (e.g. One => 0.01).
    pub fn as_fraction(&self) -> Decimal {
        match self {
            Self::Half => Decimal::new(5, 3),
            Self::One => Decimal::new(1, 2),
            Self::Two => Decimal::new(2, 2),
            Self::Three => Decimal::new(3, 2),
        }
    }
}

impl std::fmt::Display for RiskPercentage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Half => write!(f, "0.5%"),
            Self::One => write!(f, "1%"),
            Self::Two => write!(f, "2%"),
            Self::Three => write!(f, "3%"),
        }
    }
}

/// A trade to execute on a principal's behalf, directly or via delegation.
///
/// `sub_account` absent means a self-trade; when present and different from
/// the principal, a verified trust agreement must exist before execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DelegatedTrade {
    pub principal: Address,
    pub sub_account: Option<Address>,
    pub amount: Decimal,
    pub order_type: OrderType,
    pub risk: RiskPercentage,
}

impl DelegatedTrade {
    /// Is this trade routed through a delegated sub-account?
    pub fn is_delegated(&self) -> bool {
        self.sub_account
            .as_ref()
            .is_some_and(|sub| *sub != self.principal)
    }

    /// Advisory position size: `amount × risk`.
    ///
    /// Display-only. The ledger recomputes the executed size; this value is
    /// never trusted as the real one.
    pub fn position_size(&self) -> Decimal {
        self.amount * self.risk.as_fraction()
    }
}

/// Receipt for a submitted trade.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradeReceipt {
    pub tx_ref: String,
    pub principal: Address,
    pub sub_account: Option<Address>,
    pub amount: Decimal,
    pub order_type: OrderType,
    pub position_size: Decimal,
    pub submitted_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn addr(n: u8) -> Address {
        format!("0x{:040x}", n).parse().unwrap()
    }

    #[test]
    fn position_size_is_amount_times_risk() {
        let trade = DelegatedTrade {
            principal: addr(1),
            sub_account: None,
            amount: dec!(10000),
            order_type: OrderType::Market,
            risk: RiskPercentage::Two,
        };
        assert_eq!(trade.position_size(), dec!(200.00));
    }

    #[test]
    fn same_address_sub_account_is_not_delegation() {
        let trade = DelegatedTrade {
            principal: addr(1),
            sub_account: Some(addr(1)),
            amount: dec!(100),
            order_type: OrderType::Limit,
            risk: RiskPercentage::One,
        };
        assert!(!trade.is_delegated());
    }

    #[test]
    fn different_sub_account_is_delegation() {
        let trade = DelegatedTrade {
            principal: addr(1),
            sub_account: Some(addr(2)),
            amount: dec!(100),
            order_type: OrderType::Limit,
            risk: RiskPercentage::One,
        };
        assert!(trade.is_delegated());
    }

    #[test]
    fn order_type_parses_known_values() {
        assert_eq!("market".parse::<OrderType>().unwrap(), OrderType::Market);
        assert_eq!("LIMIT".parse::<OrderType>().unwrap(), OrderType::Limit);
        assert!("trailing".parse::<OrderType>().is_err());
    }

    #[test]
    fn risk_percentage_tiers() {
        assert_eq!(
            RiskPercentage::from_percent_str("0.5"),
            Some(RiskPercentage::Half)
        );
        assert_eq!(RiskPercentage::from_percent_str("4"), None);
        assert_eq!(RiskPercentage::Half.as_fraction(), dec!(0.005));
    }
}
