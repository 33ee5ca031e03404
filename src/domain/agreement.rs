use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Address;

/// Profit share taken by the admin, restricted to the offered tiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum ProfitShare {
    Ten,
    Fifteen,
    Twenty,
    TwentyFive,
    Thirty,
}

impl ProfitShare {
    pub fn from_percent(percent: u8) -> Option<Self> {
        match percent {
            10 => Some(Self::Ten),
            15 => Some(Self::Fifteen),
            20 => Some(Self::Twenty),
            25 => Some(Self::TwentyFive),
            30 => Some(Self::Thirty),
            _ => None,
        }
    }

    pub fn percent(&self) -> u8 {
        match self {
            Self::Ten => 10,
            Self::Fifteen => 15,
            Self::Twenty => 20,
            Self::TwentyFive => 25,
            Self::Thirty => 30,
        }
    }
}

impl From<ProfitShare> for u8 {
    fn from(share: ProfitShare) -> Self {
        share.percent()
    }
}

impl TryFrom<u8> for ProfitShare {
    type Error = String;

    fn try_from(percent: u8) -> Result<Self, Self::Error> {
        ProfitShare::from_percent(percent)
            .ok_or_else(|| format!("invalid profit share: {}% (expected 10/15/20/25/30)", percent))
    }
}

impl std::fmt::Display for ProfitShare {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}%", self.percent())
    }
}

/// Admin standing as reported by the ledger's identity registry.
///
/// Read-only from the client's perspective; polled, never locally mutated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AdminStatus {
    Active,
    Warning,
    Banned,
}

impl AdminStatus {
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::Active),
            1 => Some(Self::Warning),
            2 => Some(Self::Banned),
            _ => None,
        }
    }

    pub fn code(&self) -> u8 {
        match self {
            Self::Active => 0,
            Self::Warning => 1,
            Self::Banned => 2,
        }
    }
}

impl std::fmt::Display for AdminStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Active => write!(f, "ACTIVE"),
            Self::Warning => write!(f, "WARNING"),
            Self::Banned => write!(f, "BANNED"),
        }
    }
}

/// Delegation contract binding an admin to a principal.
///
/// Immutable once created; amendments create a new agreement. The ledger is
/// the source of truth, the client never caches this as writable state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrustAgreement {
    pub id: String,
    pub admin_address: Address,
    pub user_address: Address,
    pub profit_share: ProfitShare,
    pub terms: String,
    pub created_at: DateTime<Utc>,
    pub signature: String,
}

/// Terms blob submitted to the trust-agreement registry.
///
/// This is the payload the signature covers; field order is fixed by the
/// struct so serialization is deterministic for identical inputs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgreementTerms {
    pub profit_share: u8,
    pub admin_address: Address,
    pub user_address: Address,
    pub timestamp: i64,
    pub terms: String,
}

/// Admin performance metrics from the ledger, for dashboard display only.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct AdminPerformance {
    pub trust_score: u8,
    pub total_managed_accounts: u32,
    pub success_rate: u8,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn profit_share_accepts_offered_tiers() {
        for pct in [10u8, 15, 20, 25, 30] {
            let share = ProfitShare::from_percent(pct).expect("tier should parse");
            assert_eq!(share.percent(), pct);
        }
    }

    #[test]
    fn profit_share_rejects_other_values() {
        for pct in [0u8, 5, 11, 22, 35, 100] {
            assert!(ProfitShare::from_percent(pct).is_none());
        }
    }

    #[test]
    fn admin_status_round_trips_codes() {
        assert_eq!(AdminStatus::from_code(0), Some(AdminStatus::Active));
        assert_eq!(AdminStatus::from_code(1), Some(AdminStatus::Warning));
        assert_eq!(AdminStatus::from_code(2), Some(AdminStatus::Banned));
        assert_eq!(AdminStatus::from_code(3), None);
    }
}
