//! Economy ledger: exact minor-unit treasury and atomic settlements.
//!
//! Every amount is an `i64` count of minor currency units; there is no float
//! anywhere in balance arithmetic, so a decades-long campaign cannot drift.
//! A settlement is computed in full and committed in one step, and insolvency
//! is reported as a status exactly once per settlement, never raised as an
//! error.

use serde::{Deserialize, Serialize};

use crate::config::EconomyConfig;
use crate::entities::Sponsor;
use crate::error::InsolvencyCondition;

/// A team's cash position in minor currency units. May go negative; the
/// ledger reports the breach and leaves consequences to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct Treasury {
    balance: i64,
}

impl Treasury {
    #[must_use]
    pub const fn new(balance: i64) -> Self {
        Self { balance }
    }

    #[must_use]
    pub const fn balance(&self) -> i64 {
        self.balance
    }
}

/// One settlement's money movements, all in minor units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Settlement {
    /// Constructor's cut of organiser prize money.
    pub prize_income: i64,
    pub sponsor_income: i64,
    /// Wages fall due every week regardless of results.
    pub wage_cost: i64,
    pub running_cost: i64,
    pub upgrade_spend: i64,
    pub maintenance_spend: i64,
}

impl Settlement {
    #[must_use]
    pub const fn net(&self) -> i64 {
        self.prize_income + self.sponsor_income
            - self.wage_cost
            - self.running_cost
            - self.upgrade_spend
            - self.maintenance_spend
    }
}

/// Solvency verdict attached to every settlement report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SolvencyStatus {
    Solvent { balance: i64 },
    Insolvent(InsolvencyCondition),
}

impl SolvencyStatus {
    #[must_use]
    pub const fn is_insolvent(&self) -> bool {
        matches!(self, Self::Insolvent(_))
    }
}

/// Outcome of one committed settlement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettlementReport {
    pub settlement: Settlement,
    pub balance_before: i64,
    pub balance_after: i64,
    pub solvency: SolvencyStatus,
}

/// Apply a settlement to the treasury atomically.
///
/// The new balance is computed in full before the commit, so downstream
/// bookkeeping can never observe a half-applied settlement. A balance at or
/// below the configured floor is reported (once) via the returned status.
pub fn settle(
    treasury: &mut Treasury,
    settlement: Settlement,
    cfg: &EconomyConfig,
) -> SettlementReport {
    let balance_before = treasury.balance;
    let balance_after = balance_before + settlement.net();
    treasury.balance = balance_after;

    let solvency = if balance_after < cfg.solvency_floor {
        let condition = InsolvencyCondition {
            balance: balance_after,
            floor: cfg.solvency_floor,
            shortfall: cfg.solvency_floor - balance_after,
        };
        log::info!(
            "insolvency: balance {} below floor {} (shortfall {})",
            condition.balance,
            condition.floor,
            condition.shortfall
        );
        SolvencyStatus::Insolvent(condition)
    } else {
        SolvencyStatus::Solvent {
            balance: balance_after,
        }
    };

    SettlementReport {
        settlement,
        balance_before,
        balance_after,
        solvency,
    }
}

/// Compute a sponsor's payout for one race and advance its goal bookkeeping.
///
/// The appearance fee is paid for taking the start even on a retirement;
/// points and podium bonuses follow the classified result. Goal bonuses pay
/// out once, the first time each threshold is crossed. `rate_permille` is the
/// market rate multiplier (1000 = neutral terms).
pub fn sponsor_race_payout(
    sponsor: &mut Sponsor,
    points: u32,
    podium: bool,
    rate_permille: i64,
) -> i64 {
    let terms = sponsor.terms.clone();
    let at_rate = |amount: i64| amount * rate_permille / 1_000;

    sponsor.races_started += 1;
    let mut payout = at_rate(terms.per_start);
    payout += at_rate(terms.per_point * i64::from(points));

    if podium {
        sponsor.podiums += 1;
        payout += at_rate(terms.per_podium);
    }

    if !sponsor.goal_starts_met
        && terms.goal_starts > 0
        && sponsor.races_started >= terms.goal_starts
    {
        sponsor.goal_starts_met = true;
        payout += terms.goal_starts_bonus;
    }
    if !sponsor.goal_podiums_met
        && terms.goal_podiums > 0
        && sponsor.podiums >= terms.goal_podiums
    {
        sponsor.goal_podiums_met = true;
        payout += terms.goal_podiums_bonus;
    }

    payout
}
