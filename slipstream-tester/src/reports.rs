//! Aggregate reporting over a batch of campaign outcomes.

use colored::Colorize;
use serde::Serialize;

use crate::campaign::CampaignOutcome;

/// Fleet-wide aggregate across every campaign in the batch.
#[derive(Debug, Clone, Serialize)]
pub struct Aggregate {
    pub campaigns: usize,
    pub total_races: u32,
    pub total_points: u32,
    pub total_wins: u32,
    pub total_podiums: u32,
    pub championships: u32,
    /// Share of entered races ending in a retirement.
    pub dnf_rate: f64,
    /// Share of campaigns that hit insolvency at least once.
    pub insolvency_rate: f64,
    pub avg_final_balance: f64,
    pub avg_final_reputation: f64,
}

/// Fold the batch into one aggregate row.
#[must_use]
pub fn aggregate(outcomes: &[CampaignOutcome]) -> Aggregate {
    let campaigns = outcomes.len();
    let total_races: u32 = outcomes.iter().map(|o| o.races_entered).sum();
    let total_dnfs: u32 = outcomes.iter().map(|o| o.dnfs).sum();
    let insolvent_campaigns = outcomes.iter().filter(|o| o.insolvent_weeks > 0).count();

    let ratio = |num: f64, den: f64| if den > 0.0 { num / den } else { 0.0 };

    Aggregate {
        campaigns,
        total_races,
        total_points: outcomes.iter().map(|o| o.points).sum(),
        total_wins: outcomes.iter().map(|o| o.wins).sum(),
        total_podiums: outcomes.iter().map(|o| o.podiums).sum(),
        championships: outcomes.iter().map(|o| o.championships).sum(),
        dnf_rate: ratio(f64::from(total_dnfs), f64::from(total_races)),
        insolvency_rate: ratio(insolvent_campaigns as f64, campaigns as f64),
        avg_final_balance: ratio(
            outcomes.iter().map(|o| o.final_balance as f64).sum(),
            campaigns as f64,
        ),
        avg_final_reputation: ratio(
            outcomes.iter().map(|o| o.final_reputation).sum(),
            campaigns as f64,
        ),
    }
}

/// Render one campaign row for the console.
#[must_use]
pub fn render_outcome(outcome: &CampaignOutcome) -> String {
    let balance = if outcome.final_balance < 0 {
        format!("{}", outcome.final_balance).red().to_string()
    } else {
        format!("{}", outcome.final_balance).green().to_string()
    };
    format!(
        "  seed {:>12}  races {:>3}  pts {:>3}  wins {:>2}  podiums {:>2}  dnfs {:>2}  titles {}  balance {}",
        outcome.seed,
        outcome.races_entered,
        outcome.points,
        outcome.wins,
        outcome.podiums,
        outcome.dnfs,
        outcome.championships,
        balance,
    )
}

/// Render the aggregate block for the console.
#[must_use]
pub fn render_aggregate(aggregate: &Aggregate) -> String {
    let mut out = String::new();
    out.push_str(&format!("\n{}\n", "── Batch summary ──".bold()));
    out.push_str(&format!(
        "  campaigns: {}   races: {}   points: {}\n",
        aggregate.campaigns, aggregate.total_races, aggregate.total_points
    ));
    out.push_str(&format!(
        "  wins: {}   podiums: {}   championships: {}\n",
        aggregate.total_wins, aggregate.total_podiums, aggregate.championships
    ));

    let dnf = format!("{:.1}%", aggregate.dnf_rate * 100.0);
    let dnf = if aggregate.dnf_rate > 0.35 {
        dnf.red().to_string()
    } else {
        dnf.normal().to_string()
    };
    out.push_str(&format!("  dnf rate: {dnf}\n"));

    let insolvency = format!("{:.1}%", aggregate.insolvency_rate * 100.0);
    let insolvency = if aggregate.insolvency_rate > 0.5 {
        insolvency.red().to_string()
    } else {
        insolvency.normal().to_string()
    };
    out.push_str(&format!("  insolvency rate: {insolvency}\n"));
    out.push_str(&format!(
        "  avg final balance: {:.0}   avg reputation: {:.1}\n",
        aggregate.avg_final_balance, aggregate.avg_final_reputation
    ));
    out
}
