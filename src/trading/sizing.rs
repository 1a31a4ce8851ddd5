use serde::{Deserialize, Serialize};

use crate::strategies::signals::TradeSignal;

const CONTRACT_MULTIPLIER: f64 = 100.0;

/// Contracts a budget can buy at the estimated premium. Display-level
/// arithmetic only; a degenerate premium sizes to zero rather than faulting.
pub fn contracts_affordable(budget: f64, premium: f64) -> u32 {
    if !budget.is_finite() || !premium.is_finite() || premium <= 0.0 || budget <= 0.0 {
        return 0;
    }
    (budget / (premium * CONTRACT_MULTIPLIER)).floor() as u32
}

/// One row of the payout simulation shown beside a recommendation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PayoutRow {
    pub label: &'static str,
    pub exit_premium: f64,
    pub pnl: f64,
}

/// Simulated dollar outcomes at each profit target and the stop for the
/// given contract count.
pub fn payout_table(signal: &TradeSignal, contracts: u32) -> Vec<PayoutRow> {
    let per_contract = |exit: f64| (exit - signal.estimated_premium) * CONTRACT_MULTIPLIER;
    let n = contracts as f64;
    vec![
        PayoutRow {
            label: "T1",
            exit_premium: signal.profit_target_1,
            pnl: per_contract(signal.profit_target_1) * n,
        },
        PayoutRow {
            label: "T2",
            exit_premium: signal.profit_target_2,
            pnl: per_contract(signal.profit_target_2) * n,
        },
        PayoutRow {
            label: "T3",
            exit_premium: signal.profit_target_3,
            pnl: per_contract(signal.profit_target_3) * n,
        },
        PayoutRow {
            label: "stop",
            exit_premium: signal.stop_loss,
            pnl: per_contract(signal.stop_loss) * n,
        },
    ]
}
