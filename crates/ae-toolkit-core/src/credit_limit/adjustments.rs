use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::format::format_currency;
use crate::types::Money;

/// One candidate multiplier in an adjustment chain.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdjustmentRule {
    pub label: String,
    /// Multiplier applied to the running value (0.90 = -10%).
    pub factor: Decimal,
    pub triggered: bool,
}

/// Audit record for a rule that fired.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdjustmentStep {
    pub label: String,
    /// (factor - 1) * 100, e.g. -35 or +5.
    pub pct_delta: Decimal,
    pub limit_before: Money,
    pub limit_after: Money,
}

impl AdjustmentStep {
    /// Breakdown line, e.g. `Non-Saudi company: -10% (500,000 SAR -> 450,000 SAR)`.
    pub fn describe(&self) -> String {
        let pct = self.pct_delta.round_dp(0).normalize();
        let sign = if pct.is_sign_negative() { "" } else { "+" };
        format!(
            "{}: {sign}{pct}% ({} -> {})",
            self.label,
            format_currency(self.limit_before),
            format_currency(self.limit_after),
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainOutcome {
    pub start: Money,
    pub end: Money,
    pub steps: Vec<AdjustmentStep>,
}

/// Ordered list of multiplicative adjustments. Rules are applied in
/// insertion order, each to the output of the previous one.
#[derive(Debug, Clone, Default)]
pub struct AdjustmentChain {
    rules: Vec<AdjustmentRule>,
}

impl AdjustmentChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rule(mut self, label: impl Into<String>, factor: Decimal, triggered: bool) -> Self {
        self.rules.push(AdjustmentRule {
            label: label.into(),
            factor,
            triggered,
        });
        self
    }

    pub fn rules(&self) -> &[AdjustmentRule] {
        &self.rules
    }

    pub fn apply(&self, start: Money) -> ChainOutcome {
        let mut running = start;
        let mut steps = Vec::new();
        for rule in self.rules.iter().filter(|r| r.triggered) {
            let after = running * rule.factor;
            steps.push(AdjustmentStep {
                label: rule.label.clone(),
                pct_delta: (rule.factor - Decimal::ONE) * Decimal::ONE_HUNDRED,
                limit_before: running,
                limit_after: after,
            });
            running = after;
        }
        ChainOutcome {
            start,
            end: running,
            steps,
        }
    }
}
