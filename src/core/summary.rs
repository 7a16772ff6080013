use serde::Serialize;

use super::types::{FinancialProfile, InfeasibleScenario, Phase, SimulationResult};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanSummary {
    pub retirement_age: u32,
    pub years_to_retirement: u32,
    pub total_invested: f64,
    pub capital_at_retirement: f64,
    pub capital_at_death: f64,
    pub peak_capital: f64,
    pub peak_capital_age: u32,
    pub current_monthly_cost: f64,
    pub monthly_cost_at_retirement: f64,
    pub final_monthly_cost: f64,
    /// Percent change vs today's monthly cost; `None` when today's cost is zero.
    pub cost_increase_at_retirement_pct: Option<f64>,
    pub final_cost_increase_pct: Option<f64>,
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioRow {
    pub retirement_age: u32,
    pub depletion_age: u32,
    pub years_in_retirement: u32,
}

impl From<InfeasibleScenario> for ScenarioRow {
    fn from(value: InfeasibleScenario) -> Self {
        Self {
            retirement_age: value.retirement_age,
            depletion_age: value.depletion_age,
            years_in_retirement: value.years_in_retirement(),
        }
    }
}

pub fn summarize(profile: &FinancialProfile, result: &SimulationResult) -> Option<PlanSummary> {
    let retirement_age = result.retirement_age?;
    let capital_at_death = result.capital_at_death?;
    let years_to_retirement = retirement_age - profile.current_age;

    let capital_at_retirement = result
        .capital_timeline
        .iter()
        .filter(|p| p.phase == Phase::Accumulation)
        .next_back()
        .map_or(0.0, |p| p.capital);

    let (peak_capital_age, peak_capital) = result
        .capital_timeline
        .iter()
        .fold(None, |best: Option<(u32, f64)>, p| match best {
            Some((_, capital)) if capital >= p.capital => best,
            _ => Some((p.age, p.capital)),
        })
        .unwrap_or((profile.current_age, profile.starting_capital));

    let current_monthly_cost = profile.monthly_retirement_spend;
    let mut retirement_costs = result
        .cost_timeline
        .iter()
        .filter(|p| p.phase == Phase::Retirement)
        .map(|p| p.monthly_cost);
    let monthly_cost_at_retirement = retirement_costs.next().unwrap_or(current_monthly_cost);
    let final_monthly_cost = retirement_costs
        .next_back()
        .unwrap_or(monthly_cost_at_retirement);

    Some(PlanSummary {
        retirement_age,
        years_to_retirement,
        total_invested: years_to_retirement as f64 * profile.monthly_contribution * 12.0
            + profile.starting_capital,
        capital_at_retirement,
        capital_at_death,
        peak_capital,
        peak_capital_age,
        current_monthly_cost,
        monthly_cost_at_retirement,
        final_monthly_cost,
        cost_increase_at_retirement_pct: percent_increase(
            monthly_cost_at_retirement,
            current_monthly_cost,
        ),
        final_cost_increase_pct: percent_increase(final_monthly_cost, current_monthly_cost),
    })
}

pub fn scenario_rows(result: &SimulationResult) -> Vec<ScenarioRow> {
    result
        .infeasible_scenarios
        .iter()
        .copied()
        .map(ScenarioRow::from)
        .collect()
}

fn percent_increase(value: f64, base: f64) -> Option<f64> {
    (base > 0.0).then(|| (value / base - 1.0) * 100.0)
}
