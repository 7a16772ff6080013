use serde::Serialize;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
pub enum Phase {
    Accumulation,
    Retirement,
}

/// Inputs for one simulation run. Rates are fractional (0.06 for 6%) and
/// monetary amounts are in today's money.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FinancialProfile {
    pub current_age: u32,
    pub starting_capital: f64,
    pub monthly_contribution: f64,
    pub annual_return_rate: f64,
    pub annual_inflation_rate: f64,
    pub monthly_retirement_spend: f64,
    pub death_age: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CapitalPoint {
    pub age: u32,
    pub capital: f64,
    pub phase: Phase,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CostPoint {
    pub age: u32,
    pub monthly_cost: f64,
    pub phase: Phase,
}

/// A candidate retirement age that ran out of money. `depletion_age` is the
/// last age at which capital was still non-negative.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InfeasibleScenario {
    pub retirement_age: u32,
    pub depletion_age: u32,
}

impl InfeasibleScenario {
    pub fn years_in_retirement(self) -> u32 {
        self.depletion_age - self.retirement_age
    }
}

/// Outcome of evaluating a single candidate retirement age.
#[derive(Debug, Clone)]
pub struct CandidateRun {
    pub retirement_age: u32,
    pub final_capital: f64,
    pub depletion_age: Option<u32>,
    pub accepted: bool,
    pub capital_timeline: Vec<CapitalPoint>,
    pub cost_timeline: Vec<CostPoint>,
}

/// Either every field is populated (feasible) or every field is empty.
#[derive(Debug, Clone, Default)]
pub struct SimulationResult {
    pub retirement_age: Option<u32>,
    pub capital_at_death: Option<f64>,
    pub infeasible_scenarios: Vec<InfeasibleScenario>,
    pub capital_timeline: Vec<CapitalPoint>,
    pub cost_timeline: Vec<CostPoint>,
}

impl SimulationResult {
    pub fn infeasible() -> Self {
        Self::default()
    }

    pub fn is_feasible(&self) -> bool {
        self.retirement_age.is_some()
    }
}
