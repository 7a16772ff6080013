use tracing::debug;

use super::types::{
    CandidateRun, CapitalPoint, CostPoint, FinancialProfile, InfeasibleScenario, Phase,
    SimulationResult,
};

/// Finds the earliest retirement age whose trajectory ends with positive capital
/// at `death_age`. Every earlier candidate that depleted is reported in
/// `infeasible_scenarios`.
pub fn simulate(profile: &FinancialProfile) -> SimulationResult {
    let mut infeasible_scenarios = Vec::new();

    for retirement_age in profile.current_age..profile.death_age {
        let run = run_candidate(profile, retirement_age);
        if run.accepted {
            return SimulationResult {
                retirement_age: Some(run.retirement_age),
                capital_at_death: Some(run.final_capital),
                infeasible_scenarios,
                capital_timeline: run.capital_timeline,
                cost_timeline: run.cost_timeline,
            };
        }

        if let Some(depletion_age) = run.depletion_age {
            debug!(retirement_age, depletion_age, "candidate depleted");
            infeasible_scenarios.push(InfeasibleScenario {
                retirement_age,
                depletion_age,
            });
        }
    }

    SimulationResult::infeasible()
}

/// Runs accumulation up to `retirement_age` and withdrawals up to `death_age`.
/// The retirement loop stops at the first year capital goes negative.
pub fn run_candidate(profile: &FinancialProfile, retirement_age: u32) -> CandidateRun {
    let growth = 1.0 + profile.annual_return_rate;
    let accumulation_years = retirement_age.saturating_sub(profile.current_age);
    let retirement_years = profile.death_age.saturating_sub(retirement_age);
    let horizon = (accumulation_years + retirement_years) as usize;

    let mut capital_timeline = Vec::with_capacity(horizon);
    let mut cost_timeline = Vec::with_capacity(horizon);
    let mut capital = profile.starting_capital;

    for year in 0..accumulation_years {
        let price_index = inflation_factor(profile, year);
        let annual_contribution = profile.monthly_contribution * 12.0 * price_index;
        capital = capital * growth + annual_contribution;

        let age = profile.current_age + year + 1;
        capital_timeline.push(CapitalPoint {
            age,
            capital,
            phase: Phase::Accumulation,
        });
        cost_timeline.push(CostPoint {
            age,
            monthly_cost: profile.monthly_retirement_spend * price_index,
            phase: Phase::Accumulation,
        });
    }

    let mut depletion_age = None;
    for year in 0..retirement_years {
        let price_index = inflation_factor(profile, accumulation_years + year);
        let annual_withdrawal = profile.monthly_retirement_spend * 12.0 * price_index;
        capital = capital * growth - annual_withdrawal;

        let age = retirement_age + year + 1;
        capital_timeline.push(CapitalPoint {
            age,
            capital: capital.max(0.0),
            phase: Phase::Retirement,
        });
        cost_timeline.push(CostPoint {
            age,
            monthly_cost: annual_withdrawal / 12.0,
            phase: Phase::Retirement,
        });

        if capital < 0.0 {
            depletion_age = Some(retirement_age + year);
            break;
        }
    }

    CandidateRun {
        retirement_age,
        final_capital: capital,
        depletion_age,
        accepted: capital > 0.0,
        capital_timeline,
        cost_timeline,
    }
}

fn inflation_factor(profile: &FinancialProfile, years: u32) -> f64 {
    (1.0 + profile.annual_inflation_rate).powi(years as i32)
}
