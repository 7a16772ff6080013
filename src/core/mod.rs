mod engine;
mod summary;
mod types;

pub use engine::{run_candidate, simulate};
pub use summary::{PlanSummary, ScenarioRow, scenario_rows, summarize};
pub use types::{
    CandidateRun, CapitalPoint, CostPoint, FinancialProfile, InfeasibleScenario, Phase,
    SimulationResult,
};
