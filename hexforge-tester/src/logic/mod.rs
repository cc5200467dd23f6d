pub mod audit;
pub mod reports;
pub mod seeds;

pub use audit::{AuditRunner, ScenarioResult, audit_scenarios, find_scenario};
pub use seeds::resolve_seed_inputs;
