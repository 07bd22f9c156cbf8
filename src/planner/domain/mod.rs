//! Domain model for modification planning.

mod context;
mod contract;
mod gate;
mod settings;

pub use context::{
    CandidateFile, RepositoryContext, infer_primary_extension, is_signal_file,
    language_for_extension, select_signal_files,
};
pub use contract::{ContractViolation, OracleChange, OracleResponse, ProposedEditSet};
pub use gate::{GateVerdict, MeaningfulnessGate};
pub use settings::PlannerSettings;
