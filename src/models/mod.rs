pub mod config;
pub mod station;
pub mod work;

pub use config::GeneratorConfig;
pub use station::{Station, StationTable};
pub use work::{partition_workload, WorkItem, WorkloadAssignment};
