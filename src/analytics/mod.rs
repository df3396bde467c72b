//! Analytics over parsed simulation logs

pub mod lifetime;
pub mod metrics;
pub mod logger;
pub mod params;

pub use lifetime::{collect_lifetimes, label_from_name, LifetimeRecord, RunLabel};
pub use logger::{print_summary, ResultsLogger, TableSummary};
pub use metrics::{
    aggregate_directory, estimate_collapse_time, summarise_replicate, AggregateRecord,
    ReplicateSummary,
};
pub use params::{default_parameter_space, sample_uniform, UniformParam};
