// promdump-core - Sample model and query window planning
//
// Pure data types and planning logic shared by the client, writer and batch
// crates. Nothing in here performs I/O.

pub mod model;
pub mod pipeline;
pub mod planner;

pub use model::{
    InstantSample, Labels, QueryValue, SamplePair, SampleSeries, StringSample, ValueType,
};
pub use pipeline::{QuerySource, SeriesSink, WrittenFile};
pub use planner::{plan, PlanError, TimeWindow, WindowPlan};
