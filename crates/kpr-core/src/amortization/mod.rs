pub mod schedule;
pub mod segment;

#[cfg(feature = "simulation")]
pub mod simulation;

pub use schedule::{build_schedule, compute_schedule, ScheduleInput, ScheduleOutput, ScheduleRow};
pub use segment::{validate_segments, LoanSegment};
