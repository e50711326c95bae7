pub mod dashboard;

pub use dashboard::{TaskBuckets, build_dashboard, partition_tasks};
