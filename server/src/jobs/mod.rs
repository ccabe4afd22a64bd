pub mod queue;
pub mod scan;

pub use queue::TaskQueue;
pub use scan::{ScanOutcome, ScanPipeline};
