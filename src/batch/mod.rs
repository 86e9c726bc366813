/// Batch orchestration over a synthesis backend
pub mod orchestrator;
/// Ordered per-item outcomes
pub mod report;
/// Grouped scheduling with progress callbacks
pub mod scheduler;
