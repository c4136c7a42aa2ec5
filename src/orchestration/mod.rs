//! Orchestration layer for document-collection publishing
//!
//! This module provides the high-level components that sequence a publish:
//! the per-artifact coordinator, its single-flight guard, and batch runs.

pub mod batch_publisher;
pub mod publish_coordinator;
pub mod single_flight;

// Re-export main types for convenience
pub use batch_publisher::{BatchPublishOptions, BatchPublishResult, BatchPublisher};
pub use publish_coordinator::{PublishCoordinator, PublishReport, SideEffectOutcome};
pub use single_flight::{InFlightPermit, SingleFlight};
