//! Durable delivery of rotated log files to an ingestion endpoint.
//!
//! A rotated file is submitted to the [`orchestrator`], which delivers it
//! through the process-wide client held by the [`registry`] under the bounded
//! [`retry`] policy, and moves it to a sibling `backout/` directory
//! ([`backout`]) when delivery ultimately fails.

pub mod config;
pub mod logging;

pub mod backout;
pub mod client;
pub mod destination;
pub mod hook;
pub mod orchestrator;
pub mod registry;
pub mod retry;

pub use backout::{BackoutRelocator, RelocationError};
pub use client::{Connector, DeliveryOutcome, IngestionClient, Ingestor, InitError};
pub use destination::{IngestionDestination, MappingKind};
pub use hook::{RolloverAction, RotationHook};
pub use orchestrator::{IngestionOrchestrator, RelocationCause, TaskReport, TaskState};
pub use registry::ClientRegistry;
pub use retry::{BackoffPolicy, DeliveryError, ErrorClass};
