//! Fleetguard: trip compliance and enforcement engine
//!
//! Fleetguard is the core of a fleet safety compliance system: drivers
//! complete a multi-step inspection, supervisors approve or reject, and
//! automated rules watch live telemetry and escalate violations. The
//! crate follows a "pure core, imperative shell" layout: classification,
//! scoring, and gating are pure functions; side effects flow through the
//! [`store::ComplianceStore`] and [`regulatory::RegulatoryApi`] seams.
//!
//! # Core Concepts
//!
//! - **Trip lifecycle**: a fixed state machine from `Draft` to
//!   `FullyCompleted`, enforced before any side effects
//! - **Scoring**: a weighted aggregate percentage with banded risk levels
//! - **Critical failures**: item failures that block approval unless a
//!   reviewer records an override
//! - **Detection**: telemetry classified into violations and alerts,
//!   deduplicated per time bucket
//! - **Enforcement sweep**: batch rule evaluation producing actions
//!
//! # Example
//!
//! ```rust
//! use chrono::{NaiveDate, Utc};
//! use fleetguard::auth::{Actor, Role};
//! use fleetguard::engine::Engine;
//! use fleetguard::regulatory::{RegulatoryApi, RegulatoryError, RegulatoryPayload};
//! use fleetguard::store::MemoryStore;
//! use uuid::Uuid;
//!
//! struct NullRegulator;
//!
//! impl RegulatoryApi for NullRegulator {
//!     fn submit(&self, _payload: &RegulatoryPayload) -> Result<String, RegulatoryError> {
//!         Ok("REF-0001".to_string())
//!     }
//! }
//!
//! let mut engine = Engine::new(MemoryStore::new(), NullRegulator);
//! let driver = Actor {
//!     id: Uuid::new_v4(),
//!     org_id: Uuid::new_v4(),
//!     role: Role::Driver,
//! };
//! let date = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
//! let trip = engine
//!     .create_trip(&driver, date, "depot-north".to_string(), Utc::now())
//!     .unwrap();
//! assert_eq!(trip.status, fleetguard::model::TripStatus::Draft);
//! ```

pub mod auth;
pub mod critical;
pub mod detection;
pub mod engine;
pub mod lifecycle;
pub mod model;
pub mod ratelimit;
pub mod regulatory;
pub mod scoring;
pub mod store;

// Re-export commonly used types
pub use engine::{Engine, EngineError, IngestOutcome, SweepReport};
pub use model::{RiskLevel, Trip, TripStatus};
