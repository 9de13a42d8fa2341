//! Adaptive GC pacer tuning for containerized runtimes
//!
//! This crate provides the core functionality for:
//! - Telemetry sampling from a managed runtime's GC
//! - Container resource discovery from cgroups
//! - A multi-signal control law over pause latency, collection
//!   frequency and memory pressure
//! - Anti-oscillation and confidence gating of ratio changes
//! - Subscription hooks for samples and applied decisions

pub mod collector;
pub mod config;
pub mod container;
pub mod engine;
pub mod history;
pub mod models;
pub mod runtime;
pub mod tuner;

pub use config::TunerConfig;
pub use container::ResourceProber;
pub use models::{ContainerResources, ContainerUsage, Decision, Sample, TunerStats};
pub use runtime::{GcRuntime, RuntimeSnapshot};
pub use tuner::Tuner;
