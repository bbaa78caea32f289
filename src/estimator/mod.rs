//! Scope & cost estimation pipeline
//!
//! The pipeline core: clarifying-question selection, precedent ranking,
//! regional pricing, sales tax, accuracy scoring, and the orchestrator that
//! composes them into a structured scope. Everything here is pure functions
//! over rows the routes fetch, so the whole pipeline is testable without a
//! database or network.

pub mod accuracy;
pub mod orchestrator;
pub mod precedent;
pub mod questions;
pub mod regional;
pub mod tax;
