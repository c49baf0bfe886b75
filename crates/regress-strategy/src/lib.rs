//! # regress-strategy
//!
//! Decides which build index to evaluate next.
//!
//! This crate provides:
//! - `AvailabilityResolver` (nearest index with an artifact, inside bounds)
//! - `SequenceStrategy` (coverage pass: widest-gap bisection, bounded count)
//! - `SearchStrategy` (pinpoint pass: bisection between differing outcomes)
//! - `CompositeStrategy` (coverage until exhausted, then pinpoint)
//!
//! Strategies never run evaluations. A driver asks for the next state,
//! submits it out of band, and the recorded outcome later becomes visible
//! through the oracle.
//!
//! ## Control flow
//!
//! ```text
//! driver ──next(wait)──▶ CompositeStrategy
//!                            │ coverage pass
//!                            ▼
//!                        SequenceStrategy ──Finished──▶ SearchStrategy
//!                            │                              │
//!                            └──────── AvailabilityResolver ┘
//!                                          │
//!                                     StateOracle
//! ```

pub mod composite;
pub mod config;
pub mod considered;
pub mod error;
pub mod factory;
mod frontier;
pub mod resolver;
pub mod search;
pub mod sequence;
pub mod step;

pub use composite::CompositeStrategy;
pub use config::StrategyConfig;
pub use considered::{ConsideredStates, UnavailabilityGaps};
pub use error::StrategyError;
pub use factory::{StrategyKind, build_strategy};
pub use resolver::AvailabilityResolver;
pub use search::SearchStrategy;
pub use sequence::SequenceStrategy;
pub use step::{Step, Strategy};

#[cfg(test)]
pub(crate) mod testing;
