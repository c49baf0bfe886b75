//! # Regress Kernel
//!
//! The vocabulary of build-range bisection: an ordered space of build
//! indices (commit numbers or release numbers), the outcome observed when
//! an experiment runs against one build, and the oracle through which a
//! strategy learns which builds exist and which have already been evaluated.
//!
//! This crate is **strategy-agnostic**: it does not decide which index to
//! evaluate next. It only prescribes what an index is and how availability
//! and results are observed.
//!
//! ## Architecture
//!
//! ```text
//! State                 ← One index in the ordered space (ordered by index)
//!     │
//! Outcome               ← unknown | dirty | positive | negative
//!     │
//! EvaluationRange       ← Requested bounds, resolved to boundary States
//!     │
//! StateOracle           ← Construction, availability, recorded results
//!     ├── AvailabilityLookup   (optional capability)
//!     └── ReleaseCatalog       (optional capability)
//! ```

pub mod error;
pub mod oracle;
pub mod outcome;
pub mod range;
pub mod state;
pub mod toy;

pub use error::{OracleError, RangeError};
pub use oracle::{AvailabilityLookup, ReleaseCatalog, StateOracle};
pub use outcome::{EvaluatedState, Outcome};
pub use range::{EvaluationRange, RangeUnit};
pub use state::{IndexSpace, State};
