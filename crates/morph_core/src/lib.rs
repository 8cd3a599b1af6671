//! Morph Core
//!
//! Foundational primitives shared by the morph crates:
//!
//! - **Observables**: latest-value cells with change-filtered subscription
//! - **Mutator Mutex**: a per-target exclusive task slot where a newer
//!   mutation cancels and replaces the running one
//! - **Units**: density-independent pixels and colors
//!
//! # Example
//!
//! ```rust
//! use morph_core::reactive::Observable;
//!
//! let fraction = Observable::new(0.0f32);
//! let seen = std::sync::Arc::new(std::sync::Mutex::new(Vec::new()));
//! let sink = seen.clone();
//! fraction.observe(move |v| sink.lock().unwrap().push(*v));
//!
//! fraction.set(0.5);
//! fraction.set(0.5); // unchanged, observers are not notified
//! assert_eq!(*seen.lock().unwrap(), vec![0.5]);
//! ```

pub mod color;
pub mod error;
pub mod mutator;
pub mod reactive;
pub mod sync;
pub mod units;

pub use color::Color;
pub use error::MutationError;
pub use mutator::{MutatePriority, MutationScope, MutationTicket, MutatorMutex};
pub use reactive::{Observable, ObserverId, Subscription};
pub use sync::AtomicF32;
pub use units::{lerp, Density, Dp};
