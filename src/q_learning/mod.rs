//! Tabular Q-learning over the discretized game state
//!
//! ## Algorithm
//!
//! Q-learning is off-policy TD control. After every transition
//! `(s, a, r, s')` the estimate for `(s, a)` moves toward
//! `r + γ max_a' Q(s', a')` by a fraction α. States are the lattice keys
//! produced by [`crate::discretizer::Discretizer`], so the table stays small
//! enough to hold in a single hashmap.
//!
//! ## Usage Example
//!
//! ```no_run
//! use flappy::{
//!     app::Hyperparameters,
//!     ports::FlappyAgent,
//!     q_learning::QLearningAgent,
//!     types::{Action, RawObservation},
//! };
//!
//! let mut agent = QLearningAgent::new(Hyperparameters::new(0.1, 1.0, 0.1)?).with_seed(42);
//!
//! let s1 = RawObservation::new(256.0, 200.0, 120.0, -3);
//! let action = agent.training_policy(&s1);
//! let s2 = RawObservation::new(250.0, 200.0, 116.0, -2);
//! agent.observe(&s1, action, 0.0, &s2, false);
//! # Ok::<(), flappy::Error>(())
//! ```

pub mod agent;
pub mod q_table;
pub mod serialization;
pub mod snapshot;

// Public re-exports
pub use agent::QLearningAgent;
pub use q_table::{ActionValues, QTable};
pub use serialization::{QValueRow, read_table, write_table};
pub use snapshot::{SavedQAgent, TrainingMetadata};
