//! Adapters implementing domain ports.
//!
//! Infrastructure implementations of the traits defined in the ports
//! module: table storage and a simulated game.

pub mod csv_repository;
pub mod in_memory_repository;
pub mod sim;

pub use csv_repository::{CsvRepository, table_file_stem};
pub use in_memory_repository::InMemoryRepository;
pub use sim::{FlappySim, SimConfig};
