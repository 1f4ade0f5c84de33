//! streamer-bingo/crates/bingo-core/src/lib.rs
//!
//! The central domain logic and interface definitions for Streamer Bingo:
//! the seeded board generator, the page data model with its copy-on-write
//! edit operations, and the ports that storage and identity plugins implement.

pub mod access;
pub mod board;
pub mod documents;
pub mod edit;
pub mod error;
pub mod ids;
pub mod models;
pub mod rng;
pub mod session;
pub mod traits;
pub mod viewer;

// Re-exporting for easier access in other crates
pub use board::*;
pub use documents::PageRepo;
pub use error::*;
pub use models::*;
pub use session::{EditCommand, EditSession};
pub use traits::*;
pub use viewer::{build_viewer, ViewerBoard};
