//! Clients for the remote collaborators
//!
//! - Directory: podcast search (iTunes-compatible search API)
//! - Feed: RSS episode listing for a single show

pub mod directory;
pub mod feed;

pub use directory::{DirectoryClient, DirectoryError};
pub use feed::{FeedError, FeedReader};
