//! # services
//!
//! The moderation and rate-limiting engine: identity derivation, role
//! lookup, command dispatch, topic updates, and bounded retention. Depends
//! only on `domains` ports; adapters are injected by the binary.

pub mod board;
pub mod commands;
pub mod filter;
pub mod identity;
pub mod retention;
pub mod roles;

pub use board::{
    BoardService, BoardSettings, CommandOutcome, Dispatched, Requester, SubmitPost, Submitted,
    TopicUpdated, MIN_POST_INTERVAL_MS,
};
pub use commands::Command;
pub use filter::WordListFilter;
pub use roles::RoleResolver;
