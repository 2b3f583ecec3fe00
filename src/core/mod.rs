//! Core primitives for reviewdiff (no CLI dependencies beyond arg enums).

mod diff;
mod hub;
mod parser;
mod poller;
mod repo;
mod review;
mod service;

pub use diff::*;
pub use hub::*;
pub use parser::*;
pub use poller::*;
pub use repo::*;
pub use review::*;
pub use service::*;
