//! Domain model definitions.

pub mod audit;
pub mod refresh;
pub mod role;
pub mod security;
pub mod token;
pub mod user;
