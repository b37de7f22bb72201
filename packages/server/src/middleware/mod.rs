//! Tower/Axum middleware wrapped around the router.

pub mod cors;
pub mod recover;
