//! Actix middleware shared by every portal route.

pub mod trace;

pub use trace::Trace;
