//! Outbound adapters implementing the domain's driven ports.
//!
//! - **persistence**: PostgreSQL repositories using Diesel
//! - **daraja**: mobile-money STK push gateway over reqwest
//! - **completion**: chat-completion client for the advisory endpoints
//! - **bcrypt_hasher**: password hashing on the blocking pool
//!
//! Adapters translate between domain types and wire or row formats. They
//! hold no business rules.

pub mod bcrypt_hasher;
pub mod completion;
pub mod daraja;
pub mod persistence;
