//! Ledger services.
//!
//! Services hold the business rules and are kept apart from HTTP handlers.
//! Each operation takes the caller's unit of work, reads through it, checks
//! the relevant rules, and writes the result back through it. Committing is
//! the caller's job.

pub mod account_service;
pub mod customer_service;
pub mod transfer_service;
