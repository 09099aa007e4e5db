//! HTTP request handlers (route handlers).
//!
//! Each handler:
//! 1. Extracts path parameters and the JSON body
//! 2. Opens a unit of work and calls exactly one service operation
//! 3. Commits on success; on any error the unit of work is dropped, which
//!    rolls every change back, and the error becomes the HTTP response

/// Account opening, lookup and closing
pub mod accounts;
/// Customer management
pub mod customers;
/// Liveness and storage connectivity
pub mod health;
/// Recipient management
pub mod recipients;
/// Deposits, withdrawals and transfers
pub mod transactions;
