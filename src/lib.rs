//! Bank ledger service.
//!
//! Customers own checking and savings accounts and a list of recipients.
//! The service moves money between accounts (deposit, withdraw, transfer)
//! under per-kind balance rules, and every operation is all-or-nothing:
//! it runs inside one storage unit of work that is committed only when the
//! operation succeeds.
//!
//! # Layout
//!
//! - [`models`]: entities, ids and request/response bodies
//! - [`factory`]: account construction by kind
//! - [`services`]: the business rules
//! - [`store`]: the storage collaborator (in-memory and PostgreSQL)
//! - [`handlers`] and [`routes`]: the HTTP surface

pub mod config;
pub mod db;
pub mod error;
pub mod factory;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod store;
