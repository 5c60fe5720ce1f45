//! Laceup API library.
//!
//! This crate provides the backend as a library, allowing the service layer
//! to be exercised in tests without a running server.
//!
//! # Architecture
//!
//! - Axum JSON API under `/api/v1`
//! - Aggregates (`Shoe`, `Cart`, `Order`, `User`) persisted as whole
//!   documents behind the [`store::Store`] trait, with optimistic version
//!   checks on every write
//! - The inventory ledger ([`services::stock`]) is the only code that
//!   mutates per-size stock quantities
//! - Payment-provider integration behind [`services::payment::PaymentGateway`]

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
pub mod store;
