//! Domain logic for the action ledger.
//!
//! This crate has no internal dependencies and no database coupling. It
//! defines the shared types, the filter specification, the opaque cursor
//! codec, the keyset pagination engine, the CSV row schema, and the export
//! job state machine. Persistence lives in `actionledger-db`; the store
//! seam is the [`store::ActionStore`] trait.

pub mod action;
pub mod csv;
pub mod cursor;
pub mod error;
pub mod export;
pub mod filter;
pub mod pagination;
pub mod store;
pub mod types;
