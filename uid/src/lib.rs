//! Identifier catalog for the TCG Opal SSC.
//!
//! This crate defines the fixed 8-byte UIDs the host addresses:
//! - [`Object`] for SPs, authorities, tables and rows
//! - [`Method`] for invocable methods
//! - [`Uid`] constructors for indexed objects (`Admin<n>`, `User<n>`, ranges)
//! - column, cell-block and parameter numbers used inside method arguments
//!
//! # Design Principles
//!
//! - **Closed catalog** - Every named identifier is an enum variant; there is no
//!   runtime lookup that can miss.
//! - **Pure data** - No I/O and no state.

mod catalog;
mod columns;
mod uid;

pub use catalog::{Method, Object};
pub use columns::{cell, column, param, LifeCycleState};
pub use uid::Uid;
