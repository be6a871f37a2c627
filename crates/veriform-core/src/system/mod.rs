//! # System Module
//!
//! Backend status and the solver smoke check, the data behind the
//! `status`, `backends` and `check` queries of an operator front end.

mod health;

pub use health::*;
