//! Test utilities for use-case and HTTP tests.
//!
//! This module provides:
//! - Fakes for the external-system ports (resolver, ACME client, proxy)
//! - In-memory implementations of the persistence and collaborator traits
//! - Factories and builders that wire a full domain stack over a temp dir

mod app_state_builder;
mod domain_stack;
mod external_fakes;
mod factories;
mod repo_mocks;

pub use app_state_builder::*;
pub use domain_stack::*;
pub use external_fakes::*;
pub use factories::*;
pub use repo_mocks::*;
