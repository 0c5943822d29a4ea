//! # Intake
//!
//! Contact-form submission service: an HTML form with server-side
//! validation, a JSON CRUD API over the same records, and a session-gated
//! dashboard. Submissions persist either in process memory or in a hosted
//! Postgres table reached over PostgREST.
//!
//! ## Modules
//!
//! - `config` - Environment-driven runtime configuration
//! - `error` - Application error taxonomy and its HTTP mapping
//! - `server` - Axum routes: pages, JSON API, session gate
//! - `store` - The `EntryStore` trait and its memory/supabase backends
//! - `validation` - Pure field rules shared by both handler families

pub mod config;
pub mod error;
pub mod server;
pub mod store;
pub mod validation;
