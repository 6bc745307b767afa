//! Narrow boundaries around the collaborators that live outside the
//! executor's own process: the warehouse query transport and the
//! result-broadcast webhook. Each is a trait the executor depends on, with
//! a `reqwest`-backed production implementation in the idiom of an
//! HTTP-client-wrapper service, and a test double living in `test_support`.
//! Account lookups and JWT verification have no call site here; the core
//! only ever consumes an already-validated `AuthClaims`.

pub mod auth;
pub mod warehouse;
pub mod webhook;

pub use auth::AuthClaims;
pub use warehouse::{query_single_row, HttpWarehouse, Warehouse, WarehouseRow};
pub use webhook::{AlertPayload, AlertWebhook, HttpAlertWebhook, NoopAlertWebhook};
