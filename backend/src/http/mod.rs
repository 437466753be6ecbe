//! JSON API over the meeting workflow.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │  HTTP Layer (axum handlers)                               │
//! │  - caller identity from X-User-Id / X-User-Role           │
//! │  - JSON bodies, error mapping                             │
//! │  - CORS, compression, tracing                             │
//! └───────────────────┬──────────────────────────────────────┘
//!                     │
//! ┌───────────────────▼──────────────────────────────────────┐
//! │  services::meetings + services::slot_validator            │
//! └───────────────────┬──────────────────────────────────────┘
//!                     │
//! ┌───────────────────▼──────────────────────────────────────┐
//! │  db::MeetingRepository                                    │
//! └──────────────────────────────────────────────────────────┘
//! ```

pub mod dto;
pub mod error;
pub mod handlers;
pub mod identity;
pub mod router;
pub mod state;

pub use error::{ApiError, AppError};
pub use identity::{Caller, USER_ID_HEADER, USER_ROLE_HEADER};
pub use router::create_router;
pub use state::AppState;
