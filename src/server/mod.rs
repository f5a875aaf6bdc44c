//! HTTP server layer for the tile gateway.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                         HTTP Layer                              │
//! │              GET {prefix}/cog/info?url=...                      │
//! │                                                                 │
//! │  ┌─────────────┐  ┌─────────────────┐  ┌─────────────────────┐  │
//! │  │  handlers   │  │   middleware    │  │       routes        │  │
//! │  │ (requests)  │  │ (stage pipeline)│  │  (router config)    │  │
//! │  └─────────────┘  └─────────────────┘  └─────────────────────┘  │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

pub mod handlers;
pub mod routes;

pub use handlers::{
    cog_info_handler, health_handler, landing_handler, not_found_handler, ApiError, AppState,
    ErrorResponse, HealthResponse, InfoQueryParams, InfoResponse,
};
pub use routes::{create_router, RouterConfig};
