//! HTTP middleware stack for the mall server.
//!
//! # Middleware Order (bottom to top in Router)
//!
//! 1. Sentry layers (hub per request, transaction per request)
//! 2. `TraceLayer` (request tracing)
//! 3. Request ID (add unique ID to each request)
//! 4. CORS (any origin, the app is served from a dev server)

pub mod auth;
pub mod request_id;

pub use auth::BearerToken;
pub use request_id::request_id_middleware;
