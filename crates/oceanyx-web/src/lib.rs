//! oceanyx-web: HTTP surface for the Oceanyx dashboard.
//! Provides:
//!   - Artifact registration and job lifecycle endpoints
//!   - Sequence analysis, match sets and diversity metrics
//!   - Species catalog search
//!   - Live job progress over SSE

pub mod error;
pub mod handlers;
pub mod logging;
pub mod router;
pub mod sse;
pub mod state;
