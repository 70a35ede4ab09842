//! Browser UI: login gate, upload form, result display and download.
//!
//! One page with an "Upload" and a "Transcribe" section. Each browser gets a
//! cookie-keyed session holding its login state and at most one result.

pub mod handlers;
pub mod page;
pub mod router;
pub mod state;
pub mod submit;

pub use handlers::SESSION_COOKIE;
pub use router::create_router;
pub use state::AppState;
