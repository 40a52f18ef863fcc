// Role-gated access: request classification, session lookup, and the axum
// middleware that turns gate decisions into redirects.

pub mod gate;
pub mod handlers;
pub mod middleware;
pub mod session;
