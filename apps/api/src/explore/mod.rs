// Explore: directory search & pagination.
// State machine (state), its building blocks (filters, mode, pagination,
// merger, rate_limit, facets), the async driver (controller), the session
// registry and the HTTP handlers.

pub mod controller;
pub mod facets;
pub mod filters;
pub mod handlers;
pub mod merger;
pub mod mode;
pub mod pagination;
pub mod rate_limit;
pub mod session;
pub mod state;

#[cfg(test)]
pub mod testing;
