// Composition root for the Tempo API.
//
// Responsibilities
// - Read config from the environment.
// - Instantiate the in-memory stores and wire them into the router.

pub mod http;
pub mod state;
