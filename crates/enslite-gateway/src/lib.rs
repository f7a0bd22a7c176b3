// # ENS Resolver Gateway
//
// Local HTTP and WebSocket surface over the resolution service.
//
// ## Endpoints
//
// - `GET /resolver/address/<name>`: address hash, hex encoded
// - `GET /resolver/dns/<name>?lookup=<bool>`: primary IPv4 or record dump
// - `GET /resolver/status`: latest sync snapshot
// - `POST /resolver/*`: stop the chain client and shut the server down
// - `GET <ws_path>`: WebSocket stream of sync-progress events
//
// ## Security
//
// The stop endpoint is unauthenticated. `GatewayConfig::validate` refuses
// any listen address that is not loopback; keep it that way unless the
// endpoint gains an authorization check.

pub mod routes;
pub mod server;
pub mod shutdown;
pub mod ws;

pub use routes::{AppState, status_for};
pub use server::{Gateway, build_router};
pub use shutdown::Shutdown;
