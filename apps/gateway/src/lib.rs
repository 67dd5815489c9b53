// [apps/gateway/src/lib.rs]
/*!
 * =================================================================
 * APARATO: GATEWAY LIBRARY ROOT (ESTRATO L3)
 * CLASIFICACIÓN: CRATE ROOT
 * RESPONSABILIDAD: DEFINICIÓN DEL ÁRBOL DE MÓDULOS DEL GATEWAY
 * =================================================================
 */

pub mod bootstrap;
pub mod errors;
pub mod handlers;
pub mod kernel;
pub mod middleware;
pub mod routes;
pub mod services;
pub mod state;

pub mod prelude {
    pub use crate::kernel::GatewayKernel;
    pub use crate::state::AppState;
}
