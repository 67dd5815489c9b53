// [apps/gateway/src/handlers/mod.rs]
/*!
 * APARATO: HANDLER INDEX (ESTRATO L3)
 * Un módulo por agregado. Cada handler valida el permiso requerido
 * contra el `AuthContext` inyectado por `auth_guard`, traduce el payload
 * JSON a los argumentos posicionales del repositorio correspondiente, y
 * deja que `ApiError` decida el código de estado de la respuesta.
 */

pub mod admin;
pub mod customers;
pub mod entries;
pub mod gate_passes;
pub mod ledger;
pub mod media;
pub mod room_entries;
