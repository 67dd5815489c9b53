// [apps/gateway/src/services/mod.rs]
/*!
 * APARATO: BACKGROUND DAEMON INDEX (ESTRATO L3)
 * One module per periodic daemon the kernel spawns at ignition. Every
 * `spawn_*` function owns its own `tokio::time::interval` and its own
 * `tokio::spawn`'d infinite loop; the kernel never touches the ticker.
 */

pub mod backup_scheduler;
pub mod gate_pass_sweeper;
pub mod media_sync;
pub mod reconnect_monitor;
pub mod trash_purger;

pub use backup_scheduler::spawn_backup_scheduler;
pub use gate_pass_sweeper::spawn_gate_pass_sweeper;
pub use media_sync::spawn_media_sync_workers;
pub use reconnect_monitor::spawn_reconnect_monitor;
pub use trash_purger::spawn_trash_purger;
