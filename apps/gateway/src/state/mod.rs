// [apps/gateway/src/state/mod.rs]
/*!
 * =================================================================
 * APARATO: GATEWAY SHARED STATE (ESTRATO L3)
 * CLASIFICACIÓN: COMPOSITION ROOT
 * RESPONSABILIDAD: INYECCIÓN DE REPOSITORIOS, BACKENDS Y MODOS OPERATIVOS
 *
 * Un único `AppState` clonable (todos los campos son `Arc`/`Clone`
 * baratos) atraviesa handlers, middleware y los daemons de fondo. No
 * hay lógica de negocio aquí: solo composición de dependencias y los
 * dos interruptores de modo que gobiernan qué mutaciones acepta la
 * fachada (operación de carga/descarga) y si el proceso sirve tráfico
 * normal o está en modo de recuperación ("Setup Mode").
 * =================================================================
 */

use std::sync::{Arc, RwLock};

use coldstore_domain_models::OperationMode;
use coldstore_infra_db::repositories::{
    AuditRepository, BackupRepository, CustomerRepository, EntryRepository, GatePassRepository,
    LedgerRepository, MediaRepository, RoomEntryRepository, TrashRepository,
};
use coldstore_infra_db::DbClient;
use coldstore_infra_storage::StorageBackends;
use tracing::{info, warn};

/// Liveness gate consulted by the perimeter middleware. `SetupRequired`
/// is entered when every configured database endpoint was unreachable
/// at startup; only the restore handler is reachable in that state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SystemMode {
    Operational,
    SetupRequired(String),
}

#[derive(Clone)]
pub struct AppState {
    pub db: DbClient,
    pub customers: Arc<CustomerRepository>,
    pub entries: Arc<EntryRepository>,
    pub room_entries: Arc<RoomEntryRepository>,
    pub gate_passes: Arc<GatePassRepository>,
    pub ledger: Arc<LedgerRepository>,
    pub media: Arc<MediaRepository>,
    pub backups: Arc<BackupRepository>,
    pub trash: Arc<TrashRepository>,
    pub audit: Arc<AuditRepository>,
    pub storage: StorageBackends,
    /// Facility-wide Loading/Unloading toggle (spec §4.2/§4.1).
    pub operation_mode: Arc<RwLock<OperationMode>>,
    pub system_mode: Arc<RwLock<SystemMode>>,
    /// Where this deployment's cloud backups and media land
    /// (`mac-mini-ha`, `poc`, `production-beta`, `local`).
    pub backup_prefix_tag: String,
    /// Whether a NAS backend was configured for this deployment. When
    /// `false`, media sync only requires the cloud leg to be satisfied.
    pub nas_required: bool,
}

impl AppState {
    pub fn new(db: DbClient, storage: StorageBackends, backup_prefix_tag: String) -> Self {
        let pool = db.pool().clone();
        let nas_required = storage.nas.is_some();

        Self {
            customers: Arc::new(CustomerRepository::new(pool.clone())),
            entries: Arc::new(EntryRepository::new(pool.clone())),
            room_entries: Arc::new(RoomEntryRepository::new(pool.clone())),
            gate_passes: Arc::new(GatePassRepository::new(pool.clone())),
            ledger: Arc::new(LedgerRepository::new(pool.clone())),
            media: Arc::new(MediaRepository::new(pool.clone())),
            backups: Arc::new(BackupRepository::new(pool.clone())),
            trash: Arc::new(TrashRepository::new(pool.clone())),
            audit: Arc::new(AuditRepository::new(pool)),
            db,
            storage,
            operation_mode: Arc::new(RwLock::new(OperationMode::Loading)),
            system_mode: Arc::new(RwLock::new(SystemMode::Operational)),
            backup_prefix_tag,
            nas_required,
        }
    }

    pub fn operation_mode(&self) -> OperationMode {
        *self.operation_mode.read().expect("operation mode lock poisoned")
    }

    pub fn set_operation_mode(&self, mode: OperationMode) {
        info!(?mode, "operation mode transition");
        *self.operation_mode.write().expect("operation mode lock poisoned") = mode;
    }

    pub fn is_operational(&self) -> Result<(), String> {
        match &*self.system_mode.read().expect("system mode lock poisoned") {
            SystemMode::Operational => Ok(()),
            SystemMode::SetupRequired(reason) => {
                warn!(%reason, "request rejected: gateway in setup mode");
                Err(reason.clone())
            }
        }
    }

    pub fn set_system_mode(&self, mode: SystemMode) {
        *self.system_mode.write().expect("system mode lock poisoned") = mode;
    }
}
