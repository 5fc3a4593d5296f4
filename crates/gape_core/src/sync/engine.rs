//! Save orchestration for one canvas.
//!
//! # Responsibility
//! - Flatten the store, fetch persisted state, plan and apply the diff.
//! - Gate saves so at most one is in flight per engine.
//!
//! # Invariants
//! - The diff base is always re-read from the repository, never cached.
//! - The store is marked saved only after every planned write succeeded.
//! - A rejected or failed save never touches the store.

use crate::canvas::store::LayoutStore;
use crate::model::block::BlockId;
use crate::repo::block_repo::BlockRepository;
use crate::repo::error::RepoError;
use crate::sync::reconcile::{plan_reconciliation, SyncPlan};
use log::{error, info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

/// Counts and anomalies of one successful save.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SaveReport {
    pub inserted: usize,
    pub updated: usize,
    pub deleted: usize,
    pub unchanged: usize,
    /// Deleted ids this session never loaded or saved. Non-empty means
    /// another writer added blocks this session overwrote.
    pub foreign_deletes: Vec<BlockId>,
}

impl SaveReport {
    fn from_plan(plan: &SyncPlan, foreign_deletes: Vec<BlockId>) -> Self {
        Self {
            inserted: plan.inserts.len(),
            updated: plan.updates.len(),
            deleted: plan.deletes.len(),
            unchanged: plan.unchanged,
            foreign_deletes,
        }
    }
}

/// Save failures.
#[derive(Debug)]
pub enum SaveError {
    /// Another save of this engine is still running.
    Busy,
    /// The store has no loaded layout to save.
    NotLoaded,
    Repo(RepoError),
}

impl Display for SaveError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Busy => write!(f, "a save is already in progress"),
            Self::NotLoaded => write!(f, "layout is not loaded"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for SaveError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for SaveError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

/// Reconciles layout stores of one owner with a block repository.
pub struct SyncEngine<R: BlockRepository> {
    repo: R,
    owner_id: String,
    in_flight: AtomicBool,
}

impl<R: BlockRepository> SyncEngine<R> {
    pub fn new(repo: R, owner_id: impl Into<String>) -> Self {
        Self {
            repo,
            owner_id: owner_id.into(),
            in_flight: AtomicBool::new(false),
        }
    }

    pub fn owner_id(&self) -> &str {
        &self.owner_id
    }

    /// Whether a save is running; front ends disable their save action while true.
    pub fn is_saving(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Computes the plan a save would apply without writing anything.
    pub fn preview(&self, store: &LayoutStore) -> Result<SyncPlan, SaveError> {
        if !store.is_loaded() {
            return Err(SaveError::NotLoaded);
        }
        let persisted = self.repo.list_active_blocks(&self.owner_id)?;
        Ok(plan_reconciliation(&store.layout().placements(), &persisted))
    }

    /// Persists the store's current layout.
    ///
    /// # Errors
    /// - `Busy` while another save runs; nothing is read or written.
    /// - `NotLoaded` for an uninitialized store.
    /// - `Repo` for any persistence failure; the store stays dirty so the
    ///   save can be retried.
    pub fn save(&self, store: &mut LayoutStore) -> Result<SaveReport, SaveError> {
        if !store.is_loaded() {
            return Err(SaveError::NotLoaded);
        }
        let Some(_guard) = InFlightGuard::acquire(&self.in_flight) else {
            warn!("event=layout_save module=sync status=rejected reason=busy");
            return Err(SaveError::Busy);
        };

        let started_at = Instant::now();
        info!("event=layout_save module=sync status=start");
        match self.run_save(store) {
            Ok(report) => {
                info!(
                    "event=layout_save module=sync status=ok duration_ms={} inserted={} updated={} deleted={} unchanged={}",
                    started_at.elapsed().as_millis(),
                    report.inserted,
                    report.updated,
                    report.deleted,
                    report.unchanged
                );
                Ok(report)
            }
            Err(err) => {
                error!(
                    "event=layout_save module=sync status=error duration_ms={} error_code=save_failed error={}",
                    started_at.elapsed().as_millis(),
                    err
                );
                Err(err.into())
            }
        }
    }

    fn run_save(&self, store: &mut LayoutStore) -> Result<SaveReport, RepoError> {
        let placements = store.layout().placements();
        let snapshot = store.layout().to_snapshot();

        let persisted = self.repo.list_active_blocks(&self.owner_id)?;
        let plan = plan_reconciliation(&placements, &persisted);

        let foreign_deletes: Vec<BlockId> = plan
            .deletes
            .iter()
            .filter(|id| !store.known_ids().contains(*id))
            .cloned()
            .collect();
        if !foreign_deletes.is_empty() {
            warn!(
                "event=layout_save module=sync status=overwrite foreign_deletes={}",
                foreign_deletes.len()
            );
        }

        if !plan.is_empty() {
            self.repo.apply_plan(&self.owner_id, &plan)?;
        }
        store.mark_saved(snapshot);
        Ok(SaveReport::from_plan(&plan, foreign_deletes))
    }
}

/// Holds the in-flight flag for the lifetime of one save.
struct InFlightGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> InFlightGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self { flag })
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::{SaveError, SyncEngine};
    use crate::canvas::store::{LayoutState, LayoutStore};
    use crate::model::block::{Block, BlockData, BlockId, BlockType};
    use crate::model::layout::{BlockPlacement, LayoutSnapshot};
    use crate::model::record::PersistedBlock;
    use crate::repo::block_repo::BlockRepository;
    use crate::repo::error::{RepoError, RepoResult};
    use std::cell::RefCell;

    /// In-memory repository; `fail_on_insert` makes inserts fail.
    #[derive(Default)]
    struct MemoryRepo {
        rows: RefCell<Vec<PersistedBlock>>,
        fail_on_insert: bool,
    }

    impl MemoryRepo {
        fn active_ids(&self) -> Vec<String> {
            self.rows
                .borrow()
                .iter()
                .filter(|row| row.is_active)
                .map(|row| row.id.to_string())
                .collect()
        }
    }

    fn to_record(placement: &BlockPlacement) -> PersistedBlock {
        PersistedBlock {
            id: placement.block_id.clone(),
            block_type: placement.block_type,
            data: placement.data.clone(),
            column_index: placement.column_index as i64,
            order_index: placement.order_index as i64,
            is_active: true,
            created_at: 0,
            updated_at: 0,
        }
    }

    impl BlockRepository for MemoryRepo {
        fn list_active_blocks(&self, _owner_id: &str) -> RepoResult<Vec<PersistedBlock>> {
            Ok(self
                .rows
                .borrow()
                .iter()
                .filter(|row| row.is_active)
                .cloned()
                .collect())
        }

        fn insert_block(&self, _owner_id: &str, placement: &BlockPlacement) -> RepoResult<()> {
            if self.fail_on_insert {
                return Err(RepoError::InvalidData("insert rejected".to_string()));
            }
            let mut rows = self.rows.borrow_mut();
            rows.retain(|row| row.id != placement.block_id);
            rows.push(to_record(placement));
            Ok(())
        }

        fn update_block(&self, _owner_id: &str, placement: &BlockPlacement) -> RepoResult<()> {
            let mut rows = self.rows.borrow_mut();
            let row = rows
                .iter_mut()
                .find(|row| row.id == placement.block_id && row.is_active)
                .ok_or_else(|| RepoError::BlockNotFound(placement.block_id.clone()))?;
            *row = to_record(placement);
            Ok(())
        }

        fn delete_block(&self, _owner_id: &str, block_id: &BlockId) -> RepoResult<()> {
            for row in self.rows.borrow_mut().iter_mut() {
                if &row.id == block_id {
                    row.is_active = false;
                }
            }
            Ok(())
        }
    }

    fn store(columns: &[&[&str]]) -> LayoutStore {
        LayoutStore::from_snapshot(LayoutSnapshot {
            columns: columns
                .iter()
                .map(|ids| {
                    ids.iter()
                        .map(|id| Block::with_id(BlockId::from(*id), BlockType::EducationM, BlockData::new()))
                        .collect()
                })
                .collect(),
        })
    }

    #[test]
    fn save_persists_layout_and_marks_saved() {
        let engine = SyncEngine::new(MemoryRepo::default(), "canvas-1");
        let mut store = store(&[&["a", "b"], &["c"]]);
        store.move_block(&BlockId::from("a"), 1, None);

        let report = engine.save(&mut store).unwrap();
        assert_eq!(report.inserted, 3);
        assert_eq!(store.state(), LayoutState::Saved);
        assert_eq!(engine.repo.active_ids(), vec!["b", "c", "a"]);
        assert!(!engine.is_saving());
    }

    #[test]
    fn second_save_without_changes_writes_nothing() {
        let engine = SyncEngine::new(MemoryRepo::default(), "canvas-1");
        let mut store = store(&[&["a"], &["b"]]);
        engine.save(&mut store).unwrap();

        let report = engine.save(&mut store).unwrap();
        assert_eq!(report.inserted + report.updated + report.deleted, 0);
        assert_eq!(report.unchanged, 2);
    }

    #[test]
    fn failed_save_leaves_store_dirty() {
        let repo = MemoryRepo {
            fail_on_insert: true,
            ..MemoryRepo::default()
        };
        let engine = SyncEngine::new(repo, "canvas-1");
        let mut store = store(&[&["a"], &[]]);
        store.move_block(&BlockId::from("a"), 1, None);

        let err = engine.save(&mut store).unwrap_err();
        assert!(matches!(err, SaveError::Repo(_)));
        assert!(store.is_dirty());
        assert!(!engine.is_saving());
    }

    #[test]
    fn uninitialized_store_is_rejected() {
        let engine = SyncEngine::new(MemoryRepo::default(), "canvas-1");
        let mut store = LayoutStore::new();
        assert!(matches!(engine.save(&mut store), Err(SaveError::NotLoaded)));
    }

    #[test]
    fn in_flight_save_rejects_another() {
        let engine = SyncEngine::new(MemoryRepo::default(), "canvas-1");
        let guard = super::InFlightGuard::acquire(&engine.in_flight).unwrap();
        assert!(engine.is_saving());

        let mut store = store(&[&["a"], &[]]);
        assert!(matches!(engine.save(&mut store), Err(SaveError::Busy)));
        assert_eq!(store.state(), LayoutState::Loaded);

        drop(guard);
        assert!(engine.save(&mut store).is_ok());
    }

    #[test]
    fn deleting_unknown_persisted_block_is_reported() {
        let repo = MemoryRepo::default();
        repo.rows.borrow_mut().push(PersistedBlock {
            id: BlockId::from("other-session"),
            block_type: BlockType::ProjectM,
            data: BlockData::new(),
            column_index: 0,
            order_index: 0,
            is_active: true,
            created_at: 0,
            updated_at: 0,
        });
        let engine = SyncEngine::new(repo, "canvas-1");
        let mut store = store(&[&["a"], &[]]);

        let report = engine.save(&mut store).unwrap();
        assert_eq!(report.deleted, 1);
        assert_eq!(report.foreign_deletes, vec![BlockId::from("other-session")]);
    }
}
