//! Storage - Main entry point for Glaze persistence.
//!
//! A `Storage` owns one store, its notification thread, and the registry of
//! observers attached to it. Clones share all three.

use crate::config::{ModelSource, StorageConfig};
use crate::context::OperationContext;
use crate::dispatch::{self, Notification, Registry};
use crate::observable::{ObservableQuery, Source};
use glaze_core::schema::Model;
use glaze_core::{map_records, Entity, EngineError, Error, Result};
use glaze_query::Request;
use glaze_reactive::QueryRegistry;
use glaze_storage::{DocumentEngine, Engine, EngineKind, RelationalEngine, SnapshotRead, Store};
use parking_lot::Mutex;
use std::fmt;
use std::sync::mpsc::{self, Sender};
use std::sync::Arc;

struct Shared<E: Engine> {
    store: Store<E>,
    registry: Registry,
    notifier: Mutex<Sender<Notification>>,
    model_description: String,
}

impl<E: Engine> Shared<E> {
    fn check_open(&self) -> Result<()> {
        if self.store.is_closed() {
            return Err(EngineError::Closed.into());
        }
        Ok(())
    }
}

impl<E: Engine> Source for Shared<E> {
    fn view(&self) -> Result<Arc<dyn SnapshotRead>> {
        self.check_open()?;
        Ok(self.store.view())
    }

    fn registry(&self) -> &Registry {
        &self.registry
    }
}

/// Uniform persistence over one engine.
///
/// Provides:
/// - scoped write operations (`operation`)
/// - read-only fetches of committed state (`fetch`)
/// - observable queries (`observable`)
pub struct Storage<E: Engine> {
    shared: Arc<Shared<E>>,
}

/// Storage backed by the relational engine.
pub type RelationalStorage = Storage<RelationalEngine>;

/// Storage backed by the document engine.
pub type DocumentStorage = Storage<DocumentEngine>;

impl RelationalStorage {
    pub fn relational(config: StorageConfig, model: impl Into<ModelSource>) -> Result<Self> {
        Self::open(RelationalEngine::new(), model, config)
    }
}

impl DocumentStorage {
    pub fn document(config: StorageConfig, model: impl Into<ModelSource>) -> Result<Self> {
        Self::open(DocumentEngine::new(), model, config)
    }
}

impl<E: Engine> Storage<E> {
    /// Resolves the model, opens (and if needed migrates) the store, and
    /// starts the notification thread.
    pub fn open(engine: E, model: impl Into<ModelSource>, config: StorageConfig) -> Result<Self> {
        let source = model.into();
        let model_description = source.to_string();
        let model = Arc::new(source.resolve(&config.bundle)?);
        let store = Store::open(engine, model, config.store_config())?;

        let registry: Registry = Arc::new(Mutex::new(QueryRegistry::new()));
        let (sender, receiver) = mpsc::channel();
        dispatch::spawn(
            format!("glaze-{}-notify", store.kind()),
            receiver,
            Arc::clone(&registry),
        )?;

        let hook_sender = Mutex::new(sender.clone());
        store.set_commit_hook(move |commit| {
            // The dispatcher only stops after a termination, and nothing
            // commits after that.
            let _ = hook_sender.lock().send(Notification::Commit(commit));
        });

        Ok(Self {
            shared: Arc::new(Shared {
                store,
                registry,
                notifier: Mutex::new(sender),
                model_description,
            }),
        })
    }

    /// Validates `request` and returns a cold observable for it.
    pub fn observable<T: Entity>(&self, request: Request<T>) -> Result<ObservableQuery<T>> {
        self.shared.check_open()?;
        let schema = self.shared.store.model().require(request.query().entity())?;
        request.query().validate(schema)?;
        let source: Arc<dyn Source> = self.shared.clone();
        Ok(ObservableQuery::new(source, request))
    }

    /// Runs `f` with exclusive write access.
    ///
    /// Only what `f` saves is kept; everything else it staged is discarded
    /// when it returns, whether it succeeded or not. Calling `operation`
    /// again from inside `f` fails with `InvalidOperation`.
    pub fn operation<R, F>(&self, f: F) -> Result<R>
    where
        F: FnOnce(&mut OperationContext<'_, E>) -> Result<R>,
    {
        let mut ctx = OperationContext::new(self.shared.store.begin()?);
        let result = f(&mut ctx);
        ctx.finish();
        result
    }

    /// Evaluates `request` against committed state.
    pub fn fetch<T: Entity>(&self, request: &Request<T>) -> Result<Vec<T>> {
        map_records(&self.shared.store.read(request.query())?)
    }

    #[inline]
    pub fn model(&self) -> &Model {
        self.shared.store.model()
    }

    #[inline]
    pub fn engine_kind(&self) -> EngineKind {
        self.shared.store.kind()
    }

    pub fn description(&self) -> String {
        format!(
            "{} with {}",
            self.shared.store.description(),
            self.shared.model_description
        )
    }

    pub fn is_closed(&self) -> bool {
        self.shared.store.is_closed()
    }

    /// Number of subscriptions currently attached.
    pub fn observer_count(&self) -> usize {
        self.shared.registry.lock().observers().len()
    }

    /// Deletes the backing data and closes the storage.
    ///
    /// Every live subscription receives a terminal `Engine(Closed)` error.
    pub fn remove_store(&self) -> Result<()> {
        self.shared.check_open()?;
        self.shared.store.remove()?;
        let error = Arc::new(Error::from(EngineError::Closed));
        let _ = self.shared.notifier.lock().send(Notification::Terminate(error));
        Ok(())
    }
}

impl<E: Engine> Clone for Storage<E> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<E: Engine> fmt::Debug for Storage<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Storage")
            .field("store", &self.shared.store)
            .field("model", &self.shared.model_description)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glaze_core::schema::EntitySchema;
    use glaze_core::{DataType, Record};

    #[derive(Clone, Debug, PartialEq)]
    struct Tag {
        label: String,
    }

    impl Entity for Tag {
        const NAME: &'static str = "Tag";

        fn from_record(record: &Record) -> Result<Self> {
            Ok(Self {
                label: record.require_str("label")?.to_string(),
            })
        }
    }

    fn model() -> Model {
        Model::new(vec![EntitySchema::builder("Tag")
            .field("label", DataType::String)
            .build()
            .unwrap()])
        .unwrap()
    }

    #[test]
    fn test_nested_operation_rejected() {
        let storage = RelationalStorage::relational(StorageConfig::in_memory(), model()).unwrap();
        let err = storage
            .operation(|_| storage.operation(|_| Ok(())))
            .unwrap_err();
        assert!(matches!(err, Error::InvalidOperation { .. }));
        // The gate is released afterwards.
        storage.operation(|_| Ok(())).unwrap();
    }

    #[test]
    fn test_observable_validates_request() {
        let storage = DocumentStorage::document(StorageConfig::in_memory(), model()).unwrap();
        let err = storage
            .observable(Request::<Tag>::new().filtered("colour", glaze_query::Condition::IsNull))
            .unwrap_err();
        assert!(matches!(err, Error::InvalidField { .. }));
        assert_eq!(storage.observer_count(), 0);
    }

    #[test]
    fn test_description() {
        let storage = RelationalStorage::relational(StorageConfig::in_memory(), model()).unwrap();
        assert_eq!(storage.engine_kind(), EngineKind::Relational);
        assert_eq!(
            storage.description(),
            "relational store at memory (schema version 0) with model with 1 entities"
        );
    }

    #[test]
    fn test_remove_store_closes() {
        let storage = RelationalStorage::relational(StorageConfig::in_memory(), model()).unwrap();
        storage.remove_store().unwrap();
        assert!(storage.is_closed());
        let err = storage.fetch(&Request::<Tag>::new()).unwrap_err();
        assert!(matches!(err, Error::Engine(EngineError::Closed)));
        assert!(storage.remove_store().is_err());
        assert!(storage.observable(Request::<Tag>::new()).is_err());
    }
}
