mod common;

use common::*;
use glaze_database::{
    Condition, DocumentStorage, Engine, EngineError, Error, RelationalStorage, Request, Storage,
    StorageConfig, Value,
};
use tempfile::TempDir;

fn by_time() -> Request<Reading> {
    Request::new().sorted("at", true)
}

fn non_finite_scores_are_rejected<E: Engine>(storage: Storage<E>) {
    for bad in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
        let err = storage
            .operation(|ctx| {
                ctx.create::<Reading, _>(reading(bad, 1))?;
                ctx.save()
            })
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Engine(EngineError::Constraint { ref field, .. }) if field == "score"
        ));
    }

    storage
        .operation(|ctx| {
            ctx.create::<Reading, _>(reading(-2.5, 1))?;
            ctx.save()
        })
        .unwrap();
    assert_eq!(
        storage.fetch(&by_time()).unwrap(),
        vec![Reading { score: -2.5, at: 1 }]
    );
}

#[test]
fn test_relational_rejects_non_finite_scores() {
    non_finite_scores_are_rejected(
        RelationalStorage::relational(StorageConfig::in_memory(), reading_model()).unwrap(),
    );
}

#[test]
fn test_document_rejects_non_finite_scores() {
    non_finite_scores_are_rejected(
        DocumentStorage::document(StorageConfig::in_memory(), reading_model()).unwrap(),
    );
}

#[test]
fn test_rejected_update_keeps_file_readable() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("readings.json");
    {
        let storage =
            RelationalStorage::relational(StorageConfig::file(&path), reading_model()).unwrap();
        storage
            .operation(|ctx| {
                let mut first = ctx.create::<Reading, _>(reading(1.5, 10))?;
                ctx.save()?;
                first.set("score", f64::INFINITY)?;
                assert!(ctx.insert(&first).is_err());
                ctx.create::<Reading, _>(reading(3.0, 20))?;
                ctx.save()
            })
            .unwrap();
    }

    let storage = RelationalStorage::relational(StorageConfig::file(&path), reading_model()).unwrap();
    assert_eq!(
        storage.fetch(&by_time()).unwrap(),
        vec![
            Reading { score: 1.5, at: 10 },
            Reading { score: 3.0, at: 20 },
        ]
    );
}

#[test]
fn test_date_conditions_need_date_operands() {
    let storage =
        DocumentStorage::document(StorageConfig::in_memory(), reading_model()).unwrap();
    storage
        .operation(|ctx| {
            for at in [100, 200, 300] {
                ctx.create::<Reading, _>(reading(0.0, at))?;
            }
            ctx.save()
        })
        .unwrap();

    // Plain integers are not timestamps.
    for condition in [Condition::lt(250), Condition::gt(1_000_000), Condition::eq(200)] {
        let request = by_time().filtered("at", condition);
        assert!(matches!(
            storage.fetch(&request),
            Err(Error::TypeMismatch { ref field, .. }) if field == "at"
        ));
        assert!(storage.observable(request).is_err());
    }
    let request = by_time().filtered("score", Condition::eq(0));
    assert!(matches!(storage.fetch(&request), Err(Error::TypeMismatch { .. })));

    let at = |request: Request<Reading>| -> Vec<i64> {
        storage.fetch(&request).unwrap().iter().map(|r| r.at).collect()
    };
    assert_eq!(
        at(by_time().filtered("at", Condition::lt(Value::DateTime(250)))),
        vec![100, 200]
    );
    assert!(at(by_time().filtered("at", Condition::gt(Value::DateTime(1_000_000)))).is_empty());
    assert_eq!(
        at(by_time().filtered("at", Condition::eq(Value::DateTime(200)))),
        vec![200]
    );
}
