mod common;

use common::*;
use glaze_database::{
    ChangeSet, Condition, DocumentStorage, EngineError, Error, ListViewModel, OperationContext,
    RelationalEngine, RelationalStorage, Request, Result, StorageConfig, Subscription,
};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{mpsc, Arc};

fn relational() -> RelationalStorage {
    RelationalStorage::relational(StorageConfig::in_memory(), model()).unwrap()
}


fn by_name() -> Request<Person> {
    Request::new().sorted("name", true)
}

#[test]
fn test_empty_result_emits_empty_initial() {
    let storage = relational();
    let mut changes = storage.observable(by_name()).unwrap().changes();
    match changes.try_next() {
        Some(ChangeSet::Initial(list)) => assert!(list.is_empty()),
        other => panic!("expected Initial([]), got {:?}", other),
    }
}

#[test]
fn test_insert_into_empty_sorted_query() {
    let storage = relational();
    let mut changes = storage.observable(by_name()).unwrap().changes();
    assert!(next(&mut changes).is_initial());

    storage
        .operation(|ctx| {
            ctx.create::<Person, _>(person("Alice", None))?;
            ctx.save()
        })
        .unwrap();

    match next(&mut changes) {
        ChangeSet::Update {
            deletions,
            insertions,
            modifications,
        } => {
            assert!(deletions.is_empty());
            assert_eq!(insertions, vec![(0, Person::new("Alice", None))]);
            assert!(modifications.is_empty());
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_removing_only_match() {
    let storage = relational();
    storage
        .operation(|ctx| {
            ctx.create::<Person, _>(person("Alice", Some(30)))?;
            ctx.save()
        })
        .unwrap();

    let mut changes = storage.observable(by_name()).unwrap().changes();
    match next(&mut changes) {
        ChangeSet::Initial(list) => assert_eq!(list, vec![Person::new("Alice", Some(30))]),
        other => panic!("unexpected {:?}", other),
    }

    storage
        .operation(|ctx| {
            let all = ctx.fetch(&by_name())?;
            ctx.remove_all(&all)?;
            ctx.save()
        })
        .unwrap();

    match next(&mut changes) {
        ChangeSet::Update {
            deletions,
            insertions,
            modifications,
        } => {
            assert_eq!(deletions, vec![0]);
            assert!(insertions.is_empty());
            assert!(modifications.is_empty());
        }
        other => panic!("unexpected {:?}", other),
    }
}

type Ctx<'s> = OperationContext<'s, RelationalEngine>;
type Step = fn(&mut Ctx<'_>) -> Result<()>;

fn named(name: &str) -> Request<Person> {
    Request::new().filtered("name", Condition::eq(name))
}

fn adults_arrive(ctx: &mut Ctx<'_>) -> Result<()> {
    ctx.create::<Person, _>(person("Ann", Some(40)))?;
    ctx.create::<Person, _>(person("Ben", Some(12)))?;
    ctx.create::<Person, _>(person("Cy", Some(25)))?;
    Ok(())
}

// Ben enters the filter above Cy.
fn ben_comes_of_age(ctx: &mut Ctx<'_>) -> Result<()> {
    let mut ben = ctx.fetch(&named("Ben"))?.remove(0);
    ben.set("age", 30)?;
    ctx.insert(&ben)
}

fn ann_leaves(ctx: &mut Ctx<'_>) -> Result<()> {
    let ann = ctx.fetch(&named("Ann"))?;
    ctx.remove_all(&ann)?;
    ctx.create::<Person, _>(person("Dee", Some(50)))?;
    Ok(())
}

fn cy_ages(ctx: &mut Ctx<'_>) -> Result<()> {
    let mut cy = ctx.fetch(&named("Cy"))?.remove(0);
    cy.set("age", 26)?;
    ctx.insert(&cy)
}

#[test]
fn test_updates_reproduce_each_result() {
    let storage = relational();
    let request = Request::<Person>::new()
        .filtered("age", Condition::ge(18))
        .sorted("age", false);
    let mut changes = storage.observable(request.clone()).unwrap().changes();
    let mut list = Vec::new();
    next(&mut changes).apply(&mut list);

    let steps: [Step; 4] = [adults_arrive, ben_comes_of_age, ann_leaves, cy_ages];

    for step in steps {
        storage
            .operation(|ctx| {
                step(ctx)?;
                ctx.save()
            })
            .unwrap();
        let update = next(&mut changes);
        assert!(!update.is_initial() && !update.is_error());
        update.apply(&mut list);
        assert_eq!(list, storage.fetch(&request).unwrap());
    }

    let names: Vec<_> = list.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["Dee", "Ben", "Cy"]);
}

#[test]
fn test_unrelated_commits_are_silent() {
    let storage = relational();
    let mut changes = storage
        .observable(Request::<Person>::new().filtered("age", Condition::gt(60)))
        .unwrap()
        .changes();
    assert!(next(&mut changes).is_initial());

    storage
        .operation(|ctx| {
            ctx.create::<Note, _>(|r| r.set("title", "groceries"))?;
            ctx.create::<Person, _>(person("Young", Some(20)))?;
            ctx.save()
        })
        .unwrap();
    assert_quiet(&mut changes);
}

#[test]
fn test_updates_arrive_in_commit_order() {
    let storage = relational();
    let mut changes = storage.observable(Request::<Person>::new()).unwrap().changes();
    assert!(next(&mut changes).is_initial());

    for i in 0..20 {
        storage
            .operation(|ctx| {
                ctx.create::<Person, _>(person(&format!("p{:02}", i), Some(i)))?;
                ctx.save()
            })
            .unwrap();
    }
    for i in 0..20 {
        match next(&mut changes) {
            ChangeSet::Update { insertions, .. } => {
                assert_eq!(insertions.len(), 1);
                assert_eq!(insertions[0].0, i as usize);
                assert_eq!(insertions[0].1.age, Some(i));
            }
            other => panic!("unexpected {:?}", other),
        }
    }
}

#[test]
fn test_each_subscription_gets_its_own_initial() {
    let storage = relational();
    let people = storage.observable(by_name()).unwrap();
    let mut first = people.changes();
    assert!(next(&mut first).is_initial());

    storage
        .operation(|ctx| {
            ctx.create::<Person, _>(person("Alice", None))?;
            ctx.save()
        })
        .unwrap();
    assert!(!next(&mut first).is_initial());

    let mut second = people.changes();
    match next(&mut second) {
        ChangeSet::Initial(list) => assert_eq!(list, vec![Person::new("Alice", None)]),
        other => panic!("unexpected {:?}", other),
    }
    assert_quiet(&mut second);
}

#[test]
fn test_dispose_inside_handler() {
    let storage = relational();
    let slot: Arc<Mutex<Option<Subscription>>> = Arc::new(Mutex::new(None));
    let (tx, rx) = mpsc::channel();

    let handler_slot = Arc::clone(&slot);
    let subscription = storage.observable(by_name()).unwrap().subscribe(move |changes| {
        let is_update = !changes.is_initial();
        tx.send(changes).unwrap();
        if is_update {
            if let Some(subscription) = handler_slot.lock().take() {
                subscription.dispose();
            }
        }
    });
    *slot.lock() = Some(subscription);
    assert!(rx.recv_timeout(WAIT).unwrap().is_initial());

    for name in ["Alice", "Bob", "Cat"] {
        storage
            .operation(|ctx| {
                ctx.create::<Person, _>(person(name, None))?;
                ctx.save()
            })
            .unwrap();
    }
    assert!(!rx.recv_timeout(WAIT).unwrap().is_initial());
    assert!(rx.recv_timeout(QUIET).is_err());
    assert!(eventually(|| storage.observer_count() == 0));
}

#[test]
fn test_dispose_from_another_thread() {
    let storage = relational();
    let delivered = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&delivered);
    let subscription = storage
        .observable(by_name())
        .unwrap()
        .subscribe(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });
    assert_eq!(delivered.load(Ordering::SeqCst), 1);

    std::thread::spawn(move || subscription.dispose()).join().unwrap();
    assert_eq!(storage.observer_count(), 0);

    storage
        .operation(|ctx| {
            ctx.create::<Person, _>(person("Alice", None))?;
            ctx.save()
        })
        .unwrap();
    std::thread::sleep(QUIET);
    assert_eq!(delivered.load(Ordering::SeqCst), 1);
}

#[test]
fn test_weak_owner_dropped() {
    struct Screen {
        rows: Mutex<Vec<Person>>,
    }

    let storage = relational();
    let screen = Arc::new(Screen {
        rows: Mutex::new(Vec::new()),
    });
    let _subscription = storage
        .observable(by_name())
        .unwrap()
        .subscribe_weak(&screen, |screen: &Screen, changes| changes.apply(&mut screen.rows.lock()));
    assert_eq!(storage.observer_count(), 1);

    drop(screen);
    storage
        .operation(|ctx| {
            ctx.create::<Person, _>(person("Alice", None))?;
            ctx.save()
        })
        .unwrap();
    assert!(eventually(|| storage.observer_count() == 0));
}

#[test]
fn test_list_view_model() {
    let storage = relational();
    let vm = ListViewModel::<Person>::new();
    ListViewModel::observe(&vm, &storage.observable(by_name()).unwrap());
    assert_eq!(vm.row_count(), 0);
    assert_eq!(vm.revision(), 1);

    storage
        .operation(|ctx| {
            ctx.create::<Person, _>(person("Bob", Some(41)))?;
            ctx.create::<Person, _>(person("Alice", Some(33)))?;
            ctx.save()
        })
        .unwrap();
    assert!(eventually(|| vm.revision() == 2));
    assert_eq!(vm.row_count(), 2);
    assert_eq!(vm.row(0), Some(Person::new("Alice", Some(33))));
    assert_eq!(vm.entities(), storage.fetch(&by_name()).unwrap());
    assert!(vm.last_error().is_none());

    drop(vm);
    assert!(eventually(|| storage.observer_count() == 0));
}

#[test]
fn test_remove_store_terminates_observers() {
    let storage = DocumentStorage::document(StorageConfig::in_memory(), model()).unwrap();
    let mut changes = storage.observable(by_name()).unwrap().changes();
    assert!(next(&mut changes).is_initial());
    let vm = ListViewModel::<Person>::new();
    ListViewModel::observe(&vm, &storage.observable(by_name()).unwrap());

    storage.remove_store().unwrap();

    match next(&mut changes) {
        ChangeSet::Error(error) => assert!(matches!(*error, Error::Engine(EngineError::Closed))),
        other => panic!("unexpected {:?}", other),
    }
    assert!(changes.next().is_none());
    assert!(eventually(|| vm.last_error().is_some()));
    assert_eq!(storage.observer_count(), 0);
}

#[test]
fn test_observable_of_removed_store_fails() {
    let storage = relational();
    let people = storage.observable(by_name()).unwrap();
    storage.remove_store().unwrap();
    assert!(storage.observable(by_name()).is_err());

    // A cold observable created earlier reports the closure on subscribe.
    let mut changes = people.changes();
    assert!(next(&mut changes).is_error());
    assert!(changes.next().is_none());
}

#[test]
fn test_unknown_entity_and_field() {
    #[derive(Clone, Debug)]
    struct Ghost;

    impl glaze_database::Entity for Ghost {
        const NAME: &'static str = "Ghost";

        fn from_record(_: &glaze_database::Record) -> Result<Self> {
            Ok(Ghost)
        }
    }

    let storage = relational();
    assert!(matches!(
        storage.observable(Request::<Ghost>::new()).unwrap_err(),
        Error::Schema { .. }
    ));
    assert!(matches!(
        storage
            .observable(Request::<Person>::new().sorted("height", true))
            .unwrap_err(),
        Error::InvalidField { .. }
    ));
}
