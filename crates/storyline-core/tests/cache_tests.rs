use std::sync::{Arc, Barrier};
use std::thread;
use storyline_core::prelude::*;
use storyline_core::TestOutcome;
use storyline_graph::{GraphCache, ModuleDecl};
use storyline_test_utils::{configurations, CountingModule, RecordingNotifier};

struct SharedKeyTag;
struct ConcurrentTag;
struct OtherTag;

fn pass(_: &mut (), _: &Narrator) -> Result<(), TestError> {
    Ok(())
}

fn counting(name: &str, modules: Vec<ModuleDecl>) -> TestClass<()> {
    TestClass::with_default(name)
        .with_modules(modules)
        .method(MethodDecl::test("a"), pass)
}

#[test]
fn test_same_module_set_configures_modules_once() {
    let cache = GraphCache::new();
    let first = counting(
        "First",
        vec![
            ModuleDecl::of::<CountingModule<SharedKeyTag>>(),
            ModuleDecl::of::<CountingModule<OtherTag>>(),
        ],
    );
    // Same set, declared in another order and with a duplicate.
    let second = counting(
        "Second",
        vec![
            ModuleDecl::of::<CountingModule<OtherTag>>(),
            ModuleDecl::of::<CountingModule<SharedKeyTag>>(),
            ModuleDecl::of::<CountingModule<OtherTag>>(),
        ],
    );

    let first = ClassRunner::new(RunnerKind::Plain, first, &cache).unwrap();
    let second = ClassRunner::new(RunnerKind::Plain, second, &cache).unwrap();

    assert!(Arc::ptr_eq(first.graph(), second.graph()));
    assert_eq!(configurations::<SharedKeyTag>(), 1);
    assert_eq!(configurations::<OtherTag>(), 1);

    let stats = cache.stats();
    assert_eq!(stats.graphs_built, 1);
    assert_eq!(stats.graph_hits, 1);
    assert_eq!(stats.hook_sets_built, 1);
    assert_eq!(cache.len(), 1);
}

#[test]
fn test_concurrent_class_runs_share_one_graph() {
    const RUNS: usize = 8;
    let cache = Arc::new(GraphCache::new());
    let barrier = Arc::new(Barrier::new(RUNS));

    let handles: Vec<_> = (0..RUNS)
        .map(|i| {
            let cache = Arc::clone(&cache);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                let class = counting(
                    &format!("Concurrent{i}"),
                    vec![ModuleDecl::of::<CountingModule<ConcurrentTag>>()],
                );
                barrier.wait();
                let mut runner = ClassRunner::new(RunnerKind::Plain, class, &cache).unwrap();
                let outcomes = runner.run(&mut RecordingNotifier::new());
                (Arc::clone(runner.graph()), outcomes)
            })
        })
        .collect();

    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    for (graph, outcomes) in &results {
        assert!(Arc::ptr_eq(graph, &results[0].0));
        assert_eq!(outcomes, &vec![TestOutcome::Passed]);
    }
    assert_eq!(configurations::<ConcurrentTag>(), 1);
    assert_eq!(cache.stats().graphs_built, 1);
}

#[derive(Debug, Default)]
struct Audit;

impl TestHook for Audit {}

/// Binds the hook without registering it
#[derive(Default)]
struct AuditBindings;

impl Module for AuditBindings {
    fn configure(&self, binder: &mut Binder) -> Result<(), ConfigError> {
        binder.bind_default::<Audit>(Scope::Shared);
        Ok(())
    }
}

/// Registers the hook bound elsewhere
#[derive(Default)]
struct AuditRegistration;

impl Module for AuditRegistration {
    fn configure(&self, binder: &mut Binder) -> Result<(), ConfigError> {
        binder.register_hook::<Audit>();
        Ok(())
    }
}

#[test]
fn test_hook_registered_by_one_module_bound_by_another() {
    let cache = GraphCache::new();
    let class = TestClass::<()>::with_default("Audited")
        .with_module::<AuditRegistration>()
        .with_module::<AuditBindings>()
        .method(MethodDecl::test("a"), pass);

    let runner = ClassRunner::new(RunnerKind::Plain, class, &cache).unwrap();
    assert_eq!(runner.hooks().len(), 1);
    assert_eq!(
        cache.hooks_for(runner.graph()).registration().type_names(),
        vec![std::any::type_name::<Audit>()]
    );
}

#[test]
fn test_registered_but_unbound_hook_fails_class_creation() {
    let class = TestClass::<()>::with_default("Unbound")
        .with_module::<AuditRegistration>()
        .method(MethodDecl::test("a"), pass);

    let err = ClassRunner::new(RunnerKind::Plain, class, &GraphCache::new()).unwrap_err();
    assert!(matches!(
        err,
        storyline_core::InitializationError::Config(ConfigError::Resolve(_))
    ));
}
