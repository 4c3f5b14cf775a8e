use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Barrier};
use wirecell::{
    service_def, Container, DiError, Disposable, DisposeError, Registration, ServiceDef,
};

// --- Cycle detection ---

#[derive(Debug)]
struct CycleA {
    _b: Arc<CycleB>,
}

#[derive(Debug)]
struct CycleB {
    _a: Arc<CycleA>,
}

#[test]
fn two_node_cycle_reports_the_full_chain() {
    struct Unrelated;

    let container = Container::new();
    container.transient_with(|r| Ok(CycleA { _b: r.resolve()? }));
    container.transient_with(|r| Ok(CycleB { _a: r.resolve()? }));
    container.transient(|| Unrelated);

    let err = container.resolve::<CycleA>().unwrap_err();
    let DiError::CircularDependency { chain } = err else {
        panic!("expected CircularDependency, got {err:?}");
    };
    assert!(chain.contains::<CycleA>());
    assert!(chain.contains::<CycleB>());
    // the repeated contract closes the chain
    assert_eq!(chain.keys().first(), chain.keys().last());
    assert!(chain.keys().len() >= 3);

    // the resolution stack unwound: unrelated contracts still resolve
    assert!(container.resolve::<Unrelated>().is_ok());
    // and the cycle still reports instead of overflowing on retry
    assert!(matches!(
        container.resolve::<CycleA>(),
        Err(DiError::CircularDependency { .. })
    ));
}

#[test]
fn cycle_through_a_scope_is_detected() {
    #[derive(Debug)]
    struct ScopedA {
        _b: Arc<ScopedB>,
    }
    #[derive(Debug)]
    struct ScopedB {
        _a: Arc<ScopedA>,
    }

    let container = Container::new();
    container.scoped_with(|r| Ok(ScopedA { _b: r.resolve()? }));
    container.scoped_with(|r| Ok(ScopedB { _a: r.resolve()? }));

    let scope = container.create_scope();
    let err = scope.resolve::<ScopedA>().unwrap_err();
    assert!(matches!(err, DiError::CircularDependency { .. }));

    // the failed construction left the scope usable
    container.scoped(|| 7u32);
    assert_eq!(*scope.resolve::<u32>().unwrap(), 7);
}

// --- Concurrency ---

#[test]
fn concurrent_singleton_resolutions_converge_on_one_instance() {
    static CONSTRUCTIONS: AtomicU32 = AtomicU32::new(0);

    struct Shared;

    let container = Container::new();
    container.singleton(|| {
        CONSTRUCTIONS.fetch_add(1, Ordering::SeqCst);
        // widen the race window
        std::thread::sleep(std::time::Duration::from_millis(10));
        Shared
    });

    let threads = 16;
    let barrier = Arc::new(Barrier::new(threads));
    let handles: Vec<_> = (0..threads)
        .map(|_| {
            let container = container.clone();
            let barrier = Arc::clone(&barrier);
            std::thread::spawn(move || {
                barrier.wait();
                container.resolve::<Shared>().unwrap()
            })
        })
        .collect();

    let instances: Vec<Arc<Shared>> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    assert_eq!(CONSTRUCTIONS.load(Ordering::SeqCst), 1);
    for instance in &instances[1..] {
        assert!(Arc::ptr_eq(&instances[0], instance));
    }
}

#[test]
fn a_slow_singleton_does_not_block_other_contracts() {
    struct Slow;
    struct Fast;

    let container = Container::new();
    container.singleton(|| {
        std::thread::sleep(std::time::Duration::from_millis(200));
        Slow
    });
    container.singleton(|| Fast);

    let slow_container = container.clone();
    let slow = std::thread::spawn(move || slow_container.resolve::<Slow>().unwrap());

    // give the slow construction a head start, then resolve something else
    std::thread::sleep(std::time::Duration::from_millis(20));
    let started = std::time::Instant::now();
    let _fast = container.resolve::<Fast>().unwrap();
    assert!(started.elapsed() < std::time::Duration::from_millis(100));

    let _slow = slow.join().unwrap();
}

#[test]
fn concurrent_scoped_resolutions_converge_within_a_scope() {
    static CONSTRUCTIONS: AtomicU32 = AtomicU32::new(0);

    struct PerScope;

    let container = Container::new();
    container.scoped(|| {
        CONSTRUCTIONS.fetch_add(1, Ordering::SeqCst);
        PerScope
    });

    let scope = Arc::new(container.create_scope());
    let threads = 8;
    let barrier = Arc::new(Barrier::new(threads));
    let handles: Vec<_> = (0..threads)
        .map(|_| {
            let scope = Arc::clone(&scope);
            let barrier = Arc::clone(&barrier);
            std::thread::spawn(move || {
                barrier.wait();
                scope.resolve::<PerScope>().unwrap()
            })
        })
        .collect();

    let instances: Vec<Arc<PerScope>> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    assert_eq!(CONSTRUCTIONS.load(Ordering::SeqCst), 1);
    for instance in &instances[1..] {
        assert!(Arc::ptr_eq(&instances[0], instance));
    }
}

// --- Scope disposal ---

struct Connection {
    closed: &'static AtomicU32,
}

impl Disposable for Connection {
    fn dispose(&self) -> Result<(), DisposeError> {
        self.closed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[test]
fn double_dispose_never_reruns_cleanup() {
    static CLOSED: AtomicU32 = AtomicU32::new(0);

    let container = Container::new();
    container.register(
        Registration::of::<Connection>()
            .scoped()
            .factory(|| Connection { closed: &CLOSED })
            .disposable()
            .build()
            .unwrap(),
    );

    let scope = container.create_scope();
    let _conn = scope.resolve::<Connection>().unwrap();

    scope.dispose();
    scope.dispose();
    assert_eq!(CLOSED.load(Ordering::SeqCst), 1);

    assert!(matches!(
        scope.resolve::<Connection>(),
        Err(DiError::ScopeDisposed)
    ));
}

#[test]
fn unresolved_slots_have_no_cleanup_to_run() {
    static CLOSED: AtomicU32 = AtomicU32::new(0);

    let container = Container::new();
    container.register(
        Registration::of::<Connection>()
            .scoped()
            .factory(|| Connection { closed: &CLOSED })
            .disposable()
            .build()
            .unwrap(),
    );

    // never resolved inside the scope
    let scope = container.create_scope();
    scope.dispose();
    assert_eq!(CLOSED.load(Ordering::SeqCst), 0);
}

// --- Bootstrap tables ---

#[derive(Default)]
struct AppConfig {
    verbose: bool,
}

struct PatternMatcher;

struct MoveJob;

static SERVICES: &[ServiceDef] = &[
    service_def!(singleton AppConfig, AppConfig::default),
    service_def!(scoped PatternMatcher, || PatternMatcher),
    service_def!(transient MoveJob, || MoveJob),
];

#[test]
fn install_applies_every_definition() {
    let container = Container::new();
    container.install(SERVICES);

    assert_eq!(container.len(), 3);
    assert!(container.is_registered::<AppConfig>());
    assert!(container.is_registered::<PatternMatcher>());
    assert!(container.is_registered::<MoveJob>());

    let config = container.resolve::<AppConfig>().unwrap();
    assert!(!config.verbose);

    let scope = container.create_scope();
    let m1 = scope.resolve::<PatternMatcher>().unwrap();
    let m2 = scope.resolve::<PatternMatcher>().unwrap();
    assert!(Arc::ptr_eq(&m1, &m2));
}
