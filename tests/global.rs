use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use wirecell::{global, reset_global, resolve, scoped, supplied_or, Disposable, DisposeError};

// The process-wide container is shared state; serialize the tests that
// touch it so reset_global from one never races registration in another.
static GLOBAL_TESTS: Mutex<()> = Mutex::new(());

fn serialized() -> std::sync::MutexGuard<'static, ()> {
    GLOBAL_TESTS.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[test]
fn global_returns_the_same_container() {
    let _guard = serialized();

    let a = global();
    let b = global();
    assert!(Arc::ptr_eq(&a, &b));
}

#[test]
fn reset_builds_a_fresh_empty_container() {
    let _guard = serialized();

    struct Leftover;

    global().singleton(|| Leftover);
    assert!(global().is_registered::<Leftover>());

    let before = global();
    reset_global();
    let after = global();

    assert!(!Arc::ptr_eq(&before, &after));
    assert!(after.is_empty());
    assert!(!after.is_registered::<Leftover>());
}

#[test]
fn resolve_macro_covers_concrete_named_and_trait_forms() {
    let _guard = serialized();

    trait Greeter: Send + Sync {
        fn greet(&self) -> &'static str;
    }

    struct English;
    impl Greeter for English {
        fn greet(&self) -> &'static str {
            "hello"
        }
    }

    #[derive(Debug, PartialEq)]
    struct Port(u16);

    global().singleton(|| Port(8080));
    global().register(
        wirecell::Registration::of::<Port>()
            .named("admin")
            .factory(|| Port(9090))
            .build()
            .unwrap(),
    );
    global().singleton_trait::<dyn Greeter, _>(|| Arc::new(English));

    assert_eq!(*resolve!(Port), Port(8080));
    assert_eq!(*resolve!(Port, "admin"), Port(9090));
    assert_eq!(resolve!(trait Greeter).greet(), "hello");
}

#[test]
fn scoped_helper_disposes_on_exit() {
    let _guard = serialized();

    static CLOSED: AtomicU32 = AtomicU32::new(0);

    struct Session;
    impl Disposable for Session {
        fn dispose(&self) -> Result<(), DisposeError> {
            CLOSED.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    global().register(
        wirecell::Registration::of::<Session>()
            .scoped()
            .factory(|| Session)
            .disposable()
            .build()
            .unwrap(),
    );

    scoped(|scope| {
        let a = scope.resolve::<Session>().unwrap();
        let b = scope.resolve::<Session>().unwrap();
        assert!(Arc::ptr_eq(&a, &b));
    });

    assert_eq!(CLOSED.load(Ordering::SeqCst), 1);
}

#[test]
fn supplied_argument_wins_over_injection() {
    let _guard = serialized();

    struct Clock {
        tag: &'static str,
    }

    global().singleton(|| Clock { tag: "injected" });

    let explicit = supplied_or(Some(Arc::new(Clock { tag: "explicit" }))).unwrap();
    assert_eq!(explicit.tag, "explicit");

    let injected = supplied_or::<Clock>(None).unwrap();
    assert_eq!(injected.tag, "injected");
}

#[test]
fn supplied_or_fails_like_resolve_when_unregistered() {
    let _guard = serialized();

    #[derive(Debug)]
    struct Nowhere;

    reset_global();
    let err = supplied_or::<Nowhere>(None).unwrap_err();
    assert!(err.is_not_registered());
}
