//! Cycle detection for in-flight resolutions
//!
//! Each thread keeps the ordered list of contracts currently under
//! construction on its call chain. A guard pushes the contract before its
//! provider runs and pops on drop, so the stack is restored on both success
//! and failure. Entries carry the owning container's id: independent
//! containers resolving on one thread never trip each other.

use crate::error::{DiError, Result};
use crate::key::ServiceKey;
use std::cell::RefCell;

thread_local! {
    static RESOLVING: RefCell<Vec<(u64, ServiceKey)>> = const { RefCell::new(Vec::new()) };
}

/// RAII entry on the thread's resolution stack.
///
/// Constructing the guard fails with [`DiError::CircularDependency`] when the
/// (container, contract) pair is already on the stack; the error carries the
/// chain in construction order, ending with the repeated entry.
#[derive(Debug)]
pub(crate) struct CycleGuard {
    _private: (),
}

impl CycleGuard {
    pub(crate) fn enter(container_id: u64, key: &ServiceKey) -> Result<Self> {
        RESOLVING.with(|stack| {
            let mut stack = stack.borrow_mut();
            if stack
                .iter()
                .any(|(id, entry)| *id == container_id && entry == key)
            {
                let mut chain: Vec<ServiceKey> = stack
                    .iter()
                    .filter(|(id, _)| *id == container_id)
                    .map(|(_, entry)| entry.clone())
                    .collect();
                chain.push(key.clone());
                return Err(DiError::circular(chain));
            }
            stack.push((container_id, key.clone()));
            Ok(CycleGuard { _private: () })
        })
    }
}

impl Drop for CycleGuard {
    fn drop(&mut self) {
        RESOLVING.with(|stack| {
            stack.borrow_mut().pop();
        });
    }
}

#[cfg(test)]
pub(crate) fn stack_depth() -> usize {
    RESOLVING.with(|stack| stack.borrow().len())
}

#[cfg(test)]
mod tests {
    use super::*;

    struct ServiceA;
    struct ServiceB;

    #[test]
    fn guard_pops_on_drop() {
        assert_eq!(stack_depth(), 0);
        {
            let _a = CycleGuard::enter(1, &ServiceKey::of::<ServiceA>()).unwrap();
            let _b = CycleGuard::enter(1, &ServiceKey::of::<ServiceB>()).unwrap();
            assert_eq!(stack_depth(), 2);
        }
        assert_eq!(stack_depth(), 0);
    }

    #[test]
    fn repeat_produces_ordered_chain() {
        let _a = CycleGuard::enter(1, &ServiceKey::of::<ServiceA>()).unwrap();
        let _b = CycleGuard::enter(1, &ServiceKey::of::<ServiceB>()).unwrap();

        let err = CycleGuard::enter(1, &ServiceKey::of::<ServiceA>()).unwrap_err();
        match err {
            DiError::CircularDependency { chain } => {
                let keys = chain.keys();
                assert_eq!(keys.len(), 3);
                assert_eq!(keys[0], ServiceKey::of::<ServiceA>());
                assert_eq!(keys[1], ServiceKey::of::<ServiceB>());
                assert_eq!(keys[2], ServiceKey::of::<ServiceA>());
            }
            other => panic!("expected CircularDependency, got {other:?}"),
        }

        // the failed entry was never pushed
        assert_eq!(stack_depth(), 2);
    }

    #[test]
    fn containers_do_not_cross_trip() {
        let _a = CycleGuard::enter(1, &ServiceKey::of::<ServiceA>()).unwrap();
        let _b = CycleGuard::enter(2, &ServiceKey::of::<ServiceA>()).unwrap();
        assert_eq!(stack_depth(), 2);
    }
}
