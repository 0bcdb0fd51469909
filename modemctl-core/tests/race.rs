mod common;

use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use modemctl_core::{LifecycleState, Level, ModemOps, SequenceDelay};

use common::{CP_RESET, Control, Harness, PHONE_ACTIVE};

struct YieldingDelay;

impl SequenceDelay for YieldingDelay {
    fn sleep(&mut self, _: Duration) {
        thread::yield_now();
    }

    fn busy_wait(&mut self, _: Duration) {
        thread::yield_now();
    }
}

const CYCLES: usize = 50;

/// True when `observed` appears in order within `notified`.
fn is_subsequence(observed: &[LifecycleState], notified: &[LifecycleState]) -> bool {
    let mut notified = notified.iter();
    observed
        .iter()
        .all(|state| notified.any(|candidate| candidate == state))
}

#[test]
fn interrupt_and_sequencer_share_the_context() {
    let harness = Harness::default();
    let control: Control<CriticalSectionRawMutex> = harness.init();
    let done = AtomicBool::new(false);

    let observed = thread::scope(|scope| {
        let observer = scope.spawn(|| {
            let mut observed = vec![control.state()];
            while !done.load(Ordering::Acquire) {
                let state = control.state();
                if observed.last() != Some(&state) {
                    observed.push(state);
                }
                thread::yield_now();
            }
            observed
        });

        scope.spawn(|| {
            let mut delay = YieldingDelay;
            for _ in 0..CYCLES {
                control.modem_on(&mut delay).expect("power on");
                control.modem_reset(&mut delay).expect("reset");
                control.modem_off(&mut delay).expect("power off");
            }
            done.store(true, Ordering::Release);
        });

        scope.spawn(|| {
            let mut active = Level::High;
            while !done.load(Ordering::Acquire) {
                harness.board.set_level(PHONE_ACTIVE, active);
                harness.board.set_level(CP_RESET, Level::High);
                let _ = control.on_phone_active_irq();
                active = !active;
                thread::yield_now();
            }
            harness.board.set_level(PHONE_ACTIVE, Level::Low);
        });

        observer.join().expect("observer thread")
    });

    let seen = harness.notifier.seen();
    assert_eq!(seen.last().copied(), Some(control.state()));

    // Only the power-on sequence reports booting.
    let booting = seen
        .iter()
        .filter(|state| **state == LifecycleState::Booting)
        .count();
    assert_eq!(booting, CYCLES);

    // The monitor only reports a crash when the modem was online.
    for pair in seen.windows(2) {
        if pair[1] == LifecycleState::CrashExit {
            assert_eq!(pair[0], LifecycleState::Online, "{seen:?}");
        }
    }

    // Every state a reader saw was one the subscriber was told about, in the
    // same order.
    let mut notified = vec![LifecycleState::Offline];
    notified.extend(seen.iter().copied());
    assert!(is_subsequence(&observed, &notified), "{observed:?} vs {seen:?}");
}
