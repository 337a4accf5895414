use std::collections::{HashMap, HashSet};
use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};
use std::thread::{scope, sleep};
use std::time::{Duration, Instant};

use crate::{
    ClockRegressionPolicy, Components, Error, GeneratorConfig, LockSnowflakeGenerator,
    MonotonicClock, Poll, SnowflakeGenerator, SnowflakeId, TickedSnowflakeGenerator, TimeSource,
};

const EPOCH: Duration = Duration::from_millis(1_000_000);
const EPOCH_MS: u64 = 1_000_000;

#[derive(Debug)]
struct MockTime {
    millis: AtomicU64,
}

impl MockTime {
    fn at_offset(offset: u64) -> Arc<Self> {
        Arc::new(Self {
            millis: AtomicU64::new(EPOCH_MS + offset),
        })
    }

    fn set_offset(&self, offset: u64) {
        self.millis.store(EPOCH_MS + offset, Ordering::SeqCst);
    }
}

impl TimeSource for MockTime {
    fn current_millis(&self) -> u64 {
        self.millis.load(Ordering::SeqCst)
    }
}

trait PollExt {
    fn unwrap_ready(self) -> SnowflakeId;
    fn unwrap_pending(self) -> u64;
}

impl PollExt for Poll {
    fn unwrap_ready(self) -> SnowflakeId {
        match self {
            Self::Ready { id } => id,
            Self::Pending { yield_for } => {
                panic!("unexpected pending (yield for: {yield_for})")
            }
        }
    }

    fn unwrap_pending(self) -> u64 {
        match self {
            Self::Ready { id } => panic!("unexpected ready ({id:?})"),
            Self::Pending { yield_for } => yield_for,
        }
    }
}

fn fields(timestamp: u64, worker_id: u64, sequence: u64) -> Components {
    Components {
        timestamp,
        worker_id,
        sequence,
    }
}

fn wait_until(cond: impl Fn() -> bool) {
    let deadline = Instant::now() + Duration::from_secs(5);
    while !cond() {
        assert!(Instant::now() < deadline, "condition not reached in time");
        sleep(Duration::from_millis(1));
    }
}

fn lock_generator(worker_id: u64, clock: &Arc<MockTime>) -> LockSnowflakeGenerator<Arc<MockTime>> {
    LockSnowflakeGenerator::new(worker_id, EPOCH, Arc::clone(clock)).unwrap()
}

fn ticked_generator(worker_id: u64, clock: &Arc<MockTime>) -> TickedSnowflakeGenerator {
    TickedSnowflakeGenerator::new(worker_id, EPOCH, Arc::clone(clock)).unwrap()
}

fn run_drains_full_tick<G: SnowflakeGenerator>(generator: &G, offset: u64) {
    for i in 0..=SnowflakeId::max_sequence() {
        let id = generator.try_poll_id().unwrap().unwrap_ready();
        assert_eq!(id.decode(), fields(offset, generator.worker_id(), i));
    }
    assert_eq!(generator.try_poll_id().unwrap().unwrap_pending(), 1);
}

fn run_unique_and_sorted_sequential<G: SnowflakeGenerator>(generator: &G) {
    const TOTAL_IDS: usize = 4096 * 64;

    let mut last: Option<SnowflakeId> = None;
    for _ in 0..TOTAL_IDS {
        let id = generator.generate().unwrap();
        if let Some(prev) = last {
            assert!(prev < id, "{prev:?} !< {id:?}");
            if prev.timestamp() == id.timestamp() {
                assert_eq!(prev.sequence() + 1, id.sequence());
            } else {
                assert_eq!(id.sequence(), 0);
            }
        }
        last = Some(id);
    }
}

fn run_unique_threaded<G: SnowflakeGenerator + Sync>(generator: &G) {
    const THREADS: usize = 8;
    const IDS_PER_THREAD: usize = 4096 * 16;

    let per_thread: Vec<Vec<SnowflakeId>> = scope(|s| {
        let handles: Vec<_> = (0..THREADS)
            .map(|_| {
                s.spawn(|| {
                    let mut ids = Vec::with_capacity(IDS_PER_THREAD);
                    for _ in 0..IDS_PER_THREAD {
                        ids.push(generator.generate().unwrap());
                    }
                    ids
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    let mut seen = HashSet::with_capacity(THREADS * IDS_PER_THREAD);
    let mut per_millis: HashMap<u64, usize> = HashMap::new();
    for ids in &per_thread {
        // Calls made one after another on a thread come back in order.
        assert!(ids.windows(2).all(|w| w[0] < w[1]));
        for id in ids {
            assert!(seen.insert(*id), "duplicate id {id:?}");
            assert_eq!(id.worker_id(), generator.worker_id());
            *per_millis.entry(id.timestamp()).or_default() += 1;
        }
    }
    assert_eq!(seen.len(), THREADS * IDS_PER_THREAD);
    assert!(per_millis.values().all(|&n| n <= 4096));
}

// --- lock (on-demand) generator ---

#[test]
fn lock_sequence_increments_within_same_tick() {
    let clock = MockTime::at_offset(42);
    let generator = lock_generator(5, &clock);

    let a = generator.generate().unwrap();
    let b = generator.generate().unwrap();
    assert_eq!(generator.decode(a), fields(42, 5, 0));
    assert_eq!(generator.decode(b), fields(42, 5, 1));

    clock.set_offset(43);
    let c = generator.generate().unwrap();
    assert_eq!(generator.decode(c), fields(43, 5, 0));
    assert!(a < b && b < c);
}

#[test]
fn lock_pending_when_sequence_exhausted_then_rolls_over() {
    let clock = MockTime::at_offset(42);
    let generator = lock_generator(1, &clock);

    run_drains_full_tick(&generator, 42);

    clock.set_offset(43);
    let id = generator.try_poll_id().unwrap().unwrap_ready();
    assert_eq!(id.decode(), fields(43, 1, 0));
}

#[test]
fn lock_generate_waits_out_exhaustion() {
    let clock = MockTime::at_offset(42);
    let generator = lock_generator(1, &clock);

    let last = scope(|s| {
        s.spawn(|| {
            sleep(Duration::from_millis(20));
            clock.set_offset(43);
        });
        let mut last = None;
        for _ in 0..=4096 {
            last = Some(generator.generate().unwrap());
        }
        last
    });

    assert_eq!(last.unwrap().decode(), fields(43, 1, 0));
}

#[test]
fn lock_rejects_out_of_range_worker_id() {
    let clock = MockTime::at_offset(0);
    assert!(LockSnowflakeGenerator::new(2046, EPOCH, Arc::clone(&clock)).is_ok());
    assert_eq!(
        LockSnowflakeGenerator::new(2047, EPOCH, Arc::clone(&clock)).unwrap_err(),
        Error::InvalidWorkerId {
            worker_id: 2047,
            max: 2047
        }
    );
}

#[test]
fn lock_rejects_epoch_in_future() {
    let clock = MockTime::at_offset(0);
    let epoch = Duration::from_millis(EPOCH_MS + 1);
    assert_eq!(
        LockSnowflakeGenerator::new(0, epoch, clock).unwrap_err(),
        Error::EpochInFuture {
            now: EPOCH_MS,
            epoch: EPOCH_MS + 1
        }
    );
}

#[test]
fn lock_waits_for_regressed_clock() {
    let clock = MockTime::at_offset(100);
    let generator = lock_generator(2, &clock);
    generator.generate().unwrap();

    clock.set_offset(90);
    assert_eq!(generator.try_poll_id().unwrap().unwrap_pending(), 10);

    clock.set_offset(100);
    let id = generator.try_poll_id().unwrap().unwrap_ready();
    assert_eq!(id.decode(), fields(100, 2, 1));
}

#[test]
fn lock_generate_resumes_after_regression() {
    let clock = MockTime::at_offset(100);
    let generator = lock_generator(2, &clock);
    let first = generator.generate().unwrap();
    clock.set_offset(95);

    let next = scope(|s| {
        s.spawn(|| {
            sleep(Duration::from_millis(20));
            clock.set_offset(101);
        });
        generator.generate().unwrap()
    });

    assert!(first < next);
    assert!(next.timestamp() >= 100);
}

#[test]
fn lock_fails_fast_on_regression_when_configured() {
    let clock = MockTime::at_offset(100);
    let config = GeneratorConfig::new(2)
        .with_epoch(EPOCH)
        .with_clock_regression(ClockRegressionPolicy::Fail);
    let generator = LockSnowflakeGenerator::with_config(config, Arc::clone(&clock)).unwrap();
    generator.generate().unwrap();

    clock.set_offset(99);
    assert_eq!(
        generator.generate().unwrap_err(),
        Error::ClockRegression {
            last: EPOCH_MS + 100,
            now: EPOCH_MS + 99
        }
    );

    // State was untouched, so the next call continues the same window.
    clock.set_offset(100);
    assert_eq!(generator.generate().unwrap().decode(), fields(100, 2, 1));
}

#[test]
fn lock_epoch_exhaustion_is_fatal() {
    let max = SnowflakeId::max_timestamp();
    let clock = MockTime::at_offset(max);
    let generator = lock_generator(3, &clock);
    assert_eq!(generator.generate().unwrap().decode(), fields(max, 3, 0));

    clock.set_offset(max + 1);
    assert_eq!(
        generator.generate().unwrap_err(),
        Error::EpochExhausted { offset: max + 1 }
    );
    assert_eq!(
        generator.try_poll_id().unwrap_err(),
        Error::EpochExhausted { offset: max + 1 }
    );
}

#[test]
fn lock_worker_isolation() {
    let clock = MockTime::at_offset(7);
    let five = lock_generator(5, &clock);
    let six = lock_generator(6, &clock);

    let mut seen = HashSet::new();
    for _ in 0..1000 {
        let a = five.generate().unwrap();
        let b = six.generate().unwrap();
        assert_eq!(
            (a.timestamp(), a.sequence()),
            (b.timestamp(), b.sequence())
        );
        assert_ne!(a, b);
        assert!(seen.insert(a));
        assert!(seen.insert(b));
    }
}

#[test]
fn lock_generators_do_not_share_state() {
    let clock = MockTime::at_offset(7);
    let a = lock_generator(9, &clock);
    let b = lock_generator(9, &clock);
    a.generate().unwrap();
    a.generate().unwrap();
    assert_eq!(b.generate().unwrap().decode(), fields(7, 9, 0));
}

#[test]
fn lock_unique_and_sorted_sequential() {
    let generator = LockSnowflakeGenerator::new(1, EPOCH, MonotonicClock::new()).unwrap();
    run_unique_and_sorted_sequential(&generator);
}

#[test]
fn lock_unique_threaded() {
    let generator = LockSnowflakeGenerator::new(1, EPOCH, MonotonicClock::new()).unwrap();
    run_unique_threaded(&generator);
}

#[test]
fn lock_fail_fast_never_trips_under_contention() {
    const THREADS: usize = 8;
    const IDS_PER_THREAD: usize = 4096 * 8;

    let config = GeneratorConfig::new(1)
        .with_epoch(EPOCH)
        .with_clock_regression(ClockRegressionPolicy::Fail);
    let generator = LockSnowflakeGenerator::with_config(config, MonotonicClock::new()).unwrap();

    scope(|s| {
        for _ in 0..THREADS {
            s.spawn(|| {
                for _ in 0..IDS_PER_THREAD {
                    // A monotonic clock read under the lock can never look
                    // older than the last issued timestamp.
                    generator.generate().unwrap();
                }
            });
        }
    });
}

// --- ticked (push) generator ---

#[test]
fn ticked_sequence_increments_within_same_tick() {
    let clock = MockTime::at_offset(42);
    let generator = ticked_generator(5, &clock);

    let a = generator.generate().unwrap();
    let b = generator.generate().unwrap();
    assert_eq!(generator.decode(a), fields(42, 5, 0));
    assert_eq!(generator.decode(b), fields(42, 5, 1));

    clock.set_offset(43);
    wait_until(|| generator.last_timestamp() == EPOCH_MS + 43);
    let c = generator.generate().unwrap();
    assert_eq!(generator.decode(c), fields(43, 5, 0));
}

#[test]
fn ticked_pending_when_sequence_exhausted_then_rolls_over() {
    let clock = MockTime::at_offset(42);
    let generator = ticked_generator(1, &clock);

    run_drains_full_tick(&generator, 42);

    clock.set_offset(43);
    let id = generator.generate().unwrap();
    assert_eq!(id.decode(), fields(43, 1, 0));
}

#[test]
fn ticked_ignores_regressed_clock() {
    let clock = MockTime::at_offset(100);
    let generator = ticked_generator(2, &clock);
    generator.generate().unwrap();

    clock.set_offset(50);
    sleep(Duration::from_millis(10));
    assert_eq!(generator.last_timestamp(), EPOCH_MS + 100);
    assert_eq!(generator.generate().unwrap().decode(), fields(100, 2, 1));
}

#[test]
fn ticked_stop_drains_then_errors() {
    let clock = MockTime::at_offset(42);
    let mut generator = ticked_generator(1, &clock);
    assert!(generator.is_ticking());

    generator.stop();
    assert!(!generator.is_ticking());
    generator.stop();

    for _ in 0..4096 {
        generator.generate().unwrap();
    }
    assert_eq!(generator.generate().unwrap_err(), Error::TickerStopped);
}

#[test]
fn ticked_epoch_exhausted_at_construction() {
    let clock = MockTime::at_offset(SnowflakeId::max_timestamp() + 5);
    let generator = ticked_generator(1, &clock);
    assert_eq!(
        generator.generate().unwrap_err(),
        Error::EpochExhausted {
            offset: SnowflakeId::max_timestamp() + 5
        }
    );
    wait_until(|| !generator.is_ticking());
}

#[test]
fn ticked_epoch_exhausted_while_running() {
    let max = SnowflakeId::max_timestamp();
    let clock = MockTime::at_offset(max);
    let generator = ticked_generator(1, &clock);
    assert_eq!(generator.generate().unwrap().decode(), fields(max, 1, 0));

    clock.set_offset(max + 1);
    wait_until(|| !generator.is_ticking());
    assert_eq!(
        generator.generate().unwrap_err(),
        Error::EpochExhausted { offset: max + 1 }
    );
}

#[test]
fn ticked_rejects_fail_fast_regression_policy() {
    let clock = MockTime::at_offset(100);
    let config = GeneratorConfig::new(2)
        .with_epoch(EPOCH)
        .with_clock_regression(ClockRegressionPolicy::Fail);
    assert_eq!(
        TickedSnowflakeGenerator::with_config(config, Arc::clone(&clock)).unwrap_err(),
        Error::UnsupportedRegressionPolicy {
            policy: ClockRegressionPolicy::Fail
        }
    );

    let generator = TickedSnowflakeGenerator::with_config(
        config.with_clock_regression(ClockRegressionPolicy::Wait),
        clock,
    )
    .unwrap();
    assert_eq!(generator.config().clock_regression, ClockRegressionPolicy::Wait);
}

#[test]
fn ticked_stop_is_terminal() {
    let clock = MockTime::at_offset(42);
    let mut generator = ticked_generator(1, &clock);
    generator.stop();

    clock.set_offset(43);
    sleep(Duration::from_millis(10));
    assert!(!generator.is_ticking());
    assert_eq!(generator.last_timestamp(), EPOCH_MS + 42);
    assert_eq!(generator.generate().unwrap().decode(), fields(42, 1, 0));
}

#[test]
fn ticked_rejects_bad_config() {
    let clock = MockTime::at_offset(0);
    assert!(matches!(
        TickedSnowflakeGenerator::new(4000, EPOCH, Arc::clone(&clock)),
        Err(Error::InvalidWorkerId { .. })
    ));
    assert!(matches!(
        TickedSnowflakeGenerator::new(0, EPOCH + Duration::from_millis(1), clock),
        Err(Error::EpochInFuture { .. })
    ));
}

#[test]
fn ticked_worker_isolation() {
    let clock = MockTime::at_offset(7);
    let five = ticked_generator(5, &clock);
    let six = ticked_generator(6, &clock);

    for _ in 0..1000 {
        let a = five.generate().unwrap();
        let b = six.generate().unwrap();
        assert_eq!(
            (a.timestamp(), a.sequence()),
            (b.timestamp(), b.sequence())
        );
        assert_ne!(a, b);
    }
}

#[test]
fn ticked_unique_and_sorted_sequential() {
    let generator = TickedSnowflakeGenerator::new(1, EPOCH, MonotonicClock::new()).unwrap();
    run_unique_and_sorted_sequential(&generator);
}

#[test]
fn ticked_unique_threaded() {
    let generator = TickedSnowflakeGenerator::new(1, EPOCH, MonotonicClock::new()).unwrap();
    run_unique_threaded(&generator);
}

#[test]
fn generators_are_send_and_sync() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<LockSnowflakeGenerator<MonotonicClock>>();
    assert_send_sync::<TickedSnowflakeGenerator>();
}
