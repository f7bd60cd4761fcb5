//! Delivery of outcomes to blocked callers.

use std::sync::{Arc, Barrier};
use std::thread;
use std::time::{Duration, Instant};
use ts3_bridge::{
    ClientId, ConnectionHandle, CorrelationRegistry, ReturnCode, SyncBridge, WaitOutcome,
};

use super::MAX_PAUSE;
use crate::assertions::{self, AssertionResult};
use crate::harness::{random_pause, Harness, HarnessConfig};

/// Let `racers` event threads fight over one token while its waiter is
/// blocked. Exactly one may claim it, and the waiter sees that post.
pub fn duplicate_events_race(racers: usize) -> AssertionResult {
    let registry = CorrelationRegistry::new();
    let pending = registry.allocate();
    let token = pending.token();
    let barrier = Barrier::new(racers + 1);
    let codes = [
        ReturnCode::OK,
        ReturnCode::CHANNEL_INVALID_ID,
        ReturnCode::CLIENT_INVALID_ID,
        ReturnCode::UNDEFINED,
    ];

    let (winners, observed) = thread::scope(|s| {
        let racers: Vec<_> = (0..racers)
            .map(|i| {
                let registry = &registry;
                let barrier = &barrier;
                let code = codes[i % codes.len()];
                s.spawn(move || {
                    barrier.wait();
                    random_pause(MAX_PAUSE);
                    registry.remove(token).and_then(|record| {
                        let posted = record.slot().post(code);
                        registry.release(record);
                        posted.then_some(code)
                    })
                })
            })
            .collect();

        barrier.wait();
        let observed = match pending.slot().wait_until(Instant::now() + Duration::from_secs(2)) {
            WaitOutcome::Delivered(code) => Some(code),
            WaitOutcome::TimedOut => None,
        };
        let winners: Vec<ReturnCode> = racers
            .into_iter()
            .filter_map(|r| r.join().unwrap_or(None))
            .collect();
        (winners, observed)
    });

    if winners.len() != 1 {
        return AssertionResult::fail(
            "At-most-one delivery",
            &format!("{} racers claimed the token", winners.len()),
        );
    }
    let first = assertions::assert_first_post_wins(&winners, observed);
    if !first.passed {
        return first;
    }
    assertions::assert_drained(registry.len(), "tokens")
}

/// Answer each request from another thread after a random pause, so the
/// post lands sometimes before and sometimes after the caller sleeps.
pub fn no_lost_wakeup(rounds: usize) -> AssertionResult {
    let bridge = SyncBridge::with_timeout(Duration::from_secs(2));
    let events = bridge.event_sink();
    let handle = ConnectionHandle::new(1);

    for round in 0..rounds {
        let expected = if round % 3 == 0 {
            ReturnCode::CHANNEL_INVALID_ID
        } else {
            ReturnCode::OK
        };
        let result = bridge.begin_correlated(|text| {
            let text = text.to_string();
            let events = Arc::clone(&events);
            thread::spawn(move || {
                random_pause(MAX_PAUSE);
                events.on_server_error(handle, "", expected, Some(&text), "");
            });
            ReturnCode::OK
        });
        let check = assertions::assert_delivered(expected, &result);
        if !check.passed {
            return AssertionResult::fail(
                &check.description,
                &format!(
                    "round {}: {}",
                    round,
                    check.failure_details.unwrap_or_default()
                ),
            );
        }
    }
    let drained = assertions::assert_drained(bridge.registry().len(), "tokens");
    if !drained.passed {
        return drained;
    }
    AssertionResult::pass(&format!("{} rounds woken with their outcome", rounds))
}

/// Hammer one connection from `threads` callers through the simulated
/// library with jitter and duplicated events.
pub fn jittered_calls(threads: usize, per_thread: usize) -> AssertionResult {
    let harness = match Harness::start(HarnessConfig {
        jitter: Duration::from_millis(3),
        ..HarnessConfig::default()
    }) {
        Ok(harness) => harness,
        Err(e) => return AssertionResult::fail("No lost wakeup", &e.to_string()),
    };
    harness.sim().set_duplicate_events(true);
    let client = harness.client();
    let handle = harness.handle();

    let results: Vec<_> = thread::scope(|s| {
        let workers: Vec<_> = (0..threads)
            .map(|i| {
                s.spawn(move || {
                    (0..per_thread)
                        .map(|j| {
                            if (i + j) % 2 == 0 {
                                let r = client.request_server_connection_info(handle);
                                (ReturnCode::OK, r)
                            } else {
                                let r = client.request_client_variables(handle, ClientId::new(999));
                                (ReturnCode::CLIENT_INVALID_ID, r)
                            }
                        })
                        .collect::<Vec<_>>()
                })
            })
            .collect();
        workers
            .into_iter()
            .flat_map(|w| w.join().unwrap_or_default())
            .collect()
    });

    if results.len() != threads * per_thread {
        return AssertionResult::fail(
            "No lost wakeup",
            &format!("{} of {} callers returned", results.len(), threads * per_thread),
        );
    }
    for (expected, result) in &results {
        let check = assertions::assert_delivered(*expected, result);
        if !check.passed {
            return check;
        }
    }
    assertions::assert_drained(harness.bridge().registry().len(), "tokens")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scenarios::ROUNDS;

    #[test]
    fn one_claim_among_duplicate_events() {
        for _ in 0..ROUNDS {
            duplicate_events_race(4).check();
        }
    }

    #[test]
    fn racing_posts_always_wake_the_caller() {
        no_lost_wakeup(ROUNDS).check();
    }

    #[test]
    fn concurrent_calls_under_jitter() {
        jittered_calls(8, 25).check();
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn blocking_calls_from_async_tasks() {
        let harness = Arc::new(Harness::start(HarnessConfig::default()).unwrap());

        let tasks: Vec<_> = (0..16)
            .map(|_| {
                let harness = Arc::clone(&harness);
                tokio::task::spawn_blocking(move || {
                    harness
                        .client()
                        .request_server_connection_info(harness.handle())
                })
            })
            .collect();

        for task in tasks {
            assert_eq!(task.await.unwrap(), Ok(()));
        }
        assert!(harness.bridge().registry().is_empty());
    }
}
