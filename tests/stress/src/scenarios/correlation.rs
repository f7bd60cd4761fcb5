//! Token allocation and routing of correlated outcomes.

use rand::Rng;
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::{Duration, Instant};
use ts3_bridge::{
    ConnectionHandle, CorrelationRegistry, CorrelationToken, ReturnCode, SyncBridge, WaitOutcome,
};

use crate::assertions::{self, AssertionResult};
use crate::harness::{random_pause, Harness, HarnessConfig};

/// Allocate `per_thread` tokens on each of `threads` threads at once,
/// holding every record until all threads are done.
pub fn concurrent_allocation(threads: usize, per_thread: usize) -> AssertionResult {
    let registry = CorrelationRegistry::new();
    let barrier = Barrier::new(threads);

    let held: Vec<_> = thread::scope(|s| {
        let workers: Vec<_> = (0..threads)
            .map(|_| {
                s.spawn(|| {
                    barrier.wait();
                    (0..per_thread)
                        .map(|_| registry.allocate())
                        .collect::<Vec<_>>()
                })
            })
            .collect();
        workers
            .into_iter()
            .flat_map(|w| w.join().unwrap_or_default())
            .collect()
    });

    let tokens: Vec<CorrelationToken> = held.iter().map(|p| p.token()).collect();
    let distinct = assertions::assert_tokens_distinct(&tokens);
    if !distinct.passed {
        return distinct;
    }
    if tokens.len() != threads * per_thread {
        return AssertionResult::fail(
            "Token uniqueness",
            &format!("{} of {} allocations survived", tokens.len(), threads * per_thread),
        );
    }

    for pending in held {
        if let Some(record) = registry.remove(pending.token()) {
            registry.release(record);
        }
    }
    assertions::assert_drained(registry.len(), "tokens")
}

/// Fire `noise` events carrying tokens nobody registered while one real
/// request is in flight. Only the real outcome may reach the caller.
pub fn dangling_tokens_dropped(noise: usize) -> AssertionResult {
    let bridge = SyncBridge::with_timeout(Duration::from_secs(2));
    let events = bridge.event_sink();

    let result = bridge.begin_correlated(|text| {
        let own = text.to_string();
        let events = events.clone();
        thread::spawn(move || {
            let mut rng = rand::thread_rng();
            for _ in 0..noise {
                let stray: u32 = rng.gen_range(1_000_000..u32::MAX);
                events.on_server_error(
                    ConnectionHandle::new(1),
                    "stray",
                    ReturnCode::CHANNEL_INVALID_ID,
                    Some(&stray.to_string()),
                    "",
                );
            }
            random_pause(super::MAX_PAUSE);
            events.on_server_error(
                ConnectionHandle::new(1),
                "ok",
                ReturnCode::OK,
                Some(&own),
                "",
            );
        });
        ReturnCode::OK
    });

    let delivered = assertions::assert_delivered(ReturnCode::OK, &result);
    if !delivered.passed {
        return delivered;
    }
    assertions::assert_drained(bridge.registry().len(), "tokens")
}

/// Drop every outcome event and check each call times out near its
/// deadline and withdraws its token.
pub fn timeout_withdraws_token(calls: usize, deadline: Duration) -> AssertionResult {
    let harness = match Harness::start(HarnessConfig {
        wait_timeout: deadline,
        ..HarnessConfig::default()
    }) {
        Ok(harness) => harness,
        Err(e) => return AssertionResult::fail("Timeout fallback", &e.to_string()),
    };
    harness.sim().set_drop_rate(1.0);

    for _ in 0..calls {
        let started = Instant::now();
        let result = harness.client().request_server_connection_info(harness.handle());
        let check = assertions::assert_timed_out_near(
            &result,
            started.elapsed(),
            deadline,
            Duration::from_millis(250),
        );
        if !check.passed {
            return check;
        }
    }
    harness.sim().set_drop_rate(0.0);
    assertions::assert_drained(harness.bridge().registry().len(), "tokens")
}

/// Post the outcome exactly as the waiter's deadline expires, many times.
/// The waiter must either see the outcome or time out cleanly, and the
/// token must be gone afterwards either way.
pub fn deadline_edge(rounds: usize) -> AssertionResult {
    let registry = Arc::new(CorrelationRegistry::new());
    let mut delivered = 0;

    for _ in 0..rounds {
        let pending = registry.allocate();
        let token = pending.token();
        let deadline = Instant::now() + Duration::from_micros(300);

        let poster = {
            let registry = registry.clone();
            thread::spawn(move || {
                random_pause(Duration::from_micros(600));
                registry.remove(token).map(|record| {
                    let posted = record.slot().post(ReturnCode::OK);
                    registry.release(record);
                    posted
                })
            })
        };

        let outcome = match pending.slot().wait_until(deadline) {
            WaitOutcome::Delivered(code) => Some(code),
            WaitOutcome::TimedOut => match registry.remove(token) {
                Some(record) => {
                    registry.release(record);
                    None
                }
                None => {
                    // Claimed by the poster; its post is in or imminent.
                    let claimed = poster.join().unwrap_or(None);
                    if claimed != Some(true) {
                        return AssertionResult::fail(
                            "Timeout fallback",
                            &format!("token {} claimed without a post", token),
                        );
                    }
                    pending.slot().take()
                }
            },
        };
        if outcome.is_some() {
            delivered += 1;
        }
    }

    let drained = assertions::assert_drained(registry.len(), "tokens");
    if !drained.passed {
        return drained;
    }
    AssertionResult::pass(&format!(
        "{} of {} edge rounds delivered, rest timed out cleanly",
        delivered, rounds
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scenarios::ROUNDS;

    #[test]
    fn tokens_unique_across_concurrent_callers() {
        concurrent_allocation(8, 500).check();
    }

    #[test]
    fn stray_tokens_never_reach_a_caller() {
        for _ in 0..ROUNDS / 10 {
            dangling_tokens_dropped(50).check();
        }
    }

    #[test]
    fn lost_outcomes_time_out_and_release() {
        timeout_withdraws_token(5, Duration::from_millis(80)).check();
    }

    #[test]
    fn posts_racing_the_deadline_leave_nothing_behind() {
        deadline_edge(ROUNDS).check();
    }
}
