//! Assertion helpers for stress scenarios.
//!
//! These are pure functions that check bridge behaviour after a scenario
//! completes. They take observations as input and return pass/fail.

use std::collections::HashSet;
use std::time::Duration;
use ts3_bridge::{CallError, CorrelationToken, ReturnCode};

/// Result of an assertion check.
#[derive(Debug, Clone)]
pub struct AssertionResult {
    /// Whether the assertion passed
    pub passed: bool,
    /// Description of what was checked
    pub description: String,
    /// Details on failure
    pub failure_details: Option<String>,
}

impl AssertionResult {
    /// Create a passing result.
    pub fn pass(description: &str) -> Self {
        Self {
            passed: true,
            description: description.into(),
            failure_details: None,
        }
    }

    /// Create a failing result.
    pub fn fail(description: &str, details: &str) -> Self {
        Self {
            passed: false,
            description: description.into(),
            failure_details: Some(details.into()),
        }
    }

    /// Panic with the failure details if the check failed.
    pub fn check(self) {
        if !self.passed {
            panic!(
                "{}: {}",
                self.description,
                self.failure_details.unwrap_or_default()
            );
        }
    }
}

/// Outcome of one connect-vs-disconnect round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RaceRound {
    /// Result of the connect call.
    pub connect: Result<(), CallError>,
    /// Result of the disconnect call.
    pub disconnect: Result<(), CallError>,
    /// Whether the handle was idle once both returned.
    pub idle_after: bool,
}

impl RaceRound {
    fn busy(&self) -> usize {
        [&self.connect, &self.disconnect]
            .iter()
            .filter(|r| matches!(r, Err(CallError::CurrentlyNotPossible { .. })))
            .count()
    }
}

/// Assert that every token is distinct.
///
/// Positivity is guaranteed by the type.
pub fn assert_tokens_distinct(tokens: &[CorrelationToken]) -> AssertionResult {
    let mut seen = HashSet::with_capacity(tokens.len());
    for token in tokens {
        if !seen.insert(*token) {
            return AssertionResult::fail(
                "Token uniqueness",
                &format!("token {} allocated twice among {}", token, tokens.len()),
            );
        }
    }
    AssertionResult::pass(&format!("{} tokens pairwise distinct", tokens.len()))
}

/// Assert that a waiter saw exactly the first posted outcome.
pub fn assert_first_post_wins(posted: &[ReturnCode], observed: Option<ReturnCode>) -> AssertionResult {
    match (posted.first(), observed) {
        (None, None) => AssertionResult::pass("Nothing posted, nothing observed"),
        (Some(first), Some(seen)) if *first == seen => {
            AssertionResult::pass(&format!("First of {} posts observed", posted.len()))
        }
        (first, seen) => AssertionResult::fail(
            "At-most-one delivery",
            &format!("first post {:?}, observed {:?}", first, seen),
        ),
    }
}

/// Assert that a call returned the posted outcome rather than timing out.
pub fn assert_delivered(expected: ReturnCode, result: &Result<(), CallError>) -> AssertionResult {
    let observed = match result {
        Ok(()) => ReturnCode::OK,
        Err(CallError::Failed { code }) => *code,
        Err(other) => {
            return AssertionResult::fail(
                "No lost wakeup",
                &format!("expected {}, call ended with {}", expected, other),
            )
        }
    };
    if observed == expected {
        AssertionResult::pass(&format!("Outcome {} delivered", expected))
    } else {
        AssertionResult::fail(
            "No lost wakeup",
            &format!("expected {}, observed {}", expected, observed),
        )
    }
}

/// Assert that a call timed out close to its deadline.
pub fn assert_timed_out_near(
    result: &Result<(), CallError>,
    elapsed: Duration,
    deadline: Duration,
    slack: Duration,
) -> AssertionResult {
    if !matches!(result, Err(CallError::TimedOut { .. })) {
        return AssertionResult::fail(
            "Timeout fallback",
            &format!("expected a timeout, got {:?}", result),
        );
    }
    if result.as_ref().map_err(CallError::code).err() != Some(ReturnCode::CONNECTION_LOST) {
        return AssertionResult::fail("Timeout fallback", "timeout did not map to CONNECTION_LOST");
    }
    if elapsed < deadline || elapsed > deadline + slack {
        return AssertionResult::fail(
            "Timeout fallback",
            &format!(
                "returned after {:?}, deadline {:?} (+{:?})",
                elapsed, deadline, slack
            ),
        );
    }
    AssertionResult::pass(&format!("Timed out after {:?}", elapsed))
}

/// Assert that no round let both calls proceed at once or left the handle
/// mid-transition.
pub fn assert_exclusive(rounds: &[RaceRound]) -> AssertionResult {
    for (i, round) in rounds.iter().enumerate() {
        if round.busy() > 1 {
            return AssertionResult::fail(
                "State machine exclusivity",
                &format!("round {}: both calls refused", i),
            );
        }
        if !round.idle_after {
            return AssertionResult::fail(
                "State machine exclusivity",
                &format!("round {}: handle not idle after both returned", i),
            );
        }
    }
    let contested = rounds.iter().filter(|r| r.busy() == 1).count();
    AssertionResult::pass(&format!(
        "{} rounds exclusive ({} contested)",
        rounds.len(),
        contested
    ))
}

/// Assert that nothing is left registered.
pub fn assert_drained(pending: usize, what: &str) -> AssertionResult {
    if pending == 0 {
        AssertionResult::pass(&format!("No {} left", what))
    } else {
        AssertionResult::fail("Drained", &format!("{} {} still registered", pending, what))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token(raw: u32) -> CorrelationToken {
        CorrelationToken::new(raw).unwrap()
    }

    #[test]
    fn distinct_tokens_pass() {
        assert!(assert_tokens_distinct(&[token(1), token(2), token(3)]).passed);
        assert!(assert_tokens_distinct(&[]).passed);
    }

    #[test]
    fn repeated_token_fails() {
        let result = assert_tokens_distinct(&[token(1), token(2), token(1)]);
        assert!(!result.passed);
        assert!(result.failure_details.unwrap().contains("allocated twice"));
    }

    #[test]
    fn first_post_must_be_observed() {
        let posted = [ReturnCode::OK, ReturnCode::UNDEFINED];
        assert!(assert_first_post_wins(&posted, Some(ReturnCode::OK)).passed);
        assert!(!assert_first_post_wins(&posted, Some(ReturnCode::UNDEFINED)).passed);
        assert!(!assert_first_post_wins(&posted, None).passed);
    }

    #[test]
    fn delivered_outcomes() {
        assert!(assert_delivered(ReturnCode::OK, &Ok(())).passed);
        let failed = Err(CallError::Failed {
            code: ReturnCode::CHANNEL_INVALID_ID,
        });
        assert!(assert_delivered(ReturnCode::CHANNEL_INVALID_ID, &failed).passed);
        let timed_out = Err(CallError::TimedOut {
            timeout: Duration::from_millis(10),
        });
        assert!(!assert_delivered(ReturnCode::OK, &timed_out).passed);
    }

    #[test]
    fn timeout_window() {
        let deadline = Duration::from_millis(100);
        let slack = Duration::from_millis(50);
        let timed_out = Err(CallError::TimedOut { timeout: deadline });

        assert!(assert_timed_out_near(&timed_out, Duration::from_millis(120), deadline, slack).passed);
        assert!(!assert_timed_out_near(&timed_out, Duration::from_millis(20), deadline, slack).passed);
        assert!(!assert_timed_out_near(&timed_out, Duration::from_secs(2), deadline, slack).passed);
        assert!(!assert_timed_out_near(&Ok(()), Duration::from_millis(120), deadline, slack).passed);
    }

    #[test]
    fn exclusivity_rules() {
        let busy = Err(CallError::CurrentlyNotPossible {
            current: ts3_core::ExpectedState::Connecting,
        });
        let contested = RaceRound {
            connect: Ok(()),
            disconnect: busy.clone(),
            idle_after: true,
        };
        let both_busy = RaceRound {
            connect: busy.clone(),
            disconnect: busy,
            idle_after: true,
        };
        let stuck = RaceRound {
            connect: Ok(()),
            disconnect: Ok(()),
            idle_after: false,
        };

        assert!(assert_exclusive(&[contested.clone()]).passed);
        assert!(!assert_exclusive(&[contested.clone(), both_busy]).passed);
        assert!(!assert_exclusive(&[contested, stuck]).passed);
    }

    #[test]
    fn drained_counts() {
        assert!(assert_drained(0, "tokens").passed);
        assert!(!assert_drained(2, "tokens").passed);
    }
}
