//! Load Balancer: picks one account from a candidate set by policy.
//!
//! The balancer never mutates account state and never touches the metadata
//! store itself — callers (`drivemesh-engine`) fetch the active-account
//! candidate set via the Account Registry and hand it here. Quota
//! accounting is updated out of band via `syncSpace` after the upload
//! completes.

use std::sync::atomic::{AtomicUsize, Ordering};

use drivemesh_core::domain::Account;
use rand::Rng;

/// Selection policy for picking a backend account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Strategy {
    /// Minimizes `used / total`; ties broken by higher priority, then by
    /// stable ID order.
    #[default]
    LeastUsed,
    /// Next index modulo the candidate count, preserved across calls.
    RoundRobin,
    /// Random pick with probability proportional to priority; falls back
    /// to uniform random if every candidate has priority zero.
    Weighted,
}

impl std::str::FromStr for Strategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "least_used" => Ok(Strategy::LeastUsed),
            "round_robin" => Ok(Strategy::RoundRobin),
            "weighted" => Ok(Strategy::Weighted),
            other => Err(format!("unknown load balancing strategy: {other}")),
        }
    }
}

/// Raised when the candidate set is empty. Maps to
/// [`drivemesh_core::domain::CoreError::NoBackend`] at the call site.
#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
#[error("no backend available")]
pub struct NoBackend;

/// Selects an account from a candidate set according to a [`Strategy`].
///
/// The candidate set is assumed to already be filtered to accounts that
/// are active and have enough free space for the requested size; this
/// type only implements the *pick* policy.
pub struct LoadBalancer {
    strategy: Strategy,
    cursor: AtomicUsize,
}

impl LoadBalancer {
    pub fn new(strategy: Strategy) -> Self {
        Self {
            strategy,
            cursor: AtomicUsize::new(0),
        }
    }

    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    /// Picks one account from `candidates`. Fails with [`NoBackend`] if the
    /// slice is empty.
    pub fn select<'a>(&self, candidates: &'a [Account]) -> Result<&'a Account, NoBackend> {
        if candidates.is_empty() {
            return Err(NoBackend);
        }

        let picked = match self.strategy {
            Strategy::LeastUsed => select_least_used(candidates),
            Strategy::RoundRobin => self.select_round_robin(candidates),
            Strategy::Weighted => select_weighted(candidates),
        };

        Ok(picked)
    }

    fn select_round_robin<'a>(&self, candidates: &'a [Account]) -> &'a Account {
        let idx = self.cursor.fetch_add(1, Ordering::Relaxed) % candidates.len();
        &candidates[idx]
    }
}

/// Minimizes `used / total`. Candidates with `total_space == 0` are
/// ranked last (undefined utilization, never preferred while any
/// candidate reports real quota).
fn select_least_used(candidates: &[Account]) -> &Account {
    candidates
        .iter()
        .min_by(|a, b| {
            utilization(a)
                .partial_cmp(&utilization(b))
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| b.priority().cmp(&a.priority()))
                .then_with(|| a.id().to_string().cmp(&b.id().to_string()))
        })
        .expect("candidates is non-empty")
}

fn utilization(account: &Account) -> f64 {
    if account.total_space() == 0 {
        return f64::INFINITY;
    }
    account.used_space() as f64 / account.total_space() as f64
}

fn select_weighted(candidates: &[Account]) -> &Account {
    let total_priority: u64 = candidates.iter().map(|a| a.priority() as u64).sum();

    let mut rng = rand::thread_rng();

    if total_priority == 0 {
        let idx = rng.gen_range(0..candidates.len());
        return &candidates[idx];
    }

    let mut pick = rng.gen_range(0..total_priority);
    for candidate in candidates {
        let weight = candidate.priority() as u64;
        if pick < weight {
            return candidate;
        }
        pick -= weight;
    }

    candidates.last().expect("candidates is non-empty")
}

#[cfg(test)]
mod tests {
    use super::*;
    use drivemesh_core::domain::newtypes::Email;

    fn account(priority: u32, used: u64, total: u64) -> Account {
        let email = Email::new(format!("acct-{priority}-{used}@example.com")).unwrap();
        let mut a = Account::new("Test", email, "cid", "secret", "tenant", priority);
        a.update_quota(used, total);
        a
    }

    #[test]
    fn strategy_from_str_parses_known_values() {
        assert_eq!("least_used".parse::<Strategy>().unwrap(), Strategy::LeastUsed);
        assert_eq!("round_robin".parse::<Strategy>().unwrap(), Strategy::RoundRobin);
        assert_eq!("weighted".parse::<Strategy>().unwrap(), Strategy::Weighted);
        assert!("bogus".parse::<Strategy>().is_err());
    }

    #[test]
    fn select_fails_on_empty_candidates() {
        let lb = LoadBalancer::new(Strategy::LeastUsed);
        assert_eq!(lb.select(&[]), Err(NoBackend));
    }

    #[test]
    fn least_used_picks_lowest_utilization() {
        let candidates = vec![
            account(1, 80, 100),
            account(1, 20, 100),
            account(1, 50, 100),
        ];
        let lb = LoadBalancer::new(Strategy::LeastUsed);
        let picked = lb.select(&candidates).unwrap();
        assert_eq!(picked.used_space(), 20);
    }

    #[test]
    fn least_used_breaks_ties_by_priority() {
        let candidates = vec![account(5, 50, 100), account(10, 50, 100)];
        let lb = LoadBalancer::new(Strategy::LeastUsed);
        let picked = lb.select(&candidates).unwrap();
        assert_eq!(picked.priority(), 10);
    }

    #[test]
    fn least_used_ranks_zero_total_last() {
        let candidates = vec![account(1, 0, 0), account(1, 90, 100)];
        let lb = LoadBalancer::new(Strategy::LeastUsed);
        let picked = lb.select(&candidates).unwrap();
        assert_eq!(picked.total_space(), 100);
    }

    #[test]
    fn round_robin_cycles_through_candidates() {
        let candidates = vec![account(1, 0, 100), account(1, 0, 100), account(1, 0, 100)];
        let lb = LoadBalancer::new(Strategy::RoundRobin);

        let first = lb.select(&candidates).unwrap() as *const Account;
        let second = lb.select(&candidates).unwrap() as *const Account;
        let third = lb.select(&candidates).unwrap() as *const Account;
        let fourth = lb.select(&candidates).unwrap() as *const Account;

        assert_eq!(first, &candidates[0] as *const Account);
        assert_eq!(second, &candidates[1] as *const Account);
        assert_eq!(third, &candidates[2] as *const Account);
        assert_eq!(fourth, &candidates[0] as *const Account);
    }

    #[test]
    fn round_robin_is_safe_under_concurrent_selection() {
        use std::sync::Arc;

        let candidates = Arc::new(vec![
            account(1, 0, 100),
            account(1, 0, 100),
            account(1, 0, 100),
            account(1, 0, 100),
        ]);
        let lb = Arc::new(LoadBalancer::new(Strategy::RoundRobin));

        std::thread::scope(|scope| {
            let mut handles = Vec::new();
            for _ in 0..8 {
                let lb = Arc::clone(&lb);
                let candidates = Arc::clone(&candidates);
                handles.push(scope.spawn(move || {
                    for _ in 0..100 {
                        lb.select(&candidates).unwrap();
                    }
                }));
            }
            for h in handles {
                h.join().unwrap();
            }
        });

        // 800 calls against a cursor starting at 0 land back on a
        // deterministic offset; the real property under test is the
        // absence of a panic/data race under concurrent access.
        assert!(lb.cursor.load(Ordering::Relaxed) >= 800);
    }

    #[test]
    fn weighted_never_picks_zero_priority_when_others_have_weight() {
        let candidates = vec![account(0, 0, 100), account(100, 0, 100)];
        let lb = LoadBalancer::new(Strategy::Weighted);
        for _ in 0..50 {
            let picked = lb.select(&candidates).unwrap();
            assert_eq!(picked.priority(), 100);
        }
    }

    #[test]
    fn weighted_falls_back_to_uniform_when_all_priorities_zero() {
        let candidates = vec![account(0, 0, 100), account(0, 0, 100)];
        let lb = LoadBalancer::new(Strategy::Weighted);
        // Should not panic across many draws, and should pick each at
        // least once over enough iterations (statistical, not exact).
        let mut saw_first = false;
        let mut saw_second = false;
        for _ in 0..200 {
            let picked = lb.select(&candidates).unwrap();
            if std::ptr::eq(picked, &candidates[0]) {
                saw_first = true;
            } else {
                saw_second = true;
            }
        }
        assert!(saw_first && saw_second);
    }
}
