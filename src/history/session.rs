//! Sessions and their aggregate statistics.
//!
//! All averages follow the World Cube Association trimmed mean. DNF solves
//! appear as `None` and collate after every finite time.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use super::solve::{SessionId, Solve, SolveType, SyncStamp};

/// An ordered collection of solves of a single type.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub id: SessionId,
    /// Optional human-given name; empty when unnamed.
    pub name: String,
    pub solve_type: SolveType,
    pub solves: Vec<Solve>,
    pub update: SyncStamp,
    /// True when the persisted copy is stale.
    pub dirty: bool,
}

impl Session {
    pub(crate) fn new(id: SessionId, solve_type: SolveType) -> Self {
        Self {
            id,
            name: String::new(),
            solve_type,
            solves: Vec::new(),
            update: SyncStamp::default(),
            dirty: false,
        }
    }

    /// WCA trimmed-mean average. DNF for two or fewer times; otherwise sort
    /// with DNF last, trim ceil(n/40) from each end, and DNF if any DNF
    /// survives the trim. The mean is rounded to the nearest millisecond.
    pub fn avg_of(times: &[Option<u32>]) -> Option<u32> {
        if times.len() <= 2 {
            return None;
        }
        let mut sorted = times.to_vec();
        sorted.sort_by(|a, b| match (a, b) {
            (None, None) => Ordering::Equal,
            (None, Some(_)) => Ordering::Greater,
            (Some(_), None) => Ordering::Less,
            (Some(x), Some(y)) => x.cmp(y),
        });
        let trim = (sorted.len() + 39) / 40;
        let kept = &sorted[trim..sorted.len() - trim];
        let mut sum: u64 = 0;
        for time in kept {
            sum += u64::from((*time)?);
        }
        let count = kept.len() as u64;
        Some(((sum + count / 2) / count) as u32)
    }

    /// Average over the last `count` solves. DNF when fewer solves exist.
    /// With `ignore_dnf`, DNF solves are dropped before averaging instead of
    /// poisoning it.
    pub fn avg_of_last(&self, count: usize, ignore_dnf: bool) -> Option<u32> {
        if count > self.solves.len() {
            return None;
        }
        let start = self.solves.len() - count;
        let times: Vec<Option<u32>> = self.solves[start..]
            .iter()
            .filter(|solve| !ignore_dnf || solve.ok)
            .map(Solve::final_time)
            .collect();
        Self::avg_of(&times)
    }

    /// The fastest successful solve, if any. Earlier solves win ties.
    pub fn best_solve(&self) -> Option<&Solve> {
        self.solves
            .iter()
            .filter(|solve| solve.ok)
            .min_by_key(|solve| solve.time_ms)
    }

    /// Best average over any window of exactly `count` consecutive solves.
    /// Returns the average and the window's starting index.
    pub fn best_avg_of(&self, count: usize) -> Option<(u32, usize)> {
        if self.solves.len() < count {
            return None;
        }
        let mut best: Option<(u32, usize)> = None;
        for start in 0..=(self.solves.len() - count) {
            let times: Vec<Option<u32>> = self.solves[start..start + count]
                .iter()
                .map(Solve::final_time)
                .collect();
            let Some(avg) = Self::avg_of(&times) else {
                continue;
            };
            if best.is_none_or(|(value, _)| avg < value) {
                best = Some((avg, start));
            }
        }
        best
    }

    /// Trimmed mean over the whole session, ignoring DNFs.
    pub fn session_avg(&self) -> Option<u32> {
        self.avg_of_last(self.solves.len(), true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cube::{MoveSequence, TimedMoveSequence};
    use crate::history::SolveId;
    use crate::phase::SplitTimes;

    fn solve(id: &str, time: Option<u32>) -> Solve {
        Solve {
            id: SolveId::new(id),
            scramble: MoveSequence::default(),
            created: 0,
            ok: time.is_some(),
            time_ms: time.unwrap_or(0),
            penalty_ms: 0,
            device: String::new(),
            moves: TimedMoveSequence::default(),
            splits: SplitTimes::default(),
            update: SyncStamp::default(),
            dirty: false,
        }
    }

    fn session_with(times: &[Option<u32>]) -> Session {
        let mut session = Session::new(SessionId::new("session-1"), SolveType::Standard3x3x3);
        for (i, &time) in times.iter().enumerate() {
            session.solves.push(solve(&format!("solve-{i}"), time));
        }
        session
    }

    #[test]
    fn avg_of_needs_more_than_two_times() {
        assert_eq!(Session::avg_of(&[]), None);
        assert_eq!(Session::avg_of(&[Some(1000)]), None);
        assert_eq!(Session::avg_of(&[Some(1000), Some(2000)]), None);
    }

    #[test]
    fn avg_of_three_keeps_the_median() {
        assert_eq!(
            Session::avg_of(&[Some(10_000), Some(12_000), Some(11_000)]),
            Some(11_000)
        );
    }

    #[test]
    fn avg_of_five_trims_one_from_each_end() {
        assert_eq!(
            Session::avg_of(&[Some(9), Some(2), Some(100), Some(5), Some(7)]),
            Some(7)
        );
    }

    #[test]
    fn single_dnf_is_trimmed_as_the_worst_time() {
        assert_eq!(
            Session::avg_of(&[Some(6), None, Some(2), Some(4), Some(5)]),
            Some(5)
        );
    }

    #[test]
    fn dnf_inside_the_trimmed_interior_poisons_the_average() {
        assert_eq!(Session::avg_of(&[Some(6), None, None, Some(4), Some(5)]), None);
        assert_eq!(Session::avg_of(&[None, None, None]), None);
    }

    #[test]
    fn mean_rounds_to_nearest() {
        // Kept interior is {3, 4}: mean 3.5 rounds up.
        assert_eq!(
            Session::avg_of(&[Some(1), Some(3), Some(4), Some(10)]),
            Some(4)
        );
    }

    #[test]
    fn avg_of_last_requires_enough_solves() {
        let session = session_with(&[Some(10_000), Some(12_000), Some(11_000)]);
        assert_eq!(session.avg_of_last(5, false), None);
        assert_eq!(session.avg_of_last(3, false), Some(11_000));
    }

    #[test]
    fn avg_of_last_can_drop_dnfs_entirely() {
        let session = session_with(&[Some(10), Some(20), None, Some(30), Some(40)]);
        // Ignoring DNFs leaves four times; trimming the ends keeps {20, 30}.
        assert_eq!(session.avg_of_last(5, true), Some(25));
        // Counting the DNF leaves it inside the window: trimmed out as the
        // single worst value, so the average survives.
        assert_eq!(session.avg_of_last(5, false), Some(30));
    }

    #[test]
    fn best_solve_skips_dnfs_and_prefers_earlier_ties() {
        let session = session_with(&[None, Some(12_000), Some(10_000), Some(10_000)]);
        let best = session.best_solve().unwrap();
        assert_eq!(best.time_ms, 10_000);
        assert_eq!(best.id, SolveId::new("solve-2"));

        let all_dnf = session_with(&[None, None]);
        assert!(all_dnf.best_solve().is_none());
    }

    #[test]
    fn best_avg_of_slides_a_window() {
        let session = session_with(&[
            Some(100),
            Some(90),
            Some(80),
            Some(10),
            Some(11),
            Some(12),
        ]);
        // The window {80, 10, 11} trims its extremes down to 11, beating
        // every earlier window; later ties keep the earlier start.
        assert_eq!(session.best_avg_of(3), Some((11, 2)));
        assert_eq!(session.best_avg_of(7), None);
    }

    #[test]
    fn best_avg_of_skips_poisoned_windows() {
        let session = session_with(&[Some(10), None, None, Some(50), Some(60), Some(70)]);
        // Windows holding two DNFs collapse to DNF and are skipped; a single
        // DNF is trimmed away as the worst time.
        assert_eq!(session.best_avg_of(3), Some((60, 2)));
    }

    #[test]
    fn session_avg_ignores_dnfs() {
        let session = session_with(&[Some(10_000), Some(12_000), None, Some(11_000)]);
        assert_eq!(session.session_avg(), Some(11_000));
    }
}
