//! Daily trigger scheduling.
//!
//! The schedule is an explicit ordered list of daily triggers owned by the
//! loop, rather than a global registry: the loop hands in the current time
//! and gets back the triggers that are due, so the firing logic is testable
//! with a simulated clock and no real waiting.
//!
//! A trigger fires at the first poll at or after its time of day, at most
//! once per calendar day. Registering a trigger at or after its time of day
//! latches the current day, so a daemon started at 23:00 with a 22:00
//! trigger first fires the next evening.

use chrono::{NaiveDateTime, NaiveTime};

/// Identifier for a registered trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TriggerId(usize);

/// One daily trigger: a time of day plus a once-per-day latch.
#[derive(Debug, Clone)]
struct DailyTrigger {
    at: NaiveTime,
    last_fired: Option<chrono::NaiveDate>,
}

impl DailyTrigger {
    fn is_due(&self, now: NaiveDateTime) -> bool {
        if now.time() < self.at {
            return false;
        }
        match self.last_fired {
            Some(day) => day < now.date(),
            None => true,
        }
    }
}

/// Ordered collection of daily triggers.
#[derive(Debug, Default)]
pub struct Schedule {
    triggers: Vec<DailyTrigger>,
}

impl Schedule {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a daily trigger at `at`.
    ///
    /// If `now` is already at or past `at`, today counts as fired and the
    /// trigger first becomes due tomorrow.
    pub fn add_daily(&mut self, at: NaiveTime, now: NaiveDateTime) -> TriggerId {
        let last_fired = if now.time() >= at {
            Some(now.date())
        } else {
            None
        };
        self.triggers.push(DailyTrigger { at, last_fired });
        TriggerId(self.triggers.len() - 1)
    }

    /// Return the triggers due at `now`, marking each as fired for the day.
    ///
    /// Marking happens here, not after the job runs: a failing job must not
    /// re-fire on the next poll.
    pub fn due(&mut self, now: NaiveDateTime) -> Vec<TriggerId> {
        let mut due = Vec::new();
        for (index, trigger) in self.triggers.iter_mut().enumerate() {
            if trigger.is_due(now) {
                trigger.last_fired = Some(now.date());
                due.push(TriggerId(index));
            }
        }
        due
    }

    /// Compute the next instant at which any trigger becomes due.
    pub fn next_due(&self, now: NaiveDateTime) -> Option<NaiveDateTime> {
        self.triggers
            .iter()
            .map(|t| {
                let today = now.date().and_time(t.at);
                if t.last_fired == Some(now.date()) {
                    (now.date() + chrono::Days::new(1)).and_time(t.at)
                } else if today >= now {
                    today
                } else {
                    // Overdue: fires on the next poll.
                    now
                }
            })
            .min()
    }

    pub fn len(&self) -> usize {
        self.triggers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.triggers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn on(day: u32, h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, day)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    #[test]
    fn fires_exactly_once_when_clock_crosses_trigger_time() {
        let mut schedule = Schedule::new();
        let id = schedule.add_daily(at(22, 0), on(1, 21, 58));

        // 60-second polls from 21:58 to 22:01.
        assert!(schedule.due(on(1, 21, 58)).is_empty());
        assert!(schedule.due(on(1, 21, 59)).is_empty());
        assert_eq!(schedule.due(on(1, 22, 0)), vec![id]);
        assert!(schedule.due(on(1, 22, 1)).is_empty());
    }

    #[test]
    fn fires_on_first_poll_after_trigger_time() {
        let mut schedule = Schedule::new();
        let id = schedule.add_daily(at(22, 0), on(1, 21, 30));

        // The poll lands a few seconds past the minute boundary.
        let poll = NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(22, 0, 42)
            .unwrap();
        assert_eq!(schedule.due(poll), vec![id]);
    }

    #[test]
    fn fires_again_the_next_day() {
        let mut schedule = Schedule::new();
        let id = schedule.add_daily(at(22, 0), on(1, 21, 58));

        assert_eq!(schedule.due(on(1, 22, 0)), vec![id]);
        assert!(schedule.due(on(1, 23, 59)).is_empty());
        assert_eq!(schedule.due(on(2, 22, 0)), vec![id]);
    }

    #[test]
    fn registration_past_trigger_time_waits_for_next_day() {
        let mut schedule = Schedule::new();
        let id = schedule.add_daily(at(22, 0), on(1, 23, 0));

        assert!(schedule.due(on(1, 23, 1)).is_empty());
        assert_eq!(schedule.due(on(2, 22, 0)), vec![id]);
    }

    #[test]
    fn registration_exactly_at_trigger_time_waits_for_next_day() {
        let mut schedule = Schedule::new();
        schedule.add_daily(at(22, 0), on(1, 22, 0));

        assert!(schedule.due(on(1, 22, 0)).is_empty());
        assert!(schedule.due(on(1, 22, 1)).is_empty());
    }

    #[test]
    fn missed_polls_still_fire_once() {
        let mut schedule = Schedule::new();
        let id = schedule.add_daily(at(22, 0), on(1, 12, 0));

        // A long-running job delayed polling well past the trigger time.
        assert_eq!(schedule.due(on(1, 23, 30)), vec![id]);
        assert!(schedule.due(on(1, 23, 31)).is_empty());
    }

    #[test]
    fn multiple_triggers_fire_independently() {
        let mut schedule = Schedule::new();
        let morning = schedule.add_daily(at(6, 0), on(1, 0, 0));
        let evening = schedule.add_daily(at(22, 0), on(1, 0, 0));

        assert_eq!(schedule.due(on(1, 6, 0)), vec![morning]);
        assert_eq!(schedule.due(on(1, 22, 0)), vec![evening]);
        assert_eq!(schedule.len(), 2);
    }

    #[test]
    fn both_due_in_one_poll_fire_in_registration_order() {
        let mut schedule = Schedule::new();
        let first = schedule.add_daily(at(6, 0), on(1, 0, 0));
        let second = schedule.add_daily(at(7, 0), on(1, 0, 0));

        assert_eq!(schedule.due(on(1, 8, 0)), vec![first, second]);
    }

    #[test]
    fn next_due_before_trigger_time_is_today() {
        let mut schedule = Schedule::new();
        schedule.add_daily(at(22, 0), on(1, 10, 0));

        assert_eq!(schedule.next_due(on(1, 10, 0)), Some(on(1, 22, 0)));
    }

    #[test]
    fn next_due_after_firing_is_tomorrow() {
        let mut schedule = Schedule::new();
        schedule.add_daily(at(22, 0), on(1, 10, 0));
        schedule.due(on(1, 22, 0));

        assert_eq!(schedule.next_due(on(1, 22, 5)), Some(on(2, 22, 0)));
    }

    #[test]
    fn next_due_on_empty_schedule_is_none() {
        let schedule = Schedule::new();
        assert_eq!(schedule.next_due(on(1, 0, 0)), None);
    }
}
