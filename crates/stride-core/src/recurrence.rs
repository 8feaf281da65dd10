//! Habit recurrence and streak math.
//!
//! Pure functions over habit fields and checkin days. Used both by the
//! interactive handlers and the notification sweeps.

use chrono::{Datelike, Days, NaiveDate, Weekday};
use std::collections::HashSet;

use crate::model::{Habit, HabitInterval, HabitStatus};

/// Monday of the calendar week containing `date`.
pub fn week_start(date: NaiveDate) -> NaiveDate {
    let back = date.weekday().num_days_from_monday() as u64;
    date - Days::new(back)
}

/// Whether the habit has a checkin inside the Monday-Sunday week of `date`.
pub fn completed_in_week(checkins: &HashSet<NaiveDate>, date: NaiveDate) -> bool {
    let start = week_start(date);
    let end = start + Days::new(6);
    let mut day = start;
    while day <= end {
        if checkins.contains(&day) {
            return true;
        }
        day = day + Days::new(1);
    }
    false
}

/// Whether the habit is due on `date`.
///
/// Inactive habits and habits whose goal date has passed are never due.
/// A habit with no interval is due every day. Weekly habits report due
/// only once a checkin exists inside the current week, which confirms
/// the completion rather than prompting for it.
pub fn is_due_on(habit: &Habit, checkins: &HashSet<NaiveDate>, date: NaiveDate) -> bool {
    if habit.status != HabitStatus::InProgress {
        return false;
    }
    if let Some(goal) = habit.goal_date {
        if goal < date {
            return false;
        }
    }
    match habit.interval {
        None => true,
        Some(HabitInterval::EveryDay) => true,
        Some(HabitInterval::EveryWeek) => completed_in_week(checkins, date),
        Some(HabitInterval::EveryWeekday) => {
            !matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
        }
        Some(HabitInterval::EveryWeekend) => {
            matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
        }
        Some(interval) => interval.weekday() == Some(date.weekday()),
    }
}

/// Consecutive checkin days counted backward from `today` inclusive.
pub fn current_streak(checkins: &HashSet<NaiveDate>, today: NaiveDate) -> u32 {
    let mut streak = 0;
    let mut day = today;
    while checkins.contains(&day) {
        streak += 1;
        day = day - Days::new(1);
    }
    streak
}

/// Longest run of consecutive calendar days in `days`, which must be
/// sorted ascending with no duplicates.
pub fn longest_streak(days: &[NaiveDate]) -> u32 {
    let Some(&first) = days.first() else {
        return 0;
    };
    let mut longest = 0;
    let mut current = 1;
    let mut prev = first;
    for &day in &days[1..] {
        if day - prev == chrono::Duration::days(1) {
            current += 1;
        } else {
            longest = longest.max(current);
            current = 1;
        }
        prev = day;
    }
    longest.max(current)
}

/// Checkins inside `[start, end]` as a percentage of the days in range.
/// 0.0 for habits that are not active.
pub fn completion_rate(
    habit: &Habit,
    checkins: &HashSet<NaiveDate>,
    start: NaiveDate,
    end: NaiveDate,
) -> f64 {
    if habit.status != HabitStatus::InProgress {
        return 0.0;
    }
    let total_days = (end - start).num_days() + 1;
    if total_days <= 0 {
        return 0.0;
    }
    let completed = checkins.iter().filter(|d| **d >= start && **d <= end).count();
    completed as f64 / total_days as f64 * 100.0
}

/// Next date on or after `from` on which the interval fires.
pub fn next_due_date(interval: Option<HabitInterval>, from: NaiveDate) -> NaiveDate {
    match interval {
        None | Some(HabitInterval::EveryDay) => from,
        Some(HabitInterval::EveryWeek) => next_or_same_weekday(from, Weekday::Mon),
        Some(HabitInterval::EveryWeekday) => match from.weekday() {
            Weekday::Sat | Weekday::Sun => next_or_same_weekday(from, Weekday::Mon),
            _ => from,
        },
        Some(HabitInterval::EveryWeekend) => match from.weekday() {
            Weekday::Sat | Weekday::Sun => from,
            _ => next_or_same_weekday(from, Weekday::Sat),
        },
        Some(other) => match other.weekday() {
            Some(weekday) => next_or_same_weekday(from, weekday),
            None => from,
        },
    }
}

fn next_or_same_weekday(from: NaiveDate, weekday: Weekday) -> NaiveDate {
    let ahead = (7 + weekday.num_days_from_monday() - from.weekday().num_days_from_monday()) % 7;
    from + Days::new(ahead as u64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn habit(status: HabitStatus, interval: Option<HabitInterval>) -> Habit {
        Habit {
            id: 1,
            chat_id: 1,
            title: "Run".into(),
            description: String::new(),
            interval,
            goal_date: NaiveDate::from_ymd_opt(2030, 1, 1),
            status,
            created_at: Utc::now(),
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_paused_habit_never_due() {
        let h = habit(HabitStatus::Paused, Some(HabitInterval::EveryDay));
        assert!(!is_due_on(&h, &HashSet::new(), date(2026, 8, 26)));
    }

    #[test]
    fn test_past_goal_date_never_due() {
        let mut h = habit(HabitStatus::InProgress, Some(HabitInterval::EveryDay));
        h.goal_date = Some(date(2026, 8, 1));
        assert!(!is_due_on(&h, &HashSet::new(), date(2026, 8, 2)));
        assert!(is_due_on(&h, &HashSet::new(), date(2026, 8, 1)));
    }

    #[test]
    fn test_no_interval_due_daily() {
        let h = habit(HabitStatus::InProgress, None);
        assert!(is_due_on(&h, &HashSet::new(), date(2026, 8, 26)));
    }

    #[test]
    fn test_weekday_interval_matches_day() {
        let h = habit(HabitStatus::InProgress, Some(HabitInterval::Wednesday));
        // 2026-08-26 is a Wednesday.
        assert!(is_due_on(&h, &HashSet::new(), date(2026, 8, 26)));
        assert!(!is_due_on(&h, &HashSet::new(), date(2026, 8, 27)));
    }

    #[test]
    fn weekly_due_only_after_completion() {
        let h = habit(HabitStatus::InProgress, Some(HabitInterval::EveryWeek));
        let wednesday = date(2026, 8, 26);
        assert!(!is_due_on(&h, &HashSet::new(), wednesday));

        // Checkin on Monday of the same week flips it.
        let checkins: HashSet<_> = [date(2026, 8, 24)].into();
        assert!(is_due_on(&h, &checkins, wednesday));

        // A checkin in the previous week does not.
        let stale: HashSet<_> = [date(2026, 8, 23)].into();
        assert!(!is_due_on(&h, &stale, wednesday));
    }

    #[test]
    fn test_weekday_and_weekend_intervals() {
        let weekdays = habit(HabitStatus::InProgress, Some(HabitInterval::EveryWeekday));
        let weekends = habit(HabitStatus::InProgress, Some(HabitInterval::EveryWeekend));
        let friday = date(2026, 8, 28);
        let saturday = date(2026, 8, 29);
        assert!(is_due_on(&weekdays, &HashSet::new(), friday));
        assert!(!is_due_on(&weekdays, &HashSet::new(), saturday));
        assert!(!is_due_on(&weekends, &HashSet::new(), friday));
        assert!(is_due_on(&weekends, &HashSet::new(), saturday));
    }

    #[test]
    fn test_current_streak_counts_back_from_today() {
        let today = date(2026, 8, 26);
        let checkins: HashSet<_> = [
            date(2026, 8, 26),
            date(2026, 8, 25),
            date(2026, 8, 24),
            date(2026, 8, 22),
        ]
        .into();
        assert_eq!(current_streak(&checkins, today), 3);
    }

    #[test]
    fn test_current_streak_zero_without_today() {
        let checkins: HashSet<_> = [date(2026, 8, 25)].into();
        assert_eq!(current_streak(&checkins, date(2026, 8, 26)), 0);
    }

    #[test]
    fn test_longest_streak_resets_on_gap() {
        let days = [
            date(2026, 8, 1),
            date(2026, 8, 2),
            date(2026, 8, 3),
            date(2026, 8, 5),
            date(2026, 8, 6),
        ];
        assert_eq!(longest_streak(&days), 3);
    }

    #[test]
    fn test_longest_streak_final_run_counts() {
        let days = [date(2026, 8, 1), date(2026, 8, 3), date(2026, 8, 4), date(2026, 8, 5)];
        assert_eq!(longest_streak(&days), 3);
        assert_eq!(longest_streak(&[]), 0);
        assert_eq!(longest_streak(&[date(2026, 8, 1)]), 1);
    }

    #[test]
    fn test_completion_rate_full_and_empty_week() {
        let h = habit(HabitStatus::InProgress, Some(HabitInterval::EveryDay));
        let start = date(2026, 8, 17);
        let end = date(2026, 8, 23);
        let full: HashSet<_> = (0..7).map(|i| start + Days::new(i)).collect();
        assert_eq!(completion_rate(&h, &full, start, end), 100.0);
        assert_eq!(completion_rate(&h, &HashSet::new(), start, end), 0.0);
    }

    #[test]
    fn test_completion_rate_inactive_is_zero() {
        let h = habit(HabitStatus::Archived, Some(HabitInterval::EveryDay));
        let day = date(2026, 8, 26);
        let checkins: HashSet<_> = [day].into();
        assert_eq!(completion_rate(&h, &checkins, day, day), 0.0);
    }

    #[test]
    fn test_next_due_date() {
        // Wednesday.
        let from = date(2026, 8, 26);
        assert_eq!(next_due_date(Some(HabitInterval::EveryDay), from), from);
        assert_eq!(
            next_due_date(Some(HabitInterval::Wednesday), from),
            from
        );
        assert_eq!(
            next_due_date(Some(HabitInterval::Friday), from),
            date(2026, 8, 28)
        );
        assert_eq!(
            next_due_date(Some(HabitInterval::EveryWeek), from),
            date(2026, 8, 31)
        );
        assert_eq!(
            next_due_date(Some(HabitInterval::EveryWeekday), from),
            from
        );
        assert_eq!(
            next_due_date(Some(HabitInterval::EveryWeekday), date(2026, 8, 29)),
            date(2026, 8, 31)
        );
        assert_eq!(
            next_due_date(Some(HabitInterval::EveryWeekend), from),
            date(2026, 8, 29)
        );
        assert_eq!(
            next_due_date(Some(HabitInterval::EveryWeekend), date(2026, 8, 30)),
            date(2026, 8, 30)
        );
    }

    #[test]
    fn test_week_start() {
        assert_eq!(week_start(date(2026, 8, 26)), date(2026, 8, 24));
        assert_eq!(week_start(date(2026, 8, 24)), date(2026, 8, 24));
        assert_eq!(week_start(date(2026, 8, 30)), date(2026, 8, 24));
    }
}
