use super::Store;
use chrono::{Days, Duration, NaiveDate, Utc};
use stride_core::draft::{HabitDraft, TaskDraft};
use stride_core::error::StrideError;
use stride_core::model::{HabitInterval, HabitStatus, Priority, TaskStatus};

async fn test_store() -> Store {
    Store::in_memory().await.unwrap()
}

fn task_draft(title: &str) -> TaskDraft {
    TaskDraft::placeholder()
        .with_title(title)
        .with_priority(Priority::Normal)
}

fn habit_draft(title: &str) -> HabitDraft {
    HabitDraft::placeholder()
        .with_title(title)
        .with_interval(HabitInterval::EveryDay)
        .with_goal_date(NaiveDate::from_ymd_opt(2030, 1, 1).unwrap())
}

#[tokio::test]
async fn test_ensure_user_is_idempotent() {
    let store = test_store().await;
    let first = store.ensure_user(42, 100).await.unwrap();
    let second = store.ensure_user(42, 100).await.unwrap();
    assert_eq!(first.id, second.id);
    assert_eq!(store.all_chat_ids().await.unwrap(), vec![42]);
}

#[tokio::test]
async fn test_concurrent_registration_keeps_one_row() {
    let store = test_store().await;
    let (a, b) = tokio::join!(store.ensure_user(42, 100), store.ensure_user(42, 100));
    assert_eq!(a.unwrap().id, b.unwrap().id);
    assert_eq!(store.all_chat_ids().await.unwrap(), vec![42]);
}

#[tokio::test]
async fn test_task_lifecycle() {
    let store = test_store().await;
    let task = store.create_task(1, &task_draft("Write report")).await.unwrap();
    assert_eq!(task.status, TaskStatus::New);
    assert!(task.completed_at.is_none());

    let done = store.set_task_status(task.id, TaskStatus::Done).await.unwrap();
    assert_eq!(done.status, TaskStatus::Done);
    assert!(done.completed_at.is_some());

    // Reopening clears the completion timestamp.
    let reopened = store
        .set_task_status(task.id, TaskStatus::InProgress)
        .await
        .unwrap();
    assert!(reopened.completed_at.is_none());

    store.delete_task(task.id).await.unwrap();
    assert!(matches!(
        store.get_task(task.id).await,
        Err(StrideError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_missing_task_is_not_found() {
    let store = test_store().await;
    assert!(matches!(
        store.set_task_status(999, TaskStatus::Done).await,
        Err(StrideError::NotFound(_))
    ));
    assert!(matches!(
        store.delete_task(999).await,
        Err(StrideError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_deadline_window_excludes_done_and_out_of_range() {
    let store = test_store().await;
    let now = Utc::now();

    let soon = task_draft("soon").with_deadline(Some(now + Duration::hours(2)));
    let far = task_draft("far").with_deadline(Some(now + Duration::days(10)));
    let no_deadline = task_draft("whenever");
    let finished = task_draft("finished").with_deadline(Some(now + Duration::hours(1)));

    let soon = store.create_task(1, &soon).await.unwrap();
    store.create_task(1, &far).await.unwrap();
    store.create_task(1, &no_deadline).await.unwrap();
    let finished = store.create_task(1, &finished).await.unwrap();
    store.set_task_status(finished.id, TaskStatus::Done).await.unwrap();

    // Other chats never leak in.
    store
        .create_task(2, &task_draft("other").with_deadline(Some(now + Duration::hours(1))))
        .await
        .unwrap();

    let due = store
        .tasks_due_between(1, now, now + Duration::days(1))
        .await
        .unwrap();
    assert_eq!(due.len(), 1);
    assert_eq!(due[0].id, soon.id);
}

#[tokio::test]
async fn test_habit_lifecycle() {
    let store = test_store().await;
    let habit = store.create_habit(1, &habit_draft("Run")).await.unwrap();
    assert_eq!(habit.status, HabitStatus::InProgress);
    assert_eq!(habit.interval, Some(HabitInterval::EveryDay));

    let paused = store
        .set_habit_status(habit.id, HabitStatus::Paused)
        .await
        .unwrap();
    assert_eq!(paused.status, HabitStatus::Paused);

    let listed = store.list_habits(1).await.unwrap();
    assert_eq!(listed.len(), 1);
    assert!(store.list_habits(2).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_duplicate_checkin_rejected() {
    let store = test_store().await;
    let habit = store.create_habit(1, &habit_draft("Read")).await.unwrap();
    let day = NaiveDate::from_ymd_opt(2026, 8, 26).unwrap();

    store.checkin(habit.id, day).await.unwrap();
    assert!(matches!(
        store.checkin(habit.id, day).await,
        Err(StrideError::DuplicateCheckin { .. })
    ));

    // Another day is fine.
    store.checkin(habit.id, day + Days::new(1)).await.unwrap();
}

#[tokio::test]
async fn test_checkin_days_sorted_and_removable() {
    let store = test_store().await;
    let habit = store.create_habit(1, &habit_draft("Stretch")).await.unwrap();
    let base = NaiveDate::from_ymd_opt(2026, 8, 20).unwrap();

    for offset in [3u64, 0, 1] {
        store.checkin(habit.id, base + Days::new(offset)).await.unwrap();
    }

    let days = store.checkin_days(habit.id).await.unwrap();
    assert_eq!(days, vec![base, base + Days::new(1), base + Days::new(3)]);

    store.remove_checkin(habit.id, base + Days::new(1)).await.unwrap();
    assert_eq!(store.checkin_days(habit.id).await.unwrap().len(), 2);

    // Removing an absent checkin is a no-op.
    store.remove_checkin(habit.id, base + Days::new(5)).await.unwrap();
}

#[tokio::test]
async fn test_checkin_on_missing_habit_is_not_found() {
    let store = test_store().await;
    let day = NaiveDate::from_ymd_opt(2026, 8, 26).unwrap();
    assert!(matches!(
        store.checkin(404, day).await,
        Err(StrideError::NotFound(_))
    ));
}
