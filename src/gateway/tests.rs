use super::*;
use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Mutex as StdMutex;
use std::time::Duration;

use stride_core::message::SentMessage;
use stride_core::model::{HabitStatus, ParsedTask, Priority, TaskStatus};
use stride_memory::{cache, KvCache, MemoryCache};

struct MockMessenger {
    sent: StdMutex<Vec<(i64, OutboundMessage)>>,
    edited: StdMutex<Vec<(String, OutboundMessage)>>,
    counter: AtomicI64,
}

impl MockMessenger {
    fn new() -> Self {
        Self {
            sent: StdMutex::new(Vec::new()),
            edited: StdMutex::new(Vec::new()),
            counter: AtomicI64::new(0),
        }
    }

    fn last_sent(&self) -> Option<(i64, OutboundMessage)> {
        self.sent.lock().unwrap().last().cloned()
    }

    fn last_edited(&self) -> Option<(String, OutboundMessage)> {
        self.edited.lock().unwrap().last().cloned()
    }

    fn sent_count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }
}

#[async_trait]
impl Messenger for MockMessenger {
    async fn send(
        &self,
        chat_id: i64,
        body: OutboundMessage,
    ) -> Result<SentMessage, StrideError> {
        let n = self.counter.fetch_add(1, Ordering::SeqCst);
        self.sent.lock().unwrap().push((chat_id, body));
        Ok(SentMessage {
            message_id: format!("mid.{n}"),
            seq: n,
        })
    }

    async fn edit(&self, message_id: &str, body: OutboundMessage) -> Result<(), StrideError> {
        self.edited
            .lock()
            .unwrap()
            .push((message_id.to_string(), body));
        Ok(())
    }
}

struct MockExtractor;

#[async_trait]
impl Extractor for MockExtractor {
    async fn extract_task(&self, _text: &str) -> Result<ParsedTask, StrideError> {
        Ok(ParsedTask {
            title: "Buy milk".into(),
            description: "two liters".into(),
            deadline: Some(Utc.with_ymd_and_hms(2026, 8, 27, 18, 0, 0).unwrap()),
            priority: Priority::High,
        })
    }

    async fn motivation(&self, streak: u32) -> Result<String, StrideError> {
        Ok(format!("Nice, {streak} days!"))
    }
}

async fn test_gateway(extractor: Option<Arc<dyn Extractor>>) -> (Gateway, Arc<MockMessenger>) {
    let messenger = Arc::new(MockMessenger::new());
    let kv: Arc<dyn KvCache> = Arc::new(MemoryCache::new());
    let gateway = Gateway::new(
        messenger.clone(),
        extractor,
        Store::in_memory().await.unwrap(),
        ContextStore::new(kv.clone(), Duration::from_secs(3600)),
        DraftCache::new(kv.clone(), cache::PENDING_TASK_PREFIX, Duration::from_secs(3600)),
        DraftCache::new(kv.clone(), cache::PENDING_HABIT_PREFIX, Duration::from_secs(3600)),
        SweepConfig::default(),
    );
    (gateway, messenger)
}

fn text_update(chat_id: i64, text: &str) -> String {
    serde_json::json!({
        "update_type": "message_created",
        "message": {
            "body": {"mid": "u1", "seq": 1, "text": text},
            "recipient": {"chat_id": chat_id},
            "sender": {"user_id": 100}
        }
    })
    .to_string()
}

fn callback_update(chat_id: i64, payload: &str) -> String {
    serde_json::json!({
        "update_type": "message_callback",
        "callback": {
            "payload": payload,
            "user": {"user_id": 100},
            "message": {"recipient": {"chat_id": chat_id}}
        }
    })
    .to_string()
}

#[tokio::test]
async fn test_start_registers_user_and_welcomes() {
    let (gw, messenger) = test_gateway(None).await;
    gw.dispatch(&text_update(42, "/start")).await;

    assert_eq!(gw.store.all_chat_ids().await.unwrap(), vec![42]);
    let (chat, msg) = messenger.last_sent().unwrap();
    assert_eq!(chat, 42);
    assert!(msg.text.contains("tasks and habits"));
    assert_eq!(
        gw.context.get(42).await.unwrap().marker,
        Some(Marker::Welcome)
    );
}

#[tokio::test]
async fn test_free_text_without_marker_gets_hint() {
    let (gw, messenger) = test_gateway(None).await;
    gw.dispatch(&text_update(42, "hello?")).await;

    let (_, msg) = messenger.last_sent().unwrap();
    assert!(msg.text.contains("wasn't expecting"));
}

#[tokio::test]
async fn test_habit_wizard_end_to_end() {
    let (gw, messenger) = test_gateway(None).await;

    gw.dispatch(&callback_update(42, "habits-create-new")).await;
    assert_eq!(
        gw.context.get(42).await.unwrap().marker,
        Some(Marker::CreateHabit)
    );

    gw.dispatch(&text_update(42, "Run")).await;
    let draft = gw.habit_drafts.get(42).await.unwrap();
    assert_eq!(draft.title, "Run");
    // The prompt message was edited into the draft summary.
    let (_, summary) = messenger.last_edited().unwrap();
    assert!(summary.text.contains("Title: Run"));

    gw.dispatch(&callback_update(42, "habits-change-interval"))
        .await;
    gw.dispatch(&text_update(42, "Every day")).await;
    gw.dispatch(&callback_update(42, "habits-change-goal-date"))
        .await;
    gw.dispatch(&text_update(42, "31.12.2026")).await;

    gw.dispatch(&callback_update(42, "habits-create-confirm"))
        .await;

    let habits = gw.store.list_habits(42).await.unwrap();
    assert_eq!(habits.len(), 1);
    assert_eq!(habits[0].title, "Run");
    assert_eq!(habits[0].status, HabitStatus::InProgress);
    // Draft is gone and the wizard marker is no longer pending.
    assert!(gw.habit_drafts.get(42).await.is_none());
    assert_eq!(
        gw.context.get(42).await.unwrap().marker,
        Some(Marker::HabitMenu)
    );
}

#[tokio::test]
async fn test_habit_confirm_requires_all_fields() {
    let (gw, messenger) = test_gateway(None).await;
    gw.dispatch(&callback_update(42, "habits-create-new")).await;
    gw.dispatch(&text_update(42, "Run")).await;
    gw.dispatch(&callback_update(42, "habits-create-confirm"))
        .await;

    assert!(gw.store.list_habits(42).await.unwrap().is_empty());
    let (_, msg) = messenger.last_sent().unwrap();
    assert!(msg.text.contains("required fields"));
    assert!(msg.text.contains("interval"));
    // Draft survives a rejected confirm.
    assert!(gw.habit_drafts.get(42).await.is_some());
}

#[tokio::test]
async fn test_unknown_interval_reply_reprompts() {
    let (gw, messenger) = test_gateway(None).await;
    gw.dispatch(&callback_update(42, "habits-create-new")).await;
    gw.dispatch(&text_update(42, "Run")).await;
    gw.dispatch(&callback_update(42, "habits-change-interval"))
        .await;

    gw.dispatch(&text_update(42, "fortnightly")).await;

    let (_, msg) = messenger.last_sent().unwrap();
    assert!(msg.text.contains("don't know that interval"));
    assert!(msg.text.contains("Every day"));
    // The question stays open and the draft is untouched.
    assert_eq!(
        gw.context.get(42).await.unwrap().marker,
        Some(Marker::ChangeHabitInterval)
    );
    assert!(gw.habit_drafts.get(42).await.unwrap().interval.is_none());
}

#[tokio::test]
async fn test_callback_with_empty_id_is_noop() {
    let (gw, messenger) = test_gateway(None).await;
    let task = gw
        .store
        .create_task(42, &stride_core::draft::TaskDraft::placeholder().with_title("x"))
        .await
        .unwrap();

    gw.dispatch(&callback_update(42, "tasks-delete:")).await;

    assert_eq!(messenger.sent_count(), 0);
    assert!(gw.store.get_task(task.id).await.is_ok());
}

#[tokio::test]
async fn test_task_wizard_with_extractor() {
    let (gw, _messenger) = test_gateway(Some(Arc::new(MockExtractor))).await;

    gw.dispatch(&callback_update(42, "tasks-create-new")).await;
    gw.dispatch(&text_update(42, "buy milk tomorrow evening, important"))
        .await;

    let draft = gw.task_drafts.get(42).await.unwrap();
    assert_eq!(draft.title, "Buy milk");
    assert_eq!(draft.priority, Priority::High);
    assert!(draft.deadline.is_some());

    gw.dispatch(&callback_update(42, "tasks-create-confirm"))
        .await;

    let tasks = gw.store.list_tasks(42).await.unwrap();
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0].status, TaskStatus::New);
    assert!(gw.task_drafts.get(42).await.is_none());
}

#[tokio::test]
async fn test_bad_deadline_keeps_question_open() {
    let (gw, messenger) = test_gateway(None).await;
    gw.dispatch(&callback_update(42, "tasks-create-new")).await;
    gw.dispatch(&callback_update(42, "tasks-change-deadline"))
        .await;

    gw.dispatch(&text_update(42, "whenever")).await;

    let (_, msg) = messenger.last_sent().unwrap();
    assert!(msg.text.contains("DD.MM.YYYY HH:MM"));
    assert_eq!(
        gw.context.get(42).await.unwrap().marker,
        Some(Marker::ChangeTaskDeadline)
    );
    assert!(gw.task_drafts.get(42).await.unwrap().deadline.is_none());
}

#[tokio::test]
async fn test_duplicate_checkin_gets_soft_message() {
    let (gw, messenger) = test_gateway(None).await;
    let habit = gw
        .store
        .create_habit(
            42,
            &stride_core::draft::HabitDraft::placeholder().with_title("Run"),
        )
        .await
        .unwrap();

    let payload = format!("habits-mark-as-completed:{}", habit.id);
    gw.dispatch(&callback_update(42, &payload)).await;
    gw.dispatch(&callback_update(42, &payload)).await;

    let (_, msg) = messenger.last_sent().unwrap();
    assert!(msg.text.contains("Already marked done today"));
    assert_eq!(gw.store.checkin_days(habit.id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_missing_task_gets_soft_message() {
    let (gw, messenger) = test_gateway(None).await;
    gw.dispatch(&callback_update(42, "tasks-id:404")).await;

    let (_, msg) = messenger.last_sent().unwrap();
    assert!(msg.text.contains("no longer exists"));
}

#[tokio::test]
async fn test_task_status_roundtrip_via_callbacks() {
    let (gw, messenger) = test_gateway(None).await;
    let task = gw
        .store
        .create_task(
            42,
            &stride_core::draft::TaskDraft::placeholder().with_title("Ship it"),
        )
        .await
        .unwrap();

    gw.dispatch(&callback_update(42, &format!("tasks-id:{}", task.id)))
        .await;
    gw.dispatch(&callback_update(
        42,
        &format!("tasks-set-status-completed:{}", task.id),
    ))
    .await;

    assert_eq!(
        gw.store.get_task(task.id).await.unwrap().status,
        TaskStatus::Done
    );
    // The view was refreshed in place.
    let (_, view) = messenger.last_edited().unwrap();
    assert!(view.text.contains("Status: Done"));
}

#[tokio::test]
async fn test_garbage_update_is_ignored() {
    let (gw, messenger) = test_gateway(None).await;
    gw.dispatch("{{{").await;
    gw.dispatch(r#"{"update_type": "bot_started"}"#).await;
    assert_eq!(messenger.sent_count(), 0);
}
