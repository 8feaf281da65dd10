//! Screen rendering: message texts and inline keyboards.

use stride_core::draft::{HabitDraft, TaskDraft, DEADLINE_FORMAT, GOAL_DATE_FORMAT};
use stride_core::event::Action;
use stride_core::message::{Keyboard, OutboundMessage};
use stride_core::model::{Habit, HabitStatus, Task, TaskStatus, ALL_INTERVALS};

pub fn status_label(status: TaskStatus) -> &'static str {
    match status {
        TaskStatus::New => "New",
        TaskStatus::InProgress => "In progress",
        TaskStatus::Done => "Done",
    }
}

pub fn habit_status_label(status: HabitStatus) -> &'static str {
    match status {
        HabitStatus::InProgress => "In progress",
        HabitStatus::Paused => "Paused",
        HabitStatus::Completed => "Completed",
        HabitStatus::Archived => "Archived",
    }
}

fn home_keyboard() -> Keyboard {
    Keyboard::builder()
        .button("Tasks", Action::TasksMenu.key())
        .button("Habits", Action::HabitsMenu.key())
        .row()
        .button("Reminders", Action::NotificationToggle.key())
        .build()
}

pub fn welcome() -> OutboundMessage {
    OutboundMessage::with_keyboard(
        "Hi! I help you track tasks and habits.\n\
         Pick a section to get started.",
        home_keyboard(),
    )
}

pub fn home_menu() -> OutboundMessage {
    OutboundMessage::with_keyboard("What would you like to manage?", home_keyboard())
}

pub fn tasks_menu() -> OutboundMessage {
    let kb = Keyboard::builder()
        .button("New task", Action::TasksCreateNew.key())
        .row()
        .button("Today", Action::TasksGetToday.key())
        .button("Tomorrow", Action::TasksGetTomorrow.key())
        .row()
        .button("This week", Action::TasksGetWeek.key())
        .button("All tasks", Action::TasksGetAll.key())
        .row()
        .button("Back", Action::HomePage.key())
        .build();
    OutboundMessage::with_keyboard("Tasks", kb)
}

pub fn habits_menu() -> OutboundMessage {
    let kb = Keyboard::builder()
        .button("New habit", Action::HabitsCreateNew.key())
        .row()
        .button("Today", Action::HabitsGetToday.key())
        .button("This week", Action::HabitsGetWeek.key())
        .row()
        .button("All habits", Action::HabitsGetAll.key())
        .button("Streaks", Action::HabitsStreaks.key())
        .row()
        .button("Back", Action::HomePage.key())
        .build();
    OutboundMessage::with_keyboard("Habits", kb)
}

/// Tasks menu prefixed with a one-line outcome notice.
pub fn tasks_menu_with_notice(notice: &str) -> OutboundMessage {
    let mut msg = tasks_menu();
    msg.text = format!("{notice}\n\n{}", msg.text);
    msg
}

/// Habits menu prefixed with a one-line outcome notice.
pub fn habits_menu_with_notice(notice: &str) -> OutboundMessage {
    let mut msg = habits_menu();
    msg.text = format!("{notice}\n\n{}", msg.text);
    msg
}

/// Shown for free text when no question is pending.
pub fn fallback_hint() -> OutboundMessage {
    OutboundMessage::with_keyboard(
        "I wasn't expecting a reply right now. Use the menu below.",
        home_keyboard(),
    )
}

fn format_deadline(task: &Task) -> String {
    match task.deadline {
        Some(dt) => dt.format(DEADLINE_FORMAT).to_string(),
        None => "-".to_string(),
    }
}

/// Draft summary shown between wizard steps, with field-edit buttons.
pub fn task_draft_summary(draft: &TaskDraft) -> OutboundMessage {
    let deadline = match draft.deadline {
        Some(dt) => dt.format(DEADLINE_FORMAT).to_string(),
        None => "-".to_string(),
    };
    let text = format!(
        "New task\n\nTitle: {}\nDescription: {}\nDeadline: {}\nPriority: {}",
        draft.title,
        draft.description,
        deadline,
        draft.priority.label(),
    );
    let kb = Keyboard::builder()
        .button("Title", Action::TasksChangeTitle.key())
        .button("Description", Action::TasksChangeDescription.key())
        .row()
        .button("Deadline", Action::TasksChangeDeadline.key())
        .row()
        .button("Create", Action::TasksCreateConfirm.key())
        .button("Cancel", Action::TasksMenu.key())
        .build();
    OutboundMessage::with_keyboard(text, kb)
}

pub fn habit_draft_summary(draft: &HabitDraft) -> OutboundMessage {
    let interval = match draft.interval {
        Some(i) => i.label().to_string(),
        None => "-".to_string(),
    };
    let goal = match draft.goal_date {
        Some(d) => d.format(GOAL_DATE_FORMAT).to_string(),
        None => "-".to_string(),
    };
    let text = format!(
        "New habit\n\nTitle: {}\nDescription: {}\nRepeat: {}\nGoal date: {}",
        draft.title, draft.description, interval, goal,
    );
    let kb = Keyboard::builder()
        .button("Title", Action::HabitsChangeTitle.key())
        .button("Description", Action::HabitsChangeDescription.key())
        .row()
        .button("Repeat", Action::HabitsChangeInterval.key())
        .button("Goal date", Action::HabitsChangeGoalDate.key())
        .row()
        .button("Create", Action::HabitsCreateConfirm.key())
        .button("Cancel", Action::HabitsMenu.key())
        .build();
    OutboundMessage::with_keyboard(text, kb)
}

/// Prompt listing the accepted repeat options.
pub fn interval_prompt() -> OutboundMessage {
    let options: Vec<&str> = ALL_INTERVALS.iter().map(|i| i.label()).collect();
    OutboundMessage::text(format!(
        "How often should this repeat? Reply with one of:\n{}",
        options.join(", ")
    ))
}

/// One button per task, payload addressing it.
pub fn task_list(heading: &str, tasks: &[Task]) -> OutboundMessage {
    if tasks.is_empty() {
        let kb = Keyboard::builder().button("Back", Action::TasksMenu.key()).build();
        return OutboundMessage::with_keyboard(format!("{heading}\n\nNothing here."), kb);
    }
    let mut builder = Keyboard::builder();
    for task in tasks {
        let label = format!("{} [{}]", task.title, status_label(task.status));
        builder = builder
            .button(label, Action::TasksPick.payload(Some(task.id)))
            .row();
    }
    let kb = builder.button("Back", Action::TasksMenu.key()).build();
    OutboundMessage::with_keyboard(heading.to_string(), kb)
}

pub fn habit_list(heading: &str, habits: &[Habit]) -> OutboundMessage {
    if habits.is_empty() {
        let kb = Keyboard::builder()
            .button("Back", Action::HabitsMenu.key())
            .build();
        return OutboundMessage::with_keyboard(format!("{heading}\n\nNothing here."), kb);
    }
    let mut builder = Keyboard::builder();
    for habit in habits {
        let label = format!("{} [{}]", habit.title, habit_status_label(habit.status));
        builder = builder
            .button(label, Action::HabitsPick.payload(Some(habit.id)))
            .row();
    }
    let kb = builder.button("Back", Action::HabitsMenu.key()).build();
    OutboundMessage::with_keyboard(heading.to_string(), kb)
}

/// Plain text screen with a single back-to-habits button.
pub fn habits_back(text: String) -> OutboundMessage {
    let kb = Keyboard::builder()
        .button("Back", Action::HabitsMenu.key())
        .build();
    OutboundMessage::with_keyboard(text, kb)
}

/// Single-task screen with status and delete controls.
pub fn task_view(task: &Task) -> OutboundMessage {
    let text = format!(
        "{}\n\n{}\nDeadline: {}\nPriority: {}\nStatus: {}",
        task.title,
        task.description,
        format_deadline(task),
        task.priority.label(),
        status_label(task.status),
    );
    let id = Some(task.id);
    let kb = Keyboard::builder()
        .button("Start", Action::TasksSetInProgress.payload(id))
        .button("Done", Action::TasksSetCompleted.payload(id))
        .row()
        .button("Reopen", Action::TasksSetUncompleted.payload(id))
        .button("Delete", Action::TasksDelete.payload(id))
        .row()
        .button("Back", Action::TasksGetAll.key())
        .build();
    OutboundMessage::with_keyboard(text, kb)
}

/// Single-habit screen with checkin and lifecycle controls.
pub fn habit_view(habit: &Habit, checked_today: bool) -> OutboundMessage {
    let interval = match habit.interval {
        Some(i) => i.label().to_string(),
        None => "Every day".to_string(),
    };
    let goal = match habit.goal_date {
        Some(d) => d.format(GOAL_DATE_FORMAT).to_string(),
        None => "-".to_string(),
    };
    let today = if checked_today { "done" } else { "not yet" };
    let text = format!(
        "{}\n\n{}\nRepeat: {}\nGoal date: {}\nStatus: {}\nToday: {}",
        habit.title,
        habit.description,
        interval,
        goal,
        habit_status_label(habit.status),
        today,
    );
    let id = Some(habit.id);
    let mut builder = Keyboard::builder();
    if checked_today {
        builder = builder.button("Undo today", Action::HabitsMarkUncompleted.payload(id));
    } else {
        builder = builder.button("Done today", Action::HabitsMarkCompleted.payload(id));
    }
    let kb = builder
        .row()
        .button("Pause", Action::HabitsSetPaused.payload(id))
        .button("Resume", Action::HabitsSetInProgress.payload(id))
        .row()
        .button("Complete", Action::HabitsSetCompleted.payload(id))
        .button("Archive", Action::HabitsSetArchived.payload(id))
        .row()
        .button("Back", Action::HabitsGetAll.key())
        .build();
    OutboundMessage::with_keyboard(text, kb)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use stride_core::model::Priority;

    fn task(id: i64, title: &str, status: TaskStatus) -> Task {
        Task {
            id,
            chat_id: 1,
            title: title.into(),
            description: String::new(),
            deadline: None,
            priority: Priority::Normal,
            status,
            created_at: Utc::now(),
            completed_at: None,
        }
    }

    #[test]
    fn test_task_list_buttons_address_tasks() {
        let tasks = vec![task(3, "Call bank", TaskStatus::New)];
        let msg = task_list("All tasks", &tasks);
        let kb = msg.keyboard.unwrap();
        assert_eq!(kb.buttons[0][0].payload, "tasks-id:3");
        // Last row is always the back button.
        assert_eq!(kb.buttons.last().unwrap()[0].payload, "tasks-menu");
    }

    #[test]
    fn test_empty_list_still_has_back() {
        let msg = task_list("Today", &[]);
        assert!(msg.text.contains("Nothing here"));
        let kb = msg.keyboard.unwrap();
        assert_eq!(kb.buttons.len(), 1);
    }

    #[test]
    fn test_habit_view_checkin_button_flips() {
        let habit = Habit {
            id: 5,
            chat_id: 1,
            title: "Run".into(),
            description: String::new(),
            interval: None,
            goal_date: None,
            status: HabitStatus::InProgress,
            created_at: Utc::now(),
        };
        let fresh = habit_view(&habit, false);
        assert_eq!(
            fresh.keyboard.unwrap().buttons[0][0].payload,
            "habits-mark-as-completed:5"
        );
        let done = habit_view(&habit, true);
        assert_eq!(
            done.keyboard.unwrap().buttons[0][0].payload,
            "habits-mark-as-uncompleted:5"
        );
    }

    #[test]
    fn test_draft_summary_shows_placeholders() {
        let msg = task_draft_summary(&TaskDraft::placeholder());
        assert!(msg.text.contains("Title: ..."));
        assert!(msg.text.contains("Deadline: -"));
    }
}
