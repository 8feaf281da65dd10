//! Dispatch tables.
//!
//! Both routing decisions are data: a marker table for free text and an
//! action table for callbacks. Adding a screen means adding a row, not a
//! branch.

use stride_core::event::Action;
use stride_core::marker::Marker;
use stride_core::model::{HabitStatus, TaskStatus};

/// Editable task draft fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskField {
    Title,
    Description,
    Deadline,
}

/// Editable habit draft fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HabitField {
    Title,
    Description,
    Interval,
    GoalDate,
}

/// Date windows for task list views.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskWindow {
    Today,
    Tomorrow,
    Week,
    All,
}

/// Views over a chat's habits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HabitWindow {
    All,
    Today,
    Week,
}

/// What a free-text reply means under a given marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextRoute {
    /// Run the extractor over the whole message.
    ExtractTask,
    TaskField(TaskField),
    HabitField(HabitField),
}

/// What a callback action does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackRoute {
    HomeMenu,
    TasksMenu,
    HabitsMenu,
    ReminderInfo,

    StartTaskWizard,
    TaskFieldPrompt(TaskField),
    ConfirmTask,
    TaskList(TaskWindow),
    PickTask,
    TaskStatus(TaskStatus),
    DeleteTask,

    StartHabitWizard,
    HabitFieldPrompt(HabitField),
    ConfirmHabit,
    HabitList(HabitWindow),
    HabitStreaks,
    PickHabit,
    HabitStatus(HabitStatus),
    MarkHabit { completed: bool },
}

/// Markers under which free text is meaningful. Menu and list markers are
/// deliberately absent: text sent there falls through to the hint.
const MARKER_ROUTES: &[(Marker, TextRoute)] = &[
    (Marker::CreateTask, TextRoute::ExtractTask),
    (Marker::ChangeTaskTitle, TextRoute::TaskField(TaskField::Title)),
    (
        Marker::ChangeTaskDescription,
        TextRoute::TaskField(TaskField::Description),
    ),
    (
        Marker::ChangeTaskDeadline,
        TextRoute::TaskField(TaskField::Deadline),
    ),
    (Marker::CreateHabit, TextRoute::HabitField(HabitField::Title)),
    (
        Marker::ChangeHabitTitle,
        TextRoute::HabitField(HabitField::Title),
    ),
    (
        Marker::ChangeHabitDescription,
        TextRoute::HabitField(HabitField::Description),
    ),
    (
        Marker::ChangeHabitInterval,
        TextRoute::HabitField(HabitField::Interval),
    ),
    (
        Marker::ChangeHabitGoalDate,
        TextRoute::HabitField(HabitField::GoalDate),
    ),
];

pub fn route_text(marker: Marker) -> Option<TextRoute> {
    MARKER_ROUTES
        .iter()
        .find(|(m, _)| *m == marker)
        .map(|(_, route)| *route)
}

const ACTION_ROUTES: &[(Action, CallbackRoute)] = &[
    (Action::HomePage, CallbackRoute::HomeMenu),
    (Action::TasksMenu, CallbackRoute::TasksMenu),
    (Action::HabitsMenu, CallbackRoute::HabitsMenu),
    (Action::NotificationToggle, CallbackRoute::ReminderInfo),
    (Action::TasksCreateNew, CallbackRoute::StartTaskWizard),
    (
        Action::TasksChangeTitle,
        CallbackRoute::TaskFieldPrompt(TaskField::Title),
    ),
    (
        Action::TasksChangeDescription,
        CallbackRoute::TaskFieldPrompt(TaskField::Description),
    ),
    (
        Action::TasksChangeDeadline,
        CallbackRoute::TaskFieldPrompt(TaskField::Deadline),
    ),
    (Action::TasksCreateConfirm, CallbackRoute::ConfirmTask),
    (Action::TasksGetToday, CallbackRoute::TaskList(TaskWindow::Today)),
    (
        Action::TasksGetTomorrow,
        CallbackRoute::TaskList(TaskWindow::Tomorrow),
    ),
    (Action::TasksGetWeek, CallbackRoute::TaskList(TaskWindow::Week)),
    (Action::TasksGetAll, CallbackRoute::TaskList(TaskWindow::All)),
    (Action::TasksPick, CallbackRoute::PickTask),
    (
        Action::TasksSetUncompleted,
        CallbackRoute::TaskStatus(TaskStatus::New),
    ),
    (
        Action::TasksSetInProgress,
        CallbackRoute::TaskStatus(TaskStatus::InProgress),
    ),
    (
        Action::TasksSetCompleted,
        CallbackRoute::TaskStatus(TaskStatus::Done),
    ),
    (Action::TasksDelete, CallbackRoute::DeleteTask),
    (Action::HabitsCreateNew, CallbackRoute::StartHabitWizard),
    (
        Action::HabitsChangeTitle,
        CallbackRoute::HabitFieldPrompt(HabitField::Title),
    ),
    (
        Action::HabitsChangeDescription,
        CallbackRoute::HabitFieldPrompt(HabitField::Description),
    ),
    (
        Action::HabitsChangeInterval,
        CallbackRoute::HabitFieldPrompt(HabitField::Interval),
    ),
    (
        Action::HabitsChangeGoalDate,
        CallbackRoute::HabitFieldPrompt(HabitField::GoalDate),
    ),
    (Action::HabitsCreateConfirm, CallbackRoute::ConfirmHabit),
    (Action::HabitsGetAll, CallbackRoute::HabitList(HabitWindow::All)),
    (
        Action::HabitsGetToday,
        CallbackRoute::HabitList(HabitWindow::Today),
    ),
    (
        Action::HabitsGetWeek,
        CallbackRoute::HabitList(HabitWindow::Week),
    ),
    (Action::HabitsStreaks, CallbackRoute::HabitStreaks),
    (Action::HabitsPick, CallbackRoute::PickHabit),
    (
        Action::HabitsSetCompleted,
        CallbackRoute::HabitStatus(HabitStatus::Completed),
    ),
    (
        Action::HabitsSetArchived,
        CallbackRoute::HabitStatus(HabitStatus::Archived),
    ),
    (
        Action::HabitsSetPaused,
        CallbackRoute::HabitStatus(HabitStatus::Paused),
    ),
    (
        Action::HabitsSetInProgress,
        CallbackRoute::HabitStatus(HabitStatus::InProgress),
    ),
    (
        Action::HabitsMarkCompleted,
        CallbackRoute::MarkHabit { completed: true },
    ),
    (
        Action::HabitsMarkUncompleted,
        CallbackRoute::MarkHabit { completed: false },
    ),
];

pub fn route_action(action: Action) -> Option<CallbackRoute> {
    ACTION_ROUTES
        .iter()
        .find(|(a, _)| *a == action)
        .map(|(_, route)| *route)
}
