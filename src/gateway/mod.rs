//! Gateway — the dialog state machine connecting the channel, the caches,
//! and durable storage.
//!
//! Every inbound update is classified, routed through the dispatch tables
//! in [`routing`], and handled in its own task. Handler failures are
//! contained per turn: the user gets a soft message and the loop moves on.

mod habits;
mod routing;
mod sweeps;
mod tasks;

#[cfg(test)]
mod tests;

use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use stride_channels::ui;
use stride_core::config::SweepConfig;
use stride_core::draft::{HabitDraft, TaskDraft};
use stride_core::error::StrideError;
use stride_core::event::{classify, Action, InboundEvent};
use stride_core::marker::{Marker, MessageRef};
use stride_core::message::OutboundMessage;
use stride_core::traits::{Extractor, Messenger};
use stride_memory::{ContextStore, DraftCache, Store};

use routing::{route_action, route_text, CallbackRoute, TextRoute};

pub struct Gateway {
    pub(crate) messenger: Arc<dyn Messenger>,
    pub(crate) extractor: Option<Arc<dyn Extractor>>,
    pub(crate) store: Store,
    pub(crate) context: ContextStore,
    pub(crate) task_drafts: DraftCache<TaskDraft>,
    pub(crate) habit_drafts: DraftCache<HabitDraft>,
    pub(crate) sweeps: SweepConfig,
}

impl Gateway {
    pub fn new(
        messenger: Arc<dyn Messenger>,
        extractor: Option<Arc<dyn Extractor>>,
        store: Store,
        context: ContextStore,
        task_drafts: DraftCache<TaskDraft>,
        habit_drafts: DraftCache<HabitDraft>,
        sweeps: SweepConfig,
    ) -> Self {
        Self {
            messenger,
            extractor,
            store,
            context,
            task_drafts,
            habit_drafts,
            sweeps,
        }
    }

    /// Run the main event loop until ctrl-c.
    pub async fn run(self: Arc<Self>, mut updates: mpsc::Receiver<String>) -> anyhow::Result<()> {
        info!(
            "Stride gateway running | nlp: {} | sweeps: {}",
            if self.extractor.is_some() { "on" } else { "off" },
            if self.sweeps.enabled { "on" } else { "off" },
        );

        let mut sweep_handles = Vec::new();
        if self.sweeps.enabled {
            let gw = self.clone();
            sweep_handles.push(tokio::spawn(async move { gw.reminder_loop().await }));
            let gw = self.clone();
            sweep_handles.push(tokio::spawn(async move { gw.motivation_loop().await }));
            let gw = self.clone();
            sweep_handles.push(tokio::spawn(async move { gw.summary_loop().await }));
        }

        loop {
            tokio::select! {
                maybe = updates.recv() => {
                    match maybe {
                        Some(raw) => {
                            let gw = self.clone();
                            tokio::spawn(async move {
                                gw.dispatch(&raw).await;
                            });
                        }
                        None => {
                            info!("Update stream closed");
                            break;
                        }
                    }
                }
                _ = tokio::signal::ctrl_c() => {
                    info!("Received shutdown signal");
                    break;
                }
            }
        }

        for handle in sweep_handles {
            handle.abort();
        }
        Ok(())
    }

    /// Handle one raw update. Never panics the loop: every failure ends
    /// here as a log line plus a soft message to the chat.
    pub(crate) async fn dispatch(&self, raw: &str) {
        match classify(raw) {
            InboundEvent::Command {
                name,
                chat_id,
                user_id,
            } => {
                if let Err(e) = self.handle_command(&name, chat_id, user_id).await {
                    self.report_failure(chat_id, &e).await;
                }
            }
            InboundEvent::FreeText { text, chat_id, .. } => {
                if let Err(e) = self.handle_text(&text, chat_id).await {
                    self.report_failure(chat_id, &e).await;
                }
            }
            InboundEvent::Callback {
                action,
                entity_id,
                chat_id,
                ..
            } => {
                if let Err(e) = self.handle_callback(action, entity_id, chat_id).await {
                    self.report_failure(chat_id, &e).await;
                }
            }
            InboundEvent::Unrecognized => {
                debug!("Ignoring unrecognized update");
            }
        }
    }

    async fn report_failure(&self, chat_id: i64, err: &StrideError) {
        error!("Turn failed for chat {chat_id}: {err}");
        let apology = OutboundMessage::text("Something went wrong, please try again.");
        if let Err(e) = self.messenger.send(chat_id, apology).await {
            error!("Failed to deliver failure notice to chat {chat_id}: {e}");
        }
    }

    async fn handle_command(
        &self,
        name: &str,
        chat_id: i64,
        user_id: i64,
    ) -> Result<(), StrideError> {
        match name {
            "start" => {
                self.store.ensure_user(chat_id, user_id).await?;
                self.send_tracked(chat_id, ui::welcome(), Some(Marker::Welcome))
                    .await
            }
            other => {
                debug!("Unknown command /{other} from chat {chat_id}");
                self.send_tracked(chat_id, ui::fallback_hint(), Some(Marker::HomeMenu))
                    .await
            }
        }
    }

    /// Free text is interpreted against the marker of the bot's last
    /// message in this chat.
    async fn handle_text(&self, text: &str, chat_id: i64) -> Result<(), StrideError> {
        let marker = self.context.get(chat_id).await.and_then(|m| m.marker);

        let Some(route) = marker.and_then(route_text) else {
            debug!("Free text with no pending question in chat {chat_id}");
            return self
                .send_tracked(chat_id, ui::fallback_hint(), Some(Marker::HomeMenu))
                .await;
        };

        match route {
            TextRoute::ExtractTask => self.extract_task_from_text(text, chat_id).await,
            TextRoute::TaskField(field) => self.apply_task_field(field, text, chat_id).await,
            TextRoute::HabitField(field) => self.apply_habit_field(field, text, chat_id).await,
        }
    }

    async fn handle_callback(
        &self,
        action: Action,
        entity_id: Option<i64>,
        chat_id: i64,
    ) -> Result<(), StrideError> {
        if action.takes_entity_id() && entity_id.is_none() {
            warn!("Callback {} without entity id in chat {chat_id}", action.key());
            return Ok(());
        }

        let Some(route) = route_action(action) else {
            warn!("No route for action {} in chat {chat_id}", action.key());
            return self
                .send_tracked(chat_id, ui::fallback_hint(), Some(Marker::HomeMenu))
                .await;
        };

        match route {
            CallbackRoute::HomeMenu => {
                self.send_tracked(chat_id, ui::home_menu(), Some(Marker::HomeMenu))
                    .await
            }
            CallbackRoute::TasksMenu => {
                self.send_tracked(chat_id, ui::tasks_menu(), Some(Marker::TaskMenu))
                    .await
            }
            CallbackRoute::HabitsMenu => {
                self.send_tracked(chat_id, ui::habits_menu(), Some(Marker::HabitMenu))
                    .await
            }
            CallbackRoute::ReminderInfo => {
                let text = if self.sweeps.enabled {
                    "Reminders are on: deadline alerts every hour, a daily nudge, \
                     and a weekly summary on Sunday evening."
                } else {
                    "Reminders are currently turned off on the server."
                };
                self.send_tracked(
                    chat_id,
                    OutboundMessage::text(text),
                    Some(Marker::HomeMenu),
                )
                .await
            }

            CallbackRoute::StartTaskWizard => self.start_task_wizard(chat_id).await,
            CallbackRoute::TaskFieldPrompt(field) => {
                self.prompt_task_field(field, chat_id).await
            }
            CallbackRoute::ConfirmTask => self.confirm_task(chat_id).await,
            CallbackRoute::TaskList(window) => self.show_task_list(window, chat_id).await,
            CallbackRoute::PickTask => self.pick_task(entity_id, chat_id).await,
            CallbackRoute::TaskStatus(status) => {
                self.set_task_status(entity_id, status, chat_id).await
            }
            CallbackRoute::DeleteTask => self.delete_task(entity_id, chat_id).await,

            CallbackRoute::StartHabitWizard => self.start_habit_wizard(chat_id).await,
            CallbackRoute::HabitFieldPrompt(field) => {
                self.prompt_habit_field(field, chat_id).await
            }
            CallbackRoute::ConfirmHabit => self.confirm_habit(chat_id).await,
            CallbackRoute::HabitList(window) => self.show_habit_list(window, chat_id).await,
            CallbackRoute::HabitStreaks => self.show_streaks(chat_id).await,
            CallbackRoute::PickHabit => self.pick_habit(entity_id, chat_id).await,
            CallbackRoute::HabitStatus(status) => {
                self.set_habit_status(entity_id, status, chat_id).await
            }
            CallbackRoute::MarkHabit { completed } => {
                self.mark_habit(entity_id, completed, chat_id).await
            }
        }
    }

    /// Send a message and record it as the chat's last message.
    pub(crate) async fn send_tracked(
        &self,
        chat_id: i64,
        body: OutboundMessage,
        marker: Option<Marker>,
    ) -> Result<(), StrideError> {
        let sent = self.messenger.send(chat_id, body).await?;
        self.context
            .put(
                chat_id,
                &MessageRef {
                    message_id: sent.message_id,
                    seq: sent.seq,
                    sent_at: chrono::Utc::now(),
                    marker,
                },
            )
            .await;
        Ok(())
    }

    /// Edit the chat's last tracked message in place, updating its marker.
    /// Falls back to a fresh send when nothing is tracked.
    pub(crate) async fn edit_tracked(
        &self,
        chat_id: i64,
        body: OutboundMessage,
        marker: Option<Marker>,
    ) -> Result<(), StrideError> {
        match self.context.get(chat_id).await {
            Some(previous) => {
                self.messenger.edit(&previous.message_id, body).await?;
                self.context
                    .put(
                        chat_id,
                        &MessageRef {
                            marker,
                            sent_at: chrono::Utc::now(),
                            ..previous
                        },
                    )
                    .await;
                Ok(())
            }
            None => self.send_tracked(chat_id, body, marker).await,
        }
    }
}
