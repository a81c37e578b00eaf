use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use roomy_core::audit::{AuditContext, AuditSink};
use roomy_core::config::ChatConfig;
use roomy_core::engine::{Clock, ReservationEngine};
use roomy_core::ledger::Owner;

use crate::blocks::{
    self, MessageTemplate, ACTION_HELP, ACTION_MORE_DATES, ACTION_PICK_DATE, ACTION_PICK_SLOT,
    ACTION_START_OVER,
};
use crate::commands::{BookingCommandService, CommandEnvelope, CommandRouteError};
use crate::events::{BlockActionEvent, BlockActionService, EventContext, EventHandlerError};

/// Date buttons rendered per picker card. The horizon can span years, so
/// the picker pages instead of enumerating every offerable date.
pub const DATE_PAGE_SIZE: usize = 10;

/// The engine-backed front end: renders pickers from engine state, commits
/// claims through the engine, and maps every rejection to its user-safe
/// card. Holds no booking state of its own.
pub struct BookingService<C> {
    engine: Arc<ReservationEngine<C>>,
    chat: ChatConfig,
    audit: Arc<dyn AuditSink>,
}

impl<C> BookingService<C>
where
    C: Clock,
{
    pub fn new(
        engine: Arc<ReservationEngine<C>>,
        chat: ChatConfig,
        audit: Arc<dyn AuditSink>,
    ) -> Self {
        Self { engine, chat, audit }
    }

    fn date_page(&self, offset: usize) -> MessageTemplate {
        let dates = self.engine.upcoming_dates();
        let total = dates.len();
        let page: Vec<String> =
            dates.iter().skip(offset).take(DATE_PAGE_SIZE).map(ToString::to_string).collect();
        let consumed = offset.saturating_add(page.len());
        let next_offset = (consumed < total).then_some(consumed);

        blocks::date_picker_message(&page, next_offset, total)
    }

    fn audit_context(&self, user_id: &str, request_id: &str) -> AuditContext {
        AuditContext::new(Some(user_id.to_owned()), request_id, "booking-service")
    }
}

#[async_trait]
impl<C> BookingCommandService for BookingService<C>
where
    C: Clock + 'static,
{
    async fn start_booking(
        &self,
        envelope: &CommandEnvelope,
    ) -> Result<MessageTemplate, CommandRouteError> {
        info!(
            event_name = "booking.command.start",
            correlation_id = %envelope.request_id,
            user_id = %envelope.user_id,
            "rendering date picker"
        );
        Ok(self.date_page(0))
    }

    async fn list_mine(
        &self,
        envelope: &CommandEnvelope,
    ) -> Result<MessageTemplate, CommandRouteError> {
        let identity = envelope.owner_identity();
        let rows: Vec<String> = self
            .engine
            .list_for_owner(&Owner(identity.clone()))
            .into_iter()
            .map(|(date, slot)| format!("• `{date}` {slot}"))
            .collect();

        Ok(blocks::my_reservations_message(&identity, &rows))
    }

    async fn list_all(
        &self,
        envelope: &CommandEnvelope,
    ) -> Result<MessageTemplate, CommandRouteError> {
        let identity = envelope.owner_identity();
        if !self.chat.is_admin(&identity) {
            info!(
                event_name = "booking.command.list_all_denied",
                correlation_id = %envelope.request_id,
                user_id = %envelope.user_id,
                "non-admin requested the full listing"
            );
            return Ok(blocks::unauthorized_message());
        }

        let rows: Vec<String> = self
            .engine
            .list_all()
            .into_iter()
            .map(|reservation| {
                format!(
                    "• `{}` {} — {}",
                    reservation.date, reservation.slot, reservation.owner
                )
            })
            .collect();

        Ok(blocks::all_reservations_message(&rows))
    }
}

#[async_trait]
impl<C> BlockActionService for BookingService<C>
where
    C: Clock + 'static,
{
    async fn handle_block_action(
        &self,
        event: &BlockActionEvent,
        ctx: &EventContext,
    ) -> Result<Option<MessageTemplate>, EventHandlerError> {
        let request_id = event.request_id.as_deref().unwrap_or(&ctx.correlation_id);

        match event.action_id.as_str() {
            ACTION_START_OVER => Ok(Some(self.date_page(0))),
            ACTION_MORE_DATES => {
                let offset = event
                    .value
                    .as_deref()
                    .and_then(|value| value.parse::<usize>().ok())
                    .unwrap_or(0);
                Ok(Some(self.date_page(offset)))
            }
            ACTION_HELP => Ok(Some(blocks::help_message())),
            ACTION_PICK_DATE => {
                let date = event.value.as_deref().ok_or_else(|| {
                    EventHandlerError::BlockAction("date action carried no value".to_owned())
                })?;

                let audit = self.audit_context(&event.user_id, request_id);
                match self.engine.choose_date_with_audit(
                    &event.user_id,
                    date,
                    self.audit.as_ref(),
                    &audit,
                ) {
                    Ok(slots) => {
                        let labels: Vec<String> =
                            slots.iter().map(ToString::to_string).collect();
                        Ok(Some(blocks::slot_picker_message(date, &labels)))
                    }
                    Err(error) => Ok(Some(blocks::booking_rejected_message(&error.user_message()))),
                }
            }
            ACTION_PICK_SLOT => {
                let slot = event.value.as_deref().ok_or_else(|| {
                    EventHandlerError::BlockAction("slot action carried no value".to_owned())
                })?;

                let owner = Owner(event.owner_identity());
                let audit = self.audit_context(&event.user_id, request_id);
                match self.engine.reserve_with_audit(
                    &event.user_id,
                    slot,
                    owner,
                    self.audit.as_ref(),
                    &audit,
                ) {
                    Ok(reservation) => Ok(Some(blocks::booking_confirmed_message(
                        &reservation.owner.0,
                        &reservation.date.to_string(),
                        &reservation.slot.to_string(),
                    ))),
                    Err(error) => Ok(Some(blocks::booking_rejected_message(&error.user_message()))),
                }
            }
            other => Ok(Some(blocks::error_message(
                &format!("Unsupported action `{other}`."),
                request_id,
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::{DateTime, TimeZone, Utc};

    use roomy_core::audit::InMemoryAuditSink;
    use roomy_core::calendar::SlotWindow;
    use roomy_core::config::ChatConfig;
    use roomy_core::engine::{Clock, ReservationEngine};
    use roomy_core::ledger::ReservationLedger;

    use super::{BookingService, DATE_PAGE_SIZE};
    use crate::blocks::{
        Block, TextObject, ACTION_MORE_DATES, ACTION_PICK_DATE, ACTION_PICK_SLOT,
    };
    use crate::commands::{BookingCommandService, CommandEnvelope};
    use crate::events::{BlockActionEvent, BlockActionService, EventContext};

    #[derive(Clone, Copy)]
    struct FixedClock(DateTime<Utc>);

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.0
        }
    }

    fn chat_config(admins: &[&str]) -> ChatConfig {
        ChatConfig {
            app_token: "xapp-test".to_string().into(),
            bot_token: "xoxb-test".to_string().into(),
            home_channel_id: String::new(),
            admin_handles: admins.iter().map(ToString::to_string).collect(),
        }
    }

    fn service(admins: &[&str]) -> (BookingService<FixedClock>, InMemoryAuditSink) {
        let clock = FixedClock(
            Utc.with_ymd_and_hms(2025, 6, 10, 9, 0, 0).single().expect("reference time"),
        );
        let ledger = Arc::new(ReservationLedger::new(SlotWindow::new(8, 18)));
        let engine = Arc::new(ReservationEngine::new(ledger, 30, clock));
        let sink = InMemoryAuditSink::default();

        (BookingService::new(engine, chat_config(admins), Arc::new(sink.clone())), sink)
    }

    fn envelope(handle: &str) -> CommandEnvelope {
        CommandEnvelope {
            command: "book".to_owned(),
            verb: String::new(),
            freeform_args: String::new(),
            channel_id: "C1".to_owned(),
            user_id: "U1".to_owned(),
            user_handle: Some(handle.to_owned()),
            display_name: "Somebody".to_owned(),
            trigger_ts: "1".to_owned(),
            request_id: "req-cmd".to_owned(),
        }
    }

    fn action(user_id: &str, handle: &str, action_id: &str, value: Option<&str>) -> BlockActionEvent {
        BlockActionEvent {
            channel_id: "C1".to_owned(),
            message_ts: "1730000000.1000".to_owned(),
            user_id: user_id.to_owned(),
            user_handle: Some(handle.to_owned()),
            display_name: format!("{handle} display"),
            action_id: action_id.to_owned(),
            value: value.map(ToString::to_string),
            request_id: Some("req-action".to_owned()),
        }
    }

    fn buttons(message: &crate::blocks::MessageTemplate, block_id: &str) -> Vec<String> {
        message
            .blocks
            .iter()
            .find_map(|block| match block {
                Block::Actions { block_id: id, elements } if id == block_id => Some(
                    elements.iter().filter_map(|element| element.value.clone()).collect(),
                ),
                _ => None,
            })
            .unwrap_or_default()
    }

    #[tokio::test]
    async fn start_renders_the_first_date_page_with_paging() {
        let (service, _) = service(&[]);

        let message = service.start_booking(&envelope("alice")).await.expect("start");

        let dates = buttons(&message, "book.dates.pick.v1");
        assert_eq!(dates.len(), DATE_PAGE_SIZE);
        assert_eq!(dates.first().map(String::as_str), Some("2025-06-10"));

        let paging = buttons(&message, "book.dates.page.v1");
        assert_eq!(paging, [DATE_PAGE_SIZE.to_string()]);
    }

    #[tokio::test]
    async fn paging_continues_from_the_carried_offset() {
        let (service, _) = service(&[]);

        let message = service
            .handle_block_action(
                &action("U1", "alice", ACTION_MORE_DATES, Some("30")),
                &EventContext::default(),
            )
            .await
            .expect("paging")
            .expect("message");

        // 31 offerable dates; the last page holds exactly one.
        let dates = buttons(&message, "book.dates.pick.v1");
        assert_eq!(dates, ["2025-07-10".to_string()]);
        assert!(buttons(&message, "book.dates.page.v1").is_empty());
    }

    #[tokio::test]
    async fn full_flow_reserves_and_second_claim_gets_a_nameless_conflict() {
        let (service, sink) = service(&[]);
        let ctx = EventContext::default();

        let slot_picker = service
            .handle_block_action(
                &action("U1", "alice", ACTION_PICK_DATE, Some("2025-06-10")),
                &ctx,
            )
            .await
            .expect("date pick")
            .expect("message");
        assert!(buttons(&slot_picker, "book.slots.pick.v1").contains(&"09:00".to_string()));

        let confirmed = service
            .handle_block_action(&action("U1", "alice", ACTION_PICK_SLOT, Some("09:00")), &ctx)
            .await
            .expect("slot pick")
            .expect("message");
        assert!(confirmed.fallback_text.contains("alice"));
        assert!(confirmed.fallback_text.contains("09:00"));

        service
            .handle_block_action(
                &action("U2", "bob", ACTION_PICK_DATE, Some("2025-06-10")),
                &ctx,
            )
            .await
            .expect("date pick")
            .expect("message");
        let rejected = service
            .handle_block_action(&action("U2", "bob", ACTION_PICK_SLOT, Some("09:00")), &ctx)
            .await
            .expect("slot pick")
            .expect("message");

        assert!(rejected.fallback_text.contains("already booked"));
        assert!(!rejected.fallback_text.contains("alice"), "conflict card must omit the holder");

        let events = sink.events();
        assert!(events.iter().any(|event| event.event_type == "booking.slot_reserved"));
        assert!(events.iter().any(|event| event.event_type == "booking.slot_rejected"));
    }

    #[tokio::test]
    async fn slot_pick_without_a_date_renders_the_missing_context_card() {
        let (service, _) = service(&[]);

        let message = service
            .handle_block_action(
                &action("U1", "alice", ACTION_PICK_SLOT, Some("09:00")),
                &EventContext::default(),
            )
            .await
            .expect("slot pick")
            .expect("message");

        assert!(message.fallback_text.contains("No date selected"));
    }

    #[tokio::test]
    async fn past_dates_render_a_rejection_card() {
        let (service, _) = service(&[]);

        let message = service
            .handle_block_action(
                &action("U1", "alice", ACTION_PICK_DATE, Some("2025-06-09")),
                &EventContext::default(),
            )
            .await
            .expect("date pick")
            .expect("message");

        assert!(message.fallback_text.contains("in the past"));
    }

    #[tokio::test]
    async fn mine_lists_only_the_callers_reservations() {
        let (service, _) = service(&[]);
        let ctx = EventContext::default();

        for (user, handle, slot) in [("U1", "alice", "09:00"), ("U2", "bob", "10:00")] {
            service
                .handle_block_action(&action(user, handle, ACTION_PICK_DATE, Some("2025-06-10")), &ctx)
                .await
                .expect("date pick");
            service
                .handle_block_action(&action(user, handle, ACTION_PICK_SLOT, Some(slot)), &ctx)
                .await
                .expect("slot pick");
        }

        let message = service.list_mine(&envelope("alice")).await.expect("mine");
        let list = message
            .blocks
            .iter()
            .find_map(|block| match block {
                Block::Section { block_id, text: TextObject::Mrkdwn { text } }
                    if block_id == "book.mine.list.v1" =>
                {
                    Some(text.clone())
                }
                _ => None,
            })
            .expect("list section");

        assert!(list.contains("09:00"));
        assert!(!list.contains("10:00"));
    }

    #[tokio::test]
    async fn list_all_is_gated_by_the_allowlist() {
        let (service, _) = service(&["carol"]);
        let ctx = EventContext::default();

        service
            .handle_block_action(&action("U1", "alice", ACTION_PICK_DATE, Some("2025-06-10")), &ctx)
            .await
            .expect("date pick");
        service
            .handle_block_action(&action("U1", "alice", ACTION_PICK_SLOT, Some("09:00")), &ctx)
            .await
            .expect("slot pick");

        let denied = service.list_all(&envelope("alice")).await.expect("denied listing");
        assert!(denied.fallback_text.contains("Not authorized"));

        let allowed = service.list_all(&envelope("carol")).await.expect("admin listing");
        assert!(allowed.fallback_text.contains("1 reservations"));
    }

    #[tokio::test]
    async fn date_action_without_a_value_is_a_handler_error() {
        let (service, _) = service(&[]);

        let result = service
            .handle_block_action(
                &action("U1", "alice", ACTION_PICK_DATE, None),
                &EventContext::default(),
            )
            .await;

        assert!(result.is_err());
    }
}
