use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use thiserror::Error;

use crate::{
    blocks::MessageTemplate,
    commands::{
        normalize_book_command, owner_identity, BookingCommandService, CommandParseError,
        CommandRouteError, CommandRouter, NoopBookingCommandService, SlashCommandPayload,
    },
};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChatEnvelope {
    pub envelope_id: String,
    pub event: ChatEvent,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ChatEvent {
    SlashCommand(SlashCommandPayload),
    BlockAction(BlockActionEvent),
    Unsupported { event_type: String },
}

impl ChatEvent {
    pub fn event_type(&self) -> ChatEventType {
        match self {
            Self::SlashCommand(_) => ChatEventType::SlashCommand,
            Self::BlockAction(_) => ChatEventType::BlockAction,
            Self::Unsupported { .. } => ChatEventType::Unsupported,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ChatEventType {
    SlashCommand,
    BlockAction,
    Unsupported,
}

/// A button press from a previously rendered picker card.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BlockActionEvent {
    pub channel_id: String,
    pub message_ts: String,
    pub user_id: String,
    pub user_handle: Option<String>,
    pub display_name: String,
    pub action_id: String,
    pub value: Option<String>,
    pub request_id: Option<String>,
}

impl BlockActionEvent {
    pub fn owner_identity(&self) -> String {
        owner_identity(self.user_handle.as_deref(), &self.display_name)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EventContext {
    pub correlation_id: String,
}

impl Default for EventContext {
    fn default() -> Self {
        Self { correlation_id: "unknown-correlation-id".to_owned() }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HandlerResult {
    Responded(MessageTemplate),
    Processed,
    Ignored,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EventHandlerError {
    #[error(transparent)]
    Parse(#[from] CommandParseError),
    #[error(transparent)]
    Route(#[from] CommandRouteError),
    #[error("block action handler failure: {0}")]
    BlockAction(String),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DispatchError {
    #[error(transparent)]
    Handler(#[from] EventHandlerError),
}

/// The bot only serves its configured home channel; interactions from
/// anywhere else are dropped without a response. An unset gate serves all
/// channels.
#[derive(Clone, Debug, Default)]
pub struct ChannelGate {
    home_channel_id: Option<String>,
}

impl ChannelGate {
    pub fn new(home_channel_id: impl Into<String>) -> Self {
        let home_channel_id = home_channel_id.into();
        Self {
            home_channel_id: (!home_channel_id.trim().is_empty())
                .then(|| home_channel_id.trim().to_owned()),
        }
    }

    pub fn open() -> Self {
        Self::default()
    }

    pub fn admits(&self, channel_id: &str) -> bool {
        self.home_channel_id.as_deref().map_or(true, |home| home == channel_id)
    }
}

#[async_trait]
pub trait EventHandler: Send + Sync {
    fn event_type(&self) -> ChatEventType;
    async fn handle(
        &self,
        envelope: &ChatEnvelope,
        ctx: &EventContext,
    ) -> Result<HandlerResult, EventHandlerError>;
}

#[derive(Default)]
pub struct EventDispatcher {
    handlers: HashMap<ChatEventType, Arc<dyn EventHandler>>,
}

impl EventDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<H>(&mut self, handler: H)
    where
        H: EventHandler + 'static,
    {
        self.handlers.insert(handler.event_type(), Arc::new(handler));
    }

    pub async fn dispatch(
        &self,
        envelope: &ChatEnvelope,
        ctx: &EventContext,
    ) -> Result<HandlerResult, DispatchError> {
        let Some(handler) = self.handlers.get(&envelope.event.event_type()) else {
            return Ok(HandlerResult::Ignored);
        };

        handler.handle(envelope, ctx).await.map_err(DispatchError::from)
    }

    pub fn handler_count(&self) -> usize {
        self.handlers.len()
    }
}

pub fn default_dispatcher() -> EventDispatcher {
    let mut dispatcher = EventDispatcher::new();
    dispatcher.register(SlashCommandHandler::new(NoopBookingCommandService, ChannelGate::open()));
    dispatcher.register(BlockActionHandler::new(NoopBlockActionService, ChannelGate::open()));
    dispatcher
}

pub struct SlashCommandHandler<S> {
    router: CommandRouter<S>,
    gate: ChannelGate,
}

impl<S> SlashCommandHandler<S>
where
    S: BookingCommandService,
{
    pub fn new(service: S, gate: ChannelGate) -> Self {
        Self { router: CommandRouter::new(service), gate }
    }
}

#[async_trait]
impl<S> EventHandler for SlashCommandHandler<S>
where
    S: BookingCommandService + 'static,
{
    fn event_type(&self) -> ChatEventType {
        ChatEventType::SlashCommand
    }

    async fn handle(
        &self,
        envelope: &ChatEnvelope,
        _ctx: &EventContext,
    ) -> Result<HandlerResult, EventHandlerError> {
        let ChatEvent::SlashCommand(payload) = &envelope.event else {
            return Ok(HandlerResult::Ignored);
        };

        if !self.gate.admits(&payload.channel_id) {
            return Ok(HandlerResult::Ignored);
        }

        let normalized = normalize_book_command(payload.clone())?;
        let message = self.router.route(normalized).await?;
        Ok(HandlerResult::Responded(message))
    }
}

#[async_trait]
pub trait BlockActionService: Send + Sync {
    async fn handle_block_action(
        &self,
        event: &BlockActionEvent,
        ctx: &EventContext,
    ) -> Result<Option<MessageTemplate>, EventHandlerError>;
}

#[async_trait]
impl<S> BlockActionService for Arc<S>
where
    S: BlockActionService,
{
    async fn handle_block_action(
        &self,
        event: &BlockActionEvent,
        ctx: &EventContext,
    ) -> Result<Option<MessageTemplate>, EventHandlerError> {
        (**self).handle_block_action(event, ctx).await
    }
}

pub struct BlockActionHandler<S> {
    service: S,
    gate: ChannelGate,
}

impl<S> BlockActionHandler<S>
where
    S: BlockActionService,
{
    pub fn new(service: S, gate: ChannelGate) -> Self {
        Self { service, gate }
    }
}

#[async_trait]
impl<S> EventHandler for BlockActionHandler<S>
where
    S: BlockActionService + 'static,
{
    fn event_type(&self) -> ChatEventType {
        ChatEventType::BlockAction
    }

    async fn handle(
        &self,
        envelope: &ChatEnvelope,
        ctx: &EventContext,
    ) -> Result<HandlerResult, EventHandlerError> {
        let ChatEvent::BlockAction(event) = &envelope.event else {
            return Ok(HandlerResult::Ignored);
        };

        if !self.gate.admits(&event.channel_id) {
            return Ok(HandlerResult::Ignored);
        }

        let message = self.service.handle_block_action(event, ctx).await?;
        Ok(match message {
            Some(message) => HandlerResult::Responded(message),
            None => HandlerResult::Processed,
        })
    }
}

pub struct NoopBlockActionService;

#[async_trait]
impl BlockActionService for NoopBlockActionService {
    async fn handle_block_action(
        &self,
        event: &BlockActionEvent,
        ctx: &EventContext,
    ) -> Result<Option<MessageTemplate>, EventHandlerError> {
        if event.action_id == crate::blocks::ACTION_HELP {
            return Ok(Some(crate::blocks::help_message()));
        }

        let request_id = event.request_id.as_deref().unwrap_or(&ctx.correlation_id);
        Ok(Some(crate::blocks::error_message(
            &format!("No handler wired for action `{}`.", event.action_id),
            request_id,
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::{
        default_dispatcher, BlockActionEvent, ChannelGate, ChatEnvelope, ChatEvent, EventContext,
        EventDispatcher, HandlerResult,
    };
    use crate::commands::SlashCommandPayload;

    fn slash_envelope(channel_id: &str) -> ChatEnvelope {
        ChatEnvelope {
            envelope_id: "env-1".to_owned(),
            event: ChatEvent::SlashCommand(SlashCommandPayload {
                command: "/book".to_owned(),
                text: "help".to_owned(),
                channel_id: channel_id.to_owned(),
                user_id: "U1".to_owned(),
                user_handle: Some("alice".to_owned()),
                display_name: "Alice Example".to_owned(),
                trigger_ts: "1".to_owned(),
                request_id: "req-1".to_owned(),
            }),
        }
    }

    fn action_envelope(action_id: &str) -> ChatEnvelope {
        ChatEnvelope {
            envelope_id: "env-2".to_owned(),
            event: ChatEvent::BlockAction(BlockActionEvent {
                channel_id: "C1".to_owned(),
                message_ts: "1730000000.1000".to_owned(),
                user_id: "U1".to_owned(),
                user_handle: Some("alice".to_owned()),
                display_name: "Alice Example".to_owned(),
                action_id: action_id.to_owned(),
                value: None,
                request_id: Some("req-2".to_owned()),
            }),
        }
    }

    #[tokio::test]
    async fn dispatcher_routes_slash_commands() {
        let dispatcher = default_dispatcher();

        let result = dispatcher
            .dispatch(&slash_envelope("C1"), &EventContext::default())
            .await
            .expect("dispatch");

        assert!(matches!(result, HandlerResult::Responded(_)));
    }

    #[tokio::test]
    async fn dispatcher_returns_ignored_when_no_handler_registered() {
        let dispatcher = EventDispatcher::new();

        let result = dispatcher
            .dispatch(&slash_envelope("C1"), &EventContext::default())
            .await
            .expect("dispatch");

        assert_eq!(result, HandlerResult::Ignored);
    }

    #[test]
    fn default_dispatcher_registers_handlers() {
        assert_eq!(default_dispatcher().handler_count(), 2);
    }

    #[tokio::test]
    async fn dispatcher_routes_block_actions() {
        let dispatcher = default_dispatcher();

        let result = dispatcher
            .dispatch(&action_envelope(crate::blocks::ACTION_HELP), &EventContext::default())
            .await
            .expect("dispatch");

        assert!(matches!(result, HandlerResult::Responded(_)));
    }

    #[tokio::test]
    async fn unknown_block_action_resolves_to_guidance() {
        let dispatcher = default_dispatcher();

        let result = dispatcher
            .dispatch(&action_envelope("unknown.action"), &EventContext::default())
            .await
            .expect("dispatch");

        let HandlerResult::Responded(message) = result else {
            panic!("expected a guidance card");
        };
        assert!(message.fallback_text.contains("unknown.action"));
    }

    #[test]
    fn channel_gate_admits_only_its_home_channel() {
        let gate = ChannelGate::new("C-HOME");
        assert!(gate.admits("C-HOME"));
        assert!(!gate.admits("C-ELSEWHERE"));

        assert!(ChannelGate::open().admits("C-ANY"));
        assert!(ChannelGate::new("  ").admits("C-ANY"), "blank config disables the gate");
    }

    #[tokio::test]
    async fn foreign_channel_interactions_are_dropped_silently() {
        let mut dispatcher = EventDispatcher::new();
        dispatcher.register(super::SlashCommandHandler::new(
            crate::commands::NoopBookingCommandService,
            ChannelGate::new("C-HOME"),
        ));

        let result = dispatcher
            .dispatch(&slash_envelope("C-ELSEWHERE"), &EventContext::default())
            .await
            .expect("dispatch");

        assert_eq!(result, HandlerResult::Ignored);
    }
}
