use async_trait::async_trait;
use thiserror::Error;

use crate::blocks::{self, MessageTemplate};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SlashCommandPayload {
    pub command: String,
    pub text: String,
    pub channel_id: String,
    pub user_id: String,
    pub user_handle: Option<String>,
    pub display_name: String,
    pub trigger_ts: String,
    pub request_id: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommandEnvelope {
    pub command: String,
    pub verb: String,
    pub freeform_args: String,
    pub channel_id: String,
    pub user_id: String,
    pub user_handle: Option<String>,
    pub display_name: String,
    pub trigger_ts: String,
    pub request_id: String,
}

impl CommandEnvelope {
    /// The identity reservations are held under: the handle when the
    /// workspace provides one, the display name otherwise.
    pub fn owner_identity(&self) -> String {
        owner_identity(self.user_handle.as_deref(), &self.display_name)
    }
}

pub fn owner_identity(user_handle: Option<&str>, display_name: &str) -> String {
    match user_handle {
        Some(handle) if !handle.trim().is_empty() => handle.trim().to_owned(),
        _ => display_name.trim().to_owned(),
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BookCommand {
    Start,
    Mine,
    All,
    Help,
    Unknown { verb: String },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandParseError {
    #[error("unsupported slash command: {0}")]
    UnsupportedCommand(String),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandRouteError {
    #[error("command service failed: {0}")]
    Service(String),
}

pub fn normalize_book_command(
    payload: SlashCommandPayload,
) -> Result<CommandEnvelope, CommandParseError> {
    if payload.command != "/book" {
        return Err(CommandParseError::UnsupportedCommand(payload.command));
    }

    let text = payload.text.trim().to_owned();
    let mut parts = text.split_whitespace();
    let verb = parts.next().unwrap_or("").to_ascii_lowercase();
    let freeform_args = parts.collect::<Vec<_>>().join(" ");

    Ok(CommandEnvelope {
        command: "book".to_owned(),
        verb,
        freeform_args,
        channel_id: payload.channel_id,
        user_id: payload.user_id,
        user_handle: payload.user_handle,
        display_name: payload.display_name,
        trigger_ts: payload.trigger_ts,
        request_id: payload.request_id,
    })
}

pub fn parse_book_command(input: &str) -> BookCommand {
    let mut parts = input.trim().split_whitespace();
    let verb = parts.next().unwrap_or("").to_ascii_lowercase();
    classify_book_command(&verb)
}

fn classify_book_command(verb: &str) -> BookCommand {
    match verb {
        // Bare `/book` starts the date picker.
        "" | "start" | "new" => BookCommand::Start,
        "mine" | "list" => BookCommand::Mine,
        "all" => BookCommand::All,
        "help" => BookCommand::Help,
        other => BookCommand::Unknown { verb: other.to_owned() },
    }
}

pub struct CommandRouter<S> {
    service: S,
}

impl<S> CommandRouter<S>
where
    S: BookingCommandService,
{
    pub fn new(service: S) -> Self {
        Self { service }
    }

    pub fn service(&self) -> &S {
        &self.service
    }

    pub async fn route(
        &self,
        envelope: CommandEnvelope,
    ) -> Result<MessageTemplate, CommandRouteError> {
        match classify_book_command(&envelope.verb) {
            BookCommand::Start => self.service.start_booking(&envelope).await,
            BookCommand::Mine => self.service.list_mine(&envelope).await,
            BookCommand::All => self.service.list_all(&envelope).await,
            BookCommand::Help => Ok(blocks::help_message()),
            BookCommand::Unknown { verb } => Ok(blocks::error_message(
                &format!("Unsupported command `/book {verb}`. Try `/book help`."),
                &envelope.request_id,
            )),
        }
    }
}

#[async_trait]
pub trait BookingCommandService: Send + Sync {
    async fn start_booking(
        &self,
        envelope: &CommandEnvelope,
    ) -> Result<MessageTemplate, CommandRouteError>;

    async fn list_mine(
        &self,
        envelope: &CommandEnvelope,
    ) -> Result<MessageTemplate, CommandRouteError>;

    async fn list_all(
        &self,
        envelope: &CommandEnvelope,
    ) -> Result<MessageTemplate, CommandRouteError>;
}

#[async_trait]
impl<S> BookingCommandService for std::sync::Arc<S>
where
    S: BookingCommandService,
{
    async fn start_booking(
        &self,
        envelope: &CommandEnvelope,
    ) -> Result<MessageTemplate, CommandRouteError> {
        (**self).start_booking(envelope).await
    }

    async fn list_mine(
        &self,
        envelope: &CommandEnvelope,
    ) -> Result<MessageTemplate, CommandRouteError> {
        (**self).list_mine(envelope).await
    }

    async fn list_all(
        &self,
        envelope: &CommandEnvelope,
    ) -> Result<MessageTemplate, CommandRouteError> {
        (**self).list_all(envelope).await
    }
}

/// Placeholder wiring for dispatch tests and scaffolding; renders static
/// cards without touching an engine.
#[derive(Default)]
pub struct NoopBookingCommandService;

#[async_trait]
impl BookingCommandService for NoopBookingCommandService {
    async fn start_booking(
        &self,
        _envelope: &CommandEnvelope,
    ) -> Result<MessageTemplate, CommandRouteError> {
        Ok(blocks::date_picker_message(&[], None, 0))
    }

    async fn list_mine(
        &self,
        envelope: &CommandEnvelope,
    ) -> Result<MessageTemplate, CommandRouteError> {
        Ok(blocks::my_reservations_message(&envelope.owner_identity(), &[]))
    }

    async fn list_all(
        &self,
        _envelope: &CommandEnvelope,
    ) -> Result<MessageTemplate, CommandRouteError> {
        Ok(blocks::all_reservations_message(&[]))
    }
}
