use serde::Serialize;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TextObject {
    Plain { text: String },
    Mrkdwn { text: String },
}

impl TextObject {
    pub fn plain(text: impl Into<String>) -> Self {
        Self::Plain { text: text.into() }
    }

    pub fn mrkdwn(text: impl Into<String>) -> Self {
        Self::Mrkdwn { text: text.into() }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ButtonStyle {
    Primary,
    Danger,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ButtonElement {
    pub action_id: String,
    pub text: TextObject,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style: Option<ButtonStyle>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

impl ButtonElement {
    pub fn new(action_id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            action_id: action_id.into(),
            text: TextObject::plain(label),
            style: None,
            value: None,
        }
    }

    pub fn style(mut self, style: ButtonStyle) -> Self {
        self.style = Some(style);
        self
    }

    pub fn value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Block {
    Section { block_id: String, text: TextObject },
    Actions { block_id: String, elements: Vec<ButtonElement> },
    Context { block_id: String, elements: Vec<TextObject> },
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct MessageTemplate {
    pub fallback_text: String,
    pub blocks: Vec<Block>,
}

pub struct MessageBuilder {
    fallback_text: String,
    blocks: Vec<Block>,
}

impl MessageBuilder {
    pub fn new(fallback_text: impl Into<String>) -> Self {
        Self { fallback_text: fallback_text.into(), blocks: Vec::new() }
    }

    pub fn section<F>(mut self, block_id: impl Into<String>, build: F) -> Self
    where
        F: FnOnce(&mut SectionBuilder),
    {
        let mut builder = SectionBuilder::default();
        build(&mut builder);
        self.blocks.push(Block::Section { block_id: block_id.into(), text: builder.build() });
        self
    }

    pub fn actions<F>(mut self, block_id: impl Into<String>, build: F) -> Self
    where
        F: FnOnce(&mut ActionsBuilder),
    {
        let mut builder = ActionsBuilder::default();
        build(&mut builder);
        self.blocks.push(Block::Actions { block_id: block_id.into(), elements: builder.build() });
        self
    }

    pub fn context<F>(mut self, block_id: impl Into<String>, build: F) -> Self
    where
        F: FnOnce(&mut ContextBuilder),
    {
        let mut builder = ContextBuilder::default();
        build(&mut builder);
        self.blocks.push(Block::Context { block_id: block_id.into(), elements: builder.build() });
        self
    }

    pub fn build(self) -> MessageTemplate {
        MessageTemplate { fallback_text: self.fallback_text, blocks: self.blocks }
    }
}

#[derive(Default)]
pub struct SectionBuilder {
    text: Option<TextObject>,
}

impl SectionBuilder {
    pub fn plain(&mut self, text: impl Into<String>) -> &mut Self {
        self.text = Some(TextObject::plain(text));
        self
    }

    pub fn mrkdwn(&mut self, text: impl Into<String>) -> &mut Self {
        self.text = Some(TextObject::mrkdwn(text));
        self
    }

    fn build(self) -> TextObject {
        self.text.unwrap_or_else(|| TextObject::plain(""))
    }
}

#[derive(Default)]
pub struct ActionsBuilder {
    elements: Vec<ButtonElement>,
}

impl ActionsBuilder {
    pub fn button(&mut self, button: ButtonElement) -> &mut Self {
        self.elements.push(button);
        self
    }

    fn build(self) -> Vec<ButtonElement> {
        self.elements
    }
}

#[derive(Default)]
pub struct ContextBuilder {
    elements: Vec<TextObject>,
}

impl ContextBuilder {
    pub fn plain(&mut self, text: impl Into<String>) -> &mut Self {
        self.elements.push(TextObject::plain(text));
        self
    }

    pub fn mrkdwn(&mut self, text: impl Into<String>) -> &mut Self {
        self.elements.push(TextObject::mrkdwn(text));
        self
    }

    fn build(self) -> Vec<TextObject> {
        self.elements
    }
}

pub const ACTION_PICK_DATE: &str = "book.date.v1";
pub const ACTION_PICK_SLOT: &str = "book.slot.v1";
pub const ACTION_MORE_DATES: &str = "book.more_dates.v1";
pub const ACTION_START_OVER: &str = "book.start.v1";
pub const ACTION_HELP: &str = "book.help.v1";

/// One page of the date picker. `next_offset` renders a paging button when
/// the horizon extends past this page.
pub fn date_picker_message(
    dates: &[String],
    next_offset: Option<usize>,
    total: usize,
) -> MessageTemplate {
    if dates.is_empty() {
        return MessageBuilder::new("No bookable dates")
            .section("book.dates.empty.v1", |section| {
                section.plain("There are no bookable dates right now.");
            })
            .build();
    }

    let mut message = MessageBuilder::new("Select a date")
        .section("book.dates.header.v1", |section| {
            section.mrkdwn("*Select a date:*");
        })
        .actions("book.dates.pick.v1", |actions| {
            for date in dates {
                actions.button(ButtonElement::new(ACTION_PICK_DATE, date.clone()).value(date.clone()));
            }
        });

    if let Some(offset) = next_offset {
        message = message.actions("book.dates.page.v1", |actions| {
            actions.button(
                ButtonElement::new(ACTION_MORE_DATES, "More dates").value(offset.to_string()),
            );
        });
    }

    message
        .context("book.dates.context.v1", |context| {
            context.plain(format!("Showing {} of {} bookable dates.", dates.len(), total));
        })
        .build()
}

/// The free slots for a selected date, one button per slot.
pub fn slot_picker_message(date: &str, slots: &[String]) -> MessageTemplate {
    MessageBuilder::new(format!("Select a slot for {date}"))
        .section("book.slots.header.v1", |section| {
            section.mrkdwn(format!("*Select a slot for `{date}`:*"));
        })
        .actions("book.slots.pick.v1", |actions| {
            for slot in slots {
                actions.button(ButtonElement::new(ACTION_PICK_SLOT, slot.clone()).value(slot.clone()));
            }
        })
        .context("book.slots.context.v1", |context| {
            context.plain(format!("{} free slots on {date}.", slots.len()));
        })
        .build()
}

pub fn booking_confirmed_message(owner: &str, date: &str, slot: &str) -> MessageTemplate {
    MessageBuilder::new(format!("{owner} booked {slot} on {date}"))
        .section("book.confirmed.v1", |section| {
            section.mrkdwn(format!("✅ *{owner}* booked `{slot}` on `{date}`."));
        })
        .build()
}

/// A terminal rejection. The reason text is the engine's user-safe message;
/// for conflicts it names only the already-booked fact, never the holder.
pub fn booking_rejected_message(reason: &str) -> MessageTemplate {
    MessageBuilder::new(reason.to_owned())
        .section("book.rejected.v1", |section| {
            section.mrkdwn(format!("❌ {reason}"));
        })
        .actions("book.rejected.actions.v1", |actions| {
            actions.button(
                ButtonElement::new(ACTION_START_OVER, "Start over").style(ButtonStyle::Primary),
            );
        })
        .build()
}

pub fn my_reservations_message(owner: &str, rows: &[String]) -> MessageTemplate {
    if rows.is_empty() {
        return MessageBuilder::new(format!("No reservations for {owner}"))
            .section("book.mine.empty.v1", |section| {
                section.plain("You have no reservations yet.");
            })
            .build();
    }

    MessageBuilder::new(format!("Reservations for {owner}"))
        .section("book.mine.header.v1", |section| {
            section.mrkdwn(format!("*Your reservations, {owner}:*"));
        })
        .section("book.mine.list.v1", |section| {
            section.mrkdwn(rows.join("\n"));
        })
        .build()
}

pub fn all_reservations_message(rows: &[String]) -> MessageTemplate {
    if rows.is_empty() {
        return MessageBuilder::new("No reservations")
            .section("book.all.empty.v1", |section| {
                section.plain("Nothing is booked yet.");
            })
            .build();
    }

    MessageBuilder::new(format!("{} reservations", rows.len()))
        .section("book.all.header.v1", |section| {
            section.mrkdwn("*All reservations:*");
        })
        .section("book.all.list.v1", |section| {
            section.mrkdwn(rows.join("\n"));
        })
        .context("book.all.context.v1", |context| {
            context.plain(format!("{} reservations in total.", rows.len()));
        })
        .build()
}

pub fn unauthorized_message() -> MessageTemplate {
    MessageBuilder::new("Not authorized")
        .section("book.unauthorized.v1", |section| {
            section.plain("Only workspace admins can list all reservations.");
        })
        .build()
}

pub fn help_message() -> MessageTemplate {
    MessageBuilder::new("Booking command help")
        .section("book.help.summary.v1", |section| {
            section.mrkdwn(
                "*Available commands*\n• `/book` — start a booking\n• `/book mine` — your reservations\n• `/book all` — all reservations (admins)\n• `/book help`",
            );
        })
        .build()
}

pub fn error_message(summary: &str, correlation_id: &str) -> MessageTemplate {
    MessageBuilder::new(summary.to_owned())
        .section("book.error.summary.v1", |section| {
            section.mrkdwn(format!(":warning: {summary}"));
        })
        .context("book.error.context.v1", |context| {
            context.plain(format!("Correlation ID: {correlation_id}"));
        })
        .build()
}
