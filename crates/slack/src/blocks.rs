use serde::Serialize;

pub const SENTIMENT_ANALYSIS_TEXT: &str = "Sentiment Analysis";
pub const READ_MESSAGE_TITLE: &str = "Read Message";
pub const NO_MESSAGE_FOUND: &str = "No message found.";
pub const USER_DATA_NOT_FOUND: &str = "User data not found. Please try again.";
pub const INVALID_FORM_FIELDS: &str = "Invalid form fields provided.";

pub const MODAL_CALLBACK_ID: &str = "modal-identifier";
pub const MESSAGE_BLOCK_ID: &str = "sentiment_analysis_message_block";
pub const MESSAGE_ACTION_ID: &str = "sentiment_analysis_message_input";

pub const QUOTE_MAX_CHARS: usize = 30;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TextObject {
    #[serde(rename = "plain_text")]
    Plain { text: String, emoji: bool },
    Mrkdwn { text: String },
}

impl TextObject {
    pub fn plain(text: impl Into<String>) -> Self {
        Self::Plain { text: text.into(), emoji: true }
    }

    pub fn mrkdwn(text: impl Into<String>) -> Self {
        Self::Mrkdwn { text: text.into() }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AttachmentColor {
    Red,
    Yellow,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct AttachmentField {
    pub title: String,
    pub value: String,
    pub short: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Attachment {
    pub color: AttachmentColor,
    pub fields: Vec<AttachmentField>,
}

pub struct AttachmentBuilder {
    color: AttachmentColor,
    fields: Vec<AttachmentField>,
}

impl AttachmentBuilder {
    pub fn new(color: AttachmentColor) -> Self {
        Self { color, fields: Vec::new() }
    }

    pub fn field(mut self, title: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.push(AttachmentField { title: title.into(), value: value.into(), short: false });
        self
    }

    pub fn build(self) -> Attachment {
        Attachment { color: self.color, fields: self.fields }
    }
}

/// Red card posted when a channel message reads negative.
pub fn sentiment_attachments(
    message: &str,
    sentiment_result: &str,
    message_to_user: &str,
) -> Vec<Attachment> {
    vec![AttachmentBuilder::new(AttachmentColor::Red)
        .field("Message", message)
        .field("Sentiment", sentiment_result)
        .field("Message to User", message_to_user)
        .build()]
}

/// Yellow card carrying a channel's configured reply message.
pub fn message_attachments(title: &str, channel_message: &str) -> Vec<Attachment> {
    vec![AttachmentBuilder::new(AttachmentColor::Yellow).field(title, channel_message).build()]
}

/// First thirty characters followed by `" ..."` when the text is longer.
pub fn truncate_quote(message: &str) -> String {
    if message.chars().count() > QUOTE_MAX_CHARS {
        let head: String = message.chars().take(QUOTE_MAX_CHARS).collect();
        format!("{head} ...")
    } else {
        message.to_owned()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PlainTextInput {
    #[serde(rename = "type")]
    kind: &'static str,
    pub action_id: String,
    pub placeholder: TextObject,
    pub max_length: usize,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ModalBlock {
    Input { block_id: String, label: TextObject, element: PlainTextInput },
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ModalView {
    #[serde(rename = "type")]
    kind: &'static str,
    pub callback_id: String,
    pub title: TextObject,
    pub submit: TextObject,
    pub blocks: Vec<ModalBlock>,
}

pub struct ModalBuilder {
    callback_id: String,
    title: String,
    submit: String,
    blocks: Vec<ModalBlock>,
}

impl ModalBuilder {
    pub fn new(callback_id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            callback_id: callback_id.into(),
            title: title.into(),
            submit: "Submit".to_owned(),
            blocks: Vec::new(),
        }
    }

    pub fn text_input(
        mut self,
        block_id: impl Into<String>,
        action_id: impl Into<String>,
        label: impl Into<String>,
        placeholder: impl Into<String>,
        max_length: usize,
    ) -> Self {
        self.blocks.push(ModalBlock::Input {
            block_id: block_id.into(),
            label: TextObject::plain(label),
            element: PlainTextInput {
                kind: "plain_text_input",
                action_id: action_id.into(),
                placeholder: TextObject::plain(placeholder),
                max_length,
            },
        });
        self
    }

    pub fn build(self) -> ModalView {
        ModalView {
            kind: "modal",
            callback_id: self.callback_id,
            title: TextObject::plain(self.title),
            submit: TextObject::plain(self.submit),
            blocks: self.blocks,
        }
    }
}

/// Modal opened by the add command to collect a channel's reply message.
pub fn reply_message_modal() -> ModalView {
    ModalBuilder::new(MODAL_CALLBACK_ID, "Add Message")
        .text_input(
            MESSAGE_BLOCK_ID,
            MESSAGE_ACTION_ID,
            "Sentiment Analysis Message",
            "Enter the message to send when a conversation turns negative",
            tonecheck_core::domain::REPLY_MESSAGE_MAX_CHARS,
        )
        .build()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{
        message_attachments, reply_message_modal, sentiment_attachments, truncate_quote,
        TextObject, MESSAGE_ACTION_ID, MESSAGE_BLOCK_ID, MODAL_CALLBACK_ID,
    };

    #[test]
    fn sentiment_attachment_matches_slack_shape() {
        let attachments =
            sentiment_attachments("you are useless ...", "definitely negative", "Be nice");
        let value = serde_json::to_value(&attachments).expect("serialize attachments");

        assert_eq!(
            value,
            json!([{
                "color": "red",
                "fields": [
                    { "title": "Message", "value": "you are useless ...", "short": false },
                    { "title": "Sentiment", "value": "definitely negative", "short": false },
                    { "title": "Message to User", "value": "Be nice", "short": false }
                ]
            }])
        );
    }

    #[test]
    fn message_attachment_is_single_yellow_field() {
        let value = serde_json::to_value(message_attachments("Added", "Be nice"))
            .expect("serialize attachments");

        assert_eq!(
            value,
            json!([{ "color": "yellow", "fields": [{ "title": "Added", "value": "Be nice", "short": false }] }])
        );
    }

    #[test]
    fn quotes_are_truncated_after_thirty_chars() {
        assert_eq!(truncate_quote("short"), "short");
        assert_eq!(truncate_quote(&"a".repeat(30)), "a".repeat(30));
        assert_eq!(truncate_quote(&"b".repeat(31)), format!("{} ...", "b".repeat(30)));
        assert_eq!(truncate_quote(&"é".repeat(40)), format!("{} ...", "é".repeat(30)));
    }

    #[test]
    fn text_objects_use_slack_type_names() {
        assert_eq!(
            serde_json::to_value(TextObject::plain("Submit")).expect("serialize"),
            json!({ "type": "plain_text", "text": "Submit", "emoji": true })
        );
        assert_eq!(
            serde_json::to_value(TextObject::mrkdwn("*hi*")).expect("serialize"),
            json!({ "type": "mrkdwn", "text": "*hi*" })
        );
    }

    #[test]
    fn modal_input_ids_match_submission_lookup() {
        let value = serde_json::to_value(reply_message_modal()).expect("serialize modal");

        assert_eq!(value["type"], "modal");
        assert_eq!(value["callback_id"], MODAL_CALLBACK_ID);
        assert_eq!(value["blocks"][0]["type"], "input");
        assert_eq!(value["blocks"][0]["block_id"], MESSAGE_BLOCK_ID);
        assert_eq!(value["blocks"][0]["element"]["type"], "plain_text_input");
        assert_eq!(value["blocks"][0]["element"]["action_id"], MESSAGE_ACTION_ID);
        assert_eq!(value["blocks"][0]["element"]["max_length"], 100);
    }
}
