//! Slack webhook handling for tonecheck.
//!
//! - **Payloads** (`payloads`) - envelopes, signature gate, typed webhook bodies
//! - **Router** (`router`) - dispatch by payload type; handlers live in `events`,
//!   `commands` and `interactions`
//! - **Blocks** (`blocks`) - attachments and the reply message modal
//! - **Notifier** (`notifier`) - `chat.postMessage` and `views.open`
//! - **Oracle** (`oracle`) - sentiment scoring client
//!
//! # Flow
//!
//! ```text
//! /tt-add-message → correlation entry → modal → submission → channel configuration
//! message event → oracle → classification → channel reply (when negative)
//! ```

pub mod blocks;
pub mod commands;
pub mod events;
pub mod interactions;
pub mod notifier;
pub mod oracle;
pub mod payloads;
pub mod router;

#[cfg(test)]
mod test_support;

pub use notifier::{Notifier, NotifierError, RecordingNotifier, SlackNotifier};
pub use oracle::{HttpSentimentOracle, OracleError, SentimentOracle, StaticSentimentOracle};
pub use payloads::{Endpoint, VerifiedRequest, WebhookEnvelope, WebhookKind};
pub use router::{RouterSettings, WebhookReply, WebhookRouter};
