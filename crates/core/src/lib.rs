pub mod cipher;
pub mod clock;
pub mod config;
pub mod domain;
pub mod errors;
pub mod sentiment;
pub mod signature;

pub use cipher::{CipherError, FieldCipher};
pub use clock::{Clock, FixedClock, SystemClock};
pub use domain::channel::{ChannelConfiguration, ChannelRegistration, UpsertOutcome};
pub use domain::correlation::{correlation_key, CorrelationEntry};
pub use errors::{
    ApplicationError, DomainError, ExternalService, InterfaceError, RejectionKind,
};
pub use sentiment::{classify, Classification, SentimentError, SentimentModel, SentimentScores};
