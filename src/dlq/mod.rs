//! # Dead-Letter Routing
//!
//! Failure records and the publishers that push them to broker
//! destinations. See [`records`] for the two record shapes and
//! [`publisher`] for the publish ports.

pub mod publisher;
pub mod records;

pub use publisher::{
    DeadLetterPublisher, DeadLetterSink, InMemoryDeadLetterSink, RawDlqPublisher, SentDeadLetter,
    TypedDlqPublisher,
};
pub use records::{RawDlqReason, RawDlqRecord, TypedDlqReason, TypedDlqRecord};
