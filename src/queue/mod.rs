// SQS messaging
//
// The client is wired at startup and exposed through `QueueTemplate`; this
// service only ever produces messages.

pub mod sqs;

pub use sqs::*;
