//! The money-flow kernel's saga coordinator: the escrow state machine
//! (spec §4.1) bound to the double-entry ledger, the Outbound Mirror, the
//! saga compensation DLQ, and the XP coupling invariant.

pub mod dlq;
pub mod engine;
pub mod mirror;
pub mod processed;
pub mod processor;
pub mod xp;

pub use dlq::{DlqEntry, SagaDlq};
pub use engine::{HandleContext, HandleOutcome, MoneyEngine};
pub use mirror::{MirrorRow, OutboundMirror};
pub use processed::{AuditLog, AuditRow, ProcessedEvent, ProcessedEvents};
pub use processor::{
    FakeProcessor, HoldRequest, PaymentProcessor, ProcessorEffect, RefundRequest, ReleaseRequest, SandboxProcessor,
};
pub use xp::{SledXpLedger, XpLedger};
