pub mod chat;
pub mod directory;
pub mod enrich;
pub mod error;
pub mod pipeline;
pub mod submission;
pub mod ticket;

pub use chat::{ChatCard, LogNotifier, Notifier, WebhookNotifier};
pub use directory::{Directory, ScheduleIndex, SheetDirectory};
pub use enrich::EnrichedTicket;
pub use error::IntakeError;
pub use pipeline::{IntakeOptions, IntakeOutcome, IntakePipeline};
pub use submission::FormSubmission;
pub use ticket::{SheetTicketStore, TicketStore};
