use crate::chat::{Notifier, ticket_card};
use crate::directory::Directory;
use crate::enrich::{EnrichedTicket, enrich, should_skip_ticket};
use crate::error::Result;
use crate::submission::FormSubmission;
use crate::ticket::{FORM_ID_FIELD, TICKETS, TicketStore, ticket_fields};
use chrono::NaiveDate;
use formgraph_core::sheets::Record;
use serde::Serialize;
use tracing::{info, warn};

#[derive(Debug, Clone)]
pub struct IntakeOptions {
    pub ticket_table: String,
    /// Date used for grade calculations.
    pub today: NaiveDate,
    /// Link to where tickets are managed, shown on the card.
    pub manage_url: Option<String>,
}

impl IntakeOptions {
    pub fn new(today: NaiveDate) -> Self {
        Self {
            ticket_table: TICKETS.to_string(),
            today,
            manage_url: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum IntakeOutcome {
    Skipped { reason: String },
    Created { record: Record, ticket: Box<EnrichedTicket> },
    Updated { record: Record, ticket: Box<EnrichedTicket> },
}

impl IntakeOutcome {
    pub fn record(&self) -> Option<&Record> {
        match self {
            IntakeOutcome::Skipped { .. } => None,
            IntakeOutcome::Created { record, .. } | IntakeOutcome::Updated { record, .. } => {
                Some(record)
            }
        }
    }
}

/// Submission -> ticket -> chat card.
pub struct IntakePipeline<'a> {
    directory: &'a dyn Directory,
    store: &'a dyn TicketStore,
    notifier: &'a dyn Notifier,
    options: IntakeOptions,
}

impl<'a> IntakePipeline<'a> {
    pub fn new(
        directory: &'a dyn Directory,
        store: &'a dyn TicketStore,
        notifier: &'a dyn Notifier,
        options: IntakeOptions,
    ) -> Self {
        Self {
            directory,
            store,
            notifier,
            options,
        }
    }

    /// Store a ticket for the submission and announce it if it is new.
    ///
    /// A submission seen before updates its existing ticket without a second
    /// announcement. A failed announcement is logged; the ticket stays stored.
    pub async fn process(&self, submission: &FormSubmission) -> Result<IntakeOutcome> {
        if let Some(reason) = should_skip_ticket(&submission.response_map()) {
            info!("Skipping submission {}: {}", submission.id, reason);
            return Ok(IntakeOutcome::Skipped { reason });
        }

        let ticket = enrich(submission, self.directory, self.options.today)?;
        let fields = ticket_fields(&ticket);
        let (record, created) = self.store.upsert_record(
            &self.options.ticket_table,
            FORM_ID_FIELD,
            &submission.id,
            &fields,
        )?;

        if !created {
            info!(
                "Updated ticket {} for submission {}",
                record.number().map(|n| n.to_string()).unwrap_or(record.id.clone()),
                submission.id
            );
            return Ok(IntakeOutcome::Updated {
                record,
                ticket: Box::new(ticket),
            });
        }

        info!(
            "Created ticket {} for submission {}",
            record.number().map(|n| n.to_string()).unwrap_or(record.id.clone()),
            submission.id
        );
        let card = ticket_card(&ticket, record.number(), self.options.manage_url.as_deref());
        if let Err(e) = self.notifier.send_card(&card).await {
            warn!("Failed to announce ticket for {}: {}", submission.id, e);
        }

        Ok(IntakeOutcome::Created {
            record,
            ticket: Box::new(ticket),
        })
    }
}
