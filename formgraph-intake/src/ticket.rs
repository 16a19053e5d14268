use crate::enrich::EnrichedTicket;
use crate::error::Result;
use formgraph_core::data::Workbook;
use formgraph_core::sheets::{self, Record};
use std::collections::BTreeMap;

pub const TICKETS: &str = "Tickets";
pub const FORM_ID_FIELD: &str = "FormID";
pub const NEW_STATUS: &str = "New";

/// Where tickets are kept, keyed by one matching field.
pub trait TicketStore {
    /// Returns the stored record and whether it was newly created.
    fn upsert_record(
        &self,
        table: &str,
        match_field: &str,
        match_value: &str,
        fields: &BTreeMap<String, String>,
    ) -> Result<(Record, bool)>;
}

/// Tickets stored as rows of a workbook sheet.
pub struct SheetTicketStore<'a> {
    wb: &'a Workbook,
}

impl<'a> SheetTicketStore<'a> {
    pub fn new(wb: &'a Workbook) -> Self {
        Self { wb }
    }
}

impl TicketStore for SheetTicketStore<'_> {
    fn upsert_record(
        &self,
        table: &str,
        match_field: &str,
        match_value: &str,
        fields: &BTreeMap<String, String>,
    ) -> Result<(Record, bool)> {
        Ok(sheets::upsert_record(
            self.wb,
            table,
            match_field,
            match_value,
            fields,
        )?)
    }
}

/// Column values written for a ticket. Blank values are left out so that an
/// update never clears a column filled in by hand.
pub fn ticket_fields(ticket: &EnrichedTicket) -> BTreeMap<String, String> {
    let mut fields = BTreeMap::new();
    let mut put = |name: &str, value: Option<&str>| {
        if let Some(value) = value.map(str::trim).filter(|v| !v.is_empty()) {
            fields.insert(name.to_string(), value.to_string());
        }
    };

    let timestamp = ticket.timestamp.format("%Y-%m-%d %H:%M:%S").to_string();
    let priority = ticket.priority.to_string();
    let advisor_emails = ticket.advisor_emails.join(", ");

    put(FORM_ID_FIELD, Some(ticket.form_id.as_str()));
    put("Ticket Status", Some(NEW_STATUS));
    put("Timestamp", Some(timestamp.as_str()));
    put("Form Name", ticket.form_name.as_deref());
    put("FormEmail", Some(ticket.form_email.as_str()));
    put("SubmittedBy", Some(ticket.submitted_by.as_str()));
    put("FormAsset", ticket.form_asset.as_deref());
    put("User Description", Some(ticket.description.as_str()));
    put("Problem", Some(ticket.problem.as_str()));
    put("Priority", Some(priority.as_str()));
    put("Name", ticket.directory_name());
    put("Grade", Some(ticket.grade.as_str()));
    put("Advisor Emails", Some(advisor_emails.as_str()));
    put("Edit", ticket.edit_url.as_deref());
    if let Some(person) = &ticket.person {
        put("Advisor", person.advisor.as_deref());
        put("Role", person.role.as_deref());
        put("School", person.school.as_deref());
    }
    if let Some(schedule) = &ticket.schedule {
        put("Advisory", Some(schedule.advisory.as_str()));
        put("Free Blocks", Some(schedule.free_blocks.as_str()));
    }
    if let Some(asset) = &ticket.asset {
        put("Asset Tag", Some(asset.tag.as_str()));
        put("Make", asset.make.as_deref());
        put("Model", asset.model.as_deref());
        put("Serial", asset.serial.as_deref());
    }
    fields
}
