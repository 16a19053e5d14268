// Chat cards announcing new tickets

use crate::enrich::{EnrichedTicket, fix_email, format_asset_link};
use crate::error::{IntakeError, Result};
use serde::Serialize;
use serde_json::{Value, json};
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatCard {
    pub title: String,
    pub subtitle: String,
    /// One text paragraph per section. Basic HTML is allowed.
    pub sections: Vec<String>,
    pub image_url: Option<String>,
}

impl ChatCard {
    /// Webhook body in the chat service's card format.
    pub fn payload(&self) -> Value {
        let mut header = json!({
            "title": self.title,
            "subtitle": self.subtitle,
        });
        if let Some(image) = &self.image_url {
            header["imageUrl"] = json!(image);
            header["imageStyle"] = json!("IMAGE");
        }
        let sections: Vec<Value> = self
            .sections
            .iter()
            .map(|text| json!({ "widgets": [{ "textParagraph": { "text": text } }] }))
            .collect();

        json!({ "cards": [{ "header": header, "sections": sections }] })
    }
}

#[async_trait::async_trait]
pub trait Notifier: Send + Sync {
    async fn send_card(&self, card: &ChatCard) -> Result<()>;
}

/// Posts cards to an incoming webhook.
pub struct WebhookNotifier {
    client: reqwest::Client,
    url: Url,
}

impl WebhookNotifier {
    pub fn new(url: Url, timeout_secs: u64) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("formgraph/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(timeout_secs.div_ceil(2)))
            .build()?;
        Ok(Self { client, url })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }
}

#[async_trait::async_trait]
impl Notifier for WebhookNotifier {
    async fn send_card(&self, card: &ChatCard) -> Result<()> {
        debug!("Posting card '{}' to {}", card.title, self.url);
        let response = self
            .client
            .post(self.url.clone())
            .json(&card.payload())
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(IntakeError::Webhook {
                status: status.as_u16(),
                body,
            });
        }
        info!("Card sent ({})", status);
        Ok(())
    }
}

/// Writes cards to the log instead of a chat channel.
#[derive(Debug, Default)]
pub struct LogNotifier;

#[async_trait::async_trait]
impl Notifier for LogNotifier {
    async fn send_card(&self, card: &ChatCard) -> Result<()> {
        info!("{} | {}", card.title, card.subtitle);
        for section in &card.sections {
            info!("  {}", section.replace('\n', " / "));
        }
        Ok(())
    }
}

fn mail_links(ticket: &EnrichedTicket) -> String {
    let email = fix_email(&ticket.form_email);
    let mut links = Vec::new();
    if !email.is_empty() {
        links.push(format!("<a href=\"mailto:{}\">Email user</a>", email));
    }
    if !ticket.advisor_emails.is_empty() {
        let advisors = ticket
            .advisor_emails
            .iter()
            .map(|e| fix_email(e))
            .collect::<Vec<_>>()
            .join(",");
        links.push(format!(
            "<a href=\"mailto:{},{}\">Email user + advisor</a>",
            email, advisors
        ));
        let contacts = ticket
            .person
            .as_ref()
            .map(|p| p.contacts.join(","))
            .unwrap_or_default();
        if !contacts.is_empty() {
            links.push(format!(
                "<a href=\"mailto:{},{},{}\">Email user + advisor + family</a>",
                email, advisors, contacts
            ));
        }
    }
    links.join("\n")
}

/// Card for a newly created ticket.
pub fn ticket_card(ticket: &EnrichedTicket, number: Option<u64>, manage_url: Option<&str>) -> ChatCard {
    let title = match number {
        Some(n) => format!(
            "New Chromebook Ticket #{} - Priority {}",
            n,
            ticket.priority_label()
        ),
        None => format!("New Chromebook Ticket - Priority {}", ticket.priority_label()),
    };

    let mut subtitle = fix_email(&ticket.form_email);
    if !ticket.submitted_by.is_empty() && ticket.submitted_by != ticket.form_email {
        subtitle.push_str(&format!(" (submitted by {})", ticket.submitted_by));
    }
    if let Some(person) = &ticket.person {
        if let Some(advisor) = &person.advisor {
            subtitle.push_str(&format!(" (Advisor: {})", advisor));
        }
        if let Some(role) = &person.role {
            match &person.school {
                Some(school) => subtitle.push_str(&format!(" ({} {})", school, role)),
                None => subtitle.push_str(&format!(" ({})", role)),
            }
        }
    }

    let mut sections = Vec::new();
    if let Some(name) = &ticket.form_name {
        sections.push(format!("Name: {}", name));
    }
    if !ticket.grade.is_empty() {
        sections.push(ticket.grade.clone());
    }
    if let Some(tag) = &ticket.form_asset {
        let mut row = format!(
            "<b>Asset Tag</b>: {} (<i>as reported by user</i>)",
            format_asset_link(tag)
        );
        if let Some(asset) = &ticket.asset {
            row.push_str(&format!(
                "\n<b>Inventory Info</b> {} {} ({})",
                asset.make.as_deref().unwrap_or("?"),
                asset.model.as_deref().unwrap_or("?"),
                asset.serial.as_deref().unwrap_or("?")
            ));
        }
        sections.push(row);
    }
    if let Some(person) = ticket.person.as_ref().filter(|p| !p.signed_out_assets.is_empty()) {
        sections.push(format!(
            "User has signed out: {}",
            person.signed_out_assets.join(", ")
        ));
    }

    let mut find_them = vec!["<b>Where to find them:</b>".to_string()];
    if let Some(schedule) = &ticket.schedule {
        if !schedule.advisory.is_empty() {
            find_them.push(format!("<i>Advisory: </i>{}", schedule.advisory));
        }
        if !schedule.free_blocks.is_empty() {
            find_them.push(format!("<i>Study blocks:</i> {}", schedule.free_blocks));
        }
    }
    if let Some(notes) = &ticket.appointment_notes {
        find_them.push(format!("<i>Notes from student: </i>{}", notes));
    }
    if find_them.len() > 1 {
        sections.push(find_them.join("\n"));
    }

    sections.push(format!(
        "<b>Problem:</b> {}\n<b>Description:</b> {}",
        ticket.problem, ticket.description
    ));

    let links = mail_links(ticket);
    if !links.is_empty() {
        sections.push(links);
    }

    if let (Some(form_name), Some(directory_name)) =
        (ticket.form_name.as_deref(), ticket.directory_name())
    {
        if form_name != directory_name {
            sections.push(format!("Name in form: {}", form_name));
            sections.push(format!("vs. Name via email: {}", directory_name));
        }
    }
    if let Some(edit) = &ticket.edit_url {
        sections.push(format!(
            "<a href=\"{}\">Edit this response</a> (will push it onto the list again)",
            edit
        ));
    }
    if let Some(url) = manage_url {
        sections.push(format!(
            "Manage this ticket in <a href=\"{}\">the ticket spreadsheet.</a>",
            url
        ));
    }

    ChatCard {
        title,
        subtitle,
        sections,
        image_url: ticket.image_url.clone(),
    }
}
