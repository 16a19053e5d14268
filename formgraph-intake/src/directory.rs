// People, assets and schedules looked up while enriching a ticket

use crate::error::Result;
use formgraph_core::SyncError;
use formgraph_core::data::Workbook;
use formgraph_core::sheets::{Record, read_records};
use serde::Serialize;
use std::collections::HashMap;
use tracing::{debug, warn};

pub const STUDENTS_SHEET: &str = "Students";
pub const STAFF_SHEET: &str = "Staff";
pub const INVENTORY_SHEET: &str = "Inventory";
pub const SCHEDULES_SHEET: &str = "StudentSchedules";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PersonKind {
    Student,
    Staff,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Person {
    pub kind: PersonKind,
    pub name: String,
    pub email: String,
    pub lasid: Option<String>,
    pub yog: Option<String>,
    pub advisor: Option<String>,
    pub role: Option<String>,
    pub school: Option<String>,
    pub signed_out_assets: Vec<String>,
    /// Family contact emails
    pub contacts: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Asset {
    pub tag: String,
    pub make: Option<String>,
    pub model: Option<String>,
    pub serial: Option<String>,
    pub yop: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScheduleEntry {
    pub advisory: String,
    pub free_blocks: String,
}

/// LASID -> advisory and free blocks. Built for one intake run and dropped
/// with it, so a changed schedule sheet is picked up on the next submission.
#[derive(Debug, Clone, Default)]
pub struct ScheduleIndex {
    entries: HashMap<String, ScheduleEntry>,
}

impl ScheduleIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, lasid: &str, entry: ScheduleEntry) {
        self.entries.insert(normalize_lasid(lasid), entry);
    }

    pub fn lookup(&self, lasid: &str) -> Option<&ScheduleEntry> {
        self.entries.get(&normalize_lasid(lasid))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// Numeric ids may arrive as "2689", " 2689" or "02689"
fn normalize_lasid(lasid: &str) -> String {
    let trimmed = lasid.trim();
    trimmed
        .parse::<u64>()
        .map(|n| n.to_string())
        .unwrap_or_else(|_| trimmed.to_string())
}

/// Asset tags were once printed with a letter O where a zero belongs.
pub fn normalize_asset_tag(tag: &str) -> String {
    let tag = tag.trim();
    match tag.find(['o', 'O']) {
        Some(i) => format!("{}0{}", &tag[..i], &tag[i + 1..]),
        None => tag.to_string(),
    }
}

/// Lookups used to enrich a ticket.
pub trait Directory {
    fn student(&self, email: &str) -> Result<Option<Person>>;

    fn staff(&self, email: &str) -> Result<Option<Person>>;

    fn asset(&self, tag: &str) -> Result<Option<Asset>>;

    /// Emails of every staff member who runs `advisory`.
    fn advisor_emails(&self, advisory: &str) -> Result<Vec<String>>;

    fn schedules(&self) -> Result<ScheduleIndex>;

    /// Students first, then staff.
    fn person(&self, email: &str) -> Result<Option<Person>> {
        match self.student(email)? {
            Some(student) => Ok(Some(student)),
            None => self.staff(email),
        }
    }
}

/// Directory backed by workbook sheets.
pub struct SheetDirectory<'a> {
    wb: &'a Workbook,
}

fn split_list(value: Option<&str>) -> Vec<String> {
    value
        .unwrap_or("")
        .split([',', '\n'])
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

fn non_empty(record: &Record, field: &str) -> Option<String> {
    record
        .get(field)
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(String::from)
}

impl<'a> SheetDirectory<'a> {
    pub fn new(wb: &'a Workbook) -> Self {
        Self { wb }
    }

    /// Records of a sheet, or none when the workbook does not have it.
    fn records(&self, sheet: &str) -> Result<Vec<Record>> {
        match read_records(self.wb, sheet) {
            Ok(records) => Ok(records),
            Err(SyncError::MissingSheet(_)) => {
                debug!("No {} sheet, skipping lookup", sheet);
                Ok(Vec::new())
            }
            Err(e) => Err(e.into()),
        }
    }

    fn find_by_email(&self, sheet: &str, email: &str) -> Result<Option<Record>> {
        let email = email.trim().to_lowercase();
        if email.is_empty() {
            return Ok(None);
        }
        let mut matches = self
            .records(sheet)?
            .into_iter()
            .filter(|r| r.get("Email").map(|e| e.trim().to_lowercase()) == Some(email.clone()));
        let first = matches.next();
        if first.is_some() && matches.next().is_some() {
            warn!("Found multiple {} records for {}, using the first", sheet, email);
        }
        Ok(first)
    }
}

impl Directory for SheetDirectory<'_> {
    fn student(&self, email: &str) -> Result<Option<Person>> {
        let Some(record) = self.find_by_email(STUDENTS_SHEET, email)? else {
            return Ok(None);
        };
        let mut contacts = split_list(record.get("Contact1Email"));
        contacts.extend(split_list(record.get("Contact2Email")));

        Ok(Some(Person {
            kind: PersonKind::Student,
            name: non_empty(&record, "Name").unwrap_or_default(),
            email: non_empty(&record, "Email").unwrap_or_default(),
            lasid: non_empty(&record, "LASID"),
            yog: non_empty(&record, "YOG"),
            advisor: non_empty(&record, "Advisor"),
            role: None,
            school: None,
            signed_out_assets: split_list(record.get("Asset Tag")),
            contacts,
        }))
    }

    fn staff(&self, email: &str) -> Result<Option<Person>> {
        let Some(record) = self.find_by_email(STAFF_SHEET, email)? else {
            return Ok(None);
        };
        Ok(Some(Person {
            kind: PersonKind::Staff,
            name: non_empty(&record, "Full Name").unwrap_or_default(),
            email: non_empty(&record, "Email").unwrap_or_default(),
            lasid: None,
            yog: None,
            advisor: None,
            role: non_empty(&record, "Role"),
            school: non_empty(&record, "School (Short)"),
            signed_out_assets: split_list(record.get("Asset Tag")),
            contacts: Vec::new(),
        }))
    }

    fn asset(&self, tag: &str) -> Result<Option<Asset>> {
        let tag = normalize_asset_tag(tag);
        if tag.is_empty() {
            return Ok(None);
        }
        let record = self
            .records(INVENTORY_SHEET)?
            .into_iter()
            .find(|r| r.get("Asset Tag").map(str::trim) == Some(tag.as_str()));

        Ok(record.map(|r| Asset {
            tag: tag.clone(),
            make: non_empty(&r, "Make"),
            model: non_empty(&r, "Model"),
            serial: non_empty(&r, "Serial"),
            yop: non_empty(&r, "YOP"),
        }))
    }

    fn advisor_emails(&self, advisory: &str) -> Result<Vec<String>> {
        let advisory = advisory.trim().to_lowercase();
        if advisory.is_empty() {
            return Ok(Vec::new());
        }
        Ok(self
            .records(STAFF_SHEET)?
            .iter()
            .filter(|r| r.get("Advisory").map(|a| a.trim().to_lowercase()) == Some(advisory.clone()))
            .filter_map(|r| non_empty(r, "Email"))
            .collect())
    }

    fn schedules(&self) -> Result<ScheduleIndex> {
        let mut index = ScheduleIndex::new();
        for record in self.records(SCHEDULES_SHEET)? {
            let Some(lasid) = non_empty(&record, "LASID") else {
                continue;
            };
            index.insert(
                &lasid,
                ScheduleEntry {
                    advisory: non_empty(&record, "Advisory").unwrap_or_default(),
                    free_blocks: non_empty(&record, "Free Blocks").unwrap_or_default(),
                },
            );
        }
        debug!("Loaded {} schedule entries", index.len());
        Ok(index)
    }
}
