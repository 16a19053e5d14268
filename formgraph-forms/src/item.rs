use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque id of a live form item.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemHandle(String);

impl ItemHandle {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ItemHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ItemHandle {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
    PageBreak,
    MultipleChoice,
    Checkbox,
    Text,
    ParagraphText,
    SectionHeader,
}

impl ItemKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemKind::PageBreak => "page_break",
            ItemKind::MultipleChoice => "multiple_choice",
            ItemKind::Checkbox => "checkbox",
            ItemKind::Text => "text",
            ItemKind::ParagraphText => "paragraph_text",
            ItemKind::SectionHeader => "section_header",
        }
    }
}

/// Where the respondent goes after picking a choice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "target", rename_all = "snake_case")]
pub enum Navigation {
    /// Continue to the next page in sequence
    Continue,
    /// Jump to a page break item
    GoTo(ItemHandle),
    /// Submit the form
    Submit,
    /// Start the form over
    Restart,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Choice {
    pub value: String,
    pub navigation: Navigation,
}

impl Choice {
    pub fn new(value: impl Into<String>, navigation: Navigation) -> Self {
        Self {
            value: value.into(),
            navigation,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormItem {
    pub handle: ItemHandle,
    pub kind: ItemKind,
    pub title: String,
    #[serde(default)]
    pub help_text: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub choices: Vec<Choice>,
}

impl FormItem {
    pub fn new(handle: ItemHandle, kind: ItemKind, title: String, help_text: String) -> Self {
        Self {
            handle,
            kind,
            title,
            help_text,
            choices: Vec::new(),
        }
    }
}
