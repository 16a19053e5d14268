use crate::error::{FormError, Result};
use crate::item::{Choice, FormItem, ItemHandle, ItemKind, Navigation};
use crate::service::FormService;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Serializable state of a form: its title and ordered items.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormDocument {
    pub title: String,
    pub next_id: u64,
    pub items: Vec<FormItem>,
}

impl FormDocument {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            next_id: 1,
            items: Vec::new(),
        }
    }
}

/// In-process form backend.
#[derive(Debug, Clone)]
pub struct MemoryForm {
    document: FormDocument,
}

impl MemoryForm {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            document: FormDocument::new(title),
        }
    }

    pub fn from_document(document: FormDocument) -> Self {
        Self { document }
    }

    pub fn document(&self) -> &FormDocument {
        &self.document
    }

    pub fn title(&self) -> &str {
        &self.document.title
    }

    /// Append an item of any kind, including kinds the synchronizer never creates.
    pub fn push_item(&mut self, kind: ItemKind, title: &str, help_text: &str) -> ItemHandle {
        let handle = ItemHandle::new(self.document.next_id.to_string());
        self.document.next_id += 1;
        self.document.items.push(FormItem::new(
            handle.clone(),
            kind,
            title.to_string(),
            help_text.to_string(),
        ));
        debug!("Created {} item {}", kind.as_str(), handle);
        handle
    }

    pub fn item(&self, handle: &ItemHandle) -> Option<&FormItem> {
        self.document.items.iter().find(|i| &i.handle == handle)
    }

    fn position(&self, handle: &ItemHandle) -> Result<usize> {
        self.document
            .items
            .iter()
            .position(|i| &i.handle == handle)
            .ok_or_else(|| FormError::ItemNotFound(handle.clone()))
    }

    fn item_mut(&mut self, handle: &ItemHandle) -> Result<&mut FormItem> {
        let idx = self.position(handle)?;
        Ok(&mut self.document.items[idx])
    }
}

impl FormService for MemoryForm {
    fn list_items(&self) -> Result<Vec<FormItem>> {
        Ok(self.document.items.clone())
    }

    fn create_page_break(&mut self, title: &str, help_text: &str) -> Result<ItemHandle> {
        Ok(self.push_item(ItemKind::PageBreak, title, help_text))
    }

    fn create_multiple_choice(&mut self, title: &str, help_text: &str) -> Result<ItemHandle> {
        Ok(self.push_item(ItemKind::MultipleChoice, title, help_text))
    }

    fn set_title(&mut self, handle: &ItemHandle, title: &str) -> Result<()> {
        self.item_mut(handle)?.title = title.to_string();
        Ok(())
    }

    fn set_help_text(&mut self, handle: &ItemHandle, help_text: &str) -> Result<()> {
        self.item_mut(handle)?.help_text = help_text.to_string();
        Ok(())
    }

    fn move_item(&mut self, handle: &ItemHandle, before: Option<&ItemHandle>) -> Result<()> {
        if before == Some(handle) {
            return Ok(());
        }
        // Resolve the anchor before removing anything so a bad anchor leaves the form untouched
        if let Some(anchor) = before {
            self.position(anchor)?;
        }

        let from = self.position(handle)?;
        let item = self.document.items.remove(from);
        let to = match before {
            Some(anchor) => self.position(anchor)?,
            None => self.document.items.len(),
        };
        self.document.items.insert(to, item);
        debug!("Moved item {} from {} to {}", handle, from, to);
        Ok(())
    }

    fn set_choices(&mut self, handle: &ItemHandle, choices: Vec<Choice>) -> Result<()> {
        let idx = self.position(handle)?;
        if self.document.items[idx].kind != ItemKind::MultipleChoice {
            return Err(FormError::NotMultipleChoice(handle.clone()));
        }

        for choice in &choices {
            if let Navigation::GoTo(target) = &choice.navigation {
                let is_page = self
                    .item(target)
                    .is_some_and(|t| t.kind == ItemKind::PageBreak);
                if !is_page {
                    return Err(FormError::InvalidChoiceTarget {
                        item: handle.clone(),
                        target: target.clone(),
                    });
                }
            }
        }

        self.document.items[idx].choices = choices;
        Ok(())
    }
}
