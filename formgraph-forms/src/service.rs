use crate::error::Result;
use crate::item::{Choice, FormItem, ItemHandle};

/// The capability set the synchronizer needs from a live form.
///
/// Every call is a blocking round trip. Implementations must append newly
/// created items to the end of the form, and `move_item` with `before: None`
/// moves the item to the tail.
pub trait FormService {
    /// All items in document order.
    fn list_items(&self) -> Result<Vec<FormItem>>;

    fn create_page_break(&mut self, title: &str, help_text: &str) -> Result<ItemHandle>;

    fn create_multiple_choice(&mut self, title: &str, help_text: &str) -> Result<ItemHandle>;

    fn set_title(&mut self, handle: &ItemHandle, title: &str) -> Result<()>;

    fn set_help_text(&mut self, handle: &ItemHandle, help_text: &str) -> Result<()>;

    /// Move `handle` so it sits immediately before `before`, or at the end.
    fn move_item(&mut self, handle: &ItemHandle, before: Option<&ItemHandle>) -> Result<()>;

    /// Replace the whole choice list of a multiple choice item.
    fn set_choices(&mut self, handle: &ItemHandle, choices: Vec<Choice>) -> Result<()>;
}
