use crate::item::ItemHandle;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FormError {
    #[error("Form item not found: {0}")]
    ItemNotFound(ItemHandle),

    #[error("Item {0} is not a multiple choice item")]
    NotMultipleChoice(ItemHandle),

    #[error("Choice on item {item} cannot navigate to {target}: target is not a page break")]
    InvalidChoiceTarget { item: ItemHandle, target: ItemHandle },

    #[error("Invalid form location: {0}")]
    InvalidLocation(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Form document error: {0}")]
    DocumentError(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, FormError>;
