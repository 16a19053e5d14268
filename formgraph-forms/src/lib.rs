pub mod error;
pub mod file;
pub mod item;
pub mod memory;
pub mod service;

pub use error::FormError;
pub use file::FileForm;
pub use item::{Choice, FormItem, ItemHandle, ItemKind, Navigation};
pub use memory::{FormDocument, MemoryForm};
pub use service::FormService;
