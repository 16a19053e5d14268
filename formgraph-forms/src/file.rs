use crate::error::{FormError, Result};
use crate::item::{Choice, FormItem, ItemHandle};
use crate::memory::{FormDocument, MemoryForm};
use crate::service::FormService;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use url::Url;

/// A form stored as a JSON document on disk.
///
/// The document is rewritten after every mutation, so an interrupted sync
/// always leaves a readable form behind.
pub struct FileForm {
    path: PathBuf,
    inner: MemoryForm,
}

impl FileForm {
    pub fn open(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let document: FormDocument = serde_json::from_str(&content)?;
        debug!("Opened form '{}' from {}", document.title, path.display());
        Ok(Self {
            path: path.to_path_buf(),
            inner: MemoryForm::from_document(document),
        })
    }

    pub fn create(path: &Path, title: &str) -> Result<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let form = Self {
            path: path.to_path_buf(),
            inner: MemoryForm::new(title),
        };
        form.save()?;
        info!("Created form '{}' at {}", title, path.display());
        Ok(form)
    }

    /// Open a form from a `file://` URL or a plain filesystem path.
    pub fn open_location(location: &str) -> Result<Self> {
        let path = Self::path_from_location(location)?;
        Self::open(&path)
    }

    pub fn path_from_location(location: &str) -> Result<PathBuf> {
        let location = location.trim();
        if location.is_empty() {
            return Err(FormError::InvalidLocation("empty form location".to_string()));
        }

        match Url::parse(location) {
            Ok(url) if url.scheme() == "file" => url
                .to_file_path()
                .map_err(|_| FormError::InvalidLocation(location.to_string())),
            Ok(url) => Err(FormError::InvalidLocation(format!(
                "unsupported scheme '{}' in {}",
                url.scheme(),
                location
            ))),
            // Not a URL at all, treat it as a path
            Err(_) => Ok(PathBuf::from(location)),
        }
    }

    /// The location to persist in settings.
    pub fn location(&self) -> Result<Url> {
        let absolute = if self.path.is_absolute() {
            self.path.clone()
        } else {
            std::env::current_dir()?.join(&self.path)
        };
        Url::from_file_path(&absolute)
            .map_err(|_| FormError::InvalidLocation(absolute.display().to_string()))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn title(&self) -> &str {
        self.inner.title()
    }

    pub fn document(&self) -> &FormDocument {
        self.inner.document()
    }

    fn save(&self) -> Result<()> {
        let json = serde_json::to_string_pretty(self.inner.document())?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl FormService for FileForm {
    fn list_items(&self) -> Result<Vec<FormItem>> {
        self.inner.list_items()
    }

    fn create_page_break(&mut self, title: &str, help_text: &str) -> Result<ItemHandle> {
        let handle = self.inner.create_page_break(title, help_text)?;
        self.save()?;
        Ok(handle)
    }

    fn create_multiple_choice(&mut self, title: &str, help_text: &str) -> Result<ItemHandle> {
        let handle = self.inner.create_multiple_choice(title, help_text)?;
        self.save()?;
        Ok(handle)
    }

    fn set_title(&mut self, handle: &ItemHandle, title: &str) -> Result<()> {
        self.inner.set_title(handle, title)?;
        self.save()
    }

    fn set_help_text(&mut self, handle: &ItemHandle, help_text: &str) -> Result<()> {
        self.inner.set_help_text(handle, help_text)?;
        self.save()
    }

    fn move_item(&mut self, handle: &ItemHandle, before: Option<&ItemHandle>) -> Result<()> {
        self.inner.move_item(handle, before)?;
        self.save()
    }

    fn set_choices(&mut self, handle: &ItemHandle, choices: Vec<Choice>) -> Result<()> {
        self.inner.set_choices(handle, choices)?;
        self.save()
    }
}
