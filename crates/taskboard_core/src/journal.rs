use crate::error::AppError;
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};
use time::Date;

pub const JOURNAL_DIR_ENV_VAR: &str = "TASKBOARD_JOURNAL_DIR";
const DEFAULT_FOLDER: &str = "日记";
const DEFAULT_FORMAT: &str = "YYYY-MM-DD";
const NOTE_SEPARATOR: &str = "\n\n";

/// Where daily notes live and how they are named.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct JournalConfig {
    pub enabled: bool,
    /// Vault root. Relative to the working directory when unset.
    pub dir: Option<PathBuf>,
    pub folder: String,
    /// Note name pattern using `YYYY`, `MM` and `DD` tokens.
    pub format: String,
}

impl Default for JournalConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            dir: None,
            folder: DEFAULT_FOLDER.to_string(),
            format: DEFAULT_FORMAT.to_string(),
        }
    }
}

impl JournalConfig {
    pub fn root(&self) -> PathBuf {
        self.dir.clone().unwrap_or_else(|| PathBuf::from("."))
    }
}

pub fn render_note_name(format: &str, date: Date) -> String {
    format
        .replace("YYYY", &format!("{:04}", date.year()))
        .replace("MM", &format!("{:02}", u8::from(date.month())))
        .replace("DD", &format!("{:02}", date.day()))
}

/// Vault-relative path of the note for `date`.
pub fn note_path(config: &JournalConfig, date: Date) -> Result<PathBuf, AppError> {
    let name = render_note_name(config.format.trim(), date);
    if name.is_empty() {
        return Err(AppError::invalid_input("journal format is empty"));
    }

    let file_name = if name.ends_with(".md") {
        name
    } else {
        format!("{name}.md")
    };

    let folder = config.folder.trim().trim_matches('/');
    if folder.is_empty() {
        Ok(PathBuf::from(file_name))
    } else {
        Ok(PathBuf::from(folder).join(file_name))
    }
}

/// Note storage. Paths are relative to the vault root.
pub trait NoteVault {
    fn exists(&self, path: &Path) -> bool;

    fn read(&self, path: &Path) -> Result<String, AppError>;

    fn create(&self, path: &Path, content: &str) -> Result<(), AppError>;

    fn append(&self, path: &Path, content: &str) -> Result<(), AppError>;
}

pub struct FsVault {
    root: PathBuf,
}

impl FsVault {
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self { root: root.into() }
    }

    pub fn resolve(&self, path: &Path) -> PathBuf {
        self.root.join(path)
    }
}

impl NoteVault for FsVault {
    fn exists(&self, path: &Path) -> bool {
        self.resolve(path).exists()
    }

    fn read(&self, path: &Path) -> Result<String, AppError> {
        let full = self.resolve(path);
        std::fs::read_to_string(&full)
            .map_err(|err| AppError::io(format!("{}: {}", full.display(), err)))
    }

    fn create(&self, path: &Path, content: &str) -> Result<(), AppError> {
        let full = self.resolve(path);
        if let Some(parent) = full.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let mut file = std::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&full)
            .map_err(|err| AppError::io(format!("{}: {}", full.display(), err)))?;
        file.write_all(content.as_bytes())?;
        Ok(())
    }

    fn append(&self, path: &Path, content: &str) -> Result<(), AppError> {
        let full = self.resolve(path);
        let mut file = std::fs::OpenOptions::new()
            .append(true)
            .open(&full)
            .map_err(|err| AppError::io(format!("{}: {}", full.display(), err)))?;
        file.write_all(content.as_bytes())?;
        Ok(())
    }
}

/// Appends `block` to the note at `path`, creating the note if it is absent.
pub fn merge_into_note(vault: &dyn NoteVault, path: &Path, block: &str) -> Result<(), AppError> {
    if !vault.exists(path) {
        return vault.create(path, block);
    }

    let existing = vault.read(path)?;
    if existing.is_empty() {
        vault.append(path, block)
    } else {
        vault.append(path, &format!("{NOTE_SEPARATOR}{block}"))
    }
}
