use std::ops::Deref;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::config::PathsConfig;

pub const MJML_FILE: &str = "index.mjml";
pub const PAGE_TEMPLATE_FILE: &str = "index.tera";
pub const DATA_FILE: &str = "data.json";
pub const STYLES_DIR: &str = "styles";
pub const IMAGES_DIR: &str = "img";
pub const OUTPUT_FILE: &str = "index.html";

/// The names of every template folder, in directory-listing order.
///
/// Computed once at startup and passed around by reference; folders
/// created afterwards are not picked up until the process restarts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FolderSet(Vec<String>);

impl FolderSet {
    pub fn new(names: Vec<String>) -> Self {
        Self(names)
    }

    pub fn names(&self) -> &[String] {
        &self.0
    }

    /// Resolve every name against the project layout.
    pub fn folders<'a>(&'a self, paths: &'a PathsConfig) -> impl Iterator<Item = TemplateFolder> + 'a {
        self.0.iter().map(move |name| TemplateFolder::new(name, paths))
    }
}

impl Deref for FolderSet {
    type Target = [String];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl FromIterator<String> for FolderSet {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// One email template: its source directory and the matching output directory.
#[derive(Debug, Clone)]
pub struct TemplateFolder {
    pub name: String,
    pub source: PathBuf,
    pub output: PathBuf,
}

impl TemplateFolder {
    pub fn new(name: &str, paths: &PathsConfig) -> Self {
        Self {
            name: name.to_string(),
            source: paths.emails.join(name),
            output: paths.dist.join(name),
        }
    }

    pub fn mjml(&self) -> PathBuf {
        self.source.join(MJML_FILE)
    }

    pub fn page_template(&self) -> PathBuf {
        self.source.join(PAGE_TEMPLATE_FILE)
    }

    pub fn data(&self) -> PathBuf {
        self.source.join(DATA_FILE)
    }

    pub fn styles_dir(&self) -> PathBuf {
        self.source.join(STYLES_DIR)
    }

    pub fn images_dir(&self) -> PathBuf {
        self.source.join(IMAGES_DIR)
    }

    pub fn output_images_dir(&self) -> PathBuf {
        self.output.join(IMAGES_DIR)
    }

    pub fn output_html(&self) -> PathBuf {
        self.output.join(OUTPUT_FILE)
    }
}

/// Write `contents` to `path`, creating parent directories as needed.
pub(crate) fn write_file(path: &Path, contents: impl AsRef<[u8]>) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, contents)
}
