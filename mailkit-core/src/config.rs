use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Filesystem layout of a mailkit project.
#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(default)]
pub struct PathsConfig {
    /// Root of the source tree
    pub src: PathBuf,
    /// Directory holding one subdirectory per email template
    pub emails: PathBuf,
    /// Skeleton copied by `boilerplate`
    pub boilerplate: PathBuf,
    /// Template for the landing page listing every email
    pub index: PathBuf,
    /// Directories of shared layouts and includes for page templates
    pub partials: Vec<PathBuf>,
    /// Output tree
    pub dist: PathBuf,
    /// Where per-template zip files are written
    pub zips: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            src: PathBuf::from("./src"),
            emails: PathBuf::from("./src/emails"),
            boilerplate: PathBuf::from("./src/boilerplate"),
            index: PathBuf::from("./src/index.tera"),
            partials: vec![
                PathBuf::from("./src/layout"),
                PathBuf::from("./src/includes"),
            ],
            dist: PathBuf::from("./dist"),
            zips: PathBuf::from("./dist/ZIPS"),
        }
    }
}

impl PathsConfig {
    /// Rebase every relative path onto `root`.
    pub fn rooted_at(&self, root: &std::path::Path) -> Self {
        let join = |p: &PathBuf| root.join(p);
        Self {
            src: join(&self.src),
            emails: join(&self.emails),
            boilerplate: join(&self.boilerplate),
            index: join(&self.index),
            partials: self.partials.iter().map(join).collect(),
            dist: join(&self.dist),
            zips: join(&self.zips),
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(default)]
pub struct ImageOptions {
    /// Re-encode PNG and JPEG files, keeping whichever is smaller
    pub optimize: bool,
    pub jpeg_quality: u8,
}

impl Default for ImageOptions {
    fn default() -> Self {
        Self {
            optimize: false,
            jpeg_quality: 75,
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(default)]
pub struct MjmlOptions {
    pub minify: bool,
}

impl Default for MjmlOptions {
    fn default() -> Self {
        Self { minify: true }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(default)]
pub struct InlineOptions {
    /// Embed local `<link rel="stylesheet">` targets before inlining
    pub links: bool,
    /// Leave `<style>` blocks in the document after inlining. Media
    /// queries only survive inside these blocks.
    pub keep_style_tags: bool,
    /// Directory that stylesheet hrefs are resolved against
    pub relative_to: PathBuf,
}

impl Default for InlineOptions {
    fn default() -> Self {
        Self {
            links: true,
            keep_style_tags: true,
            relative_to: PathBuf::from("."),
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(default)]
pub struct LintOptions {
    pub fail_after_error: bool,
}

impl Default for LintOptions {
    fn default() -> Self {
        Self {
            fail_after_error: true,
        }
    }
}

/// Everything the pipeline needs besides the folder set.
#[derive(Deserialize, Serialize, Debug, Clone, Default)]
#[serde(default)]
pub struct PipelineConfig {
    pub paths: PathsConfig,
    pub images: ImageOptions,
    pub mjml: MjmlOptions,
    pub inline: InlineOptions,
    pub lint: LintOptions,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_project_layout() {
        let config = PipelineConfig::default();
        assert_eq!(config.paths.emails, PathBuf::from("./src/emails"));
        assert_eq!(config.paths.zips, PathBuf::from("./dist/ZIPS"));
        assert!(!config.images.optimize);
        assert!(config.mjml.minify);
        assert!(config.inline.keep_style_tags);
        assert!(config.lint.fail_after_error);
    }

    #[test]
    fn partial_json_fills_in_defaults() {
        let config: PipelineConfig =
            serde_json::from_str(r#"{ "images": { "optimize": true } }"#).unwrap();
        assert!(config.images.optimize);
        assert_eq!(config.images.jpeg_quality, 75);
        assert_eq!(config.paths.dist, PathBuf::from("./dist"));
    }

    #[test]
    fn rooted_at_rebases_every_path() {
        let paths = PathsConfig::default().rooted_at(std::path::Path::new("/project"));
        assert_eq!(paths.emails, PathBuf::from("/project/./src/emails"));
        assert_eq!(paths.partials.len(), 2);
        assert!(paths.partials.iter().all(|p| p.starts_with("/project")));
    }
}
