pub mod archive;
pub mod builder;
pub mod clean;
pub mod config;
pub mod folder;
pub mod images;
pub mod index;
pub mod inline;
pub mod lint;
pub mod mjml;
pub mod page;
pub mod scaffold;
pub mod scanner;
pub mod template;

// Re-export main types
pub use builder::{FolderFailure, Pipeline, PipelineBuilder, PipelineError, Task};
pub use config::PipelineConfig;
pub use folder::{FolderSet, TemplateFolder};
pub use scaffold::ScaffoldOptions;
pub use scanner::FolderScanner;
pub use template::{TemplateError, TemplateRenderer};
