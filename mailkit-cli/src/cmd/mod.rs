use anyhow::{Context, Result};
use mailkit_core::Pipeline;

use crate::config::MailkitConfig;

pub mod boilerplate;
pub mod build;
pub mod clean;
pub mod dev;
pub mod lint;
pub mod pages;
pub mod zip;

/// Discover the template folders once and bind them to a pipeline.
pub fn load_pipeline(config: &MailkitConfig) -> Result<Pipeline> {
    Pipeline::builder()
        .config(config.pipeline())
        .build()
        .context("Could not discover email templates")
}
