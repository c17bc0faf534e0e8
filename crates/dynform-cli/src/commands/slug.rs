//! Slug command

use crate::output::OutputFormat;
use anyhow::Result;
use dynform_engine::slugify;
use serde::Serialize;
use tabled::Tabled;

#[derive(Debug, Clone, Serialize, Tabled)]
pub struct Slug {
    pub name: String,
    pub slug: String,
}

pub fn handle(name: &str, format: OutputFormat) -> Result<()> {
    let slug = slugify(name);
    anyhow::ensure!(!slug.is_empty(), "name {:?} has no characters usable in a slug", name);
    let data = Slug {
        name: name.to_string(),
        slug,
    };
    match format {
        OutputFormat::Table => println!("{}", data.slug),
        _ => format.print(&data, |d| vec![d.clone()])?,
    }
    Ok(())
}
