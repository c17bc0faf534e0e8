//! Output formatting

use anyhow::Result;
use clap::ValueEnum;
use serde::Serialize;
use tabled::settings::Style;
use tabled::{Table, Tabled};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
    Yaml,
}

impl OutputFormat {
    /// Parse a config-file value such as `"json"`
    pub fn from_config(value: &str) -> Option<Self> {
        <Self as ValueEnum>::from_str(value, true).ok()
    }

    /// Render `data`; table output uses the rows produced by `rows`
    pub fn render<T, R, F>(&self, data: &T, rows: F) -> Result<String>
    where
        T: Serialize,
        R: Tabled,
        F: FnOnce(&T) -> Vec<R>,
    {
        Ok(match self {
            OutputFormat::Json => serde_json::to_string_pretty(data)?,
            OutputFormat::Yaml => serde_yaml::to_string(data)?,
            OutputFormat::Table => {
                let mut table = Table::new(rows(data));
                table.with(Style::rounded());
                table.to_string()
            }
        })
    }

    pub fn print<T, R, F>(&self, data: &T, rows: F) -> Result<()>
    where
        T: Serialize,
        R: Tabled,
        F: FnOnce(&T) -> Vec<R>,
    {
        println!("{}", self.render(data, rows)?);
        Ok(())
    }
}
