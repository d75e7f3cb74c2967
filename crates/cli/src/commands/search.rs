//! Catalog search command

use std::sync::Arc;

use anyhow::Result;
use clap::Args;
use colored::Colorize;

use labpull_client::{catalog, PanelClient};
use labpull_common::CatalogItem;

use crate::output::{print_info, print_list, OutputFormat, TableDisplay};

#[derive(Args)]
pub struct SearchArgs {
    /// Server-side query passed through to the catalog search
    pub query: Option<String>,

    /// Client-side filter on image names (case-insensitive)
    #[arg(short, long)]
    pub filter: Option<String>,
}

impl TableDisplay for CatalogItem {
    fn headers() -> Vec<&'static str> {
        vec!["ID", "Name", "Size"]
    }

    fn row(&self) -> Vec<String> {
        vec![self.id.to_string(), self.name.clone(), self.size.clone()]
    }
}

pub async fn execute(args: SearchArgs, api: Arc<PanelClient>, format: OutputFormat) -> Result<()> {
    let sections = catalog::search(api.as_ref(), args.query.as_deref()).await?;

    let sections = match args.filter.as_deref() {
        Some(term) => catalog::filter_sections(&sections, term),
        None => sections,
    };

    if sections.is_empty() {
        print_info("no images matched");
        return Ok(());
    }

    if let OutputFormat::Json = format {
        println!("{}", serde_json::to_string_pretty(&sections)?);
        return Ok(());
    }

    for section in &sections {
        let count = section.items.len();
        println!(
            "{} ({} item{})",
            section.title().bold(),
            count,
            if count == 1 { "" } else { "s" }
        );
        print_list(&section.items, format);
        println!();
    }

    Ok(())
}
