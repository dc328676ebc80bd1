use std::path::PathBuf;

use crate::prelude::{println, *};

#[derive(Debug, clap::Args)]
pub struct Options {
    /// Path to the PDF file
    pub path: PathBuf,

    /// Only show fragments from this page (1-based)
    #[arg(long)]
    pub page: Option<usize>,
}

pub async fn run(options: Options, _global: crate::Global) -> Result<()> {
    let doc = decode_pdf(&options.path)?;
    let fragments: Vec<_> = doc
        .fragments
        .iter()
        .filter(|f| options.page.is_none_or(|page| f.page_number + 1 == page))
        .collect();
    println!("{}", serde_json::to_string_pretty(&fragments)?);
    Ok(())
}
