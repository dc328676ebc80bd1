use std::path::PathBuf;

use colored::Colorize;

use crate::prelude::{eprintln, println, *};

#[derive(Debug, clap::Args)]
pub struct Options {
    /// Path to the PDF file
    pub path: PathBuf,

    /// Write the outline JSON here instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

pub async fn run(options: Options, global: crate::Global) -> Result<()> {
    let extractor = crate::settings::extractor(&global)?;
    let doc = decode_pdf(&options.path)?;
    let outline = extractor.extract(&doc.fragments, doc.primary_page_size());
    let json = serde_json::to_string_pretty(&outline)?;

    match options.output {
        Some(out) => {
            std::fs::write(&out, json).wrap_err_with(|| f!("cannot write {}", out.display()))?;
            if global.verbose {
                eprintln!(
                    "{} {} -> {} ({} headings)",
                    "wrote".green(),
                    options.path.display(),
                    out.display(),
                    outline.outline.len()
                );
            }
        }
        None => println!("{}", json),
    }
    Ok(())
}
