use std::path::{Path, PathBuf};
use std::sync::Arc;

use colored::Colorize;
use futures::stream::{self, StreamExt};
use indicatif::{ProgressBar, ProgressStyle};
use outline_core::OutlineExtractor;

use crate::prelude::{eprintln, println, *};

#[derive(Debug, clap::Args)]
pub struct Options {
    /// Directory containing the PDF files
    pub input: PathBuf,

    /// Directory receiving one `<stem>.json` per PDF (created if missing)
    pub output: PathBuf,

    /// Maximum number of documents processed at once (default: available CPUs)
    #[arg(short, long)]
    pub jobs: Option<usize>,
}

/// Outcome of one successfully processed document.
#[derive(Debug)]
struct Processed {
    output: PathBuf,
    headings: usize,
}

/// `*.pdf` files directly inside `dir`, sorted by name.
fn collect_inputs(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(Error::NotADirectory(dir.to_path_buf()).into());
    }

    let mut inputs = Vec::new();
    for entry in std::fs::read_dir(dir).wrap_err_with(|| f!("cannot list {}", dir.display()))? {
        let path = entry?.path();
        let is_pdf = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"));
        if path.is_file() && is_pdf {
            inputs.push(path);
        }
    }
    inputs.sort();
    Ok(inputs)
}

fn output_path(input: &Path, output_dir: &Path) -> PathBuf {
    let mut name = input.file_stem().unwrap_or(input.as_os_str()).to_os_string();
    name.push(".json");
    output_dir.join(name)
}

/// Decode one PDF, extract its outline and write the JSON next to its peers.
fn process_file(extractor: &OutlineExtractor, input: &Path, output_dir: &Path) -> Result<Processed> {
    let doc = decode_pdf(input)?;
    let outline = extractor.extract(&doc.fragments, doc.primary_page_size());

    let output = output_path(input, output_dir);
    let json = serde_json::to_string_pretty(&outline)?;
    std::fs::write(&output, json).wrap_err_with(|| f!("cannot write {}", output.display()))?;

    Ok(Processed {
        output,
        headings: outline.outline.len(),
    })
}

fn progress_bar(len: usize) -> ProgressBar {
    let bar = ProgressBar::new(len as u64);
    bar.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.cyan} [{bar:30.cyan/blue}] {pos}/{len} {msg}")
            .unwrap(),
    );
    bar
}

pub async fn run(options: Options, global: crate::Global) -> Result<()> {
    let extractor = Arc::new(crate::settings::extractor(&global)?);
    let inputs = collect_inputs(&options.input)?;
    std::fs::create_dir_all(&options.output)
        .wrap_err_with(|| f!("cannot create {}", options.output.display()))?;

    let jobs = options
        .jobs
        .or_else(|| std::thread::available_parallelism().ok().map(|n| n.get()))
        .unwrap_or(1)
        .max(1);
    log::debug!("processing {} documents with {} workers", inputs.len(), jobs);

    let total = inputs.len();
    let bar = progress_bar(total);
    let output_dir = Arc::new(options.output.clone());

    let mut results = stream::iter(inputs)
        .map(|input| {
            let extractor = Arc::clone(&extractor);
            let output_dir = Arc::clone(&output_dir);
            async move {
                let worker_input = input.clone();
                let result = tokio::task::spawn_blocking(move || {
                    process_file(&extractor, &worker_input, &output_dir)
                })
                .await
                .map_err(|e| eyre!("worker panicked: {}", e))
                .and_then(|r| r);
                (input, result)
            }
        })
        .buffer_unordered(jobs);

    let mut failed = 0;
    while let Some((input, result)) = results.next().await {
        let name = input.file_name().unwrap_or_default().to_string_lossy();
        bar.inc(1);
        match result {
            Ok(processed) => {
                bar.set_message(name.to_string());
                if global.verbose {
                    bar.suspend(|| {
                        println!(
                            "{} {} -> {} ({} headings)",
                            "ok".green(),
                            name,
                            processed.output.display(),
                            processed.headings
                        )
                    });
                }
            }
            Err(err) => {
                failed += 1;
                bar.suspend(|| eprintln!("{} {}: {:#}", "failed".red().bold(), name, err));
            }
        }
    }
    bar.finish_and_clear();

    if failed > 0 {
        return Err(Error::BatchFailed { failed, total }.into());
    }
    println!("{} documents written to {}", total, options.output.display());
    Ok(())
}
