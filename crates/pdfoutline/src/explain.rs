use std::path::PathBuf;

use colored::Colorize;
use outline_core::{CandidateTrace, Decision};

use crate::prelude::{println, *};

#[derive(Debug, clap::Args)]
pub struct Options {
    /// Path to the PDF file
    pub path: PathBuf,

    /// Only list candidates that became headings
    #[arg(long)]
    pub accepted: bool,

    /// Output the traces as JSON
    #[arg(long)]
    pub json: bool,
}

fn decision_label(decision: &Decision) -> String {
    match decision {
        Decision::Accepted { level } => level.to_string().green().bold().to_string(),
        Decision::Duplicate { level } => f!("{} (duplicate)", level).yellow().to_string(),
        Decision::BelowThreshold => "below threshold".dimmed().to_string(),
        Decision::Rejected { reason } => reason.to_string().red().to_string(),
    }
}

fn print_table(traces: &[&CandidateTrace]) {
    let mut table = new_table();
    table.add_row(prettytable::row![
        "Page", "Text", "Size", "Font", "Pos", "Style", "Total", "Decision"
    ]);

    for trace in traces {
        let text = trace.text.as_deref().unwrap_or(&trace.anchor);
        let (font, position, style, total) = match &trace.score {
            Some(s) => (
                f!("{:.1}", s.font),
                f!("{:.1}", s.position),
                f!("{:.1}", s.style),
                f!("{:.1}", s.total()),
            ),
            None => Default::default(),
        };
        table.add_row(prettytable::row![
            trace.page,
            text,
            f!("{:.1}", trace.font_size),
            font,
            position,
            style,
            total,
            decision_label(&trace.decision)
        ]);
    }

    table.printstd();
}

pub async fn run(options: Options, global: crate::Global) -> Result<()> {
    let extractor = crate::settings::extractor(&global)?;
    let doc = decode_pdf(&options.path)?;
    let traces = extractor.trace(&doc.fragments, doc.primary_page_size());

    let shown: Vec<&CandidateTrace> = traces
        .iter()
        .filter(|t| !options.accepted || matches!(t.decision, Decision::Accepted { .. }))
        .collect();

    if options.json {
        println!("{}", serde_json::to_string_pretty(&shown)?);
        return Ok(());
    }

    print_table(&shown);
    if global.verbose {
        let accepted = traces
            .iter()
            .filter(|t| matches!(t.decision, Decision::Accepted { .. }))
            .count();
        println!(
            "\n{} candidates, {} headings",
            traces.len(),
            accepted.to_string().bold()
        );
    }
    Ok(())
}
