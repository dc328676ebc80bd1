use outline_core::Lexicon;

use crate::prelude::{eprintln, println, *};

#[derive(Debug, clap::Args)]
pub struct Options {
    /// Ignore `--config` and print the built-in lists
    #[arg(long)]
    pub builtin: bool,
}

pub async fn run(options: Options, global: crate::Global) -> Result<()> {
    let lexicon = if options.builtin {
        Lexicon::builtin()
    } else {
        crate::settings::extractor(&global)?.lexicon().clone()
    };

    if global.verbose {
        let (likely, unlikely) = lexicon.sizes();
        eprintln!("{} likely, {} unlikely words", likely, unlikely);
    }
    println!("{}", lexicon.to_toml()?);
    Ok(())
}
