//! The `pic add` command: index negatives and run them through a recipe.

use clap::Args;
use pic_core::{Picture, Pipeline, Recipe};

use crate::Interrupt;

#[derive(Args, Debug)]
pub struct AddArgs {
    /// Only add the files to the index, do not process them
    #[arg(short = 'n', long)]
    pub noprocess: bool,

    /// Comma-separated worker recipe overriding the configured default
    #[arg(short = 'r', long)]
    pub recipe: Option<String>,

    /// Negative filenames, relative to the repository root
    #[arg(required = true)]
    pub files: Vec<String>,
}

pub fn execute(repo: &str, args: &AddArgs, interrupt: &Interrupt) -> anyhow::Result<()> {
    // Without processing no workers run, so any connector will do.
    if args.noprocess {
        let (mut loaded, mut conn) = super::open(repo)?;
        for file in &args.files {
            loaded.index.add(Picture::new(file)?)?;
        }
        loaded.save_index(conn.as_mut())?;
        println!("Added {} file(s), processing skipped", args.files.len());
        return Ok(());
    }

    let (mut loaded, mut conn, root) = super::open_local(repo)?;

    // Index the raw records first: a picture dropped by a failing worker
    // keeps its pre-processing entry.
    for file in &args.files {
        loaded.index.add(Picture::new(file)?)?;
    }

    let kinds = args
        .recipe
        .as_deref()
        .unwrap_or(&loaded.config.recipes.default);
    let recipe = Recipe::parse(kinds)?;
    tracing::info!(%recipe, files = args.files.len(), "processing");

    let mut pipeline = Pipeline::new(&recipe, &loaded.config, root);
    pipeline.start();
    for file in &args.files {
        pipeline.put(Picture::new(file)?);
    }

    let processed = pipeline.finish(&interrupt.flag);
    let done = processed.len();
    for picture in processed {
        loaded.index.replace(picture)?;
    }
    // Written even after an interrupt, so partial progress is kept.
    loaded.save_index(conn.as_mut())?;

    println!("Processed {done} of {} file(s)", args.files.len());
    Ok(())
}
