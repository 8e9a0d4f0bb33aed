use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use log::error;

use tbl2pic::{RenderOutcome, RenderSettings, TableRenderer};

/// Render a JSON table into an image
#[derive(Parser, Debug)]
#[command(name = "tbl2pic", version)]
struct Cli {
    /// JSON document with `header`, `data` and optional `settings`
    input: PathBuf,

    /// Output image; the format follows the extension
    output: PathBuf,
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let mut renderer = TableRenderer::new(RenderSettings::default());
    renderer.load_json(&cli.input);
    match renderer.render_table(&cli.output) {
        Ok(RenderOutcome::Saved { .. } | RenderOutcome::NothingToRender) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Rendering {} failed: {}", cli.input.display(), e);
            ExitCode::FAILURE
        }
    }
}
