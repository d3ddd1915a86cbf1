use std::path::PathBuf;

use clap::Parser;
use log::info;

use single_orthogonal::io;
use single_orthogonal::Direction;

#[derive(Parser)]
#[command(name = "single-orthogonal")]
#[command(about = "Run a sparse matrix job file and write the result as row,col,value triplets")]
#[command(version)]
struct Cli {
    /// Job file: `<op>,<n>` header followed by triplet lines
    input: PathBuf,

    /// Where to write the result (defaults to `<input>_output.<ext>`)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Log the non-zero count and sum of every non-empty result row
    #[arg(long)]
    summary: bool,
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let output = cli.output.unwrap_or_else(|| io::output_path(&cli.input));
    let result = io::run_job_file::<i64>(&cli.input, &output)?;

    if cli.summary {
        for line in io::summarize(&result, Direction::ROW)? {
            info!("row {}: {} non-zero, sum {}", line.index, line.nonzero, line.sum);
        }
    }
    Ok(())
}
