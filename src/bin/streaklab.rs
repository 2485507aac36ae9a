use std::{fs::File, io::BufReader, path::PathBuf};

use anyhow::Context as _;
use clap::Parser;

use streaklab::{PipelineConfig, PngDirSink, run_pipeline};

/// Renders the four pipeline stages (clean field, noisy field, regenerated
/// field, overlaid field) as PNG files.
#[derive(Parser, Debug)]
#[command(name = "streaklab", version)]
struct Cli {
    /// Output directory for the stage PNGs.
    #[arg(long, default_value = "out")]
    out: PathBuf,

    /// Optional pipeline config JSON; flags below override its fields.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Determinism seed.
    #[arg(long)]
    seed: Option<u64>,

    /// Square canvas dimension in pixels.
    #[arg(long)]
    size: Option<u32>,

    /// Number of streaks per generation pass.
    #[arg(long)]
    streaks: Option<usize>,

    /// Also write the regenerated streak ledger as `ledger.json`.
    #[arg(long)]
    dump_ledger: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut cfg = match &cli.config {
        Some(path) => {
            let f = File::open(path).with_context(|| format!("open config '{}'", path.display()))?;
            serde_json::from_reader::<_, PipelineConfig>(BufReader::new(f))
                .with_context(|| "parse config JSON")?
        }
        None => PipelineConfig::default(),
    };
    if let Some(seed) = cli.seed {
        cfg.seed = seed;
    }
    if let Some(size) = cli.size {
        cfg.dimension = size;
    }
    if let Some(streaks) = cli.streaks {
        cfg.streak_count = streaks;
    }

    std::fs::create_dir_all(&cli.out)
        .with_context(|| format!("create output dir '{}'", cli.out.display()))?;

    let mut sink = PngDirSink::new(&cli.out);
    let ledger = run_pipeline(&cfg, &mut sink)?;

    if cli.dump_ledger {
        let path = cli.out.join("ledger.json");
        let f = File::create(&path)
            .with_context(|| format!("create ledger '{}'", path.display()))?;
        serde_json::to_writer_pretty(f, &ledger).with_context(|| "write ledger JSON")?;
        eprintln!("wrote {}", path.display());
    }

    eprintln!(
        "wrote stage1..stage4 PNGs to {} ({} streaks, seed {})",
        cli.out.display(),
        ledger.len(),
        cfg.seed
    );
    Ok(())
}
