use anyhow::{Context, Result};
use clap::Parser;
use pacman_wfc::{
    DelayTimings, DoubleEdgeRules, Generator, GeneratorConfig, Tileset, Update, algorithm::GenerationProgressBar,
};
use rand::{SeedableRng, rngs::StdRng};
use std::{path::PathBuf, thread::sleep};

/// Level generation configuration.
#[derive(Parser, Debug)]
#[clap(author, version, about)]
struct Config {
    /// Rows.
    #[arg(short = 'H', long, default_value_t = 9)]
    height: usize,

    /// Columns, rounded up to even.
    #[arg(short = 'W', long, default_value_t = 12)]
    width: usize,

    #[arg(short, long)]
    seed: Option<u64>,

    /// Tile catalog in YAML; the bundled Pacman tiles otherwise.
    #[arg(short, long)]
    tileset: Option<PathBuf>,

    /// Double edge rules in YAML; the bundled rules otherwise.
    #[arg(short, long)]
    rules: Option<PathBuf>,

    /// Generator settings in YAML; overrides height and width.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Pause between progress events as a viewer would.
    #[clap(short, long)]
    animate: bool,

    #[clap(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Config::parse();

    let tileset = match &args.tileset {
        Some(path) => Tileset::load(path)?,
        None => Tileset::pacman(),
    };
    let rules = match &args.rules {
        Some(path) => DoubleEdgeRules::load(path)?,
        None => DoubleEdgeRules::pacman(),
    };
    let mut config = match &args.config {
        Some(path) => GeneratorConfig::load(path)?,
        None => GeneratorConfig::new(args.height, args.width)?,
    };
    if !args.animate {
        config = config.with_timings(DelayTimings::none());
    }

    let seed = args.seed.unwrap_or_else(rand::random);
    if args.verbose {
        println!("Height            : {}", config.height);
        println!("Width             : {}", config.width());
        println!("Seed              : {seed}");
        println!("Tiles             : {}", tileset.len());
        println!("Double edge rules : {}", rules.len());
    }

    let cells = config.height * config.gen_width();
    let mut generator = Generator::new(tileset, rules, config, StdRng::seed_from_u64(seed))?;
    let mut progress = GenerationProgressBar::new(cells);

    while generator
        .advance()
        .with_context(|| format!("Generation failed with seed {seed}"))?
    {
        let Some(event) = generator.last_progress() else {
            continue;
        };
        let collapsed = cells - generator.grid().uncollapsed_count();
        progress.observe(event, collapsed);
        if args.verbose && event.update == Update::Reset {
            progress.println(generator.message());
        }
        if args.animate {
            sleep(event.delay);
        }
    }
    progress.finish();

    let level = generator.level().context("Generator stopped before completing")?;
    println!("{level}");
    Ok(())
}
