//! Bench/driver CLI
//!
//! Loads a Scene fixture from JSON, runs the pointer analysis from the
//! given entry signatures, and prints run statistics as JSON. Set
//! `RUST_LOG=pta_core=debug` for solver-round tracing.

use clap::Parser;
use pta_core::{DotDump, PointerAnalysis, PtaConfig, Result, Scene};
use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "pta-bench", about = "Run the pointer analysis over a Scene fixture")]
struct Args {
    /// Scene fixture (JSON)
    scene: PathBuf,

    /// Entry function signatures, e.g. `main()`
    #[arg(short, long, default_value = "main()")]
    entry: Vec<String>,

    /// Call-string bound for context sensitivity
    #[arg(short, long, default_value_t = 1)]
    k_limit: usize,

    /// Report locals whose observed classes differ from their declared type
    #[arg(long)]
    type_diff: bool,

    /// Emit graphviz snapshots: off, final, every-round
    #[arg(long, default_value = "off")]
    dot: String,

    /// Directory for graph dumps
    #[arg(long, default_value = "pta_out")]
    output_directory: PathBuf,

    /// Hard cap on solver rounds (0 = run to fixpoint)
    #[arg(long, default_value_t = 0)]
    max_rounds: usize,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();
    let args = Args::parse();

    let dot_dump = match args.dot.as_str() {
        "final" => DotDump::Final,
        "every-round" => DotDump::EveryRound,
        _ => DotDump::Off,
    };
    let config = PtaConfig {
        k_limit: args.k_limit,
        output_directory: args.output_directory,
        dot_dump,
        detect_type_diff: args.type_diff,
        max_rounds: args.max_rounds,
    };

    let file = File::open(&args.scene)?;
    let mut scene: Scene = serde_json::from_reader(BufReader::new(file))?;
    scene.reindex();

    let entries: Vec<&str> = args.entry.iter().map(String::as_str).collect();
    let result = PointerAnalysis::with_config(&scene, config).run_entry_signatures(&entries)?;

    println!("{}", serde_json::to_string_pretty(&result.stats)?);
    for diff in &result.type_diffs {
        println!(
            "type-diff: `{}` declared {} but observed {}",
            scene.value(diff.value).name,
            scene.class(diff.declared).name,
            scene.class(diff.observed).name
        );
    }
    Ok(())
}
