// ========================================================================================
//
//                      THE DRIVER: LADNER
//
// ========================================================================================
//
// This binary is thin glue around the library. It owns the input and output buffers,
// resolves the sweep configuration, times one full scan, and checks the result.
//
// ### Phases ###
//
// 1.  **Configuration:** Command-line flags override values from an optional TOML
//     file, which in turn override the hardware-derived defaults.
//
// 2.  **Input Generation:** The input is N = 2^k copies of one constant, so the
//     expected prefix sums are known without a second buffer.
//
// 3.  **Timed Scan:** Heap construction (the up-sweep) and the down-sweep are timed
//     together, as one end-to-end scan.
//
// 4.  **Validation:** Every output element is checked; the first wrong position is
//     reported and the process exits non-zero.

use clap::{Parser, ValueEnum};
use ladner::verify::first_mismatch;
use ladner::{ForkMode, ScanConfig, SumHeap};
use std::path::PathBuf;
use std::process;
use std::time::Instant;

// ========================================================================================
//                         COMMAND-LINE INTERFACE DEFINITION
// ========================================================================================

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ForkModeCli {
    Pool,
    Spawn,
}

impl From<ForkModeCli> for ForkMode {
    fn from(mode: ForkModeCli) -> Self {
        match mode {
            ForkModeCli::Pool => ForkMode::Pool,
            ForkModeCli::Spawn => ForkMode::Spawn,
        }
    }
}

#[derive(Parser, Debug)]
#[clap(
    name = "ladner",
    version,
    about = "Ladner-Fischer parallel prefix sums over an implicit binary heap."
)]
struct Args {
    /// Input length as a power of two: the scan runs over 2^k elements.
    #[arg(long, value_name = "K", default_value_t = 20, value_parser = clap::value_parser!(u32).range(0..=34))]
    log2_len: u32,

    /// Value stored in every input element.
    #[arg(long, default_value_t = 1, allow_negative_numbers = true)]
    fill: i64,

    /// Recursion depth below which branches stop forking (0 = sequential).
    #[arg(long, value_name = "D")]
    fork_depth: Option<usize>,

    /// How forked branches are executed.
    #[arg(long, value_enum)]
    mode: Option<ForkModeCli>,

    /// Size of the global rayon pool used by `--mode pool`.
    #[arg(long, value_name = "T")]
    threads: Option<usize>,

    /// TOML file with `fork_depth` and/or `fork_mode`.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Print every tree node with its value after the scan.
    #[arg(long)]
    dump: bool,
}

// ========================================================================================
//                           THE MAIN ORCHESTRATION LOGIC
// ========================================================================================

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    // --- Phase 1: Configuration ---
    let mut config = match &args.config {
        Some(path) => match ScanConfig::load(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Error loading config '{}': {}", path.display(), e);
                process::exit(1);
            }
        },
        None => ScanConfig::default(),
    };
    if let Some(fork_depth) = args.fork_depth {
        config = config.with_fork_depth(fork_depth);
    }
    if let Some(mode) = args.mode {
        config = config.with_fork_mode(mode.into());
    }
    if let Some(threads) = args.threads {
        if let Err(e) = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
        {
            eprintln!("Error sizing the thread pool: {}", e);
            process::exit(1);
        }
    }
    log::info!(
        "Fork depth {} ({:?}), {} rayon threads",
        config.fork_depth,
        config.fork_mode,
        rayon::current_num_threads()
    );

    // --- Phase 2: Input Generation ---
    let len = 1usize << args.log2_len;
    let input = vec![args.fill; len];
    let mut output = vec![0i64; len];
    eprintln!("> Scanning {} elements of value {}", len, args.fill);

    // --- Phase 3: Timed Scan ---
    let start = Instant::now();
    let heap = match SumHeap::with_config(&input, config) {
        Ok(heap) => heap,
        Err(e) => {
            eprintln!("Fatal error building the sum heap: {}", e);
            process::exit(1);
        }
    };
    if let Err(e) = heap.prefix_sums(&mut output) {
        eprintln!("Fatal error computing prefix sums: {}", e);
        process::exit(1);
    }
    let elapsed = start.elapsed();

    if args.dump {
        for (node, value) in heap.nodes() {
            println!("{node}: {value}");
        }
    }

    // --- Phase 4: Validation ---
    match first_mismatch(&input, &output) {
        None => {
            println!(
                "OK: sum = {} in {:.3}ms",
                heap.sum(),
                elapsed.as_secs_f64() * 1000.0
            );
        }
        Some(position) => {
            println!(
                "FAILED RESULT at {} in {:.3}ms",
                position,
                elapsed.as_secs_f64() * 1000.0
            );
            process::exit(1);
        }
    }
}
