use std::error::Error;
use std::fs;
use std::io;
use std::path::Path;
use std::path::PathBuf;

use clap::Parser;
use clap::Subcommand;
use clap::ValueEnum;
use itertools::Itertools;
use log::info;
use log::LevelFilter;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Deserialize;

use celltree::tree::random::random_dendrogram;
use celltree::tree::table;
use celltree::tree::table::TableError;
use celltree::wasserstein;
use celltree::TransportOptions;
use celltree::TransportSolver;
use celltree::TreeModel;

/// celltree - algorithms on cell-type dendrograms
#[derive(Parser)]
#[command(name = "celltree")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Raise log verbosity (-v info, -vv debug); RUST_LOG also applies
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the cophenetic distance matrix of the leaves as CSV
    Distances {
        /// Tree table (CSV)
        tree: PathBuf,
        /// Restrict the matrix to these labels, in this order
        #[arg(short, long, value_delimiter = ',')]
        labels: Option<Vec<String>>,
    },
    /// Print the merge sequence, or apply it to a list of labels
    Merges {
        tree: PathBuf,
        /// File with one label per line, relabelled by the merges
        #[arg(short, long)]
        labels: Option<PathBuf>,
        /// Number of merges to apply (default: all)
        #[arg(short = 'n', long)]
        n_merges: Option<usize>,
    },
    /// Remove pass-through nodes
    Simplify {
        tree: PathBuf,
        /// Output table (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Extract the subtree below a node
    Subtree {
        tree: PathBuf,
        node: String,
        /// Recompute x positions of the extracted tree
        #[arg(long)]
        layout: bool,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Recompute x positions
    Layout {
        tree: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Wasserstein distance between two label distributions on the tree
    Wasserstein {
        tree: PathBuf,
        /// CSV with columns label,p,q
        distributions: PathBuf,
        #[arg(long, default_value_t = TransportOptions::default().max_iterations)]
        max_iterations: usize,
        #[arg(long, default_value_t = TransportOptions::default().tolerance)]
        tolerance: f64,
        #[arg(long, value_enum, default_value_t = SolverArg::Transportation)]
        solver: SolverArg,
        /// Also print the transport plan
        #[arg(long)]
        plan: bool,
    },
    /// List every valid classification below a node
    Classify { tree: PathBuf, root: String },
    /// Generate a random dendrogram
    Gen {
        leaves: usize,
        #[arg(short, long)]
        seed: Option<u64>,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum SolverArg {
    /// transportation simplex (MODI)
    Transportation,
    /// general dense two-phase simplex
    Simplex,
}

#[derive(Debug, Deserialize)]
struct DistributionRow {
    label: String,
    p: f64,
    q: f64,
}

fn main() {
    let cli = Cli::parse();
    init_logger(cli.verbose);
    if let Err(e) = run(cli.command) {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn init_logger(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();
}

fn run(command: Commands) -> Result<(), Box<dyn Error>> {
    match command {
        Commands::Distances { tree, labels } => {
            let tree = table::read_table_file(tree)?;
            let mut matrix = tree.cophenetic_distances()?;
            if let Some(labels) = labels {
                matrix = matrix.restrict(&labels)?;
            }
            print!("{matrix}");
        }
        Commands::Merges { tree, labels, n_merges } => {
            let tree = table::read_table_file(tree)?;
            let merges = tree.merge_sequence();
            match labels {
                None => {
                    for (i, merge) in merges.iter().enumerate() {
                        println!("{i}\t{}\t{}", merge.children.iter().join(","), merge.parent);
                    }
                }
                Some(path) => {
                    let mut labels = read_labels(&path)?;
                    let report = celltree::apply_merges(&mut labels, &merges, n_merges.unwrap_or(merges.len()));
                    info!("applied {} of {} merges", report.applied, report.requested);
                    for label in labels {
                        println!("{label}");
                    }
                }
            }
        }
        Commands::Simplify { tree, output } => {
            let tree = table::read_table_file(tree)?;
            let (simplified, removed) = tree.simplify(None)?;
            info!("removed pass-through nodes: {}", removed.join(", "));
            write_tree(&simplified, output.as_deref())?;
        }
        Commands::Subtree { tree, node, layout, output } => {
            let tree = table::read_table_file(tree)?;
            let mut subtree = tree.subtree(&node)?;
            if layout {
                subtree.update_layout()?;
            }
            write_tree(&subtree, output.as_deref())?;
        }
        Commands::Layout { tree, output } => {
            let mut tree = table::read_table_file(tree)?;
            tree.update_layout()?;
            write_tree(&tree, output.as_deref())?;
        }
        Commands::Wasserstein {
            tree,
            distributions,
            max_iterations,
            tolerance,
            solver,
            plan,
        } => {
            let tree = table::read_table_file(tree)?;
            let rows = read_distributions(&distributions)?;
            let labels: Vec<&str> = rows.iter().map(|row| row.label.as_str()).collect();
            let p: Vec<f64> = rows.iter().map(|row| row.p).collect();
            let q: Vec<f64> = rows.iter().map(|row| row.q).collect();
            let cost = tree.cophenetic_distances()?.restrict(&labels)?.rows();
            let options = TransportOptions {
                max_iterations,
                tolerance,
                solver: solver.into(),
            };
            let result = wasserstein(&p, &q, &cost, &options)?;
            println!("{}", result.cost());
            if plan {
                println!(",{}", labels.join(","));
                for (label, row) in labels.iter().zip(result.plan()) {
                    println!("{},{}", label, row.iter().join(","));
                }
            }
        }
        Commands::Classify { tree, root } => {
            let tree = table::read_table_file(tree)?;
            for cut in tree.valid_classifications(&root)? {
                println!("{}", cut.join(" "));
            }
        }
        Commands::Gen { leaves, seed, output } => {
            if leaves < 2 {
                return Err("a dendrogram needs at least 2 leaves".into());
            }
            let mut rng = match seed {
                Some(seed) => StdRng::seed_from_u64(seed),
                None => StdRng::from_entropy(),
            };
            let tree = random_dendrogram(leaves, &mut rng)?;
            write_tree(&tree, output.as_deref())?;
        }
    }
    Ok(())
}

// --------------------------- helpers
impl From<SolverArg> for TransportSolver {
    fn from(arg: SolverArg) -> Self {
        match arg {
            SolverArg::Transportation => TransportSolver::Transportation,
            SolverArg::Simplex => TransportSolver::DenseSimplex,
        }
    }
}
fn write_tree(tree: &TreeModel, output: Option<&Path>) -> Result<(), TableError> {
    match output {
        Some(path) => table::write_table_file(tree, path),
        None => table::write_table(tree, io::stdout().lock()),
    }
}
/// one label per line, blank lines skipped
fn read_labels(path: &Path) -> Result<Vec<String>, io::Error> {
    let content = fs::read_to_string(path)?;
    Ok(content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_owned)
        .collect())
}
fn read_distributions(path: &Path) -> Result<Vec<DistributionRow>, csv::Error> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)?;
    rdr.deserialize().collect()
}
