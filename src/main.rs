use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use quartet_nj::consense::write_report;
use quartet_nj::io::{MatrixReader, open_input};
use quartet_nj::newick::write_newick;
use quartet_nj::nj::neighbor_joining;
use quartet_nj::parallel::ParallelConfig;
use quartet_nj::quartet::annotate_with;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Build neighbor-joining trees from distance matrices and annotate every
/// internal edge with its quartet (four-point condition) support.
#[derive(Parser, Debug)]
#[command(name = "quartet-nj", version, about = "Neighbor-joining trees with quartet support values")]
struct Args {
    /// Distance matrix files, optionally gzipped; reads stdin when none are given
    #[arg(value_name = "MATRIX")]
    inputs: Vec<PathBuf>,

    /// Analysis mode: quartet (annotated Newick) | consense (verbose split report)
    #[arg(short = 'm', long = "mode", value_enum, default_value_t = ModeArg::Quartet)]
    mode: ModeArg,

    /// Number of threads; by default all processors are used
    #[arg(short = 't', long = "threads", value_name = "N")]
    threads: Option<String>,

    /// Print progress messages and timings on stderr
    #[arg(short = 'v', long = "verbose", default_value_t = false)]
    verbose: bool,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum ModeArg { Quartet, Consense }

fn main() {
    let args = Args::parse();
    if let Err(e) = run(&args) {
        eprintln!("quartet-nj: {e:#}");
        std::process::exit(1);
    }
}

fn run(args: &Args) -> Result<()> {
    let config = ParallelConfig::with_workers(resolve_threads(args.threads.as_deref()));
    log_if(args.verbose, format!("Using {} threads", config.workers));

    let inputs = if args.inputs.is_empty() {
        vec![PathBuf::from("-")]
    } else {
        args.inputs.clone()
    };

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());

    for input in &inputs {
        let label = input_label(input);
        let reader = open_input(input).with_context(|| label.clone())?;

        let mut t0 = Instant::now();
        for (k, matrix) in MatrixReader::new(reader).enumerate() {
            let matrix = matrix.with_context(|| format!("{label}: matrix {}", k + 1))?;
            let read_s = t0.elapsed().as_secs_f64();
            log_if(args.verbose, format!("Reading matrix {} of {label} ({} taxa) {read_s:.3}s", k + 1, matrix.size()));

            let t1 = Instant::now();
            let mut tree = neighbor_joining(&matrix).with_context(|| format!("{label}: matrix {}", k + 1))?;
            let nj_s = t1.elapsed().as_secs_f64();
            log_if(args.verbose, format!("Neighbor joining {nj_s:.3}s"));

            let t2 = Instant::now();
            annotate_with(&mut tree, &matrix, &config).with_context(|| format!("{label}: matrix {}", k + 1))?;
            let support_s = t2.elapsed().as_secs_f64();
            let annotated = tree.edges().iter().filter(|e| e.branch.support.is_some()).count();
            log_if(args.verbose, format!("Quartet support for {annotated} edges {support_s:.3}s"));

            let t3 = Instant::now();
            match args.mode {
                ModeArg::Quartet => write_newick(&mut out, &tree, matrix.names()),
                ModeArg::Consense => write_report(&mut out, &tree, matrix.names()),
            }
            .context("Failed to write output")?;
            let write_s = t3.elapsed().as_secs_f64();
            log_if(args.verbose, format!("Writing output {write_s:.3}s"));

            t0 = Instant::now();
        }
    }

    out.flush().context("Failed to write output")?;
    Ok(())
}

/// Worker count for the support phase; `0` means one per processor.
///
/// Values that are not a number, or exceed the processor count, are ignored
/// with a warning.
fn resolve_threads(requested: Option<&str>) -> usize {
    let Some(raw) = requested else {
        return 0;
    };
    let Ok(t) = raw.parse::<usize>() else {
        eprintln!("quartet-nj: expected a number for -t, but '{raw}' was given; ignoring -t");
        return 0;
    };
    let available = num_cpus::get();
    if t > available {
        eprintln!(
            "quartet-nj: the number of threads to be used ({t}) is greater than the number of available processors; ignoring -t {t}"
        );
        return 0;
    }
    t
}

fn input_label(input: &Path) -> String {
    if input.as_os_str() == "-" {
        "stdin".to_string()
    } else {
        input.display().to_string()
    }
}

fn log_if(show: bool, msg: String) {
    if show { eprintln!("{}", msg); }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_threads() {
        assert_eq!(resolve_threads(None), 0);
        assert_eq!(resolve_threads(Some("1")), 1);
        assert_eq!(resolve_threads(Some("four")), 0);
        assert_eq!(resolve_threads(Some("")), 0);
        let too_many = (num_cpus::get() + 1).to_string();
        assert_eq!(resolve_threads(Some(too_many.as_str())), 0);
    }
}
