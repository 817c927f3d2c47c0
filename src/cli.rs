//! Command-line argument parsing. A flat list of scalar flags with simple
//! defaults is exactly the case `pico-args` is for, matching the rest of
//! this codebase's existing binaries.

use std::path::PathBuf;

use pico_args::Arguments;

use crate::bfs::Algorithm;
use crate::error::{Error, Result};

const HELP: &str = "\
nodelet-bfs

USAGE:
    nodelet-bfs --graph_filename=PATH [OPTIONS]

OPTIONS:
    --graph_filename=PATH       Edge list file to load (required)
    --heavy_threshold=N         Degree at/above which a vertex is heavy (default: unbounded)
    --num_trials=N              Number of BFS trials to run (default: 1)
    --source_vertex=N           Fixed source vertex (default: drawn at random per trial)
    --algorithm=NAME            One of remote_writes, migrating_threads,
                                remote_writes_hybrid, beamer_hybrid (default: beamer_hybrid)
    --alpha=N                   Direction-optimizing alpha parameter (default: 15)
    --beta=N                    Direction-optimizing beta parameter (default: 18)
    --nodelets=N                Number of logical nodelets to emulate (default: physical cores)
    --distributed_load          Use the per-nodelet distributed edge-list loader
    --check_graph               Validate adjacency against the input edge list after construction
    --check_results             Validate the BFS tree after every trial
    --dump_edge_list            Print the loaded edge list before construction
    --dump_graph                Print the constructed adjacency before running BFS
    -h, --help                  Print this message and exit
";

#[derive(Debug)]
pub struct Options {
    pub graph_filename: PathBuf,
    pub heavy_threshold: usize,
    pub num_trials: usize,
    pub source_vertex: Option<usize>,
    pub algorithm: Algorithm,
    pub alpha: usize,
    pub beta: usize,
    pub nodelets: usize,
    pub distributed_load: bool,
    pub check_graph: bool,
    pub check_results: bool,
    pub dump_edge_list: bool,
    pub dump_graph: bool,
}

fn parse_algorithm(raw: &str) -> Result<Algorithm> {
    match raw {
        "remote_writes" => Ok(Algorithm::RemoteWrites),
        "migrating_threads" => Ok(Algorithm::MigratingThreads),
        "remote_writes_hybrid" => Ok(Algorithm::RemoteWritesHybrid),
        "beamer_hybrid" => Ok(Algorithm::BeamerHybrid),
        other => Err(Error::usage(format!(
            "unknown --algorithm '{}': expected one of remote_writes, migrating_threads, \
             remote_writes_hybrid, beamer_hybrid",
            other
        ))),
    }
}

impl Options {
    pub fn parse_from_env() -> Result<Self> {
        let mut args = Arguments::from_env();
        Self::parse(&mut args)
    }

    fn parse(args: &mut Arguments) -> Result<Self> {
        if args.contains(["-h", "--help"]) {
            print!("{}", HELP);
            std::process::exit(0);
        }

        let graph_filename: Option<PathBuf> = args
            .opt_value_from_str("--graph_filename")
            .map_err(|e| Error::usage(e.to_string()))?;
        let graph_filename = graph_filename
            .ok_or_else(|| Error::usage("missing required --graph_filename"))?;
        if !graph_filename.is_file() {
            return Err(Error::usage(format!(
                "--graph_filename {:?} is not a readable file",
                graph_filename
            )));
        }

        let heavy_threshold: usize = args
            .opt_value_from_str("--heavy_threshold")
            .map_err(|e| Error::usage(e.to_string()))?
            .unwrap_or(usize::MAX);
        if heavy_threshold == 0 {
            return Err(Error::usage("--heavy_threshold must be positive"));
        }

        let num_trials: usize = args
            .opt_value_from_str("--num_trials")
            .map_err(|e| Error::usage(e.to_string()))?
            .unwrap_or(1);
        if num_trials == 0 {
            return Err(Error::usage("--num_trials must be positive"));
        }

        let source_vertex: Option<usize> = args
            .opt_value_from_str("--source_vertex")
            .map_err(|e| Error::usage(e.to_string()))?;

        let algorithm_raw: Option<String> = args
            .opt_value_from_str("--algorithm")
            .map_err(|e| Error::usage(e.to_string()))?;
        let algorithm = match algorithm_raw {
            Some(raw) => parse_algorithm(&raw)?,
            None => Algorithm::BeamerHybrid,
        };

        let alpha: usize = args
            .opt_value_from_str("--alpha")
            .map_err(|e| Error::usage(e.to_string()))?
            .unwrap_or(15);
        if alpha == 0 {
            return Err(Error::usage("--alpha must be positive"));
        }

        let beta: usize = args
            .opt_value_from_str("--beta")
            .map_err(|e| Error::usage(e.to_string()))?
            .unwrap_or(18);
        if beta == 0 {
            return Err(Error::usage("--beta must be positive"));
        }

        let nodelets: usize = args
            .opt_value_from_str("--nodelets")
            .map_err(|e| Error::usage(e.to_string()))?
            .unwrap_or_else(|| num_cpus::get_physical().max(1));
        if nodelets == 0 {
            return Err(Error::usage("--nodelets must be positive"));
        }

        let distributed_load = args.contains("--distributed_load");
        let check_graph = args.contains("--check_graph");
        let check_results = args.contains("--check_results");
        let dump_edge_list = args.contains("--dump_edge_list");
        let dump_graph = args.contains("--dump_graph");

        let remaining = args.finish();
        if !remaining.is_empty() {
            return Err(Error::usage(format!(
                "unrecognized arguments: {:?}",
                remaining
            )));
        }

        Ok(Self {
            graph_filename,
            heavy_threshold,
            num_trials,
            source_vertex,
            algorithm,
            alpha,
            beta,
            nodelets,
            distributed_load,
            check_graph,
            check_results,
            dump_edge_list,
            dump_graph,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_zero_heavy_threshold() {
        let mut args = Arguments::from_vec(vec![
            "--graph_filename=Cargo.toml".into(),
            "--heavy_threshold=0".into(),
        ]);
        let err = Options::parse(&mut args).unwrap_err();
        assert!(matches!(err, Error::Usage(_)));
    }

    #[test]
    fn rejects_zero_alpha() {
        let mut args = Arguments::from_vec(vec![
            "--graph_filename=Cargo.toml".into(),
            "--alpha=0".into(),
        ]);
        let err = Options::parse(&mut args).unwrap_err();
        assert!(matches!(err, Error::Usage(_)));
    }

    #[test]
    fn rejects_missing_graph_filename() {
        let mut args = Arguments::from_vec(vec![]);
        let err = Options::parse(&mut args).unwrap_err();
        assert!(matches!(err, Error::Usage(_)));
    }

    #[test]
    fn rejects_unknown_algorithm() {
        let mut args = Arguments::from_vec(vec![
            "--graph_filename=Cargo.toml".into(),
            "--algorithm=not_a_real_algorithm".into(),
        ]);
        let err = Options::parse(&mut args).unwrap_err();
        assert!(matches!(err, Error::Usage(_)));
    }

    #[test]
    fn accepts_minimal_valid_invocation() {
        let mut args = Arguments::from_vec(vec!["--graph_filename=Cargo.toml".into()]);
        let opts = Options::parse(&mut args).unwrap();
        assert_eq!(opts.num_trials, 1);
        assert_eq!(opts.alpha, 15);
        assert_eq!(opts.beta, 18);
        assert_eq!(opts.algorithm, Algorithm::BeamerHybrid);
    }
}
