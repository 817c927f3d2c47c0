use std::process::ExitCode;

use log::info;
use num_format::{Locale, ToFormattedString};

use nodelet_bfs::bfs::Bfs;
use nodelet_bfs::cli::Options;
use nodelet_bfs::error::Result;
use nodelet_bfs::graph;
use nodelet_bfs::input;
use nodelet_bfs::nodelets::Nodelets;
use nodelet_bfs::region_timer::RegionTimings;
use nodelet_bfs::rng::{pick_random_vertex, Lcg64};

fn main() -> ExitCode {
    env_logger::init();
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<()> {
    let opts = Options::parse_from_env()?;
    let nodelets = Nodelets::new(opts.nodelets);
    let timings = RegionTimings::new();

    info!(
        "loading {:?} ({} nodelets emulated)",
        opts.graph_filename, opts.nodelets
    );
    let region = timings.start("load_graph");
    let edge_list = if opts.distributed_load {
        input::load_distributed::<usize>(&opts.graph_filename, nodelets)?
    } else {
        input::load_local::<usize>(&opts.graph_filename, &timings)?
    };
    region.end();

    if opts.dump_edge_list {
        for i in 0..edge_list.num_edges {
            println!("{} {}", edge_list.src[i], edge_list.dst[i]);
        }
    }

    let region = timings.start("build_graph");
    let g = graph::build::<usize>(&edge_list, opts.heavy_threshold, nodelets, &timings)?;
    region.end();
    graph::log_distribution(&g);

    if opts.dump_graph {
        graph::dump_graph(&g);
    }

    if opts.check_graph {
        info!("validating constructed adjacency against the input edge list");
        graph::check_graph(&g, &edge_list)?;
        info!("graph check passed");
    }

    let mut bfs = Bfs::new(&g);
    let mut rng = Lcg64::new(0);

    for trial in 0..opts.num_trials {
        let source = match opts.source_vertex {
            Some(s) => s,
            None => pick_random_vertex(&mut rng, |v| g.degree(v), g.num_vertices())
                .ok_or_else(|| nodelet_bfs::error::Error::usage("graph has no vertex with nonzero degree"))?,
        };

        let region = timings.start("bfs");
        bfs.run(&g, source, opts.algorithm, opts.alpha, opts.beta, &timings)?;
        let elapsed_ms = region.end();

        let traversed = bfs.count_traversed_edges(&g);
        let mteps = if elapsed_ms > 0 {
            (traversed as f64 / 1_000_000.0) / (elapsed_ms as f64 / 1000.0)
        } else {
            0.0
        };

        println!(
            "trial {:>3}: source={:<10} traversed_edges={:>14} elapsed_ms={:>8} {:.3} MTEPS",
            trial,
            source,
            traversed.to_formatted_string(&Locale::en),
            elapsed_ms,
            mteps
        );

        if opts.check_results {
            bfs.check(&g, source)?;
        }

        bfs.clear();
    }

    Ok(())
}
