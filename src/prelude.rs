pub use crate::bfs::{Algorithm, Bfs};
pub use crate::error::{Error, Result};
pub use crate::graph::{build, check_graph, dump_graph, log_distribution, Graph};
pub use crate::index::Idx;
pub use crate::input::{load_distributed, load_local, DistributedEdgeList};
pub use crate::nodelets::Nodelets;
