pub mod el64;

pub use el64::{load_distributed, load_local, DistributedEdgeList};
