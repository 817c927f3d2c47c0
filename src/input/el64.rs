//! Binary edge-list loader (`el64` format).
//!
//! A single ASCII header line of space-separated `--key=value` / `--flag`
//! tokens, terminated by `\n`, followed by exactly `num_edges * 16` bytes:
//! pairs of little-endian 64-bit signed integers `(src, dst)`.
//!
//! Two ingestion modes mirror the two ways this kind of file gets consumed
//! on a distributed-memory machine: [`load_local`] reads the whole body
//! once and scatters it in parallel; [`load_distributed`] has each logical
//! nodelet open its own file handle and read only its slice, which is the
//! mode a real many-nodelet machine would use to avoid funneling the whole
//! file through one partition's memory.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::Path;

use byte_slice_cast::AsSliceOf;
use log::info;
use memmap2::Mmap;
use rayon::prelude::*;

use crate::error::{Error, Result};
use crate::index::Idx;
use crate::nodelets::Nodelets;
use crate::region_timer::RegionTimings;

pub struct DistributedEdgeList<Node: Idx> {
    pub num_vertices: usize,
    pub num_edges: usize,
    pub src: Vec<Node>,
    pub dst: Vec<Node>,
}

struct Header {
    num_vertices: usize,
    num_edges: usize,
    header_len: usize,
}

fn parse_header(bytes: &[u8]) -> Result<Header> {
    let newline = bytes
        .iter()
        .position(|&b| b == b'\n')
        .ok_or_else(|| Error::file_format("header line is missing a terminating newline"))?;
    let line = std::str::from_utf8(&bytes[..newline])
        .map_err(|_| Error::file_format("header line is not valid UTF-8"))?;

    let mut fields: HashMap<&str, Option<&str>> = HashMap::new();
    for token in line.split_whitespace() {
        let token = token.strip_prefix("--").ok_or_else(|| {
            Error::file_format(format!(
                "unrecognized header token '{}': expected '--key' or '--key=value'",
                token
            ))
        })?;
        match token.split_once('=') {
            Some((k, v)) => {
                fields.insert(k, Some(v));
            }
            None => {
                fields.insert(token, None);
            }
        }
    }

    let format = fields
        .get("format")
        .copied()
        .flatten()
        .ok_or_else(|| Error::file_format("missing required 'format' header field"))?;
    if format != "el64" {
        return Err(Error::file_format(format!(
            "unsupported format '{}': this loader only reads 'el64'",
            format
        )));
    }
    if !fields.contains_key("is_deduped") {
        return Err(Error::file_format(
            "edge list must declare 'is_deduped': this loader does not deduplicate",
        ));
    }

    let parse_required = |key: &str| -> Result<usize> {
        fields
            .get(key)
            .copied()
            .flatten()
            .ok_or_else(|| Error::file_format(format!("missing required '{}' header field", key)))?
            .parse::<usize>()
            .map_err(|_| Error::file_format(format!("'{}' is not a valid integer", key)))
    };

    let num_vertices = parse_required("num_vertices")?;
    let num_edges = parse_required("num_edges")?;
    if num_vertices == 0 {
        return Err(Error::file_format("'num_vertices' must be positive"));
    }
    if num_edges == 0 {
        return Err(Error::file_format("'num_edges' must be positive"));
    }

    Ok(Header {
        num_vertices,
        num_edges,
        header_len: newline + 1,
    })
}

const EDGE_BYTES: usize = 16;

/// Reads the whole file through a single mapping, then scatters the body
/// into striped arrays in parallel.
pub fn load_local<Node: Idx>(
    path: impl AsRef<Path>,
    timings: &RegionTimings,
) -> Result<DistributedEdgeList<Node>> {
    let start = std::time::Instant::now();

    let file = File::open(path.as_ref())?;
    let mmap = unsafe { Mmap::map(&file)? };
    let header = parse_header(&mmap)?;

    let body = &mmap[header.header_len..];
    let expected = header.num_edges * EDGE_BYTES;
    if body.len() < expected {
        return Err(Error::file_format(format!(
            "edge list body is truncated: expected {} bytes, found {}",
            expected,
            body.len()
        )));
    }
    let body = &body[..expected];
    let longs: &[i64] = body
        .as_slice_of::<i64>()
        .map_err(|e| Error::file_format(format!("edge list body is misaligned: {}", e)))?;

    let region = timings.start("scatter_edge_list");
    let mut src = vec![Node::zero(); header.num_edges];
    let mut dst = vec![Node::zero(); header.num_edges];
    src.par_iter_mut()
        .zip(dst.par_iter_mut())
        .enumerate()
        .for_each(|(i, (s, d))| {
            *s = Node::new(longs[2 * i] as usize);
            *d = Node::new(longs[2 * i + 1] as usize);
        });
    region.end();

    info!(
        "loaded {} edges ({} vertices) in {:.2}s",
        header.num_edges,
        header.num_vertices,
        start.elapsed().as_secs_f64()
    );

    Ok(DistributedEdgeList {
        num_vertices: header.num_vertices,
        num_edges: header.num_edges,
        src,
        dst,
    })
}

/// Each logical nodelet opens its own file handle and reads only the slice
/// of edges assigned to it, avoiding a single partition funneling the whole
/// file through its memory.
pub fn load_distributed<Node: Idx>(
    path: impl AsRef<Path>,
    nodelets: Nodelets,
) -> Result<DistributedEdgeList<Node>> {
    let start = std::time::Instant::now();
    let path = path.as_ref();

    let header = {
        let file = File::open(path)?;
        let mmap = unsafe { Mmap::map(&file)? };
        parse_header(&mmap)?
    };

    let p = nodelets.count();
    let num_edges = header.num_edges;
    let mut src = vec![Node::zero(); num_edges];
    let mut dst = vec![Node::zero(); num_edges];

    let chunk = (num_edges + p - 1) / p;
    let results: Result<Vec<(usize, Vec<i64>)>> = (0..p)
        .into_par_iter()
        .map(|nodelet| -> Result<(usize, Vec<i64>)> {
            let begin = (nodelet * chunk).min(num_edges);
            let end = ((nodelet + 1) * chunk).min(num_edges);
            if begin >= end {
                return Ok((begin, Vec::new()));
            }
            let mut file = File::open(path)?;
            let byte_start = header.header_len + begin * EDGE_BYTES;
            file.seek(SeekFrom::Start(byte_start as u64))?;
            let mut reader = BufReader::with_capacity(page_size::get(), file);
            let mut raw = vec![0u8; (end - begin) * EDGE_BYTES];
            reader.read_exact(&mut raw)?;
            let longs: &[i64] = raw
                .as_slice_of::<i64>()
                .map_err(|e| Error::file_format(format!("edge list slice is misaligned: {}", e)))?;
            Ok((begin, longs.to_vec()))
        })
        .collect();

    for (begin, longs) in results? {
        for (k, pair) in longs.chunks_exact(2).enumerate() {
            src[begin + k] = Node::new(pair[0] as usize);
            dst[begin + k] = Node::new(pair[1] as usize);
        }
    }

    info!(
        "distributed-loaded {} edges across {} nodelets in {:.2}s",
        num_edges,
        p,
        start.elapsed().as_secs_f64()
    );

    Ok(DistributedEdgeList {
        num_vertices: header.num_vertices,
        num_edges: header.num_edges,
        src,
        dst,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_el64(edges: &[(i64, i64)], num_vertices: usize) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "--num_vertices={} --num_edges={} --is_sorted --is_deduped --format=el64",
            num_vertices,
            edges.len()
        )
        .unwrap();
        for (s, d) in edges {
            file.write_all(&s.to_le_bytes()).unwrap();
            file.write_all(&d.to_le_bytes()).unwrap();
        }
        file.flush().unwrap();
        file
    }

    #[test]
    fn load_local_reads_back_edges() {
        let edges = [(0i64, 1i64), (1, 2), (0, 2)];
        let file = write_el64(&edges, 3);
        let el = load_local::<usize>(file.path(), &RegionTimings::new()).unwrap();
        assert_eq!(el.num_vertices, 3);
        assert_eq!(el.num_edges, 3);
        assert_eq!(el.src, vec![0, 1, 0]);
        assert_eq!(el.dst, vec![1, 2, 2]);
    }

    #[test]
    fn load_distributed_matches_local() {
        let edges: Vec<(i64, i64)> = (0..50).map(|i| (i, (i + 1) % 50)).collect();
        let file = write_el64(&edges, 50);
        let local = load_local::<usize>(file.path(), &RegionTimings::new()).unwrap();
        let distributed = load_distributed::<usize>(file.path(), Nodelets::new(4)).unwrap();
        assert_eq!(local.src, distributed.src);
        assert_eq!(local.dst, distributed.dst);
    }

    #[test]
    fn rejects_missing_is_deduped() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "--num_vertices=2 --num_edges=1 --format=el64").unwrap();
        file.write_all(&0i64.to_le_bytes()).unwrap();
        file.write_all(&1i64.to_le_bytes()).unwrap();
        file.flush().unwrap();
        let err = load_local::<usize>(file.path(), &RegionTimings::new()).unwrap_err();
        assert!(matches!(err, Error::FileFormat(_)));
    }

    #[test]
    fn rejects_wrong_format() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "--num_vertices=2 --num_edges=1 --is_deduped --format=el32"
        )
        .unwrap();
        file.write_all(&0i64.to_le_bytes()).unwrap();
        file.write_all(&1i64.to_le_bytes()).unwrap();
        file.flush().unwrap();
        let err = load_local::<usize>(file.path(), &RegionTimings::new()).unwrap_err();
        assert!(matches!(err, Error::FileFormat(_)));
    }

    #[test]
    fn rejects_truncated_body() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "--num_vertices=2 --num_edges=2 --is_deduped --format=el64"
        )
        .unwrap();
        file.write_all(&0i64.to_le_bytes()).unwrap();
        file.write_all(&1i64.to_le_bytes()).unwrap();
        file.flush().unwrap();
        let err = load_local::<usize>(file.path(), &RegionTimings::new()).unwrap_err();
        assert!(matches!(err, Error::FileFormat(_)));
    }
}
