//! Textual and structured reports of a [Registry](../struct.Registry.html).
//!
//! One line per record, children indented by one tab per level:
//!
//! ```text
//! main  T(s):1.402311  #:1  A(ms):1402.311000
//! 	f  T(s):1.401904  #:2  A(ms):700.952000
//! 	g  T(s):0.000004  #:1  A(ms):0.004000
//! ```
use crate::record::{Record, RecordId};
use crate::registry::Registry;

use anyhow::Context;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::time::Duration;

/// Owned copy of one record and its subtree.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Node {
    pub name: String,
    pub call_count: u64,
    pub wall_time: Duration,
    pub user_time: Duration,
    pub system_time: Duration,
    pub average_ms: Option<f64>,
    pub children: Vec<Node>,
}

impl Node {
    pub fn child(&self, name: &str) -> Option<&Node> {
        self.children.iter().find(|n| n.name == name)
    }
}

impl Registry {
    pub fn write_report<W: Write>(&self, w: &mut W) -> io::Result<()> {
        for id in self.roots() {
            write_tree(self, w, id, 0)?;
        }
        Ok(())
    }

    pub fn report_string(&self) -> String {
        let mut buf = Vec::new();
        self.write_report(&mut buf)
            .expect("writing into a Vec can not fail");
        String::from_utf8_lossy(&buf).into_owned()
    }

    /// Write the report to `path`, replacing its content.
    pub fn try_print_stats<P: AsRef<Path>>(&self, path: P) -> anyhow::Result<()> {
        let path = path.as_ref();
        let mut w = create(path)?;
        self.write_report(&mut w)
            .and_then(|_| w.flush())
            .with_context(|| format!("Failed to write profiler output: {}", path.display()))
    }

    /// Like [try_print_stats](#method.try_print_stats) but only logs failures.
    pub fn print_stats<P: AsRef<Path>>(&self, path: P) {
        if let Err(err) = self.try_print_stats(path) {
            error!("{:?}", err);
        }
    }

    pub fn snapshot(&self) -> Vec<Node> {
        self.roots()
            .into_iter()
            .filter_map(|id| snapshot_tree(self, id))
            .collect()
    }

    #[cfg(feature = "json")]
    pub fn try_print_stats_json<P: AsRef<Path>>(&self, path: P) -> anyhow::Result<()> {
        let path = path.as_ref();
        let mut w = create(path)?;
        serde_json::to_writer_pretty(&mut w, &self.snapshot())
            .with_context(|| format!("Failed to serialize profile to {}", path.display()))?;
        w.flush()?;
        Ok(())
    }

    #[cfg(feature = "json")]
    pub fn print_stats_json<P: AsRef<Path>>(&self, path: P) {
        if let Err(err) = self.try_print_stats_json(path) {
            error!("{:?}", err);
        }
    }
}

fn create(path: &Path) -> anyhow::Result<BufWriter<File>> {
    let file = File::create(path)
        .with_context(|| format!("Cannot open profiler output file: {}", path.display()))?;
    Ok(BufWriter::new(file))
}

fn write_tree<W: Write>(
    registry: &Registry,
    w: &mut W,
    id: RecordId,
    depth: usize,
) -> io::Result<()> {
    let record = match registry.record(id) {
        Some(r) => r,
        None => return Ok(()),
    };
    write_line(w, record, depth)?;
    for child in registry.children(id) {
        write_tree(registry, w, child, depth + 1)?;
    }
    Ok(())
}

fn write_line<W: Write>(w: &mut W, record: &Record, depth: usize) -> io::Result<()> {
    for _ in 0..depth {
        w.write_all(b"\t")?;
    }
    write!(
        w,
        "{}  T(s):{:.6}  #:{}  A(ms):",
        record.name(),
        record.wall_time().as_secs_f64(),
        record.call_count()
    )?;
    match record.average_ms() {
        Some(avg) => write!(w, "{:.6}", avg)?,
        None => write!(w, "0")?,
    }
    #[cfg(feature = "cpu-time")]
    write!(w, "  CPU(%):{:.2}", record.cpu_percent().unwrap_or(0.0))?;
    writeln!(w)
}

fn snapshot_tree(registry: &Registry, id: RecordId) -> Option<Node> {
    let record = registry.record(id)?;
    Some(Node {
        name: record.name().to_owned(),
        call_count: record.call_count(),
        wall_time: record.wall_time(),
        user_time: record.user_time(),
        system_time: record.system_time(),
        average_ms: record.average_ms(),
        children: registry
            .children(id)
            .into_iter()
            .filter_map(|child| snapshot_tree(registry, child))
            .collect(),
    })
}
