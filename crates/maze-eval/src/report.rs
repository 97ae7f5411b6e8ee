//! Plain-text result reports.
//!
//! Each result is three lines and a blank separator:
//!
//! ```text
//! Open(2):     A B
//! Closed(1):   C
//! Path(3):     X -> Y -> Z
//! ```

use std::fmt::Write as _;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use crate::collector::ResultTuple;

/// Width of the `Title(n):` column.
const HEADER_WIDTH: usize = 13;

fn push_line<T: AsRef<str>>(out: &mut String, title: &str, items: &[T], delim: &str) {
    let header = format!("{title}({}):", items.len());
    let _ = write!(out, "{header:<width$}", width = HEADER_WIDTH);
    for (idx, item) in items.iter().enumerate() {
        if idx > 0 {
            out.push_str(delim);
        }
        out.push_str(item.as_ref());
    }
    out.push('\n');
}

/// Render results in report format.
pub fn render_report(results: &[ResultTuple]) -> String {
    let mut out = String::new();
    for result in results {
        let open: Vec<String> = result.open.iter().map(ToString::to_string).collect();
        let closed: Vec<String> = result.closed.iter().map(ToString::to_string).collect();
        push_line(&mut out, "Open", &open, " ");
        push_line(&mut out, "Closed", &closed, " ");
        push_line(&mut out, "Path", &result.path, " -> ");
        out.push('\n');
    }
    out
}

/// Write results to `path`, creating or truncating it.
pub fn write_report(path: &Path, results: &[ResultTuple]) -> io::Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    writer.write_all(render_report(results).as_bytes())?;
    writer.flush()
}
