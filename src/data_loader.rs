//! Log source resolution and streaming
//!
//! Resolves which page_log actually feeds the system — the primary
//! well-known path, a fallback sample file, or a built-in demo dataset when
//! neither exists — and streams its lines through the parser. An unreadable
//! file is logged and yields an empty job list; it never aborts the process.

use crate::parser::LineParser;
use crate::types::JobRecord;
use chrono_tz::Tz;
use futures::stream::{Stream, StreamExt};
use std::path::{Path, PathBuf};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info, warn};

/// Well-known location of the CUPS page accounting log
pub const DEFAULT_LOG_PATH: &str = "/var/log/cups/page_log";

/// Sample log consulted when the primary path does not exist
pub const FALLBACK_LOG_PATH: &str = "./sample_cups.log";

/// Built-in accounting data used when no log file exists at all, so a fresh
/// checkout still has something to show. Parsed through the normal parser,
/// which keeps every endpoint consistent with the same records.
const DEMO_PAGE_LOG: &str = "\
HP-LaserJet-4050 alice 101 [03/Jun/2024:08:12:45] 1 2 - ws-alice.lan quarterly-report.pdf A4 one-sided
HP-LaserJet-4050 alice 101 [03/Jun/2024:08:12:47] 2 2 - ws-alice.lan quarterly-report.pdf A4 one-sided
Canon-Pixma-G3110 bob 102 [03/Jun/2024:09:05:10] 1 1 - ws-bob.lan photo-collage.png Letter one-sided
HP-LaserJet-4050 carol 103 [03/Jun/2024:10:31:02] 1 5 - ws-carol.lan handout.pdf A4 two-sided-long-edge
Canon-Pixma-G3110 alice 104 [03/Jun/2024:14:22:41] 1 3 - ws-alice.lan flyer.pdf A4 one-sided
HP-LaserJet-4050 dave 105 [04/Jun/2024:08:45:33] 1 1 acct-42 ws-dave.lan invoice-0449.pdf A4 one-sided
HP-LaserJet-4050 dave 105 [04/Jun/2024:08:45:35] 2 1 acct-42 ws-dave.lan invoice-0449.pdf A4 one-sided
Brother-HL-L2350 bob 106 [04/Jun/2024:11:18:20] 1 2 - ws-bob.lan slides.pdf Letter two-sided-long-edge
Canon-Pixma-G3110 carol 107 [04/Jun/2024:16:02:58] 1 4 - ws-carol.lan poster-draft.pdf A3 one-sided
Brother-HL-L2350 alice 108 [05/Jun/2024:09:40:11] 1 1 - ws-alice.lan notes.txt A4 one-sided
HP-LaserJet-4050 bob 109 [05/Jun/2024:13:27:06] 1 6 - ws-bob.lan training-pack.pdf A4 two-sided-long-edge
Canon-Pixma-G3110 dave 110 [05/Jun/2024:15:55:49] 1 2 - ws-dave.lan receipts.pdf Letter one-sided
Brother-HL-L2350 carol 111 [06/Jun/2024:08:03:17] 1 3 - ws-carol.lan agenda.pdf A4 one-sided
HP-LaserJet-4050 alice 112 [06/Jun/2024:17:48:30] 1 2 - ws-alice.lan summary.pdf A4 one-sided
Canon-Pixma-G3110 bob 113 [06/Jun/2024:22:10:05] 1 1 - ws-bob.lan late-edit.pdf Letter one-sided
";

/// Resolves and reads the page_log feeding the aggregates
#[derive(Debug, Clone)]
pub struct LogSource {
    primary: PathBuf,
    fallback: PathBuf,
    parser: LineParser,
}

impl LogSource {
    /// Create a source with explicit primary and fallback paths
    pub fn new(primary: impl Into<PathBuf>, fallback: impl Into<PathBuf>, tz: Tz) -> Self {
        Self {
            primary: primary.into(),
            fallback: fallback.into(),
            parser: LineParser::new(tz),
        }
    }

    /// The file that will actually be read, if any exists
    pub fn resolve(&self) -> Option<&Path> {
        if self.primary.exists() {
            Some(&self.primary)
        } else if self.fallback.exists() {
            Some(&self.fallback)
        } else {
            None
        }
    }

    /// The path a file watcher should observe, if any
    pub fn watch_path(&self) -> Option<PathBuf> {
        self.resolve().map(Path::to_path_buf)
    }

    /// Read the resolved log into job records, in file order
    ///
    /// Falls back to the demo dataset when no log file exists.
    pub async fn load_jobs(&self) -> Vec<JobRecord> {
        match self.resolve() {
            Some(path) => {
                let path = path.to_path_buf();
                let jobs: Vec<JobRecord> = self.stream_file(path.clone()).collect().await;
                info!("parsed {} job records from {}", jobs.len(), path.display());
                jobs
            }
            None => {
                info!(
                    "no page_log at {} or {}, using built-in demo data",
                    self.primary.display(),
                    self.fallback.display()
                );
                DEMO_PAGE_LOG
                    .lines()
                    .filter_map(|line| self.parser.parse(line))
                    .collect()
            }
        }
    }

    /// Stream parsed records from one file, skipping rejected lines
    fn stream_file(&self, path: PathBuf) -> impl Stream<Item = JobRecord> + '_ {
        async_stream::stream! {
            let file = match tokio::fs::File::open(&path).await {
                Ok(file) => file,
                Err(e) => {
                    warn!("cannot read page_log {}: {e}", path.display());
                    return;
                }
            };

            let reader = BufReader::new(file);
            let mut lines = reader.lines();
            let mut kept = 0usize;
            let mut dropped = 0usize;

            while let Ok(Some(line)) = lines.next_line().await {
                match self.parser.parse(&line) {
                    Some(job) => {
                        kept += 1;
                        yield job;
                    }
                    None => dropped += 1,
                }
            }

            debug!(
                "{}: kept {kept} records, dropped {dropped} lines",
                path.display()
            );
        }
    }
}
