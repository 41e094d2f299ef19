//! What happens to each piece of clipboard text.
//!
//! Detection, parsing, printing and upload all run synchronously on the
//! caller's thread. Uploads are driven by a private current-thread runtime
//! and bounded by the uploader's request timeout.

use crate::scan::{looks_like_moon_scan, parse_scan_with_summary, ScanTable};
use crate::upload::{UploadReceipt, UploadTarget, Uploader};
use anyhow::{Context, Result};
use std::io::Write;

/// Result of handling one piece of text.
#[derive(Debug)]
pub enum Outcome {
    /// Not a moon scan.
    Ignored,
    /// Parsed and printed; uploading is disabled.
    Printed { moons: usize, records: usize },
    Uploaded(UploadReceipt),
    /// Parsed and printed, but the POST failed.
    UploadFailed,
    /// The table could not be encoded; nothing was sent.
    SerializeFailed,
}

pub struct ScanPipeline<W: Write> {
    out: W,
    uploader: Option<Uploader>,
    runtime: tokio::runtime::Runtime,
}

impl<W: Write> ScanPipeline<W> {
    /// `target: None` runs in print-only mode.
    pub fn new(target: Option<UploadTarget>, out: W) -> Result<Self> {
        let uploader = target
            .map(Uploader::new)
            .transpose()
            .context("Failed to set up uploader")?;
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .context("Failed to start async runtime")?;

        Ok(Self {
            out,
            uploader,
            runtime,
        })
    }

    pub fn uploads_enabled(&self) -> bool {
        self.uploader.is_some()
    }

    pub fn output(&self) -> &W {
        &self.out
    }

    /// Clipboard handler body: skip anything that is not a moon scan.
    pub fn handle_clipboard_text(&mut self, text: &str) -> Outcome {
        log::info!("Clipboard changed");

        if !looks_like_moon_scan(text) {
            return Outcome::Ignored;
        }

        log::info!("Possible moon scan data detected");
        self.process_scan(text)
    }

    /// Parse, print and (if configured) upload, without the detection gate.
    pub fn process_scan(&mut self, text: &str) -> Outcome {
        let (table, summary) = parse_scan_with_summary(text);
        log::debug!(
            "Parsed {} moon headers, {} rows, discarded {} lines",
            summary.headers,
            summary.rows,
            summary.discarded
        );

        let payload = match serde_json::to_vec(&table) {
            Ok(payload) => payload,
            Err(e) => {
                log::error!("Failed to marshal moon scan data: {}", e);
                return Outcome::SerializeFailed;
            }
        };

        self.print(&table);

        let Some(uploader) = &self.uploader else {
            return Outcome::Printed {
                moons: table.len(),
                records: table.record_count(),
            };
        };

        log::info!("Uploading data");
        match self.runtime.block_on(uploader.post(payload)) {
            Ok(receipt) => {
                log::info!(
                    "Moon scan posted to {} (status {}, {} bytes)",
                    uploader.target().endpoint,
                    receipt.status,
                    receipt.bytes
                );
                Outcome::Uploaded(receipt)
            }
            Err(e) => {
                log::warn!("Moon scan upload failed: {}", e);
                Outcome::UploadFailed
            }
        }
    }

    fn print(&mut self, table: &ScanTable) {
        log::info!("Moon scan parsed:");
        if let Err(e) = self.write_table(table) {
            log::warn!("Failed to print moon scan: {}", e);
        }
    }

    fn write_table(&mut self, table: &ScanTable) -> Result<()> {
        serde_json::to_writer_pretty(&mut self.out, table)?;
        writeln!(self.out)?;
        self.out.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const SCAN: &str = "Moon\tMoon Product\tQuantity\tOre TypeID\tSolarSystemID\tPlanetID\tMoonID\n\
                        66-PMM V - Moon 15\n\
                        \tFlawless Arkonor\t0.323762148619\t46678\t30004923\t40311969\t40311985\n";

    fn printed(pipeline: &ScanPipeline<Vec<u8>>) -> serde_json::Value {
        serde_json::from_slice(pipeline.output()).unwrap()
    }

    #[test]
    fn test_non_scan_text_ignored() {
        let mut pipeline = ScanPipeline::new(None, Vec::new()).unwrap();
        let outcome = pipeline.handle_clipboard_text("just some copied text");

        assert!(matches!(outcome, Outcome::Ignored));
        assert!(pipeline.output().is_empty());
    }

    #[test]
    fn test_scan_printed_as_json() {
        let mut pipeline = ScanPipeline::new(None, Vec::new()).unwrap();
        assert!(!pipeline.uploads_enabled());

        let outcome = pipeline.handle_clipboard_text(SCAN);

        assert!(matches!(outcome, Outcome::Printed { moons: 1, records: 1 }));
        let json = printed(&pipeline);
        let record = &json["66-PMM V - Moon 15"]["Flawless Arkonor"];
        assert_eq!(record["quantity"], "0.323762148619");
        assert_eq!(record["ore_type_id"], "46678");
        assert_eq!(record["solar_system_id"], "30004923");
        assert_eq!(record["planet_id"], "40311969");
        assert_eq!(record["moon_id"], "40311985");
    }

    #[test]
    fn test_process_scan_skips_gate() {
        let mut pipeline = ScanPipeline::new(None, Vec::new()).unwrap();
        let outcome = pipeline.process_scan("A - Moon 1\nArkonor 0.5 1 2 3 4");

        assert!(matches!(outcome, Outcome::Printed { moons: 1, records: 1 }));
    }

    #[test]
    fn test_scan_uploaded_when_endpoint_configured() {
        let rt = tokio::runtime::Runtime::new().unwrap();
        let server = rt.block_on(async {
            let server = MockServer::start().await;
            Mock::given(method("POST"))
                .and(path("/moons"))
                .and(header("authorization", "Bearer t0ken"))
                .respond_with(ResponseTemplate::new(200))
                .mount(&server)
                .await;
            server
        });

        let target = UploadTarget {
            endpoint: format!("{}/moons", server.uri()),
            token: Some("t0ken".to_string()),
        };
        let mut pipeline = ScanPipeline::new(Some(target), Vec::new()).unwrap();
        let outcome = pipeline.handle_clipboard_text(SCAN);

        assert!(matches!(outcome, Outcome::Uploaded(_)));

        let requests = rt.block_on(server.received_requests()).unwrap();
        assert_eq!(requests.len(), 1);
        let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
        assert_eq!(body, printed(&pipeline));
    }

    #[test]
    fn test_upload_failure_is_recovered() {
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let target = UploadTarget {
            endpoint: format!("http://127.0.0.1:{}/moons", port),
            token: None,
        };
        let mut pipeline = ScanPipeline::new(Some(target), Vec::new()).unwrap();

        assert!(matches!(
            pipeline.handle_clipboard_text(SCAN),
            Outcome::UploadFailed
        ));
        // The scan is still printed and the pipeline keeps working.
        assert!(!pipeline.output().is_empty());
        assert!(matches!(
            pipeline.handle_clipboard_text("not a scan"),
            Outcome::Ignored
        ));
    }
}
