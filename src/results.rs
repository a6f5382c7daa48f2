use crate::runner::{ResultPayload, RunSummary};
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Persists finished runs: one JSON document per run, a rolling CSV summary
/// log, and optionally the per-trial responses as CSV.
#[derive(Debug, Clone)]
pub struct ResultWriter {
    dir: PathBuf,
}

impl ResultWriter {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write the payload verbatim as pretty JSON and append a summary line
    /// to `log.csv`. Returns the path of the JSON document.
    pub fn save(&self, payload: &ResultPayload) -> io::Result<PathBuf> {
        std::fs::create_dir_all(&self.dir)?;

        let stamp = payload.finished_at.format("%Y%m%d-%H%M%S");
        let json_path = self.dir.join(format!("run-{stamp}.json"));
        let data = serde_json::to_vec_pretty(payload)?;
        std::fs::write(&json_path, data)?;

        self.append_log_line(payload)?;
        Ok(json_path)
    }

    fn append_log_line(&self, payload: &ResultPayload) -> io::Result<()> {
        let log_path = self.dir.join("log.csv");

        // If the log file doesn't exist, we need to emit a header
        let needs_header = !log_path.exists();

        let mut log_file = OpenOptions::new()
            .append(true)
            .create(true)
            .open(log_path)?;

        if needs_header {
            writeln!(
                log_file,
                "finished_at,task_set,sentence_set,trials,correct,accuracy_pct,time_limit_reached"
            )?;
        }

        let summary = RunSummary::from_payload(payload);
        let expired = payload.responses.iter().any(|r| r.time_limit_reached);

        writeln!(
            log_file,
            "{},{},{},{},{},{},{}",
            payload.finished_at.to_rfc3339(),
            payload.task_set.name,
            payload.sentence_set.name,
            summary.total,
            summary.correct,
            summary.accuracy_pct,
            expired,
        )
    }

    /// Write the per-trial responses as CSV next to the given JSON document.
    pub fn save_responses_csv(
        &self,
        payload: &ResultPayload,
        json_path: &Path,
    ) -> csv::Result<PathBuf> {
        let csv_path = json_path.with_extension("csv");
        let mut writer = csv::Writer::from_path(&csv_path)?;

        writer.write_record([
            "trial",
            "sentence_id",
            "text",
            "truth",
            "response_true",
            "correct",
            "time_since_start_ms",
            "timestamp",
            "time_limit_reached",
            "tags",
        ])?;

        for response in &payload.responses {
            writer.write_record([
                response.trial.to_string(),
                response
                    .sentence_id
                    .map(|id| id.to_string())
                    .unwrap_or_default(),
                response.text.clone(),
                response.truth.to_string(),
                response.response_true.to_string(),
                response.correct.to_string(),
                response.time_since_start_ms.to_string(),
                response.timestamp.to_rfc3339(),
                response.time_limit_reached.to_string(),
                response.tags.join("|"),
            ])?;
        }

        writer.flush()?;
        Ok(csv_path)
    }
}
