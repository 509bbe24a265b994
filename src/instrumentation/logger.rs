use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationLog {
    pub id: String,
    pub timestamp: String,
    pub model: String,
    pub subject: String,
    pub grade: String,
    pub topic: String,
    pub duration: String,
    pub template_chars: usize,
    pub latency_ms: u64,
    pub input_tokens: u32,
    pub output_tokens: u32,
    pub plan_id: Option<String>,
    pub plan_chars: usize,
    pub error: Option<String>,
}

impl GenerationLog {
    pub fn total_tokens(&self) -> u32 {
        self.input_tokens + self.output_tokens
    }

    pub fn summary(&self) -> String {
        let outcome = match (&self.plan_id, &self.error) {
            (_, Some(err)) => format!("failed: {}", err),
            (Some(id), None) => format!("plan {}", id),
            (None, None) => "no plan".to_string(),
        };
        format!(
            "Model: {} | Latency: {:.1}s | Tokens: {} | Plan length: {} chars | {}",
            self.model,
            self.latency_ms as f64 / 1000.0,
            self.total_tokens(),
            self.plan_chars,
            outcome,
        )
    }
}

pub struct RunLogger {
    dir: PathBuf,
}

impl RunLogger {
    pub fn new(dir: &Path) -> Result<Self> {
        fs::create_dir_all(dir).context("Failed to create logs directory")?;
        Ok(Self {
            dir: dir.to_path_buf(),
        })
    }

    pub fn write(&self, entry: &GenerationLog) -> Result<()> {
        let path = self.dir.join("generations.jsonl");
        let mut file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .context("Failed to open log file")?;

        let json = serde_json::to_string(entry).context("Failed to serialize generation log")?;
        writeln!(file, "{}", json).context("Failed to write log")?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(error: Option<&str>) -> GenerationLog {
        GenerationLog {
            id: "run-1".into(),
            timestamp: "2026-10-19T08:00:00+00:00".into(),
            model: "gemini-2.5-flash".into(),
            subject: "Toán".into(),
            grade: "Lớp 5".into(),
            topic: "Phân số".into(),
            duration: "45 phút".into(),
            template_chars: 16,
            latency_ms: 2500,
            input_tokens: 800,
            output_tokens: 1200,
            plan_id: error.is_none().then(|| "p1".to_string()),
            plan_chars: if error.is_none() { 4000 } else { 0 },
            error: error.map(str::to_string),
        }
    }

    #[test]
    fn appends_one_json_line_per_entry() {
        let dir = tempfile::tempdir().unwrap();
        let logger = RunLogger::new(&dir.path().join("logs")).unwrap();

        logger.write(&entry(None)).unwrap();
        logger.write(&entry(Some("Lỗi khi gọi Gemini API: quota"))).unwrap();

        let raw = fs::read_to_string(dir.path().join("logs").join("generations.jsonl")).unwrap();
        let lines: Vec<GenerationLog> = raw
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].plan_id.as_deref(), Some("p1"));
        assert!(lines[1].error.is_some());
    }

    #[test]
    fn summary_reports_outcome() {
        assert!(entry(None).summary().contains("plan p1"));
        assert!(entry(None).summary().contains("Tokens: 2000"));
        assert!(entry(Some("quota")).summary().ends_with("failed: quota"));
    }
}
