//! Parser for `tasklist /V /FO CSV` output.
//!
//! Column order: "Image Name","PID","Session Name","Session#","Mem Usage",
//! "Status","User Name","CPU Time","Window Title".

#![cfg_attr(not(windows), allow(dead_code))]

use crate::ProcessHealth;

use std::collections::HashMap;

use csv::StringRecord;

const NOT_RESPONDING: &str = "not responding";

/// Window titles of the modal dialogs a crashed server leaves behind.
const ERROR_WINDOW_TITLES: [&str; 3] = [
    "BF2 Memory Error",
    "BF2 Error",
    "Microsoft Visual C++ Runtime Library",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskEntry {
    pub image: String,
    pub pid: u32,
    pub status: String,
    pub window_title: String,
}

impl TaskEntry {
    pub fn health(&self) -> ProcessHealth {
        if self.status.trim().eq_ignore_ascii_case(NOT_RESPONDING) {
            return ProcessHealth::Hung {
                reason: "not responding".to_string(),
            };
        }

        if let Some(title) = ERROR_WINDOW_TITLES
            .iter()
            .find(|title| self.window_title.contains(*title))
        {
            return ProcessHealth::Hung {
                reason: format!("error dialog '{title}'"),
            };
        }

        ProcessHealth::Healthy
    }
}

/// Parse the whole listing into entries keyed by PID.
///
/// Header lines, the "INFO: No tasks" line and malformed rows are skipped.
pub fn parse(output: &str) -> HashMap<u32, TaskEntry> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(output.as_bytes());

    reader
        .records()
        .filter_map(Result::ok)
        .filter_map(|record| parse_record(&record))
        .map(|entry| (entry.pid, entry))
        .collect()
}

fn parse_record(record: &StringRecord) -> Option<TaskEntry> {
    if record.len() < 9 {
        return None;
    }

    Some(TaskEntry {
        image: record.get(0)?.to_string(),
        pid: record.get(1)?.trim().parse().ok()?,
        status: record.get(5)?.to_string(),
        window_title: record.get(8)?.to_string(),
    })
}

/// Run `tasklist` once for every process on the machine.
#[cfg(windows)]
pub async fn snapshot() -> std::io::Result<HashMap<u32, TaskEntry>> {
    let output = tokio::process::Command::new("tasklist")
        .args(["/V", "/FO", "CSV", "/NH"])
        .kill_on_drop(true)
        .output()
        .await?;

    if !output.status.success() {
        return Err(std::io::Error::other(format!(
            "tasklist exited with {}",
            output.status
        )));
    }

    Ok(parse(&String::from_utf8_lossy(&output.stdout)))
}
