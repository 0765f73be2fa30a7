use crate::clock::{local_date, to_datetime};
use crate::error::AppError;
use crate::journal::{JournalConfig, NoteVault, merge_into_note, note_path};
use crate::model::Task;
use crate::timer::format_elapsed;
use std::path::PathBuf;
use time::{Date, UtcOffset};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryEntry {
    pub title: String,
    pub points: i64,
    pub time_spent: u64,
    pub completed_at: i64,
    pub completed_by: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DailySummary {
    pub date: Date,
    pub entries: Vec<SummaryEntry>,
    pub total_time: u64,
    pub total_points: i64,
}

impl DailySummary {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[derive(Debug)]
pub enum SummaryOutcome {
    JournalDisabled,
    NothingToSummarize,
    Written {
        path: PathBuf,
        tasks: usize,
    },
    WriteFailed {
        path: Option<PathBuf>,
        error: AppError,
    },
}

impl SummaryOutcome {
    /// User-facing notice for this outcome.
    pub fn notice(&self) -> String {
        match self {
            Self::JournalDisabled => "Daily notes are disabled; summary not written".to_string(),
            Self::NothingToSummarize => "No tasks completed today, nothing to summarize".to_string(),
            Self::Written { path, tasks } => {
                format!("Added {} completed task(s) to {}", tasks, path.display())
            }
            Self::WriteFailed { path: Some(path), error } => {
                format!("Failed to write summary to {}: {}", path.display(), error)
            }
            Self::WriteFailed { path: None, error } => {
                format!("Failed to write summary: {error}")
            }
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Self::WriteFailed { .. })
    }
}

/// Completed tasks whose completion falls on `date` at `offset`, in board order.
pub fn collect_daily(tasks: &[Task], date: Date, offset: UtcOffset) -> DailySummary {
    let entries: Vec<SummaryEntry> = tasks
        .iter()
        .filter_map(|task| {
            let completed_at = task.completed_at()?;
            if local_date(completed_at, offset)? != date {
                return None;
            }
            Some(SummaryEntry {
                title: task.title.clone(),
                points: task.points,
                time_spent: task.time_spent,
                completed_at,
                completed_by: task.completed_by().unwrap_or_default().to_string(),
            })
        })
        .collect();

    DailySummary {
        date,
        total_time: entries
            .iter()
            .map(|entry| entry.time_spent)
            .fold(0, u64::saturating_add),
        total_points: entries
            .iter()
            .map(|entry| entry.points)
            .fold(0, i64::saturating_add),
        entries,
    }
}

pub fn render_markdown(summary: &DailySummary, offset: UtcOffset) -> String {
    let mut out = format!("## Task summary {}\n\n", summary.date);

    for entry in &summary.entries {
        let finished = to_datetime(entry.completed_at)
            .map(|datetime| datetime.to_offset(offset))
            .map(|datetime| format!("{:02}:{:02}", datetime.hour(), datetime.minute()))
            .unwrap_or_else(|| "--:--".to_string());
        out.push_str(&format!(
            "- [x] {} · {} pts · {} · done {}",
            entry.title,
            entry.points,
            format_elapsed(entry.time_spent),
            finished
        ));
        if !entry.completed_by.is_empty() {
            out.push_str(&format!(" · by {}", entry.completed_by));
        }
        out.push('\n');
    }

    out.push_str(&format!(
        "\nCompleted {} task(s) · {} pts · {}\n",
        summary.entries.len(),
        summary.total_points,
        format_elapsed(summary.total_time)
    ));
    out
}

/// Appends today's summary to the daily note. Failures are logged and
/// reported through the outcome, never returned as errors.
pub fn write_daily_summary(
    tasks: &[Task],
    journal: &JournalConfig,
    vault: &dyn NoteVault,
    date: Date,
    offset: UtcOffset,
) -> SummaryOutcome {
    if !journal.enabled {
        return SummaryOutcome::JournalDisabled;
    }

    let summary = collect_daily(tasks, date, offset);
    if summary.is_empty() {
        return SummaryOutcome::NothingToSummarize;
    }

    let path = match note_path(journal, date) {
        Ok(path) => path,
        Err(error) => {
            tracing::error!(error = %error, "cannot resolve daily note path");
            return SummaryOutcome::WriteFailed { path: None, error };
        }
    };

    let block = render_markdown(&summary, offset);
    match merge_into_note(vault, &path, &block) {
        Ok(()) => {
            tracing::info!(path = %path.display(), tasks = summary.entries.len(), "wrote daily summary");
            SummaryOutcome::Written {
                path,
                tasks: summary.entries.len(),
            }
        }
        Err(error) => {
            tracing::error!(path = %path.display(), error = %error, "failed to write daily summary");
            SummaryOutcome::WriteFailed {
                path: Some(path),
                error,
            }
        }
    }
}
