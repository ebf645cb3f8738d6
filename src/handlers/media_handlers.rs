//! Media listing, upload, edit and delete commands.

use super::AppState;
use crate::{
    models::{
        draft::parse_manifest,
        media::{MediaRecord, MediaRef},
    },
    services::{
        gallery::Gallery,
        upload_flow::{SubmitReport, UploadFlow, UploadOutcome},
    },
};
use anyhow::{Context, Result, anyhow, bail};
use std::path::Path;
use tokio::fs;

pub async fn list(state: &AppState, limit: Option<usize>, json: bool) -> Result<String> {
    let records = state.media().list_mine().await.context("listing media")?;
    let gallery = Gallery::new(records);
    let shown = match limit {
        Some(n) => gallery.recent(n),
        None => gallery.records(),
    };

    if json {
        return serde_json::to_string_pretty(shown).context("encoding listing");
    }
    if shown.is_empty() {
        return Ok("No media yet".to_string());
    }

    let stats = gallery.stats();
    let mut lines: Vec<String> = shown.iter().map(record_line).collect();
    lines.push(format!(
        "{} uploads, {} images, {} videos",
        stats.uploads, stats.images, stats.videos
    ));
    Ok(lines.join("\n"))
}

pub async fn show(state: &AppState, id: &str) -> Result<String> {
    let media = state.media();
    let record = media
        .fetch_record(id)
        .await
        .with_context(|| format!("fetching media {}", id))?;
    let mut out = serde_json::to_string_pretty(&record).context("encoding record")?;
    out.push_str(&format!("\nqr: {}", media.deep_link(id)));
    Ok(out)
}

pub async fn upload(
    state: &AppState,
    name: &str,
    image: Option<&Path>,
    video: Option<&Path>,
) -> Result<String> {
    if image.is_none() && video.is_none() {
        bail!("nothing to upload; pass --image and/or --video");
    }
    let media = state.media();
    let outcome = UploadFlow::new(&media)
        .upload_and_save(name, image, video)
        .await;
    let record = outcome_into_result(outcome)?;
    Ok(format!("Saved\n{}", record_line(&record)))
}

pub async fn submit(state: &AppState, manifest: &Path) -> Result<String> {
    let json = fs::read_to_string(manifest)
        .await
        .with_context(|| format!("reading manifest {}", manifest.display()))?;
    let base_dir = manifest.parent().unwrap_or_else(|| Path::new("."));
    let mut rows = parse_manifest(&json, base_dir)
        .with_context(|| format!("parsing manifest {}", manifest.display()))?;
    if !rows.iter().any(|row| row.has_files()) {
        bail!("no row in the manifest has a file to upload");
    }

    let media = state.media();
    let report = UploadFlow::new(&media).submit_drafts(&mut rows).await;
    summarize_submission(report)
}

pub async fn edit(
    state: &AppState,
    id: &str,
    name: Option<String>,
    image: Option<&Path>,
    video: Option<&Path>,
) -> Result<String> {
    if name.is_none() && image.is_none() && video.is_none() {
        bail!("nothing to change; pass --name, --image or --video");
    }
    let media = state.media();
    let outcome = UploadFlow::new(&media)
        .upload_and_update(id, name, image, video)
        .await;
    let record = outcome_into_result(outcome)?;
    Ok(format!("Updated\n{}", record_line(&record)))
}

pub async fn delete(state: &AppState, ids: &[String]) -> Result<String> {
    let media = state.media();
    for id in ids {
        media
            .delete_record(id)
            .await
            .with_context(|| format!("deleting media {}", id))?;
    }
    Ok(format!("Deleted {} record(s)", ids.len()))
}

fn record_line(record: &MediaRecord) -> String {
    format!(
        "{}\t{}\t{}\timage: {}\tvideo: {}",
        record.id,
        record.created_at.format("%Y-%m-%d %H:%M"),
        record.name,
        record.image_url().unwrap_or("-"),
        record.video_url().unwrap_or("-"),
    )
}

fn orphan_note(orphaned: &[MediaRef]) -> String {
    if orphaned.is_empty() {
        return String::new();
    }
    let urls: Vec<&str> = orphaned.iter().map(|r| r.url.as_str()).collect();
    format!("; uploaded but unreferenced: {}", urls.join(", "))
}

/// Turn a failed outcome into an error that still names the orphaned files.
fn outcome_into_result(outcome: UploadOutcome) -> Result<MediaRecord> {
    let note = orphan_note(outcome.orphaned());
    outcome
        .into_result()
        .map_err(|err| anyhow!(err).context(format!("upload did not complete{}", note)))
}

fn summarize_submission(report: SubmitReport) -> Result<String> {
    let mut lines: Vec<String> = report
        .saved
        .iter()
        .map(|(index, record)| format!("row {}: {}", index + 1, record_line(record)))
        .collect();
    if !report.skipped.is_empty() {
        let rows: Vec<String> = report.skipped.iter().map(|i| (i + 1).to_string()).collect();
        lines.push(format!("skipped rows without files: {}", rows.join(", ")));
    }

    match report.failure {
        None => {
            lines.push(format!("Saved {} row(s)", report.saved.len()));
            Ok(lines.join("\n"))
        }
        Some(failure) => {
            for line in &lines {
                tracing::info!("{}", line);
            }
            let note = orphan_note(failure.outcome.orphaned());
            let saved = report.saved.len();
            let err = failure
                .outcome
                .into_result()
                .err()
                .map(anyhow::Error::from)
                .unwrap_or_else(|| anyhow!("row failed"));
            Err(err.context(format!(
                "row {} failed after {} row(s) saved; later rows were not attempted{}",
                failure.index + 1,
                saved,
                note
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{errors::ClientError, services::upload_flow::RowFailure};
    use chrono::{DateTime, Utc};

    fn record(id: &str) -> MediaRecord {
        MediaRecord {
            id: id.into(),
            name: format!("name-{id}"),
            created_at: DateTime::<Utc>::from_timestamp_millis(0).unwrap(),
            image: Some(MediaRef::from_url(format!("https://cdn.test/{id}.png"))),
            video: None,
        }
    }

    #[test]
    fn record_line_marks_missing_video() {
        let line = record_line(&record("3"));
        assert!(line.starts_with("3\t1970-01-01 00:00\tname-3"));
        assert!(line.ends_with("video: -"));
    }

    #[test]
    fn failed_submission_names_row_and_orphans() {
        let report = SubmitReport {
            saved: vec![(0, record("1"))],
            skipped: vec![1],
            failure: Some(RowFailure {
                index: 2,
                outcome: UploadOutcome::SaveFailedAfterUpload {
                    error: ClientError::Save { status: 500 },
                    orphaned: vec![MediaRef::from_url("https://cdn.test/lost.png")],
                },
            }),
        };
        let err = summarize_submission(report).unwrap_err();
        let text = format!("{:#}", err);
        assert!(text.contains("row 3 failed after 1 row(s) saved"));
        assert!(text.contains("https://cdn.test/lost.png"));
        assert!(text.contains("status 500"));
    }

    #[test]
    fn successful_submission_lists_skips() {
        let report = SubmitReport {
            saved: vec![(1, record("9"))],
            skipped: vec![0],
            failure: None,
        };
        let text = summarize_submission(report).unwrap();
        assert!(text.contains("row 2: 9\t"));
        assert!(text.contains("skipped rows without files: 1"));
        assert!(text.ends_with("Saved 1 row(s)"));
    }
}
