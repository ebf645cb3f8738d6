//! Two-phase upload + save, and the sequential draft-row submission built on
//! top of it.
//!
//! Uploads and record saves are separate backend calls with no transaction
//! between them. Instead of losing files that were stored before a later step
//! failed, every operation returns an [`UploadOutcome`] listing the orphaned
//! references so the caller can decide on cleanup or retry.

use crate::{
    errors::ClientError,
    models::{
        draft::DraftRow,
        media::{MediaKind, MediaPatch, MediaRecord, MediaRef},
    },
    services::media_client::MediaClient,
};
use std::path::Path;
use tracing::{error, info, warn};

/// Result of an upload-then-save sequence.
#[derive(Debug)]
pub enum UploadOutcome {
    /// Every upload and the save succeeded.
    Saved(MediaRecord),

    /// An upload failed. Files uploaded before it (if any) are orphaned.
    UploadFailed {
        kind: MediaKind,
        error: ClientError,
        orphaned: Vec<MediaRef>,
    },

    /// All uploads succeeded but the record save failed; every uploaded file
    /// is orphaned.
    SaveFailedAfterUpload {
        error: ClientError,
        orphaned: Vec<MediaRef>,
    },
}

impl UploadOutcome {
    pub fn record(&self) -> Option<&MediaRecord> {
        match self {
            UploadOutcome::Saved(record) => Some(record),
            _ => None,
        }
    }

    /// Files stored on the backend that no record references.
    pub fn orphaned(&self) -> &[MediaRef] {
        match self {
            UploadOutcome::Saved(_) => &[],
            UploadOutcome::UploadFailed { orphaned, .. }
            | UploadOutcome::SaveFailedAfterUpload { orphaned, .. } => orphaned,
        }
    }

    pub fn error(&self) -> Option<&ClientError> {
        match self {
            UploadOutcome::Saved(_) => None,
            UploadOutcome::UploadFailed { error, .. }
            | UploadOutcome::SaveFailedAfterUpload { error, .. } => Some(error),
        }
    }

    /// Collapse into a plain result, dropping orphan information.
    pub fn into_result(self) -> Result<MediaRecord, ClientError> {
        match self {
            UploadOutcome::Saved(record) => Ok(record),
            UploadOutcome::UploadFailed { error, .. }
            | UploadOutcome::SaveFailedAfterUpload { error, .. } => Err(error),
        }
    }
}

/// A row that stopped a draft submission.
#[derive(Debug)]
pub struct RowFailure {
    /// Index into the submitted rows.
    pub index: usize,
    pub outcome: UploadOutcome,
}

/// Summary of a draft submission.
#[derive(Debug, Default)]
pub struct SubmitReport {
    /// Indices and records of the rows saved, in submission order.
    pub saved: Vec<(usize, MediaRecord)>,
    /// Indices of rows skipped for having no files.
    pub skipped: Vec<usize>,
    /// The first failing row; rows after it were not attempted.
    pub failure: Option<RowFailure>,
}

impl SubmitReport {
    pub fn is_success(&self) -> bool {
        self.failure.is_none()
    }
}

/// References uploaded for one record.
struct Uploaded {
    image: Option<MediaRef>,
    video: Option<MediaRef>,
}

impl Uploaded {
    fn into_orphans(self) -> Vec<MediaRef> {
        self.image.into_iter().chain(self.video).collect()
    }
}

/// Upload workflows over a borrowed [`MediaClient`].
pub struct UploadFlow<'a> {
    client: &'a MediaClient,
}

impl<'a> UploadFlow<'a> {
    pub fn new(client: &'a MediaClient) -> Self {
        Self { client }
    }

    /// Upload image then video, stopping at the first failure.
    async fn upload_files(
        &self,
        image: Option<&Path>,
        video: Option<&Path>,
    ) -> Result<Uploaded, UploadOutcome> {
        let mut uploaded = Uploaded {
            image: None,
            video: None,
        };

        if let Some(path) = image {
            info!("uploading image {}", path.display());
            match self.client.upload_file(path, MediaKind::Image).await {
                Ok(r) => uploaded.image = Some(r),
                Err(error) => {
                    return Err(UploadOutcome::UploadFailed {
                        kind: MediaKind::Image,
                        error,
                        orphaned: uploaded.into_orphans(),
                    });
                }
            }
        }

        if let Some(path) = video {
            info!("uploading video {}", path.display());
            match self.client.upload_file(path, MediaKind::Video).await {
                Ok(r) => uploaded.video = Some(r),
                Err(error) => {
                    let orphaned = uploaded.into_orphans();
                    if !orphaned.is_empty() {
                        warn!("video upload failed; {} file(s) orphaned", orphaned.len());
                    }
                    return Err(UploadOutcome::UploadFailed {
                        kind: MediaKind::Video,
                        error,
                        orphaned,
                    });
                }
            }
        }

        Ok(uploaded)
    }

    /// Upload the given files and create one record referencing them.
    pub async fn upload_and_save(
        &self,
        name: &str,
        image: Option<&Path>,
        video: Option<&Path>,
    ) -> UploadOutcome {
        let uploaded = match self.upload_files(image, video).await {
            Ok(uploaded) => uploaded,
            Err(outcome) => return outcome,
        };

        match self
            .client
            .create_record(name, uploaded.image.as_ref(), uploaded.video.as_ref())
            .await
        {
            Ok(record) => UploadOutcome::Saved(record),
            Err(error) => {
                let orphaned = uploaded.into_orphans();
                error!(
                    "saving `{}` failed after upload; {} file(s) orphaned: {}",
                    name,
                    orphaned.len(),
                    error
                );
                UploadOutcome::SaveFailedAfterUpload { error, orphaned }
            }
        }
    }

    /// Upload replacement files (if any) and patch an existing record.
    pub async fn upload_and_update(
        &self,
        id: &str,
        name: Option<String>,
        image: Option<&Path>,
        video: Option<&Path>,
    ) -> UploadOutcome {
        let uploaded = match self.upload_files(image, video).await {
            Ok(uploaded) => uploaded,
            Err(outcome) => return outcome,
        };

        let patch = MediaPatch {
            name,
            image: uploaded.image.clone(),
            video: uploaded.video.clone(),
        };
        match self.client.update_record(id, &patch).await {
            Ok(record) => UploadOutcome::Saved(record),
            Err(error) => {
                let orphaned = uploaded.into_orphans();
                error!(
                    "updating {} failed after upload; {} file(s) orphaned: {}",
                    id,
                    orphaned.len(),
                    error
                );
                UploadOutcome::SaveFailedAfterUpload { error, orphaned }
            }
        }
    }

    /// Submit draft rows strictly in order.
    ///
    /// Rows without files are skipped. Each saved row gets its `saved_id`.
    /// Processing stops at the first failing row so the failure is attributed
    /// to exactly one row.
    pub async fn submit_drafts(&self, rows: &mut [DraftRow]) -> SubmitReport {
        let mut report = SubmitReport::default();

        for (index, row) in rows.iter_mut().enumerate() {
            if !row.has_files() {
                report.skipped.push(index);
                continue;
            }

            info!("submitting row {} (`{}`)", index, row.name);
            match self
                .upload_and_save(&row.name, row.image_path(), row.video_path())
                .await
            {
                UploadOutcome::Saved(record) => {
                    row.saved_id = Some(record.id.clone());
                    report.saved.push((index, record));
                }
                outcome => {
                    report.failure = Some(RowFailure { index, outcome });
                    break;
                }
            }
        }

        report
    }
}
