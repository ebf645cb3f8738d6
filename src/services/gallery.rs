//! Local view of the user's media, kept in display order.

use crate::models::media::MediaRecord;
use std::cmp::Ordering;

/// Number of records shown in the "recent uploads" strip.
pub const RECENT_COUNT: usize = 6;

#[derive(Debug, Clone, Default)]
pub struct Gallery {
    records: Vec<MediaRecord>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GalleryStats {
    pub uploads: usize,
    pub images: usize,
    pub videos: usize,
}

impl Gallery {
    pub fn new(records: Vec<MediaRecord>) -> Self {
        let mut gallery = Self::default();
        gallery.replace(records);
        gallery
    }

    /// Replace the contents with a fresh listing and re-sort.
    pub fn replace(&mut self, mut records: Vec<MediaRecord>) {
        sort_newest_first(&mut records);
        self.records = records;
    }

    pub fn records(&self) -> &[MediaRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&MediaRecord> {
        self.records.iter().find(|r| r.id == id)
    }

    /// Insert or replace a record by id, keeping display order.
    pub fn upsert(&mut self, record: MediaRecord) {
        match self.records.iter_mut().find(|r| r.id == record.id) {
            Some(existing) => *existing = record,
            None => self.records.push(record),
        }
        sort_newest_first(&mut self.records);
    }

    /// Remove a record locally. Returns false when it was already gone.
    pub fn remove(&mut self, id: &str) -> bool {
        let before = self.records.len();
        self.records.retain(|r| r.id != id);
        self.records.len() != before
    }

    /// The newest `n` records.
    pub fn recent(&self, n: usize) -> &[MediaRecord] {
        &self.records[..n.min(self.records.len())]
    }

    pub fn find_by_image_url(&self, url: &str) -> Option<&MediaRecord> {
        self.records.iter().find(|r| r.image_url() == Some(url))
    }

    pub fn stats(&self) -> GalleryStats {
        GalleryStats {
            uploads: self.records.len(),
            images: self.records.iter().filter(|r| r.image.is_some()).count(),
            videos: self.records.iter().filter(|r| r.video.is_some()).count(),
        }
    }
}

/// Newest first; on equal timestamps, records with a video come first.
pub fn sort_newest_first(records: &mut [MediaRecord]) {
    records.sort_by(|a, b| match b.created_at.cmp(&a.created_at) {
        Ordering::Equal => b.video.is_some().cmp(&a.video.is_some()),
        other => other,
    });
}
