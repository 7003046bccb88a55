//! Image document model.
//!
//! An [`Image`] is the unit of retrieval and suggestion. The collection is
//! owned and mutated by upload/tagging pipelines outside this workspace; the
//! search layer only reads it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// =============================================================================
// SEARCHABLE FIELDS
// =============================================================================

/// The searchable fields of an image.
///
/// Three scalar free-text fields and four array-valued label fields. A
/// wildcard field path (as used by the fuzzy text match) means all of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchField {
    Description,
    AddedBy,
    AlbumName,
    AutoTags,
    UserTags,
    UserFaces,
    BacklogFaces,
}

impl SearchField {
    /// Every searchable field, scalars first.
    pub const ALL: [SearchField; 7] = [
        SearchField::Description,
        SearchField::AddedBy,
        SearchField::AlbumName,
        SearchField::AutoTags,
        SearchField::UserTags,
        SearchField::UserFaces,
        SearchField::BacklogFaces,
    ];

    /// Wire / column name of the field.
    pub fn as_str(&self) -> &'static str {
        match self {
            SearchField::Description => "description",
            SearchField::AddedBy => "added_by",
            SearchField::AlbumName => "album_name",
            SearchField::AutoTags => "auto_tags",
            SearchField::UserTags => "user_tags",
            SearchField::UserFaces => "user_faces",
            SearchField::BacklogFaces => "backlog_faces",
        }
    }

    /// Whether the field holds an array of labels.
    pub fn is_array(&self) -> bool {
        matches!(
            self,
            SearchField::AutoTags
                | SearchField::UserTags
                | SearchField::UserFaces
                | SearchField::BacklogFaces
        )
    }
}

impl std::fmt::Display for SearchField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// IMAGE
// =============================================================================

/// EXIF-derived metadata attached to an image.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImageMetadata {
    /// Capture timestamp. Absent for images without EXIF data.
    #[serde(
        rename = "DateTime",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub date_time: Option<DateTime<Utc>>,
}

/// One image record in the gallery.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Image {
    #[serde(rename = "_id")]
    pub id: Uuid,
    /// Stored file name (not searchable).
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub added_by: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub album_id: Option<Uuid>,
    #[serde(default)]
    pub album_name: String,
    #[serde(default)]
    pub auto_tags: Vec<String>,
    #[serde(default)]
    pub user_tags: Vec<String>,
    #[serde(default)]
    pub user_faces: Vec<String>,
    #[serde(default)]
    pub backlog_faces: Vec<String>,
    #[serde(default)]
    pub views: i64,
    #[serde(default)]
    pub metadata: ImageMetadata,
}

impl Image {
    /// Create an empty image with the given id.
    pub fn new(id: Uuid) -> Self {
        Self {
            id,
            name: String::new(),
            description: String::new(),
            added_by: String::new(),
            album_id: None,
            album_name: String::new(),
            auto_tags: Vec::new(),
            user_tags: Vec::new(),
            user_faces: Vec::new(),
            backlog_faces: Vec::new(),
            views: 0,
            metadata: ImageMetadata::default(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_added_by(mut self, added_by: impl Into<String>) -> Self {
        self.added_by = added_by.into();
        self
    }

    pub fn with_album(mut self, album_id: Uuid, album_name: impl Into<String>) -> Self {
        self.album_id = Some(album_id);
        self.album_name = album_name.into();
        self
    }

    pub fn with_auto_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.auto_tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_user_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.user_tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_user_faces<I, S>(mut self, faces: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.user_faces = faces.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_backlog_faces<I, S>(mut self, faces: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.backlog_faces = faces.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_views(mut self, views: i64) -> Self {
        self.views = views;
        self
    }

    pub fn with_taken_at(mut self, taken_at: DateTime<Utc>) -> Self {
        self.metadata.date_time = Some(taken_at);
        self
    }

    /// Capture timestamp, if known.
    pub fn taken_at(&self) -> Option<DateTime<Utc>> {
        self.metadata.date_time
    }

    /// Values stored in one searchable field.
    ///
    /// Scalar fields yield a one-element slice (possibly an empty string).
    pub fn field_values(&self, field: SearchField) -> &[String] {
        match field {
            SearchField::Description => std::slice::from_ref(&self.description),
            SearchField::AddedBy => std::slice::from_ref(&self.added_by),
            SearchField::AlbumName => std::slice::from_ref(&self.album_name),
            SearchField::AutoTags => &self.auto_tags,
            SearchField::UserTags => &self.user_tags,
            SearchField::UserFaces => &self.user_faces,
            SearchField::BacklogFaces => &self.backlog_faces,
        }
    }

    /// All searchable values, in [`SearchField::ALL`] order.
    pub fn searchable_values(&self) -> impl Iterator<Item = &str> + '_ {
        SearchField::ALL
            .into_iter()
            .flat_map(move |field| self.field_values(field).iter().map(String::as_str))
    }
}
