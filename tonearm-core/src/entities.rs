//! Domain records returned by the remote catalog.
//!
//! These are data-transfer shapes: field names follow the catalog's
//! kebab-case JSON, and any field that is missing or `null` decodes to its
//! default. The only behavior here is the pair of derived lookups
//! ([`Release::discogs_release_ids`], [`Label::parent_labels`]) and the
//! display form of [`ReleaseGroup`].

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Decode `null` as the type's default value.
fn nullable<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Area {
    #[serde(deserialize_with = "nullable")]
    pub id: String,
    #[serde(deserialize_with = "nullable")]
    pub name: String,
    #[serde(deserialize_with = "nullable")]
    pub disambiguation: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tag {
    #[serde(deserialize_with = "nullable")]
    pub name: String,
    #[serde(deserialize_with = "nullable")]
    pub count: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LifeSpan {
    #[serde(deserialize_with = "nullable")]
    pub begin: String,
    #[serde(deserialize_with = "nullable")]
    pub end: String,
    #[serde(deserialize_with = "nullable")]
    pub ended: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Genre {
    #[serde(deserialize_with = "nullable")]
    pub id: String,
    #[serde(deserialize_with = "nullable")]
    pub name: String,
    #[serde(deserialize_with = "nullable")]
    pub disambiguation: String,
    #[serde(deserialize_with = "nullable")]
    pub count: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Artist {
    #[serde(deserialize_with = "nullable")]
    pub id: String,
    #[serde(deserialize_with = "nullable")]
    pub name: String,
    #[serde(deserialize_with = "nullable")]
    pub disambiguation: String,
    #[serde(deserialize_with = "nullable")]
    pub area: Area,
    #[serde(rename = "type", deserialize_with = "nullable")]
    pub artist_type: String,
    #[serde(deserialize_with = "nullable")]
    pub type_id: String,
    #[serde(deserialize_with = "nullable")]
    pub begin_area: Area,
    #[serde(deserialize_with = "nullable")]
    pub end_area: Area,
    #[serde(deserialize_with = "nullable")]
    pub gender: String,
    #[serde(deserialize_with = "nullable")]
    pub country: String,
    #[serde(deserialize_with = "nullable")]
    pub life_span: LifeSpan,
    #[serde(deserialize_with = "nullable")]
    pub tags: Vec<Tag>,
    #[serde(deserialize_with = "nullable")]
    pub releases: Vec<Release>,
    #[serde(deserialize_with = "nullable")]
    pub release_groups: Vec<ReleaseGroup>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ArtistCredit {
    #[serde(deserialize_with = "nullable")]
    pub artist: Artist,
    #[serde(deserialize_with = "nullable")]
    pub joinphrase: String,
    #[serde(deserialize_with = "nullable")]
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ReleaseGroup {
    #[serde(deserialize_with = "nullable")]
    pub id: String,
    #[serde(deserialize_with = "nullable")]
    pub title: String,
    #[serde(deserialize_with = "nullable")]
    pub first_release_date: String,
    #[serde(deserialize_with = "nullable")]
    pub primary_type: String,
    #[serde(deserialize_with = "nullable")]
    pub primary_type_id: String,
    #[serde(deserialize_with = "nullable")]
    pub secondary_types: Vec<String>,
    #[serde(deserialize_with = "nullable")]
    pub disambiguation: String,
    #[serde(deserialize_with = "nullable")]
    pub score: i64,
    #[serde(deserialize_with = "nullable")]
    pub tags: Vec<Tag>,
    #[serde(deserialize_with = "nullable")]
    pub releases: Vec<Release>,
    #[serde(deserialize_with = "nullable")]
    pub artist_credit: Vec<ArtistCredit>,
    #[serde(deserialize_with = "nullable")]
    pub genres: Vec<Genre>,
}

impl fmt::Display for ReleaseGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let artists: Vec<&str> = self
            .artist_credit
            .iter()
            .map(|credit| credit.name.as_str())
            .collect();
        write!(
            f,
            "[{}] {} - {} ({})",
            self.id,
            artists.join("; "),
            self.title,
            self.first_release_date
        )
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextRepresentation {
    #[serde(deserialize_with = "nullable")]
    pub language: String,
    #[serde(deserialize_with = "nullable")]
    pub script: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Recording {
    #[serde(deserialize_with = "nullable")]
    pub id: String,
    #[serde(deserialize_with = "nullable")]
    pub disambiguation: String,
    #[serde(deserialize_with = "nullable")]
    pub artist_credit: Vec<ArtistCredit>,
    /// Length in milliseconds.
    #[serde(deserialize_with = "nullable")]
    pub length: i64,
    #[serde(deserialize_with = "nullable")]
    pub title: String,
    #[serde(deserialize_with = "nullable")]
    pub first_release_date: String,
    #[serde(deserialize_with = "nullable")]
    pub video: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Track {
    #[serde(deserialize_with = "nullable")]
    pub id: String,
    #[serde(deserialize_with = "nullable")]
    pub position: i64,
    #[serde(deserialize_with = "nullable")]
    pub length: i64,
    #[serde(deserialize_with = "nullable")]
    pub title: String,
    #[serde(deserialize_with = "nullable")]
    pub artist_credit: Vec<ArtistCredit>,
    #[serde(deserialize_with = "nullable")]
    pub recording: Recording,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Media {
    #[serde(deserialize_with = "nullable")]
    pub format: String,
    #[serde(deserialize_with = "nullable")]
    pub title: String,
    #[serde(deserialize_with = "nullable")]
    pub position: i64,
    #[serde(deserialize_with = "nullable")]
    pub disc_count: i64,
    #[serde(deserialize_with = "nullable")]
    pub track_count: i64,
    #[serde(deserialize_with = "nullable")]
    pub track_offset: i64,
    #[serde(deserialize_with = "nullable")]
    pub format_id: String,
    #[serde(deserialize_with = "nullable")]
    pub pregap: Option<Track>,
    #[serde(deserialize_with = "nullable")]
    pub tracks: Vec<Track>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Release {
    #[serde(deserialize_with = "nullable")]
    pub id: String,
    #[serde(deserialize_with = "nullable")]
    pub title: String,
    #[serde(deserialize_with = "nullable")]
    pub status: String,
    #[serde(deserialize_with = "nullable")]
    pub disambiguation: String,
    #[serde(deserialize_with = "nullable")]
    pub text_representation: TextRepresentation,
    #[serde(deserialize_with = "nullable")]
    pub date: String,
    #[serde(deserialize_with = "nullable")]
    pub packaging: String,
    #[serde(deserialize_with = "nullable")]
    pub packaging_id: String,
    #[serde(deserialize_with = "nullable")]
    pub barcode: String,
    #[serde(deserialize_with = "nullable")]
    pub quality: String,
    #[serde(deserialize_with = "nullable")]
    pub country: String,
    #[serde(deserialize_with = "nullable")]
    pub track_count: i64,
    #[serde(deserialize_with = "nullable")]
    pub count: i64,
    #[serde(deserialize_with = "nullable")]
    pub score: i64,
    #[serde(deserialize_with = "nullable")]
    pub release_group: ReleaseGroup,
    #[serde(deserialize_with = "nullable")]
    pub artist_credit: Vec<ArtistCredit>,
    #[serde(deserialize_with = "nullable")]
    pub media: Vec<Media>,
    #[serde(deserialize_with = "nullable")]
    pub label_info: Vec<LabelInfo>,
    #[serde(deserialize_with = "nullable")]
    pub relations: Vec<Relation>,
}

static DISCOGS_RELEASE_ID: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"discogs\.com/release/(\d+)").expect("valid regex"));

impl Release {
    /// Discogs release ids linked from this release's URL relations.
    pub fn discogs_release_ids(&self) -> Vec<u64> {
        self.relations
            .iter()
            .filter(|rel| rel.target_type == "url" && rel.relation_type == "discogs")
            .filter_map(|rel| DISCOGS_RELEASE_ID.captures(&rel.url.resource))
            .filter_map(|caps| caps.get(1)?.as_str().parse().ok())
            .collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct LabelInfo {
    #[serde(deserialize_with = "nullable")]
    pub catalog_number: String,
    #[serde(deserialize_with = "nullable")]
    pub label: Label,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct RelationDetail {
    #[serde(deserialize_with = "nullable")]
    pub id: String,
    #[serde(deserialize_with = "nullable")]
    pub name: String,
    #[serde(deserialize_with = "nullable")]
    pub type_id: String,
    #[serde(rename = "type", deserialize_with = "nullable")]
    pub type_name: String,
    #[serde(deserialize_with = "nullable")]
    pub resource: String,
    #[serde(deserialize_with = "nullable")]
    pub disambiguation: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Relation {
    #[serde(deserialize_with = "nullable")]
    pub label: RelationDetail,
    #[serde(deserialize_with = "nullable")]
    pub series: RelationDetail,
    #[serde(deserialize_with = "nullable")]
    pub url: RelationDetail,
    #[serde(deserialize_with = "nullable")]
    pub target_type: String,
    #[serde(rename = "type", deserialize_with = "nullable")]
    pub relation_type: String,
    #[serde(deserialize_with = "nullable")]
    pub type_id: String,
    #[serde(deserialize_with = "nullable")]
    pub direction: String,
    #[serde(deserialize_with = "nullable")]
    pub target_credit: String,
    #[serde(deserialize_with = "nullable")]
    pub source_credit: String,
    #[serde(deserialize_with = "nullable")]
    pub ordering_key: i64,
    #[serde(deserialize_with = "nullable")]
    pub attribute_ids: HashMap<String, String>,
    #[serde(deserialize_with = "nullable")]
    pub attributes: Vec<String>,
}

const PARENT_LABEL_RELATION_TYPES: &[&str] = &["label ownership"];
const PARENT_LABEL_TYPES: &[&str] = &["Imprint", "Original Production"];

impl Relation {
    /// True when this relation points backwards to a label that owns the
    /// source label as an imprint or original production label.
    pub fn is_parent_label(&self) -> bool {
        !self.label.id.is_empty()
            && self.direction == "backward"
            && PARENT_LABEL_RELATION_TYPES.contains(&self.relation_type.as_str())
            && PARENT_LABEL_TYPES.contains(&self.label.type_name.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Label {
    #[serde(deserialize_with = "nullable")]
    pub id: String,
    #[serde(deserialize_with = "nullable")]
    pub name: String,
    #[serde(deserialize_with = "nullable")]
    pub country: String,
    #[serde(deserialize_with = "nullable")]
    pub life_span: LifeSpan,
    #[serde(deserialize_with = "nullable")]
    pub type_id: String,
    #[serde(deserialize_with = "nullable")]
    pub relations: Vec<Relation>,
    #[serde(deserialize_with = "nullable")]
    pub area: Area,
}

impl Label {
    pub fn parent_labels(&self) -> Vec<&Relation> {
        self.relations
            .iter()
            .filter(|rel| rel.is_parent_label())
            .collect()
    }
}

/// Primary release group types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReleaseType {
    Album,
    Single,
    #[serde(rename = "EP")]
    Ep,
    Broadcast,
    Other,
}

/// Secondary release group types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SecondaryReleaseType {
    Compilation,
    Soundtrack,
    Spokenword,
    Interview,
    Audiobook,
    #[serde(rename = "Audio drama")]
    AudioDrama,
    Live,
    Remix,
    #[serde(rename = "DJ-mix")]
    DjMix,
    #[serde(rename = "Mixtape/Street")]
    MixtapeStreet,
    Demo,
    #[serde(rename = "Field recording")]
    FieldRecording,
}
