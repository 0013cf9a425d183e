// Core data structures for the schedule scraper

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Marker text stored for a slot with no lesson
pub const NO_LESSONS_MESSAGE: &str = "No lessons on this time";

/// Kind of entity a schedule is requested for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubjectKind {
    /// Student group
    Group,
    /// Staff member (instructor)
    Staff,
}

impl SubjectKind {
    /// Get string representation used in storage keys
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Group => "group",
            Self::Staff => "staff",
        }
    }

    /// Query parameter carrying the subject id on the source site
    pub fn query_param(&self) -> &'static str {
        match self {
            Self::Group => "groupId",
            Self::Staff => "staffId",
        }
    }

    /// Create from string
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "group" | "groupid" => Some(Self::Group),
            "staff" | "staffid" | "teacher" => Some(Self::Staff),
            _ => None,
        }
    }
}

impl fmt::Display for SubjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Individually linked group of a lesson
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupLink {
    /// Group number as displayed, e.g. `ИВТ-101`
    pub number: String,

    /// Link to the group's schedule, when the anchor carries one
    #[serde(default)]
    pub href: Option<String>,
}

/// One serialized group entry: a bare label or a linked group
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum GroupRef {
    Label(String),
    Link(GroupLink),
}

/// Groups attending a lesson
///
/// The page shows either one aggregated caption or a list of linked
/// groups, never both. Serialized as a JSON array: `["label"]` or
/// `[{"number": .., "href": ..}, ..]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<GroupRef>", into = "Vec<GroupRef>")]
pub enum Groups {
    /// Single free-text caption
    Aggregated(String),
    /// Linked group entries in document order (possibly none)
    Linked(Vec<GroupLink>),
}

impl Groups {
    /// Number of group entries
    pub fn len(&self) -> usize {
        match self {
            Self::Aggregated(_) => 1,
            Self::Linked(links) => links.len(),
        }
    }

    /// Whether no group is attached
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for Groups {
    fn default() -> Self {
        Self::Linked(Vec::new())
    }
}

impl From<Groups> for Vec<GroupRef> {
    fn from(groups: Groups) -> Self {
        match groups {
            Groups::Aggregated(label) => vec![GroupRef::Label(label)],
            Groups::Linked(links) => links.into_iter().map(GroupRef::Link).collect(),
        }
    }
}

impl TryFrom<Vec<GroupRef>> for Groups {
    type Error = String;

    fn try_from(refs: Vec<GroupRef>) -> Result<Self, Self::Error> {
        let labels = refs
            .iter()
            .filter(|r| matches!(r, GroupRef::Label(_)))
            .count();

        match (labels, refs.len()) {
            (0, _) => Ok(Self::Linked(
                refs.into_iter()
                    .filter_map(|r| match r {
                        GroupRef::Link(link) => Some(link),
                        GroupRef::Label(_) => None,
                    })
                    .collect(),
            )),
            (1, 1) => match refs.into_iter().next() {
                Some(GroupRef::Label(label)) => Ok(Self::Aggregated(label)),
                _ => Err("expected a single group label".to_string()),
            },
            _ => Err("group list mixes labels and linked groups".to_string()),
        }
    }
}

/// One lesson inside a time slot
///
/// Text fields are `None` when the node is absent or blank after
/// trimming, never an empty string.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Lesson {
    pub discipline: Option<String>,
    pub place: Option<String>,
    pub teacher: Option<String>,
    #[serde(default)]
    pub groups: Groups,
}

/// Sentinel meaning "no lesson scheduled in this slot"
///
/// Serialized as `{"message": "No lessons on this time"}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Placeholder;

#[derive(Serialize, Deserialize)]
struct PlaceholderRepr<'a> {
    message: std::borrow::Cow<'a, str>,
}

impl Serialize for Placeholder {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        PlaceholderRepr {
            message: NO_LESSONS_MESSAGE.into(),
        }
        .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Placeholder {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let repr = PlaceholderRepr::deserialize(deserializer)?;
        if repr.message == NO_LESSONS_MESSAGE {
            Ok(Placeholder)
        } else {
            Err(serde::de::Error::custom(format!(
                "unexpected placeholder message: {}",
                repr.message
            )))
        }
    }
}

/// One serialized entry of a slot cell
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellEntry {
    // Must come first: a lesson would also accept a `{message}` object
    Placeholder(Placeholder),
    Lesson(Lesson),
}

/// One position of the weekly time x day grid
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<CellEntry>", into = "Vec<CellEntry>")]
pub enum SlotCell {
    /// No lesson markup at all
    Placeholder,
    /// Lessons found in the slot; empty when every lesson entry was malformed
    Lessons(Vec<Lesson>),
}

impl SlotCell {
    /// Whether the cell is the "no lesson" sentinel
    pub fn is_placeholder(&self) -> bool {
        matches!(self, Self::Placeholder)
    }

    /// Lessons of the cell; empty for placeholders
    pub fn lessons(&self) -> &[Lesson] {
        match self {
            Self::Placeholder => &[],
            Self::Lessons(lessons) => lessons,
        }
    }
}

impl From<Vec<CellEntry>> for SlotCell {
    fn from(entries: Vec<CellEntry>) -> Self {
        let all_markers = !entries.is_empty()
            && entries
                .iter()
                .all(|e| matches!(e, CellEntry::Placeholder(_)));

        if all_markers {
            return Self::Placeholder;
        }

        Self::Lessons(
            entries
                .into_iter()
                .filter_map(|e| match e {
                    CellEntry::Lesson(lesson) => Some(lesson),
                    CellEntry::Placeholder(_) => None,
                })
                .collect(),
        )
    }
}

impl From<SlotCell> for Vec<CellEntry> {
    fn from(cell: SlotCell) -> Self {
        match cell {
            SlotCell::Placeholder => vec![CellEntry::Placeholder(Placeholder)],
            SlotCell::Lessons(lessons) => lessons.into_iter().map(CellEntry::Lesson).collect(),
        }
    }
}
