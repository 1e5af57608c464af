//! Export submission and job monitor payloads.
//!
//! The export endpoint takes one flat JSON object whose `gms_hash` is either
//! `null` (neutral pose of the character) or a one-element list holding the
//! motion's processing hash. [`ExportRequest`] models the two cases as variants
//! of [`ExportKind`] and renders the flat wire shape on serialization.

use serde::{Serialize, Serializer};
use serde_json::{Map, Value};

/// Output format requested for every export.
pub const EXPORT_FORMAT: &str = "fbx7_2019";

const CHARACTER_TYPE: &str = "Character";

/// A validated export submission.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportRequest {
    /// Character the export is rendered on.
    pub character_id: String,
    /// Name the server gives the produced artifact.
    pub product_name: String,
    /// What is being exported.
    pub kind: ExportKind,
}

/// Neutral-pose vs motion export.
#[derive(Debug, Clone, PartialEq)]
pub enum ExportKind {
    /// The bare character in its neutral pose; no hash block.
    NeutralPose {
        /// Pose export preferences.
        preferences: PosePreferences,
    },
    /// One motion applied to the character.
    Motion {
        /// Product type echoed back to the server (normally `Motion`).
        product_type: String,
        /// Motion export preferences.
        preferences: MotionPreferences,
        /// Normalized processing hash.
        hash: GmsHash,
    },
}

/// Preferences for a neutral-pose export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PosePreferences {
    /// Output format.
    pub format: String,
    /// Mesh pose.
    pub mesh: String,
}

impl Default for PosePreferences {
    fn default() -> Self {
        Self {
            format: EXPORT_FORMAT.to_string(),
            mesh: "t-pose".to_string(),
        }
    }
}

/// Preferences for a motion export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MotionPreferences {
    /// Output format.
    pub format: String,
    /// Whether to include the skin (the server ignores `true` in practice).
    pub skin: bool,
    /// Frames per second, as a string.
    pub fps: String,
    /// Keyframe reduction level, as a string.
    pub reducekf: String,
}

impl Default for MotionPreferences {
    fn default() -> Self {
        Self {
            format: EXPORT_FORMAT.to_string(),
            skin: false,
            fps: "24".to_string(),
            reducekf: "0".to_string(),
        }
    }
}

/// Normalized processing-hash block of a motion.
///
/// Unknown keys from the source block are carried through untouched in
/// `extra`; the three keys the export endpoint is strict about are rewritten.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GmsHash {
    /// Every other key of the source block.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
    /// Parameter values flattened to a comma-joined string, e.g. `"1,0"`.
    pub params: String,
    /// Always 0.
    pub overdrive: i64,
    /// Trim range `[start, end]`.
    pub trim: [i64; 2],
}

impl ExportRequest {
    /// Builds a neutral-pose request for a character.
    #[must_use]
    pub fn neutral_pose(character_id: impl Into<String>, product_name: impl Into<String>) -> Self {
        Self {
            character_id: character_id.into(),
            product_name: product_name.into(),
            kind: ExportKind::NeutralPose {
                preferences: PosePreferences::default(),
            },
        }
    }

    /// Builds a motion request.
    #[must_use]
    pub fn motion(
        character_id: impl Into<String>,
        product_name: impl Into<String>,
        product_type: impl Into<String>,
        hash: GmsHash,
    ) -> Self {
        Self {
            character_id: character_id.into(),
            product_name: product_name.into(),
            kind: ExportKind::Motion {
                product_type: product_type.into(),
                preferences: MotionPreferences::default(),
                hash,
            },
        }
    }
}

#[derive(Serialize)]
#[serde(untagged)]
enum WirePreferences<'a> {
    Pose(&'a PosePreferences),
    Motion(&'a MotionPreferences),
}

#[derive(Serialize)]
struct WireExportRequest<'a> {
    character_id: &'a str,
    product_name: &'a str,
    #[serde(rename = "type")]
    product_type: &'a str,
    preferences: WirePreferences<'a>,
    gms_hash: Option<[&'a GmsHash; 1]>,
}

impl Serialize for ExportRequest {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let wire = match &self.kind {
            ExportKind::NeutralPose { preferences } => WireExportRequest {
                character_id: &self.character_id,
                product_name: &self.product_name,
                product_type: CHARACTER_TYPE,
                preferences: WirePreferences::Pose(preferences),
                gms_hash: None,
            },
            ExportKind::Motion {
                product_type,
                preferences,
                hash,
            } => WireExportRequest {
                character_id: &self.character_id,
                product_name: &self.product_name,
                product_type,
                preferences: WirePreferences::Motion(preferences),
                gms_hash: Some([hash]),
            },
        };
        wire.serialize(serializer)
    }
}

/// Response of the job monitor endpoint.
#[derive(Debug, Clone, Default, serde::Deserialize)]
pub struct JobStatusResponse {
    /// `processing`, `completed`, or `failed`.
    #[serde(default)]
    pub status: Option<String>,
    /// Result URL, present once completed.
    #[serde(default)]
    pub job_result: Option<String>,
}

/// Interpreted job monitor status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteJobStatus {
    /// Still rendering.
    Processing,
    /// Finished; carries the result URL if the server sent one.
    Completed(Option<String>),
    /// The server gave up on the job.
    Failed,
    /// Any other (or missing) status value.
    Unknown(Option<String>),
}

impl JobStatusResponse {
    /// Interprets the raw status string.
    #[must_use]
    pub fn remote_status(&self) -> RemoteJobStatus {
        match self.status.as_deref() {
            Some("processing") => RemoteJobStatus::Processing,
            Some("completed") => RemoteJobStatus::Completed(
                self.job_result.clone().filter(|url| !url.trim().is_empty()),
            ),
            Some("failed") => RemoteJobStatus::Failed,
            other => RemoteJobStatus::Unknown(other.map(str::to_string)),
        }
    }
}
