use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use nalgebra::Matrix4;
use serde::Serialize;

use super::joint::JointIndex;
use super::model::SkinnedModel;
use super::weights::MAX_INFLUENCES;
use crate::note::Note;

// ─── Diagnostic structs ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct JointDiagnostic {
    slot: JointIndex,
    name: String,
    source_name: String,
    renamed: bool,
    parent_index: Option<JointIndex>,
    parent_name: Option<String>,
    children: Vec<JointIndex>,
    bind_translation: [f32; 3],
    posed_translation: [f32; 3],
    weighted_vertex_count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct SkinDiagnostic {
    vertex_count: usize,
    bound_vertex_count: usize,
    unbound_vertex_count: usize,
    /// Vertices by number of used slots, index 0 through `MAX_INFLUENCES`.
    slot_histogram: [usize; MAX_INFLUENCES + 1],
}

#[derive(Debug, Clone, Serialize)]
pub struct SkeletonDiagnosticLog {
    source_path: String,
    joint_count: usize,
    renderable: bool,
    skin: SkinDiagnostic,
    joints: Vec<JointDiagnostic>,
    notes: Vec<Note>,
}

impl SkeletonDiagnosticLog {
    pub fn joint_count(&self) -> usize {
        self.joint_count
    }

    pub fn bound_vertex_count(&self) -> usize {
        self.skin.bound_vertex_count
    }
}

// ─── Path helper ──────────────────────────────────────────────────────────────

pub fn diagnostic_log_path_for_input(input_path: &Path) -> PathBuf {
    input_path.with_extension("diagnostic.json")
}

// ─── Collection ───────────────────────────────────────────────────────────────

/// Snapshot the model's skeleton, skin coverage, and notes.
///
/// Evaluates the pose first if it is stale.
pub fn collect_skeleton_diagnostic(
    model: &mut SkinnedModel,
    source_path: &Path,
) -> SkeletonDiagnosticLog {
    let skinning = model.skinning_matrices().to_vec();
    let table = model.joints();

    let mut weighted_counts = vec![0usize; table.len()];
    let mut slot_histogram = [0usize; MAX_INFLUENCES + 1];
    for attribute in model.skin_attributes() {
        slot_histogram[attribute.slot_count()] += 1;
        for (joint, _) in attribute.influences() {
            if let Some(count) = usize::try_from(joint)
                .ok()
                .and_then(|joint| weighted_counts.get_mut(joint))
            {
                *count += 1;
            }
        }
    }

    let joints = table
        .joints()
        .iter()
        .map(|joint| {
            let posed = skinning
                .get(joint.index())
                .map(|matrix| matrix * joint.bind_matrix())
                .unwrap_or_else(|| *joint.bind_matrix());
            JointDiagnostic {
                slot: joint.index(),
                name: joint.name().to_string(),
                source_name: joint.source_name().to_string(),
                renamed: joint.is_renamed(),
                parent_index: joint.parent(),
                parent_name: table
                    .parent(joint.index())
                    .map(|parent| parent.name().to_string()),
                children: joint.children().to_vec(),
                bind_translation: translation_of(joint.bind_matrix()),
                posed_translation: translation_of(&posed),
                weighted_vertex_count: weighted_counts
                    .get(joint.index())
                    .copied()
                    .unwrap_or(0),
            }
        })
        .collect::<Vec<_>>();

    let vertex_count = model.skin_attributes().len();
    SkeletonDiagnosticLog {
        source_path: source_path.display().to_string(),
        joint_count: table.len(),
        renderable: model.is_renderable(),
        skin: SkinDiagnostic {
            vertex_count,
            bound_vertex_count: vertex_count - slot_histogram[0],
            unbound_vertex_count: slot_histogram[0],
            slot_histogram,
        },
        joints,
        notes: model.notes().iter().cloned().collect(),
    }
}

// ─── Diagnostic writer ────────────────────────────────────────────────────────

pub fn write_skeleton_diagnostic_log(
    model: &mut SkinnedModel,
    source_path: &Path,
    diagnostic_path: &Path,
) -> Result<SkeletonDiagnosticLog> {
    let diagnostic = collect_skeleton_diagnostic(model, source_path);

    let json_bytes = serde_json::to_vec_pretty(&diagnostic)
        .context("failed to serialize skeleton diagnostic JSON")?;
    fs::write(diagnostic_path, json_bytes).with_context(|| {
        format!(
            "failed to write skeleton diagnostic log: {}",
            diagnostic_path.display()
        )
    })?;

    Ok(diagnostic)
}

fn translation_of(matrix: &Matrix4<f32>) -> [f32; 3] {
    [matrix[(0, 3)], matrix[(1, 3)], matrix[(2, 3)]]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rig::builder::{BuildOptions, ClusterRecord};
    use crate::rig::transform::Transform;
    use nalgebra::Translation3;

    fn sample_model() -> SkinnedModel {
        let hips_bind = Translation3::new(0.0, 1.0, 0.0).to_homogeneous();
        let records = vec![
            ClusterRecord::new(1, "Hips", None, hips_bind.try_inverse().unwrap())
                .with_weights(vec![0, 1], vec![1.0, 0.5]),
            ClusterRecord::new(2, "Spine", Some(1), Matrix4::identity())
                .with_weights(vec![1], vec![0.5]),
        ];
        SkinnedModel::from_clusters(Some(records.as_slice()), 3, &BuildOptions::default())
    }

    #[test]
    fn given_input_path_when_deriving_diagnostic_path_then_extension_is_replaced() {
        let path = diagnostic_log_path_for_input(Path::new("/tmp/avatar.skin.json"));
        assert_eq!(path, PathBuf::from("/tmp/avatar.skin.diagnostic.json"));
    }

    #[test]
    fn given_model_when_collecting_then_skin_coverage_is_counted() {
        let mut model = sample_model();

        let diagnostic = collect_skeleton_diagnostic(&mut model, Path::new("avatar.json"));

        assert_eq!(diagnostic.joint_count(), 3);
        assert_eq!(diagnostic.bound_vertex_count(), 2);
        assert_eq!(diagnostic.skin.slot_histogram, [1, 1, 1, 0, 0]);
        assert_eq!(diagnostic.joints[1].weighted_vertex_count, 2);
        assert_eq!(diagnostic.joints[2].parent_name.as_deref(), Some("Hips"));
    }

    #[test]
    fn given_posed_joint_when_collecting_then_posed_translation_moves() {
        let mut model = sample_model();
        model
            .set_joint_transform_by_name("Hips", &Transform::from_translation(0.5, 0.0, 0.0))
            .unwrap();

        let diagnostic = collect_skeleton_diagnostic(&mut model, Path::new("avatar.json"));

        assert_eq!(diagnostic.joints[1].bind_translation, [0.0, 1.0, 0.0]);
        assert_eq!(diagnostic.joints[1].posed_translation, [0.5, 1.0, 0.0]);
    }

    #[test]
    fn given_duplicate_names_when_collecting_then_renamed_joint_keeps_source_name() {
        let records = vec![
            ClusterRecord::new(1, "Hand", None, Matrix4::identity()),
            ClusterRecord::new(2, "Hand", None, Matrix4::identity()),
        ];
        let mut model =
            SkinnedModel::from_clusters(Some(records.as_slice()), 0, &BuildOptions::default());

        let diagnostic = collect_skeleton_diagnostic(&mut model, Path::new("hands.json"));

        assert!(!diagnostic.joints[1].renamed);
        assert!(diagnostic.joints[2].renamed);
        assert_eq!(diagnostic.joints[2].name, "Hand_1");
        assert_eq!(diagnostic.joints[2].source_name, "Hand");
    }

    #[test]
    fn given_model_when_serializing_diagnostic_then_notes_are_included() {
        let mut model = sample_model();

        let diagnostic = collect_skeleton_diagnostic(&mut model, Path::new("avatar.json"));
        let json = serde_json::to_value(&diagnostic).expect("serialize diagnostic");

        assert_eq!(json["joints"][0]["name"], "root");
        assert!(
            json["notes"]
                .as_array()
                .is_some_and(|notes| notes.iter().any(|note| note["code"] == "SKELETON_BUILT"))
        );
    }
}
