use nalgebra::Matrix4;

use super::builder::{BuildOptions, ClusterRecord, build_hierarchy};
use super::joint::JointIndex;
use super::pose::evaluate_pose;
use super::table::JointTable;
use super::transform::Transform;
use super::weights::{SkinAttribute, resolve_weights};
use crate::error::RigError;
use crate::note::{Note, Notes};

/// Skinned mesh state handed to a renderer: skeleton, per-vertex skin
/// attributes, and lazily refreshed skinning matrices.
#[derive(Debug, Clone)]
pub struct SkinnedModel {
    table: JointTable,
    skin: Vec<SkinAttribute>,
    vertex_count: usize,
    pose_dirty: bool,
    notes: Notes,
}

impl SkinnedModel {
    /// Build the skeleton and skin attributes for a mesh of `vertex_count`
    /// vertices.
    ///
    /// `None` means the mesh has no skin at all. When no skeleton comes out,
    /// the skin attribute buffer is empty as well.
    pub fn from_clusters(
        records: Option<&[ClusterRecord]>,
        vertex_count: usize,
        options: &BuildOptions,
    ) -> Self {
        let mut notes = Notes::new();

        let Some(records) = records else {
            notes.push(Note::fatal("NO_SKIN", "Mesh has no skin; no skeleton was built"));
            return Self {
                table: JointTable::new(),
                skin: Vec::new(),
                vertex_count,
                pose_dirty: false,
                notes,
            };
        };

        let build = build_hierarchy(records, options);
        notes.append(build.notes);

        let skin = if build.table.is_empty() {
            Vec::new()
        } else {
            let resolved = resolve_weights(&build.raw_weights);
            let dropped = resolved.out_of_range_count(vertex_count);
            let skin = resolved.dense(vertex_count);
            notes.append(resolved.notes);
            if dropped > 0 {
                notes.push(Note::warning(
                    "VERTEX_INDEX_OUT_OF_RANGE",
                    format!(
                        "{dropped} weighted vertices are outside the mesh ({vertex_count} vertices); their influences were ignored"
                    ),
                ));
            }
            skin
        };

        Self {
            pose_dirty: !build.table.is_empty(),
            table: build.table,
            skin,
            vertex_count,
            notes,
        }
    }

    pub fn joints(&self) -> &JointTable {
        &self.table
    }

    pub fn has_skeleton(&self) -> bool {
        !self.table.is_empty()
    }

    /// Whether a renderer can use this model: a skeleton exists and no note
    /// is fatal.
    pub fn is_renderable(&self) -> bool {
        self.has_skeleton() && !self.notes.has_fatal()
    }

    pub fn vertex_count(&self) -> usize {
        self.vertex_count
    }

    /// One attribute per vertex; empty without a skeleton.
    pub fn skin_attributes(&self) -> &[SkinAttribute] {
        &self.skin
    }

    /// Skin attributes as raw bytes for a vertex buffer upload.
    pub fn skin_attribute_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.skin)
    }

    pub fn notes(&self) -> &Notes {
        &self.notes
    }

    pub fn needs_pose_update(&self) -> bool {
        self.pose_dirty
    }

    pub fn set_joint_local_matrix(
        &mut self,
        index: JointIndex,
        matrix: Matrix4<f32>,
    ) -> Result<(), RigError> {
        self.table.set_local_transform(index, matrix)?;
        self.pose_dirty = true;
        Ok(())
    }

    pub fn set_joint_transform(
        &mut self,
        index: JointIndex,
        transform: &Transform,
    ) -> Result<(), RigError> {
        self.set_joint_local_matrix(index, transform.to_matrix())
    }

    pub fn set_joint_transform_by_name(
        &mut self,
        name: &str,
        transform: &Transform,
    ) -> Result<JointIndex, RigError> {
        let index = self.table.set_local_transform_by_name(name, transform.to_matrix())?;
        self.pose_dirty = true;
        Ok(index)
    }

    /// Current skinning matrices, re-evaluated first if any joint moved.
    pub fn skinning_matrices(&mut self) -> &[Matrix4<f32>] {
        if self.pose_dirty {
            let evaluation = evaluate_pose(&mut self.table);
            self.notes.append(evaluation);
            self.pose_dirty = false;
        }
        self.table.result_matrices()
    }

    /// Column-major skinning matrices flattened for a uniform upload.
    pub fn skinning_matrix_data(&mut self) -> Vec<f32> {
        self.skinning_matrices()
            .iter()
            .flat_map(|matrix| matrix.as_slice().iter().copied())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rig::weights::NO_JOINT;
    use nalgebra::Translation3;

    fn hand_records() -> Vec<ClusterRecord> {
        let wrist_bind = Translation3::new(0.0, 1.0, 0.0).to_homogeneous();
        vec![
            ClusterRecord::new(1, "Forearm", None, Matrix4::identity())
                .with_weights(vec![0, 1], vec![1.0, 0.4]),
            ClusterRecord::new(2, "Hand", Some(1), wrist_bind.try_inverse().unwrap())
                .with_weights(vec![1, 2], vec![0.6, 1.0]),
        ]
    }

    fn model_for(records: &[ClusterRecord], vertex_count: usize) -> SkinnedModel {
        SkinnedModel::from_clusters(Some(records), vertex_count, &BuildOptions::default())
    }

    #[test]
    fn given_clusters_when_building_model_then_every_vertex_gets_an_attribute() {
        let records = hand_records();
        let model = model_for(&records, 4);

        assert!(model.is_renderable());
        assert_eq!(model.skin_attributes().len(), 4);
        assert_eq!(model.skin_attributes()[1].joints, [2, 1, NO_JOINT, NO_JOINT]);
        assert!(model.skin_attributes()[3].is_unbound());
        assert_eq!(model.skin_attribute_bytes().len(), 4 * 32);
    }

    #[test]
    fn given_missing_skin_when_building_model_then_fatal_note_and_no_skeleton() {
        let model = SkinnedModel::from_clusters(None, 10, &BuildOptions::default());

        assert!(!model.has_skeleton());
        assert!(!model.is_renderable());
        assert!(model.notes().contains_code("NO_SKIN"));
        assert!(model.skin_attributes().is_empty());
    }

    #[test]
    fn given_empty_cluster_list_when_building_model_then_no_clusters_is_fatal() {
        let model = model_for(&[], 10);

        assert!(!model.has_skeleton());
        assert!(model.notes().contains_code("NO_CLUSTERS"));
    }

    #[test]
    fn given_new_model_when_reading_matrices_then_pose_is_evaluated_once() {
        let records = hand_records();
        let mut model = model_for(&records, 3);
        assert!(model.needs_pose_update());

        let count = model.skinning_matrices().len();

        assert_eq!(count, model.joints().len());
        assert!(!model.needs_pose_update());
    }

    #[test]
    fn given_joint_transform_edit_when_reading_matrices_then_pose_is_refreshed() {
        let records = hand_records();
        let mut model = model_for(&records, 3);
        let rest = model.skinning_matrices().to_vec();

        let push = Transform::from_translation(0.0, 0.0, 2.0);
        let index = model
            .set_joint_transform_by_name("Forearm", &push)
            .expect("Forearm exists");
        assert!(model.needs_pose_update());
        let posed = model.skinning_matrices().to_vec();

        assert_ne!(rest[index], posed[index]);
        let hand = model.joints().index_of("Hand").expect("Hand exists");
        let expected = Translation3::new(0.0, 0.0, 2.0).to_homogeneous();
        assert!((posed[hand] - expected).norm() < 1e-6);
    }

    #[test]
    fn given_joint_index_when_setting_transform_then_local_matrix_matches_transform() {
        let records = hand_records();
        let mut model = model_for(&records, 3);
        let turn = Transform {
            rotation: [0.0, 0.0, 0.5],
            ..Transform::default()
        };

        model.set_joint_transform(2, &turn).expect("slot 2 exists");

        assert_eq!(model.joints().local_transform(2), Some(&turn.to_matrix()));
        assert!(model.set_joint_transform(7, &turn).is_err());
    }

    #[test]
    fn given_unknown_joint_when_setting_transform_then_pose_stays_clean() {
        let records = hand_records();
        let mut model = model_for(&records, 3);
        model.skinning_matrices();

        let result = model.set_joint_transform_by_name("Tail", &Transform::default());

        assert!(result.is_err());
        assert!(!model.needs_pose_update());
    }

    #[test]
    fn given_weights_beyond_vertex_count_when_building_model_then_warning_is_recorded() {
        let records = vec![
            ClusterRecord::new(1, "Hips", None, Matrix4::identity())
                .with_weights(vec![0, 9], vec![1.0, 1.0]),
        ];

        let model = model_for(&records, 2);

        assert!(model.notes().contains_code("VERTEX_INDEX_OUT_OF_RANGE"));
        assert_eq!(model.skin_attributes().len(), 2);
    }

    #[test]
    fn given_model_when_flattening_matrices_then_sixteen_floats_per_joint() {
        let records = hand_records();
        let mut model = model_for(&records, 3);

        let data = model.skinning_matrix_data();

        assert_eq!(data.len(), model.joints().len() * 16);
        assert_eq!(&data[..16], Matrix4::<f32>::identity().as_slice());
    }
}
