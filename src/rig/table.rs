use std::collections::HashMap;

use nalgebra::Matrix4;

use super::joint::{Joint, JointIndex};
use crate::error::RigError;

/// Index of the synthetic root joint in every non-empty table.
pub const ROOT_INDEX: JointIndex = 0;

/// Arena of every joint of one skeleton.
///
/// `joints[i].index == i` and `result_matrices.len() == joints.len()` hold
/// after every mutation.
#[derive(Debug, Clone, Default)]
pub struct JointTable {
    joints: Vec<Joint>,
    name_index: HashMap<String, JointIndex>,
    result_matrices: Vec<Matrix4<f32>>,
}

impl JointTable {
    /// An empty table with no root, returned when no skeleton can be built.
    pub fn new() -> Self {
        Self::default()
    }

    /// A table holding only the synthetic root at [`ROOT_INDEX`].
    pub fn with_root(root_name: &str) -> Self {
        let mut table = Self::new();
        table.push_joint(root_name.to_string(), Matrix4::identity());
        table
            .name_index
            .insert(root_name.to_string(), ROOT_INDEX);
        table
    }

    pub fn len(&self) -> usize {
        self.joints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.joints.is_empty()
    }

    pub fn root(&self) -> Option<&Joint> {
        self.joints.first()
    }

    pub fn joints(&self) -> &[Joint] {
        &self.joints
    }

    pub fn get(&self, index: JointIndex) -> Option<&Joint> {
        self.joints.get(index)
    }

    pub fn get_by_name(&self, name: &str) -> Option<&Joint> {
        self.index_of(name).and_then(|index| self.joints.get(index))
    }

    pub fn index_of(&self, name: &str) -> Option<JointIndex> {
        self.name_index.get(name).copied()
    }

    pub fn contains_name(&self, name: &str) -> bool {
        self.name_index.contains_key(name)
    }

    /// Registered names with their joint slots, in no particular order.
    pub fn names(&self) -> impl Iterator<Item = (&str, JointIndex)> {
        self.name_index
            .iter()
            .map(|(name, index)| (name.as_str(), *index))
    }

    /// Children of `index` in attachment order; empty for an unknown index.
    pub fn children(&self, index: JointIndex) -> impl Iterator<Item = &Joint> {
        self.joints
            .get(index)
            .map(|joint| joint.children.as_slice())
            .unwrap_or_default()
            .iter()
            .filter_map(|child| self.joints.get(*child))
    }

    pub fn parent(&self, index: JointIndex) -> Option<&Joint> {
        self.joints
            .get(index)
            .and_then(|joint| joint.parent)
            .and_then(|parent| self.joints.get(parent))
    }

    pub fn local_transform(&self, index: JointIndex) -> Option<&Matrix4<f32>> {
        self.joints.get(index).map(|joint| &joint.local_transform)
    }

    /// Replace a joint's pose. The skinning matrices are stale until the next
    /// `evaluate_pose`.
    pub fn set_local_transform(
        &mut self,
        index: JointIndex,
        transform: Matrix4<f32>,
    ) -> Result<(), RigError> {
        let count = self.joints.len();
        let joint = self
            .joints
            .get_mut(index)
            .ok_or(RigError::JointIndexOutOfRange { index, count })?;
        joint.local_transform = transform;
        Ok(())
    }

    pub fn set_local_transform_by_name(
        &mut self,
        name: &str,
        transform: Matrix4<f32>,
    ) -> Result<JointIndex, RigError> {
        let index = self
            .index_of(name)
            .ok_or_else(|| RigError::UnknownJoint(name.to_string()))?;
        self.set_local_transform(index, transform)?;
        Ok(index)
    }

    /// Latest skinning matrix per joint, indexed like `joints()`.
    pub fn result_matrices(&self) -> &[Matrix4<f32>] {
        &self.result_matrices
    }

    /// Joints alongside their writable result slots, for pose evaluation.
    pub(crate) fn split_for_evaluation(&mut self) -> (&[Joint], &mut [Matrix4<f32>]) {
        (&self.joints, &mut self.result_matrices)
    }

    /// Append a joint at the next slot. Returns its index and whether its
    /// inverse bind matrix was invertible.
    pub(crate) fn push_joint(
        &mut self,
        name: String,
        inverse_bind_matrix: Matrix4<f32>,
    ) -> (JointIndex, bool) {
        let index = self.joints.len();
        let (joint, invertible) = Joint::new(name, index, inverse_bind_matrix);
        self.joints.push(joint);
        self.result_matrices.push(Matrix4::identity());
        (index, invertible)
    }

    /// Bind `name` to `index`, returning the joint previously bound to it.
    pub(crate) fn register_name(
        &mut self,
        name: String,
        index: JointIndex,
    ) -> Option<JointIndex> {
        if let Some(joint) = self.joints.get_mut(index) {
            joint.name = name.clone();
        }
        self.name_index.insert(name, index)
    }

    /// Record a parent/child edge in both directions.
    pub(crate) fn attach(&mut self, parent: JointIndex, child: JointIndex) {
        if parent >= self.joints.len() || child >= self.joints.len() {
            return;
        }
        self.joints[child].parent = Some(parent);
        self.joints[parent].children.push(child);
    }

    #[cfg(test)]
    pub(crate) fn insert_dangling_child(&mut self, parent: JointIndex, child: JointIndex) {
        self.joints[parent].children.insert(0, child);
    }
}
