use nalgebra::Matrix4;

use super::joint::{Joint, JointIndex};
use super::table::{JointTable, ROOT_INDEX};
use crate::note::{Note, Notes};

/// Recompute every skinning matrix top-down from the root.
///
/// For each joint,
/// `world = parent_world * bind * local_transform * inverse_bind`, stored at
/// the joint's slot and passed to its children as their parent matrix. The
/// root starts from identity. Always a full pass; calling it again without
/// changing any local transform reproduces the same matrices bit for bit.
///
/// A child slot that does not exist is reported and its branch skipped;
/// siblings are still evaluated.
pub fn evaluate_pose(table: &mut JointTable) -> Notes {
    let mut notes = Notes::new();
    if table.is_empty() {
        return notes;
    }

    let (joints, results) = table.split_for_evaluation();
    evaluate_joint(joints, results, ROOT_INDEX, &Matrix4::identity(), &mut notes);
    notes
}

fn evaluate_joint(
    joints: &[Joint],
    results: &mut [Matrix4<f32>],
    index: JointIndex,
    parent_world: &Matrix4<f32>,
    notes: &mut Notes,
) {
    let (Some(joint), true) = (joints.get(index), index < results.len()) else {
        notes.push(Note::fatal(
            "MISSING_JOINT",
            format!("Joint {index} referenced during pose evaluation does not exist"),
        ));
        return;
    };

    let world = parent_world
        * joint.bind_matrix()
        * joint.local_transform()
        * joint.inverse_bind_matrix();
    results[index] = world;

    for child in joint.children() {
        evaluate_joint(joints, results, *child, &world, notes);
    }
}
