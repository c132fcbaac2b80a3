use thiserror::Error;

use crate::rig::JointIndex;

#[derive(Error, Debug)]
pub enum RigError {
    #[error("Unknown joint: {0}")]
    UnknownJoint(String),

    #[error("Joint index {index} out of range (joint count: {count})")]
    JointIndexOutOfRange { index: JointIndex, count: usize },
}
