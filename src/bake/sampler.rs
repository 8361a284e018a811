use glam::{Mat4, Quat, Vec3};

use crate::animation::{Frame, RootMotionDelta};
use crate::errors::{GpuSkinError, Result};
use crate::skeleton::{LocalTransform, Skeleton};

/// Skinning matrix per bone for one pose.
///
/// Bone `i` gets `L_root * ... * L_parent * L_i * bind_i`. Bones are stored
/// parent-first, so each bone reuses its parent's accumulated chain.
pub fn skinning_matrices(skeleton: &Skeleton, locals: &[LocalTransform]) -> Result<Vec<Mat4>> {
    if locals.len() != skeleton.len() {
        return Err(GpuSkinError::PoseMismatch {
            expected: skeleton.len(),
            actual: locals.len(),
        });
    }

    let bones = skeleton.bones();
    let mut chains: Vec<Mat4> = Vec::with_capacity(bones.len());
    let mut matrices = Vec::with_capacity(bones.len());

    for (bone, local) in bones.iter().zip(locals) {
        let chain = match bone.parent {
            Some(parent) => chains[parent] * local.to_matrix(),
            None => local.to_matrix(),
        };
        matrices.push(chain * bone.bind_pose);
        chains.push(chain);
    }

    Ok(matrices)
}

/// Samples the frames of one clip, in time order.
///
/// Root motion is measured against the root pose of the first sampled frame.
/// Frame 0 cannot have a delta of its own, so it receives a copy of frame 1's
/// once that frame exists.
#[derive(Debug, Clone)]
pub struct FrameSampler {
    root_bone_index: usize,
    owner_forward: Vec3,
    reference: Option<(Vec3, Quat)>,
    frames: Vec<Frame>,
}

impl FrameSampler {
    #[must_use]
    pub fn new(root_bone_index: usize, owner_forward: Vec3) -> Self {
        let owner_forward = owner_forward.try_normalize().unwrap_or(Vec3::Z);
        Self {
            root_bone_index,
            owner_forward,
            reference: None,
            frames: Vec::new(),
        }
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    #[must_use]
    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    #[must_use]
    pub fn into_frames(self) -> Vec<Frame> {
        self.frames
    }

    /// Samples the next frame from the current pose.
    pub fn sample(&mut self, skeleton: &Skeleton, locals: &[LocalTransform]) -> Result<&Frame> {
        let matrices = skinning_matrices(skeleton, locals)?;
        let root = locals.get(self.root_bone_index).ok_or_else(|| {
            GpuSkinError::InvalidHierarchy(format!(
                "root bone index {} out of range for {} bones",
                self.root_bone_index,
                locals.len()
            ))
        })?;

        let root_motion = match self.reference {
            None => {
                self.reference = Some((root.translation, root.rotation));
                RootMotionDelta::default()
            }
            Some((position, rotation)) => {
                self.root_motion_delta(position, rotation, root.translation, root.rotation)
            }
        };

        self.frames.push(Frame {
            matrices,
            root_motion,
        });

        if self.frames.len() == 2 {
            self.frames[0].root_motion = root_motion;
        }

        Ok(&self.frames[self.frames.len() - 1])
    }

    fn root_motion_delta(
        &self,
        reference_position: Vec3,
        reference_rotation: Quat,
        position: Vec3,
        rotation: Quat,
    ) -> RootMotionDelta {
        let delta = position - reference_position;
        let position_rotation = delta
            .try_normalize()
            .map_or(Quat::IDENTITY, |dir| Quat::from_rotation_arc(self.owner_forward, dir));

        RootMotionDelta {
            position_rotation,
            position_length: delta.length(),
            rotation: reference_rotation.inverse() * rotation,
        }
    }
}
