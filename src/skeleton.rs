use glam::{Mat4, Quat, Vec3};
use serde::{Deserialize, Serialize};

use crate::errors::{GpuSkinError, Result};

/// Local TRS of one bone relative to its parent, as set by a pose source.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LocalTransform {
    pub translation: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for LocalTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl LocalTransform {
    pub const IDENTITY: Self = Self {
        translation: Vec3::ZERO,
        rotation: Quat::IDENTITY,
        scale: Vec3::ONE,
    };

    #[must_use]
    pub fn new(translation: Vec3, rotation: Quat, scale: Vec3) -> Self {
        Self {
            translation,
            rotation,
            scale,
        }
    }

    #[inline]
    #[must_use]
    pub fn to_matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.translation)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bone {
    pub name: String,
    /// Object space → bone space at rest (inverse bind matrix)
    pub bind_pose: Mat4,
    /// `None` only for the root
    pub parent: Option<usize>,
    pub children: Vec<usize>,
}

/// Node of the host hierarchy the bone list is collected from.
///
/// `bind_pose` is `None` for transforms that take part in the hierarchy but
/// are not referenced by the skin; those bones bake with an identity bind pose.
#[derive(Debug, Clone, Default)]
pub struct SourceBone {
    pub name: String,
    pub bind_pose: Option<Mat4>,
    pub children: Vec<SourceBone>,
}

impl SourceBone {
    #[must_use]
    pub fn new(name: &str, bind_pose: Option<Mat4>) -> Self {
        Self {
            name: name.to_string(),
            bind_pose,
            children: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_child(mut self, child: SourceBone) -> Self {
        self.children.push(child);
        self
    }
}

/// Immutable bone list of a baked dataset.
///
/// Bones are stored in depth-first order, so every parent index is smaller
/// than the index of its children and index 0 is the root.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Skeleton {
    bones: Vec<Bone>,
}

impl Skeleton {
    /// Validates a pre-built bone list.
    pub fn new(bones: Vec<Bone>) -> Result<Self> {
        if bones.is_empty() {
            return Err(GpuSkinError::InvalidHierarchy("skeleton has no bones".into()));
        }

        for (index, bone) in bones.iter().enumerate() {
            match bone.parent {
                None if index != 0 => {
                    return Err(GpuSkinError::InvalidHierarchy(format!(
                        "bone {index} ('{}') has no parent but is not the root",
                        bone.name
                    )));
                }
                Some(_) if index == 0 => {
                    return Err(GpuSkinError::InvalidHierarchy(format!(
                        "root bone '{}' has a parent",
                        bone.name
                    )));
                }
                Some(parent) if parent >= index => {
                    return Err(GpuSkinError::InvalidHierarchy(format!(
                        "bone {index} ('{}') refers to parent {parent} which does not precede it",
                        bone.name
                    )));
                }
                _ => {}
            }

            for &child in &bone.children {
                let consistent = bones.get(child).is_some_and(|c| c.parent == Some(index));
                if !consistent {
                    return Err(GpuSkinError::InvalidHierarchy(format!(
                        "bone {index} ('{}') lists child {child} that does not point back",
                        bone.name
                    )));
                }
            }
        }

        Ok(Self { bones })
    }

    /// Walks `root` depth-first and collects one bone per node.
    #[must_use]
    pub fn collect(root: &SourceBone) -> Self {
        let mut bones = Vec::new();
        collect_bones(&mut bones, root, None);
        Self { bones }
    }

    #[inline]
    #[must_use]
    pub fn bones(&self) -> &[Bone] {
        &self.bones
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.bones.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bones.is_empty()
    }

    #[must_use]
    pub fn find(&self, name: &str) -> Option<usize> {
        self.bones.iter().position(|bone| bone.name == name)
    }

    /// Bone-local TRS of the rest pose, recovered from the bind poses.
    ///
    /// `local = parent_bind * inverse(own_bind)`, which places every bone where
    /// its inverse bind matrix says it sits at rest.
    #[must_use]
    pub fn rest_pose(&self) -> Vec<LocalTransform> {
        self.bones
            .iter()
            .map(|bone| {
                let parent_bind = bone
                    .parent
                    .map_or(Mat4::IDENTITY, |parent| self.bones[parent].bind_pose);
                let local = parent_bind * bone.bind_pose.inverse();
                let (scale, rotation, translation) = local.to_scale_rotation_translation();
                LocalTransform::new(translation, rotation, scale)
            })
            .collect()
    }
}

fn collect_bones(bones: &mut Vec<Bone>, node: &SourceBone, parent: Option<usize>) {
    let index = bones.len();
    bones.push(Bone {
        name: node.name.clone(),
        bind_pose: node.bind_pose.unwrap_or(Mat4::IDENTITY),
        parent,
        children: Vec::with_capacity(node.children.len()),
    });

    if let Some(parent) = parent {
        bones[parent].children.push(index);
    }

    for child in &node.children {
        collect_bones(bones, child, Some(index));
    }
}
