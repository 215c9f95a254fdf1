//! Queue family resolution.
//!
//! Scans a device's queue family properties for families satisfying required
//! capability flags and presentation support, then deduplicates shared
//! indices so the device is never asked to create the same family twice.

use crate::device::DeviceProfile;
use crate::request::DisplayRequest;
use ash::vk;

/// The queue kinds a display session may resolve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueueKind {
    Graphics,
    Present,
    Compute,
    Transfer,
    SparseBinding,
    Protected,
    VideoDecode,
    OpticalFlow,
}

impl QueueKind {
    /// All resolvable kinds, in resolution order.
    pub const ALL: [Self; 8] = [
        Self::Graphics,
        Self::Present,
        Self::Compute,
        Self::Transfer,
        Self::SparseBinding,
        Self::Protected,
        Self::VideoDecode,
        Self::OpticalFlow,
    ];

    /// The capability flag this kind maps to. Present has no flag; it is
    /// resolved by surface support instead.
    pub fn flag(self) -> vk::QueueFlags {
        match self {
            Self::Graphics => vk::QueueFlags::GRAPHICS,
            Self::Present => vk::QueueFlags::empty(),
            Self::Compute => vk::QueueFlags::COMPUTE,
            Self::Transfer => vk::QueueFlags::TRANSFER,
            Self::SparseBinding => vk::QueueFlags::SPARSE_BINDING,
            Self::Protected => vk::QueueFlags::PROTECTED,
            Self::VideoDecode => vk::QueueFlags::VIDEO_DECODE_KHR,
            Self::OpticalFlow => vk::QueueFlags::OPTICAL_FLOW_NV,
        }
    }

    /// Whether resolving this kind matches on presentation support.
    pub fn requires_present(self) -> bool {
        matches!(self, Self::Present)
    }
}

/// One resolved queue kind for a display session.
///
/// Indices may collide across kinds: a single hardware family often serves
/// graphics, present, and transfer at once.
#[derive(Debug, Clone, Copy)]
pub struct QueueFamilyAssignment {
    /// The kind this assignment resolves.
    pub kind: QueueKind,
    /// Capability flags of the resolved family.
    pub flags: vk::QueueFlags,
    /// Whether a matching family exists. Not automatically fatal; the caller
    /// decides based on whether the capability was required.
    pub exists: bool,
    /// Index of the resolved family.
    pub family_index: u32,
    /// Queue handle, fetched after logical device creation.
    pub queue: vk::Queue,
}

impl QueueFamilyAssignment {
    /// The "does not exist" sentinel for a kind.
    pub fn absent(kind: QueueKind) -> Self {
        Self {
            kind,
            flags: vk::QueueFlags::empty(),
            exists: false,
            family_index: 0,
            queue: vk::Queue::null(),
        }
    }
}

/// Find the first queue family matching one kind.
///
/// When the kind requires presentation the capability flag is ignored and the
/// first family with surface support wins; otherwise the first family whose
/// flags include the kind's flag wins. Families are scanned in index order.
pub fn find_queue_family(
    families: &[vk::QueueFamilyProperties],
    present_support: &[bool],
    kind: QueueKind,
) -> QueueFamilyAssignment {
    for (index, family) in families.iter().enumerate() {
        let matches = if kind.requires_present() {
            present_support.get(index).copied().unwrap_or(false)
        } else {
            family.queue_flags.contains(kind.flag())
        };
        if matches {
            return QueueFamilyAssignment {
                kind,
                flags: family.queue_flags,
                exists: true,
                family_index: index as u32,
                queue: vk::Queue::null(),
            };
        }
    }
    QueueFamilyAssignment::absent(kind)
}

/// Resolve every queue kind for one device against one request.
///
/// Returns an assignment per kind (presentation is skipped for headless
/// requests) together with the names of required kinds that could not be
/// resolved. The enabled flag set stays the caller's requested flags; nothing
/// discovered here widens it.
pub fn resolve_queue_assignments(
    profile: &DeviceProfile,
    request: &DisplayRequest,
) -> (Vec<QueueFamilyAssignment>, Vec<String>) {
    let mut assignments = Vec::with_capacity(QueueKind::ALL.len());
    let mut missing = Vec::new();

    for kind in QueueKind::ALL {
        if kind.requires_present() && request.headless {
            continue;
        }

        let assignment = find_queue_family(&profile.queue_families, &profile.present_support, kind);

        if !assignment.exists {
            if kind.requires_present() {
                missing.push("queue family: PRESENT".to_string());
            } else if request.required_queue_flags.contains(kind.flag()) {
                missing.push(format!("queue family: {:?}", kind.flag()));
            }
        }

        assignments.push(assignment);
    }

    (assignments, missing)
}

/// Keep one assignment per distinct family index, first occurrence wins.
///
/// This is the minimal set of unique queue-create requests: a device must not
/// be asked to create a queue twice from the same family for two kinds.
pub fn dedup_families(assignments: &[QueueFamilyAssignment]) -> Vec<QueueFamilyAssignment> {
    let mut unique: Vec<QueueFamilyAssignment> = Vec::new();
    for assignment in assignments.iter().filter(|a| a.exists) {
        if !unique.iter().any(|u| u.family_index == assignment.family_index) {
            unique.push(*assignment);
        }
    }
    unique
}

#[cfg(test)]
mod tests {
    use super::*;

    fn family(flags: vk::QueueFlags) -> vk::QueueFamilyProperties {
        vk::QueueFamilyProperties {
            queue_flags: flags,
            queue_count: 1,
            ..Default::default()
        }
    }

    #[test]
    fn first_matching_family_wins() {
        let families = [
            family(vk::QueueFlags::TRANSFER),
            family(vk::QueueFlags::GRAPHICS | vk::QueueFlags::COMPUTE),
            family(vk::QueueFlags::GRAPHICS),
        ];
        let assignment = find_queue_family(&families, &[false; 3], QueueKind::Graphics);
        assert!(assignment.exists);
        assert_eq!(assignment.family_index, 1);
    }

    #[test]
    fn present_resolution_ignores_capability_flags() {
        let families = [
            family(vk::QueueFlags::GRAPHICS),
            family(vk::QueueFlags::TRANSFER),
        ];
        let assignment = find_queue_family(&families, &[false, true], QueueKind::Present);
        assert!(assignment.exists);
        assert_eq!(assignment.family_index, 1);
    }

    #[test]
    fn missing_kind_returns_sentinel() {
        let families = [family(vk::QueueFlags::GRAPHICS)];
        let assignment = find_queue_family(&families, &[false], QueueKind::VideoDecode);
        assert!(!assignment.exists);
    }

    #[test]
    fn shared_index_produces_one_create_request() {
        let shared = QueueFamilyAssignment {
            kind: QueueKind::Graphics,
            flags: vk::QueueFlags::GRAPHICS,
            exists: true,
            family_index: 0,
            queue: vk::Queue::null(),
        };
        let present = QueueFamilyAssignment {
            kind: QueueKind::Present,
            ..shared
        };
        let transfer = QueueFamilyAssignment {
            kind: QueueKind::Transfer,
            flags: vk::QueueFlags::TRANSFER,
            exists: true,
            family_index: 1,
            queue: vk::Queue::null(),
        };
        let absent = QueueFamilyAssignment::absent(QueueKind::Compute);

        let unique = dedup_families(&[shared, present, transfer, absent]);
        assert_eq!(unique.len(), 2);
        assert_eq!(unique[0].family_index, 0);
        assert_eq!(unique[0].kind, QueueKind::Graphics);
        assert_eq!(unique[1].family_index, 1);
    }
}
