//! Schema discovery: enumerating a joint type's elementary constraints from
//! a disposable probe joint.
//!
//! Discovery runs once when a constraint's type is fixed. It constructs a
//! native joint with no bodies attached, reads the names and order of its
//! ordinary and controller elementary constraints, classifies them, and
//! disposes the probe before returning, on every exit path, including
//! classification failure. The resulting [`JointSchema`] is immutable data;
//! binding at initialize time is a separate phase that consumes it by
//! ordinal.

use thiserror::Error;

use crate::{
    backend::{BackendError, JointBackend, NativeElementId, NativeJointId},
    math::Pose,
};

use super::{
    ConstraintType,
    elementary::{ElementaryKind, classify},
};

/// An error produced during schema discovery. Discovery errors are fatal to
/// constraint creation: the caller must discard the partially built
/// constraint rather than retry.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DiscoveryError {
    /// The probe joint could not be constructed.
    #[error("probe construction for {kind:?} failed: {source}")]
    ProbeConstruction {
        /// The joint type being probed.
        kind: ConstraintType,
        /// The underlying engine error.
        source: BackendError,
    },
    /// The probe reported an element with no name.
    #[error("the probe joint reported no name for element {0:?}")]
    MissingName(NativeElementId),
    /// The probe reported a count that its element list does not back.
    #[error("the probe joint has no {list} element at ordinal {ordinal}")]
    MissingElement {
        /// The list the element was expected in.
        list: &'static str,
        /// The in-range ordinal that yielded no element.
        ordinal: usize,
    },
    /// An engine-reported element name could not be mapped to a known
    /// elementary-constraint kind.
    #[error("the element name {name:?} cannot be mapped to a known elementary-constraint kind")]
    UnknownElement {
        /// The unrecognized name.
        name: String,
    },
    /// An element appeared in the wrong list for its kind, e.g. a motor among
    /// the ordinary constraints.
    #[error("the element {name:?} was reported in the {list} list but classifies otherwise")]
    MisplacedElement {
        /// The element name.
        name: String,
        /// The list the element was reported in.
        list: &'static str,
    },
}

/// One discovered elementary constraint: its engine-reported name and kind.
/// The ordinal is the entry's index within its list.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SchemaEntry {
    /// The engine-reported name.
    pub name: String,
    /// The classified kind.
    pub kind: ElementaryKind,
}

/// The discovered elementary-constraint layout of a joint type.
///
/// The schema is derived from the engine itself rather than hard-coded, and
/// is guaranteed by the backend contract to match the ordering of any later
/// real joint of the same type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct JointSchema {
    /// The ordinary geometric restrictions, in engine-reported order.
    pub ordinary: Vec<SchemaEntry>,
    /// The controller-style actuators, in engine-reported order.
    pub controllers: Vec<SchemaEntry>,
}

/// Discovers the elementary-constraint schema of a joint type from a
/// disposable probe joint.
///
/// The probe is constructed with no bodies and identity frames, is never
/// registered with the simulation, and is destroyed before this function
/// returns regardless of the outcome.
pub fn discover_schema(
    backend: &mut dyn JointBackend,
    kind: ConstraintType,
) -> Result<JointSchema, DiscoveryError> {
    let probe = backend
        .create_joint(kind, None, Pose::IDENTITY, None, Pose::IDENTITY)
        .map_err(|source| DiscoveryError::ProbeConstruction { kind, source })?;

    let schema = read_schema(backend, probe);

    // The probe must never outlive discovery, even when classification failed.
    backend.destroy_joint(probe);

    schema
}

fn read_schema(
    backend: &dyn JointBackend,
    probe: NativeJointId,
) -> Result<JointSchema, DiscoveryError> {
    let ordinary = read_list(
        backend,
        backend.ordinary_constraint_count(probe),
        "ordinary",
        |backend, ordinal| backend.ordinary_constraint(probe, ordinal),
        false,
    )?;
    let controllers = read_list(
        backend,
        backend.controller_constraint_count(probe),
        "controller",
        |backend, ordinal| backend.controller_constraint(probe, ordinal),
        true,
    )?;

    Ok(JointSchema {
        ordinary,
        controllers,
    })
}

fn read_list(
    backend: &dyn JointBackend,
    count: usize,
    list: &'static str,
    fetch: impl Fn(&dyn JointBackend, usize) -> Option<NativeElementId>,
    expect_controller: bool,
) -> Result<Vec<SchemaEntry>, DiscoveryError> {
    let mut entries = Vec::with_capacity(count);
    for ordinal in 0..count {
        let element = fetch(backend, ordinal)
            .ok_or(DiscoveryError::MissingElement { list, ordinal })?;
        let name = backend
            .element_name(element)
            .ok_or(DiscoveryError::MissingName(element))?;
        let kind =
            classify(&name).ok_or_else(|| DiscoveryError::UnknownElement { name: name.clone() })?;
        if kind.is_controller() != expect_controller {
            return Err(DiscoveryError::MisplacedElement { name, list });
        }
        entries.push(SchemaEntry { name, kind });
    }
    Ok(entries)
}
