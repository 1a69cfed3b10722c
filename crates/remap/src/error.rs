use thiserror::Error;

/// Failures of the remap kernels.
///
/// All of these are deterministic consequences of the input meshes and
/// metadata; none are retryable.
#[derive(Debug, Error)]
pub enum RemapError {
  /// Spectral-element remapping is defined on quadrilateral elements only.
  #[error("source element {element} has {nedges} edges; only quadrilaterals are supported")]
  UnsupportedElement { element: usize, nedges: usize },

  /// A quadrature point of an overlap cell does not lie inside the source
  /// element it is attributed to. This points at a defective overlap mesh
  /// and is never repaired by clamping.
  #[error(
    "inverse map out of range (alpha={alpha:.5e}, beta={beta:.5e}) on source element {element}"
  )]
  InverseMapOutOfRange {
    element: usize,
    alpha: f64,
    beta: f64,
  },

  /// The SPD Schur system of the least-squares correction could not be
  /// factorized.
  #[error("unable to solve the SPD Schur system of the coefficient correction")]
  SchurSolveFailed,

  /// The overlap provenance indices match neither the source nor the target
  /// mesh.
  #[error(
    "no overlap correspondence: max provenance index {max_index} fits neither \
     source ({source_faces} faces) nor target ({target_faces} faces)"
  )]
  InvalidOverlapCorrespondence {
    max_index: usize,
    source_faces: usize,
    target_faces: usize,
  },

  /// The SE metadata was generated for a different mesh.
  #[error("metadata covers {metadata_elements} elements but the source mesh has {mesh_faces} faces")]
  MetadataMismatch {
    metadata_elements: usize,
    mesh_faces: usize,
  },
}
