use crate::{error::RemapError, kernel, map::OfflineMap, metadata::GllMetadata};

use spheremesh::{Mesh, OverlapMesh};

use tracing::{info, warn};

/// Total-area mismatch between overlap and source above which the run is
/// treated as partial cover and verification is disabled.
const AREA_MISMATCH_TOL: f64 = 1e-10;

/// Knobs of the SE to FV map build.
#[derive(Debug, Clone, Copy, Default)]
pub struct RemapOptions {
  /// Blend each element with the low-order donor map until no weight is
  /// negative.
  pub monotone: bool,
  /// Skip post-assembly verification of the map invariants.
  pub no_check: bool,
}

/// Builds the conservative SE to FV map: repairs the overlap orientation if
/// inverted, checks coverage, runs the high-order kernel and verifies the
/// assembled operator.
pub fn build_se_to_fv_map(
  source: &Mesh,
  target: &Mesh,
  overlap: &mut OverlapMesh,
  metadata: &GllMetadata,
  options: RemapOptions,
) -> Result<OfflineMap, RemapError> {
  if metadata.nelements() != source.nfaces() {
    return Err(RemapError::MetadataMismatch {
      metadata_elements: metadata.nelements(),
      mesh_faces: source.nfaces(),
    });
  }

  normalize_correspondence(source, target, overlap)?;

  let total_overlap = overlap.mesh().total_area();
  let total_source = source.total_area();
  let mut no_check = options.no_check;
  if (total_overlap - total_source).abs() > AREA_MISMATCH_TOL && !no_check {
    warn!(
      total_overlap,
      total_source, "overlap area does not match source area; disabling verification"
    );
    no_check = true;
  }

  let mut map = OfflineMap::new(target.nfaces(), metadata.ndofs());
  kernel::remap_se_to_fv(source, target, overlap, metadata, options.monotone, &mut map)?;

  if !no_check {
    info!("verifying map invariants");
    map.is_consistent(1e-8);
    map.is_conservative(&metadata.dof_areas(), target.face_areas(), 1e-8);
    if options.monotone {
      map.is_monotone(1e-12);
    }
  }
  Ok(map)
}

/// Ensures the overlap provenance points source-first. An overlap whose
/// first provenance matches the target mesh instead is healed by swapping
/// the two provenance arrays; one matching neither is rejected.
pub fn normalize_correspondence(
  source: &Mesh,
  target: &Mesh,
  overlap: &mut OverlapMesh,
) -> Result<(), RemapError> {
  let Some(max_index) = overlap.max_source_face() else {
    return Ok(());
  };

  if max_index + 1 == source.nfaces() {
    info!("overlap primary correspondence found");
    Ok(())
  } else if max_index + 1 == target.nfaces() {
    warn!("overlap reverse correspondence found, swapping provenance");
    overlap.swap_correspondence();
    Ok(())
  } else {
    Err(RemapError::InvalidOverlapCorrespondence {
      max_index,
      source_faces: source.nfaces(),
      target_faces: target.nfaces(),
    })
  }
}
