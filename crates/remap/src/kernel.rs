use crate::{
  corrector, error::RemapError, gll, map::OfflineMap, metadata::GllMetadata,
  triquad::TriangleQuadrature,
};

use common::linalg::nalgebra::{Matrix, Vector};
use spheremesh::{area, quad::SphericalQuad, Mesh, OverlapMesh};

use tracing::{debug, info};

/// Excursion beyond the unit square tolerated before the inverse map is
/// rejected as an overlap defect.
const INVERSE_MAP_TOL: f64 = 1e-10;
/// Coverage mismatch above which a source element counts as partially
/// covered and the correction is skipped.
const COVERAGE_TOL: f64 = 1e-10;

/// High-order conservative remap from spectral-element nodal values to
/// finite-volume cell averages.
///
/// Walks the source elements, integrates the GLL basis over every overlap
/// cell by fan-triangulated quadrature, corrects the per-element
/// coefficients for consistency and conservation, and folds them into the
/// sparse map indexed `(target face, source DOF)`.
pub fn remap_se_to_fv(
  source: &Mesh,
  target: &Mesh,
  overlap: &OverlapMesh,
  metadata: &GllMetadata,
  monotone: bool,
  map: &mut OfflineMap,
) -> Result<(), RemapError> {
  let np = metadata.order();
  let rule = TriangleQuadrature::degree4();
  let (gll_nodes, _) = gll::gauss_lobatto_points(np);
  debug_assert!(overlap.is_grouped_by_source());

  let mut ix_overlap = 0;
  for e in 0..source.nfaces() {
    let face = source.face(e);
    if face.nedges() != 4 {
      return Err(RemapError::UnsupportedElement {
        element: e,
        nedges: face.nedges(),
      });
    }
    if e % 100 == 0 {
      debug!(element = e, "processing source element");
    }

    let noverlap = overlap.source_faces()[ix_overlap..]
      .iter()
      .take_while(|&&src| src == e)
      .count();
    if noverlap == 0 {
      continue;
    }

    let mut coeff =
      element_coefficients(source, overlap, e, ix_overlap, noverlap, &gll_nodes, &rule, monotone)?;

    let source_areas = metadata.element_jacobians(e);
    let target_areas = Vector::from_fn(noverlap, |j, _| overlap.mesh().face_area(ix_overlap + j));

    let covered = target_areas.sum();
    if (covered - source.face_area(e)).abs() > COVERAGE_TOL {
      // Raw coefficients stay in place; the global map will not conserve.
      info!(
        element = e,
        covered,
        area = source.face_area(e),
        "partial element, correction skipped"
      );
    } else {
      corrector::force_consistency_conservation(&source_areas, &target_areas, &mut coeff, monotone)?;
    }

    for j in 0..noverlap {
      let target_face = overlap.target_face(ix_overlap + j);
      let scale = overlap.mesh().face_area(ix_overlap + j) / target.face_area(target_face);
      for p in 0..np {
        for q in 0..np {
          map.add(
            target_face,
            metadata.node(p, q, e),
            coeff[(j, p * np + q)] * scale,
          );
        }
      }
    }

    ix_overlap += noverlap;
  }
  Ok(())
}

/// Integrates the element's GLL basis over each of its overlap cells:
/// `coeff[(j, p * np + q)]` approximates the mean of basis `(p, q)` over
/// overlap cell `j`.
#[allow(clippy::too_many_arguments)]
fn element_coefficients(
  source: &Mesh,
  overlap: &OverlapMesh,
  element: usize,
  ix_overlap: usize,
  noverlap: usize,
  gll_nodes: &Vector,
  rule: &TriangleQuadrature,
  monotone: bool,
) -> Result<Matrix, RemapError> {
  let np = gll_nodes.len();
  let quad = SphericalQuad::from_face(source, source.face(element));
  let mut coeff = Matrix::zeros(noverlap, np * np);

  for j in 0..noverlap {
    let ov_face = overlap.mesh().face(ix_overlap + j);
    let ov_area = overlap.mesh().face_area(ix_overlap + j);
    let v0 = overlap.mesh().node(ov_face.vertex(0));

    for k in 0..ov_face.nedges() - 2 {
      let v1 = overlap.mesh().node(ov_face.vertex(k + 1));
      let v2 = overlap.mesh().node(ov_face.vertex(k + 2));
      let tri_area = area::triangle_area(&v0, &v1, &v2);

      for l in 0..rule.npoints() {
        let [g0, g1, g2] = rule.point(l);
        let point = (v0 * g0 + v1 * g1 + v2 * g2).normalize();

        let (alpha, beta) = quad.invert_map(&point);
        let (alpha, beta) = check_unit_range(element, alpha, beta)?;
        let basis = gll::sample_basis(gll_nodes, alpha, beta, monotone);

        let weight = rule.weight(l) * tri_area / ov_area;
        for p in 0..np {
          for q in 0..np {
            coeff[(j, p * np + q)] += weight * basis[(p, q)];
          }
        }
      }
    }
  }
  Ok(coeff)
}

fn check_unit_range(element: usize, alpha: f64, beta: f64) -> Result<(f64, f64), RemapError> {
  let inside = |x: f64| (-INVERSE_MAP_TOL..=1.0 + INVERSE_MAP_TOL).contains(&x);
  if !inside(alpha) || !inside(beta) {
    return Err(RemapError::InverseMapOutOfRange {
      element,
      alpha,
      beta,
    });
  }
  Ok((alpha.clamp(0.0, 1.0), beta.clamp(0.0, 1.0)))
}

/// Low-order reference remap: every target cell of an element receives each
/// source DOF's share of the element Jacobian, scaled by the overlap
/// fraction. Consistent and cheap, but first order.
pub fn remap_se_to_fv_low_order(
  target: &Mesh,
  overlap: &OverlapMesh,
  metadata: &GllMetadata,
  map: &mut OfflineMap,
) {
  let np = metadata.order();

  let mut last_source = usize::MAX;
  let mut element_jacobian = 0.0;

  for i in 0..overlap.mesh().nfaces() {
    let e = overlap.source_face(i);
    let target_face = overlap.target_face(i);

    if e != last_source {
      element_jacobian = metadata.element_jacobians(e).sum();
      last_source = e;
    }

    let scale = overlap.mesh().face_area(i) / target.face_area(target_face);
    for p in 0..np {
      for q in 0..np {
        map.add(
          target_face,
          metadata.node(p, q, e),
          metadata.jacobian(p, q, e) / element_jacobian * scale,
        );
      }
    }
  }
}
