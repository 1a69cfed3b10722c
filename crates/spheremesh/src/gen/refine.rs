use crate::{Face, FaceIdx, Mesh, OverlapMesh, VertexIdx};

use std::collections::HashMap;

/// Splits every quadrilateral into four spherical sub-quads through the
/// great-circle edge midpoints and the face center.
///
/// The children exactly tile their parent, which makes the result (together
/// with the parent indices) a ready-made overlap tessellation of `mesh`
/// against the refined mesh.
pub fn refine_quads(mesh: &Mesh) -> (Mesh, Vec<FaceIdx>) {
  let mut nodes: Vec<na::Vector3<f64>> = mesh
    .nodes()
    .column_iter()
    .map(|c| c.into_owned())
    .collect();
  let mut midpoints = HashMap::new();

  let mut faces = Vec::with_capacity(4 * mesh.nfaces());
  let mut parents = Vec::with_capacity(4 * mesh.nfaces());

  for (e, face) in mesh.faces().iter().enumerate() {
    assert!(face.nedges() == 4, "quad refinement expects quadrilaterals");
    let [v0, v1, v2, v3]: [VertexIdx; 4] = face.vertices().try_into().unwrap();

    let m01 = get_midpoint(v0, v1, &mut nodes, &mut midpoints);
    let m12 = get_midpoint(v1, v2, &mut nodes, &mut midpoints);
    let m23 = get_midpoint(v2, v3, &mut nodes, &mut midpoints);
    let m30 = get_midpoint(v3, v0, &mut nodes, &mut midpoints);

    let center = (nodes[v0] + nodes[v1] + nodes[v2] + nodes[v3]).normalize();
    nodes.push(center);
    let c = nodes.len() - 1;

    faces.push(Face::new(vec![v0, m01, c, m30]));
    faces.push(Face::new(vec![m01, v1, m12, c]));
    faces.push(Face::new(vec![c, m12, v2, m23]));
    faces.push(Face::new(vec![m30, c, m23, v3]));
    parents.extend([e; 4]);
  }

  (Mesh::new(faces, na::Matrix3xX::from_columns(&nodes)), parents)
}

fn get_midpoint(
  v0: VertexIdx,
  v1: VertexIdx,
  nodes: &mut Vec<na::Vector3<f64>>,
  midpoints: &mut HashMap<(VertexIdx, VertexIdx), VertexIdx>,
) -> VertexIdx {
  let edge = if v0 < v1 { (v0, v1) } else { (v1, v0) };
  if let Some(&midpoint) = midpoints.get(&edge) {
    return midpoint;
  }

  let midpoint = ((nodes[v0] + nodes[v1]) / 2.0).normalize();
  nodes.push(midpoint);
  let index = nodes.len() - 1;
  midpoints.insert(edge, index);
  index
}

/// Overlap tessellation of a mesh with itself: every face overlaps exactly
/// its own counterpart.
pub fn identity_overlap(mesh: &Mesh) -> OverlapMesh {
  let ix: Vec<_> = (0..mesh.nfaces()).collect();
  OverlapMesh::new(mesh.clone(), ix.clone(), ix)
}

/// Overlap of `mesh` (as source) against its quad refinement (as target).
/// Returns the overlap together with the refined target mesh.
pub fn refinement_overlap(mesh: &Mesh) -> (OverlapMesh, Mesh) {
  let (refined, parents) = refine_quads(mesh);
  let targets = (0..refined.nfaces()).collect();
  (OverlapMesh::new(refined.clone(), parents, targets), refined)
}
