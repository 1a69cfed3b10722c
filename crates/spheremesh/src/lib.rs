extern crate nalgebra as na;

use itertools::Itertools;

pub mod area;
pub mod gen;
pub mod quad;

pub type VertexIdx = usize;
pub type FaceIdx = usize;

/// A spherical polygon whose vertices index into the mesh node array, in
/// counterclockwise order seen from outside the sphere.
#[derive(Debug, Clone)]
pub struct Face {
  vertices: Vec<VertexIdx>,
}
impl Face {
  pub fn new(vertices: Vec<VertexIdx>) -> Self {
    assert!(vertices.len() >= 3);
    Self { vertices }
  }
  pub fn nedges(&self) -> usize {
    self.vertices.len()
  }
  pub fn vertex(&self, i: usize) -> VertexIdx {
    self.vertices[i]
  }
  pub fn vertices(&self) -> &[VertexIdx] {
    &self.vertices
  }
}

/// Polygonal faces over a shared array of unit-sphere nodes, with
/// precomputed great-circle face areas.
#[derive(Debug, Clone)]
pub struct Mesh {
  faces: Vec<Face>,
  nodes: na::Matrix3xX<f64>,
  face_areas: Vec<f64>,
}
impl Mesh {
  pub fn new(faces: Vec<Face>, nodes: na::Matrix3xX<f64>) -> Self {
    let face_areas = faces
      .iter()
      .map(|face| {
        let coords: Vec<_> = face
          .vertices()
          .iter()
          .map(|&v| nodes.column(v).into_owned())
          .collect();
        area::face_area(&coords)
      })
      .collect();
    Self {
      faces,
      nodes,
      face_areas,
    }
  }

  /// For meshes whose cell areas are supplied externally instead of being
  /// recomputed from the polygon geometry.
  pub fn with_face_areas(
    faces: Vec<Face>,
    nodes: na::Matrix3xX<f64>,
    face_areas: Vec<f64>,
  ) -> Self {
    assert!(faces.len() == face_areas.len());
    Self {
      faces,
      nodes,
      face_areas,
    }
  }

  pub fn nfaces(&self) -> usize {
    self.faces.len()
  }
  pub fn nnodes(&self) -> usize {
    self.nodes.ncols()
  }
  pub fn face(&self, i: FaceIdx) -> &Face {
    &self.faces[i]
  }
  pub fn faces(&self) -> &[Face] {
    &self.faces
  }
  pub fn node(&self, i: VertexIdx) -> na::Vector3<f64> {
    self.nodes.column(i).into_owned()
  }
  pub fn nodes(&self) -> &na::Matrix3xX<f64> {
    &self.nodes
  }
  pub fn face_area(&self, i: FaceIdx) -> f64 {
    self.face_areas[i]
  }
  pub fn face_areas(&self) -> &[f64] {
    &self.face_areas
  }
  pub fn total_area(&self) -> f64 {
    self.face_areas.iter().sum()
  }
}

/// Intersection tessellation of a source mesh and a target mesh.
///
/// Every face is the overlap polygon of exactly one source and one target
/// face; the provenance arrays record which. Faces are expected in ascending
/// contiguous groups of their source face.
#[derive(Debug, Clone)]
pub struct OverlapMesh {
  mesh: Mesh,
  source_face: Vec<FaceIdx>,
  target_face: Vec<FaceIdx>,
}
impl OverlapMesh {
  pub fn new(mesh: Mesh, source_face: Vec<FaceIdx>, target_face: Vec<FaceIdx>) -> Self {
    assert!(source_face.len() == mesh.nfaces() && target_face.len() == mesh.nfaces());
    Self {
      mesh,
      source_face,
      target_face,
    }
  }

  /// Overlap files store provenance indices 1-based; this normalizes them.
  pub fn from_one_based(mesh: Mesh, first: Vec<usize>, second: Vec<usize>) -> Self {
    assert!(first.iter().chain(&second).all(|&ix| ix >= 1));
    let source_face = first.into_iter().map(|ix| ix - 1).collect();
    let target_face = second.into_iter().map(|ix| ix - 1).collect();
    Self::new(mesh, source_face, target_face)
  }

  pub fn mesh(&self) -> &Mesh {
    &self.mesh
  }
  pub fn source_face(&self, i: usize) -> FaceIdx {
    self.source_face[i]
  }
  pub fn target_face(&self, i: usize) -> FaceIdx {
    self.target_face[i]
  }
  pub fn source_faces(&self) -> &[FaceIdx] {
    &self.source_face
  }
  pub fn target_faces(&self) -> &[FaceIdx] {
    &self.target_face
  }

  pub fn max_source_face(&self) -> Option<FaceIdx> {
    self.source_face.iter().copied().max()
  }
  pub fn is_grouped_by_source(&self) -> bool {
    self.source_face.iter().tuple_windows().all(|(a, b)| a <= b)
  }
  pub fn swap_correspondence(&mut self) {
    std::mem::swap(&mut self.source_face, &mut self.target_face);
  }
}
