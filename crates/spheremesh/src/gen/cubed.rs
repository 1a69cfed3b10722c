use crate::{Face, Mesh, VertexIdx};

use std::collections::HashMap;

/// Gnomonic cubed sphere with `n x n` quadrilaterals per cube panel.
///
/// Faces wind counterclockwise seen from outside; nodes on panel seams are
/// deduplicated.
pub fn cubed_sphere(n: usize) -> Mesh {
  assert!(n >= 1);

  // (panel center, alpha axis, beta axis), axes chosen so alpha x beta
  // points outward.
  let panels: [[na::Vector3<f64>; 3]; 6] = [
    [na::Vector3::x(), na::Vector3::y(), na::Vector3::z()],
    [-na::Vector3::x(), na::Vector3::z(), na::Vector3::y()],
    [na::Vector3::y(), na::Vector3::z(), na::Vector3::x()],
    [-na::Vector3::y(), na::Vector3::x(), na::Vector3::z()],
    [na::Vector3::z(), na::Vector3::x(), na::Vector3::y()],
    [-na::Vector3::z(), na::Vector3::y(), na::Vector3::x()],
  ];

  let mut dedup = NodeDedup::default();
  let mut faces = Vec::with_capacity(6 * n * n);

  for [center, du, dv] in &panels {
    let mut grid = vec![0; (n + 1) * (n + 1)];
    for j in 0..=n {
      for i in 0..=n {
        let a = 2.0 * i as f64 / n as f64 - 1.0;
        let b = 2.0 * j as f64 / n as f64 - 1.0;
        let point = (center + du * a + dv * b).normalize();
        grid[j * (n + 1) + i] = dedup.insert(point);
      }
    }
    for j in 0..n {
      for i in 0..n {
        faces.push(Face::new(vec![
          grid[j * (n + 1) + i],
          grid[j * (n + 1) + i + 1],
          grid[(j + 1) * (n + 1) + i + 1],
          grid[(j + 1) * (n + 1) + i],
        ]));
      }
    }
  }

  Mesh::new(faces, na::Matrix3xX::from_columns(&dedup.nodes))
}

/// Merges nodes that agree up to the quantization resolution, so panel seams
/// share vertices despite roundoff in the panel-local arithmetic.
#[derive(Default)]
struct NodeDedup {
  nodes: Vec<na::Vector3<f64>>,
  index: HashMap<[i64; 3], VertexIdx>,
}
impl NodeDedup {
  fn insert(&mut self, point: na::Vector3<f64>) -> VertexIdx {
    let key = [quantize(point.x), quantize(point.y), quantize(point.z)];
    if let Some(&iv) = self.index.get(&key) {
      return iv;
    }
    self.nodes.push(point);
    let iv = self.nodes.len() - 1;
    self.index.insert(key, iv);
    iv
  }
}

fn quantize(x: f64) -> i64 {
  (x * 1e7).round() as i64
}
