use remap::{
  driver::{build_se_to_fv_map, RemapOptions},
  metadata::generate_metadata,
};
use spheremesh::gen::{cubed::cubed_sphere, refine::refinement_overlap};

fn main() {
  tracing_subscriber::fmt::init();

  let order = 4;
  let source = cubed_sphere(8);
  let metadata = generate_metadata(&source, order, true).unwrap();
  let (mut overlap, target) = refinement_overlap(&source);

  println!(
    "source: {} elements of order {}, {} DOFs",
    source.nfaces(),
    order,
    metadata.ndofs()
  );
  println!("target: {} cells", target.nfaces());

  let map = build_se_to_fv_map(
    &source,
    &target,
    &mut overlap,
    &metadata,
    RemapOptions::default(),
  )
  .unwrap();

  println!("map nonzeros: {}", map.matrix().nnz());
  println!("consistency residual: {:.3e}", map.consistency_residual());
  println!(
    "conservation residual: {:.3e}",
    map.conservation_residual(&metadata.dof_areas(), target.face_areas())
  );
}
