// External imports
use std::sync::Arc;
// Local imports
use crate::error::BuildError;
use crate::graphics::aabb::AABB;
use crate::graphics::bvh::{SplitPolicy, TriangleBVH};
use crate::graphics::bvh4::TriangleBVH4;
use crate::graphics::material::Material;
use crate::graphics::primitives::triangle;
use crate::graphics::primitives::Triangle;
use crate::graphics::ray::{Ray, SurfaceInteraction};
use crate::math::{barycentric, Transform, Vector, MAX_RAY_DISTANCE};

// A triangle mesh with shared vertex data
//
// Many triangles alias the same vertex buffer, so the buffers live in one
// arena (`MeshData`) and each triangle holds three indices plus a handle to
// it. Optional per-vertex normal and uv buffers parallel the vertex buffer.
//
// Exports:
// * Face
// * TriangleInMesh
// * TriangleMesh

/// A triple of vertex indices describing one mesh face
#[derive(Copy,Clone,Debug)]
pub struct Face {
  pub v0 : u32,
  pub v1 : u32,
  pub v2 : u32
}

impl Face {
  pub fn new( v0 : u32, v1 : u32, v2 : u32 ) -> Face {
    Face { v0, v1, v2 }
  }
}

/// The shared buffers of a mesh. The material lives here too: mesh
/// triangles inherit it rather than carrying their own.
#[derive(Debug)]
pub struct MeshData {
  pub vertices : Vec< Vector >,
  pub normals  : Option< Vec< Vector > >,
  pub uv       : Option< Vec< (f32, f32) > >,
  pub material : Material
}

/// A triangle referencing its mesh's shared buffers by index
#[derive(Clone,Debug)]
pub struct TriangleInMesh {
  pub i0 : u32,
  pub i1 : u32,
  pub i2 : u32,
  mesh   : Arc< MeshData >
}

impl TriangleInMesh {
  fn new( face : Face, mesh : Arc< MeshData > ) -> TriangleInMesh {
    TriangleInMesh { i0: face.v0, i1: face.v1, i2: face.v2, mesh }
  }

  pub fn points( &self ) -> (Vector, Vector, Vector) {
    ( self.mesh.vertices[ self.i0 as usize ]
    , self.mesh.vertices[ self.i1 as usize ]
    , self.mesh.vertices[ self.i2 as usize ]
    )
  }

  pub fn material( &self ) -> &Material {
    &self.mesh.material
  }

  pub fn intersect( &self, ray : &Ray ) -> Option< f32 > {
    let ( p0, p1, p2 ) = self.points( );
    triangle::triangle_intersect( p0, p1, p2, ray )
  }

  pub fn surface_normal( &self, _p : Vector ) -> Vector {
    let ( p0, p1, p2 ) = self.points( );
    triangle::triangle_normal( p0, p1, p2 )
  }

  pub fn area( &self ) -> f32 {
    let ( p0, p1, p2 ) = self.points( );
    triangle::triangle_area( p0, p1, p2 )
  }

  pub fn bound( &self, t : &Transform ) -> AABB {
    let ( p0, p1, p2 ) = self.points( );
    triangle::triangle_bound( p0, p1, p2, t )
  }

  pub fn barycentric( &self, p : Vector ) -> (f32, f32, f32) {
    let ( p0, p1, p2 ) = self.points( );
    barycentric( p0, p1, p2, p )
  }

  /// The shading normal interpolated from the per-vertex normal buffer at
  /// `p`, or `None` when the mesh carries no normals
  pub fn interpolated_normal( &self, p : Vector ) -> Option< Vector > {
    let normals = self.mesh.normals.as_ref( )?;
    let ( l0, l1, l2 ) = self.barycentric( p );
    let n = normals[ self.i0 as usize ] * l0
      + normals[ self.i1 as usize ] * l1
      + normals[ self.i2 as usize ] * l2;
    Some( n.normalize( ) )
  }

  /// The (u,v) interpolated from the uv buffer at `p`; (0,0) without one
  pub fn uv( &self, p : Vector ) -> (f32, f32) {
    match self.mesh.uv.as_ref( ) {
      None => (0.0, 0.0),
      Some( uvs ) => {
        let ( l0, l1, l2 ) = self.barycentric( p );
        let ( u0, v0 ) = uvs[ self.i0 as usize ];
        let ( u1, v1 ) = uvs[ self.i1 as usize ];
        let ( u2, v2 ) = uvs[ self.i2 as usize ];
        ( u0 * l0 + u1 * l1 + u2 * l2, v0 * l0 + v1 * l1 + v2 * l2 )
      }
    }
  }

  /// Materialises a free-standing triangle with the mesh's material,
  /// optionally placed by a transform. Used for emitter collection.
  pub fn to_triangle( &self, t : &Transform ) -> Triangle {
    let ( p0, p1, p2 ) = self.points( );
    Triangle::new( t.point( p0 ), t.point( p1 ), t.point( p2 ), self.mesh.material.clone( ) )
  }
}

/// The acceleration structure variants a mesh can delegate to
#[derive(Debug)]
enum TriangleAccel {
  Bvh( TriangleBVH ),
  Bvh4( TriangleBVH4 )
}

/// A triangle mesh. Owns its acceleration structure; `intersect` delegates
/// to it.
#[derive(Debug)]
pub struct TriangleMesh {
  data  : Arc< MeshData >,
  accel : TriangleAccel
}

impl TriangleMesh {
  /// Builds a mesh over a binary SAH BVH
  pub fn new( vertices : Vec< Vector >, faces : Vec< Face >, material : Material ) -> Result< TriangleMesh, BuildError > {
    TriangleMesh::build( vertices, None, None, faces, material, false )
  }

  /// Builds a mesh over the 4-ary SIMD BVH
  pub fn new_packed( vertices : Vec< Vector >, faces : Vec< Face >, material : Material ) -> Result< TriangleMesh, BuildError > {
    TriangleMesh::build( vertices, None, None, faces, material, true )
  }

  /// Builds a fully connected rectangular mesh from an n x m vertex grid
  /// (so 2*(n-1)*(m-1) triangles). Optional normal and uv buffers parallel
  /// the vertices.
  pub fn new_grid(
        n        : usize
      , m        : usize
      , vertices : Vec< Vector >
      , normals  : Option< Vec< Vector > >
      , uvs      : Option< Vec< (f32, f32) > >
      , material : Material ) -> Result< TriangleMesh, BuildError > {
    // A connected grid needs at least 2 vertices along each side
    if n < 2 || m < 2 {
      return Err( BuildError::InvalidMeshGrid { expected: 4, actual: vertices.len( ) } );
    }
    let expected = n * m;
    if vertices.len( ) != expected {
      return Err( BuildError::InvalidMeshGrid { expected, actual: vertices.len( ) } );
    }
    if let Some( ns ) = normals.as_ref( ) {
      if ns.len( ) != expected {
        return Err( BuildError::InvalidMeshGrid { expected, actual: ns.len( ) } );
      }
    }
    if let Some( uv ) = uvs.as_ref( ) {
      if uv.len( ) != expected {
        return Err( BuildError::InvalidMeshGrid { expected, actual: uv.len( ) } );
      }
    }

    let mut faces = Vec::with_capacity( 2 * ( n - 1 ) * ( m - 1 ) );
    for y in 0..(m - 1) {
      for x in 0..(n - 1) {
        let llhc = ( y * n + x ) as u32;
        let lrhc = ( y * n + x + 1 ) as u32;
        let ulhc = ( ( y + 1 ) * n + x ) as u32;
        let urhc = ( ( y + 1 ) * n + x + 1 ) as u32;
        faces.push( Face::new( llhc, lrhc, ulhc ) );
        faces.push( Face::new( lrhc, urhc, ulhc ) );
      }
    }

    TriangleMesh::build( vertices, normals, uvs, faces, material, false )
  }

  fn build(
        vertices : Vec< Vector >
      , normals  : Option< Vec< Vector > >
      , uvs      : Option< Vec< (f32, f32) > >
      , faces    : Vec< Face >
      , material : Material
      , packed   : bool ) -> Result< TriangleMesh, BuildError > {
    let num_vertices = vertices.len( ) as u32;
    for f in &faces {
      for &i in [ f.v0, f.v1, f.v2 ].iter( ) {
        if i >= num_vertices {
          return Err( BuildError::FaceIndexOutOfBounds { index: i } );
        }
      }
    }

    let data = Arc::new( MeshData { vertices, normals, uv: uvs, material } );
    let triangles : Vec< TriangleInMesh > = faces
      .into_iter( )
      .map( |f| TriangleInMesh::new( f, Arc::clone( &data ) ) )
      .collect( );

    let accel =
      if packed {
        TriangleAccel::Bvh4( TriangleBVH4::new( triangles ) )
      } else {
        TriangleAccel::Bvh( TriangleBVH::new( triangles, SplitPolicy::SurfaceAreaHeuristic ) )
      };

    Ok( TriangleMesh { data, accel } )
  }

  pub fn material( &self ) -> &Material {
    &self.data.material
  }

  pub fn triangles( &self ) -> &[TriangleInMesh] {
    match &self.accel {
      TriangleAccel::Bvh( bvh ) => bvh.triangles( ),
      TriangleAccel::Bvh4( bvh ) => bvh.triangles( )
    }
  }

  pub fn intersect( &self, ray : &Ray ) -> Option< SurfaceInteraction > {
    match &self.accel {
      TriangleAccel::Bvh( bvh ) => bvh.closest_intersection( ray, MAX_RAY_DISTANCE ),
      TriangleAccel::Bvh4( bvh ) => bvh.closest_intersection( ray, MAX_RAY_DISTANCE )
    }
  }

  pub fn bound( &self, t : &Transform ) -> AABB {
    let triangles = self.triangles( );
    if triangles.is_empty( ) {
      return AABB::EMPTY;
    }
    let mut bound = triangles[ 0 ].bound( t );
    for tr in &triangles[ 1.. ] {
      bound = bound.union( &tr.bound( t ) );
    }
    bound
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::graphics::color::Color;
  use crate::math::ERROR_MARGIN;

  fn quad_mesh( ) -> TriangleMesh {
    // Two triangles covering [0,1]^2 in the xy-plane at z=1
    TriangleMesh::new(
      vec![
        Vector::new( 0.0, 0.0, 1.0 )
      , Vector::new( 1.0, 0.0, 1.0 )
      , Vector::new( 1.0, 1.0, 1.0 )
      , Vector::new( 0.0, 1.0, 1.0 )
      ]
    , vec![ Face::new( 0, 1, 2 ), Face::new( 0, 2, 3 ) ]
    , Material::diffuse( Color::WHITE )
    ).unwrap( )
  }

  #[test]
  fn grid_produces_expected_triangle_count( ) {
    let n = 4;
    let m = 3;
    let mut vertices = Vec::new( );
    for y in 0..m {
      for x in 0..n {
        vertices.push( Vector::new( x as f32, y as f32, 0.0 ) );
      }
    }
    let mesh = TriangleMesh::new_grid( n, m, vertices, None, None, Material::diffuse( Color::WHITE ) ).unwrap( );
    assert_eq!( mesh.triangles( ).len( ), 2 * ( n - 1 ) * ( m - 1 ) );
  }

  #[test]
  fn grid_rejects_wrong_vertex_count( ) {
    let r = TriangleMesh::new_grid( 3, 3, vec![ Vector::ZERO; 5 ], None, None, Material::diffuse( Color::WHITE ) );
    assert_eq!( r.err( ), Some( BuildError::InvalidMeshGrid { expected: 9, actual: 5 } ) );
  }

  #[test]
  fn face_index_is_validated( ) {
    let r = TriangleMesh::new(
      vec![ Vector::ZERO, Vector::new( 1.0, 0.0, 0.0 ) ]
    , vec![ Face::new( 0, 1, 7 ) ]
    , Material::diffuse( Color::WHITE ) );
    assert_eq!( r.err( ), Some( BuildError::FaceIndexOutOfBounds { index: 7 } ) );
  }

  #[test]
  fn mesh_intersection_delegates_to_its_bvh( ) {
    let mesh = quad_mesh( );
    let ray = Ray::new( Vector::new( 0.5, 0.5, 0.0 ), Vector::new( 0.0, 0.0, 1.0 ) );
    let si = mesh.intersect( &ray ).unwrap( );
    assert!( ( si.distance - 1.0 ).abs( ) < 1e-4 );
  }

  #[test]
  fn interpolated_normal_blends_vertex_normals( ) {
    let up = Vector::new( 0.0, 0.0, 1.0 );
    let tilted = Vector::new( 1.0, 0.0, 1.0 ).normalize( );
    let mesh = TriangleMesh::build(
      vec![
        Vector::new( 0.0, 0.0, 1.0 )
      , Vector::new( 1.0, 0.0, 1.0 )
      , Vector::new( 0.0, 1.0, 1.0 )
      ]
    , Some( vec![ up, tilted, up ] )
    , None
    , vec![ Face::new( 0, 1, 2 ) ]
    , Material::diffuse( Color::WHITE )
    , false
    ).unwrap( );

    let t = &mesh.triangles( )[ 0 ];
    // At vertex 0 the interpolated normal is that vertex's normal
    let n0 = t.interpolated_normal( Vector::new( 0.0, 0.0, 1.0 ) ).unwrap( );
    assert!( ( n0 - up ).length( ) < 1e-4 );
    // Halfway along the edge to vertex 1 it blends
    let nm = t.interpolated_normal( Vector::new( 0.5, 0.0, 1.0 ) ).unwrap( );
    assert!( nm.x > 0.0 && nm.z > 0.0 );
    assert!( ( nm.length( ) - 1.0 ).abs( ) < 1e-4 );
  }

  #[test]
  fn packed_mesh_agrees_with_binary_mesh( ) {
    let vertices = vec![
      Vector::new( 0.0, 0.0, 1.0 )
    , Vector::new( 1.0, 0.0, 1.0 )
    , Vector::new( 1.0, 1.0, 1.0 )
    , Vector::new( 0.0, 1.0, 1.0 )
    ];
    let faces = vec![ Face::new( 0, 1, 2 ), Face::new( 0, 2, 3 ) ];

    let binary = TriangleMesh::new( vertices.clone( ), faces.clone( ), Material::diffuse( Color::WHITE ) ).unwrap( );
    let packed = TriangleMesh::new_packed( vertices, faces, Material::diffuse( Color::WHITE ) ).unwrap( );

    let ray = Ray::new( Vector::new( 0.25, 0.75, 0.0 ), Vector::new( 0.0, 0.0, 1.0 ) );
    let a = binary.intersect( &ray ).unwrap( );
    let b = packed.intersect( &ray ).unwrap( );
    assert!( ( a.distance - b.distance ).abs( ) <= ERROR_MARGIN );
  }
}
