// Local imports
use crate::graphics::aabb::{AABB, AABBx4};
use crate::graphics::bvh::{build_tree, BuildNode, ObjectInfo, SplitPolicy};
use crate::graphics::mesh::TriangleInMesh;
use crate::graphics::ray::{Ray, Surface, SurfaceInteraction};
use crate::math::{Transform, ERROR_MARGIN};
use crate::simd::{triangle4_hit, F32x4};

// The 4-ary SIMD variant of the triangle BVH.
//
// A binary SAH tree is built first, with splits constrained to
// multiple-of-4 child counts; pairs of interior levels are then collapsed,
// so one node holds up to 4 grandchild pointers and their AABBs in packed
// lanes. A leaf packs the vertices of up to 4 triangles, intersected by a
// single packed Möller-Trumbore call.
//
// Exports:
// * Node4
// * TriangleBVH4

/// A node in the 4-ary tree. `children` entries of -1 are empty lanes.
#[derive(Clone,Debug)]
pub enum Node4 {
  Interior {
    bounds       : AABBx4,
    children     : [i32; 4],
    num_children : u32
  },
  Leaf {
    first : u32,
    count : u32,
    p0    : [F32x4; 3],
    p1    : [F32x4; 3],
    p2    : [F32x4; 3]
  }
}

#[derive(Debug)]
pub struct TriangleBVH4 {
  triangles : Vec< TriangleInMesh >,
  nodes     : Vec< Node4 >,
  root      : i32
}

impl TriangleBVH4 {
  pub fn new( triangles : Vec< TriangleInMesh > ) -> TriangleBVH4 {
    if triangles.is_empty( ) {
      return TriangleBVH4 { triangles, nodes: Vec::new( ), root: -1 };
    }

    let mut infos : Vec< ObjectInfo > = triangles
      .iter( )
      .enumerate( )
      .map( |(i, t)| ObjectInfo::new( i, t.bound( &Transform::IDENTITY ) ) )
      .collect( );

    let ( tree, order, _total ) = build_tree( &mut infos, SplitPolicy::SurfaceAreaHeuristic4 );

    let mut slots : Vec< Option< TriangleInMesh > > = triangles.into_iter( ).map( Some ).collect( );
    let ordered : Vec< TriangleInMesh > = order
      .iter( )
      .map( |&i| slots[ i ].take( ).unwrap_or_else( || unreachable!( "triangle {} permuted twice", i ) ) )
      .collect( );

    let mut nodes = Vec::new( );
    let ( root, _bounds ) = collapse( &tree, &ordered, &mut nodes );

    TriangleBVH4 { triangles: ordered, nodes, root }
  }

  pub fn triangles( &self ) -> &[TriangleInMesh] {
    &self.triangles
  }

  pub fn node_count( &self ) -> usize {
    self.nodes.len( )
  }

  pub fn closest_intersection( &self, ray : &Ray, max_distance : f32 ) -> Option< SurfaceInteraction > {
    if self.root < 0 {
      return None;
    }
    self.traverse( self.root, ray, max_distance ).map( |(distance, i)| {
      let t = &self.triangles[ i ];
      let normal = t.surface_normal( ray.at( distance ) );
      SurfaceInteraction::new( Surface::MeshTriangle( t ), distance, normal, ray )
    } )
  }

  fn traverse( &self, node_i : i32, ray : &Ray, mut max_dis : f32 ) -> Option< (f32, usize) > {
    match &self.nodes[ node_i as usize ] {
      Node4::Leaf { first, count, p0, p1, p2 } => {
        // One packed call intersects all 4 lanes; 0 marks a miss
        let ts = triangle4_hit( *p0, *p1, *p2, ray.origin, ray.dir );

        let mut best = None;
        for i in 0..(*count as usize) {
          let t = ts.extract( i );
          if t > ERROR_MARGIN && t < max_dis {
            max_dis = t;
            best = Some( (t, *first as usize + i) );
          }
        }
        best
      },
      Node4::Interior { bounds, children, num_children } => {
        // One packed call intersects the 4 child AABBs; -INF marks a miss
        let hits = bounds.intersect( ray );

        let mut order = [ (0_i32, f32::INFINITY); 4 ];
        for i in 0..(*num_children as usize) {
          order[ i ] = ( children[ i ], hits.extract( i ) );
        }
        sort_small( &mut order, *num_children as usize );

        let mut best = None;
        for &( child, dist ) in order[ ..*num_children as usize ].iter( ) {
          if dist > max_dis {
            // Ordered by entry distance: nothing closer can follow
            break;
          }
          if dist >= 0.0 && child >= 0 {
            if let Some( (d, i) ) = self.traverse( child, ray, max_dis ) {
              max_dis = d;
              best = Some( (d, i) );
            }
          }
        }
        best
      }
    }
  }
}

/// Collapses the binary tree into the 4-ary layout. Returns the index of
/// the produced node and its bounds (for the parent's packed lanes).
fn collapse( node : &BuildNode, triangles : &[TriangleInMesh], nodes : &mut Vec< Node4 > ) -> (i32, AABB) {
  match node {
    BuildNode::Leaf { first, count, bounds } => {
      ( collapse_leaf_range( *first, *count, triangles, nodes ), *bounds )
    },
    BuildNode::Interior { children, bounds, .. } => {
      // Skip one interior level: adopt up to 4 grandchildren
      let mut gathered : Vec< &BuildNode > = Vec::with_capacity( 4 );
      for child in [ &children.0, &children.1 ] {
        match child {
          BuildNode::Interior { children: gc, .. } => {
            gathered.push( &gc.0 );
            gathered.push( &gc.1 );
          },
          BuildNode::Leaf { .. } => {
            gathered.push( child );
          }
        }
      }

      let mut child_ids = [ -1_i32; 4 ];
      let mut child_bounds = [ AABB::EMPTY; 4 ];
      let num_children = gathered.len( ) as u32;
      for ( i, g ) in gathered.into_iter( ).enumerate( ) {
        let ( id, b ) = collapse( g, triangles, nodes );
        child_ids[ i ] = id;
        child_bounds[ i ] = b;
      }

      nodes.push( Node4::Interior {
        bounds: AABBx4::new( child_bounds[ 0 ], child_bounds[ 1 ], child_bounds[ 2 ], child_bounds[ 3 ] ),
        children: child_ids,
        num_children
      } );
      ( ( nodes.len( ) - 1 ) as i32, *bounds )
    }
  }
}

/// Emits a leaf for up to 4 triangles; larger runs (from degenerate or
/// depth-capped builds) are split into a small subtree of packed leaves
fn collapse_leaf_range( first : usize, count : usize, triangles : &[TriangleInMesh], nodes : &mut Vec< Node4 > ) -> i32 {
  if count <= 4 {
    let mut p0 = [ F32x4::ZERO; 3 ];
    let mut p1 = [ F32x4::ZERO; 3 ];
    let mut p2 = [ F32x4::ZERO; 3 ];

    // Unfilled lanes stay zero; a degenerate triangle never intersects
    for i in 0..count {
      let ( a, b, c ) = triangles[ first + i ].points( );
      p0[ 0 ] = p0[ 0 ].replace( i, a.x );
      p0[ 1 ] = p0[ 1 ].replace( i, a.y );
      p0[ 2 ] = p0[ 2 ].replace( i, a.z );
      p1[ 0 ] = p1[ 0 ].replace( i, b.x );
      p1[ 1 ] = p1[ 1 ].replace( i, b.y );
      p1[ 2 ] = p1[ 2 ].replace( i, b.z );
      p2[ 0 ] = p2[ 0 ].replace( i, c.x );
      p2[ 1 ] = p2[ 1 ].replace( i, c.y );
      p2[ 2 ] = p2[ 2 ].replace( i, c.z );
    }

    nodes.push( Node4::Leaf { first: first as u32, count: count as u32, p0, p1, p2 } );
    return ( nodes.len( ) - 1 ) as i32;
  }

  // Cut the run into up to 4 chunks and pack those under an interior node
  let per = ( count + 3 ) / 4;
  let mut child_ids = [ -1_i32; 4 ];
  let mut child_bounds = [ AABB::EMPTY; 4 ];
  let mut num_children = 0;

  let mut offset = first;
  let end = first + count;
  while offset < end {
    let chunk = per.min( end - offset );
    let id = collapse_leaf_range( offset, chunk, triangles, nodes );

    let mut b = triangles[ offset ].bound( &Transform::IDENTITY );
    for t in &triangles[ (offset + 1)..(offset + chunk) ] {
      b = b.union( &t.bound( &Transform::IDENTITY ) );
    }

    child_ids[ num_children ] = id;
    child_bounds[ num_children ] = b;
    num_children += 1;
    offset += chunk;
  }

  nodes.push( Node4::Interior {
    bounds: AABBx4::new( child_bounds[ 0 ], child_bounds[ 1 ], child_bounds[ 2 ], child_bounds[ 3 ] ),
    children: child_ids,
    num_children: num_children as u32
  } );
  ( nodes.len( ) - 1 ) as i32
}

/// Sorts at most 4 (child, distance) pairs by distance; a small sorting
/// network beats a general sort at this size
fn sort_small( a : &mut [(i32, f32); 4], n : usize ) {
  if n == 2 {
    if a[ 1 ].1 < a[ 0 ].1 {
      a.swap( 0, 1 );
    }
  } else if n == 3 {
    if a[ 1 ].1 < a[ 0 ].1 {
      a.swap( 0, 1 );
    }
    if a[ 2 ].1 < a[ 1 ].1 {
      a.swap( 1, 2 );
    }
    if a[ 1 ].1 < a[ 0 ].1 {
      a.swap( 0, 1 );
    }
  } else if n == 4 {
    if a[ 1 ].1 < a[ 0 ].1 {
      a.swap( 0, 1 );
    }
    if a[ 3 ].1 < a[ 2 ].1 {
      a.swap( 2, 3 );
    }
    if a[ 2 ].1 < a[ 0 ].1 {
      a.swap( 0, 2 );
    }
    if a[ 3 ].1 < a[ 1 ].1 {
      a.swap( 1, 3 );
    }
    if a[ 2 ].1 < a[ 1 ].1 {
      a.swap( 1, 2 );
    }
  }
}
