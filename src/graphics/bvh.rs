// Local imports
use crate::graphics::aabb::AABB;
use crate::graphics::mesh::TriangleInMesh;
use crate::graphics::object::Object;
use crate::graphics::ray::{Ray, Surface, SurfaceInteraction};
use crate::math::{Axis, Transform, Vector, ERROR_MARGIN};

// A bounding-volume hierarchy in a flattened, depth-first layout.
//
// The build produces a binary tree over a permuted copy of the input and
// flattens it: an interior node is immediately followed by its first child,
// and stores the array offset of its second. Traversal is a loop over that
// array with a small explicit visit stack.
//
// Exports:
// * SplitPolicy
// * LinearNode
// * BVH           (over scene objects)
// * TriangleBVH   (over mesh triangles)

/// How a BVH build partitions a range of objects
#[derive(Copy,Clone,Debug,PartialEq)]
pub enum SplitPolicy {
  /// Split at the spatial middle of the centroid bounds
  Middle,
  /// Split into two equally sized halves by centroid order
  EqualCounts,
  /// Minimise expected traversal cost with 12-bucket surface-area binning
  SurfaceAreaHeuristic,
  /// Like `SurfaceAreaHeuristic`, but only considers splits whose first
  /// half is a multiple of 4 and keeps leaves at 1-4 objects; the layout
  /// the 4-ary collapse wants
  SurfaceAreaHeuristic4
}

const NUM_BUCKETS : usize = 12;

/// The recursion cap of the build. On pathological inputs (many objects
/// with overlapping centroids) the remainder of a range becomes a leaf.
const MAX_BUILD_DEPTH : u32 = 64;

/// The visit stack of the flattened traversal. A balanced tree of depth 64
/// never exceeds it, and the build's recursion cap guarantees the depth.
const TRAVERSAL_STACK_SIZE : usize = 64;

#[derive(Copy,Clone,Debug)]
pub(crate) struct ObjectInfo {
  pub index    : usize,
  pub bounds   : AABB,
  pub centroid : Vector
}

impl ObjectInfo {
  pub fn new( index : usize, bounds : AABB ) -> ObjectInfo {
    ObjectInfo { index, bounds, centroid: bounds.centroid( ) }
  }
}

/// A node of the flattened tree.
/// `num_objects == 0` marks an interior node whose second child lives at
/// `offset`; for a leaf, `offset` is the first object index and
/// `num_objects` the run length.
#[derive(Copy,Clone,Debug)]
pub struct LinearNode {
  pub bounds      : AABB,
  pub offset      : u32,
  pub num_objects : u16,
  pub axis        : u8
}

/// The in-progress tree produced by the recursive build, before flattening
#[derive(Debug)]
pub(crate) enum BuildNode {
  Leaf {
    first  : usize,
    count  : usize,
    bounds : AABB
  },
  Interior {
    axis     : Axis,
    bounds   : AABB,
    children : Box< (BuildNode, BuildNode) >
  }
}

impl BuildNode {
  pub fn bounds( &self ) -> AABB {
    match self {
      BuildNode::Leaf { bounds, .. } => *bounds,
      BuildNode::Interior { bounds, .. } => *bounds
    }
  }
}

/// Recursively builds the tree over `infos` and returns the root, the
/// permutation of input indices, and the total node count
pub(crate) fn build_tree( infos : &mut [ObjectInfo], policy : SplitPolicy ) -> (BuildNode, Vec< usize >, usize) {
  let mut order = Vec::with_capacity( infos.len( ) );
  let mut total = 0;
  let n = infos.len( );
  let root = recursive_build( infos, 0, n, &mut order, &mut total, policy, MAX_BUILD_DEPTH );
  ( root, order, total )
}

fn recursive_build(
      infos  : &mut [ObjectInfo]
    , start  : usize
    , end    : usize
    , order  : &mut Vec< usize >
    , total  : &mut usize
    , policy : SplitPolicy
    , depth  : u32 ) -> BuildNode {
  *total += 1;

  let mut bounds = infos[ start ].bounds;
  for i in (start + 1)..end {
    bounds = bounds.union( &infos[ i ].bounds );
  }
  let num_objects = end - start;

  if num_objects == 1 || depth == 0 {
    return make_leaf( infos, start, end, order, bounds );
  }

  let mut centroid_bounds = AABB::new( infos[ start ].centroid, infos[ start + 1 ].centroid );
  for i in (start + 2)..end {
    centroid_bounds = centroid_bounds.add_point( infos[ i ].centroid );
  }
  let axis = centroid_bounds.maximum_extent( );

  // All centroids coincide along the split axis; splitting further would
  // achieve nothing
  if centroid_bounds.pmax.axis( axis ) == centroid_bounds.pmin.axis( axis ) {
    return make_leaf( infos, start, end, order, bounds );
  }

  let mid = match split_range( infos, start, end, axis, &bounds, &centroid_bounds, policy ) {
    SplitResult::MakeLeaf => {
      return make_leaf( infos, start, end, order, bounds );
    },
    SplitResult::SplitAt( mid ) => mid
  };

  let c1 = recursive_build( infos, start, mid, order, total, policy, depth - 1 );
  let c2 = recursive_build( infos, mid, end, order, total, policy, depth - 1 );
  let bounds = c1.bounds( ).union( &c2.bounds( ) );
  BuildNode::Interior { axis, bounds, children: Box::new( (c1, c2) ) }
}

/// Emits the range as a leaf, appending its object indices to the
/// permutation. The leaf references its objects by their post-permutation
/// offset.
fn make_leaf( infos : &[ObjectInfo], start : usize, end : usize, order : &mut Vec< usize >, bounds : AABB ) -> BuildNode {
  let first = order.len( );
  for i in start..end {
    order.push( infos[ i ].index );
  }
  BuildNode::Leaf { first, count: end - start, bounds }
}

enum SplitResult {
  SplitAt( usize ),
  MakeLeaf
}

fn split_range(
      infos           : &mut [ObjectInfo]
    , start           : usize
    , end             : usize
    , axis            : Axis
    , bounds          : &AABB
    , centroid_bounds : &AABB
    , policy          : SplitPolicy ) -> SplitResult {
  match policy {
    SplitPolicy::Middle => split_middle( infos, start, end, axis, centroid_bounds ),
    SplitPolicy::EqualCounts => SplitResult::SplitAt( split_equal_counts( infos, start, end, axis ) ),
    SplitPolicy::SurfaceAreaHeuristic => split_sah( infos, start, end, axis, bounds, centroid_bounds ),
    SplitPolicy::SurfaceAreaHeuristic4 => split_sah4( infos, start, end, axis, bounds, centroid_bounds )
  }
}

/// Stable partition around the centroid-bounds midpoint.
/// Falls back to an equal split when every centroid lands on one side.
fn split_middle( infos : &mut [ObjectInfo], start : usize, end : usize, axis : Axis, centroid_bounds : &AABB ) -> SplitResult {
  let axis_mid = ( centroid_bounds.pmin.axis( axis ) + centroid_bounds.pmax.axis( axis ) ) / 2.0;

  let mut left : Vec< ObjectInfo > = Vec::with_capacity( end - start );
  let mut right : Vec< ObjectInfo > = Vec::with_capacity( end - start );
  for i in start..end {
    if infos[ i ].centroid.axis( axis ) < axis_mid {
      left.push( infos[ i ] );
    } else {
      right.push( infos[ i ] );
    }
  }

  if left.is_empty( ) || right.is_empty( ) {
    return SplitResult::SplitAt( split_equal_counts( infos, start, end, axis ) );
  }

  let mid = start + left.len( );
  for ( i, info ) in left.into_iter( ).chain( right.into_iter( ) ).enumerate( ) {
    infos[ start + i ] = info;
  }
  SplitResult::SplitAt( mid )
}

/// Splits at the median by centroid along the axis
fn split_equal_counts( infos : &mut [ObjectInfo], start : usize, end : usize, axis : Axis ) -> usize {
  let mid = ( start + end ) / 2;
  infos[ start..end ].select_nth_unstable_by( mid - start, |a, b| {
    a.centroid.axis( axis ).partial_cmp( &b.centroid.axis( axis ) ).unwrap_or( std::cmp::Ordering::Equal )
  } );
  mid
}

/// The bucketed surface-area heuristic: bin the range into 12 buckets over
/// the centroid bounds, evaluate the 11 inter-bucket splits with
/// `cost = 0.125 + (N0*SA(B0) + N1*SA(B1)) / SA(parent)`, and take the
/// cheapest; a leaf when no split beats intersecting everything directly.
fn split_sah( infos : &mut [ObjectInfo], start : usize, end : usize, axis : Axis, bounds : &AABB, centroid_bounds : &AABB ) -> SplitResult {
  let n = end - start;
  if n <= 4 {
    return SplitResult::SplitAt( split_equal_counts( infos, start, end, axis ) );
  }

  let ( buckets, mapping ) = bin_into_buckets( infos, start, end, axis, centroid_bounds );
  let cost = bucket_split_costs( &buckets, bounds );

  let mut min_cost = cost[ 0 ];
  let mut min_bucket = 0;
  for i in 1..(NUM_BUCKETS - 1) {
    if cost[ i ] < min_cost {
      min_cost = cost[ i ];
      min_bucket = i;
    }
  }

  let leaf_cost = n as f32;
  if min_cost >= leaf_cost {
    return SplitResult::MakeLeaf;
  }

  SplitResult::SplitAt( partition_by_bucket( infos, start, end, &mapping, min_bucket ) )
}

/// The SAH variant feeding the 4-ary collapse: only splits that put a
/// multiple of 4 objects in the first half are candidates, and ranges of
/// up to 4 become leaves. When every bucket split is rejected the range is
/// cut at the nearest multiple of 4 by centroid order, which bounds the
/// tree depth.
fn split_sah4( infos : &mut [ObjectInfo], start : usize, end : usize, axis : Axis, bounds : &AABB, centroid_bounds : &AABB ) -> SplitResult {
  let n = end - start;
  if n <= 4 {
    return SplitResult::MakeLeaf;
  }

  let ( buckets, mapping ) = bin_into_buckets( infos, start, end, axis, centroid_bounds );
  let cost = bucket_split_costs( &buckets, bounds );

  let mut min_cost = f32::INFINITY;
  let mut min_bucket = None;
  let mut count0 = 0;
  for i in 0..(NUM_BUCKETS - 1) {
    count0 += buckets[ i ].count;
    if count0 == 0 || count0 == n || count0 % 4 != 0 {
      continue;
    }
    if cost[ i ] < min_cost {
      min_cost = cost[ i ];
      min_bucket = Some( i );
    }
  }

  match min_bucket {
    Some( b ) => SplitResult::SplitAt( partition_by_bucket( infos, start, end, &mapping, b ) ),
    None => {
      // No 4-aligned bucket split exists; force one at the 4-aligned
      // median so recursion always terminates
      let half = ( ( n / 2 + 3 ) / 4 * 4 ).min( n - 1 ).max( 1 );
      let mid = start + half;
      infos[ start..end ].select_nth_unstable_by( mid - start, |a, b| {
        a.centroid.axis( axis ).partial_cmp( &b.centroid.axis( axis ) ).unwrap_or( std::cmp::Ordering::Equal )
      } );
      SplitResult::SplitAt( mid )
    }
  }
}

#[derive(Copy,Clone)]
struct BucketInfo {
  count  : usize,
  bounds : AABB
}

fn bin_into_buckets( infos : &[ObjectInfo], start : usize, end : usize, axis : Axis, centroid_bounds : &AABB ) -> ([BucketInfo; NUM_BUCKETS], Vec< usize >) {
  let mut buckets = [ BucketInfo { count: 0, bounds: AABB::EMPTY }; NUM_BUCKETS ];
  let mut mapping = vec![ 0; end - start ];

  for i in start..end {
    let mut b = ( NUM_BUCKETS as f32 * centroid_bounds.offset( infos[ i ].centroid ).axis( axis ) ) as usize;
    if b >= NUM_BUCKETS {
      b = NUM_BUCKETS - 1;
    }
    mapping[ i - start ] = b;

    if buckets[ b ].count == 0 {
      buckets[ b ].bounds = infos[ i ].bounds;
    } else {
      buckets[ b ].bounds = buckets[ b ].bounds.union( &infos[ i ].bounds );
    }
    buckets[ b ].count += 1;
  }

  ( buckets, mapping )
}

/// The estimated cost of splitting after each of the first 11 buckets,
/// with intersection cost 1 and traversal cost 1/8
fn bucket_split_costs( buckets : &[BucketInfo; NUM_BUCKETS], bounds : &AABB ) -> [f32; NUM_BUCKETS - 1] {
  let mut cost = [0.0_f32; NUM_BUCKETS - 1];
  for i in 0..(NUM_BUCKETS - 1) {
    let mut b0 = buckets[ 0 ].bounds;
    let mut count0 = buckets[ 0 ].count;
    for j in 1..=i {
      if buckets[ j ].count > 0 {
        b0 = if count0 == 0 { buckets[ j ].bounds } else { b0.union( &buckets[ j ].bounds ) };
      }
      count0 += buckets[ j ].count;
    }
    let mut b1 = buckets[ i + 1 ].bounds;
    let mut count1 = buckets[ i + 1 ].count;
    for j in (i + 2)..NUM_BUCKETS {
      if buckets[ j ].count > 0 {
        b1 = if count1 == 0 { buckets[ j ].bounds } else { b1.union( &buckets[ j ].bounds ) };
      }
      count1 += buckets[ j ].count;
    }
    cost[ i ] = 0.125
      + ( count0 as f32 * b0.surface_area( ) + count1 as f32 * b1.surface_area( ) )
      / bounds.surface_area( );
  }
  cost
}

/// Stable partition: everything binned at or before `split_bucket` first
fn partition_by_bucket( infos : &mut [ObjectInfo], start : usize, end : usize, mapping : &[usize], split_bucket : usize ) -> usize {
  let mut left : Vec< ObjectInfo > = Vec::with_capacity( end - start );
  let mut right : Vec< ObjectInfo > = Vec::with_capacity( end - start );
  for i in start..end {
    if mapping[ i - start ] <= split_bucket {
      left.push( infos[ i ] );
    } else {
      right.push( infos[ i ] );
    }
  }
  let mid = start + left.len( );
  for ( i, info ) in left.into_iter( ).chain( right.into_iter( ) ).enumerate( ) {
    infos[ start + i ] = info;
  }
  mid
}

/// Flattens the tree depth-first: child-0 immediately follows its parent,
/// child-1 lands at the stored offset
pub(crate) fn flatten_tree( root : &BuildNode, total : usize ) -> Vec< LinearNode > {
  let mut nodes = Vec::with_capacity( total );
  flatten_into( root, &mut nodes );
  nodes
}

fn flatten_into( node : &BuildNode, nodes : &mut Vec< LinearNode > ) -> usize {
  let my_offset = nodes.len( );
  match node {
    BuildNode::Leaf { first, count, bounds } => {
      nodes.push( LinearNode {
        bounds:      *bounds,
        offset:      *first as u32,
        num_objects: *count as u16,
        axis:        0
      } );
    },
    BuildNode::Interior { axis, bounds, children } => {
      nodes.push( LinearNode {
        bounds:      *bounds,
        offset:      0,
        num_objects: 0,
        axis:        *axis as u8
      } );
      flatten_into( &children.0, nodes );
      let second = flatten_into( &children.1, nodes );
      nodes[ my_offset ].offset = second as u32;
    }
  }
  my_offset
}

/// A BVH over scene-level objects
#[derive(Debug)]
pub struct BVH {
  objects : Vec< Object >,
  nodes   : Vec< LinearNode >
}

impl BVH {
  /// Builds the hierarchy, permuting the objects into leaf order.
  /// Bounds are taken in world space; nested objects compose transforms
  /// during the `bound` walk.
  pub fn new( objects : Vec< Object >, policy : SplitPolicy ) -> BVH {
    if objects.is_empty( ) {
      return BVH { objects, nodes: Vec::new( ) };
    }

    let mut infos : Vec< ObjectInfo > = objects
      .iter( )
      .enumerate( )
      .map( |(i, o)| ObjectInfo::new( i, o.bound( &Transform::IDENTITY ) ) )
      .collect( );

    let ( root, order, total ) = build_tree( &mut infos, policy );
    let nodes = flatten_tree( &root, total );

    let mut slots : Vec< Option< Object > > = objects.into_iter( ).map( Some ).collect( );
    let ordered = order
      .iter( )
      .map( |&i| slots[ i ].take( ).unwrap_or_else( || unreachable!( "object {} permuted twice", i ) ) )
      .collect( );

    BVH { objects: ordered, nodes }
  }

  pub fn objects( &self ) -> &[Object] {
    &self.objects
  }

  pub fn node_count( &self ) -> usize {
    self.nodes.len( )
  }

  /// Finds the closest intersection along the ray within `max_distance`.
  /// Stackless walk over the flattened layout with a fixed-size visit
  /// stack; hits at or below `ERROR_MARGIN` are self-intersections and are
  /// skipped.
  pub fn closest_intersection( &self, ray : &Ray, max_distance : f32 ) -> Option< SurfaceInteraction > {
    if self.nodes.is_empty( ) {
      return None;
    }

    let mut best : Option< SurfaceInteraction > = None;
    let mut distance = max_distance;

    let mut to_visit = [0_usize; TRAVERSAL_STACK_SIZE];
    let mut visit_offset = 0;
    let mut current = 0;

    loop {
      let node = &self.nodes[ current ];

      if node.bounds.intersect( ray ).map_or( false, |entry| entry < distance ) {
        if node.num_objects > 0 {
          // Leaf: test its object run
          let first = node.offset as usize;
          for i in first..(first + node.num_objects as usize) {
            if let Some( si ) = self.objects[ i ].intersect( ray ) {
              if si.distance > ERROR_MARGIN && si.distance < distance {
                distance = si.distance;
                best = Some( si );
              }
            }
          }
          if visit_offset == 0 {
            break;
          }
          visit_offset -= 1;
          current = to_visit[ visit_offset ];
        } else {
          // Interior: remember the second child, descend into the first
          to_visit[ visit_offset ] = node.offset as usize;
          visit_offset += 1;
          current += 1;
        }
      } else {
        if visit_offset == 0 {
          break;
        }
        visit_offset -= 1;
        current = to_visit[ visit_offset ];
      }
    }

    best
  }
}

/// A BVH specialised to mesh triangles; leaves intersect by distance only
/// and the hit record is built once at the end
#[derive(Debug)]
pub struct TriangleBVH {
  triangles : Vec< TriangleInMesh >,
  nodes     : Vec< LinearNode >
}

impl TriangleBVH {
  pub fn new( triangles : Vec< TriangleInMesh >, policy : SplitPolicy ) -> TriangleBVH {
    if triangles.is_empty( ) {
      return TriangleBVH { triangles, nodes: Vec::new( ) };
    }

    let mut infos : Vec< ObjectInfo > = triangles
      .iter( )
      .enumerate( )
      .map( |(i, t)| ObjectInfo::new( i, t.bound( &Transform::IDENTITY ) ) )
      .collect( );

    let ( root, order, total ) = build_tree( &mut infos, policy );
    let nodes = flatten_tree( &root, total );

    let mut slots : Vec< Option< TriangleInMesh > > = triangles.into_iter( ).map( Some ).collect( );
    let ordered = order
      .iter( )
      .map( |&i| slots[ i ].take( ).unwrap_or_else( || unreachable!( "triangle {} permuted twice", i ) ) )
      .collect( );

    TriangleBVH { triangles: ordered, nodes }
  }

  pub fn triangles( &self ) -> &[TriangleInMesh] {
    &self.triangles
  }

  pub fn closest_intersection( &self, ray : &Ray, max_distance : f32 ) -> Option< SurfaceInteraction > {
    if self.nodes.is_empty( ) {
      return None;
    }

    let mut best : Option< usize > = None;
    let mut distance = max_distance;

    let mut to_visit = [0_usize; TRAVERSAL_STACK_SIZE];
    let mut visit_offset = 0;
    let mut current = 0;

    loop {
      let node = &self.nodes[ current ];

      if node.bounds.intersect( ray ).map_or( false, |entry| entry < distance ) {
        if node.num_objects > 0 {
          let first = node.offset as usize;
          for i in first..(first + node.num_objects as usize) {
            if let Some( d ) = self.triangles[ i ].intersect( ray ) {
              if d > ERROR_MARGIN && d < distance {
                distance = d;
                best = Some( i );
              }
            }
          }
          if visit_offset == 0 {
            break;
          }
          visit_offset -= 1;
          current = to_visit[ visit_offset ];
        } else {
          to_visit[ visit_offset ] = node.offset as usize;
          visit_offset += 1;
          current += 1;
        }
      } else {
        if visit_offset == 0 {
          break;
        }
        visit_offset -= 1;
        current = to_visit[ visit_offset ];
      }
    }

    best.map( |i| {
      let t = &self.triangles[ i ];
      let normal = t.surface_normal( ray.at( distance ) );
      SurfaceInteraction::new( Surface::MeshTriangle( t ), distance, normal, ray )
    } )
  }
}

/// Linear-scan reference: intersects every object. The oracle the BVH is
/// checked against, and good enough for very small scenes.
pub fn closest_intersection_linear< 'a >( ray : &Ray, objects : &'a [Object], max_distance : f32 ) -> Option< SurfaceInteraction< 'a > > {
  let mut best : Option< SurfaceInteraction< 'a > > = None;
  let mut distance = max_distance;

  for o in objects {
    if let Some( si ) = o.intersect( ray ) {
      if si.distance > ERROR_MARGIN && si.distance < distance {
        distance = si.distance;
        best = Some( si );
      }
    }
  }

  best
}
