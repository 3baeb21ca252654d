// External imports
use std::sync::Arc;
// Local imports
use crate::error::BuildError;
use crate::graphics::aabb::AABB;
use crate::graphics::bvh::{BVH, SplitPolicy};
use crate::graphics::material::Material;
use crate::graphics::mesh::TriangleMesh;
use crate::graphics::primitives::{Plane, Sphere, Triangle};
use crate::graphics::ray::{Ray, Surface, SurfaceInteraction};
use crate::math::{Transform, Vector, MAX_RAY_DISTANCE};

// The object model of a scene
//
// Simple objects are geometric primitives. Complex objects group
// primitives behind a nested acceleration structure. Shared objects
// instance a common prototype through a placement transform. Meshes are
// their own aggregate (see `graphics::mesh`).
//
// Exports:
// * Object
// * ComplexObject
// * SharedObject

/// Anything a scene can hold and a ray can hit
#[derive(Debug)]
pub enum Object {
  Sphere( Sphere ),
  Triangle( Triangle ),
  Plane( Plane ),
  Complex( ComplexObject ),
  Shared( SharedObject ),
  Mesh( TriangleMesh )
}

impl Object {
  /// Intersects the ray with this object; the closest hit, if any
  pub fn intersect( &self, ray : &Ray ) -> Option< SurfaceInteraction > {
    match self {
      Object::Sphere( s ) => {
        let d = s.intersect( ray )?;
        let normal = s.surface_normal( ray.at( d ) );
        Some( SurfaceInteraction::new( Surface::Object( self ), d, normal, ray ) )
      },
      Object::Triangle( t ) => {
        let d = t.intersect( ray )?;
        let normal = t.surface_normal( ray.at( d ) );
        Some( SurfaceInteraction::new( Surface::Object( self ), d, normal, ray ) )
      },
      Object::Plane( p ) => {
        let d = p.intersect( ray )?;
        let normal = p.surface_normal( ray.at( d ) );
        Some( SurfaceInteraction::new( Surface::Object( self ), d, normal, ray ) )
      },
      Object::Complex( c ) => c.intersect( ray ),
      Object::Shared( s ) => s.intersect( ray ),
      Object::Mesh( m ) => m.intersect( ray )
    }
  }

  /// The world-space bound under the given transform. Nested objects
  /// compose transforms during this walk.
  pub fn bound( &self, t : &Transform ) -> AABB {
    match self {
      Object::Sphere( s ) => s.bound( t ),
      Object::Triangle( tr ) => tr.bound( t ),
      Object::Plane( p ) => p.bound( t ),
      Object::Complex( c ) => c.bound( t ),
      Object::Shared( s ) => s.bound( t ),
      Object::Mesh( m ) => m.bound( t )
    }
  }

  /// The outward unit normal at a surface point.
  /// Aggregates have no surface of their own; the hit's leaf primitive
  /// answers this, never the aggregate.
  pub fn surface_normal( &self, p : Vector ) -> Vector {
    match self {
      Object::Sphere( s ) => s.surface_normal( p ),
      Object::Triangle( t ) => t.surface_normal( p ),
      Object::Plane( pl ) => pl.surface_normal( p ),
      Object::Shared( s ) => s.object.surface_normal( p ),
      Object::Complex( _ ) | Object::Mesh( _ ) =>
        panic!( "surface_normal is undefined on aggregate objects" )
    }
  }

  /// The material of a simple object; instances inherit their prototype's
  pub fn material( &self ) -> &Material {
    match self {
      Object::Sphere( s ) => &s.material,
      Object::Triangle( t ) => &t.material,
      Object::Plane( p ) => &p.material,
      Object::Shared( s ) => s.object.material( ),
      Object::Mesh( m ) => m.material( ),
      Object::Complex( _ ) =>
        panic!( "material is undefined on complex objects" )
    }
  }

  /// Collects the world-space emissive triangles reachable from this
  /// object, applying `t` to place them. Feeds the scene's emitter list.
  pub fn collect_emitters( &self, t : &Transform, out : &mut Vec< Triangle > ) {
    match self {
      Object::Triangle( tr ) => {
        if tr.material.is_emissive( ) {
          out.push( tr.transformed( t ) );
        }
      },
      Object::Complex( c ) => {
        for o in c.accel.objects( ) {
          o.collect_emitters( t, out );
        }
      },
      Object::Shared( s ) => {
        s.object.collect_emitters( &t.compose( &s.object_to_world ), out );
      },
      Object::Mesh( m ) => {
        if m.material( ).is_emissive( ) {
          for tr in m.triangles( ) {
            out.push( tr.to_triangle( t ) );
          }
        }
      },
      // Sphere and plane emitters are not sampled as area lights
      _ => { }
    }
  }
}

/// A group of objects sharing a coordinate system, queried through its own
/// nested BVH
#[derive(Debug)]
pub struct ComplexObject {
  accel : BVH
}

impl ComplexObject {
  pub fn new( objects : Vec< Object > ) -> Result< ComplexObject, BuildError > {
    if objects.is_empty( ) {
      return Err( BuildError::EmptyComplexObject );
    }
    Ok( ComplexObject { accel: BVH::new( objects, SplitPolicy::Middle ) } )
  }

  pub fn objects( &self ) -> &[Object] {
    self.accel.objects( )
  }

  fn intersect( &self, ray : &Ray ) -> Option< SurfaceInteraction > {
    self.accel.closest_intersection( ray, MAX_RAY_DISTANCE )
  }

  fn bound( &self, t : &Transform ) -> AABB {
    let objects = self.accel.objects( );
    let mut bound = objects[ 0 ].bound( t );
    for o in &objects[ 1.. ] {
      bound = bound.union( &o.bound( t ) );
    }
    bound
  }
}

/// An instance: a shared prototype placed in the world by a transform.
///
/// Many instances share one prototype and differ only in placement; the
/// prototype is never owned by its instances. Instancing composes, an
/// instanced object may itself contain instances.
#[derive(Debug)]
pub struct SharedObject {
  object          : Arc< Object >,
  object_to_world : Transform
}

impl SharedObject {
  /// Wraps `object` for placement by `object_to_world`. The prototype
  /// must be modelled centered on the origin; placement is entirely the
  /// transform's job.
  pub fn new( object : Arc< Object >, object_to_world : Transform ) -> Result< SharedObject, BuildError > {
    let b = object.bound( &Transform::IDENTITY );
    let diagonal = ( b.pmax - b.pmin ).length( );
    if b.centroid( ).length( ) > 1e-3 * diagonal.max( 1.0 ) {
      return Err( BuildError::UncenteredSharedObject );
    }
    Ok( SharedObject { object, object_to_world } )
  }

  pub fn prototype( &self ) -> &Object {
    &self.object
  }

  fn intersect( &self, ray : &Ray ) -> Option< SurfaceInteraction > {
    // Query in object space, then carry the hit back to world space. The
    // object-space point and normal on the interaction stay untouched for
    // instanced texture lookups.
    let object_ray = self.object_to_world.inverse( ).ray( ray );
    let si = self.object.intersect( &object_ray )?;

    let world_point = self.object_to_world.point( si.point );
    let world_normal = self.object_to_world.normal( si.normal ).normalize( );

    Some( SurfaceInteraction {
      distance:      ( world_point - ray.origin ).length( ),
      point:         world_point,
      normal:        world_normal,
      surface:       si.surface,
      object_point:  si.object_point,
      object_normal: si.object_normal,
      incident:      ray.dir
    } )
  }

  fn bound( &self, t : &Transform ) -> AABB {
    self.object.bound( &t.compose( &self.object_to_world ) )
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::graphics::color::Color;
  use crate::graphics::primitives::Cuboid;

  fn unit_sphere( ) -> Object {
    Object::Sphere( Sphere::new( Vector::ZERO, 1.0, Material::diffuse( Color::WHITE ) ) )
  }

  #[test]
  fn empty_complex_object_is_rejected( ) {
    assert_eq!( ComplexObject::new( Vec::new( ) ).err( ), Some( BuildError::EmptyComplexObject ) );
  }

  #[test]
  fn uncentered_prototype_is_rejected( ) {
    let off_center = Object::Sphere( Sphere::new(
      Vector::new( 5.0, 0.0, 0.0 ), 1.0, Material::diffuse( Color::WHITE ) ) );
    let r = SharedObject::new( Arc::new( off_center ), Transform::IDENTITY );
    assert_eq!( r.err( ), Some( BuildError::UncenteredSharedObject ) );
  }

  #[test]
  fn instance_is_hit_at_its_placement( ) {
    let proto = Arc::new( unit_sphere( ) );
    let instance = Object::Shared( SharedObject::new(
      Arc::clone( &proto )
    , Transform::translate( Vector::new( 0.0, 0.0, 5.0 ) )
    ).unwrap( ) );

    let ray = Ray::new( Vector::ZERO, Vector::new( 0.0, 0.0, 1.0 ) );
    let si = instance.intersect( &ray ).unwrap( );

    assert!( ( si.distance - 4.0 ).abs( ) < 1e-3 );
    assert!( ( si.point - Vector::new( 0.0, 0.0, 4.0 ) ).length( ) < 1e-3 );
    assert!( ( si.normal - Vector::new( 0.0, 0.0, -1.0 ) ).length( ) < 1e-3 );
    // Object-space data is untouched by the instance transform
    assert!( ( si.object_point - Vector::new( 0.0, 0.0, -1.0 ) ).length( ) < 1e-3 );
  }

  #[test]
  fn chained_instances_compose_transforms( ) {
    let proto = Arc::new( unit_sphere( ) );
    let inner = Object::Shared( SharedObject::new(
      proto, Transform::rotate_y( 1.0 ) ).unwrap( ) );
    let outer = Object::Shared( SharedObject::new(
      Arc::new( inner )
    , Transform::translate( Vector::new( 3.0, 0.0, 0.0 ) )
    ).unwrap( ) );

    let ray = Ray::new( Vector::new( 3.0, 0.0, -5.0 ), Vector::new( 0.0, 0.0, 1.0 ) );
    let si = outer.intersect( &ray ).unwrap( );
    assert!( ( si.distance - 4.0 ).abs( ) < 1e-3 );
  }

  #[test]
  fn instance_bound_covers_the_placed_object( ) {
    let proto = Arc::new( unit_sphere( ) );
    let instance = Object::Shared( SharedObject::new(
      proto, Transform::translate( Vector::new( 10.0, 0.0, 0.0 ) ) ).unwrap( ) );

    let b = instance.bound( &Transform::IDENTITY );
    assert!( b.contains_point( Vector::new( 10.0, 0.9, 0.0 ) ) );
    assert!( !b.contains_point( Vector::ZERO ) );
  }

  #[test]
  fn complex_object_finds_nested_hits( ) {
    let spheres = vec![
      Object::Sphere( Sphere::new( Vector::new( 0.0, 0.0, 3.0 ), 1.0, Material::diffuse( Color::WHITE ) ) )
    , Object::Sphere( Sphere::new( Vector::new( 0.0, 0.0, 8.0 ), 1.0, Material::diffuse( Color::WHITE ) ) )
    ];
    let complex = Object::Complex( ComplexObject::new( spheres ).unwrap( ) );

    let ray = Ray::new( Vector::ZERO, Vector::new( 0.0, 0.0, 1.0 ) );
    let si = complex.intersect( &ray ).unwrap( );
    assert!( ( si.distance - 2.0 ).abs( ) < 1e-3 );
  }

  #[test]
  fn emitters_from_instanced_objects_are_world_space( ) {
    let light_cube = Cuboid::new(
      AABB::new( Vector::new( -0.5, -0.5, -0.5 ), Vector::new( 0.5, 0.5, 0.5 ) )
    , Material::radiant( Color::WHITE * 10.0 ) );
    let triangles : Vec< Object > = light_cube
      .tesselate( )
      .into_iter( )
      .map( Object::Triangle )
      .collect( );
    let proto = Arc::new( Object::Complex( ComplexObject::new( triangles ).unwrap( ) ) );
    let instance = Object::Shared( SharedObject::new(
      proto, Transform::translate( Vector::new( 0.0, 20.0, 0.0 ) ) ).unwrap( ) );

    let mut emitters = Vec::new( );
    instance.collect_emitters( &Transform::IDENTITY, &mut emitters );

    assert_eq!( emitters.len( ), 12 );
    for t in &emitters {
      assert!( t.p0.y >= 19.0 && t.p0.y <= 21.0 );
    }
  }
}
