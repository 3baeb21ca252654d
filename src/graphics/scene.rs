// External imports
use std::time::Instant;
// Local imports
use crate::error::BuildError;
use crate::graphics::bvh::{closest_intersection_linear, SplitPolicy, BVH};
use crate::graphics::camera::Camera;
use crate::graphics::lights::Light;
use crate::graphics::object::Object;
use crate::graphics::primitives::Triangle;
use crate::graphics::ray::{Ray, SurfaceInteraction};
use crate::math::Transform;

/// A scene: objects, lights and a camera, plus the acceleration structure
/// built over the objects.
///
/// Built incrementally through `add`/`add_lights`; `precompute` finalizes
/// the BVH and the emitter list. After that the scene is read-only and can
/// be shared across render workers without synchronization.
pub struct Scene {
  objects      : Vec< Object >,
  pub lights   : Vec< Light >,
  /// World-space emissive triangles, harvested at precompute; the uniform
  /// emitter selection of next-event estimation draws from this list
  pub emitters : Vec< Triangle >,
  pub camera   : Camera,
  accel        : Option< BVH >
}

impl Scene {
  pub fn new( camera : Camera ) -> Scene {
    Scene {
      objects:  Vec::new( ),
      lights:   Vec::new( ),
      emitters: Vec::new( ),
      camera,
      accel:    None
    }
  }

  pub fn add( &mut self, object : Object ) {
    self.objects.push( object );
  }

  pub fn add_all< I : IntoIterator< Item = Object > >( &mut self, objects : I ) {
    self.objects.extend( objects );
  }

  pub fn add_lights< I : IntoIterator< Item = Light > >( &mut self, lights : I ) {
    self.lights.extend( lights );
  }

  /// Finalizes the scene: harvests the emitter list and builds the SAH
  /// BVH over the objects added so far. No further mutation afterwards.
  pub fn precompute( &mut self ) -> Result< (), BuildError > {
    let start = Instant::now( );

    self.emitters.clear( );
    for o in &self.objects {
      o.collect_emitters( &Transform::IDENTITY, &mut self.emitters );
    }

    let objects = std::mem::take( &mut self.objects );
    let num_objects = objects.len( );
    let bvh = BVH::new( objects, SplitPolicy::SurfaceAreaHeuristic );

    log::info!(
      "scene precompute: {} objects, {} BVH nodes, {} emitters, {:.1?}"
    , num_objects
    , bvh.node_count( )
    , self.emitters.len( )
    , start.elapsed( ) );

    self.accel = Some( bvh );
    Ok( () )
  }

  /// The scene objects; in BVH leaf order once precomputed
  pub fn objects( &self ) -> &[Object] {
    match &self.accel {
      Some( bvh ) => bvh.objects( ),
      None => &self.objects
    }
  }

  /// The closest intersection within `max_distance`. Falls back to a
  /// linear scan when `precompute` has not run. An empty scene simply
  /// reports no hit.
  pub fn intersect( &self, ray : &Ray, max_distance : f32 ) -> Option< SurfaceInteraction > {
    match &self.accel {
      Some( bvh ) => bvh.closest_intersection( ray, max_distance ),
      None => closest_intersection_linear( ray, &self.objects, max_distance )
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::graphics::color::Color;
  use crate::graphics::material::Material;
  use crate::graphics::primitives::Sphere;
  use crate::math::{Vector, MAX_RAY_DISTANCE};
  use std::f32::consts::PI;

  fn test_camera( ) -> Camera {
    Camera::new_perspective( 16, 16, PI / 2.0 ).unwrap( )
  }

  #[test]
  fn empty_scene_has_no_intersection( ) {
    let mut scene = Scene::new( test_camera( ) );
    scene.precompute( ).unwrap( );

    let ray = Ray::new( Vector::ZERO, Vector::new( 0.0, 0.0, 1.0 ) );
    assert!( scene.intersect( &ray, MAX_RAY_DISTANCE ).is_none( ) );
  }

  #[test]
  fn intersection_agrees_before_and_after_precompute( ) {
    let mut scene = Scene::new( test_camera( ) );
    scene.add( Object::Sphere( Sphere::new(
      Vector::new( 0.0, 0.0, 5.0 ), 1.0, Material::diffuse( Color::WHITE ) ) ) );

    let ray = Ray::new( Vector::ZERO, Vector::new( 0.0, 0.0, 1.0 ) );
    let before = scene.intersect( &ray, MAX_RAY_DISTANCE ).unwrap( ).distance;

    scene.precompute( ).unwrap( );
    let after = scene.intersect( &ray, MAX_RAY_DISTANCE ).unwrap( ).distance;

    assert!( ( before - after ).abs( ) < 1e-6 );
  }

  #[test]
  fn zero_direction_ray_finds_nothing( ) {
    let mut scene = Scene::new( test_camera( ) );
    scene.add( Object::Sphere( Sphere::new(
      Vector::new( 0.0, 0.0, 5.0 ), 1.0, Material::diffuse( Color::WHITE ) ) ) );
    scene.precompute( ).unwrap( );

    let ray = Ray::new( Vector::ZERO, Vector::ZERO );
    assert!( scene.intersect( &ray, MAX_RAY_DISTANCE ).is_none( ) );
  }

  #[test]
  fn precompute_collects_emitters( ) {
    let mut scene = Scene::new( test_camera( ) );
    scene.add( Object::Triangle( Triangle::new(
      Vector::new( 0.0, 5.0, 0.0 )
    , Vector::new( 1.0, 5.0, 0.0 )
    , Vector::new( 0.0, 5.0, 1.0 )
    , Material::radiant( Color::WHITE * 10.0 ) ) ) );
    scene.add( Object::Triangle( Triangle::new(
      Vector::new( 0.0, 0.0, 0.0 )
    , Vector::new( 1.0, 0.0, 0.0 )
    , Vector::new( 0.0, 0.0, 1.0 )
    , Material::diffuse( Color::WHITE ) ) ) );

    scene.precompute( ).unwrap( );
    assert_eq!( scene.emitters.len( ), 1 );
  }
}
