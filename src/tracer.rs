// External imports
use rand::rngs::SmallRng;
use rand::Rng;
use std::f32::consts::PI;
// Local imports
use crate::graphics::ray::Ray;
use crate::graphics::{Color, Material, Scene};
use crate::math::{Vector, MAX_RAY_DISTANCE};

// The integrators: given a camera ray and a read-only scene, produce the
// radiance arriving along that ray.
//
// A trace never fails; numeric degeneracies locally produce "no hit" or
// black, and the recursion bound terminates paths deterministically.
//
// Exports:
// * RenderConfig
// * TraceContext
// * TracerKind

/// The tunables of a render, threaded through every trace.
/// These used to be process-wide globals in older revisions; carrying them
/// here keeps renders reproducible and lets tests vary them freely.
#[derive(Clone,Debug)]
pub struct RenderConfig {
  /// Radiance for rays that leave the scene
  pub background    : Color,
  /// Recursion bound; at this depth a path contributes no further light
  pub max_ray_depth : u32,
  /// Master seed; each worker derives its own RNG stream from it
  pub seed          : u64
}

impl Default for RenderConfig {
  fn default( ) -> RenderConfig {
    RenderConfig {
      background:    Color::BLACK,
      max_ray_depth: 5,
      seed:          0x5EED_1E55_0BADC0DE
    }
  }
}

/// Everything a trace needs besides the ray: the scene, the tunables and
/// the worker's RNG. Passed explicitly instead of stashing back-pointers
/// on the interaction.
pub struct TraceContext< 'a > {
  pub scene  : &'a Scene,
  pub config : &'a RenderConfig,
  pub rng    : &'a mut SmallRng
}

/// The available integrators
#[derive(Copy,Clone,Debug,PartialEq)]
pub enum TracerKind {
  /// Whitted-style: direct light with shadow rays, mirror recursion
  Whitted,
  /// Uniform path tracing: one BRDF bounce per vertex
  Path,
  /// Path tracing with next-event estimation: an explicit light sample at
  /// every diffuse vertex, plus the BRDF bounce
  PathNee
}

impl TracerKind {
  /// Traces a ray at the given recursion depth and returns its radiance
  pub fn trace( self, ctx : &mut TraceContext, ray : &Ray, depth : u32 ) -> Color {
    match self {
      TracerKind::Whitted => whitted_trace( ctx, ray, depth ),
      TracerKind::Path => path_trace( ctx, ray, depth ),
      TracerKind::PathNee => path_nee_trace( ctx, ray, depth )
    }
  }
}

fn whitted_trace( ctx : &mut TraceContext, ray : &Ray, depth : u32 ) -> Color {
  if depth >= ctx.config.max_ray_depth {
    return Color::BLACK;
  }

  let mut si = match ctx.scene.intersect( ray, MAX_RAY_DISTANCE ) {
    None => return ctx.config.background,
    Some( si ) => si
  };
  let mat = si.surface.material( ).resolve( &mut si );

  match mat {
    Material::Radiant { color } => *color,

    Material::Reflective => {
      let reflected = Ray::new( si.point, si.incident.reflect( si.normal ) );
      whitted_trace( ctx, &reflected, depth + 1 )
    },

    Material::PositionFn { color_fn } => color_fn( &si ),

    _ => {
      // Surfaces facing away from the ray stay dark
      if si.normal.dot( -si.incident ) <= 0.0 {
        return Color::BLACK;
      }

      let albedo = mat.albedo( &si );
      let mut color = Color::BLACK;

      for light in &ctx.scene.lights {
        let seg = light.segment( si.point, ctx.rng );
        let cos = si.normal.dot( seg.dir );
        if cos <= 0.0 {
          continue;
        }
        if occluded( ctx.scene, si.point, seg.dir, seg.distance ) {
          continue;
        }
        color += albedo * seg.radiance * ( cos / PI );
      }
      color
    }
  }
}

fn path_trace( ctx : &mut TraceContext, ray : &Ray, depth : u32 ) -> Color {
  if depth >= ctx.config.max_ray_depth {
    return Color::BLACK;
  }

  let mut si = match ctx.scene.intersect( ray, MAX_RAY_DISTANCE ) {
    None => return ctx.config.background,
    Some( si ) => si
  };
  let mat = si.surface.material( ).resolve( &mut si );

  match mat {
    // Emitters along the path contribute directly and terminate it
    Material::Radiant { color } => *color,

    Material::Reflective => {
      let reflected = Ray::new( si.point, si.incident.reflect( si.normal ) );
      path_trace( ctx, &reflected, depth + 1 )
    },

    Material::PositionFn { color_fn } => color_fn( &si ),

    _ => {
      let ( wi, pdf ) = mat.sample_direction( ctx.rng, &si );
      let cos = wi.dot( si.normal ).max( 0.0 );
      let f = mat.brdf( &si );

      let incoming = path_trace( ctx, &Ray::new( si.point, wi ), depth + 1 );
      f * incoming * ( cos / pdf )
    }
  }
}

fn path_nee_trace( ctx : &mut TraceContext, ray : &Ray, depth : u32 ) -> Color {
  if depth >= ctx.config.max_ray_depth {
    return Color::BLACK;
  }

  let mut si = match ctx.scene.intersect( ray, MAX_RAY_DISTANCE ) {
    None => return ctx.config.background,
    Some( si ) => si
  };
  let mat = si.surface.material( ).resolve( &mut si );

  match mat {
    // Direct light is handled by the explicit light samples; counting a
    // randomly-hit emitter again would double it. Only a directly visible
    // emitter (depth 0) shows itself.
    Material::Radiant { color } => {
      if depth == 0 {
        *color
      } else {
        Color::BLACK
      }
    },

    Material::Reflective => {
      let reflected = Ray::new( si.point, si.incident.reflect( si.normal ) );
      path_nee_trace( ctx, &reflected, depth + 1 )
    },

    Material::PositionFn { color_fn } => color_fn( &si ),

    _ => {
      let f = mat.brdf( &si );
      let mut color = Color::BLACK;

      // Next event: one uniformly chosen emitter, one uniform point on it
      let num_emitters = ctx.scene.emitters.len( );
      if num_emitters > 0 {
        let picked = ctx.rng.gen_range( 0..num_emitters );
        let emitter = &ctx.scene.emitters[ picked ];
        let q = emitter.sample_point( ctx.rng );

        let to_light = q - si.point;
        let d_sq = to_light.length_sq( );
        let distance = d_sq.sqrt( );
        let dir = to_light / distance;

        let cos_surface = si.normal.dot( dir );
        let cos_light = emitter.surface_normal( q ).dot( -dir );

        if cos_surface > 0.0 && cos_light > 0.0
          && !occluded( ctx.scene, si.point, dir, distance ) {
          // Geometric factor over the pdf of choosing this emitter
          // (1/count) and this point on it (1/area)
          let g = cos_surface * cos_light / d_sq;
          color += emitter.material.emitted( ) * f * ( g * emitter.area( ) * num_emitters as f32 );
        }
      }

      // Indirect: one BRDF bounce
      let ( wi, pdf ) = mat.sample_direction( ctx.rng, &si );
      let cos = wi.dot( si.normal ).max( 0.0 );
      let incoming = path_nee_trace( ctx, &Ray::new( si.point, wi ), depth + 1 );
      color += f * incoming * ( cos / pdf );

      color
    }
  }
}

/// True when something blocks the segment from `point` along `dir` before
/// `max_distance`. The far end is shortened by a relative margin so the
/// light's own geometry cannot occlude its sample point; the near end is
/// already guarded by the intersection epsilon.
fn occluded( scene : &Scene, point : Vector, dir : Vector, max_distance : f32 ) -> bool {
  let shadow_ray = Ray::new( point, dir );
  scene.intersect( &shadow_ray, max_distance * ( 1.0 - 1e-3 ) ).is_some( )
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::graphics::lights::Light;
  use crate::graphics::primitives::{Plane, Sphere, Triangle};
  use crate::graphics::{Camera, Material, Object};
  use rand::SeedableRng;
  use std::f32::consts::PI;

  fn camera( ) -> Camera {
    Camera::new_perspective( 32, 32, PI / 2.0 ).unwrap( )
  }

  fn trace_once( scene : &Scene, kind : TracerKind, ray : &Ray ) -> Color {
    let config = RenderConfig::default( );
    let mut rng = SmallRng::seed_from_u64( 99 );
    let mut ctx = TraceContext { scene, config: &config, rng: &mut rng };
    kind.trace( &mut ctx, ray, 0 )
  }

  #[test]
  fn whitted_lights_a_facing_sphere( ) {
    let mut scene = Scene::new( camera( ) );
    scene.add( Object::Sphere( Sphere::new(
      Vector::new( 0.0, 0.0, 5.0 ), 0.5, Material::diffuse( Color::from_rgb8( 186, 186, 186 ) ) ) ) );
    scene.add_lights( vec![ Light::point( Vector::new( 0.0, 2.0, 0.0 ), Color::WHITE, 500.0 ) ] );
    scene.precompute( ).unwrap( );

    let hit = trace_once( &scene, TracerKind::Whitted, &Ray::new( Vector::ZERO, Vector::new( 0.0, 0.0, 1.0 ) ) );
    assert!( hit.luminance( ) > 0.0 );

    let miss = trace_once( &scene, TracerKind::Whitted, &Ray::new( Vector::ZERO, Vector::new( 0.0, 0.0, -1.0 ) ) );
    assert_eq!( miss, RenderConfig::default( ).background );
  }

  #[test]
  fn whitted_shadows_an_occluded_point( ) {
    let mut scene = Scene::new( camera( ) );
    // Floor below, light above, and a blocker between them
    scene.add( Object::Plane( Plane::new(
      Vector::new( 0.0, -1.0, 0.0 )
    , Vector::new( 0.0, 0.0, 1.0 )
    , Vector::new( 1.0, 0.0, 0.0 )
    , Material::diffuse( Color::WHITE ) ) ) );
    scene.add( Object::Sphere( Sphere::new(
      Vector::new( 0.0, 2.0, 5.0 ), 1.0, Material::diffuse( Color::WHITE ) ) ) );
    scene.add_lights( vec![ Light::point( Vector::new( 0.0, 5.0, 5.0 ), Color::WHITE, 1000.0 ) ] );
    scene.precompute( ).unwrap( );

    // Straight down under the blocker: shadowed
    let shadowed = trace_once( &scene, TracerKind::Whitted
      , &Ray::new( Vector::new( 0.0, 0.5, 5.0 ), Vector::new( 0.0, -1.0, 0.0 ) ) );
    assert_eq!( shadowed, Color::BLACK );

    // Far to the side: lit
    let lit = trace_once( &scene, TracerKind::Whitted
      , &Ray::new( Vector::new( 8.0, 0.5, 5.0 ), Vector::new( 0.0, -1.0, 0.0 ) ) );
    assert!( lit.luminance( ) > 0.0 );
  }

  #[test]
  fn whitted_mirror_shows_the_reflected_object( ) {
    let mut scene = Scene::new( camera( ) );
    // A mirror ahead and a lit sphere behind the camera
    scene.add( Object::Plane( Plane::new(
      Vector::new( 0.0, 0.0, 10.0 )
    , Vector::new( 0.0, 1.0, 0.0 )
    , Vector::new( 1.0, 0.0, 0.0 )
    , Material::reflective( ) ) ) );
    scene.add( Object::Sphere( Sphere::new(
      Vector::new( 0.0, 0.0, -5.0 ), 1.0, Material::diffuse( Color::WHITE ) ) ) );
    scene.add_lights( vec![ Light::point( Vector::new( 0.0, 3.0, 0.0 ), Color::WHITE, 2000.0 ) ] );
    scene.precompute( ).unwrap( );

    let c = trace_once( &scene, TracerKind::Whitted, &Ray::new( Vector::ZERO, Vector::new( 0.0, 0.0, 1.0 ) ) );
    assert!( c.luminance( ) > 0.0 );
  }

  #[test]
  fn recursion_terminates_between_parallel_mirrors( ) {
    let mut scene = Scene::new( camera( ) );
    scene.add( Object::Plane( Plane::new(
      Vector::new( 0.0, 0.0, 10.0 )
    , Vector::new( 0.0, 1.0, 0.0 )
    , Vector::new( 1.0, 0.0, 0.0 )
    , Material::reflective( ) ) ) );
    scene.add( Object::Plane( Plane::new(
      Vector::new( 0.0, 0.0, -10.0 )
    , Vector::new( 1.0, 0.0, 0.0 )
    , Vector::new( 0.0, 1.0, 0.0 )
    , Material::reflective( ) ) ) );
    scene.precompute( ).unwrap( );

    // Bounces forever geometrically; the depth bound must cut it off
    let c = trace_once( &scene, TracerKind::Whitted, &Ray::new( Vector::ZERO, Vector::new( 0.0, 0.0, 1.0 ) ) );
    assert_eq!( c, Color::BLACK );
  }

  fn emissive_triangle_overhead( ) -> Object {
    // Wound so the normal points downward, radiating at the floor
    Object::Triangle( Triangle::new(
      Vector::new( -1.0, 4.0, 4.0 )
    , Vector::new( 1.0, 4.0, 4.0 )
    , Vector::new( 0.0, 4.0, 6.0 )
    , Material::radiant( Color::WHITE * 20.0 ) ) )
  }

  #[test]
  fn path_tracer_sees_emitters_directly( ) {
    let mut scene = Scene::new( camera( ) );
    scene.add( emissive_triangle_overhead( ) );
    scene.precompute( ).unwrap( );

    let ray = Ray::new( Vector::new( 0.0, 0.0, 5.0 ), Vector::new( 0.0, 1.0, 0.0 ) );
    let c = trace_once( &scene, TracerKind::Path, &ray );
    assert!( ( c.red - 20.0 ).abs( ) < 1e-4 );

    let c_nee = trace_once( &scene, TracerKind::PathNee, &ray );
    assert!( ( c_nee.red - 20.0 ).abs( ) < 1e-4 );
  }

  #[test]
  fn nee_gathers_direct_light_on_diffuse_surfaces( ) {
    let mut scene = Scene::new( camera( ) );
    scene.add( emissive_triangle_overhead( ) );
    scene.add( Object::Plane( Plane::new(
      Vector::new( 0.0, 0.0, 0.0 )
    , Vector::new( 0.0, 0.0, 1.0 )
    , Vector::new( 1.0, 0.0, 0.0 )
    , Material::diffuse( Color::WHITE ) ) ) );
    scene.precompute( ).unwrap( );
    assert_eq!( scene.emitters.len( ), 1 );

    // Average a handful of samples on the floor under the light
    let config = RenderConfig::default( );
    let mut rng = SmallRng::seed_from_u64( 4 );
    let ray = Ray::new( Vector::new( 0.0, 2.0, 5.0 ), Vector::new( 0.0, -1.0, 0.0 ) );

    let mut sum = Color::BLACK;
    let n = 64;
    for _ in 0..n {
      let mut ctx = TraceContext { scene: &scene, config: &config, rng: &mut rng };
      sum += TracerKind::PathNee.trace( &mut ctx, &ray, 0 );
    }
    let mean = sum * ( 1.0 / n as f32 );
    assert!( mean.luminance( ) > 0.0 );
  }
}
