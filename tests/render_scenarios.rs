// End-to-end scenarios exercised through the public API only

// External imports
use std::f32::consts::PI;
use std::sync::Arc;
// Crate imports
use helios::{
  render, Camera, Color, ComplexObject, Cuboid, Light, Material, Object, Ray, RenderConfig,
  RenderParams, Scene, SharedObject, Sphere, TracerKind, Transform, Vector, AABB,
  MAX_RAY_DISTANCE,
};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

/// A sphere under a point light: the image center shows a bright disk, the
/// corners stay background
#[test]
fn single_sphere_whitted( ) {
  let mut camera = Camera::new_perspective( 101, 101, PI / 2.0 ).unwrap( );
  camera.look_at(
      Vector::new( 0.0, 0.0, 0.0 )
    , Vector::new( 0.0, 0.0, 1.0 )
    , Vector::new( 0.0, 1.0, 0.0 )
    ).unwrap( );

  let mut scene = Scene::new( camera );
  scene.add( Object::Sphere( Sphere::new(
    Vector::new( 0.0, 0.0, 5.0 ), 0.5, Material::diffuse( Color::from_rgb8( 186, 186, 186 ) ) ) ) );
  scene.add_lights( vec![ Light::point( Vector::new( 0.0, 2.0, 0.0 ), Color::WHITE, 500.0 ) ] );
  scene.precompute( ).unwrap( );

  let film = render( &RenderParams {
    scene:         &scene,
    num_workers:   4,
    num_samples:   1,
    anti_aliasing: false,
    tracer:        TracerKind::Whitted,
    config:        RenderConfig::default( )
  } );

  let center = film.pixel( 50, 50 );
  assert!( center.luminance( ) > 0.0, "center pixel is dark: {:?}", center );
  // The light is white and the sphere gray, so no channel dominates
  assert!( ( center.red - center.green ).abs( ) < 1e-4 );
  assert!( ( center.green - center.blue ).abs( ) < 1e-4 );

  for ( x, y ) in [ (0, 0), (100, 0), (0, 100), (100, 100) ] {
    assert_eq!( film.pixel( x, y ), RenderConfig::default( ).background );
  }
}

#[test]
fn empty_scene_is_all_background( ) {
  let mut scene = Scene::new( Camera::new_perspective( 16, 16, PI / 2.0 ).unwrap( ) );
  scene.precompute( ).unwrap( );

  let config = RenderConfig {
    background: Color::from_rgb8( 100, 100, 100 ),
    ..RenderConfig::default( )
  };
  let film = render( &RenderParams {
    scene:         &scene,
    num_workers:   2,
    num_samples:   2,
    anti_aliasing: true,
    tracer:        TracerKind::Path,
    config:        config.clone( )
  } );

  for y in 0..16 {
    for x in 0..16 {
      assert_eq!( film.pixel( x, y ), config.background );
    }
  }
}

fn unit_cube_prototype( ) -> Arc< Object > {
  let cuboid = Cuboid::new(
    AABB::new( Vector::new( -0.5, -0.5, -0.5 ), Vector::new( 0.5, 0.5, 0.5 ) )
  , Material::diffuse( Color::WHITE ) );
  let triangles : Vec< Object > = cuboid.tesselate( ).into_iter( ).map( Object::Triangle ).collect( );
  Arc::new( Object::Complex( ComplexObject::new( triangles ).unwrap( ) ) )
}

fn random_offsets( n : usize ) -> Vec< Vector > {
  let mut rng = SmallRng::seed_from_u64( 2024 );
  ( 0..n )
    .map( |_| Vector::new(
        rng.gen_range( -20.0..20.0 )
      , rng.gen_range( -20.0..20.0 )
      , rng.gen_range( 5.0..45.0 ) ) )
    .collect( )
}

/// 100 instances of one cube prototype must intersect exactly like 100
/// independently tesselated cubes
#[test]
fn instanced_cubes_match_flat_scene( ) {
  let offsets = random_offsets( 100 );

  let prototype = unit_cube_prototype( );
  let mut instanced = Scene::new( Camera::new_perspective( 32, 32, PI / 2.0 ).unwrap( ) );
  for o in &offsets {
    instanced.add( Object::Shared( SharedObject::new(
      Arc::clone( &prototype )
    , Transform::translate( *o )
    ).unwrap( ) ) );
  }
  instanced.precompute( ).unwrap( );

  let mut flat = Scene::new( Camera::new_perspective( 32, 32, PI / 2.0 ).unwrap( ) );
  for o in &offsets {
    let cuboid = Cuboid::new(
      AABB::new( *o - Vector::new( 0.5, 0.5, 0.5 ), *o + Vector::new( 0.5, 0.5, 0.5 ) )
    , Material::diffuse( Color::WHITE ) );
    flat.add_all( cuboid.tesselate( ).into_iter( ).map( Object::Triangle ) );
  }
  flat.precompute( ).unwrap( );

  let mut rng = SmallRng::seed_from_u64( 7 );
  for _ in 0..500 {
    let dir = Vector::new(
      rng.gen_range( -0.5..0.5 )
    , rng.gen_range( -0.5..0.5 )
    , 1.0 );
    let ray = Ray::new( Vector::ZERO, dir );

    let a = instanced.intersect( &ray, MAX_RAY_DISTANCE ).map( |si| si.distance );
    let b = flat.intersect( &ray, MAX_RAY_DISTANCE ).map( |si| si.distance );

    match ( a, b ) {
      ( Some( da ), Some( db ) ) => assert!( ( da - db ).abs( ) < 1e-2, "{} vs {}", da, db ),
      ( None, None ) => { },
      ( a, b ) => panic!( "instanced hit: {:?}, flat hit: {:?}", a, b )
    }
  }
}

/// The instanced scene also renders: a smoke test that instancing survives
/// the whole pipeline
#[test]
fn instanced_scene_renders_with_whitted( ) {
  let offsets = random_offsets( 100 );
  let prototype = unit_cube_prototype( );

  let mut camera = Camera::new_perspective( 48, 48, PI / 2.0 ).unwrap( );
  camera.look_at(
      Vector::new( 0.0, 0.0, -5.0 )
    , Vector::new( 0.0, 0.0, 1.0 )
    , Vector::new( 0.0, 1.0, 0.0 )
    ).unwrap( );

  let mut scene = Scene::new( camera );
  for o in &offsets {
    scene.add( Object::Shared( SharedObject::new(
      Arc::clone( &prototype )
    , Transform::translate( *o )
    ).unwrap( ) ) );
  }
  scene.add_lights( vec![ Light::point( Vector::new( 0.0, 30.0, -10.0 ), Color::WHITE, 100000.0 ) ] );
  scene.precompute( ).unwrap( );

  let film = render( &RenderParams {
    scene:         &scene,
    num_workers:   4,
    num_samples:   1,
    anti_aliasing: false,
    tracer:        TracerKind::Whitted,
    config:        RenderConfig::default( )
  } );

  let mut lit = 0;
  for y in 0..48 {
    for x in 0..48 {
      if film.pixel( x, y ).luminance( ) > 0.0 {
        lit += 1;
      }
    }
  }
  assert!( lit > 0, "no cube visible in the instanced render" );
}

/// Color conversion round trip through the film
#[test]
fn color_round_trip( ) {
  let c = Color::from_rgb8( 255, 128, 0 );
  assert_eq!( ( c.r( ), c.g( ), c.b( ) ), ( 255, 128, 0 ) );

  let linear = Color::new( 1.0, 0.5, 0.0 );
  assert_eq!( ( linear.r( ), linear.g( ), linear.b( ) ), ( 255, 127, 0 ) );
}
