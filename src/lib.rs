//! An offline physically-based ray tracer.
//!
//! A scene of geometric primitives, materials and lights is built
//! incrementally, finalized with [`Scene::precompute`] (which builds the
//! surface-area-heuristic BVH and the emitter list), and handed to
//! [`render`], which traces camera rays across a pool of worker threads
//! and accumulates radiance into a [`Film`].
//!
//! Three integrators are available (see [`TracerKind`]): a Whitted-style
//! ray tracer, a uniform path tracer, and a path tracer with next-event
//! estimation. Triangle meshes can additionally be queried through a
//! 4-ary SIMD-packed BVH.
//!
//! ```no_run
//! use helios::{render, Camera, Color, Material, Object, RenderConfig,
//!              RenderParams, Scene, Sphere, TracerKind, Vector};
//!
//! # fn main( ) -> Result< (), helios::BuildError > {
//! let camera = Camera::new_perspective( 640, 480, std::f32::consts::FRAC_PI_2 )?;
//! let mut scene = Scene::new( camera );
//! scene.add( Object::Sphere( Sphere::new(
//!   Vector::new( 0.0, 0.0, 5.0 ), 1.0, Material::diffuse( Color::WHITE ) ) ) );
//! scene.precompute( )?;
//!
//! let film = render( &RenderParams {
//!   scene:         &scene,
//!   num_workers:   0,
//!   num_samples:   16,
//!   anti_aliasing: true,
//!   tracer:        TracerKind::Whitted,
//!   config:        RenderConfig::default( )
//! } );
//! let rgba = film.to_image( );
//! # let _ = rgba;
//! # Ok( () )
//! # }
//! ```

mod error;
mod film;
pub mod graphics;
pub mod math;
mod render;
pub mod simd;
mod tracer;

pub use error::BuildError;
pub use film::{Film, ToneMap};
pub use graphics::lights::{Light, LightSegment};
pub use graphics::primitives::{Cuboid, Plane, Quadrilateral, Sphere, Triangle};
pub use graphics::ray::{Ray, Surface, SurfaceInteraction};
pub use graphics::{
  Camera, Color, ComplexObject, Face, Image, Material, Object, Projection, Scene, SharedObject,
  SplitPolicy, Texture, TriangleBVH, TriangleBVH4, TriangleInMesh, TriangleMesh, AABB, AABBx4,
  BVH,
};
pub use math::{Axis, Matrix4x4, Transform, Vector, ERROR_MARGIN, MAX_RAY_DISTANCE};
pub use render::{render, RenderParams};
pub use tracer::{RenderConfig, TraceContext, TracerKind};
