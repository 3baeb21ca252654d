// External imports
use crossbeam::channel;
use crossbeam::thread;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use std::time::Instant;
// Local imports
use crate::film::Film;
use crate::graphics::{Color, Scene};
use crate::tracer::{RenderConfig, TraceContext, TracerKind};

// The render driver: fans pixel work out over a pool of worker threads.
//
// The scene (including its BVH and vertex buffers) is read-only during the
// render, every worker owns its RNG, and each pixel is written by exactly
// one worker. No locks anywhere on the hot path. Closing the work channel
// cancels cleanly: workers drain what is in flight and exit, and the film
// keeps its zero-initialized pixels for anything unrendered.

/// The inputs of a render
pub struct RenderParams< 'a > {
  pub scene         : &'a Scene,
  /// Worker thread count; 0 means one per logical CPU
  pub num_workers   : usize,
  /// Radiance samples per pixel
  pub num_samples   : usize,
  /// Jitter subpixel positions beyond the first, centered sample
  pub anti_aliasing : bool,
  pub tracer        : TracerKind,
  pub config        : RenderConfig
}

/// Renders the scene to a film
pub fn render( params : &RenderParams ) -> Film {
  let width = params.scene.camera.width;
  let height = params.scene.camera.height;
  let num_workers =
    if params.num_workers == 0 {
      num_cpus::get( )
    } else {
      params.num_workers
    };
  let num_samples = params.num_samples.max( 1 );

  log::info!(
    "render start: {}x{} pixels, {} workers, {} samples/pixel, {:?} tracer"
  , width, height, num_workers, num_samples, params.tracer );
  let start = Instant::now( );

  let mut film = Film::new( width, height );

  let ( work_tx, work_rx ) = channel::bounded::< (u32, u32) >( num_workers * 4 );
  let ( result_tx, result_rx ) = channel::bounded::< (u32, u32, Color) >( num_workers * 4 );

  let scope_result = thread::scope( |s| {
    for _ in 0..num_workers {
      let work_rx = work_rx.clone( );
      let result_tx = result_tx.clone( );
      let scene = params.scene;
      let config = &params.config;
      let tracer = params.tracer;
      let anti_aliasing = params.anti_aliasing;

      s.spawn( move |_| {
        for ( x, y ) in work_rx.iter( ) {
          // Each worker owns its RNG; the stream is derived from the
          // master seed and the pixel, so a render does not depend on
          // which worker picked the pixel up
          let mut rng = SmallRng::seed_from_u64(
            config.seed.wrapping_add(
              ( y as u64 * width as u64 + x as u64 + 1 ).wrapping_mul( 0x9E37_79B9_7F4A_7C15 ) ) );

          let mut acc = Color::BLACK;
          for sample in 0..num_samples {
            // The first sample always goes through the pixel center, so a
            // 1-sample render is noise-free
            let ( dx, dy ) =
              if sample == 0 || !anti_aliasing {
                ( 0.5, 0.5 )
              } else {
                ( rng.gen::< f32 >( ), rng.gen::< f32 >( ) )
              };
            let ray = scene.camera.pixel_ray( x as f32 + dx, y as f32 + dy );

            let mut ctx = TraceContext { scene, config, rng: &mut rng };
            acc += tracer.trace( &mut ctx, &ray, 0 );
          }

          if result_tx.send( ( x, y, acc * ( 1.0 / num_samples as f32 ) ) ).is_err( ) {
            return;
          }
        }
      } );
    }
    // Workers hold their own clones
    drop( result_tx );

    s.spawn( move |_| {
      for y in 0..height {
        for x in 0..width {
          if work_tx.send( ( x, y ) ).is_err( ) {
            return;
          }
        }
      }
      // Dropping the sender closes the channel; workers exit after their
      // current pixel
    } );

    // Drain one result per pixel. A closed channel means the workers are
    // gone; the film then keeps black for whatever was not rendered.
    let total = ( width as usize ) * ( height as usize );
    for _ in 0..total {
      match result_rx.recv( ) {
        Ok( ( x, y, color ) ) => film.set( x, y, color ),
        Err( _ ) => break
      }
    }
  } );

  if let Err( e ) = scope_result {
    std::panic::resume_unwind( e );
  }

  log::info!( "render done in {:.1?}", start.elapsed( ) );
  film
}
