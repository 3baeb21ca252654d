pub mod lights;
pub mod primitives;
pub mod ray;

mod aabb;
mod bvh;
mod bvh4;
mod camera;
mod color;
mod material;
mod mesh;
mod object;
mod scene;
mod texture;

pub use aabb::{AABB, AABBx4};
pub use bvh::{closest_intersection_linear, LinearNode, SplitPolicy, TriangleBVH, BVH};
pub use bvh4::{Node4, TriangleBVH4};
pub use camera::{Camera, Projection};
pub use color::Color;
pub use material::{Material, NormalFn};
pub use mesh::{Face, TriangleInMesh, TriangleMesh};
pub use object::{ComplexObject, Object, SharedObject};
pub use scene::Scene;
pub use texture::{Image, Texture};
