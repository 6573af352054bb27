pub mod prelude;
pub mod error;
pub mod mesh;
pub mod stl;
pub mod glb;
pub mod converter;
