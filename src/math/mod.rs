pub mod bounds;
pub mod plane;
pub mod ray;
