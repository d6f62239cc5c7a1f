pub mod adjustments;
pub mod fill;
pub mod filters;
pub mod skin_layout;
pub mod stroke;
pub mod transform;
