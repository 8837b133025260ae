mod handler;
mod model;

pub use handler::{image_status, run_image_worker, start_image_generation};
