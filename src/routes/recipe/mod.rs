mod handler;
mod model;

pub use handler::suggest_recipes;
