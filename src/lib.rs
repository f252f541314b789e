pub mod camera;
pub mod game;
pub mod level;
pub mod links;
pub mod player;

// Re-export commonly used items
pub use game::GamePlugin;
