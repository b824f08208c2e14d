pub mod postgres;

pub use postgres::PostgresMoodStore;
