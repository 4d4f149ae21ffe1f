pub mod javascript;
pub mod wait;

pub use wait::poll_until;
