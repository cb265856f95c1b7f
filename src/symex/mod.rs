pub mod adapter;
pub mod frame;
pub mod state;

pub use frame::Frame;
pub use state::{State, StepResult};
