pub mod background;
pub mod consts;
pub mod error;
pub mod frame;
pub mod job;
pub mod stack;
pub mod window;
