#![no_std]
#![doc = include_str!("../README.md")]

// Modules
mod board;
mod resources;
pub mod usb;

// Flatten
pub use board::*;
pub use resources::*;
