pub mod classify;
pub mod conquer;
pub mod ctx;
pub mod data;
pub mod elab;
pub mod pat;
pub mod stmt;
pub mod terck;
