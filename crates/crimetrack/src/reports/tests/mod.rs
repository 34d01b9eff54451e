mod admission;
mod common;
