//! Standalone exercises built on the runtime primitives.

pub mod sum_race;
