pub mod crew;
pub mod predict;
pub mod scheduler;
pub mod tle;
pub mod tracker;
pub mod web;
