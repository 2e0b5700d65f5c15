//! Realtime core tests over in-memory collaborators.

mod group_tests;
mod history_tests;
mod presence_tests;
mod routing_tests;
