pub mod config;
pub mod discovery;
pub mod error;
pub mod feedback;
pub mod load;
pub mod load_options;
pub mod notify;
pub mod outcome;
pub mod save;
pub mod state;
pub mod state_manager;
pub mod sync;
pub mod transport;

#[cfg(test)]
mod testing;
