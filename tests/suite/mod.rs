mod config;
mod play;
mod reconcile;
mod solve;
