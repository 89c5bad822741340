// Configuration (TOML + environment)
pub mod config;

// Temporal correlation of combat log events with item updates
pub mod correlate;

// Feed-driving engine and run metrics
pub mod engine;

// Entity model and lifecycle flags
pub mod entity;

// Combat log model, filter and recorder
pub mod event;

// Captured replay feed reader
pub mod feed;

// Run report persistence
pub mod report;

// Per-identity attribute snapshots
pub mod snapshot;

// Live-entity table, handle resolution and identity indices
pub mod state;

// String tables
pub mod strings;
