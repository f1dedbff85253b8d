//! Command implementations for the flightfeed CLI

pub mod convert;
pub mod serve;
