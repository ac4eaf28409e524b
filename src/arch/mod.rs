//! # Architecture Abstraction Layer
//!
//! Hardware boundary of the task runtime. Only the Cortex-M4 port exists.

pub mod cortex_m4;
