//! tcpinfo-xval - cross-validation of TCP connection measurements
//!
//! Reconciles three observers of one TCP connection (the kernel socket
//! statistics exported over netlink, an sk_ops eBPF probe and the iperf3
//! traffic generator) onto a shared relative time axis, brings every
//! variable to the same unit and meaning, and renders one comparison chart
//! per variable.

pub mod align;
pub mod chart;
pub mod cli;
pub mod config;
pub mod csv_output;
pub mod derive;
pub mod error;
pub mod json_output;
pub mod pipeline;
pub mod record;
pub mod source;
pub mod timestamp;
