//! The three measurement sources of one TCP connection

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity of a measurement source
///
/// Ordering follows the order in which series are stored, exported and
/// plotted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SourceKind {
    /// Per-socket TCP state read through `sock_diag` netlink
    KernelSocket,
    /// TCP state captured by the `sk_ops` eBPF program
    InKernelProbe,
    /// iperf3 interval reports
    TrafficGenerator,
}

impl SourceKind {
    /// All sources, in storage order
    pub const ALL: [SourceKind; 3] = [
        SourceKind::KernelSocket,
        SourceKind::InKernelProbe,
        SourceKind::TrafficGenerator,
    ];

    /// Series name used in the data model
    pub fn series_name(self) -> &'static str {
        match self {
            SourceKind::KernelSocket => "kernelSocket",
            SourceKind::InKernelProbe => "inKernelProbe",
            SourceKind::TrafficGenerator => "trafficGenerator",
        }
    }

    /// Legend label on charts and in CSV exports
    pub fn label(self) -> &'static str {
        match self {
            SourceKind::KernelSocket => "netlink",
            SourceKind::InKernelProbe => "skops",
            SourceKind::TrafficGenerator => "iperf3",
        }
    }

    /// Whether the source reports TCP metrics natively (segment counts,
    /// cumulative byte counters) rather than as tool-level interval stats
    pub fn is_kernel_native(self) -> bool {
        !matches!(self, SourceKind::TrafficGenerator)
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.series_name())
    }
}
