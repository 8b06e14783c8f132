// Derived-field reconciliation
//
// Brings one logical variable to the same meaning across netlink, sk_ops and
// iperf3:
// - unit reconciliation: segment-count windows are multiplied by the
//   per-sample segment size to yield bytes
// - cumulative reconstruction: iperf3 per-interval byte deltas become a
//   running total like the kernel's cumulative counters
// - name reconciliation: a case-insensitive table maps logical names to
//   iperf3 keys, falling back to the lower-cased name
// - scale application: one divisor per variable, applied to every source
//
// A variable that one source cannot provide is skipped with a warning rather
// than aborting the comparison.

mod compute;
mod descriptor;

pub use compute::{
    running_total, segment_scaled, DerivedFieldComputer, PlotSeries, Reconciled,
    UnresolvedVariable, VariableSeries,
};
pub use descriptor::{Derivation, FieldDescriptor, NameMap};
