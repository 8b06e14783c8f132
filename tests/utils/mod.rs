// Shared capture fixtures for integration tests
#![allow(dead_code)]

use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Two ongoing firefly records bracketed by start/end lifecycle records
pub const FIREFLIES: &str = r#"{"flow-lifecycle":{"state":"start","start-time":"2024-11-02T16:07:00.9+00:00"}}
{"flow-lifecycle":{"state":"ongoing","current-time":"2024-11-02T16:07:01.12+00:00"},"netlink":{"tcpInfo":{"rtt":1200,"rttVar":300,"pMtu":1500,"sndCwnd":10,"sndMss":1460,"bytesSent":1000}},"skOps":{"tcpInfo":{"rtt":1190,"rttVar":290,"pMtu":1500,"sndCwnd":10,"sndMss":1460,"bytesSent":1000}}}
{"flow-lifecycle":{"state":"ongoing","current-time":"2024-11-02T16:07:02.120431+00:00"},"netlink":{"tcpInfo":{"rtt":1300,"rttVar":320,"pMtu":1500,"sndCwnd":20,"sndMss":1460,"bytesSent":3500}},"skOps":{"tcpInfo":{"rtt":1310,"rttVar":330,"pMtu":1500,"sndCwnd":20,"sndMss":1460,"bytesSent":3500}}}
{"flow-lifecycle":{"state":"end","end-time":"2024-11-02T16:07:03.5+00:00"}}
"#;

/// iperf3 report whose first interval ends before the first firefly
pub const IPERF3: &str = r#"{
  "start": {"timestamp": {"time": "Sat, 02 Nov 2024 16:07:00 GMT"}},
  "intervals": [
    {"streams": [{"seconds": 1.0, "bytes": 1000, "rtt": 1250, "rttvar": 310, "pmtu": 1500, "snd_cwnd": 14600}]},
    {"streams": [{"seconds": 1.0, "bytes": 2500, "rtt": 1280, "rttvar": 305, "pmtu": 1500, "snd_cwnd": 29200}]}
  ]
}"#;

pub const VARIABLES: [&str; 5] = ["rtt", "rttVar", "sndCwnd", "pMtu", "bytesSent"];

/// Capture files written to a temporary directory
pub struct Capture {
    dir: TempDir,
}

impl Capture {
    pub fn new(fireflies: &str, iperf3: &str) -> Self {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("fireflies.jsonl"), fireflies).unwrap();
        std::fs::write(dir.path().join("iperf3.json"), iperf3).unwrap();
        Self { dir }
    }

    pub fn standard() -> Self {
        Self::new(FIREFLIES, IPERF3)
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    pub fn write(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.path(name);
        std::fs::write(&path, contents).unwrap();
        path
    }

    /// Output prefix inside a not-yet-existing subdirectory
    pub fn prefix(&self, name: &str) -> String {
        format!("{}/plots/{}", self.dir.path().display(), name)
    }
}
