//! ARM float-ABI detection.
//!
//! 32-bit ARM Linux hosts come in soft-float and hard-float flavors whose
//! binaries are not interchangeable, and the raw architecture string does not
//! say which one the running process was built for. When the host reports an
//! `arm*` architecture on Linux, platform identification asks an [`AbiProbe`]
//! to settle it.

use std::process::{Command, Stdio};
use std::time::Duration;

use wait_timeout::ChildExt;

/// Canonical token for the ARM hard-float ABI.
pub const ARMHF: &str = "armhf";

/// ELF attribute emitted by toolchains that pass floats in VFP registers.
const VFP_TAG: &str = "Tag_ABI_VFP_args: VFP registers";

/// Upper bound on the probe subprocess; a wedged `readelf` must not stall
/// library loading.
const PROBE_WAIT: Duration = Duration::from_secs(5);

/// Capability for detecting the ARM float ABI of the running process.
///
/// Implementations are strictly best-effort: `None` means "could not tell",
/// never an error, and callers fall back to the alias table.
pub trait AbiProbe: Send + Sync {
    /// Returns the canonical ABI token (currently only [`ARMHF`]) when one
    /// can be positively identified, `None` otherwise.
    fn arm_abi(&self) -> Option<String>;
}

/// Probe that never detects anything. Useful in tests and on hosts where
/// spawning subprocesses is unwelcome.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProbe;

impl AbiProbe for NoProbe {
    fn arm_abi(&self) -> Option<String> {
        None
    }
}

/// Default probe: runs `readelf -A` over the current executable and looks
/// for the VFP calling-convention attribute.
///
/// Every failure mode degrades to `None`: `readelf` absent, no current-exe
/// path, spawn failure, timeout, or simply no tag.
#[derive(Debug, Clone, Copy, Default)]
pub struct ShellAbiProbe;

impl AbiProbe for ShellAbiProbe {
    fn arm_abi(&self) -> Option<String> {
        which::which("readelf").ok()?;
        let exe = std::env::current_exe().ok()?;
        let mut child = Command::new("/bin/sh")
            .arg("-c")
            .arg(format!("readelf -A '{}' | grep -q '{VFP_TAG}'", exe.display()))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .ok()?;
        match child.wait_timeout(PROBE_WAIT) {
            Ok(Some(status)) if status.success() => {
                tracing::debug!("abi probe: {} targets {ARMHF}", exe.display());
                Some(ARMHF.to_string())
            }
            Ok(Some(_)) => None,
            Ok(None) => {
                tracing::debug!("abi probe timed out after {PROBE_WAIT:?}");
                let _ = child.kill();
                let _ = child.wait();
                None
            }
            Err(err) => {
                tracing::debug!("abi probe wait failed: {err}");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_probe_detects_nothing() {
        assert_eq!(NoProbe.arm_abi(), None);
    }

    #[test]
    fn shell_probe_is_best_effort() {
        // On the machines that run this suite the answer is almost always
        // None; what matters is that the probe returns instead of panicking
        // or hanging, whatever tools the host has.
        let result = ShellAbiProbe.arm_abi();
        if let Some(abi) = result {
            assert_eq!(abi, ARMHF);
        }
    }
}
