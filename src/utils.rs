//! Process-level helpers for driver programs.

use std::sync::atomic::{AtomicI32, Ordering};
use std::time::Duration;

/// Debugger release flag for [`wait_for_debugger`].
///
/// The spinning rank re-reads this once a second; set it to a nonzero
/// value from an attached debugger to release the process.
pub static DEBUG_RELEASE: AtomicI32 = AtomicI32::new(0);

/// Named attach point for debugging one rank of a parallel run.
///
/// When the `UME_DEBUG_RANK` environment variable holds this rank's id,
/// the call logs the process id and spin-waits until a debugger attaches
/// and flips [`DEBUG_RELEASE`]. All other ranks (and runs without the
/// variable) return immediately.
pub fn wait_for_debugger(mype: i32) {
    let Ok(val) = std::env::var("UME_DEBUG_RANK") else {
        return;
    };
    let Ok(rank) = val.trim().parse::<i32>() else {
        tracing::warn!(value = %val, "ignoring unparsable UME_DEBUG_RANK");
        return;
    };
    if rank != mype {
        return;
    }
    tracing::warn!(
        pid = std::process::id(),
        rank = mype,
        "waiting for debugger; set ume::utils::DEBUG_RELEASE nonzero to continue"
    );
    while DEBUG_RELEASE.load(Ordering::SeqCst) == 0 {
        std::thread::sleep(Duration::from_secs(1));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn returns_immediately_without_the_env_var() {
        std::env::remove_var("UME_DEBUG_RANK");
        wait_for_debugger(0);
    }

    #[test]
    fn returns_immediately_for_other_ranks() {
        std::env::set_var("UME_DEBUG_RANK", "5");
        wait_for_debugger(3);
        std::env::remove_var("UME_DEBUG_RANK");
    }
}
