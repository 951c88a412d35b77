//! File descriptor limit detection for capping the walker pool (Unix).

use log::debug;

/// Descriptors one walker thread may hold at once (open directory handle, lstat, handler I/O).
pub const FDS_PER_WORKER: usize = 4;

/// Fraction of the process FD limit the walk may use.
const FD_LIMIT_FRACTION: f64 = 0.8;

/// Soft limit for open file descriptors, or `None` when unknown or unlimited.
#[cfg(unix)]
pub fn max_open_fds() -> Option<u64> {
    let mut rlim = libc::rlimit {
        rlim_cur: 0,
        rlim_max: 0,
    };
    // SAFETY: getrlimit only writes into the struct we pass.
    if unsafe { libc::getrlimit(libc::RLIMIT_NOFILE, &mut rlim) } != 0 {
        return None;
    }
    let cur = rlim.rlim_cur as u64;
    if rlim.rlim_cur == libc::RLIM_INFINITY || cur > i64::MAX as u64 {
        return None;
    }
    Some(cur)
}

#[cfg(not(unix))]
pub fn max_open_fds() -> Option<u64> {
    None
}

/// Clamp `requested` workers so the walk stays under ~80% of the FD limit. Always at least 1.
pub fn cap_workers_by_fd_limit(requested: usize) -> usize {
    let Some(limit) = max_open_fds() else {
        return requested.max(1);
    };
    let usable = (limit as f64 * FD_LIMIT_FRACTION) as usize;
    let cap = (usable / FDS_PER_WORKER).max(1);
    if cap < requested {
        debug!("Capping walker threads {} -> {} (FD limit {})", requested, cap, limit);
        cap
    } else {
        requested.max(1)
    }
}
