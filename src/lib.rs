pub mod nav;

// ============================================================================
// Profiling Macros
// ============================================================================

/// Log a message every 100 simulation ticks when the perf_stats feature is enabled.
///
/// Without the feature this expands to nothing and the arguments are never
/// evaluated, so it is safe to pass expensive expressions.
///
/// # Example
/// ```ignore
/// profile_log!(tick, "[PATHFINDING] {} searches pending", coordinator.pending_count());
/// ```
#[macro_export]
#[cfg(feature = "perf_stats")]
macro_rules! profile_log {
    ($tick:expr, $($arg:tt)*) => {
        if $tick.0 % 100 == 0 {
            bevy::prelude::info!($($arg)*);
        }
    };
}

#[macro_export]
#[cfg(not(feature = "perf_stats"))]
macro_rules! profile_log {
    ($tick:expr, $($arg:tt)*) => {};
}
