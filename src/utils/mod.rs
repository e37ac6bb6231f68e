// ============================================================================
// Utilities Module
// Clock support shared by the domain and engine layers
// ============================================================================

mod time;

pub use time::monotonic_ns;
