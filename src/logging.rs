//! Conditional logging macros for library-level tracing.
//!
//! With the `logging` feature the macros are `tracing`'s own; without it
//! they expand to nothing, so the storage hot paths carry no logging cost.
//!
//! ```rust,ignore
//! use crate::logging::{debug, trace};
//!
//! debug!(table = %name, rows = count, "overwrote table");
//! trace!(key = key, "upserting row");
//! ```

#[cfg(feature = "logging")]
#[allow(unused_imports)]
pub(crate) use tracing::{debug, error, info, trace, warn};

#[cfg(not(feature = "logging"))]
mod disabled {
    /// Swallows its arguments without evaluating them.
    macro_rules! log_noop {
        ($($arg:tt)*) => {};
    }

    #[allow(unused_imports)]
    pub(crate) use log_noop as noop;
}

#[cfg(not(feature = "logging"))]
#[allow(unused_imports)]
pub(crate) use disabled::{
    noop as debug, noop as error, noop as info, noop as trace, noop as warn,
};
