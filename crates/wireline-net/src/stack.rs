//! Process-wide network stack lifecycle.

use std::sync::OnceLock;

use tracing::debug;

/// Handle to the process-wide network stack.
///
/// Some platforms require one-shot startup of the networking subsystem before
/// any socket is created. Every factory function in this crate touches the
/// stack first, so mere use of the library forces that startup; consumers may
/// also hold the returned handle themselves. The resource lives for the rest
/// of the process.
///
/// On the supported POSIX targets startup is a no-op; a port to a platform
/// with explicit subsystem startup (e.g. Winsock) hooks in here.
#[derive(Debug)]
pub struct NetworkStack {
    _private: (),
}

static STACK: OnceLock<NetworkStack> = OnceLock::new();

/// Returns the process-wide stack, initializing it on first use.
pub fn network_stack() -> &'static NetworkStack {
    STACK.get_or_init(|| {
        debug!("network stack initialized");
        NetworkStack { _private: () }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_lookups_yield_the_same_instance() {
        let first = network_stack() as *const NetworkStack;
        let second = network_stack() as *const NetworkStack;
        assert_eq!(first, second);
    }
}
