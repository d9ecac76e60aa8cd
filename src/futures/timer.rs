use std::pin::Pin;
use std::time::Duration;

#[cfg(feature = "tokio-hrtime")]
pub use tokio_hrtime::{Sleep, sleep};

#[cfg(all(feature = "async", not(feature = "tokio-hrtime")))]
pub use tokio::time::{Sleep, sleep};

/// Arms `delay` to fire `after` from now, reusing the existing timer when it can be reset.
pub(super) fn rearm(delay: &mut Option<Pin<Box<Sleep>>>, after: Duration) {
    #[cfg(not(feature = "tokio-hrtime"))]
    {
        if let Some(sleep) = delay.as_mut() {
            sleep.as_mut().reset(tokio::time::Instant::now() + after);
            return;
        }
    }
    *delay = Some(Box::pin(sleep(after)));
}
