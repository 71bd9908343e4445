//! Wall clock and timer backed by the browser event loop.

use std::time::Duration;

use async_trait::async_trait;
use js_sys::Date;

use crate::core::clock::Clock;

/// [`Clock`] using `Date.now()` and `setTimeout`.
#[derive(Clone, Copy, Debug, Default)]
pub struct BrowserClock;

#[async_trait(?Send)]
impl Clock for BrowserClock {
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn now_ms(&self) -> u64 {
        Date::now().max(0.0) as u64
    }

    async fn sleep(&self, duration: Duration) {
        gloo_timers::future::sleep(duration).await;
    }
}
