//! Headless runtime primitives for page runs.

use anyhow::{bail, Result};

/// Configuration for deterministic headless frame execution.
#[derive(Debug, Clone, Copy)]
pub struct HeadlessRunConfig {
    /// Logical milliseconds between frames.
    pub tick_ms: u64,
    /// Frame budget for a whole scenario.
    pub max_frames: u64,
}

impl Default for HeadlessRunConfig {
    fn default() -> Self {
        Self {
            tick_ms: 16,
            max_frames: 10_000,
        }
    }
}

/// Frame context passed to headless frame callbacks.
#[derive(Debug, Clone, Copy)]
pub struct HeadlessContext {
    pub frame_index: u32,
    pub elapsed_ms: u64,
}

/// Deterministic headless runtime loop.
pub struct HeadlessRuntime;

impl HeadlessRuntime {
    /// Run `frames` frames of `cfg.tick_ms` each.
    pub fn run<F>(cfg: HeadlessRunConfig, frames: u32, mut on_frame: F) -> Result<()>
    where
        F: FnMut(&HeadlessContext),
    {
        if cfg.tick_ms == 0 {
            bail!("headless tick_ms must be > 0");
        }
        if cfg.max_frames == 0 {
            bail!("headless max_frames must be > 0");
        }

        for frame in 0..frames {
            let elapsed_ms = cfg.tick_ms.saturating_mul(frame as u64);
            on_frame(&HeadlessContext {
                frame_index: frame,
                elapsed_ms,
            });
        }

        Ok(())
    }
}

/// Frames needed to cover `wait_ms`, rounding up.
pub fn wait_frames(wait_ms: u64, tick_ms: u64) -> u32 {
    if wait_ms == 0 {
        return 0;
    }
    let tick = tick_ms.max(1);
    let frames = wait_ms.saturating_add(tick.saturating_sub(1)) / tick;
    frames.min(u32::MAX as u64) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_runs_requested_frames() {
        let mut seen = Vec::new();
        HeadlessRuntime::run(HeadlessRunConfig::default(), 3, |ctx| {
            seen.push((ctx.frame_index, ctx.elapsed_ms))
        })
        .unwrap();
        assert_eq!(seen, vec![(0, 0), (1, 16), (2, 32)]);
    }

    #[test]
    fn test_rejects_zero_tick() {
        let cfg = HeadlessRunConfig {
            tick_ms: 0,
            ..Default::default()
        };
        assert!(HeadlessRuntime::run(cfg, 1, |_| {}).is_err());
    }

    #[test]
    fn test_wait_frames_rounds_up() {
        assert_eq!(wait_frames(0, 16), 0);
        assert_eq!(wait_frames(16, 16), 1);
        assert_eq!(wait_frames(17, 16), 2);
        assert_eq!(wait_frames(150, 10), 15);
    }
}
