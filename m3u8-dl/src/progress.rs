use colored::Colorize;
use std::{
    io::{self, Write},
    sync::Mutex,
    time::Instant,
};

/// Single line progress of downloaded segments, drawn on stderr.
pub struct Progress {
    enabled: bool,
    total: usize,
    state: Mutex<State>,
}

struct State {
    bytes: usize,
    segments: usize,
    started: Instant,
}

impl Progress {
    pub fn new(total: usize, enabled: bool) -> Self {
        if enabled {
            let mut handle = io::stderr().lock();
            let _ = write!(handle, "\x1B[?25l");
            let _ = handle.flush();
        }

        Self {
            enabled,
            total,
            state: Mutex::new(State {
                bytes: 0,
                segments: 0,
                started: Instant::now(),
            }),
        }
    }

    /// Record one more finished segment of `bytes` size.
    pub fn update(&self, bytes: usize) {
        let mut state = self.state.lock().unwrap_or_else(|x| x.into_inner());
        state.bytes += bytes;
        state.segments += 1;

        if !self.enabled {
            return;
        }

        let elapsed_secs = state.started.elapsed().as_secs_f64();
        let speed = if elapsed_secs > 0.0 {
            state.bytes as f64 / elapsed_secs
        } else {
            0.0
        };

        let remaining = self.total.saturating_sub(state.segments);
        let eta_seconds = if state.segments > 0 {
            (elapsed_secs / state.segments as f64 * remaining as f64) as usize
        } else {
            0
        };

        let percent = if self.total > 0 {
            state.segments * 100 / self.total
        } else {
            100
        };

        let mut handle = io::stderr().lock();
        let _ = write!(
            handle,
            "\r\x1B[2K{}{}/{} {} {} DL:{}/s ETA:{}{}",
            "[".magenta(),
            state.segments,
            self.total,
            ByteSize(state.bytes),
            format!("({}%)", percent).cyan(),
            ByteSize(speed as usize).to_string().green(),
            Eta(eta_seconds).to_string().yellow(),
            "]".magenta(),
        );
        let _ = handle.flush();
    }

    pub fn bytes(&self) -> usize {
        self.state.lock().unwrap_or_else(|x| x.into_inner()).bytes
    }

    pub fn segments(&self) -> usize {
        self.state.lock().unwrap_or_else(|x| x.into_inner()).segments
    }
}

impl Drop for Progress {
    fn drop(&mut self) {
        if self.enabled {
            let mut handle = io::stderr().lock();
            let _ = writeln!(handle, "\x1B[?25h");
            let _ = handle.flush();
        }
    }
}

pub(crate) struct ByteSize(pub(crate) usize);

impl std::fmt::Display for ByteSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        const KIB: f64 = 1024.0;
        const MIB: f64 = KIB * 1024.0;
        const GIB: f64 = MIB * 1024.0;

        let bytes = self.0 as f64;

        if bytes >= GIB {
            write!(f, "{:.1}GiB", bytes / GIB)
        } else if bytes >= MIB {
            write!(f, "{:.1}MiB", bytes / MIB)
        } else if bytes >= KIB {
            write!(f, "{:.1}KiB", bytes / KIB)
        } else {
            write!(f, "{}B", self.0)
        }
    }
}

struct Eta(usize);

impl std::fmt::Display for Eta {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let hours = self.0 / 3600;
        let minutes = (self.0 % 3600) / 60;
        let seconds = self.0 % 60;

        if hours > 0 {
            write!(f, "{}h{}m{}s", hours, minutes, seconds)
        } else if minutes > 0 {
            write!(f, "{}m{}s", minutes, seconds)
        } else {
            write!(f, "{}s", seconds)
        }
    }
}
