//! Backtrace capture for depth-0 entries.
//!
//! Symbolized backtraces depend on the target, so capture sits behind
//! [`FrameSource`]. Without the `backtrace` feature only [`NoFrames`] exists.

/// Produces the frame lines printed under a depth-0 entry.
pub trait FrameSource: Send {
    /// One rendered line per frame, or `None` when capture is unavailable.
    fn capture(&self) -> Option<Vec<String>>;
}

/// Fallback source that never captures.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoFrames;

impl FrameSource for NoFrames {
    fn capture(&self) -> Option<Vec<String>> {
        None
    }
}

/// Symbolized frames from the `backtrace` crate.
#[cfg(feature = "backtrace")]
#[derive(Debug, Clone, Copy)]
pub struct SymbolFrames {
    /// Leading frames belonging to the log engine itself.
    pub skip: usize,
    pub max_depth: usize,
}

#[cfg(feature = "backtrace")]
impl Default for SymbolFrames {
    fn default() -> Self {
        Self {
            skip: 3,
            max_depth: 32,
        }
    }
}

#[cfg(feature = "backtrace")]
impl FrameSource for SymbolFrames {
    fn capture(&self) -> Option<Vec<String>> {
        let bt = backtrace::Backtrace::new();
        let frames: Vec<String> = bt
            .frames()
            .iter()
            .skip(self.skip)
            .take(self.max_depth)
            .map(|frame| match frame.symbols().first() {
                Some(symbol) => {
                    let name = symbol
                        .name()
                        .map_or_else(|| "<unknown>".to_string(), |n| n.to_string());
                    match (symbol.filename(), symbol.lineno()) {
                        (Some(f), Some(l)) => format!("{name} ({}:{l})", f.display()),
                        (Some(f), None) => format!("{name} ({})", f.display()),
                        _ => name,
                    }
                }
                None => format!("{:?}", frame.ip()),
            })
            .collect();
        if frames.is_empty() { None } else { Some(frames) }
    }
}

/// The best available source: symbolized when compiled in and requested.
#[must_use]
pub fn frame_source(enabled: bool) -> Box<dyn FrameSource> {
    #[cfg(feature = "backtrace")]
    if enabled {
        return Box::new(SymbolFrames::default());
    }
    let _ = enabled;
    Box::new(NoFrames)
}
