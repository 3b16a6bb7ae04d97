// Render-time switches recognized by the decoder and the renderers.

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct RenderOptions {
    /// Show timestamp-compatible columns as their raw integer instead of date text.
    pub raw_timestamps: bool,
    /// CSV only: flush the sink after every record.
    pub flush_after_line: bool,
}

impl RenderOptions {
    pub fn with_raw_timestamps(mut self, raw_timestamps: bool) -> Self {
        self.raw_timestamps = raw_timestamps;
        self
    }

    pub fn with_flush_after_line(mut self, flush_after_line: bool) -> Self {
        self.flush_after_line = flush_after_line;
        self
    }
}
