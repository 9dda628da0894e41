//! Decode counters, one set per decoder.

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DecodeCounters {
    pub frames_decoded: u64,
    pub garbage_bytes: u64,
    pub unterminated_frames: u64,
    pub reserved_frames: u64,
    pub unknown_text: u64,
    pub bad_configurations: u64,
    pub sweeps_built: u64,
    pub sweeps_discarded: u64,
    /// Sweeps whose frequency plan mapped several points onto one frequency.
    pub sweeps_collapsed: u64,
}

impl DecodeCounters {
    pub fn inc_frames_decoded(&mut self) {
        self.frames_decoded = self.frames_decoded.saturating_add(1);
    }

    pub fn add_garbage(&mut self, bytes: usize) {
        self.garbage_bytes = self.garbage_bytes.saturating_add(bytes as u64);
    }

    pub fn inc_unterminated(&mut self) {
        self.unterminated_frames = self.unterminated_frames.saturating_add(1);
    }

    pub fn inc_reserved(&mut self) {
        self.reserved_frames = self.reserved_frames.saturating_add(1);
    }

    pub fn inc_unknown_text(&mut self) {
        self.unknown_text = self.unknown_text.saturating_add(1);
    }

    pub fn inc_bad_configuration(&mut self) {
        self.bad_configurations = self.bad_configurations.saturating_add(1);
    }

    pub fn inc_sweeps_built(&mut self) {
        self.sweeps_built = self.sweeps_built.saturating_add(1);
    }

    pub fn inc_sweeps_discarded(&mut self) {
        self.sweeps_discarded = self.sweeps_discarded.saturating_add(1);
    }

    pub fn inc_sweeps_collapsed(&mut self) {
        self.sweeps_collapsed = self.sweeps_collapsed.saturating_add(1);
    }

    /// Share of received sweeps that could not be built, if any arrived.
    pub fn sweep_discard_ratio(&self) -> Option<f64> {
        let total = self.sweeps_built + self.sweeps_discarded;
        if total > 0 {
            Some(self.sweeps_discarded as f64 / total as f64)
        } else {
            None
        }
    }
}
