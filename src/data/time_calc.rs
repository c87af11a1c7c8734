use std::time::Duration;

/// Accumulated per-stage durations over a number of frames.
#[derive(Debug, Default, Clone)]
pub struct TimeCalc {
    frames: usize,
    duration: Vec<Duration>,
}

impl TimeCalc {
    pub fn total(&self) -> Duration {
        self.duration.iter().sum::<Duration>()
    }

    pub fn frames(&self) -> usize {
        self.frames
    }

    /// Average time per frame over all stages, zero before the first frame.
    pub fn avg(&self) -> Duration {
        match self.frames {
            0 => Duration::ZERO,
            n => self.total() / n as u32,
        }
    }

    /// Average time per frame for stage `i`, `None` if the stage was never recorded.
    pub fn avg_i(&self, i: usize) -> Option<Duration> {
        let d = self.duration.get(i)?;
        match self.frames {
            0 => None,
            n => Some(*d / n as u32),
        }
    }

    pub fn ts(&self) -> &[Duration] {
        &self.duration
    }

    pub fn add_or_push(&mut self, i: usize, x: Duration) {
        match self.duration.get_mut(i) {
            Some(elem) => *elem += x,
            None => {
                self.duration.resize(i, Duration::ZERO);
                self.duration.push(x)
            }
        }
    }

    /// Marks the end of one frame.
    pub fn finish_frame(&mut self) {
        self.frames += 1;
    }
}
