//! Group of Pictures classification.
//!
//! [`GopAccumulator`] is the single-pass state machine that partitions a
//! video frame sequence into [`Gop`]s: every I-frame that arrives while the
//! current GOP is non-empty seals that GOP and starts a new one. A GOP is
//! closed when its first frame is a key I-frame. [`GopClassifier`] wraps the
//! accumulator as a lazy iterator adapter.
//!
//! # Example
//!
//! ```
//! use mediastruct::gop::{GopClassifier, max_gop_size};
//! use mediastruct::{FrameKind, PictureType, ProbedFrame};
//!
//! let frame = |index, picture| ProbedFrame {
//!     index,
//!     kind: FrameKind::Video(picture),
//!     key_frame: None,
//!     size_bytes: 0,
//!     duration_time: None,
//!     decode_timestamp: None,
//!     byte_offset: None,
//! };
//! let frames = vec![
//!     frame(0, PictureType::I { is_key: true }),
//!     frame(1, PictureType::P),
//!     frame(2, PictureType::I { is_key: false }),
//! ];
//!
//! let gops: Vec<_> = GopClassifier::new(frames.into_iter()).collect();
//! assert_eq!(gops.len(), 2);
//! assert!(gops[0].is_closed());
//! assert_eq!(gops[1].pattern(), "i");
//! assert_eq!(max_gop_size(&gops), Some(2));
//! ```

use std::mem;

use serde::Serialize;

use crate::frame::ProbedFrame;

/// One group of pictures: a leading I-frame and the P/B frames that follow
/// it up to the next I-frame.
///
/// A stream that starts mid-GOP yields a first GOP that begins with a P or
/// B frame; such a GOP is always open.
#[derive(Debug, Clone, PartialEq)]
pub struct Gop {
    frames: Vec<ProbedFrame>,
    closed: bool,
}

impl Gop {
    fn seal(frames: Vec<ProbedFrame>) -> Self {
        let closed = frames
            .first()
            .and_then(ProbedFrame::picture_type)
            .is_some_and(|picture| picture.is_key_intra());
        Gop { frames, closed }
    }

    /// The frames of this GOP in decode order.
    pub fn frames(&self) -> &[ProbedFrame] {
        &self.frames
    }

    /// Consume the GOP and return its frames.
    pub fn into_frames(self) -> Vec<ProbedFrame> {
        self.frames
    }

    /// Number of frames in the GOP.
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// Returns `true` if the GOP has no frames. Sealed GOPs never do.
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Whether the GOP starts with a key I-frame.
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Picture type symbols of the frames, e.g. `"IBBPBBP"` or `"iPP"`.
    pub fn pattern(&self) -> String {
        self.frames
            .iter()
            .filter_map(ProbedFrame::picture_type)
            .map(|picture| picture.symbol())
            .collect()
    }

    /// The table row for this GOP.
    pub fn summary(&self) -> GopSummary {
        GopSummary {
            pattern: self.pattern(),
            frame_count: self.len(),
            closed: self.closed,
        }
    }
}

/// A row of the GOP table in a stream report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GopSummary {
    /// Picture type symbols, see [`Gop::pattern`].
    pub pattern: String,
    /// Number of frames in the GOP.
    pub frame_count: usize,
    /// Whether the GOP starts with a key I-frame.
    pub closed: bool,
}

/// Incremental GOP builder.
///
/// Push video frames in decode order; a sealed GOP is handed back whenever an
/// I-frame closes the previous one. Call [`finish`](Self::finish) at the end
/// of the stream to seal the last GOP.
#[derive(Debug, Default)]
pub struct GopAccumulator {
    current: Vec<ProbedFrame>,
}

impl GopAccumulator {
    /// Create an empty accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add the next video frame. Returns the previous GOP when this frame
    /// starts a new one. Non-video frames are ignored.
    pub fn push(&mut self, frame: ProbedFrame) -> Option<Gop> {
        let Some(picture) = frame.picture_type() else {
            log::debug!("ignoring non-video frame {} in GOP accumulator", frame.index);
            return None;
        };

        let sealed = if picture.is_intra() && !self.current.is_empty() {
            Some(Gop::seal(mem::take(&mut self.current)))
        } else {
            None
        };
        self.current.push(frame);
        sealed
    }

    /// Seal whatever is left. Returns `None` if no frame was pushed since
    /// the last seal.
    pub fn finish(&mut self) -> Option<Gop> {
        if self.current.is_empty() {
            None
        } else {
            Some(Gop::seal(mem::take(&mut self.current)))
        }
    }
}

/// Lazy iterator adapter that turns a frame sequence into GOPs.
///
/// The source is consumed once; to classify again, build a new classifier
/// over the same probe data.
pub struct GopClassifier<I> {
    frames: I,
    accumulator: GopAccumulator,
    exhausted: bool,
}

impl<I> GopClassifier<I>
where
    I: Iterator<Item = ProbedFrame>,
{
    /// Wrap a frame iterator.
    pub fn new(frames: I) -> Self {
        GopClassifier {
            frames,
            accumulator: GopAccumulator::new(),
            exhausted: false,
        }
    }
}

impl<I> Iterator for GopClassifier<I>
where
    I: Iterator<Item = ProbedFrame>,
{
    type Item = Gop;

    fn next(&mut self) -> Option<Gop> {
        if self.exhausted {
            return None;
        }
        for frame in self.frames.by_ref() {
            if let Some(gop) = self.accumulator.push(frame) {
                return Some(gop);
            }
        }
        self.exhausted = true;
        self.accumulator.finish()
    }
}

/// Largest frame count among `gops`, or `None` when there are none.
pub fn max_gop_size(gops: &[Gop]) -> Option<usize> {
    gops.iter().map(Gop::len).max()
}

/// Aggregate statistics over a GOP table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GopStatistics {
    /// Number of GOPs.
    pub count: usize,
    /// Smallest GOP, in frames.
    pub min_size: usize,
    /// Largest GOP, in frames.
    pub max_size: usize,
    /// Mean GOP size, in frames.
    pub average_size: f64,
    /// Number of closed GOPs.
    pub closed_count: usize,
}

impl GopStatistics {
    /// Compute statistics over a GOP table. Returns `None` for an empty
    /// table.
    pub fn from_table(table: &[GopSummary]) -> Option<Self> {
        let min_size = table.iter().map(|row| row.frame_count).min()?;
        let max_size = table.iter().map(|row| row.frame_count).max()?;
        let total: usize = table.iter().map(|row| row.frame_count).sum();

        Some(GopStatistics {
            count: table.len(),
            min_size,
            max_size,
            average_size: total as f64 / table.len() as f64,
            closed_count: table.iter().filter(|row| row.closed).count(),
        })
    }

    /// Number of open GOPs.
    pub fn open_count(&self) -> usize {
        self.count - self.closed_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::{FrameKind, PictureType};

    fn frame(index: u64, kind: FrameKind) -> ProbedFrame {
        ProbedFrame {
            index,
            kind,
            key_frame: None,
            size_bytes: 100,
            duration_time: None,
            decode_timestamp: None,
            byte_offset: None,
        }
    }

    fn video(pattern: &str) -> Vec<ProbedFrame> {
        pattern
            .chars()
            .enumerate()
            .map(|(index, symbol)| {
                let picture = match symbol {
                    'I' => PictureType::I { is_key: true },
                    'i' => PictureType::I { is_key: false },
                    'P' => PictureType::P,
                    _ => PictureType::B,
                };
                frame(index as u64, FrameKind::Video(picture))
            })
            .collect()
    }

    #[test]
    fn partitions_on_every_i_frame() {
        let frames = video("IBBPiBPIPP");
        let gops: Vec<Gop> = GopClassifier::new(frames.clone().into_iter()).collect();

        let patterns: Vec<String> = gops.iter().map(Gop::pattern).collect();
        assert_eq!(patterns, ["IBBP", "iBP", "IPP"]);
        assert_eq!(
            gops.iter().map(Gop::is_closed).collect::<Vec<_>>(),
            [true, false, true]
        );

        let rejoined: Vec<ProbedFrame> = gops.into_iter().flat_map(Gop::into_frames).collect();
        assert_eq!(rejoined, frames);
    }

    #[test]
    fn consecutive_i_frames_are_single_frame_gops() {
        let gops: Vec<Gop> = GopClassifier::new(video("IIi").into_iter()).collect();
        assert_eq!(gops.len(), 3);
        assert_eq!(max_gop_size(&gops), Some(1));
    }

    #[test]
    fn leading_predicted_frames_form_an_open_gop() {
        let gops: Vec<Gop> = GopClassifier::new(video("PBIP").into_iter()).collect();
        assert_eq!(gops[0].pattern(), "PB");
        assert!(!gops[0].is_closed());
        assert_eq!(gops[1].pattern(), "IP");
    }

    #[test]
    fn empty_input_has_no_gops() {
        let gops: Vec<Gop> = GopClassifier::new(Vec::new().into_iter()).collect();
        assert!(gops.is_empty());
        assert_eq!(max_gop_size(&gops), None);
    }

    #[test]
    fn accumulator_ignores_audio() {
        let mut accumulator = GopAccumulator::new();
        assert!(accumulator.push(frame(0, FrameKind::Audio)).is_none());
        assert!(accumulator.finish().is_none());
    }

    #[test]
    fn statistics_over_table() {
        let gops: Vec<Gop> = GopClassifier::new(video("IPPPiPIPPPPP").into_iter()).collect();
        let table: Vec<GopSummary> = gops.iter().map(Gop::summary).collect();
        let stats = GopStatistics::from_table(&table).unwrap();
        assert_eq!(stats.count, 3);
        assert_eq!(stats.min_size, 2);
        assert_eq!(stats.max_size, 6);
        assert_eq!(stats.average_size, 4.0);
        assert_eq!(stats.open_count(), 1);
        assert!(GopStatistics::from_table(&[]).is_none());
    }
}
