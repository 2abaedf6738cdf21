use std::collections::BTreeMap;
use std::time::Instant;

use crate::descriptor::domain::shape_matcher::MatchScore;

/// Receives frame loop events so the loop itself never prints.
pub trait PipelineLogger: Send {
    /// Called once per acquired frame, before it is analyzed.
    fn frame(&mut self, index: usize);

    /// Wall time of one stage (`detect`, `describe`, `match`) on one frame.
    fn timing(&mut self, stage: &str, duration_ms: f64);

    /// Per-frame count such as `regions` or `contours`.
    fn metric(&mut self, name: &str, value: f64);

    /// Dissimilarity between the current ear and the reference.
    fn score(&mut self, frame_index: usize, score: MatchScore);

    fn info(&mut self, message: &str);

    /// End-of-run report. Default: nothing.
    fn summary(&self) {}
}

pub struct NullPipelineLogger;

impl PipelineLogger for NullPipelineLogger {
    fn frame(&mut self, _index: usize) {}
    fn timing(&mut self, _stage: &str, _duration_ms: f64) {}
    fn metric(&mut self, _name: &str, _value: f64) {}
    fn score(&mut self, _frame_index: usize, _score: MatchScore) {}
    fn info(&mut self, _message: &str) {}
}

/// Running totals for one named series.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
struct Series {
    count: usize,
    sum: f64,
    min: f64,
    max: f64,
}

impl Series {
    fn push(&mut self, value: f64) {
        if self.count == 0 {
            self.min = value;
            self.max = value;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);
        }
        self.count += 1;
        self.sum += value;
    }

    fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.sum / self.count as f64
        }
    }
}

/// Console reporter used by the binary.
///
/// Each score goes to stdout on a line of its own so it can be piped;
/// everything else goes through `log`. Stage timings, counts and scores are
/// folded into running totals for the closing report.
pub struct ConsolePipelineLogger {
    progress_every: usize,
    started: Instant,
    frames_seen: usize,
    stages: BTreeMap<String, Series>,
    counts: BTreeMap<String, Series>,
    scores: Series,
    last_message: Option<String>,
}

impl ConsolePipelineLogger {
    /// `progress_every` is the number of frames between progress lines.
    pub fn new(progress_every: usize) -> Self {
        Self {
            progress_every: progress_every.max(1),
            started: Instant::now(),
            frames_seen: 0,
            stages: BTreeMap::new(),
            counts: BTreeMap::new(),
            scores: Series::default(),
            last_message: None,
        }
    }

    pub fn frames_seen(&self) -> usize {
        self.frames_seen
    }

    /// Mean duration of `stage` in milliseconds, if it ever ran.
    pub fn mean_stage_ms(&self, stage: &str) -> Option<f64> {
        self.stages.get(stage).map(Series::mean)
    }

    pub fn mean_count(&self, name: &str) -> Option<f64> {
        self.counts.get(name).map(Series::mean)
    }

    /// `(compared, best, mean)` over every reported score.
    pub fn score_stats(&self) -> Option<(usize, f64, f64)> {
        (self.scores.count > 0).then(|| (self.scores.count, self.scores.min, self.scores.mean()))
    }

    pub fn last_message(&self) -> Option<&str> {
        self.last_message.as_deref()
    }

    /// The closing report, or `None` when no frame was ever analyzed.
    pub fn report(&self) -> Option<String> {
        if self.frames_seen == 0 && self.stages.is_empty() && self.scores.count == 0 {
            return None;
        }
        let secs = self.started.elapsed().as_secs_f64();
        let mut out = format!("{} frame(s) in {secs:.1}s", self.frames_seen);
        if self.frames_seen > 0 && secs > 0.0 {
            out.push_str(&format!(" ({:.1} fps)", self.frames_seen as f64 / secs));
        }

        for (stage, series) in &self.stages {
            out.push_str(&format!(
                "\n  {stage:<9} {:7.2} ms/frame  (max {:.2} ms, {} runs)",
                series.mean(),
                series.max,
                series.count
            ));
        }
        for (name, series) in &self.counts {
            out.push_str(&format!(
                "\n  {name:<9} mean {:.1}, max {}",
                series.mean(),
                series.max
            ));
        }
        if let Some((compared, best, mean)) = self.score_stats() {
            out.push_str(&format!(
                "\n  matches   {compared} compared, best {best:.4}, mean {mean:.4}"
            ));
        }
        Some(out)
    }
}

impl Default for ConsolePipelineLogger {
    fn default() -> Self {
        Self::new(100)
    }
}

impl PipelineLogger for ConsolePipelineLogger {
    fn frame(&mut self, index: usize) {
        self.frames_seen += 1;
        if self.frames_seen % self.progress_every == 0 {
            log::info!("{} frames analyzed (frame #{index})", self.frames_seen);
        }
    }

    fn timing(&mut self, stage: &str, duration_ms: f64) {
        self.stages.entry(stage.to_owned()).or_default().push(duration_ms);
    }

    fn metric(&mut self, name: &str, value: f64) {
        self.counts.entry(name.to_owned()).or_default().push(value);
    }

    fn score(&mut self, frame_index: usize, score: MatchScore) {
        self.scores.push(score.value());
        log::debug!("frame {frame_index} scored {score}");
        println!("{score}");
    }

    fn info(&mut self, message: &str) {
        log::info!("{message}");
        self.last_message = Some(message.to_owned());
    }

    fn summary(&self) {
        if let Some(report) = self.report() {
            log::info!("Session report: {report}");
        }
    }
}
