use std::collections::HashMap;
use std::time::Instant;

/// Observer for capture → detect → display runs.
///
/// The headless runner reports through this trait so the CLI can print
/// progress and a summary while tests and the desktop stay silent.
pub trait PipelineLogger: Send {
    /// Frames presented so far. `total` is `None` for live sources.
    fn progress(&mut self, current: usize, total: Option<usize>);

    /// Duration of one stage for one frame.
    fn timing(&mut self, stage: &str, duration_ms: f64);

    /// Per-frame measurement such as the landmark count.
    fn metric(&mut self, name: &str, value: f64);

    fn info(&mut self, message: &str);

    /// Emits the end-of-run report. Default: no-op.
    fn summary(&self) {}
}

/// Discards everything.
pub struct NullPipelineLogger;

impl PipelineLogger for NullPipelineLogger {
    fn progress(&mut self, _current: usize, _total: Option<usize>) {}
    fn timing(&mut self, _stage: &str, _duration_ms: f64) {}
    fn metric(&mut self, _name: &str, _value: f64) {}
    fn info(&mut self, _message: &str) {}
}

/// Running aggregate of one stage's samples. Fixed size however long the
/// run lasts.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct StageStats {
    pub count: usize,
    pub avg: f64,
    pub max: f64,
    pub total: f64,
}

impl StageStats {
    pub fn record(&mut self, value: f64) {
        self.max = if self.count == 0 { value } else { self.max.max(value) };
        self.count += 1;
        self.total += value;
        self.avg = self.total / self.count as f64;
    }
}

/// CLI logger: throttled progress via `log`, per-stage timings and a
/// closing summary.
pub struct StdoutPipelineLogger {
    throttle_frames: usize,
    timings: HashMap<String, StageStats>,
    metrics: HashMap<String, StageStats>,
    start_time: Instant,
    frames: usize,
    messages: Vec<String>,
}

impl StdoutPipelineLogger {
    pub fn new(throttle_frames: usize) -> Self {
        Self {
            throttle_frames: throttle_frames.max(1),
            timings: HashMap::new(),
            metrics: HashMap::new(),
            start_time: Instant::now(),
            frames: 0,
            messages: Vec::new(),
        }
    }

    pub fn frames(&self) -> usize {
        self.frames
    }

    pub fn messages(&self) -> &[String] {
        &self.messages
    }

    pub fn stage_stats(&self, stage: &str) -> Option<StageStats> {
        self.timings.get(stage).copied()
    }

    pub fn metrics_for(&self, name: &str) -> Option<StageStats> {
        self.metrics.get(name).copied()
    }

    /// The formatted report, or `None` when nothing was recorded.
    pub fn summary_string(&self) -> Option<String> {
        if self.timings.is_empty() && self.metrics.is_empty() {
            return None;
        }

        let elapsed_s = self.start_time.elapsed().as_secs_f64();
        let mut lines = vec![format!(
            "Run summary ({} frames, {:.1}s):",
            self.frames, elapsed_s
        )];

        let mut stages: Vec<_> = self.timings.keys().collect();
        stages.sort();
        for stage in stages {
            let stats = &self.timings[stage];
            lines.push(format!(
                "  {stage:10}: avg {:6.1}ms  max {:6.1}ms  total {:7.0}ms",
                stats.avg, stats.max, stats.total
            ));
        }

        let mut names: Vec<_> = self.metrics.keys().collect();
        names.sort();
        for name in names {
            lines.push(format!("  {name}: avg {:.1}", self.metrics[name].avg));
        }

        if self.frames > 0 && elapsed_s > 0.0 {
            lines.push(format!(
                "  Throughput: {:.1} fps",
                self.frames as f64 / elapsed_s
            ));
        }

        Some(lines.join("\n"))
    }
}

impl Default for StdoutPipelineLogger {
    fn default() -> Self {
        Self::new(30)
    }
}

impl PipelineLogger for StdoutPipelineLogger {
    fn progress(&mut self, current: usize, total: Option<usize>) {
        self.frames = current;
        match total {
            Some(total) if total > 0 => {
                if current % self.throttle_frames == 0 || current == total {
                    let pct = current as f64 / total as f64 * 100.0;
                    log::info!("Processed {current}/{total} frames ({pct:.1}%)");
                }
            }
            _ => {
                if current % self.throttle_frames == 0 {
                    log::info!("Processed {current} frames");
                }
            }
        }
    }

    fn timing(&mut self, stage: &str, duration_ms: f64) {
        self.timings
            .entry(stage.to_string())
            .or_default()
            .record(duration_ms);
    }

    fn metric(&mut self, name: &str, value: f64) {
        self.metrics
            .entry(name.to_string())
            .or_default()
            .record(value);
    }

    fn info(&mut self, message: &str) {
        self.messages.push(message.to_string());
        log::info!("{message}");
    }

    fn summary(&self) {
        if let Some(text) = self.summary_string() {
            log::info!("\n\n{text}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_null_logger_accepts_everything() {
        let mut logger = NullPipelineLogger;
        logger.progress(1, None);
        logger.timing("detect", 5.0);
        logger.metric("landmarks", 21.0);
        logger.info("hello");
        logger.summary();
    }

    #[test]
    fn test_stage_stats() {
        let mut logger = StdoutPipelineLogger::new(10);
        logger.timing("detect", 10.0);
        logger.timing("detect", 30.0);
        logger.timing("display", 2.0);

        let detect = logger.stage_stats("detect").unwrap();
        assert_eq!(detect.count, 2);
        assert_relative_eq!(detect.avg, 20.0);
        assert_relative_eq!(detect.max, 30.0);
        assert_relative_eq!(detect.total, 40.0);
        assert_eq!(logger.stage_stats("display").unwrap().count, 1);
        assert!(logger.stage_stats("capture").is_none());
    }

    #[test]
    fn test_metrics_aggregate() {
        let mut logger = StdoutPipelineLogger::new(10);
        logger.metric("landmarks", 0.0);
        logger.metric("landmarks", 21.0);
        let landmarks = logger.metrics_for("landmarks").unwrap();
        assert_eq!(landmarks.count, 2);
        assert_relative_eq!(landmarks.avg, 10.5);
        assert_relative_eq!(landmarks.max, 21.0);
        assert!(logger.metrics_for("faces").is_none());
    }

    #[test]
    fn test_negative_first_sample_sets_max() {
        let mut stats = StageStats::default();
        stats.record(-3.0);
        stats.record(-5.0);
        assert_relative_eq!(stats.max, -3.0);
    }

    #[test]
    fn test_long_live_run_keeps_one_entry_per_stage() {
        let mut logger = StdoutPipelineLogger::new(30);
        for i in 1..=100_000 {
            logger.timing("detect", 2.0);
            logger.timing("display", 1.0);
            logger.metric("landmarks", 21.0);
            logger.progress(i, None);
        }
        assert_eq!(logger.timings.len(), 2);
        assert_eq!(logger.metrics.len(), 1);
        assert!(logger.messages().is_empty());

        let detect = logger.stage_stats("detect").unwrap();
        assert_eq!(detect.count, 100_000);
        assert_relative_eq!(detect.avg, 2.0);
        assert_relative_eq!(detect.total, 200_000.0);
    }

    #[test]
    fn test_summary_lists_stages_metrics_and_throughput() {
        let mut logger = StdoutPipelineLogger::new(10);
        logger.progress(3, Some(3));
        logger.timing("detect", 12.0);
        logger.timing("display", 1.0);
        logger.metric("landmarks", 21.0);
        logger.metric("landmarks", 0.0);

        let summary = logger.summary_string().unwrap();
        assert!(summary.starts_with("Run summary (3 frames"));
        assert!(summary.contains("detect"));
        assert!(summary.contains("display"));
        assert!(summary.contains("landmarks: avg 10.5"));
        assert!(summary.contains("fps"));
    }

    #[test]
    fn test_empty_summary_is_none() {
        assert!(StdoutPipelineLogger::new(10).summary_string().is_none());
    }

    #[test]
    fn test_progress_tracks_live_frames() {
        let mut logger = StdoutPipelineLogger::new(5);
        for i in 1..=12 {
            logger.progress(i, None);
        }
        assert_eq!(logger.frames(), 12);
    }

    #[test]
    fn test_info_keeps_messages() {
        let mut logger = StdoutPipelineLogger::default();
        logger.info("opened camera 0");
        assert_eq!(logger.messages(), &["opened camera 0".to_string()]);
    }
}
