use crate::config::QoeConfig;
use crate::error::{QoeError, Result};
use crate::io::text::read_series;
use crate::metrics::{qoe_score, resolution_changes, summarize, QoeSummary};
use crate::plot::{artifact_file_name, figure_for_chart, ChartKind, PlotBackend};
use crate::signal::{SessionMode, TimeSeries};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChartArtifact {
    pub kind: ChartKind,
    pub path: PathBuf,
    pub title: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineReport {
    pub mode: SessionMode,
    pub artifacts: Vec<ChartArtifact>,
    pub summary: QoeSummary,
}

/// Load → derive → render for a single streaming session.
pub struct QoePipeline {
    config: QoeConfig,
}

impl QoePipeline {
    pub fn new(config: QoeConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &QoeConfig {
        &self.config
    }

    /// Run every stage in order. Inputs are read and scored before anything
    /// is written, and the first failure aborts the run.
    pub fn run<B: PlotBackend + ?Sized>(&self, backend: &mut B) -> Result<PipelineReport> {
        let cfg = &self.config;
        let resolution = read_series(&cfg.resolution_path(), cfg.malformed)?;
        let buffering = read_series(&cfg.buffering_path(), cfg.malformed)?;
        info!(
            "loaded {} resolution and {} buffering samples ({} session)",
            resolution.len(),
            buffering.len(),
            cfg.session_mode
        );
        if resolution.len() != cfg.streaming_seconds {
            debug!(
                "resolution series has {} samples, charts cover {} seconds",
                resolution.len(),
                cfg.streaming_seconds
            );
        }

        let changes = resolution_changes(&resolution);
        let qoe = qoe_score(&resolution, &buffering, &changes, &cfg.reference())?;
        let summary = summarize(&qoe, &resolution);
        if summary.out_of_range > 0 {
            warn!(
                "{} QoE samples fall outside [0, 100]; normalization_max {} may not match the observed rungs",
                summary.out_of_range, cfg.normalization_max
            );
        }

        fs::create_dir_all(&cfg.output_dir).map_err(|e| QoeError::io(&cfg.output_dir, e))?;

        let mut artifacts = Vec::with_capacity(ChartKind::ALL.len());
        artifacts.push(self.render(backend, ChartKind::ResolutionQuality, &resolution)?);
        artifacts.push(self.render(backend, ChartKind::FrameBuffering, &buffering)?);
        artifacts.push(self.render(backend, ChartKind::ResolutionChanges, &changes)?);
        artifacts.push(self.render(backend, ChartKind::OverallQoe, &qoe)?);

        info!(
            "mean QoE {:.2} over {} samples, {} rung switches",
            summary.mean, summary.samples, summary.switches
        );
        Ok(PipelineReport {
            mode: cfg.session_mode,
            artifacts,
            summary,
        })
    }

    fn render<B: PlotBackend + ?Sized>(
        &self,
        backend: &mut B,
        kind: ChartKind,
        series: &TimeSeries,
    ) -> Result<ChartArtifact> {
        let cfg = &self.config;
        let name = artifact_file_name(kind, cfg.session_mode, &cfg.file_prefix, &cfg.image_format);
        let path = cfg.output_dir.join(name);
        let fig = figure_for_chart(kind, series, cfg.session_mode, cfg);
        backend
            .draw(&fig, &path)
            .map_err(|e| QoeError::Render {
                chart: kind.name(),
                path: path.clone(),
                message: format!("{:#}", e),
            })?;
        info!("wrote {} chart to {}", kind.name(), path.display());
        Ok(ChartArtifact {
            kind,
            path,
            title: fig.title.unwrap_or_default(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::text::MalformedPolicy;
    use crate::plot::{Figure, Series};
    use std::path::Path;
    use tempfile::tempdir;

    /// Records drawn figures instead of writing images.
    #[derive(Default)]
    struct RecordingBackend {
        drawn: Vec<(PathBuf, Figure)>,
        fail_on: Option<usize>,
    }

    impl PlotBackend for RecordingBackend {
        fn draw(&mut self, fig: &Figure, path: &Path) -> anyhow::Result<()> {
            if self.fail_on == Some(self.drawn.len()) {
                anyhow::bail!("backend exploded");
            }
            self.drawn.push((path.to_path_buf(), fig.clone()));
            Ok(())
        }
    }

    fn data_points(fig: &Figure) -> Vec<f64> {
        match fig.series.last().expect("data series") {
            Series::Line(line) => line.points.iter().map(|p| p[1]).collect(),
        }
    }

    fn write_inputs(dir: &Path, resolution: &str, buffering: &str) {
        fs::write(dir.join("resolution_data.csv"), resolution).unwrap();
        fs::write(dir.join("buffering_data.csv"), buffering).unwrap();
    }

    fn config_for(dir: &Path, mode: SessionMode) -> QoeConfig {
        QoeConfig {
            input_dir: dir.to_path_buf(),
            output_dir: dir.join("graphs"),
            session_mode: mode,
            streaming_seconds: 4,
            ..QoeConfig::default()
        }
    }

    #[test]
    fn renders_four_charts_in_order() {
        let dir = tempdir().unwrap();
        write_inputs(dir.path(), "8\n8\n16\n16\n", "1\n1\n1\n1\n");
        let pipeline = QoePipeline::new(config_for(dir.path(), SessionMode::Live)).unwrap();
        let mut backend = RecordingBackend::default();
        let report = pipeline.run(&mut backend).unwrap();

        let kinds: Vec<ChartKind> = report.artifacts.iter().map(|a| a.kind).collect();
        assert_eq!(kinds, ChartKind::ALL.to_vec());
        assert_eq!(backend.drawn.len(), 4);
        assert!(dir.path().join("graphs").is_dir());

        assert_eq!(data_points(&backend.drawn[0].1), vec![8.0, 8.0, 16.0, 16.0]);
        assert_eq!(data_points(&backend.drawn[1].1), vec![1.0, 1.0, 1.0, 1.0]);
        assert_eq!(data_points(&backend.drawn[2].1), vec![0.0, 0.0, 8.0, 0.0]);
        let qoe = data_points(&backend.drawn[3].1);
        assert!((qoe[2] - 41.6667).abs() < 1e-3);
        assert_eq!(report.summary.switches, 1);
    }

    #[test]
    fn recorded_mode_labels_every_artifact() {
        let dir = tempdir().unwrap();
        write_inputs(dir.path(), "8\n16\n32\n32\n", "0\n0\n0.5\n1\n");
        let pipeline = QoePipeline::new(config_for(dir.path(), SessionMode::Recorded)).unwrap();
        let mut backend = RecordingBackend::default();
        let report = pipeline.run(&mut backend).unwrap();
        assert_eq!(report.mode, SessionMode::Recorded);
        for artifact in &report.artifacts {
            let name = artifact.path.file_name().unwrap().to_string_lossy().to_string();
            assert!(name.ends_with("_recorded.png"), "{}", name);
            assert!(!name.contains("live"));
            assert!(artifact.title.contains("Recorded Media"));
            assert!(!artifact.title.contains("Live"));
        }
    }

    #[test]
    fn missing_input_fails_before_rendering() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("resolution_data.csv"), "8\n").unwrap();
        let cfg = config_for(dir.path(), SessionMode::Live);
        let pipeline = QoePipeline::new(cfg.clone()).unwrap();
        let mut backend = RecordingBackend::default();
        let err = pipeline.run(&mut backend).unwrap_err();
        assert!(matches!(err, QoeError::Io { .. }));
        assert!(err.to_string().contains("buffering_data.csv"));
        assert!(backend.drawn.is_empty());
        assert!(!cfg.output_dir.exists());
    }

    #[test]
    fn backend_failure_names_chart_and_stops() {
        let dir = tempdir().unwrap();
        write_inputs(dir.path(), "8\n8\n", "1\n1\n");
        let pipeline = QoePipeline::new(config_for(dir.path(), SessionMode::Live)).unwrap();
        let mut backend = RecordingBackend {
            fail_on: Some(1),
            ..RecordingBackend::default()
        };
        let err = pipeline.run(&mut backend).unwrap_err();
        match err {
            QoeError::Render { chart, path, message } => {
                assert_eq!(chart, "frame-buffering");
                assert!(path.ends_with("oboe_streaming_buffering_live.png"));
                assert!(message.contains("exploded"));
            }
            other => panic!("unexpected error {other:?}"),
        }
        assert_eq!(backend.drawn.len(), 1);
    }

    #[test]
    fn mismatched_inputs_are_reported() {
        let dir = tempdir().unwrap();
        write_inputs(dir.path(), "8\n8\n16\n", "1\n1\n");
        let pipeline = QoePipeline::new(config_for(dir.path(), SessionMode::Live)).unwrap();
        let mut backend = RecordingBackend::default();
        let err = pipeline.run(&mut backend).unwrap_err();
        assert!(matches!(err, QoeError::LengthMismatch { .. }));
        assert!(backend.drawn.is_empty());
    }

    #[test]
    fn nan_passthrough_reaches_the_charts() {
        let dir = tempdir().unwrap();
        write_inputs(dir.path(), "8\nbad\n16\n16\n", "1\n1\n1\n1\n");
        let cfg = QoeConfig {
            malformed: MalformedPolicy::NotANumber,
            ..config_for(dir.path(), SessionMode::Live)
        };
        let mut backend = RecordingBackend::default();
        QoePipeline::new(cfg).unwrap().run(&mut backend).unwrap();
        let changes = data_points(&backend.drawn[2].1);
        assert!(changes[1].is_nan() && changes[2].is_nan());
        assert_eq!(changes[3], 0.0);
    }

    #[test]
    fn invalid_config_is_rejected_up_front() {
        let cfg = QoeConfig {
            streaming_seconds: 0,
            ..QoeConfig::default()
        };
        assert!(matches!(QoePipeline::new(cfg), Err(QoeError::Configuration(_))));
    }
}
