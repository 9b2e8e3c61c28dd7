//! Shared Risk Service
//!
//! Holds the process-wide classifier. The model is trained on first use;
//! concurrent first callers wait on the same training run. The run is a
//! detached blocking task, so a caller that gives up mid-training leaves it
//! running for the next caller to await.

use crate::config::ClassifierConfig;
use crate::engine::{PredictionResult, RiskClassifier, SampleMeta};
use crate::ClassifierError;
use chrono::Utc;
use feature_engine::FeatureSet;
use rule_engine::{assess, Assessment};
use std::sync::Arc;
use std::time::{Duration, Instant};
use storage::{RiskRecord, RiskSink};
use tokio::sync::{Mutex, OnceCell};
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{debug, info, warn};

/// Default bound on one persistence write
const DEFAULT_PERSIST_TIMEOUT: Duration = Duration::from_millis(2000);

type Trainer = Arc<dyn Fn() -> Result<RiskClassifier, ClassifierError> + Send + Sync>;
type TrainingTask = JoinHandle<Result<RiskClassifier, ClassifierError>>;

/// Lazily trained classifier plus an optional risk sink
pub struct RiskService {
    trainer: Trainer,
    classifier: OnceCell<Arc<RiskClassifier>>,
    /// In-flight training run, if any
    training: Mutex<Option<TrainingTask>>,
    sink: Option<Arc<dyn RiskSink>>,
    persist_timeout: Duration,
}

impl RiskService {
    /// Service that trains from `config` on first use
    pub fn new(config: ClassifierConfig) -> Self {
        Self::with_trainer(move || RiskClassifier::train(&config))
    }

    /// Service that builds its classifier with `trainer` on first use
    pub fn with_trainer<F>(trainer: F) -> Self
    where
        F: Fn() -> Result<RiskClassifier, ClassifierError> + Send + Sync + 'static,
    {
        Self {
            trainer: Arc::new(trainer),
            classifier: OnceCell::new(),
            training: Mutex::new(None),
            sink: None,
            persist_timeout: DEFAULT_PERSIST_TIMEOUT,
        }
    }

    /// Service around an already trained classifier
    pub fn from_classifier(classifier: RiskClassifier) -> Self {
        let mut service = Self::with_trainer(|| {
            Err(ClassifierError::TrainingFailed("service has a fixed classifier".to_string()))
        });
        service.classifier = OnceCell::new_with(Some(Arc::new(classifier)));
        service
    }

    /// Attach a sink receiving risk levels for identified samples
    pub fn with_sink(mut self, sink: Arc<dyn RiskSink>, persist_timeout: Duration) -> Self {
        self.sink = Some(sink);
        self.persist_timeout = persist_timeout;
        self
    }

    /// The trained classifier, training it on first call.
    ///
    /// At most one training run is in flight. A failed run leaves the
    /// service untrained; the next call retries.
    pub async fn classifier(&self) -> Result<Arc<RiskClassifier>, ClassifierError> {
        if let Some(classifier) = self.classifier.get() {
            return Ok(classifier.clone());
        }

        let mut training = self.training.lock().await;
        if let Some(classifier) = self.classifier.get() {
            return Ok(classifier.clone());
        }

        let task = training.get_or_insert_with(|| {
            info!("Starting microbial-risk classifier training");
            let trainer = self.trainer.clone();
            tokio::task::spawn_blocking(move || trainer())
        });
        // Cancellation here leaves the task in the slot
        let outcome = task.await;
        *training = None;

        let classifier = outcome
            .map_err(|e| ClassifierError::TrainingFailed(format!("training task failed: {}", e)))??;
        let classifier = Arc::new(classifier);
        // Only set under the training lock, so the cell is still empty
        let _ = self.classifier.set(classifier.clone());
        info!("Microbial-risk classifier ready ({})", classifier.model_version());
        Ok(classifier)
    }

    /// Whether training has completed
    pub fn is_trained(&self) -> bool {
        self.classifier.initialized()
    }

    /// Rule-only assessment; never touches the model
    pub fn assess_rules(&self, features: &FeatureSet) -> Assessment {
        assess(features)
    }

    /// Model prediction for one sample.
    ///
    /// When `meta` carries a `sample_id` and a sink is attached, the
    /// resulting level is handed to the sink in the background.
    pub async fn predict(&self, features: &FeatureSet, meta: &SampleMeta) -> Result<PredictionResult, ClassifierError> {
        let classifier = self.classifier().await?;

        let start = Instant::now();
        let result = classifier.predict(features)?;
        metrics::histogram!("microbial_risk_predict_seconds").record(start.elapsed().as_secs_f64());
        metrics::counter!("microbial_risk_predictions_total", "risk_level" => result.risk_level.as_str())
            .increment(1);

        if let Some(sample_id) = meta.sample_id() {
            self.notify(RiskRecord {
                sample_id,
                risk_level: result.risk_level.to_string(),
                model_version: Some(result.model_version.clone()),
                recorded_at: Utc::now(),
            });
        }

        Ok(result)
    }

    /// Fire-and-forget sink write, bounded by the persist timeout
    fn notify(&self, record: RiskRecord) {
        let Some(sink) = self.sink.clone() else {
            return;
        };
        let limit = self.persist_timeout;

        tokio::spawn(async move {
            let sample_id = record.sample_id.clone();
            let write = tokio::task::spawn_blocking(move || sink.record_risk(record));

            let failure = match timeout(limit, write).await {
                Ok(Ok(Ok(()))) => {
                    debug!("Persisted risk for sample {}", sample_id);
                    return;
                }
                Ok(Ok(Err(e))) => ClassifierError::from(e).to_string(),
                Ok(Err(e)) => format!("sink task failed: {}", e),
                Err(_) => format!("timed out after {}ms", limit.as_millis()),
            };

            warn!("Failed to persist risk for sample {}: {}", sample_id, failure);
            metrics::counter!("microbial_risk_persist_failures_total").increment(1);
        });
    }
}
