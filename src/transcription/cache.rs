//! Load-once cache for local speech models.
//!
//! Model loading is expensive, so each model name is loaded at most once per
//! process. Concurrent requests for the same model await the single in-flight
//! load instead of duplicating it. The loader is injected, which keeps the
//! cache testable without the real tool installed.

use super::local::{ModelLoader, SpeechModel};
use crate::error::Result;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::OnceCell;
use tracing::{info, warn};

type ModelCell = Arc<OnceCell<Arc<dyn SpeechModel>>>;

/// Process-wide cache of loaded local models, keyed by model name.
pub struct ModelCache {
    loader: Arc<dyn ModelLoader>,
    cells: Mutex<HashMap<String, ModelCell>>,
}

impl ModelCache {
    pub fn new(loader: Arc<dyn ModelLoader>) -> Self {
        Self {
            loader,
            cells: Mutex::new(HashMap::new()),
        }
    }

    /// Get a model, loading it on first use. A failed load is not cached;
    /// the next request retries.
    pub async fn get(&self, model_name: &str) -> Result<Arc<dyn SpeechModel>> {
        let cell = {
            let mut cells = self.cells.lock().unwrap_or_else(|e| e.into_inner());
            cells
                .entry(model_name.to_string())
                .or_insert_with(|| Arc::new(OnceCell::new()))
                .clone()
        };

        let model = cell
            .get_or_try_init(|| async {
                info!("Loading local model '{}'", model_name);
                self.loader.load(model_name).await
            })
            .await?;

        Ok(model.clone())
    }

    /// Names of models that finished loading.
    pub fn cached_models(&self) -> Vec<String> {
        let cells = self.cells.lock().unwrap_or_else(|e| e.into_inner());
        cells
            .iter()
            .filter(|(_, cell)| cell.initialized())
            .map(|(name, _)| name.clone())
            .collect()
    }
}

/// Warm the commonly used models in the background so the first local
/// transcription does not pay the load cost. Failures are logged and
/// otherwise ignored; the on-demand path will retry.
pub fn preload_common(cache: Arc<ModelCache>, models: &[String]) {
    for model_name in models {
        let cache = cache.clone();
        let model_name = model_name.clone();
        tokio::spawn(async move {
            if let Err(e) = cache.get(&model_name).await {
                warn!("Preload of model '{}' failed: {}", model_name, e);
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::AudioAsset;
    use crate::error::ReferatError;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingModel(String);

    #[async_trait]
    impl SpeechModel for CountingModel {
        fn name(&self) -> &str {
            &self.0
        }

        async fn transcribe(
            &self,
            _asset: &AudioAsset,
            _language: Option<&str>,
        ) -> Result<String> {
            Ok("text".to_string())
        }
    }

    struct CountingLoader {
        loads: AtomicUsize,
        fail_first: AtomicUsize,
    }

    #[async_trait]
    impl ModelLoader for CountingLoader {
        async fn load(&self, model_name: &str) -> Result<Arc<dyn SpeechModel>> {
            self.loads.fetch_add(1, Ordering::SeqCst);
            if self.fail_first.load(Ordering::SeqCst) > 0 {
                self.fail_first.fetch_sub(1, Ordering::SeqCst);
                return Err(ReferatError::ModelLoad("boom".to_string()));
            }
            Ok(Arc::new(CountingModel(model_name.to_string())))
        }
    }

    fn counting_loader(fail_first: usize) -> Arc<CountingLoader> {
        Arc::new(CountingLoader {
            loads: AtomicUsize::new(0),
            fail_first: AtomicUsize::new(fail_first),
        })
    }

    #[tokio::test]
    async fn test_loads_once_per_model() {
        let loader = counting_loader(0);
        let cache = Arc::new(ModelCache::new(loader.clone()));

        let a = cache.get("base").await.unwrap();
        let b = cache.get("base").await.unwrap();
        let c = cache.get("medium").await.unwrap();

        assert_eq!(a.name(), "base");
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(c.name(), "medium");
        assert_eq!(loader.loads.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_concurrent_requests_share_one_load() {
        let loader = counting_loader(0);
        let cache = Arc::new(ModelCache::new(loader.clone()));

        let tasks: Vec<_> = (0..8)
            .map(|_| {
                let cache = cache.clone();
                tokio::spawn(async move { cache.get("base").await.map(|m| m.name().to_string()) })
            })
            .collect();

        for task in tasks {
            assert_eq!(task.await.unwrap().unwrap(), "base");
        }
        assert_eq!(loader.loads.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failed_load_is_retried() {
        let loader = counting_loader(1);
        let cache = Arc::new(ModelCache::new(loader.clone()));

        assert!(cache.get("base").await.is_err());
        assert!(cache.cached_models().is_empty());

        let model = cache.get("base").await.unwrap();
        assert_eq!(model.name(), "base");
        assert_eq!(cache.cached_models(), vec!["base".to_string()]);
    }
}
