use crate::domain::ports::Pipeline;
use crate::utils::error::Result;
use crate::utils::monitor::SystemMonitor;

pub struct EtlEngine<P: Pipeline> {
    pipeline: P,
    monitor: SystemMonitor,
}

impl<P: Pipeline> EtlEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self::new_with_monitoring(pipeline, false)
    }

    pub fn new_with_monitoring(pipeline: P, monitor_enabled: bool) -> Self {
        Self {
            pipeline,
            monitor: SystemMonitor::new(monitor_enabled),
        }
    }

    pub fn pipeline(&self) -> &P {
        &self.pipeline
    }

    pub async fn run(&self) -> Result<String> {
        let name = self.pipeline.name();
        tracing::info!("▶️ Starting {} stage", name);

        tracing::debug!("[{}] extracting", name);
        let extracted = self.pipeline.extract().await?;
        self.monitor.log_stats("extract");

        tracing::debug!("[{}] transforming", name);
        let transformed = self.pipeline.transform(extracted).await?;
        self.monitor.log_stats("transform");

        tracing::debug!("[{}] loading", name);
        let output_path = self.pipeline.load(transformed).await?;
        self.monitor.log_stats("load");
        self.monitor.log_final_stats();

        tracing::info!("✅ {} stage finished, output: {}", name, output_path);
        Ok(output_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::error::EtlError;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingPipeline {
        calls: AtomicUsize,
        fail_transform: bool,
    }

    #[async_trait::async_trait]
    impl Pipeline for CountingPipeline {
        type Extracted = Vec<u32>;
        type Transformed = u32;

        fn name(&self) -> &str {
            "counting"
        }

        async fn extract(&self) -> Result<Vec<u32>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(vec![1, 2, 3])
        }

        async fn transform(&self, data: Vec<u32>) -> Result<u32> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_transform {
                return Err(EtlError::processing("boom"));
            }
            Ok(data.iter().sum())
        }

        async fn load(&self, result: u32) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(format!("sum={}", result))
        }
    }

    #[tokio::test]
    async fn test_engine_runs_all_phases_in_order() {
        let engine = EtlEngine::new(CountingPipeline {
            calls: AtomicUsize::new(0),
            fail_transform: false,
        });

        let output = engine.run().await.unwrap();

        assert_eq!(output, "sum=6");
        assert_eq!(engine.pipeline().calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_engine_stops_on_error() {
        let engine = EtlEngine::new(CountingPipeline {
            calls: AtomicUsize::new(0),
            fail_transform: true,
        });

        assert!(engine.run().await.is_err());
        assert_eq!(engine.pipeline().calls.load(Ordering::SeqCst), 2);
    }
}
