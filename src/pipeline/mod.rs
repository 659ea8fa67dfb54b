pub mod aggregate;
pub mod batcher;
pub mod reconciler;
pub mod scheduler;

pub use aggregate::AggregateUpdater;
pub use batcher::ArticleClassifier;
pub use reconciler::MarketReconciler;
pub use scheduler::WaveScheduler;
