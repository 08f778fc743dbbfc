//! Collector Layer
//!
//! Each collector turns the output of one provider command into metrics pushed
//! onto a [`MetricSink`](crate::sink::MetricSink). Every information category
//! exists once per [`Provider`]; the [`CollectorRegistry`] hands out the set for
//! a single provider.
//!
//! # Architecture
//!
//! - [`Collector`]: Contract between the harness and a provider output format
//! - [`CollectorRegistry`]: Enumerates the active collectors as [`TestCase`]s
//! - One module per category, each with a provider-neutral record and a parser per provider

pub mod bmc;
pub mod chassis;
pub mod dcmi;
pub mod lan_mode;
mod parse;
mod registry;
pub mod sel;
pub mod sel_events;
pub mod sensor;
mod traits;
pub mod watchdog;

pub use bmc::BmcCollector;
pub use chassis::ChassisCollector;
pub use dcmi::DcmiCollector;
pub use lan_mode::LanModeCollector;
pub use registry::{CollectorRegistry, TestCase};
pub use sel::SelCollector;
pub use sel_events::SelEventsCollector;
pub use sensor::SensorCollector;
pub use traits::{CollectError, Collector, CollectorName, Provider, Target};
pub use watchdog::WatchdogCollector;

#[cfg(test)]
pub(crate) mod testing {
    use crate::collector::{CollectError, Collector, Target};
    use crate::executor::ExecutionResult;
    use crate::metric::Metric;
    use crate::sink;

    /// Run `convert` over canned provider output and collect what was pushed.
    pub(crate) fn convert_text(
        collector: &dyn Collector,
        text: &str,
        target: &Target,
    ) -> Result<Vec<Metric>, CollectError> {
        let (sink, mut receiver) = sink::channel(1024);
        let count = collector.convert(ExecutionResult::completed(text), &sink, target)?;
        drop(sink);

        let mut metrics = Vec::new();
        while let Some(metric) = receiver.try_recv() {
            metrics.push(metric);
        }
        assert_eq!(count, metrics.len(), "reported count must match pushes");
        Ok(metrics)
    }

    /// Find the single sample for `name` whose label values equal `labels`.
    pub(crate) fn find<'a>(metrics: &'a [Metric], name: &str, labels: &[&str]) -> &'a Metric {
        metrics
            .iter()
            .find(|m| m.desc().fq_name() == name && m.label_values() == labels)
            .unwrap_or_else(|| panic!("no metric {name}{labels:?}"))
    }
}
