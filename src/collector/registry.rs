//! Collector registry enumerating the self-test cases for one provider.

use std::fmt;
use std::sync::Arc;

use crate::collector::{
    BmcCollector, ChassisCollector, Collector, CollectorName, DcmiCollector, LanModeCollector,
    Provider, SelCollector, SelEventsCollector, SensorCollector, Target, WatchdogCollector,
};

/// One self-test: a collector bound to a target.
#[derive(Clone)]
pub struct TestCase {
    /// Unique within a run.
    pub name: String,
    pub description: String,
    pub collector: Arc<dyn Collector>,
    pub target: Target,
    /// Config module the target was resolved from.
    pub module: String,
    /// Documentation only; never compared against results.
    pub expected: String,
}

impl fmt::Debug for TestCase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestCase")
            .field("name", &self.name)
            .field("collector", &self.collector.name())
            .field("provider", &self.collector.provider())
            .field("module", &self.module)
            .finish_non_exhaustive()
    }
}

/// Base test name, description and expectation for a category.
fn case_metadata(name: CollectorName) -> (&'static str, &'static str, &'static str) {
    match name {
        CollectorName::Bmc => ("bmc_info", "Get BMC device information", "BMC device info"),
        CollectorName::Chassis => ("chassis_info", "Get chassis information", "chassis info"),
        CollectorName::Dcmi => (
            "dcmi_info",
            "Get DCMI power management information",
            "DCMI power data",
        ),
        CollectorName::Ipmi => ("ipmi_sensor", "Get IPMI sensor readings", "sensor readings"),
        CollectorName::Sel => ("sel_info", "Get System Event Log information", "SEL entries"),
        CollectorName::SelEvents => ("sel_events", "Get System Event Log events", "SEL events"),
        CollectorName::BmcWatchdog => (
            "bmc_watchdog",
            "Get BMC watchdog timer information",
            "watchdog info",
        ),
        CollectorName::SmLanMode => (
            "sm_lan_mode",
            "Get shared memory LAN mode information",
            "LAN mode data",
        ),
    }
}

/// The fixed collector set for a single provider.
///
/// A registry never mixes providers; pick the provider once per run.
pub struct CollectorRegistry {
    provider: Provider,
    collectors: Vec<Arc<dyn Collector>>,
}

impl CollectorRegistry {
    pub fn new(provider: Provider) -> Self {
        let collectors: Vec<Arc<dyn Collector>> = vec![
            Arc::new(BmcCollector::new(provider)),
            Arc::new(ChassisCollector::new(provider)),
            Arc::new(DcmiCollector::new(provider)),
            Arc::new(SensorCollector::new(provider)),
            Arc::new(SelCollector::new(provider)),
            Arc::new(SelEventsCollector::new(provider)),
            Arc::new(WatchdogCollector::new(provider)),
            Arc::new(LanModeCollector::new(provider)),
        ];
        tracing::debug!(provider = %provider, count = collectors.len(), "Collector registry built");
        Self {
            provider,
            collectors,
        }
    }

    pub fn provider(&self) -> Provider {
        self.provider
    }

    pub fn collectors(&self) -> &[Arc<dyn Collector>] {
        &self.collectors
    }

    pub fn len(&self) -> usize {
        self.collectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.collectors.is_empty()
    }

    /// One test case per collector, all bound to `target`.
    pub fn test_cases(&self, target: &Target, module: &str) -> Vec<TestCase> {
        self.collectors
            .iter()
            .map(|collector| {
                let (name, description, expected) = case_metadata(collector.name());
                TestCase {
                    name: format!("{}{}", name, self.provider.name_suffix()),
                    description: format!(
                        "{}{}",
                        description,
                        self.provider.description_qualifier()
                    ),
                    collector: Arc::clone(collector),
                    target: target.clone(),
                    module: module.to_string(),
                    expected: expected.to_string(),
                }
            })
            .collect()
    }
}

impl fmt::Debug for CollectorRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CollectorRegistry")
            .field("provider", &self.provider)
            .field("collector_count", &self.collectors.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use strum::IntoEnumIterator;

    use super::*;

    fn names(provider: Provider) -> HashSet<String> {
        CollectorRegistry::new(provider)
            .test_cases(&Target::local(), "default")
            .into_iter()
            .map(|case| case.name)
            .collect()
    }

    #[test]
    fn test_registry_covers_every_category() {
        let registry = CollectorRegistry::new(Provider::FreeIpmi);
        let served: HashSet<CollectorName> =
            registry.collectors().iter().map(|c| c.name()).collect();
        let all: HashSet<CollectorName> = CollectorName::iter().collect();
        assert_eq!(served, all);
        assert_eq!(registry.len(), 8);
    }

    #[test]
    fn test_registry_never_mixes_providers() {
        for provider in [Provider::FreeIpmi, Provider::IpmiTool] {
            let registry = CollectorRegistry::new(provider);
            assert!(registry.collectors().iter().all(|c| c.provider() == provider));
        }
    }

    #[test]
    fn test_names_unique_and_disjoint() {
        let standard = names(Provider::FreeIpmi);
        let alternate = names(Provider::IpmiTool);
        assert_eq!(standard.len(), 8);
        assert_eq!(alternate.len(), 8);
        assert!(standard.is_disjoint(&alternate));
        assert!(standard.contains("ipmi_sensor"));
        assert!(alternate.contains("ipmi_sensor_ipmitool"));
    }

    #[test]
    fn test_descriptions_carry_qualifier() {
        let cases =
            CollectorRegistry::new(Provider::IpmiTool).test_cases(&Target::local(), "default");
        let sel = cases.iter().find(|c| c.name == "sel_info_ipmitool").unwrap();
        assert_eq!(sel.description, "Get System Event Log information (ipmitool)");
        assert_eq!(sel.expected, "SEL entries");
        assert_eq!(sel.module, "default");
    }
}
