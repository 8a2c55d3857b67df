//! Replays a scripted scenario through a hybrid location provider.
//!
//! ```text
//! location-fusion <scenario.json>
//! ```
//!
//! The scenario lists timed backend reports for the GPS and WPS children and
//! an optional provider configuration. Every fused event is logged.

use location_fusion::api::{event_channel, Location, LocationEvent, LocationService};
use location_fusion::backend::{BackendReport, MockBackend, MockHandle, ProviderMethod, ProviderRegistry};
use location_fusion::logging::init_logging;
use location_fusion::utils::{LocationConfig, MemorySettings, SharedSettings};
use serde::Deserialize;
use std::cell::RefCell;
use std::rc::Rc;

#[derive(Debug, Deserialize)]
struct TimedReport {
    /// Seconds on the scenario clock
    at: i64,
    report: BackendReport,
}

#[derive(Debug, Deserialize)]
struct Scenario {
    #[serde(default)]
    config: Option<LocationConfig>,
    #[serde(default)]
    gps: Vec<TimedReport>,
    #[serde(default)]
    wps: Vec<TimedReport>,
    /// Extra seconds to run after the last report, for keepalives
    #[serde(default)]
    linger: i64,
}

fn describe(event: &LocationEvent) -> String {
    match event {
        LocationEvent::ServiceEnabled(status) => format!("service enabled ({:?})", status),
        LocationEvent::ServiceDisabled => "service disabled".to_string(),
        LocationEvent::Updated(update) => format!("updated {:?}", update),
        LocationEvent::ZoneIn { boundary, position, .. } => format!(
            "zone in {:?} at ({:.6}, {:.6})",
            boundary.kind(),
            position.latitude(),
            position.longitude()
        ),
        LocationEvent::ZoneOut { boundary, position, .. } => format!(
            "zone out {:?} at ({:.6}, {:.6})",
            boundary.kind(),
            position.latitude(),
            position.longitude()
        ),
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    if let Err(err) = init_logging() {
        eprintln!("Logging unavailable: {}", err);
    }

    let args: Vec<String> = std::env::args().collect();
    if args.len() != 2 {
        eprintln!(
            "Usage: {} <scenario.json>",
            args.first().map_or("location-fusion", |s| s.as_str())
        );
        return Err("Invalid arguments".into());
    }

    let content = std::fs::read_to_string(&args[1])?;
    let scenario: Scenario = serde_json::from_str(&content)?;

    let mut registry = ProviderRegistry::new();
    let mut scripts: Vec<(MockHandle, Vec<TimedReport>)> = Vec::new();
    for (method, reports) in [(ProviderMethod::Gps, scenario.gps), (ProviderMethod::Wps, scenario.wps)] {
        let (_, handle) = MockBackend::new(method);
        registry.register(method, handle.factory())?;
        scripts.push((handle, reports));
    }

    let settings: SharedSettings = Rc::new(RefCell::new(MemorySettings::all_enabled()));
    let mut location = Location::new(ProviderMethod::Hybrid, &registry, settings)?;
    if let Some(config) = &scenario.config {
        location.apply_config(config)?;
    }

    let (callback, events) = event_channel();
    location.subscribe(callback);
    location.start()?;

    let times: Vec<i64> = scripts
        .iter()
        .flat_map(|(_, reports)| reports.iter().map(|r| r.at))
        .collect();
    let first = times.iter().copied().min().unwrap_or(0);
    let last = times.iter().copied().max().unwrap_or(0) + scenario.linger.max(0);

    for now in first..=last {
        for (handle, reports) in &scripts {
            for timed in reports.iter().filter(|r| r.at == now) {
                handle.push_report(timed.report.clone());
            }
        }
        location.process(now);
        for event in events.try_iter() {
            tracing::info!(t = now, "{}", describe(&event));
        }
    }

    location.stop()?;
    for event in events.try_iter() {
        tracing::info!(t = last, "{}", describe(&event));
    }
    Ok(())
}
