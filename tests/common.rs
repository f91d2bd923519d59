//! Shared fixtures for the integration tests.
#![allow(dead_code)]

use std::path::{Path, PathBuf};

use gridmdp::{
    Environment,
    pipeline::{
        JsonlObserver, MetricsObserver, ObserverSet, ProgressObserver, TraceLogObserver,
    },
};

/// Three-by-four world with a wall, a +1 exit and a −1 exit
pub const CLASSIC: &str = "0001\n0302\n0000";

pub fn env(layout: &str) -> Environment {
    Environment::new(layout.parse().unwrap()).unwrap()
}

/// Write a settings file into `dir` and return its path
pub fn write_settings(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, contents).unwrap();
    path
}

/// Every observer adapter at once, writing into `dir`
pub fn all_observers(env: &Environment, dir: &Path) -> ObserverSet<'static> {
    ObserverSet::new()
        .with_observer(Box::new(
            TraceLogObserver::append(env, dir.join("trace.txt")).unwrap(),
        ))
        .with_observer(Box::new(JsonlObserver::new(dir.join("run.jsonl")).unwrap()))
        .with_observer(Box::new(MetricsObserver::new()))
        .with_observer(Box::new(ProgressObserver::new()))
}

pub fn bits(values: &[f64]) -> Vec<u64> {
    values.iter().map(|v| v.to_bits()).collect()
}
