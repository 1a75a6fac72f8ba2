use chrono::{DateTime, Local};
use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::dashboard;
use crate::metrics::{MemoryStats, MetricsSource, NetCounters, SwapStats, VolumeUsage};
use crate::preferences::Preferences;
use crate::probe::Probe;
use crate::recorder::{LogRow, SampleLog};
use crate::render::{present, Frame, Renderer};
use crate::theme::Palette;

/// Bytes per second in each direction.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Throughput {
    pub up: f64,
    pub down: f64,
}

/// Turns cumulative counters into rates. Holds the previous reading only.
#[derive(Clone, Copy, Debug)]
pub struct ThroughputMeter {
    previous: NetCounters,
}

impl ThroughputMeter {
    pub fn new(initial: NetCounters) -> Self {
        Self { previous: initial }
    }

    /// Rate since the last reading, spread over `interval_secs`. A counter
    /// that went backwards (interface reset) reads as 0.
    pub fn advance(&mut self, current: NetCounters, interval_secs: f64) -> Throughput {
        let rate = |now: u64, before: u64| {
            if interval_secs > 0.0 {
                now.saturating_sub(before) as f64 / interval_secs
            } else {
                0.0
            }
        };
        let throughput = Throughput {
            up: rate(current.sent, self.previous.sent),
            down: rate(current.received, self.previous.received),
        };
        self.previous = current;
        throughput
    }
}

/// One iteration's readings plus derived values.
#[derive(Clone, Debug, PartialEq)]
pub struct Sample {
    pub taken_at: DateTime<Local>,
    pub host_name: String,
    pub cpu_percent: f64,
    pub per_core: Vec<f64>,
    pub cpu_frequency_mhz: Option<u64>,
    pub memory: MemoryStats,
    pub swap: SwapStats,
    pub volumes: Vec<VolumeUsage>,
    pub throughput: Throughput,
    /// `None` when the probe target could not be reached.
    pub latency: Option<Duration>,
    pub uptime: Duration,
}

impl Sample {
    /// The volume mounted at `/`, else the first one listed.
    pub fn root_volume(&self) -> Option<&VolumeUsage> {
        self.volumes
            .iter()
            .find(|v| v.mount == "/")
            .or_else(|| self.volumes.first())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Running,
    Stopped,
}

pub struct Sampler<S: MetricsSource> {
    source: S,
    meter: ThroughputMeter,
    host_name: String,
}

impl<S: MetricsSource> Sampler<S> {
    /// Primes the throughput meter so the first frame already has a rate.
    pub fn new(mut source: S) -> Self {
        let meter = ThroughputMeter::new(source.net_counters());
        let host_name = source.host_name();
        Self { source, meter, host_name }
    }

    /// Collect, derive and probe. Blocks for about `refresh_rate` seconds
    /// inside the metrics source.
    pub fn tick(&mut self, prefs: &Preferences) -> Sample {
        let window = Duration::from_secs_f64(prefs.refresh_rate);
        let raw = self.source.sample(window);
        let throughput = self.meter.advance(raw.net, prefs.refresh_rate);

        let latency = match Probe::from_preferences(prefs).measure() {
            Ok(rtt) => Some(rtt),
            Err(e) => {
                debug!("probe failed: {e}");
                None
            }
        };

        let volumes = raw
            .volumes
            .into_iter()
            .filter_map(|v| v.map_err(|e| debug!("skipping volume: {e}")).ok())
            .collect();

        let taken_at = Local::now();
        let uptime = u64::try_from(taken_at.timestamp())
            .map(|now| Duration::from_secs(now.saturating_sub(raw.boot_time)))
            .unwrap_or_default();

        Sample {
            taken_at,
            host_name: self.host_name.clone(),
            cpu_percent: f64::from(raw.cpu_percent),
            per_core: if prefs.show_cpu_per_core {
                raw.per_core.into_iter().map(f64::from).collect()
            } else {
                Vec::new()
            },
            cpu_frequency_mhz: raw.cpu_frequency_mhz,
            memory: raw.memory,
            swap: raw.swap,
            volumes,
            throughput,
            latency,
            uptime,
        }
    }
}

/// Append the sample to the CSV log when logging is on. Failures are
/// reported and otherwise ignored.
pub fn record(prefs: &Preferences, sample: &Sample) {
    if !prefs.logging_enabled {
        return;
    }
    let log = SampleLog::new(&prefs.log_file);
    if let Err(e) = log.append(&LogRow::from_sample(sample)) {
        warn!("cannot write {}: {e}", prefs.log_file.display());
    }
}

pub fn compose(prefs: &Preferences, sample: &Sample) -> Frame {
    let panels = dashboard::panels(sample, prefs);
    Renderer::new(Palette::from_scheme(&prefs.colors)).frame(&panels)
}

/// Sample, record and draw until `stop` is raised. The flag is checked
/// between iterations, never while a frame is being drawn.
pub fn run<S, W>(
    prefs: &Preferences,
    sampler: &mut Sampler<S>,
    out: &mut W,
    stop: &AtomicBool,
) -> io::Result<LoopState>
where
    S: MetricsSource,
    W: Write,
{
    let mut state = LoopState::Running;
    info!(refresh_rate = prefs.refresh_rate, "sampling loop started");
    while state == LoopState::Running {
        if stop.load(Ordering::SeqCst) {
            state = LoopState::Stopped;
            continue;
        }
        let sample = sampler.tick(prefs);
        record(prefs, &sample);
        present(out, &compose(prefs, &sample))?;
    }
    info!("sampling loop stopped");
    Ok(state)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::metrics::{RawSample, VolumeError};
    use crate::probe::PROBE_TIMEOUT;
    use std::collections::VecDeque;
    use std::net::TcpListener;
    use std::sync::Arc;

    /// Scripted metrics source. Raises `stop` once the script runs out.
    pub(crate) struct FakeSource {
        pub counters: VecDeque<NetCounters>,
        pub stop: Option<Arc<AtomicBool>>,
        pub samples_taken: usize,
    }

    impl FakeSource {
        pub(crate) fn new(counters: &[(u64, u64)]) -> Self {
            Self {
                counters: counters
                    .iter()
                    .map(|&(sent, received)| NetCounters { sent, received })
                    .collect(),
                stop: None,
                samples_taken: 0,
            }
        }

        fn next_counters(&mut self) -> NetCounters {
            let next = self.counters.pop_front().unwrap_or_default();
            if self.counters.is_empty() {
                if let Some(stop) = &self.stop {
                    stop.store(true, Ordering::SeqCst);
                }
            }
            next
        }
    }

    impl MetricsSource for FakeSource {
        fn sample(&mut self, _window: Duration) -> RawSample {
            self.samples_taken += 1;
            RawSample {
                cpu_percent: 42.0,
                per_core: vec![10.0, 95.0, 55.0],
                cpu_frequency_mhz: Some(2400),
                memory: MemoryStats {
                    total: 8 << 30,
                    used: 4 << 30,
                    available: 4 << 30,
                    percent: 50.0,
                },
                swap: SwapStats {
                    total: 2 << 30,
                    used: 0,
                    free: 2 << 30,
                    percent: 0.0,
                },
                volumes: vec![
                    Ok(VolumeUsage {
                        device: "/dev/sda1".into(),
                        mount: "/".into(),
                        used: 30 << 30,
                        total: 100 << 30,
                        percent: 30.0,
                    }),
                    Err(VolumeError::PermissionDenied { mount: "/secret".into() }),
                ],
                net: self.next_counters(),
                boot_time: 0,
            }
        }

        fn net_counters(&mut self) -> NetCounters {
            self.next_counters()
        }

        fn host_name(&self) -> String {
            "testhost".into()
        }
    }

    /// Preferences whose probe is refused immediately on loopback.
    pub(crate) fn offline_prefs() -> Preferences {
        let port = {
            let listener = TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        Preferences {
            refresh_rate: 1.0,
            ping_target: "127.0.0.1".into(),
            ping_port: port,
            ..Preferences::default()
        }
    }

    /// A sample with 1 KB/s up, 2 KB/s down and an unreachable probe.
    pub(crate) fn fixture_sample() -> Sample {
        let mut sampler = Sampler::new(FakeSource::new(&[(0, 0), (1024, 2048)]));
        sampler.tick(&offline_prefs())
    }

    #[test]
    fn test_meter_rates() {
        let mut meter = ThroughputMeter::new(NetCounters { sent: 1000, received: 2000 });
        let t = meter.advance(NetCounters { sent: 2000, received: 4000 }, 1.0);
        assert_eq!(t, Throughput { up: 1000.0, down: 2000.0 });
        let t = meter.advance(NetCounters { sent: 3000, received: 4500 }, 0.5);
        assert_eq!(t, Throughput { up: 2000.0, down: 1000.0 });
    }

    #[test]
    fn test_meter_counter_reset_is_zero() {
        let mut meter = ThroughputMeter::new(NetCounters { sent: 5000, received: 5000 });
        let t = meter.advance(NetCounters { sent: 10, received: 20 }, 1.0);
        assert_eq!(t, Throughput::default());
        let t = meter.advance(NetCounters { sent: 110, received: 20 }, 1.0);
        assert_eq!(t.up, 100.0);
    }

    #[test]
    fn test_tick_computes_rates_from_previous_counters() {
        let source = FakeSource::new(&[(1000, 2000), (2000, 4000)]);
        let mut sampler = Sampler::new(source);
        let sample = sampler.tick(&offline_prefs());
        assert_eq!(sample.throughput.up, 1000.0);
        assert_eq!(sample.throughput.down, 2000.0);
    }

    #[test]
    fn test_tick_absorbs_failures() {
        let mut sampler = Sampler::new(FakeSource::new(&[(0, 0), (0, 0)]));
        let sample = sampler.tick(&offline_prefs());
        assert_eq!(sample.latency, None);
        assert_eq!(sample.volumes.len(), 1);
        assert_eq!(sample.volumes[0].mount, "/");
        assert_eq!(sample.host_name, "testhost");
        assert!(sample.uptime > Duration::ZERO);
    }

    #[test]
    fn test_tick_reports_latency_when_reachable() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let prefs = Preferences {
            ping_target: "127.0.0.1".into(),
            ping_port: listener.local_addr().unwrap().port(),
            ..offline_prefs()
        };
        let mut sampler = Sampler::new(FakeSource::new(&[(0, 0), (0, 0)]));
        assert!(sampler.tick(&prefs).latency.is_some());
    }

    #[test]
    fn test_unroutable_target_shows_offline_within_timeout() {
        // TEST-NET-1, never routed
        let prefs = Preferences {
            ping_target: "192.0.2.1".into(),
            ping_port: 9,
            ..offline_prefs()
        };
        let mut sampler = Sampler::new(FakeSource::new(&[(0, 0), (0, 0)]));
        let started = std::time::Instant::now();
        let sample = sampler.tick(&prefs);
        assert!(started.elapsed() < PROBE_TIMEOUT + Duration::from_millis(300));
        assert_eq!(sample.latency, None);
        assert!(compose(&prefs, &sample).to_text().contains("Offline"));
    }

    #[test]
    fn test_per_core_hidden_when_disabled() {
        let prefs = Preferences {
            show_cpu_per_core: false,
            ..offline_prefs()
        };
        let mut sampler = Sampler::new(FakeSource::new(&[(0, 0), (0, 0)]));
        assert!(sampler.tick(&prefs).per_core.is_empty());
    }

    #[test]
    fn test_run_until_stopped() {
        let stop = Arc::new(AtomicBool::new(false));
        let mut source = FakeSource::new(&[(0, 0), (100, 100), (200, 200), (300, 300)]);
        source.stop = Some(Arc::clone(&stop));
        let mut sampler = Sampler::new(source);

        let dir = tempfile::tempdir().unwrap();
        let prefs = Preferences {
            logging_enabled: true,
            log_file: dir.path().join("metrics.csv"),
            ..offline_prefs()
        };

        let mut out = Vec::new();
        let state = run(&prefs, &mut sampler, &mut out, &stop).unwrap();
        assert_eq!(state, LoopState::Stopped);
        assert_eq!(sampler.source.samples_taken, 3);

        let screen = String::from_utf8(out).unwrap();
        assert_eq!(screen.matches("CPU INFO").count(), 3);
        assert!(screen.contains("Offline"));

        let log = std::fs::read_to_string(&prefs.log_file).unwrap();
        assert_eq!(log.lines().count(), 4);
    }

    #[test]
    fn test_run_observes_stop_before_first_iteration() {
        let stop = AtomicBool::new(true);
        let mut sampler = Sampler::new(FakeSource::new(&[(0, 0)]));
        let mut out = Vec::new();
        let state = run(&offline_prefs(), &mut sampler, &mut out, &stop).unwrap();
        assert_eq!(state, LoopState::Stopped);
        assert!(out.is_empty());
        assert_eq!(sampler.source.samples_taken, 0);
    }
}
