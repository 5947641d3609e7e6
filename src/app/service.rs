//! Control service — the orchestration core.
//!
//! [`ControlService`] owns the conditioned-sensor state, both fuzzy
//! engines, both PID engines, and the shared control mode. It runs one
//! cycle at a time on a single thread:
//!
//! ```text
//!  SensorPort ──▶ ┌──────────────────────────────┐ ──▶ EventSink
//!                 │        ControlService         │
//! ActuatorPort ◀──│  conditioning · fuzzy · PID   │
//!                 └──────────────────────────────┘
//! ```
//!
//! Command updates arrive out-of-band and are queued; the queue is
//! drained atomically at the top of each cycle so configuration never
//! changes mid-computation. A monotonic millisecond clock is injected
//! into [`tick`](ControlService::tick) — cycles that arrive before the
//! configured interval has elapsed are skipped, not queued.

use log::{debug, info};

use crate::actuators::{heater_duty, PumpMapper};
use crate::config::ControlConfig;
use crate::control::fuzzy::FuzzyEngine;
use crate::control::mode::ControlMode;
use crate::control::pid::PidController;
use crate::control::turbidity::{TurbidityPid, TurbiditySchedule};
use crate::sensors::turbidity::to_percent;
use crate::sensors::{TemperatureFilter, TurbidityConditioner};

use super::commands::CommandUpdate;
use super::events::{AppEvent, TelemetrySnapshot};
use super::ports::{ActuatorPort, EventSink, SensorPort};

/// Upper bound on the turbidity burst length (fixed buffer).
const MAX_BURST: usize = 64;

/// The control service orchestrates sensor conditioning, strategy
/// dispatch, and actuator mapping for both loops.
pub struct ControlService {
    config: ControlConfig,
    mode: ControlMode,

    temperature_filter: TemperatureFilter,
    turbidity_conditioner: TurbidityConditioner,

    fuzzy_temperature: FuzzyEngine,
    fuzzy_turbidity: FuzzyEngine,
    pid_temperature: PidController,
    pid_turbidity: TurbidityPid,

    /// Commands coalesced since the last cycle boundary.
    pending: Option<CommandUpdate>,
    last_cycle_ms: Option<u64>,
    cycle_count: u64,
}

impl ControlService {
    /// Construct the service from configuration. `now_ms` seeds the PID
    /// timestamps so the first evaluation sees a sane dt.
    pub fn new(config: ControlConfig, now_ms: u64) -> Self {
        let pid_temperature = PidController::new(
            config.temperature_gains,
            config.temperature_integral_limit,
            now_ms,
        );
        let pid_turbidity = TurbidityPid::new(
            config.turbidity_gains,
            TurbiditySchedule {
                turbo_threshold: config.turbo_error_threshold,
                turbo_kp: config.turbo_kp,
                feedforward: config.pump_feedforward_percent,
                cutoff_percent: config.pump_cutoff_percent,
            },
            config.turbidity_integral_limit,
            now_ms,
        );

        Self {
            mode: config.mode,
            temperature_filter: TemperatureFilter::new(config.temperature_filter_alpha),
            turbidity_conditioner: TurbidityConditioner::new(),
            fuzzy_temperature: FuzzyEngine::temperature(),
            fuzzy_turbidity: FuzzyEngine::turbidity(),
            pid_temperature,
            pid_turbidity,
            pending: None,
            last_cycle_ms: None,
            cycle_count: 0,
            config,
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Announce startup through the sink.
    pub fn start(&self, sink: &mut impl EventSink) {
        sink.emit(&AppEvent::Started(self.mode));
        info!("control service started in {} mode", self.mode.label());
    }

    /// Kill both actuators (orderly shutdown or fatal transport error
    /// upstream — the core itself never needs this mid-cycle).
    pub fn shutdown(&self, hw: &mut impl ActuatorPort) {
        hw.all_off();
        info!("actuators off");
    }

    // ── Command handling ──────────────────────────────────────

    /// Queue a command update from the transport. Coalesced with any
    /// earlier queued update (newer fields win) and applied atomically
    /// at the next cycle boundary.
    pub fn queue_command(&mut self, update: CommandUpdate) {
        if update.is_empty() {
            return;
        }
        match self.pending.as_mut() {
            Some(p) => p.merge(update),
            None => self.pending = Some(update),
        }
    }

    /// Apply a command update immediately. Only call between cycles;
    /// [`queue_command`](Self::queue_command) is the safe default.
    pub fn handle_command(
        &mut self,
        update: &CommandUpdate,
        now_ms: u64,
        sink: &mut impl EventSink,
    ) {
        if let Some(mode) = update.mode {
            self.set_mode(mode, now_ms, sink);
        }
        if let Some(sp) = update.temperature_setpoint {
            info!("temperature setpoint -> {sp}");
            self.config.temperature_setpoint = sp;
        }
        if let Some(sp) = update.turbidity_setpoint {
            info!("turbidity setpoint -> {sp}");
            self.config.turbidity_setpoint = sp;
        }
        if let Some(gains) = update.temperature_gains {
            info!(
                "temperature gains -> kp={} ki={} kd={}",
                gains.kp, gains.ki, gains.kd
            );
            self.config.temperature_gains = gains;
            self.pid_temperature.set_gains(gains);
        }
        if let Some(gains) = update.turbidity_gains {
            info!(
                "turbidity gains -> kp={} ki={} kd={}",
                gains.kp, gains.ki, gains.kd
            );
            self.config.turbidity_gains = gains;
            self.pid_turbidity.set_gains(gains);
        }
        if let Some(adc) = update.calibration_clear {
            info!(
                "calibration clear {} -> {adc}",
                self.config.calibration.adc_clear
            );
            self.config.calibration.adc_clear = adc;
        }
        if let Some(adc) = update.calibration_turbid {
            info!(
                "calibration turbid {} -> {adc}",
                self.config.calibration.adc_turbid
            );
            self.config.calibration.adc_turbid = adc;
        }
    }

    /// Switch strategy. Every actual transition resets all PID
    /// accumulator state, in both directions, so a freshly activated
    /// strategy never inherits stale integral/derivative history.
    pub fn set_mode(&mut self, mode: ControlMode, now_ms: u64, sink: &mut impl EventSink) {
        if mode == self.mode {
            return;
        }
        let from = self.mode;
        self.mode = mode;
        self.config.mode = mode;
        self.pid_temperature.reset(now_ms);
        self.pid_turbidity.reset(now_ms);
        info!("control mode {} -> {}", from.label(), mode.label());
        sink.emit(&AppEvent::ModeChanged { from, to: mode });
    }

    // ── Per-cycle orchestration ───────────────────────────────

    /// Run one control cycle if the configured interval has elapsed.
    ///
    /// Returns the telemetry snapshot for executed cycles, `None` when
    /// the cadence gate skipped this call. `hw` satisfies both
    /// [`SensorPort`] and [`ActuatorPort`] — one mutable borrow across
    /// the port boundary.
    pub fn tick(
        &mut self,
        hw: &mut (impl SensorPort + ActuatorPort),
        sink: &mut impl EventSink,
        now_ms: u64,
    ) -> Option<TelemetrySnapshot> {
        // 1. Cadence gate: skip, never queue.
        if let Some(last) = self.last_cycle_ms {
            if now_ms.saturating_sub(last) < self.config.control_interval_ms {
                return None;
            }
        }
        self.last_cycle_ms = Some(now_ms);

        // 2. Update boundary: drain queued commands before reading any
        //    configuration this cycle.
        if let Some(update) = self.pending.take() {
            self.handle_command(&update, now_ms, sink);
        }

        // 3. Sensor conditioning.
        let temperature = self.temperature_filter.update(hw.read_temperature_raw());
        let turbidity_adc = self.read_turbidity_burst(hw);
        let turbidity_percent = to_percent(turbidity_adc, &self.config.calibration);

        // 4. Errors. Temperature error is positive when too cold;
        //    turbidity error is positive when too dirty.
        let temperature_error = self.config.temperature_setpoint - temperature;
        let turbidity_error = turbidity_percent - self.config.turbidity_setpoint;

        // 5. Strategy dispatch, independently per variable.
        let (heater_percent, pump_percent) = match self.mode {
            ControlMode::Fuzzy => (
                self.fuzzy_temperature.evaluate(temperature_error),
                self.fuzzy_turbidity.evaluate(turbidity_error),
            ),
            ControlMode::Pid => (
                self.pid_temperature.compute(temperature_error, now_ms),
                self.pid_turbidity.compute(
                    turbidity_error,
                    self.config.turbidity_setpoint,
                    now_ms,
                ),
            ),
        };

        // 6. Duty mapping and actuation.
        let pump_mapper = PumpMapper::new(
            self.config.pump_start_threshold_percent,
            self.config.pump_min_physical_duty,
        );
        hw.set_heater(heater_duty(heater_percent));
        hw.set_pump(pump_mapper.to_duty(pump_percent));

        // 7. Telemetry.
        self.cycle_count += 1;
        let snapshot = TelemetrySnapshot {
            timestamp_ms: now_ms,
            temperature_c: temperature,
            turbidity_percent,
            turbidity_adc,
            mode: self.mode,
            heater_output_percent: heater_percent,
            pump_output_percent: pump_percent,
            temperature_error,
            turbidity_error,
            temperature_setpoint: self.config.temperature_setpoint,
            turbidity_setpoint: self.config.turbidity_setpoint,
        };
        debug!(
            "[{now_ms}] T:{temperature:.2}/{:.1} e:{temperature_error:.2} out:{heater_percent:.1}% \
             | K:{turbidity_percent:.1}/{:.1} e:{turbidity_error:.1} out:{pump_percent:.1}%",
            self.config.temperature_setpoint, self.config.turbidity_setpoint,
        );
        sink.emit(&AppEvent::Telemetry(snapshot.clone()));
        Some(snapshot)
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn mode(&self) -> ControlMode {
        self.mode
    }

    pub fn config(&self) -> &ControlConfig {
        &self.config
    }

    /// Control cycles executed (skipped calls excluded).
    pub fn cycle_count(&self) -> u64 {
        self.cycle_count
    }

    /// Temperature PID integral (tests, diagnostics).
    pub fn temperature_integral(&self) -> f32 {
        self.pid_temperature.integral()
    }

    /// Turbidity PID integral (tests, diagnostics).
    pub fn turbidity_integral(&self) -> f32 {
        self.pid_turbidity.integral()
    }

    // ── Internal ──────────────────────────────────────────────

    /// Blocking multi-sample burst. Acceptable on the single-threaded
    /// model: nothing else competes for the thread while it runs.
    fn read_turbidity_burst(&mut self, hw: &mut impl SensorPort) -> i32 {
        let count = self.config.turbidity_sample_count.min(MAX_BURST);
        let mut samples: heapless::Vec<i16, MAX_BURST> = heapless::Vec::new();
        for _ in 0..count {
            // Capacity is pre-checked against MAX_BURST.
            let _ = samples.push(hw.read_turbidity_raw());
        }
        self.turbidity_conditioner.average(&samples)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedHw {
        temperature: f32,
        turbidity_adc: i16,
        heater: Option<u8>,
        pump: Option<u8>,
        sensor_reads: usize,
    }

    impl FixedHw {
        fn new(temperature: f32, turbidity_adc: i16) -> Self {
            Self {
                temperature,
                turbidity_adc,
                heater: None,
                pump: None,
                sensor_reads: 0,
            }
        }
    }

    impl SensorPort for FixedHw {
        fn read_temperature_raw(&mut self) -> f32 {
            self.temperature
        }
        fn read_turbidity_raw(&mut self) -> i16 {
            self.sensor_reads += 1;
            self.turbidity_adc
        }
    }

    impl ActuatorPort for FixedHw {
        fn set_heater(&mut self, duty: u8) {
            self.heater = Some(duty);
        }
        fn set_pump(&mut self, duty: u8) {
            self.pump = Some(duty);
        }
        fn all_off(&mut self) {
            self.heater = Some(0);
            self.pump = Some(0);
        }
    }

    struct NullSink;
    impl EventSink for NullSink {
        fn emit(&mut self, _event: &AppEvent) {}
    }

    #[test]
    fn cadence_gate_skips_early_calls() {
        let mut svc = ControlService::new(ControlConfig::default(), 0);
        let mut hw = FixedHw::new(26.0, 6000);
        let mut sink = NullSink;

        assert!(svc.tick(&mut hw, &mut sink, 0).is_some());
        assert!(svc.tick(&mut hw, &mut sink, 500).is_none());
        assert!(svc.tick(&mut hw, &mut sink, 999).is_none());
        assert!(svc.tick(&mut hw, &mut sink, 1000).is_some());
        assert_eq!(svc.cycle_count(), 2);
    }

    #[test]
    fn burst_reads_configured_sample_count() {
        let mut svc = ControlService::new(ControlConfig::default(), 0);
        let mut hw = FixedHw::new(26.0, 6000);
        let mut sink = NullSink;
        svc.tick(&mut hw, &mut sink, 0);
        assert_eq!(hw.sensor_reads, 20);
    }

    #[test]
    fn queued_commands_apply_at_cycle_boundary() {
        let mut svc = ControlService::new(ControlConfig::default(), 0);
        let mut hw = FixedHw::new(26.0, 6000);
        let mut sink = NullSink;

        svc.queue_command(CommandUpdate {
            temperature_setpoint: Some(30.0),
            ..Default::default()
        });
        // Not applied yet — only at the next executed cycle.
        assert!((svc.config().temperature_setpoint - 28.0).abs() < 1e-6);

        let snap = svc.tick(&mut hw, &mut sink, 0).unwrap();
        assert!((snap.temperature_setpoint - 30.0).abs() < 1e-6);
    }

    #[test]
    fn queued_commands_coalesce_newest_wins() {
        let mut svc = ControlService::new(ControlConfig::default(), 0);
        svc.queue_command(CommandUpdate {
            turbidity_setpoint: Some(12.0),
            ..Default::default()
        });
        svc.queue_command(CommandUpdate {
            turbidity_setpoint: Some(15.0),
            ..Default::default()
        });
        let mut hw = FixedHw::new(26.0, 6000);
        let mut sink = NullSink;
        let snap = svc.tick(&mut hw, &mut sink, 0).unwrap();
        assert!((snap.turbidity_setpoint - 15.0).abs() < 1e-6);
    }

    #[test]
    fn mode_switch_resets_pid_state() {
        let mut svc = ControlService::new(
            ControlConfig {
                mode: ControlMode::Pid,
                ..Default::default()
            },
            0,
        );
        let mut hw = FixedHw::new(20.0, 6000); // cold tank, integral grows
        let mut sink = NullSink;
        svc.tick(&mut hw, &mut sink, 1000);
        svc.tick(&mut hw, &mut sink, 2000);
        assert!(svc.temperature_integral() != 0.0);

        svc.set_mode(ControlMode::Fuzzy, 3000, &mut sink);
        assert_eq!(svc.temperature_integral(), 0.0);
        assert_eq!(svc.turbidity_integral(), 0.0);

        // And back: still reset, regardless of direction.
        svc.tick(&mut hw, &mut sink, 4000);
        svc.set_mode(ControlMode::Pid, 5000, &mut sink);
        assert_eq!(svc.temperature_integral(), 0.0);
    }

    #[test]
    fn same_mode_command_is_not_a_transition() {
        let mut svc = ControlService::new(
            ControlConfig {
                mode: ControlMode::Pid,
                ..Default::default()
            },
            0,
        );
        let mut hw = FixedHw::new(20.0, 6000);
        let mut sink = NullSink;
        svc.tick(&mut hw, &mut sink, 1000);
        let integral = svc.temperature_integral();
        assert!(integral != 0.0);
        svc.set_mode(ControlMode::Pid, 2000, &mut sink);
        assert_eq!(svc.temperature_integral(), integral);
    }

    #[test]
    fn shutdown_kills_both_actuators() {
        let svc = ControlService::new(ControlConfig::default(), 0);
        let mut hw = FixedHw::new(26.0, 6000);
        svc.shutdown(&mut hw);
        assert_eq!(hw.heater, Some(0));
        assert_eq!(hw.pump, Some(0));
    }
}
