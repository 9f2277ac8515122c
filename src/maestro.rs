//! [`MaestroBoard`]: the Maestro adapter behind the generic board contract.

use crate::board::{Callback, IoBoard, PulseInOptions, StepperConfig, StepperMove};
use crate::client::{ClientEvent, MaestroClient, Responder, SerialMode};
use crate::config::BoardConfig;
use crate::consts::protocol;
use crate::discovery::{parse_capability_dump, DiscoveryPhase};
use crate::error::{unsupported_i2c, Error, Result};
use crate::pin::{build_capability_table, DeviceVariant, InitialModes, Pin, PinMode};
use crate::ports::{resolve_ttl_port, PortEnumerator, PortPair};
use crate::query::{Completion, PendingQueries, QueryKind, Reply};
use crate::units;
use crate::validate::validate;
use log::{debug, info, trace, warn};
use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};
use std::time::{Duration, Instant};

type ReadyCallback = Box<dyn FnOnce()>;

/// State reachable from response callbacks.
struct Shared {
    phase: DiscoveryPhase,
    variant: Option<DeviceVariant>,
    pins: Vec<Pin>,
    pending: PendingQueries,
    on_ready: Option<ReadyCallback>,
}

impl fmt::Debug for Shared {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Shared")
            .field("phase", &self.phase)
            .field("variant", &self.variant)
            .field("pins", &self.pins)
            .field("pending", &self.pending)
            .finish_non_exhaustive()
    }
}

impl Shared {
    fn fail(&mut self) {
        if let Err(e) = self.phase.advance(DiscoveryPhase::Failed) {
            trace!("{}", e);
        }
    }

    fn install_capabilities(&mut self, dump: &[u8]) -> Result<()> {
        let (variant, raw_modes) = parse_capability_dump(dump)?;
        let pins = build_capability_table(variant, InitialModes::Reported(raw_modes))?;
        self.phase.advance(DiscoveryPhase::Ready)?;
        self.variant = Some(variant);
        self.pins = pins;
        Ok(())
    }

    /// Completes discovery. `on_ready` runs after the borrow is released.
    fn finish_discovery(shared: &Rc<RefCell<Shared>>, result: Result<Reply>) {
        let on_ready = {
            let mut state = shared.borrow_mut();
            let outcome = result
                .and_then(into_script)
                .and_then(|dump| state.install_capabilities(&dump));
            match outcome {
                Ok(()) => {
                    info!("Maestro ready with {} channels", state.pins.len());
                    state.on_ready.take()
                }
                Err(e) => {
                    warn!("Capability discovery failed: {}", e);
                    state.fail();
                    None
                }
            }
        };
        if let Some(on_ready) = on_ready {
            on_ready();
        }
    }

    fn update_pin(&mut self, pin: u8, mode: Option<PinMode>, value: u16) -> Result<()> {
        let count = self.pins.len();
        let entry = self
            .pins
            .get_mut(pin as usize)
            .ok_or(Error::PinOutOfRange { pin, count })?;
        if let Some(mode) = mode {
            entry.set_mode(mode)?;
        }
        entry.set_value(value);
        Ok(())
    }
}

fn unexpected_reply(expected: &str, reply: &Reply) -> Error {
    Error::InvalidResponse(format!("expected {}, got {:?}", expected, reply))
}

fn into_script(reply: Reply) -> Result<Vec<u8>> {
    match reply {
        Reply::Script(data) => Ok(data),
        other => Err(unexpected_reply("script output", &other)),
    }
}

fn into_analog(reply: Reply) -> Result<u16> {
    match reply {
        Reply::Analog(value) => Ok(value),
        other => Err(unexpected_reply("analog value", &other)),
    }
}

fn into_digital(reply: Reply) -> Result<bool> {
    match reply {
        Reply::Digital(level) => Ok(level),
        other => Err(unexpected_reply("digital level", &other)),
    }
}

fn first_byte(data: Vec<u8>) -> Result<u8> {
    data.first()
        .copied()
        .ok_or_else(|| Error::InvalidResponse("empty version response".to_string()))
}

fn check_dual_port<C: MaestroClient>(client: &C) -> Result<()> {
    match client.serial_mode() {
        SerialMode::UsbDualPort => Ok(()),
        mode => Err(Error::Configuration(format!(
            "Maestro must be in USB Dual Port serial mode (found {:?})",
            mode
        ))),
    }
}

/// Records a read result on the pin, then hands it to the caller.
fn read_completion<T: 'static>(
    shared: Weak<RefCell<Shared>>,
    pin: u8,
    convert: fn(Reply) -> Result<T>,
    logical: fn(&T) -> u16,
    callback: Callback<T>,
) -> Completion {
    Box::new(move |result| {
        let result = result.and_then(convert);
        if let (Ok(value), Some(shared)) = (&result, shared.upgrade()) {
            if let Err(e) = shared.borrow_mut().update_pin(pin, None, logical(value)) {
                debug!("Could not record read of pin {}: {}", pin, e);
            }
        }
        callback(result);
    })
}

/// A Pololu Maestro driven through the [`IoBoard`] contract.
///
/// The board is single-threaded and callback driven: the application calls
/// [`process_events`](Self::process_events) from its event loop, and query
/// callbacks run when the client delivers responses.
/// **Note:** This handle is not thread-safe (`!Send`, `!Sync`).
#[derive(Debug)]
pub struct MaestroBoard<C: MaestroClient> {
    client: C,
    shared: Rc<RefCell<Shared>>,
    ports: Option<PortPair>,
    config: BoardConfig,
}

impl<C: MaestroClient> MaestroBoard<C> {
    // --- Constructors ---

    /// Discovers the board behind `command_port`.
    ///
    /// Enumerates serial ports, pairs the command port with its TTL port and
    /// opens the client through `connect`. The capability dump is requested
    /// once the client reports [`ClientEvent::Ready`] via
    /// [`process_events`](Self::process_events); `on_ready` runs once the pin
    /// table is built. A board whose link fails never becomes ready.
    pub fn discover<E, F, R>(
        command_port: &str,
        enumerator: &E,
        connect: F,
        on_ready: R,
        config: BoardConfig,
    ) -> Result<Self>
    where
        E: PortEnumerator + ?Sized,
        F: FnOnce(&PortPair) -> Result<C>,
        R: FnOnce() + 'static,
    {
        let mut phase = DiscoveryPhase::Unstarted;
        let ports = enumerator.list_ports().unwrap_or_else(|e| {
            warn!("Serial port enumeration failed: {}", e);
            Vec::new()
        });
        let ttl = resolve_ttl_port(command_port, &ports, &config.null_device);
        let pair = PortPair::new(command_port, ttl, config.null_device.as_str());
        phase.advance(DiscoveryPhase::PortsEnumerated)?;

        phase.advance(DiscoveryPhase::Connecting)?;
        info!(
            "Connecting to command port {} and TTL port {}",
            pair.command, pair.ttl
        );
        let client = connect(&pair)?;
        check_dual_port(&client)?;

        Ok(Self {
            client,
            shared: Rc::new(RefCell::new(Shared {
                phase,
                variant: None,
                pins: Vec::new(),
                pending: PendingQueries::default(),
                on_ready: Some(Box::new(on_ready)),
            })),
            ports: Some(pair),
            config,
        })
    }

    /// Builds a board from an already connected client and a known layout.
    ///
    /// `pin_modes` holds one entry per channel; `None` means output. The
    /// board is ready immediately and `on_ready` runs before this returns.
    pub fn with_client<R>(
        client: C,
        variant: DeviceVariant,
        pin_modes: &[Option<PinMode>],
        on_ready: R,
        config: BoardConfig,
    ) -> Result<Self>
    where
        R: FnOnce(),
    {
        check_dual_port(&client)?;
        let pins = build_capability_table(variant, InitialModes::Configured(pin_modes))?;
        debug!("Configured Maestro with {} channels", pins.len());
        let board = Self {
            client,
            shared: Rc::new(RefCell::new(Shared {
                phase: DiscoveryPhase::Ready,
                variant: Some(variant),
                pins,
                pending: PendingQueries::default(),
                on_ready: None,
            })),
            ports: None,
            config,
        };
        on_ready();
        Ok(board)
    }

    // --- Accessors ---

    pub fn phase(&self) -> DiscoveryPhase {
        self.shared.borrow().phase
    }

    /// Snapshot of the pin table.
    pub fn pins(&self) -> Vec<Pin> {
        self.shared.borrow().pins.clone()
    }

    pub fn pin(&self, index: u8) -> Option<Pin> {
        self.shared.borrow().pins.get(index as usize).cloned()
    }

    /// Device layout, known once the board is ready.
    pub fn variant(&self) -> Option<DeviceVariant> {
        self.shared.borrow().variant
    }

    /// Resolved serial ports (discovery path only).
    pub fn port_pair(&self) -> Option<&PortPair> {
        self.ports.as_ref()
    }

    pub fn config(&self) -> &BoardConfig {
        &self.config
    }

    /// Number of queries awaiting a response.
    pub fn pending_queries(&self) -> usize {
        self.shared.borrow().pending.len()
    }

    pub fn is_query_in_flight(&self, kind: QueryKind) -> bool {
        self.shared.borrow().pending.is_in_flight(kind)
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn client_mut(&mut self) -> &mut C {
        &mut self.client
    }

    // --- Event handling ---

    /// Handles all pending client events and expires stale queries.
    /// Returns the number of events handled.
    pub fn process_events(&mut self) -> usize {
        let mut handled = 0;
        while let Some(event) = self.client.next_event() {
            handled += 1;
            match event {
                ClientEvent::Ready => self.on_link_ready(),
                ClientEvent::Error { code, message } => self.on_transport_error(code, message),
            }
        }
        self.expire_queries(Instant::now());
        handled
    }

    /// Fails every query issued more than the configured timeout before
    /// `now`. Returns the number of queries expired.
    pub fn expire_queries(&mut self, now: Instant) -> usize {
        let Some(timeout) = self.config.query_timeout else {
            return 0;
        };
        let expired = self.shared.borrow_mut().pending.expire(now, timeout);
        let count = expired.len();
        for (kind, complete) in expired {
            warn!("{} query timed out after {:?}", kind, timeout);
            complete(Err(Error::Timeout));
        }
        count
    }

    fn on_link_ready(&mut self) {
        let phase = self.phase();
        if phase != DiscoveryPhase::Connecting {
            debug!("Ignoring link ready event in phase {:?}", phase);
            return;
        }
        debug!("Link ready, requesting capability dump");
        if let Err(e) = self.request_capabilities() {
            warn!("Could not request capability dump: {}", e);
            self.shared.borrow_mut().fail();
        }
    }

    fn request_capabilities(&mut self) -> Result<()> {
        self.shared
            .borrow_mut()
            .phase
            .advance(DiscoveryPhase::AwaitingCapabilityResponse)?;
        let weak = Rc::downgrade(&self.shared);
        let complete: Completion = Box::new(move |result| {
            if let Some(shared) = weak.upgrade() {
                Shared::finish_discovery(&shared, result);
            }
        });
        self.issue_script(
            QueryKind::Capabilities,
            protocol::SUBROUTINE_CAPABILITIES,
            complete,
        )
    }

    fn on_transport_error(&mut self, code: i32, message: String) {
        warn!("Serial error detected {} {}", code, message);
        let drained = {
            let mut state = self.shared.borrow_mut();
            state.fail();
            state.pending.drain()
        };
        for (kind, complete) in drained {
            debug!("Failing pending {} query", kind);
            complete(Err(Error::Transport {
                code,
                message: message.clone(),
            }));
        }
    }

    // --- Dispatch helpers ---

    fn ensure_ready(&self) -> Result<()> {
        if self.shared.borrow().phase.is_ready() {
            Ok(())
        } else {
            Err(Error::NotReady)
        }
    }

    fn check_pin(&self, pin: u8, required: PinMode) -> Result<()> {
        let state = self.shared.borrow();
        validate(&state.pins, pin, required)?;
        Ok(())
    }

    fn record_write(&self, pin: u8, mode: PinMode, value: u16) -> Result<()> {
        self.shared.borrow_mut().update_pin(pin, Some(mode), value)
    }

    /// Registers a query, then hands the client a responder bound to its id.
    /// No borrow of the shared state is held while the client runs.
    fn issue<T, S>(
        &mut self,
        kind: QueryKind,
        complete: Completion,
        wrap: fn(T) -> Reply,
        send: S,
    ) -> Result<()>
    where
        T: 'static,
        S: FnOnce(&mut C, Responder<T>) -> Result<()>,
    {
        let id = self
            .shared
            .borrow_mut()
            .pending
            .register(kind, Instant::now(), complete)?;
        let weak = Rc::downgrade(&self.shared);
        let respond: Responder<T> = Box::new(move |value| {
            let Some(shared) = weak.upgrade() else {
                return;
            };
            let complete = shared.borrow_mut().pending.take(kind, id);
            match complete {
                Some(complete) => complete(Ok(wrap(value))),
                None => debug!("Discarding late {} response (request {})", kind, id),
            }
        });
        if let Err(e) = send(&mut self.client, respond) {
            let pending = self.shared.borrow_mut().pending.take(kind, id);
            if pending.is_none() {
                // The client answered before failing; the caller already has the response.
                warn!("{} query answered, then the client failed: {}", kind, e);
                return Ok(());
            }
            warn!("Failed to send {} query: {}", kind, e);
            return Err(e);
        }
        Ok(())
    }

    fn issue_script(
        &mut self,
        kind: QueryKind,
        subroutine: u8,
        complete: Completion,
    ) -> Result<()> {
        trace!(
            "Restarting script at subroutine {} for {} query",
            subroutine, kind
        );
        let send = move |client: &mut C, respond: Responder<Vec<u8>>| {
            client.restart_script_at_subroutine(subroutine, respond)
        };
        self.issue(kind, complete, Reply::Script, send)
    }

    fn not_supported(&self, method: &str) {
        info!(
            "MaestroBoard asked to do {}, which the Maestro does not support",
            method
        );
    }
}

impl<C: MaestroClient> IoBoard for MaestroBoard<C> {
    fn is_ready(&self) -> bool {
        self.shared.borrow().phase.is_ready()
    }

    fn analog_pins(&self) -> Vec<u8> {
        self.shared
            .borrow()
            .pins
            .iter()
            .filter(|p| p.supports(PinMode::Analog))
            .map(Pin::index)
            .collect()
    }

    fn report_version(&mut self, callback: Callback<u8>) -> Result<()> {
        self.ensure_ready()?;
        info!("MaestroBoard asked to report version");
        let complete: Completion = Box::new(move |result| {
            let version = result.and_then(into_script).and_then(first_byte);
            callback(version)
        });
        self.issue_script(QueryKind::Version, protocol::SUBROUTINE_VERSION, complete)
    }

    fn query_firmware(&mut self, callback: Callback<Vec<u8>>) -> Result<()> {
        self.ensure_ready()?;
        info!("MaestroBoard asked to report firmware version");
        let complete: Completion = Box::new(move |result| {
            let result = result.and_then(into_script);
            if let Ok(firmware) = &result {
                info!("Firmware version reported as {:02X?}", firmware);
            }
            callback(result)
        });
        self.issue_script(QueryKind::Firmware, protocol::SUBROUTINE_FIRMWARE, complete)
    }

    fn analog_read(&mut self, pin: u8, callback: Callback<u16>) -> Result<()> {
        self.ensure_ready()?;
        info!("MaestroBoard asked to do analog_read of pin {}", pin);
        self.check_pin(pin, PinMode::Analog)?;
        let complete = read_completion(
            Rc::downgrade(&self.shared),
            pin,
            into_analog,
            |v| *v,
            callback,
        );
        let send = move |client: &mut C, respond| client.analog_read(pin, respond);
        self.issue(QueryKind::AnalogRead, complete, Reply::Analog, send)
    }

    fn analog_write(&mut self, pin: u8, value: u8) -> Result<()> {
        self.ensure_ready()?;
        info!(
            "MaestroBoard asked to do analog_write for pin {} to value {}",
            pin, value
        );
        self.check_pin(pin, PinMode::Pwm)?;
        let on_time = units::level_to_pwm_on_time(value)?;
        debug!(
            "Setting PWM on-time {} of period {}",
            on_time,
            protocol::PWM_PERIOD
        );
        self.client.set_pwm(on_time, protocol::PWM_PERIOD)?;
        self.record_write(pin, PinMode::Pwm, u16::from(value))
    }

    fn servo_write(&mut self, pin: u8, degrees: f64) -> Result<()> {
        self.ensure_ready()?;
        info!(
            "MaestroBoard asked to do servo_write for pin {} to degrees {}",
            pin, degrees
        );
        self.check_pin(pin, PinMode::Servo)?;
        let target = units::degrees_to_target(degrees)?;
        self.client.set_target(pin, target)?;
        let logical = degrees.round().clamp(0.0, f64::from(u16::MAX)) as u16;
        self.record_write(pin, PinMode::Servo, logical)
    }

    fn pin_mode(&mut self, pin: u8, mode: PinMode) {
        info!(
            "MaestroBoard asked to do pin_mode to set pin {} to mode {}",
            pin, mode
        );
    }

    fn digital_write(&mut self, pin: u8, value: u8) -> Result<()> {
        self.ensure_ready()?;
        info!(
            "MaestroBoard asked to do digital_write for pin {} to value {}",
            pin, value
        );
        self.check_pin(pin, PinMode::Output)?;
        let level = value != 0;
        self.client.digital_write(pin, level)?;
        self.record_write(pin, PinMode::Output, u16::from(level))
    }

    fn digital_read(&mut self, pin: u8, callback: Callback<bool>) -> Result<()> {
        self.ensure_ready()?;
        info!("MaestroBoard asked to do digital_read of pin {}", pin);
        self.check_pin(pin, PinMode::Input)?;
        let complete = read_completion(
            Rc::downgrade(&self.shared),
            pin,
            into_digital,
            |level| u16::from(*level),
            callback,
        );
        let send = move |client: &mut C, respond| client.digital_read(pin, respond);
        self.issue(QueryKind::DigitalRead, complete, Reply::Digital, send)
    }

    fn query_capabilities(&mut self, _callback: Callback<()>) {
        self.not_supported("query_capabilities");
    }

    fn query_analog_mapping(&mut self, _callback: Callback<()>) {
        self.not_supported("query_analog_mapping");
    }

    fn query_pin_state(&mut self, _pin: u8, _callback: Callback<PinMode>) {
        self.not_supported("query_pin_state");
    }

    fn set_sampling_interval(&mut self, _interval: Duration) {
        self.not_supported("set_sampling_interval");
    }

    fn report_analog_pin(&mut self, _pin: u8, _enable: bool) {
        self.not_supported("report_analog_pin");
    }

    fn report_digital_pin(&mut self, _pin: u8, _enable: bool) {
        self.not_supported("report_digital_pin");
    }

    fn pulse_in(&mut self, _options: PulseInOptions, _callback: Callback<u32>) {
        self.not_supported("pulse_in");
    }

    fn stepper_config(&mut self, _config: StepperConfig) {
        self.not_supported("stepper_config");
    }

    fn stepper_step(&mut self, _step: StepperMove, _callback: Callback<()>) {
        self.not_supported("stepper_step");
    }

    fn reset(&mut self) {
        self.not_supported("reset");
    }

    fn send_i2c_config(&mut self, _delay_us: u16) -> Result<()> {
        Err(unsupported_i2c("send_i2c_config"))
    }

    fn send_i2c_write_request(&mut self, _address: u8, _data: &[u8]) -> Result<()> {
        Err(unsupported_i2c("send_i2c_write_request"))
    }

    fn send_i2c_read_request(
        &mut self,
        _address: u8,
        _len: usize,
        _callback: Callback<Vec<u8>>,
    ) -> Result<()> {
        Err(unsupported_i2c("send_i2c_read_request"))
    }
}
